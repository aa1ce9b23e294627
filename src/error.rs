//! # 错误类型
//!
//! 编解码核心的全部失败情形。每个错误只属于单次 `embed`/`extract` 调用，
//! 核心内部没有重试，也没有全局错误状态。

use thiserror::Error;

use crate::policy::Channel;
use crate::pixels::Layout;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    #[error("Payload of {len} bytes does not fit a {header_bits}-bit length header (max {max} bytes)")]
    PayloadTooLarge { len: u64, header_bits: u8, max: u64 },

    #[error("Not enough space in the image to hide the payload. Required: {required} bits, Available: {available} bits")]
    InsufficientCapacity { required: u64, available: u64 },

    #[error("Bit stream truncated: needed {needed} bits, only {available} available")]
    TruncatedStream { needed: u64, available: u64 },

    #[error("No hidden message found: {0}")]
    NoHiddenMessage(String),

    #[error("Hidden message is corrupted: {0}")]
    CorruptedMessage(String),

    #[error("Invalid channel policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid length header width {0}: expected 1..=64 bits")]
    InvalidHeaderWidth(u8),

    #[error("Channel {channel} is not present in {layout} pixel data")]
    UnsupportedChannel { channel: Channel, layout: Layout },

    #[error("Pixel buffer holds {actual} samples, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, StegoError>;
