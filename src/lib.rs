//! # lsb_stego 库
//!
//! 本库包含 LSB 隐写工具的核心逻辑：
//! 载荷分帧 (`framer`)、位位置遍历 (`traversal`)、嵌入与提取 (`steganography`)，
//! 以及可互换的嵌入策略 (`codec`) 和隐写分析 (`analyzer`)。

// 声明库包含的所有模块。

pub mod analyzer;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod framer;
pub mod handler;
pub mod pixels;
pub mod policy;
pub mod steganography;
pub mod traversal;

pub use error::{Result, StegoError};
