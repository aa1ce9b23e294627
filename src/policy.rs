//! # 通道策略
//!
//! 决定哪些颜色通道参与隐写，以及每个通道使用多少个低位。

use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_BITS_PER_CHANNEL, MAX_BITS_PER_CHANNEL};
use crate::error::{Result, StegoError};

/// 像素中的单个颜色通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

impl FromStr for Channel {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Channel::Red),
            "g" | "green" => Ok(Channel::Green),
            "b" | "blue" => Ok(Channel::Blue),
            "a" | "alpha" => Ok(Channel::Alpha),
            other => Err(StegoError::InvalidPolicy(format!(
                "unknown channel '{other}', expected one of r, g, b, a"
            ))),
        }
    }
}

/// 隐写使用的通道及每通道低位数。
///
/// 通道的声明顺序就是遍历顺序，嵌入与提取必须使用同一个策略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicy {
    channels: Vec<Channel>,
    bits_per_channel: u8,
}

impl ChannelPolicy {
    /// 构造并校验一个策略。
    ///
    /// # Errors
    ///
    /// * `bits_per_channel` 不在 1..=8 之内。
    /// * 通道列表为空，或同一通道出现多次。
    pub fn new(channels: Vec<Channel>, bits_per_channel: u8) -> Result<Self> {
        if !(1..=MAX_BITS_PER_CHANNEL).contains(&bits_per_channel) {
            return Err(StegoError::InvalidPolicy(format!(
                "bits per channel must be within 1..={MAX_BITS_PER_CHANNEL}, got {bits_per_channel}"
            )));
        }
        if channels.is_empty() {
            return Err(StegoError::InvalidPolicy(
                "at least one channel is required".to_string(),
            ));
        }
        if let Some((i, dup)) = channels
            .iter()
            .enumerate()
            .find(|&(i, c)| channels[..i].contains(c))
        {
            return Err(StegoError::InvalidPolicy(format!(
                "channel {dup} is listed twice (position {i})"
            )));
        }

        Ok(Self {
            channels,
            bits_per_channel,
        })
    }

    /// R、G、B 三通道，使用给定的低位数。
    pub fn rgb(bits_per_channel: u8) -> Result<Self> {
        Self::new(
            vec![Channel::Red, Channel::Green, Channel::Blue],
            bits_per_channel,
        )
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn bits_per_channel(&self) -> u8 {
        self.bits_per_channel
    }

    /// 单个像素可提供的位数。
    pub fn bits_per_pixel(&self) -> u64 {
        self.channels.len() as u64 * u64::from(self.bits_per_channel)
    }

    /// 覆盖全部可写低位的掩码，例如 2 位时为 `0b0000_0011`。
    pub fn low_bits_mask(&self) -> u8 {
        (((1u16) << self.bits_per_channel) - 1) as u8
    }
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            channels: vec![Channel::Red, Channel::Green, Channel::Blue],
            bits_per_channel: DEFAULT_BITS_PER_CHANNEL,
        }
    }
}

impl fmt::Display for ChannelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.channels.iter().map(Channel::to_string).collect();
        write!(f, "[{}] x {} bit(s)", names.join(", "), self.bits_per_channel)
    }
}
