//! # 像素通道遍历
//!
//! 定义嵌入与提取共用的位位置顺序：
//!
//! 1. 像素按行优先升序 (第 0 行从左到右，然后第 1 行 ...)；
//! 2. 像素内按策略声明的通道顺序；
//! 3. 通道内从最高的可用低位到最低位 (`bits_per_channel - 1` 递减到 `0`)。
//!
//! 遍历是输入的纯函数，可以任意次数地重新生成同一序列。

use crate::policy::{Channel, ChannelPolicy};

/// 一个可写的位位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitPosition {
    pub pixel_index: usize,
    pub channel: Channel,
    pub bit_offset: u8,
}

/// 行优先顺序下的全部位位置。
pub fn positions(
    width: u32,
    height: u32,
    policy: &ChannelPolicy,
) -> impl Iterator<Item = BitPosition> + Clone + '_ {
    positions_in(0..width as usize * height as usize, policy)
}

/// 按给定像素顺序展开位位置，通道与位的顺序与 [`positions`] 相同。
pub fn positions_in<'a, P>(
    pixels: P,
    policy: &'a ChannelPolicy,
) -> impl Iterator<Item = BitPosition> + Clone + 'a
where
    P: IntoIterator<Item = usize>,
    P::IntoIter: Clone + 'a,
{
    let bits_per_channel = policy.bits_per_channel();
    pixels.into_iter().flat_map(move |pixel_index| {
        policy.channels().iter().flat_map(move |&channel| {
            (0..bits_per_channel)
                .rev()
                .map(move |bit_offset| BitPosition {
                    pixel_index,
                    channel,
                    bit_offset,
                })
        })
    })
}

/// 图像在策略下可提供的总位数，不实际生成序列。
pub fn capacity(width: u32, height: u32, policy: &ChannelPolicy) -> u64 {
    (u64::from(width) * u64::from(height)).saturating_mul(policy.bits_per_pixel())
}

/// 给定像素数量可提供的总位数。
pub fn capacity_for(pixel_count: usize, policy: &ChannelPolicy) -> u64 {
    (pixel_count as u64).saturating_mul(policy.bits_per_pixel())
}
