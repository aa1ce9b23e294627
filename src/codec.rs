//! # 嵌入策略
//!
//! [`Codec`] 决定帧位流写入哪些位位置。所有实现共享同一帧格式，
//! 因此确定性的逐行策略与边缘引导策略可以互相替换。

use std::cmp::Reverse;

use log::debug;

use crate::error::{Result, StegoError};
use crate::pixels::StegoImage;
use crate::policy::{Channel, ChannelPolicy};
use crate::traversal::{self, BitPosition};

/// 一次写入影响到的通道值数量。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// 被写入过至少一位的通道值。
    pub touched: usize,
    /// 写入后数值确实发生变化的通道值。
    pub changed: usize,
}

/// 在像素数据中读写位流的策略。
pub trait Codec {
    /// 图像在该策略下可容纳的位数。
    fn capacity(&self, image: &StegoImage) -> Result<u64>;

    /// 按策略顺序写入 `bits`。位数超过容量时不修改任何像素。
    fn write_bits(&self, image: &mut StegoImage, bits: &[bool]) -> Result<WriteStats>;

    /// 按与 `write_bits` 相同的顺序惰性读取位。
    fn read_bits<'a>(
        &'a self,
        image: &'a StegoImage,
    ) -> Result<Box<dyn Iterator<Item = bool> + 'a>>;
}

/// 逐行遍历全部像素的确定性 LSB 策略。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LsbCodec {
    policy: ChannelPolicy,
}

impl LsbCodec {
    pub fn new(policy: ChannelPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }
}

impl Codec for LsbCodec {
    fn capacity(&self, image: &StegoImage) -> Result<u64> {
        image.ensure_supports(&self.policy)?;
        Ok(traversal::capacity(
            image.width(),
            image.height(),
            &self.policy,
        ))
    }

    fn write_bits(&self, image: &mut StegoImage, bits: &[bool]) -> Result<WriteStats> {
        ensure_fits(bits, self.capacity(image)?)?;
        let positions = traversal::positions(image.width(), image.height(), &self.policy);
        write_at(image, positions, bits)
    }

    fn read_bits<'a>(
        &'a self,
        image: &'a StegoImage,
    ) -> Result<Box<dyn Iterator<Item = bool> + 'a>> {
        image.ensure_supports(&self.policy)?;
        let positions = traversal::positions(image.width(), image.height(), &self.policy);
        Ok(Box::new(read_at(image, positions)))
    }
}

/// 只在纹理丰富区域嵌入的策略。
///
/// 重要性图是亮度的 Sobel 梯度幅值，按最小/最大值归一化到 0..=255。
/// 计算前先清除策略会写入的低位，所以嵌入前后得到的像素排序完全一致。
/// 重要性不低于 `threshold` 的像素按重要性降序使用，相同时按像素序号升序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeGuidedCodec {
    policy: ChannelPolicy,
    threshold: u8,
}

impl EdgeGuidedCodec {
    pub fn new(policy: ChannelPolicy, threshold: u8) -> Self {
        Self { policy, threshold }
    }

    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// 每个像素的重要性 (0-255)，行优先。
    pub fn importance_map(&self, image: &StegoImage) -> Vec<u8> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w == 0 || h == 0 {
            return Vec::new();
        }

        let luma = self.masked_luma(image);
        let at = |x: usize, y: usize| luma[y.min(h - 1) * w + x.min(w - 1)];

        let mut magnitudes = Vec::with_capacity(w * h);
        for y in 0..h {
            let (up, down) = (y.saturating_sub(1), y + 1);
            for x in 0..w {
                let (left, right) = (x.saturating_sub(1), x + 1);
                let gx = (at(right, up) + 2 * at(right, y) + at(right, down))
                    - (at(left, up) + 2 * at(left, y) + at(left, down));
                let gy = (at(left, down) + 2 * at(x, down) + at(right, down))
                    - (at(left, up) + 2 * at(x, up) + at(right, up));
                magnitudes.push(gx.unsigned_abs() + gy.unsigned_abs());
            }
        }

        let min = magnitudes.iter().copied().min().unwrap_or(0);
        let max = magnitudes.iter().copied().max().unwrap_or(0);
        if max == min {
            return vec![0; magnitudes.len()];
        }
        magnitudes
            .into_iter()
            .map(|m| ((m - min) * 255 / (max - min)) as u8)
            .collect()
    }

    /// 参与嵌入的像素序号，按使用顺序排列。
    pub fn pixel_order(&self, image: &StegoImage) -> Result<Vec<usize>> {
        image.ensure_supports(&self.policy)?;
        let importance = self.importance_map(image);
        let mut order: Vec<usize> = (0..importance.len())
            .filter(|&i| importance[i] >= self.threshold)
            .collect();
        order.sort_by_key(|&i| Reverse(importance[i]));

        debug!(
            "Edge-guided order selected {} of {} pixels at threshold {}",
            order.len(),
            importance.len(),
            self.threshold
        );
        Ok(order)
    }

    fn masked_luma(&self, image: &StegoImage) -> Vec<i32> {
        let mask = !self.policy.low_bits_mask();
        let value = |pixel: usize, channel: Channel| -> i32 {
            let sample = image.sample(pixel, channel).unwrap_or(0);
            if self.policy.channels().contains(&channel) {
                i32::from(sample & mask)
            } else {
                i32::from(sample)
            }
        };

        (0..image.pixel_count())
            .map(|p| {
                (299 * value(p, Channel::Red)
                    + 587 * value(p, Channel::Green)
                    + 114 * value(p, Channel::Blue))
                    / 1000
            })
            .collect()
    }
}

impl Codec for EdgeGuidedCodec {
    fn capacity(&self, image: &StegoImage) -> Result<u64> {
        let order = self.pixel_order(image)?;
        Ok(traversal::capacity_for(order.len(), &self.policy))
    }

    fn write_bits(&self, image: &mut StegoImage, bits: &[bool]) -> Result<WriteStats> {
        let order = self.pixel_order(image)?;
        ensure_fits(bits, traversal::capacity_for(order.len(), &self.policy))?;
        write_at(image, traversal::positions_in(order, &self.policy), bits)
    }

    fn read_bits<'a>(
        &'a self,
        image: &'a StegoImage,
    ) -> Result<Box<dyn Iterator<Item = bool> + 'a>> {
        let order = self.pixel_order(image)?;
        let positions = traversal::positions_in(order, &self.policy);
        Ok(Box::new(read_at(image, positions)))
    }
}

fn ensure_fits(bits: &[bool], available: u64) -> Result<()> {
    let required = bits.len() as u64;
    if required > available {
        return Err(StegoError::InsufficientCapacity {
            required,
            available,
        });
    }
    Ok(())
}

/// 将 `bits` 与位置逐一配对写入，位置多余的部分保持不变。
fn write_at<I>(image: &mut StegoImage, positions: I, bits: &[bool]) -> Result<WriteStats>
where
    I: Iterator<Item = BitPosition>,
{
    let layout = image.layout();
    let missing = |channel: Channel| StegoError::UnsupportedChannel { channel, layout };

    let mut stats = WriteStats::default();
    let mut current: Option<((usize, Channel), u8)> = None;

    for (pos, &bit) in positions.zip(bits) {
        let key = (pos.pixel_index, pos.channel);
        if current.map(|(k, _)| k) != Some(key) {
            if let Some(((pixel, channel), original)) = current {
                if image.sample(pixel, channel) != Some(original) {
                    stats.changed += 1;
                }
            }
            let original = image
                .sample(pos.pixel_index, pos.channel)
                .ok_or_else(|| missing(pos.channel))?;
            current = Some((key, original));
            stats.touched += 1;
        }

        let sample = image
            .sample_mut(pos.pixel_index, pos.channel)
            .ok_or_else(|| missing(pos.channel))?;
        let mask = 1u8 << pos.bit_offset;
        *sample = (*sample & !mask) | (u8::from(bit) << pos.bit_offset);
    }

    if let Some(((pixel, channel), original)) = current {
        if image.sample(pixel, channel) != Some(original) {
            stats.changed += 1;
        }
    }

    Ok(stats)
}

fn read_at<'a, I>(image: &'a StegoImage, positions: I) -> impl Iterator<Item = bool> + 'a
where
    I: Iterator<Item = BitPosition> + 'a,
{
    positions.map_while(move |pos| {
        image
            .sample(pos.pixel_index, pos.channel)
            .map(|value| (value >> pos.bit_offset) & 1 == 1)
    })
}
