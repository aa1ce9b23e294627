//! # 像素数据
//!
//! 解码后的像素网格：行优先、逐像素交错存储的 8 位通道样本。
//! 文件格式的读写由 `image` crate 负责，这里只做与之的相互转换。

use std::fmt;

use image::{ColorType, DynamicImage, ImageBuffer, RgbImage, RgbaImage};
use log::warn;

use crate::error::{Result, StegoError};
use crate::policy::{Channel, ChannelPolicy};

/// 像素内的通道排列方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Rgb,
    Rgba,
}

impl Layout {
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Layout::Rgb => &[Channel::Red, Channel::Green, Channel::Blue],
            Layout::Rgba => &[Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha],
        }
    }

    pub fn channel_count(self) -> usize {
        self.channels().len()
    }

    /// 通道在单个像素内的样本偏移。
    pub fn offset(self, channel: Channel) -> Option<usize> {
        self.channels().iter().position(|&c| c == channel)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Rgb => f.write_str("RGB"),
            Layout::Rgba => f.write_str("RGBA"),
        }
    }
}

/// 隐写操作的载体图像。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StegoImage {
    width: u32,
    height: u32,
    layout: Layout,
    samples: Vec<u8>,
}

impl StegoImage {
    /// 由原始样本构造图像。
    ///
    /// # Errors
    ///
    /// 样本数量与 `width × height × 通道数` 不一致时返回 `BufferSize`。
    pub fn new(width: u32, height: u32, layout: Layout, samples: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(layout.channel_count()))
            .ok_or(StegoError::BufferSize {
                expected: usize::MAX,
                actual: samples.len(),
            })?;
        if samples.len() != expected {
            return Err(StegoError::BufferSize {
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            layout,
            samples,
        })
    }

    /// 全零图像。
    pub fn blank(width: u32, height: u32, layout: Layout) -> Self {
        let len = width as usize * height as usize * layout.channel_count();
        Self {
            width,
            height,
            layout,
            samples: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// 检查策略中的每个通道都存在于当前布局中。
    pub fn ensure_supports(&self, policy: &ChannelPolicy) -> Result<()> {
        match policy
            .channels()
            .iter()
            .find(|&&c| self.layout.offset(c).is_none())
        {
            Some(&channel) => Err(StegoError::UnsupportedChannel {
                channel,
                layout: self.layout,
            }),
            None => Ok(()),
        }
    }

    pub fn sample(&self, pixel_index: usize, channel: Channel) -> Option<u8> {
        self.sample_index(pixel_index, channel)
            .map(|idx| self.samples[idx])
    }

    pub fn sample_mut(&mut self, pixel_index: usize, channel: Channel) -> Option<&mut u8> {
        let idx = self.sample_index(pixel_index, channel)?;
        self.samples.get_mut(idx)
    }

    fn sample_index(&self, pixel_index: usize, channel: Channel) -> Option<usize> {
        let offset = self.layout.offset(channel)?;
        let idx = pixel_index
            .checked_mul(self.layout.channel_count())?
            .checked_add(offset)?;
        (idx < self.samples.len()).then_some(idx)
    }

    /// 从 `image` crate 的图像转换。
    ///
    /// 带 alpha 的图像转为 RGBA8，其余转为 RGB8。高于 8 位的样本会被截断到 8 位。
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let color = img.color();
        if !matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        ) {
            warn!("Narrowing {color:?} pixel data to 8 bits per channel");
        }

        if color.has_alpha() {
            img.into_rgba8().into()
        } else {
            img.into_rgb8().into()
        }
    }

    /// 转换回 `image` crate 的图像，以便编码为文件。
    pub fn into_dynamic(self) -> Result<DynamicImage> {
        let expected = self.samples.len();
        let (width, height) = (self.width, self.height);
        let image = match self.layout {
            Layout::Rgb => ImageBuffer::from_raw(width, height, self.samples)
                .map(DynamicImage::ImageRgb8),
            Layout::Rgba => ImageBuffer::from_raw(width, height, self.samples)
                .map(DynamicImage::ImageRgba8),
        };
        image.ok_or(StegoError::BufferSize {
            expected,
            actual: expected,
        })
    }
}

impl From<RgbImage> for StegoImage {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: Layout::Rgb,
            samples: img.into_raw(),
        }
    }
}

impl From<RgbaImage> for StegoImage {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: Layout::Rgba,
            samples: img.into_raw(),
        }
    }
}
