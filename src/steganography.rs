//! # 嵌入与提取
//!
//! 将载荷分帧后写入像素低位，或从像素低位读回载荷。
//! 嵌入是全有或全无的：容量不足时在修改任何像素之前失败。

use log::{debug, info};

use crate::codec::{Codec, LsbCodec};
use crate::error::{Result, StegoError};
use crate::framer::Framer;
use crate::pixels::StegoImage;
use crate::policy::ChannelPolicy;

/// 一次成功嵌入的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedReport {
    /// 帧的总位数 (头部 + 载荷)。
    pub frame_bits: u64,
    /// 图像在该策略下的总容量 (位)。
    pub capacity: u64,
    /// 被写入的通道值数量，等于 `ceil(frame_bits / bits_per_channel)`。
    pub touched: usize,
    /// 数值实际发生变化的通道值数量。
    pub changed: usize,
}

/// 以默认帧格式和逐行 LSB 策略嵌入载荷。
pub fn embed(
    image: &mut StegoImage,
    payload: &[u8],
    policy: &ChannelPolicy,
) -> Result<EmbedReport> {
    embed_with(
        &LsbCodec::new(policy.clone()),
        &Framer::default(),
        image,
        payload,
    )
}

/// 以默认帧格式和逐行 LSB 策略提取载荷。
pub fn extract(image: &StegoImage, policy: &ChannelPolicy) -> Result<Vec<u8>> {
    extract_with(&LsbCodec::new(policy.clone()), &Framer::default(), image)
}

/// 使用任意策略与帧格式嵌入载荷。
///
/// # Errors
///
/// * `PayloadTooLarge` - 载荷长度超出头部的表示范围。
/// * `InsufficientCapacity` - 帧的位数超过图像容量，此时图像保持原样。
/// * `UnsupportedChannel` - 策略中的通道不存在于图像中。
pub fn embed_with<C>(
    codec: &C,
    framer: &Framer,
    image: &mut StegoImage,
    payload: &[u8],
) -> Result<EmbedReport>
where
    C: Codec + ?Sized,
{
    let bits = framer.frame(payload)?;
    let frame_bits = bits.len() as u64;
    let capacity = codec.capacity(image)?;

    if frame_bits > capacity {
        return Err(StegoError::InsufficientCapacity {
            required: frame_bits,
            available: capacity,
        });
    }

    let stats = codec.write_bits(image, &bits)?;
    info!(
        "Embedded {} payload bytes as a {frame_bits}-bit frame ({capacity} bits available)",
        payload.len()
    );
    debug!(
        "{} channel values written, {} changed",
        stats.touched, stats.changed
    );

    Ok(EmbedReport {
        frame_bits,
        capacity,
        touched: stats.touched,
        changed: stats.changed,
    })
}

/// 使用任意策略与帧格式提取载荷。
///
/// 只读取头部声明所需的位，不会遍历整个容量。
///
/// # Errors
///
/// * `NoHiddenMessage` - 容量不足一个头部，或头部声明的长度超出图像容量。
/// * `CorruptedMessage` - 头部看似有效，但载荷无法完整读取。
pub fn extract_with<C>(codec: &C, framer: &Framer, image: &StegoImage) -> Result<Vec<u8>>
where
    C: Codec + ?Sized,
{
    let capacity = codec.capacity(image)?;
    let header_bits = u64::from(framer.header_bits());
    if capacity < header_bits {
        return Err(StegoError::NoHiddenMessage(format!(
            "image holds {capacity} bits, fewer than the {header_bits}-bit length header"
        )));
    }

    let mut bits = codec.read_bits(image)?;
    let declared = framer
        .read_header(&mut bits)
        .map_err(|e| StegoError::NoHiddenMessage(e.to_string()))?;

    let plausible = framer
        .frame_len(declared)
        .is_ok_and(|needed| needed <= capacity);
    if !plausible {
        debug!("Rejecting header declaring {declared} bytes against {capacity} bits of capacity");
        return Err(StegoError::NoHiddenMessage(format!(
            "length header declares {declared} bytes, more than the image can hold"
        )));
    }

    let payload = framer.read_payload(declared, bits).map_err(|e| match e {
        StegoError::TruncatedStream { .. } => StegoError::CorruptedMessage(e.to_string()),
        other => other,
    })?;

    info!("Extracted {} payload bytes", payload.len());
    Ok(payload)
}

/// 提取载荷并按 UTF-8 解码。
///
/// # Errors
///
/// 除 [`extract_with`] 的错误外，载荷不是合法 UTF-8 时返回 `CorruptedMessage`。
pub fn extract_text<C>(codec: &C, framer: &Framer, image: &StegoImage) -> Result<String>
where
    C: Codec + ?Sized,
{
    let payload = extract_with(codec, framer, image)?;
    String::from_utf8(payload)
        .map_err(|e| StegoError::CorruptedMessage(format!("payload is not valid UTF-8: {e}")))
}
