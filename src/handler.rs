//! # 命令处理逻辑模块
//!
//! 包含处理各子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::analyzer::LsbAnalyzer;
use crate::cli::{AnalyzeArgs, CapacityArgs, HideArgs, PolicyArgs, RecoverArgs, Strategy};
use crate::codec::{Codec, EdgeGuidedCodec, LsbCodec};
use crate::constants::{BITS_PER_BYTE, DOCTORED_PREFIX, RECOVERED_PREFIX};
use crate::error::StegoError;
use crate::framer::Framer;
use crate::pixels::StegoImage;
use crate::policy::ChannelPolicy;
use crate::steganography::{embed_with, extract_with};
use anyhow::{Context, Result};
use colored::Colorize;
use image::ImageFormat;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和载荷文件、调用嵌入核心函数，最后将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与编码参数的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或载荷文件。
/// * 目标文件已存在且未指定 `--force`，或目标格式不是无损格式。
/// * 图像没有足够的空间来隐藏载荷。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, DOCTORED_PREFIX, "png"));
    ensure_writable(&dest, args.force)?;
    ensure_lossless(&dest)?;

    let (codec, framer) = build_codec(&args.policy)?;
    let mut picture = load_image(&args.image)?;

    let payload = fs::read(&args.payload).with_context(|| {
        format!(
            "Unable to read payload file: {}",
            args.payload.to_string_lossy().red().bold()
        )
    })?;

    let report = embed_with(codec.as_ref(), &framer, &mut picture, &payload).map_err(|e| {
        match e {
            StegoError::InsufficientCapacity {
                required,
                available,
            } => anyhow::anyhow!(
                "Not enough space in the image to hide the payload. \nRequired: {} bits, Available: {} bits",
                required.to_string().red().bold(),
                available.to_string().green().bold()
            ),
            other => anyhow::Error::new(other).context("Failed to hide the payload in the image."),
        }
    })?;

    let output = picture
        .into_dynamic()
        .context("Failed to rebuild the image from modified pixel data.")?;
    output.save(&dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    info!(
        "{} channel values touched, {} changed",
        report.touched, report.changed
    );
    println!(
        "The payload ({} bytes, {} of {} bits used) has been successfully hidden and saved: {}",
        payload.len(),
        report.frame_bits,
        report.capacity,
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、调用提取核心函数，最后将恢复的载荷写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件，或其格式为有损格式。
/// * 图像中没有隐藏的数据，或数据已损坏。
/// * 目标文件已存在且未指定 `--force`，或无法写入。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.image, RECOVERED_PREFIX, "bin"));
    ensure_writable(&output, args.force)?;
    ensure_lossless(&args.image)?;

    let (codec, framer) = build_codec(&args.policy)?;
    let picture = load_image(&args.image)?;

    let payload = extract_with(codec.as_ref(), &framer, &picture).map_err(|e| {
        let hint = match e {
            StegoError::NoHiddenMessage(_) => "The image may not contain a hidden message, or was hidden with different options.",
            StegoError::CorruptedMessage(_) => "The hidden message appears to be damaged.",
            _ => "Failed to recover the hidden payload.",
        };
        anyhow::Error::new(e).context(format!(
            "{} ({})",
            hint,
            args.image.to_string_lossy().red().bold()
        ))
    })?;

    fs::write(&output, &payload).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The payload ({} bytes) has been successfully recovered and saved: {}",
        payload.len(),
        output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令：报告图像在给定参数下最多能隐藏多少字节。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let (codec, framer) = build_codec(&args.policy)?;
    let picture = load_image(&args.image)?;

    let capacity = codec
        .capacity(&picture)
        .context("Failed to compute the image capacity.")?;
    let max_payload = (capacity.saturating_sub(u64::from(framer.header_bits())) / BITS_PER_BYTE)
        .min(framer.max_payload_len());

    println!(
        "{}: {}x{} {}, {} bits available, up to {} payload bytes",
        args.image.to_string_lossy().bold(),
        picture.width(),
        picture.height(),
        picture.layout(),
        capacity.to_string().green().bold(),
        max_payload.to_string().green().bold()
    );
    Ok(())
}

/// 处理 'Analyze' 命令：对图像打分并报告每个候选策略的头部探测结果。
pub fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let picture = load_image(&args.image)?;
    let analysis = LsbAnalyzer::default().analyze(&picture);

    for probe in &analysis.probes {
        match probe.payload_len {
            Some(len) => println!(
                "  {}: plausible header, {} byte(s){}",
                probe.policy,
                len.to_string().yellow().bold(),
                if probe.is_text { ", UTF-8 text" } else { "" }
            ),
            None => println!("  {}: no plausible header", probe.policy),
        }
    }
    println!("  LSB pair balance: {:.3}", analysis.pair_balance);

    let likelihood = format!("{:.0}%", analysis.likelihood * 100.0);
    if analysis.likelihood >= 0.75 {
        println!(
            "{} likely contains hidden data ({})",
            args.image.to_string_lossy().bold(),
            likelihood.red().bold()
        );
    } else {
        println!(
            "{} shows no clear sign of hidden data ({})",
            args.image.to_string_lossy().bold(),
            likelihood.green().bold()
        );
    }
    Ok(())
}

/// 由命令行参数构造嵌入策略与帧格式。
pub fn build_codec(args: &PolicyArgs) -> Result<(Box<dyn Codec>, Framer)> {
    let policy = ChannelPolicy::new(args.channels.clone(), args.bits)?;
    let framer = Framer::new(args.header_bits)?;
    let codec: Box<dyn Codec> = match args.strategy {
        Strategy::Sequential => Box::new(LsbCodec::new(policy)),
        Strategy::Edge => Box::new(EdgeGuidedCodec::new(policy, args.threshold)),
    };
    Ok((codec, framer))
}

fn load_image(path: &Path) -> Result<StegoImage> {
    let img = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    Ok(StegoImage::from_dynamic(img))
}

/// 隐藏的位只能在无损格式中保留。
fn ensure_lossless(path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).with_context(|| {
        format!(
            "Unrecognised image format: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    anyhow::ensure!(
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Qoi
        ),
        "Lossy or unsupported image format {:?}: {}. \nHidden data only survives lossless formats such as PNG or BMP.",
        format,
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 在输入文件旁生成 `<prefix><名称>.<extension>`。
fn default_output(input: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    input.with_file_name(format!("{prefix}{stem}.{extension}"))
}
