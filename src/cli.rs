//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

use crate::constants::{DEFAULT_BITS_PER_CHANNEL, DEFAULT_EDGE_THRESHOLD, DEFAULT_HEADER_BITS};
use crate::policy::Channel;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在无损格式图像 (如 PNG, BMP) 中隐藏或恢复任意数据。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在无损格式图像 (如 PNG, BMP) 中隐藏或恢复任意数据。"
)]
pub struct Cli {
    /// 提高日志详细程度 (-v 为 info，-vv 为 debug)。
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在无损格式图像 (如 PNG, BMP) 中隐藏文件内容。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的数据。
    Recover(RecoverArgs),

    /// 显示图像在给定策略下的容量。
    Capacity(CapacityArgs),

    /// 估计图像包含隐藏数据的可能性。
    Analyze(AnalyzeArgs),
}

/// 选择像素的策略。
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// 逐行遍历全部像素。
    #[default]
    Sequential,
    /// 只使用边缘与纹理丰富的像素。
    Edge,
}

/// 隐藏与恢复共用的编码参数，两端必须一致。
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// 参与隐写的通道，按顺序以逗号分隔 (r, g, b, a)。
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [Channel::Red, Channel::Green, Channel::Blue]
    )]
    pub channels: Vec<Channel>,

    /// 每个通道使用的低位数量 (1-8)。
    #[arg(long, default_value_t = DEFAULT_BITS_PER_CHANNEL)]
    pub bits: u8,

    /// 长度头部的位宽 (1-64)。
    #[arg(long, default_value_t = DEFAULT_HEADER_BITS)]
    pub header_bits: u8,

    /// 像素选择策略。
    #[arg(long, value_enum, default_value_t = Strategy::Sequential)]
    pub strategy: Strategy,

    /// `edge` 策略的重要性阈值 (0-255)。
    #[arg(long, default_value_t = DEFAULT_EDGE_THRESHOLD)]
    pub threshold: u8,
}

impl Default for PolicyArgs {
    fn default() -> Self {
        Self {
            channels: vec![Channel::Red, Channel::Green, Channel::Blue],
            bits: DEFAULT_BITS_PER_CHANNEL,
            header_bits: DEFAULT_HEADER_BITS,
            strategy: Strategy::Sequential,
            threshold: DEFAULT_EDGE_THRESHOLD,
        }
    }
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的数据文件路径。
    #[arg(short, long)]
    pub payload: PathBuf,

    /// 隐写完成后，保存结果图像的输出路径 (默认为输入旁的 doctored_<名称>.png)。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复数据后的保存路径 (默认为输入旁的 recovered_<名称>.bin)。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 要检查的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// 'analyze' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// 要分析的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,
}
