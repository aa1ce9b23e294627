use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use lsb_stego::{
    cli::{Cli, Commands},
    handler::{handle_analyze, handle_capacity, handle_hide, handle_recover},
};

/// 初始化日志：默认只输出警告，`-v` 为 info，`-vv` 及以上为 debug。
/// `RUST_LOG` 环境变量优先于命令行参数。
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
        Commands::Capacity(args) => handle_capacity(args),
        Commands::Analyze(args) => handle_analyze(args),
    }
}
