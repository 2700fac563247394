//! scp-probe - SCP-ECG 记录探测工具
//!
//! 解码一条 SCP-ECG 记录, 输出段布局、导联、波形参数与告警.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use scp::logging::{self, LoggingConfig};
use scp_format::DecodeOptions;

mod report;

/// SCP-ECG 记录探测工具
#[derive(Parser, Debug)]
#[command(name = "scp-probe", version, about = "纯 Rust SCP-ECG 心电记录探测工具")]
struct Cli {
    /// 输入文件路径
    input: Option<String>,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 每个导联输出的采样数
    #[arg(long, default_value_t = 0)]
    samples: usize,

    /// 解码选项配置文件 (JSON)
    #[arg(long)]
    options: Option<PathBuf>,

    /// 跳过 CRC 校验
    #[arg(long)]
    no_crc: bool,

    /// 跳过段 0 布局校验
    #[arg(long)]
    no_validate: bool,

    /// 并行解码各导联
    #[arg(long)]
    parallel: bool,

    /// 文件日志详细程度 (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// 静默模式 (只输出探测结果)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let Some(input_path) = cli.input.as_deref() else {
        print_banner();
        return;
    };

    if let Err(e) = logging::init(&LoggingConfig::for_tool("scp-probe", cli.verbose)) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    if !cli.quiet {
        eprintln!(
            "scp-probe 版本 {} -- 纯 Rust SCP-ECG 探测工具",
            scp::version()
        );
        eprintln!("输入文件: {input_path}");
    }

    let options = match load_options(&cli) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("错误: {e}");
            process::exit(1);
        }
    };
    log::debug!("解码选项: {:?}", options);

    let record = match scp::decode_file_with(input_path, &options) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("错误: 无法解码记录 '{input_path}': {e}");
            process::exit(1);
        }
    };

    let output = report::build(input_path, &record, cli.samples);
    if cli.json {
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                process::exit(1);
            }
        }
    } else {
        report::print_text(&output);
    }
}

/// 读取配置文件并应用命令行覆盖
fn load_options(cli: &Cli) -> Result<DecodeOptions, String> {
    let mut options = match &cli.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("无法读取配置文件 '{}': {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("配置文件格式错误 '{}': {e}", path.display()))?
        }
        None => DecodeOptions::default(),
    };
    if cli.no_crc {
        options.verify_crc = false;
    }
    if cli.no_validate {
        options.validate_pointers = false;
    }
    if cli.parallel {
        options.parallel_leads = true;
    }
    Ok(options)
}

/// 打印版本横幅
fn print_banner() {
    println!(
        "scp-probe 版本 {} -- 纯 Rust SCP-ECG 探测工具",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("用法: scp-probe [选项] <输入文件>");
    println!();
    println!("选项:");
    println!("  --json            以 JSON 格式输出");
    println!("  --samples <N>     每个导联输出前 N 个采样");
    println!("  --options <FILE>  从 JSON 文件读取解码选项");
    println!("  --no-crc          跳过 CRC 校验");
    println!("  --no-validate     跳过段 0 布局校验");
    println!("  --parallel        并行解码各导联");
    println!("  -v, -vv           提高文件日志详细程度");
    println!("  -q, --quiet       静默模式");
    println!();
    println!("使用 --help 查看完整用法.");
}
