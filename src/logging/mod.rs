//! 日志初始化模块.
//!
//! 双输出:
//! - console: 彩色, 写到 stderr, 默认 warn 级别 (stdout 留给工具输出)
//! - file: 无色, 默认 info, 可通过 `level` 或 `SCP_LOG` 环境变量调整
//!
//! 日志文件按天滚动, 文件名为 `{prefix}.{YYYY-MM-DD}.log`;
//! 初始化时删除超过保留天数的旧日志.
//!
//! 库 crate 通过 `log` 门面输出日志, 由 tracing-subscriber 桥接到这里的两个输出.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 覆盖文件日志级别的环境变量
pub const LOG_ENV: &str = "SCP_LOG";

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 文件日志级别 (EnvFilter 语法)
    pub level: String,
    /// 控制台日志级别
    pub console_level: String,
    /// 日志目录
    pub directory: String,
    /// 日志文件前缀
    pub file_prefix: String,
    /// 日志保留天数, 0 表示不清理
    pub retention_days: i64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_level: "warn".to_string(),
            directory: "logs".to_string(),
            file_prefix: "scp".to_string(),
            retention_days: 30,
        }
    }
}

impl LoggingConfig {
    /// 以指定前缀和 `-v` 次数创建配置
    pub fn for_tool(file_prefix: &str, verbosity: u8) -> Self {
        Self {
            level: verbosity_level(verbosity).to_string(),
            file_prefix: file_prefix.to_string(),
            ..Default::default()
        }
    }
}

/// `-v` 次数对应的日志级别: 0=info, 1=debug, 2+=trace
pub fn verbosity_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化日志系统
///
/// 全局订阅器只能设置一次, 重复调用返回错误.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let directory = Path::new(&config.directory);
    fs::create_dir_all(directory)
        .with_context(|| format!("创建日志目录失败, path={}", directory.display()))?;

    let removed = prune_logs(
        directory,
        &config.file_prefix,
        config.retention_days,
        Local::now().date_naive(),
    )?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(directory)
        .context("创建日志文件失败")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(ConsoleFormatter)
        .with_filter(EnvFilter::new(&config.console_level));

    let file_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.level));
    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统已初始化")?;

    if removed > 0 {
        tracing::info!("已清理 {} 个过期日志文件", removed);
    }
    Ok(())
}

/// 删除早于保留期限的日志文件, 返回删除数量
pub fn prune_logs(
    directory: &Path,
    prefix: &str,
    retention_days: i64,
    today: NaiveDate,
) -> Result<usize> {
    if retention_days <= 0 || !directory.exists() {
        return Ok(0);
    }
    let cutoff = today - ChronoDuration::days(retention_days);

    let mut removed = 0;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(date) = parse_log_date(&file_name, prefix) else {
            continue;
        };
        if date < cutoff && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

/// 从 `{prefix}.{YYYY-MM-DD}.log` 中取出日期
fn parse_log_date(file_name: &str, prefix: &str) -> Option<NaiveDate> {
    let date_part = file_name
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    if date_part.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// 当天日志文件路径
pub fn current_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

/// Console 格式: 彩色, 带时间戳和源码位置
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write_timestamp(&mut writer)?;
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "{}{:5}\x1b[0m {}:{} > ",
            color,
            meta.level().to_string(),
            meta.file().unwrap_or("unknown"),
            meta.line().unwrap_or(0)
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// File 格式: 无色, 不带源码位置
struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        write_timestamp(&mut writer)?;
        write!(writer, "{:5} > ", event.metadata().level().to_string())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn write_timestamp(writer: &mut Writer<'_>) -> std::fmt::Result {
    let now = Local::now();
    write!(
        writer,
        "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        match NaiveDate::from_ymd_opt(y, m, d) {
            Some(date) => date,
            None => panic!("测试日期初始化失败"),
        }
    }

    #[test]
    fn test_current_log_path() {
        let path = current_log_path(Path::new("logs"), "scp-probe", date(2026, 2, 6));
        assert_eq!(path, PathBuf::from("logs/scp-probe.2026-02-06.log"));
    }

    #[test]
    fn test_parse_log_date() {
        assert_eq!(
            parse_log_date("scp-probe.2026-02-06.log", "scp-probe"),
            Some(date(2026, 2, 6))
        );
        assert!(parse_log_date("scp-probe.log", "scp-probe").is_none());
        assert!(parse_log_date("other.2026-02-06.log", "scp-probe").is_none());
        assert!(parse_log_date("scp-probe.2026-2-6.log", "scp-probe").is_none());
    }

    #[test]
    fn test_prune_logs() {
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(err) => panic!("创建临时目录失败: {}", err),
        };
        let dir = temp_dir.path();
        let today = date(2026, 3, 31);
        for name in [
            "scp.2026-01-01.log",
            "scp.2026-03-01.log",
            "scp.2026-03-30.log",
            "other.2026-01-01.log",
            "notes.txt",
        ] {
            fs::write(dir.join(name), b"x").unwrap();
        }

        let removed = prune_logs(dir, "scp", 7, today).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.join("scp.2026-01-01.log").exists());
        assert!(!dir.join("scp.2026-03-01.log").exists());
        assert!(dir.join("scp.2026-03-30.log").exists());
        assert!(dir.join("other.2026-01-01.log").exists());
        assert!(dir.join("notes.txt").exists());

        // 保留天数为 0 时不清理
        assert_eq!(prune_logs(dir, "other", 0, today).unwrap(), 0);
    }

    #[test]
    fn test_config_defaults() {
        let config: LoggingConfig = serde_json::from_str(r#"{ "file_prefix": "x" }"#).unwrap();
        assert_eq!(config.file_prefix, "x");
        assert_eq!(config.level, "info");
        assert_eq!(config.retention_days, 30);

        let config = LoggingConfig::for_tool("scp-probe", 2);
        assert_eq!(config.level, "trace");
        assert_eq!(config.console_level, "warn");
    }
}
