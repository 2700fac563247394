//! 日志系统集成测试.
//!
//! 全局订阅器只能初始化一次, 本文件只保留一个调用 init() 的测试.

use std::fs;

use scp::logging::{LoggingConfig, current_log_path, init};

#[test]
fn test_init_创建日志文件并清理过期日志() {
    let dir = tempfile::tempdir().unwrap();
    let expired = dir.path().join("scp-test.2000-01-01.log");
    fs::write(&expired, "old").unwrap();

    let config = LoggingConfig {
        level: "debug".to_string(),
        directory: dir.path().to_string_lossy().to_string(),
        file_prefix: "scp-test".to_string(),
        retention_days: 7,
        ..Default::default()
    };
    init(&config).unwrap();

    assert!(!expired.exists(), "过期日志应被删除");
    let today = chrono::Local::now().date_naive();
    let log_file = current_log_path(dir.path(), "scp-test", today);
    assert!(log_file.exists(), "日志文件应该被创建: {:?}", log_file);

    // 再次初始化返回错误
    assert!(init(&config).is_err());
}
