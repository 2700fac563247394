//! # scp-core
//!
//! SCP-ECG 解码工具集核心库, 提供错误与告警类型、比特流读取和 CRC 校验.
//!
//! 本 crate 不依赖具体段格式, 为 `scp-codec` 与 `scp-format` 提供底层基础设施.

pub mod bitreader;
pub mod crc;
pub mod error;
pub mod warning;

// 重导出常用类型
pub use error::{ScpError, ScpResult};
pub use warning::DecodeWarning;
