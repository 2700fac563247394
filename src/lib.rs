//! # scp
//!
//! 纯 Rust 实现的 SCP-ECG (EN 1064) 心电记录解码工具集.
//!
//! - **分帧**: 记录头、段头、CRC 校验与段 0 指针表交叉校验
//! - **段解析**: 患者信息、Huffman 码表、导联定义、QRS 位置、压缩波形
//! - **波形重建**: 自适应 Huffman 解码、差分还原、抽取还原与参考心搏叠加
//!
//! # 快速开始
//!
//! ```rust,no_run
//! let record = scp::decode_file("record.scp").unwrap();
//! println!(
//!     "{} 个导联, 采样间隔 {} µs",
//!     record.lead_count(),
//!     record.sample_interval_us()
//! );
//! for warning in &record.warnings {
//!     println!("告警: {warning}");
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `scp-core` | 错误与告警类型, 比特流读取, CRC |
//! | `scp-codec` | Huffman 解码与波形重建 |
//! | `scp-format` | 记录分帧, 段解析与整条记录解码 |

use std::path::Path;

pub mod logging;

/// 核心类型与工具
pub use scp_core as core;

/// Huffman 解码与波形重建
pub use scp_codec as codec;

/// 记录格式与解码
pub use scp_format as format;

pub use scp_core::{DecodeWarning, ScpError, ScpResult};
pub use scp_format::{DecodeOptions, DecodedRecord, MissingHuffmanPolicy, decode, decode_with};

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 读取并解码整个记录文件
pub fn decode_file(path: impl AsRef<Path>) -> ScpResult<DecodedRecord> {
    decode_file_with(path, &DecodeOptions::default())
}

/// 按给定选项读取并解码整个记录文件
pub fn decode_file_with(path: impl AsRef<Path>, options: &DecodeOptions) -> ScpResult<DecodedRecord> {
    let data = std::fs::read(path)?;
    scp_format::decode_bytes(data.into(), options)
}
