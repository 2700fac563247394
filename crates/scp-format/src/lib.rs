//! # scp-format
//!
//! SCP-ECG 记录格式库, 负责记录分帧、段体解析、段 0 布局校验和整条记录解码.
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! let data = std::fs::read("record.scp").unwrap();
//! let record = scp_format::decode(&data).unwrap();
//! for (name, samples) in record.lead_names().iter().zip(&record.lead_samples) {
//!     println!("{name}: {} 个采样", samples.len());
//! }
//! ```

pub mod decode;
pub mod io;
pub mod options;
pub mod record;
pub mod section;
pub mod sections;
pub mod validate;

// 重导出常用类型
pub use decode::{DecodedRecord, decode, decode_bytes, decode_with};
pub use io::ByteReader;
pub use options::{DecodeOptions, MissingHuffmanPolicy};
pub use record::{Record, RecordHeader, SectionSpan};
pub use section::{OpaqueSection, Section, SectionHeader};
