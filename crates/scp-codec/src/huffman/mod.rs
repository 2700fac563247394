//! SCP-ECG Huffman 熵解码.
//!
//! - [`table`]: 码字结构、码表集合与标准默认码表
//! - [`decoder`]: 逐采样解码器, 负责切表、字面量读取、差分还原与幅度缩放

pub mod decoder;
pub mod table;

pub use decoder::{DecoderConfig, DifferenceMode, HuffmanDecoder};
pub use table::{DEFAULT_TABLE, HuffmanCode, HuffmanTable, HuffmanTables};

#[cfg(test)]
pub(crate) mod testutil;
