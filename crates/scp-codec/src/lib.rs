//! # scp-codec
//!
//! SCP-ECG 波形解码库.
//!
//! - [`huffman`]: 码表模型、标准默认码表与自适应 Huffman 解码器
//! - [`reconstruct`]: 参考心搏与节律数据的波形重建 (抽取还原, 减除区叠加)
//!
//! 本 crate 只处理已经从段中取出的字节与参数, 段格式解析见 `scp-format`.

pub mod huffman;
pub mod reconstruct;

// 重导出常用类型
pub use huffman::{DecoderConfig, DifferenceMode, HuffmanDecoder, HuffmanTable, HuffmanTables};
pub use reconstruct::{
    BeatGeometry, EncodedLeads, LeadError, LeadStage, Reconstruction, Reconstructor, SampleRange,
    SubtractionZone,
};
