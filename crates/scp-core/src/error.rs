//! 统一错误类型定义.
//!
//! 所有 SCP crate 共用的硬错误类型. 硬错误会中止当前解码单元
//! (单个导联, 或者整条记录的分帧阶段); 可恢复的问题见 [`crate::warning`].

use thiserror::Error;

/// SCP-ECG 解码统一错误类型
#[derive(Debug, Error)]
pub enum ScpError {
    /// 数据截断: 读取所需字节数超过剩余可用字节
    #[error("数据截断: 需要 {needed} 字节, 剩余 {available} 字节")]
    Truncated {
        /// 需要的字节数
        needed: usize,
        /// 实际可用的字节数
        available: usize,
    },

    /// 段体读取越过了段头声明的长度
    #[error("段 {section_id} 越界: 声明长度 {declared} 字节, 实际需要 {requested} 字节")]
    SectionOverrun {
        /// 段号
        section_id: u16,
        /// 段头声明的长度
        declared: usize,
        /// 实际需要的长度
        requested: usize,
    },

    /// Huffman 比特流中找不到匹配的前缀
    #[error("Huffman 解码失败: {bits} 位前缀无匹配码字")]
    NoMatchingPrefix {
        /// 已读取的前缀位数
        bits: u32,
    },

    /// Huffman 比特流在码字中途耗尽
    #[error("Huffman 比特流耗尽: 已解码 {decoded} 个采样")]
    BitsExhausted {
        /// 耗尽前已解码的采样数
        decoded: usize,
    },

    /// 切表码指向不存在的 Huffman 表
    #[error("Huffman 切表失败: 表号 {table} 不存在 (共 {available} 张表)")]
    UnknownTable {
        /// 目标表号 (从 1 开始)
        table: i32,
        /// 可用表数量
        available: usize,
    },

    /// 无法计算采样数 (采样间隔为 0 等)
    #[error("无法计算采样数: {0}")]
    SampleCount(String),

    /// 解码所需的段缺失或无法解析
    #[error("缺少段 {0}")]
    MissingSection(u16),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达比特流末尾
    #[error("已到达流末尾")]
    Eof,
}

/// SCP-ECG 统一 Result 类型
pub type ScpResult<T> = Result<T, ScpError>;
