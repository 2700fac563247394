//! 非致命告警.
//!
//! 解码过程中发现的可恢复问题 (指针表不一致, 计数不符, CRC 错误等)
//! 收集为告警随解码结果一并返回, 解码使用已读到的部分数据继续进行.

use thiserror::Error;

/// 解码告警
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    /// 记录 CRC 不匹配
    #[error("记录 CRC 不匹配: 存储值 0x{stored:04X}, 计算值 0x{computed:04X}")]
    RecordCrcMismatch { stored: u16, computed: u16 },

    /// 段 CRC 不匹配
    #[error("段 {section_id} CRC 不匹配: 存储值 0x{stored:04X}, 计算值 0x{computed:04X}")]
    SectionCrcMismatch {
        section_id: u16,
        stored: u16,
        computed: u16,
    },

    /// 缓冲区长度超过记录声明长度, 多余字节被忽略
    #[error("记录声明长度 {declared} 字节, 缓冲区有 {available} 字节, 多余部分已忽略")]
    TrailingBytes { declared: usize, available: usize },

    /// 同一段号重复出现, 仅保留第一个
    #[error("段 {section_id} 重复出现, 已忽略后续副本")]
    DuplicateSection { section_id: u16 },

    /// 段体无法解析, 按不透明段保留
    #[error("段 {section_id} 无法解析: {reason}")]
    SectionUnreadable { section_id: u16, reason: String },

    /// 记录中没有段 0, 无法交叉校验
    #[error("缺少段 0 指针表, 跳过布局校验")]
    MissingPointerTable,

    /// 段 0 中的长度或位置与实际布局不符
    #[error(
        "段 {section_id} 指针不符: 指针表记录 长度={pointer_length} 位置={pointer_index}, \
         实际 长度={actual_length} 位置={actual_index}"
    )]
    PointerMismatch {
        section_id: u16,
        pointer_length: u32,
        pointer_index: u32,
        actual_length: u32,
        actual_index: u32,
    },

    /// 实际存在的段没有对应的指针项
    #[error("段 {section_id} 存在但未被段 0 引用")]
    UnreferencedSection { section_id: u16 },

    /// 同一段号有多个指针项, 只有第一个参与校验
    #[error("段 0 中段 {section_id} 的指针项重复 (长度={length}, 位置={index}), 已忽略")]
    DuplicatePointer {
        section_id: u16,
        length: u32,
        index: u32,
    },

    /// 指针项指向不存在的段
    #[error("段 0 引用了不存在的段 {section_id} (长度={length}, 位置={index})")]
    DanglingPointer {
        section_id: u16,
        length: u32,
        index: u32,
    },

    /// 段 0 缺少必需段 (0-11) 的指针项
    #[error("段 0 缺少段 {section_id} 的指针项")]
    MissingPointer { section_id: u16 },

    /// 声明的条目数与实际可读字节不符
    #[error("段 {section_id} {item} 数量不符: 声明 {declared}, 实际读取 {read}")]
    CountMismatch {
        section_id: u16,
        item: &'static str,
        declared: usize,
        read: usize,
    },

    /// 采样区间首尾颠倒, 已丢弃
    #[error("段 {section_id} 区间非法: start={start} > end={end}")]
    MalformedRange { section_id: u16, start: u32, end: u32 },

    /// 只允许出现一次的字段重复出现
    #[error("段 1 字段 {tag} 重复出现 {count} 次")]
    RepeatedField { tag: u8, count: usize },

    /// 参考心搏偏移越界, 这些采样未叠加参考心搏
    #[error("导联 {lead} 减除区 {zone}: {samples} 个采样的参考心搏偏移越界")]
    ReferenceOffsetOutOfRange {
        lead: usize,
        zone: usize,
        samples: usize,
    },
}
