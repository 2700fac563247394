//! 段头与段枚举.
//!
//! 每个段以 16 字节段头开始:
//! CRC(2) + 段号(2) + 段长度(4, 含段头) + 段版本(1) + 协议版本(1) + 保留(6).

use bytes::Bytes;
use serde::Serialize;

use crate::io::ByteReader;
use crate::sections::{
    EncodedSection, HuffmanSection, LeadSection, PatientSection, PointerSection, QrsSection,
};
use scp_core::ScpResult;

/// 段头大小 (字节)
pub const SECTION_HEADER_SIZE: usize = 16;

/// 段 0: 指针表
pub const SECTION_POINTERS: u16 = 0;
/// 段 1: 患者信息
pub const SECTION_PATIENT: u16 = 1;
/// 段 2: Huffman 码表
pub const SECTION_HUFFMAN: u16 = 2;
/// 段 3: 导联定义
pub const SECTION_LEADS: u16 = 3;
/// 段 4: QRS 位置
pub const SECTION_QRS: u16 = 4;
/// 段 5: 参考心搏
pub const SECTION_REFERENCE_BEAT: u16 = 5;
/// 段 6: 节律数据
pub const SECTION_RHYTHM: u16 = 6;
/// 段 7: 全局测量值
pub const SECTION_GLOBAL_MEASUREMENTS: u16 = 7;
/// 段 8: 诊断解释
pub const SECTION_INTERPRETATION: u16 = 8;
/// 段 10: 导联测量值
pub const SECTION_LEAD_MEASUREMENTS: u16 = 10;
/// 段 11: 通用诊断陈述
pub const SECTION_STATEMENTS: u16 = 11;

/// 段 0 中必须出现指针项的最大段号 (0-11)
pub const LAST_REQUIRED_POINTER: u16 = 11;

/// 段头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    /// 段 CRC
    pub crc: u16,
    /// 段号
    pub section_id: u16,
    /// 段长度 (含段头)
    pub section_length: u32,
    /// 段版本
    pub section_version: u8,
    /// 协议版本
    pub protocol_version: u8,
    /// 保留字节
    pub reserved: [u8; 6],
    /// 段在记录中的字节偏移 (从 0 开始)
    pub byte_offset: usize,
}

impl SectionHeader {
    /// 从读取器解析段头
    pub fn read(reader: &mut ByteReader, byte_offset: usize) -> ScpResult<Self> {
        Ok(Self {
            crc: reader.read_u16()?,
            section_id: reader.read_u16()?,
            section_length: reader.read_u32()?,
            section_version: reader.read_u8()?,
            protocol_version: reader.read_u8()?,
            reserved: reader.read_array()?,
            byte_offset,
        })
    }

    /// 段体长度
    pub fn body_length(&self) -> usize {
        (self.section_length as usize).saturating_sub(SECTION_HEADER_SIZE)
    }

    /// 段 0 中对应的指针位置 (从 1 开始)
    pub fn pointer_index(&self) -> u32 {
        self.byte_offset as u32 + 1
    }
}

/// 不解析段体的段 (测量值、诊断陈述、未知段或无法解析的段)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueSection {
    /// 段头
    pub header: SectionHeader,
    /// 原始段体
    pub body: Bytes,
}

/// 已解析的段
#[derive(Debug, Clone)]
pub enum Section {
    /// 段 0
    Pointers(PointerSection),
    /// 段 1
    Patient(PatientSection),
    /// 段 2
    Huffman(HuffmanSection),
    /// 段 3
    Leads(LeadSection),
    /// 段 4
    QrsLocations(QrsSection),
    /// 段 5
    ReferenceBeat(EncodedSection),
    /// 段 6
    Rhythm(EncodedSection),
    /// 段 7
    GlobalMeasurements(OpaqueSection),
    /// 段 8
    Interpretation(OpaqueSection),
    /// 段 10
    LeadMeasurements(OpaqueSection),
    /// 段 11
    Statements(OpaqueSection),
    /// 未定义的段号
    Unknown(OpaqueSection),
    /// 已知段号但段体无法解析
    Damaged(OpaqueSection),
}

impl Section {
    /// 段头
    pub fn header(&self) -> &SectionHeader {
        match self {
            Self::Pointers(s) => &s.header,
            Self::Patient(s) => &s.header,
            Self::Huffman(s) => &s.header,
            Self::Leads(s) => &s.header,
            Self::QrsLocations(s) => &s.header,
            Self::ReferenceBeat(s) | Self::Rhythm(s) => &s.header,
            Self::GlobalMeasurements(s)
            | Self::Interpretation(s)
            | Self::LeadMeasurements(s)
            | Self::Statements(s)
            | Self::Unknown(s)
            | Self::Damaged(s) => &s.header,
        }
    }

    /// 段号
    pub fn id(&self) -> u16 {
        self.header().section_id
    }

    /// 是否为无法解析的段
    pub fn is_damaged(&self) -> bool {
        matches!(self, Self::Damaged(_))
    }

    /// 段名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Damaged(_) => "damaged",
            _ => section_name(self.id()),
        }
    }
}

/// 按段号获取段名称
pub fn section_name(section_id: u16) -> &'static str {
    match section_id {
        SECTION_POINTERS => "pointers",
        SECTION_PATIENT => "patient",
        SECTION_HUFFMAN => "huffman",
        SECTION_LEADS => "leads",
        SECTION_QRS => "qrs_locations",
        SECTION_REFERENCE_BEAT => "reference_beat",
        SECTION_RHYTHM => "rhythm",
        SECTION_GLOBAL_MEASUREMENTS => "global_measurements",
        SECTION_INTERPRETATION => "interpretation",
        9 => "manufacturer_interpretation",
        SECTION_LEAD_MEASUREMENTS => "lead_measurements",
        SECTION_STATEMENTS => "statements",
        12..=127 => "reserved",
        _ => "manufacturer",
    }
}
