//! 各段段体解析器.
//!
//! 段体按段号分派到对应的解析器. 解析器只读取段体 (不含段头),
//! 返回已解析的结构; 段体长度不足时返回错误, 由调用方把该段保留为
//! [`Section::Damaged`].

pub mod encoded;
pub mod huffman;
pub mod leads;
pub mod patient;
pub mod pointer;
pub mod qrs;

pub use encoded::EncodedSection;
pub use huffman::HuffmanSection;
pub use leads::{LeadDescriptor, LeadFlags, LeadSection, lead_name};
pub use patient::{PatientSection, TagDescriptor};
pub use pointer::{PointerEntry, PointerSection};
pub use qrs::QrsSection;

use bytes::Bytes;
use log::{debug, warn};
use scp_core::{DecodeWarning, ScpResult};

use crate::io::ByteReader;
use crate::section::*;

/// 段间依赖的解析上下文
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext {
    /// 段 3 声明的导联数, 段 5/6 按它读取每导联长度表
    pub lead_count: Option<usize>,
}

/// 段体解析结果
pub(crate) struct Parsed<T> {
    pub value: T,
    /// 段体已消耗的字节数, 剩余部分为填充
    pub consumed: usize,
}

/// 解析一个段的段体
///
/// 段体无法解析时返回错误, 调用方负责降级为不透明段.
pub(crate) fn parse_section(
    header: SectionHeader,
    body: Bytes,
    ctx: &ParseContext,
    warnings: &mut Vec<DecodeWarning>,
) -> ScpResult<Parsed<Section>> {
    let mut reader = ByteReader::for_section(body.clone(), header.section_id);
    let opaque = |body: Bytes| OpaqueSection { header, body };

    let section = match header.section_id {
        SECTION_POINTERS => Section::Pointers(PointerSection::read(header, &mut reader)?),
        SECTION_PATIENT => {
            Section::Patient(PatientSection::read(header, &mut reader, warnings)?)
        }
        SECTION_HUFFMAN => Section::Huffman(HuffmanSection::read(header, &mut reader)?),
        SECTION_LEADS => Section::Leads(LeadSection::read(header, &mut reader, warnings)?),
        SECTION_QRS => Section::QrsLocations(QrsSection::read(header, &mut reader, warnings)?),
        SECTION_REFERENCE_BEAT => {
            Section::ReferenceBeat(EncodedSection::read(header, &mut reader, ctx, warnings)?)
        }
        SECTION_RHYTHM => {
            Section::Rhythm(EncodedSection::read(header, &mut reader, ctx, warnings)?)
        }
        SECTION_GLOBAL_MEASUREMENTS => Section::GlobalMeasurements(opaque(take_all(&mut reader))),
        SECTION_INTERPRETATION => Section::Interpretation(opaque(take_all(&mut reader))),
        SECTION_LEAD_MEASUREMENTS => Section::LeadMeasurements(opaque(take_all(&mut reader))),
        SECTION_STATEMENTS => Section::Statements(opaque(take_all(&mut reader))),
        _ => Section::Unknown(opaque(take_all(&mut reader))),
    };

    let consumed = reader.position();
    debug!(
        "段 {} ({}) 解析完成: 段体 {} 字节, 填充 {} 字节",
        header.section_id,
        section.name(),
        consumed,
        body.len() - consumed
    );
    Ok(Parsed {
        value: section,
        consumed,
    })
}

fn take_all(reader: &mut ByteReader) -> Bytes {
    reader.read_bytes_up_to(reader.remaining())
}

/// 声明数量多于可读数量时记录告警
pub(crate) fn check_count(
    warnings: &mut Vec<DecodeWarning>,
    section_id: u16,
    item: &'static str,
    declared: usize,
    read: usize,
) {
    if declared != read {
        let warning = DecodeWarning::CountMismatch {
            section_id,
            item,
            declared,
            read,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }
}
