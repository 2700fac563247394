//! 记录分帧.
//!
//! 记录头 6 字节: CRC(2) + 记录长度(4). 其后是首尾相接的段, 每段长度
//! 由段头给出. 分帧分两步:
//! 1. 按物理顺序切出所有段 (段头 + 段体), 记录布局与 CRC 校验结果
//! 2. 按依赖顺序解析段体: 段 3 先于段 5/6, 段 0 最后
//!
//! 记录长度超出缓冲区、剩余字节不足一个段头、段长度小于 16 或段越过
//! 记录末尾都是致命错误; 单个段体无法解析时该段降级为不透明段.

use std::collections::BTreeSet;

use bytes::Bytes;
use log::{debug, warn};
use scp_core::crc::crc16_ccitt;
use scp_core::{DecodeWarning, ScpError, ScpResult};
use serde::Serialize;

use crate::io::ByteReader;
use crate::section::{OpaqueSection, SECTION_HEADER_SIZE, SECTION_POINTERS, Section, SectionHeader};
use crate::sections::{ParseContext, parse_section};

/// 记录头大小 (字节)
pub const RECORD_HEADER_SIZE: usize = 6;

/// 记录头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    /// 记录 CRC (覆盖记录长度字段到记录末尾)
    pub crc: u16,
    /// 记录总长度 (含记录头)
    pub record_length: u32,
}

/// 段在记录中的物理布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionSpan {
    /// 段号
    pub section_id: u16,
    /// 段头首字节的记录偏移
    pub offset: usize,
    /// 段长度 (含段头)
    pub length: usize,
    /// 段体中被解析消耗的字节数
    pub consumed: usize,
    /// 段体末尾未被解析的填充字节数
    pub padding: usize,
    /// 是否为重复出现而被忽略的段
    pub duplicate: bool,
}

/// 分帧结果
#[derive(Debug, Clone)]
pub struct Record {
    /// 记录头
    pub header: RecordHeader,
    /// 已解析的段 (物理顺序, 不含重复段)
    pub sections: Vec<Section>,
    /// 所有段的物理布局 (物理顺序, 含重复段)
    pub spans: Vec<SectionSpan>,
    /// 分帧与段解析告警
    pub warnings: Vec<DecodeWarning>,
}

/// 切分后尚未解析的段
struct RawSection {
    header: SectionHeader,
    body: Bytes,
    span: usize,
}

impl Record {
    /// 从完整记录字节中分帧并解析所有段
    pub fn parse(data: Bytes, verify_crc: bool) -> ScpResult<Self> {
        let mut warnings = Vec::new();
        let header = read_record_header(&data)?;
        let record_length = header.record_length as usize;

        if data.len() > record_length {
            push_warning(
                &mut warnings,
                DecodeWarning::TrailingBytes {
                    declared: record_length,
                    available: data.len(),
                },
            );
        }
        if verify_crc {
            let computed = crc16_ccitt(&data[2..record_length]);
            if computed != header.crc {
                push_warning(
                    &mut warnings,
                    DecodeWarning::RecordCrcMismatch {
                        stored: header.crc,
                        computed,
                    },
                );
            }
        }

        let (raw, mut spans) = split_sections(&data, record_length, verify_crc, &mut warnings)?;
        let sections = parse_bodies(raw, &mut spans, &mut warnings);

        debug!(
            "记录分帧完成: {} 字节, {} 个段, {} 条告警",
            record_length,
            sections.len(),
            warnings.len()
        );
        Ok(Self {
            header,
            sections,
            spans,
            warnings,
        })
    }

    /// 按段号查找段
    pub fn section(&self, section_id: u16) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == section_id)
    }
}

fn read_record_header(data: &Bytes) -> ScpResult<RecordHeader> {
    let mut reader = ByteReader::new(data.clone());
    let header = RecordHeader {
        crc: reader.read_u16()?,
        record_length: reader.read_u32()?,
    };
    let record_length = header.record_length as usize;
    if record_length < RECORD_HEADER_SIZE {
        return Err(ScpError::InvalidData(format!(
            "记录长度 {} 小于记录头长度",
            record_length
        )));
    }
    if record_length > data.len() {
        return Err(ScpError::Truncated {
            needed: record_length,
            available: data.len(),
        });
    }
    Ok(header)
}

/// 按物理顺序切出所有段
fn split_sections(
    data: &Bytes,
    record_length: usize,
    verify_crc: bool,
    warnings: &mut Vec<DecodeWarning>,
) -> ScpResult<(Vec<RawSection>, Vec<SectionSpan>)> {
    let mut raw = Vec::new();
    let mut spans = Vec::new();
    let mut seen = BTreeSet::new();
    let mut offset = RECORD_HEADER_SIZE;

    while offset < record_length {
        let left = record_length - offset;
        if left < SECTION_HEADER_SIZE {
            return Err(ScpError::Truncated {
                needed: SECTION_HEADER_SIZE,
                available: left,
            });
        }

        let mut reader = ByteReader::new(data.slice(offset..offset + SECTION_HEADER_SIZE));
        let header = SectionHeader::read(&mut reader, offset)?;
        let length = header.section_length as usize;
        if length < SECTION_HEADER_SIZE {
            return Err(ScpError::InvalidData(format!(
                "段 {} 长度 {} 小于段头长度",
                header.section_id, length
            )));
        }
        if length > left {
            return Err(ScpError::Truncated {
                needed: length,
                available: left,
            });
        }

        if verify_crc {
            let computed = crc16_ccitt(&data[offset + 2..offset + length]);
            if computed != header.crc {
                push_warning(
                    warnings,
                    DecodeWarning::SectionCrcMismatch {
                        section_id: header.section_id,
                        stored: header.crc,
                        computed,
                    },
                );
            }
        }

        let duplicate = !seen.insert(header.section_id);
        if duplicate {
            push_warning(
                warnings,
                DecodeWarning::DuplicateSection {
                    section_id: header.section_id,
                },
            );
        } else {
            raw.push(RawSection {
                header,
                body: data.slice(offset + SECTION_HEADER_SIZE..offset + length),
                span: spans.len(),
            });
        }
        spans.push(SectionSpan {
            section_id: header.section_id,
            offset,
            length,
            consumed: 0,
            padding: length - SECTION_HEADER_SIZE,
            duplicate,
        });

        debug!(
            "段 {}: 偏移 {}, 长度 {}",
            header.section_id, offset, length
        );
        offset += length;
    }

    Ok((raw, spans))
}

/// 按依赖顺序解析段体, 返回物理顺序的段列表
fn parse_bodies(
    raw: Vec<RawSection>,
    spans: &mut [SectionSpan],
    warnings: &mut Vec<DecodeWarning>,
) -> Vec<Section> {
    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by_key(|&i| {
        let id = raw[i].header.section_id;
        (id == SECTION_POINTERS, id)
    });

    let mut ctx = ParseContext::default();
    let mut parsed: Vec<Option<Section>> = vec![None; raw.len()];
    for i in order {
        let RawSection { header, body, span } = &raw[i];
        let section = match parse_section(*header, body.clone(), &ctx, warnings) {
            Ok(result) => {
                spans[*span].consumed = result.consumed;
                spans[*span].padding = body.len() - result.consumed;
                result.value
            }
            Err(e) => {
                push_warning(
                    warnings,
                    DecodeWarning::SectionUnreadable {
                        section_id: header.section_id,
                        reason: e.to_string(),
                    },
                );
                Section::Damaged(OpaqueSection {
                    header: *header,
                    body: body.clone(),
                })
            }
        };
        if let Section::Leads(leads) = &section {
            ctx.lead_count = Some(leads.lead_count());
        }
        parsed[i] = Some(section);
    }

    parsed.into_iter().flatten().collect()
}

fn push_warning(warnings: &mut Vec<DecodeWarning>, warning: DecodeWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}
