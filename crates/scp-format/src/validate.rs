//! 段 0 指针表与实际布局的交叉校验.
//!
//! 校验结果全部是告警, 不影响解码:
//! - 实际存在的段必须有长度和位置都一致的指针项
//! - 每个段号只能有一个指针项
//! - 长度非零的指针项必须指向实际存在的段
//! - 段 0-11 必须各有一个指针项 (长度可以为 0)

use log::warn;
use scp_core::DecodeWarning;

use crate::section::{LAST_REQUIRED_POINTER, Section};
use crate::sections::PointerSection;

/// 用段 0 校验记录布局
pub fn validate_pointers(pointers: &PointerSection, sections: &[Section]) -> Vec<DecodeWarning> {
    let mut warnings = Vec::new();

    for section in sections {
        let header = section.header();
        match pointers.entry(header.section_id) {
            Some(entry)
                if entry.length == header.section_length
                    && entry.index == header.pointer_index() => {}
            Some(entry) => warnings.push(DecodeWarning::PointerMismatch {
                section_id: header.section_id,
                pointer_length: entry.length,
                pointer_index: entry.index,
                actual_length: header.section_length,
                actual_index: header.pointer_index(),
            }),
            None => warnings.push(DecodeWarning::UnreferencedSection {
                section_id: header.section_id,
            }),
        }
    }

    for (i, entry) in pointers.entries.iter().enumerate() {
        if pointers.entries[..i]
            .iter()
            .any(|e| e.section_id == entry.section_id)
        {
            warnings.push(DecodeWarning::DuplicatePointer {
                section_id: entry.section_id,
                length: entry.length,
                index: entry.index,
            });
        }
    }

    for entry in pointers.entries.iter().filter(|e| e.is_present()) {
        if !sections.iter().any(|s| s.id() == entry.section_id) {
            warnings.push(DecodeWarning::DanglingPointer {
                section_id: entry.section_id,
                length: entry.length,
                index: entry.index,
            });
        }
    }

    for section_id in 0..=LAST_REQUIRED_POINTER {
        if pointers.entry(section_id).is_none() {
            warnings.push(DecodeWarning::MissingPointer { section_id });
        }
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{OpaqueSection, SectionHeader};
    use crate::sections::PointerEntry;
    use bytes::Bytes;

    fn header(section_id: u16, section_length: u32, byte_offset: usize) -> SectionHeader {
        SectionHeader {
            crc: 0,
            section_id,
            section_length,
            section_version: 20,
            protocol_version: 20,
            reserved: [0; 6],
            byte_offset,
        }
    }

    fn opaque(section_id: u16, length: u32, offset: usize) -> Section {
        Section::Unknown(OpaqueSection {
            header: header(section_id, length, offset),
            body: Bytes::new(),
        })
    }

    fn entry(section_id: u16, length: u32, index: u32) -> PointerEntry {
        PointerEntry {
            section_id,
            length,
            index,
        }
    }

    /// 段 0 (136 字节, 偏移 6) + 段 1 (30 字节, 偏移 142)
    fn layout() -> (Vec<PointerEntry>, Vec<Section>) {
        let mut entries = vec![entry(0, 136, 7), entry(1, 30, 143)];
        entries.extend((2..=11).map(|id| entry(id, 0, 0)));
        let sections = vec![opaque(0, 136, 6), opaque(1, 30, 142)];
        (entries, sections)
    }

    fn pointers(entries: Vec<PointerEntry>) -> PointerSection {
        PointerSection {
            header: header(0, 136, 6),
            entries,
        }
    }

    #[test]
    fn test_布局一致() {
        let (entries, sections) = layout();
        assert!(validate_pointers(&pointers(entries), &sections).is_empty());
    }

    #[test]
    fn test_长度不符() {
        let (mut entries, sections) = layout();
        entries[1].length = 32;
        assert_eq!(
            validate_pointers(&pointers(entries), &sections),
            vec![DecodeWarning::PointerMismatch {
                section_id: 1,
                pointer_length: 32,
                pointer_index: 143,
                actual_length: 30,
                actual_index: 143
            }]
        );
    }

    #[test]
    fn test_位置按从_0_计数() {
        let (mut entries, sections) = layout();
        entries[1].index = 142;
        let warnings = validate_pointers(&pointers(entries), &sections);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            DecodeWarning::PointerMismatch { section_id: 1, .. }
        ));
    }

    #[test]
    fn test_未引用与悬空指针() {
        let (mut entries, mut sections) = layout();
        entries[3] = entry(3, 50, 500);
        sections.push(opaque(128, 16, 172));
        assert_eq!(
            validate_pointers(&pointers(entries), &sections),
            vec![
                DecodeWarning::UnreferencedSection { section_id: 128 },
                DecodeWarning::DanglingPointer {
                    section_id: 3,
                    length: 50,
                    index: 500
                },
            ]
        );
    }

    #[test]
    fn test_缺少必需指针项() {
        let (mut entries, sections) = layout();
        entries.retain(|e| e.section_id != 7 && e.section_id != 11);
        assert_eq!(
            validate_pointers(&pointers(entries), &sections),
            vec![
                DecodeWarning::MissingPointer { section_id: 7 },
                DecodeWarning::MissingPointer { section_id: 11 },
            ]
        );
    }

    #[test]
    fn test_重复指针项() {
        let (mut entries, sections) = layout();
        entries.push(entry(1, 40, 200));
        assert_eq!(
            validate_pointers(&pointers(entries), &sections),
            vec![DecodeWarning::DuplicatePointer {
                section_id: 1,
                length: 40,
                index: 200
            }]
        );
    }
}
