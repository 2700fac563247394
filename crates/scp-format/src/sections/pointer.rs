//! 段 0: 指针表.
//!
//! 每个指针项 10 字节: 段号(2) + 段长度(4) + 段位置(4).
//! 段位置从 1 开始计数, 即段头首字节的记录偏移加 1.

use serde::Serialize;
use scp_core::ScpResult;

use crate::io::ByteReader;
use crate::section::SectionHeader;

/// 指针项大小 (字节)
pub const POINTER_ENTRY_SIZE: usize = 10;

/// 指针项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointerEntry {
    /// 段号
    pub section_id: u16,
    /// 段长度 (0 表示该段不存在)
    pub length: u32,
    /// 段位置 (从 1 开始)
    pub index: u32,
}

impl PointerEntry {
    /// 指针项声明该段存在
    pub fn is_present(&self) -> bool {
        self.length > 0
    }
}

/// 段 0 指针表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerSection {
    /// 段头
    pub header: SectionHeader,
    /// 指针项 (存储顺序)
    pub entries: Vec<PointerEntry>,
}

impl PointerSection {
    /// 读取指针表, 不足一个指针项的尾部字节视为填充
    pub fn read(header: SectionHeader, reader: &mut ByteReader) -> ScpResult<Self> {
        let mut entries = Vec::with_capacity(reader.remaining() / POINTER_ENTRY_SIZE);
        while reader.remaining() >= POINTER_ENTRY_SIZE {
            entries.push(PointerEntry {
                section_id: reader.read_u16()?,
                length: reader.read_u32()?,
                index: reader.read_u32()?,
            });
        }
        Ok(Self { header, entries })
    }

    /// 按段号查找第一个指针项
    pub fn entry(&self, section_id: u16) -> Option<&PointerEntry> {
        self.entries.iter().find(|e| e.section_id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn header() -> SectionHeader {
        SectionHeader {
            crc: 0,
            section_id: 0,
            section_length: 0,
            section_version: 20,
            protocol_version: 20,
            reserved: *b"SCPECG",
            byte_offset: 6,
        }
    }

    #[test]
    fn test_读取指针项() {
        let mut body = Vec::new();
        for (id, len, idx) in [(0u16, 46u32, 7u32), (1, 0, 0), (6, 120, 53)] {
            body.extend_from_slice(&id.to_le_bytes());
            body.extend_from_slice(&len.to_le_bytes());
            body.extend_from_slice(&idx.to_le_bytes());
        }
        // 填充
        body.extend_from_slice(&[0, 0]);

        let mut r = ByteReader::for_section(Bytes::from(body), 0);
        let s = PointerSection::read(header(), &mut r).unwrap();
        assert_eq!(s.entries.len(), 3);
        assert_eq!(r.position(), 30);
        assert_eq!(
            s.entry(6),
            Some(&PointerEntry {
                section_id: 6,
                length: 120,
                index: 53
            })
        );
        assert!(!s.entry(1).unwrap().is_present());
        assert!(s.entry(2).is_none());
    }
}
