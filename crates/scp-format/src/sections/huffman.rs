//! 段 2: Huffman 码表.
//!
//! 表数量 (2 字节) 之后依次存放每张表: 码字数 (2 字节) + 若干 9 字节码字结构
//! (前缀位数 1, 总位数 1, 表模式 1, 基值 2 (有符号), 基码 4).
//! 表数量 19999 表示使用默认码表, 0 表示未做熵编码.

use scp_codec::huffman::table::{DEFAULT_TABLE_SENTINEL, NO_TABLE_SENTINEL};
use scp_codec::huffman::{HuffmanCode, HuffmanTable, HuffmanTables};
use scp_core::ScpResult;

use crate::io::ByteReader;
use crate::section::SectionHeader;

/// 段 2 Huffman 码表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSection {
    /// 段头
    pub header: SectionHeader,
    /// 码表集合
    pub tables: HuffmanTables,
}

impl HuffmanSection {
    /// 读取码表
    pub fn read(header: SectionHeader, reader: &mut ByteReader) -> ScpResult<Self> {
        let count = reader.read_u16()?;
        let tables = match count {
            DEFAULT_TABLE_SENTINEL => HuffmanTables::Default,
            NO_TABLE_SENTINEL => HuffmanTables::Uncompressed,
            n => {
                let mut tables = Vec::with_capacity(usize::from(n));
                for _ in 0..n {
                    tables.push(read_table(reader)?);
                }
                HuffmanTables::Custom(tables)
            }
        };
        Ok(Self { header, tables })
    }
}

fn read_table(reader: &mut ByteReader) -> ScpResult<HuffmanTable> {
    let count = reader.read_u16()?;
    let mut codes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let prefix_bits = reader.read_u8()?;
        let code_bits = reader.read_u8()?;
        let table_mode = reader.read_u8()?;
        let base_value = i32::from(reader.read_i16()?);
        let base_code = reader.read_u32()?;
        codes.push(HuffmanCode::new(
            prefix_bits,
            code_bits,
            table_mode,
            base_value,
            base_code,
        ));
    }
    HuffmanTable::new(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use scp_codec::huffman::table::DEFAULT_CODES;
    use scp_core::ScpError;

    fn header() -> SectionHeader {
        SectionHeader {
            crc: 0,
            section_id: 2,
            section_length: 0,
            section_version: 20,
            protocol_version: 20,
            reserved: [0; 6],
            byte_offset: 0,
        }
    }

    fn read(body: Vec<u8>) -> ScpResult<HuffmanSection> {
        let mut r = ByteReader::for_section(Bytes::from(body), 2);
        HuffmanSection::read(header(), &mut r)
    }

    fn push_code(body: &mut Vec<u8>, code: &HuffmanCode) {
        body.extend_from_slice(&[code.prefix_bits, code.code_bits, code.table_mode]);
        body.extend_from_slice(&(code.base_value as i16).to_le_bytes());
        body.extend_from_slice(&code.base_code.to_le_bytes());
    }

    #[test]
    fn test_哨兵值() {
        assert_eq!(
            read(19999u16.to_le_bytes().to_vec()).unwrap().tables,
            HuffmanTables::Default
        );
        assert_eq!(
            read(0u16.to_le_bytes().to_vec()).unwrap().tables,
            HuffmanTables::Uncompressed
        );
    }

    #[test]
    fn test_显式默认码表与内置码表一致() {
        let mut body = 1u16.to_le_bytes().to_vec();
        body.extend_from_slice(&19u16.to_le_bytes());
        for code in DEFAULT_CODES.iter() {
            push_code(&mut body, code);
        }
        let section = read(body).unwrap();
        let HuffmanTables::Custom(tables) = &section.tables else {
            panic!("应为自定义码表");
        };
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].codes(), &DEFAULT_CODES[..]);
    }

    #[test]
    fn test_码表截断() {
        let mut body = 2u16.to_le_bytes().to_vec();
        body.extend_from_slice(&1u16.to_le_bytes());
        push_code(&mut body, &DEFAULT_CODES[0]);
        // 第二张表缺失
        assert!(matches!(
            read(body),
            Err(ScpError::SectionOverrun { section_id: 2, .. })
        ));
    }
}
