//! 字节读取器.
//!
//! 在内存中的段体上按小端顺序读取定长字段. 记录整体读入内存后
//! 以 [`Bytes`] 共享, 取出的子切片 (如导联压缩数据) 不发生拷贝.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use scp_core::{ScpError, ScpResult};

use crate::section::SECTION_HEADER_SIZE;

/// 小端字节读取器
///
/// 绑定段号时, 越界读取报告为 [`ScpError::SectionOverrun`];
/// 否则报告为 [`ScpError::Truncated`].
#[derive(Debug, Clone)]
pub struct ByteReader {
    /// 源数据
    data: Bytes,
    /// 当前读取位置
    pos: usize,
    /// 所属段号
    section_id: Option<u16>,
}

impl ByteReader {
    /// 创建读取器
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            section_id: None,
        }
    }

    /// 创建段体读取器
    pub fn for_section(data: Bytes, section_id: u16) -> Self {
        Self {
            data,
            pos: 0,
            section_id: Some(section_id),
        }
    }

    /// 当前读取位置 (已消耗的字节数)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 是否已读完
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 取出接下来的 `count` 个字节
    fn take(&mut self, count: usize) -> ScpResult<&[u8]> {
        if count > self.remaining() {
            return Err(self.overrun(count));
        }
        let start = self.pos;
        self.pos += count;
        Ok(&self.data[start..self.pos])
    }

    fn overrun(&self, count: usize) -> ScpError {
        match self.section_id {
            Some(section_id) => ScpError::SectionOverrun {
                section_id,
                declared: self.data.len() + SECTION_HEADER_SIZE,
                requested: self.pos + count + SECTION_HEADER_SIZE,
            },
            None => ScpError::Truncated {
                needed: count,
                available: self.remaining(),
            },
        }
    }

    /// 读取 u8
    pub fn read_u8(&mut self) -> ScpResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// 读取 u16 小端
    pub fn read_u16(&mut self) -> ScpResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    /// 读取 i16 小端
    pub fn read_i16(&mut self) -> ScpResult<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    /// 读取 u32 小端
    pub fn read_u32(&mut self) -> ScpResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// 读取固定长度数组
    pub fn read_array<const N: usize>(&mut self) -> ScpResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// 读取 `count` 个字节, 与源数据共享内存
    pub fn read_bytes(&mut self, count: usize) -> ScpResult<Bytes> {
        if count > self.remaining() {
            return Err(self.overrun(count));
        }
        let out = self.data.slice(self.pos..self.pos + count);
        self.pos += count;
        Ok(out)
    }

    /// 读取至多 `count` 个字节, 返回实际读到的部分
    pub fn read_bytes_up_to(&mut self, count: usize) -> Bytes {
        let count = count.min(self.remaining());
        let out = self.data.slice(self.pos..self.pos + count);
        self.pos += count;
        out
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> ScpResult<()> {
        self.take(count).map(|_| ())
    }
}
