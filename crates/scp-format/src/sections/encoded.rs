//! 段 5 (参考心搏) 与段 6 (节律数据) 的压缩导联数据.
//!
//! 幅度倍率(2) + 采样间隔(2) + 差分模式(1) + 保留/双模压缩标志(1),
//! 之后是每个导联的压缩字节数 (各 2 字节, 导联数取自段 3), 再依次是各导联数据.

use scp_codec::huffman::DifferenceMode;
use scp_codec::reconstruct::EncodedLeads;
use scp_core::{DecodeWarning, ScpError, ScpResult};

use super::{ParseContext, check_count};
use crate::io::ByteReader;
use crate::section::{SECTION_LEADS, SectionHeader};

/// 段 5/6 压缩数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSection {
    /// 段头
    pub header: SectionHeader,
    /// 段 6 的双模压缩标志; 段 5 中为保留字节
    pub bimodal: bool,
    /// 压缩导联数据
    pub payload: EncodedLeads,
}

impl EncodedSection {
    /// 读取压缩数据, 需要段 3 已给出导联数
    pub fn read(
        header: SectionHeader,
        reader: &mut ByteReader,
        ctx: &ParseContext,
        warnings: &mut Vec<DecodeWarning>,
    ) -> ScpResult<Self> {
        let lead_count = ctx.lead_count.ok_or(ScpError::MissingSection(SECTION_LEADS))?;

        let amplitude_multiplier_nv = reader.read_u16()?;
        let sample_interval_us = reader.read_u16()?;
        let difference_mode = DifferenceMode::try_from(reader.read_u8()?)?;
        let bimodal = reader.read_u8()? != 0;

        let available = lead_count.min(reader.remaining() / 2);
        let mut lengths = Vec::with_capacity(available);
        for _ in 0..available {
            lengths.push(usize::from(reader.read_u16()?));
        }
        check_count(
            warnings,
            header.section_id,
            "导联长度表",
            lead_count,
            lengths.len(),
        );

        let mut leads = Vec::with_capacity(lengths.len());
        for length in lengths {
            let data = reader.read_bytes_up_to(length);
            check_count(
                warnings,
                header.section_id,
                "导联数据字节",
                length,
                data.len(),
            );
            leads.push(data);
        }

        Ok(Self {
            header,
            bimodal,
            payload: EncodedLeads {
                amplitude_multiplier_nv,
                sample_interval_us,
                difference_mode,
                leads,
            },
        })
    }
}
