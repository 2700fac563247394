//! 段 3: 导联定义.
//!
//! 导联数 (1 字节) + 标志 (1 字节), 之后每个导联 9 字节:
//! 起始采样(4) + 结束采样(4) + 导联编号(1).

use bitflags::bitflags;
use scp_core::{DecodeWarning, ScpResult};
use serde::Serialize;

use super::check_count;
use crate::io::ByteReader;
use crate::section::{SECTION_LEADS, SectionHeader};

/// 导联项大小 (字节)
pub const LEAD_ENTRY_SIZE: usize = 9;

bitflags! {
    /// 段 3 标志字节
    ///
    /// 第 3-7 位为同步记录的导联数, 通过 [`LeadFlags::simultaneous_leads`] 读取.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LeadFlags: u8 {
        /// 节律数据使用了参考心搏减除
        const REFERENCE_BEAT_SUBTRACTION = 1 << 0;
        /// 所有导联同步记录
        const ALL_SIMULTANEOUS = 1 << 2;
    }
}

impl LeadFlags {
    /// 同步记录的导联数
    pub fn simultaneous_leads(&self) -> u8 {
        self.bits() >> 3
    }
}

/// 单个导联的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeadDescriptor {
    /// 导联编号
    pub lead_id: u8,
    /// 起始采样 (从 1 开始)
    pub start_sample: u32,
    /// 结束采样 (含)
    pub end_sample: u32,
}

impl LeadDescriptor {
    /// 采样数 (`end - start + 1`), 首尾颠倒时为 0
    pub fn sample_count(&self) -> usize {
        if self.end_sample < self.start_sample {
            return 0;
        }
        (self.end_sample - self.start_sample) as usize + 1
    }

    /// 导联名称
    pub fn name(&self) -> &'static str {
        lead_name(self.lead_id).unwrap_or("Unknown")
    }
}

/// 段 3 导联定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadSection {
    /// 段头
    pub header: SectionHeader,
    /// 标志
    pub flags: LeadFlags,
    /// 导联列表 (存储顺序)
    pub leads: Vec<LeadDescriptor>,
}

impl LeadSection {
    /// 读取导联定义, 导联项不完整时按实际读到的数量截短
    pub fn read(
        header: SectionHeader,
        reader: &mut ByteReader,
        warnings: &mut Vec<DecodeWarning>,
    ) -> ScpResult<Self> {
        let declared = usize::from(reader.read_u8()?);
        let flags = LeadFlags::from_bits_retain(reader.read_u8()?);

        let available = declared.min(reader.remaining() / LEAD_ENTRY_SIZE);
        let mut leads = Vec::with_capacity(available);
        for _ in 0..available {
            let start_sample = reader.read_u32()?;
            let end_sample = reader.read_u32()?;
            let lead_id = reader.read_u8()?;
            leads.push(LeadDescriptor {
                lead_id,
                start_sample,
                end_sample,
            });
        }
        check_count(warnings, SECTION_LEADS, "导联", declared, leads.len());

        Ok(Self {
            header,
            flags,
            leads,
        })
    }

    /// 导联数
    pub fn lead_count(&self) -> usize {
        self.leads.len()
    }

    /// 节律数据是否使用了参考心搏减除
    pub fn reference_beat_used(&self) -> bool {
        self.flags.contains(LeadFlags::REFERENCE_BEAT_SUBTRACTION)
    }

    /// 每个导联的采样数 (导联顺序)
    pub fn sample_counts(&self) -> Vec<usize> {
        self.leads.iter().map(LeadDescriptor::sample_count).collect()
    }
}

/// 标准导联编号对应的名称 (0-85)
static LEAD_NAMES: [&str; 86] = [
    "Unspecified",
    "I",
    "II",
    "V1",
    "V2",
    "V3",
    "V4",
    "V5",
    "V6",
    "V7",
    "V2R",
    "V3R",
    "V4R",
    "V5R",
    "V6R",
    "V7R",
    "X",
    "Y",
    "Z",
    "CC5",
    "CM5",
    "LA",
    "RA",
    "LL",
    "fI",
    "fE",
    "fC",
    "fA",
    "fM",
    "fF",
    "fH",
    "dI",
    "dII",
    "dV1",
    "dV2",
    "dV3",
    "dV4",
    "dV5",
    "dV6",
    "dV7",
    "dV2R",
    "dV3R",
    "dV4R",
    "dV5R",
    "dV6R",
    "dV7R",
    "dX",
    "dY",
    "dZ",
    "dCC5",
    "dCM5",
    "dLA",
    "dRA",
    "dLL",
    "dfI",
    "dfE",
    "dfC",
    "dfA",
    "dfM",
    "dfF",
    "dfH",
    "III",
    "aVR",
    "aVL",
    "aVF",
    "-aVR",
    "V8",
    "V9",
    "V8R",
    "V9R",
    "D",
    "A",
    "J",
    "Defib",
    "Extern",
    "A1",
    "A2",
    "A3",
    "A4",
    "dV8",
    "dV9",
    "dV8R",
    "dV9R",
    "dD",
    "dA",
    "dJ",
];

/// 按导联编号获取名称, 非标准编号返回 None
pub fn lead_name(lead_id: u8) -> Option<&'static str> {
    LEAD_NAMES.get(usize::from(lead_id)).copied()
}
