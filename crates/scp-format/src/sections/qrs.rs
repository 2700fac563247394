//! 段 4: QRS 位置与参考心搏几何.
//!
//! 参考心搏时长(2) + 基准点(2) + QRS 数(2), 之后依次是
//! 每个 QRS 的减除区 (类型 2, 起点 4, 基准点 4, 终点 4) 和保护区 (起点 4, 终点 4).

use log::warn;
use scp_codec::reconstruct::{BeatGeometry, SampleRange, SubtractionZone};
use scp_core::{DecodeWarning, ScpResult};

use super::check_count;
use crate::io::ByteReader;
use crate::section::{SECTION_QRS, SectionHeader};

/// 减除区项大小 (字节)
pub const ZONE_ENTRY_SIZE: usize = 14;
/// 保护区项大小 (字节)
pub const PROTECTED_ENTRY_SIZE: usize = 8;

/// 段 4 QRS 位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrsSection {
    /// 段头
    pub header: SectionHeader,
    /// 声明的 QRS 数
    pub qrs_count: u16,
    /// 心搏几何
    pub geometry: BeatGeometry,
}

impl QrsSection {
    /// 读取 QRS 位置, 首尾颠倒的区间被丢弃
    pub fn read(
        header: SectionHeader,
        reader: &mut ByteReader,
        warnings: &mut Vec<DecodeWarning>,
    ) -> ScpResult<Self> {
        let reference_beat_duration_ms = reader.read_u16()?;
        let fiducial = reader.read_u16()?;
        let qrs_count = reader.read_u16()?;
        let declared = usize::from(qrs_count);

        let available = declared.min(reader.remaining() / ZONE_ENTRY_SIZE);
        let mut subtraction_zones = Vec::with_capacity(available);
        for _ in 0..available {
            let zone = SubtractionZone {
                beat_type: reader.read_u16()?,
                start: reader.read_u32()?,
                fiducial: reader.read_u32()?,
                end: reader.read_u32()?,
            };
            if zone.start > zone.end {
                malformed(warnings, zone.start, zone.end);
                continue;
            }
            subtraction_zones.push(zone);
        }
        check_count(warnings, SECTION_QRS, "减除区", declared, available);

        let available = declared.min(reader.remaining() / PROTECTED_ENTRY_SIZE);
        let mut protected_areas = Vec::with_capacity(available);
        for _ in 0..available {
            let area = SampleRange::new(reader.read_u32()?, reader.read_u32()?);
            if area.start > area.end {
                malformed(warnings, area.start, area.end);
                continue;
            }
            protected_areas.push(area);
        }
        check_count(warnings, SECTION_QRS, "保护区", declared, available);

        Ok(Self {
            header,
            qrs_count,
            geometry: BeatGeometry {
                reference_beat_duration_ms,
                fiducial,
                subtraction_zones,
                protected_areas,
            },
        })
    }
}

fn malformed(warnings: &mut Vec<DecodeWarning>, start: u32, end: u32) {
    let warning = DecodeWarning::MalformedRange {
        section_id: SECTION_QRS,
        start,
        end,
    };
    warn!("{}", warning);
    warnings.push(warning);
}
