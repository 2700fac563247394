//! 整条记录解码.
//!
//! 分帧 → 段 0 交叉校验 → 取出码表、导联定义、心搏几何与压缩数据 → 波形重建.

use bytes::Bytes;
use log::{debug, info, warn};
use scp_codec::huffman::HuffmanTables;
use scp_codec::reconstruct::{LeadError, Reconstructor};
use scp_core::{DecodeWarning, ScpError, ScpResult};

use crate::options::{DecodeOptions, MissingHuffmanPolicy};
use crate::record::{RECORD_HEADER_SIZE, Record, RecordHeader, SectionSpan};
use crate::section::*;
use crate::sections::{LeadSection, PatientSection, PointerSection};
use crate::validate::validate_pointers;

/// 解码后的记录
#[derive(Debug)]
pub struct DecodedRecord {
    /// 记录头
    pub header: RecordHeader,
    /// 所有段 (物理顺序)
    pub sections: Vec<Section>,
    /// 段的物理布局
    pub spans: Vec<SectionSpan>,
    /// 每个导联的节律采样 (段 3 顺序)
    pub lead_samples: Vec<Vec<i16>>,
    /// 每个导联的参考心搏采样; 没有可解析的段 5 时为 None
    pub reference_beat_samples: Option<Vec<Vec<i16>>>,
    /// 导联级解码错误
    pub lead_errors: Vec<LeadError>,
    /// 全部告警
    pub warnings: Vec<DecodeWarning>,
    /// 节律数据的抽取因子
    pub decimation_factor: u32,
    sample_interval_us: u32,
}

impl DecodedRecord {
    /// 按段号查找段
    pub fn section(&self, section_id: u16) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == section_id)
    }

    /// 段 0 指针表
    pub fn pointers(&self) -> Option<&PointerSection> {
        match self.section(SECTION_POINTERS) {
            Some(Section::Pointers(s)) => Some(s),
            _ => None,
        }
    }

    /// 段 1 患者信息
    pub fn patient(&self) -> Option<&PatientSection> {
        match self.section(SECTION_PATIENT) {
            Some(Section::Patient(s)) => Some(s),
            _ => None,
        }
    }

    /// 段 3 导联定义
    pub fn leads(&self) -> Option<&LeadSection> {
        match self.section(SECTION_LEADS) {
            Some(Section::Leads(s)) => Some(s),
            _ => None,
        }
    }

    /// 导联数
    pub fn lead_count(&self) -> usize {
        self.leads().map_or(0, LeadSection::lead_count)
    }

    /// 导联名称 (段 3 顺序)
    pub fn lead_names(&self) -> Vec<&'static str> {
        self.leads()
            .map(|s| s.leads.iter().map(|l| l.name()).collect())
            .unwrap_or_default()
    }

    /// 导联在段 3 中声明的采样数
    pub fn sample_count(&self, lead: usize) -> Option<usize> {
        self.leads()
            .and_then(|s| s.leads.get(lead))
            .map(|l| l.sample_count())
    }

    /// 输出采样对应的采样间隔 (微秒)
    ///
    /// 做过抽取还原时为参考心搏的采样间隔, 否则为节律数据的采样间隔.
    pub fn sample_interval_us(&self) -> u32 {
        self.sample_interval_us
    }

    /// 记录头与所有段 (含填充和重复段) 占用的总字节数
    pub fn bytes_accounted(&self) -> usize {
        RECORD_HEADER_SIZE + self.spans.iter().map(|s| s.length).sum::<usize>()
    }
}

/// 使用默认选项解码记录
pub fn decode(data: &[u8]) -> ScpResult<DecodedRecord> {
    decode_with(data, &DecodeOptions::default())
}

/// 按给定选项解码记录
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> ScpResult<DecodedRecord> {
    decode_bytes(Bytes::copy_from_slice(data), options)
}

/// 解码已在 [`Bytes`] 中的记录, 段体与导联数据共享该缓冲区
pub fn decode_bytes(data: Bytes, options: &DecodeOptions) -> ScpResult<DecodedRecord> {
    let Record {
        header,
        sections,
        spans,
        mut warnings,
    } = Record::parse(data, options.verify_crc)?;

    if options.validate_pointers {
        match sections.iter().find_map(|s| match s {
            Section::Pointers(p) => Some(p),
            _ => None,
        }) {
            Some(pointers) => warnings.extend(validate_pointers(pointers, &sections)),
            None => {
                warn!("{}", DecodeWarning::MissingPointerTable);
                warnings.push(DecodeWarning::MissingPointerTable);
            }
        }
    }

    let mut record = DecodedRecord {
        header,
        sections,
        spans,
        lead_samples: Vec::new(),
        reference_beat_samples: None,
        lead_errors: Vec::new(),
        warnings,
        decimation_factor: 1,
        sample_interval_us: 0,
    };
    reconstruct(&mut record, options)?;

    info!(
        "记录解码完成: {} 个段, {} 个导联, {} 条告警, {} 个导联出错",
        record.sections.len(),
        record.lead_count(),
        record.warnings.len(),
        record.lead_errors.len()
    );
    Ok(record)
}

/// 从已解析的段中取出重建所需的数据并执行重建
fn reconstruct(record: &mut DecodedRecord, options: &DecodeOptions) -> ScpResult<()> {
    let has_waveform = record.section(SECTION_REFERENCE_BEAT).is_some()
        || record.section(SECTION_RHYTHM).is_some();
    if !has_waveform {
        debug!("记录中没有波形数据");
        return Ok(());
    }
    // 压缩数据段存在时, 没有导联定义就无法切分, 即使这些段本身已损坏
    let leads = record
        .leads()
        .ok_or(ScpError::MissingSection(SECTION_LEADS))?;

    let reference = match record.section(SECTION_REFERENCE_BEAT) {
        Some(Section::ReferenceBeat(s)) => Some(&s.payload),
        _ => None,
    };
    let rhythm = match record.section(SECTION_RHYTHM) {
        Some(Section::Rhythm(s)) => Some(&s.payload),
        _ => None,
    };
    if reference.is_none() && rhythm.is_none() {
        debug!("波形段均无法解析, 跳过重建");
        return Ok(());
    }

    let tables = match record.section(SECTION_HUFFMAN) {
        Some(Section::Huffman(s)) => s.tables.clone(),
        Some(_) => return Err(ScpError::MissingSection(SECTION_HUFFMAN)),
        None => match options.missing_huffman {
            MissingHuffmanPolicy::DefaultTable => HuffmanTables::Default,
            MissingHuffmanPolicy::Uncompressed => HuffmanTables::Uncompressed,
        },
    };
    let geometry = match record.section(SECTION_QRS) {
        Some(Section::QrsLocations(s)) => Some(&s.geometry),
        _ => None,
    };

    let mut reconstructor =
        Reconstructor::new(&tables, leads.sample_counts()).parallel(options.parallel_leads);
    if let Some(geometry) = geometry {
        reconstructor = reconstructor.with_geometry(geometry);
    }
    if let Some(reference) = reference {
        reconstructor = reconstructor.with_reference(reference);
    }
    if let Some(rhythm) = rhythm {
        reconstructor = reconstructor.with_rhythm(rhythm);
    }
    let has_reference = reference.is_some();
    let result = reconstructor.run()?;

    record.lead_samples = result.lead_samples;
    record.reference_beat_samples = has_reference.then_some(result.reference_beats);
    record.lead_errors = result.lead_errors;
    record.warnings.extend(result.warnings);
    record.decimation_factor = result.decimation_factor;
    record.sample_interval_us = result.sample_interval_us;
    Ok(())
}
