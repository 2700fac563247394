//! 探测结果的收集与输出.

use serde::Serialize;
use std::collections::BTreeMap;

use scp_format::DecodedRecord;
use scp_format::section::section_name;
use scp_format::sections::patient::{decode_text, descriptor};

/// 完整探测结果
#[derive(Serialize)]
pub struct ProbeOutput {
    pub record: RecordInfo,
    pub sections: Vec<SectionInfo>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub patient: BTreeMap<String, Vec<String>>,
    pub waveform: WaveformInfo,
    pub leads: Vec<LeadInfo>,
    pub warnings: Vec<String>,
}

/// 记录信息
#[derive(Serialize)]
pub struct RecordInfo {
    pub filename: String,
    pub record_length: u32,
    pub crc: String,
    pub bytes_accounted: usize,
}

/// 段信息
#[derive(Serialize)]
pub struct SectionInfo {
    pub id: u16,
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub padding: usize,
    pub version: u8,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub damaged: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

/// 波形信息
#[derive(Serialize)]
pub struct WaveformInfo {
    pub decimation_factor: u32,
    pub sample_interval_us: u32,
    pub reference_beat_samples: usize,
}

/// 导联信息
#[derive(Serialize)]
pub struct LeadInfo {
    pub index: usize,
    pub name: String,
    pub lead_id: u8,
    pub sample_count: usize,
    pub decoded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<i16>,
}

/// 从解码结果构建探测结果, `samples` 为每导联输出的采样数
pub fn build(filename: &str, record: &DecodedRecord, samples: usize) -> ProbeOutput {
    let sections = record
        .spans
        .iter()
        .map(|span| {
            let section = record
                .sections
                .iter()
                .find(|s| s.header().byte_offset == span.offset);
            SectionInfo {
                id: span.section_id,
                name: section_name(span.section_id).to_string(),
                offset: span.offset,
                length: span.length,
                padding: span.padding,
                version: section.map_or(0, |s| s.header().section_version),
                damaged: section.is_some_and(|s| s.is_damaged()),
                duplicate: span.duplicate,
            }
        })
        .collect();

    let mut patient = BTreeMap::new();
    if let Some(section) = record.patient() {
        for (tag, values) in &section.fields {
            let name = descriptor(*tag).map_or_else(|| format!("tag_{}", tag), |d| d.name.to_string());
            patient.insert(name, values.iter().map(|v| decode_text(v)).collect());
        }
    }

    let leads = record
        .leads()
        .map(|section| {
            section
                .leads
                .iter()
                .enumerate()
                .map(|(index, lead)| {
                    let decoded = record.lead_samples.get(index).map_or(&[][..], Vec::as_slice);
                    LeadInfo {
                        index,
                        name: lead.name().to_string(),
                        lead_id: lead.lead_id,
                        sample_count: lead.sample_count(),
                        decoded: decoded.len(),
                        error: record
                            .lead_errors
                            .iter()
                            .find(|e| e.lead == index)
                            .map(|e| e.error.to_string()),
                        samples: decoded.iter().take(samples).copied().collect(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    ProbeOutput {
        record: RecordInfo {
            filename: filename.to_string(),
            record_length: record.header.record_length,
            crc: format!("0x{:04X}", record.header.crc),
            bytes_accounted: record.bytes_accounted(),
        },
        sections,
        patient,
        waveform: WaveformInfo {
            decimation_factor: record.decimation_factor,
            sample_interval_us: record.sample_interval_us(),
            reference_beat_samples: record
                .reference_beat_samples
                .as_ref()
                .and_then(|beats| beats.first())
                .map_or(0, Vec::len),
        },
        leads,
        warnings: record.warnings.iter().map(|w| w.to_string()).collect(),
    }
}

/// 文本输出
pub fn print_text(output: &ProbeOutput) {
    let record = &output.record;
    println!("[RECORD]");
    println!("  文件名       : {}", record.filename);
    println!("  记录长度     : {} 字节", record.record_length);
    println!("  CRC          : {}", record.crc);
    println!("  已计入字节   : {}", record.bytes_accounted);
    println!("[/RECORD]");
    println!();

    for section in &output.sections {
        println!("[SECTION #{}]", section.id);
        println!("  名称         : {}", section.name);
        println!("  偏移         : {}", section.offset);
        println!("  长度         : {} 字节", section.length);
        if section.padding > 0 {
            println!("  填充         : {} 字节", section.padding);
        }
        if section.damaged {
            println!("  状态         : 无法解析");
        }
        if section.duplicate {
            println!("  状态         : 重复, 已忽略");
        }
        println!("[/SECTION]");
        println!();
    }

    if !output.patient.is_empty() {
        println!("[PATIENT]");
        for (name, values) in &output.patient {
            println!("  {:<24}: {}", name, values.join(" | "));
        }
        println!("[/PATIENT]");
        println!();
    }

    let waveform = &output.waveform;
    println!("[WAVEFORM]");
    println!("  抽取因子     : {}", waveform.decimation_factor);
    println!("  采样间隔     : {} µs", waveform.sample_interval_us);
    if waveform.reference_beat_samples > 0 {
        println!("  参考心搏采样 : {}", waveform.reference_beat_samples);
    }
    println!("[/WAVEFORM]");
    println!();

    for lead in &output.leads {
        println!("[LEAD #{}]", lead.index);
        println!("  名称         : {} ({})", lead.name, lead.lead_id);
        println!("  采样数       : {}", lead.sample_count);
        println!("  已解码       : {}", lead.decoded);
        if let Some(ref error) = lead.error {
            println!("  错误         : {error}");
        }
        if !lead.samples.is_empty() {
            let samples: Vec<String> = lead.samples.iter().map(|s| s.to_string()).collect();
            println!("  采样 (µV)    : {}", samples.join(", "));
        }
        println!("[/LEAD]");
        println!();
    }

    if !output.warnings.is_empty() {
        println!("[WARNINGS]");
        for warning in &output.warnings {
            println!("  {warning}");
        }
        println!("[/WARNINGS]");
    }
}
