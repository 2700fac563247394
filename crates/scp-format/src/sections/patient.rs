//! 段 1: 患者与采集信息.
//!
//! 字段为标签-长度-值结构: 标签(1) + 长度(2) + 值. 标签 255 结束字段列表.
//! 本模块只负责取出字段, 不校验字段内容.

use std::collections::BTreeMap;

use bytes::Bytes;
use encoding_rs::WINDOWS_1252;
use log::{trace, warn};
use scp_core::{DecodeWarning, ScpResult};

use crate::io::ByteReader;
use crate::section::SectionHeader;

/// 结束标签
pub const TAG_TERMINATOR: u8 = 255;

/// 标准字段描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    /// 标签
    pub tag: u8,
    /// 字段名称
    pub name: &'static str,
    /// 是否允许重复出现
    pub repeatable: bool,
}

const fn tag(tag: u8, name: &'static str, repeatable: bool) -> TagDescriptor {
    TagDescriptor {
        tag,
        name,
        repeatable,
    }
}

/// 标准定义的字段 (标签 0-35)
static TAG_DESCRIPTORS: [TagDescriptor; 36] = [
    tag(0, "last_name", false),
    tag(1, "first_name", false),
    tag(2, "patient_id", false),
    tag(3, "second_last_name", false),
    tag(4, "age", false),
    tag(5, "date_of_birth", false),
    tag(6, "height", false),
    tag(7, "weight", false),
    tag(8, "sex", false),
    tag(9, "race", false),
    tag(10, "drugs", true),
    tag(11, "systolic_blood_pressure", false),
    tag(12, "diastolic_blood_pressure", false),
    tag(13, "diagnosis_or_referral", true),
    tag(14, "acquiring_device_id", false),
    tag(15, "analyzing_device_id", false),
    tag(16, "acquiring_institution", false),
    tag(17, "analyzing_institution", false),
    tag(18, "acquiring_department", false),
    tag(19, "analyzing_department", false),
    tag(20, "referring_physician", false),
    tag(21, "confirming_physician", false),
    tag(22, "technician", false),
    tag(23, "room", false),
    tag(24, "stat_code", false),
    tag(25, "acquisition_date", false),
    tag(26, "acquisition_time", false),
    tag(27, "baseline_filter", false),
    tag(28, "low_pass_filter", false),
    tag(29, "filter_bitmap", false),
    tag(30, "free_text", true),
    tag(31, "sequence_number", false),
    tag(32, "medical_history", true),
    tag(33, "electrode_configuration", false),
    tag(34, "time_zone", false),
    tag(35, "medical_history_text", true),
];

/// 获取标签的标准描述
pub fn descriptor(tag: u8) -> Option<&'static TagDescriptor> {
    TAG_DESCRIPTORS.get(usize::from(tag))
}

/// 段 1 患者信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSection {
    /// 段头
    pub header: SectionHeader,
    /// 字段值, 按标签分组, 组内保持出现顺序
    pub fields: BTreeMap<u8, Vec<Bytes>>,
    /// 是否读到结束标签
    pub terminated: bool,
}

impl PatientSection {
    /// 读取字段列表
    pub fn read(
        header: SectionHeader,
        reader: &mut ByteReader,
        warnings: &mut Vec<DecodeWarning>,
    ) -> ScpResult<Self> {
        let mut fields: BTreeMap<u8, Vec<Bytes>> = BTreeMap::new();
        let mut terminated = false;

        // 不足 3 字节的尾部视为填充
        while reader.remaining() >= 3 {
            let tag = reader.read_u8()?;
            let length = usize::from(reader.read_u16()?);
            let value = reader.read_bytes(length)?;
            if tag == TAG_TERMINATOR {
                terminated = true;
                break;
            }
            trace!("段 1 字段 {}: {} 字节", tag, length);
            fields.entry(tag).or_default().push(value);
        }

        for (tag, values) in &fields {
            let repeatable = descriptor(*tag).is_none_or(|d| d.repeatable);
            if !repeatable && values.len() > 1 {
                let warning = DecodeWarning::RepeatedField {
                    tag: *tag,
                    count: values.len(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        Ok(Self {
            header,
            fields,
            terminated,
        })
    }

    /// 标签的第一个值
    pub fn field(&self, tag: u8) -> Option<&Bytes> {
        self.fields.get(&tag).and_then(|v| v.first())
    }

    /// 标签的全部值
    pub fn values(&self, tag: u8) -> &[Bytes] {
        self.fields.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 标签第一个值按文本解码 (Windows-1252, 去除结尾 NUL)
    pub fn text(&self, tag: u8) -> Option<String> {
        self.field(tag).map(|value| decode_text(value))
    }
}

/// 文本字段解码
pub fn decode_text(value: &[u8]) -> String {
    let end = value.iter().position(|b| *b == 0).unwrap_or(value.len());
    let (text, _, _) = WINDOWS_1252.decode(&value[..end]);
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> SectionHeader {
        SectionHeader {
            crc: 0,
            section_id: 1,
            section_length: 0,
            section_version: 20,
            protocol_version: 20,
            reserved: [0; 6],
            byte_offset: 0,
        }
    }

    fn push(body: &mut Vec<u8>, tag: u8, value: &[u8]) {
        body.push(tag);
        body.extend_from_slice(&(value.len() as u16).to_le_bytes());
        body.extend_from_slice(value);
    }

    #[test]
    fn test_读取字段() {
        let mut body = Vec::new();
        push(&mut body, 0, b"M\xfcller\0");
        push(&mut body, 2, b"12345\0");
        push(&mut body, 10, &[0, 1, 2]);
        push(&mut body, 10, &[0, 3, 4]);
        push(&mut body, 255, &[]);
        body.extend_from_slice(&[0, 0]);

        let mut r = ByteReader::for_section(Bytes::from(body), 1);
        let mut warnings = Vec::new();
        let s = PatientSection::read(header(), &mut r, &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert!(s.terminated);
        assert_eq!(s.text(0).as_deref(), Some("Müller"));
        assert_eq!(s.text(2).as_deref(), Some("12345"));
        assert_eq!(s.values(10).len(), 2);
        assert!(s.field(1).is_none());
        // 结束标签之后的字节为填充
        assert_eq!(r.remaining(), 2);
    }

    #[test]
    fn test_重复字段告警() {
        let mut body = Vec::new();
        push(&mut body, 2, b"A\0");
        push(&mut body, 2, b"B\0");
        push(&mut body, 255, &[]);

        let mut r = ByteReader::for_section(Bytes::from(body), 1);
        let mut warnings = Vec::new();
        let s = PatientSection::read(header(), &mut r, &mut warnings).unwrap();
        assert_eq!(s.text(2).as_deref(), Some("A"));
        assert_eq!(
            warnings,
            vec![DecodeWarning::RepeatedField { tag: 2, count: 2 }]
        );
    }

    #[test]
    fn test_字段越界() {
        let mut body = Vec::new();
        body.push(0);
        body.extend_from_slice(&50u16.to_le_bytes());
        body.extend_from_slice(b"short");

        let mut r = ByteReader::for_section(Bytes::from(body), 1);
        let mut warnings = Vec::new();
        assert!(PatientSection::read(header(), &mut r, &mut warnings).is_err());
    }

    #[test]
    fn test_字段描述表() {
        assert_eq!(descriptor(0).map(|d| d.name), Some("last_name"));
        assert!(descriptor(30).is_some_and(|d| d.repeatable));
        assert!(TAG_DESCRIPTORS.iter().enumerate().all(|(i, d)| usize::from(d.tag) == i));
        assert!(descriptor(200).is_none());
    }
}
