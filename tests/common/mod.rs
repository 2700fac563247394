//! 集成测试公共工具: 在内存中构造完整的 SCP-ECG 记录.

#![allow(dead_code)]

use scp::core::crc::crc16_ccitt;

/// 指针项 (段号, 长度, 位置)
pub type Entry = (u16, u32, u32);

/// 记录构造器
///
/// 段按添加顺序排列; 启用段 0 时它位于最前, 指针表按实际布局生成.
#[derive(Default)]
pub struct RecordBuilder {
    sections: Vec<(u16, Vec<u8>)>,
    without_pointers: bool,
    stale_padding: Vec<(u16, usize)>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个段
    pub fn section(mut self, id: u16, body: Vec<u8>) -> Self {
        self.sections.push((id, body));
        self
    }

    /// 不生成段 0
    pub fn without_pointers(mut self) -> Self {
        self.without_pointers = true;
        self
    }

    /// 生成指针表之后再给段追加填充, 使指针表中的长度过时
    pub fn stale_padding(mut self, id: u16, bytes: usize) -> Self {
        self.stale_padding.push((id, bytes));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with(|_| {})
    }

    /// 生成记录, `tweak` 可在写入前修改指针项
    ///
    /// 指针项数量变化时按新的段 0 长度重新布局, 因此 `tweak` 可能被调用两次.
    pub fn build_with(&self, tweak: impl Fn(&mut Vec<Entry>)) -> Vec<u8> {
        let mut bodies = self.sections.clone();

        if !self.without_pointers {
            let mut ids: Vec<u16> = (0..=11).collect();
            for (id, _) in &bodies {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }

            let mut entries = self.pointer_entries(&ids, ids.len(), &tweak);
            if entries.len() != ids.len() {
                entries = self.pointer_entries(&ids, entries.len(), &tweak);
            }

            let mut pointer_body = Vec::new();
            for (id, length, index) in &entries {
                pointer_body.extend_from_slice(&id.to_le_bytes());
                pointer_body.extend_from_slice(&length.to_le_bytes());
                pointer_body.extend_from_slice(&index.to_le_bytes());
            }
            bodies.insert(0, (0, pointer_body));
        }

        for (id, bytes) in &self.stale_padding {
            if let Some((_, body)) = bodies.iter_mut().find(|(bid, _)| bid == id) {
                body.extend(std::iter::repeat_n(0u8, *bytes));
            }
        }

        let mut record = vec![0u8; 6];
        for (id, body) in &bodies {
            record.extend_from_slice(&section_bytes(*id, body));
        }
        let length = record.len() as u32;
        record[2..6].copy_from_slice(&length.to_le_bytes());
        let crc = crc16_ccitt(&record[2..]);
        record[..2].copy_from_slice(&crc.to_le_bytes());
        record
    }

    /// 按 `entry_count` 个指针项的段 0 长度计算布局并应用 `tweak`
    fn pointer_entries(
        &self,
        ids: &[u16],
        entry_count: usize,
        tweak: &impl Fn(&mut Vec<Entry>),
    ) -> Vec<Entry> {
        let pointer_len = 16 + 10 * entry_count;
        let mut offset = 6 + pointer_len;
        let mut layout = vec![(0u16, pointer_len as u32, 7u32)];
        for (id, body) in &self.sections {
            let length = 16 + body.len();
            layout.push((*id, length as u32, offset as u32 + 1));
            offset += length;
        }

        let mut entries: Vec<Entry> = ids
            .iter()
            .map(|id| {
                layout
                    .iter()
                    .find(|(lid, _, _)| lid == id)
                    .copied()
                    .unwrap_or((*id, 0, 0))
            })
            .collect();
        tweak(&mut entries);
        entries
    }
}

/// 带正确 CRC 的段 (段头 + 段体)
pub fn section_bytes(id: u16, body: &[u8]) -> Vec<u8> {
    let mut out = vec![0, 0];
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&((16 + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&[20, 20]);
    out.extend_from_slice(b"SCPECG");
    out.extend_from_slice(body);
    let crc = crc16_ccitt(&out[2..]);
    out[..2].copy_from_slice(&crc.to_le_bytes());
    out
}

/// 段 1: 标签-长度-值字段, 以 255 结束
pub fn patient_body(fields: &[(u8, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (tag, value) in fields {
        body.push(*tag);
        body.extend_from_slice(&(value.len() as u16).to_le_bytes());
        body.extend_from_slice(value);
    }
    body.extend_from_slice(&[255, 0, 0]);
    body
}

/// 段 2: 使用默认码表
pub fn default_huffman_body() -> Vec<u8> {
    19999u16.to_le_bytes().to_vec()
}

/// 段 3: (起始, 结束, 导联编号)
pub fn leads_body(flags: u8, leads: &[(u32, u32, u8)]) -> Vec<u8> {
    let mut body = vec![leads.len() as u8, flags];
    for (start, end, id) in leads {
        body.extend_from_slice(&start.to_le_bytes());
        body.extend_from_slice(&end.to_le_bytes());
        body.push(*id);
    }
    body
}

/// 段 4: 减除区 (类型, 起点, 基准点, 终点) 与保护区 (起点, 终点)
pub fn qrs_body(
    duration_ms: u16,
    fiducial: u16,
    zones: &[(u16, u32, u32, u32)],
    protected: &[(u32, u32)],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&duration_ms.to_le_bytes());
    body.extend_from_slice(&fiducial.to_le_bytes());
    body.extend_from_slice(&(zones.len() as u16).to_le_bytes());
    for (t, s, f, e) in zones {
        body.extend_from_slice(&t.to_le_bytes());
        body.extend_from_slice(&s.to_le_bytes());
        body.extend_from_slice(&f.to_le_bytes());
        body.extend_from_slice(&e.to_le_bytes());
    }
    for (s, e) in protected {
        body.extend_from_slice(&s.to_le_bytes());
        body.extend_from_slice(&e.to_le_bytes());
    }
    body
}

/// 段 5/6: 幅度倍率, 采样间隔, 差分模式, 每导联压缩字节
pub fn encoded_body(multiplier_nv: u16, interval_us: u16, mode: u8, leads: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&multiplier_nv.to_le_bytes());
    body.extend_from_slice(&interval_us.to_le_bytes());
    body.push(mode);
    body.push(0);
    for lead in leads {
        body.extend_from_slice(&(lead.len() as u16).to_le_bytes());
    }
    for lead in leads {
        body.extend_from_slice(lead);
    }
    body
}

/// 按默认码表编码原始值
pub fn encode_default(values: &[i32]) -> Vec<u8> {
    let bits: String = values
        .iter()
        .map(|v| match *v {
            0 => "0".to_string(),
            v if v.abs() <= 8 => {
                let sign = if v < 0 { "1" } else { "0" };
                format!("{}0{}", "1".repeat(v.unsigned_abs() as usize), sign)
            }
            v if (-128..=127).contains(&v) => format!("1111111110{:08b}", v as u8),
            v => format!("1111111111{:016b}", v as i16 as u16),
        })
        .collect();
    let bits: Vec<u8> = bits.bytes().map(|b| b - b'0').collect();
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, b)| acc | (b << (7 - i)))
        })
        .collect()
}

/// 未做熵编码的导联数据 (小端 16 位)
pub fn raw_le(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
