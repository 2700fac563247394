//! SCP-ECG 自适应 Huffman 解码器.
//!
//! 解码流程 (每个采样):
//! 1. 逐位读取前缀, 每读一位按表内顺序查找匹配码字
//! 2. 切表码: 激活 `base_value` 指定的码表, 重新开始本采样的解码
//! 3. 前缀位数 == 总位数: 取基值; 否则读取字面量并做符号扩展
//! 4. 按差分模式还原 (历史值始终为未缩放的值)
//! 5. 乘以幅度倍率 (nV / 1000), 截断为 16 位

use log::trace;
use scp_core::bitreader::BitReader;
use scp_core::{ScpError, ScpResult};

use super::table::{HuffmanTable, HuffmanTables};

/// 每个输出单位对应的纳伏数 (输出单位为 µV)
pub const NANOVOLTS_PER_UNIT: i64 = 1000;

/// 差分编码模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceMode {
    /// 模式 0: 数值即采样
    #[default]
    Absolute,
    /// 模式 1: 一阶差分, 第一个值为绝对值
    First,
    /// 模式 2: 二阶差分, 前两个值为绝对值
    Second,
}

impl DifferenceMode {
    /// 段 5/6 中存储的模式编号
    pub fn code(self) -> u8 {
        match self {
            Self::Absolute => 0,
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

impl TryFrom<u8> for DifferenceMode {
    type Error = ScpError;

    fn try_from(value: u8) -> ScpResult<Self> {
        match value {
            0 => Ok(Self::Absolute),
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(ScpError::InvalidData(format!(
                "不支持的差分编码模式: {}",
                other
            ))),
        }
    }
}

/// 单个导联的解码参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// 幅度倍率 (纳伏)
    pub amplitude_multiplier_nv: i32,
    /// 差分编码模式
    pub difference_mode: DifferenceMode,
}

impl DecoderConfig {
    /// 创建解码参数
    pub fn new(amplitude_multiplier_nv: i32, difference_mode: DifferenceMode) -> Self {
        Self {
            amplitude_multiplier_nv,
            difference_mode,
        }
    }
}

/// Huffman 解码器
///
/// 每个导联独立持有一个解码器实例, 状态 (位游标、当前码表、差分历史)
/// 不在导联之间共享.
pub struct HuffmanDecoder<'a> {
    /// 位游标
    br: BitReader<'a>,
    /// 码表集合
    tables: &'a HuffmanTables,
    /// 当前激活的码表, None 表示未做熵编码
    active: Option<&'a HuffmanTable>,
    /// 解码参数
    config: DecoderConfig,
    /// 最近两个未缩放的还原值 [前一个, 前两个]
    history: [i32; 2],
    /// 已解码采样数
    decoded: usize,
}

impl<'a> HuffmanDecoder<'a> {
    /// 创建解码器, 初始激活 1 号码表
    pub fn new(data: &'a [u8], tables: &'a HuffmanTables, config: DecoderConfig) -> ScpResult<Self> {
        let active = if tables.is_compressed() {
            let initial = tables.table(1).ok_or(ScpError::UnknownTable {
                table: 1,
                available: tables.len(),
            })?;
            Some(initial)
        } else {
            None
        };

        Ok(Self {
            br: BitReader::new(data),
            tables,
            active,
            config,
            history: [0; 2],
            decoded: 0,
        })
    }

    /// 已解码采样数
    pub fn decoded_count(&self) -> usize {
        self.decoded
    }

    /// 已消耗的位数
    pub fn bits_consumed(&self) -> usize {
        self.br.bits_read()
    }

    /// 解码一个采样
    pub fn decode_one(&mut self) -> ScpResult<i16> {
        let raw = self.next_raw()?;
        let value = self.undifference(raw);
        self.history = [value, self.history[0]];
        self.decoded += 1;
        Ok(self.scale(value))
    }

    /// 连续解码 `n` 个采样
    pub fn decode_n(&mut self, n: usize) -> ScpResult<Vec<i16>> {
        // 每个码字至少占 1 位, 剩余位数是可解码采样数的上限
        let mut out = Vec::with_capacity(n.min(self.br.bits_left()));
        for _ in 0..n {
            out.push(self.decode_one()?);
        }
        Ok(out)
    }

    /// 熵解码层: 返回差分还原前的原始值
    fn next_raw(&mut self) -> ScpResult<i32> {
        let Some(mut table) = self.active else {
            return self.read_uncompressed();
        };

        loop {
            let code = self.match_prefix(table)?;

            if code.is_table_switch() {
                let tables = self.tables;
                table = tables
                    .table(code.base_value)
                    .ok_or(ScpError::UnknownTable {
                        table: code.base_value,
                        available: tables.len(),
                    })?;
                self.active = Some(table);
                trace!(
                    "切换到 Huffman 表 {} (采样 {})",
                    code.base_value, self.decoded
                );
                continue;
            }

            let literal_bits = code.literal_bits();
            if literal_bits == 0 {
                return Ok(code.base_value);
            }
            let decoded = self.decoded;
            return self
                .br
                .read_bits_signed(literal_bits)
                .map_err(|e| exhausted(e, decoded));
        }
    }

    /// 逐位读取前缀直到命中码字
    fn match_prefix(&mut self, table: &HuffmanTable) -> ScpResult<super::table::HuffmanCode> {
        let max_bits = table.max_prefix_bits();
        let decoded = self.decoded;
        let mut prefix = 0u32;
        let mut bits = 0u8;

        loop {
            let bit = self.br.read_bit().map_err(|e| exhausted(e, decoded))?;
            prefix = (prefix << 1) | bit;
            bits += 1;

            if let Some(code) = table.find(bits, prefix) {
                return Ok(code);
            }
            if bits >= max_bits {
                return Err(ScpError::NoMatchingPrefix {
                    bits: u32::from(bits),
                });
            }
        }
    }

    /// 未做熵编码时, 每个值为小端 16 位整数
    fn read_uncompressed(&mut self) -> ScpResult<i32> {
        let decoded = self.decoded;
        let lo = self.br.read_bits(8).map_err(|e| exhausted(e, decoded))?;
        let hi = self.br.read_bits(8).map_err(|e| exhausted(e, decoded))?;
        Ok(i32::from(i16::from_le_bytes([lo as u8, hi as u8])))
    }

    /// 差分还原
    fn undifference(&self, raw: i32) -> i32 {
        let [prev, prev2] = self.history;
        match self.config.difference_mode {
            DifferenceMode::First if self.decoded >= 1 => raw.wrapping_add(prev),
            DifferenceMode::Second if self.decoded >= 2 => raw
                .wrapping_add(prev.wrapping_mul(2))
                .wrapping_sub(prev2),
            _ => raw,
        }
    }

    /// 幅度缩放, 溢出时按 16 位截断
    fn scale(&self, value: i32) -> i16 {
        let scaled =
            i64::from(value) * i64::from(self.config.amplitude_multiplier_nv) / NANOVOLTS_PER_UNIT;
        scaled as i16
    }
}

/// 位流耗尽映射为带进度信息的错误
fn exhausted(err: ScpError, decoded: usize) -> ScpError {
    match err {
        ScpError::Eof => ScpError::BitsExhausted { decoded },
        other => other,
    }
}
