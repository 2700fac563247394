//! SCP-ECG Huffman 码表.
//!
//! 码表是只读数据: 每个码字结构包含前缀位数、总位数、表模式、基值与基码.
//! 段 2 中存储的基码相对解码顺序是按位反转的 (先存低位), 比较前必须反转回来.
//!
//! 默认码表由标准规定, 段 2 的表数量字段为 19999 时使用.

use std::borrow::Cow;

use scp_core::{ScpError, ScpResult};

/// 表模式: 切换到 `base_value` 指定的码表
pub const TABLE_MODE_SWITCH: u8 = 0;
/// 表模式: 码字表示一个数值
pub const TABLE_MODE_VALUE: u8 = 1;

/// 段 2 表数量哨兵值: 使用标准默认码表
pub const DEFAULT_TABLE_SENTINEL: u16 = 19999;
/// 段 2 表数量哨兵值: 未做熵编码
pub const NO_TABLE_SENTINEL: u16 = 0;

/// 单个 Huffman 码字结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    /// 前缀位数
    pub prefix_bits: u8,
    /// 码字总位数 (前缀 + 字面量)
    pub code_bits: u8,
    /// 表模式 ([`TABLE_MODE_SWITCH`] / [`TABLE_MODE_VALUE`])
    pub table_mode: u8,
    /// 基值; 切表码中为目标表号 (从 1 开始)
    pub base_value: i32,
    /// 基码 (存储顺序, 已按位反转)
    pub base_code: u32,
}

impl HuffmanCode {
    /// 创建码字结构
    pub const fn new(
        prefix_bits: u8,
        code_bits: u8,
        table_mode: u8,
        base_value: i32,
        base_code: u32,
    ) -> Self {
        Self {
            prefix_bits,
            code_bits,
            table_mode,
            base_value,
            base_code,
        }
    }

    /// 是否为切表码
    pub fn is_table_switch(&self) -> bool {
        self.table_mode == TABLE_MODE_SWITCH
    }

    /// 前缀之后的字面量位数
    pub fn literal_bits(&self) -> u32 {
        u32::from(self.code_bits.saturating_sub(self.prefix_bits))
    }

    /// 按解码顺序 (MSB first) 排列的前缀
    pub fn prefix(&self) -> u32 {
        reverse_bits(self.base_code, self.prefix_bits)
    }
}

/// 反转 `value` 低 `width` 位的位序
pub fn reverse_bits(value: u32, width: u8) -> u32 {
    match width {
        0 => 0,
        w if w >= 32 => value.reverse_bits(),
        w => value.reverse_bits() >> (32 - u32::from(w)),
    }
}

/// 标准默认码表 (19 个码字)
///
/// 0 用 1 位编码, ±1..±8 用 3-10 位编码, 其余值使用 8 位或 16 位字面量.
pub const DEFAULT_CODES: [HuffmanCode; 19] = [
    HuffmanCode::new(1, 1, 1, 0, 0),
    HuffmanCode::new(3, 3, 1, 1, 1),
    HuffmanCode::new(3, 3, 1, -1, 5),
    HuffmanCode::new(4, 4, 1, 2, 3),
    HuffmanCode::new(4, 4, 1, -2, 11),
    HuffmanCode::new(5, 5, 1, 3, 7),
    HuffmanCode::new(5, 5, 1, -3, 23),
    HuffmanCode::new(6, 6, 1, 4, 15),
    HuffmanCode::new(6, 6, 1, -4, 47),
    HuffmanCode::new(7, 7, 1, 5, 31),
    HuffmanCode::new(7, 7, 1, -5, 95),
    HuffmanCode::new(8, 8, 1, 6, 63),
    HuffmanCode::new(8, 8, 1, -6, 191),
    HuffmanCode::new(9, 9, 1, 7, 127),
    HuffmanCode::new(9, 9, 1, -7, 383),
    HuffmanCode::new(10, 10, 1, 8, 255),
    HuffmanCode::new(10, 10, 1, -8, 767),
    HuffmanCode::new(10, 18, 1, 0, 511),
    HuffmanCode::new(10, 26, 1, 0, 1023),
];

/// 标准默认码表
pub static DEFAULT_TABLE: HuffmanTable = HuffmanTable {
    codes: Cow::Borrowed(&DEFAULT_CODES),
};

/// Huffman 码表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    codes: Cow<'static, [HuffmanCode]>,
}

impl HuffmanTable {
    /// 从段 2 读出的码字结构创建码表
    ///
    /// 校验每个码字的位宽, 拒绝无法解码的结构.
    pub fn new(codes: Vec<HuffmanCode>) -> ScpResult<Self> {
        if codes.is_empty() {
            return Err(ScpError::InvalidData("Huffman 码表为空".into()));
        }
        for (i, code) in codes.iter().enumerate() {
            if code.prefix_bits == 0 || code.prefix_bits > 32 {
                return Err(ScpError::InvalidData(format!(
                    "Huffman 码字 {} 前缀位数非法: {}",
                    i, code.prefix_bits
                )));
            }
            if code.code_bits < code.prefix_bits {
                return Err(ScpError::InvalidData(format!(
                    "Huffman 码字 {} 总位数 {} 小于前缀位数 {}",
                    i, code.code_bits, code.prefix_bits
                )));
            }
            if !code.is_table_switch() && code.literal_bits() > 32 {
                return Err(ScpError::InvalidData(format!(
                    "Huffman 码字 {} 字面量超过 32 位: {}",
                    i,
                    code.literal_bits()
                )));
            }
        }
        Ok(Self {
            codes: Cow::Owned(codes),
        })
    }

    /// 全部码字结构 (表内顺序)
    pub fn codes(&self) -> &[HuffmanCode] {
        &self.codes
    }

    /// 码字数量
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// 是否为空表
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// 最长前缀位数
    pub fn max_prefix_bits(&self) -> u8 {
        self.codes.iter().map(|c| c.prefix_bits).max().unwrap_or(0)
    }

    /// 按表内顺序查找与已读前缀匹配的码字
    pub fn find(&self, bits: u8, prefix: u32) -> Option<HuffmanCode> {
        self.codes
            .iter()
            .find(|c| c.prefix_bits == bits && c.prefix() == prefix)
            .copied()
    }
}

/// 一条记录使用的码表集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HuffmanTables {
    /// 标准默认码表
    #[default]
    Default,
    /// 段 2 中给出的自定义码表 (表号从 1 开始)
    Custom(Vec<HuffmanTable>),
    /// 未做熵编码, 数据为小端 16 位整数
    Uncompressed,
}

impl HuffmanTables {
    /// 按表号 (从 1 开始) 获取码表
    pub fn table(&self, number: i32) -> Option<&HuffmanTable> {
        match self {
            Self::Default => (number == 1).then_some(&DEFAULT_TABLE),
            Self::Custom(tables) => usize::try_from(number)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| tables.get(idx)),
            Self::Uncompressed => None,
        }
    }

    /// 可用码表数量
    pub fn len(&self) -> usize {
        match self {
            Self::Default => 1,
            Self::Custom(tables) => tables.len(),
            Self::Uncompressed => 0,
        }
    }

    /// 是否没有任何码表
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 数据是否经过 Huffman 编码
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::Uncompressed)
    }
}
