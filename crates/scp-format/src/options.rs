//! 解码选项.

use serde::{Deserialize, Serialize};

/// 缺少段 2 时的码表策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHuffmanPolicy {
    /// 使用标准默认码表
    #[default]
    DefaultTable,
    /// 视为未做熵编码
    Uncompressed,
}

/// 解码选项
///
/// 可从 JSON 配置文件反序列化, 缺省字段取默认值.
///
/// # 示例
/// ```
/// use scp_format::DecodeOptions;
///
/// let opts: DecodeOptions = serde_json::from_str(r#"{ "parallel_leads": true }"#).unwrap();
/// assert!(opts.parallel_leads);
/// assert!(opts.verify_crc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// 校验记录与各段的 CRC, 不匹配时记录告警
    pub verify_crc: bool,
    /// 用段 0 交叉校验记录布局
    pub validate_pointers: bool,
    /// 并行解码各导联
    pub parallel_leads: bool,
    /// 缺少段 2 时的码表策略
    pub missing_huffman: MissingHuffmanPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_crc: true,
            validate_pointers: true,
            parallel_leads: false,
            missing_huffman: MissingHuffmanPolicy::DefaultTable,
        }
    }
}
