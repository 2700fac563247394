//! 测试辅助: 按默认码表编码采样值.

/// 将 "0101..." 位串打包为字节, 末尾补 0
pub(crate) fn pack_bits(bits: &str) -> Vec<u8> {
    let bits: Vec<u8> = bits
        .chars()
        .filter(|c| *c == '0' || *c == '1')
        .map(|c| (c == '1') as u8)
        .collect();
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, b)| acc | (b << (7 - i)))
        })
        .collect()
}

/// 默认码表下单个值的码字
pub(crate) fn default_code(value: i32) -> String {
    match value {
        0 => "0".to_string(),
        v if v.abs() <= 8 => {
            let sign = if v < 0 { "1" } else { "0" };
            format!("{}0{}", "1".repeat(v.unsigned_abs() as usize), sign)
        }
        v if (-128..=127).contains(&v) => format!("1111111110{:08b}", v as u8),
        v => format!("1111111111{:016b}", v as i16 as u16),
    }
}

/// 按默认码表编码一组原始值
pub(crate) fn encode_default(values: &[i32]) -> Vec<u8> {
    let bits: String = values.iter().map(|v| default_code(*v)).collect();
    pack_bits(&bits)
}
