//! CRC 校验和计算.
//!
//! SCP-ECG 的记录与各段都以 CRC-CCITT 开头 (多项式 0x1021, 初始值 0xFFFF,
//! 不反射, 无最终异或), 校验范围从 CRC 字段之后的第一个字节开始.

/// CRC-CCITT 查找表 (多项式 0x1021)
const CRC16_CCITT_TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0u16;
    while i < 256 {
        let mut crc = i << 8;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// CRC-CCITT 初始值
pub const CRC16_CCITT_INIT: u16 = 0xFFFF;

/// 计算 CRC-CCITT
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = CRC16_CCITT_INIT;
    for &byte in data {
        crc = (crc << 8) ^ CRC16_CCITT_TABLE[((crc >> 8) as u8 ^ byte) as usize];
    }
    crc
}
