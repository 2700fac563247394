//! 从文件读取并解码.

mod common;

use common::*;
use std::io::Write;

#[test]
fn test_decode_file() {
    let data = RecordBuilder::new()
        .section(2, default_huffman_body())
        .section(3, leads_body(0x04, &[(1, 3, 3)]))
        .section(6, encoded_body(2000, 1000, 0, &[encode_default(&[1, -2, 3])]))
        .build();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let record = scp::decode_file(file.path()).unwrap();
    assert_eq!(record.lead_names(), vec!["V1"]);
    // 幅度倍率 2 µV
    assert_eq!(record.lead_samples, vec![vec![2, -4, 6]]);
    assert_eq!(record.sample_interval_us(), 1000);
}

#[test]
fn test_decode_file_不存在() {
    let dir = tempfile::tempdir().unwrap();
    let err = scp::decode_file(dir.path().join("missing.scp")).unwrap_err();
    assert!(matches!(err, scp::ScpError::Io(_)), "{err:?}");
}
