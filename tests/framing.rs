use std::fs;
use std::path::PathBuf;

use brseq::util::FromHexString;
use brseq::{decode_binary, encode_binary, parse_text, DecodeError};

pub static TESTS_DIR: &str = "tests/files";

#[test]
fn test_bad_signature() {
    let mut bytes = reference("empty_track");
    bytes[0] = b'X';
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::BadSignature { offset: 0, .. })
    ));
}

#[test]
fn test_bad_data_tag() {
    let mut bytes = reference("empty_track");
    // The DATA tag sits at the section base.
    bytes[0x20] = b'd';
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::BadSignature { offset: 0x20, .. })
    ));
}

#[test]
fn test_unsupported_bom() {
    let mut bytes = reference("empty_track");
    bytes[4] = 0xFF;
    bytes[5] = 0xFE;
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::UnsupportedBom(0xFFFE))
    ));
}

#[test]
fn test_unknown_version() {
    let mut bytes = reference("empty_track");
    bytes[6] = 0x02;
    bytes[7] = 0x00;
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::UnknownVersion(0x0200))
    ));
}

#[test]
fn test_supported_versions() {
    for minor in 0..=4u8 {
        let mut bytes = reference("empty_track");
        bytes[6] = 0x01;
        bytes[7] = minor;
        let file = decode_binary(&bytes).unwrap();
        assert_eq!(file.version, (1, minor));
    }
}

#[test]
fn test_truncated_header() {
    let bytes = reference("empty_track");
    assert!(matches!(
        decode_binary(&bytes[..10]),
        Err(DecodeError::TruncatedHeader)
    ));
}

#[test]
fn test_truncated_data_section() {
    let bytes = reference("empty_track");
    // Cut the image inside the DATA payload.
    assert!(matches!(
        decode_binary(&bytes[..0x2C]),
        Err(DecodeError::TruncatedSection(0x20))
    ));
}

#[test]
fn test_truncated_label_section() {
    let bytes = reference("empty_track");
    // Keep DATA intact but cut the image inside LABL.
    assert!(matches!(
        decode_binary(&bytes[..0x30]),
        Err(DecodeError::TruncatedSection(_))
    ));
}

#[test]
fn test_unknown_opcode() {
    let mut bytes = reference("empty_track");
    // The single payload byte sits after the DATA section header.
    bytes[0x2C] = 0xB7;
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::UnknownOpcode { opcode: 0xB7, offset: 0x2C })
    ));
}

#[test]
fn test_reserved_note_opcodes() {
    for reserved in [0x7Eu8, 0x7F] {
        let mut bytes = reference("empty_track");
        bytes[0x2C] = reserved;
        assert!(matches!(
            decode_binary(&bytes),
            Err(DecodeError::UnknownOpcode { opcode, offset: 0x2C }) if opcode == reserved
        ));
    }
}

#[test]
fn test_truncated_instruction() {
    // A track which runs off the end of the payload without reaching
    // a terminator.
    let file = parse_text("main:\n    wait 1\n").unwrap();
    let bytes = encode_binary(&file).unwrap();
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::TruncatedInstruction(_))
    ));
}

#[test]
fn test_varlen_too_long() {
    // A maximal four-byte gate, then flip its final byte so all four
    // carry the continuation bit.
    let file = parse_text("main:\n    wait 268435455\n    fin\n").unwrap();
    let mut bytes = encode_binary(&file).unwrap();
    // Payload starts at 0x2C: opcode, then four varlen bytes.
    assert_eq!(bytes[0x2C], 0x80);
    assert_eq!(bytes[0x2C + 4], 0x7F);
    bytes[0x2C + 4] = 0xFF;
    assert!(matches!(
        decode_binary(&bytes),
        Err(DecodeError::VarlenTooLong(at)) if at == 0x2D
    ));
}

// ===================================================================
// Helpers
// ===================================================================

fn reference(name: &str) -> Vec<u8> {
    let path = PathBuf::from(TESTS_DIR).join(format!("{name}.hex"));
    let hex = fs::read_to_string(path).unwrap();
    hex.trim().from_hex_string().unwrap()
}
