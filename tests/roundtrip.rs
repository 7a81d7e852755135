use std::fs;
use std::path::PathBuf;

use brseq::util::{ByteReader, ByteWriter, FromHexString, ToHexString};
use brseq::{decode_binary, encode_binary, format_text, parse_text};
use brseq::mml::opcode;

pub static TESTS_DIR: &str = "tests/files";

/// Every reference container reproduces itself byte-for-byte through
/// a decode / encode round trip.  (The reference set has no dead gap
/// bytes and minimal varlen encodings, which is what the property
/// requires.)
#[test]
fn test_binary_roundtrip() {
    for hex in reference_hexes() {
        let bytes = hex.1.trim().from_hex_string().unwrap();
        let file = decode_binary(&bytes).unwrap();
        let encoded = encode_binary(&file).unwrap();
        assert_eq!(
            encoded.to_hex_string(),
            bytes.to_hex_string(),
            "byte roundtrip failed for {}",
            hex.0.display()
        );
    }
}

/// Decoding, printing, and re-parsing yields the same structure.
#[test]
fn test_structural_roundtrip() {
    for hex in reference_hexes() {
        let bytes = hex.1.trim().from_hex_string().unwrap();
        let file = decode_binary(&bytes).unwrap();
        let reparsed = parse_text(&format_text(&file)).unwrap();
        assert_eq!(file, reparsed, "structural roundtrip failed for {}", hex.0.display());
    }
}

/// Printing and re-parsing a canonical listing is the identity.
#[test]
fn test_listing_roundtrip() {
    for (path, text) in reference_listings() {
        let file = parse_text(&text).unwrap();
        assert_eq!(format_text(&file), text, "listing roundtrip failed for {}", path.display());
    }
}

/// The version word survives a binary round trip.
#[test]
fn test_version_roundtrip() {
    let (_, hex) = reference_hex("empty_track");
    let mut bytes = hex.trim().from_hex_string().unwrap();
    // Rewrite the version word to 1.2
    bytes[6] = 0x01;
    bytes[7] = 0x02;
    let file = decode_binary(&bytes).unwrap();
    assert_eq!(file.version, (1, 2));
    assert_eq!(encode_binary(&file).unwrap(), bytes);
}

/// Varlen encode/decode are inverse across all four width classes,
/// and never take more than four bytes.
#[test]
fn test_varlen_inverse() {
    let samples: &[(u32, usize)] = &[
        (0, 1),
        (1, 1),
        (0x7F, 1),
        (0x80, 2),
        (96, 1),
        (200, 2),
        (0x3FFF, 2),
        (0x4000, 3),
        (0x1F_FFFF, 3),
        (0x20_0000, 4),
        (0x0FFF_FFFF, 4),
    ];
    for (value, width) in samples {
        let mut writer = ByteWriter::new();
        writer.write_varlen(*value);
        let bytes = writer.to_vec();
        assert_eq!(bytes.len(), *width, "width of {value}");
        let mut reader = ByteReader::new(&bytes);
        let read = reader
            .read_varlen::<&str>(|_| "truncated", |_| "overlong")
            .unwrap();
        assert_eq!(read, *value);
    }
}

/// The pitch table covers exactly the 126 note opcodes, one name
/// each, with the high bit clear.
#[test]
fn test_pitch_table() {
    assert_eq!(opcode::PITCH_NAMES.len(), 126);
    assert_eq!(opcode::pitch_opcode("cnm1"), Some(0x00));
    assert_eq!(opcode::pitch_opcode("cn4"), Some(0x3C));
    assert_eq!(opcode::pitch_opcode("en4"), Some(0x40));
    for (i, name) in opcode::PITCH_NAMES.iter().enumerate() {
        let op = opcode::pitch_opcode(name).unwrap();
        assert_eq!(op as usize, i);
        assert_eq!(op & 0x80, 0);
    }
    // The reserved opcodes have no name.
    assert_eq!(opcode::pitch_name(0x7E), None);
    assert_eq!(opcode::pitch_name(0x7F), None);
}

/// Every mnemonic in the grammar tables maps back to its own row.
#[test]
fn test_tables_are_inverse() {
    for row in opcode::MML_TABLE {
        let back = opcode::mml_row_by_mnemonic(row.mnemonic).unwrap();
        assert_eq!(back.opcode, row.opcode);
    }
    for row in opcode::MMLEX_TABLE {
        let back = opcode::mmlex_row_by_mnemonic(row.mnemonic).unwrap();
        assert_eq!(back.opcode, row.opcode);
    }
}

/// The LABL section keeps declaration order, not offset order.
#[test]
fn test_label_order_is_stable() {
    let (_, text) = reference_listing("song");
    let file = parse_text(&text).unwrap();
    let names: Vec<&str> = file.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["main", "loop", "sub"]);
    let decoded = decode_binary(&encode_binary(&file).unwrap()).unwrap();
    let names: Vec<&str> = decoded.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["main", "loop", "sub"]);
}

// ===================================================================
// Helpers
// ===================================================================

fn reference_hexes() -> Vec<(PathBuf, String)> {
    reference_files("hex")
}

fn reference_listings() -> Vec<(PathBuf, String)> {
    reference_files("rseq")
}

fn reference_files(ext: &str) -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    for entry in fs::read_dir(TESTS_DIR).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().map(|e| e == ext).unwrap_or(false) {
            let content = fs::read_to_string(&path).unwrap();
            files.push((path, content));
        }
    }
    assert!(!files.is_empty());
    files
}

fn reference_hex(name: &str) -> (PathBuf, String) {
    let path = PathBuf::from(TESTS_DIR).join(format!("{name}.hex"));
    let content = fs::read_to_string(&path).unwrap();
    (path, content)
}

fn reference_listing(name: &str) -> (PathBuf, String) {
    let path = PathBuf::from(TESTS_DIR).join(format!("{name}.rseq"));
    let content = fs::read_to_string(&path).unwrap();
    (path, content)
}
