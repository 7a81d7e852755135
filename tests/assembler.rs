use std::fs;
use std::path::PathBuf;

use brseq::parse_text;
use brseq::util::{FromHexString, ToHexString};

pub static TESTS_DIR: &str = "tests/files";

// Include the programmatically generated test file.
include!(concat!(env!("OUT_DIR"), "/asm_tests.rs"));

/// Run a specific test by loading the listing out of the reference
/// directory, assembling it, and comparing against the paired
/// container image.
fn check(test: &str) {
    // Construct input files
    let seqfile = to_seqfile(test);
    let hexfile = to_hexfile(test);
    // Read the test file
    let text = fs::read_to_string(seqfile).unwrap();
    let hex = fs::read_to_string(hexfile).unwrap();
    // Parse listing into a sequence file
    let file = match parse_text(&text) {
        Ok(file) => file,
        Err(e) => panic!("{test}.rseq: {e}"),
    };
    // Translate the file into bytes
    let bytes = match file.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => panic!("{test}.rseq: {e}"),
    };
    // Parse hex string into bytes
    let expected = hex.trim().from_hex_string().unwrap();
    // Check they match
    assert_eq!(bytes.to_hex_string(), expected.to_hex_string());
}

fn to_seqfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test.to_string());
    path.set_extension("rseq");
    path
}

fn to_hexfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test.to_string());
    path.set_extension("hex");
    path
}
