use std::fs;
use std::path::PathBuf;

use brseq::{decode_binary, format_text};
use brseq::util::FromHexString;

pub static TESTS_DIR: &str = "tests/files";

// Include the programmatically generated test file.
include!(concat!(env!("OUT_DIR"), "/bin_tests.rs"));

/// Run a specific test by loading the container image out of the
/// reference directory, disassembling it, and comparing against the
/// paired listing.
fn check(test: &str) {
    // Construct input files
    let seqfile = to_seqfile(test);
    let hexfile = to_hexfile(test);
    // Read the test file
    let text = fs::read_to_string(seqfile).unwrap();
    let hex = fs::read_to_string(hexfile).unwrap();
    // Parse hex string into bytes
    let bytes = hex.trim().from_hex_string().unwrap();
    // Decode the container
    let file = match decode_binary(&bytes) {
        Ok(file) => file,
        Err(e) => panic!("{test}.hex: {e}"),
    };
    // Check the rendered listing matches
    assert_eq!(format_text(&file), text);
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
