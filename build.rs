use std::fs;
use std::io::Write;
use std::path::Path;

pub static TESTS_DIR: &str = "tests/files";
pub static SEQ_EXT: &str = "rseq";
pub static HEX_EXT: &str = "hex";

fn gentests(testdir: &str, ext: &str, target: &Path) {
    let mut f = fs::File::create(target).unwrap();
    // Open reference test directory
    let dir = fs::read_dir(testdir).unwrap();

    for e in dir {
        let p = e.as_ref().unwrap().path();
        let n = p.file_stem().unwrap().to_str().unwrap();
        //
        if p.extension().unwrap() == ext {
            writeln!(f).unwrap();
            writeln!(f, "#[test]").unwrap();
            writeln!(f, "fn test_{n}() {{ check(\"{n}\"); }}").unwrap();
        }
    }
}

/// The purpose of this script is to generate a set of tests for each
/// of the reference sequences.
fn main() {
    // Create destination file
    let out_dir = std::env::var("OUT_DIR").unwrap();
    // Listing => Container tests
    let asm_file = std::path::Path::new(&out_dir).join("asm_tests.rs");
    gentests(TESTS_DIR, SEQ_EXT, &asm_file);
    // Container => Listing tests
    let bin_file = std::path::Path::new(&out_dir).join("bin_tests.rs");
    gentests(TESTS_DIR, HEX_EXT, &bin_file);
}
