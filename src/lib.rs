/// Functionality for working with sequences represented in the
/// textual listing language: the lexer, the parser, and the
/// canonical printer.
pub mod asm;
/// Functionality related to the binary container: framing, the LABL
/// name table, and the in-memory file model.
pub mod container;
/// Functionality related to the MML instruction set itself: the
/// opcode grammar tables, the instruction model, and the decoder /
/// encoder pair built on them.
pub mod mml;
pub mod util;

mod convert;

pub use asm::ParseError;
pub use container::{BseqFile, DecodeError, Label, Track};
pub use convert::convert;
pub use mml::{EncodeError, EncodeOptions, Instruction, Operand};

/// Decode a fully-materialised container image.
pub fn decode_binary(bytes: &[u8]) -> Result<BseqFile, DecodeError> {
    BseqFile::from_bytes(bytes)
}

/// Encode a file into a fresh container image, leaving synthetic
/// labels out of the LABL section.
pub fn encode_binary(file: &BseqFile) -> Result<Vec<u8>, EncodeError> {
    file.to_bytes()
}

/// Parse a textual listing.
pub fn parse_text(input: &str) -> Result<BseqFile, ParseError> {
    asm::parse(input)
}

/// Render the canonical textual listing.
pub fn format_text(file: &BseqFile) -> String {
    asm::format(file)
}
