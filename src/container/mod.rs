// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::fmt;

use crate::mml::encoder::{self, EncodeError, EncodeOptions};
use crate::mml::instruction::Instruction;
use crate::mml::decoder;

// Support for parsing the file and section headers.
pub mod framing;
// Support for the LABL name table.
pub mod labels;

/// The four byte ASCII signature every container opens with.
pub const SIGNATURE: [u8; 4] = *b"RSEQ";

/// The byte order mark.  The format is defined big endian, so only
/// this value is accepted.
pub const BOM: u16 = 0xFEFF;

/// The version written by the encoder, encoded on the wire as
/// `(major << 8) | minor`.
pub const DEFAULT_VERSION: (u8, u8) = (1, 4);

/// Determine whether a decoded version pair is one this crate
/// understands.  Versions `1.0` through `1.4` share the opcode
/// grammar implemented here.
pub fn version_supported(version: (u8, u8)) -> bool {
    version.0 == 1 && version.1 <= 4
}

// ============================================================================
// Decoding Error
// ============================================================================

/// An error which arises when decoding a byte sequence into a
/// `BseqFile`.  In essence, this indicates the byte sequence is
/// malformed in some way.  Every variant which can point at a
/// position carries the absolute byte offset at which decoding
/// failed.
pub enum DecodeError {
    /// Indicates a four byte ASCII tag (the file signature, or a
    /// section tag) did not match what the format requires.
    BadSignature {
        expected: [u8; 4],
        found: [u8; 4],
        offset: usize,
    },
    /// Indicates the byte order mark was not `0xFEFF`.
    UnsupportedBom(u16),
    /// Indicates the container reports a version this crate does not
    /// understand.
    UnknownVersion(u16),
    /// Indicates the image ended before the file header could be
    /// read in full.
    TruncatedHeader,
    /// Indicates a section header or section body extends beyond the
    /// end of the image.
    TruncatedSection(usize),
    /// Indicates an instruction operand extends beyond the end of
    /// the DATA payload.
    TruncatedInstruction(usize),
    /// Indicates a byte was encountered where an opcode was expected
    /// but no grammar row covers it.
    UnknownOpcode { opcode: u8, offset: usize },
    /// Indicates a variable-length integer ran past its four byte
    /// maximum.
    VarlenTooLong(usize),
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::BadSignature { expected, found, offset } => {
                write!(
                    f,
                    "bad signature at offset {:#x} (expected {:?}, found {:?})",
                    offset,
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(found)
                )
            }
            DecodeError::UnsupportedBom(w) => write!(f, "unsupported byte order mark ({:#06x})", w),
            DecodeError::UnknownVersion(w) => write!(f, "unknown container version ({:#06x})", w),
            DecodeError::TruncatedHeader => write!(f, "truncated file header"),
            DecodeError::TruncatedSection(at) => write!(f, "truncated section at offset {:#x}", at),
            DecodeError::TruncatedInstruction(at) => {
                write!(f, "truncated instruction at offset {:#x}", at)
            }
            DecodeError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode {:#04x} at offset {:#x}", opcode, offset)
            }
            DecodeError::VarlenTooLong(at) => {
                write!(f, "overlong variable-length integer at offset {:#x}", at)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Just reuse debug formatting.
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for DecodeError {}

// ============================================================================
// Labels
// ============================================================================

/// A named entry point into the DATA payload.  `data_offset` is
/// relative to the start of the payload region (i.e. the DATA section
/// start plus `0x0C`).  Synthetic labels are minted by the decoder
/// for branch targets the LABL section does not name; they are kept
/// out of the LABL section when encoding unless explicitly requested.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub name: String,
    pub data_offset: u32,
    pub synthetic: bool,
}

impl Label {
    /// Mint the synthetic name for an unnamed branch target at a
    /// given absolute payload offset.
    pub fn synthetic(data_offset: u32) -> Self {
        Self {
            name: format!("_symb_0x{:x}", data_offset),
            data_offset,
            synthetic: true,
        }
    }

    /// Check whether a name follows the synthetic naming scheme.
    /// Listings round-trip synthetic labels by name alone, so the
    /// parser uses this to keep them out of the LABL section again.
    pub fn is_synthetic_name(name: &str) -> bool {
        match name.strip_prefix("_symb_0x") {
            Some(digits) => {
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }
}

// ============================================================================
// Tracks
// ============================================================================

/// One decoded instruction chunk.  A track begins at the payload
/// offset of its label(s) and ends at the first `fin`, `ret` or
/// unconditional `jump`.  Labels sharing an offset are aliases of the
/// same track and are all listed in `names` (file order).
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub start: u32,
    pub names: Vec<String>,
    pub instructions: Vec<Instruction>,
}

// ============================================================================
// File
// ============================================================================

/// The in-memory representation of a parsed container: a version, the
/// label namespace, and one instruction sequence per distinct entry
/// offset.  Values are immutable once constructed; the encoder builds
/// a fresh byte image rather than mutating.
#[derive(Clone, Debug, PartialEq)]
pub struct BseqFile {
    pub version: (u8, u8),
    /// Named labels in LABL-section order, followed by synthetic
    /// labels in ascending offset order.
    pub labels: Vec<Label>,
    /// Tracks in ascending start-offset order.
    pub tracks: Vec<Track>,
}

impl BseqFile {
    /// Decode a fully-materialised container image.
    pub fn from_bytes(bytes: &[u8]) -> Result<BseqFile, DecodeError> {
        decoder::decode(bytes)
    }

    /// Encode this file into a fresh container image, leaving
    /// synthetic labels out of the LABL section.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encoder::encode(self, &EncodeOptions::default())
    }

    /// As `to_bytes`, with explicit encoding options.
    pub fn to_bytes_with(&self, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
        encoder::encode(self, options)
    }

    /// Look up a track by one of its label names.
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.names.iter().any(|n| n == name))
    }

    /// Look up a label by name.
    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.name == name)
    }
}
