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
use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;

use super::instruction::{Instruction, Operand};
use super::opcode;
use crate::container::framing::{self, SECTION_HEADER_LEN};
use crate::container::labels;
use crate::container::BseqFile;
use crate::util::ByteWriter;

// ============================================================================
// Encoding Error
// ============================================================================

/// An error which arises when encoding a `BseqFile` into a byte
/// image.  This indicates the model is malformed in some way (its
/// label namespace, or a control-flow distance the wire format cannot
/// carry).
#[derive(Debug)]
pub enum EncodeError {
    /// Indicates a control-flow delta (target minus track base) does
    /// not fit an unsigned 24bit field.  Negative deltas arise when a
    /// reference targets a label laid out before its track base.
    U24Overflow(i64),
    /// Indicates an instruction references a label which no track
    /// carries.
    UndefinedLabel(String),
    /// Indicates two labels share one name.
    DuplicateLabel(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::U24Overflow(delta) => {
                write!(f, "branch distance {} exceeds 24 bits", delta)
            }
            EncodeError::UndefinedLabel(name) => write!(f, "undefined label \"{name}\""),
            EncodeError::DuplicateLabel(name) => write!(f, "duplicate label \"{name}\""),
        }
    }
}

impl std::error::Error for EncodeError {}

// ============================================================================
// Options
// ============================================================================

/// Knobs for the encoder.  By default synthetic labels stay out of
/// the LABL section, reproducing the namespace of the file they were
/// decoded from.
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    pub write_synthetic_labels: bool,
}

// ============================================================================
// Layout (pass one)
// ============================================================================

/// The result of the sizing pass: a final payload offset for every
/// track and every label name.
pub(crate) struct Layout {
    pub starts: Vec<u32>,
    pub offsets: HashMap<String, u32>,
    pub payload_len: u32,
}

/// Walk every track, sizing each instruction at its minimum encoding
/// (varlen operands take the fewest seven-bit groups that fit).  No
/// instruction's size depends on where a label lands, so a single
/// walk suffices.
pub(crate) fn layout(file: &BseqFile) -> Layout {
    let mut starts = Vec::with_capacity(file.tracks.len());
    let mut offsets = HashMap::new();
    let mut at: u32 = 0;
    for track in &file.tracks {
        starts.push(at);
        for name in &track.names {
            offsets.insert(name.clone(), at);
        }
        for insn in &track.instructions {
            at += insn.encoded_len() as u32;
        }
    }
    Layout { starts, offsets, payload_len: at }
}

// ============================================================================
// Emission (pass two)
// ============================================================================

/// Encode a file into a fresh container image.
pub fn encode(file: &BseqFile, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    // Sanity check the label namespace before laying anything out.
    let mut seen = HashSet::new();
    for label in &file.labels {
        if !seen.insert(label.name.as_str()) {
            return Err(EncodeError::DuplicateLabel(label.name.clone()));
        }
    }
    let layout = layout(file);
    for label in &file.labels {
        if !layout.offsets.contains_key(&label.name) {
            return Err(EncodeError::UndefinedLabel(label.name.clone()));
        }
    }
    debug!(
        "laid out {} tracks in {} payload bytes",
        file.tracks.len(),
        layout.payload_len
    );
    // Emit the payload, patching each 24bit slot with the distance
    // from its track base.
    let mut payload = ByteWriter::new();
    for (i, track) in file.tracks.iter().enumerate() {
        let base = layout.starts[i];
        for insn in &track.instructions {
            emit_instruction(&mut payload, insn, base, &layout.offsets)?;
        }
    }
    let payload = payload.to_vec();
    // Section sizes are final now; compose the image.
    let label_pairs: Vec<(&str, u32)> = file
        .labels
        .iter()
        .filter(|l| !l.synthetic || options.write_synthetic_labels)
        .map(|l| (l.name.as_str(), layout.offsets[&l.name]))
        .collect();
    let data_size = (SECTION_HEADER_LEN + payload.len()) as u32;
    let label_base = framing::FILE_HEADER_LEN as u32 + data_size;
    let label_size = labels::section_size(&label_pairs) as u32;
    let mut out = ByteWriter::new();
    framing::write_file_header(&mut out, file.version, 0, data_size, label_base, label_size);
    framing::write_data_header(&mut out, payload.len());
    out.write_bytes(&payload);
    labels::write_label_section(&mut out, &label_pairs);
    // Back-fill the total size now the image is complete.
    let total = out.len() as u32;
    out.patch_u32(0x08, total);
    Ok(out.to_vec())
}

/// Emit one instruction, recursing through prefix chains.
fn emit_instruction(
    writer: &mut ByteWriter,
    insn: &Instruction,
    track_base: u32,
    offsets: &HashMap<String, u32>,
) -> Result<(), EncodeError> {
    match insn {
        Instruction::Note { pitch, velocity, gate } => {
            writer.write_u8(*pitch);
            writer.write_u8(*velocity);
            writer.write_varlen(*gate);
        }
        Instruction::Mml { opcode: op, operands } => {
            writer.write_u8(*op);
            emit_operands(writer, operands, track_base, offsets)?;
        }
        Instruction::MmlEx { opcode: op, operands } => {
            writer.write_u8(opcode::EX_COMMAND);
            writer.write_u8(*op);
            emit_operands(writer, operands, track_base, offsets)?;
        }
    }
    Ok(())
}

fn emit_operands(
    writer: &mut ByteWriter,
    operands: &[Operand],
    track_base: u32,
    offsets: &HashMap<String, u32>,
) -> Result<(), EncodeError> {
    for operand in operands {
        match operand {
            Operand::U8(v) => writer.write_u8(*v),
            Operand::S16(v) => writer.write_i16(*v),
            Operand::VarLen(v) => writer.write_varlen(*v),
            Operand::LabelRef(name) => {
                let target = offsets
                    .get(name)
                    .ok_or_else(|| EncodeError::UndefinedLabel(name.clone()))?;
                let delta = *target as i64 - track_base as i64;
                writer.write_checked_u24(delta, EncodeError::U24Overflow)?;
            }
            Operand::Nested(inner) => {
                emit_instruction(writer, inner, track_base, offsets)?;
            }
        }
    }
    Ok(())
}
