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

use super::opcode;
use crate::util::varlen_length;

/// A single decoded operand.  The variants mirror the wire grammar,
/// except that 24bit control-flow offsets appear here already
/// resolved to a label name, and prefix opcodes carry their deferred
/// instruction as a nested operand in final position.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    U8(u8),
    S16(i16),
    VarLen(u32),
    LabelRef(String),
    Nested(Box<Instruction>),
}

/// One decoded instruction.  Notes are split out because their
/// mnemonic is determined by the opcode ordinal rather than a table
/// row; extended instructions keep the sub-opcode that followed the
/// `0xF0` escape.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// A note-on: pitch ordinal (the opcode byte itself), velocity,
    /// and a variable-length gate time.
    Note { pitch: u8, velocity: u8, gate: u32 },
    /// An instruction from the base MML table.
    Mml { opcode: u8, operands: Vec<Operand> },
    /// An instruction from the extended table (after `0xF0`).
    MmlEx { opcode: u8, operands: Vec<Operand> },
}

impl Instruction {
    /// The mnemonic this instruction renders as.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Note { pitch, .. } => opcode::pitch_name(*pitch).unwrap_or("?"),
            Instruction::Mml { opcode: op, .. } => {
                opcode::mml_row(*op).map(|r| r.mnemonic).unwrap_or("?")
            }
            Instruction::MmlEx { opcode: op, .. } => {
                opcode::mmlex_row(*op).map(|r| r.mnemonic).unwrap_or("?")
            }
        }
    }

    /// Number of bytes this instruction occupies on the wire,
    /// including nested instructions and using minimal varlen widths.
    pub fn encoded_len(&self) -> usize {
        match self {
            Instruction::Note { gate, .. } => 2 + varlen_length(*gate),
            Instruction::Mml { operands, .. } => 1 + operands_len(operands),
            Instruction::MmlEx { operands, .. } => 2 + operands_len(operands),
        }
    }

    /// Determine whether this instruction terminates its track chunk.
    /// A jump nested under a prefix is conditional and does not.
    pub fn ends_track(&self) -> bool {
        match self {
            Instruction::Mml { opcode: op, .. } => {
                !opcode::is_prefix(*op) && opcode::ends_track(*op)
            }
            _ => false,
        }
    }

    /// The label, if any, this instruction's control-flow operand
    /// targets (nested instructions included).
    pub fn target(&self) -> Option<&str> {
        let operands = match self {
            Instruction::Note { .. } => return None,
            Instruction::Mml { operands, .. } => operands,
            Instruction::MmlEx { operands, .. } => operands,
        };
        for operand in operands {
            match operand {
                Operand::LabelRef(name) => return Some(name.as_str()),
                Operand::Nested(inner) => return inner.target(),
                _ => {}
            }
        }
        None
    }
}

fn operands_len(operands: &[Operand]) -> usize {
    operands
        .iter()
        .map(|op| match op {
            Operand::U8(_) => 1,
            Operand::S16(_) => 2,
            Operand::VarLen(v) => varlen_length(*v),
            Operand::LabelRef(_) => 3,
            Operand::Nested(inner) => inner.encoded_len(),
        })
        .sum()
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::U8(v) => write!(f, "{v}"),
            Operand::S16(v) => write!(f, "{v}"),
            Operand::VarLen(v) => write!(f, "{v}"),
            Operand::LabelRef(name) => write!(f, "{name}"),
            Operand::Nested(inner) => write!(f, "{inner}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Note { velocity, gate, .. } => {
                write!(f, "{} {}, {}", self.mnemonic(), velocity, gate)
            }
            Instruction::Mml { operands, .. } | Instruction::MmlEx { operands, .. } => {
                write!(f, "{}", self.mnemonic())?;
                let mut first = true;
                for operand in operands {
                    match operand {
                        Operand::Nested(inner) => {
                            // A prefix chains onto its inner
                            // instruction with a colon.
                            write!(f, ": {inner}")?;
                        }
                        _ => {
                            write!(f, "{}{operand}", if first { " " } else { ", " })?;
                            first = false;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
