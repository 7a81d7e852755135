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
use super::lexer::{Lexer, Token};
use super::ParseError;
use crate::container::{BseqFile, Label, Track, DEFAULT_VERSION};
use crate::mml::encoder;
use crate::mml::instruction::{Instruction, Operand};
use crate::mml::opcode;
use crate::mml::opcode::OperandKind;

/// Parse a textual listing into a `BseqFile`.  Labels may be
/// referenced before they are declared; resolution happens when the
/// file is encoded.  The returned file carries final payload offsets,
/// computed with the same layout pass the encoder uses.
pub fn parse(input: &str) -> Result<BseqFile, ParseError> {
    let mut tracks: Vec<Track> = Vec::new();
    // Declaration order, split so synthetic names trail named ones.
    let mut named: Vec<Label> = Vec::new();
    let mut synthetic: Vec<Label> = Vec::new();
    //
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let mut lexer = Lexer::new(raw, line);
        let first_column = lexer.column();
        let first = match lexer.next()? {
            Token::Eol => continue,
            Token::Identifier(id) => id,
            _ => return Err(lexer.error("expected mnemonic or label")),
        };
        // An identifier followed by a bare colon declares a label;
        // prefix mnemonics also sit before a colon, but never alone
        // on a line.
        if lexer.lookahead()? == Token::Colon && !is_prefix_mnemonic(first) {
            lexer.next()?;
            if lexer.next()? != Token::Eol {
                return Err(lexer.error("trailing input after label"));
            }
            let label = Label {
                name: first.to_string(),
                data_offset: 0,
                synthetic: Label::is_synthetic_name(first),
            };
            if label.synthetic {
                synthetic.push(label);
            } else {
                named.push(label);
            }
            // Consecutive declarations alias one track.
            match tracks.last_mut() {
                Some(track) if track.instructions.is_empty() => {
                    track.names.push(first.to_string());
                }
                _ => tracks.push(Track {
                    start: 0,
                    names: vec![first.to_string()],
                    instructions: Vec::new(),
                }),
            }
            continue;
        }
        let insn = instruction(&mut lexer, first, first_column)?;
        if lexer.next()? != Token::Eol {
            return Err(lexer.error("trailing input after instruction"));
        }
        match tracks.last_mut() {
            Some(track) => track.instructions.push(insn),
            None => {
                return Err(ParseError::new(line, 1, "instruction before first label"));
            }
        }
    }
    // Assign final offsets via the encoder's sizing pass.
    let mut labels = named;
    labels.append(&mut synthetic);
    let mut file = BseqFile { version: DEFAULT_VERSION, labels, tracks };
    let layout = encoder::layout(&file);
    for (i, track) in file.tracks.iter_mut().enumerate() {
        track.start = layout.starts[i];
    }
    for label in &mut file.labels {
        if let Some(offset) = layout.offsets.get(&label.name) {
            label.data_offset = *offset;
        }
    }
    // Keep synthetic labels in ascending offset order, as the
    // decoder produces them.
    let split = file.labels.iter().filter(|l| !l.synthetic).count();
    file.labels[split..].sort_by_key(|l| l.data_offset);
    Ok(file)
}

/// True for the mnemonics which chain onto an inner instruction.
fn is_prefix_mnemonic(name: &str) -> bool {
    matches!(
        opcode::mml_row_by_mnemonic(name),
        Some(row) if opcode::is_prefix(row.opcode)
    )
}

/// Parse one instruction whose mnemonic has already been consumed
/// (at the given column, for diagnostics).
fn instruction<'a>(
    lexer: &mut Lexer<'a>,
    mnemonic: &'a str,
    column: usize,
) -> Result<Instruction, ParseError> {
    if let Some(pitch) = opcode::pitch_opcode(mnemonic) {
        // A note line: velocity, then gate.
        let velocity = integer(lexer, 0, 255, "velocity")? as u8;
        expect(lexer, Token::Comma, "expected \",\" before gate")?;
        let gate = integer(lexer, 0, 0x0FFF_FFFF, "gate")? as u32;
        return Ok(Instruction::Note { pitch, velocity, gate });
    }
    if let Some(row) = opcode::mml_row_by_mnemonic(mnemonic) {
        let operands = operands(lexer, row.schema)?;
        return Ok(Instruction::Mml { opcode: row.opcode, operands });
    }
    if let Some(row) = opcode::mmlex_row_by_mnemonic(mnemonic) {
        let operands = operands(lexer, row.schema)?;
        return Ok(Instruction::MmlEx { opcode: row.opcode, operands });
    }
    Err(lexer.error_at(column, format!("unknown mnemonic \"{mnemonic}\"")))
}

/// Parse an operand list against a grammar row.  Plain operands are
/// comma separated; a nested instruction is introduced by a colon
/// and always sits last.
fn operands<'a>(
    lexer: &mut Lexer<'a>,
    schema: &'static [OperandKind],
) -> Result<Vec<Operand>, ParseError> {
    let mut parsed = Vec::with_capacity(schema.len());
    let mut separate = false;
    for kind in schema {
        let operand = match kind {
            OperandKind::Nested => {
                expect(lexer, Token::Colon, "expected \":\" before chained instruction")?;
                let column = lexer.column();
                let mnemonic = match lexer.next()? {
                    Token::Identifier(id) => id,
                    _ => return Err(lexer.error("expected chained instruction")),
                };
                Operand::Nested(Box::new(instruction(lexer, mnemonic, column)?))
            }
            plain => {
                if separate {
                    expect(lexer, Token::Comma, "expected \",\"")?;
                }
                separate = true;
                match plain {
                    OperandKind::U8 => Operand::U8(integer(lexer, 0, 255, "operand")? as u8),
                    OperandKind::S16 => {
                        Operand::S16(integer(lexer, i16::MIN as i64, i16::MAX as i64, "operand")?
                            as i16)
                    }
                    OperandKind::VarLen => {
                        Operand::VarLen(integer(lexer, 0, 0x0FFF_FFFF, "operand")? as u32)
                    }
                    OperandKind::Addr => match lexer.next()? {
                        Token::Identifier(id) => Operand::LabelRef(id.to_string()),
                        _ => return Err(lexer.error("expected label")),
                    },
                    OperandKind::Nested => unreachable!(),
                }
            }
        };
        parsed.push(operand);
    }
    Ok(parsed)
}

/// Parse a decimal integer and range check it.
fn integer(lexer: &mut Lexer, min: i64, max: i64, what: &str) -> Result<i64, ParseError> {
    let error = |l: &Lexer| l.error(format!("expected {what} in {min}..={max}"));
    match lexer.lookahead()? {
        Token::Number(text) => {
            let value: i64 = text.parse().map_err(|_| error(lexer))?;
            if !(min..=max).contains(&value) {
                return Err(error(lexer));
            }
            lexer.next()?;
            Ok(value)
        }
        _ => Err(error(lexer)),
    }
}

fn expect(lexer: &mut Lexer, token: Token, message: &str) -> Result<(), ParseError> {
    if lexer.lookahead()? == token {
        lexer.next()?;
        Ok(())
    } else {
        Err(lexer.error(message))
    }
}
