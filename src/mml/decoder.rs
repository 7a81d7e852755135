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
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::instruction::{Instruction, Operand};
use super::opcode;
use super::opcode::OperandKind;
use crate::container::framing::Framing;
use crate::container::labels::LabelTable;
use crate::container::{BseqFile, DecodeError, Label, Track};
use crate::util::ByteReader;

/// Decode a fully-materialised container image into a `BseqFile`.
///
/// Each label is an entry point: decoding walks them in ascending
/// offset order and reads one instruction chunk per distinct offset,
/// stopping at `fin`, `ret` or an unconditional `jump`.  Control-flow
/// operands are resolved against the label namespace; targets without
/// a name get a synthetic label and are decoded as entry points of
/// their own.
pub fn decode(bytes: &[u8]) -> Result<BseqFile, DecodeError> {
    let framing = Framing::parse(bytes)?;
    let table = LabelTable::parse(bytes, &framing)?;
    let payload = &bytes[framing.payload_start()..framing.payload_end()];
    //
    let mut decoder = Decoder::new(payload, framing.payload_start(), &table);
    let chunks = decoder.run()?;
    // Stitch the model together: named labels keep their file order,
    // synthetic labels follow in ascending offset order.
    let mut labels = table.labels.clone();
    for (offset, name) in &decoder.synthetic {
        labels.push(Label { name: name.clone(), data_offset: *offset, synthetic: true });
    }
    let mut tracks = Vec::new();
    for (start, instructions) in chunks {
        let mut names: Vec<String> = table
            .labels
            .iter()
            .filter(|l| l.data_offset == start)
            .map(|l| l.name.clone())
            .collect();
        if let Some(name) = decoder.synthetic.get(&start) {
            names.push(name.clone());
        }
        tracks.push(Track { start, names, instructions });
    }
    Ok(BseqFile { version: framing.version, labels, tracks })
}

/// Working state for one decode run.
struct Decoder<'a> {
    reader: ByteReader<'a>,
    /// Absolute offset of the first payload byte; label offsets are
    /// relative to this.
    base: usize,
    /// The named entry points.
    table: &'a LabelTable,
    /// Entry offsets still to be decoded.
    pending: BTreeSet<u32>,
    /// Synthetic labels minted for unnamed branch targets.
    synthetic: BTreeMap<u32, String>,
}

impl<'a> Decoder<'a> {
    fn new(payload: &'a [u8], base: usize, table: &'a LabelTable) -> Self {
        let mut pending = BTreeSet::new();
        for label in table.sorted_by_offset() {
            pending.insert(label.data_offset);
        }
        Self {
            reader: ByteReader::new_at(payload, base),
            base,
            table,
            pending,
            synthetic: BTreeMap::new(),
        }
    }

    /// Decode every pending entry offset, including synthetic ones
    /// discovered along the way, until none remain.
    fn run(&mut self) -> Result<BTreeMap<u32, Vec<Instruction>>, DecodeError> {
        let mut chunks: BTreeMap<u32, Vec<Instruction>> = BTreeMap::new();
        while let Some(start) = self.pending.iter().next().copied() {
            self.pending.remove(&start);
            if chunks.contains_key(&start) {
                continue;
            }
            let instructions = self.chunk(start)?;
            chunks.insert(start, instructions);
        }
        Ok(chunks)
    }

    /// Decode one chunk from a given entry offset.
    fn chunk(&mut self, start: u32) -> Result<Vec<Instruction>, DecodeError> {
        let mut instructions = Vec::new();
        self.reader.seek(self.base + start as usize);
        loop {
            let insn = self.instruction(start)?;
            let done = insn.ends_track();
            instructions.push(insn);
            if done {
                return Ok(instructions);
            }
        }
    }

    /// Decode one instruction, recursing through prefix chains.  The
    /// track base is the entry offset of the enclosing chunk; 24bit
    /// control-flow operands are relative to it.
    fn instruction(&mut self, track_base: u32) -> Result<Instruction, DecodeError> {
        let at = self.reader.position();
        let byte = self.reader.read_u8(DecodeError::TruncatedInstruction)?;
        if opcode::is_note(byte) {
            if opcode::pitch_name(byte).is_none() {
                // 0x7E / 0x7F are reserved.
                return Err(DecodeError::UnknownOpcode { opcode: byte, offset: at });
            }
            let velocity = self.reader.read_u8(DecodeError::TruncatedInstruction)?;
            let gate = self
                .reader
                .read_varlen(DecodeError::TruncatedInstruction, DecodeError::VarlenTooLong)?;
            return Ok(Instruction::Note { pitch: byte, velocity, gate });
        }
        if byte == opcode::EX_COMMAND {
            let sub_at = self.reader.position();
            let sub = self.reader.read_u8(DecodeError::TruncatedInstruction)?;
            let row = opcode::mmlex_row(sub)
                .ok_or(DecodeError::UnknownOpcode { opcode: sub, offset: sub_at })?;
            let operands = self.operands(row.schema, track_base)?;
            return Ok(Instruction::MmlEx { opcode: sub, operands });
        }
        let row = opcode::mml_row(byte)
            .ok_or(DecodeError::UnknownOpcode { opcode: byte, offset: at })?;
        let operands = self.operands(row.schema, track_base)?;
        Ok(Instruction::Mml { opcode: byte, operands })
    }

    /// Decode the operand list for a grammar row.
    fn operands(
        &mut self,
        schema: &'static [OperandKind],
        track_base: u32,
    ) -> Result<Vec<Operand>, DecodeError> {
        let mut operands = Vec::with_capacity(schema.len());
        for kind in schema {
            let operand = match kind {
                OperandKind::U8 => {
                    Operand::U8(self.reader.read_u8(DecodeError::TruncatedInstruction)?)
                }
                OperandKind::S16 => {
                    Operand::S16(self.reader.read_i16(DecodeError::TruncatedInstruction)?)
                }
                OperandKind::VarLen => Operand::VarLen(self.reader.read_varlen(
                    DecodeError::TruncatedInstruction,
                    DecodeError::VarlenTooLong,
                )?),
                OperandKind::Addr => {
                    let delta = self.reader.read_u24(DecodeError::TruncatedInstruction)?;
                    Operand::LabelRef(self.resolve(track_base + delta))
                }
                OperandKind::Nested => {
                    Operand::Nested(Box::new(self.instruction(track_base)?))
                }
            };
            operands.push(operand);
        }
        Ok(operands)
    }

    /// Resolve an absolute payload offset to a label name, minting a
    /// synthetic label (and scheduling its chunk) when the namespace
    /// has no entry for it.  The first label in file order wins an
    /// aliased offset.
    fn resolve(&mut self, target: u32) -> String {
        if let Some(label) = self.table.by_offset(target) {
            return label.name.clone();
        }
        if let Some(name) = self.synthetic.get(&target) {
            return name.clone();
        }
        let label = Label::synthetic(target);
        debug!("synthesised label {} for unnamed branch target", label.name);
        self.synthetic.insert(target, label.name.clone());
        self.pending.insert(target);
        label.name
    }
}
