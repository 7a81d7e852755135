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
use std::collections::HashMap;
use std::fmt::Write;

use crate::container::BseqFile;
use crate::mml::instruction::Instruction;
use crate::mml::opcode;

/// Render the canonical listing: labels at column zero, one
/// instruction per line indented four spaces, operands in decimal.
/// Top-level `jump`/`call` lines are annotated with their branch
/// direction and distance from the track base; the annotation is a
/// comment and is ignored when the listing is read back.
pub fn format(file: &BseqFile) -> String {
    let offsets: HashMap<&str, u32> = file
        .labels
        .iter()
        .map(|l| (l.name.as_str(), l.data_offset))
        .collect();
    let mut out = String::new();
    for track in &file.tracks {
        for name in &track.names {
            writeln!(out, "{name}:").unwrap();
        }
        let mut at = track.start;
        for insn in &track.instructions {
            write!(out, "    {insn}").unwrap();
            if let Some(annotation) = branch_annotation(insn, track.start, at, &offsets) {
                out.push_str(&annotation);
            }
            out.push('\n');
            at += insn.encoded_len() as u32;
        }
    }
    out
}

/// The direction comment for a top-level `jump` or `call`.  The
/// distance is measured from the track base (which is what the
/// encoded 24bit field carries); the direction compares the target
/// against the instruction's own offset.
fn branch_annotation(
    insn: &Instruction,
    track_base: u32,
    insn_offset: u32,
    offsets: &HashMap<&str, u32>,
) -> Option<String> {
    let op = match insn {
        Instruction::Mml { opcode: op, .. } => *op,
        _ => return None,
    };
    if op != opcode::JUMP && op != opcode::CALL {
        return None;
    }
    let target = *offsets.get(insn.target()?)?;
    let delta = target as i64 - track_base as i64;
    let direction = if target <= insn_offset { "backwards" } else { "forward" };
    Some(format!(
        " ; {direction} jump by {delta} bytes relative to the start offset of this sequence"
    ))
}
