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

//! The MML opcode grammar.  One table per opcode set (the base MML
//! set, and the MMLEX set reached through `0xF0`) maps each opcode
//! byte to its mnemonic and operand schema.  Both decode and encode
//! are driven off these tables; the mnemonic lookup is derived by
//! iteration so the two directions cannot drift apart.

// Control flow
pub const OPENTRACK: u8 = 0x88;
pub const JUMP: u8 = 0x89;
pub const CALL: u8 = 0x8A;
// Prefixes (argument rewriting)
pub const RANDOM: u8 = 0xA0;
pub const VARIABLE: u8 = 0xA1;
pub const IF: u8 = 0xA2;
pub const TIME: u8 = 0xA3;
pub const TIME_RANDOM: u8 = 0xA4;
pub const TIME_VARIABLE: u8 = 0xA5;
// Extended set escape
pub const EX_COMMAND: u8 = 0xF0;
// Terminators
pub const RET: u8 = 0xFD;
pub const FIN: u8 = 0xFF;

/// The kinds of operand an opcode row may carry, in the order they
/// appear on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperandKind {
    /// One unsigned byte.
    U8,
    /// Two bytes, signed.
    S16,
    /// A variable-length unsigned integer (one to four bytes).
    VarLen,
    /// A 24bit offset relative to the current track base, resolved to
    /// a label during decoding.
    Addr,
    /// A complete inner instruction; only prefix opcodes carry one,
    /// and always in final position.
    Nested,
}

/// One row of an opcode table.
#[derive(Debug)]
pub struct OpcodeInfo {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub schema: &'static [OperandKind],
}

use OperandKind::*;

/// The base MML opcode set.  Note opcodes (high bit clear) are not
/// listed here: their pitch-indexed mnemonics live in `PITCH_NAMES`.
pub const MML_TABLE: &[OpcodeInfo] = &[
    OpcodeInfo { opcode: 0x80, mnemonic: "wait", schema: &[VarLen] },
    OpcodeInfo { opcode: 0x81, mnemonic: "prg", schema: &[VarLen] },
    OpcodeInfo { opcode: 0x88, mnemonic: "opentrack", schema: &[U8, Addr] },
    OpcodeInfo { opcode: 0x89, mnemonic: "jump", schema: &[Addr] },
    OpcodeInfo { opcode: 0x8A, mnemonic: "call", schema: &[Addr] },
    OpcodeInfo { opcode: 0xA0, mnemonic: "_r", schema: &[S16, S16, Nested] },
    OpcodeInfo { opcode: 0xA1, mnemonic: "_v", schema: &[U8, Nested] },
    OpcodeInfo { opcode: 0xA2, mnemonic: "_if", schema: &[Nested] },
    OpcodeInfo { opcode: 0xA3, mnemonic: "_t", schema: &[S16, Nested] },
    OpcodeInfo { opcode: 0xA4, mnemonic: "_tr", schema: &[S16, Nested] },
    OpcodeInfo { opcode: 0xA5, mnemonic: "_tv", schema: &[S16, Nested] },
    OpcodeInfo { opcode: 0xB0, mnemonic: "timebase", schema: &[U8] },
    OpcodeInfo { opcode: 0xB1, mnemonic: "env_hold", schema: &[U8] },
    OpcodeInfo { opcode: 0xB2, mnemonic: "monophonic", schema: &[U8] },
    OpcodeInfo { opcode: 0xB3, mnemonic: "velocity_range", schema: &[U8] },
    OpcodeInfo { opcode: 0xB4, mnemonic: "biquad_type", schema: &[U8] },
    OpcodeInfo { opcode: 0xB5, mnemonic: "biquad_value", schema: &[U8] },
    OpcodeInfo { opcode: 0xB6, mnemonic: "bank_select", schema: &[U8] },
    OpcodeInfo { opcode: 0xC0, mnemonic: "pan", schema: &[U8] },
    OpcodeInfo { opcode: 0xC1, mnemonic: "volume", schema: &[U8] },
    OpcodeInfo { opcode: 0xC2, mnemonic: "main_volume", schema: &[U8] },
    OpcodeInfo { opcode: 0xC3, mnemonic: "transpose", schema: &[U8] },
    OpcodeInfo { opcode: 0xC4, mnemonic: "pitch_bend", schema: &[U8] },
    OpcodeInfo { opcode: 0xC5, mnemonic: "bend_range", schema: &[U8] },
    OpcodeInfo { opcode: 0xC6, mnemonic: "prio", schema: &[U8] },
    OpcodeInfo { opcode: 0xC7, mnemonic: "note_wait", schema: &[U8] },
    OpcodeInfo { opcode: 0xC8, mnemonic: "tie", schema: &[U8] },
    OpcodeInfo { opcode: 0xC9, mnemonic: "porta", schema: &[U8] },
    OpcodeInfo { opcode: 0xCA, mnemonic: "mod_depth", schema: &[U8] },
    OpcodeInfo { opcode: 0xCB, mnemonic: "mod_speed", schema: &[U8] },
    OpcodeInfo { opcode: 0xCC, mnemonic: "mod_type", schema: &[U8] },
    OpcodeInfo { opcode: 0xCD, mnemonic: "mod_range", schema: &[U8] },
    OpcodeInfo { opcode: 0xCE, mnemonic: "porta_sw", schema: &[U8] },
    OpcodeInfo { opcode: 0xCF, mnemonic: "porta_time", schema: &[U8] },
    OpcodeInfo { opcode: 0xD0, mnemonic: "attack", schema: &[U8] },
    OpcodeInfo { opcode: 0xD1, mnemonic: "decay", schema: &[U8] },
    OpcodeInfo { opcode: 0xD2, mnemonic: "sustain", schema: &[U8] },
    OpcodeInfo { opcode: 0xD3, mnemonic: "release", schema: &[U8] },
    OpcodeInfo { opcode: 0xD4, mnemonic: "loop_start", schema: &[U8] },
    OpcodeInfo { opcode: 0xD5, mnemonic: "volume2", schema: &[U8] },
    OpcodeInfo { opcode: 0xD6, mnemonic: "printvar", schema: &[U8] },
    OpcodeInfo { opcode: 0xD7, mnemonic: "surround_pan", schema: &[U8] },
    OpcodeInfo { opcode: 0xD8, mnemonic: "lpf_cutoff", schema: &[U8] },
    OpcodeInfo { opcode: 0xD9, mnemonic: "fxsend_a", schema: &[U8] },
    OpcodeInfo { opcode: 0xDA, mnemonic: "fxsend_b", schema: &[U8] },
    OpcodeInfo { opcode: 0xDB, mnemonic: "mainsend", schema: &[U8] },
    OpcodeInfo { opcode: 0xDC, mnemonic: "init_pan", schema: &[U8] },
    OpcodeInfo { opcode: 0xDD, mnemonic: "mute", schema: &[U8] },
    OpcodeInfo { opcode: 0xDE, mnemonic: "fxsend_c", schema: &[U8] },
    OpcodeInfo { opcode: 0xDF, mnemonic: "damper", schema: &[U8] },
    OpcodeInfo { opcode: 0xE0, mnemonic: "mod_delay", schema: &[S16] },
    OpcodeInfo { opcode: 0xE1, mnemonic: "tempo", schema: &[S16] },
    OpcodeInfo { opcode: 0xE3, mnemonic: "sweep_pitch", schema: &[S16] },
    OpcodeInfo { opcode: 0xFB, mnemonic: "env_reset", schema: &[] },
    OpcodeInfo { opcode: 0xFC, mnemonic: "loop_end", schema: &[] },
    OpcodeInfo { opcode: 0xFD, mnemonic: "ret", schema: &[] },
    OpcodeInfo { opcode: 0xFE, mnemonic: "alloctrack", schema: &[S16] },
    OpcodeInfo { opcode: 0xFF, mnemonic: "fin", schema: &[] },
];

/// The extended opcode set, entered via `0xF0`.  Variable arithmetic,
/// variable comparison, and the user-procedure hook.
pub const MMLEX_TABLE: &[OpcodeInfo] = &[
    OpcodeInfo { opcode: 0x80, mnemonic: "setvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x81, mnemonic: "addvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x82, mnemonic: "subvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x83, mnemonic: "mulvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x84, mnemonic: "divvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x85, mnemonic: "shiftvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x86, mnemonic: "randvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x87, mnemonic: "andvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x88, mnemonic: "orvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x89, mnemonic: "xorvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x8A, mnemonic: "notvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x8B, mnemonic: "modvar", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x90, mnemonic: "cmp_eq", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x91, mnemonic: "cmp_ge", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x92, mnemonic: "cmp_gt", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x93, mnemonic: "cmp_le", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x94, mnemonic: "cmp_lt", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0x95, mnemonic: "cmp_ne", schema: &[U8, S16] },
    OpcodeInfo { opcode: 0xE0, mnemonic: "userproc", schema: &[S16] },
];

/// Note mnemonics indexed by opcode.  Pitch names run chromatically
/// from C with "n" marking naturals and "s" sharps; the octave digit
/// follows, with "m1" for the lowest (minus one) octave.  Opcodes
/// `0x7E` and `0x7F` are reserved and have no name.
pub const PITCH_NAMES: [&str; 126] = [
    "cnm1", "csm1", "dnm1", "dsm1", "enm1", "fnm1", "fsm1", "gnm1", "gsm1",
    "anm1", "asm1", "bnm1", "cn0", "cs0", "dn0", "ds0", "en0", "fn0",
    "fs0", "gn0", "gs0", "an0", "as0", "bn0", "cn1", "cs1", "dn1",
    "ds1", "en1", "fn1", "fs1", "gn1", "gs1", "an1", "as1", "bn1",
    "cn2", "cs2", "dn2", "ds2", "en2", "fn2", "fs2", "gn2", "gs2",
    "an2", "as2", "bn2", "cn3", "cs3", "dn3", "ds3", "en3", "fn3",
    "fs3", "gn3", "gs3", "an3", "as3", "bn3", "cn4", "cs4", "dn4",
    "ds4", "en4", "fn4", "fs4", "gn4", "gs4", "an4", "as4", "bn4",
    "cn5", "cs5", "dn5", "ds5", "en5", "fn5", "fs5", "gn5", "gs5",
    "an5", "as5", "bn5", "cn6", "cs6", "dn6", "ds6", "en6", "fn6",
    "fs6", "gn6", "gs6", "an6", "as6", "bn6", "cn7", "cs7", "dn7",
    "ds7", "en7", "fn7", "fs7", "gn7", "gs7", "an7", "as7", "bn7",
    "cn8", "cs8", "dn8", "ds8", "en8", "fn8", "fs8", "gn8", "gs8",
    "an8", "as8", "bn8", "cn9", "cs9", "dn9", "ds9", "en9", "fn9",
];

/// Determine whether a byte encodes a note (high bit clear).
pub fn is_note(opcode: u8) -> bool {
    opcode & 0x80 == 0
}

/// Determine whether an opcode terminates the current track chunk.
/// Only `fin`, `ret` and an unconditional `jump` do; `call` falls
/// through to the next instruction.
pub fn ends_track(opcode: u8) -> bool {
    matches!(opcode, JUMP | RET | FIN)
}

/// Determine whether an opcode is a prefix (i.e. defers to a nested
/// inner instruction).
pub fn is_prefix(opcode: u8) -> bool {
    (RANDOM..=TIME_VARIABLE).contains(&opcode)
}

/// Look up the grammar row for a base-set opcode.
pub fn mml_row(opcode: u8) -> Option<&'static OpcodeInfo> {
    MML_TABLE.iter().find(|row| row.opcode == opcode)
}

/// Look up the grammar row for an extended-set opcode.
pub fn mmlex_row(opcode: u8) -> Option<&'static OpcodeInfo> {
    MMLEX_TABLE.iter().find(|row| row.opcode == opcode)
}

/// Reverse lookup, derived by iteration over the same table.
pub fn mml_row_by_mnemonic(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    MML_TABLE.iter().find(|row| row.mnemonic == mnemonic)
}

/// Reverse lookup into the extended set.
pub fn mmlex_row_by_mnemonic(mnemonic: &str) -> Option<&'static OpcodeInfo> {
    MMLEX_TABLE.iter().find(|row| row.mnemonic == mnemonic)
}

/// The mnemonic for a note opcode, or `None` for the two reserved
/// bytes.
pub fn pitch_name(opcode: u8) -> Option<&'static str> {
    PITCH_NAMES.get(opcode as usize).copied()
}

/// The note opcode for a pitch mnemonic.
pub fn pitch_opcode(mnemonic: &str) -> Option<u8> {
    PITCH_NAMES.iter().position(|n| *n == mnemonic).map(|i| i as u8)
}
