use brseq::util::FromHexString;
use brseq::{
    decode_binary, encode_binary, format_text, parse_text, EncodeError, EncodeOptions,
    Instruction, Operand,
};

// Scenario: a forward jump over a dead byte.  The gap byte at offset
// 4 is reachable from no label and is simply never decoded; the
// branch target gets a synthetic label which stays out of the LABL
// section.
static JUMP_OVER_GAP: &str = "0x52534551feff01040000004e0020000200000020000000120000003200\
00001844415441000000120000000c89000005ffff4c41424c000000180000000100000008000000000000\
00046d61696e";

#[test]
fn test_synthetic_label_over_gap() {
    let bytes = JUMP_OVER_GAP.from_hex_string().unwrap();
    let file = decode_binary(&bytes).unwrap();
    assert_eq!(
        format_text(&file),
        "main:\n    \
         jump _symb_0x5 ; forward jump by 5 bytes relative to the start offset of this sequence\n\
         _symb_0x5:\n    \
         fin\n"
    );
    let labels: Vec<(&str, u32, bool)> = file
        .labels
        .iter()
        .map(|l| (l.name.as_str(), l.data_offset, l.synthetic))
        .collect();
    assert_eq!(labels, vec![("main", 0, false), ("_symb_0x5", 5, true)]);
    assert_eq!(file.track("_symb_0x5").unwrap().instructions.len(), 1);
    // Re-encoding packs the tracks without the gap, so the image
    // shrinks by one byte, the jump lands one byte earlier, and the
    // freshly decoded target is named after its new offset.
    let reencoded = encode_binary(&file).unwrap();
    let redecoded = decode_binary(&reencoded).unwrap();
    assert_eq!(redecoded.label("_symb_0x4").unwrap().data_offset, 4);
    assert!(redecoded.label("_symb_0x5").is_none());
}

#[test]
fn test_synthetic_labels_written_on_request() {
    let bytes = JUMP_OVER_GAP.from_hex_string().unwrap();
    let file = decode_binary(&bytes).unwrap();
    let options = EncodeOptions { write_synthetic_labels: true };
    let reencoded = file.to_bytes_with(&options).unwrap();
    // The branch target is now a named entry in the LABL section.
    let redecoded = decode_binary(&reencoded).unwrap();
    let symb = redecoded.label("_symb_0x5").unwrap();
    assert!(!symb.synthetic);
    assert_eq!(symb.data_offset, 4);
}

#[test]
fn test_wait_note_structure() {
    let file = parse_text("main:\n    wait 96\n    cn4 127, 96\n    fin\n").unwrap();
    assert_eq!(file.tracks.len(), 1);
    assert_eq!(
        file.tracks[0].instructions,
        vec![
            Instruction::Mml { opcode: 0x80, operands: vec![Operand::VarLen(96)] },
            Instruction::Note { pitch: 0x3C, velocity: 127, gate: 96 },
            Instruction::Mml { opcode: 0xFF, operands: vec![] },
        ]
    );
}

#[test]
fn test_prefix_chain_structure() {
    let file = parse_text("main:\n    _tr 16: _r 1, 10: volume 100\n    fin\n").unwrap();
    let volume = Instruction::Mml { opcode: 0xC1, operands: vec![Operand::U8(100)] };
    let random = Instruction::Mml {
        opcode: 0xA0,
        operands: vec![
            Operand::S16(1),
            Operand::S16(10),
            Operand::Nested(Box::new(volume)),
        ],
    };
    let chain = Instruction::Mml {
        opcode: 0xA4,
        operands: vec![Operand::S16(16), Operand::Nested(Box::new(random))],
    };
    assert_eq!(file.tracks[0].instructions[0], chain);
}

#[test]
fn test_extended_structure() {
    let file = parse_text("main:\n    setvar 0, 5\n    fin\n").unwrap();
    assert_eq!(
        file.tracks[0].instructions[0],
        Instruction::MmlEx { opcode: 0x80, operands: vec![Operand::U8(0), Operand::S16(5)] }
    );
    // Extended instructions carry the 0xF0 escape on the wire.
    let bytes = encode_binary(&file).unwrap();
    assert_eq!(&bytes[0x2C..0x31], &[0xF0, 0x80, 0x00, 0x00, 0x05]);
}

#[test]
fn test_comments_and_whitespace_ignored() {
    let sparse = "main:\n    wait 96\n    fin\n";
    let noisy = "\n; a comment line\nmain:   ; trailing\n\n  wait   96\n\tfin ; done\n";
    assert_eq!(parse_text(noisy).unwrap(), parse_text(sparse).unwrap());
}

#[test]
fn test_conditional_jump_does_not_terminate() {
    // A jump under _if is conditional; the track keeps going.
    let text = "main:\n    _if: jump main\n    fin\n";
    let file = parse_text(&text).unwrap();
    let bytes = encode_binary(&file).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert_eq!(decoded.tracks[0].instructions.len(), 2);
}

// ===================================================================
// Parse errors
// ===================================================================

#[test]
fn test_unknown_mnemonic() {
    let e = parse_text("main:\n    warble 1\n").unwrap_err();
    assert_eq!((e.line, e.column), (2, 5));
    assert!(e.message.contains("warble"));
}

#[test]
fn test_instruction_before_label() {
    let e = parse_text("    wait 96\nmain:\n    fin\n").unwrap_err();
    assert_eq!(e.line, 1);
}

#[test]
fn test_velocity_out_of_range() {
    let e = parse_text("main:\n    cn4 300, 96\n    fin\n").unwrap_err();
    assert_eq!(e.line, 2);
    assert!(e.message.contains("velocity"));
}

#[test]
fn test_branch_operand_must_be_label() {
    let e = parse_text("main:\n    jump 12\n").unwrap_err();
    assert_eq!(e.line, 2);
    assert!(e.message.contains("label"));
}

#[test]
fn test_trailing_input() {
    let e = parse_text("main:\n    fin fin\n").unwrap_err();
    assert_eq!(e.line, 2);
}

// ===================================================================
// Encode errors
// ===================================================================

#[test]
fn test_undefined_label() {
    let file = parse_text("main:\n    jump nowhere\n").unwrap();
    assert!(matches!(
        encode_binary(&file),
        Err(EncodeError::UndefinedLabel(name)) if name == "nowhere"
    ));
}

#[test]
fn test_duplicate_label() {
    let file = parse_text("main:\n    fin\nmain:\n    fin\n").unwrap();
    assert!(matches!(
        encode_binary(&file),
        Err(EncodeError::DuplicateLabel(name)) if name == "main"
    ));
}

#[test]
fn test_backward_reference_overflows() {
    // A branch target before the track base cannot be encoded as an
    // unsigned delta.
    let file = parse_text("a:\n    fin\nb:\n    jump a\n").unwrap();
    assert!(matches!(
        encode_binary(&file),
        Err(EncodeError::U24Overflow(-1))
    ));
}
