//! Integration tests for the assembler front end.

use cheatasm::asm::Assembler;
use cheatasm::ppc::PpcEncoder;
use cheatasm::{assemble, optimize, AsmError, CodeBlock, Unit};

/// Helper to check if output contains expected patterns
fn check_output_contains(output: &str, patterns: &[&str]) {
    for pattern in patterns {
        assert!(
            output.contains(pattern),
            "Output missing expected pattern: '{pattern}'\nFull output:\n{output}"
        );
    }
}

#[test]
fn test_nested_conditionals_inside_repeat() {
    let source = [
        "0x80000100:",
        "!repeat 2",
        "    !u8 equal 1",
        "        .u8 0xFF",
        "    !end",
        "    .u8 0x00",
        "!end",
        ".u16 0xBEEF",
    ];
    let block = assemble(&source).unwrap();
    let output = block.print();

    check_output_contains(
        &output,
        &[
            "multi",
            "  if u8 equal 0x01 @ 0x80000100",
            "    write 0x80000100 [FF]",
            "  write 0x80000101 [00]",
            "  if u8 equal 0x01 @ 0x80000102",
            "    write 0x80000102 [FF]",
            "  write 0x80000103 [00]",
            "write 0x80000104 [BE EF]",
        ],
    );
    assert!(optimize(block).print().lines().all(|line| !line.contains("multi")));
}

#[test]
fn test_top_level_end_stops_assembly() {
    let block = assemble(&[".u8 1", "!end", "frobnicate"]).unwrap();
    assert_eq!(block.len(), 1);
}

#[test]
fn test_unclosed_body_runs_to_end_of_input() {
    let block = assemble(&["!u32 unequal 0", "nop", "nop"]).unwrap();
    let [Unit::Conditional(cond)] = block.units.as_slice() else {
        panic!("expected one conditional, got:\n{block}");
    };
    assert_eq!(cond.body.len(), 2);
}

#[test]
fn test_errors_carry_the_offending_token() {
    let cases: [(&[&str], AsmError); 4] = [
        (&["frobnicate r1, r2"], AsmError::UnsupportedOperation("frobnicate".into())),
        (&[".u32 0x12G"], AsmError::MalformedLiteral("0x12G".into())),
        (&["li q3, 1"], AsmError::MalformedOperand("q3".into())),
        (&["!u16 greaterthan 1.5"], AsmError::MalformedLiteral("1.5".into())),
    ];
    for (source, expected) in cases {
        assert_eq!(assemble(source), Err(expected), "source: {source:?}");
    }
}

#[test]
fn test_errors_inside_bodies_abort_everything() {
    let source = ["nop", "!u8 equal 1", "!repeat 2", "bogus", "!end", "!end"];
    assert_eq!(
        assemble(&source),
        Err(AsmError::UnsupportedOperation("bogus".into()))
    );
}

#[test]
fn test_explicit_encoder() {
    let encoder = PpcEncoder::new();
    let assembler = Assembler::new(&encoder);
    let block = assembler.assemble(&["0x200:", "b 0x100"]).unwrap();
    assert_eq!(
        block,
        CodeBlock::new(vec![cheatasm::ir::WriteData::new(0x200, vec![0x4B, 0xFF, 0xFF, 0x00]).into()])
    );
}
