// This module provides the PowerPC instruction encoding table the assembler consumes. It
// maps a mnemonic plus its literal operand tokens to the 32-bit big-endian instruction
// word. The table is a static match from mnemonic to an instruction Form describing the
// operand layout (D-form arithmetic, logical immediates, loads and stores with a
// displacement, X/XO-form register operations, rotate masks, special purpose register
// moves, and relative branches). Operand tokens arrive already split on whitespace,
// commas and parentheses, so "lwz r3, 8(r4)" reaches the encoder as ["r3", "8", "r4"].
// Register numbers are masked to five bits without range checks; the encoder only
// rejects tokens that are not registers at all. Branch displacements are computed from
// the aligned instruction address handed in by the parser.

//! PowerPC instruction encoding.
//!
//! [`PpcEncoder`] is a pure function from `(mnemonic, operands, address)`
//! to a 4-byte big-endian word. It holds no state.

use crate::asm::literal::parse_int;
use crate::core::error::{AsmError, AsmResult};

/// Encodes one instruction line into a 4-byte big-endian word.
///
/// `address` is the instruction pointer after alignment; only PC-relative
/// forms look at it.
pub trait InstructionEncoder {
    fn encode(&self, mnemonic: &str, operands: &[&str], address: i32) -> AsmResult<[u8; 4]>;
}

/// Operand layout of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// No operands, fixed word.
    Fixed(u32),
    /// `rD, rA, SIMM`
    DArith { opcd: u32 },
    /// `rD, SIMM` with rA = 0 (li, lis).
    LoadImm { opcd: u32 },
    /// `rD, rA, SIMM` encoded as addi with the negated immediate.
    SubImm,
    /// `rA, rS, UIMM`
    DLogical { opcd: u32 },
    /// `[crfD,] rA, IMM`
    CmpImm { opcd: u32 },
    /// `[crfD,] rA, rB`
    Cmp { xo: u32 },
    /// `rD, d(rA)`
    Mem { opcd: u32, float: bool },
    /// `rD, rA, rB`
    XoArith { xo: u32 },
    /// `rD, rA, rB` encoded as subf rD, rB, rA.
    Sub,
    /// `rD, rA`
    Neg,
    /// `rA, rS, rB`
    XLogical { xo: u32 },
    /// `rA, rS` encoded as or rA, rS, rS.
    Mr,
    /// `rA, rS, SH, MB, ME`
    Rlwinm,
    /// `rA, rS, n`
    Slwi,
    /// `rA, rS, n`
    Srwi,
    /// `rD`
    MoveFromSpr { spr: u32 },
    /// `rS`
    MoveToSpr { spr: u32 },
    /// `target`
    Branch { link: bool },
    /// `[crN,] target`
    CondBranch { bo: u32, bit: u32 },
}

const BO_TRUE: u32 = 12;
const BO_FALSE: u32 = 4;

const CR_LT: u32 = 0;
const CR_GT: u32 = 1;
const CR_EQ: u32 = 2;

const SPR_LR: u32 = 8;
const SPR_CTR: u32 = 9;

fn lookup(mnemonic: &str) -> Option<Form> {
    let form = match mnemonic {
        "nop" => Form::Fixed(0x6000_0000),
        "blr" => Form::Fixed(0x4E80_0020),
        "blrl" => Form::Fixed(0x4E80_0021),
        "bctr" => Form::Fixed(0x4E80_0420),
        "bctrl" => Form::Fixed(0x4E80_0421),

        "addi" => Form::DArith { opcd: 14 },
        "addis" => Form::DArith { opcd: 15 },
        "mulli" => Form::DArith { opcd: 7 },
        "li" => Form::LoadImm { opcd: 14 },
        "lis" => Form::LoadImm { opcd: 15 },
        "subi" => Form::SubImm,

        "ori" => Form::DLogical { opcd: 24 },
        "oris" => Form::DLogical { opcd: 25 },
        "xori" => Form::DLogical { opcd: 26 },
        "xoris" => Form::DLogical { opcd: 27 },
        "andi." => Form::DLogical { opcd: 28 },
        "andis." => Form::DLogical { opcd: 29 },

        "cmpwi" => Form::CmpImm { opcd: 11 },
        "cmplwi" => Form::CmpImm { opcd: 10 },
        "cmpw" => Form::Cmp { xo: 0 },
        "cmplw" => Form::Cmp { xo: 32 },

        "lwz" => Form::Mem { opcd: 32, float: false },
        "lwzu" => Form::Mem { opcd: 33, float: false },
        "lbz" => Form::Mem { opcd: 34, float: false },
        "lbzu" => Form::Mem { opcd: 35, float: false },
        "stw" => Form::Mem { opcd: 36, float: false },
        "stwu" => Form::Mem { opcd: 37, float: false },
        "stb" => Form::Mem { opcd: 38, float: false },
        "stbu" => Form::Mem { opcd: 39, float: false },
        "lhz" => Form::Mem { opcd: 40, float: false },
        "lha" => Form::Mem { opcd: 42, float: false },
        "sth" => Form::Mem { opcd: 44, float: false },
        "lmw" => Form::Mem { opcd: 46, float: false },
        "stmw" => Form::Mem { opcd: 47, float: false },
        "lfs" => Form::Mem { opcd: 48, float: true },
        "lfd" => Form::Mem { opcd: 50, float: true },
        "stfs" => Form::Mem { opcd: 52, float: true },
        "stfd" => Form::Mem { opcd: 54, float: true },

        "add" => Form::XoArith { xo: 266 },
        "subf" => Form::XoArith { xo: 40 },
        "mullw" => Form::XoArith { xo: 235 },
        "divw" => Form::XoArith { xo: 491 },
        "divwu" => Form::XoArith { xo: 459 },
        "sub" => Form::Sub,
        "neg" => Form::Neg,

        "and" => Form::XLogical { xo: 28 },
        "or" => Form::XLogical { xo: 444 },
        "xor" => Form::XLogical { xo: 316 },
        "nor" => Form::XLogical { xo: 124 },
        "slw" => Form::XLogical { xo: 24 },
        "srw" => Form::XLogical { xo: 536 },
        "sraw" => Form::XLogical { xo: 792 },
        "mr" => Form::Mr,

        "rlwinm" => Form::Rlwinm,
        "slwi" => Form::Slwi,
        "srwi" => Form::Srwi,

        "mflr" => Form::MoveFromSpr { spr: SPR_LR },
        "mfctr" => Form::MoveFromSpr { spr: SPR_CTR },
        "mtlr" => Form::MoveToSpr { spr: SPR_LR },
        "mtctr" => Form::MoveToSpr { spr: SPR_CTR },

        "b" => Form::Branch { link: false },
        "bl" => Form::Branch { link: true },
        "beq" => Form::CondBranch { bo: BO_TRUE, bit: CR_EQ },
        "bne" => Form::CondBranch { bo: BO_FALSE, bit: CR_EQ },
        "blt" => Form::CondBranch { bo: BO_TRUE, bit: CR_LT },
        "bge" => Form::CondBranch { bo: BO_FALSE, bit: CR_LT },
        "bgt" => Form::CondBranch { bo: BO_TRUE, bit: CR_GT },
        "ble" => Form::CondBranch { bo: BO_FALSE, bit: CR_GT },

        _ => return None,
    };
    Some(form)
}

/// The PowerPC (Gekko/Broadway user mode) encoding table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpcEncoder;

impl PpcEncoder {
    pub fn new() -> Self {
        Self
    }

    fn encode_word(&self, mnemonic: &str, form: Form, ops: &[&str], address: i32) -> AsmResult<u32> {
        let word = match form {
            Form::Fixed(word) => {
                expect_operands(mnemonic, ops, 0)?;
                word
            }
            Form::DArith { opcd } => {
                expect_operands(mnemonic, ops, 3)?;
                d_form(opcd, gpr(ops[0])?, gpr(ops[1])?, imm16(ops[2])?)
            }
            Form::LoadImm { opcd } => {
                expect_operands(mnemonic, ops, 2)?;
                d_form(opcd, gpr(ops[0])?, 0, imm16(ops[1])?)
            }
            Form::SubImm => {
                expect_operands(mnemonic, ops, 3)?;
                let value = parse_int(ops[2])?.wrapping_neg();
                d_form(14, gpr(ops[0])?, gpr(ops[1])?, value as u32 & 0xFFFF)
            }
            Form::DLogical { opcd } => {
                expect_operands(mnemonic, ops, 3)?;
                // rS is the field at bit 21, rA at bit 16.
                d_form(opcd, gpr(ops[1])?, gpr(ops[0])?, imm16(ops[2])?)
            }
            Form::CmpImm { opcd } => {
                let (crf, rest) = split_cr_field(mnemonic, ops, 2)?;
                d_form(opcd, crf << 2, gpr(rest[0])?, imm16(rest[1])?)
            }
            Form::Cmp { xo } => {
                let (crf, rest) = split_cr_field(mnemonic, ops, 2)?;
                x_form(crf << 2, gpr(rest[0])?, gpr(rest[1])?, xo)
            }
            Form::Mem { opcd, float } => {
                expect_operands(mnemonic, ops, 3)?;
                let rd = if float { fpr(ops[0])? } else { gpr(ops[0])? };
                d_form(opcd, rd, gpr(ops[2])?, imm16(ops[1])?)
            }
            Form::XoArith { xo } => {
                expect_operands(mnemonic, ops, 3)?;
                x_form(gpr(ops[0])?, gpr(ops[1])?, gpr(ops[2])?, xo)
            }
            Form::Sub => {
                expect_operands(mnemonic, ops, 3)?;
                x_form(gpr(ops[0])?, gpr(ops[2])?, gpr(ops[1])?, 40)
            }
            Form::Neg => {
                expect_operands(mnemonic, ops, 2)?;
                x_form(gpr(ops[0])?, gpr(ops[1])?, 0, 104)
            }
            Form::XLogical { xo } => {
                expect_operands(mnemonic, ops, 3)?;
                x_form(gpr(ops[1])?, gpr(ops[0])?, gpr(ops[2])?, xo)
            }
            Form::Mr => {
                expect_operands(mnemonic, ops, 2)?;
                let rs = gpr(ops[1])?;
                x_form(rs, gpr(ops[0])?, rs, 444)
            }
            Form::Rlwinm => {
                expect_operands(mnemonic, ops, 5)?;
                rlwinm(
                    gpr(ops[0])?,
                    gpr(ops[1])?,
                    field5(ops[2])?,
                    field5(ops[3])?,
                    field5(ops[4])?,
                )
            }
            Form::Slwi => {
                expect_operands(mnemonic, ops, 3)?;
                let n = field5(ops[2])?;
                rlwinm(gpr(ops[0])?, gpr(ops[1])?, n, 0, 31 - n)
            }
            Form::Srwi => {
                expect_operands(mnemonic, ops, 3)?;
                let n = field5(ops[2])?;
                rlwinm(gpr(ops[0])?, gpr(ops[1])?, (32 - n) & 0x1F, n, 31)
            }
            Form::MoveFromSpr { spr } => {
                expect_operands(mnemonic, ops, 1)?;
                spr_form(gpr(ops[0])?, spr, 339)
            }
            Form::MoveToSpr { spr } => {
                expect_operands(mnemonic, ops, 1)?;
                spr_form(gpr(ops[0])?, spr, 467)
            }
            Form::Branch { link } => {
                expect_operands(mnemonic, ops, 1)?;
                let disp = branch_target(ops[0])?.wrapping_sub(address) as u32;
                (18 << 26) | (disp & 0x03FF_FFFC) | u32::from(link)
            }
            Form::CondBranch { bo, bit } => {
                let (crf, rest) = split_cr_field(mnemonic, ops, 1)?;
                let disp = branch_target(rest[0])?.wrapping_sub(address) as u32;
                (16 << 26) | (bo << 21) | ((crf * 4 + bit) << 16) | (disp & 0xFFFC)
            }
        };
        Ok(word)
    }
}

impl InstructionEncoder for PpcEncoder {
    fn encode(&self, mnemonic: &str, operands: &[&str], address: i32) -> AsmResult<[u8; 4]> {
        let lowered = mnemonic.to_ascii_lowercase();
        let form = lookup(&lowered).ok_or_else(|| AsmError::unsupported(mnemonic))?;
        let word = self.encode_word(&lowered, form, operands, address)?;
        log::trace!("{} {:?} @ 0x{:08X} -> 0x{:08X}", lowered, operands, address as u32, word);
        Ok(word.to_be_bytes())
    }
}

fn d_form(opcd: u32, d: u32, a: u32, imm: u32) -> u32 {
    (opcd << 26) | (d << 21) | (a << 16) | (imm & 0xFFFF)
}

fn x_form(d: u32, a: u32, b: u32, xo: u32) -> u32 {
    (31 << 26) | (d << 21) | (a << 16) | (b << 11) | (xo << 1)
}

fn rlwinm(ra: u32, rs: u32, sh: u32, mb: u32, me: u32) -> u32 {
    (21 << 26) | (rs << 21) | (ra << 16) | (sh << 11) | (mb << 6) | (me << 1)
}

fn spr_form(reg: u32, spr: u32, xo: u32) -> u32 {
    // The SPR number is stored with its two 5-bit halves swapped.
    let field = ((spr & 0x1F) << 5) | ((spr >> 5) & 0x1F);
    (31 << 26) | (reg << 21) | (field << 11) | (xo << 1)
}

fn expect_operands(mnemonic: &str, ops: &[&str], count: usize) -> AsmResult<()> {
    if ops.len() != count {
        return Err(AsmError::operand(format!(
            "{mnemonic} expects {count} operand(s), found {}",
            ops.len()
        )));
    }
    Ok(())
}

/// Splits an optional leading `crN` operand off `ops`.
fn split_cr_field<'o, 'a>(
    mnemonic: &str,
    ops: &'o [&'a str],
    rest: usize,
) -> AsmResult<(u32, &'o [&'a str])> {
    if ops.len() == rest + 1 {
        Ok((crf(ops[0])?, &ops[1..]))
    } else {
        expect_operands(mnemonic, ops, rest)?;
        Ok((0, ops))
    }
}

fn register(token: &str, prefix: &str) -> AsmResult<u32> {
    let lowered = token.to_ascii_lowercase();
    let digits = lowered
        .strip_prefix(prefix)
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| AsmError::operand(token))?;
    let number: u32 = digits.parse().map_err(|_| AsmError::operand(token))?;
    Ok(number & 0x1F)
}

fn gpr(token: &str) -> AsmResult<u32> {
    match token.to_ascii_lowercase().as_str() {
        "sp" => Ok(1),
        "rtoc" => Ok(2),
        _ => register(token, "r"),
    }
}

fn fpr(token: &str) -> AsmResult<u32> {
    register(token, "f")
}

fn crf(token: &str) -> AsmResult<u32> {
    register(token, "cr").map(|n| n & 0x7)
}

fn imm16(token: &str) -> AsmResult<u32> {
    Ok(parse_int(token)? as u32 & 0xFFFF)
}

fn field5(token: &str) -> AsmResult<u32> {
    Ok(parse_int(token)? as u32 & 0x1F)
}

fn branch_target(token: &str) -> AsmResult<i32> {
    Ok(parse_int(token)? as u32 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(mnemonic: &str, ops: &[&str]) -> u32 {
        word_at(mnemonic, ops, 0)
    }

    fn word_at(mnemonic: &str, ops: &[&str], address: i32) -> u32 {
        u32::from_be_bytes(PpcEncoder::new().encode(mnemonic, ops, address).unwrap())
    }

    #[test]
    fn test_fixed_words() {
        assert_eq!(word("nop", &[]), 0x6000_0000);
        assert_eq!(word("blr", &[]), 0x4E80_0020);
        assert_eq!(word("bctrl", &[]), 0x4E80_0421);
        assert_eq!(word("NOP", &[]), 0x6000_0000);
    }

    #[test]
    fn test_immediate_forms() {
        assert_eq!(word("li", &["r3", "1"]), 0x3860_0001);
        assert_eq!(word("li", &["r3", "-1"]), 0x3860_FFFF);
        assert_eq!(word("lis", &["r3", "0x8000"]), 0x3C60_8000);
        assert_eq!(word("addi", &["r3", "r3", "0x10"]), 0x3863_0010);
        assert_eq!(word("subi", &["r3", "r3", "1"]), 0x3863_FFFF);
        assert_eq!(word("ori", &["r3", "r3", "0x1234"]), 0x6063_1234);
        assert_eq!(word("cmpwi", &["r3", "0"]), 0x2C03_0000);
        assert_eq!(word("cmpwi", &["cr7", "r3", "5"]), 0x2F83_0005);
    }

    #[test]
    fn test_memory_forms() {
        assert_eq!(word("lwz", &["r3", "8", "r4"]), 0x8064_0008);
        assert_eq!(word("stw", &["r0", "4", "sp"]), 0x9001_0004);
        assert_eq!(word("stwu", &["sp", "-16", "sp"]), 0x9421_FFF0);
        assert_eq!(word("lfs", &["f1", "0", "r3"]), 0xC023_0000);
    }

    #[test]
    fn test_register_forms() {
        assert_eq!(word("add", &["r3", "r4", "r5"]), 0x7C64_2A14);
        assert_eq!(word("mr", &["r31", "r3"]), 0x7C7F_1B78);
        assert_eq!(word("mflr", &["r0"]), 0x7C08_02A6);
        assert_eq!(word("mtlr", &["r0"]), 0x7C08_03A6);
        assert_eq!(word("mtctr", &["r12"]), 0x7D89_03A6);
        assert_eq!(word("slwi", &["r3", "r3", "2"]), 0x5463_103A);
        assert_eq!(word("cmpw", &["r3", "r4"]), 0x7C03_2000);
    }

    #[test]
    fn test_branches_are_relative_to_address() {
        assert_eq!(word_at("b", &["0x80001010"], 0x8000_1000u32 as i32), 0x4800_0010);
        assert_eq!(word_at("bl", &["0x80001000"], 0x8000_1010u32 as i32), 0x4BFF_FFF1);
        assert_eq!(word_at("beq", &["0x20"], 0x10), 0x4182_0010);
        assert_eq!(word_at("bne", &["cr1", "0x0"], 0x10), 0x4086_FFF0);
    }

    #[test]
    fn test_errors() {
        let encoder = PpcEncoder::new();
        assert_eq!(
            encoder.encode("frobnicate", &["r1", "r2"], 0),
            Err(AsmError::UnsupportedOperation("frobnicate".to_string()))
        );
        assert!(matches!(
            encoder.encode("addi", &["x3", "r3", "1"], 0),
            Err(AsmError::MalformedOperand(_))
        ));
        assert!(matches!(
            encoder.encode("addi", &["r3", "r3"], 0),
            Err(AsmError::MalformedOperand(_))
        ));
        assert!(matches!(
            encoder.encode("li", &["r3", "zz"], 0),
            Err(AsmError::MalformedLiteral(_))
        ));
    }
}
