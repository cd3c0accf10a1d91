// This module implements Dialect B, a Gecko style code writer. For every WriteData it
// builds two candidate encodings, the run-length records shared with Dialect A
// (formatted with Gecko's count-minus-one fill fields) and a bulk 0x06 string write that
// packs eight payload bytes per line, and keeps whichever needs fewer lines; target
// devices cap the number of code lines, so compactness matters. Conditional bodies are
// encoded by the run-length writer only and are closed with the E2000001 endif record.
// Gecko compares 16- and 32-bit words natively, so 8-bit comparisons become masked
// 16-bit comparisons of the enclosing halfword. The unsigned greater/lower codes are the
// only ordered comparisons available; signed and float orderings degrade to them with a
// warning. 16- and 32-bit compares at addresses off their natural boundary have no
// encoding and are reported as errors. Arithmetic goes through a Gecko register: load,
// operate, store.

//! Dialect B: Gecko style codes.

use super::runlength::{plan_writes, FillLimits, WriteRecord};
use super::{code_word, record, CodeOutput, CodeWriter, ADDRESS_MASK};
use crate::ir::{Arithmetic, ArithmeticKind, CodeBlock, ConditionKind, Conditional, Unit, WriteData};
use log::{trace, warn};

pub const WRITE8: u32 = 0x00;
pub const WRITE16: u32 = 0x02;
pub const WRITE32: u32 = 0x04;
pub const STRING_WRITE: u32 = 0x06;

const IF32_EQUAL: u32 = 0x20;
const IF32_UNEQUAL: u32 = 0x22;
const IF32_GREATER: u32 = 0x24;
const IF32_LOWER: u32 = 0x26;
const IF16_EQUAL: u32 = 0x28;
const IF16_UNEQUAL: u32 = 0x2A;
const IF16_GREATER: u32 = 0x2C;
const IF16_LOWER: u32 = 0x2E;

const LOAD_REGISTER: u32 = 0x82;
const STORE_REGISTER: u32 = 0x84;
const REGISTER_OP: u32 = 0x86;

const OP_ADD: u32 = 0x0;
const OP_OR: u32 = 0x2;
const OP_AND: u32 = 0x3;
const OP_FADD: u32 = 0x9;

/// `endif`, closing one conditional.
pub const TERMINATOR: (u32, u32) = (0xE200_0001, 0x0000_0000);

pub const LIMITS: FillLimits = FillLimits {
    max_bytes: 0x1_0000,
    max_halves: 0x1_0000,
};

pub const DEFAULT_REGISTER: u8 = 0xF;

#[derive(Debug, Clone, Copy)]
pub struct GeckoWriter {
    register: u8,
    bulk_writes: bool,
}

impl GeckoWriter {
    pub fn new() -> Self {
        Self {
            register: DEFAULT_REGISTER,
            bulk_writes: true,
        }
    }

    /// Uses Gecko register `register` (0-15) as scratch for arithmetic.
    pub fn with_register(register: u8) -> Self {
        Self {
            register: register & 0xF,
            ..Self::new()
        }
    }

    /// The writer used inside conditional bodies: run-length records only.
    fn body_writer(&self) -> Self {
        Self {
            bulk_writes: false,
            ..*self
        }
    }

    /// Run-length candidate for `data`.
    pub fn run_length_lines(&self, data: &WriteData) -> Vec<String> {
        plan_writes(data, LIMITS)
            .into_iter()
            .map(|rec| {
                let (left, right) = format_write(rec);
                record(left, right)
            })
            .collect()
    }

    /// Bulk candidate for `data`: a 0x06 header then 8 bytes per line,
    /// zero padded.
    pub fn bulk_lines(&self, data: &WriteData) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + data.len().div_ceil(8));
        lines.push(record(
            code_word(STRING_WRITE, data.address as u32),
            data.len() as u32,
        ));
        for chunk in data.bytes.chunks(8) {
            let mut padded = [0u8; 8];
            padded[..chunk.len()].copy_from_slice(chunk);
            lines.push(record(
                u32::from_be_bytes([padded[0], padded[1], padded[2], padded[3]]),
                u32::from_be_bytes([padded[4], padded[5], padded[6], padded[7]]),
            ));
        }
        lines
    }

    /// Picks the shorter candidate. Ties keep the run-length form.
    pub fn encode_write(&self, data: &WriteData) -> Vec<String> {
        let run_length = self.run_length_lines(data);
        if !self.bulk_writes || data.len() <= 4 {
            return run_length;
        }

        let bulk = self.bulk_lines(data);
        trace!(
            "write at 0x{:08X}: run-length {} line(s), bulk {} line(s)",
            data.address as u32,
            run_length.len(),
            bulk.len()
        );
        if bulk.len() < run_length.len() {
            bulk
        } else {
            run_length
        }
    }

    fn write_units(&self, units: &[Unit], out: &mut CodeOutput) {
        for unit in units {
            match unit {
                Unit::WriteData(data) => out.lines.extend(self.encode_write(data)),
                Unit::CodeBlock(block) => self.write_units(&block.units, out),
                Unit::MultiUnit(units) => self.write_units(units, out),
                Unit::Conditional(cond) => self.write_conditional(cond, out),
                Unit::Arithmetic(arith) => self.write_arithmetic(arith, out),
            }
        }
    }

    fn write_conditional(&self, cond: &Conditional, out: &mut CodeOutput) {
        let mut body = self.body_writer().write(&cond.body);
        out.absorb_diagnostics(&mut body);
        if body.lines.is_empty() {
            return;
        }

        let Some((left, right)) = self.condition_record(cond, out) else {
            return;
        };
        out.push_record(left, right);
        out.lines.append(&mut body.lines);
        out.push_record(TERMINATOR.0, TERMINATOR.1);
    }

    fn condition_record(&self, cond: &Conditional, out: &mut CodeOutput) -> Option<(u32, u32)> {
        let ty = cond.value_type;
        // Bit 0 of a compare address is the endif-first flag, so the operand
        // must sit on its natural boundary. 8-bit compares pick their half.
        if ty.size() > 1 && cond.address as u32 % ty.size() != 0 {
            out.errors.push(format!(
                "{} {} at 0x{:08X} is not {}-byte aligned; Gecko cannot compare it",
                ty.name(),
                cond.kind.name(),
                cond.address as u32,
                ty.size()
            ));
            return None;
        }

        let ordered = matches!(cond.kind, ConditionKind::LessThan | ConditionKind::GreaterThan);
        if ordered && (ty.is_signed() || ty.is_float()) {
            let message = format!(
                "no {} {} in Gecko at 0x{:08X}; substituting an unsigned comparison",
                ty.name(),
                cond.kind.name(),
                cond.address as u32
            );
            warn!("{message}");
            out.warnings.push(message);
        }

        let value = cond.value & ty.mask();
        match ty.size() {
            4 => {
                let code_type = match cond.kind {
                    ConditionKind::Equal => IF32_EQUAL,
                    ConditionKind::Unequal => IF32_UNEQUAL,
                    ConditionKind::GreaterThan => IF32_GREATER,
                    ConditionKind::LessThan => IF32_LOWER,
                    ConditionKind::Mask => {
                        out.errors.push(format!(
                            "{} mask at 0x{:08X} has no Gecko code",
                            ty.name(),
                            cond.address as u32
                        ));
                        return None;
                    }
                };
                Some((code_word(code_type, cond.address as u32), value))
            }
            size => {
                // Gecko compares halfwords; `ignore` marks bits left out of the comparison.
                let address = cond.address as u32 & ADDRESS_MASK & !1;
                let (value, ignore) = if size == 2 {
                    (value, 0)
                } else if cond.address as u32 % 2 == 0 {
                    (value << 8, 0x00FF)
                } else {
                    (value, 0xFF00)
                };

                let (code_type, compare, ignore) = match cond.kind {
                    ConditionKind::Equal => (IF16_EQUAL, value, ignore),
                    ConditionKind::Unequal => (IF16_UNEQUAL, value, ignore),
                    ConditionKind::GreaterThan => (IF16_GREATER, value, ignore),
                    ConditionKind::LessThan => (IF16_LOWER, value, ignore),
                    ConditionKind::Mask => (IF16_UNEQUAL, 0, !value & 0xFFFF),
                };
                Some((code_word(code_type, address), (ignore << 16) | compare))
            }
        }
    }

    fn write_arithmetic(&self, arith: &Arithmetic, out: &mut CodeOutput) {
        let ty = arith.value_type;
        let size = match ty.size() {
            1 => 0,
            2 => 1,
            _ => 2,
        };
        let (op, operand) = match arith.kind {
            ArithmeticKind::Add if ty.is_float() => (OP_FADD, arith.value),
            ArithmeticKind::Add => (OP_ADD, arith.value & ty.mask()),
            ArithmeticKind::BitSet => (OP_OR, arith.value & ty.mask()),
            ArithmeticKind::BitUnset => (OP_AND, !arith.value & ty.mask()),
        };

        let register = u32::from(self.register);
        let address = arith.address as u32 & ADDRESS_MASK;
        // Y = 1: addresses are relative to the base address, like every other record.
        out.push_record((LOAD_REGISTER << 24) | (size << 20) | (1 << 16) | register, address);
        out.push_record((REGISTER_OP << 24) | (op << 20) | register, operand);
        out.push_record((STORE_REGISTER << 24) | (size << 20) | (1 << 16) | register, address);
    }
}

impl Default for GeckoWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter for GeckoWriter {
    fn name(&self) -> &'static str {
        "gecko"
    }

    fn write(&self, block: &CodeBlock) -> CodeOutput {
        let mut out = CodeOutput::new();
        self.write_units(&block.units, &mut out);
        out
    }
}

fn format_write(record: WriteRecord) -> (u32, u32) {
    match record {
        WriteRecord::Byte { address, value, count } => {
            (code_word(WRITE8, address), ((count - 1) << 16) | u32::from(value))
        }
        WriteRecord::Half { address, value, count } => {
            (code_word(WRITE16, address), ((count - 1) << 16) | u32::from(value))
        }
        WriteRecord::Word { address, value } => (code_word(WRITE32, address), value),
    }
}
