// This module implements Dialect A, an Action Replay style code writer. Writes are
// planned by the shared run-length planner and formatted as 8-bit (type 0x00), 16-bit
// (0x02) and 32-bit (0x04) records, where fill records carry their total repetition
// count above the value and a single write carries a count of zero. Conditionals are
// framed by their body's line count: a body of one line uses the plain condition type,
// two lines add 0x40, and longer bodies add 0x80 and close with the 00000000 40000000
// terminator. Ordered comparisons pick the signed or unsigned condition family from the
// operand type; float comparisons reuse the signed 32-bit family, which only orders
// IEEE values correctly while they are not both negative, so they carry a warning.
// Additions map to the increment records 0x80-0x86. The dialect has no bit set or bit
// clear record; those units degrade to a plain write at their width with a warning. A
// bit set writes the value itself, a bit clear writes the value's complement, so the
// named bits end up right and every other bit of the operand is overwritten.

//! Dialect A: Action Replay style codes.

use super::runlength::{plan_writes, FillLimits, WriteRecord};
use super::{code_word, CodeOutput, CodeWriter};
use crate::ir::{
    Arithmetic, ArithmeticKind, CodeBlock, ConditionKind, Conditional, Unit, ValueType, WriteData,
};
use log::{trace, warn};

pub const WRITE8: u32 = 0x00;
pub const WRITE16: u32 = 0x02;
pub const WRITE32: u32 = 0x04;

const IF_EQUAL: u32 = 0x08;
const IF_UNEQUAL: u32 = 0x10;
const IF_LESS_SIGNED: u32 = 0x18;
const IF_GREATER_SIGNED: u32 = 0x20;
const IF_LESS_UNSIGNED: u32 = 0x28;
const IF_GREATER_UNSIGNED: u32 = 0x30;
const IF_MASK: u32 = 0x38;

const TWO_LINES: u32 = 0x40;
const ALL_LINES: u32 = 0x80;

const INCREMENT: u32 = 0x80;

/// Closes an all-lines conditional.
pub const TERMINATOR: (u32, u32) = (0x0000_0000, 0x4000_0000);

pub const LIMITS: FillLimits = FillLimits {
    max_bytes: 0x00FF_FFFF,
    max_halves: 0xFFFF,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionReplayWriter;

impl ActionReplayWriter {
    pub fn new() -> Self {
        Self
    }

    fn write_units(&self, units: &[Unit], out: &mut CodeOutput) {
        for unit in units {
            match unit {
                Unit::WriteData(data) => self.write_data(data, out),
                Unit::CodeBlock(block) => self.write_units(&block.units, out),
                Unit::MultiUnit(units) => self.write_units(units, out),
                Unit::Conditional(cond) => self.write_conditional(cond, out),
                Unit::Arithmetic(arith) => self.write_arithmetic(arith, out),
            }
        }
    }

    fn write_data(&self, data: &WriteData, out: &mut CodeOutput) {
        for record in plan_writes(data, LIMITS) {
            let (left, right) = format_write(record);
            out.push_record(left, right);
        }
    }

    fn write_conditional(&self, cond: &Conditional, out: &mut CodeOutput) {
        let mut body = self.write(&cond.body);
        out.absorb_diagnostics(&mut body);
        if body.lines.is_empty() {
            trace!("conditional at 0x{:08X} has an empty body", cond.address as u32);
            return;
        }

        let subtype = match body.lines.len() {
            1 => 0,
            2 => TWO_LINES,
            _ => ALL_LINES,
        };

        if cond.value_type.is_float()
            && matches!(cond.kind, ConditionKind::LessThan | ConditionKind::GreaterThan)
        {
            let message = format!(
                "f32 {} at 0x{:08X} uses a signed integer comparison; negative values compare in reverse",
                cond.kind.name(),
                cond.address as u32
            );
            warn!("{message}");
            out.warnings.push(message);
        }

        let code_type =
            condition_type(cond.kind, cond.value_type) | compare_size_bits(cond.value_type) | subtype;
        out.push_record(
            code_word(code_type, cond.address as u32),
            cond.value & cond.value_type.mask(),
        );
        out.lines.append(&mut body.lines);
        if subtype == ALL_LINES {
            out.push_record(TERMINATOR.0, TERMINATOR.1);
        }
    }

    fn write_arithmetic(&self, arith: &Arithmetic, out: &mut CodeOutput) {
        match arith.kind {
            ArithmeticKind::Add => {
                let code_type = INCREMENT | size_bits(arith.value_type);
                out.push_record(
                    code_word(code_type, arith.address as u32),
                    arith.value & arith.value_type.mask(),
                );
            }
            ArithmeticKind::BitSet | ArithmeticKind::BitUnset => {
                let ty = arith.value_type;
                let value = match arith.kind {
                    ArithmeticKind::BitUnset => !arith.value & ty.mask(),
                    _ => arith.value & ty.mask(),
                };
                let message = format!(
                    "no {} {} in Action Replay at 0x{:08X}; substituting a full-width write",
                    ty.name(),
                    arith.kind.name(),
                    arith.address as u32
                );
                warn!("{message}");
                out.warnings.push(message);

                let address = arith.address as u32;
                let record = match ty.size() {
                    1 => WriteRecord::Byte { address, value: value as u8, count: 1 },
                    2 => WriteRecord::Half { address, value: value as u16, count: 1 },
                    _ => WriteRecord::Word { address, value },
                };
                let (left, right) = format_write(record);
                out.push_record(left, right);
            }
        }
    }
}

impl CodeWriter for ActionReplayWriter {
    fn name(&self) -> &'static str {
        "action-replay"
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
            let count = if count == 1 { 0 } else { count };
            (code_word(WRITE8, address), (count << 8) | u32::from(value))
        }
        WriteRecord::Half { address, value, count } => {
            let count = if count == 1 { 0 } else { count };
            (code_word(WRITE16, address), (count << 16) | u32::from(value))
        }
        WriteRecord::Word { address, value } => (code_word(WRITE32, address), value),
    }
}

fn condition_type(kind: ConditionKind, value_type: ValueType) -> u32 {
    let signed = value_type.is_signed() || value_type.is_float();
    match kind {
        ConditionKind::Equal => IF_EQUAL,
        ConditionKind::Unequal => IF_UNEQUAL,
        ConditionKind::LessThan if signed => IF_LESS_SIGNED,
        ConditionKind::LessThan => IF_LESS_UNSIGNED,
        ConditionKind::GreaterThan if signed => IF_GREATER_SIGNED,
        ConditionKind::GreaterThan => IF_GREATER_UNSIGNED,
        ConditionKind::Mask => IF_MASK,
    }
}

/// Conditionals have no float size; floats compare as 32-bit words.
fn compare_size_bits(value_type: ValueType) -> u32 {
    match value_type {
        ValueType::F32 => size_bits(ValueType::U32),
        other => size_bits(other),
    }
}

/// Operand size field: 8-bit 0, 16-bit 2, 32-bit 4, float 6.
fn size_bits(value_type: ValueType) -> u32 {
    match value_type {
        ValueType::U8 | ValueType::S8 => 0,
        ValueType::U16 | ValueType::S16 => 2,
        ValueType::U32 | ValueType::S32 => 4,
        ValueType::F32 => 6,
    }
}
