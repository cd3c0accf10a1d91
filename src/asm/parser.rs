//! Recursive-descent assembler.
//!
//! One call to [`Assembler::parse_block`] consumes lines until `!end` or the
//! end of input. Conditional bodies and repeat bodies are parsed by nested
//! calls that share the caller's [`LineCursor`] and [`InstructionPointer`].

use super::cursor::{InstructionPointer, LineCursor};
use super::literal::{parse_float, parse_int, strip_comment, tokenize};
use crate::core::error::{AsmError, AsmResult};
use crate::ir::{
    Arithmetic, ArithmeticKind, CodeBlock, ConditionKind, Conditional, Unit, ValueType, WriteData,
};
use crate::ppc::{encode_data, DataKind, InstructionEncoder, PpcEncoder};
use log::{debug, trace, warn};

/// Assembles `lines` with the PowerPC encoding table.
pub fn assemble<S: AsRef<str>>(lines: &[S]) -> AsmResult<CodeBlock> {
    Assembler::new(&PpcEncoder).assemble(lines)
}

/// How a call to `parse_block` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEnd {
    EndDirective,
    Exhausted,
}

/// What a single source line turned into.
enum Step {
    Emit(Unit),
    Nothing,
    End,
}

/// A patch directive after its name has been resolved.
enum Patch {
    Condition(ConditionKind, ValueType),
    Arithmetic(ArithmeticKind, ValueType),
}

pub struct Assembler<'e> {
    encoder: &'e dyn InstructionEncoder,
}

impl<'e> Assembler<'e> {
    pub fn new(encoder: &'e dyn InstructionEncoder) -> Self {
        Self { encoder }
    }

    pub fn assemble<S: AsRef<str>>(&self, lines: &[S]) -> AsmResult<CodeBlock> {
        let mut cursor = LineCursor::new(lines);
        let mut ip = InstructionPointer::default();

        let (block, end) = self.parse_block(&mut cursor, &mut ip)?;
        if end == BlockEnd::EndDirective && !cursor.is_exhausted() {
            warn!(
                "top-level !end reached, ignoring {} remaining line(s)",
                cursor.remaining()
            );
        }
        debug!("assembled {} top-level unit(s), final address 0x{:08X}", block.len(), ip.get() as u32);
        Ok(block)
    }

    fn parse_block<S: AsRef<str>>(
        &self,
        cursor: &mut LineCursor<'_, S>,
        ip: &mut InstructionPointer,
    ) -> AsmResult<(CodeBlock, BlockEnd)> {
        let mut units = Vec::new();

        while let Some((line_no, raw)) = cursor.advance_real() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let step = self.parse_line(line, cursor, ip).map_err(|e| {
                debug!("line {line_no}: {e} in '{line}'");
                e
            })?;

            match step {
                Step::Emit(unit) => units.push(unit),
                Step::Nothing => {}
                Step::End => return Ok((CodeBlock::new(units), BlockEnd::EndDirective)),
            }
        }

        Ok((CodeBlock::new(units), BlockEnd::Exhausted))
    }

    fn parse_line<S: AsRef<str>>(
        &self,
        line: &str,
        cursor: &mut LineCursor<'_, S>,
        ip: &mut InstructionPointer,
    ) -> AsmResult<Step> {
        if let Some(rest) = line.strip_prefix('!') {
            return self.parse_special(rest, cursor, ip);
        }
        if let Some(rest) = line.strip_prefix('.') {
            return self.parse_data(rest, ip);
        }
        if let Some(label) = line.strip_suffix(':') {
            let label = label.trim();
            if !label.is_empty() && !label.contains(char::is_whitespace) {
                let address = parse_int(label)? as u32 as i32;
                trace!("label 0x{:08X}", address as u32);
                ip.set(address);
                return Ok(Step::Nothing);
            }
        }
        self.parse_instruction(line, ip)
    }

    fn parse_instruction(&self, line: &str, ip: &mut InstructionPointer) -> AsmResult<Step> {
        let tokens = tokenize(line);
        let Some((mnemonic, operands)) = tokens.split_first() else {
            return Err(AsmError::unsupported(line));
        };

        ip.align_up(4);
        let word = self.encoder.encode(mnemonic, operands, ip.get())?;
        let unit = WriteData::new(ip.get(), word.to_vec());
        ip.advance(4);
        Ok(Step::Emit(unit.into()))
    }

    fn parse_data(&self, rest: &str, ip: &mut InstructionPointer) -> AsmResult<Step> {
        let (name, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let kind = DataKind::from_str(name).ok_or_else(|| AsmError::unsupported(format!(".{name}")))?;

        let bytes = encode_data(kind, args)?;
        if bytes.is_empty() {
            return Ok(Step::Nothing);
        }

        trace!(".{} {} byte(s) @ 0x{:08X}", name, bytes.len(), ip.get() as u32);
        let len = bytes.len();
        let unit = WriteData::new(ip.get(), bytes);
        ip.advance(len);
        Ok(Step::Emit(unit.into()))
    }

    fn parse_special<S: AsRef<str>>(
        &self,
        rest: &str,
        cursor: &mut LineCursor<'_, S>,
        ip: &mut InstructionPointer,
    ) -> AsmResult<Step> {
        let tokens = tokenize(rest);
        let Some(&name) = tokens.first() else {
            return Err(AsmError::unsupported("!"));
        };

        match name {
            "end" => return Ok(Step::End),
            "repeat" => {
                let count = match tokens.as_slice() {
                    [_, count] => parse_int(count)?,
                    _ => return Err(AsmError::operand("repeat expects one count")),
                };
                if count < 0 {
                    return Err(AsmError::literal(tokens[1]));
                }
                return self.parse_repeat(count as u64, cursor, ip).map(Step::Emit);
            }
            _ => {}
        }

        let (patch, display, args) = resolve_patch(&tokens)?;
        let [value] = args else {
            return Err(AsmError::operand(format!("{display} expects one value")));
        };

        match patch {
            Patch::Condition(kind, value_type) => {
                let value = parse_value(value, value_type)?;
                let address = ip.get();
                debug!("!{} 0x{:X} @ 0x{:08X}", display, value, address as u32);
                let (body, _) = self.parse_block(cursor, ip)?;
                Ok(Step::Emit(
                    Conditional {
                        kind,
                        value_type,
                        address,
                        value,
                        body,
                    }
                    .into(),
                ))
            }
            Patch::Arithmetic(kind, value_type) => {
                let value = parse_value(value, value_type)?;
                let address = ip.get();
                debug!("!{} 0x{:X} @ 0x{:08X}", display, value, address as u32);
                ip.advance(value_type.size() as usize);
                Ok(Step::Emit(
                    Arithmetic {
                        kind,
                        value_type,
                        address,
                        value,
                    }
                    .into(),
                ))
            }
        }
    }

    /// Unrolls a `!repeat` body.
    ///
    /// The first `count - 1` passes read a forked view of the cursor; only the
    /// last pass consumes the body from the real cursor, so the caller resumes
    /// after the closing `!end`. With `count == 0` the body is still consumed
    /// but its units and its effect on the instruction pointer are dropped.
    fn parse_repeat<S: AsRef<str>>(
        &self,
        count: u64,
        cursor: &mut LineCursor<'_, S>,
        ip: &mut InstructionPointer,
    ) -> AsmResult<Unit> {
        debug!("!repeat {} @ 0x{:08X}", count, ip.get() as u32);

        if count == 0 {
            let saved = *ip;
            self.parse_block(cursor, ip)?;
            *ip = saved;
            return Ok(Unit::MultiUnit(Vec::new()));
        }

        let mut units = Vec::new();
        for _ in 1..count {
            let mut view = cursor.fork_view();
            let (body, _) = self.parse_block(&mut view, ip)?;
            units.extend(body.units);
        }
        let (body, _) = self.parse_block(cursor, ip)?;
        units.extend(body.units);

        Ok(Unit::MultiUnit(units))
    }
}

/// Resolves `u32 equal ...` or `u32equal ...` into a patch directive, the
/// directive name for messages, and the remaining argument tokens.
fn resolve_patch<'t, 'a>(tokens: &'t [&'a str]) -> AsmResult<(Patch, String, &'t [&'a str])> {
    if let [width, op, args @ ..] = tokens {
        if let Some(value_type) = ValueType::from_str(width) {
            let display = format!("{width} {op}");
            return Ok((patch_for(value_type, op, &display)?, display, args));
        }
    }

    let name = tokens[0];
    for value_type in ValueType::ALL {
        if let Some(op) = name.strip_prefix(value_type.name()) {
            if ConditionKind::from_str(op).is_some() || ArithmeticKind::from_str(op).is_some() {
                return Ok((patch_for(value_type, op, name)?, name.to_string(), &tokens[1..]));
            }
        }
    }
    Err(AsmError::unsupported(format!("!{name}")))
}

fn patch_for(value_type: ValueType, op: &str, display: &str) -> AsmResult<Patch> {
    let unsupported = || AsmError::unsupported(format!("!{display}"));

    if let Some(kind) = ConditionKind::from_str(op) {
        if kind == ConditionKind::Mask && !matches!(value_type, ValueType::U8 | ValueType::U16) {
            return Err(unsupported());
        }
        return Ok(Patch::Condition(kind, value_type));
    }

    match ArithmeticKind::from_str(op) {
        Some(ArithmeticKind::Add) => Ok(Patch::Arithmetic(ArithmeticKind::Add, value_type)),
        Some(kind @ (ArithmeticKind::BitSet | ArithmeticKind::BitUnset))
            if matches!(value_type, ValueType::U8 | ValueType::U16 | ValueType::U32) =>
        {
            Ok(Patch::Arithmetic(kind, value_type))
        }
        _ => Err(unsupported()),
    }
}

/// Parses a directive operand into raw bits truncated to the width.
fn parse_value(token: &str, value_type: ValueType) -> AsmResult<u32> {
    if value_type.is_float() {
        Ok((parse_float(token)? as f32).to_bits())
    } else {
        Ok(parse_int(token)? as u32 & value_type.mask())
    }
}
