//! Raw payload dump, for looking at what a program writes.
//!
//! Each `WriteData` becomes lines of up to eight bytes, printed as two
//! groups of four. The last group of a payload may be shorter. Addresses are
//! not printed and conditionals and arithmetic are skipped.

use super::{CodeOutput, CodeWriter};
use crate::ir::{CodeBlock, Unit, WriteData};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default)]
pub struct ByteDumpWriter;

impl ByteDumpWriter {
    pub fn new() -> Self {
        Self
    }

    fn dump_units(&self, units: &[Unit], out: &mut CodeOutput) {
        for unit in units {
            match unit {
                Unit::WriteData(data) => dump(data, out),
                Unit::CodeBlock(block) => self.dump_units(&block.units, out),
                Unit::MultiUnit(units) => self.dump_units(units, out),
                Unit::Conditional(_) | Unit::Arithmetic(_) => {}
            }
        }
    }
}

impl CodeWriter for ByteDumpWriter {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn write(&self, block: &CodeBlock) -> CodeOutput {
        let mut out = CodeOutput::new();
        self.dump_units(&block.units, &mut out);
        out
    }
}

fn dump(data: &WriteData, out: &mut CodeOutput) {
    for line in data.bytes.chunks(8) {
        let groups: Vec<String> = line.chunks(4).map(hex).collect();
        out.lines.push(groups.join(" "));
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(text, "{byte:02X}");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Conditional, ConditionKind, ValueType};

    #[test]
    fn test_dump_lines() {
        let block = CodeBlock::new(vec![
            WriteData::new(0, (1..=11).collect()).into(),
            WriteData::new(0x40, vec![0xAB; 3]).into(),
        ]);
        assert_eq!(
            ByteDumpWriter::new().write(&block).lines,
            vec!["01020304 05060708", "090A0B", "ABABAB"]
        );
    }

    #[test]
    fn test_conditionals_are_skipped() {
        let block = CodeBlock::new(vec![Conditional {
            kind: ConditionKind::Equal,
            value_type: ValueType::U8,
            address: 0,
            value: 1,
            body: CodeBlock::new(vec![WriteData::new(4, vec![1]).into()]),
        }
        .into()]);
        let output = ByteDumpWriter::new().write(&block);
        assert!(output.lines.is_empty());
        assert!(output.is_ok());
    }
}
