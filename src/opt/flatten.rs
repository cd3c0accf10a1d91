//! Removes `MultiUnit` markers left behind by `!repeat`.

use super::Pass;
use crate::ir::{CodeBlock, Unit};

/// Splices every `MultiUnit` into its parent sequence, at every depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flatten;

impl Pass for Flatten {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn run(&self, block: CodeBlock) -> CodeBlock {
        flatten_block(block)
    }
}

pub fn flatten_block(block: CodeBlock) -> CodeBlock {
    let mut units = Vec::with_capacity(block.units.len());
    flatten_into(block.units, &mut units);
    CodeBlock::new(units)
}

fn flatten_into(units: Vec<Unit>, out: &mut Vec<Unit>) {
    for unit in units {
        match unit {
            Unit::MultiUnit(inner) => flatten_into(inner, out),
            Unit::CodeBlock(block) => out.push(Unit::CodeBlock(flatten_block(block))),
            Unit::Conditional(mut cond) => {
                cond.body = flatten_block(cond.body);
                out.push(Unit::Conditional(cond));
            }
            unit @ (Unit::WriteData(_) | Unit::Arithmetic(_)) => out.push(unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConditionKind, Conditional, ValueType, WriteData};

    fn write(address: i32, byte: u8) -> Unit {
        WriteData::new(address, vec![byte]).into()
    }

    #[test]
    fn test_nested_multi_units_are_spliced_in_order() {
        let block = CodeBlock::new(vec![
            write(0, 1),
            Unit::MultiUnit(vec![
                write(1, 2),
                Unit::MultiUnit(vec![write(2, 3), write(3, 4)]),
                write(4, 5),
            ]),
            write(5, 6),
        ]);

        let flat = flatten_block(block);
        assert_eq!(
            flat.units,
            vec![write(0, 1), write(1, 2), write(2, 3), write(3, 4), write(4, 5), write(5, 6)]
        );
    }

    #[test]
    fn test_recurses_into_blocks_and_conditionals() {
        let block = CodeBlock::new(vec![
            Unit::CodeBlock(CodeBlock::new(vec![Unit::MultiUnit(vec![write(0, 1)])])),
            Conditional {
                kind: ConditionKind::Equal,
                value_type: ValueType::U8,
                address: 0x10,
                value: 0,
                body: CodeBlock::new(vec![Unit::MultiUnit(vec![write(0x20, 9)])]),
            }
            .into(),
        ]);

        let flat = Flatten.run(block);
        assert!(!flat.has_multi_unit());
        assert_eq!(flat.units.len(), 2);
        assert_eq!(flat.units[0], Unit::CodeBlock(CodeBlock::new(vec![write(0, 1)])));
    }

    #[test]
    fn test_empty_multi_unit_disappears() {
        let block = CodeBlock::new(vec![Unit::MultiUnit(vec![]), write(0, 1)]);
        assert_eq!(flatten_block(block).units, vec![write(0, 1)]);
    }
}
