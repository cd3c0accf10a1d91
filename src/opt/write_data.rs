// This module implements the write-data optimizer, which runs after flattening. It has
// two halves. Merging folds runs of adjacent WriteData units whose address ranges are
// contiguous into a single write, so the code writers see one long payload instead of
// many short ones; it never looks past a non-write unit and never reorders anything.
// Realigning then splits every write that starts off its natural boundary: a one byte
// head for odd addresses and a two byte head for addresses that are even but not a
// multiple of four. Both cheat-code dialects encode 16- and 32-bit writes in granules
// that must start on 2- and 4-byte boundaries, so a merged write that started at an odd
// address would otherwise be encoded with misaligned records.

//! Merge-and-realign pass over `WriteData` units.

use super::Pass;
use crate::ir::{CodeBlock, Unit, WriteData};

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteDataOptimizer;

impl Pass for WriteDataOptimizer {
    fn name(&self) -> &'static str {
        "write-data"
    }

    fn run(&self, block: CodeBlock) -> CodeBlock {
        realign_block(merge_block(block))
    }
}

/// Merges every pair of neighbouring writes where `next.address == prev.end()`,
/// at every depth.
pub fn merge_block(block: CodeBlock) -> CodeBlock {
    CodeBlock::new(merge_units(block.units))
}

fn merge_units(units: Vec<Unit>) -> Vec<Unit> {
    let mut merged: Vec<Unit> = Vec::with_capacity(units.len());

    for unit in units {
        let unit = match unit {
            Unit::CodeBlock(block) => Unit::CodeBlock(merge_block(block)),
            Unit::MultiUnit(inner) => Unit::MultiUnit(merge_units(inner)),
            Unit::Conditional(mut cond) => {
                cond.body = merge_block(cond.body);
                Unit::Conditional(cond)
            }
            unit @ (Unit::WriteData(_) | Unit::Arithmetic(_)) => unit,
        };

        if let Unit::WriteData(next) = &unit {
            if let Some(Unit::WriteData(prev)) = merged.last_mut() {
                if prev.is_followed_by(next) {
                    prev.bytes.extend_from_slice(&next.bytes);
                    continue;
                }
            }
        }
        merged.push(unit);
    }

    merged
}

/// Splits writes so that every write of 2+ bytes starts on an even address
/// and every write of 4+ bytes starts on a multiple of 4.
pub fn realign_block(block: CodeBlock) -> CodeBlock {
    CodeBlock::new(realign_units(block.units))
}

fn realign_units(units: Vec<Unit>) -> Vec<Unit> {
    let mut out = Vec::with_capacity(units.len());
    for unit in units {
        match unit {
            Unit::WriteData(data) => realign_write(data, &mut out),
            Unit::CodeBlock(block) => out.push(Unit::CodeBlock(realign_block(block))),
            Unit::MultiUnit(inner) => out.push(Unit::MultiUnit(realign_units(inner))),
            Unit::Conditional(mut cond) => {
                cond.body = realign_block(cond.body);
                out.push(Unit::Conditional(cond));
            }
            unit @ Unit::Arithmetic(_) => out.push(unit),
        }
    }
    out
}

fn realign_write(mut data: WriteData, out: &mut Vec<Unit>) {
    if data.address as u32 % 2 != 0 && data.len() >= 2 {
        let (head, rest) = data.split_at(1);
        out.push(head.into());
        data = rest;
    }
    if data.address as u32 % 4 != 0 && data.len() >= 4 {
        let (head, rest) = data.split_at(2);
        out.push(head.into());
        data = rest;
    }
    out.push(data.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArithmeticKind, Arithmetic, ValueType};

    fn write(address: i32, bytes: &[u8]) -> Unit {
        WriteData::new(address, bytes.to_vec()).into()
    }

    #[test]
    fn test_merge_contiguous_writes() {
        let block = CodeBlock::new(vec![
            write(0, &[1]),
            write(1, &[2, 3]),
            write(3, &[4]),
            write(8, &[5]),
        ]);
        assert_eq!(
            merge_block(block).units,
            vec![write(0, &[1, 2, 3, 4]), write(8, &[5])]
        );
    }

    #[test]
    fn test_merge_stops_at_other_units() {
        let add = Unit::Arithmetic(Arithmetic {
            kind: ArithmeticKind::Add,
            value_type: ValueType::U8,
            address: 0x40,
            value: 1,
        });
        let block = CodeBlock::new(vec![write(0, &[1]), add.clone(), write(1, &[2])]);
        assert_eq!(
            merge_block(block).units,
            vec![write(0, &[1]), add, write(1, &[2])]
        );
    }

    #[test]
    fn test_merge_does_not_join_backwards_writes() {
        let block = CodeBlock::new(vec![write(4, &[1]), write(3, &[2])]);
        assert_eq!(merge_block(block.clone()), block);
    }

    #[test]
    fn test_realign_odd_address() {
        let block = CodeBlock::new(vec![write(1, &[1, 2, 3, 4, 5, 6, 7, 8])]);
        assert_eq!(
            realign_block(block).units,
            vec![write(1, &[1]), write(2, &[2, 3]), write(4, &[4, 5, 6, 7, 8])]
        );
    }

    #[test]
    fn test_realign_leaves_short_writes() {
        let block = CodeBlock::new(vec![write(1, &[1]), write(2, &[2, 3, 4]), write(7, &[9])]);
        assert_eq!(realign_block(block.clone()), block);
    }

    #[test]
    fn test_run_is_idempotent() {
        let block = CodeBlock::new(vec![write(3, &[1, 2]), write(5, &[3, 4, 5, 6, 7])]);
        let once = WriteDataOptimizer.run(block);
        assert_eq!(
            once.units,
            vec![write(3, &[1]), write(4, &[2, 3, 4, 5, 6, 7])]
        );
        assert_eq!(WriteDataOptimizer.run(once.clone()), once);
    }
}
