//! Property-based tests for the optimizer passes.
//!
//! Random IR trees are pushed through the passes and checked for:
//! 1. No `MultiUnit` survives flattening
//! 2. Every optimized write is aligned for its length
//! 3. Merging leaves no contiguous neighbours behind
//! 4. The pipeline is idempotent
//! 5. Optimizing never changes the memory a program writes

use cheatasm::codegen::replay::replay;
use cheatasm::ir::{
    Arithmetic, ArithmeticKind, CodeBlock, ConditionKind, Conditional, Unit, ValueType, WriteData,
};
use cheatasm::opt::flatten::flatten_block;
use cheatasm::opt::write_data::merge_block;
use cheatasm::{optimize, write_code, Dialect};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Short writes over a small address window, so neighbours touch often.
fn write_unit() -> impl Strategy<Value = Unit> {
    (0i32..48, prop::collection::vec(0u8..3, 1..12))
        .prop_map(|(address, bytes)| WriteData::new(address, bytes).into())
}

fn arithmetic_unit() -> impl Strategy<Value = Unit> {
    (0i32..48, 0u32..4).prop_map(|(address, value)| {
        Arithmetic {
            kind: ArithmeticKind::Add,
            value_type: ValueType::U8,
            address,
            value,
        }
        .into()
    })
}

fn unit_tree(with_patches: bool) -> impl Strategy<Value = Unit> {
    let leaf = if with_patches {
        prop_oneof![3 => write_unit(), 1 => arithmetic_unit()].boxed()
    } else {
        write_unit().boxed()
    };

    leaf.prop_recursive(3, 48, 6, move |inner| {
        let units = prop::collection::vec(inner, 0..6);
        if with_patches {
            prop_oneof![
                units.clone().prop_map(|units| Unit::CodeBlock(CodeBlock::new(units))),
                units.clone().prop_map(Unit::MultiUnit),
                (0i32..48, units).prop_map(|(address, units)| {
                    Conditional {
                        kind: ConditionKind::Equal,
                        value_type: ValueType::U16,
                        address,
                        value: 1,
                        body: CodeBlock::new(units),
                    }
                    .into()
                }),
            ]
            .boxed()
        } else {
            prop_oneof![
                units.clone().prop_map(|units| Unit::CodeBlock(CodeBlock::new(units))),
                units.prop_map(Unit::MultiUnit),
            ]
            .boxed()
        }
    })
}

fn program(with_patches: bool) -> impl Strategy<Value = CodeBlock> {
    prop::collection::vec(unit_tree(with_patches), 0..8).prop_map(CodeBlock::new)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Calls `f` on every unit sequence in the tree.
fn for_each_sequence<'a>(units: &'a [Unit], f: &mut dyn FnMut(&'a [Unit])) {
    f(units);
    for unit in units {
        match unit {
            Unit::CodeBlock(block) => for_each_sequence(&block.units, f),
            Unit::MultiUnit(inner) => for_each_sequence(inner, f),
            Unit::Conditional(cond) => for_each_sequence(&cond.body.units, f),
            Unit::WriteData(_) | Unit::Arithmetic(_) => {}
        }
    }
}

/// Neighbouring writes where the second starts where the first ends.
fn contiguous_pairs(units: &[Unit]) -> Vec<(WriteData, WriteData)> {
    let mut pairs = Vec::new();
    for_each_sequence(units, &mut |seq| {
        for window in seq.windows(2) {
            if let [Unit::WriteData(prev), Unit::WriteData(next)] = window {
                if prev.is_followed_by(next) {
                    pairs.push((prev.clone(), next.clone()));
                }
            }
        }
    });
    pairs
}

fn is_aligned(address: i32, len: usize) -> bool {
    let address = address as u32;
    (address % 2 == 0 || len == 1) && (address % 4 == 0 || len < 4)
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn flatten_removes_every_multi_unit(block in program(true)) {
        prop_assert!(!flatten_block(block).has_multi_unit());
    }

    #[test]
    fn optimized_writes_are_aligned(block in program(true)) {
        let optimized = optimize(block);
        prop_assert!(!optimized.has_multi_unit());
        for data in optimized.write_data() {
            prop_assert!(
                is_aligned(data.address, data.len()),
                "misaligned write of {} byte(s) at 0x{:X}",
                data.len(),
                data.address
            );
        }
    }

    #[test]
    fn merge_leaves_no_contiguous_neighbours(block in program(true)) {
        let merged = merge_block(flatten_block(block));
        let pairs = contiguous_pairs(&merged.units);
        prop_assert!(pairs.is_empty(), "unmerged neighbours: {:?}", pairs);
    }

    #[test]
    fn remaining_neighbours_are_alignment_splits(block in program(true)) {
        let optimized = optimize(block);
        for (prev, next) in contiguous_pairs(&optimized.units) {
            prop_assert!(!is_aligned(prev.address, prev.len() + next.len()));
        }
    }

    #[test]
    fn pipeline_is_idempotent(block in program(true)) {
        let once = optimize(block);
        let twice = optimize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn optimization_preserves_memory_image(block in program(false)) {
        let optimized = optimize(block.clone());
        for dialect in [Dialect::ActionReplay, Dialect::Gecko] {
            let before = replay(dialect, &write_code(&block, dialect).lines).unwrap();
            let after = replay(dialect, &write_code(&optimized, dialect).lines).unwrap();
            prop_assert_eq!(before, after, "dialect {}", dialect);
        }
    }
}
