//! IR data model produced by the assembler.
//!
//! The tree is a closed set of [`Unit`] variants. Every later stage (the
//! optimizer passes and the code writers) matches on it exhaustively, so a
//! new variant or comparison kind has to be handled everywhere before the
//! crate builds again.
//!
//! # Textual form
//!
//! ```text
//! block
//!   write 0x00000000 [60 00 00 00]
//!   if u32 equal 0x00001234 @ 0x00000100
//!     write 0x00000104 [00 00 00 01]
//!   add u16 0x0001 @ 0x00000200
//! ```

use std::fmt::{self, Write as _};

/// Width and signedness of a patch directive operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    U8,
    U16,
    U32,
    S8,
    S16,
    S32,
    F32,
}

impl ValueType {
    pub const ALL: [ValueType; 7] = [
        ValueType::U8,
        ValueType::U16,
        ValueType::U32,
        ValueType::S8,
        ValueType::S16,
        ValueType::S32,
        ValueType::F32,
    ];

    /// Operand width in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ValueType::U8 | ValueType::S8 => 1,
            ValueType::U16 | ValueType::S16 => 2,
            ValueType::U32 | ValueType::S32 | ValueType::F32 => 4,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, ValueType::S8 | ValueType::S16 | ValueType::S32)
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ValueType::F32)
    }

    /// Mask selecting the bits that belong to a value of this width.
    pub const fn mask(self) -> u32 {
        match self.size() {
            1 => 0xFF,
            2 => 0xFFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::S8 => "s8",
            ValueType::S16 => "s16",
            ValueType::S32 => "s32",
            ValueType::F32 => "f32",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ValueType::ALL.iter().copied().find(|ty| ty.name() == s)
    }
}

/// Comparison performed by a [`Conditional`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Equal,
    Unequal,
    LessThan,
    GreaterThan,
    /// True when any bit of the value is set in memory.
    Mask,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 5] = [
        ConditionKind::Equal,
        ConditionKind::Unequal,
        ConditionKind::LessThan,
        ConditionKind::GreaterThan,
        ConditionKind::Mask,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ConditionKind::Equal => "equal",
            ConditionKind::Unequal => "unequal",
            ConditionKind::LessThan => "lessthan",
            ConditionKind::GreaterThan => "greaterthan",
            ConditionKind::Mask => "mask",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ConditionKind::ALL.iter().copied().find(|kind| kind.name() == s)
    }
}

/// Read-modify-write operator applied by an [`Arithmetic`] unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticKind {
    Add,
    BitSet,
    BitUnset,
}

impl ArithmeticKind {
    pub const ALL: [ArithmeticKind; 3] =
        [ArithmeticKind::Add, ArithmeticKind::BitSet, ArithmeticKind::BitUnset];

    pub const fn name(self) -> &'static str {
        match self {
            ArithmeticKind::Add => "add",
            ArithmeticKind::BitSet => "bitset",
            ArithmeticKind::BitUnset => "bitunset",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ArithmeticKind::ALL.iter().copied().find(|kind| kind.name() == s)
    }
}

/// Opaque payload written at `address`. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteData {
    pub address: i32,
    pub bytes: Vec<u8>,
}

impl WriteData {
    pub fn new(address: i32, bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.is_empty(), "WriteData payload must not be empty");
        Self { address, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address one past the last byte written.
    pub fn end(&self) -> i32 {
        self.address.wrapping_add(self.bytes.len() as i32)
    }

    /// True when `next` starts exactly where this write stops.
    pub fn is_followed_by(&self, next: &WriteData) -> bool {
        self.end() == next.address
    }

    /// Split into `[address, address + at)` and the rest.
    pub fn split_at(mut self, at: usize) -> (WriteData, WriteData) {
        let tail = self.bytes.split_off(at);
        let tail_address = self.address.wrapping_add(at as i32);
        (self, WriteData::new(tail_address, tail))
    }
}

/// A scope. Unit order is program order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub units: Vec<Unit>,
}

/// Apply `body` only if memory at `address` satisfies the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub kind: ConditionKind,
    pub value_type: ValueType,
    pub address: i32,
    /// Raw bits, truncated to `value_type`'s width.
    pub value: u32,
    pub body: CodeBlock,
}

/// Combine `value` into memory at `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arithmetic {
    pub kind: ArithmeticKind,
    pub value_type: ValueType,
    pub address: i32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    WriteData(WriteData),
    CodeBlock(CodeBlock),
    /// Produced by `!repeat`; removed by the flatten pass.
    MultiUnit(Vec<Unit>),
    Conditional(Conditional),
    Arithmetic(Arithmetic),
}

impl From<WriteData> for Unit {
    fn from(data: WriteData) -> Self {
        Unit::WriteData(data)
    }
}

impl From<CodeBlock> for Unit {
    fn from(block: CodeBlock) -> Self {
        Unit::CodeBlock(block)
    }
}

impl From<Conditional> for Unit {
    fn from(cond: Conditional) -> Self {
        Unit::Conditional(cond)
    }
}

impl From<Arithmetic> for Unit {
    fn from(arith: Arithmetic) -> Self {
        Unit::Arithmetic(arith)
    }
}

impl CodeBlock {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True if a `MultiUnit` appears anywhere below this block.
    pub fn has_multi_unit(&self) -> bool {
        self.units.iter().any(Unit::has_multi_unit)
    }

    /// Every `WriteData` in the tree, in program order.
    pub fn write_data(&self) -> Vec<&WriteData> {
        let mut out = Vec::new();
        for unit in &self.units {
            unit.collect_write_data(&mut out);
        }
        out
    }

    pub fn print(&self) -> String {
        let mut output = String::new();
        output.push_str("block\n");
        for unit in &self.units {
            unit.print_into(&mut output, 1);
        }
        output
    }
}

impl Unit {
    fn has_multi_unit(&self) -> bool {
        match self {
            Unit::MultiUnit(_) => true,
            Unit::CodeBlock(block) => block.has_multi_unit(),
            Unit::Conditional(cond) => cond.body.has_multi_unit(),
            Unit::WriteData(_) | Unit::Arithmetic(_) => false,
        }
    }

    fn collect_write_data<'a>(&'a self, out: &mut Vec<&'a WriteData>) {
        match self {
            Unit::WriteData(data) => out.push(data),
            Unit::CodeBlock(block) => block.units.iter().for_each(|u| u.collect_write_data(out)),
            Unit::MultiUnit(units) => units.iter().for_each(|u| u.collect_write_data(out)),
            Unit::Conditional(cond) => {
                cond.body.units.iter().for_each(|u| u.collect_write_data(out))
            }
            Unit::Arithmetic(_) => {}
        }
    }

    fn print_into(&self, output: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Unit::WriteData(data) => {
                let hex: Vec<String> = data.bytes.iter().map(|b| format!("{b:02X}")).collect();
                let _ = writeln!(
                    output,
                    "{indent}write 0x{:08X} [{}]",
                    data.address as u32,
                    hex.join(" ")
                );
            }
            Unit::CodeBlock(block) => {
                let _ = writeln!(output, "{indent}block");
                for unit in &block.units {
                    unit.print_into(output, depth + 1);
                }
            }
            Unit::MultiUnit(units) => {
                let _ = writeln!(output, "{indent}multi");
                for unit in units {
                    unit.print_into(output, depth + 1);
                }
            }
            Unit::Conditional(cond) => {
                let _ = writeln!(
                    output,
                    "{indent}if {} {} 0x{:0width$X} @ 0x{:08X}",
                    cond.value_type.name(),
                    cond.kind.name(),
                    cond.value,
                    cond.address as u32,
                    width = cond.value_type.size() as usize * 2
                );
                for unit in &cond.body.units {
                    unit.print_into(output, depth + 1);
                }
            }
            Unit::Arithmetic(arith) => {
                let _ = writeln!(
                    output,
                    "{indent}{} {} 0x{:0width$X} @ 0x{:08X}",
                    arith.kind.name(),
                    arith.value_type.name(),
                    arith.value,
                    arith.address as u32,
                    width = arith.value_type.size() as usize * 2
                );
            }
        }
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.print())
    }
}
