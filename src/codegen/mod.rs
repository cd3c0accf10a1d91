//! Code writers: optimized IR to cheat-code text.
//!
//! - [`action_replay`] - Dialect A, Action Replay style records
//! - [`gecko`] - Dialect B, Gecko style records with bulk writes
//! - [`byte_dump`] - raw payload bytes, for diagnostics
//! - [`runlength`] - the write planner both dialects share
//! - [`replay`] - decodes write records back into memory contents
//!
//! Every record line is two 8-digit uppercase hex words separated by a
//! space. Writers never fail: units a dialect cannot express are reported
//! in [`CodeOutput::errors`] and the rest of the tree is still encoded.

pub mod action_replay;
pub mod byte_dump;
pub mod gecko;
pub mod replay;
pub mod runlength;

pub use action_replay::ActionReplayWriter;
pub use byte_dump::ByteDumpWriter;
pub use gecko::GeckoWriter;
pub use runlength::{plan_writes, FillLimits, WriteRecord};

use crate::ir::CodeBlock;
use std::fmt;

/// Addresses are emitted modulo 2^25.
pub const ADDRESS_MASK: u32 = 0x01FF_FFFF;

/// Lines, warnings and errors produced by one writer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeOutput {
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors were reported.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push_record(&mut self, left: u32, right: u32) {
        self.lines.push(record(left, right));
    }

    /// Takes over the diagnostics of a nested run, leaving its lines alone.
    pub(crate) fn absorb_diagnostics(&mut self, nested: &mut CodeOutput) {
        self.warnings.append(&mut nested.warnings);
        self.errors.append(&mut nested.errors);
    }
}

/// A tree visitor producing cheat-code text.
pub trait CodeWriter {
    fn name(&self) -> &'static str;

    fn write(&self, block: &CodeBlock) -> CodeOutput;
}

/// The output encodings a caller can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    ActionReplay,
    Gecko,
    Bytes,
}

impl Dialect {
    pub fn writer(self) -> Box<dyn CodeWriter> {
        match self {
            Dialect::ActionReplay => Box::new(ActionReplayWriter::new()),
            Dialect::Gecko => Box::new(GeckoWriter::new()),
            Dialect::Bytes => Box::new(ByteDumpWriter::new()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::ActionReplay => "action-replay",
            Dialect::Gecko => "gecko",
            Dialect::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

/// Formats one record line.
pub fn record(left: u32, right: u32) -> String {
    format!("{left:08X} {right:08X}")
}

/// Record type in bits 24..31, masked address below it.
pub fn code_word(code_type: u32, address: u32) -> u32 {
    (code_type << 24) | (address & ADDRESS_MASK)
}
