// This module ties the stages together. A Session owns the configuration of one
// assembler run: the pass pipeline that rewrites the tree and the code writer that turns
// the optimized tree into cheat-code lines. compile() assembles the source lines, runs
// the pipeline, hands the result to the writer and returns the writer's lines, warnings
// and errors. Assembly errors are fatal and returned as Err; writer diagnostics never
// are. SessionStats counts what went through the session (source lines, units before
// and after optimization, output lines and diagnostics) and is logged at debug level
// after every compile so a run can be inspected with RUST_LOG=debug.

//! Assembler sessions and their statistics.

use crate::asm::Assembler;
use crate::codegen::{CodeOutput, CodeWriter, Dialect};
use crate::core::error::AsmResult;
use crate::ir::{CodeBlock, Unit};
use crate::opt::PassPipeline;
use crate::ppc::{InstructionEncoder, PpcEncoder};
use std::cell::RefCell;
use std::fmt;

/// One configured assembler: encoder, pass pipeline and code writer.
pub struct Session {
    writer: Box<dyn CodeWriter>,
    pipeline: PassPipeline,
    encoder: Box<dyn InstructionEncoder>,
    stats: RefCell<SessionStats>,
}

impl Session {
    /// A session writing `dialect` with the standard pass pipeline.
    pub fn new(dialect: Dialect) -> Self {
        Self::with_writer(dialect.writer())
    }

    pub fn with_writer(writer: Box<dyn CodeWriter>) -> Self {
        Self {
            writer,
            pipeline: PassPipeline::standard(),
            encoder: Box::new(PpcEncoder),
            stats: RefCell::new(SessionStats::default()),
        }
    }

    pub fn with_pipeline(mut self, pipeline: PassPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn InstructionEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn writer_name(&self) -> &'static str {
        self.writer.name()
    }

    /// Assembles and optimizes `lines` without writing code.
    pub fn build<S: AsRef<str>>(&self, lines: &[S]) -> AsmResult<CodeBlock> {
        let raw = Assembler::new(self.encoder.as_ref()).assemble(lines)?;
        let raw_units = count_units(&raw.units);
        let optimized = self.pipeline.run(raw);

        let mut stats = self.stats.borrow_mut();
        stats.lines_read += lines.len();
        stats.units_assembled += raw_units;
        stats.units_optimized += count_units(&optimized.units);
        Ok(optimized)
    }

    /// Runs every stage on `lines`.
    pub fn compile<S: AsRef<str>>(&self, lines: &[S]) -> AsmResult<CodeOutput> {
        let block = self.build(lines)?;
        let output = self.writer.write(&block);

        {
            let mut stats = self.stats.borrow_mut();
            stats.programs_compiled += 1;
            stats.output_lines += output.lines.len();
            stats.warnings += output.warnings.len();
            stats.errors += output.errors.len();
        }
        log::debug!("{} session:\n{}", self.writer.name(), self.stats());

        Ok(output)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Counts units at every depth, including the containers themselves.
fn count_units(units: &[Unit]) -> usize {
    units
        .iter()
        .map(|unit| {
            1 + match unit {
                Unit::CodeBlock(block) => count_units(&block.units),
                Unit::MultiUnit(inner) => count_units(inner),
                Unit::Conditional(cond) => count_units(&cond.body.units),
                Unit::WriteData(_) | Unit::Arithmetic(_) => 0,
            }
        })
        .sum()
}

/// Session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Calls to `compile` that got past assembly.
    pub programs_compiled: usize,

    /// Source lines handed to the assembler, blank and comment lines included.
    pub lines_read: usize,

    pub units_assembled: usize,

    /// Units left after the pass pipeline.
    pub units_optimized: usize,

    pub output_lines: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Assembler Session Statistics:")?;
        writeln!(f, "  Programs compiled: {}", self.programs_compiled)?;
        writeln!(f, "  Source lines: {}", self.lines_read)?;
        writeln!(
            f,
            "  Units: {} assembled, {} after optimization",
            self.units_assembled, self.units_optimized
        )?;
        writeln!(f, "  Output lines: {}", self.output_lines)?;
        writeln!(f, "  Warnings: {}", self.warnings)?;
        write!(f, "  Errors: {}", self.errors)
    }
}
