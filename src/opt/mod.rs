//! IR to IR optimizer passes.
//!
//! Passes (in the standard order):
//! 1. `Flatten`            - splice `MultiUnit` contents into their parent
//! 2. `WriteDataOptimizer` - merge contiguous writes, then realign them
//!
//! Passes are total: they never fail on a well-formed tree.

pub mod flatten;
pub mod write_data;

pub use flatten::Flatten;
pub use write_data::WriteDataOptimizer;

use crate::ir::CodeBlock;
use log::debug;

/// A structural transformation of a `CodeBlock`.
///
/// Passes must be deterministic and idempotent: running a pass on its own
/// output returns the same tree.
pub trait Pass {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &'static str;

    fn run(&self, block: CodeBlock) -> CodeBlock;
}

/// An explicit, ordered list of passes.
///
/// Passes run in the order they were registered.
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    /// A pipeline that leaves the tree unchanged.
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Flatten, then merge-and-realign.
    pub fn standard() -> Self {
        let mut pipeline = Self::empty();
        pipeline.add_pass(Flatten);
        pipeline.add_pass(WriteDataOptimizer);
        pipeline
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn run(&self, block: CodeBlock) -> CodeBlock {
        self.passes.iter().fold(block, |block, pass| {
            let before = block.len();
            let block = pass.run(block);
            debug!(
                "pass {}: {} -> {} top-level unit(s)",
                pass.name(),
                before,
                block.len()
            );
            block
        })
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
