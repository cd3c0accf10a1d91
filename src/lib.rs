//! cheatasm - PowerPC assembly to cheat codes.
//!
//! Source lines mixing PowerPC instructions, typed data declarations and
//! patch directives are assembled into an address-annotated IR tree,
//! rewritten by a pipeline of optimizer passes, and written out as
//! Action Replay or Gecko cheat-code lines.
//!
//! # Primary Usage
//!
//! ```
//! use cheatasm::{Dialect, Session};
//!
//! let session = Session::new(Dialect::ActionReplay);
//! let output = session.compile(&["!repeat 3", ".u8 0xAB", "!end"])?;
//! assert_eq!(output.lines, vec!["00000000 000003AB"]);
//! # Ok::<(), cheatasm::AsmError>(())
//! ```
//!
//! # Architecture
//!
//! - [`asm`] - line cursor, literals and the recursive-descent parser
//! - [`ppc`] - instruction and data encoding table
//! - [`ir`] - the IR tree
//! - [`opt`] - optimizer passes
//! - [`codegen`] - code writers for each dialect
//! - [`core`] - errors and sessions

pub mod asm;
pub mod codegen;
pub mod core;
pub mod ir;
pub mod opt;
pub mod ppc;

pub use asm::assemble;
pub use codegen::{CodeOutput, CodeWriter, Dialect};
pub use self::core::{AsmError, AsmResult, Session, SessionStats};
pub use ir::{CodeBlock, Unit};
pub use opt::PassPipeline;

/// Runs the standard pass pipeline over `block`.
pub fn optimize(block: CodeBlock) -> CodeBlock {
    PassPipeline::standard().run(block)
}

/// Writes `block` in `dialect`.
pub fn write_code(block: &CodeBlock, dialect: Dialect) -> CodeOutput {
    dialect.writer().write(block)
}
