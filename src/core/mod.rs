//! Shared infrastructure.
//!
//! - [`error`] - the assembler error type
//! - [`session`] - one configured assembler run and its statistics

pub mod error;
pub mod session;

pub use error::{AsmError, AsmResult};
pub use session::{Session, SessionStats};
