//! PowerPC encoding table.
//!
//! - [`encoder`] - instruction mnemonics to 32-bit words
//! - [`data`] - typed data declarations to raw bytes

pub mod data;
pub mod encoder;

pub use data::{encode_data, DataKind};
pub use encoder::{InstructionEncoder, PpcEncoder};
