//! Source text to IR.
//!
//! # Source format
//!
//! ```text
//! ; Comments start with semicolon
//! 0x80001000:            ; label: move the instruction pointer
//! li r3, 1               ; instruction, aligned to 4 bytes
//! .u16 0xBEEF, 0xCAFE    ; typed data
//! !u32 equal 0x1234      ; conditional, body runs to !end
//!     .u8 0xFF
//! !end
//! !repeat 3              ; unrolled body
//!     .u8 0xAB
//! !end
//! !u16 add 1             ; read-modify-write
//! ```

pub mod cursor;
pub mod literal;
pub mod parser;

pub use cursor::{InstructionPointer, LineCursor};
pub use parser::{assemble, Assembler};
