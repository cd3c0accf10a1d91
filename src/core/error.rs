// This module defines the error type for cheatasm using the thiserror crate. AsmError
// covers the three ways assembly can fail: an unknown mnemonic, directive or data kind
// (UnsupportedOperation), a literal that is not a valid integer or float
// (MalformedLiteral), and an operand with the wrong register syntax or count
// (MalformedOperand). Each variant carries the offending token. All of them are fatal:
// the parser aborts the current assemble call and no partial IR is returned. Codegen
// problems are not errors at this level, writers report them as strings alongside
// their output instead.

//! Error types for the assembler.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Fatal assembly error. Carries the token that could not be handled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),

    #[error("Malformed operand: {0}")]
    MalformedOperand(String),
}

impl AsmError {
    pub(crate) fn unsupported(token: impl Into<String>) -> Self {
        AsmError::UnsupportedOperation(token.into())
    }

    pub(crate) fn literal(token: impl Into<String>) -> Self {
        AsmError::MalformedLiteral(token.into())
    }

    pub(crate) fn operand(token: impl Into<String>) -> Self {
        AsmError::MalformedOperand(token.into())
    }
}

/// Result type alias for assembly operations.
pub type AsmResult<T> = Result<T, AsmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_token() {
        let err = AsmError::unsupported("frobnicate");
        assert_eq!(err, AsmError::UnsupportedOperation("frobnicate".to_string()));
        assert_eq!(err.to_string(), "Unsupported operation: frobnicate");
        assert_eq!(
            AsmError::literal("0xZZ").to_string(),
            "Malformed literal: 0xZZ"
        );
    }
}
