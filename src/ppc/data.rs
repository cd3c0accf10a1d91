//! Typed data declarations (`.u32 1, 2`, `.f32 1.5`, `.str "text"`).

use crate::asm::literal::{parse_float, parse_int, parse_string, tokenize};
use crate::core::error::{AsmError, AsmResult};

/// Kind named by a data directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F32,
    F64,
    Str,
}

impl DataKind {
    pub fn from_str(s: &str) -> Option<Self> {
        let kind = match s {
            "u8" => DataKind::U8,
            "u16" => DataKind::U16,
            "u32" => DataKind::U32,
            "u64" => DataKind::U64,
            "s8" => DataKind::S8,
            "s16" => DataKind::S16,
            "s32" => DataKind::S32,
            "s64" => DataKind::S64,
            "f32" => DataKind::F32,
            "f64" => DataKind::F64,
            "str" => DataKind::Str,
            _ => return None,
        };
        Some(kind)
    }

    /// Encoded size of one literal, `None` for strings.
    pub const fn element_size(self) -> Option<usize> {
        match self {
            DataKind::U8 | DataKind::S8 => Some(1),
            DataKind::U16 | DataKind::S16 => Some(2),
            DataKind::U32 | DataKind::S32 | DataKind::F32 => Some(4),
            DataKind::U64 | DataKind::S64 | DataKind::F64 => Some(8),
            DataKind::Str => None,
        }
    }
}

/// Encodes the argument text of a data directive into big-endian bytes.
///
/// Integer and float kinds take one or more literals; integers are
/// truncated to the element width. `.str` takes a single quoted string.
pub fn encode_data(kind: DataKind, args: &str) -> AsmResult<Vec<u8>> {
    if kind == DataKind::Str {
        return Ok(parse_string(args)?.into_bytes());
    }

    let tokens = tokenize(args);
    if tokens.is_empty() {
        return Err(AsmError::literal(args.trim()));
    }

    let mut bytes = Vec::new();
    for token in tokens {
        match kind {
            DataKind::F32 => bytes.extend_from_slice(&(parse_float(token)? as f32).to_be_bytes()),
            DataKind::F64 => bytes.extend_from_slice(&parse_float(token)?.to_be_bytes()),
            _ => {
                let value = parse_int(token)?.to_be_bytes();
                let size = kind.element_size().unwrap_or(8);
                bytes.extend_from_slice(&value[8 - size..]);
            }
        }
    }
    Ok(bytes)
}
