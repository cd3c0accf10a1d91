//! Line lexing and literal parsing.
//!
//! Tokens are separated by whitespace, commas and parentheses, which makes
//! the register-offset syntax `8(r4)` come apart as `8`, `r4`.

use crate::core::error::{AsmError, AsmResult};

/// Removes a trailing `;` comment. Semicolons inside double quotes are kept.
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == ';' {
            return &line[..idx];
        }
    }
    line
}

pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == ')')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parses a decimal, `0x` hexadecimal or `0b` binary integer with an
/// optional sign. Hex and binary literals may use the full 64 bits.
pub fn parse_int(token: &str) -> AsmResult<i64> {
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let lowered = body.to_ascii_lowercase();
    let magnitude = if let Some(hex) = lowered.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lowered.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if !lowered.is_empty() && lowered.bytes().all(|b| b.is_ascii_digit()) {
        lowered.parse::<u64>().ok()
    } else {
        None
    };

    let magnitude = magnitude.ok_or_else(|| AsmError::literal(token))?;
    Ok(if negative {
        (magnitude as i64).wrapping_neg()
    } else {
        magnitude as i64
    })
}

pub fn parse_float(token: &str) -> AsmResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| AsmError::literal(token))
}

/// Parses a double-quoted string literal. Supports `\n \t \r \0 \\ \"`.
pub fn parse_string(text: &str) -> AsmResult<String> {
    let inner = text
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| AsmError::literal(text.trim()))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            return Err(AsmError::literal(text.trim()));
        }
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            _ => return Err(AsmError::literal(text.trim())),
        };
        out.push(escaped);
    }
    Ok(out)
}
