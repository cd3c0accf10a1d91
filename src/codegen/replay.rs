//! Decodes write records back into the memory image they produce.
//!
//! Used to check that two encodings of the same program are equivalent.
//! Only unconditional writes are understood; any other record is an error.

use super::{Dialect, ADDRESS_MASK};
use crate::ir::WriteData;
use std::collections::BTreeMap;
use thiserror::Error;

/// Address to byte value.
pub type MemoryImage = BTreeMap<u32, u8>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Malformed record line: {0}")]
    MalformedLine(String),

    #[error("Record type 0x{code_type:02X} cannot be replayed: {line}")]
    UnsupportedRecord { code_type: u32, line: String },

    #[error("String write at 0x{address:08X} is missing payload lines")]
    TruncatedPayload { address: u32 },

    #[error("Dialect {0} has no write records")]
    UnsupportedDialect(Dialect),
}

pub fn replay<S: AsRef<str>>(dialect: Dialect, lines: &[S]) -> Result<MemoryImage, ReplayError> {
    if dialect == Dialect::Bytes {
        return Err(ReplayError::UnsupportedDialect(dialect));
    }

    let mut image = MemoryImage::new();
    let mut lines = lines.iter().map(|line| line.as_ref());

    while let Some(line) = lines.next() {
        let (left, right) = parse_record(line)?;
        // Bit 24 belongs to the address.
        let code_type = (left >> 24) & 0xFE;
        let address = left & ADDRESS_MASK;

        match (dialect, code_type) {
            (_, 0x04) => fill(&mut image, address, &right.to_be_bytes(), 1),
            (Dialect::ActionReplay, 0x00) => {
                let count = total_count((right >> 8) & 0x00FF_FFFF);
                fill(&mut image, address, &[right as u8], count);
            }
            (Dialect::ActionReplay, 0x02) => {
                let count = total_count(right >> 16);
                fill(&mut image, address, &(right as u16).to_be_bytes(), count);
            }
            (Dialect::Gecko, 0x00) => {
                fill(&mut image, address, &[right as u8], (right >> 16) + 1);
            }
            (Dialect::Gecko, 0x02) => {
                fill(&mut image, address, &(right as u16).to_be_bytes(), (right >> 16) + 1);
            }
            (Dialect::Gecko, 0x06) => {
                let len = right as usize;
                let mut payload = Vec::with_capacity(len.div_ceil(8) * 8);
                for _ in 0..len.div_ceil(8) {
                    let line = lines
                        .next()
                        .ok_or(ReplayError::TruncatedPayload { address })?;
                    let (hi, lo) = parse_record(line)?;
                    payload.extend_from_slice(&hi.to_be_bytes());
                    payload.extend_from_slice(&lo.to_be_bytes());
                }
                fill(&mut image, address, &payload[..len], 1);
            }
            _ => {
                return Err(ReplayError::UnsupportedRecord {
                    code_type,
                    line: line.to_string(),
                })
            }
        }
    }

    Ok(image)
}

/// The image a single write should produce once encoded.
pub fn image_of(data: &WriteData) -> MemoryImage {
    let mut image = MemoryImage::new();
    fill(&mut image, data.address as u32 & ADDRESS_MASK, &data.bytes, 1);
    image
}

/// Action Replay stores 0 for a single write.
fn total_count(field: u32) -> u32 {
    field.max(1)
}

fn fill(image: &mut MemoryImage, address: u32, pattern: &[u8], count: u32) {
    let mut at = address;
    for _ in 0..count {
        for &byte in pattern {
            image.insert(at & ADDRESS_MASK, byte);
            at = at.wrapping_add(1);
        }
    }
}

fn parse_record(line: &str) -> Result<(u32, u32), ReplayError> {
    let malformed = || ReplayError::MalformedLine(line.to_string());
    let (left, right) = line.trim().split_once(' ').ok_or_else(malformed)?;
    if left.len() != 8 || right.len() != 8 {
        return Err(malformed());
    }
    let left = u32::from_str_radix(left, 16).map_err(|_| malformed())?;
    let right = u32::from_str_radix(right, 16).map_err(|_| malformed())?;
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_action_replay_fills() {
        let image = replay(Dialect::ActionReplay, &["00000000 000003AB", "02000010 00001234"])
            .unwrap();
        let expected: MemoryImage =
            [(0, 0xAB), (1, 0xAB), (2, 0xAB), (0x10, 0x12), (0x11, 0x34)].into_iter().collect();
        assert_eq!(image, expected);
    }

    #[test]
    fn test_replay_gecko_string_write() {
        let image = replay(
            Dialect::Gecko,
            &["06000100 00000005", "01020304 05000000"],
        )
        .unwrap();
        assert_eq!(image, image_of(&WriteData::new(0x100, vec![1, 2, 3, 4, 5])));
    }

    #[test]
    fn test_replay_high_address_bit() {
        let image = replay(Dialect::Gecko, &["01000000 00000007"]).unwrap();
        assert_eq!(image.get(&0x0100_0000), Some(&7));
    }

    #[test]
    fn test_replay_errors() {
        assert_eq!(
            replay(Dialect::Gecko, &["06000100 00000009", "01020304 05060708"]),
            Err(ReplayError::TruncatedPayload { address: 0x100 })
        );
        assert!(matches!(
            replay(Dialect::ActionReplay, &["0C000100 00000001"]),
            Err(ReplayError::UnsupportedRecord { code_type: 0x0C, .. })
        ));
        assert!(matches!(
            replay(Dialect::Gecko, &["nonsense"]),
            Err(ReplayError::MalformedLine(_))
        ));
        assert_eq!(
            replay::<&str>(Dialect::Bytes, &[]),
            Err(ReplayError::UnsupportedDialect(Dialect::Bytes))
        );
    }
}
