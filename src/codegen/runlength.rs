// This module plans how a single WriteData payload is broken into cheat-code write
// records. The planner scans left to right and at every position picks the first rule
// that applies: a byte fill for runs of five or more identical bytes (rounded down to a
// multiple of four so the following records stay word aligned), a halfword fill for a
// repeating two byte pattern longer than one word, or a plain 32-bit word. Once fewer
// than four bytes are left, three identical bytes become one byte fill and anything else
// becomes a 16-bit record and/or an 8-bit record. Heads that are not word aligned, which
// only happen on unoptimized input, are written with 8- and 16-bit records until the
// address is a multiple of four. The planner is dialect neutral; each writer formats the
// resulting records with its own type codes and count conventions, and caps fill counts
// to what its count field can hold.

//! Run-length planning of write payloads.

use crate::ir::WriteData;

/// One planned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRecord {
    /// `value` repeated `count` times starting at `address`.
    Byte { address: u32, value: u8, count: u32 },
    /// `value` repeated `count` times starting at an even `address`.
    Half { address: u32, value: u16, count: u32 },
    Word { address: u32, value: u32 },
}

impl WriteRecord {
    /// Number of payload bytes covered.
    pub fn len(&self) -> usize {
        match *self {
            WriteRecord::Byte { count, .. } => count as usize,
            WriteRecord::Half { count, .. } => count as usize * 2,
            WriteRecord::Word { .. } => 4,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Largest repetition counts a dialect's fill records can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillLimits {
    pub max_bytes: u32,
    pub max_halves: u32,
}

pub fn plan_writes(data: &WriteData, limits: FillLimits) -> Vec<WriteRecord> {
    let bytes = &data.bytes;
    let base = data.address as u32;
    let mut records = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let address = base.wrapping_add(pos as u32);
        let rest = &bytes[pos..];

        let record = if rest.len() >= 4 {
            plan_body(address, rest, limits)
        } else {
            plan_tail(address, rest)
        };

        log::trace!("planned {:?}", record);
        pos += record.len();
        records.push(record);
    }

    records
}

fn plan_body(address: u32, rest: &[u8], limits: FillLimits) -> WriteRecord {
    if address % 2 != 0 {
        return WriteRecord::Byte { address, value: rest[0], count: 1 };
    }
    if address % 4 != 0 {
        return WriteRecord::Half { address, value: half(rest), count: 1 };
    }

    if rest.len() >= 5 {
        let run = byte_run(rest);
        let len = run.min(limits.max_bytes as usize) & !3;
        if run >= 5 && len >= 4 {
            return WriteRecord::Byte { address, value: rest[0], count: len as u32 };
        }
    }

    let run = half_run(rest);
    let mut len = if run == rest.len() { run } else { run & !3 };
    let cap = limits.max_halves as usize * 2;
    if len > cap {
        len = cap & !3;
    }
    if len > 4 {
        return WriteRecord::Half { address, value: half(rest), count: (len / 2) as u32 };
    }

    WriteRecord::Word {
        address,
        value: u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]),
    }
}

fn plan_tail(address: u32, rest: &[u8]) -> WriteRecord {
    match rest {
        [a, b, c] if a == b && b == c => WriteRecord::Byte { address, value: *a, count: 3 },
        [_, _, ..] if address % 2 == 0 => WriteRecord::Half { address, value: half(rest), count: 1 },
        _ => WriteRecord::Byte { address, value: rest[0], count: 1 },
    }
}

fn half(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Length of the leading run of identical bytes.
fn byte_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| b == bytes[0]).count()
}

/// Length of the leading run that repeats the first two bytes, in whole halfwords.
fn half_run(bytes: &[u8]) -> usize {
    let mut n = 2.min(bytes.len());
    while n < bytes.len() && bytes[n] == bytes[n - 2] {
        n += 1;
    }
    n & !1
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: FillLimits = FillLimits { max_bytes: 0xFF_FFFF, max_halves: 0xFFFF };

    fn plan(address: i32, bytes: &[u8]) -> Vec<WriteRecord> {
        plan_writes(&WriteData::new(address, bytes.to_vec()), LIMITS)
    }

    #[test]
    fn test_word_then_tail() {
        assert_eq!(
            plan(0, &[1, 2, 3, 4, 5, 6, 7]),
            vec![
                WriteRecord::Word { address: 0, value: 0x0102_0304 },
                WriteRecord::Half { address: 4, value: 0x0506, count: 1 },
                WriteRecord::Byte { address: 6, value: 7, count: 1 },
            ]
        );
    }

    #[test]
    fn test_three_identical_bytes() {
        assert_eq!(
            plan(0, &[0xAB; 3]),
            vec![WriteRecord::Byte { address: 0, value: 0xAB, count: 3 }]
        );
    }

    #[test]
    fn test_byte_fill_is_word_aligned() {
        assert_eq!(
            plan(0x100, &[0xEE; 11]),
            vec![
                WriteRecord::Byte { address: 0x100, value: 0xEE, count: 8 },
                WriteRecord::Byte { address: 0x108, value: 0xEE, count: 3 },
            ]
        );
        assert_eq!(
            plan(0, &[9, 9, 9, 9, 9, 1, 2, 3]),
            vec![
                WriteRecord::Byte { address: 0, value: 9, count: 4 },
                WriteRecord::Word { address: 4, value: 0x0901_0203 },
            ]
        );
    }

    #[test]
    fn test_half_fill() {
        assert_eq!(
            plan(0, &[0x12, 0x34, 0x12, 0x34, 0x12, 0x34]),
            vec![WriteRecord::Half { address: 0, value: 0x1234, count: 3 }]
        );
        // Not at the end: rounded to whole words.
        assert_eq!(
            plan(0, &[0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 1, 2]),
            vec![
                WriteRecord::Half { address: 0, value: 0x1234, count: 4 },
                WriteRecord::Word { address: 8, value: 0x1234_0102 },
            ]
        );
    }

    #[test]
    fn test_single_word_is_not_a_fill() {
        assert_eq!(
            plan(0, &[0, 0, 0, 0]),
            vec![WriteRecord::Word { address: 0, value: 0 }]
        );
    }

    #[test]
    fn test_misaligned_head() {
        assert_eq!(
            plan(1, &[1, 2, 3, 4, 5, 6, 7, 8]),
            vec![
                WriteRecord::Byte { address: 1, value: 1, count: 1 },
                WriteRecord::Half { address: 2, value: 0x0203, count: 1 },
                WriteRecord::Word { address: 4, value: 0x0405_0607 },
                WriteRecord::Byte { address: 8, value: 8, count: 1 },
            ]
        );
    }

    #[test]
    fn test_fill_limits_are_respected() {
        let limits = FillLimits { max_bytes: 8, max_halves: 4 };
        let records = plan_writes(&WriteData::new(0, vec![7; 20]), limits);
        assert_eq!(
            records,
            vec![
                WriteRecord::Byte { address: 0, value: 7, count: 8 },
                WriteRecord::Byte { address: 8, value: 7, count: 8 },
                WriteRecord::Word { address: 16, value: 0x0707_0707 },
            ]
        );
    }
}
