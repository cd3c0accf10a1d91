//! Parser cursors: the remaining-lines cursor and the instruction pointer.
//!
//! Both are owned by the outermost assemble call and lent by `&mut` to
//! every nested parse. `LineCursor` deliberately does not implement
//! `Clone`; the only way to get a second cursor is [`LineCursor::fork_view`],
//! which makes every non-destructive read visible at the call site.

/// Cursor over the not-yet-consumed source lines.
#[derive(Debug)]
pub struct LineCursor<'a, S> {
    lines: &'a [S],
    pos: usize,
}

impl<'a, S: AsRef<str>> LineCursor<'a, S> {
    pub fn new(lines: &'a [S]) -> Self {
        Self { lines, pos: 0 }
    }

    /// An independent cursor at the same position. Consuming lines from the
    /// fork leaves `self` untouched.
    pub fn fork_view(&self) -> LineCursor<'a, S> {
        LineCursor {
            lines: self.lines,
            pos: self.pos,
        }
    }

    /// Consumes the next line, returning its 1-based line number and text.
    pub fn advance_real(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line.as_ref()))
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Number of lines not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lines.len().saturating_sub(self.pos)
    }
}

/// The assembler's address cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionPointer {
    value: i32,
}

impl InstructionPointer {
    pub fn new(value: i32) -> Self {
        Self { value }
    }

    pub fn get(&self) -> i32 {
        self.value
    }

    pub fn set(&mut self, value: i32) {
        self.value = value;
    }

    pub fn advance(&mut self, bytes: usize) {
        self.value = self.value.wrapping_add(bytes as i32);
    }

    /// Rounds up to the next multiple of `alignment` (a power of two).
    pub fn align_up(&mut self, alignment: u32) {
        debug_assert!(alignment.is_power_of_two());
        let mask = alignment - 1;
        self.value = ((self.value as u32).wrapping_add(mask) & !mask) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_view_does_not_move_real_cursor() {
        let lines = ["a", "b", "c"];
        let mut cursor = LineCursor::new(&lines);
        assert_eq!(cursor.advance_real(), Some((1, "a")));

        let mut fork = cursor.fork_view();
        assert_eq!(fork.advance_real(), Some((2, "b")));
        assert_eq!(fork.advance_real(), Some((3, "c")));
        assert!(fork.is_exhausted());

        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.advance_real(), Some((2, "b")));
    }

    #[test]
    fn test_instruction_pointer_alignment() {
        let mut ip = InstructionPointer::new(1);
        ip.align_up(4);
        assert_eq!(ip.get(), 4);
        ip.align_up(4);
        assert_eq!(ip.get(), 4);
        ip.advance(3);
        ip.align_up(2);
        assert_eq!(ip.get(), 8);

        let mut high = InstructionPointer::new(0x8000_1001u32 as i32);
        high.align_up(4);
        assert_eq!(high.get() as u32, 0x8000_1004);
    }
}
