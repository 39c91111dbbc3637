//! The memory tape: a fixed row of integer cells and a data pointer.
//!
//! The tape never grows. How it behaves at its right edge and how a cell
//! overflows are both chosen up front through [`EdgePolicy`] and [`CellMode`].

/// Default number of cells.
pub const DEFAULT_CAPACITY: usize = 30_000;

/// How cell values behave on increment, decrement, and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMode {
    /// Cells hold 0..=255 and wrap around.
    #[default]
    Byte,
    /// Cells hold any `i64`; they only wrap at the limits of `i64`.
    Unbounded,
}

impl CellMode {
    fn normalize(self, value: i64) -> i64 {
        match self {
            CellMode::Byte => value.rem_euclid(256),
            CellMode::Unbounded => value,
        }
    }
}

/// What the pointer does at the edges of the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Moves past either edge are ignored; the pointer stays in `0..capacity`.
    #[default]
    Clamp,
    /// Moves past either edge are refused and reported.
    Error,
    /// Left edge clamps; the pointer may step one past the last cell, onto an
    /// extra cell that behaves like any other.
    Overhang,
}

/// A refused pointer move, carrying the pointer it was refused at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub ptr: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<i64>,
    pointer: usize,
    capacity: usize,
    mode: CellMode,
    edge: EdgePolicy,
}

impl Tape {
    /// A zeroed tape with `capacity` cells (at least one) and default policies.
    pub fn new(capacity: usize) -> Self {
        Self::with_policies(capacity, CellMode::default(), EdgePolicy::default())
    }

    pub fn with_policies(capacity: usize, mode: CellMode, edge: EdgePolicy) -> Self {
        let capacity = capacity.max(1);
        let len = match edge {
            EdgePolicy::Overhang => capacity + 1,
            EdgePolicy::Clamp | EdgePolicy::Error => capacity,
        };
        Self {
            cells: vec![0; len],
            pointer: 0,
            capacity,
            mode,
            edge,
        }
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mode(&self) -> CellMode {
        self.mode
    }

    /// All cells, including the overhang cell when [`EdgePolicy::Overhang`] is in use.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Value of the cell at `index`; indices past the end read as 0.
    pub fn cell(&self, index: usize) -> i64 {
        self.cells.get(index).copied().unwrap_or(0)
    }

    pub fn move_left(&mut self) -> Result<(), OutOfRange> {
        if self.pointer > 0 {
            self.pointer -= 1;
            Ok(())
        } else if self.edge == EdgePolicy::Error {
            Err(OutOfRange { ptr: self.pointer })
        } else {
            Ok(())
        }
    }

    pub fn move_right(&mut self) -> Result<(), OutOfRange> {
        // Overhang lets the pointer reach `capacity` itself.
        let last = self.cells.len() - 1;
        if self.pointer < last {
            self.pointer += 1;
            Ok(())
        } else if self.edge == EdgePolicy::Error {
            Err(OutOfRange { ptr: self.pointer })
        } else {
            Ok(())
        }
    }

    pub fn increment(&mut self) {
        let value = self.read().wrapping_add(1);
        self.write(value);
    }

    pub fn decrement(&mut self) {
        let value = self.read().wrapping_sub(1);
        self.write(value);
    }

    pub fn read(&self) -> i64 {
        self.cells[self.pointer]
    }

    pub fn write(&mut self, value: i64) {
        self.cells[self.pointer] = self.mode.normalize(value);
    }

    /// Cells around the pointer as `(base, window)`, page-aligned to `size`.
    pub fn window(&self, size: usize) -> (usize, &[i64]) {
        let size = size.max(1);
        let base = self.pointer - self.pointer % size;
        let end = (base + size).min(self.cells.len());
        (base, &self.cells[base..end])
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tape_is_zeroed() {
        let tape = Tape::default();
        assert_eq!(tape.capacity(), DEFAULT_CAPACITY);
        assert_eq!(tape.pointer(), 0);
        assert!(tape.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn move_left_at_zero_is_a_noop() {
        let mut tape = Tape::new(4);
        assert!(tape.move_left().is_ok());
        assert_eq!(tape.pointer(), 0);
    }

    #[test]
    fn clamp_stops_at_last_cell() {
        let mut tape = Tape::new(3);
        for _ in 0..10 {
            tape.move_right().unwrap();
        }
        assert_eq!(tape.pointer(), 2);
    }

    #[test]
    fn overhang_reaches_capacity_and_stores_there() {
        let mut tape = Tape::with_policies(3, CellMode::Byte, EdgePolicy::Overhang);
        for _ in 0..10 {
            tape.move_right().unwrap();
        }
        assert_eq!(tape.pointer(), 3);
        tape.increment();
        assert_eq!(tape.read(), 1);
        assert_eq!(tape.cells().len(), 4);
    }

    #[test]
    fn error_policy_refuses_both_edges() {
        let mut tape = Tape::with_policies(2, CellMode::Byte, EdgePolicy::Error);
        assert_eq!(tape.move_left(), Err(OutOfRange { ptr: 0 }));
        tape.move_right().unwrap();
        assert_eq!(tape.move_right(), Err(OutOfRange { ptr: 1 }));
    }

    #[test]
    fn byte_cells_wrap() {
        let mut tape = Tape::new(1);
        tape.decrement();
        assert_eq!(tape.read(), 255);
        tape.increment();
        assert_eq!(tape.read(), 0);
        tape.write(300);
        assert_eq!(tape.read(), 44);
    }

    #[test]
    fn unbounded_cells_go_negative_and_past_255() {
        let mut tape = Tape::with_policies(1, CellMode::Unbounded, EdgePolicy::Clamp);
        tape.decrement();
        assert_eq!(tape.read(), -1);
        tape.write(1000);
        tape.increment();
        assert_eq!(tape.read(), 1001);
    }

    #[test]
    fn window_is_page_aligned() {
        let mut tape = Tape::new(20);
        for _ in 0..9 {
            tape.move_right().unwrap();
        }
        let (base, window) = tape.window(4);
        assert_eq!(base, 8);
        assert_eq!(window.len(), 4);
    }
}
