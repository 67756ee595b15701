/// Fixed-size tape of signed cells with a single data pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tape {
    cells: Vec<i8>,
    pointer: usize,
}

impl Tape {
    /// A tape always has at least one cell.
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![0; capacity.max(1)],
            pointer: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    pub fn head(&self) -> i8 {
        self.cells[self.pointer]
    }

    pub fn head_mut(&mut self) -> &mut i8 {
        &mut self.cells[self.pointer]
    }

    /// Moves the pointer one cell right. Returns `false` and leaves the pointer
    /// in place if that would leave the tape.
    pub fn forward(&mut self) -> bool {
        if self.pointer + 1 >= self.cells.len() {
            return false;
        }
        self.pointer += 1;
        true
    }

    /// Moves the pointer one cell left. Returns `false` at cell 0.
    pub fn backward(&mut self) -> bool {
        let Some(pointer) = self.pointer.checked_sub(1) else {
            return false;
        };
        self.pointer = pointer;
        true
    }
}

#[test]
fn test_tape_edges() {
    let mut tape = Tape::new(2);
    assert!(!tape.backward());
    assert!(tape.forward());
    assert!(!tape.forward());
    assert_eq!(tape.pointer(), 1);
    assert!(tape.backward());
    assert_eq!(tape.pointer(), 0);
}

#[test]
fn test_head_wraps() {
    let mut tape = Tape::new(1);
    *tape.head_mut() = tape.head().wrapping_sub(1);
    assert_eq!(tape.head(), -1);
    *tape.head_mut() = i8::MAX;
    *tape.head_mut() = tape.head().wrapping_add(1);
    assert_eq!(tape.head(), i8::MIN);
}
