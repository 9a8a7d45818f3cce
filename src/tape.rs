//! A tape that is unbounded in both directions, materialized one blank cell at a time as the
//! head walks past either end.

use crate::types::{Direction, BLANK_SYMBOL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<char>,
    head: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// A tape holding a single blank cell under the head.
    pub fn new() -> Self {
        Self {
            cells: vec![BLANK_SYMBOL],
            head: 0,
        }
    }

    /// A tape with one cell per character of `content` and the head on the first cell.
    /// Empty content gives a single blank cell.
    pub fn from_content(content: &str) -> Self {
        let cells: Vec<char> = content.chars().collect();
        if cells.is_empty() {
            return Self::new();
        }
        Self { cells, head: 0 }
    }

    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    pub fn write(&mut self, symbol: char) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head, growing the tape when it steps past either end. Growing to the left
    /// shifts every cell, so the head stays at index 0 on the new cell.
    pub fn move_head(&mut self, direction: Direction) {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    self.cells.insert(0, BLANK_SYMBOL);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                if self.head + 1 == self.cells.len() {
                    self.cells.push(BLANK_SYMBOL);
                }
                self.head += 1;
            }
            Direction::Stay => {}
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Renders `width` cells centered on the head, padding with blanks where the tape has
    /// not been materialized.
    pub fn window(&self, width: usize) -> String {
        let start = self.head as isize - (width / 2) as isize;

        (0..width as isize)
            .map(|offset| {
                usize::try_from(start + offset)
                    .ok()
                    .and_then(|index| self.cells.get(index))
                    .copied()
                    .unwrap_or(BLANK_SYMBOL)
            })
            .collect()
    }

    /// Every materialized cell, left to right.
    pub fn contents(&self) -> String {
        self.cells.iter().collect()
    }
}
