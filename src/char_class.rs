//! Character classes: the parsed value of one rule field.
//!
//! A field is either a bare token (`A`, `\,`, `-`) standing for exactly the characters it
//! spells, or a bracketed class (`[AB]`, `{0..9}`, `[^0]`) standing for a set of alternatives.
//! The bracket type decides the [`Channel`] the class advances in during rule expansion.

use crate::alphabet::{
    self, ALPHABET_LEN, ESCAPE, NEGATION, RANGE_MARKER, RANGE_MARKER_COUNT, SPACE_MARKER,
};
use crate::types::BLANK_SYMBOL;
use std::ops::Range;

/// Grouping channel of a bracketed class. Classes in the same channel advance in lockstep,
/// classes in different channels combine as a Cartesian product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// `[` ... `]`
    Square,
    /// `{` ... `}`
    Curly,
}

impl Channel {
    /// All channels, least significant digit of the expansion counter first.
    pub const ALL: [Channel; 2] = [Channel::Square, Channel::Curly];

    /// Returns the channel opened by `c`, if `c` is an opening delimiter.
    pub fn from_open(c: char) -> Option<Self> {
        match c {
            '[' => Some(Channel::Square),
            '{' => Some(Channel::Curly),
            _ => None,
        }
    }

    pub fn close(self) -> char {
        match self {
            Channel::Square => ']',
            Channel::Curly => '}',
        }
    }
}

/// One resolved entry of a class. Escaped entries (and entries produced by a range) are
/// always taken literally, so an escaped space marker stays a `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Item {
    ch: char,
    escaped: bool,
}

#[derive(Debug, Clone)]
pub struct CharClass {
    items: Vec<Item>,
    /// Membership table indexed by alphabet rank; present only for negated classes.
    excluded: Option<[bool; ALPHABET_LEN]>,
    channel: Option<Channel>,
    cursor: usize,
    len: usize,
}

impl CharClass {
    /// Parses the field spanning `span` in `line`.
    ///
    /// When the span starts with an opening delimiter it is read as a bracketed class and
    /// must end with the matching closing delimiter; the delimiters themselves are not part
    /// of the content. Otherwise the span is a bare token and only escapes are decoded.
    pub fn parse(line: &[char], span: Range<usize>) -> Self {
        let channel = line.get(span.start).copied().and_then(Channel::from_open);

        let mut class = match channel {
            Some(_) => Self::bracketed(line, span.start + 1..span.end.saturating_sub(1)),
            None => Self::token(line, span),
        };
        class.channel = channel;
        class.reset();
        class
    }

    fn token(line: &[char], span: Range<usize>) -> Self {
        let mut items = Vec::new();
        let mut i = span.start;

        while i < span.end {
            if line[i] == ESCAPE && i + 1 < span.end {
                items.push(Item {
                    ch: line[i + 1],
                    escaped: true,
                });
                i += 2;
            } else {
                items.push(Item {
                    ch: line[i],
                    escaped: false,
                });
                i += 1;
            }
        }

        let len = items.len();
        Self {
            items,
            excluded: None,
            channel: None,
            cursor: 0,
            len,
        }
    }

    fn bracketed(line: &[char], span: Range<usize>) -> Self {
        let Range { mut start, end } = span;

        let negate = start < end && line[start] == NEGATION;
        if negate {
            start += 1;
        }

        let items = scan_content(line, start, end);

        let (excluded, len) = if negate {
            let mut table = [false; ALPHABET_LEN];
            for item in &items {
                if let Some(rank) = alphabet::rank(item.ch) {
                    table[rank] = true;
                }
            }
            let len = table.iter().filter(|&&skip| !skip).count();
            (Some(table), len)
        } else {
            let len = items.len();
            (None, len)
        };

        Self {
            items,
            excluded,
            channel: None,
            cursor: 0,
            len,
        }
    }

    /// The channel this class advances in, `None` for a bare token.
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    /// Effective number of alternatives.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the class is the complement of its content against the alphabet.
    pub fn is_negated(&self) -> bool {
        self.excluded.is_some()
    }

    /// Rewinds the cursor to the first alternative.
    pub fn reset(&mut self) {
        self.cursor = match &self.excluded {
            Some(table) => next_included(table, 0),
            None => 0,
        };
    }

    /// Moves to the next alternative. Returns `false`, leaving the cursor at the end
    /// sentinel, when there is none.
    pub fn advance(&mut self) -> bool {
        if self.eof() {
            return false;
        }

        self.cursor = match &self.excluded {
            Some(table) => next_included(table, self.cursor + 1),
            None => self.cursor + 1,
        };

        !self.eof()
    }

    /// Whether the cursor sits on the end sentinel.
    pub fn eof(&self) -> bool {
        match self.excluded {
            Some(_) => self.cursor >= ALPHABET_LEN,
            None => self.cursor >= self.items.len(),
        }
    }

    /// Reads the current alternative as a tape symbol; an unescaped space marker is the blank.
    pub fn read_symbol(&self) -> Option<char> {
        self.read(true)
    }

    /// Reads the current alternative as a state character.
    pub fn read_state(&self) -> Option<char> {
        self.read(false)
    }

    /// Reads the current alternative as a direction glyph.
    pub fn read_dir(&self) -> Option<char> {
        self.read(false)
    }

    fn read(&self, blank_marker: bool) -> Option<char> {
        if self.is_negated() {
            return alphabet::char_at(self.cursor);
        }

        let item = self.items.get(self.cursor)?;
        if blank_marker && !item.escaped && item.ch == SPACE_MARKER {
            Some(BLANK_SYMBOL)
        } else {
            Some(item.ch)
        }
    }
}

/// Resolves escapes and ranges of bracketed content in `line[start..end]`.
fn scan_content(line: &[char], start: usize, end: usize) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    let mut i = start;

    while i < end {
        let c = line[i];

        if c == RANGE_MARKER && is_range_operator(line, i, start, end) {
            let (to, width) = match line[i + RANGE_MARKER_COUNT] {
                ESCAPE if i + RANGE_MARKER_COUNT + 1 < end => {
                    (line[i + RANGE_MARKER_COUNT + 1], 2)
                }
                to => (to, 1),
            };
            let from = line[i - 1];
            i += RANGE_MARKER_COUNT + width;

            // The lower bound is the character before the operator and was pushed already,
            // unless it closed a reversed range.
            match (alphabet::rank(from), alphabet::rank(to)) {
                (Some(lo), Some(hi)) if hi > lo => {
                    items.extend(((lo + 1)..=hi).filter_map(alphabet::char_at).map(|ch| Item {
                        ch,
                        escaped: true,
                    }));
                }
                // Reversed or unknown bounds contribute nothing.
                _ => {}
            }
            continue;
        }

        if c == ESCAPE && i + 1 < end {
            items.push(Item {
                ch: line[i + 1],
                escaped: true,
            });
            i += 2;
        } else {
            items.push(Item { ch: c, escaped: false });
            i += 1;
        }
    }

    items
}

/// A range operator needs a lower bound before it and an upper bound after it.
fn is_range_operator(line: &[char], at: usize, start: usize, end: usize) -> bool {
    at != start
        && at + RANGE_MARKER_COUNT < end
        && line[at..at + RANGE_MARKER_COUNT]
            .iter()
            .all(|&c| c == RANGE_MARKER)
}

fn next_included(table: &[bool; ALPHABET_LEN], from: usize) -> usize {
    (from..ALPHABET_LEN)
        .find(|&rank| !table[rank])
        .unwrap_or(ALPHABET_LEN)
}
