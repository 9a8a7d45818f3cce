//! This module defines the core data structures and types used throughout the Turing Machine
//! simulator, including transitions, directions, halt reasons, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// The blank symbol stored on the tape.
pub const BLANK_SYMBOL: char = ' ';
/// The state a freshly constructed machine starts in.
pub const DEFAULT_INITIAL_STATE: &str = "0";
/// The maximum allowed size for a rule program in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Decodes a direction glyph: `<` for Left, `>` for Right and `-` for Stay.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '<' => Some(Direction::Left),
            '>' => Some(Direction::Right),
            '-' => Some(Direction::Stay),
            _ => None,
        }
    }

    /// Returns the glyph used for this direction in rule text.
    pub fn glyph(self) -> char {
        match self {
            Direction::Left => '<',
            Direction::Right => '>',
            Direction::Stay => '-',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// The lookup key of a transition: the current state and the symbol under the head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub state: String,
    pub symbol: char,
}

impl TransitionKey {
    pub fn new(state: impl Into<String>, symbol: char) -> Self {
        Self {
            state: state.into(),
            symbol,
        }
    }
}

/// The action side of a transition rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine transitions to.
    pub next_state: String,
    /// The symbol written under the head.
    pub write: char,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// A concrete rule produced by expanding one line of rule text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub state: String,
    pub read: char,
    pub next_state: String,
    pub write: char,
    pub direction: Direction,
    /// 1-based line number of the source line that produced this rule.
    pub line: usize,
}

impl Rule {
    /// Splits the rule into its lookup key and transition.
    pub fn into_parts(self) -> (TransitionKey, Transition, usize) {
        (
            TransitionKey::new(self.state, self.read),
            Transition {
                next_state: self.next_state,
                write: self.write,
                direction: self.direction,
            },
            self.line,
        )
    }
}

/// Why a call to `run()` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// No rule matched the current state and symbol.
    NoRule,
    /// The step counter went past the configured limit.
    StepLimit,
    /// `stop()` was requested.
    Cancelled,
}

/// Lifecycle of a machine with respect to `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Ready,
    Running,
    Stopped,
}

/// The kinds of failure the rule parser reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("Error reading the start symbol")]
    MissingStartSymbol,
    #[error("The start symbol field is malformed")]
    InvalidStartSymbol,
    #[error("Error reading the start state")]
    MissingStartState,
    #[error("The character class in the start state is malformed")]
    InvalidStartState,
    #[error("Error reading the destination state")]
    MissingDestState,
    #[error("The character class in the destination state is malformed")]
    InvalidDestState,
    #[error("Error reading the symbol to write")]
    MissingDestSymbol,
    #[error("The destination symbol field is malformed")]
    InvalidDestSymbol,
    #[error("Error reading the move to perform")]
    MissingDestMove,
    #[error("The move is invalid")]
    InvalidDestMove,
    #[error("There are more than five fields")]
    TooMuchData,
    #[error("Unexpected end of rule")]
    UnexpectedEof,
    #[error("Error reading from the stream")]
    Io,
    #[error("The character classes in the rule have different lengths")]
    CharClassIncomplete,
    #[error("Expected ',' as separator")]
    MissingComma,
    #[error("Expected ')' to close the rule")]
    MissingClosingRule,
}

/// A rule-text parse failure, carrying the 1-based line it occurred on.
#[derive(Debug, Error)]
#[error("{kind} (line {line})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub line: usize,
    #[source]
    source: Option<io::Error>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, line: usize) -> Self {
        Self {
            kind,
            line,
            source: None,
        }
    }

    /// Wraps a lower-level read failure as an [`ErrorKind::Io`] error.
    pub fn io(error: io::Error, line: usize) -> Self {
        Self {
            kind: ErrorKind::Io,
            line,
            source: Some(error),
        }
    }
}

/// Represents the errors surfaced to collaborators that load and parse rule programs.
#[derive(Debug, Error)]
pub enum TuringMachineError {
    /// Indicates a syntax error in rule text.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] ParseError),
    /// Indicates an error during validation of a program before it is parsed.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_direction_serialization() {
        let left = Direction::Left;
        let right = Direction::Right;

        let left_json = serde_json::to_string(&left).unwrap();
        let right_json = serde_json::to_string(&right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left_deserialized: Direction = serde_json::from_str(&left_json).unwrap();
        let right_deserialized: Direction = serde_json::from_str(&right_json).unwrap();

        assert_eq!(left, left_deserialized);
        assert_eq!(right, right_deserialized);
    }

    #[test]
    fn test_direction_glyphs() {
        for direction in [Direction::Left, Direction::Right, Direction::Stay] {
            assert_eq!(Direction::from_glyph(direction.glyph()), Some(direction));
        }
        assert_eq!(Direction::from_glyph('R'), None);
        assert_eq!(Direction::Stay.to_string(), "-");
    }

    #[test]
    fn test_rule_into_parts() {
        let rule = Rule {
            state: "A".into(),
            read: '0',
            next_state: "B".into(),
            write: '1',
            direction: Direction::Right,
            line: 7,
        };

        let (key, transition, line) = rule.into_parts();
        assert_eq!(key, TransitionKey::new("A", '0'));
        assert_eq!(transition.next_state, "B");
        assert_eq!(transition.write, '1');
        assert_eq!(transition.direction, Direction::Right);
        assert_eq!(line, 7);
    }

    #[test]
    fn test_error_display() {
        let error = ParseError::new(ErrorKind::MissingComma, 3);

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Expected ','"));
        assert!(error_msg.contains("line 3"));

        let wrapped = TuringMachineError::from(error);
        assert!(wrapped.to_string().starts_with("Program parsing error"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let error = ParseError::io(io::Error::new(io::ErrorKind::Other, "boom"), 12);

        assert_eq!(error.kind, ErrorKind::Io);
        assert_eq!(error.line, 12);
        assert_eq!(error.source().unwrap().to_string(), "boom");
    }
}
