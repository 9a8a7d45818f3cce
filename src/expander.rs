//! Expansion of one parsed rule line into concrete rules.
//!
//! The five fields of a line are character classes. Classes sharing a [`Channel`] are read
//! at the same position; each channel is one digit of a ripple-carry counter, with
//! [`Channel::Square`] as the least significant digit. Classes with a single alternative are
//! constants and never take part in the counting.

use crate::char_class::{Channel, CharClass};
use crate::types::{Direction, ErrorKind, ParseError, Rule};

/// A state field: a literal prefix, an optional class and a literal suffix (`Q[01]X`).
#[derive(Debug, Clone)]
pub struct StateTemplate {
    prefix: String,
    class: Option<CharClass>,
    suffix: String,
}

impl StateTemplate {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            prefix: name.into(),
            class: None,
            suffix: String::new(),
        }
    }

    pub fn with_class(prefix: impl Into<String>, class: CharClass, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            class: Some(class),
            suffix: suffix.into(),
        }
    }

    fn read(&self) -> Option<String> {
        match &self.class {
            None => Some(self.prefix.clone()),
            Some(class) => {
                let middle = class.read_state()?;
                Some(format!("{}{}{}", self.prefix, middle, self.suffix))
            }
        }
    }
}

/// Enumerates every concrete rule of one line. Yields an error, and then stops, when a
/// combination holds something other than a direction glyph in the move field.
#[derive(Debug, Clone)]
pub struct RuleExpander {
    start_state: StateTemplate,
    start_symbol: CharClass,
    dest_state: StateTemplate,
    dest_symbol: CharClass,
    direction: CharClass,
    line: usize,
    done: bool,
}

impl RuleExpander {
    /// Builds the expander, rejecting the line with [`ErrorKind::CharClassIncomplete`] when two
    /// classes of the same channel have different lengths (ignoring single alternatives).
    pub fn new(
        start_state: StateTemplate,
        start_symbol: CharClass,
        dest_state: StateTemplate,
        dest_symbol: CharClass,
        direction: CharClass,
        line: usize,
    ) -> Result<Self, ParseError> {
        let mut expander = Self {
            start_state,
            start_symbol,
            dest_state,
            dest_symbol,
            direction,
            line,
            done: false,
        };

        for channel in Channel::ALL {
            let mut lengths = expander
                .classes()
                .filter(|class| class.channel() == Some(channel) && class.len() != 1)
                .map(CharClass::len);

            if let Some(first) = lengths.next() {
                if lengths.any(|len| len != first) {
                    return Err(ParseError::new(ErrorKind::CharClassIncomplete, line));
                }
            }
        }

        expander.classes_mut().for_each(CharClass::reset);

        Ok(expander)
    }

    /// Number of rules the line expands to.
    pub fn combinations(&self) -> usize {
        Channel::ALL
            .iter()
            .filter_map(|&channel| {
                self.classes()
                    .find(|class| is_counting(class, channel))
                    .map(CharClass::len)
            })
            .product()
    }

    fn classes(&self) -> impl Iterator<Item = &CharClass> {
        self.start_state
            .class
            .as_ref()
            .into_iter()
            .chain(Some(&self.start_symbol))
            .chain(self.dest_state.class.as_ref())
            .chain(Some(&self.dest_symbol))
            .chain(Some(&self.direction))
    }

    fn classes_mut(&mut self) -> impl Iterator<Item = &mut CharClass> {
        self.start_state
            .class
            .as_mut()
            .into_iter()
            .chain(Some(&mut self.start_symbol))
            .chain(self.dest_state.class.as_mut())
            .chain(Some(&mut self.dest_symbol))
            .chain(Some(&mut self.direction))
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.line)
    }

    /// Reads the rule at the current cursor positions.
    fn current(&self) -> Result<Rule, ParseError> {
        let state = self
            .start_state
            .read()
            .ok_or_else(|| self.error(ErrorKind::InvalidStartState))?;
        let read = self
            .start_symbol
            .read_symbol()
            .ok_or_else(|| self.error(ErrorKind::InvalidStartSymbol))?;
        let next_state = self
            .dest_state
            .read()
            .ok_or_else(|| self.error(ErrorKind::InvalidDestState))?;
        let write = self
            .dest_symbol
            .read_symbol()
            .ok_or_else(|| self.error(ErrorKind::InvalidDestSymbol))?;
        let direction = self
            .direction
            .read_dir()
            .and_then(Direction::from_glyph)
            .ok_or_else(|| self.error(ErrorKind::InvalidDestMove))?;

        Ok(Rule {
            state,
            read,
            next_state,
            write,
            direction,
            line: self.line,
        })
    }

    /// Advances the counter by one. Returns `false` once every combination was produced.
    fn advance_root(&mut self) -> bool {
        let Some(mut level) = Channel::ALL
            .iter()
            .position(|&channel| self.has_pending(channel))
        else {
            return false;
        };

        while level < Channel::ALL.len() && !self.advance_channel(Channel::ALL[level]) {
            level += 1;
        }

        if level == Channel::ALL.len() {
            return false;
        }

        for &lower in &Channel::ALL[..level] {
            self.reset_channel(lower);
        }

        true
    }

    fn has_pending(&self, channel: Channel) -> bool {
        self.classes()
            .any(|class| is_counting(class, channel) && !class.eof())
    }

    fn advance_channel(&mut self, channel: Channel) -> bool {
        let mut moved = false;
        for class in self
            .classes_mut()
            .filter(|class| is_counting(class, channel) && !class.eof())
        {
            moved |= class.advance();
        }
        moved
    }

    fn reset_channel(&mut self, channel: Channel) {
        self.classes_mut()
            .filter(|class| is_counting(class, channel) && class.eof())
            .for_each(CharClass::reset);
    }
}

fn is_counting(class: &CharClass, channel: Channel) -> bool {
    class.channel() == Some(channel) && class.len() > 1
}

impl Iterator for RuleExpander {
    type Item = Result<Rule, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.current() {
            Ok(rule) => {
                if !self.advance_root() {
                    self.done = true;
                }
                Some(Ok(rule))
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
