//! This module provides the parser for the rule language.
//!
//! Every non-blank, non-comment line holds one rule of five comma-separated fields,
//! optionally wrapped in parentheses:
//!
//! ```text
//! (start state, start symbol, destination state, destination symbol, move)
//! ```
//!
//! Any field may be a character class, so one line can stand for many transitions. The
//! line is first split into field spans, then each span becomes a [`CharClass`] and the
//! [`RuleExpander`] enumerates the concrete rules, which are handed to a [`RuleSink`].

use crate::{
    alphabet::ESCAPE,
    char_class::{Channel, CharClass},
    expander::{RuleExpander, StateTemplate},
    program::{RuleSink, TransitionProgram},
    types::{ErrorKind, ParseError},
};
use std::io::BufRead;
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Characters that end a bare token.
const KEYS: &str = "(),[]{}";

/// Knobs of the rule parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Upper-case every line before parsing.
    pub ignore_case: bool,
    /// Lines starting with this character are skipped; it also starts a trailing comment.
    pub comment_marker: char,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            comment_marker: '#',
        }
    }
}

/// Parses rule text line by line. Holds no per-line state, so one parser can be reused.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parses `source` and feeds every concrete rule to `sink`.
    ///
    /// Parsing stops at the first malformed line. Rules of the lines before it stay in the
    /// sink.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - the number of rules handed to the sink.
    /// * `Err(ParseError)` - the kind of failure and the 1-based line it occurred on.
    pub fn parse<S: RuleSink + ?Sized>(
        &self,
        sink: &mut S,
        source: &str,
    ) -> Result<usize, ParseError> {
        let mut emitted = 0;
        for (index, line) in source.lines().enumerate() {
            emitted += self.parse_line(sink, line, index + 1)?;
        }
        Ok(emitted)
    }

    /// Like [`Parser::parse`], reading lines from `reader`. A failed read is reported as
    /// [`ErrorKind::Io`] on the line that could not be read.
    pub fn parse_reader<S: RuleSink + ?Sized, R: BufRead>(
        &self,
        sink: &mut S,
        reader: R,
    ) -> Result<usize, ParseError> {
        let mut emitted = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ParseError::io(e, index + 1))?;
            emitted += self.parse_line(sink, &line, index + 1)?;
        }
        Ok(emitted)
    }

    /// Parses a single line numbered `line_no` and feeds its rules to `sink`.
    pub fn parse_line<S: RuleSink + ?Sized>(
        &self,
        sink: &mut S,
        line: &str,
        line_no: usize,
    ) -> Result<usize, ParseError> {
        let text = if self.options.ignore_case {
            line.to_uppercase()
        } else {
            line.to_string()
        };

        if text.starts_with(self.options.comment_marker) || text.trim().is_empty() {
            return Ok(0);
        }

        let chars: Vec<char> = text.chars().collect();

        let result = LineCursor::new(&chars, line_no, self.options.comment_marker)
            .read_rule()
            .and_then(|fields| fields.into_expander(&chars, line_no))
            .and_then(|expander| {
                trace!(line = line_no, combinations = expander.combinations(), "expanding rule");
                let mut emitted = 0;
                for rule in expander {
                    let rule = rule?;
                    trace!(
                        line = line_no,
                        state = %rule.state,
                        read = ?rule.read,
                        next = %rule.next_state,
                        write = ?rule.write,
                        direction = %rule.direction,
                        "rule"
                    );
                    sink.add_rule(rule);
                    emitted += 1;
                }
                Ok(emitted)
            });

        match &result {
            Ok(rules) => debug!(line = line_no, rules, "parsed rule line"),
            Err(error) => warn!(line = line_no, %error, "rejected rule line"),
        }

        result
    }
}

/// Parses `source` into a fresh [`TransitionProgram`] with the default options.
pub fn parse(source: &str) -> Result<TransitionProgram, ParseError> {
    let mut program = TransitionProgram::new();
    Parser::new().parse(&mut program, source)?;
    Ok(program)
}

/// Span of a state field. The class span includes its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StateField {
    prefix: Range<usize>,
    class: Option<(Range<usize>, Range<usize>)>,
}

/// The five field spans of a line, `None` for a field that was left empty.
#[derive(Debug, Default)]
struct RuleFields {
    start_state: Option<StateField>,
    start_symbol: Option<Range<usize>>,
    dest_state: Option<StateField>,
    dest_symbol: Option<Range<usize>>,
    direction: Option<Range<usize>>,
}

impl RuleFields {
    fn into_expander(self, chars: &[char], line: usize) -> Result<RuleExpander, ParseError> {
        let error = |kind| ParseError::new(kind, line);

        let start_state = self
            .start_state
            .ok_or_else(|| error(ErrorKind::MissingStartState))?;
        let start_symbol = self
            .start_symbol
            .ok_or_else(|| error(ErrorKind::MissingStartSymbol))?;
        let dest_state = self
            .dest_state
            .ok_or_else(|| error(ErrorKind::MissingDestState))?;
        let dest_symbol = self
            .dest_symbol
            .ok_or_else(|| error(ErrorKind::MissingDestSymbol))?;
        let direction = self
            .direction
            .ok_or_else(|| error(ErrorKind::MissingDestMove))?;

        RuleExpander::new(
            state_template(chars, start_state).ok_or_else(|| error(ErrorKind::InvalidStartState))?,
            single_field(chars, start_symbol).ok_or_else(|| error(ErrorKind::InvalidStartSymbol))?,
            state_template(chars, dest_state).ok_or_else(|| error(ErrorKind::InvalidDestState))?,
            single_field(chars, dest_symbol).ok_or_else(|| error(ErrorKind::InvalidDestSymbol))?,
            single_field(chars, direction).ok_or_else(|| error(ErrorKind::InvalidDestMove))?,
            line,
        )
    }
}

fn state_template(chars: &[char], field: StateField) -> Option<StateTemplate> {
    let prefix = unescape(&chars[field.prefix]);

    match field.class {
        None => Some(StateTemplate::literal(prefix)),
        Some((class, suffix)) => {
            let class = CharClass::parse(chars, class);
            if class.is_empty() {
                return None;
            }
            Some(StateTemplate::with_class(
                prefix,
                class,
                unescape(&chars[suffix]),
            ))
        }
    }
}

/// A symbol or move field: a non-empty class, or a bare token naming one character.
fn single_field(chars: &[char], span: Range<usize>) -> Option<CharClass> {
    let class = CharClass::parse(chars, span);
    if class.is_empty() || (class.channel().is_none() && class.len() != 1) {
        return None;
    }
    Some(class)
}

/// Decodes escapes of a literal run.
fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut iter = chars.iter();
    while let Some(&c) = iter.next() {
        match c {
            ESCAPE => out.push(iter.next().copied().unwrap_or(ESCAPE)),
            c => out.push(c),
        }
    }
    out
}

/// Scanning position within one line.
struct LineCursor<'a> {
    chars: &'a [char],
    pos: usize,
    line: usize,
    comment_marker: char,
}

impl<'a> LineCursor<'a> {
    fn new(chars: &'a [char], line: usize, comment_marker: char) -> Self {
        Self {
            chars,
            pos: 0,
            line,
            comment_marker,
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.line)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn is_blank(&self) -> bool {
        matches!(self.peek(), Some(' ' | '\t'))
    }

    fn is_key(&self) -> bool {
        self.peek().is_some_and(|c| KEYS.contains(c))
    }

    fn skip_blanks(&mut self) {
        while self.is_blank() {
            self.pos += 1;
        }
    }

    /// Steps over one character, or over an escape and the character it protects.
    fn next_pos(&mut self) {
        let width = if self.peek() == Some(ESCAPE) { 2 } else { 1 };
        self.pos = (self.pos + width).min(self.chars.len());
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn scan_token(&mut self) {
        while !self.eof() && !self.is_blank() && !self.is_key() {
            self.next_pos();
        }
    }

    fn open_class(&mut self) -> Option<Channel> {
        let channel = self.peek().and_then(Channel::from_open)?;
        self.pos += 1;
        Some(channel)
    }

    fn expect_comma(&mut self) -> Result<(), ParseError> {
        self.skip_blanks();
        if self.eat(',') {
            Ok(())
        } else {
            Err(self.error(ErrorKind::MissingComma))
        }
    }

    /// Reads `prefix [class] suffix`.
    fn read_state(&mut self, invalid: ErrorKind) -> Result<Option<StateField>, ParseError> {
        self.skip_blanks();

        let prefix_start = self.pos;
        self.scan_token();
        if self.eof() {
            return Err(self.error(ErrorKind::UnexpectedEof));
        }
        let prefix = prefix_start..self.pos;

        let Some(channel) = self.open_class() else {
            return Ok((!prefix.is_empty()).then_some(StateField {
                prefix,
                class: None,
            }));
        };

        self.scan_token();
        if !self.eat(channel.close()) {
            return Err(self.error(invalid));
        }
        let class = prefix.end..self.pos;

        let suffix_start = self.pos;
        self.scan_token();

        Ok(Some(StateField {
            prefix,
            class: Some((class, suffix_start..self.pos)),
        }))
    }

    /// Reads a bare token or a single class.
    fn read_field(&mut self, invalid: ErrorKind) -> Result<Option<Range<usize>>, ParseError> {
        self.skip_blanks();

        let start = self.pos;
        let channel = self.open_class();
        self.scan_token();

        if let Some(channel) = channel {
            if !self.eat(channel.close()) {
                return Err(self.error(invalid));
            }
        }

        Ok((start != self.pos).then_some(start..self.pos))
    }

    fn read_rule(mut self) -> Result<RuleFields, ParseError> {
        let mut fields = RuleFields::default();

        self.skip_blanks();
        let parenthesized = self.eat('(');

        fields.start_state = self.read_state(ErrorKind::InvalidStartState)?;
        self.expect_comma()?;
        fields.start_symbol = self.read_field(ErrorKind::InvalidStartSymbol)?;
        self.expect_comma()?;
        fields.dest_state = self.read_state(ErrorKind::InvalidDestState)?;
        self.expect_comma()?;
        fields.dest_symbol = self.read_field(ErrorKind::InvalidDestSymbol)?;
        self.expect_comma()?;
        fields.direction = self.read_field(ErrorKind::InvalidDestMove)?;

        self.skip_blanks();
        if parenthesized && !self.eat(')') {
            return Err(self.error(ErrorKind::MissingClosingRule));
        }

        self.skip_blanks();
        if self.peek().is_some_and(|c| c != self.comment_marker) {
            return Err(self.error(ErrorKind::TooMuchData));
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::ALPHABET_LEN;
    use crate::types::{Direction, Rule, TransitionKey};
    use pretty_assertions::assert_eq;
    use std::io::{self, BufReader, Read};

    fn rules(source: &str) -> Vec<Rule> {
        let mut rules = Vec::new();
        Parser::new().parse(&mut rules, source).unwrap();
        rules
    }

    fn error(source: &str) -> ErrorKind {
        let mut rules: Vec<Rule> = Vec::new();
        Parser::new().parse(&mut rules, source).unwrap_err().kind
    }

    fn rule(state: &str, read: char, next: &str, write: char, direction: Direction) -> Rule {
        Rule {
            state: state.into(),
            read,
            next_state: next.into(),
            write,
            direction,
            line: 1,
        }
    }

    #[test]
    fn test_parse_literal_rule() {
        assert_eq!(
            rules("(A,0,A,1,>)"),
            vec![rule("A", '0', "A", '1', Direction::Right)]
        );
    }

    #[test]
    fn test_parentheses_are_optional() {
        assert_eq!(rules("A,0,A,1,>"), rules("(A,0,A,1,>)"));
        assert_eq!(rules("  ( A , 0 ,\tA , 1 , > )  "), rules("(A,0,A,1,>)"));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            rules("(start,a,next,b,<)"),
            vec![rule("START", 'A', "NEXT", 'B', Direction::Left)]
        );
    }

    #[test]
    fn test_case_can_be_kept() {
        let parser = Parser::with_options(ParserOptions {
            ignore_case: false,
            ..ParserOptions::default()
        });
        let mut rules = Vec::new();
        parser.parse(&mut rules, "(q,0,Q,1,-)").unwrap();
        assert_eq!(rules, vec![rule("q", '0', "Q", '1', Direction::Stay)]);
    }

    #[test]
    fn test_space_marker_and_escapes() {
        assert_eq!(
            rules("(A,-,B,\\-,-)"),
            vec![rule("A", ' ', "B", '-', Direction::Stay)]
        );
        assert_eq!(
            rules("(A,\\,,B,\\(,<)"),
            vec![rule("A", ',', "B", '(', Direction::Left)]
        );
    }

    #[test]
    fn test_negated_class_expands_to_complement() {
        let rules = rules("(A,[^0],A,1,>)");

        assert_eq!(rules.len(), ALPHABET_LEN - 1);
        assert_eq!(rules.len(), 65);
        assert!(rules.iter().all(|r| r.read != '0'));
        assert!(rules
            .iter()
            .all(|r| r.state == "A" && r.write == '1' && r.direction == Direction::Right));
    }

    #[test]
    fn test_same_bracket_classes_pair_by_position() {
        assert_eq!(
            rules("([AB],0,[CD],1,>)"),
            vec![
                rule("A", '0', "C", '1', Direction::Right),
                rule("B", '0', "D", '1', Direction::Right),
            ]
        );
    }

    #[test]
    fn test_different_brackets_cross() {
        let rules = rules("([AB],{01},X,1,>)");
        let keys: Vec<(String, char)> = rules.into_iter().map(|r| (r.state, r.read)).collect();

        assert_eq!(
            keys,
            vec![
                ("A".to_string(), '0'),
                ("B".to_string(), '0'),
                ("A".to_string(), '1'),
                ("B".to_string(), '1'),
            ]
        );
    }

    #[test]
    fn test_state_with_embedded_class() {
        let states: Vec<String> = rules("(Q[01]X,0,R{AB}S,0,{<>})")
            .into_iter()
            .map(|r| format!("{}->{}{}", r.state, r.next_state, r.direction))
            .collect();

        assert_eq!(
            states,
            vec!["Q0X->RAS<", "Q1X->RAS<", "Q0X->RBS>", "Q1X->RBS>"]
        );
    }

    #[test]
    fn test_range_in_symbol_class() {
        let rules = rules("(A,[0..9],[0..9],-,>)");
        assert_eq!(rules.len(), 10);
        assert_eq!(rules[3].read, '3');
        assert_eq!(rules[3].next_state, "3");
        assert_eq!(rules[3].write, ' ');
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let source = "# a comment\n\n   \t\n(A,0,B,1,>) # trailing\n";
        let rules = rules(source);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].line, 4);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let rules = rules("(A,0,B,1,>)\n(B,0,A,1,<)");
        assert_eq!(rules[0].line, 1);
        assert_eq!(rules[1].line, 2);
    }

    #[test]
    fn test_length_mismatch_rejects_whole_line() {
        let mut rules: Vec<Rule> = Vec::new();
        let err = Parser::new()
            .parse(&mut rules, "(A,0,B,1,>)\n([AB],[012],C,1,>)")
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::CharClassIncomplete);
        assert_eq!(err.line, 2);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(error("(,0,B,1,>)"), ErrorKind::MissingStartState);
        assert_eq!(error("(A,,B,1,>)"), ErrorKind::MissingStartSymbol);
        assert_eq!(error("(A,0,,1,>)"), ErrorKind::MissingDestState);
        assert_eq!(error("(A,0,B,,>)"), ErrorKind::MissingDestSymbol);
        assert_eq!(error("(A,0,B,1,)"), ErrorKind::MissingDestMove);
    }

    #[test]
    fn test_missing_separators() {
        assert_eq!(error("(A 0,B,1,>)"), ErrorKind::MissingComma);
        assert_eq!(error("(A,0,B,1)"), ErrorKind::MissingComma);
        assert_eq!(error("(A,0,B,1,>"), ErrorKind::MissingClosingRule);
        assert_eq!(error("(A"), ErrorKind::UnexpectedEof);
        assert_eq!(error("(A,0,B"), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_unterminated_classes() {
        assert_eq!(error("([AB,0,B,1,>)"), ErrorKind::InvalidStartState);
        assert_eq!(error("(A,[01,B,1,>)"), ErrorKind::InvalidStartSymbol);
        assert_eq!(error("(A,0,{B,1,>)"), ErrorKind::InvalidDestState);
        assert_eq!(error("(A,0,B,[1 2],>)"), ErrorKind::InvalidDestSymbol);
        assert_eq!(error("(A,0,B,1,[<>)"), ErrorKind::InvalidDestMove);
        assert_eq!(error("(A,0,B,1,[<}"), ErrorKind::InvalidDestMove);
    }

    #[test]
    fn test_malformed_fields() {
        assert_eq!(error("(A,01,B,1,>)"), ErrorKind::InvalidStartSymbol);
        assert_eq!(error("(A,[],B,1,>)"), ErrorKind::InvalidStartSymbol);
        assert_eq!(error("(A[],0,B,1,>)"), ErrorKind::InvalidStartState);
        assert_eq!(error("(A,0,B,12,>)"), ErrorKind::InvalidDestSymbol);
        assert_eq!(error("(A,0,B,1,<>)"), ErrorKind::InvalidDestMove);
        assert_eq!(error("(A,0,B,1,X)"), ErrorKind::InvalidDestMove);
    }

    #[test]
    fn test_trailing_data() {
        assert_eq!(error("(A,0,B,1,>),X"), ErrorKind::TooMuchData);
        assert_eq!(error("A,0,B,1,>,X"), ErrorKind::TooMuchData);
        assert_eq!(error("(A,0,B,1,>) X"), ErrorKind::TooMuchData);
    }

    #[test]
    fn test_invalid_move_keeps_earlier_expansions() {
        let mut rules: Vec<Rule> = Vec::new();
        let err = Parser::new()
            .parse(&mut rules, "(A,[01],A,1,[>X])")
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidDestMove);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_parse_into_program_overwrites() {
        let program = parse("(A,0,B,1,>)\n(A,0,C,2,<)").unwrap();
        let key = TransitionKey::new("A", '0');

        assert_eq!(program.len(), 1);
        assert_eq!(program.get(&key).unwrap().next_state, "C");
        assert_eq!(program.debug_info(&key), Some(2));
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let source = "([AB],{01},[CD],{10},[<>])\n(A,[^AB],A,-,-)";
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }

    #[test]
    fn test_parse_reader() {
        let mut program = TransitionProgram::new();
        let emitted = Parser::new()
            .parse_reader(&mut program, "(A,[01],B,1,>)\n".as_bytes())
            .unwrap();

        assert_eq!(emitted, 2);
        assert_eq!(program.len(), 2);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_parse_reader_wraps_io_errors() {
        let mut program = TransitionProgram::new();
        let err = Parser::new()
            .parse_reader(&mut program, BufReader::new(FailingReader))
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.line, 1);
    }
}
