//! The transition table of a machine, keyed by (state, symbol), and the receiving end of
//! the rule parser.

use crate::types::{Rule, Transition, TransitionKey};
use std::collections::HashMap;

/// Receives the concrete rules produced while parsing rule text.
pub trait RuleSink {
    fn add_rule(&mut self, rule: Rule);
}

impl RuleSink for Vec<Rule> {
    fn add_rule(&mut self, rule: Rule) {
        self.push(rule);
    }
}

/// Maps (state, symbol) to the transition to apply, together with the source line each
/// entry came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionProgram {
    transitions: HashMap<TransitionKey, Transition>,
    lines: HashMap<TransitionKey, usize>,
}

impl TransitionProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the rule, replacing any earlier rule with the same key.
    pub fn insert(&mut self, rule: Rule) {
        let (key, transition, line) = rule.into_parts();
        self.lines.insert(key.clone(), line);
        self.transitions.insert(key, transition);
    }

    /// Looks up the transition for `state` reading `symbol`.
    pub fn lookup(&self, state: &str, symbol: char) -> Option<&Transition> {
        self.get(&TransitionKey::new(state, symbol))
    }

    pub fn get(&self, key: &TransitionKey) -> Option<&Transition> {
        self.transitions.get(key)
    }

    /// The 1-based source line that defined `key`.
    pub fn debug_info(&self, key: &TransitionKey) -> Option<usize> {
        self.lines.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransitionKey, &Transition)> {
        self.transitions.iter()
    }

    /// Distinct states that have at least one outgoing transition.
    pub fn state_count(&self) -> usize {
        let mut states: Vec<&str> = self.transitions.keys().map(|k| k.state.as_str()).collect();
        states.sort_unstable();
        states.dedup();
        states.len()
    }
}

impl RuleSink for TransitionProgram {
    fn add_rule(&mut self, rule: Rule) {
        self.insert(rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn rule(state: &str, read: char, next: &str, line: usize) -> Rule {
        Rule {
            state: state.into(),
            read,
            next_state: next.into(),
            write: '1',
            direction: Direction::Right,
            line,
        }
    }

    #[test]
    fn test_lookup() {
        let mut program = TransitionProgram::new();
        program.add_rule(rule("A", '0', "B", 3));

        let transition = program.lookup("A", '0').unwrap();
        assert_eq!(transition.next_state, "B");
        assert_eq!(transition.write, '1');
        assert_eq!(transition.direction, Direction::Right);
        assert!(program.lookup("A", '1').is_none());
        assert!(program.lookup("B", '0').is_none());
    }

    #[test]
    fn test_last_rule_wins() {
        let mut program = TransitionProgram::new();
        program.add_rule(rule("A", '0', "B", 1));
        program.add_rule(rule("A", '0', "C", 2));

        assert_eq!(program.len(), 1);
        assert_eq!(program.lookup("A", '0').unwrap().next_state, "C");
        assert_eq!(program.debug_info(&TransitionKey::new("A", '0')), Some(2));
    }

    #[test]
    fn test_debug_info_for_unknown_key() {
        let mut program = TransitionProgram::new();
        program.add_rule(rule("A1", '0', "X", 4));

        assert_eq!(program.debug_info(&TransitionKey::new("A1", '0')), Some(4));
        assert_eq!(program.debug_info(&TransitionKey::new("A", '1')), None);
    }

    #[test]
    fn test_state_count() {
        let mut program = TransitionProgram::new();
        assert!(program.is_empty());

        program.add_rule(rule("A", '0', "B", 1));
        program.add_rule(rule("A", '1', "B", 2));
        program.add_rule(rule("B", '0', "A", 3));

        assert_eq!(program.state_count(), 2);
        assert_eq!(program.iter().count(), 3);
    }
}
