//! This module defines the `TuringMachine` struct, which runs a [`TransitionProgram`] against
//! a [`Tape`], counts steps, enforces an optional step limit, and notifies registered
//! listeners when a run starts, after every step, and when it stops.

use crate::program::{RuleSink, TransitionProgram};
use crate::tape::Tape;
use crate::types::{Direction, Halt, Rule, RunState, TransitionKey, DEFAULT_INITIAL_STATE};
use std::cell::Cell;
use tracing::{debug, trace};

/// Observer of a running machine. Every callback runs synchronously inside `run()` and
/// receives the machine itself, so it can read the state, tape and step counter, or call
/// [`TuringMachine::stop`].
pub trait TuringMachineListener {
    fn on_start(&mut self, _machine: &TuringMachine) {}
    fn on_step(&mut self, _machine: &TuringMachine) {}
    fn on_stop(&mut self, _machine: &TuringMachine) {}
}

#[derive(Clone, Copy)]
enum Notification {
    Start,
    Step,
    Stop,
}

/// Represents a single-tape Turing Machine.
///
/// The machine owns its transition program and tape. States come into existence as rules
/// mention them; the machine starts in [`DEFAULT_INITIAL_STATE`] unless told otherwise.
pub struct TuringMachine {
    program: TransitionProgram,
    tape: Tape,
    initial_tape: String,
    initial_state: String,
    state: String,
    steps: usize,
    limit: Option<usize>,
    cancelled: Cell<bool>,
    status: RunState,
    last_key: Option<TransitionKey>,
    last_move: Option<Direction>,
    listeners: Vec<Box<dyn TuringMachineListener>>,
}

impl Default for TuringMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TuringMachine {
    /// Creates a machine with no rules and a single blank cell on the tape.
    pub fn new() -> Self {
        Self::with_program(TransitionProgram::new())
    }

    pub fn with_program(program: TransitionProgram) -> Self {
        Self {
            program,
            tape: Tape::new(),
            initial_tape: String::new(),
            initial_state: DEFAULT_INITIAL_STATE.to_string(),
            state: DEFAULT_INITIAL_STATE.to_string(),
            steps: 0,
            limit: None,
            cancelled: Cell::new(false),
            status: RunState::Ready,
            last_key: None,
            last_move: None,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener. Listeners are notified in registration order. Registration never
    /// deduplicates: registering two listeners that observe the same thing, or sharing one
    /// observer through two boxes, delivers every notification twice.
    pub fn add_listener(&mut self, listener: Box<dyn TuringMachineListener>) {
        self.listeners.push(listener);
    }

    pub fn program(&self) -> &TransitionProgram {
        &self.program
    }

    /// Replaces the tape with `content`, one cell per character, head on the first cell.
    pub fn set_tape(&mut self, content: &str) {
        self.initial_tape = content.to_string();
        self.tape = Tape::from_content(content);
    }

    /// Replaces the tape with a single blank cell.
    pub fn clear_tape(&mut self) {
        self.set_tape("");
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// `width` cells centered on the head.
    pub fn tape_window(&self, width: usize) -> String {
        self.tape.window(width)
    }

    pub fn full_tape(&self) -> String {
        self.tape.contents()
    }

    /// Returns the current state of the Turing Machine.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    /// Sets the state the machine starts from, and moves the machine there.
    pub fn set_initial_state(&mut self, state: impl Into<String>) {
        self.initial_state = state.into();
        self.state = self.initial_state.clone();
    }

    /// Returns the total number of steps executed by the Turing Machine.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Caps the number of steps of `run()`. A limit of 0 is ignored and leaves the current
    /// limit in place.
    pub fn set_limit(&mut self, limit: usize) {
        if limit > 0 {
            self.limit = Some(limit);
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn status(&self) -> RunState {
        self.status
    }

    /// Direction of the most recently applied transition.
    pub fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    /// True when the step counter went past the limit, i.e. the last run ended on its step
    /// budget rather than for lack of a matching rule. Always false without a limit.
    pub fn is_no_rule_stop(&self) -> bool {
        self.limit.is_some_and(|limit| self.steps > limit)
    }

    /// Source line of the rule behind the last attempted lookup, if that lookup matched.
    pub fn debug_line(&self) -> Option<usize> {
        self.last_key
            .as_ref()
            .and_then(|key| self.program.debug_info(key))
    }

    /// Requests the running loop to stop. Takes effect at the next loop check, after the
    /// current step has been applied.
    pub fn stop(&self) {
        self.cancelled.set(true);
    }

    /// Runs until no rule matches, the step limit is exceeded or [`TuringMachine::stop`] is
    /// called.
    ///
    /// The limit is checked before each step, against the steps already taken, so a run with
    /// limit `n` executes up to `n + 1` steps.
    pub fn run(&mut self) -> Halt {
        self.cancelled.set(false);
        self.status = RunState::Running;
        debug!(state = %self.state, limit = ?self.limit, "run started");
        self.notify(Notification::Start);

        let halt = loop {
            if self.cancelled.get() {
                break Halt::Cancelled;
            }
            if self.is_no_rule_stop() {
                break Halt::StepLimit;
            }
            if !self.make_step() {
                break Halt::NoRule;
            }
            self.notify(Notification::Step);
        };

        self.status = RunState::Stopped;
        debug!(state = %self.state, steps = self.steps, ?halt, "run stopped");
        self.notify(Notification::Stop);

        halt
    }

    /// Executes a single step. Returns `false`, leaving the machine untouched, when no rule
    /// matches the current state and symbol.
    pub fn make_step(&mut self) -> bool {
        let key = TransitionKey::new(self.state.as_str(), self.tape.read());
        let transition = self.program.get(&key).cloned();
        self.last_key = Some(key);

        let Some(transition) = transition else {
            return false;
        };

        self.tape.write(transition.write);
        self.state = transition.next_state;
        self.tape.move_head(transition.direction);
        self.last_move = Some(transition.direction);
        self.steps += 1;

        trace!(
            step = self.steps,
            state = %self.state,
            head = self.tape.head(),
            "step"
        );

        true
    }

    /// Restores the initial state, the step counter and the tape last given to
    /// [`TuringMachine::set_tape`]. Rules, limit and listeners are kept.
    pub fn reset(&mut self) {
        self.state = self.initial_state.clone();
        self.tape = Tape::from_content(&self.initial_tape);
        self.steps = 0;
        self.status = RunState::Ready;
        self.cancelled.set(false);
        self.last_key = None;
        self.last_move = None;
    }

    fn notify(&mut self, notification: Notification) {
        // Listeners borrow the machine immutably while being called mutably themselves.
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            match notification {
                Notification::Start => listener.on_start(self),
                Notification::Step => listener.on_step(self),
                Notification::Stop => listener.on_stop(self),
            }
        }
        self.listeners = listeners;
    }
}

impl RuleSink for TuringMachine {
    fn add_rule(&mut self, rule: Rule) {
        self.program.insert(rule);
    }
}
