//! This crate provides the core logic for a Turing Machine simulator.
//! It includes modules for parsing the character-class rule language, expanding compact rules
//! into concrete transitions, running a single-tape machine, and managing a collection of
//! predefined programs.

pub mod alphabet;
pub mod char_class;
pub mod expander;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod program;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct and its listener trait from the machine module.
pub use machine::{TuringMachine, TuringMachineListener};
/// Re-exports the rule parser and the `parse` convenience function.
pub use parser::{parse, Parser, ParserOptions};
/// Re-exports the transition table and the `RuleSink` trait.
pub use program::{RuleSink, TransitionProgram};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use tape::Tape;
/// Re-exports various types related to Turing Machine definition and execution from the types module.
pub use types::{
    Direction, ErrorKind, Halt, ParseError, Rule, RunState, Transition, TransitionKey,
    TuringMachineError, BLANK_SYMBOL, MAX_PROGRAM_SIZE,
};
