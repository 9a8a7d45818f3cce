//! Built-in rule programs. Each program carries `# name:` and `# tape:` header comments
//! naming it and suggesting an input tape.

use crate::machine::TuringMachine;
use crate::parser::Parser;
use crate::types::TuringMachineError;
use tracing::warn;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 4] = [
    include_str!("../programs/binary-increment.tm"),
    include_str!("../programs/bit-inverter.tm"),
    include_str!("../programs/unary-addition.tm"),
    include_str!("../programs/busy-beaver-2.tm"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<ProgramInfo> = PROGRAM_TEXTS
        .into_iter()
        .enumerate()
        .filter_map(|(index, text)| match ProgramInfo::from_text(index, text) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(index, error = %e, "failed to parse built-in program");
                None
            }
        })
        .collect();
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    /// Suggested input tape.
    pub tape: String,
    pub text: &'static str,
    pub state_count: usize,
    pub transition_count: usize,
}

impl ProgramInfo {
    fn from_text(index: usize, text: &'static str) -> Result<Self, TuringMachineError> {
        let program = crate::parser::parse(text)?;

        Ok(Self {
            index,
            name: header(text, "name").unwrap_or_else(|| format!("Program {}", index + 1)),
            tape: header(text, "tape").unwrap_or_default(),
            text,
            state_count: program.state_count(),
            transition_count: program.len(),
        })
    }

    /// Builds a machine running this program on its suggested tape.
    pub fn machine(&self) -> Result<TuringMachine, TuringMachineError> {
        let mut machine = TuringMachine::new();
        Parser::new().parse(&mut machine, self.text)?;
        machine.set_tape(&self.tape);
        Ok(machine)
    }
}

/// Reads the value of a `# key: value` header comment.
fn header(text: &str, key: &str) -> Option<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix('#'))
        .filter_map(|line| line.trim().strip_prefix(key))
        .find_map(|rest| rest.strip_prefix(':'))
        .map(|value| value.trim().to_string())
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        PROGRAMS.get(index).cloned().ok_or_else(|| {
            TuringMachineError::ValidationError(format!("Program index {} out of range", index))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<ProgramInfo, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS.iter().map(|program| program.name.clone()).collect()
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        PROGRAMS
            .iter()
            .filter(|program| program.name.to_lowercase().contains(&query))
            .map(|program| program.index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Halt;

    fn run(name: &str) -> TuringMachine {
        let mut machine = ProgramManager::get_program_by_name(name)
            .unwrap()
            .machine()
            .unwrap();
        assert_eq!(machine.run(), Halt::NoRule);
        machine
    }

    #[test]
    fn test_all_programs_parse() {
        assert_eq!(ProgramManager::get_program_count(), PROGRAM_TEXTS.len());
    }

    #[test]
    fn test_program_headers() {
        let info = ProgramManager::get_program_by_index(0).unwrap();
        assert_eq!(info.name, "Binary Increment");
        assert_eq!(info.tape, "1011");
        assert_eq!(info.transition_count, 6);
        assert_eq!(info.state_count, 2);
    }

    #[test]
    fn test_missing_program() {
        assert!(ProgramManager::get_program_by_index(99).is_err());
        assert!(ProgramManager::get_program_by_name("nope").is_err());
    }

    #[test]
    fn test_search_programs() {
        assert_eq!(ProgramManager::search_programs("BINARY"), vec![0]);
        assert!(ProgramManager::list_program_names().contains(&"Busy Beaver 2".to_string()));
    }

    #[test]
    fn test_binary_increment() {
        let machine = run("binary increment");
        assert_eq!(machine.state(), "H");
        assert_eq!(machine.full_tape().trim(), "1100");
        assert_eq!(machine.steps(), 8);
    }

    #[test]
    fn test_bit_inverter() {
        let machine = run("Bit Inverter");
        assert_eq!(machine.full_tape().trim(), "1001");
    }

    #[test]
    fn test_unary_addition() {
        let machine = run("Unary Addition");
        assert_eq!(machine.full_tape().trim(), "11111");
        assert_eq!(machine.steps(), 8);
    }

    #[test]
    fn test_busy_beaver() {
        let machine = run("Busy Beaver 2");
        assert_eq!(machine.state(), "H");
        assert_eq!(machine.full_tape(), "1111");
        assert_eq!(machine.steps(), 6);
    }
}
