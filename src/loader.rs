//! This module provides the `ProgramLoader` struct, responsible for loading rule programs
//! from files and strings.

use crate::machine::TuringMachine;
use crate::parser::Parser;
use crate::program::{RuleSink, TransitionProgram};
use crate::types::{TuringMachineError, MAX_PROGRAM_SIZE};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// File extension of rule programs.
pub const PROGRAM_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading rule programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load all `.tm` files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a rule program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionProgram)` if the file is successfully read and parsed.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be opened.
    /// * `Err(TuringMachineError::ValidationError)` if the file exceeds `MAX_PROGRAM_SIZE`.
    /// * `Err(TuringMachineError::ParseError)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<TransitionProgram, TuringMachineError> {
        let mut program = TransitionProgram::new();
        Self::load_into(path, &mut program)?;
        Ok(program)
    }

    /// Loads a rule program from the specified file path into a fresh machine.
    pub fn load_machine(path: &Path) -> Result<TuringMachine, TuringMachineError> {
        let mut machine = TuringMachine::new();
        Self::load_into(path, &mut machine)?;
        Ok(machine)
    }

    /// Parses rule text that is not stored in a file, e.g. from user input.
    pub fn load_program_from_string(content: &str) -> Result<TransitionProgram, TuringMachineError> {
        check_size(content.len())?;

        let mut program = TransitionProgram::new();
        Parser::new().parse(&mut program, content)?;
        Ok(program)
    }

    /// Loads every `.tm` file in `directory`. Directories and other files are skipped.
    pub fn load_programs(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, TransitionProgram), TuringMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir() || path.extension().is_none_or(|ext| ext != PROGRAM_EXTENSION) {
                    return None;
                }

                Some(Self::load_program(&path).map(|program| (path, program)))
            })
            .collect()
    }

    fn load_into(path: &Path, sink: &mut impl RuleSink) -> Result<(), TuringMachineError> {
        let file_error = |e: std::io::Error| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        };

        let size = fs::metadata(path).map_err(file_error)?.len();
        check_size(usize::try_from(size).unwrap_or(usize::MAX))?;

        let file = File::open(path).map_err(file_error)?;
        let rules = Parser::new().parse_reader(sink, BufReader::new(file))?;
        info!(path = %path.display(), rules, "loaded rule program");

        Ok(())
    }
}

fn check_size(size: usize) -> Result<(), TuringMachineError> {
    if size > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Program is {size} bytes, the limit is {MAX_PROGRAM_SIZE}"
        )));
    }
    Ok(())
}
