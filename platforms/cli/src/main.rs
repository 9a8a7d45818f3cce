use clap::Parser;
use mdt::{
    Halt, ProgramLoader, ProgramManager, TuringMachine, TuringMachineError, TuringMachineListener,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The rule program file to execute
    #[clap(short, long, conflicts_with = "builtin")]
    program: Option<PathBuf>,

    /// Run a built-in program, by name or index (see --list)
    #[clap(short, long)]
    builtin: Option<String>,

    /// The initial tape content. Defaults to the suggested tape of a built-in program
    #[clap(short, long)]
    input: Option<String>,

    /// Stop after this many steps (plus one)
    #[clap(short, long)]
    limit: Option<usize>,

    /// The state to start from
    #[clap(short, long)]
    state: Option<String>,

    /// Print the tape window after each step
    #[clap(short, long)]
    trace: bool,

    /// Number of tape cells shown around the head when tracing
    #[clap(short, long, default_value_t = 21)]
    width: usize,

    /// Print the final result as JSON
    #[clap(long)]
    json: bool,

    /// List the built-in programs and exit
    #[clap(long)]
    list: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct RunSummary {
    state: String,
    steps: usize,
    halt: Halt,
    tape: String,
    head: usize,
    debug_line: Option<usize>,
}

impl RunSummary {
    fn new(machine: &TuringMachine, halt: Halt) -> Self {
        Self {
            state: machine.state().to_string(),
            steps: machine.steps(),
            halt,
            tape: machine.full_tape(),
            head: machine.tape().head(),
            debug_line: machine.debug_line(),
        }
    }
}

struct StepPrinter {
    width: usize,
}

impl StepPrinter {
    fn print(&self, machine: &TuringMachine) {
        println!(
            "{:>6} {:>8} |{}|",
            machine.steps(),
            machine.state(),
            machine.tape_window(self.width)
        );
    }
}

impl TuringMachineListener for StepPrinter {
    fn on_start(&mut self, machine: &TuringMachine) {
        self.print(machine);
    }

    fn on_step(&mut self, machine: &TuringMachine) {
        self.print(machine);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn list_programs() {
    for index in 0..ProgramManager::get_program_count() {
        if let Ok(info) = ProgramManager::get_program_by_index(index) {
            println!(
                "{:>2}  {:<20} tape: {:<10} rules: {}",
                info.index,
                info.name,
                format!("'{}'", info.tape),
                info.transition_count
            );
        }
    }
}

fn build_machine(cli: &Cli) -> Result<TuringMachine, TuringMachineError> {
    let mut machine = match (&cli.program, &cli.builtin) {
        (Some(path), _) => ProgramLoader::load_machine(path)?,
        (None, Some(builtin)) => {
            let info = match builtin.parse::<usize>() {
                Ok(index) => ProgramManager::get_program_by_index(index)?,
                Err(_) => ProgramManager::get_program_by_name(builtin)?,
            };
            info.machine()?
        }
        (None, None) => {
            return Err(TuringMachineError::ValidationError(
                "Either --program or --builtin is required".to_string(),
            ))
        }
    };

    if let Some(input) = &cli.input {
        machine.set_tape(input);
    }
    if let Some(state) = &cli.state {
        // Rule text is upper-cased while parsing, so state names are too.
        machine.set_initial_state(state.to_uppercase());
    }
    if let Some(limit) = cli.limit {
        machine.set_limit(limit);
    }
    if cli.trace {
        machine.add_listener(Box::new(StepPrinter { width: cli.width }));
    }

    Ok(machine)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        list_programs();
        return ExitCode::SUCCESS;
    }

    let mut machine = match build_machine(&cli) {
        Ok(machine) => machine,
        Err(TuringMachineError::ParseError(e)) => {
            eprintln!("Parse error on line {}: {}", e.line, e.kind);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let halt = machine.run();
    let summary = RunSummary::new(&machine, halt);

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Halted: {:?}", summary.halt);
        println!("State:  {}", summary.state);
        println!("Steps:  {}", summary.steps);
        println!("Tape:   '{}'", summary.tape);
    }

    ExitCode::SUCCESS
}
