//! pipeshell entry point.
//!
//! Usage:
//!   pipeshell                  # Interactive REPL
//!   pipeshell -c <line>        # Execute one line and exit

use std::process::ExitCode;

use argh::FromArgs;
use pipeshell::{Interpreter, Signal};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// A small shell with pipelines, quoting and variables.
#[derive(FromArgs)]
struct Args {
    /// execute a single line and exit
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// log debug events to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut interpreter = Interpreter::default();
    match args.command {
        Some(line) => match interpreter.execute_line(&line) {
            Ok(Signal::Continue | Signal::Exit) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
        None => match interpreter.repl() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
