//! A small line-oriented shell interpreter.
//!
//! A line goes through a fixed pipeline: [`lexer`] splits it into tokens,
//! [`interpolator`] resolves quoting and `$name` references against the session
//! variables, [`parser`] cuts the result into pipeline stages at every unquoted
//! `|`, and [`Interpreter`] runs the stages left to right. Each stage is either a
//! `name=value` assignment or a command invocation; commands are builtins
//! implemented in Rust or external programs found through `PATH`.
//!
//! Data flows between stages through a [`pipe::PipeBuffer`]; only the last stage
//! of a chain writes to the real output.

mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod external;
pub mod interpolator;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod pipe;
pub mod stage;

/// The session object.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use command::Signal;
pub use error::ShellError;
pub use io_adapters::{MemReader, MemWriter};
