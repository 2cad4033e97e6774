use thiserror::Error;

/// Errors that abort the execution of one input line.
///
/// None of them ends the session: the caller reports the message and reads the
/// next line.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The line ended while a quote of the given kind was still open.
    #[error("syntax error: unterminated {0} quote")]
    UnterminatedQuote(char),

    /// A pipeline stage has no command in it (`| a`, `a |`, `a | | b`, or a
    /// line with nothing to run).
    ///
    /// `stage` is the zero-based index of the offending stage out of `stages`.
    #[error("{}", empty_stage_message(.stages))]
    PipelineSyntax { stage: usize, stages: usize },

    /// The stage names neither a builtin nor an executable found on the host.
    #[error("{0}: command not found")]
    UnrecognizedCommand(String),

    /// Reading upstream data or writing to the output sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An external command could not be run to completion.
    #[error(transparent)]
    Command(#[from] anyhow::Error),
}

/// Only a chain of several stages has a `|` to blame.
fn empty_stage_message(stages: &usize) -> &'static str {
    if *stages > 1 {
        "syntax error near unexpected token '|'"
    } else {
        "syntax error: empty command"
    }
}
