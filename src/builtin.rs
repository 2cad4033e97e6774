use crate::command::{CommandFactory, ExecutableCommand, ExitCode, SESSION_EXIT};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::io_adapters::StageIo;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use regex::RegexBuilder;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process. They read upstream data with [`StageIo::read_input`] and write into
/// the pipe through `io`; flushing to the real sink is done by the adapter below,
/// never by the command itself.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "grep".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let code = match <T as BuiltinCommand>::execute(*self, io, env) {
            Ok(x) => x,
            Err(e) => {
                tracing::debug!(command = T::name(), error = %e, "builtin failed");
                writeln!(io, "{e:#}")?;
                1
            }
        };
        io.flush()?;
        Ok(code)
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, io: &mut StageIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        io.append_output(&self.output);
        if !self.output.ends_with('\n') {
            io.append_output("\n");
        }
        io.flush()?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Resolve a file argument against the session's working directory.
fn resolve(env: &Environment, file: &str) -> PathBuf {
    env.current_dir.join(file)
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        writeln!(io, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// End the shell session.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _io: &mut StageIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        Ok(SESSION_EXIT)
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, io: &mut StageIo<'_>, _env: &mut Environment) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(io, "{}", s)?;
        } else {
            writeln!(io, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

impl Counts {
    fn of(text: &str) -> Self {
        Self {
            lines: text.lines().count(),
            words: text.split_whitespace().count(),
            bytes: text.len(),
        }
    }

    fn add(&mut self, other: Counts) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
    }
}

/// Each count is preceded by a tab: `\t2\t4\t22`.
impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{}\t{}\t{}", self.lines, self.words, self.bytes)
    }
}

#[derive(FromArgs)]
/// count lines, words and bytes
pub struct WC {
    #[argh(positional, greedy)]
    /// files to count. If none provided, counts the input.
    pub files: Vec<String>,
}

impl BuiltinCommand for WC {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(self, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        if self.files.is_empty() {
            let buf = io.read_input()?;
            let c = Counts::of(&buf);
            writeln!(io, "{}", c)?;
            return Ok(0);
        }
        let mut total = Counts::default();
        let mut exit_code = 0;
        for fname in &self.files {
            match fs::read(resolve(env, fname)) {
                Ok(bytes) => {
                    let c = Counts::of(&String::from_utf8_lossy(&bytes));
                    writeln!(io, "{} {}", c, fname)?;
                    total.add(c);
                }
                Err(e) => {
                    writeln!(io, "wc: {}: {}", fname, e)?;
                    exit_code = 1;
                }
            }
        }
        if self.files.len() > 1 {
            writeln!(io, "{} total", total)?;
        }
        Ok(exit_code)
    }
}

#[derive(FromArgs)]
/// print file(s) to stdout
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print. If none provided, copies the input.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        if self.files.is_empty() {
            let buf = io.read_input_bytes()?;
            io.write_all(&buf)?;
            return Ok(0);
        }
        let mut exit_code = 0;
        for fname in &self.files {
            match fs::File::open(resolve(env, fname)) {
                Ok(mut f) => {
                    if let Err(e) = std::io::copy(&mut f, io) {
                        writeln!(io, "cat: {}: {}", fname, e)?;
                        exit_code = 1;
                    }
                }
                Err(e) => {
                    writeln!(io, "cat: {}: {}", fname, e)?;
                    exit_code = 1;
                }
            }
        }
        Ok(exit_code)
    }
}

#[derive(FromArgs)]
/// print lines matching a pattern
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search. If none provided, reads the input.
    pub files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl Grep {
    fn process_source(
        &self,
        text: &str,
        io: &mut StageIo<'_>,
        file_name: Option<&str>,
        re: &regex::Regex,
    ) -> Result<()> {
        let lines: Vec<&str> = text.lines().collect();
        let total_lines = lines.len();
        let mut to_print = vec![false; total_lines];

        for (i, line) in lines.iter().enumerate() {
            if re.is_match(line) {
                let end_print = i
                    .saturating_add(self.after_context)
                    .saturating_add(1)
                    .min(total_lines);
                to_print[i..end_print].fill(true);
            }
        }

        let prefix = file_name
            .map(|name| format!("{}:", name))
            .unwrap_or_default();
        let mut last_printed_index: Option<usize> = None;

        for (i, line) in lines.iter().enumerate() {
            if !to_print[i] {
                continue;
            }
            if self.after_context > 0 && last_printed_index.is_some_and(|last| i > last + 1) {
                writeln!(io, "--")?;
            }
            writeln!(io, "{}{}", prefix, line)?;
            last_printed_index = Some(i);
        }

        Ok(())
    }
}

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn execute(self, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };

        let re = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("grep: invalid regex pattern: {}", pattern))?;

        if self.files.is_empty() {
            let text = io.read_input()?;
            self.process_source(&text, io, None, &re)?;
            return Ok(0);
        }

        let show_names = self.files.len() > 1;
        let mut final_exit_code = 0;
        for file_name in &self.files {
            match fs::read(resolve(env, file_name)) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let label = show_names.then_some(file_name.as_str());
                    self.process_source(&text, io, label, &re)?;
                }
                Err(e) => {
                    writeln!(io, "grep: {}: {}", file_name, e)?;
                    final_exit_code = 1;
                }
            }
        }
        Ok(final_exit_code)
    }
}
