use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Signal, StagePosition};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpolator;
use crate::io_adapters::StageIo;
use crate::lexer;
use crate::parser::{self, Stage};
use crate::pipe::PipeBuffer;
use crate::stage::{self, StageKind};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{Read, Write};

const PROMPT: &str = "> ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A line-oriented shell interpreter.
///
/// The interpreter owns the session state: the variable store ([`Environment`]),
/// the [`PipeBuffer`] that carries data between pipeline stages, the list of
/// [`CommandFactory`] objects queried to create commands by name, and the real
/// input and output streams. One value serves one session; nothing is global.
///
/// Example
/// ```
/// use pipeshell::{Interpreter, MemReader, MemWriter, Signal};
/// let (out, handle) = MemWriter::with_handle();
/// let mut sh = Interpreter::with_streams(MemReader::new(""), out);
/// assert_eq!(sh.execute_line("x=world").unwrap(), Signal::Continue);
/// sh.execute_line("echo hello $x | cat").unwrap();
/// assert_eq!(handle.borrow().as_slice(), b"hello world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    pipe: PipeBuffer,
    commands: Vec<Box<dyn CommandFactory>>,
    stdin: Box<dyn Read>,
    sink: Box<dyn Write>,
    process_stdin: bool,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories, wired to
    /// the process's standard input and output.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            pipe: PipeBuffer::new(),
            commands,
            stdin: Box::new(std::io::stdin()),
            sink: Box::new(std::io::stdout()),
            process_stdin: true,
        }
    }

    /// Default commands, reading from `stdin` and printing to `sink`.
    pub fn with_streams(stdin: impl Read + 'static, sink: impl Write + 'static) -> Self {
        Self {
            stdin: Box::new(stdin),
            sink: Box::new(sink),
            process_stdin: false,
            ..Self::default()
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Run a single command invocation by name with arguments, outside any
    /// pipeline.
    ///
    /// Returns the command's exit code or an error if the command cannot be created
    /// or fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<ExitCode, ShellError> {
        self.run_command(name, args, StagePosition::single())
    }

    /// Tokenize, interpolate and execute one input line.
    pub fn execute_line(&mut self, line: &str) -> Result<Signal, ShellError> {
        let tokens = lexer::tokenize(line);
        let words = interpolator::interpolate(&tokens, &self.env)?;
        tracing::trace!(?words, "interpolated line");
        let stages = parser::split_into_stages(words);
        self.execute_chain(&stages)
    }

    /// Run the stages left to right, threading the pipe buffer through them.
    ///
    /// Stages before a malformed one have already run when
    /// [`ShellError::PipelineSyntax`] is returned; their effects are kept.
    pub fn execute_chain(&mut self, stages: &[Stage]) -> Result<Signal, ShellError> {
        let result = self.run_stages(stages);
        if !matches!(result, Ok(Signal::Continue)) {
            // whatever the aborted chain left in flight must not leak into the next line
            self.pipe = PipeBuffer::new();
        }
        result
    }

    fn run_stages(&mut self, stages: &[Stage]) -> Result<Signal, ShellError> {
        let total = stages.len();
        for (index, stage) in stages.iter().enumerate() {
            if stage.is_empty() {
                tracing::debug!(stage = index, "empty pipeline stage");
                return Err(ShellError::PipelineSyntax {
                    stage: index,
                    stages: total,
                });
            }
            let position = StagePosition::new(index, total);

            self.pipe.redirect_to_input();
            if self.run_stage(stage, position)? == Signal::Exit {
                tracing::debug!(stage = index, "session exit requested");
                return Ok(Signal::Exit);
            }
            self.pipe.clear_input();
        }
        self.pipe.flush_to(&mut *self.sink)?;
        Ok(Signal::Continue)
    }

    fn run_stage(&mut self, stage: &Stage, position: StagePosition) -> Result<Signal, ShellError> {
        match stage::classify(stage) {
            StageKind::Assignment { name, value } => {
                tracing::debug!(%name, %value, "assignment");
                self.env.set_var(name, value);
                Ok(Signal::Continue)
            }
            StageKind::Command { argv } => {
                let Some((name, args)) = argv.split_first() else {
                    // only empty expansions: nothing to run
                    return Ok(Signal::Continue);
                };
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                let code = self.run_command(name, &args, position)?;
                Ok(Signal::from(code))
            }
        }
    }

    fn run_command(
        &mut self,
        name: &str,
        args: &[&str],
        position: StagePosition,
    ) -> Result<ExitCode, ShellError> {
        let cmd = self
            .create_command(name, args)
            .ok_or_else(|| ShellError::UnrecognizedCommand(name.to_string()))?;
        tracing::debug!(name, ?args, ?position, "dispatching command");

        let process_stdin = self.process_stdin;
        let mut io = StageIo::new(position, &mut self.pipe, &mut *self.stdin, &mut *self.sink)
            .with_process_stdin(process_stdin);
        let code = cmd.execute(&mut io, &mut self.env)?;
        Ok(code)
    }

    fn create_command(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
    }

    /// Read-eval-print loop on the terminal.
    ///
    /// Errors are reported on stderr and the loop goes on; it ends on `exit`,
    /// Ctrl-C or end of input.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("failed to add history entry: {}", e);
                    }
                    match self.execute_line(&line) {
                        Ok(Signal::Exit) => break,
                        Ok(Signal::Continue) => {}
                        Err(e) => eprintln!("{}", e),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `echo`, `pwd`, `exit`, `cat`, `wc`, `grep`
    /// - external command launcher, consulted last
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cat>::default()),
            Box::new(Factory::<WC>::default()),
            Box::new(Factory::<Grep>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod pipeline_tests {
    use crate::Interpreter;
    use crate::command::{ExitCode, Signal};
    use crate::error::ShellError;
    use crate::interpolator::Word;
    use crate::io_adapters::{MemReader, MemWriter};
    use crate::parser::Stage;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn interp_with_stdin(stdin: &str) -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
        let (out, handle) = MemWriter::with_handle();
        (Interpreter::with_streams(MemReader::new(stdin), out), handle)
    }

    fn interp() -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
        interp_with_stdin("")
    }

    fn printed(handle: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(handle.borrow().clone()).expect("utf8")
    }

    fn stage(tokens: &[&str]) -> Stage {
        Stage::new(tokens.iter().map(|t| Word::Bare(t.to_string())).collect())
    }

    #[test]
    fn test_echo_pipe_wc_output() {
        let (mut interp, out) = interp();
        let signal = interp.execute_line("echo \"22\" | wc").unwrap();
        assert_eq!(signal, Signal::Continue);
        assert_eq!(printed(&out), "\t1\t1\t3\n");
    }

    #[test]
    fn test_assignment_then_expansion() {
        let (mut interp, out) = interp();
        interp.execute_line("x=1").unwrap();
        assert!(printed(&out).is_empty());
        interp.execute_line("echo $x").unwrap();
        assert_eq!(printed(&out), "1\n");
    }

    #[test]
    fn test_assignment_does_not_touch_the_pipe() {
        let (mut interp, out) = interp();
        interp.execute_line("echo lost | x=1 | wc").unwrap();
        assert_eq!(printed(&out), "\t0\t0\t0\n");
        assert_eq!(interp.env().get_var("x"), Some("1"));
    }

    #[test]
    fn test_run_single_command() {
        let (mut interp, out) = interp();
        let code: ExitCode = interp.run("echo", &["hello", "world"]).unwrap();
        assert_eq!(code, 0);
        assert_eq!(printed(&out), "hello world\n");
    }

    #[test]
    fn test_single_stage_reads_stdin() {
        let (mut interp, out) = interp_with_stdin("a b\nc\n");
        interp.execute_line("wc").unwrap();
        assert_eq!(printed(&out), "\t2\t3\t6\n");
    }

    #[test]
    fn test_intermediate_stage_does_not_read_stdin() {
        let (mut interp, out) = interp_with_stdin("from stdin\n");
        interp.execute_line("echo piped | cat | cat").unwrap();
        assert_eq!(printed(&out), "piped\n");
    }

    #[test]
    fn test_only_last_stage_output_is_printed() {
        let (mut interp, out) = interp();
        interp.execute_line("echo first | echo second").unwrap();
        assert_eq!(printed(&out), "second\n");
    }

    #[test]
    fn test_pipe_buffer_is_empty_between_lines() {
        let (mut interp, out) = interp();
        interp.execute_line("echo a | cat").unwrap();
        interp.execute_line("echo b").unwrap();
        assert_eq!(printed(&out), "a\nb\n");
    }

    #[test]
    fn test_adjacent_pipes_fail_before_later_stages() {
        let (mut interp, out) = interp();
        let err = interp.execute_chain(&[
            stage(&["x", "=", "1"]),
            Stage::default(),
            stage(&["y", "=", "2"]),
        ]);
        assert!(matches!(err, Err(ShellError::PipelineSyntax { stage: 1, .. })));
        assert_eq!(interp.env().get_var("x"), Some("1"));
        assert_eq!(interp.env().get_var("y"), None);
        assert!(printed(&out).is_empty());
    }

    #[test]
    fn test_malformed_lines() {
        let (mut interp, _out) = interp();
        for line in ["pwd  |||  3| 4", "| echo a", "echo a |", "echo a | | cat", ""] {
            assert!(
                matches!(interp.execute_line(line), Err(ShellError::PipelineSyntax { .. })),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let (mut interp, _out) = interp();
        assert!(matches!(
            interp.execute_line("echo 'abc"),
            Err(ShellError::UnterminatedQuote('\''))
        ));
    }

    #[test]
    fn test_spaced_assignment_is_unrecognized_command() {
        let (mut interp, _out) = interp();
        match interp.execute_line("zzz = y") {
            Err(ShellError::UnrecognizedCommand(name)) => assert_eq!(name, "zzz"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(interp.env().get_var("zzz"), None);
    }

    #[test]
    fn test_exit_stops_the_chain() {
        let (mut interp, out) = interp();
        let signal = interp.execute_line("x=1 | exit | y=2").unwrap();
        assert_eq!(signal, Signal::Exit);
        assert_eq!(interp.env().get_var("x"), Some("1"));
        assert_eq!(interp.env().get_var("y"), None);
        assert!(printed(&out).is_empty());
    }

    #[test]
    fn test_empty_expansion_is_a_no_op() {
        let (mut interp, out) = interp();
        assert_eq!(interp.execute_line("$nothing").unwrap(), Signal::Continue);
        assert!(printed(&out).is_empty());
    }
}
