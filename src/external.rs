use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::io_adapters::StageIo;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Command that is not a builtin: a program found on the host.
pub struct ExternalCommand {
    name: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, args: Vec<OsString>) -> Self {
        Self { name, args }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = env.search_path().unwrap_or_default();
        let executable = find_command_path(&search_paths, Path::new(name))?;
        tracing::debug!(name, path = %executable.display(), "resolved external command");
        Some(Box::new(ExternalCommand::new(
            executable.as_os_str().to_owned(),
            args.iter().map(|x| x.into()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Runs the program to completion.
    ///
    /// A single stage of a session reading the process's standard input shares
    /// it with the program. Otherwise the program is fed what a builtin would
    /// read: the session's input stream or the upstream bytes. Its standard
    /// output is captured into the pipe like a builtin's.
    fn execute(self: Box<Self>, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode> {
        let inherit_stdin = io.reads_process_stdin();
        let input = if inherit_stdin {
            Vec::new()
        } else {
            io.read_input_bytes()?
        };

        let mut child = std::process::Command::new(&self.name)
            .args(&self.args)
            .stdin(if inherit_stdin {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .current_dir(&env.current_dir)
            .spawn()
            .with_context(|| format!("{}: failed to spawn", self.name.to_string_lossy()))?;

        // Feed stdin from a helper thread so a chatty child cannot deadlock us.
        let feeder = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || match stdin.write_all(&input) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            })
        });

        let output = child.wait_with_output()?;
        if let Some(feeder) = feeder {
            feeder
                .join()
                .map_err(|_| anyhow::anyhow!("stdin writer panicked"))??;
        }

        io.write_all(&output.stdout)?;
        io.flush()?;

        match output.status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(output.status)),
        }
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else {
        255
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}
