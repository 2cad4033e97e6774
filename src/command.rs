use crate::env::Environment;
use crate::io_adapters::StageIo;
use anyhow::Result;

/// Conventional exit status type used by commands.
///
/// A value of 0 indicates success; positive values indicate failure but let the
/// session continue. [`SESSION_EXIT`] asks the interpreter to end the session.
pub type ExitCode = i32;

/// Status returned by a command that wants the session to terminate.
pub const SESSION_EXIT: ExitCode = -1;

/// What the interpreter should do after a line (or a stage) has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Exit,
}

impl From<ExitCode> for Signal {
    fn from(code: ExitCode) -> Self {
        if code == SESSION_EXIT {
            Signal::Exit
        } else {
            Signal::Continue
        }
    }
}

/// Where a stage sits in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The only stage: first and last at once.
    Single,
    First,
    Last,
    Intermediate,
}

/// Position of a stage within its pipeline.
///
/// Commands use it to pick their input source (real stdin only for a single
/// stage) and to know whether their output may reach the real sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePosition {
    index: usize,
    total: usize,
}

impl StagePosition {
    /// `index` is zero-based and must be less than `total`.
    pub fn new(index: usize, total: usize) -> Self {
        debug_assert!(index < total, "stage {index} out of {total}");
        Self { index, total }
    }

    /// Position of a command run outside any pipeline.
    pub fn single() -> Self {
        Self::new(0, 1)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn placement(&self) -> Placement {
        if self.total == 1 {
            Placement::Single
        } else if self.index == 0 {
            Placement::First
        } else if self.index + 1 == self.total {
            Placement::Last
        } else {
            Placement::Intermediate
        }
    }

    pub fn is_single(&self) -> bool {
        self.placement() == Placement::Single
    }

    /// True for the stage whose output goes to the real sink (last or single).
    pub fn is_last(&self) -> bool {
        matches!(self.placement(), Placement::Last | Placement::Single)
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, reading and writing through `io`.
    fn execute(self: Box<Self>, io: &mut StageIo<'_>, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement() {
        assert_eq!(StagePosition::new(0, 1).placement(), Placement::Single);
        assert_eq!(StagePosition::new(0, 3).placement(), Placement::First);
        assert_eq!(StagePosition::new(1, 3).placement(), Placement::Intermediate);
        assert_eq!(StagePosition::new(2, 3).placement(), Placement::Last);
    }

    #[test]
    fn test_last_includes_single() {
        assert!(StagePosition::single().is_last());
        assert!(StagePosition::new(1, 2).is_last());
        assert!(!StagePosition::new(0, 2).is_last());
        assert!(!StagePosition::new(0, 2).is_single());
    }

    #[test]
    fn test_position_accessors() {
        let pos = StagePosition::new(2, 5);
        assert_eq!((pos.index(), pos.total()), (2, 5));
        assert_eq!(StagePosition::single().total(), 1);
    }

    #[test]
    fn test_signal_from_exit_code() {
        assert_eq!(Signal::from(0), Signal::Continue);
        assert_eq!(Signal::from(1), Signal::Continue);
        assert_eq!(Signal::from(SESSION_EXIT), Signal::Exit);
    }
}
