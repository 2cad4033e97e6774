use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::path::PathBuf;

/// Mutable, per-session state visible to commands.
///
/// The environment contains:
/// - `vars`: the shell variables bound by assignment stages (`name=value`).
/// - `current_dir`: the working directory used by `pwd`, file arguments and
///   external commands.
///
/// Shell variables are not imported from, nor exported to, the process
/// environment. They live as long as the session.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Bound shell variables. Keys are unique; assignment overwrites.
    pub vars: HashMap<String, String>,
    /// The working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Start a session with no variables in the process's working directory.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: HashMap::new(),
            current_dir,
        }
    }

    /// Get the value of a shell variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value used by `$name` expansion: unbound names expand to the empty string.
    pub fn expand(&self, key: &str) -> &str {
        self.get_var(key).unwrap_or_default()
    }

    /// Bind or rebind a shell variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Search path for external commands, taken from the process environment.
    pub fn search_path(&self) -> Option<OsString> {
        stdenv::var_os("PATH")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::new();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_VAR_12345"), None);

        env.set_var("KEY", "VALUE");
        assert_eq!(env.get_var("KEY"), Some("VALUE"));

        env.set_var("KEY", "OTHER");
        assert_eq!(env.get_var("KEY"), Some("OTHER"));
    }

    #[test]
    fn test_unbound_variable_expands_to_empty() {
        let env = Environment::new();
        assert_eq!(env.expand("nothing_here"), "");
    }

    #[test]
    fn test_process_environment_is_not_imported() {
        let env = Environment::new();
        assert_eq!(env.get_var("PATH"), None);
        assert!(env.search_path().is_some());
    }
}
