//! Quote removal and variable expansion.
//!
//! The interpolator walks the raw tokens with a three-state machine (bare,
//! single-quoted, double-quoted). Quote tokens are consumed, `$name` pairs are
//! replaced by the bound value and everything else is passed through. Adjacent
//! tokens are never merged here; the stage executor decides how tokens form
//! arguments.

use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer::{self, DOLLAR, DOUBLE_QUOTE, EQUAL, PIPE, SINGLE_QUOTE};

/// An expanded token, tagged with where its text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    /// Unquoted text. Whitespace, `|` and `=` keep their special meaning.
    Bare(String),
    /// Text that appeared between quotes. Always literal.
    Quoted(String),
    /// The value of an unquoted `$name` reference.
    Expansion(String),
}

impl Word {
    pub fn text(&self) -> &str {
        match self {
            Word::Bare(s) | Word::Quoted(s) | Word::Expansion(s) => s,
        }
    }

    /// Unquoted whitespace delimiter.
    pub fn is_blank(&self) -> bool {
        matches!(self, Word::Bare(s) if lexer::is_whitespace_token(s))
    }

    /// Unquoted `|`.
    pub fn is_pipe(&self) -> bool {
        matches!(self, Word::Bare(s) if s == PIPE)
    }

    /// Unquoted `=`.
    pub fn is_equal(&self) -> bool {
        matches!(self, Word::Bare(s) if s == EQUAL)
    }
}

/// Quoting state of the interpolator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteState {
    Bare,
    SingleQuoted,
    DoubleQuoted,
}

impl QuoteState {
    /// The quote character that closes this state.
    fn closing_quote(self) -> Option<char> {
        match self {
            QuoteState::Bare => None,
            QuoteState::SingleQuoted => Some('\''),
            QuoteState::DoubleQuoted => Some('"'),
        }
    }
}

/// What the machine does with the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the token and switch to the given state.
    Switch(QuoteState),
    /// Replace the token and the following name with the variable's value.
    Expand,
    /// Pass the token through unchanged.
    Emit,
}

/// Transition table of the quoting machine.
///
/// `next` is the token right after `token`, with no token in between; it only
/// matters for `$`, which expands when followed by a word.
pub fn transition(state: QuoteState, token: &str, next: Option<&str>) -> Action {
    let names_variable = token == DOLLAR && next.is_some_and(lexer::is_word_token);
    match state {
        QuoteState::Bare => match token {
            SINGLE_QUOTE => Action::Switch(QuoteState::SingleQuoted),
            DOUBLE_QUOTE => Action::Switch(QuoteState::DoubleQuoted),
            _ if names_variable => Action::Expand,
            _ => Action::Emit,
        },
        QuoteState::SingleQuoted => match token {
            SINGLE_QUOTE => Action::Switch(QuoteState::Bare),
            _ => Action::Emit,
        },
        QuoteState::DoubleQuoted => match token {
            DOUBLE_QUOTE => Action::Switch(QuoteState::Bare),
            _ if names_variable => Action::Expand,
            _ => Action::Emit,
        },
    }
}

/// Remove quotes and expand variable references.
///
/// # Arguments
/// * `tokens` - Raw tokens as produced by [`crate::lexer::tokenize`].
/// * `env` - Variable store used to resolve `$name`; never modified.
///
/// # Returns
/// The expanded tokens, or [`ShellError::UnterminatedQuote`] if the input ends
/// inside quotes.
pub fn interpolate<S: AsRef<str>>(tokens: &[S], env: &Environment) -> Result<Vec<Word>, ShellError> {
    let mut state = QuoteState::Bare;
    let mut words = Vec::with_capacity(tokens.len());
    let mut pos = 0;

    while let Some(token) = tokens.get(pos).map(AsRef::as_ref) {
        let next = tokens.get(pos + 1).map(AsRef::as_ref);
        match transition(state, token, next) {
            Action::Switch(to) => {
                state = to;
                pos += 1;
            }
            Action::Expand => {
                // `next` is a word, checked by the transition table
                let name = next.unwrap_or_default();
                let value = env.expand(name).to_string();
                tracing::trace!(name, value = %value, "expanding variable");
                words.push(match state {
                    QuoteState::Bare => Word::Expansion(value),
                    _ => Word::Quoted(value),
                });
                pos += 2;
            }
            Action::Emit => {
                let text = token.to_string();
                words.push(match state {
                    QuoteState::Bare => Word::Bare(text),
                    _ => Word::Quoted(text),
                });
                pos += 1;
            }
        }
    }

    match state.closing_quote() {
        Some(quote) => Err(ShellError::UnterminatedQuote(quote)),
        None => Ok(words),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn joined(words: &[Word]) -> String {
        words.iter().map(Word::text).collect()
    }

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let mut env = Environment::new();
        for (k, v) in pairs {
            env.set_var(*k, *v);
        }
        env
    }

    #[test]
    fn test_bare_transitions() {
        use QuoteState::*;
        assert_eq!(transition(Bare, "'", None), Action::Switch(SingleQuoted));
        assert_eq!(transition(Bare, "\"", None), Action::Switch(DoubleQuoted));
        assert_eq!(transition(Bare, "$", Some("x")), Action::Expand);
        assert_eq!(transition(Bare, "$", Some(" ")), Action::Emit);
        assert_eq!(transition(Bare, "$", Some("$")), Action::Emit);
        assert_eq!(transition(Bare, "$", None), Action::Emit);
        assert_eq!(transition(Bare, "|", None), Action::Emit);
    }

    #[test]
    fn test_single_quoted_transitions() {
        use QuoteState::*;
        assert_eq!(transition(SingleQuoted, "'", None), Action::Switch(Bare));
        assert_eq!(transition(SingleQuoted, "$", Some("x")), Action::Emit);
        assert_eq!(transition(SingleQuoted, "\"", None), Action::Emit);
    }

    #[test]
    fn test_double_quoted_transitions() {
        use QuoteState::*;
        assert_eq!(transition(DoubleQuoted, "\"", None), Action::Switch(Bare));
        assert_eq!(transition(DoubleQuoted, "$", Some("x")), Action::Expand);
        assert_eq!(transition(DoubleQuoted, "$", Some(" ")), Action::Emit);
        assert_eq!(transition(DoubleQuoted, "'", None), Action::Emit);
    }

    #[test]
    fn test_single_quotes_keep_content_verbatim() {
        let env = env_with(&[("x", "y")]);
        let words = interpolate(&["'", "1", " ", "$", "x", "9", "'"], &env).unwrap();
        assert_eq!(joined(&words), "1 $x9");
        assert!(words.iter().all(|w| matches!(w, Word::Quoted(_))));
    }

    #[test]
    fn test_double_quotes_expand_variables() {
        let env = env_with(&[("x", "y")]);
        let words = interpolate(&["\"", "1", " ", "$", "x", "9", "\""], &env).unwrap();
        assert_eq!(joined(&words), "1 y9");
    }

    #[test]
    fn test_unterminated_quotes_fail() {
        let env = Environment::new();
        assert!(matches!(
            interpolate(&["'", "1", " ", "2"], &env),
            Err(ShellError::UnterminatedQuote('\''))
        ));
        assert!(matches!(
            interpolate(&["\"", "1", " ", "4"], &env),
            Err(ShellError::UnterminatedQuote('"'))
        ));
    }

    #[test]
    fn test_balanced_quotes_of_both_kinds_succeed() {
        let env = Environment::new();
        for line in ["'a\"b'", "\"a'b\"", "'x' \"y\" ''", "\"\"''\"'\"'\"'"] {
            assert!(interpolate(&tokenize(line), &env).is_ok(), "{line}");
        }
    }

    #[test]
    fn test_existing_variable_expands_to_one_token() {
        let env = env_with(&[("x", "y")]);
        let words = interpolate(&["$", "x"], &env).unwrap();
        assert_eq!(words, vec![Word::Expansion("y".to_string())]);
    }

    #[test]
    fn test_missing_variable_expands_to_empty() {
        let env = env_with(&[("x", "y")]);
        let words = interpolate(&["$", "z"], &env).unwrap();
        assert_eq!(words, vec![Word::Expansion(String::new())]);
    }

    #[test]
    fn test_dollar_without_name_is_kept() {
        let env = env_with(&[("x", "y")]);
        let words = interpolate(&["$", " ", "x"], &env).unwrap();
        assert_eq!(
            words,
            vec![
                Word::Bare("$".to_string()),
                Word::Bare(" ".to_string()),
                Word::Bare("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_line_is_unchanged() {
        let env = Environment::new();
        let line = "wc  file.txt | cat|grep -i x";
        let words = interpolate(&tokenize(line), &env).unwrap();
        assert_eq!(joined(&words), line);
        assert!(words.iter().all(|w| matches!(w, Word::Bare(_))));
    }

    #[test]
    fn test_quoted_delimiters_lose_their_meaning() {
        let env = Environment::new();
        let words = interpolate(&tokenize("'a|b' \"c=d\""), &env).unwrap();
        assert!(!words.iter().any(Word::is_pipe));
        assert!(!words.iter().any(Word::is_equal));
        assert_eq!(words.iter().filter(|w| w.is_blank()).count(), 1);
    }
}
