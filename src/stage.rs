//! Decides what a single pipeline stage is: a variable assignment or a command
//! invocation with its arguments.

use crate::interpolator::Word;
use crate::parser::Stage;

/// The two things a stage can be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKind {
    /// `name=value`: bind a variable, produce no output.
    Assignment { name: String, value: String },
    /// `argv[0]` is the command name, the rest are its arguments.
    Command { argv: Vec<String> },
}

/// Remove leading and trailing unquoted whitespace tokens.
pub fn trim(words: &[Word]) -> &[Word] {
    let start = words.iter().position(|w| !w.is_blank()).unwrap_or(words.len());
    let end = words.iter().rposition(|w| !w.is_blank()).map_or(start, |i| i + 1);
    &words[start..end]
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Classify a (non-empty) stage.
///
/// It is an assignment only when an unquoted valid name is *immediately*
/// followed by an unquoted `=`. `x = 1` is therefore the command `x` with the
/// arguments `=` and `1`.
pub fn classify(stage: &Stage) -> StageKind {
    let words = trim(&stage.words);
    if let [Word::Bare(name), eq, rest @ ..] = words {
        if is_valid_name(name) && eq.is_equal() {
            return StageKind::Assignment {
                name: name.clone(),
                value: rest.iter().map(Word::text).collect(),
            };
        }
    }
    StageKind::Command {
        argv: split_arguments(words),
    }
}

/// Group expanded tokens into command-line arguments.
///
/// Unquoted whitespace separates arguments and adjacent tokens are joined, so
/// `"abc"$x` is one argument. The value of an unquoted `$name` is further split
/// on whitespace; quoted text never is.
pub fn split_arguments(words: &[Word]) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current: Option<String> = None;

    for word in words {
        match word {
            w if w.is_blank() => argv.extend(current.take()),
            Word::Bare(text) | Word::Quoted(text) => {
                current.get_or_insert_with(String::new).push_str(text);
            }
            Word::Expansion(value) => {
                if value.starts_with(char::is_whitespace) {
                    argv.extend(current.take());
                }
                let mut fields = value.split_whitespace();
                if let Some(first) = fields.next() {
                    current.get_or_insert_with(String::new).push_str(first);
                }
                for field in fields {
                    argv.extend(current.replace(field.to_string()));
                }
                if value.ends_with(char::is_whitespace) {
                    argv.extend(current.take());
                }
            }
        }
    }
    argv.extend(current);
    argv
}
