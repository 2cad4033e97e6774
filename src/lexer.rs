//! A module implementing lexical analysis (tokenization) of a raw input line.
//!
//! Tokens are plain strings. A token is either a single delimiter character or a
//! maximal run of non-delimiter characters, so joining the tokens back together
//! always yields the original line.

/// Opening and closing single quote.
pub const SINGLE_QUOTE: &str = "'";
/// Opening and closing double quote.
pub const DOUBLE_QUOTE: &str = "\"";
/// Variable reference sigil.
pub const DOLLAR: &str = "$";
/// Separator between pipeline stages.
pub const PIPE: &str = "|";
/// Assignment operator.
pub const EQUAL: &str = "=";

/// Returns `true` for the characters that always form a token of their own.
pub fn is_delimiter(ch: char) -> bool {
    matches!(ch, '\'' | '"' | '$' | '|' | '=') || ch.is_whitespace()
}

/// Returns `true` if the token is a single whitespace delimiter.
pub fn is_whitespace_token(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_whitespace())
}

/// Returns `true` if the token is a word, i.e. not a delimiter.
pub fn is_word_token(token: &str) -> bool {
    token.chars().next().is_some_and(|c| !is_delimiter(c))
}

struct Tokenizer<'a> {
    line: &'a str,
    word_start: Option<usize>,
    tokens: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    fn new(line: &'a str) -> Self {
        Tokenizer {
            line,
            word_start: None,
            tokens: Vec::new(),
        }
    }

    /// Walks the line once, closing the pending word at every delimiter.
    fn make_tokens(mut self) -> Vec<String> {
        for (pos, ch) in self.line.char_indices() {
            if is_delimiter(ch) {
                self.finish_word(pos);
                self.tokens
                    .push(self.line[pos..pos + ch.len_utf8()].to_string());
            } else if self.word_start.is_none() {
                self.word_start = Some(pos);
            }
        }
        self.finish_word(self.line.len());
        self.tokens
    }

    fn finish_word(&mut self, end: usize) {
        if let Some(start) = self.word_start.take() {
            self.tokens.push(self.line[start..end].to_string());
        }
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Never fails: every input, including the empty line, has a tokenization.
///
/// # Arguments
/// * `line` - The string to be tokenized.
///
/// # Returns
/// The tokens in input order.
pub fn tokenize(line: &str) -> Vec<String> {
    let tokens = Tokenizer::new(line).make_tokens();
    tracing::trace!(?tokens, "tokenized line");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    #[test]
    fn test_whitespace_runs_are_split_per_character() {
        assert_eq!(toks("1 2  34"), vec!["1", " ", "2", " ", " ", "34"]);
    }

    #[test]
    fn test_quotes_are_separate_tokens() {
        assert_eq!(toks("' aba caba'"), vec!["'", " ", "aba", " ", "caba", "'"]);
        assert_eq!(
            toks("\" aba caba\""),
            vec!["\"", " ", "aba", " ", "caba", "\""]
        );
    }

    #[test]
    fn test_dollar_pipe_and_equal_are_separate_tokens() {
        assert_eq!(toks("$x $ $z"), vec!["$", "x", " ", "$", " ", "$", "z"]);
        assert_eq!(toks("$x | $z"), vec!["$", "x", " ", "|", " ", "$", "z"]);
        assert_eq!(toks("$x= $z"), vec!["$", "x", "=", " ", "$", "z"]);
    }

    #[test]
    fn test_tabs_and_unicode_words() {
        assert_eq!(toks("héllo\twörld"), vec!["héllo", "\t", "wörld"]);
    }

    #[test]
    fn test_empty_line_has_no_tokens() {
        assert!(toks("").is_empty());
    }

    #[test]
    fn test_tokens_partition_the_line() {
        let lines = [
            "echo 'abc$x' | wc",
            "x=\"a b\"|cat  f.txt",
            "  $$ ''\"\" |||",
            "grep -A 2 'pat' file1 file2",
        ];
        for line in lines {
            assert_eq!(toks(line).concat(), line);
        }
    }

    #[test]
    fn test_token_classification() {
        assert!(is_whitespace_token(" "));
        assert!(is_whitespace_token("\t"));
        assert!(!is_whitespace_token("  "));
        assert!(is_word_token("abc"));
        assert!(!is_word_token("$"));
        assert!(!is_word_token(""));
    }
}
