use crate::interpolator::Word;

/// One segment of a pipeline: the expanded tokens between two `|` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    pub words: Vec<Word>,
}

impl Stage {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// A stage with nothing but unquoted whitespace has no command to run.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(Word::is_blank)
    }
}

/// Split the expanded tokens of a line into stages at every unquoted `|`.
///
/// Empty runs are kept as empty stages: `|` at either end or two separators in
/// a row produce a stage for which [`Stage::is_empty`] holds. Rejecting them is
/// left to the chain executor so the error points at a specific stage.
///
/// The result always has one more stage than there are separators, so an empty
/// token list yields a single empty stage.
pub fn split_into_stages(words: Vec<Word>) -> Vec<Stage> {
    let mut stages = Vec::new();
    let mut current = Vec::new();

    for word in words {
        if word.is_pipe() {
            stages.push(Stage::new(std::mem::take(&mut current)));
        } else {
            current.push(word);
        }
    }
    stages.push(Stage::new(current));

    tracing::trace!(count = stages.len(), "split line into stages");
    stages
}
