use crate::error::DecodeError;
use std::collections::HashMap;

/// Index of a word inside a [`Vocabulary`].
pub type WordIndex = usize;

/// Fixed, ordered word universe for one game configuration.
///
/// Indices are assigned in construction order and form a bijection with `0..len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
    lookup: HashMap<String, WordIndex>,
}

impl Vocabulary {
    pub fn new<I, S>(words: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashMap::new();
        for word in words {
            let word = word.into();
            if lookup.contains_key(&word) {
                return Err(DecodeError::DuplicateWord { word });
            }
            lookup.insert(word.clone(), ordered.len());
            ordered.push(word);
        }
        Ok(Self {
            words: ordered,
            lookup,
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn index_of(&self, word: &str) -> Result<WordIndex, DecodeError> {
        self.lookup
            .get(word)
            .copied()
            .ok_or_else(|| DecodeError::UnknownWord {
                word: word.to_string(),
            })
    }

    /// Maps a clue (or keyword list) onto indices, failing on the first unknown word.
    pub fn indices_of<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<WordIndex>, DecodeError> {
        words
            .iter()
            .map(|word| self.index_of(word.as_ref()))
            .collect()
    }

    pub fn word_at(&self, index: WordIndex) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }
}
