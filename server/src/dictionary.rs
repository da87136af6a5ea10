//! Word source for new rounds.

use crate::error::ServerError;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};

/// In-memory word list with uniform random selection.
#[derive(Debug)]
pub struct Dictionary {
    words: Vec<String>,
    rng: StdRng,
}

impl Dictionary {
    /// Reads one word per line from `path`.
    ///
    /// Blank lines and entries containing anything but lowercase ASCII letters
    /// are skipped, since guesses can only ever be `a`..=`z`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ServerError::Dictionary {
            path: path.to_path_buf(),
            source,
        })?;

        let dictionary = Self::build(contents.lines().map(str::to_string), path.to_path_buf())?;
        info!("Loaded {} words from {}", dictionary.len(), path.display());
        Ok(dictionary)
    }

    pub fn from_words<I>(words: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = String>,
    {
        Self::build(words, PathBuf::from("<memory>"))
    }

    fn build<I>(words: I, path: PathBuf) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = String>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| is_playable(w))
            .collect();

        if words.is_empty() {
            return Err(ServerError::EmptyDictionary { path });
        }

        Ok(Self {
            words,
            rng: StdRng::from_entropy(),
        })
    }

    /// Picks the secret for the next round.
    pub fn random_word(&mut self) -> String {
        let index = self.rng.gen_range(0..self.words.len());
        self.words[index].clone()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_playable(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase())
}
