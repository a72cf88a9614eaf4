//! Windowed sentence extraction.
//!
//! The corpus is read line by line and split on literal spaces; every 250th
//! word closes a window. Words left over at the end of the file never fill a
//! window and are discarded.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of words in one training window.
pub const WINDOW_WORDS: usize = 250;

/// Immutable, indexable collection of fixed-size text windows.
pub struct WindowDataset {
    windows: Vec<String>,
    discarded_words: usize,
}

impl WindowDataset {
    pub fn from_text_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open corpus {:?}", path))?;
        let reader = BufReader::new(file);

        let mut windows = Vec::new();
        let mut words: Vec<String> = Vec::with_capacity(WINDOW_WORDS);

        for line in reader.lines() {
            let line = line.with_context(|| format!("failed to read corpus {:?}", path))?;
            for word in line.split(' ') {
                words.push(word.to_string());
                if words.len() == WINDOW_WORDS {
                    windows.push(words.join(" "));
                    words.clear();
                }
            }
        }

        Ok(Self {
            windows,
            discarded_words: words.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<&str> {
        match self.windows.get(idx) {
            Some(window) => Ok(window),
            None => bail!("window index {} out of range (dataset holds {})", idx, self.len()),
        }
    }

    pub fn windows(&self) -> &[String] {
        &self.windows
    }

    /// Words at the end of the corpus that did not fill a window.
    pub fn discarded_words(&self) -> usize {
        self.discarded_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(words: usize, per_line: usize) -> Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        for start in (0..words).step_by(per_line) {
            let end = (start + per_line).min(words);
            let line: Vec<String> = (start..end).map(|i| format!("w{i}")).collect();
            writeln!(file, "{}", line.join(" "))?;
        }
        Ok(file)
    }

    #[test]
    fn window_count_is_floor_of_word_count() -> Result<()> {
        let file = write_corpus(612, 40)?;
        let dataset = WindowDataset::from_text_file(file.path())?;
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.discarded_words(), 112);
        Ok(())
    }

    #[test]
    fn windows_hold_exactly_250_words_in_corpus_order() -> Result<()> {
        let file = write_corpus(500, 37)?;
        let dataset = WindowDataset::from_text_file(file.path())?;
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.discarded_words(), 0);

        let first: Vec<&str> = dataset.get(0)?.split(' ').collect();
        let second: Vec<&str> = dataset.get(1)?.split(' ').collect();
        assert_eq!(first.len(), WINDOW_WORDS);
        assert_eq!(second.len(), WINDOW_WORDS);
        assert_eq!(first[0], "w0");
        assert_eq!(first[249], "w249");
        assert_eq!(second[0], "w250");
        assert_eq!(second[249], "w499");
        Ok(())
    }

    #[test]
    fn short_corpus_yields_empty_dataset() -> Result<()> {
        let file = write_corpus(100, 10)?;
        let dataset = WindowDataset::from_text_file(file.path())?;
        assert!(dataset.is_empty());
        assert_eq!(dataset.discarded_words(), 100);
        Ok(())
    }

    #[test]
    fn out_of_range_index_is_an_error() -> Result<()> {
        let file = write_corpus(250, 25)?;
        let dataset = WindowDataset::from_text_file(file.path())?;
        assert!(dataset.get(0).is_ok());
        assert!(dataset.get(1).is_err());
        Ok(())
    }

    #[test]
    fn missing_corpus_is_an_io_error() {
        assert!(WindowDataset::from_text_file("does/not/exist.txt").is_err());
    }
}
