//! Overlapping word-window chunker.
//!
//! Character budgets are converted to word budgets (four characters per
//! word). Each window holds `words_per_chunk` words; the next one starts
//! `words_per_chunk - words_overlap` words later, so neighbours share
//! `words_overlap` words. The first window that reaches the last word is the
//! final one, and it may be shorter than the rest.

use tracing::debug;

use reqminer_shared::{Chunk, ChunkConfig, Result};

/// Splits text into overlapping word windows.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    words_per_chunk: usize,
    words_overlap: usize,
}

impl TextChunker {
    /// Build a chunker, rejecting windows that would never advance.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            words_per_chunk: config.words_per_chunk(),
            words_overlap: config.words_overlap(),
        })
    }

    pub fn words_per_chunk(&self) -> usize {
        self.words_per_chunk
    }

    pub fn words_overlap(&self) -> usize {
        self.words_overlap
    }

    /// Lazily iterate the windows of `text`.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            words: text.split_whitespace().collect(),
            start: 0,
            index: 0,
            words_per_chunk: self.words_per_chunk,
            step: self.words_per_chunk - self.words_overlap,
            finished: false,
        }
    }

    /// Collect every window of `text`.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self.chunks(text).collect();
        debug!(
            chunks = chunks.len(),
            words_per_chunk = self.words_per_chunk,
            words_overlap = self.words_overlap,
            "text chunked"
        );
        chunks
    }
}

/// Chunk `text` with a one-off chunker.
pub fn chunk_text(text: &str, config: ChunkConfig) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(config)?.chunk(text))
}

/// Iterator over the windows of one text. Not restartable.
#[derive(Debug)]
pub struct Chunks<'a> {
    words: Vec<&'a str>,
    start: usize,
    index: usize,
    words_per_chunk: usize,
    step: usize,
    finished: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.finished || self.start >= self.words.len() {
            return None;
        }

        let end = (self.start + self.words_per_chunk).min(self.words.len());
        let window = &self.words[self.start..end];
        let chunk = Chunk {
            index: self.index,
            text: window.join(" "),
            word_count: window.len(),
        };

        if end == self.words.len() {
            self.finished = true;
        } else {
            self.start += self.step;
        }
        self.index += 1;

        Some(chunk)
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
