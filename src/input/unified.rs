// Unified key source module
//
// Combines several key sources (terminal, gamepad) behind one KeySource.
// Sources are asked in order and the first key wins, which keeps the sampler
// at one key per poll.

use super::{KeyCode, KeySource};

/// Key source that asks each inner source in turn
#[derive(Default)]
pub struct ChainKeys {
    sources: Vec<Box<dyn KeySource>>,
}

impl ChainKeys {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source
    pub fn push(&mut self, source: Box<dyn KeySource>) {
        self.sources.push(source);
    }

    /// Builder form of `push`
    pub fn with(mut self, source: Box<dyn KeySource>) -> Self {
        self.push(source);
        self
    }

    /// Number of sources in the chain
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the chain has no sources
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl KeySource for ChainKeys {
    fn poll_key(&mut self) -> Option<KeyCode> {
        self.sources.iter_mut().find_map(|source| source.poll_key())
    }
}
