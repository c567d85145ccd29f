//! Enrollment prompt pool.

use std::sync::atomic::{AtomicUsize, Ordering};

const DEFAULT_PROMPTS: [&str; 5] = [
    "Today is a wonderful day and I am glad to be here",
    "Voice technology keeps changing the way we live",
    "Reading this sentence aloud registers my voice",
    "A voiceprint is a safe way to prove who I am",
    "Machines are learning to listen a little better every day",
];

/// Rotating pool of prompt sentences read aloud during enrollment.
pub struct PromptPool {
    texts: Vec<String>,
    cursor: AtomicUsize,
}

impl PromptPool {
    pub fn new() -> Self {
        Self::with_texts(DEFAULT_PROMPTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_texts(texts: Vec<String>) -> Self {
        assert!(!texts.is_empty(), "prompt pool needs at least one text");
        Self {
            texts,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the next prompt, cycling through the pool.
    pub fn next(&self) -> String {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.texts[index % self.texts.len()].clone()
    }
}

impl Default for PromptPool {
    fn default() -> Self {
        Self::new()
    }
}
