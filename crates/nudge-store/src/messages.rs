//! Message pool — the candidate bodies for scheduled sends.
//!
//! Loaded once per process from a JSON array of strings. Anything wrong with
//! the source (absent, unreadable, not a string array) falls back to a small
//! built-in set so the bot always has something to say.

use std::path::Path;

use rand::seq::SliceRandom;

/// Built-in fallback used when the external pool cannot be loaded.
const FALLBACK: &[&str] = &[
    "Time for a nudge! One small step now beats a big plan later.",
    "Quick reminder: fifteen focused minutes still count as progress.",
    "Your future self is cheering — pick one thing and move it forward.",
];

/// Ordered collection of message bodies.
#[derive(Debug, Clone)]
pub struct MessagePool {
    messages: Vec<String>,
}

impl MessagePool {
    /// Load from a JSON file, falling back to the built-in set.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Some(messages) if !messages.is_empty() => {
                tracing::info!("Loaded {} messages from {}", messages.len(), path.display());
                Self { messages }
            }
            _ => {
                tracing::warn!(
                    "Cannot load message pool from {}, using built-in fallback",
                    path.display()
                );
                Self::fallback()
            }
        }
    }

    fn try_load(path: &Path) -> Option<Vec<String>> {
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str::<Vec<String>>(&content).ok()
    }

    /// The built-in minimal pool.
    pub fn fallback() -> Self {
        Self {
            messages: FALLBACK.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// One body chosen uniformly at random.
    pub fn pick(&self) -> &str {
        self.messages
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK[0])
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, body: &str) -> bool {
        self.messages.iter().any(|m| m == body)
    }
}
