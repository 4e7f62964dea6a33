//! Running digest of human-authored turns
//!
//! The digest is folded incrementally: each human turn is passed with the
//! current digest to the external [`Summarizer`]. It is independent of the
//! window, so evicted turns stay represented, and is reset only by `clear`.

use std::sync::Arc;

use crate::llm::{LlmError, Summarizer};

/// Returned by [`SummaryAccumulator::digest`] before anything is absorbed
pub const NO_HISTORY_SUMMARY: &str = "No conversation history available.";

pub struct SummaryAccumulator {
    summarizer: Arc<dyn Summarizer>,
    digest: String,
    absorbed: usize,
}

impl SummaryAccumulator {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summarizer,
            digest: String::new(),
            absorbed: 0,
        }
    }

    /// Fold one human turn into the digest.
    ///
    /// On failure the previous digest is kept unchanged.
    pub async fn absorb(&mut self, human_text: &str) -> Result<(), LlmError> {
        let updated = self.summarizer.summarize(&self.digest, human_text).await?;
        self.digest = updated;
        self.absorbed += 1;
        Ok(())
    }

    pub fn digest(&self) -> &str {
        if self.absorbed == 0 {
            NO_HISTORY_SUMMARY
        } else {
            &self.digest
        }
    }

    pub fn has_summary(&self) -> bool {
        self.absorbed > 0 && !self.digest.is_empty()
    }

    /// Number of human turns folded in since the last clear
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    pub fn clear(&mut self) {
        self.digest.clear();
        self.absorbed = 0;
    }
}

impl std::fmt::Debug for SummaryAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryAccumulator")
            .field("digest", &self.digest)
            .field("absorbed", &self.absorbed)
            .finish()
    }
}
