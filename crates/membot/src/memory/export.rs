//! Writing conversation exports to disk

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::memory::types::ConversationExport;

/// Message shown to users when an export cannot be produced
pub const EXPORT_FAILED_MESSAGE: &str = "Failed to export conversation";

/// `conversation_YYYYMMDD_HHMMSS.json` for the given local time
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("conversation_{}.json", at.format("%Y%m%d_%H%M%S"))
}

impl ConversationExport {
    /// Pretty-printed JSON in the export file format
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the export into `dir` under a timestamped file name
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(export_file_name(Local::now()));
        std::fs::write(&path, self.to_json_pretty()?)?;
        tracing::info!("Conversation exported to {}", path.display());
        Ok(path)
    }
}
