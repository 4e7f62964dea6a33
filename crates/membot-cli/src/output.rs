use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membot::chat::BotInfo;
use membot::memory::{ConversationExport, MemoryStats};

use crate::error::CliResult;

#[derive(Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_stats(stats: &MemoryStats, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        OutputFormat::Table => {
            let metadata = &stats.conversation_metadata;
            let mut table = new_table();
            table.set_header(["Field", "Value"]);
            table.add_row(["Total Messages", &stats.total_messages.to_string()]);
            table.add_row(["Window Size", &stats.window_size.to_string()]);
            table.add_row(["Has Summary", yes_no(stats.has_summary)]);
            table.add_row(["Memory Type", &stats.memory_type]);
            table.add_row(["Start Time", &format_timestamp(&metadata.start_time)]);
            table.add_row(["Message Count", &metadata.message_count.to_string()]);
            table.add_row(["Total Tokens", &metadata.total_tokens.to_string()]);
            Ok(format!("Memory Statistics\n{table}"))
        }
    }
}

pub fn render_info(info: &BotInfo, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(info)?),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(["Field", "Value"]);
            table.add_row(["Name", &info.name]);
            table.add_row(["Model", &info.model]);
            table.add_row(["Memory Type", &info.memory_type]);
            table.add_row(["Personality", &truncate_string(&info.personality, 80)]);

            let mut features = String::from("Security Features:");
            for feature in &info.security_features {
                features.push_str(&format!("\n  - {feature}"));
            }
            Ok(format!("{} Information\n{table}\n{features}", info.name))
        }
    }
}

pub fn render_export_summary(export: &ConversationExport, path: &str) -> String {
    format!(
        "Conversation exported to {path}\n  Messages exported: {}\n  Start time: {}\n  Message count: {}",
        export.messages.len(),
        format_timestamp(&export.metadata.start_time),
        export.metadata.message_count
    )
}
