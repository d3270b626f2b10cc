//! Chat history types: role-tagged entries and conversations

use crate::table::QueryTable;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Longest summary prefix, in characters, before the ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 50;

/// One role-tagged unit of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", content = "message", rename_all = "kebab-case")]
pub enum ChatEntry {
    /// The analyst's raw question
    User(String),
    /// SQL recovered from the model output (may not be valid SQL)
    ModelSql(String),
    /// Non-empty result set
    Result(QueryTable),
    /// Refinement suggestions after an empty result
    Guidance(String),
    /// Human-readable failure message
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub entries: Vec<ChatEntry>,
    pub summary: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Conversation {
    pub fn new() -> Self {
        Self::started_at(Local::now().naive_local())
    }

    pub fn started_at(created_at: NaiveDateTime) -> Self {
        Self {
            entries: Vec::new(),
            summary: None,
            created_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    /// Set the summary from the first user entry if none is set yet.
    pub fn ensure_summary(&mut self) {
        if self.summary.is_some() {
            return;
        }
        self.summary = self.entries.iter().find_map(|entry| match entry {
            ChatEntry::User(text) => Some(derive_summary(text)),
            _ => None,
        });
    }

    /// Summary for display; conversations without one show an empty label.
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    /// Most recent result table, if any.
    pub fn last_result(&self) -> Option<&QueryTable> {
        self.entries.iter().rev().find_map(|entry| match entry {
            ChatEntry::Result(table) => Some(table),
            _ => None,
        })
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Text up to the first period, cut to [`SUMMARY_MAX_CHARS`] characters,
/// always followed by `...`.
pub fn derive_summary(message: &str) -> String {
    let first_sentence = message.split('.').next().unwrap_or("");
    let prefix: String = first_sentence.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_stops_at_first_period() {
        assert_eq!(derive_summary("Show Dell laptops. Sort by price"), "Show Dell laptops...");
    }

    #[test]
    fn test_summary_appends_ellipsis_without_truncation() {
        assert_eq!(derive_summary("How many users"), "How many users...");
    }

    #[test]
    fn test_summary_truncates_to_fifty_chars() {
        let message = "a".repeat(80);
        let summary = derive_summary(&message);
        assert_eq!(summary, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_summary_counts_characters_not_bytes() {
        let message = "é".repeat(60);
        assert_eq!(derive_summary(&message).chars().count(), 53);
    }

    #[test]
    fn test_summary_of_leading_period_is_bare_ellipsis() {
        assert_eq!(derive_summary(".hidden"), "...");
    }

    #[test]
    fn test_ensure_summary_uses_first_user_entry() {
        let mut conversation = Conversation::new();
        conversation.push(ChatEntry::Error("Error: boom".to_string()));
        conversation.push(ChatEntry::User("List orders. Today only".to_string()));
        conversation.push(ChatEntry::User("Second question".to_string()));
        conversation.ensure_summary();
        assert_eq!(conversation.summary.as_deref(), Some("List orders..."));
    }

    #[test]
    fn test_ensure_summary_keeps_existing() {
        let mut conversation = Conversation::new();
        conversation.summary = Some("kept...".to_string());
        conversation.push(ChatEntry::User("other".to_string()));
        conversation.ensure_summary();
        assert_eq!(conversation.summary_text(), "kept...");
    }

    #[test]
    fn test_last_result() {
        let mut conversation = Conversation::new();
        assert!(conversation.last_result().is_none());
        let table = QueryTable::new(vec!["n".to_string()], vec![vec![serde_json::json!(1)]]);
        conversation.push(ChatEntry::Result(table.clone()));
        conversation.push(ChatEntry::User("again".to_string()));
        assert_eq!(conversation.last_result(), Some(&table));
    }

    #[test]
    fn test_entry_serializes_with_role_tag() {
        let json = serde_json::to_value(ChatEntry::ModelSql("SELECT 1;".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"role": "model-sql", "message": "SELECT 1;"}));
    }
}
