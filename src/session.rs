//! Session/Chat Store
//!
//! One `ChatSession` per interactive session: the schema read at startup,
//! the active conversation, and the archive of earlier conversations.
//! Search and recency grouping are read-side projections and never mutate
//! the archive.

use crate::chat::Conversation;
use crate::error::{PinnError, Result};
use crate::schema::SchemaDescription;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Sidebar display bucket for an archived conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecencyGroup {
    Today,
    Yesterday,
    LastWeek,
}

impl RecencyGroup {
    pub const ALL: [RecencyGroup; 3] = [RecencyGroup::Today, RecencyGroup::Yesterday, RecencyGroup::LastWeek];

    /// Bucket for `date` relative to `today`; `None` for anything older
    /// than a week (or in the future).
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Option<Self> {
        let yesterday = today - Duration::days(1);
        let last_week = today - Duration::days(7);

        if date == today {
            Some(RecencyGroup::Today)
        } else if date == yesterday {
            Some(RecencyGroup::Yesterday)
        } else if last_week <= date && date < yesterday {
            Some(RecencyGroup::LastWeek)
        } else {
            None
        }
    }
}

impl fmt::Display for RecencyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecencyGroup::Today => write!(f, "Today"),
            RecencyGroup::Yesterday => write!(f, "Yesterday"),
            RecencyGroup::LastWeek => write!(f, "Last Week"),
        }
    }
}

/// Archived conversations of one recency bucket, with their archive indices.
#[derive(Debug)]
pub struct ChatGroup<'a> {
    pub group: RecencyGroup,
    pub chats: Vec<(usize, &'a Conversation)>,
}

pub struct ChatSession {
    schema: SchemaDescription,
    active: Conversation,
    archive: Vec<Conversation>,
}

impl ChatSession {
    pub fn new(schema: SchemaDescription) -> Self {
        Self {
            schema,
            active: Conversation::new(),
            archive: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaDescription {
        &self.schema
    }

    pub fn active(&self) -> &Conversation {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Conversation {
        &mut self.active
    }

    pub fn archive(&self) -> &[Conversation] {
        &self.archive
    }

    /// Archive the active conversation (if it has history) and start fresh.
    pub fn start_new_chat(&mut self) {
        self.archive_active();
        self.active = Conversation::new();
    }

    /// Make a copy of `archive[index]` the active conversation.
    ///
    /// The archived entry stays in place, so leaving the reopened chat
    /// archives it a second time.
    pub fn switch_to(&mut self, index: usize) -> Result<()> {
        let chosen = self
            .archive
            .get(index)
            .cloned()
            .ok_or(PinnError::ChatNotFound(index))?;
        self.archive_active();
        self.active = chosen;
        debug!("Switched to archived chat {}", index);
        Ok(())
    }

    pub fn delete_archived(&mut self, index: usize) -> Result<Conversation> {
        if index >= self.archive.len() {
            return Err(PinnError::ChatNotFound(index));
        }
        Ok(self.archive.remove(index))
    }

    /// Archived conversations whose summary contains `term`, ignoring case.
    pub fn filter_by_search(&self, term: &str) -> Vec<(usize, &Conversation)> {
        let needle = term.to_lowercase();
        self.archive
            .iter()
            .enumerate()
            .filter(|(_, chat)| chat.summary_text().to_lowercase().contains(&needle))
            .collect()
    }

    /// Archived conversations bucketed by creation date, in
    /// Today / Yesterday / Last Week order. Older chats are left out.
    pub fn group_by_recency(&self, today: NaiveDate) -> Vec<ChatGroup<'_>> {
        let mut groups: Vec<ChatGroup<'_>> = RecencyGroup::ALL
            .iter()
            .map(|&group| ChatGroup { group, chats: Vec::new() })
            .collect();

        for (i, chat) in self.archive.iter().enumerate() {
            if let Some(group) = RecencyGroup::classify(chat.created_at.date(), today) {
                if let Some(bucket) = groups.iter_mut().find(|g| g.group == group) {
                    bucket.chats.push((i, chat));
                }
            }
        }
        groups
    }

    /// Recency groups filtered by the search term, empty groups omitted.
    pub fn sidebar(&self, today: NaiveDate, term: &str) -> Vec<ChatGroup<'_>> {
        let needle = term.to_lowercase();
        self.group_by_recency(today)
            .into_iter()
            .map(|mut g| {
                g.chats
                    .retain(|(_, chat)| chat.summary_text().to_lowercase().contains(&needle));
                g
            })
            .filter(|g| !g.chats.is_empty())
            .collect()
    }

    fn archive_active(&mut self) {
        if self.active.is_empty() {
            return;
        }
        self.active.ensure_summary();
        let finished = std::mem::take(&mut self.active);
        debug!("Archiving chat '{}'", finished.summary_text());
        self.archive.push(finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatEntry;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chat_on(date: NaiveDate, question: &str) -> Conversation {
        let mut chat = Conversation::started_at(date.and_hms_opt(9, 30, 0).unwrap());
        chat.push(ChatEntry::User(question.to_string()));
        chat.ensure_summary();
        chat
    }

    fn session_with_question(question: &str) -> ChatSession {
        let mut session = ChatSession::new(SchemaDescription::default());
        session.active_mut().push(ChatEntry::User(question.to_string()));
        session
    }

    #[test]
    fn test_new_chat_on_empty_active_archives_nothing() {
        let mut session = ChatSession::new(SchemaDescription::default());
        session.start_new_chat();
        assert!(session.archive().is_empty());
        assert!(session.active().is_empty());
    }

    #[test]
    fn test_new_chat_archives_exactly_one_and_resets() {
        let mut session = session_with_question("Show laptops. All of them");
        session.start_new_chat();

        assert_eq!(session.archive().len(), 1);
        assert!(session.active().is_empty());
        assert!(session.active().summary.is_none());
        assert_eq!(session.archive()[0].summary_text(), "Show laptops...");
    }

    #[test]
    fn test_switch_keeps_archived_copy() {
        let mut session = session_with_question("first");
        session.start_new_chat();
        session.active_mut().push(ChatEntry::User("second".to_string()));

        session.switch_to(0).unwrap();

        assert_eq!(session.archive().len(), 2);
        assert_eq!(session.active().summary_text(), "first...");
        assert_eq!(session.archive()[1].summary_text(), "second...");

        // Leaving the reopened chat archives it again.
        session.start_new_chat();
        assert_eq!(session.archive().len(), 3);
        assert_eq!(session.archive()[2].summary_text(), "first...");
    }

    #[test]
    fn test_switch_out_of_range_leaves_state_untouched() {
        let mut session = session_with_question("pending");
        let err = session.switch_to(4).unwrap_err();
        assert!(matches!(err, PinnError::ChatNotFound(4)));
        assert!(session.archive().is_empty());
        assert_eq!(session.active().entries.len(), 1);
    }

    #[test]
    fn test_delete_archived() {
        let mut session = session_with_question("one");
        session.start_new_chat();
        session.active_mut().push(ChatEntry::User("two".to_string()));
        session.start_new_chat();

        let removed = session.delete_archived(0).unwrap();
        assert_eq!(removed.summary_text(), "one...");
        assert_eq!(session.archive().len(), 1);
        assert!(matches!(session.delete_archived(5), Err(PinnError::ChatNotFound(5))));
    }

    #[test]
    fn test_filter_by_search_is_case_insensitive() {
        let today = day(2026, 10, 15);
        let mut session = ChatSession::new(SchemaDescription::default());
        session.archive.push(chat_on(today, "Dell laptops with Ryzen"));
        session.archive.push(chat_on(today, "Monthly revenue"));

        let hits = session.filter_by_search("DELL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
        assert_eq!(session.filter_by_search("").len(), 2);
    }

    #[test]
    fn test_recency_classification() {
        let today = day(2026, 10, 15);
        assert_eq!(RecencyGroup::classify(today, today), Some(RecencyGroup::Today));
        assert_eq!(RecencyGroup::classify(day(2026, 10, 14), today), Some(RecencyGroup::Yesterday));
        assert_eq!(RecencyGroup::classify(day(2026, 10, 13), today), Some(RecencyGroup::LastWeek));
        assert_eq!(RecencyGroup::classify(day(2026, 10, 8), today), Some(RecencyGroup::LastWeek));
        assert_eq!(RecencyGroup::classify(day(2026, 10, 7), today), None);
        assert_eq!(RecencyGroup::classify(day(2026, 10, 16), today), None);
    }

    #[test]
    fn test_group_by_recency_preserves_archive_indices() {
        let today = day(2026, 10, 15);
        let mut session = ChatSession::new(SchemaDescription::default());
        session.archive.push(chat_on(day(2026, 10, 10), "older"));
        session.archive.push(chat_on(today, "fresh"));
        session.archive.push(chat_on(day(2026, 9, 1), "ancient"));
        session.archive.push(chat_on(day(2026, 10, 14), "yesterday"));

        let groups = session.group_by_recency(today);
        let indices: Vec<(RecencyGroup, Vec<usize>)> = groups
            .iter()
            .map(|g| (g.group, g.chats.iter().map(|(i, _)| *i).collect()))
            .collect();

        assert_eq!(
            indices,
            vec![
                (RecencyGroup::Today, vec![1]),
                (RecencyGroup::Yesterday, vec![3]),
                (RecencyGroup::LastWeek, vec![0]),
            ]
        );
        assert_eq!(session.archive().len(), 4);
    }

    #[test]
    fn test_sidebar_drops_empty_groups() {
        let today = day(2026, 10, 15);
        let mut session = ChatSession::new(SchemaDescription::default());
        session.archive.push(chat_on(today, "Dell laptops"));
        session.archive.push(chat_on(day(2026, 10, 14), "Orders"));

        let sidebar = session.sidebar(today, "dell");
        assert_eq!(sidebar.len(), 1);
        assert_eq!(sidebar[0].group, RecencyGroup::Today);
        assert_eq!(RecencyGroup::LastWeek.to_string(), "Last Week");
    }
}
