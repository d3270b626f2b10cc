//! Terminal rendering of chat entries and the archived-chat sidebar

use crate::chat::{ChatEntry, Conversation};
use crate::session::ChatGroup;

pub fn render_entry(entry: &ChatEntry) -> String {
    match entry {
        ChatEntry::User(text) => format!("You: {}\n", text),
        ChatEntry::ModelSql(sql) => format!("🧠 AI Response:\n```sql\n{}\n```\n", sql),
        ChatEntry::Result(table) => format!(
            "📊 Query Results:\n{}({} rows)\n",
            table.to_text(),
            table.row_count()
        ),
        ChatEntry::Guidance(text) => format!("{}\n", text),
        ChatEntry::Error(message) => format!("⚠️  {}\n", message),
    }
}

pub fn render_conversation(chat: &Conversation) -> String {
    chat.entries.iter().map(render_entry).collect::<Vec<_>>().join("\n")
}

/// Date-grouped archive listing; the number in brackets opens the chat.
pub fn render_sidebar(groups: &[ChatGroup<'_>]) -> String {
    if groups.is_empty() {
        return "No saved chats.\n".to_string();
    }

    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("{}\n", group.group));
        for (index, chat) in &group.chats {
            out.push_str(&format!("  [{}] {}\n", index, chat.summary_text()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecencyGroup;
    use crate::table::QueryTable;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_roles() {
        assert_eq!(render_entry(&ChatEntry::User("hi".to_string())), "You: hi\n");
        assert_eq!(
            render_entry(&ChatEntry::ModelSql("SELECT 1;".to_string())),
            "🧠 AI Response:\n```sql\nSELECT 1;\n```\n"
        );
        assert_eq!(
            render_entry(&ChatEntry::Error("Error: boom".to_string())),
            "⚠️  Error: boom\n"
        );

        let table = QueryTable::new(vec!["n".to_string()], vec![vec![json!(1)]]);
        assert_eq!(
            render_entry(&ChatEntry::Result(table)),
            "📊 Query Results:\nn\n1\n(1 rows)\n"
        );
    }

    #[test]
    fn test_render_sidebar() {
        let mut chat = Conversation::new();
        chat.summary = Some("Dell laptops...".to_string());
        let groups = vec![ChatGroup {
            group: RecencyGroup::Today,
            chats: vec![(2, &chat)],
        }];

        assert_eq!(render_sidebar(&groups), "Today\n  [2] Dell laptops...\n");
        assert_eq!(render_sidebar(&[]), "No saved chats.\n");
    }
}
