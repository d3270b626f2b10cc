//! Conversation Pipeline
//!
//! Runs one user turn against the active conversation of a session:
//! question → prompt → model → extracted SQL → execution → classified
//! outcome, appending one chat entry per step.

use crate::chat::ChatEntry;
use crate::db::Database;
use crate::error::{PinnError, Result};
use crate::llm::LanguageModel;
use crate::schema::SchemaDescription;
use crate::session::ChatSession;
use crate::sql_extract::extract_sql;
use std::sync::Arc;
use tracing::{info, warn};

/// Shown after a query that ran fine but matched nothing.
pub const NO_RESULTS_GUIDANCE: &str = "🔍 No results found

Try being more specific with:
• Brand names (e.g., \"Dell\")
• Exact specs (e.g., \"Ryzen 7\")
• Filters (e.g., \"with 16GB RAM\")

Example: \"Show me Dell laptops with Ryzen 7 CPUs and 16GB RAM\"";

/// How a turn ended. Exactly one terminal entry backs each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Model call failed; no SQL was produced
    ModelFailed,
    /// Extracted text failed to execute
    QueryFailed,
    /// Query ran and returned zero rows
    NoRows,
    /// Query ran and returned this many rows
    Rows(usize),
}

pub struct ConversationPipeline {
    llm: Arc<dyn LanguageModel>,
    db: Arc<dyn Database>,
}

impl ConversationPipeline {
    pub fn new(llm: Arc<dyn LanguageModel>, db: Arc<dyn Database>) -> Self {
        Self { llm, db }
    }

    /// Read the schema once for a new session.
    pub async fn start_session(&self) -> Result<ChatSession> {
        let schema = self.db.get_schema().await?;
        Ok(ChatSession::new(schema))
    }

    pub async fn run_turn(&self, session: &mut ChatSession, question: &str) -> TurnOutcome {
        let prompt = build_prompt(session.schema(), self.db.dialect(), question);

        let chat = session.active_mut();
        chat.push(ChatEntry::User(question.to_string()));
        chat.ensure_summary();

        info!("💬 New question: {}", question);

        let reply = match self.llm.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Model call failed: {}", e);
                chat.push(error_entry(&e));
                return TurnOutcome::ModelFailed;
            }
        };

        let sql = extract_sql(&reply);
        info!("🧾 Extracted SQL: {}", sql);
        chat.push(ChatEntry::ModelSql(sql.clone()));

        match self.db.run_query(&sql).await {
            Err(e) => {
                warn!("Query failed: {}", e);
                chat.push(error_entry(&e));
                TurnOutcome::QueryFailed
            }
            Ok(table) if table.is_empty() => {
                chat.push(ChatEntry::Guidance(NO_RESULTS_GUIDANCE.to_string()));
                TurnOutcome::NoRows
            }
            Ok(table) => {
                let rows = table.row_count();
                chat.push(ChatEntry::Result(table));
                TurnOutcome::Rows(rows)
            }
        }
    }
}

fn error_entry(e: &PinnError) -> ChatEntry {
    ChatEntry::Error(format!("Error: {}", e))
}

pub fn build_prompt(schema: &SchemaDescription, dialect: &str, question: &str) -> String {
    format!(
        r#"You are an expert SQL assistant. Given this database schema:
{}
Convert this natural language request to {}:
"{}"

Return ONLY the SQL query, nothing else. No explanations, no markdown formatting.
"#,
        schema, dialect, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    #[test]
    fn test_prompt_embeds_schema_dialect_and_question() {
        let schema = SchemaDescription::new(vec![TableSchema {
            name: "Laptops".to_string(),
            columns: vec!["Id".to_string(), "Brand".to_string()],
        }]);

        let prompt = build_prompt(&schema, "MSSQL", "Show Dell laptops");

        assert!(prompt.starts_with("You are an expert SQL assistant."));
        assert!(prompt.contains("Tables:\n- Laptops (Id, Brand)\n"));
        assert!(prompt.contains("Convert this natural language request to MSSQL:\n\"Show Dell laptops\""));
        assert!(prompt.contains("Return ONLY the SQL query"));
    }
}
