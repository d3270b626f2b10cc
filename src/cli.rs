//! Interactive chat REPL
//!
//! Free text is a question for the database; lines starting with `/` are
//! session commands.

use crate::error::Result;
use crate::export::{export, ExportFormat};
use crate::pipeline::ConversationPipeline;
use crate::render::{render_conversation, render_entry, render_sidebar};
use crate::session::ChatSession;
use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

pub const HELP: &str = "Commands:
  /new              start a new chat (the current one is saved)
  /chats [term]     list saved chats, optionally filtered by summary
  /open <n>         reopen saved chat n
  /delete <n>       delete saved chat n
  /export txt|xlsx  print the last result as a data URI
  /history          show the current chat
  /schema           show the database schema
  /help             show this help
  /quit             leave
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    NewChat,
    ListChats(String),
    Open(usize),
    Delete(usize),
    Export(ExportFormat),
    History,
    Schema,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let index = |arg: &str| {
        arg.parse::<usize>()
            .map_err(|_| format!("/{} needs a chat number, got '{}'", name, arg))
    };

    match name {
        "new" => Command::NewChat,
        "chats" => Command::ListChats(arg.to_string()),
        "open" => index(arg).map(Command::Open).unwrap_or_else(Command::Invalid),
        "delete" => index(arg).map(Command::Delete).unwrap_or_else(Command::Invalid),
        "export" => arg
            .parse::<ExportFormat>()
            .map(Command::Export)
            .unwrap_or_else(|e| Command::Invalid(e.to_string())),
        "history" => Command::History,
        "schema" => Command::Schema,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command '/{}'. Try /help", other)),
    }
}

/// Apply one non-question command to the session; returns the text to show.
pub fn apply_command(session: &mut ChatSession, command: Command) -> Result<String> {
    let today = Local::now().date_naive();
    match command {
        Command::NewChat => {
            session.start_new_chat();
            Ok("Started a new chat.\n".to_string())
        }
        Command::ListChats(term) => Ok(render_sidebar(&session.sidebar(today, &term))),
        Command::Open(index) => {
            session.switch_to(index)?;
            Ok(render_conversation(session.active()))
        }
        Command::Delete(index) => {
            let removed = session.delete_archived(index)?;
            Ok(format!("Deleted '{}'.\n", removed.summary_text()))
        }
        Command::Export(format) => match session.active().last_result() {
            Some(table) => {
                let payload = export(table, format)?;
                Ok(format!("{}\n{}\n", payload.file_name, payload.data_uri()))
            }
            None => Ok("No result to export in this chat.\n".to_string()),
        },
        Command::History => Ok(render_conversation(session.active())),
        Command::Schema => Ok(session.schema().to_string()),
        Command::Help => Ok(format!("{}\n", HELP)),
        Command::Invalid(message) => Ok(format!("{}\n", message)),
        Command::Ask(_) | Command::Quit | Command::Empty => Ok(String::new()),
    }
}

/// Read lines from stdin until `/quit` or end of input.
pub async fn run_repl(pipeline: &ConversationPipeline, session: &mut ChatSession) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Hello I'm PinnAI, how can I help? (/help for commands)\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let command = parse_command(&line);
        debug!("Command: {:?}", command);

        let output = match command {
            Command::Quit => break,
            Command::Ask(question) => {
                let before = session.active().entries.len();
                pipeline.run_turn(session, &question).await;
                session.active().entries[before..]
                    .iter()
                    .skip(1)
                    .map(render_entry)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            other => match apply_command(session, other) {
                Ok(text) => text,
                Err(e) => format!("⚠️  {}\n", e),
            },
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}
