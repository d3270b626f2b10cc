use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pinnai::config::{AppConfig, DatabaseConfig};
use pinnai::llm::LlmClient;
use pinnai::render::render_conversation;
use pinnai::{cli, db, ConversationPipeline};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinnai")]
#[command(about = "Chat to your database: ask questions in plain language, get SQL results")]
struct Args {
    /// Model generate endpoint (or set PINNAI_LLM_URL)
    #[arg(long)]
    llm_url: Option<String>,

    /// Model name (or set PINNAI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Database URL or SQL Server connection string (or set DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive chat (default)
    Chat,
    /// Ask a single question and print the transcript
    Ask { question: String },
    /// Print the schema description sent to the model
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries the chat transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(url) = args.llm_url {
        config.llm_url = url;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(url) = args.database_url {
        config.database = DatabaseConfig::from_url(&url);
    }

    info!("PinnAI starting with model {} at {}", config.model, config.llm_url);

    let llm = LlmClient::new(config.llm_url.clone(), config.model.clone());
    let database: Arc<dyn db::Database> = Arc::from(
        db::connect(&config.database)
            .await
            .context("failed to set up the database backend")?,
    );
    let pipeline = ConversationPipeline::new(Arc::new(llm), database);

    let mut session = pipeline
        .start_session()
        .await
        .context("failed to read the database schema")?;
    info!("Schema loaded: {} tables", session.schema().table_count());

    match args.command.unwrap_or(Mode::Chat) {
        Mode::Chat => cli::run_repl(&pipeline, &mut session).await?,
        Mode::Ask { question } => {
            pipeline.run_turn(&mut session, &question).await;
            print!("{}", render_conversation(session.active()));
        }
        Mode::Schema => print!("{}", session.schema()),
    }

    Ok(())
}
