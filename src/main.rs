use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gradchat_chat::{
    ChatAssistant, EXAMPLE_QUESTIONS, JsonFileConversationStore, ReferenceContext, ReplCommand,
    SessionState, parse_command, ui,
};
use gradchat_core::{ConversationStore, LLMProvider, VectorStore};
use gradchat_gemini::GeminiClient;
use gradchat_rag::{
    Embedder, HashedEmbedder, LocalVectorStore, MiniLmEmbedder, QdrantVectorStore,
    SimilarityRetriever, load_qa_records,
};

mod config;

use config::{AppConfig, AppSettings, EmbeddingBackend};

#[derive(Parser)]
#[command(name = "gradchat")]
#[command(about = "Answers questions about the USF MSDS program", long_about = None)]
struct Cli {
    /// Answer one question and exit
    #[arg(short, long)]
    ask: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

/// Sentence embeddings, or the lexical fallback when the model cannot be loaded
fn build_embedder(settings: &AppSettings) -> Arc<dyn Embedder> {
    match settings.embeddings {
        EmbeddingBackend::Hashed => Arc::new(HashedEmbedder::default()),
        EmbeddingBackend::MiniLm => match MiniLmEmbedder::new(&settings.models_dir) {
            Ok(embedder) => Arc::new(embedder),
            Err(e) => {
                warn!(error = %e, "embedding model unavailable, using hashed embeddings");
                println!(
                    "{} Embedding model unavailable ({}); similarity search is keyword-based",
                    "⚠".yellow(),
                    e
                );
                Arc::new(HashedEmbedder::default())
            }
        },
    }
}

/// Load reference data, build the index and wire the pipeline
async fn build_assistant(config: &AppConfig) -> Result<(ChatAssistant, usize)> {
    let settings = &config.settings;

    let missing = settings.missing_files();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
        bail!("Required files not found: {}", names.join(", "));
    }

    let records = load_qa_records(&settings.qa_path)
        .with_context(|| format!("Error loading {}", settings.qa_path.display()))?;
    let reference = ReferenceContext::load(&settings.context_path, &settings.general_info_path)?;
    info!(
        qa_pairs = records.len(),
        categories = reference.category_count(),
        "reference data loaded"
    );

    let mut gemini = GeminiClient::new(config.gemini.clone())?;
    if let Err(e) = gemini.connect().await {
        warn!(error = %e, "Gemini model check failed");
        println!("{} Could not verify the Gemini model: {}", "⚠".yellow(), e);
    }
    let llm: Arc<dyn LLMProvider> = Arc::new(gemini);

    let embedder = build_embedder(settings);
    info!(embedder = embedder.name(), "embeddings ready");

    let vector_store: Arc<dyn VectorStore> = match &settings.qdrant_url {
        Some(url) => Arc::new(QdrantVectorStore::new(url, &settings.collection, embedder)?),
        None => Arc::new(LocalVectorStore::with_embedder(
            settings.collection.clone(),
            embedder,
        )),
    };

    let retriever =
        SimilarityRetriever::new(vector_store).with_threshold(settings.similarity_threshold);
    let indexed = retriever
        .index(&records)
        .await
        .context("Error building the QA index")?;

    let store: Arc<dyn ConversationStore> =
        Arc::new(JsonFileConversationStore::open(&settings.conversations_path).await?);

    let assistant = ChatAssistant::new(llm, retriever, Arc::new(reference), store)?;
    Ok((assistant, indexed))
}

async fn ask(assistant: &ChatAssistant, session: &mut SessionState, question: &str) {
    println!("{}", "Thinking...".dimmed());
    let outcome = assistant.handle_turn(session, question).await;
    let turn_number = outcome.categorization.as_ref().map(|_| session.turn_count());
    ui::print_outcome(turn_number, &outcome);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::from_env()?;
    let (assistant, indexed) = build_assistant(&config).await?;
    let mut session = SessionState::new();

    if let Some(question) = cli.ask {
        let outcome = assistant.handle_turn(&mut session, &question).await;
        for notice in &outcome.notices {
            eprintln!("{}", notice);
        }
        println!("{}", outcome.response);
        return Ok(());
    }

    ui::display_banner(indexed);

    let mut input_history = Vec::new();

    loop {
        let Some(line) = ui::read_line(&mut input_history)? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                ui::print_error(e);
                continue;
            }
        };

        match command {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Help => ui::print_help(),
            ReplCommand::ListExamples => ui::print_examples(),
            ReplCommand::Debug => ui::print_debug(&session.debug),
            ReplCommand::NewSession => {
                session.reset();
                ui::print_success(format!("Started session {}", session.session_id));
            }
            ReplCommand::Ask(question) => ask(&assistant, &mut session, &question).await,
            ReplCommand::AskExample(n) => match EXAMPLE_QUESTIONS.get(n - 1) {
                Some(question) => {
                    println!("{} {}", "You:".bold(), question);
                    ask(&assistant, &mut session, question).await;
                }
                None => ui::print_error(format!(
                    "There are {} example questions",
                    EXAMPLE_QUESTIONS.len()
                )),
            },
            ReplCommand::Feedback { turn, kind } => {
                match assistant.submit_feedback(&session, turn - 1, kind).await {
                    Ok(_) => ui::print_success("Thank you for your feedback!"),
                    Err(e) => ui::print_error(format!("Error saving feedback: {}", e)),
                }
            }
        }
    }

    println!("{}", "Goodbye!".green());
    Ok(())
}
