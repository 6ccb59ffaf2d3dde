// src/main.rs

use std::io::{BufRead, Write as _};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use solace::chat::TurnController;
use solace::config::CONFIG;
use solace::emotion::{EmotionClassifier, HfEmotionClassifier};
use solace::insight::InsightEngine;
use solace::llm::{ChatModel, OpenAiChatClient, Summarizer};
use solace::retrieval::{DocumentRetriever, EmbeddingClient, QdrantRetriever, collect_documents};
use solace::session::ConversationConfig;

#[derive(Parser)]
#[command(name = "solace", about = "Emotion-aware companion conversation core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive conversation session
    Chat {
        /// Conversation mode: casual, comfort, reflect, hype, listen
        #[arg(long, default_value = "casual")]
        mode: String,
        /// Companion personality: friendly, calm, big-sister, funny, deep-thinker
        #[arg(long, default_value = "friendly")]
        personality: String,
        /// Pull background context from the document index each turn
        #[arg(long)]
        retrieval: bool,
    },
    /// Classify a single piece of text and print the detected emotions
    Analyze { text: String },
    /// Summarize a text file (10-1000 words)
    Summarize { file: PathBuf },
    /// Index every .txt/.md document under a folder
    Ingest { folder: PathBuf },
    /// Drop and recreate the document index
    ClearIndex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = Level::from_str(&CONFIG.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Chat {
            mode,
            personality,
            retrieval,
        } => run_chat(&mode, &personality, retrieval).await,
        Command::Analyze { text } => run_analyze(&text).await,
        Command::Summarize { file } => run_summarize(&file).await,
        Command::Ingest { folder } => run_ingest(&folder).await,
        Command::ClearIndex => run_clear_index().await,
    }
}

fn build_retriever() -> anyhow::Result<QdrantRetriever> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY is required for embeddings")?;
    Ok(QdrantRetriever::new(
        &CONFIG.qdrant_url,
        EmbeddingClient::new(api_key),
    ))
}

async fn run_chat(mode: &str, personality: &str, retrieval: bool) -> anyhow::Result<()> {
    let mut config = ConversationConfig::parse(mode, personality)?;
    config.enable_retrieval = retrieval || CONFIG.enable_retrieval;

    let classifier: Option<Arc<dyn EmotionClassifier>> = match HfEmotionClassifier::from_env() {
        Some(c) => Some(Arc::new(c)),
        None => {
            warn!("HUGGINGFACE_API_KEY not set - emotion analysis disabled");
            None
        }
    };

    let llm: Option<Arc<dyn ChatModel>> = match OpenAiChatClient::from_env() {
        Some(c) => Some(Arc::new(c)),
        None => {
            warn!("OPENAI_API_KEY not set - replies will be a fixed fallback");
            None
        }
    };

    let retriever: Option<Arc<dyn DocumentRetriever>> = if config.enable_retrieval {
        match build_retriever() {
            Ok(r) if r.is_available() => Some(Arc::new(r)),
            Ok(_) => {
                warn!("Qdrant unreachable - retrieval disabled for this session");
                None
            }
            Err(e) => {
                warn!("retrieval disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let insight = InsightEngine::new(llm.clone(), retriever.clone());
    let mut controller = TurnController::new(
        classifier,
        retriever,
        llm,
        config,
        CONFIG.emotion_threshold,
        CONFIG.retrieval_k,
    );

    info!(
        "Session started: {} / {}",
        controller.config.mode, controller.config.personality
    );
    println!("solace - type /help for commands, /quit to leave\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        print!("you> ");
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            if !handle_command(command, &mut controller, &insight).await? {
                break;
            }
            continue;
        }

        let result = controller.handle_message(input).await;
        println!("\nsolace> {}\n", result.reply);

        if controller.config.show_emotion_chips {
            if let Some(snapshot) = &result.emotion {
                if !snapshot.dominant_labels.is_empty() {
                    println!("  [{}]\n", snapshot.dominant_labels.join(", "));
                }
            }
        }
    }

    println!("Take care of yourself.");
    Ok(())
}

/// Returns false when the session should end.
async fn handle_command(
    command: &str,
    controller: &mut TurnController,
    insight: &InsightEngine,
) -> anyhow::Result<bool> {
    let (name, arg) = match command.split_once(' ') {
        Some((n, a)) => (n, a.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => return Ok(false),
        "help" => {
            println!(
                "  /mode <casual|comfort|reflect|hype|listen>\n\
                 \x20 /personality <friendly|calm|big-sister|funny|deep-thinker>\n\
                 \x20 /analyze <text> read the emotions in what you write\n\
                 \x20 /chips          toggle emotion chips under replies\n\
                 \x20 /insight        report on your recent emotional state\n\
                 \x20 /clear          forget this session\n\
                 \x20 /quit"
            );
        }
        "mode" => match arg.parse() {
            Ok(mode) => {
                controller.config.mode = mode;
                println!("mode: {}", mode);
            }
            Err(e) => println!("{}", e),
        },
        "personality" => match arg.parse() {
            Ok(personality) => {
                controller.config.personality = personality;
                println!("personality: {}", personality);
            }
            Err(e) => println!("{}", e),
        },
        "analyze" => {
            if arg.is_empty() {
                println!("usage: /analyze <something you want read>");
            } else {
                let result = controller.analyze_message(arg).await;
                println!("\nsolace> {}\n", result.reply);
            }
        }
        "chips" => {
            controller.config.show_emotion_chips = !controller.config.show_emotion_chips;
            println!(
                "emotion chips: {}",
                if controller.config.show_emotion_chips { "on" } else { "off" }
            );
        }
        "insight" => {
            let snapshots = controller.history().recent_emotions(1);
            match snapshots.last() {
                Some(snapshot) => {
                    let context: Vec<String> = controller
                        .history()
                        .recent_messages(6)
                        .iter()
                        .filter(|m| m.role == solace::session::MessageRole::User)
                        .map(|m| m.content.clone())
                        .collect();
                    let report = insight.generate(snapshot, &context.join("\n")).await;
                    print_report(&report);
                }
                None => println!("No emotion data yet - keep chatting for a bit first."),
            }
        }
        "clear" => {
            controller.reset();
            println!("Session cleared.");
        }
        other => println!("Unknown command: /{}", other),
    }

    Ok(true)
}

fn print_report(report: &solace::insight::InsightReport) {
    println!("\n  Overall: {}", report.sentiment.as_str());
    for (label, prob) in &report.top_emotions {
        println!("  - {} ({:.0}%)", label, prob * 100.0);
    }
    println!("\n  {}", report.reasoning);
    println!("\n  Suggestion: {}", report.recommendation);
    if !report.suggested_actions.is_empty() && !report.enhanced {
        for action in report.suggested_actions.iter().skip(1) {
            println!("  Also: {}", action);
        }
    }
    println!();
}

async fn run_analyze(text: &str) -> anyhow::Result<()> {
    let classifier = HfEmotionClassifier::from_env()
        .context("HUGGINGFACE_API_KEY is required for emotion analysis")?;
    let snapshot = solace::emotion::analyze(
        &classifier,
        text,
        CONFIG.emotion_threshold,
        uuid::Uuid::new_v4(),
    )
    .await?;

    if snapshot.dominant_labels.is_empty() {
        println!("Nothing above the {:.2} threshold.", CONFIG.emotion_threshold);
    } else {
        for label in &snapshot.dominant_labels {
            println!("{} ({:.0}%)", label, snapshot.probability(label) * 100.0);
        }
    }
    Ok(())
}

async fn run_summarize(file: &PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let summarizer =
        Summarizer::from_env().context("HUGGINGFACE_API_KEY is required for summarization")?;
    let summary = summarizer.summarize(&text).await?;
    println!("{}", summary);
    Ok(())
}

async fn run_ingest(folder: &PathBuf) -> anyhow::Result<()> {
    let retriever = build_retriever()?;
    anyhow::ensure!(retriever.is_available(), "Qdrant is not reachable");

    let chunks = collect_documents(folder)?;
    anyhow::ensure!(!chunks.is_empty(), "no .txt/.md documents under {}", folder.display());

    let total = chunks.len();
    for chunk in chunks {
        info!("Indexing {}", chunk.id);
        retriever.ingest(chunk).await?;
    }
    println!("Indexed {} documents into '{}'.", total, CONFIG.qdrant_collection);
    Ok(())
}

async fn run_clear_index() -> anyhow::Result<()> {
    let retriever = build_retriever()?;
    anyhow::ensure!(retriever.is_available(), "Qdrant is not reachable");
    retriever.clear().await?;
    println!("Cleared '{}'.", CONFIG.qdrant_collection);
    Ok(())
}
