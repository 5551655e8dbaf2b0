use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use uuid::Uuid;

use studywrite_analysis::{
    AnalysisCoordinator, AnalysisMode, FeedbackSink, HttpAnalysisService, HttpFeedbackSink,
    NullSink,
};
use studywrite_config::AppConfig;
use studywrite_core::{
    compute_stats, AnnotationKind, DocumentStore, EditorSession, FileStore, RenderNode,
};

/// A writing assistant with inline grammar and style suggestions.
#[derive(Parser, Debug)]
#[command(name = "studywrite", version, about)]
struct Cli {
    /// Document to open (a UTF-8 `.txt` file).
    file: PathBuf,

    /// Request an analysis pass and show the suggestions.
    #[arg(long)]
    analyze: bool,

    /// Analysis mode: proofread, academic, concise, full.
    #[arg(long)]
    mode: Option<AnalysisMode>,

    /// Accept numbered suggestion(s) and save (implies --analyze).
    #[arg(long = "accept", value_name = "N")]
    accept: Vec<usize>,

    /// Accept every suggestion and save (implies --analyze).
    #[arg(long)]
    accept_all: bool,

    /// Print document statistics.
    #[arg(long)]
    stats: bool,

    /// Alternate config file path.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);

    if cli.file.extension().and_then(|e| e.to_str()) != Some("txt") {
        anyhow::bail!("expected a .txt document, got: {}", cli.file.display());
    }
    let root = match cli.file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let id = cli
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid file name: {}", cli.file.display()))?
        .to_string();

    let mut store = FileStore::open(&root)?;
    let record = store.load(&id)?;
    let mut session = EditorSession::open(record);

    tracing::info!(document = %session.document_id(), "opened \"{}\"", session.title());

    if cli.stats {
        print_stats(&session);
    }

    let wants_analysis = cli.analyze || cli.accept_all || !cli.accept.is_empty();
    if !wants_analysis {
        if !cli.stats {
            print_annotated(&session);
        }
        return Ok(());
    }

    let mode = cli.mode.unwrap_or_else(|| {
        config
            .default_mode
            .parse()
            .unwrap_or_default()
    });
    let report = run_analysis(&config, &session, mode).await?;
    session.apply_analysis(report);

    print_annotated(&session);
    print_suggestions(&session);

    let chosen = chosen_ids(&cli, &session);
    if chosen.is_empty() {
        return Ok(());
    }

    let feedback: Box<dyn FeedbackSink> = match config.api_key() {
        Some(key) if !config.feedback_endpoint.is_empty() => {
            Box::new(HttpFeedbackSink::new(&config.feedback_endpoint, &key)?)
        }
        _ => Box::new(NullSink),
    };

    let mut accepted = 0;
    for annotation_id in chosen {
        if let Some(record) = session.accept(annotation_id) {
            feedback.record(record);
            accepted += 1;
        }
    }

    if accepted > 0 {
        store.save(&id, &session.text().to_string())?;
        session.mark_saved();
        println!("\nApplied {accepted} suggestion(s) and saved.");
        print_annotated(&session);
    }

    Ok(())
}

/// Builds the HTTP service from config and runs one analysis pass.
async fn run_analysis(
    config: &AppConfig,
    session: &EditorSession,
    mode: AnalysisMode,
) -> Result<studywrite_core::AnalysisReport> {
    let api_key = config.api_key().with_context(|| {
        format!(
            "no API key found; set the {} environment variable",
            config.api_key_env
        )
    })?;
    let timeout = Duration::from_secs(config.request_timeout_secs);
    // Transport backstop slightly above the user-facing ceiling.
    let service = HttpAnalysisService::new(
        &config.analysis_endpoint,
        &api_key,
        timeout + Duration::from_secs(5),
    )?;
    let coordinator = AnalysisCoordinator::new(Arc::new(service), timeout);

    match coordinator.request_analysis(&session.snapshot(), mode).await {
        Ok(report) => Ok(report),
        Err(e) => anyhow::bail!("analysis could not complete ({}): {e}", e.category()),
    }
}

/// Resolves the 1-based suggestion numbers from the CLI into stable ids.
fn chosen_ids(cli: &Cli, session: &EditorSession) -> Vec<Uuid> {
    if cli.accept_all {
        return session.annotations().iter().map(|a| a.id).collect();
    }
    let mut ids = Vec::new();
    for &n in &cli.accept {
        match n
            .checked_sub(1)
            .and_then(|idx| session.annotations().iter().nth(idx))
        {
            Some(a) => ids.push(a.id),
            None => eprintln!("No suggestion numbered {n}; skipping."),
        }
    }
    ids
}

fn print_stats(session: &EditorSession) {
    let stats = compute_stats(session.text());
    println!("\"{}\"", session.title());
    println!(
        "  {} words, {} chars, {} lines, {} sentences, ~{} min read",
        stats.words, stats.chars, stats.lines, stats.sentences, stats.reading_minutes
    );
}

/// Prints the document with highlights rendered as colored, underlined
/// spans.
fn print_annotated(session: &EditorSession) {
    let tree = session.render();
    let mut out = String::new();
    for node in &tree.nodes {
        match node {
            RenderNode::Text(s) => out.push_str(s),
            RenderNode::LineBreak => out.push('\n'),
            RenderNode::Highlight { kind, text, .. } => {
                out.push_str(&format!("\x1b[4;{}m{}\x1b[0m", ansi_color(*kind), text));
            }
        }
    }
    println!("{out}");
}

fn print_suggestions(session: &EditorSession) {
    if session.annotations().is_empty() {
        println!("\nNo suggestions.");
        return;
    }
    println!("\nSuggestions:");
    for (i, a) in session.annotations().iter().enumerate() {
        println!(
            "{:>3}. [{}] \"{}\" -> \"{}\"",
            i + 1,
            a.kind.label(),
            a.original_text,
            a.replacement_text
        );
        if !a.explanation.is_empty() {
            println!("     {}", a.explanation);
        }
    }
}

fn ansi_color(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Grammar => "31",     // red
        AnnotationKind::Spelling => "35",    // magenta
        AnnotationKind::Style => "33",       // yellow
        AnnotationKind::Readability => "36", // cyan
        AnnotationKind::Structure => "34",   // blue
        AnnotationKind::Tone => "32",        // green
    }
}
