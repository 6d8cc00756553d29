use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rostrum::{
    build_prompt, load_text, source_label, ContextSource, DateSelection, LoadError, OllamaClient,
    OllamaConfig, RetrievalEngine, Settings, YoutubeClient, DEFAULT_TOP_K, SETTINGS_FILE,
};

#[derive(Parser)]
#[command(name = "rostrum")]
#[command(author, version, about = "Speaker- and date-indexed transcript retrieval", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question against one speaker's transcript segments
    Ask {
        /// Directory with transcript documents (.txt / .docx)
        #[arg(short, long)]
        docs: PathBuf,

        /// Speaker to query
        #[arg(short, long)]
        speaker: String,

        /// Question to ask
        #[arg(short, long)]
        query: String,

        /// Number of context segments
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Ollama model name (overrides settings)
        #[arg(long)]
        model: Option<String>,

        /// Ollama generate endpoint (overrides settings)
        #[arg(long)]
        ollama_url: Option<String>,

        /// Settings file
        #[arg(long, default_value = SETTINGS_FILE)]
        config: PathBuf,

        /// Print the assembled prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Ask a question against documents from a date period
    Period {
        /// Directory with transcript documents (.txt / .docx)
        #[arg(short, long)]
        docs: PathBuf,

        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Query only documents with no recognizable date
        #[arg(long)]
        unknown: bool,

        /// Question to ask
        #[arg(short, long)]
        query: String,

        /// Number of context segments
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Ollama model name (overrides settings)
        #[arg(long)]
        model: Option<String>,

        /// Ollama generate endpoint (overrides settings)
        #[arg(long)]
        ollama_url: Option<String>,

        /// Settings file
        #[arg(long, default_value = SETTINGS_FILE)]
        config: PathBuf,

        /// Print the assembled prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List known speakers and date labels after ingesting a directory
    List {
        /// Directory with transcript documents (.txt / .docx)
        #[arg(short, long)]
        docs: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Ingest a YouTube transcript and optionally ask about it
    Youtube {
        /// Video URL or bare 11-character id
        url: String,

        /// Question to ask against the ingested transcript
        #[arg(short, long)]
        query: Option<String>,

        /// Number of context segments
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Ollama model name (overrides settings)
        #[arg(long)]
        model: Option<String>,

        /// Ollama generate endpoint (overrides settings)
        #[arg(long)]
        ollama_url: Option<String>,

        /// Settings file
        #[arg(long, default_value = SETTINGS_FILE)]
        config: PathBuf,

        /// Print the assembled prompt instead of calling the model
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Update persisted settings
    Configure {
        /// Ollama generate endpoint
        #[arg(long)]
        ollama_url: Option<String>,

        /// Ollama model name
        #[arg(long)]
        model: Option<String>,

        /// Settings file
        #[arg(long, default_value = SETTINGS_FILE)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            docs,
            speaker,
            query,
            top_k,
            model,
            ollama_url,
            config,
            dry_run,
            verbose,
        } => {
            setup_logging(verbose);
            ask_speaker(
                docs, speaker, query, top_k, model, ollama_url, config, dry_run,
            )
            .await
        }
        Commands::Period {
            docs,
            start,
            end,
            unknown,
            query,
            top_k,
            model,
            ollama_url,
            config,
            dry_run,
            verbose,
        } => {
            setup_logging(verbose);
            ask_period(
                docs, start, end, unknown, query, top_k, model, ollama_url, config, dry_run,
            )
            .await
        }
        Commands::List { docs, verbose } => {
            setup_logging(verbose);
            list_keys(docs)
        }
        Commands::Youtube {
            url,
            query,
            top_k,
            model,
            ollama_url,
            config,
            dry_run,
            verbose,
        } => {
            setup_logging(verbose);
            ask_youtube(url, query, top_k, model, ollama_url, config, dry_run).await
        }
        Commands::Configure {
            ollama_url,
            model,
            config,
        } => configure(ollama_url, model, &config),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Ingest every supported document in a directory.
///
/// Unsupported extensions are skipped outright; unreadable files are
/// skipped with a warning so the rest of the batch still lands.
fn ingest_directory(engine: &mut RetrievalEngine, docs: &Path) -> Result<usize> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(docs)
        .with_context(|| format!("Failed to read directory {:?}", docs))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut ingested = 0;
    for path in paths {
        let text = match load_text(&path) {
            Ok(text) => text,
            Err(LoadError::UnsupportedFormat(_)) => continue,
            Err(err) => {
                warn!("Skipping {:?}: {}", path, err);
                continue;
            }
        };
        let report = engine.ingest(&text);
        info!(
            "Indexed {:?}: {} speakers, {} segments under '{}'",
            path.file_name().unwrap_or_default(),
            report.speakers.len(),
            report.segments,
            report.date_label
        );
        ingested += 1;
    }
    Ok(ingested)
}

fn resolve_ollama_config(
    config: &Path,
    model: Option<String>,
    ollama_url: Option<String>,
) -> Result<OllamaConfig> {
    let settings = Settings::load(config)?;
    let mut resolved = OllamaConfig::from_settings(&settings);
    if let Some(model) = model {
        resolved.model = model;
    }
    if let Some(url) = ollama_url {
        resolved.endpoint = url;
    }
    Ok(resolved)
}

async fn answer(prompt: String, dry_run: bool, ollama: OllamaConfig) {
    if dry_run {
        println!("Retrieved context:\n{prompt}");
        return;
    }
    let client = OllamaClient::new(ollama);
    println!("{}", client.generate(&prompt).await);
}

#[allow(clippy::too_many_arguments)]
async fn ask_speaker(
    docs: PathBuf,
    speaker: String,
    query: String,
    top_k: usize,
    model: Option<String>,
    ollama_url: Option<String>,
    config: PathBuf,
    dry_run: bool,
) -> Result<()> {
    let mut engine = RetrievalEngine::new();
    let count = ingest_directory(&mut engine, &docs)?;
    info!(
        "Ingested {} documents, {} known speakers",
        count,
        engine.list_speakers().len()
    );

    let segments = match engine.query_speaker(&speaker, &query, top_k) {
        Ok(segments) => segments,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };

    let prompt = build_prompt(&ContextSource::Speaker(speaker), &segments, &query);
    let ollama = resolve_ollama_config(&config, model, ollama_url)?;
    answer(prompt, dry_run, ollama).await;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn ask_period(
    docs: PathBuf,
    start: Option<String>,
    end: Option<String>,
    unknown: bool,
    query: String,
    top_k: usize,
    model: Option<String>,
    ollama_url: Option<String>,
    config: PathBuf,
    dry_run: bool,
) -> Result<()> {
    let selection = match DateSelection::from_bounds(start.as_deref(), end.as_deref(), unknown) {
        Ok(selection) => selection,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };

    let mut engine = RetrievalEngine::new();
    let count = ingest_directory(&mut engine, &docs)?;
    info!(
        "Ingested {} documents, {} date labels",
        count,
        engine.list_dates().len()
    );

    let segments = match engine.query_period(selection, &query, top_k) {
        Ok(segments) => segments,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };

    let source = match selection {
        DateSelection::Unknown => ContextSource::UnknownDate,
        DateSelection::Range { start, end } if start == end => ContextSource::Date(start),
        DateSelection::Range { start, end } => ContextSource::Period { start, end },
    };
    let prompt = build_prompt(&source, &segments, &query);
    let ollama = resolve_ollama_config(&config, model, ollama_url)?;
    answer(prompt, dry_run, ollama).await;
    Ok(())
}

fn list_keys(docs: PathBuf) -> Result<()> {
    let mut engine = RetrievalEngine::new();
    let count = ingest_directory(&mut engine, &docs)?;

    println!("Indexed Documents");
    println!("=================");
    println!("Documents ingested: {}", count);
    println!();

    println!("Speakers");
    println!("--------");
    for speaker in engine.list_speakers() {
        println!("{speaker}");
    }
    println!();

    println!("Date labels");
    println!("-----------");
    for label in engine.list_dates() {
        println!("{label}");
    }

    Ok(())
}

async fn ask_youtube(
    url: String,
    query: Option<String>,
    top_k: usize,
    model: Option<String>,
    ollama_url: Option<String>,
    config: PathBuf,
    dry_run: bool,
) -> Result<()> {
    let youtube = YoutubeClient::new();

    let metadata = match youtube.fetch_metadata(&url).await {
        Ok(metadata) => metadata,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    let segments = match youtube.fetch_transcript(&metadata.video_id, None).await {
        Ok(segments) => segments,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };

    let mut engine = RetrievalEngine::new();
    let label = source_label(&metadata.video_id, &metadata.title);
    match engine.ingest_source(&label, segments, metadata.date_label.as_deref()) {
        Ok(report) => {
            let mut message = format!(
                "Pridėtas YouTube vaizdo įrašas '{}' ({} segmentų).",
                metadata.title, report.segments
            );
            match &metadata.date_label {
                Some(date) => message.push_str(&format!(" Data iš pavadinimo: {date}.")),
                None => message.push_str(" Data nenustatyta, priskirta prie \"Nežinoma data\"."),
            }
            if let Some(warning) = &metadata.warning {
                message.push_str(&format!(" Įspėjimas: {warning}."));
            }
            println!("{message}");
        }
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    }

    if let Some(question) = query {
        let segments = match engine.query_speaker(&label, &question, top_k) {
            Ok(segments) => segments,
            Err(err) => {
                println!("{err}");
                return Ok(());
            }
        };
        let prompt = build_prompt(&ContextSource::Speaker(label), &segments, &question);
        let ollama = resolve_ollama_config(&config, model, ollama_url)?;
        answer(prompt, dry_run, ollama).await;
    }

    Ok(())
}

fn configure(ollama_url: Option<String>, model: Option<String>, config: &Path) -> Result<()> {
    let mut settings = Settings::load(config)?;
    if let Some(url) = ollama_url {
        settings.ollama_url = url;
    }
    if let Some(model) = model {
        settings.model_name = model;
    }
    settings.save(config)?;
    println!("Settings saved");
    Ok(())
}
