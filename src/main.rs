//! registrar CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use registrar::{
    commands::{
        cmd_ask, cmd_delete_session, cmd_ingest, cmd_init, cmd_list_documents, cmd_list_sessions,
        cmd_remove, cmd_search, cmd_show_session, cmd_status, print_answer, print_documents,
        print_ingest_stats, print_remove_stats, print_search_results, print_session,
        print_sessions, print_status, AskOptions, SearchOptions,
    },
    config::Config,
    embed::create_embedder,
    error::{Error, Result},
    generate::create_generator,
    progress::LogWriterFactory,
    store::IndexStore,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "registrar")]
#[command(version, about = "Answer student questions from official university documents", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize registrar configuration and index database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest page-delimited text documents into the index
    Ingest {
        /// File or directory of .txt documents
        path: PathBuf,

        /// Number of documents processed concurrently
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Ask a question and get a cited answer
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity score (0-1)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Record the exchange in this conversation session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Retrieve matching chunks without invoking the generator
    Search {
        /// The search query
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0-1)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Show index and backend status
    Status,

    /// List ingested documents
    Documents {
        /// Output only document IDs (one per line, for scripting)
        #[arg(long)]
        ids_only: bool,
    },

    /// Remove a document and all its chunks and embeddings
    Remove {
        /// Document ID (or unambiguous prefix)
        document_id: String,
    },

    /// Manage conversation sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List sessions, most recently updated first
    List,

    /// Show a session transcript
    Show { id: String },

    /// Delete a session
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Init and completions run without an existing config
    if let Commands::Init { force } = cli.command {
        let base_dir = cli.config.as_deref().and_then(|p| {
            if p.extension().map_or(false, |e| e == "toml") {
                p.parent().map(PathBuf::from)
            } else {
                Some(p.to_path_buf())
            }
        });
        let config = cmd_init(base_dir, force).await?;
        println!("✓ registrar initialized");
        println!("  Config: {}", config.paths.config_file.display());
        println!("\nNext steps:");
        println!("  1. Edit the config file to point at your embedding and LLM backends");
        println!("  2. Ingest documents: registrar ingest /path/to/corpus");
        println!("  3. Ask a question: registrar ask \"When are the resit exams?\"");
        return Ok(());
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "registrar", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;

    let store = IndexStore::connect(
        &config.paths.db_file,
        config.embedding.dimension,
        config.metric()?,
    )
    .await?;
    if !store.is_initialized().await? {
        return Err(Error::NotInitialized);
    }

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest { path, workers } => {
            if let Some(workers) = workers {
                config.ingest.workers = workers.max(1);
            }
            let embedder = create_embedder(&config.embedding)?;
            let stats = cmd_ingest(&config, &store, embedder.as_ref(), &path).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Ask {
            question,
            top_k,
            min_score,
            session,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let generator = create_generator(&config.generation)?;
            let options = AskOptions {
                top_k,
                min_score,
                session,
            };

            let result = cmd_ask(
                &config,
                &store,
                embedder.as_ref(),
                generator.as_ref(),
                &question,
                options,
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_answer(&result);
            }
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let options = SearchOptions { limit, min_score };

            let report = cmd_search(&config, &store, embedder.as_ref(), &query, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_search_results(&report);
            }
        }

        Commands::Status => {
            let report = cmd_status(&config, &store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_status(&report);
            }
        }

        Commands::Documents { ids_only } => {
            let documents = cmd_list_documents(&store).await?;

            if ids_only {
                for doc in &documents {
                    println!("{}", doc.id);
                }
            } else if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                print_documents(&documents);
            }
        }

        Commands::Remove { document_id } => {
            let stats = cmd_remove(&store, &document_id).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_remove_stats(&document_id, &stats);
            }
        }

        Commands::Sessions { action } => match action {
            SessionAction::List => {
                let sessions = cmd_list_sessions(&config)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&sessions)?);
                } else {
                    print_sessions(&sessions);
                }
            }
            SessionAction::Show { id } => {
                let session = cmd_show_session(&config, &id)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                } else {
                    print_session(&session);
                }
            }
            SessionAction::Delete { id } => {
                cmd_delete_session(&config, &id)?;
                println!("✓ Session '{}' deleted", id);
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'registrar init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
