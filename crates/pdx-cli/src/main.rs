//! paperdex CLI: builds a paper/entity graph and answers query sentences
//! over it.
//!
//! Commands: init, ingest, query, compile, entities, stats, repl,
//! completions

mod repl;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdx_core::config::CONFIG_FILE;
use pdx_core::Config;
use pdx_extract::{EntityRecognizer, Gazetteer, Unavailable};
use pdx_ingest::{load_job_index, Ingestor, TextDocuments};
use pdx_query::{compile_sentence, format_mentions, format_papers, run_sentence, OutputFormat};
use pdx_store::GraphStore;

#[derive(Parser)]
#[command(name = "paperdex")]
#[command(version)]
#[command(about = "Paper/entity graph builder with a natural-language query shell")]
struct Cli {
    /// Config file (default: ./paperdex.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create the database and artifact directories
    Init,
    /// Ingest every paper listed in a job index
    Ingest {
        /// Job index: TOML `[[paper]]` rows with `name` and `file`, or an
        /// `.xlsx` sheet with `paper_name` and `paper_pdf` columns
        index: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Run a query sentence
    #[command(alias = "q")]
    Query {
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// e.g. get one papers that mention person Fiona Calvert
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
    },
    /// Print the SQL a query sentence compiles to
    Compile {
        /// Print the parameterized form and its parameters
        #[arg(long)]
        params: bool,
        #[arg(required = true, num_args = 1..)]
        sentence: Vec<String>,
    },
    /// List the entities linked to a paper
    Entities {
        /// Paper name as given in the job index
        paper: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Graph statistics
    Stats {
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Query shell with completion and history on a terminal
    Repl,
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => Self::Table,
            Format::Json => Self::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "paperdex", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => cmd_init(&config, cli.config.is_none()),
        Commands::Ingest { index, format } => cmd_ingest(&config, &index, format),
        Commands::Query { format, sentence } => cmd_query(&config, &sentence.join(" "), format),
        Commands::Compile { params, sentence } => cmd_compile(&sentence.join(" "), params),
        Commands::Entities { paper, format } => cmd_entities(&config, &paper, format),
        Commands::Stats { format } => cmd_stats(&config, format),
        Commands::Repl => {
            let store = open_store(&config)?;
            if io::stdin().is_terminal() {
                repl::run_interactive(&store, &config.history)
            } else {
                repl::run(&store, io::stdin().lock(), &mut io::stdout())
            }
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Relative paths in a config file resolve against the file's directory;
/// defaults resolve against the working directory.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = Config::discover(explicit, &cwd)?;
    let base = explicit
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| cwd.clone(), |p| cwd.join(p));
    Ok(config.rooted_at(&base))
}

fn open_store(config: &Config) -> Result<GraphStore> {
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    GraphStore::open(&config.database)
        .with_context(|| format!("cannot open database {}", config.database.display()))
}

fn load_recognizer(config: &Config) -> Box<dyn EntityRecognizer> {
    let Some(path) = &config.gazetteer else {
        warn!("no gazetteer configured; only papers with cached entities can be ingested");
        return Box::new(Unavailable::new("no gazetteer configured"));
    };
    match Gazetteer::load(path) {
        Ok(gazetteer) => Box::new(gazetteer),
        Err(e) => {
            warn!(error = %e, "entity recognizer unavailable");
            Box::new(Unavailable::new(e.to_string()))
        }
    }
}

fn cmd_init(config: &Config, write_config: bool) -> Result<()> {
    let store = open_store(config)?;
    drop(store);

    for dir in std::iter::once(config.source_dir.as_path()).chain(config.artifact_dirs()) {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }

    if write_config && !Path::new(CONFIG_FILE).exists() {
        let defaults = toml::to_string_pretty(&Config::default())
            .context("cannot serialize default config")?;
        std::fs::write(CONFIG_FILE, defaults)
            .with_context(|| format!("cannot write {CONFIG_FILE}"))?;
    }

    info!(database = %config.database.display(), "initialized");
    println!("Initialized paperdex at {}", config.database.display());
    Ok(())
}

fn cmd_ingest(config: &Config, index: &Path, format: Format) -> Result<()> {
    let papers = load_job_index(index, config)?;
    let store = open_store(config)?;
    let recognizer = load_recognizer(config);

    let report = Ingestor::new(&store, &TextDocuments, recognizer.as_ref(), config.window_tokens)
        .run(&papers)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Table => {
            for outcome in &report.processed {
                let source = if outcome.cached { "cached" } else { "extracted" };
                println!("ingested {}: {} entities ({source})", outcome.name, outcome.spans);
            }
            for failed in &report.failed {
                println!("failed {}: {}", failed.name, failed.error);
            }
        }
    }

    if !report.is_clean() {
        bail!("{} of {} papers failed", report.failed.len(), papers.len());
    }
    Ok(())
}

fn cmd_query(config: &Config, sentence: &str, format: Format) -> Result<()> {
    let store = open_store(config)?;
    let rows = run_sentence(&store, sentence)?;
    println!("{}", format_papers(&rows, format.into()).trim_end());
    Ok(())
}

fn cmd_compile(sentence: &str, params: bool) -> Result<()> {
    let compiled = compile_sentence(sentence)?;
    if params {
        println!("{}", compiled.sql);
        println!("{}", serde_json::to_string(&compiled.params)?);
    } else {
        println!("{}", compiled.to_sql_text());
    }
    Ok(())
}

fn cmd_entities(config: &Config, paper: &str, format: Format) -> Result<()> {
    let store = open_store(config)?;
    let Some(record) = store.paper_by_name(paper)? else {
        bail!("no paper named '{paper}'");
    };
    let mentions = store.entities_for_paper(record.paper_id)?;
    println!("{}", format_mentions(&mentions, format.into()).trim_end());
    Ok(())
}

fn cmd_stats(config: &Config, format: Format) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        Format::Table => {
            println!("papers:   {}", stats.papers);
            println!("entities: {}", stats.entities);
            println!("links:    {}", stats.links);
            println!("mentions: {}", stats.mentions);
        }
    }
    Ok(())
}
