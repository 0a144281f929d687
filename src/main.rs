use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pocket_autotag::commands;
use pocket_autotag::commands::run::RunOptions;
use pocket_autotag::core::config::RetrieveState;
use pocket_autotag::core::paths::ConfigPaths;

#[derive(Parser)]
#[command(name = "pocket-autotag")]
#[command(about = "Predict tags for Pocket articles from the tags you already use", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config directory (default: ~/.config/pocket)")]
    config_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Debug logging on stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict and sync tags for every retrieved article (default)
    Run {
        #[arg(long, value_enum, help = "Which items to retrieve")]
        state: Option<RetrieveState>,
        #[arg(long, help = "Minimum relevance score (default: 0.01)")]
        threshold: Option<f32>,
        #[arg(long, help = "Maximum predicted tags per article (default: 2)")]
        max_new_tags: Option<usize>,
        #[arg(long, help = "Only process the first N articles")]
        limit: Option<usize>,
        #[arg(long, help = "Compute tags without sending them")]
        dry_run: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show the tag vocabulary with usage counts
    Vocab {
        #[arg(long, value_enum, help = "Which items to retrieve")]
        state: Option<RetrieveState>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Suggest tags for given text against an explicit vocabulary
    Suggest {
        /// Text to analyze
        text: String,
        #[arg(long, value_delimiter = ',', required = true, help = "Candidate tags, comma separated")]
        tags: Vec<String>,
        #[arg(long, help = "Maximum tags to select")]
        max_new_tags: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Authorize with Pocket and store a new access token
    Auth,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = ConfigPaths::resolve(cli.config_dir.as_deref())?;

    let command = match cli.command {
        Some(Commands::Suggest {
            text,
            tags,
            max_new_tags,
            json,
        }) => {
            return commands::suggest::run(&text, &tags, &paths.config.tagging, max_new_tags, json)
        }
        Some(Commands::Run {
            state,
            threshold,
            max_new_tags,
            limit,
            dry_run,
            json,
        }) => Online::Run(RunOptions {
            state,
            threshold,
            max_new_tags,
            limit,
            dry_run,
            json,
        }),
        Some(Commands::Vocab { state, json }) => Online::Vocab { state, json },
        Some(Commands::Auth) => Online::Auth,
        None => Online::Run(RunOptions::default()),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_online(&paths, command))
}

/// Commands that talk to Pocket
enum Online {
    Run(RunOptions),
    Vocab {
        state: Option<RetrieveState>,
        json: bool,
    },
    Auth,
}

async fn run_online(paths: &ConfigPaths, command: Online) -> anyhow::Result<()> {
    match command {
        Online::Run(opts) => commands::run::run(paths, opts).await,
        Online::Vocab { state, json } => commands::vocab::run(paths, state, json).await,
        Online::Auth => commands::auth::run(paths).await,
    }
}
