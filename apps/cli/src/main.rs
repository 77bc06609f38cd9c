//! rdl CLI - Command-line resumable downloader
//!
//! Downloads a single URL, resuming a partially written file when possible,
//! and fingerprints files with the sampling hash.

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rdl_types::{ClientSettings, DEFAULT_CHUNK_SIZE};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// rdl - Resumable Downloader
#[derive(Parser)]
#[command(name = "rdl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "human")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// User-Agent sent with every request
    #[arg(long, env = "RDL_USER_AGENT")]
    user_agent: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, env = "RDL_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// Proxy URL for all requests
    #[arg(long, env = "RDL_PROXY")]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a URL, resuming a partial file if present
    Get {
        /// URL to download
        url: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Discard any existing file and start from the first byte
        #[arg(long)]
        overwrite: bool,

        /// Extra request header, as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header", value_parser = commands::parse_header)]
        headers: Vec<(String, String)>,

        /// Bytes read from the response per write
        #[arg(
            long,
            env = "RDL_CHUNK_SIZE",
            default_value_t = DEFAULT_CHUNK_SIZE,
            value_parser = commands::parse_chunk_size
        )]
        chunk_size: usize,

        /// Pause once this many bytes are on disk
        #[arg(long)]
        stop_after: Option<u64>,
    },

    /// Print the sampling hash of a file
    Hash {
        /// File to hash
        path: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "rdl_core=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let defaults = ClientSettings::default();
    let settings = ClientSettings {
        user_agent: cli.user_agent.unwrap_or(defaults.user_agent),
        connect_timeout_secs: cli.connect_timeout.or(defaults.connect_timeout_secs),
        proxy: cli.proxy,
        chunk_size: defaults.chunk_size,
    };

    let success = match cli.command {
        Commands::Get {
            url,
            output,
            overwrite,
            headers,
            chunk_size,
            stop_after,
        } => {
            let settings = ClientSettings {
                chunk_size,
                ..settings
            };
            let request = commands::GetRequest {
                url,
                output,
                overwrite,
                headers,
                stop_after,
            };
            commands::get(settings, request, cli.output).await?
        }

        Commands::Hash { path } => commands::hash(&path, cli.output)?,

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Cli::command(), "rdl", &mut std::io::stdout());
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
