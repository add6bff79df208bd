use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use proposer::config::Settings;
use proposer::logging::{self, LogOptions};

mod cmd;

#[derive(Parser)]
#[command(name = "proposer")]
#[command(version, about = "Multi-agent strategy proposal generator")]
pub struct Cli {
    /// Path to a proposer.toml. Defaults to ./proposer.toml, then the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the web page and the proposal event stream
    Serve {
        /// Port to serve on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Open the page in a browser once listening
        #[arg(long)]
        open: bool,

        /// Enable dev mode (permissive CORS)
        #[arg(long)]
        dev: bool,
    },
    /// Generate one proposal in the terminal, streaming the editor's output to stdout
    Generate {
        /// File holding the business context. Uses the built-in sample when omitted
        #[arg(long)]
        context_file: Option<PathBuf>,
    },
    /// Show the resolved configuration and any warnings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let _log_guard = logging::init(LogOptions {
        verbose: cli.verbose,
        json: cli.log_json || settings.toml.logging.json,
        log_dir: settings.toml.logging.log_dir.as_deref(),
    })?;

    match &cli.command {
        Commands::Serve {
            port,
            host,
            open,
            dev,
        } => {
            cmd::cmd_serve(&settings, *port, host.clone(), *open, *dev).await?;
        }
        Commands::Generate { context_file } => {
            cmd::cmd_generate(&settings, context_file.as_deref()).await?;
        }
        Commands::Config => cmd::cmd_config(&settings),
    }

    Ok(())
}
