//! Tracing subscriber setup.
//!
//! Logs always go to stderr (compact text, or JSON lines with `--log-json`)
//! so that `proposer generate` can keep stdout for the proposal itself.
//! With a log directory configured, a daily rolling JSON file is written too.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub const LOG_FILE_PREFIX: &str = "proposer.log";

/// Options for [`init`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub log_dir: Option<&'a Path>,
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "proposer=debug,tower_http=debug,info"
    } else {
        "proposer=info,warn"
    }
}

fn make_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the process.
pub fn init(options: LogOptions<'_>) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(options.verbose);
    if options.json {
        layers.push(
            stderr
                .json()
                .with_current_span(true)
                .with_filter(make_filter(options.verbose))
                .boxed(),
        );
    } else {
        layers.push(
            stderr
                .compact()
                .with_filter(make_filter(options.verbose))
                .boxed(),
        );
    }

    let mut guard = None;
    if let Some(dir) = options.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .with_filter(make_filter(options.verbose))
                .boxed(),
        );
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
