//! Command-line interface for rebuild-hook.
//!
//! The CLI is glue only: it loads configuration, wires a
//! [`WebsiteRebuilder`] onto an [`EventBus`] for every content event, and
//! feeds it events from arguments or stdin. Everything that talks to the
//! network lives in `rebuild-hook-core`.
//!
//! A failed build hook never makes a command fail. Only configuration and
//! usage errors do; `replay` skips and reports lines it cannot use rather
//! than aborting the stream.

use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rebuild_hook_core::dispatch::{DispatchReport, Dispatcher, EventBus, DEFAULT_QUEUE_CAPACITY};
use rebuild_hook_core::event::{ContentEvent, ContentNotification};
use rebuild_hook_core::rebuilder::WebsiteRebuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[clap(
    name = "rebuild-hook",
    version,
    about = "Trigger a static-site build hook when CMS content changes"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dispatch a single content event
    Trigger {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// copy, delete, move, publish or unpublish
        #[clap(long)]
        event: ContentEvent,
        /// What changed, for the logs
        #[clap(long)]
        subject: Option<String>,
    },
    /// Dispatch events read from stdin, one `<event> [subject]` per line
    Replay {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Events buffered ahead of the dispatcher
        #[clap(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
        queue: usize,
    },
    /// Validate the config and print the request it resolves to
    Check {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Trigger {
            config,
            event,
            subject,
        } => {
            let bus = build_bus(&config)?;
            let notification = ContentNotification { event, subject };
            tracing::info!(command = "trigger", %event, "Dispatching content event");
            for outcome in bus.publish(&notification).await {
                println!("{}", serde_json::to_string(&outcome)?);
            }
            Ok(())
        }
        Commands::Replay { config, queue } => {
            let bus = build_bus(&config)?;
            let reader = BufReader::new(tokio::io::stdin());
            let report = replay(bus, queue, reader).await?;
            if !report.rejected_lines.is_empty() {
                tracing::warn!(
                    rejected = report.rejected_lines.len(),
                    "Some event lines were skipped"
                );
            }
            println!("Replay complete.\nReport:");
            println!("{:#?}", report);
            Ok(())
        }
        Commands::Check { config } => {
            let loaded = load_config(config)?;
            let resolved = match loaded.website_build.resolve() {
                Ok(request) => serde_json::json!({
                    "shape": loaded.shape,
                    "request": request.redacted(),
                    "timeout_secs": loaded.website_build.timeout().as_secs(),
                    "max_attempts": loaded.website_build.retry.attempts(),
                }),
                Err(reason) => serde_json::json!({
                    "shape": loaded.shape,
                    "skipped": reason,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(())
        }
    }
}

/// Loads the config and subscribes one rebuilder to every content event.
fn build_bus(config: &Path) -> Result<EventBus> {
    let loaded = load_config(config)?;
    let rebuilder = WebsiteRebuilder::from_config(loaded.website_build)
        .map_err(|e| anyhow::anyhow!("Failed to construct HTTP client: {e}"))?;
    let mut bus = EventBus::new();
    bus.subscribe_all(Arc::new(rebuilder));
    Ok(bus)
}

/// Totals for one `replay` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub dispatch: DispatchReport,
    /// 1-based numbers of lines that were skipped because they did not
    /// decode or did not parse as an event.
    pub rejected_lines: Vec<usize>,
}

/// Dispatches every event line from `reader` in order. Blank lines and
/// `#` comments are ignored; lines that are not valid UTF-8 or not a known
/// event are logged, skipped and listed in the report.
///
/// Events queued before a read error are still delivered; the error is
/// returned once the dispatcher has drained.
pub async fn replay<R>(bus: EventBus, queue: usize, mut reader: R) -> Result<ReplayReport>
where
    R: AsyncBufRead + Unpin,
{
    let dispatcher = Dispatcher::spawn(bus, queue);
    let mut rejected_lines = Vec::new();
    let fed = feed(&dispatcher, &mut reader, &mut rejected_lines).await;
    let dispatch = dispatcher.shutdown().await?;
    fed?;
    Ok(ReplayReport {
        dispatch,
        rejected_lines,
    })
}

async fn feed<R>(dispatcher: &Dispatcher, reader: &mut R, rejected: &mut Vec<usize>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read event stream")?;
        if read == 0 {
            return Ok(());
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping event line that is not UTF-8");
                rejected.push(line_no);
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match trimmed.parse::<ContentNotification>() {
            Ok(notification) => dispatcher.send(notification).await?,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping unparseable event line");
                rejected.push(line_no);
            }
        }
    }
}
