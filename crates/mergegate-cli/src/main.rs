//! mergegate - merge gating from the command line
//!
//! Polls the configured verification checks for one commit and publishes a
//! single aggregate pass/fail status once a verdict is reached.
//!
//! ## Commands
//!
//! - `run`: poll the required checks to a verdict and report it
//! - `check-config`: validate gate configuration without polling

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mergegate_core::{
    CheckRegistry, CheckStatusSource, CommitStatusReporter, CommitStatusSource, GateConfig,
    GateOrchestrator, LogReporter, ResultReporter, RunOutcome, Verdict,
};

const DEFAULT_MAX_WAIT_SECS: u64 = 1800;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(name = "mergegate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge gating via check-status aggregation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Comma-separated list of required check names
    #[arg(long, value_delimiter = ',')]
    checks: Vec<String>,

    /// Gate configuration file (JSON); explicit flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum total wait before timing out, in seconds
    #[arg(long)]
    max_wait_secs: Option<u64>,

    /// Sleep between polling ticks, in seconds
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Per-check fetch timeout, in seconds
    #[arg(long)]
    fetch_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the required checks for a commit until a verdict is reached
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Repository in owner/name form
        #[arg(long)]
        repo: String,

        /// Commit SHA being gated
        #[arg(long)]
        sha: String,

        /// GitHub API base URL
        #[arg(long, default_value = "https://api.github.com")]
        api_url: String,

        /// API token for the status system
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Status context to publish the verdict under
        #[arg(long, default_value = "mergegate")]
        status_context: String,

        /// Publish the verdict as a commit status (default: log only)
        #[arg(long)]
        publish: bool,

        /// Write the JSON gate report to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate gate configuration and print the registry digest
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Merge file-based configuration with command-line overrides.
fn resolve_config(args: &ConfigArgs) -> Result<GateConfig> {
    let base = match &args.config {
        Some(path) => GateConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GateConfig::new(
            Vec::new(),
            DEFAULT_MAX_WAIT_SECS,
            DEFAULT_POLL_INTERVAL_SECS,
            DEFAULT_FETCH_TIMEOUT_SECS,
        ),
    };

    let config = GateConfig::new(
        if args.checks.is_empty() {
            base.checks
        } else {
            args.checks.clone()
        },
        args.max_wait_secs.unwrap_or(base.max_wait_secs),
        args.poll_interval_secs.unwrap_or(base.poll_interval_secs),
        args.fetch_timeout_secs.unwrap_or(base.fetch_timeout_secs),
    );

    config.validate().context("invalid gate configuration")?;

    if config.fetch_timeout_secs > config.poll_interval_secs {
        warn!(
            fetch_timeout_secs = config.fetch_timeout_secs,
            poll_interval_secs = config.poll_interval_secs,
            "fetch timeout exceeds poll interval; hung fetches will delay ticks",
        );
    }

    Ok(config)
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_gate(
    config: GateConfig,
    repo: String,
    sha: String,
    api_url: String,
    token: Option<String>,
    status_context: String,
    publish: bool,
    output: Option<PathBuf>,
) -> Result<i32> {
    let source: Arc<dyn CheckStatusSource> = Arc::new(CommitStatusSource::with_api_url(
        &api_url,
        &repo,
        &sha,
        token.clone(),
    ));

    let reporter: Arc<dyn ResultReporter> = if publish {
        Arc::new(CommitStatusReporter::with_api_url(
            &api_url,
            &repo,
            &sha,
            &status_context,
            token,
        ))
    } else {
        Arc::new(LogReporter::new())
    };

    let orchestrator =
        GateOrchestrator::new(config, source, reporter).context("failed to start gate run")?;
    info!(run_id = %orchestrator.run_id(), repo = %repo, sha = %sha, "gating commit");

    // Ctrl-C aborts the run without publishing a verdict.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = orchestrator.run_with_cancel(cancel_rx).await?;

    match outcome {
        RunOutcome::Reported(report) => {
            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                info!(path = %path.display(), "wrote gate report");
            }

            println!("{}", report.render_markdown());

            Ok(match report.verdict {
                Verdict::Success => 0,
                // Failed and timed-out runs both block the merge.
                _ => 1,
            })
        }
        RunOutcome::Cancelled => {
            warn!("gate run cancelled; no verdict reported");
            Ok(130)
        }
    }
}

fn check_config(args: &ConfigArgs) -> Result<i32> {
    let config = resolve_config(args)?;
    let registry = CheckRegistry::build(&config.checks)?;

    println!("configuration valid");
    println!("registry digest: {}", registry.digest());
    for spec in registry.specs() {
        println!("  required check: {}", spec.name);
    }
    println!(
        "max wait {}s, poll interval {}s, fetch timeout {}s",
        config.max_wait_secs, config.poll_interval_secs, config.fetch_timeout_secs
    );
    Ok(0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let code = match cli.command {
        Commands::Run {
            config,
            repo,
            sha,
            api_url,
            token,
            status_context,
            publish,
            output,
        } => {
            if !repo.contains('/') {
                bail!("--repo must be in owner/name form, got '{repo}'");
            }
            let config = resolve_config(&config)?;
            run_gate(
                config,
                repo,
                sha,
                api_url,
                token,
                status_context,
                publish,
                output,
            )
            .await?
        }
        Commands::CheckConfig { config } => check_config(&config)?,
    };

    std::process::exit(code);
}
