use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

use zerohr_core::types::DEFAULT_SEED_STATUS;
use zerohr_core::{
    Config, ControllerEvent, HttpBackend, KillMode, Phase, ResetOptions, TaskBackend,
    TaskController, TaskState,
};

mod output;

use output::Palette;

/// ZeroHR - generate hiring documents with the ZeroHR agent backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct ConnArgs {
    /// Backend base URL (e.g. http://127.0.0.1:8000)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Config file (default: <config dir>/zerohr/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Delay between status polls, in milliseconds
    #[arg(long, global = true)]
    poll_ms: Option<u64>,

    /// Delay before retrying after a network error, in milliseconds
    #[arg(long, global = true)]
    retry_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Kill mode sent with the reset on cancel (soft or hard)
    #[arg(long, global = true)]
    kill_mode: Option<KillMode>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a request and wait for the generated document
    Generate {
        /// Request text; read from --file or stdin when omitted
        text: Option<String>,

        /// Read the request text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Write the document to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Kill running work and reseed the workflow
    Reset {
        /// Do not reseed the workflow table
        #[arg(long)]
        no_reseed: bool,

        /// Do not purge queued tasks
        #[arg(long)]
        no_purge: bool,

        /// Do not flush the result backend
        #[arg(long)]
        no_flush: bool,
    },
    /// Revoke running tasks without touching the workflow
    Kill {
        /// soft or hard
        #[arg(long, default_value_t = KillMode::Soft)]
        mode: KillMode,
    },
    /// Reset every workflow section to a status
    Seed {
        #[arg(long, default_value = DEFAULT_SEED_STATUS)]
        status: String,
    },
    /// Show the backend's workflow table
    State,
}

/// How a `generate` run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    Failed,
    Cancelled,
}

impl Outcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Self::Done => ExitCode::SUCCESS,
            Self::Failed => ExitCode::FAILURE,
            Self::Cancelled => ExitCode::from(130),
        }
    }
}

/// Terminal outcome for a single-submit session, if it has one yet.
fn outcome_of(state: &TaskState) -> Option<Outcome> {
    match state.phase {
        Phase::Done => Some(Outcome::Done),
        // Only reachable after a failed start: this client submits once.
        Phase::Idle | Phase::Error => Some(Outcome::Failed),
        Phase::CancelledByUser if !state.reset_pending => Some(Outcome::Cancelled),
        _ => None,
    }
}

fn resolve_config(conn: &ConnArgs) -> anyhow::Result<Config> {
    // CLI flags > env vars > config file > defaults
    let mut config = Config::resolve(conn.config.as_deref())?;
    if let Some(url) = &conn.url {
        config.base_url = url.clone();
    }
    if let Some(ms) = conn.poll_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = conn.retry_ms {
        config.retry_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = conn.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(mode) = conn.kill_mode {
        config.reset.kill_mode = mode;
    }
    config.validate()?;
    Ok(config)
}

fn read_question(text: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read request from stdin")?;
    Ok(buf)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Drive one submitted task to its end, forwarding interrupts.
///
/// The first interrupt cancels (stop polling, soft reset). A second one stops
/// waiting for the reset to answer.
async fn wait_for_outcome(
    controller: &mut TaskController,
    rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
    state: &mut TaskState,
    on_status: impl Fn(&str),
) -> Outcome {
    let mut cancel_requested = false;
    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else {
                    return Outcome::Failed;
                };
                if !state.apply(event) {
                    continue;
                }
                on_status(state.status_text());
                if let Some(task_id) = &state.task_id {
                    log::debug!("task {task_id}: {}", state.status_text());
                }
                if let Some(outcome) = outcome_of(state) {
                    return outcome;
                }
            }
            Some(()) = interrupts.recv() => {
                if cancel_requested || state.reset_pending {
                    log::warn!("interrupted again, not waiting for the backend reset");
                    return Outcome::Cancelled;
                }
                cancel_requested = true;
                // Past polling the finalize call is already on its way; let it land.
                controller.cancel();
            }
        }
    }
}

async fn generate(
    config: &Config,
    question: &str,
    output_path: Option<&Path>,
    palette: &Palette,
) -> anyhow::Result<ExitCode> {
    let backend = HttpBackend::new(config)?;
    let (mut controller, mut rx) = TaskController::new(Arc::new(backend), config);
    let mut state = TaskState::default();

    controller.submit(question)?;

    let (signal_tx, mut interrupts) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    if signal_tx.send(()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("failed to listen for Ctrl+C: {e}");
                    break;
                }
            }
        }
    });

    let pb = spinner();
    let outcome = wait_for_outcome(&mut controller, &mut rx, &mut interrupts, &mut state, |status| {
        pb.set_message(status.to_string())
    })
    .await;
    pb.finish_and_clear();

    match outcome {
        Outcome::Done => {
            let Some(result) = &state.result else {
                anyhow::bail!("task finished without a result");
            };
            eprintln!("{}", output::summary(result, state.status_text(), palette));
            match output_path {
                Some(path) => {
                    std::fs::write(path, &result.document)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Document written to {}", path.display().style(palette.bold));
                }
                None => println!("{}", result.document),
            }
        }
        Outcome::Failed => eprintln!("{}", state.status_text().style(palette.error)),
        Outcome::Cancelled => eprintln!("{}", state.status_text().style(palette.warning)),
    }
    Ok(outcome.exit_code())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let palette = Palette::new(!cli.no_color);
    let config = resolve_config(&cli.conn)?;
    log::info!("using backend at {}", config.base_url);

    match cli.command {
        Command::Generate { text, file, output } => {
            let question = read_question(text, file.as_deref())?;
            generate(&config, &question, output.as_deref(), &palette).await
        }
        Command::Reset {
            no_reseed,
            no_purge,
            no_flush,
        } => {
            let options = ResetOptions {
                reseed: !no_reseed,
                purge: !no_purge,
                flush_backend: !no_flush,
                ..config.reset.clone()
            };
            HttpBackend::new(&config)?.reset(&options).await?;
            println!(
                "{} ({} kill)",
                "Backend reset sent".style(palette.ok),
                options.kill_mode
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Kill { mode } => {
            let killed = HttpBackend::new(&config)?.kill(mode).await?;
            println!("{} {killed}", "Killed:".style(palette.ok));
            Ok(ExitCode::SUCCESS)
        }
        Command::Seed { status } => {
            HttpBackend::new(&config)?
                .seed(&status, config.reset.status_map.as_ref())
                .await?;
            println!("{} {status}", "Workflow seeded:".style(palette.ok));
            Ok(ExitCode::SUCCESS)
        }
        Command::State => {
            let rows = HttpBackend::new(&config)?.workflow_state().await?;
            println!("{}", output::workflow_table(&rows, &palette));
            Ok(ExitCode::SUCCESS)
        }
    }
}
