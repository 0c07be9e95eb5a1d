use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio_util::sync::CancellationToken;

use zerohr_core::{Config, HttpBackend, KillMode, TaskController};

mod action;
mod app;
mod clipboard;
mod input;
mod model;
mod theme;
mod view;

use app::{App, Effect};

/// ZeroHR TUI: describe a hire, let the agent draft the document, watch it progress.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Backend base URL (e.g. http://127.0.0.1:8000)
    #[arg(long)]
    url: Option<String>,

    /// Delay between status polls, in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Delay before retrying after a network error, in milliseconds
    #[arg(long)]
    retry_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: <config dir>/zerohr/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kill mode sent with the reset on cancel (soft or hard)
    #[arg(long)]
    kill_mode: Option<KillMode>,

    /// Prefill the request field
    #[arg(long)]
    question: Option<String>,

    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    // CLI flags > env vars > config file > defaults
    let mut config = Config::resolve(args.config.as_deref())?;
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(ms) = args.poll_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.retry_ms {
        config.retry_interval = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(mode) = args.kill_mode {
        config.reset.kill_mode = mode;
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(path: Option<&PathBuf>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logging(args.log_file.as_ref())?;
    let config = resolve_config(&args)?;
    log::info!("using backend at {}", config.base_url);

    let backend = HttpBackend::new(&config)?;
    let (mut controller, mut rx) = TaskController::new(Arc::new(backend), &config);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let mut app = App::new(config.base_url.clone(), args.question.as_deref());
    if let Ok(size) = terminal.size() {
        app.update(action::Action::Resize(size.width, size.height));
    }

    // Also handle Ctrl+C at the OS level for clean shutdown
    let quit = CancellationToken::new();
    let quit_for_signal = quit.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            quit_for_signal.cancel();
        }
    });

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| app.view(f))?;

        let mut effect = None;
        tokio::select! {
            Some(controller_event) = rx.recv() => {
                app.handle_controller_event(controller_event);
                // Drain any additional queued events
                while let Ok(evt) = rx.try_recv() {
                    app.handle_controller_event(evt);
                }
            }
            _ = quit.cancelled() => app.should_quit = true,
            _ = async {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        effect = app.update(input::map_event(&evt));
                    }
                }
            } => {}
        }

        match effect {
            Some(Effect::Submit(question)) => {
                if let Err(e) = controller.submit(&question) {
                    app.submit_rejected(&e);
                }
            }
            Some(Effect::Cancel) => {
                controller.cancel();
            }
            Some(Effect::Copy(document)) => {
                let outcome = clipboard::copy(terminal.backend_mut(), &document);
                app.copy_finished(outcome);
            }
            Some(Effect::ResetSession) => controller.clear(),
            None => {}
        }

        app.update(action::Action::Tick);

        if app.should_quit {
            break;
        }
    }

    // Stops any polling context; the backend task is left alone.
    drop(controller);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;

    Ok(())
}
