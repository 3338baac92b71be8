//! `TaskBoard` — per-user task lists in the terminal.
//!
//! Reads one command per line from stdin and prints the result. Boards and
//! the signed-in user are kept in the data directory, so they survive a
//! restart. Configuration via CLI flags, environment variables, or config
//! file (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! cargo run --bin taskboard -- --data-dir /tmp/boards
//!
//! # Scripted
//! printf 'login ada@example.com\nnew-list Work\nadd 1 Write docs\nshow\n' \
//!     | cargo run --bin taskboard
//! ```

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::app::{App, LOGIN_PROMPT};
use taskboard::config::{AppConfig, CliArgs};
use taskboard::storage::FileStorage;

fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig::default()
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(data_dir = %config.data_dir.display(), "taskboard starting");

    let storage = match FileStorage::open(&config.data_dir) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::error!(error = %e, "cannot open data directory");
            eprintln!("Error: {e}");
            return Err(io::Error::other(e));
        }
    };

    let mut app = App::new(storage, config.board_limits());
    let result = run_shell(&mut app);

    tracing::info!("taskboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file so they never interleave with shell output.
/// Returns a guard that must be held for the lifetime of the program to
/// ensure logs are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Read-eval-print loop over stdin until EOF or `quit`.
fn run_shell<S>(app: &mut App<S>) -> io::Result<()>
where
    S: taskboard::storage::KeyValueStore + Clone,
{
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    writeln!(stdout, "TaskBoard. Type `help` for commands.")?;
    match app.session().current() {
        Some(profile) => writeln!(stdout, "Welcome back, {}.", profile.display_name())?,
        None => writeln!(stdout, "{LOGIN_PROMPT}")?,
    }

    write!(stdout, "> ")?;
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        for output in app.handle_line(&line) {
            writeln!(stdout, "{output}")?;
        }
        if app.should_quit {
            break;
        }
        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    Ok(())
}
