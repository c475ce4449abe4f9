use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Once;

use anyhow::{Context, Result};

use loxwalk::{ConsoleReporter, Session};

const EXIT_USAGE: u8 = 64;
const EXIT_IO: u8 = 74;

static TRACING_INIT: Once = Once::new();

/// Logs go to stderr and only when `RUST_LOG` is set, e.g.
/// `RUST_LOG=loxwalk=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr).with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => {
            run_prompt()?;
            Ok(ExitCode::SUCCESS)
        }
        [path] => Ok(run_file(path)),
        _ => {
            eprintln!("Usage: loxwalk [script]");
            Ok(ExitCode::from(EXIT_USAGE))
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path).with_context(|| format!("Reading {path}")) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{error:#}");
            return ExitCode::from(EXIT_IO);
        }
    };

    let mut session = Session::new();
    let outcome = session.run(&source, &mut ConsoleReporter);
    tracing::debug!(?outcome, "script finished");
    ExitCode::from(outcome.exit_code())
}

/// Reads one line at a time until EOF. Errors are reported and the session
/// keeps its globals for the next line.
fn run_prompt() -> Result<()> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "> ").context("Writing prompt")?;
        stdout.flush().context("Flushing prompt")?;

        line.clear();
        let read = stdin.lock().read_line(&mut line).context("Reading stdin")?;
        if read == 0 {
            writeln!(stdout).context("Writing newline")?;
            return Ok(());
        }
        session.run(&line, &mut ConsoleReporter);
    }
}
