// strata: versioned memory manager with a step-through inspector

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use strata::driver::constants::DEFAULT_SNAPSHOT_LIMIT;
use strata::driver::{Session, SessionConfig};
use strata::memory::{MemoryConfig, DEFAULT_HEAP_CAPACITY};
use strata::ui::App;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Run a memory script and step through its generations")]
#[command(version)]
struct Args {
    /// Script to run
    file: PathBuf,

    /// Maximum number of heap positions
    #[arg(long, default_value_t = DEFAULT_HEAP_CAPACITY)]
    heap_capacity: usize,

    /// Byte budget for the snapshot history
    #[arg(long, default_value_t = DEFAULT_SNAPSHOT_LIMIT)]
    snapshot_limit: usize,

    /// Print the transcript instead of opening the inspector
    #[arg(long)]
    headless: bool,

    /// Debug-level logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let source = fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read '{}': {}", args.file.display(), e))?;

    let config = SessionConfig {
        memory: MemoryConfig::new(args.heap_capacity),
        snapshot_limit: args.snapshot_limit,
    };

    let mut session = match Session::from_source(&source, config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        file = %args.file.display(),
        statements = session.script().statements.len(),
        "script parsed"
    );

    // A failed run still leaves a navigable history
    let run_result = session.run();

    if args.headless {
        for line in session.transcript().get_output(session.transcript().len()) {
            println!("{}", line);
        }
        if let Err(e) = run_result {
            eprintln!("Runtime error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Err(e) = session.rewind_to_start() {
        tracing::warn!(error = %e, "failed to rewind to start");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, source);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    Ok(())
}
