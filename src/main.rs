use tgh::app::{AppConfig, AppState};
use tgh::cli::{Cli, VERSION};
use tgh::events::{AppEvent, EventHandler};
use tgh::runtime::Runtime;
use tgh::tui;
use tgh::update::update;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("opening {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn enter_terminal() -> Result<Tui> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut tui = Terminal::new(CrosstermBackend::new(stdout))?;
    tui.clear()?;
    Ok(tui)
}

/// Leave the alternate screen before the default hook prints the panic.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        previous(info);
    }));
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if let Some(path) = &args.debug {
        init_tracing(path)?;
    }
    if let Some(dir) = &args.repo_path {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("Error: cannot enter {}: {e}", dir.display());
            std::process::exit(1);
        }
    }
    tracing::info!(version = VERSION, "starting");

    install_panic_hook();
    let mut terminal = enter_terminal()?;

    let startup = match tui::startup::run_startup(&mut terminal).await {
        Ok(s) => s,
        Err(e) => {
            restore_terminal();
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut config = AppConfig::new(
        startup.coords.host.clone(),
        startup.coords.owner.clone(),
        startup.coords.repo.clone(),
    );
    config.runs_interval = Duration::from_secs(args.interval.max(1));
    config.limit = args.limit;
    config.version_string = VERSION.to_string();
    let mut state = AppState::new(config);
    state.default_branch = startup.default_branch;

    let events = EventHandler::new(Duration::from_millis(100));
    let runtime = Runtime::new(Arc::new(startup.client), events.sender(), args.limit);

    let size = terminal.size()?;
    runtime.execute_all(update(&mut state, AppEvent::Resize(size.width, size.height)));

    let result = run_app(&mut terminal, &mut state, events, &runtime).await;
    restore_terminal();
    terminal.show_cursor()?;
    result
}

async fn run_app(
    terminal: &mut Tui,
    state: &mut AppState,
    mut events: EventHandler,
    runtime: &Runtime,
) -> Result<()> {
    loop {
        terminal.draw(|f| tui::render::render(f, state))?;

        let Some(event) = events.next().await else {
            tracing::warn!("event channel closed");
            break;
        };
        let commands = update(state, event);
        runtime.execute_all(commands);

        if state.should_quit {
            break;
        }
    }
    events.stop();
    Ok(())
}
