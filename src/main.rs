// src/main.rs
mod commands;
mod config;
mod git;
mod input;
mod logging;
mod models;
mod runtime;
mod theme;
mod ui;
mod update;

use std::{io, panic, process::ExitCode, sync::Arc};

use clap::Parser;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Runtime;

use crate::config::Settings;
use crate::git::{Git2Gateway, RepoGateway};
use crate::models::State;
use crate::runtime::Exit;
use crate::theme::Theme;

/// Dashboard for the repository in the current directory.
///
/// Tab switches between working tree status and branch history, up/down
/// select a branch, q or ctrl+c quits.
#[derive(Parser, Debug)]
#[command(name = "gitgud", version, about, long_about = None)]
struct Cli {}

fn main() -> anyhow::Result<ExitCode> {
    let _cli = Cli::parse();

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: invalid configuration: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Err(err) = logging::init(&settings) {
        eprintln!("warning: running without a log file: {err:#}");
    }

    let gateway: Arc<dyn RepoGateway> = Arc::new(Git2Gateway::new(
        std::env::current_dir()?,
        settings.commit_limit,
    ));
    let mut state = State::new(settings.fence_stale_logs);

    let rt = Runtime::new()?;
    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let result = rt.block_on(runtime::run(
        &mut terminal,
        gateway,
        &mut state,
        &Theme::default(),
        EventStream::new(),
    ));

    let restored = restore_terminal(&mut terminal);
    // A stuck repository query must not hold up exit.
    rt.shutdown_background();
    restored?;

    match result? {
        Exit::Quit => Ok(ExitCode::SUCCESS),
        Exit::Failed(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

fn setup_terminal() -> anyhow::Result<Tui> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}
