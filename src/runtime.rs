//! Event loop.
//!
//! Terminal input and finished commands land on one channel and are folded
//! into the state in arrival order. Commands run on the blocking pool, so a
//! slow repository query never stalls input or rendering.

use std::io;
use std::sync::Arc;

use crossterm::event::Event;
use futures::{Stream, StreamExt};
use ratatui::{Terminal, backend::Backend};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::commands::Command;
use crate::git::{GitError, RepoGateway};
use crate::models::{Message, Outcome, State};
use crate::theme::Theme;
use crate::ui;

#[derive(Debug)]
pub enum Exit {
    Quit,
    Failed(GitError),
}

pub async fn run<B, S>(
    terminal: &mut Terminal<B>,
    gateway: Arc<dyn RepoGateway>,
    state: &mut State,
    theme: &Theme,
    events: S,
) -> anyhow::Result<Exit>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Send + Unpin + 'static,
{
    run_observed(terminal, gateway, state, theme, events, |_| {}).await
}

/// Like [`run`], calling `observe` with the state after every update.
pub async fn run_observed<B, S>(
    terminal: &mut Terminal<B>,
    gateway: Arc<dyn RepoGateway>,
    state: &mut State,
    theme: &Theme,
    events: S,
    mut observe: impl FnMut(&State),
) -> anyhow::Result<Exit>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Send + Unpin + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let size = terminal.size()?;
    let _ = tx.send(Message::Resize {
        width: size.width,
        height: size.height,
    });
    let mut input = tokio::spawn(forward_input(events, tx.clone()));

    dispatch(state.startup_command(), &gateway, &tx);
    let channels = Channels {
        tx: &tx,
        rx: &mut rx,
        input: &mut input,
    };
    let result = event_loop(terminal, &gateway, state, theme, channels, &mut observe).await;

    input.abort();
    result
}

struct Channels<'a> {
    tx: &'a UnboundedSender<Message>,
    rx: &'a mut UnboundedReceiver<Message>,
    input: &'a mut JoinHandle<io::Result<()>>,
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    gateway: &Arc<dyn RepoGateway>,
    state: &mut State,
    theme: &Theme,
    channels: Channels<'_>,
    observe: &mut impl FnMut(&State),
) -> anyhow::Result<Exit> {
    let Channels { tx, rx, input } = channels;
    terminal.draw(|f| ui::render(f, state, theme))?;

    loop {
        let msg = tokio::select! {
            biased;
            Some(msg) = rx.recv() => msg,
            joined = &mut *input => {
                joined??;
                // Nothing can ask for quit any more.
                tracing::info!("input stream closed");
                return Ok(Exit::Quit);
            }
        };

        let outcome = state.update(msg);
        observe(state);
        match outcome {
            Outcome::Continue => {}
            Outcome::Run(command) => dispatch(command, gateway, tx),
            Outcome::Quit => {
                tracing::info!("quit requested");
                return Ok(Exit::Quit);
            }
            Outcome::Fail(err) => {
                tracing::error!(error = %err, "stopping on repository error");
                return Ok(Exit::Failed(err));
            }
        }

        terminal.draw(|f| ui::render(f, state, theme))?;
    }
}

async fn forward_input<S>(mut events: S, tx: UnboundedSender<Message>) -> io::Result<()>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    while let Some(event) = events.next().await {
        let Some(msg) = Message::from_event(event?) else {
            continue;
        };
        if tx.send(msg).is_err() {
            break;
        }
    }
    Ok(())
}

/// Starts `command` in the background; its message arrives on `tx`.
fn dispatch(command: Command, gateway: &Arc<dyn RepoGateway>, tx: &UnboundedSender<Message>) {
    tracing::debug!(command = command.name(), "dispatching command");
    let gateway = Arc::clone(gateway);
    let tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        let msg = command.execute(gateway.as_ref());
        // The loop may have exited already.
        let _ = tx.send(msg);
    });
}
