use std::collections::{BTreeMap, BTreeSet};

use crossterm::event::KeyEvent;

use crate::commands::Command;
use crate::git::{Branch, FileStatus, GitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Status,
    Logs,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Status, Tab::Logs];

    pub fn next(self) -> Self {
        match self {
            Tab::Status => Tab::Logs,
            Tab::Logs => Tab::Status,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Status => "Status",
            Tab::Logs => "Logs",
        }
    }

    pub fn as_index(self) -> usize {
        match self {
            Tab::Status => 0,
            Tab::Logs => 1,
        }
    }
}

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// Working tree status split the way the status panels show it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub untracked: BTreeSet<String>,
    pub modified: BTreeMap<String, FileStatus>,
    pub staged: BTreeMap<String, FileStatus>,
}

/// Everything the event loop can observe.
#[derive(Debug)]
pub enum Message {
    Init {
        branches: Vec<Branch>,
        logs: String,
        seq: u64,
    },
    Logs {
        text: String,
        seq: u64,
    },
    Status(StatusSnapshot),
    Error(GitError),
    Key(KeyEvent),
    Resize {
        width: u16,
        height: u16,
    },
}

/// What the event loop does after a transition.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    Run(Command),
    Quit,
    Fail(GitError),
}

/// The single source of truth for the dashboard.
///
/// Only [`State::update`](crate::update) writes to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct State {
    pub active_tab: Tab,
    pub branches: Vec<Branch>,
    pub cursor: usize,
    /// History of the branch that was selected when the fetch was issued.
    pub logs: String,
    pub untracked: BTreeSet<String>,
    pub modified: BTreeMap<String, FileStatus>,
    pub staged: BTreeMap<String, FileStatus>,
    pub viewport: Viewport,
    pub(crate) logs_seq: u64,
    pub(crate) fence_stale_logs: bool,
}

impl State {
    pub fn new(fence_stale_logs: bool) -> Self {
        Self {
            fence_stale_logs,
            ..Self::default()
        }
    }

    /// The command that fills the initial tab.
    pub fn startup_command(&self) -> Command {
        match self.active_tab {
            Tab::Status => Command::FetchStatus,
            Tab::Logs => Command::Init { seq: self.logs_seq },
        }
    }

    pub fn selected_branch(&self) -> Option<&Branch> {
        self.branches.get(self.cursor)
    }
}
