//! Deferred repository queries.
//!
//! A [`Command`] never touches application state. Executing one produces
//! exactly one [`Message`], with every gateway failure folded into
//! [`Message::Error`].

use crate::git::{Branch, CommitSummary, FileEntry, FileStatus, GitError, RepoGateway};
use crate::models::{Message, StatusSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the repository, list branches and read the first branch's log.
    Init { seq: u64 },
    FetchLogs { branch: Branch, seq: u64 },
    FetchStatus,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::FetchLogs { .. } => "fetch_logs",
            Command::FetchStatus => "fetch_status",
        }
    }

    /// Runs the query. Blocking; the event loop calls this off the render path.
    pub fn execute(self, gateway: &dyn RepoGateway) -> Message {
        let name = self.name();
        tracing::debug!(command = name, "executing command");

        let result = match self {
            Command::Init { seq } => init(gateway, seq),
            Command::FetchLogs { branch, seq } => {
                read_log(gateway, &branch).map(|text| Message::Logs { text, seq })
            }
            Command::FetchStatus => fetch_status(gateway).map(Message::Status),
        };

        result.unwrap_or_else(|err| {
            tracing::warn!(command = name, error = %err, "command failed");
            Message::Error(err)
        })
    }
}

fn init(gateway: &dyn RepoGateway, seq: u64) -> Result<Message, GitError> {
    gateway.open()?;
    let branches = gateway.branches()?;
    let logs = match branches.first() {
        Some(first) => read_log(gateway, first)?,
        None => String::new(),
    };
    Ok(Message::Init {
        branches,
        logs,
        seq,
    })
}

fn read_log(gateway: &dyn RepoGateway, branch: &Branch) -> Result<String, GitError> {
    let commits = gateway.commit_log(branch.revision)?;
    tracing::debug!(branch = %branch.name, commits = commits.len(), "read log");
    Ok(render_log(&commits))
}

fn fetch_status(gateway: &dyn RepoGateway) -> Result<StatusSnapshot, GitError> {
    gateway.open()?;
    let entries = gateway.working_tree_status()?;
    Ok(partition_status(entries))
}

/// One `"<hash>: <message>"` line per commit.
pub fn render_log(commits: &[CommitSummary]) -> String {
    commits
        .iter()
        .map(|c| format!("{}: {}\n", c.short_hash, c.message))
        .collect()
}

pub fn partition_status(entries: Vec<FileEntry>) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::default();
    for entry in entries {
        if entry.worktree == FileStatus::Untracked {
            snapshot.untracked.insert(entry.path.clone());
        }
        if entry.staged.is_change() {
            snapshot.staged.insert(entry.path.clone(), entry.staged);
        }
        if entry.worktree.is_change() {
            snapshot.modified.insert(entry.path, entry.worktree);
        }
    }
    snapshot
}
