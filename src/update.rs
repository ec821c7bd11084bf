//! Transition function: the only place application state changes.

use crate::commands::Command;
use crate::git::Branch;
use crate::input::{Intent, key_intent};
use crate::models::{Message, Outcome, State, Tab, Viewport};

impl State {
    pub fn update(&mut self, msg: Message) -> Outcome {
        match msg {
            Message::Init {
                branches,
                logs,
                seq,
            } => self.apply_init(branches, logs, seq),
            Message::Logs { text, seq } => {
                if self.fence_stale_logs && seq != self.logs_seq {
                    tracing::debug!(seq, latest = self.logs_seq, "dropping stale logs");
                } else {
                    self.logs = text;
                }
                Outcome::Continue
            }
            Message::Status(snapshot) => {
                self.untracked = snapshot.untracked;
                self.modified = snapshot.modified;
                self.staged = snapshot.staged;
                Outcome::Continue
            }
            Message::Error(err) => Outcome::Fail(err),
            Message::Key(key) => match key_intent(&key) {
                Some(intent) => self.apply_intent(intent),
                None => Outcome::Continue,
            },
            Message::Resize { width, height } => {
                self.viewport = Viewport { width, height };
                Outcome::Continue
            }
        }
    }

    fn apply_init(&mut self, branches: Vec<Branch>, logs: String, seq: u64) -> Outcome {
        self.branches = branches;
        self.cursor = self.cursor.min(self.branches.len().saturating_sub(1));

        if !self.fence_stale_logs {
            self.logs = logs;
            return Outcome::Continue;
        }
        if seq != self.logs_seq {
            return Outcome::Continue;
        }
        if self.cursor == 0 {
            self.logs = logs;
            return Outcome::Continue;
        }
        // The first branch's log is not what the cursor shows; ask again.
        self.fetch_selected_logs()
    }

    fn apply_intent(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::Quit => Outcome::Quit,
            Intent::SwitchTab => {
                self.active_tab = self.active_tab.next();
                match self.active_tab {
                    Tab::Status => Outcome::Run(Command::FetchStatus),
                    Tab::Logs => Outcome::Run(Command::Init {
                        seq: self.next_logs_seq(),
                    }),
                }
            }
            Intent::CursorUp => {
                if self.cursor == 0 || self.branches.is_empty() {
                    return Outcome::Continue;
                }
                self.cursor -= 1;
                self.fetch_selected_logs()
            }
            Intent::CursorDown => {
                if self.cursor + 1 >= self.branches.len() {
                    return Outcome::Continue;
                }
                self.cursor += 1;
                self.fetch_selected_logs()
            }
        }
    }

    fn fetch_selected_logs(&mut self) -> Outcome {
        let Some(branch) = self.selected_branch().cloned() else {
            return Outcome::Continue;
        };
        Outcome::Run(Command::FetchLogs {
            branch,
            seq: self.next_logs_seq(),
        })
    }

    fn next_logs_seq(&mut self) -> u64 {
        self.logs_seq += 1;
        self.logs_seq
    }
}
