//! Repository gateway.
//!
//! All repository queries go through [`RepoGateway`]. The dashboard only ever
//! reads: branches, commit history from a revision, and working tree status.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::{BranchType, Repository, Sort, Status, StatusEntry, StatusOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("{operation} failed: {message}")]
    Query {
        operation: &'static str,
        message: String,
    },

    #[error("repository handle is poisoned")]
    HandlePoisoned,
}

impl GitError {
    fn query(operation: &'static str) -> impl FnOnce(git2::Error) -> GitError {
        move |err| GitError::Query {
            operation,
            message: err.message().to_string(),
        }
    }
}

/// Opaque commit identifier used as the starting point of a log walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision(git2::Oid);

impl Revision {
    pub fn short(&self) -> String {
        let mut hex = self.0.to_string();
        hex.truncate(7);
        hex
    }

    pub fn oid(&self) -> git2::Oid {
        self.0
    }
}

impl From<git2::Oid> for Revision {
    fn from(oid: git2::Oid) -> Self {
        Self(oid)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub revision: Revision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub short_hash: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Unmodified,
    Untracked,
    Modified,
    Added,
    Deleted,
    Renamed,
    // git2 status never reports copies or unreadable states; the labels
    // still belong to the set the panels can show.
    #[allow(dead_code)]
    Copied,
    UpdatedButUnmerged,
    #[allow(dead_code)]
    Unknown,
}

impl FileStatus {
    pub fn label(self) -> &'static str {
        match self {
            FileStatus::Unmodified => "Unmodified",
            FileStatus::Untracked => "Untracked",
            FileStatus::Modified => "Modified",
            FileStatus::Added => "Added",
            FileStatus::Deleted => "Deleted",
            FileStatus::Renamed => "Renamed",
            FileStatus::Copied => "Copied",
            FileStatus::UpdatedButUnmerged => "UpdatedButUnmerged",
            FileStatus::Unknown => "Unknown",
        }
    }

    /// Whether the file differs from the other side in a way worth listing.
    pub fn is_change(self) -> bool {
        !matches!(self, FileStatus::Unmodified | FileStatus::Untracked)
    }

    fn staged_from(status: Status) -> Self {
        if status.is_conflicted() {
            FileStatus::UpdatedButUnmerged
        } else if status.is_index_new() {
            FileStatus::Added
        } else if status.is_index_modified() || status.is_index_typechange() {
            FileStatus::Modified
        } else if status.is_index_deleted() {
            FileStatus::Deleted
        } else if status.is_index_renamed() {
            FileStatus::Renamed
        } else {
            FileStatus::Unmodified
        }
    }

    fn worktree_from(status: Status) -> Self {
        if status.is_conflicted() {
            FileStatus::UpdatedButUnmerged
        } else if status.is_wt_new() {
            FileStatus::Untracked
        } else if status.is_wt_modified() || status.is_wt_typechange() {
            FileStatus::Modified
        } else if status.is_wt_deleted() {
            FileStatus::Deleted
        } else if status.is_wt_renamed() {
            FileStatus::Renamed
        } else {
            FileStatus::Unmodified
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of one path on both sides of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub staged: FileStatus,
    pub worktree: FileStatus,
}

/// Read-only query surface over a repository.
///
/// Implementations must tolerate concurrent calls from background commands.
pub trait RepoGateway: Send + Sync {
    /// (Re)opens the repository handle.
    fn open(&self) -> Result<(), GitError>;

    fn branches(&self) -> Result<Vec<Branch>, GitError>;

    fn commit_log(&self, revision: Revision) -> Result<Vec<CommitSummary>, GitError>;

    /// A clean tree yields an empty list, not an error.
    fn working_tree_status(&self) -> Result<Vec<FileEntry>, GitError>;
}

pub struct Git2Gateway {
    path: PathBuf,
    commit_limit: Option<usize>,
    repo: Mutex<Option<Repository>>,
}

impl fmt::Debug for Git2Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Git2Gateway")
            .field("path", &self.path)
            .field("commit_limit", &self.commit_limit)
            .finish()
    }
}

impl Git2Gateway {
    pub fn new(path: impl Into<PathBuf>, commit_limit: Option<usize>) -> Self {
        Self {
            path: path.into(),
            commit_limit,
            repo: Mutex::new(None),
        }
    }

    fn discover(path: &Path) -> Result<Repository, GitError> {
        let repo = Repository::discover(path).map_err(|_| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::NotARepository {
                path: path.to_path_buf(),
            });
        }
        Ok(repo)
    }

    /// Runs `f` against the shared handle, opening it first if needed.
    fn with_repo<T>(
        &self,
        f: impl FnOnce(&Repository) -> Result<T, GitError>,
    ) -> Result<T, GitError> {
        let mut guard = self.repo.lock().map_err(|_| GitError::HandlePoisoned)?;
        let repo = match guard.take() {
            Some(repo) => repo,
            None => Self::discover(&self.path)?,
        };
        let result = f(&repo);
        *guard = Some(repo);
        result
    }
}

impl RepoGateway for Git2Gateway {
    fn open(&self) -> Result<(), GitError> {
        let repo = Self::discover(&self.path)?;
        tracing::debug!(path = %self.path.display(), "opened repository");
        let mut guard = self.repo.lock().map_err(|_| GitError::HandlePoisoned)?;
        *guard = Some(repo);
        Ok(())
    }

    fn branches(&self) -> Result<Vec<Branch>, GitError> {
        self.with_repo(|repo| {
            let branches = repo
                .branches(Some(BranchType::Local))
                .map_err(GitError::query("list branches"))?;

            let mut result = Vec::new();
            for entry in branches {
                let (branch, _) = entry.map_err(GitError::query("list branches"))?;
                let Some(name) = branch.name().ok().flatten() else {
                    continue;
                };
                let Ok(commit) = branch.get().peel_to_commit() else {
                    continue;
                };
                result.push(Branch {
                    name: name.to_string(),
                    revision: commit.id().into(),
                });
            }
            Ok(result)
        })
    }

    fn commit_log(&self, revision: Revision) -> Result<Vec<CommitSummary>, GitError> {
        let limit = self.commit_limit.unwrap_or(usize::MAX);
        self.with_repo(|repo| {
            let mut walk = repo.revwalk().map_err(GitError::query("read log"))?;
            walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
                .map_err(GitError::query("read log"))?;
            walk.push(revision.oid()).map_err(GitError::query("read log"))?;

            let mut commits = Vec::new();
            for oid in walk.take(limit) {
                let oid = oid.map_err(GitError::query("read log"))?;
                let commit = repo.find_commit(oid).map_err(GitError::query("read log"))?;
                let message = commit
                    .summary_bytes()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default();
                commits.push(CommitSummary {
                    short_hash: Revision::from(oid).short(),
                    message,
                });
            }
            Ok(commits)
        })
    }

    fn working_tree_status(&self) -> Result<Vec<FileEntry>, GitError> {
        self.with_repo(|repo| {
            let mut opts = StatusOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .include_ignored(false)
                .renames_head_to_index(true)
                .renames_index_to_workdir(true);

            let statuses = repo
                .statuses(Some(&mut opts))
                .map_err(GitError::query("compute status"))?;

            Ok(statuses
                .iter()
                .map(|entry| {
                    let status = entry.status();
                    FileEntry {
                        path: entry_path(&entry, status),
                        staged: FileStatus::staged_from(status),
                        worktree: FileStatus::worktree_from(status),
                    }
                })
                .collect())
        })
    }
}

/// Renamed entries are listed under their new path.
fn entry_path(entry: &StatusEntry<'_>, status: Status) -> String {
    let renamed = if status.is_index_renamed() {
        entry.head_to_index()
    } else if status.is_wt_renamed() {
        entry.index_to_workdir()
    } else {
        None
    };
    let new_path = renamed.and_then(|delta| {
        delta
            .new_file()
            .path_bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    });
    new_path.unwrap_or_else(|| String::from_utf8_lossy(entry.path_bytes()).into_owned())
}


#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn stage(repo: &Repository, name: &str, contents: &str) {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(name), contents).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> git2::Oid {
        stage(repo, name, contents);
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn open_outside_repository_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let gateway = Git2Gateway::new(dir.path(), None);
        let err = gateway.open().unwrap_err();
        assert!(matches!(err, GitError::NotARepository { .. }));
        assert!(err.to_string().starts_with("not a git repository"));
    }

    #[test]
    fn queries_open_the_handle_lazily() {
        let (dir, repo) = init_repo();
        commit_file(&repo, "a.txt", "a", "first");

        let gateway = Git2Gateway::new(dir.path(), None);
        assert_eq!(gateway.branches().unwrap().len(), 1);
    }

    #[test]
    fn unborn_repository_has_no_branches() {
        let (dir, _repo) = init_repo();
        let gateway = Git2Gateway::new(dir.path(), None);
        gateway.open().unwrap();
        assert!(gateway.branches().unwrap().is_empty());
    }

    #[test]
    fn lists_local_branches_with_their_tips() {
        let (dir, repo) = init_repo();
        let first = commit_file(&repo, "a.txt", "a", "first");
        let head_name = repo.head().unwrap().shorthand().unwrap().to_string();
        let commit = repo.find_commit(first).unwrap();
        repo.branch("dev", &commit, false).unwrap();
        let second = commit_file(&repo, "a.txt", "b", "second");

        let gateway = Git2Gateway::new(dir.path(), None);
        gateway.open().unwrap();
        let mut branches = gateway.branches().unwrap();
        branches.sort_by(|a, b| a.name.cmp(&b.name));

        let mut expected = vec![
            Branch {
                name: "dev".to_string(),
                revision: first.into(),
            },
            Branch {
                name: head_name,
                revision: second.into(),
            },
        ];
        expected.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(branches, expected);
    }

    #[test]
    fn commit_log_walks_newest_first_with_short_hashes() {
        let (dir, repo) = init_repo();
        let first = commit_file(&repo, "a.txt", "a", "first commit\n\nbody text");
        let second = commit_file(&repo, "a.txt", "b", "fix bug");

        let gateway = Git2Gateway::new(dir.path(), None);
        let log = gateway.commit_log(second.into()).unwrap();
        assert_eq!(
            log,
            vec![
                CommitSummary {
                    short_hash: second.to_string()[..7].to_string(),
                    message: "fix bug".to_string(),
                },
                CommitSummary {
                    short_hash: first.to_string()[..7].to_string(),
                    message: "first commit".to_string(),
                },
            ]
        );
    }

    #[test]
    fn commit_limit_caps_the_walk() {
        let (dir, repo) = init_repo();
        commit_file(&repo, "a.txt", "a", "one");
        commit_file(&repo, "a.txt", "b", "two");
        let tip = commit_file(&repo, "a.txt", "c", "three");

        let gateway = Git2Gateway::new(dir.path(), Some(2));
        let log = gateway.commit_log(tip.into()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "three");
    }

    #[test]
    fn clean_tree_has_empty_status() {
        let (dir, repo) = init_repo();
        commit_file(&repo, "a.txt", "a", "first");

        let gateway = Git2Gateway::new(dir.path(), None);
        assert!(gateway.working_tree_status().unwrap().is_empty());
    }

    #[test]
    fn status_reports_both_sides_of_the_index() {
        let (dir, repo) = init_repo();
        commit_file(&repo, "tracked.txt", "a", "first");
        fs::write(dir.path().join("tracked.txt"), "changed").unwrap();
        fs::write(dir.path().join("new.txt"), "new").unwrap();
        stage(&repo, "added.txt", "added");

        let gateway = Git2Gateway::new(dir.path(), None);
        let mut entries = gateway.working_tree_status().unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(
            entries,
            vec![
                FileEntry {
                    path: "added.txt".to_string(),
                    staged: FileStatus::Added,
                    worktree: FileStatus::Unmodified,
                },
                FileEntry {
                    path: "new.txt".to_string(),
                    staged: FileStatus::Unmodified,
                    worktree: FileStatus::Untracked,
                },
                FileEntry {
                    path: "tracked.txt".to_string(),
                    staged: FileStatus::Unmodified,
                    worktree: FileStatus::Modified,
                },
            ]
        );
    }

    fn status_of(gateway: &Git2Gateway, path: &str) -> FileEntry {
        gateway
            .working_tree_status()
            .unwrap()
            .into_iter()
            .find(|entry| entry.path == path)
            .unwrap()
    }

    #[test]
    fn bare_repository_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        Repository::init_bare(dir.path()).unwrap();

        let gateway = Git2Gateway::new(dir.path(), None);
        assert!(matches!(
            gateway.open().unwrap_err(),
            GitError::NotARepository { .. }
        ));
    }

    #[test]
    fn deletions_are_reported_per_side() {
        let (dir, repo) = init_repo();
        commit_file(&repo, "gone.txt", "a", "first");
        commit_file(&repo, "removed.txt", "b", "second");

        fs::remove_file(dir.path().join("gone.txt")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("removed.txt")).unwrap();
        index.write().unwrap();
        fs::remove_file(dir.path().join("removed.txt")).unwrap();

        let gateway = Git2Gateway::new(dir.path(), None);
        let gone = status_of(&gateway, "gone.txt");
        assert_eq!(gone.staged, FileStatus::Unmodified);
        assert_eq!(gone.worktree, FileStatus::Deleted);

        let removed = status_of(&gateway, "removed.txt");
        assert_eq!(removed.staged, FileStatus::Deleted);
        assert_eq!(removed.worktree, FileStatus::Unmodified);
    }

    #[test]
    fn staged_move_is_a_rename_under_the_new_path() {
        let (dir, repo) = init_repo();
        let contents = "line one\nline two\nline three\nline four\n";
        commit_file(&repo, "old.txt", contents, "first");

        fs::rename(dir.path().join("old.txt"), dir.path().join("new.txt")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("old.txt")).unwrap();
        index.add_path(Path::new("new.txt")).unwrap();
        index.write().unwrap();

        let gateway = Git2Gateway::new(dir.path(), None);
        let entries = gateway.working_tree_status().unwrap();
        assert_eq!(
            entries,
            vec![FileEntry {
                path: "new.txt".to_string(),
                staged: FileStatus::Renamed,
                worktree: FileStatus::Unmodified,
            }]
        );
    }

    #[test]
    fn merge_conflict_is_unmerged_on_both_sides() {
        let (dir, repo) = init_repo();
        let base = commit_file(&repo, "shared.txt", "base\n", "base");

        // Commit "theirs" on a side branch without touching the work tree.
        let blob = repo.blob(b"theirs\n").unwrap();
        let mut builder = repo.treebuilder(None).unwrap();
        builder.insert("shared.txt", blob, 0o100644).unwrap();
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let base_commit = repo.find_commit(base).unwrap();
        let theirs = repo
            .commit(Some("refs/heads/side"), &sig, &sig, "theirs", &tree, &[&base_commit])
            .unwrap();

        commit_file(&repo, "shared.txt", "ours\n", "ours");
        let annotated = repo.find_annotated_commit(theirs).unwrap();
        repo.merge(&[&annotated], None, None).unwrap();

        let gateway = Git2Gateway::new(dir.path(), None);
        let shared = status_of(&gateway, "shared.txt");
        assert_eq!(shared.staged, FileStatus::UpdatedButUnmerged);
        assert_eq!(shared.worktree, FileStatus::UpdatedButUnmerged);
    }

    #[test]
    fn revision_short_is_seven_hex_chars() {
        let oid = git2::Oid::from_str("abc1234def5678abc1234def5678abc1234def56").unwrap();
        let revision = Revision::from(oid);
        assert_eq!(revision.short(), "abc1234");
        assert_eq!(revision.to_string().len(), 40);
    }

    #[test]
    fn labels_match_variant_names() {
        assert_eq!(FileStatus::UpdatedButUnmerged.to_string(), "UpdatedButUnmerged");
        assert!(FileStatus::Deleted.is_change());
        assert!(!FileStatus::Untracked.is_change());
        assert!(!FileStatus::Unmodified.is_change());
    }
}
