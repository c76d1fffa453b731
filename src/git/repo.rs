use crate::error::{MetricsError, Result};
use crate::model::{CommitInfo, Release};
use chrono::DateTime;
use gix::{discover, ObjectId, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every tag that resolves to a commit, oldest commit first.
    pub fn releases(&self) -> Result<Vec<Release>> {
        let platform = self
            .repo
            .references()
            .map_err(|e| MetricsError::GitRepo(format!("Failed to read references: {e}")))?;
        let tags = platform
            .tags()
            .map_err(|e| MetricsError::GitRepo(format!("Failed to list tags: {e}")))?;

        let mut releases = Vec::new();
        for reference in tags {
            let mut reference =
                reference.map_err(|e| MetricsError::GitRepo(format!("Failed to read tag: {e}")))?;
            let name = reference.name().shorten().to_string();
            let Some(commit_id) = self.peel_to_commit_id(&mut reference) else {
                debug!("tag {name} does not point at a commit, skipping");
                continue;
            };
            let commit = self.repo.find_commit(commit_id)?;
            let secs = commit.time()?.seconds;
            let committed_at = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| MetricsError::InvalidDate(format!("Invalid timestamp: {secs}")))?;
            releases.push(Release { name, committed_at });
        }

        releases.sort_by(|a, b| a.committed_at.cmp(&b.committed_at).then_with(|| a.name.cmp(&b.name)));
        Ok(releases)
    }

    /// Commits reachable from any reference, each reported once.
    pub fn collect_commits(&self) -> Result<Vec<CommitInfo>> {
        let platform = self
            .repo
            .references()
            .map_err(|e| MetricsError::GitRepo(format!("Failed to read references: {e}")))?;
        let all = platform
            .all()
            .map_err(|e| MetricsError::GitRepo(format!("Failed to list references: {e}")))?;

        let mut stack: Vec<ObjectId> = Vec::new();
        for reference in all {
            let mut reference = reference
                .map_err(|e| MetricsError::GitRepo(format!("Failed to read reference: {e}")))?;
            if let Some(id) = self.peel_to_commit_id(&mut reference) {
                stack.push(id);
            }
        }

        let mut commits = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Collecting commits...");

        while let Some(commit_id) = stack.pop() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let secs = commit.time()?.seconds;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| MetricsError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

            let author = commit.author()?;
            commits.push(CommitInfo {
                id: commit_id.to_string(),
                author_name: author.name.to_string(),
                author_email: author.email.to_string(),
                timestamp,
            });

            stack.extend(commit.parent_ids().map(|id| id.detach()));
            pb.inc(1);
        }

        pb.finish_and_clear();
        debug!("collected {} unique commits", commits.len());
        Ok(commits)
    }

    fn peel_to_commit_id(&self, reference: &mut gix::Reference<'_>) -> Option<ObjectId> {
        let id = reference.peel_to_id_in_place().ok()?.detach();
        let object = self.repo.find_object(id).ok()?;
        (object.kind == gix::objs::Kind::Commit).then_some(id)
    }
}
