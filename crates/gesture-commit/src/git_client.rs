//! Commit client driving the `git` command line.
//!
//! Stages the whole working tree, commits it, and pushes either straight to
//! the base branch or to a fresh `gesture/<id>` branch whose GitHub compare
//! page is returned as the pull-request URL.

use crate::AppError;

use std::{panic::Location, path::Path};

use async_trait::async_trait;
use error_location::ErrorLocation;
use gesture_commit_core::{BoxError, CommitClient, CommitRequest, CommitSuccess};
use tokio::process::Command;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Remote every push goes to.
const REMOTE: &str = "origin";

/// [`CommitClient`] backed by the `git` binary.
#[derive(Debug, Default)]
pub struct GitCliClient;

/// Browser URL of a GitHub remote, from its SSH or HTTPS fetch URL.
pub(crate) fn github_web_url(remote: &str) -> Option<String> {
    let remote = remote.trim();
    let path = remote
        .strip_prefix("git@github.com:")
        .or_else(|| remote.strip_prefix("ssh://git@github.com/"))
        .or_else(|| remote.strip_prefix("https://github.com/"))
        .or_else(|| remote.strip_prefix("http://github.com/"))?;

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    if path.split('/').filter(|s| !s.is_empty()).count() != 2 {
        return None;
    }

    Some(format!("https://github.com/{}", path))
}

/// Branch name for a pull-request commit.
pub(crate) fn pull_request_branch(id: Uuid) -> String {
    let short: String = id.simple().to_string().chars().take(8).collect();
    format!("gesture/{}", short)
}

async fn git(folder: &Path, args: &[&str]) -> Result<String, AppError> {
    debug!(args = ?args, "Running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(folder)
        .output()
        .await
        .map_err(|e| AppError::GitFailed {
            reason: format!("Failed to run git {}: {}", args.join(" "), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(AppError::GitFailed {
            reason: format!("git {} failed: {}", args.join(" "), detail.trim()),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn remote_web_url(folder: &Path) -> Option<String> {
    git(folder, &["remote", "get-url", REMOTE])
        .await
        .ok()
        .and_then(|url| github_web_url(&url))
}

#[async_trait]
impl CommitClient for GitCliClient {
    #[instrument(skip(self, request), fields(folder = ?request.project_folder))]
    async fn send_commit_data(&self, request: &CommitRequest) -> Result<CommitSuccess, BoxError> {
        let folder = request.project_folder.as_path();

        git(folder, &["add", "--all"]).await?;
        git(folder, &["commit", "--message", &request.message]).await?;
        let sha = git(folder, &["rev-parse", "HEAD"]).await?;
        let web = remote_web_url(folder).await;

        let (branch, url) = if request.create_pull_request {
            let branch = pull_request_branch(Uuid::new_v4());
            let refspec = format!("HEAD:refs/heads/{}", branch);
            git(folder, &["push", REMOTE, &refspec]).await?;

            let url = web.map(|w| {
                format!("{}/compare/{}...{}?expand=1", w, request.base_branch, branch)
            });
            (branch, url)
        } else {
            let refspec = format!("HEAD:refs/heads/{}", request.base_branch);
            git(folder, &["push", REMOTE, &refspec]).await?;

            let url = web.map(|w| format!("{}/commit/{}", w, sha));
            (request.base_branch.clone(), url)
        };

        info!(sha = %sha, branch = %branch, "Commit pushed");

        Ok(CommitSuccess { sha, branch, url })
    }

    #[instrument(skip(self, request), fields(folder = ?request.project_folder))]
    async fn stash_changes(&self, request: &CommitRequest) -> Result<(), BoxError> {
        let output = git(
            request.project_folder.as_path(),
            &["stash", "push", "--include-untracked"],
        )
        .await?;
        debug!(output = %output, "Stash complete");
        Ok(())
    }

    async fn branches(&self, request: &CommitRequest) -> Result<Vec<String>, BoxError> {
        let output = git(
            request.project_folder.as_path(),
            &["branch", "--list", "--format=%(refname:short)"],
        )
        .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}
