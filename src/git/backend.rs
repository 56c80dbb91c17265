//! The git collaborator: a trait seam plus the `git` CLI implementation.
//!
//! All operations shell out to the system `git` binary, inheriting the user's
//! existing git config, hooks and signing setup.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::GitError;
use crate::git::status::{StagedFile, parse_name_status, parse_path_list};

/// Hard ceiling on captured diff output (5 MiB).
pub const MAX_DIFF_BYTES: usize = 5 * 1024 * 1024;

/// Stderr kept for error messages; the rest is discarded.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Operations the commit flow needs from version control.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Whether the working directory is inside a git work tree.
    async fn is_repo(&self) -> Result<bool, GitError>;

    /// Staged paths, relative to the repository root.
    async fn list_staged(&self) -> Result<Vec<String>, GitError>;

    /// Staged paths with their one-letter status.
    async fn list_staged_with_status(&self) -> Result<Vec<StagedFile>, GitError>;

    /// Unified staged diff restricted to exactly `paths`.
    async fn diff(&self, paths: &[String]) -> Result<String, GitError>;

    /// Condensed per-file insertion/deletion summary for `paths`.
    async fn stats(&self, paths: &[String]) -> Result<String, GitError>;

    /// Create a commit whose message is read from `message_file`.
    async fn commit(&self, message_file: &Path) -> Result<(), GitError>;
}

/// [`GitBackend`] backed by the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    workdir: Option<PathBuf>,
}

impl GitCli {
    /// Run git in the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run git in `dir` instead of the current directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(dir.into()),
        }
    }

    /// Verify that a `git` executable is available.
    pub fn check_installed() -> Result<(), GitError> {
        which::which("git").map(|_| ()).map_err(|_| GitError::NotInstalled)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        // Keep non-ASCII paths readable instead of octal-quoted.
        cmd.args(["-c", "core.quotepath=off"]);
        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Run a git command and return its stdout, or a descriptive error.
    async fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));
        let output = self
            .command()
            .args(args)
            .output()
            .await
            .map_err(GitError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(tool_failure(operation, &stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Like [`run_git`](Self::run_git) but stops reading once `limit` bytes
    /// have been captured and kills the child.
    async fn run_git_capped(
        &self,
        args: &[String],
        operation: &str,
        limit: usize,
    ) -> Result<String, GitError> {
        debug!("git {} (capped at {} bytes)", args.join(" "), limit);
        let child = self
            .command()
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(GitError::SpawnFailed)?;

        let captured = capture_capped(child, operation, limit).await?;
        Ok(String::from_utf8_lossy(&captured).to_string())
    }
}

/// Read at most `limit` bytes of stdout from `child`, draining stderr on a
/// separate task so a chatty child never blocks on a full pipe.
async fn capture_capped(
    mut child: Child,
    operation: &str,
    limit: usize,
) -> Result<Vec<u8>, GitError> {
    let missing = |stream: &str| GitError::ToolFailed {
        operation: operation.to_string(),
        stderr: format!("{stream} was not captured"),
    };
    let mut stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        (&mut stderr)
            .take(MAX_STDERR_BYTES as u64)
            .read_to_end(&mut buf)
            .await?;
        // Keep the pipe empty past the kept prefix.
        tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await?;
        Ok::<_, std::io::Error>(buf)
    });

    let mut captured = Vec::new();
    (&mut stdout)
        .take(limit as u64 + 1)
        .read_to_end(&mut captured)
        .await
        .map_err(GitError::SpawnFailed)?;

    if captured.len() > limit {
        let _ = child.kill().await;
        stderr_task.abort();
        return Err(GitError::DiffTooLarge { limit });
    }
    drop(stdout);

    let status = child.wait().await.map_err(GitError::SpawnFailed)?;
    let stderr = match stderr_task.await {
        Ok(read) => read.map_err(GitError::SpawnFailed)?,
        Err(_) => Vec::new(),
    };
    if !status.success() {
        return Err(tool_failure(operation, &String::from_utf8_lossy(&stderr)));
    }

    Ok(captured)
}

/// Build `diff --cached` arguments that name each path literally after `--`.
fn cached_diff_args(flags: &[&str], paths: &[String]) -> Vec<String> {
    let mut args: Vec<String> = ["diff", "--cached"]
        .iter()
        .chain(flags)
        .map(|s| s.to_string())
        .collect();
    args.push("--".to_string());
    args.extend(paths.iter().map(|p| format!(":(literal){p}")));
    args
}

fn tool_failure(operation: &str, stderr: &str) -> GitError {
    if stderr.to_lowercase().contains("not a git repository") {
        return GitError::NotARepository;
    }
    GitError::ToolFailed {
        operation: operation.to_string(),
        stderr: stderr.trim().to_string(),
    }
}

#[async_trait]
impl GitBackend for GitCli {
    async fn is_repo(&self) -> Result<bool, GitError> {
        match self
            .run_git(&["rev-parse", "--is-inside-work-tree"], "rev-parse")
            .await
        {
            Ok(out) => Ok(out.trim() == "true"),
            Err(GitError::NotARepository) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_staged(&self) -> Result<Vec<String>, GitError> {
        let out = self
            .run_git(&["diff", "--cached", "--name-only"], "list staged files")
            .await?;
        Ok(parse_path_list(&out))
    }

    async fn list_staged_with_status(&self) -> Result<Vec<StagedFile>, GitError> {
        let out = self
            .run_git(&["diff", "--cached", "--name-status"], "list staged status")
            .await?;
        Ok(parse_name_status(&out))
    }

    async fn diff(&self, paths: &[String]) -> Result<String, GitError> {
        if paths.is_empty() {
            return Ok(String::new());
        }
        let args = cached_diff_args(&["--no-color", "--no-ext-diff"], paths);
        self.run_git_capped(&args, "diff", MAX_DIFF_BYTES).await
    }

    async fn stats(&self, paths: &[String]) -> Result<String, GitError> {
        if paths.is_empty() {
            return Ok(String::new());
        }
        let args = cached_diff_args(&["--stat", "--no-color"], paths);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.run_git(&refs, "diff --stat").await?;
        Ok(out.trim_end().to_string())
    }

    async fn commit(&self, message_file: &Path) -> Result<(), GitError> {
        let file = message_file.to_string_lossy();
        self.run_git(&["commit", "-F", &file], "commit").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_diff_args_names_paths_literally() {
        let args = cached_diff_args(
            &["--no-color"],
            &["src/a.js".to_string(), "--output=x".to_string()],
        );
        assert_eq!(
            args,
            vec![
                "diff",
                "--cached",
                "--no-color",
                "--",
                ":(literal)src/a.js",
                ":(literal)--output=x",
            ]
        );
    }

    #[test]
    fn test_tool_failure_detects_missing_repository() {
        let err = tool_failure("diff", "fatal: not a git repository (or any of the parent directories): .git");
        assert!(matches!(err, GitError::NotARepository));
    }

    #[test]
    fn test_tool_failure_keeps_stderr() {
        let err = tool_failure("commit", "  error: gpg failed to sign the data\n");
        match err {
            GitError::ToolFailed { operation, stderr } => {
                assert_eq!(operation, "commit");
                assert_eq!(stderr, "error: gpg failed to sign the data");
            }
            other => panic!("Expected ToolFailed, got {other:?}"),
        }
    }

    fn shell(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_capture_survives_large_stderr() {
        let child = shell("head -c 300000 /dev/zero >&2; printf 'diff body'");
        let captured = capture_capped(child, "diff", 1024).await.unwrap();
        assert_eq!(captured, b"diff body");
    }

    #[tokio::test]
    async fn test_capture_reports_failure_stderr() {
        let child = shell("echo 'fatal: bad revision' >&2; exit 128");
        let err = capture_capped(child, "diff", 1024).await.unwrap_err();
        match err {
            GitError::ToolFailed { operation, stderr } => {
                assert_eq!(operation, "diff");
                assert_eq!(stderr, "fatal: bad revision");
            }
            other => panic!("Expected ToolFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_stops_at_limit() {
        let child = shell("head -c 4096 /dev/zero");
        let err = capture_capped(child, "diff", 100).await.unwrap_err();
        assert!(matches!(err, GitError::DiffTooLarge { limit: 100 }));
    }

    #[tokio::test]
    async fn test_is_repo_false_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::in_dir(dir.path());
        assert!(!git.is_repo().await.unwrap());
    }

    #[tokio::test]
    async fn test_diff_with_no_paths_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::in_dir(dir.path());
        assert_eq!(git.diff(&[]).await.unwrap(), "");
    }
}
