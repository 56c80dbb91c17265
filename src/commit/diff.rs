//! Staged diff acquisition with exclusions applied.

use tracing::{debug, info, warn};

use crate::error::GitError;
use crate::exclude::ExclusionSet;
use crate::git::{FileStatus, GitBackend, StagedFile};

/// Shown in place of diff statistics when the stats query fails.
pub const STATS_PLACEHOLDER: &str = "(stats unavailable)";

/// Everything the prompt needs about the staged changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPayload {
    /// Unified diff restricted to `analyzed_files`.
    pub raw_diff: String,
    pub staged_files: Vec<StagedFile>,
    pub excluded_files: Vec<String>,
    /// `staged_files` minus `excluded_files`, in staged order.
    pub analyzed_files: Vec<StagedFile>,
    pub stats: String,
}

/// Result of a diff acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The index is empty.
    NothingStaged,
    /// Every staged path matched an exclusion.
    AllExcluded { skipped: Vec<String> },
    /// Staged paths remain but git produced no diff text for them.
    EmptyDiff,
    Ready(DiffPayload),
}

/// Collect the staged diff, skipping paths matched by `configured_excludes`
/// or the fixed patterns.
///
/// The diff is requested for the remaining paths by explicit enumeration;
/// exclusion globs are never handed to git.
pub async fn acquire(
    git: &dyn GitBackend,
    configured_excludes: &[String],
) -> Result<DiffOutcome, GitError> {
    if !git.is_repo().await? {
        return Err(GitError::NotARepository);
    }

    let staged = git.list_staged().await?;
    if staged.is_empty() {
        debug!("No staged files");
        return Ok(DiffOutcome::NothingStaged);
    }

    let resolution = ExclusionSet::with_fixed(configured_excludes).resolve(&staged);
    for path in &resolution.to_skip {
        info!("Skipping excluded file: {}", path);
    }
    if resolution.to_analyze.is_empty() {
        return Ok(DiffOutcome::AllExcluded {
            skipped: resolution.to_skip,
        });
    }

    let raw_diff = git.diff(&resolution.to_analyze).await?;
    if raw_diff.trim().is_empty() {
        debug!("Diff for {} file(s) is empty", resolution.to_analyze.len());
        return Ok(DiffOutcome::EmptyDiff);
    }

    let statuses = git.list_staged_with_status().await?;
    let status_of = |path: &str| {
        statuses
            .iter()
            .find(|f| f.path == path)
            .map_or(FileStatus::Modified, |f| f.status)
    };
    let staged_files: Vec<StagedFile> = staged
        .iter()
        .map(|p| StagedFile::new(p.as_str(), status_of(p)))
        .collect();
    let analyzed_files: Vec<StagedFile> = staged_files
        .iter()
        .filter(|f| resolution.to_analyze.contains(&f.path))
        .cloned()
        .collect();

    let stats = match git.stats(&resolution.to_analyze).await {
        Ok(stats) if !stats.trim().is_empty() => stats,
        Ok(_) => STATS_PLACEHOLDER.to_string(),
        Err(e) => {
            warn!("Could not compute diff stats: {}", e);
            STATS_PLACEHOLDER.to_string()
        }
    };

    debug!(
        "Acquired diff: {} bytes, {} analyzed, {} skipped",
        raw_diff.len(),
        analyzed_files.len(),
        resolution.to_skip.len()
    );

    Ok(DiffOutcome::Ready(DiffPayload {
        raw_diff,
        staged_files,
        excluded_files: resolution.to_skip,
        analyzed_files,
        stats,
    }))
}
