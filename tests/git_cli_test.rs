//! Integration tests for the git CLI backend and diff acquisition against
//! real repositories.

mod common;

use std::io::Write;

use common::TestRepo;
use ollama_commit::commit::{DiffOutcome, acquire};
use ollama_commit::config::DEFAULT_EXCLUDES;
use ollama_commit::error::GitError;
use ollama_commit::git::{FileStatus, GitBackend, GitCli, StagedFile};

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_is_repo_inside_work_tree() {
    let repo = TestRepo::new();
    let git = GitCli::in_dir(repo.path());
    assert!(git.is_repo().await.unwrap());
}

#[tokio::test]
async fn test_acquire_outside_repository_fails() {
    let dir = common::temp_test_dir();
    let git = GitCli::in_dir(dir.path());
    let err = acquire(&git, &default_excludes()).await.unwrap_err();
    assert!(matches!(err, GitError::NotARepository));
}

#[tokio::test]
async fn test_list_staged_with_status() {
    let repo = TestRepo::new();
    repo.commit_files(&[("keep.txt", "one\n"), ("gone.txt", "bye\n")], "init");

    repo.write("keep.txt", "one\ntwo\n");
    repo.write("src/new.rs", "fn main() {}\n");
    repo.stage(&["keep.txt", "src/new.rs"]);
    repo.stage_removal("gone.txt");

    let git = GitCli::in_dir(repo.path());
    let mut staged = git.list_staged_with_status().await.unwrap();
    staged.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(
        staged,
        vec![
            StagedFile::new("gone.txt", FileStatus::Deleted),
            StagedFile::new("keep.txt", FileStatus::Modified),
            StagedFile::new("src/new.rs", FileStatus::Added),
        ]
    );
}

#[tokio::test]
async fn test_nothing_staged() {
    let repo = TestRepo::new();
    repo.commit_files(&[("README.md", "# hi\n")], "init");
    repo.write("README.md", "# unstaged edit\n");

    let git = GitCli::in_dir(repo.path());
    let outcome = acquire(&git, &default_excludes()).await.unwrap();
    assert_eq!(outcome, DiffOutcome::NothingStaged);
}

#[tokio::test]
async fn test_excluded_lockfile_is_kept_out_of_the_diff() {
    let repo = TestRepo::new();
    repo.commit_files(
        &[
            ("src/a.js", "export const a = 1;\n"),
            ("package-lock.json", "{\"lockfileVersion\": 2}\n"),
        ],
        "init",
    );

    repo.write("src/a.js", "export const a = 2;\n");
    repo.write("package-lock.json", "{\"lockfileVersion\": 3}\n");
    repo.stage(&["src/a.js", "package-lock.json"]);

    let git = GitCli::in_dir(repo.path());
    let DiffOutcome::Ready(payload) = acquire(&git, &default_excludes()).await.unwrap() else {
        panic!("expected a diff payload");
    };

    assert_eq!(payload.excluded_files, vec!["package-lock.json".to_string()]);
    assert_eq!(
        payload.analyzed_files,
        vec![StagedFile::new("src/a.js", FileStatus::Modified)]
    );
    assert!(payload.raw_diff.contains("src/a.js"));
    assert!(payload.raw_diff.contains("+export const a = 2;"));
    assert!(!payload.raw_diff.contains("package-lock.json"));
    assert!(!payload.raw_diff.contains("lockfileVersion"));
    assert!(payload.stats.contains("src/a.js"));
    assert!(!payload.stats.contains("package-lock.json"));
}

#[tokio::test]
async fn test_everything_excluded() {
    let repo = TestRepo::new();
    repo.write("yarn.lock", "# yarn\n");
    repo.write("dist/bundle.js", "console.log(1)\n");
    repo.stage(&["yarn.lock", "dist/bundle.js"]);

    let git = GitCli::in_dir(repo.path());
    let outcome = acquire(&git, &default_excludes()).await.unwrap();
    let DiffOutcome::AllExcluded { mut skipped } = outcome else {
        panic!("expected everything to be excluded, got {outcome:?}");
    };
    skipped.sort();
    assert_eq!(skipped, vec!["dist/bundle.js".to_string(), "yarn.lock".to_string()]);
}

#[tokio::test]
async fn test_paths_with_pathspec_magic_are_taken_literally() {
    let repo = TestRepo::new();
    repo.write("notes [draft]*.md", "first\n");
    repo.write("notes d.md", "should not appear\n");
    // As a glob, `[draft]*` would also match `notes d.md`.
    repo.stage(&["notes [draft]*.md", "notes d.md"]);

    let git = GitCli::in_dir(repo.path());
    let diff = git.diff(&["notes [draft]*.md".to_string()]).await.unwrap();
    assert!(diff.contains("+first"));
    assert!(!diff.contains("should not appear"));
}

#[tokio::test]
async fn test_commit_from_message_file() {
    let repo = TestRepo::new();
    repo.write("src/lib.rs", "pub fn answer() -> u8 { 42 }\n");
    repo.stage(&["src/lib.rs"]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "feat(core): add answer\n\n- return 42\n").unwrap();

    let git = GitCli::in_dir(repo.path());
    git.commit(file.path()).await.unwrap();

    assert_eq!(repo.head_message(), "feat(core): add answer\n\n- return 42\n");
}

#[tokio::test]
async fn test_commit_failure_reports_git_stderr() {
    let repo = TestRepo::new();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "chore: nothing").unwrap();

    let git = GitCli::in_dir(repo.path());
    let err = git.commit(file.path()).await.unwrap_err();
    assert!(matches!(err, GitError::ToolFailed { .. }), "got {err:?}");
}
