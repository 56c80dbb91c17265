//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};

use ollama_commit::config::ConfigStore;

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A config store backed by a file in `dir`.
pub fn config_in(dir: &tempfile::TempDir) -> ConfigStore {
    ConfigStore::load_from(dir.path().join("config.toml")).expect("Failed to load config")
}

/// A test git repository builder for integration tests.
///
/// Files are staged through git2; the code under test reads them back with
/// the `git` CLI.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity set.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config
                .set_bool("commit.gpgsign", false)
                .expect("Failed to disable signing");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `content` to `rel_path`, creating parent directories.
    pub fn write(&self, rel_path: &str, content: &str) -> PathBuf {
        let full = self.dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full, content).expect("Failed to write test file");
        full
    }

    /// Add `rel_paths` to the index.
    pub fn stage(&self, rel_paths: &[&str]) {
        let mut index = self.repo.index().expect("Failed to get index");
        for p in rel_paths {
            index.add_path(Path::new(p)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
    }

    /// Remove `rel_path` from the working tree and the index.
    pub fn stage_removal(&self, rel_path: &str) {
        std::fs::remove_file(self.dir.path().join(rel_path)).expect("Failed to remove file");
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .remove_path(Path::new(rel_path))
            .expect("Failed to remove from index");
        index.write().expect("Failed to write index");
    }

    /// Write and stage each file, then commit the index. Returns the commit OID.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        for (path, content) in files {
            self.write(path, content);
        }
        let paths: Vec<&str> = files.iter().map(|(p, _)| *p).collect();
        self.stage(&paths);

        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Full message of the commit HEAD points at.
    pub fn head_message(&self) -> String {
        let commit = self
            .repo
            .head()
            .expect("No HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit");
        commit.message().unwrap_or_default().to_string()
    }
}
