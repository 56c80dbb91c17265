//! Git operations via the `git` executable.

pub mod backend;
pub mod status;

pub use backend::{GitBackend, GitCli, MAX_DIFF_BYTES};
pub use status::{FileStatus, StagedFile, parse_name_status};
