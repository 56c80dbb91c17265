//! Staged file status parsing.

use std::fmt;

/// Status of a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

impl FileStatus {
    /// Map a `git diff --name-status` letter. Letters outside A/M/D/R/C
    /// (type changes, unmerged entries) are reported as modifications.
    pub fn from_code(code: char) -> Self {
        match code {
            'A' => FileStatus::Added,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'C' => FileStatus::Copied,
            _ => FileStatus::Modified,
        }
    }

    pub fn code(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Deleted => write!(f, "deleted"),
            FileStatus::Renamed => write!(f, "renamed"),
            FileStatus::Copied => write!(f, "copied"),
        }
    }
}

/// A file in the index with its staged status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: String,
    pub status: FileStatus,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// Parse `git diff --cached --name-status` output.
///
/// Each line is `S<TAB>path`, or `R100<TAB>old<TAB>new` for renames and
/// copies, in which case the destination path is kept.
pub fn parse_name_status(output: &str) -> Vec<StagedFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let code = fields.next()?.trim().chars().next()?;
            let path = fields.last()?.trim();
            if path.is_empty() {
                return None;
            }
            Some(StagedFile::new(path, FileStatus::from_code(code)))
        })
        .collect()
}

/// Parse newline-delimited path output, dropping blank lines.
pub fn parse_path_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
