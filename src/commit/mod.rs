//! Commit message generation: diff acquisition, prompting, normalization
//! and the interactive commit loop.

pub mod diff;
pub mod message;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod summarize;

pub use diff::{DiffOutcome, DiffPayload, STATS_PLACEHOLDER, acquire};
pub use message::{CommitRecord, CommitType, MAX_SUBJECT_LENGTH};
pub use normalize::{NormalizedCommit, normalize};
pub use prompt::{build_system_prompt, build_user_prompt};
pub use session::{CommitSession, Menu, MenuAction, Preview, SessionOutcome};
pub use summarize::summarize;
