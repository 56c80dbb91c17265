//! File exclusion: which staged files are kept out of the prompt.

pub mod pattern;
pub mod resolver;

pub use pattern::{Pattern, matches};
pub use resolver::{ExclusionSet, FIXED_PATTERNS, Resolution, resolve};
