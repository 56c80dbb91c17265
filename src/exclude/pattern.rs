//! Exclusion pattern matching.
//!
//! A pattern without `*` is a literal path: it matches the path itself or any
//! path ending in `/<pattern>`. A pattern with `*` is a glob where `*` matches
//! any run of characters, `/` included. Globs are anchored the same way as
//! literals, so `dist/*` matches `dist/app.js` and `src/dist/app.js` but not
//! `mydist/app.js`.
//!
//! A leading `/` roots the pattern at the repository top level: `/build/*`
//! matches `build/app.js` but not `src/build/mod.rs`.

use regex_lite::Regex;
use tracing::debug;

/// A compiled exclusion pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    /// `None` when the glob failed to compile; such a pattern never matches.
    Glob(Option<Regex>),
}

impl Pattern {
    pub fn compile(pattern: &str) -> Self {
        let (rooted, body) = match pattern.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        if !rooted && !body.contains('*') {
            return Pattern::Literal(body.to_string());
        }

        let body = body
            .split('*')
            .map(regex_lite::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let prefix = if rooted { "^" } else { "^(?:.*/)?" };

        match Regex::new(&format!("{prefix}{body}$")) {
            Ok(re) => Pattern::Glob(Some(re)),
            Err(e) => {
                debug!("Ignoring exclusion pattern '{}': {}", pattern, e);
                Pattern::Glob(None)
            }
        }
    }

    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Pattern::Literal(literal) => {
                if literal.is_empty() {
                    return false;
                }
                path == literal
                    || path
                        .strip_suffix(literal.as_str())
                        .is_some_and(|prefix| prefix.ends_with('/'))
            }
            Pattern::Glob(Some(re)) => re.is_match(path),
            Pattern::Glob(None) => false,
        }
    }
}

/// Check a single path against a single pattern, compiling it on the fly.
///
/// Prefer [`ExclusionSet`](super::ExclusionSet) when checking many paths.
pub fn matches(path: &str, pattern: &str) -> bool {
    Pattern::compile(pattern).is_match(path)
}
