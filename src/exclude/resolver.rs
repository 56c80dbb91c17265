//! Splits staged paths into the files sent to the model and the files skipped.

use super::pattern::Pattern;

/// Built-in patterns that always apply, regardless of the configured list.
pub const FIXED_PATTERNS: &[&str] = &[
    // Lockfiles
    "*.lock",
    "*.lockb",
    "*-lock.json",
    "*-lock.yaml",
    "go.sum",
    // Minified and bundled artifacts
    "*.min.js",
    "*.min.css",
    "*.bundle.js",
    "*.chunk.js",
    // Build output. Generic directory names are rooted so source modules
    // such as `src/build/` stay visible.
    "dist/*",
    "/build/*",
    "/out/*",
    ".next/*",
    "/target/*",
    "coverage/*",
    // Source maps
    "*.map",
    // Generated files
    "*.generated.*",
    "*.g.dart",
    "*.pb.go",
    // Fonts and icons
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.eot",
    "*.otf",
    "*.ico",
    // Package manager caches
    "node_modules/*",
    ".yarn/cache/*",
    ".pnpm-store/*",
    ".pnp.*",
];

/// Result of applying the exclusion rules to a list of staged paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub to_analyze: Vec<String>,
    pub to_skip: Vec<String>,
}

/// Configured and fixed patterns compiled once for a resolution pass.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    pub fn new<S: AsRef<str>>(configured: &[S], fixed: &[&str]) -> Self {
        let patterns = configured
            .iter()
            .map(|p| p.as_ref())
            .chain(fixed.iter().copied())
            .map(Pattern::compile)
            .collect();
        Self { patterns }
    }

    /// Configured patterns plus [`FIXED_PATTERNS`].
    pub fn with_fixed<S: AsRef<str>>(configured: &[S]) -> Self {
        Self::new(configured, FIXED_PATTERNS)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    /// Partition `staged` preserving input order in both halves.
    pub fn resolve<S: AsRef<str>>(&self, staged: &[S]) -> Resolution {
        let (to_skip, to_analyze): (Vec<String>, Vec<String>) = staged
            .iter()
            .map(|p| p.as_ref().to_string())
            .partition(|p| self.is_excluded(p));
        Resolution {
            to_analyze,
            to_skip,
        }
    }
}

/// Resolve `staged` against configured and fixed patterns.
pub fn resolve<S: AsRef<str>, C: AsRef<str>>(
    staged: &[S],
    configured: &[C],
    fixed: &[&str],
) -> Resolution {
    ExclusionSet::new(configured, fixed).resolve(staged)
}
