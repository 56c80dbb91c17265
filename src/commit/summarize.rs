//! Bounded excerpts of oversized diffs.
//!
//! A diff over budget is cut down per file: headers and hunk positions are
//! always kept, context lines are dropped, and each file gets an even share
//! of the remaining budget for its `+`/`-` lines (never fewer than
//! [`MIN_LINES_PER_FILE`]). Output is deterministic.

/// Default character budget for the diff embedded in the prompt.
pub const DEFAULT_MAX_LENGTH: usize = 12_000;

/// Change lines every file keeps regardless of its share.
pub const MIN_LINES_PER_FILE: usize = 8;

/// Appended once when the assembled excerpt would exceed the budget.
pub const TRUNCATION_MARKER: &str = "\n... [diff truncated]";

const FILE_HEADER: &str = "diff --git ";

enum Line<'a> {
    /// File header or hunk position; kept unconditionally.
    Structural(&'a str),
    Change(&'a str),
    Context,
}

struct FileChunk<'a> {
    path: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> FileChunk<'a> {
    fn parse(text: &'a str) -> Vec<FileChunk<'a>> {
        let mut chunks: Vec<FileChunk<'a>> = Vec::new();
        let mut in_hunk = false;

        for line in text.lines() {
            if line.starts_with(FILE_HEADER) || chunks.is_empty() {
                let path = if line.starts_with(FILE_HEADER) {
                    header_path(line)
                } else {
                    "diff"
                };
                chunks.push(FileChunk {
                    path,
                    lines: Vec::new(),
                });
                in_hunk = false;
            }

            let kind = if line.starts_with("@@") {
                in_hunk = true;
                Line::Structural(line)
            } else if !in_hunk {
                Line::Structural(line)
            } else if line.starts_with('+') || line.starts_with('-') {
                Line::Change(line)
            } else {
                Line::Context
            };

            if let Some(chunk) = chunks.last_mut() {
                chunk.lines.push(kind);
            }
        }

        chunks
    }

    /// Render with change lines capped at `share` characters, keeping at
    /// least [`MIN_LINES_PER_FILE`] of them.
    fn render(&self, share: usize) -> String {
        let structural_cost: usize = self
            .lines
            .iter()
            .map(|l| match l {
                Line::Structural(s) => s.len() + 1,
                _ => 0,
            })
            .sum();
        let total_changes = self
            .lines
            .iter()
            .filter(|l| matches!(l, Line::Change(_)))
            .count();
        // Room for the omission marker so it survives final assembly.
        let change_budget = share
            .saturating_sub(structural_cost)
            .saturating_sub(self.omission_marker(total_changes).len());

        let mut out = String::new();
        let mut used = 0;
        let mut kept = 0;
        let mut omitted = 0;

        for line in &self.lines {
            match line {
                Line::Structural(s) => {
                    out.push_str(s);
                    out.push('\n');
                }
                Line::Change(s) => {
                    let cost = s.len() + 1;
                    if kept < MIN_LINES_PER_FILE || used + cost <= change_budget {
                        out.push_str(s);
                        out.push('\n');
                        used += cost;
                        kept += 1;
                    } else {
                        omitted += 1;
                    }
                }
                Line::Context => {}
            }
        }

        if omitted > 0 {
            out.push_str(&self.omission_marker(omitted));
        }
        out
    }

    fn omission_marker(&self, omitted: usize) -> String {
        format!(
            "... [{} more changed lines omitted from {}]\n",
            omitted, self.path
        )
    }
}

fn header_path(header: &str) -> &str {
    header
        .rsplit_once(" b/")
        .map(|(_, path)| path)
        .unwrap_or_else(|| header.trim_start_matches(FILE_HEADER))
}

/// Produce an excerpt of `diff` no longer than `max_length` characters plus
/// [`TRUNCATION_MARKER`]. A diff already within budget is returned unchanged.
pub fn summarize(diff: &str, max_length: usize) -> String {
    if diff.len() <= max_length {
        return diff.to_string();
    }

    let chunks = FileChunk::parse(diff);
    let mut remaining = max_length;
    let mut rendered = Vec::with_capacity(chunks.len());

    for (index, chunk) in chunks.iter().enumerate() {
        let share = remaining / (chunks.len() - index);
        let text = chunk.render(share);
        remaining = remaining.saturating_sub(text.len());
        rendered.push(text);
    }

    let mut out = String::with_capacity(max_length + TRUNCATION_MARKER.len());
    for line in rendered.iter().flat_map(|text| text.lines()) {
        if out.len() + line.len() + 1 > max_length {
            out.push_str(TRUNCATION_MARKER);
            return out;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
