//! Batch splitting
//!
//! `GO` is not T-SQL. It is the client-side batch separator understood by
//! sqlcmd and SSMS, so scripts written for those tools are split here before
//! anything is sent to the server.

use crate::schema::types::Batch;

/// Keyword that separates batches when it stands alone on a line
pub const BATCH_SEPARATOR: &str = "GO";

/// Prefix of a single-line comment
const LINE_COMMENT: &str = "--";

/// Split a script into numbered batches.
///
/// A line whose trimmed text is `GO` (any case) ends the current segment.
/// Segments that are empty or hold only blank and `--` comment lines are
/// dropped; the rest are trimmed and numbered from 1 in script order.
pub fn split_batches(script: &str) -> Vec<Batch> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in script.lines() {
        if is_separator(line) {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(line);
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .filter(|lines| has_executable_line(lines))
        .map(|lines| lines.join("\n").trim().to_string())
        .enumerate()
        .map(|(i, sql)| Batch::new(i + 1, sql))
        .collect()
}

fn is_separator(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(BATCH_SEPARATOR)
}

fn has_executable_line(lines: &[&str]) -> bool {
    lines.iter().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with(LINE_COMMENT)
    })
}
