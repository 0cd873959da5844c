//! Query documents: batches of queries separated by `=-=` lines.

use crate::error::DocumentError;
use crate::query::Query;
use crate::DOCUMENT_DELIMITER;

/// Parses a query document into its queries.
///
/// Fails on the first malformed segment, so nothing from a broken document
/// is ever sent. Whitespace-only segments (e.g. after a trailing
/// delimiter) are skipped but still count towards segment indices.
pub fn parse_query_document(text: &str) -> Result<Vec<Query>, DocumentError> {
    split_segments(text)
        .into_iter()
        .enumerate()
        .filter(|(_, segment)| !segment.trim().is_empty())
        .map(|(index, segment)| {
            Query::parse(segment.trim()).map_err(|source| DocumentError { index, source })
        })
        .collect()
}

fn split_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim_end_matches('\r') == DOCUMENT_DELIMITER {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    segments.push(current);
    segments
}
