//! Metadata normalization.
//!
//! The genre, keyword, cast and crew fields arrive as JSON arrays of
//! objects; every object carries at least a `"name"`, and crew objects a
//! `"job"` as well. This module flattens those fields into ordered name
//! lists. Extracted names have their internal whitespace removed so a
//! multi-word name ("Science Fiction", "Sam Worthington") stays a single
//! token once tags are whitespace-joined downstream.

use crate::error::{DataLoadError, Result};
use crate::types::MovieId;
use serde::Deserialize;

/// A record with a name; extra keys in the raw object are ignored
#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: String,
}

/// A crew record: name plus the credited job
#[derive(Debug, Deserialize)]
struct CrewRecord {
    name: String,
    job: String,
}

fn strip_whitespace(name: &str) -> String {
    name.split_whitespace().collect()
}

fn malformed(movie_id: MovieId, field: &'static str, source: serde_json::Error) -> DataLoadError {
    DataLoadError::MalformedField {
        movie_id,
        field,
        source,
    }
}

/// Extract every record's name, in original order.
pub fn extract_all_names(raw: &str, movie_id: MovieId, field: &'static str) -> Result<Vec<String>> {
    let records: Vec<NamedRecord> =
        serde_json::from_str(raw).map_err(|e| malformed(movie_id, field, e))?;
    Ok(records.iter().map(|r| strip_whitespace(&r.name)).collect())
}

/// Extract the first `n` records' names (fewer if the list is shorter).
pub fn extract_top_names(
    raw: &str,
    n: usize,
    movie_id: MovieId,
    field: &'static str,
) -> Result<Vec<String>> {
    let records: Vec<NamedRecord> =
        serde_json::from_str(raw).map_err(|e| malformed(movie_id, field, e))?;
    Ok(records
        .iter()
        .take(n)
        .map(|r| strip_whitespace(&r.name))
        .collect())
}

/// Extract the name of the first record whose job matches `role`.
///
/// Returns an empty vec when no record matches; that is a valid outcome,
/// not an error (a movie without a credited director simply contributes no
/// crew token to its tags).
pub fn extract_role_name(
    raw: &str,
    role: &str,
    movie_id: MovieId,
    field: &'static str,
) -> Result<Vec<String>> {
    let records: Vec<CrewRecord> =
        serde_json::from_str(raw).map_err(|e| malformed(movie_id, field, e))?;
    Ok(records
        .iter()
        .find(|r| r.job == role)
        .map(|r| vec![strip_whitespace(&r.name)])
        .unwrap_or_default())
}
