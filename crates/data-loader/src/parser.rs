//! Parser for the raw catalog exports.
//!
//! The catalog ships as two CSV files:
//! - movies.csv: id, title, overview, plus JSON-encoded genre/keyword lists
//! - credits.csv: movie_id, title, plus JSON-encoded cast/crew lists
//!
//! Fields are quoted per RFC 4180 (embedded commas, doubled quotes,
//! newlines inside quotes), so records cannot be split line-by-line; the
//! reader below walks the whole file with a small quote-aware state
//! machine. Columns are located by header name, not position.

use crate::error::{DataLoadError, Result};
use crate::types::MovieId;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One undecoded row of movies.csv. The genre/keyword fields are still the
/// raw JSON strings; the normalizer flattens them.
#[derive(Debug, Clone)]
pub struct RawMovieRow {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub genres: String,
    pub keywords: String,
}

/// One undecoded row of credits.csv
#[derive(Debug, Clone)]
pub struct RawCreditsRow {
    pub movie_id: MovieId,
    pub cast: String,
    pub crew: String,
}

/// Split CSV content into records of fields.
///
/// Handles quoted fields, doubled-quote escapes and newlines inside quotes.
/// Blank records are dropped.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => record.push(std::mem::take(&mut field)),
                // CR only occurs as part of CRLF record terminators
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    let blank = record.len() == 1 && record[0].is_empty();
                    if blank {
                        record.clear();
                    } else {
                        records.push(std::mem::take(&mut record));
                    }
                }
                _ => field.push(c),
            }
        }
    }

    // Flush a final record with no trailing newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// A parsed CSV file: header row plus data records
struct CsvTable {
    file: String,
    header: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvTable {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut records = parse_csv(&content);
        if records.is_empty() {
            return Err(DataLoadError::ValidationError(format!(
                "{} contains no header row",
                path.display()
            )));
        }
        let header = records.remove(0);
        Ok(Self {
            file: path.display().to_string(),
            header,
            records,
        })
    }

    fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: name.to_string(),
            })
    }
}

/// Fetch a field by column index, with record-level error context
fn field<'a>(
    table: &CsvTable,
    record: &'a [String],
    record_no: usize,
    col: usize,
    name: &str,
) -> Result<&'a str> {
    record
        .get(col)
        .map(|s| s.as_str())
        .ok_or_else(|| DataLoadError::ParseError {
            file: table.file.clone(),
            record: record_no,
            reason: format!("Missing {name} field"),
        })
}

fn parse_id(table: &CsvTable, record_no: usize, name: &str, raw: &str) -> Result<MovieId> {
    raw.parse().map_err(|e| DataLoadError::ParseError {
        file: table.file.clone(),
        record: record_no,
        reason: format!("Invalid {name}: {e}"),
    })
}

/// Parse movies.csv into raw rows.
///
/// Structural problems in a single record (short record, unparseable id)
/// are logged and the record skipped; only file-level problems (I/O,
/// missing column) fail the whole parse.
pub fn parse_movies(path: &Path) -> Result<Vec<RawMovieRow>> {
    let table = CsvTable::read(path)?;

    let id_col = table.column("id")?;
    let title_col = table.column("title")?;
    let overview_col = table.column("overview")?;
    let genres_col = table.column("genres")?;
    let keywords_col = table.column("keywords")?;

    let mut rows = Vec::with_capacity(table.records.len());
    let mut skipped = 0usize;
    for (idx, record) in table.records.iter().enumerate() {
        let record_no = idx + 2; // 1-based, after the header row
        let decoded = (|| -> Result<RawMovieRow> {
            Ok(RawMovieRow {
                id: parse_id(
                    &table,
                    record_no,
                    "id",
                    field(&table, record, record_no, id_col, "id")?,
                )?,
                title: field(&table, record, record_no, title_col, "title")?.to_string(),
                overview: field(&table, record, record_no, overview_col, "overview")?.to_string(),
                genres: field(&table, record, record_no, genres_col, "genres")?.to_string(),
                keywords: field(&table, record, record_no, keywords_col, "keywords")?.to_string(),
            })
        })();
        match decoded {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping movie record: {e}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {skipped} undecodable records in {}", table.file);
    }
    Ok(rows)
}

/// Parse credits.csv into raw rows. Same skip policy as `parse_movies`.
pub fn parse_credits(path: &Path) -> Result<Vec<RawCreditsRow>> {
    let table = CsvTable::read(path)?;

    let id_col = table.column("movie_id")?;
    let cast_col = table.column("cast")?;
    let crew_col = table.column("crew")?;

    let mut rows = Vec::with_capacity(table.records.len());
    let mut skipped = 0usize;
    for (idx, record) in table.records.iter().enumerate() {
        let record_no = idx + 2;
        let decoded = (|| -> Result<RawCreditsRow> {
            Ok(RawCreditsRow {
                movie_id: parse_id(
                    &table,
                    record_no,
                    "movie_id",
                    field(&table, record, record_no, id_col, "movie_id")?,
                )?,
                cast: field(&table, record, record_no, cast_col, "cast")?.to_string(),
                crew: field(&table, record, record_no, crew_col, "crew")?.to_string(),
            })
        })();
        match decoded {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping credits record: {e}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {skipped} undecodable records in {}", table.file);
    }
    Ok(rows)
}
