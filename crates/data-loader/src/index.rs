//! Catalog loading and indexing.
//!
//! Builds the `CatalogIndex` from the two raw CSV exports:
//! 1. Parse movies.csv and credits.csv (in parallel)
//! 2. Join credits to movies by movie id
//! 3. Normalize the nested metadata fields per record
//! 4. Build the id and title indices
//!
//! A record that cannot be normalized (malformed metadata field, missing
//! credits, empty synopsis) is dropped with a warning rather than kept
//! with empty tags; an all-zero feature vector would poison the
//! nearest-neighbor ranking downstream.

use crate::error::Result;
use crate::metadata;
use crate::parser::{self, RawCreditsRow, RawMovieRow};
use crate::types::{CatalogIndex, MovieRecord};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Cast names kept per movie
const CAST_LIMIT: usize = 3;

/// Crew role kept per movie
const CREW_ROLE: &str = "Director";

impl CatalogIndex {
    /// Load the catalog from the two raw CSV exports.
    ///
    /// This is the main entry point of the offline stage's first step.
    pub fn load_from_files(movies_csv: &Path, credits_csv: &Path) -> Result<Self> {
        info!(
            "Loading catalog from {} and {}",
            movies_csv.display(),
            credits_csv.display()
        );

        // Parse both files in parallel
        let (movies, credits) = rayon::join(
            || parser::parse_movies(movies_csv),
            || parser::parse_credits(credits_csv),
        );
        let movies = movies?;
        let credits = credits?;

        info!(
            "Parsed {} movie rows and {} credits rows",
            movies.len(),
            credits.len()
        );

        let index = Self::from_rows(movies, credits);

        info!("Catalog built with {} movies", index.len());
        Ok(index)
    }

    /// Join and normalize already-parsed rows into a catalog.
    pub fn from_rows(movies: Vec<RawMovieRow>, credits: Vec<RawCreditsRow>) -> Self {
        // First credits row wins if the export ever carries duplicates
        let mut credits_by_id: HashMap<u32, RawCreditsRow> = HashMap::new();
        for row in credits {
            credits_by_id.entry(row.movie_id).or_insert(row);
        }

        let mut index = CatalogIndex::new();
        let mut dropped = 0usize;
        for movie in movies {
            match normalize(&movie, credits_by_id.get(&movie.id)) {
                Ok(record) => index.insert_movie(record),
                Err(reason) => {
                    warn!("Dropping movie {} ({}): {}", movie.id, movie.title, reason);
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            warn!("Dropped {dropped} movies during normalization");
        }
        index
    }
}

/// Normalize one raw movie row, rejecting records that would produce
/// degenerate tags.
fn normalize(
    movie: &RawMovieRow,
    credits: Option<&RawCreditsRow>,
) -> std::result::Result<MovieRecord, String> {
    if movie.overview.trim().is_empty() {
        return Err("empty overview".to_string());
    }
    let credits = credits.ok_or_else(|| "no credits row".to_string())?;

    let genres = metadata::extract_all_names(&movie.genres, movie.id, "genres")
        .map_err(|e| e.to_string())?;
    let keywords = metadata::extract_all_names(&movie.keywords, movie.id, "keywords")
        .map_err(|e| e.to_string())?;
    let cast = metadata::extract_top_names(&credits.cast, CAST_LIMIT, movie.id, "cast")
        .map_err(|e| e.to_string())?;
    let crew = metadata::extract_role_name(&credits.crew, CREW_ROLE, movie.id, "crew")
        .map_err(|e| e.to_string())?;

    Ok(MovieRecord {
        id: movie.id,
        title: movie.title.clone(),
        overview: movie.overview.clone(),
        genres,
        keywords,
        cast,
        crew,
    })
}
