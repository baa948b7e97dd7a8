//! Core domain types for the movie catalog.
//!
//! This module defines the fundamental data structures used throughout the
//! system:
//! - Type alias for movie identifiers
//! - `MovieRecord`: one normalized movie with its flattened metadata fields
//! - `CatalogIndex`: the stable-ordered in-memory catalog with id and title
//!   lookups

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a movie, as assigned by the upstream metadata
/// service. Used for poster lookups and as the catalog's primary key;
/// never used to index the similarity matrix.
pub type MovieId = u32;

/// A movie after metadata normalization.
///
/// The list fields hold flattened name tokens in their original order, with
/// internal whitespace removed ("Science Fiction" -> "ScienceFiction") so a
/// multi-word name stays one token downstream. Cast is capped at the first
/// three names; crew is reduced to the director, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    /// Free-text synopsis, untouched at this stage
    pub overview: String,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub cast: Vec<String>,
    pub crew: Vec<String>,
}

/// The in-memory movie catalog.
///
/// Rows are kept in a stable order; downstream feature vectors and the
/// similarity matrix are positionally aligned with this order, so it must
/// never be shuffled after construction. `by_id` is the primary index;
/// `by_title` is a secondary index that resolves duplicate titles to the
/// first occurrence.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub(crate) movies: Vec<MovieRecord>,
    pub(crate) by_id: HashMap<MovieId, usize>,
    pub(crate) by_title: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self {
            movies: Vec::new(),
            by_id: HashMap::new(),
            by_title: HashMap::new(),
        }
    }

    /// Append a movie, keeping the indices in sync.
    ///
    /// A duplicate title does not displace the earlier entry; a duplicate
    /// id replaces nothing and the row is still appended (ids are expected
    /// to be unique upstream, see `validate`).
    pub fn insert_movie(&mut self, movie: MovieRecord) {
        let row = self.movies.len();
        self.by_id.entry(movie.id).or_insert(row);
        self.by_title.entry(movie.title.clone()).or_insert(row);
        self.movies.push(movie);
    }

    /// Get a movie by its id
    pub fn get_by_id(&self, id: MovieId) -> Option<&MovieRecord> {
        self.by_id.get(&id).map(|&row| &self.movies[row])
    }

    /// Row position of a movie id in catalog order
    pub fn row_of_id(&self, id: MovieId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Get a movie by exact, case-sensitive title.
    ///
    /// Duplicate titles resolve to the first occurrence in catalog order.
    pub fn get_by_title(&self, title: &str) -> Option<&MovieRecord> {
        self.by_title.get(title).map(|&row| &self.movies[row])
    }

    /// All movies, in stable catalog order
    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    /// All titles, in stable catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
