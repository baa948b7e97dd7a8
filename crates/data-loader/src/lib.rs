//! # Data Loader Crate
//!
//! This crate handles loading and normalizing the raw movie catalog.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieRecord, CatalogIndex)
//! - **parser**: Parse the raw CSV exports into rows
//! - **metadata**: Flatten the JSON-encoded metadata fields into name lists
//! - **index**: Join, normalize and index the catalog
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::CatalogIndex;
//! use std::path::Path;
//!
//! let catalog = CatalogIndex::load_from_files(
//!     Path::new("data/tmdb_5000_movies.csv"),
//!     Path::new("data/tmdb_5000_credits.csv"),
//! )?;
//!
//! let movie = catalog.get_by_title("Avatar").unwrap();
//! println!("{} has {} cast tokens", movie.title, movie.cast.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod metadata;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{CatalogIndex, MovieId, MovieRecord};

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: MovieId, title: &str) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            overview: "a movie".to_string(),
            genres: vec!["Drama".to_string()],
            keywords: vec![],
            cast: vec![],
            crew: vec![],
        }
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = CatalogIndex::new();
        assert_eq!(catalog.len(), 0);
        assert!(catalog.is_empty());
        assert!(catalog.get_by_id(1).is_none());
        assert!(catalog.get_by_title("anything").is_none());
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut catalog = CatalogIndex::new();
        catalog.insert_movie(record(5, "Five"));
        catalog.insert_movie(record(3, "Three"));
        catalog.insert_movie(record(9, "Nine"));

        let titles: Vec<&str> = catalog.titles().collect();
        assert_eq!(titles, vec!["Five", "Three", "Nine"]);
        assert_eq!(catalog.row_of_id(3), Some(1));
    }

    #[test]
    fn test_lookup_by_id_and_title() {
        let mut catalog = CatalogIndex::new();
        catalog.insert_movie(record(42, "The Answer"));

        assert_eq!(catalog.get_by_id(42).unwrap().title, "The Answer");
        assert_eq!(catalog.get_by_title("The Answer").unwrap().id, 42);
    }
}
