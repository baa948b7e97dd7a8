//! Tag building.
//!
//! A movie's "tags" are the flattened, normalized token sequence that
//! represents its content for similarity purposes: synopsis tokens followed
//! by genre, keyword, cast and crew tokens, all lowercased.
//!
//! This is a pure transform. The serve-time feature vectors are only
//! meaningful if the identical procedure runs at any future rebuild, so
//! nothing here may depend on ambient state.

use data_loader::MovieRecord;

/// Build the ordered tag sequence for one movie.
///
/// Order is part of the contract: synopsis ++ genres ++ keywords ++ cast
/// ++ crew.
pub fn build_tags(movie: &MovieRecord) -> Vec<String> {
    let mut tags: Vec<String> = movie
        .overview
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    for field in [&movie.genres, &movie.keywords, &movie.cast, &movie.crew] {
        tags.extend(field.iter().map(|t| t.to_lowercase()));
    }
    tags
}

/// Space-join a tag sequence into the tag string stored in the catalog
/// artifact and fed to the vectorizer.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(" ")
}
