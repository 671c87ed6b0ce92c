//! Numeric identity extraction from resource URLs.
//!
//! Every API resource URL embeds its id as the path segment that follows the
//! resource kind, e.g. `https://pokeapi.co/api/v2/pokemon-species/25/`.

use crate::models::IndexEntry;

/// Return the integer path segment immediately following `segment` in `url`.
///
/// Yields `0` when the segment is missing or the following part is not a
/// number. Never fails; a `0` id simply sorts first.
///
/// Examples: `(".../move/33/", "move")` -> `33`, `(".../move/tackle/", "move")` -> `0`.
pub fn extract_id(url: &str, segment: &str) -> u32 {
    // strip scheme/query so "pokemon" can't match inside the host or a param
    let path = url.split(['?', '#']).next().unwrap_or("");
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);

    let mut parts = path.split('/').filter(|p| !p.is_empty());
    while let Some(part) = parts.next() {
        if part == segment {
            return parts
                .next()
                .and_then(|id| id.parse::<u32>().ok())
                .unwrap_or(0);
        }
    }
    0
}

/// Stable sort of an index listing by the id embedded in each entry's URL.
pub fn sort_by_extracted_id(entries: &mut [IndexEntry], segment: &str) {
    entries.sort_by_key(|e| extract_id(&e.url, segment));
}
