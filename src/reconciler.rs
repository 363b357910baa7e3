//! Reconciliation of generated tags against an existing vocabulary.
//!
//! Generated tags that look like a tag the caller already uses are replaced by
//! that existing tag, so "Golang" becomes "golang" when "golang" is already in
//! the vocabulary.

use std::collections::HashSet;

/// A candidate is replaced only when an existing tag scores strictly above this.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Case-insensitive character-set similarity between two strings.
///
/// Both strings are lowercased and reduced to their sets of distinct
/// characters; the score is the size of the intersection divided by the size
/// of the larger set. Identical strings (including two empty ones) score 1.0.
/// The result is symmetric and always within `[0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use tagsmith::similarity;
///
/// assert_eq!(similarity("Golang", "golang"), 1.0);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// assert_eq!(similarity("abcd", "ab"), 0.5);
/// ```
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let left: HashSet<char> = a.to_lowercase().chars().collect();
    let right: HashSet<char> = b.to_lowercase().chars().collect();

    let larger = left.len().max(right.len());
    if larger == 0 {
        return 1.0;
    }

    left.intersection(&right).count() as f64 / larger as f64
}

/// Replaces each candidate with its closest existing tag when that tag is similar enough.
///
/// For every candidate the best-scoring existing tag is found (the first one
/// wins ties). If its score is strictly greater than [`SIMILARITY_THRESHOLD`],
/// it takes the candidate's place; otherwise the candidate is kept as is.
/// Output order follows the candidates and nothing is deduplicated.
///
/// # Examples
///
/// ```
/// use tagsmith::reconcile;
///
/// let candidates = vec!["Golang".to_string(), "databases".to_string()];
/// let existing = vec!["golang".to_string(), "storage".to_string()];
/// assert_eq!(reconcile(&candidates, &existing), vec!["golang", "databases"]);
/// ```
#[must_use]
pub fn reconcile(candidates: &[String], existing_tags: &[String]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| {
            best_match(candidate, existing_tags)
                .filter(|(_, score)| *score > SIMILARITY_THRESHOLD)
                .map_or_else(|| candidate.clone(), |(tag, _)| tag.clone())
        })
        .collect()
}

/// The existing tag with the highest similarity to `candidate`, first one on ties.
fn best_match<'a>(candidate: &str, existing_tags: &'a [String]) -> Option<(&'a String, f64)> {
    existing_tags
        .iter()
        .map(|tag| (tag, similarity(candidate, tag)))
        .fold(None, |best, (tag, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((tag, score)),
        })
}
