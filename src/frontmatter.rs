//! Merge step between generated tags and the tags a document already carries.
//!
//! Writing the merged list back into the document's frontmatter is the
//! host's job; this only decides the final list.

use std::collections::HashSet;

/// Combines a document's current tags with newly generated ones.
///
/// Current tags keep their order and come first; generated tags not already
/// present are appended in generation order. The result holds each tag once
/// (exact, case-sensitive comparison).
///
/// # Examples
///
/// ```
/// use tagsmith::merge_tags;
///
/// let current = vec!["rust".to_string()];
/// let generated = vec!["golang".to_string(), "rust".to_string(), "golang".to_string()];
/// assert_eq!(merge_tags(&current, &generated), vec!["rust", "golang"]);
/// ```
#[must_use]
pub fn merge_tags(current: &[String], generated: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    current
        .iter()
        .chain(generated)
        .filter(|tag| !tag.is_empty() && seen.insert(*tag))
        .cloned()
        .collect()
}
