/// Post-processing for raw model output.
///
/// Models answer with a comma-separated line of tags. This turns that line
/// into candidate tags: split on commas, trimmed, empties dropped, and all
/// whitespace inside a tag removed. Case is left alone; matching against the
/// existing vocabulary happens later in reconciliation.
pub struct TagNormalizer;

impl TagNormalizer {
    /// Removes every whitespace character from a single tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsmith::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::normalize_tag("  machine learning "), "machinelearning");
    /// assert_eq!(TagNormalizer::normalize_tag("Golang"), "Golang");
    /// assert_eq!(TagNormalizer::normalize_tag(" \t "), "");
    /// ```
    #[must_use]
    pub fn normalize_tag(tag: &str) -> String {
        tag.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Splits a raw completion into candidate tags.
    ///
    /// Order is preserved and duplicates are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsmith::TagNormalizer;
    ///
    /// assert_eq!(
    ///     TagNormalizer::split_tags("machine learning, nlp,, "),
    ///     vec!["machinelearning", "nlp"]
    /// );
    /// ```
    #[must_use]
    pub fn split_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(Self::normalize_tag)
            .collect()
    }
}
