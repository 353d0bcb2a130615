use crate::services::SearchHit;

/// Words in encyclopedia snippets and entity descriptions that signal
/// touristic or historical importance
pub const SIGNIFICANCE_KEYWORDS: &[&str] = &[
    "heritage",
    "unesco",
    "landmark",
    "attraction",
    "historic",
    "historical",
    "monument",
    "famous",
    "century",
    "architecture",
];

/// Category fragments that mark a place as historical or cultural
pub const HISTORICAL_CATEGORY_KEYWORDS: &[&str] = &[
    "monument",
    "historic",
    "landmark",
    "museum",
    "memorial",
    "cathedral",
    "church",
    "temple",
    "palace",
    "castle",
    "tower",
    "bridge",
];

/// Tourism tag values that count as a full geodata tourism match
pub const NOTABLE_TOURISM_VALUES: &[&str] = &["attraction", "museum", "monument", "artwork", "viewpoint"];

/// Count how many distinct keywords occur in `text` (case-insensitive)
///
/// Each keyword is counted at most once, however often it appears.
#[inline]
pub fn count_keywords(text: &str, keywords: &[&str]) -> usize {
    let lower = text.to_lowercase();
    keywords.iter().filter(|k| lower.contains(*k)).count()
}

/// Check if a category string names a historical/cultural kind of place
#[inline]
pub fn is_historical_category(category: &str) -> bool {
    count_keywords(category, HISTORICAL_CATEGORY_KEYWORDS) > 0
}

/// Check if a search hit points at a disambiguation page rather than an article
pub fn looks_like_disambiguation(hit: &SearchHit) -> bool {
    hit.title.to_lowercase().contains("(disambiguation)")
        || hit
            .snippet
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains("may refer to"))
}
