use crate::models::VariantFilename;
use regex::Regex;
use std::sync::LazyLock;

static DEFAULT_MATCHER: LazyLock<VariantMatcher> = LazyLock::new(VariantMatcher::new);

/// Classify a filename with the shared default matcher.
///
/// See [`VariantMatcher::classify`].
pub fn classify(filename: &str) -> Option<VariantFilename> {
    DEFAULT_MATCHER.classify(filename)
}

/// Parses filenames into `(name, tag, extension)` triples.
///
/// # Grammar
///
/// - Pattern: `^(.+)\.([^.]+)\.([^.]+)$`
/// - The first group is greedy and absorbs every dot except the last two, so
///   `a.b.c.Debug.config` is base `a.b.c`, tag `Debug`, extension `config`.
/// - All three groups must be non-empty. Names with fewer than two dots, a
///   leading dot before the tag (`.Debug.config`) or an empty segment
///   (`App..config`) never match.
pub struct VariantMatcher {
    pattern: Regex,
}

impl VariantMatcher {
    /// Create a new VariantMatcher with the compiled filename pattern
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^(.+)\.([^.]+)\.([^.]+)$").expect("Invalid variant regex"),
        }
    }

    /// Classify a bare filename (no directory component).
    ///
    /// # Returns
    /// `Some(VariantFilename)` when the name follows the variant grammar, `None` otherwise.
    /// A non-match is not an error, it only means "no action".
    pub fn classify(&self, filename: &str) -> Option<VariantFilename> {
        let captures = self.pattern.captures(filename)?;

        Some(VariantFilename {
            base_name: captures[1].to_string(),
            config_tag: captures[2].to_string(),
            extension: captures[3].to_string(),
            raw: filename.to_string(),
        })
    }
}

impl Default for VariantMatcher {
    fn default() -> Self {
        Self::new()
    }
}
