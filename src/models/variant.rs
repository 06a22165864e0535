use std::fmt;

/// A filename that follows the `name.tag.extension` variant grammar.
///
/// Produced by [`crate::services::matcher::VariantMatcher::classify`]. The tag is the
/// build configuration the file belongs to (`Debug`, `Release`, ...), and
/// [`canonical_name`](Self::canonical_name) is the file the variant replaces.
///
/// When the base name itself contains dots, only the last two dot-segments are
/// treated as tag and extension: `x.y.z.w` is base `x.y`, tag `z`, extension `w`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantFilename {
    pub base_name: String,
    pub config_tag: String,
    pub extension: String,
    pub raw: String,
}

impl VariantFilename {
    /// The canonical file this variant is copied over, `base_name.extension`.
    pub fn canonical_name(&self) -> String {
        format!("{}.{}", self.base_name, self.extension)
    }

    /// Check whether the variant's tag names the given build configuration.
    ///
    /// The comparison is ASCII case-insensitive, so `Debug` matches `debug`.
    pub fn matches_configuration(&self, active_configuration: &str) -> bool {
        self.config_tag.eq_ignore_ascii_case(active_configuration)
    }
}

impl fmt::Display for VariantFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
