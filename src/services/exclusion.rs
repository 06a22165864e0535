use crate::models::VariantFilename;
use indexmap::IndexSet;

/// Canonical filenames that are never replaced.
///
/// Entries are literal `name.extension` strings compared with ASCII case folding,
/// so `Web.config` also excludes `web.CONFIG`. Insertion order is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: IndexSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// Check if the canonical name `base_name.extension` is excluded
    pub fn is_excluded(&self, base_name: &str, extension: &str) -> bool {
        let canonical = format!("{}.{}", base_name, extension).to_ascii_lowercase();
        self.entries.contains(&canonical)
    }

    /// Check if the file a variant would replace is excluded
    pub fn excludes_variant(&self, variant: &VariantFilename) -> bool {
        self.is_excluded(&variant.base_name, &variant.extension)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Free-function form of [`ExclusionSet::is_excluded`]
pub fn is_excluded(base_name: &str, extension: &str, exclude_set: &ExclusionSet) -> bool {
    exclude_set.is_excluded(base_name, extension)
}
