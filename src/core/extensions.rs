use std::collections::HashSet;
use std::path::Path;

/// Extensions recognized when classifying folders.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Extensions fingerprinted by the duplicate scan. Narrower than
/// [`IMAGE_EXTENSIONS`] unless configured otherwise.
pub const SCAN_EXTENSIONS: [&str; 1] = ["jpg"];

/// Case-insensitive set of file extensions, stored lower case without the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    exts: HashSet<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exts: exts.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    /// True when the final extension of `path` is in the set.
    ///
    /// Names such as `.jpg` have no extension and never match.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.exts.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    #[cfg(test)]
    fn contains(&self, ext: &str) -> bool {
        self.exts.contains(&normalize(ext))
    }
}

/// Lower-cases an extension and strips a leading dot: `".JPG"` -> `"jpg"`.
pub fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}
