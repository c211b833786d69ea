use crate::config::DedupScope;
use crate::core::extensions::ExtensionSet;
use crate::core::fingerprint::{Fingerprint, fingerprint};
use crate::core::progress::FolderProgress;
use crate::core::report::{ReportError, write_report};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    #[error("Failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// An image as reported in the CSV: bare file name plus full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub path: PathBuf,
}

impl ImageRef {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path: path.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub duplicate_name: String,
    pub duplicate_path: PathBuf,
    pub original_name: String,
    pub original_path: PathBuf,
}

impl DuplicateRecord {
    fn new(duplicate: ImageRef, original: &ImageRef) -> Self {
        Self {
            duplicate_name: duplicate.name,
            duplicate_path: duplicate.path,
            original_name: original.name.clone(),
            original_path: original.path.clone(),
        }
    }

    /// CSV row in report column order.
    pub fn row(&self) -> [String; 4] {
        [
            self.duplicate_name.clone(),
            self.duplicate_path.to_string_lossy().into_owned(),
            self.original_name.clone(),
            self.original_path.to_string_lossy().into_owned(),
        ]
    }
}

/// Counters for one `scan_folder` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    /// Files matching the scan extensions.
    pub candidates: usize,
    pub fingerprinted: usize,
    pub skipped: usize,
    /// Duplicates found in this folder.
    pub duplicates: usize,
}

/// Duplicate detection session.
///
/// Owns the fingerprint table (first-seen image per fingerprint) and every
/// duplicate record found so far. Records accumulate across `scan_folder`
/// calls; the table does too unless the scope is [`DedupScope::PerFolder`].
pub struct DuplicateDetector {
    extensions: ExtensionSet,
    scope: DedupScope,
    progress: bool,
    table: HashMap<Fingerprint, ImageRef>,
    records: Vec<DuplicateRecord>,
}

impl DuplicateDetector {
    pub fn new(extensions: ExtensionSet, scope: DedupScope) -> Self {
        Self {
            extensions,
            scope,
            progress: false,
            table: HashMap::new(),
            records: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Fingerprint every matching file directly inside `folder`.
    ///
    /// Files that cannot be read or decoded are logged and skipped.
    pub fn scan_folder(&mut self, folder: &Path) -> Result<FolderSummary, DetectError> {
        let files = self.list_candidates(folder)?;

        if self.scope == DedupScope::PerFolder {
            self.table.clear();
        }

        let mut summary = FolderSummary {
            candidates: files.len(),
            ..Default::default()
        };

        let progress = FolderProgress::new(files.len(), self.progress);
        for (i, path) in files.into_iter().enumerate() {
            progress.advance(i + 1);

            match fingerprint(&path) {
                Ok(fp) => {
                    summary.fingerprinted += 1;
                    if self.observe(fp, ImageRef::from_path(&path)).is_some() {
                        summary.duplicates += 1;
                    }
                }
                Err(e) => {
                    summary.skipped += 1;
                    progress.suspend(|| {
                        log::warn!("Error processing file {}: {}", path.display(), e)
                    });
                }
            }
        }
        progress.finish();

        log::info!(
            "{}: {} candidate(s), {} duplicate(s), {} skipped",
            folder.display(),
            summary.candidates,
            summary.duplicates,
            summary.skipped
        );
        Ok(summary)
    }

    /// Record `image` under `fp`. Returns the new duplicate record when an
    /// earlier image already owns this fingerprint; otherwise `image` becomes
    /// the first-seen entry.
    pub fn observe(&mut self, fp: Fingerprint, image: ImageRef) -> Option<&DuplicateRecord> {
        match self.table.entry(fp) {
            Entry::Occupied(entry) => {
                log::debug!(
                    "{} duplicates {}",
                    image.path.display(),
                    entry.get().path.display()
                );
                self.records.push(DuplicateRecord::new(image, entry.get()));
                self.records.last()
            }
            Entry::Vacant(entry) => {
                entry.insert(image);
                None
            }
        }
    }

    /// Rewrite `output` with every record found so far.
    pub fn write_report(&self, output: &Path) -> Result<(), DetectError> {
        write_report(output, &self.records)?;
        Ok(())
    }

    pub fn records(&self) -> &[DuplicateRecord] {
        &self.records
    }

    #[cfg(test)]
    fn known_fingerprints(&self) -> usize {
        self.table.len()
    }

    fn list_candidates(&self, folder: &Path) -> Result<Vec<PathBuf>, DetectError> {
        let io_err = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                DetectError::FolderNotFound {
                    path: folder.to_path_buf(),
                }
            } else {
                DetectError::Io {
                    path: folder.to_path_buf(),
                    source,
                }
            }
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(folder).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && self.extensions.matches(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
