use crate::core::extensions::{ExtensionSet, IMAGE_EXTENSIONS, SCAN_EXTENSIONS, normalize};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{field}` must list at least one extension")]
    NoExtensions { field: &'static str },
}

/// Which images a new fingerprint is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupScope {
    /// One fingerprint table for the whole run; duplicates may span folders.
    #[default]
    Global,
    /// The table is cleared before each folder.
    PerFolder,
}

/// When the CSV report is (re)written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFlush {
    /// Rewrite the report after every folder with all records so far.
    #[default]
    PerFolder,
    /// Write the report once, after the last folder.
    Once,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Extensions that make a file count as an image when classifying folders.
    pub image_extensions: Vec<String>,
    /// Extensions fingerprinted during the duplicate scan.
    pub scan_extensions: Vec<String>,
    /// Depth limit for the folder walk (root is depth 0).
    pub max_depth: Option<usize>,
    pub scope: DedupScope,
    pub flush: ReportFlush,
    /// Draw the per-folder progress bar.
    pub progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            scan_extensions: SCAN_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_depth: None,
            scope: DedupScope::default(),
            flush: ReportFlush::default(),
            progress: true,
        }
    }
}

impl Options {
    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut options: Options =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        options.normalize();
        options.validate()?;
        Ok(options)
    }

    /// Lower-case extensions and strip leading dots, dropping blanks and repeats.
    pub fn normalize(&mut self) {
        for list in [&mut self.image_extensions, &mut self.scan_extensions] {
            let mut seen = Vec::with_capacity(list.len());
            for ext in list.drain(..) {
                let ext = normalize(&ext);
                if !ext.is_empty() && !seen.contains(&ext) {
                    seen.push(ext);
                }
            }
            *list = seen;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_extensions.is_empty() {
            return Err(ConfigError::NoExtensions {
                field: "image_extensions",
            });
        }
        if self.scan_extensions.is_empty() {
            return Err(ConfigError::NoExtensions {
                field: "scan_extensions",
            });
        }
        Ok(())
    }

    pub fn image_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.image_extensions)
    }

    pub fn scan_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.scan_extensions)
    }
}
