pub mod config;
pub mod core;

pub use config::{ConfigError, DedupScope, Options, ReportFlush};
pub use crate::core::classifier::{Classification, ClassifyError, FolderClassifier};
pub use crate::core::duplicate::{DetectError, DuplicateDetector, DuplicateRecord, FolderSummary, ImageRef};
pub use crate::core::extensions::ExtensionSet;
pub use crate::core::fingerprint::{Fingerprint, FingerprintError, fingerprint};
pub use crate::core::report::{REPORT_HEADER, ReportError, write_report};
pub use crate::core::runner::{RunError, RunSummary, run};
