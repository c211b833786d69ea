pub mod classifier;
pub mod duplicate;
pub mod extensions;
pub mod fingerprint;
pub mod progress;
pub mod report;
pub mod runner;
