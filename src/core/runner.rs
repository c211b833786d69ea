use crate::config::{Options, ReportFlush};
use crate::core::classifier::{ClassifyError, FolderClassifier};
use crate::core::duplicate::{DetectError, DuplicateDetector};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Detect(#[from] DetectError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub folders_found: usize,
    pub folders_scanned: usize,
    pub folders_failed: usize,
    /// Report rewrites that failed; the folder itself still counts as scanned.
    pub reports_failed: usize,
    pub images_fingerprinted: usize,
    pub images_skipped: usize,
    pub duplicates: usize,
}

/// Classify `root`, then scan every image-only folder with one detector.
///
/// Classification errors abort the run. A folder that fails to scan is logged
/// and skipped without touching the report; a failed report rewrite is logged
/// and counted in [`RunSummary::reports_failed`].
pub fn run(root: &Path, output: &Path, options: &Options) -> Result<RunSummary, RunError> {
    let classifier = FolderClassifier::new(options.image_set()).with_max_depth(options.max_depth);
    let folders = classifier.find_image_only_folders(root)?;

    let mut detector =
        DuplicateDetector::new(options.scan_set(), options.scope).with_progress(options.progress);
    let mut summary = RunSummary {
        folders_found: folders.len(),
        ..Default::default()
    };

    for folder in &folders {
        println!("Searching folder: {}", folder.display());

        let scanned = match detector.scan_folder(folder) {
            Ok(folder_summary) => {
                summary.folders_scanned += 1;
                summary.images_fingerprinted += folder_summary.fingerprinted;
                summary.images_skipped += folder_summary.skipped;
                true
            }
            Err(e) => {
                summary.folders_failed += 1;
                log::error!("Skipping {}: {}", folder.display(), e);
                false
            }
        };

        let mut recorded = false;
        if scanned && options.flush == ReportFlush::PerFolder {
            match detector.write_report(output) {
                Ok(()) => recorded = true,
                Err(e) => {
                    summary.reports_failed += 1;
                    log::error!("{}", e);
                }
            }
        }

        match (detector.records().is_empty(), recorded) {
            (true, _) => println!("No duplicate images found."),
            (false, true) => println!("Duplicate images found and recorded to CSV file."),
            (false, false) => println!("Duplicate images found."),
        }
    }

    if options.flush == ReportFlush::Once {
        detector.write_report(output)?;
    }

    summary.duplicates = detector.records().len();
    log::info!(
        "Scanned {}/{} folder(s), {} image(s), {} duplicate(s)",
        summary.folders_scanned,
        summary.folders_found,
        summary.images_fingerprinted,
        summary.duplicates
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DedupScope;
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_image(path: &Path, seed: u32) {
        let img: RgbImage = ImageBuffer::from_fn(24, 24, |x, y| {
            let intensity = ((x * 3 + y + seed * 41) % 256) as u8;
            Rgb([intensity, 128, intensity / 3])
        });
        img.save(path).unwrap();
    }

    fn quiet(mut options: Options) -> Options {
        options.progress = false;
        options
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_end_to_end_single_folder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("F");
        fs::create_dir_all(&root).unwrap();
        create_test_image(&root.join("a.jpg"), 1);
        fs::copy(root.join("a.jpg"), root.join("b.jpg")).unwrap();
        create_test_image(&root.join("c.jpg"), 2);
        let output = temp_dir.path().join("duplicates.csv");

        let summary = run(&root, &output, &quiet(Options::default())).unwrap();

        assert_eq!(summary.folders_found, 1);
        assert_eq!(summary.folders_scanned, 1);
        assert_eq!(summary.images_fingerprinted, 3);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(
            read_rows(&output),
            vec![vec![
                "b.jpg".to_string(),
                root.join("b.jpg").to_string_lossy().into_owned(),
                "a.jpg".to_string(),
                root.join("a.jpg").to_string_lossy().into_owned(),
            ]]
        );
    }

    fn two_folder_tree(temp_dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
        let root = temp_dir.path().join("root");
        let first = root.join("first");
        let second = root.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(root.join("index.txt"), b"not an image").unwrap();

        create_test_image(&first.join("a.jpg"), 1);
        fs::copy(first.join("a.jpg"), first.join("b.jpg")).unwrap();
        fs::copy(first.join("a.jpg"), second.join("x.jpg")).unwrap();
        create_test_image(&second.join("m.jpg"), 3);
        fs::copy(second.join("m.jpg"), second.join("n.jpg")).unwrap();
        (root, first, second)
    }

    #[test]
    fn test_report_accumulates_across_folders() {
        let temp_dir = TempDir::new().unwrap();
        let (root, first, second) = two_folder_tree(&temp_dir);
        let output = temp_dir.path().join("duplicates.csv");

        let summary = run(&root, &output, &quiet(Options::default())).unwrap();

        assert_eq!(summary.folders_found, 2);
        let rows = read_rows(&output);
        let dups: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(dups, vec!["b.jpg", "n.jpg", "x.jpg"]);
        // cross-folder match points back into the first folder
        assert_eq!(rows[2][3], first.join("a.jpg").to_string_lossy());
        assert_eq!(rows[1][1], second.join("n.jpg").to_string_lossy());
    }

    #[test]
    fn test_per_folder_scope_and_single_flush() {
        let temp_dir = TempDir::new().unwrap();
        let (root, _, _) = two_folder_tree(&temp_dir);
        let output = temp_dir.path().join("duplicates.csv");

        let options = Options {
            scope: DedupScope::PerFolder,
            flush: ReportFlush::Once,
            ..quiet(Options::default())
        };
        let summary = run(&root, &output, &options).unwrap();

        assert_eq!(summary.duplicates, 2);
        let dups: Vec<String> = read_rows(&output).into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(dups, vec!["b.jpg".to_string(), "n.jpg".to_string()]);
    }

    #[test]
    fn test_no_folders_writes_nothing_unless_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("notes.txt"), b"text").unwrap();
        let output = temp_dir.path().join("duplicates.csv");

        let summary = run(&root, &output, &quiet(Options::default())).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(!output.exists());

        let once = Options {
            flush: ReportFlush::Once,
            ..quiet(Options::default())
        };
        run(&root, &output, &once).unwrap();
        assert!(output.exists());
        assert!(read_rows(&output).is_empty());
    }

    #[test]
    fn test_report_failure_does_not_stop_run() {
        let temp_dir = TempDir::new().unwrap();
        let (root, _, _) = two_folder_tree(&temp_dir);
        let output = temp_dir.path().join("missing-dir/duplicates.csv");

        let summary = run(&root, &output, &quiet(Options::default())).unwrap();

        assert_eq!(summary.folders_found, 2);
        assert_eq!(summary.folders_scanned, 2);
        assert_eq!(summary.folders_failed, 0);
        assert_eq!(summary.reports_failed, 2);
        assert_eq!(summary.images_fingerprinted, 5);
        assert_eq!(summary.duplicates, 3);
        assert!(!output.exists());
    }

    #[test]
    fn test_invalid_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("duplicates.csv");
        let result = run(
            &temp_dir.path().join("nope"),
            &output,
            &quiet(Options::default()),
        );
        assert!(matches!(
            result,
            Err(RunError::Classify(ClassifyError::InvalidRoot { .. }))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_folder_fails_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let (root, first, _) = two_folder_tree(&temp_dir);
        let output = temp_dir.path().join("duplicates.csv");
        fs::set_permissions(&first, fs::Permissions::from_mode(0o000)).unwrap();

        let readable = fs::read_dir(&first).is_ok();
        let result = run(&root, &output, &quiet(Options::default()));
        fs::set_permissions(&first, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert!(matches!(
            result,
            Err(RunError::Classify(ClassifyError::Walk { .. }))
        ));
        assert!(!output.exists());
    }
}
