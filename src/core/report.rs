use crate::core::duplicate::DuplicateRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REPORT_HEADER: [&str; 4] = [
    "Duplicate Image",
    "Duplicate Path",
    "Original Image",
    "Original Path",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Truncate `path` and write the header followed by every record.
///
/// The header is written even when `records` is empty.
pub fn write_report(path: &Path, records: &[DuplicateRecord]) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_path(path)
        .map_err(csv_err)?;

    wtr.write_record(REPORT_HEADER).map_err(csv_err)?;
    for record in records {
        wtr.write_record(record.row()).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(dup: &str, orig: &str) -> DuplicateRecord {
        DuplicateRecord {
            duplicate_name: dup.to_string(),
            duplicate_path: PathBuf::from("F").join(dup),
            original_name: orig.to_string(),
            original_path: PathBuf::from("F").join(orig),
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("duplicates.csv");

        write_report(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Duplicate Image,Duplicate Path,Original Image,Original Path\r\n"
        );
    }

    #[test]
    fn test_rows_and_quoting() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("duplicates.csv");
        let records = vec![record("b.jpg", "a.jpg"), record("c, copy.jpg", "a.jpg")];

        write_report(&path, &records).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), REPORT_HEADER.to_vec());

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "b.jpg");
        assert_eq!(&rows[0][2], "a.jpg");
        assert_eq!(&rows[1][0], "c, copy.jpg");
        assert_eq!(
            PathBuf::from(&rows[1][1]),
            PathBuf::from("F").join("c, copy.jpg")
        );
    }

    #[test]
    fn test_rewrite_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("duplicates.csv");

        write_report(&path, &[record("b.jpg", "a.jpg"), record("c.jpg", "a.jpg")]).unwrap();
        write_report(&path, &[record("d.jpg", "a.jpg")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("d.jpg"));
        assert!(!content.contains("b.jpg"));
    }

    #[test]
    fn test_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/duplicates.csv");
        assert!(matches!(
            write_report(&path, &[]),
            Err(ReportError::Csv { .. })
        ));
    }
}
