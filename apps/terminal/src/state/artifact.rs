//! # Bill Files
//!
//! Stores rendered bills as PDF files, one per bill:
//! `<bills_dir>/bill_BILL202403150007.pdf`. A reprint overwrites the file.
//!
//! The sink receives the fixed-width layout from `BillDocument` and
//! typesets it with [`bill_pdf`].

use std::path::{Path, PathBuf};
use super::pdf::bill_pdf;
use till_core::{ArtifactHandle, ArtifactSink, Bill, StoreError};
use tracing::{debug, warn};

/// Writes bill documents into a directory.
#[derive(Debug, Clone)]
pub struct FileArtifactSink {
    dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileArtifactSink { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the file for `bill` is written.
    pub fn path_for(&self, bill: &Bill) -> PathBuf {
        self.dir.join(format!("bill_{}.pdf", bill.bill_number()))
    }
}

impl ArtifactSink for FileArtifactSink {
    async fn store(&self, bill: &Bill, content: &str) -> Result<ArtifactHandle, StoreError> {
        let path = self.path_for(bill);
        let pdf = bill_pdf(bill, content).map_err(|e| {
            warn!(bill_id = bill.bill_id, error = %e, "Bill PDF not generated");
            e
        })?;

        let written = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, &pdf).await
        }
        .await;

        if let Err(e) = written {
            warn!(bill_id = bill.bill_id, path = %path.display(), error = %e, "Bill file not written");
            return Err(StoreError::Artifact(format!("{}: {}", path.display(), e)));
        }

        debug!(bill_id = bill.bill_id, path = %path.display(), bytes = pdf.len(), "Bill file written");
        Ok(ArtifactHandle {
            location: path.display().to_string(),
            bytes: pdf.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use till_core::{Money, PaymentMethod};

    fn bill() -> Bill {
        Bill {
            bill_id: 7,
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
            payment_method: PaymentMethod::Cash,
            operator: "staff".to_string(),
            total: Money::zero(),
            lines: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_writes_file_named_after_bill_number() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileArtifactSink::new(dir.path().join("bills"));

        let handle = sink.store(&bill(), "hello\n").await.unwrap();

        let path = dir.path().join("bills").join("bill_BILL202403150007.pdf");
        assert_eq!(handle.location, path.display().to_string());

        let written = std::fs::read(path).unwrap();
        assert!(written.starts_with(b"%PDF-"));
        assert_eq!(handle.bytes, written.len());
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let sink = FileArtifactSink::new(&blocker);
        let err = sink.store(&bill(), "x").await.unwrap_err();
        assert!(matches!(err, StoreError::Artifact(_)));
    }
}
