use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::Result;

/// An uploaded PDF staged on disk for the lifetime of one request.
///
/// Each upload gets its own uniquely named file, so concurrent requests never
/// share a path. The file is deleted when this value is dropped.
pub struct PendingDocument {
    file: NamedTempFile,
    fingerprint: String,
    size: usize,
}

impl PendingDocument {
    pub fn write(bytes: &[u8]) -> Result<Self> {
        Self::write_in(&std::env::temp_dir(), bytes)
    }

    pub fn write_in(dir: &Path, bytes: &[u8]) -> Result<Self> {
        let prefix = format!("estate-{}-", uuid::Uuid::new_v4());
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".pdf")
            .tempfile_in(dir)?;

        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            file,
            fingerprint: fingerprint(bytes),
            size: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Hex SHA-256 prefix of the uploaded bytes, used to correlate log lines.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_stages_bytes() {
        let doc = PendingDocument::write(b"%PDF-1.4 test").unwrap();

        assert!(doc.path().exists());
        assert_eq!(std::fs::read(doc.path()).unwrap(), b"%PDF-1.4 test");
        assert_eq!(doc.size(), 13);
        assert_eq!(doc.path().extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[test]
    fn test_each_upload_gets_its_own_path() {
        let a = PendingDocument::write(b"same").unwrap();
        let b = PendingDocument::write(b"same").unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_file_removed_on_drop() {
        let doc = PendingDocument::write(b"%PDF-1.4").unwrap();
        let path = doc.path().to_path_buf();
        drop(doc);

        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_dir_is_io_error() {
        let missing = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        let err = PendingDocument::write_in(&missing, b"%PDF").err().unwrap();

        assert!(matches!(err, crate::IngestError::Io(_)));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_eq!(fingerprint(b"abc").len(), 32);
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
