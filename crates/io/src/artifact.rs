// Rendered report plus atomic publish

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clearpoint_recon::{ReconError, ReconReport};

/// A rendered workbook and its suggested file name.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    pub fn render(report: &ReconReport) -> Result<Self, ReconError> {
        Ok(Self {
            file_name: report.file_name.clone(),
            bytes: crate::xlsx::export(report)?,
        })
    }

    /// Write to `<path>.tmp` beside the target, then rename over it.
    /// A failed publish leaves neither a partial target nor the temp file.
    pub fn publish(&self, path: &Path) -> Result<(), ReconError> {
        let tmp_path = tmp_path(path);
        let written = std::fs::write(&tmp_path, &self.bytes)
            .and_then(|_| std::fs::rename(&tmp_path, path));

        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(ReconError::Io(format!("cannot write {}: {e}", path.display())));
        }
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn artifact(bytes: &[u8]) -> ReportArtifact {
        ReportArtifact { file_name: "Recon.xlsx".into(), bytes: bytes.to_vec() }
    }

    #[test]
    fn publish_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Recon.xlsx");
        std::fs::write(&path, b"old").unwrap();

        artifact(b"new").publish(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert!(!dir.path().join("Recon.xlsx.tmp").exists());
    }

    #[test]
    fn failed_publish_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        // Target is a non-empty directory: the rename fails after the temp write.
        let path = dir.path().join("Recon.xlsx");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = artifact(b"new").publish(&path).unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(!dir.path().join("Recon.xlsx.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("Recon.xlsx");
        assert!(artifact(b"x").publish(&path).is_err());
    }
}
