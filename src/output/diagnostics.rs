//! Dumps of unexpected pages for offline inspection

use std::io::Write;
use std::path::PathBuf;

/// Writes anomalous page bodies to uniquely named files
#[derive(Debug, Clone)]
pub struct DiagnosticDump {
    dir: PathBuf,
}

impl DiagnosticDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Dumps into the system temp directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Saves `body` and returns the file path
    ///
    /// Best effort: a failed write is logged and yields `None`.
    pub fn capture(&self, body: &str) -> Option<PathBuf> {
        match self.try_capture(body) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    "Failed to save diagnostic page in {}: {}",
                    self.dir.display(),
                    e
                );
                None
            }
        }
    }

    fn try_capture(&self, body: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("page-")
            .suffix(".html")
            .tempfile_in(&self.dir)?;
        file.write_all(body.as_bytes())?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }
}

impl Default for DiagnosticDump {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_capture_writes_unique_files() {
        let dir = TempDir::new().unwrap();
        let dump = DiagnosticDump::new(dir.path());

        let first = dump.capture("<html>one</html>").unwrap();
        let second = dump.capture("<html>two</html>").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "<html>one</html>");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "<html>two</html>");
    }

    #[test]
    fn test_capture_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let dump = DiagnosticDump::new(blocker.join("nested"));
        assert!(dump.capture("<html></html>").is_none());
    }
}
