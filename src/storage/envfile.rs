//! Environment file propagation

use crate::error::{DockyardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the environment file is copied from and to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvFileConfig {
    /// Source file, relative to the working directory
    pub source: PathBuf,
    /// Destination file, relative to the working directory
    pub destination: PathBuf,
}

impl Default for EnvFileConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(".env"),
            destination: PathBuf::from("supabase").join("docker").join(".env"),
        }
    }
}

impl EnvFileConfig {
    /// Copy the source over the destination, returning the bytes written
    ///
    /// The destination is replaced wholesale on every call. When the source
    /// is missing the destination is left untouched.
    pub fn propagate(&self, root: &Path) -> Result<u64> {
        let from = root.join(&self.source);
        let to = root.join(&self.destination);

        if !from.is_file() {
            return Err(DockyardError::EnvFileMissing(from));
        }

        tracing::info!(
            "Copying {} to {}...",
            self.source.display(),
            self.destination.display()
        );

        std::fs::copy(&from, &to).map_err(|source| DockyardError::EnvFileCopy {
            from: from.clone(),
            to: to.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, EnvFileConfig) {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("supabase/docker")).unwrap();
        (temp, EnvFileConfig::default())
    }

    #[test]
    fn test_propagate_copies_verbatim() {
        let (temp, config) = setup();
        std::fs::write(temp.path().join(".env"), "POSTGRES_PASSWORD=secret\n").unwrap();

        let written = config.propagate(temp.path()).unwrap();

        let copied = std::fs::read(temp.path().join("supabase/docker/.env")).unwrap();
        assert_eq!(copied, b"POSTGRES_PASSWORD=secret\n");
        assert_eq!(written, copied.len() as u64);
    }

    #[test]
    fn test_propagate_is_idempotent() {
        let (temp, config) = setup();
        std::fs::write(temp.path().join(".env"), "A=1\nB=2\n").unwrap();

        config.propagate(temp.path()).unwrap();
        let first = std::fs::read(temp.path().join("supabase/docker/.env")).unwrap();
        config.propagate(temp.path()).unwrap();
        let second = std::fs::read(temp.path().join("supabase/docker/.env")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_propagate_overwrites_without_merging() {
        let (temp, config) = setup();
        std::fs::write(temp.path().join(".env"), "A=1\n").unwrap();
        std::fs::write(
            temp.path().join("supabase/docker/.env"),
            "STALE=1\nLONGER=CONTENT\n",
        )
        .unwrap();

        config.propagate(temp.path()).unwrap();

        let copied = std::fs::read_to_string(temp.path().join("supabase/docker/.env")).unwrap();
        assert_eq!(copied, "A=1\n");
    }

    #[test]
    fn test_missing_source_leaves_destination() {
        let (temp, config) = setup();
        std::fs::write(temp.path().join("supabase/docker/.env"), "KEEP=1\n").unwrap();

        let err = config.propagate(temp.path()).unwrap_err();

        assert!(matches!(err, DockyardError::EnvFileMissing(_)));
        let kept = std::fs::read_to_string(temp.path().join("supabase/docker/.env")).unwrap();
        assert_eq!(kept, "KEEP=1\n");
    }

    #[test]
    fn test_missing_destination_directory_is_fatal() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(".env"), "A=1\n").unwrap();

        let err = EnvFileConfig::default().propagate(temp.path()).unwrap_err();
        assert!(matches!(err, DockyardError::EnvFileCopy { .. }));
    }
}
