use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

pub const AUDIO_DIR: &str = "audio";
pub const EXPORT_DIR: &str = "generated_apkg";

/// Filesystem-backed store for generated media: MP3 audio under
/// `<root>/audio/` and built deck packages under
/// `<root>/generated_apkg/user_<id>/`. The audio directory is served
/// statically, so stored names must stay URL- and Anki-safe.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MediaStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the directory layout at startup.
    pub async fn ensure_layout(&self) -> Result<(), ApiError> {
        for dir in [self.root.join(AUDIO_DIR), self.root.join(EXPORT_DIR)] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                ApiError::Internal(anyhow::anyhow!(
                    "Failed to create media directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn audio_path(&self, file_name: &str) -> PathBuf {
        self.root.join(AUDIO_DIR).join(file_name)
    }

    /// Writes an audio file and returns the stored file name.
    pub async fn save_audio(&self, file_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let path = self.audio_path(file_name);

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            ApiError::Internal(anyhow::anyhow!(
                "Failed to write audio file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Stored audio file {} ({} bytes)", file_name, bytes.len());
        Ok(file_name.to_string())
    }

    pub fn export_dir(&self, user_id: Uuid) -> PathBuf {
        self.root.join(EXPORT_DIR).join(format!("user_{}", user_id))
    }

    pub async fn ensure_export_dir(&self, user_id: Uuid) -> Result<PathBuf, ApiError> {
        let dir = self.export_dir(user_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ApiError::Internal(anyhow::anyhow!(
                "Failed to create export directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir)
    }
}

/// Collapses anything outside `[A-Za-z0-9._-]` to underscores so generated
/// names survive filesystems, URLs and Anki media references.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "._-".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("mariposa_es_word.mp3"), "mariposa_es_word.mp3");
        assert_eq!(sanitize_file_name("crème brûlée.mp3"), "cr_me_br_l_e.mp3");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("   "), "file");
    }

    #[tokio::test]
    async fn test_save_and_resolve_audio() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store.ensure_layout().await.unwrap();

        let name = store.save_audio("hola_es_word.mp3", b"ID3fake").await.unwrap();
        assert_eq!(name, "hola_es_word.mp3");

        let stored = tokio::fs::read(store.audio_path(&name)).await.unwrap();
        assert_eq!(stored, b"ID3fake");
    }

    #[tokio::test]
    async fn test_export_dir_is_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        let a = store.ensure_export_dir(user_a).await.unwrap();
        let b = store.ensure_export_dir(user_b).await.unwrap();

        assert_ne!(a, b);
        assert!(a.ends_with(format!("user_{}", user_a)));
    }
}
