//! Atomic file persistence helpers.
//!
//! Writers go through [`write_atomic`]: bytes land in a sibling temp file,
//! are fsynced, and the temp file is renamed over the final name. A reader
//! of the final path therefore sees either the previous contents or the new
//! contents, never a partial write.

use std::path::Path;

use tokio::io::AsyncWriteExt;

/// Write `bytes` to `path` atomically (temp file + fsync + rename).
///
/// The temp file lives in the same directory as `path` so the rename stays
/// within one filesystem.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = tmp_path(path);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await
}

/// Sibling temp path used by [`write_atomic`].
fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load a JSON array file into a `Vec<T>`.
///
/// A missing file is an empty collection. An unreadable or corrupt file is
/// also treated as empty, with a warning -- restart must never fail because
/// a data file is damaged.
pub async fn load_collection<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read data file, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse data file, starting empty");
            Vec::new()
        }
    }
}
