use anyhow::{anyhow, Context, Result};
use rag_system::DocumentKind;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The one document the current session works on.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub filename: String,
    pub path: PathBuf,
    pub extension: Option<String>,
    pub size: usize,
}

impl UploadedDocument {
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_path(&self.path)
    }
}

/// Writes the uploaded bytes verbatim to `<dir>/<filename>`.
///
/// Only the last component of the client-supplied name is used, so a name
/// carrying directories still lands directly inside `dir`.
pub async fn store_upload(dir: &Path, original_name: &str, bytes: &[u8]) -> Result<UploadedDocument> {
    let filename = Path::new(original_name)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| anyhow!("Invalid upload file name {:?}", original_name))?;

    let path = dir.join(&filename);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to save {}", path.display()))?;

    log::info!("Saved upload {} ({} bytes)", path.display(), bytes.len());

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_string());

    Ok(UploadedDocument {
        filename,
        path,
        extension,
        size: bytes.len(),
    })
}
