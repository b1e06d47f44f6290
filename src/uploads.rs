use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Image types accepted for upload, matched on extension.
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Clone, Debug, Serialize)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Disk-backed store for uploaded images. Filenames are generated on
/// store, so a returned reference is stable and never collides with an
/// earlier upload. The persistence core treats the returned URL as an
/// opaque string.
#[derive(Clone)]
pub struct UploadStore {
    base_dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir, max_bytes })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the image under a fresh uuidv7 name, keeping the original
    /// extension, and returns its public reference.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredImage> {
        let ext = allowed_extension(original_name).ok_or_else(|| {
            StoreError::Validation(format!(
                "unsupported image type: '{original_name}' (expected jpeg, jpg, png, gif or webp)"
            ))
        })?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(StoreError::Validation(format!(
                "file exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let filename = format!("{}.{ext}", Uuid::now_v7());
        fs::write(self.base_dir.join(&filename), bytes)?;
        log::debug!("UPLOAD PUT: {filename} ({} bytes)", bytes.len());

        Ok(StoredImage {
            url: format!("/uploads/{filename}"),
            size: bytes.len() as u64,
            filename,
        })
    }

    pub fn remove(&self, filename: &str) -> Result<()> {
        let path = self.resolve(filename)?;
        if !path.is_file() {
            return Err(StoreError::NotFound);
        }
        fs::remove_file(path)?;
        log::debug!("UPLOAD REMOVE: {filename}");
        Ok(())
    }

    /// All stored images, most recently written first.
    pub fn list(&self) -> Result<Vec<StoredImage>> {
        let mut entries: Vec<(SystemTime, StoredImage)> = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().to_string();
            if allowed_extension(&filename).is_none() {
                continue;
            }
            let metadata = entry.metadata()?;
            entries.push((
                metadata.modified()?,
                StoredImage {
                    url: format!("/uploads/{filename}"),
                    size: metadata.len(),
                    filename,
                },
            ));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, image)| image).collect())
    }

    /// Accepts only plain filenames, so a reference can never escape the
    /// base directory.
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(StoreError::Validation(format!(
                "invalid filename: '{filename}'"
            )));
        }
        Ok(self.base_dir.join(filename))
    }
}

fn allowed_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
