//! Upload ingestion: multipart bodies streamed to a staging directory.
//!
//! Each accepted artifact is written under a unique name and wrapped in a
//! [`StagedUpload`] that deletes the file when dropped, so the file lives
//! exactly as long as the request that flashes it.

use std::io;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Extensions accepted by the upload routes.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["bit", "bin"];

const MAX_NAME_LEN: usize = 100;

/// Upload rejections.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only .bit and .bin files are allowed")]
    BadExtension,

    #[error("File too large (max {limit} bytes)")]
    TooLarge { limit: u64 },

    #[error("Invalid multipart request: {0}")]
    Malformed(String),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] io::Error),
}

impl UploadError {
    fn from_multipart(err: &MultipartError, limit: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge { limit }
        } else {
            Self::Malformed(err.body_text())
        }
    }
}

/// Where uploads are staged and how large they may be.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

/// The fields of one upload request.
#[derive(Debug, Default)]
pub struct FlashForm {
    pub artifact: Option<StagedUpload>,
    pub port: Option<String>,
    pub address: Option<String>,
}

impl UploadStore {
    /// Create the staging directory if needed and resolve it to an absolute
    /// path.
    pub async fn prepare(dir: impl AsRef<Path>, max_bytes: u64) -> io::Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let dir = tokio::fs::canonicalize(dir).await?;
        debug!(dir = %dir.display(), max_bytes, "Upload directory ready");
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Read every field of a flash upload.
    ///
    /// `file` is streamed to disk, `port` and `address` are read as text and
    /// blank values count as absent. Unknown fields are skipped.
    pub async fn receive(&self, mut multipart: Multipart) -> Result<FlashForm, UploadError> {
        let mut form = FlashForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::from_multipart(&e, self.max_bytes))?
        {
            let name = field.name().map(ToString::to_string);
            match name.as_deref() {
                Some("file") if form.artifact.is_none() => {
                    form.artifact = Some(self.stage(field).await?);
                }
                Some("port") => form.port = self.text(field).await?,
                Some("address") => form.address = self.text(field).await?,
                _ => {}
            }
        }

        Ok(form)
    }

    async fn text(&self, field: Field<'_>) -> Result<Option<String>, UploadError> {
        let value = field
            .text()
            .await
            .map_err(|e| UploadError::from_multipart(&e, self.max_bytes))?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    async fn stage(&self, mut field: Field<'_>) -> Result<StagedUpload, UploadError> {
        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            return Err(UploadError::MissingFile);
        }
        if !has_accepted_extension(&original_name) {
            return Err(UploadError::BadExtension);
        }

        // Declared before the handle so the handle closes first on early
        // returns; Windows refuses to delete a file that is still open.
        let mut staged = StagedUpload {
            path: self.dir.join(unique_name(&original_name)),
            original_name,
            size: 0,
        };
        let mut file = tokio::fs::File::create(&staged.path).await?;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::from_multipart(&e, self.max_bytes))?
        {
            staged.size += chunk.len() as u64;
            if staged.size > self.max_bytes {
                return Err(UploadError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if staged.size == 0 {
            return Err(UploadError::MissingFile);
        }

        debug!(
            path = %staged.path.display(),
            original = %staged.original_name,
            bytes = staged.size,
            "Upload staged"
        );
        Ok(staged)
    }
}

/// An uploaded artifact on disk. Deleted on drop.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    original_name: String,
    size: u64,
}

impl StagedUpload {
    /// Absolute path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as sent by the client.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub const fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Upload removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// Case-insensitive `.bit` / `.bin` check.
pub fn has_accepted_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

/// `<millis>-<uuid>-<sanitized name>`.
fn unique_name(original: &str) -> String {
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        sanitize_filename(original)
    )
}

/// Reduce a client-supplied name to a safe basename.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.len() > MAX_NAME_LEN {
        cleaned = cleaned.split_off(cleaned.len() - MAX_NAME_LEN);
    }
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
