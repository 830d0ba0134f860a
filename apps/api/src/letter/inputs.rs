//! Input resolution: uploaded file or bundled default, never neither.
//!
//! Uploads arrive as spooled temp files. Reading one consumes it: the store
//! deletes the temp file right after the read, whether or not the read worked.
//! An upload that is never read is deleted when it is dropped.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// A form file spooled to disk by the multipart reader.
#[derive(Debug)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub size: u64,
    temp: NamedTempFile,
}

impl UploadedFile {
    pub fn new(
        field: impl Into<String>,
        file_name: Option<String>,
        size: u64,
        temp: NamedTempFile,
    ) -> Self {
        Self {
            field: field.into(),
            file_name,
            size,
            temp,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Deletes the temp file now, reporting failures instead of ignoring them on drop.
    pub fn delete(self) -> io::Result<()> {
        self.temp.close()
    }
}

/// The bundled fallback resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultResource {
    Resume,
    CoverLetterTemplate,
}

impl DefaultResource {
    pub fn file_name(self) -> &'static str {
        match self {
            DefaultResource::Resume => "default-resume.txt",
            DefaultResource::CoverLetterTemplate => "default-cover-letter.tex",
        }
    }
}

/// Source of pipeline inputs. Carried in `AppState` as `Arc<dyn InputStore>`.
#[async_trait]
pub trait InputStore: Send + Sync {
    async fn load_default(&self, resource: DefaultResource) -> io::Result<String>;

    /// Reads an upload's text, then deletes its temp file exactly once.
    async fn consume_upload(&self, upload: UploadedFile) -> io::Result<String>;
}

/// Picks the upload when present, the bundled default otherwise.
pub async fn resolve(
    store: &dyn InputStore,
    upload: Option<UploadedFile>,
    fallback: DefaultResource,
) -> io::Result<String> {
    match upload {
        Some(upload) => {
            debug!(
                "Using uploaded {} {:?} ({} bytes)",
                upload.field, upload.file_name, upload.size
            );
            store.consume_upload(upload).await
        }
        None => {
            debug!("No upload, using {}", fallback.file_name());
            store.load_default(fallback).await
        }
    }
}

/// Filesystem-backed store used in production.
#[derive(Debug, Clone)]
pub struct FsInputStore {
    defaults_dir: PathBuf,
}

impl FsInputStore {
    pub fn new(defaults_dir: impl Into<PathBuf>) -> Self {
        Self {
            defaults_dir: defaults_dir.into(),
        }
    }
}

#[async_trait]
impl InputStore for FsInputStore {
    async fn load_default(&self, resource: DefaultResource) -> io::Result<String> {
        let path = self.defaults_dir.join(resource.file_name());
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to read default resource {}: {e}", path.display()),
            )
        })
    }

    async fn consume_upload(&self, upload: UploadedFile) -> io::Result<String> {
        let read = tokio::fs::read(upload.path()).await;

        let field = upload.field.clone();
        if let Err(e) = upload.delete() {
            warn!("Failed to delete temp upload for {field}: {e}");
        }

        decode_upload(read?).await
    }
}

/// Turns upload bytes into text. PDFs are text-extracted; anything else is
/// decoded as UTF-8 with invalid sequences replaced.
pub async fn decode_upload(bytes: Vec<u8>) -> io::Result<String> {
    if !bytes.starts_with(b"%PDF") {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    // PDF extraction is CPU-bound; keep it off the async workers.
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(io::Error::other)?
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to extract text from PDF: {e}"),
            )
        })
}
