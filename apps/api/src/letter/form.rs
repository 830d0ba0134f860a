//! Multipart form reading for the cover letter endpoint.
//!
//! File fields are streamed chunk by chunk into temp files under the upload
//! directory, so a large resume never sits in memory as a whole.

use std::io;
use std::path::Path;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::letter::inputs::UploadedFile;

pub const FIELD_JOB_DESCRIPTION: &str = "jobDescription";
pub const FIELD_RESUME: &str = "resume";
pub const FIELD_SAMPLE_COVER_LETTER: &str = "sampleCoverLetter";

/// Everything the client submitted, before defaults are applied.
#[derive(Debug, Default)]
pub struct Submission {
    pub job_description: Option<String>,
    pub resume: Option<UploadedFile>,
    pub sample_cover_letter: Option<UploadedFile>,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("upload '{field}' exceeds the {limit} byte limit")]
    TooLarge { field: String, limit: u64 },

    #[error("failed to spool upload: {0}")]
    Io(#[from] io::Error),
}

/// Reads the whole multipart body into a `Submission`.
///
/// Unknown fields are skipped and the first occurrence of a repeated field wins.
/// On error, uploads spooled so far are dropped and their temp files removed.
pub async fn read_submission(
    multipart: &mut Multipart,
    upload_dir: &Path,
    max_upload_bytes: u64,
) -> Result<Submission, FormError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_JOB_DESCRIPTION => {
                let text = field.text().await?;
                if submission.job_description.is_none() {
                    submission.job_description = Some(text);
                }
            }
            FIELD_RESUME | FIELD_SAMPLE_COVER_LETTER => {
                let upload = spool_field(field, &name, upload_dir, max_upload_bytes).await?;
                let slot = if name == FIELD_RESUME {
                    &mut submission.resume
                } else {
                    &mut submission.sample_cover_letter
                };
                if slot.is_none() {
                    *slot = upload;
                }
            }
            other => {
                debug!("Ignoring unknown form field {other:?}");
            }
        }
    }

    Ok(submission)
}

/// Streams one file field into a temp file. Returns `None` for the empty part a
/// browser sends when no file was chosen.
async fn spool_field(
    mut field: Field<'_>,
    name: &str,
    upload_dir: &Path,
    max_upload_bytes: u64,
) -> Result<Option<UploadedFile>, FormError> {
    let file_name = field
        .file_name()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let temp = tempfile::Builder::new()
        .prefix("cover-letter-upload-")
        .tempfile_in(upload_dir)?;
    // Async handle on the same file; `temp` keeps ownership of the path.
    let mut file = tokio::fs::File::from_std(temp.reopen()?);
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if size > max_upload_bytes {
            warn!("Upload {name} rejected: over {max_upload_bytes} bytes");
            return Err(FormError::TooLarge {
                field: name.to_string(),
                limit: max_upload_bytes,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    if size == 0 && file_name.is_none() {
        return Ok(None);
    }

    debug!("Spooled {name} ({size} bytes) to {}", temp.path().display());
    Ok(Some(UploadedFile::new(name, file_name, size, temp)))
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    use super::*;

    pub(crate) const BOUNDARY: &str = "XCOVERLETTERBOUNDARY";

    pub(crate) enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    pub(crate) fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub(crate) fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn read(parts: &[Part<'_>], dir: &Path, limit: u64) -> Result<Submission, FormError> {
        let request = multipart_request("/", parts);
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();
        read_submission(&mut multipart, dir, limit).await
    }

    fn temp_files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_reads_text_and_both_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let submission = read(
            &[
                Part::Text(FIELD_JOB_DESCRIPTION, "Backend engineer"),
                Part::File(FIELD_RESUME, "resume.txt", b"My resume"),
                Part::File(FIELD_SAMPLE_COVER_LETTER, "sample.tex", b"\\opening{Hi}"),
            ],
            dir.path(),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(submission.job_description.as_deref(), Some("Backend engineer"));
        let resume = submission.resume.as_ref().unwrap();
        assert_eq!(resume.file_name.as_deref(), Some("resume.txt"));
        assert_eq!(resume.size, 9);
        assert_eq!(std::fs::read(resume.path()).unwrap(), b"My resume");
        assert!(submission.sample_cover_letter.is_some());
        assert_eq!(temp_files_in(dir.path()), 2);

        drop(submission);
        assert_eq!(temp_files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_multi_chunk_upload_is_spooled_intact() {
        let dir = tempfile::TempDir::new().unwrap();
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let submission = read(
            &[
                Part::Text(FIELD_JOB_DESCRIPTION, "Role"),
                Part::File(FIELD_RESUME, "resume.pdf", &content),
            ],
            dir.path(),
            1024 * 1024,
        )
        .await
        .unwrap();

        let resume = submission.resume.as_ref().unwrap();
        assert_eq!(resume.size, content.len() as u64);
        assert_eq!(std::fs::read(resume.path()).unwrap(), content);
    }

    #[tokio::test]
    async fn test_empty_unnamed_file_part_counts_as_absent() {
        let dir = tempfile::TempDir::new().unwrap();
        let submission = read(
            &[
                Part::Text(FIELD_JOB_DESCRIPTION, "Role"),
                Part::File(FIELD_RESUME, "", b""),
            ],
            dir.path(),
            1024,
        )
        .await
        .unwrap();

        assert!(submission.resume.is_none());
        assert_eq!(temp_files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_job_description_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let submission = read(&[Part::Text("other", "x")], dir.path(), 1024)
            .await
            .unwrap();
        assert!(submission.job_description.is_none());
        assert!(submission.resume.is_none());
        assert!(submission.sample_cover_letter.is_none());
    }

    #[tokio::test]
    async fn test_first_repeated_field_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let submission = read(
            &[
                Part::Text(FIELD_JOB_DESCRIPTION, "first"),
                Part::Text(FIELD_JOB_DESCRIPTION, "second"),
                Part::File(FIELD_RESUME, "a.txt", b"A"),
                Part::File(FIELD_RESUME, "b.txt", b"B"),
            ],
            dir.path(),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(submission.job_description.as_deref(), Some("first"));
        let resume = submission.resume.as_ref().unwrap();
        assert_eq!(resume.file_name.as_deref(), Some("a.txt"));
        // The losing duplicate was dropped, and its temp file with it.
        assert_eq!(temp_files_in(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_and_cleaned_up() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read(
            &[
                Part::File(FIELD_SAMPLE_COVER_LETTER, "small.tex", b"ok"),
                Part::File(FIELD_RESUME, "big.txt", &[b'x'; 64]),
            ],
            dir.path(),
            16,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, FormError::TooLarge { ref field, limit: 16 } if field == FIELD_RESUME));
        assert_eq!(temp_files_in(dir.path()), 0);
    }
}
