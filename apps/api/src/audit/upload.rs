//! Multipart intake for audit requests. Files are validated here and never reach the
//! request builder if they fail.

use axum::extract::multipart::{Field, Multipart};
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::audit::service::AuditInput;
use crate::errors::AppError;
use crate::llm_client::request::{Document, FileAttachment, ResumeSource};

pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_TYPES: [&str; 4] = ["application/pdf", "image/png", "image/jpeg", "image/webp"];

const CANDIDATE_TEXT_PREFIX: &str = "candidate:";

/// A parsed audit form: the action input plus an optional history entry to attach to.
#[derive(Debug, Default)]
pub struct AuditForm {
    pub input: AuditInput,
    pub history_id: Option<Uuid>,
}

/// MIME from the part's declared type, falling back to the file extension.
pub fn resolve_mime(content_type: Option<&str>, file_name: &str) -> Option<String> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");
    if declared.is_some() {
        return declared;
    }

    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mime.to_string())
}

pub fn validate_file(file: &FileAttachment) -> Result<(), AppError> {
    if !ACCEPTED_TYPES.contains(&file.mime_type.as_str()) {
        return Err(AppError::FileValidation(format!(
            "Unsupported file type '{}'. Use PDF, PNG, JPEG or WEBP",
            file.mime_type
        )));
    }
    if file.data.len() > MAX_FILE_BYTES {
        return Err(AppError::FileValidation(format!(
            "File '{}' is larger than 5 MB",
            file.name
        )));
    }
    Ok(())
}

/// Builds a validated attachment. `None` for an empty part (no file chosen).
pub fn attachment(
    file_name: &str,
    content_type: Option<&str>,
    data: Bytes,
) -> Result<Option<FileAttachment>, AppError> {
    if data.is_empty() {
        return Ok(None);
    }
    let mime_type = resolve_mime(content_type, file_name).ok_or_else(|| {
        AppError::FileValidation(format!("Could not determine the type of '{file_name}'"))
    })?;
    let file = FileAttachment {
        name: file_name.to_string(),
        mime_type,
        data,
    };
    validate_file(&file)?;
    Ok(Some(file))
}

/// Applies one text field to the form. Unknown names are ignored.
pub fn apply_text(form: &mut AuditForm, name: &str, value: String) -> Result<(), AppError> {
    let input = &mut form.input;
    match name {
        "text" => input.text = Some(value),
        "job_description" => input.job_description = Some(value),
        "context" => input.context = Some(value),
        "role" => input.role = Some(value),
        "level" => input.level = Some(value),
        "extra_projects" => input.extra_projects = Some(value),
        "achievements" => input.achievements = Some(value),
        "history_id" if !value.trim().is_empty() => {
            let id = Uuid::parse_str(value.trim())
                .map_err(|_| AppError::Validation(format!("Invalid history id '{value}'")))?;
            form.history_id = Some(id);
        }
        other => {
            if let Some(candidate) = other.strip_prefix(CANDIDATE_TEXT_PREFIX) {
                if !value.trim().is_empty() {
                    input
                        .candidates
                        .push(Document::candidate(candidate.trim(), ResumeSource::Text(value)));
                }
            } else {
                debug!("Ignoring unknown form field '{other}'");
            }
        }
    }
    Ok(())
}

async fn read_file(field: Field<'_>) -> Result<Option<FileAttachment>, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::FileRead(e.to_string()))?;
    attachment(&file_name, content_type.as_deref(), data)
}

pub async fn parse_form(mut multipart: Multipart) -> Result<AuditForm, AppError> {
    let mut form = AuditForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if let Some(file) = read_file(field).await? {
                    form.input.file = Some(file);
                }
            }
            "candidate_file" => {
                if let Some(file) = read_file(field).await? {
                    let name = file.name.clone();
                    form.input
                        .candidates
                        .push(Document::candidate(name, ResumeSource::File(file)));
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable field '{name}': {e}")))?;
                apply_text(&mut form, &name, value)?;
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    #[test]
    fn test_resolve_mime_prefers_declared_type() {
        assert_eq!(
            resolve_mime(Some("image/PNG"), "cv.pdf").as_deref(),
            Some("image/png")
        );
        assert_eq!(
            resolve_mime(Some("application/octet-stream"), "cv.JPG").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(resolve_mime(None, "cv.webp").as_deref(), Some("image/webp"));
        assert!(resolve_mime(None, "cv").is_none());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = attachment("cv.docx", None, Bytes::from_static(b"PK")).unwrap_err();
        assert_eq!(err.code(), "FILE_VALIDATION_ERROR");

        let err = attachment("cv.gif", Some("image/gif"), Bytes::from_static(b"GIF8")).unwrap_err();
        assert_eq!(err.code(), "FILE_VALIDATION_ERROR");
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let at_limit = Bytes::from(vec![0u8; MAX_FILE_BYTES]);
        assert!(attachment("cv.pdf", Some("application/pdf"), at_limit).is_ok());

        let over = Bytes::from(vec![0u8; MAX_FILE_BYTES + 1]);
        let err = attachment("cv.pdf", Some("application/pdf"), over).unwrap_err();
        assert!(err.to_string().contains("5 MB"));
    }

    #[test]
    fn test_empty_part_is_no_file() {
        assert!(attachment("", None, Bytes::new()).unwrap().is_none());
    }

    #[test]
    fn test_apply_text_fields() {
        let mut form = AuditForm::default();
        apply_text(&mut form, "context", "Staff SRE".to_string()).unwrap();
        apply_text(&mut form, "candidate: Ada ", "compilers".to_string()).unwrap();
        apply_text(&mut form, "candidate:Empty", "  ".to_string()).unwrap();
        apply_text(&mut form, "history_id", String::new()).unwrap();
        apply_text(&mut form, "mystery", "ignored".to_string()).unwrap();

        assert_eq!(form.input.context.as_deref(), Some("Staff SRE"));
        assert_eq!(form.input.candidates.len(), 1);
        assert!(matches!(
            &form.input.candidates[0],
            Document::Candidate { name, .. } if name == "Ada"
        ));
        assert!(form.history_id.is_none());

        let err = apply_text(&mut form, "history_id", "nope".to_string()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_parse_multipart_body() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nRust engineer\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\nBuild it\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let multipart = Multipart::from_request(request, &()).await.unwrap();
        let form = parse_form(multipart).await.unwrap();

        assert_eq!(form.input.text.as_deref(), Some("Rust engineer"));
        assert_eq!(form.input.job_description.as_deref(), Some("Build it"));
        let file = form.input.file.unwrap();
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(&file.data[..], b"%PDF-1.4");
    }
}
