use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use talentflow_core::company::CompanyForm;

/// Multipart field name carrying the optional logo file.
pub const LOGO_FIELD: &str = "logo";

/// Errors raised while draining the multipart body or storing the file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("malformed multipart request: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to store uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Drains the multipart request into a raw [`CompanyForm`].
///
/// Parts are consumed in wire order: text parts become form fields, and at
/// most one file part named `logo` has its bytes written under `upload_dir`
/// before the caller's validation runs. The stored name joins the
/// submission timestamp in milliseconds to the original filename; two
/// same-millisecond uploads of an identical filename would collide, which
/// is accepted. A `logo` part without a filename counts as no upload.
pub async fn resolve_form(
    mut multipart: Multipart,
    upload_dir: &Path,
    now: DateTime<Utc>,
) -> Result<CompanyForm, UploadError> {
    let mut form = CompanyForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == LOGO_FIELD {
            let Some(filename) = field.file_name().map(str::to_string) else {
                continue;
            };
            let stored_name = format!("{}-{}", now.timestamp_millis(), filename);
            let destination = upload_dir.join(&stored_name);
            let bytes = field.bytes().await?;
            fs::write(&destination, &bytes).await?;
            debug!(stage = "upload", file = %stored_name, size = bytes.len(), "stored logo upload");
            form.logo = Some(destination.to_string_lossy().into_owned());
        } else {
            let value = field.text().await?;
            match name.as_str() {
                "organization" => form.organization = Some(value),
                "email" => form.email = Some(value),
                "phone" => form.phone = Some(value),
                "address" => form.address = Some(value),
                "website" => form.website = Some(value),
                "industry" => form.industry = Some(value),
                _ => {}
            }
        }
    }

    Ok(form)
}
