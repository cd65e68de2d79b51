use std::time::Instant;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use metrics::{counter, histogram};
use serde_json::to_value;
use tracing::{error, info, warn};

use crate::envelope::{ApiError, ApiResponse};
use crate::router::AppState;
use crate::upload;

/// Handles `POST /companies`: the validated registration pipeline.
///
/// Stages run strictly in order — upload resolution, required-field
/// presence, format checks, duplicate lookup, persistence — and the first
/// failure short-circuits with its mapped status. Upload resolution always
/// runs first because the file is already on the wire; a file stored by a
/// request that fails a later stage stays on disk and is never referenced
/// by any record.
pub async fn register_company(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse, ApiError> {
    let start = Instant::now();

    let multipart = multipart.map_err(|err| {
        warn!(stage = "upload", error = %err, "rejecting registration, body is not multipart");
        fail(start, ApiError::Upload(err.body_text()))
    })?;

    let form = upload::resolve_form(multipart, state.upload_dir(), state.now())
        .await
        .map_err(|err| {
            warn!(stage = "upload", error = %err, "rejecting registration, upload failed");
            fail(start, ApiError::Upload(err.to_string()))
        })?;

    let validated = form.validate().map_err(|err| {
        info!(stage = "validate", reason = err.as_str(), "rejecting registration");
        fail(start, ApiError::from(err))
    })?;

    // The duplicate lookup receives the email exactly as submitted; the
    // stored column holds the normalized form.
    let existing = state
        .storage()
        .companies()
        .find_by_email(&validated.submitted_email)
        .await
        .map_err(|err| {
            error!(stage = "uniqueness", error = %err, "duplicate check failed");
            fail(start, ApiError::from(err))
        })?;
    if existing.is_some() {
        info!(stage = "uniqueness", email = %validated.draft.email, "rejecting duplicate registration");
        return Err(fail(start, ApiError::Duplicate));
    }

    let company = state
        .storage()
        .companies()
        .insert(&validated.draft, state.now())
        .await
        .map_err(|err| {
            error!(stage = "persist", error = %err, "failed to persist company");
            fail(start, ApiError::from(err))
        })?;

    info!(
        stage = "persist",
        id = %company.id,
        organization = %company.organization,
        "company registered"
    );
    counter!("company_intake_total", "result" => "created").increment(1);
    histogram!("company_intake_duration_seconds").record(start.elapsed().as_secs_f64());

    let data = to_value(&company).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(ApiResponse::created("company registered successfully", data))
}

fn fail(start: Instant, err: ApiError) -> ApiError {
    counter!("company_intake_total", "result" => err.as_str()).increment(1);
    histogram!("company_intake_duration_seconds").record(start.elapsed().as_secs_f64());
    err
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::router::{app_router, AppState};
    use crate::telemetry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use talentflow_storage::Database;

    static DB_SEQ: AtomicUsize = AtomicUsize::new(0);

    async fn setup() -> (AppState, TempDir) {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let n = DB_SEQ.fetch_add(1, Ordering::Relaxed);
        let database = Database::connect(&format!(
            "sqlite:file:intake-test-{n}?mode=memory&cache=shared"
        ))
        .await
        .expect("connect");
        database.run_migrations().await.expect("migrations");

        let uploads = TempDir::new().expect("temp upload dir");
        let state = AppState::new(metrics, database, uploads.path().to_path_buf());
        (state, uploads)
    }

    const BOUNDARY: &str = "talentflow-test-boundary";

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        multipart_request_with_file(fields, None)
    }

    fn multipart_request_with_file(
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"logo\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/companies")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request builds")
    }

    fn acme_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("organization", "Acme"),
            ("email", " A@B.com "),
            ("phone", "9876543210"),
            ("address", "1 Main St"),
        ]
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let collected = response.into_body().collect().await.expect("body reads");
        serde_json::from_slice(&collected.to_bytes()).expect("body is json")
    }

    #[tokio::test]
    async fn valid_registration_returns_created_with_normalized_email() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        let response = app
            .oneshot(multipart_request(&acme_fields()))
            .await
            .expect("handler responds");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        assert_eq!(json["status"], true);
        assert_eq!(json["data"]["email"], "a@b.com");
        assert_eq!(json["data"]["organization"], "Acme");
        assert!(json["data"]["logo"].is_null());
    }

    #[tokio::test]
    async fn missing_required_field_is_rejected_with_collective_message() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        for missing in ["organization", "email", "phone", "address"] {
            let fields: Vec<(&str, &str)> = acme_fields()
                .into_iter()
                .filter(|(name, _)| *name != missing)
                .collect();
            let response = app
                .clone()
                .oneshot(multipart_request(&fields))
                .await
                .expect("handler responds");

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "missing {missing} should be rejected"
            );
            let json = response_json(response).await;
            assert_eq!(json["status"], false);
            assert_eq!(
                json["message"],
                "organization, email, phone and address are required"
            );
        }
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        let mut fields = acme_fields();
        fields[1] = ("email", "not-an-address");
        let response = app
            .oneshot(multipart_request(&fields))
            .await
            .expect("handler responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["message"], "invalid email format");
    }

    #[tokio::test]
    async fn out_of_range_phone_is_rejected() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        for phone in ["1234567", "1234567890123456", "98765x4321"] {
            let mut fields = acme_fields();
            fields[2] = ("phone", phone);
            let response = app
                .clone()
                .oneshot(multipart_request(&fields))
                .await
                .expect("handler responds");

            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "phone {phone} should be rejected"
            );
            let json = response_json(response).await;
            assert_eq!(json["message"], "phone number must be 8 to 15 digits");
        }
    }

    #[tokio::test]
    async fn repeated_registration_conflicts() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        let first = app
            .clone()
            .oneshot(multipart_request(&acme_fields()))
            .await
            .expect("handler responds");
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(multipart_request(&acme_fields()))
            .await
            .expect("handler responds");
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let json = response_json(second).await;
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "company with this email already exists");
    }

    #[tokio::test]
    async fn created_record_round_trips_through_lookup() {
        let (state, _uploads) = setup().await;
        let app = app_router(state);

        let mut fields = acme_fields();
        fields.push(("website", " https://acme.example "));
        fields.push(("industry", "Staffing"));
        let created = app
            .clone()
            .oneshot(multipart_request(&fields))
            .await
            .expect("handler responds");
        assert_eq!(created.status(), StatusCode::CREATED);
        let created_json = response_json(created).await;
        let id = created_json["data"]["id"].as_str().expect("id assigned");

        let fetched = app
            .oneshot(
                Request::builder()
                    .uri(format!("/companies/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler responds");
        assert_eq!(fetched.status(), StatusCode::OK);
        let fetched_json = response_json(fetched).await;
        assert_eq!(fetched_json["data"], created_json["data"]);
        assert_eq!(fetched_json["data"]["website"], "https://acme.example");
    }

    #[tokio::test]
    async fn logo_upload_is_stored_and_referenced() {
        let (state, uploads) = setup().await;
        let app = app_router(state);

        let response = app
            .oneshot(multipart_request_with_file(
                &acme_fields(),
                Some(("logo.png", b"\x89PNG-not-really")),
            ))
            .await
            .expect("handler responds");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        let reference = json["data"]["logo"].as_str().expect("logo reference set");
        assert!(reference.ends_with("-logo.png"));

        let stored: Vec<_> = std::fs::read_dir(uploads.path())
            .expect("upload dir readable")
            .collect();
        assert_eq!(stored.len(), 1);
        let stored_path = stored[0].as_ref().expect("dir entry").path();
        assert_eq!(stored_path.to_string_lossy(), reference);
        assert_eq!(
            std::fs::read(&stored_path).expect("stored file readable"),
            b"\x89PNG-not-really"
        );
    }

    #[tokio::test]
    async fn upload_failure_skips_validation() {
        let (state, uploads) = setup().await;
        drop(uploads); // removing the upload dir forces the file write to fail
        let app = app_router(state);

        let response = app
            .oneshot(multipart_request_with_file(
                &[("organization", "Acme")],
                Some(("logo.png", b"bytes")),
            ))
            .await
            .expect("handler responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "file upload failed");
        // The missing-fields message never appears: validation did not run.
        assert!(json["error"]
            .as_str()
            .expect("cause attached")
            .contains("failed to store uploaded file"));
    }
}
