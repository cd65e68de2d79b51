use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use talentflow_core::validate::ValidationError;
use talentflow_storage::CompanyError;

/// Uniform JSON body shared by every company endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Successful envelope paired with its HTTP status.
pub struct ApiResponse {
    status: StatusCode,
    body: Envelope,
}

impl ApiResponse {
    /// 200 response carrying data.
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope {
                status: true,
                message: None,
                data: Some(data),
                error: None,
            },
        }
    }

    /// 201 response for a newly persisted record.
    pub fn created<S: Into<String>>(message: S, data: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: Envelope {
                status: true,
                message: Some(message.into()),
                data: Some(data),
                error: None,
            },
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response
    }
}

/// Failure taxonomy for the company endpoints. Every variant maps to a
/// fixed HTTP status and a `status: false` envelope; the `error` field is
/// populated only for upload and internal failures, where the underlying
/// cause is attached verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("file upload failed")]
    Upload(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("company with this email already exists")]
    Duplicate,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upload(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Canonical label used for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload_error",
            Self::Validation(err) => err.as_str(),
            Self::Duplicate => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<CompanyError> for ApiError {
    fn from(err: CompanyError) -> Self {
        match err {
            CompanyError::NotFound => Self::NotFound("company not found"),
            CompanyError::Database(db_err) => Self::Internal(db_err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::Upload(detail) | Self::Internal(detail) => Some(detail.clone()),
            _ => None,
        };
        let status = self.status();
        let body = Envelope {
            status: false,
            message: Some(self.to_string()),
            data: None,
            error,
        };
        let mut response = Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_carries_message_and_cause() {
        let err = ApiError::Internal("disk on fire".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = Envelope {
            status: false,
            message: Some(err.to_string()),
            data: None,
            error: Some("disk on fire".to_string()),
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["status"], false);
        assert_eq!(value["message"], "internal server error");
        assert_eq!(value["error"], "disk on fire");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = ApiError::from(ValidationError::InvalidPhone);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "phone number must be 8 to 15 digits");
        assert_eq!(err.as_str(), "invalid_phone");
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        assert_eq!(ApiError::Duplicate.status(), StatusCode::CONFLICT);
    }
}
