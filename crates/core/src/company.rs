use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered client company as persisted by the intake pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fixed projection of a company returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub logo: Option<String>,
}

/// Registration fields exactly as they arrived on the wire, before any
/// validation or normalization. Assembled by the upload adapter.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompanyForm {
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub logo: Option<String>,
}

/// Normalized field set ready for persistence: required fields trimmed,
/// email additionally lower-cased, `industry` carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDraft {
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub logo: Option<String>,
}
