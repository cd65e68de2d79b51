use thiserror::Error;

use crate::company::{CompanyDraft, CompanyForm};

/// Errors produced while validating a registration form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("organization, email, phone and address are required")]
    MissingFields,
    #[error("invalid email format")]
    InvalidEmail,
    #[error("phone number must be 8 to 15 digits")]
    InvalidPhone,
}

impl ValidationError {
    /// Canonical label used for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidPhone => "invalid_phone",
        }
    }
}

/// Outcome of a successful validation pass: the normalized draft plus the
/// email exactly as it was submitted, which the duplicate check receives
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub submitted_email: String,
    pub draft: CompanyDraft,
}

impl CompanyForm {
    /// Runs the presence and format checks in submission order and yields
    /// the normalized draft.
    ///
    /// Presence is checked against the raw values, before any trimming; the
    /// missing-fields error deliberately does not say which field was
    /// absent. Format checks run on the trimmed values, email first.
    pub fn validate(self) -> Result<ValidatedForm, ValidationError> {
        let (Some(organization), Some(email), Some(phone), Some(address)) =
            (self.organization, self.email, self.phone, self.address)
        else {
            return Err(ValidationError::MissingFields);
        };
        if organization.is_empty() || email.is_empty() || phone.is_empty() || address.is_empty() {
            return Err(ValidationError::MissingFields);
        }

        if !is_valid_email(email.trim()) {
            return Err(ValidationError::InvalidEmail);
        }
        if !is_valid_phone(phone.trim()) {
            return Err(ValidationError::InvalidPhone);
        }

        let draft = CompanyDraft {
            organization: organization.trim().to_string(),
            email: normalize_email(&email),
            phone: phone.trim().to_string(),
            address: address.trim().to_string(),
            website: self.website.map(|value| value.trim().to_string()),
            industry: self.industry,
            logo: self.logo,
        };

        Ok(ValidatedForm {
            submitted_email: email,
            draft,
        })
    }
}

/// Canonical stored form of an email address: trimmed and lower-cased.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Checks the basic `local@domain.tld` shape: exactly one `@`, a non-empty
/// local part, and a domain with a non-empty label on each side of its last
/// dot. No whitespace anywhere.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Checks that a phone number is 8 to 15 ASCII digits with no other
/// characters at all.
pub fn is_valid_phone(value: &str) -> bool {
    (8..=15).contains(&value.len()) && value.bytes().all(|byte| byte.is_ascii_digit())
}
