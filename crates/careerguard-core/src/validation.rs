//! Form validation for the TrustApply scanner and the negotiation drafter.
//!
//! Validators are pure: presence, length and format checks on the raw form
//! payload, run before anything is sanitized or sent anywhere. Fields are
//! optional at the type level so a half-filled form still deserializes and
//! gets a field-specific error instead of a parse failure.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.-]+(?::\d+)?(?:[/?#]\S*)?$").expect("valid url pattern")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email pattern")
});

static CURRENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency pattern"));

/// Job posting submitted to the authenticity scanner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanInput {
    /// Advertised role.
    pub job_title: Option<String>,
    /// Hiring company as advertised.
    pub company_name: Option<String>,
    /// Full posting text.
    pub job_description: Option<String>,
    /// Where the posting was found.
    pub job_url: Option<String>,
    /// Contact address given by the recruiter.
    pub recruiter_email: Option<String>,
}

/// Offer details submitted to the negotiation email drafter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationInput {
    /// Role being negotiated.
    pub job_title: Option<String>,
    /// Company making the offer.
    pub company_name: Option<String>,
    /// Base salary offered.
    pub current_offer: Option<f64>,
    /// Base salary the candidate wants.
    pub target_salary: Option<f64>,
    /// ISO 4217 code, e.g. `USD`.
    pub currency: Option<String>,
    /// Free-text case for the raise.
    pub justification: Option<String>,
}

/// Why a form failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field is shorter than allowed.
    #[error("{field} must be at least {min} characters")]
    TooShort {
        /// Field name
        field: &'static str,
        /// Minimum length in characters
        min: usize,
    },

    /// A field is longer than allowed.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum length in characters
        max: usize,
    },

    /// A field does not have the expected shape.
    #[error("{field} must be {expected}")]
    InvalidFormat {
        /// Field name
        field: &'static str,
        /// What was expected
        expected: &'static str,
    },

    /// A numeric field is zero, negative or not a number.
    #[error("{0} must be a positive amount")]
    NotPositive(&'static str),

    /// The target salary is below the current offer.
    #[error("target_salary must not be lower than current_offer")]
    TargetBelowOffer,
}

/// `{success, error}` shape returned to form handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the input passed.
    pub success: bool,
    /// Human-readable reason when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), ValidationError>> for Validation {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn bounded(value: &str, field: &'static str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn positive(value: Option<f64>, field: &'static str) -> Result<f64, ValidationError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ValidationError::NotPositive(field)),
    }
}

/// Validate a job posting before it is scanned.
///
/// # Errors
///
/// The first failing rule, checked in field order:
/// - `job_title`: required, at most 200 characters
/// - `company_name`: required, at most 100 characters
/// - `job_description`: required, 50 to 10,000 characters
/// - `job_url`: if present, an `http(s)://` URL
/// - `recruiter_email`: if present, an email address
pub fn validate_scan_input(input: &ScanInput) -> Result<(), ValidationError> {
    let title = required(&input.job_title, "job_title")?;
    bounded(title, "job_title", 1, 200)?;

    let company = required(&input.company_name, "company_name")?;
    bounded(company, "company_name", 1, 100)?;

    let description = required(&input.job_description, "job_description")?;
    bounded(description, "job_description", 50, 10_000)?;

    if let Some(url) = optional(&input.job_url) {
        if !URL_PATTERN.is_match(url) {
            return Err(ValidationError::InvalidFormat {
                field: "job_url",
                expected: "an http(s) URL",
            });
        }
    }

    if let Some(email) = optional(&input.recruiter_email) {
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ValidationError::InvalidFormat {
                field: "recruiter_email",
                expected: "an email address",
            });
        }
    }

    Ok(())
}

/// Validate offer details before a negotiation email is drafted.
///
/// # Errors
///
/// The first failing rule, checked in field order:
/// - `job_title`, `company_name`: required, at most 200/100 characters
/// - `current_offer`, `target_salary`: positive amounts
/// - `target_salary` not below `current_offer`
/// - `currency`: if present, three uppercase letters
/// - `justification`: if present, at most 2,000 characters
pub fn validate_negotiation_input(input: &NegotiationInput) -> Result<(), ValidationError> {
    let title = required(&input.job_title, "job_title")?;
    bounded(title, "job_title", 1, 200)?;

    let company = required(&input.company_name, "company_name")?;
    bounded(company, "company_name", 1, 100)?;

    let offer = positive(input.current_offer, "current_offer")?;
    let target = positive(input.target_salary, "target_salary")?;
    if target < offer {
        return Err(ValidationError::TargetBelowOffer);
    }

    if let Some(currency) = optional(&input.currency) {
        if !CURRENCY_PATTERN.is_match(currency) {
            return Err(ValidationError::InvalidFormat {
                field: "currency",
                expected: "a three-letter currency code",
            });
        }
    }

    if let Some(justification) = optional(&input.justification) {
        bounded(justification, "justification", 0, 2_000)?;
    }

    Ok(())
}
