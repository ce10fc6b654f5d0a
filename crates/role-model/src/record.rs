//! Applicant records: the loosely-typed request shape and the validated,
//! normalized form the encoders consume.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::normalize::{split_tokens, title_case};

/// One applicant's feature set after validation and normalization.
///
/// Categorical fields are title-cased, token sets are lower-cased, trimmed and
/// free of empty entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub degree: String,
    pub major: String,
    pub cgpa: f64,
    pub experience: u32,
    pub employed: String,
    pub industry_preference: String,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
}

impl ApplicantRecord {
    /// Builds a record from raw text fields, applying the shared normalization.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree: &str,
        major: &str,
        cgpa: f64,
        experience: u32,
        employed: &str,
        industry_preference: &str,
        skills: &str,
        certifications: &str,
    ) -> Self {
        Self {
            degree: title_case(degree),
            major: title_case(major),
            cgpa,
            experience,
            employed: title_case(employed),
            industry_preference: title_case(industry_preference),
            skills: split_tokens(skills),
            certifications: split_tokens(certifications),
        }
    }

    /// Comma-joined skills, as stored in prediction history.
    pub fn skills_text(&self) -> String {
        self.skills.join(", ")
    }

    pub fn certifications_text(&self) -> String {
        self.certifications.join(", ")
    }
}

/// A record paired with its job-role label, as read from the training set.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: ApplicantRecord,
    pub job_role: String,
}

/// Request-boundary shape: every field optional and loosely typed.
///
/// Text fields accept strings or numbers and default to empty. Numeric fields
/// accept JSON numbers or numeric strings and are required.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawApplicant {
    #[serde(default)]
    pub degree: Option<Value>,
    #[serde(default)]
    pub major: Option<Value>,
    #[serde(default)]
    pub cgpa: Option<Value>,
    #[serde(default)]
    pub experience: Option<Value>,
    #[serde(default)]
    pub employed: Option<Value>,
    #[serde(default)]
    pub industry_preference: Option<Value>,
    #[serde(default)]
    pub skills: Option<Value>,
    #[serde(default)]
    pub certifications: Option<Value>,
}

impl RawApplicant {
    /// Validates numeric fields and normalizes the rest.
    pub fn to_record(&self) -> Result<ApplicantRecord> {
        let cgpa = parse_cgpa(self.cgpa.as_ref())?;
        let experience = parse_experience(self.experience.as_ref())?;
        Ok(ApplicantRecord::new(
            &text_value(self.degree.as_ref()),
            &text_value(self.major.as_ref()),
            cgpa,
            experience,
            &text_value(self.employed.as_ref()),
            &text_value(self.industry_preference.as_ref()),
            &text_value(self.skills.as_ref()),
            &text_value(self.certifications.as_ref()),
        ))
    }
}

fn text_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn reject(field: &'static str, reason: String) -> ModelError {
    warn!(field, %reason, "rejecting malformed applicant field");
    ModelError::malformed(field, reason)
}

fn parse_cgpa(value: Option<&Value>) -> Result<f64> {
    const FIELD: &str = "cgpa";
    let parsed = match value {
        None | Some(Value::Null) => return Err(reject(FIELD, "value is missing".into())),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(reject(FIELD, "value is missing".into()))
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(reject(FIELD, format!("expected a number, got {other}"))),
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(reject(FIELD, format!("{v} is not a valid grade"))),
        None => Err(reject(FIELD, format!("'{}' is not a number", text_value(value)))),
    }
}

/// Largest accepted experience value; it must fit the history table's INTEGER column.
pub const MAX_EXPERIENCE: u32 = i32::MAX as u32;

/// Whole, non-negative years within [`MAX_EXPERIENCE`]. `2.0` is accepted as `2`.
pub fn whole_years(value: f64) -> Option<u32> {
    let in_range = value >= 0.0 && value <= f64::from(MAX_EXPERIENCE);
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as u32)
}

fn parse_experience(value: Option<&Value>) -> Result<u32> {
    const FIELD: &str = "experience";
    let parsed = match value {
        None | Some(Value::Null) => return Err(reject(FIELD, "value is missing".into())),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => u32::try_from(v).ok().filter(|v| *v <= MAX_EXPERIENCE),
            None => n.as_f64().and_then(whole_years),
        },
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(reject(FIELD, "value is missing".into()))
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(whole_years),
        Some(other) => return Err(reject(FIELD, format!("expected an integer, got {other}"))),
    };
    parsed.ok_or_else(|| {
        reject(
            FIELD,
            format!("'{}' is not a whole number of years", text_value(value)),
        )
    })
}
