//! Field-tagged validation errors.
//!
//! Every error names the [`Field`] it concerns. The builder never stops at the
//! first problem: all failures of a record are gathered into one
//! [`ValidationFailure`], so a caller sees the full picture in a single pass.
//!
//! | Error | Raised when |
//! |-------|-------------|
//! | [`EmptyRequiredField`](ValidationError::EmptyRequiredField) | identity or descriptive field missing or blank |
//! | [`InvalidIdentifierFormat`](ValidationError::InvalidIdentifierFormat) | `job_id` has characters other than ASCII letters, digits, `_` |
//! | [`RangeInverted`](ValidationError::RangeInverted) | min > max for salary or experience |
//! | [`InvalidEnumInput`](ValidationError::InvalidEnumInput) | unknown classification token, or a typed enum value |
//! | [`DescriptionCaseViolation`](ValidationError::DescriptionCaseViolation) | description does not start with an uppercase letter |
//! | [`WrongType`](ValidationError::WrongType) | value of the wrong shape (e.g. a list for `title`) |
//! | [`OutOfRange`](ValidationError::OutOfRange) | negative amount, or years outside `0..=50` |
//! | [`InvalidTimestamp`](ValidationError::InvalidTimestamp) | date that is neither RFC 3339 nor `YYYY-MM-DD` |
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Keys of the raw record, also used to tag errors and notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    JobId,
    Source,
    SourceUrl,
    Title,
    Company,
    Description,
    Location,
    Industry,
    JobType,
    Seniority,
    WorkArrangement,
    Salary,
    SalaryMin,
    SalaryMax,
    Currency,
    SalaryPeriod,
    SalaryNegotiable,
    Experience,
    ExperienceYears,
    Skills,
    Languages,
    Requirements,
    PostedDate,
    ScrapedAt,
    ExpiryDate,
    IsActive,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::JobId => "job_id",
            Field::Source => "source",
            Field::SourceUrl => "source_url",
            Field::Title => "title",
            Field::Company => "company",
            Field::Description => "description",
            Field::Location => "location",
            Field::Industry => "industry",
            Field::JobType => "job_type",
            Field::Seniority => "seniority",
            Field::WorkArrangement => "work_arrangement",
            Field::Salary => "salary",
            Field::SalaryMin => "salary_min",
            Field::SalaryMax => "salary_max",
            Field::Currency => "currency",
            Field::SalaryPeriod => "salary_period",
            Field::SalaryNegotiable => "salary_negotiable",
            Field::Experience => "experience",
            Field::ExperienceYears => "experience_years",
            Field::Skills => "skills",
            Field::Languages => "languages",
            Field::Requirements => "requirements",
            Field::PostedDate => "posted_date",
            Field::ScrapedAt => "scraped_at",
            Field::ExpiryDate => "expiry_date",
            Field::IsActive => "is_active",
        }
    }

    /// Alternative key accepted in raw records.
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Field::Salary => Some("salary_text"),
            Field::Experience => Some("experience_text"),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a classification value was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumRejection {
    UnknownToken(String),
    /// The value arrived as an enum member instead of a raw string token.
    TypedValue(String),
}

impl fmt::Display for EnumRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumRejection::UnknownToken(token) => write!(f, "unknown token {token:?}"),
            EnumRejection::TypedValue(value) => {
                write!(f, "typed value `{value}` where a raw string token is required")
            }
        }
    }
}

/// Discriminant of [`ValidationError`], convenient for assertions and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyRequiredField,
    InvalidIdentifierFormat,
    RangeInverted,
    InvalidEnumInput,
    DescriptionCaseViolation,
    WrongType,
    OutOfRange,
    InvalidTimestamp,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyRequiredField => "empty_required_field",
            ErrorKind::InvalidIdentifierFormat => "invalid_identifier_format",
            ErrorKind::RangeInverted => "range_inverted",
            ErrorKind::InvalidEnumInput => "invalid_enum_input",
            ErrorKind::DescriptionCaseViolation => "description_case_violation",
            ErrorKind::WrongType => "wrong_type",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// A single per-field validation failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("{field}: required field is empty")]
    EmptyRequiredField { field: Field },

    #[error("{field}: {value:?} must contain only ASCII letters, digits and underscores")]
    InvalidIdentifierFormat { field: Field, value: String },

    /// Minimum above maximum. Bounds are never swapped.
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    RangeInverted { field: Field, min: f64, max: f64 },

    #[error("{field}: {rejection}")]
    InvalidEnumInput {
        field: Field,
        rejection: EnumRejection,
    },

    #[error("{field}: must start with an uppercase letter")]
    DescriptionCaseViolation { field: Field },

    #[error("{field}: expected {expected}, found {found}")]
    WrongType {
        field: Field,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{field}: {value} is outside the accepted range {bounds}")]
    OutOfRange {
        field: Field,
        value: f64,
        bounds: &'static str,
    },

    #[error("{field}: {value:?} is neither an RFC 3339 timestamp nor a YYYY-MM-DD date")]
    InvalidTimestamp { field: Field, value: String },
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyRequiredField { field }
            | ValidationError::InvalidIdentifierFormat { field, .. }
            | ValidationError::RangeInverted { field, .. }
            | ValidationError::InvalidEnumInput { field, .. }
            | ValidationError::DescriptionCaseViolation { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidTimestamp { field, .. } => *field,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::EmptyRequiredField { .. } => ErrorKind::EmptyRequiredField,
            ValidationError::InvalidIdentifierFormat { .. } => ErrorKind::InvalidIdentifierFormat,
            ValidationError::RangeInverted { .. } => ErrorKind::RangeInverted,
            ValidationError::InvalidEnumInput { .. } => ErrorKind::InvalidEnumInput,
            ValidationError::DescriptionCaseViolation { .. } => ErrorKind::DescriptionCaseViolation,
            ValidationError::WrongType { .. } => ErrorKind::WrongType,
            ValidationError::OutOfRange { .. } => ErrorKind::OutOfRange,
            ValidationError::InvalidTimestamp { .. } => ErrorKind::InvalidTimestamp,
        }
    }
}

// Reports carry errors as flat `{field, kind, message}` objects.
impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 3)?;
        state.serialize_field("field", &self.field())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// All failures of one record. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// True when some error matches both `field` and `kind`.
    pub fn has(&self, field: Field, kind: ErrorKind) -> bool {
        self.errors
            .iter()
            .any(|error| error.field() == field && error.kind() == kind)
    }

    pub fn fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::with_capacity(self.errors.len());
        for error in &self.errors {
            if !fields.contains(&error.field()) {
                fields.push(error.field());
            }
        }
        fields
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record failed validation with {} error(s)", self.errors.len())?;
        for (index, error) in self.errors.iter().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Informational findings attached to an accepted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Text was supplied but no rule recognized it. The text is kept.
    UnparseableButPresent { field: Field },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnparseableButPresent { field } => {
                write!(f, "{field}: text present but not recognized")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_expose_field_and_kind() {
        let err = ValidationError::InvalidIdentifierFormat {
            field: Field::JobId,
            value: "bad-id".into(),
        };
        assert_eq!(err.field(), Field::JobId);
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifierFormat);
        assert!(err.to_string().starts_with("job_id:"));
    }

    #[test]
    fn errors_serialize_flat() {
        let err = ValidationError::DescriptionCaseViolation {
            field: Field::Description,
        };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["field"], "description");
        assert_eq!(json["kind"], "description_case_violation");
        assert_eq!(json["message"], "description: must start with an uppercase letter");
    }

    #[test]
    fn failure_lists_distinct_fields_in_order() {
        let failure = ValidationFailure::new(vec![
            ValidationError::EmptyRequiredField { field: Field::Title },
            ValidationError::OutOfRange {
                field: Field::SalaryMin,
                value: -1.0,
                bounds: ">= 0",
            },
            ValidationError::EmptyRequiredField { field: Field::Title },
        ]);
        assert_eq!(failure.fields(), vec![Field::Title, Field::SalaryMin]);
        assert!(failure.has(Field::SalaryMin, ErrorKind::OutOfRange));
        assert!(!failure.has(Field::Title, ErrorKind::OutOfRange));
        assert!(failure.to_string().contains("3 error(s)"));
    }

    #[test]
    fn field_names_match_serde_names() {
        let json = serde_json::to_value(Field::SourceUrl).expect("serialize");
        assert_eq!(json, Field::SourceUrl.as_str());
        assert_eq!(Field::Salary.alias(), Some("salary_text"));
    }
}
