//! Classification of job type and seniority tokens into closed enums.
//!
//! Only raw string tokens are accepted. A value that is already a typed enum
//! member is refused with [`EnumRejection::TypedValue`]: untrusted input must
//! go through token normalization like everything else.
use rules::RuleSet;

use crate::error::{EnumRejection, Field, ValidationError};
use crate::raw::RawValue;
use crate::types::{JobType, SeniorityLevel};

/// Lower-cases and joins words with `_`: `"Full-Time"` becomes `"full_time"`.
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut token = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = !token.is_empty();
            continue;
        }
        if pending_separator {
            token.push('_');
            pending_separator = false;
        }
        token.push(ch);
    }
    token
}

/// Extracts a classification token. `Ok(None)` for null or blank values.
fn token_of(value: &RawValue, field: Field) -> Result<Option<&str>, ValidationError> {
    match value {
        RawValue::Null => Ok(None),
        RawValue::Text(text) if text.trim().is_empty() => Ok(None),
        RawValue::Text(text) => Ok(Some(text)),
        RawValue::Typed(token) => Err(ValidationError::InvalidEnumInput {
            field,
            rejection: EnumRejection::TypedValue(token.to_string()),
        }),
        other => Err(ValidationError::WrongType {
            field,
            expected: "string token",
            found: other.kind_name(),
        }),
    }
}

pub fn classify_job_type(value: Option<&RawValue>) -> Result<Option<JobType>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let Some(text) = token_of(raw, Field::JobType)? else {
        return Ok(None);
    };
    JobType::from_token(&normalize_token(text))
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidEnumInput {
            field: Field::JobType,
            rejection: EnumRejection::UnknownToken(text.trim().to_string()),
        })
}

/// Classifies an explicit seniority token, retrying unknown tokens through
/// the rule set's keyword groups. Without a token the title is scanned.
pub fn classify_seniority(
    value: Option<&RawValue>,
    title: Option<&str>,
    rules: &RuleSet,
) -> Result<Option<SeniorityLevel>, ValidationError> {
    let explicit = match value {
        Some(raw) => token_of(raw, Field::Seniority)?,
        None => None,
    };

    match explicit {
        Some(text) => SeniorityLevel::from_token(&normalize_token(text))
            .or_else(|| detect_level(text, rules))
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidEnumInput {
                field: Field::Seniority,
                rejection: EnumRejection::UnknownToken(text.trim().to_string()),
            }),
        None => Ok(title.and_then(|title| detect_level(title, rules))),
    }
}

fn detect_level(text: &str, rules: &RuleSet) -> Option<SeniorityLevel> {
    rules
        .detect_seniority(text)
        .and_then(|level| SeniorityLevel::from_token(&normalize_token(level)))
}
