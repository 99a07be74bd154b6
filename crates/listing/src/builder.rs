//! Construction of validated [`JobListing`]s from raw records.
//!
//! # Pipeline
//!
//! ```text
//! RawRecord
//!    │
//!    ├─ 1. text fields      clean, collapse, required checks, job_id shape,
//!    │                      description case gate
//!    ├─ 2. classification   job_type / seniority tokens (typed values refused)
//!    ├─ 3. sub-parsers      SalaryParser, ExperienceParser (RuleSet driven)
//!    ├─ 4. lists & dates    dedupe skills/languages/requirements, timestamps
//!    └─ 5. derivation       is_remote, has_salary_info, is_active
//!    │
//!    ▼
//! JobListing  or  ValidationFailure (every field error, in field order)
//! ```
//!
//! The builder performs no I/O and does not log. Each step records its
//! failures and the next step still runs, so one pass reports everything
//! that is wrong with a record.
use chrono::{DateTime, NaiveDate, Utc};
use rules::RuleSet;

use crate::classify::{classify_job_type, classify_seniority};
use crate::error::{Field, Notice, ValidationError, ValidationFailure};
use crate::experience::{ExperienceInput, ExperienceParser};
use crate::raw::{RawRecord, RawValue};
use crate::salary::{SalaryInput, SalaryParser};
use crate::sanitize::{clean_text, collapse_whitespace, dedupe_preserve_order};
use crate::types::{JobListing, Parsed};

/// A successfully built listing together with informational notices.
#[derive(Debug, Clone, PartialEq)]
pub struct Built {
    pub listing: JobListing,
    pub notices: Vec<Notice>,
}

/// Builds listings against one shared, read-only [`RuleSet`].
///
/// The builder is `Sync`; a single instance can serve every worker of a
/// parallel batch.
///
/// ```rust
/// use listing::{JobListingBuilder, RawRecord};
/// use rules::RuleSet;
///
/// let rules = RuleSet::standard();
/// let builder = JobListingBuilder::new(&rules);
/// let raw = RawRecord::new()
///     .with("job_id", "wuzzuf_12345")
///     .with("source", "wuzzuf")
///     .with("source_url", "https://wuzzuf.net/jobs/p/12345")
///     .with("title", "  Software   Engineer ")
///     .with("company", "Acme")
///     .with("description", "Build things.")
///     .with("salary", "15,000 - 20,000 EGP per month");
///
/// let listing = builder.build(&raw).expect("valid listing");
/// assert_eq!(listing.title, "Software Engineer");
/// assert!(listing.has_salary_info);
/// ```
#[derive(Debug, Clone)]
pub struct JobListingBuilder<'r> {
    rules: &'r RuleSet,
    now: DateTime<Utc>,
}

impl<'r> JobListingBuilder<'r> {
    /// Creates a builder whose clock is fixed at the current instant.
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            now: Utc::now(),
        }
    }

    /// Replaces the clock used as the default `scraped_at`.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn build(&self, raw: &RawRecord) -> Result<JobListing, ValidationFailure> {
        self.build_with_notices(raw).map(|built| built.listing)
    }

    pub fn build_with_notices(&self, raw: &RawRecord) -> Result<Built, ValidationFailure> {
        let mut errors = Vec::new();
        let mut notices = Vec::new();

        // 1. Text fields.
        let job_id = required_text(raw, Field::JobId, &mut errors);
        if let Some(id) = &job_id {
            if !is_canonical_identifier(id) {
                errors.push(ValidationError::InvalidIdentifierFormat {
                    field: Field::JobId,
                    value: id.clone(),
                });
            }
        }
        let source = required_text(raw, Field::Source, &mut errors);
        let source_url = required_text(raw, Field::SourceUrl, &mut errors);
        let title = required_text(raw, Field::Title, &mut errors);
        let company = required_text(raw, Field::Company, &mut errors);
        let description = required_text(raw, Field::Description, &mut errors);
        if let Some(text) = &description {
            if !text.chars().next().is_some_and(char::is_uppercase) {
                errors.push(ValidationError::DescriptionCaseViolation {
                    field: Field::Description,
                });
            }
        }
        let location = optional_text(raw, Field::Location, &mut errors);
        let industry = optional_text(raw, Field::Industry, &mut errors);
        let work_arrangement = optional_text(raw, Field::WorkArrangement, &mut errors);

        // 2. Classification.
        let job_type = record(classify_job_type(raw.field(Field::JobType)), &mut errors).flatten();
        let seniority = record(
            classify_seniority(raw.field(Field::Seniority), title.as_deref(), self.rules),
            &mut errors,
        )
        .flatten();

        // 3. Sub-parsers.
        let salary_text = optional_text(raw, Field::Salary, &mut errors);
        let min = optional_number(raw, Field::SalaryMin, &mut errors);
        let max = optional_number(raw, Field::SalaryMax, &mut errors);
        let currency = optional_text(raw, Field::Currency, &mut errors);
        let period = optional_text(raw, Field::SalaryPeriod, &mut errors);
        let negotiable = optional_bool(raw, Field::SalaryNegotiable, &mut errors);
        let salary_input = SalaryInput {
            text: salary_text.as_deref(),
            min,
            max,
            currency: currency.as_deref(),
            period: period.as_deref(),
            negotiable: negotiable.unwrap_or(false),
        };
        let salary = record_all(
            SalaryParser::new(self.rules).parse(&salary_input),
            &mut errors,
        )
        .flatten()
        .map(|parsed| note(parsed, Field::Salary, &mut notices));

        let experience_text = optional_text(raw, Field::Experience, &mut errors);
        let experience_input = ExperienceInput {
            text: experience_text.as_deref(),
            years: optional_number(raw, Field::ExperienceYears, &mut errors),
        };
        let experience = record_all(
            ExperienceParser::new(self.rules).parse(&experience_input),
            &mut errors,
        )
        .flatten()
        .map(|parsed| note(parsed, Field::Experience, &mut notices));

        // 4. Lists and dates.
        let skills = list(raw, Field::Skills, &mut errors);
        let languages = list(raw, Field::Languages, &mut errors);
        let requirements = list(raw, Field::Requirements, &mut errors);

        let posted_date = timestamp(raw, Field::PostedDate, &mut errors);
        let scraped_at = timestamp(raw, Field::ScrapedAt, &mut errors).unwrap_or(self.now);
        let expiry_date = timestamp(raw, Field::ExpiryDate, &mut errors);
        let active_flag = optional_bool(raw, Field::IsActive, &mut errors).unwrap_or(true);

        let (
            Some(job_id),
            Some(source),
            Some(source_url),
            Some(title),
            Some(company),
            Some(description),
        ) = (job_id, source, source_url, title, company, description)
        else {
            return Err(ValidationFailure::new(errors));
        };
        if !errors.is_empty() {
            return Err(ValidationFailure::new(errors));
        }

        // 5. Derivation.
        let is_remote = work_arrangement
            .as_deref()
            .is_some_and(|arrangement| arrangement.eq_ignore_ascii_case("remote"));
        let has_salary_info = salary.as_ref().is_some_and(|salary| salary.has_amount());
        let expired = expiry_date.is_some_and(|expiry| expiry < scraped_at);

        Ok(Built {
            listing: JobListing {
                job_id,
                source,
                source_url,
                title,
                company,
                description,
                location,
                industry,
                job_type,
                seniority,
                work_arrangement,
                salary,
                skills,
                languages,
                requirements,
                experience,
                posted_date,
                scraped_at,
                expiry_date,
                is_remote,
                has_salary_info,
                is_active: active_flag && !expired,
            },
            notices,
        })
    }
}

/// ASCII letters, digits and underscores, e.g. `wuzzuf_12345`.
pub fn is_canonical_identifier(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Parses RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn record<T>(result: Result<T, ValidationError>, errors: &mut Vec<ValidationError>) -> Option<T> {
    result.map_err(|err| errors.push(err)).ok()
}

fn record_all<T>(
    result: Result<T, Vec<ValidationError>>,
    errors: &mut Vec<ValidationError>,
) -> Option<T> {
    result.map_err(|mut errs| errors.append(&mut errs)).ok()
}

fn note<T>(parsed: Parsed<T>, field: Field, notices: &mut Vec<Notice>) -> T {
    if !parsed.recognized {
        notices.push(Notice::UnparseableButPresent { field });
    }
    parsed.value
}

/// Text of a field: numbers are stringified, blank text is absent.
fn text_value(value: &RawValue, field: Field) -> Result<Option<String>, ValidationError> {
    let text = match value {
        RawValue::Null => return Ok(None),
        // Identifiers keep control characters so the format check sees them.
        RawValue::Text(text) if field == Field::JobId => collapse_whitespace(text),
        RawValue::Text(text) => clean_text(text),
        RawValue::Number(number) => number.to_string(),
        other => {
            return Err(ValidationError::WrongType {
                field,
                expected: "string",
                found: other.kind_name(),
            });
        }
    };
    Ok(Some(text).filter(|text| !text.is_empty()))
}

fn optional_text(
    raw: &RawRecord,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let value = raw.field(field)?;
    record(text_value(value, field), errors).flatten()
}

fn required_text(
    raw: &RawRecord,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match raw.field(field).map(|value| text_value(value, field)) {
        Some(Ok(Some(text))) => Some(text),
        Some(Err(err)) => {
            errors.push(err);
            None
        }
        Some(Ok(None)) | None => {
            errors.push(ValidationError::EmptyRequiredField { field });
            None
        }
    }
}

fn optional_number(
    raw: &RawRecord,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<f64> {
    let parsed = match raw.field(field)? {
        RawValue::Null => return None,
        RawValue::Number(number) => Ok(*number),
        RawValue::Text(text) if text.trim().is_empty() => return None,
        RawValue::Text(text) => rules::parse_amount(text).ok_or(ValidationError::WrongType {
            field,
            expected: "number",
            found: "non-numeric string",
        }),
        other => Err(ValidationError::WrongType {
            field,
            expected: "number",
            found: other.kind_name(),
        }),
    };
    record(parsed, errors)
}

fn optional_bool(
    raw: &RawRecord,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<bool> {
    let parsed = match raw.field(field)? {
        RawValue::Null => return None,
        RawValue::Bool(flag) => Ok(*flag),
        RawValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(ValidationError::WrongType {
                field,
                expected: "boolean",
                found: "string",
            }),
        },
        other => Err(ValidationError::WrongType {
            field,
            expected: "boolean",
            found: other.kind_name(),
        }),
    };
    record(parsed, errors)
}

/// List fields accept a list of strings or one comma-separated string.
fn list(raw: &RawRecord, field: Field, errors: &mut Vec<ValidationError>) -> Vec<String> {
    match raw.field(field) {
        None | Some(RawValue::Null) => Vec::new(),
        Some(RawValue::Text(text)) => dedupe_preserve_order(text.split(',')),
        Some(RawValue::List(items)) => {
            let mut texts = Vec::with_capacity(items.len());
            for item in items {
                match text_value(item, field) {
                    Ok(Some(text)) => texts.push(text),
                    Ok(None) => {}
                    Err(err) => {
                        errors.push(err);
                        return Vec::new();
                    }
                }
            }
            dedupe_preserve_order(texts)
        }
        Some(other) => {
            errors.push(ValidationError::WrongType {
                field,
                expected: "list of strings",
                found: other.kind_name(),
            });
            Vec::new()
        }
    }
}

fn timestamp(
    raw: &RawRecord,
    field: Field,
    errors: &mut Vec<ValidationError>,
) -> Option<DateTime<Utc>> {
    match raw.field(field)? {
        RawValue::Null => None,
        RawValue::Text(text) if text.trim().is_empty() => None,
        RawValue::Text(text) => {
            let parsed = parse_timestamp(text);
            if parsed.is_none() {
                errors.push(ValidationError::InvalidTimestamp {
                    field,
                    value: text.trim().to_string(),
                });
            }
            parsed
        }
        other => {
            errors.push(ValidationError::WrongType {
                field,
                expected: "timestamp string",
                found: other.kind_name(),
            });
            None
        }
    }
}
