//! Untyped raw records as produced by site extractors.
//!
//! A [`RawRecord`] is an ordered string-keyed map of [`RawValue`]s. It
//! deserializes from any JSON or YAML object; unknown keys are carried along
//! and ignored by the builder.
use std::fmt;

use rules::OrderedTable;
use serde::{Deserialize, Serialize};

use crate::error::Field;
use crate::types::{JobListing, JobType, SeniorityLevel};

/// A classification value that is already an enum member.
///
/// Only produced programmatically. The builder rejects it: classification
/// fields accept raw string tokens from untrusted input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedToken {
    JobType(JobType),
    Seniority(SeniorityLevel),
}

impl fmt::Display for TypedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedToken::JobType(value) => write!(f, "JobType::{value}"),
            TypedToken::Seniority(value) => write!(f, "SeniorityLevel::{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<RawValue>),
    Typed(TypedToken),
}

impl RawValue {
    /// Human name of the variant, used in `WrongType` errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "string",
            RawValue::List(_) => "list",
            RawValue::Typed(_) => "typed enum value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(flag) => RawValue::Bool(flag),
            Value::Number(number) => number.as_f64().map_or(RawValue::Null, RawValue::Number),
            Value::String(text) => RawValue::Text(text),
            Value::Array(items) => RawValue::List(items.into_iter().map(RawValue::from).collect()),
            // Nested objects carry nothing the builder reads.
            Value::Object(map) => RawValue::Text(Value::Object(map).to_string()),
        }
    }
}

impl From<RawValue> for serde_json::Value {
    fn from(value: RawValue) -> Self {
        use serde_json::Value;
        match value {
            RawValue::Null => Value::Null,
            RawValue::Bool(flag) => Value::Bool(flag),
            RawValue::Number(number) => number_to_json(number),
            RawValue::Text(text) => Value::String(text),
            RawValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            RawValue::Typed(token) => Value::String(match token {
                TypedToken::JobType(value) => value.as_str().to_string(),
                TypedToken::Seniority(value) => value.as_str().to_string(),
            }),
        }
    }
}

fn number_to_json(number: f64) -> serde_json::Value {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        serde_json::Value::from(number as i64)
    } else {
        serde_json::Number::from_f64(number)
            .map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(f64::from(value))
    }
}

impl From<JobType> for RawValue {
    fn from(value: JobType) -> Self {
        RawValue::Typed(TypedToken::JobType(value))
    }
}

impl From<SeniorityLevel> for RawValue {
    fn from(value: SeniorityLevel) -> Self {
        RawValue::Typed(TypedToken::Seniority(value))
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(values: Vec<T>) -> Self {
        RawValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// One scraped record before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: OrderedTable<RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Value under the canonical key, falling back to its alias.
    pub fn field(&self, field: Field) -> Option<&RawValue> {
        self.fields
            .get(field.as_str())
            .or_else(|| field.alias().and_then(|alias| self.fields.get(alias)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed `job_id` text, when the record has a usable one.
    pub fn job_id_hint(&self) -> Option<&str> {
        self.field(Field::JobId)
            .and_then(RawValue::as_text)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Renders a listing back into raw form. Building the result again yields
/// an equal listing.
impl From<&JobListing> for RawRecord {
    fn from(listing: &JobListing) -> Self {
        let mut record = RawRecord::new()
            .with(Field::JobId.as_str(), listing.job_id.as_str())
            .with(Field::Source.as_str(), listing.source.as_str())
            .with(Field::SourceUrl.as_str(), listing.source_url.as_str())
            .with(Field::Title.as_str(), listing.title.as_str())
            .with(Field::Company.as_str(), listing.company.as_str())
            .with(Field::Description.as_str(), listing.description.as_str())
            .with(Field::Location.as_str(), listing.location.clone())
            .with(Field::Industry.as_str(), listing.industry.clone())
            .with(
                Field::JobType.as_str(),
                listing.job_type.map(|value| value.as_str()),
            )
            .with(
                Field::Seniority.as_str(),
                listing.seniority.map(|value| value.as_str()),
            )
            .with(
                Field::WorkArrangement.as_str(),
                listing.work_arrangement.clone(),
            )
            .with(Field::Skills.as_str(), listing.skills.clone())
            .with(Field::Languages.as_str(), listing.languages.clone())
            .with(Field::Requirements.as_str(), listing.requirements.clone())
            .with(
                Field::PostedDate.as_str(),
                listing.posted_date.map(|date| date.to_rfc3339()),
            )
            .with(Field::ScrapedAt.as_str(), listing.scraped_at.to_rfc3339())
            .with(
                Field::ExpiryDate.as_str(),
                listing.expiry_date.map(|date| date.to_rfc3339()),
            )
            .with(Field::IsActive.as_str(), listing.is_active);

        if let Some(salary) = &listing.salary {
            record.insert(Field::Salary.as_str(), salary.original_text.clone());
            record.insert(Field::SalaryMin.as_str(), salary.min_amount);
            record.insert(Field::SalaryMax.as_str(), salary.max_amount);
            record.insert(Field::Currency.as_str(), salary.currency.clone());
            record.insert(Field::SalaryPeriod.as_str(), salary.period.clone());
            record.insert(Field::SalaryNegotiable.as_str(), salary.is_negotiable);
        }
        if let Some(experience) = &listing.experience {
            record.insert(Field::Experience.as_str(), experience.original_text.clone());
            record.insert(
                Field::ExperienceYears.as_str(),
                experience.min_years.map(i32::from),
            );
        }
        record
    }
}
