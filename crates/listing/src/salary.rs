//! Salary parsing.
//!
//! Free text is tried first against the rule set's ordered range patterns.
//! When the text is unrecognized the structured amounts fill in, and the text
//! is still kept as `original_text`. Structured amounts without any text are
//! rendered into a synthetic `original_text` so every salary can be audited.
use rules::RuleSet;

use crate::error::{Field, ValidationError};
use crate::sanitize::collapse_whitespace;
use crate::types::{Parsed, SalaryInfo};

/// Salary-related inputs of one record, already type-checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalaryInput<'a> {
    pub text: Option<&'a str>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<&'a str>,
    pub period: Option<&'a str>,
    pub negotiable: bool,
}

pub struct SalaryParser<'r> {
    rules: &'r RuleSet,
}

impl<'r> SalaryParser<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Parses text alone. Unrecognized text yields a salary with no amounts.
    pub fn parse_text(&self, text: &str) -> Parsed<SalaryInfo> {
        let text = collapse_whitespace(text);
        let found = self.rules.match_salary(&text);
        let recognized = found.is_some();
        let (min_amount, max_amount, currency) = match found {
            Some(found) => (found.min, found.max, found.currency),
            None => (None, None, self.rules.detect_currency(&text).map(str::to_string)),
        };
        Parsed {
            value: SalaryInfo {
                min_amount,
                max_amount,
                currency,
                period: self.rules.detect_period(&text).map(str::to_string),
                is_negotiable: self.rules.is_negotiable(&text),
                original_text: Some(text),
            },
            recognized,
        }
    }

    /// Builds a salary from structured amounts only.
    pub fn from_amounts(
        &self,
        min: Option<f64>,
        max: Option<f64>,
        currency: Option<&str>,
    ) -> SalaryInfo {
        let currency = currency.and_then(|code| self.canonical_currency(code));
        SalaryInfo {
            min_amount: min,
            max_amount: max,
            original_text: Some(render_amounts(min, max, currency.as_deref())),
            currency,
            period: None,
            is_negotiable: false,
        }
    }

    /// Combines text and structured inputs into one salary.
    ///
    /// Returns `Ok(None)` when the record carries neither salary text nor
    /// amounts. Negative amounts and inverted ranges are errors.
    pub fn parse(
        &self,
        input: &SalaryInput<'_>,
    ) -> Result<Option<Parsed<SalaryInfo>>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        for (field, amount) in [(Field::SalaryMin, input.min), (Field::SalaryMax, input.max)] {
            if let Some(value) = amount.filter(|value| *value < 0.0) {
                errors.push(ValidationError::OutOfRange {
                    field,
                    value,
                    bounds: ">= 0",
                });
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let text = input
            .text
            .map(collapse_whitespace)
            .filter(|text| !text.is_empty());
        let has_amounts = input.min.is_some() || input.max.is_some();

        let mut parsed = match text {
            Some(text) => {
                let mut parsed = self.parse_text(&text);
                if !parsed.recognized && has_amounts {
                    parsed.value.min_amount = input.min;
                    parsed.value.max_amount = input.max;
                }
                parsed
            }
            None if has_amounts => Parsed {
                value: self.from_amounts(input.min, input.max, input.currency),
                recognized: true,
            },
            None => return Ok(None),
        };

        let salary = &mut parsed.value;
        if salary.currency.is_none() {
            salary.currency = input.currency.and_then(|code| self.canonical_currency(code));
        }
        if salary.period.is_none() {
            salary.period = input
                .period
                .map(collapse_whitespace)
                .filter(|period| !period.is_empty());
        }
        salary.is_negotiable |= input.negotiable;

        if let (Some(min), Some(max)) = (salary.min_amount, salary.max_amount) {
            if min > max {
                return Err(vec![ValidationError::RangeInverted {
                    field: Field::Salary,
                    min,
                    max,
                }]);
            }
        }
        Ok(Some(parsed))
    }

    fn canonical_currency(&self, code: &str) -> Option<String> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(
            self.rules
                .resolve_currency(trimmed)
                .map_or_else(|| trimmed.to_uppercase(), str::to_string),
        )
    }
}

fn render_amounts(min: Option<f64>, max: Option<f64>, currency: Option<&str>) -> String {
    let amounts = match (min, max) {
        (Some(min), Some(max)) => format!("{min} - {max}"),
        (Some(min), None) => format!("from {min}"),
        (None, Some(max)) => format!("up to {max}"),
        (None, None) => String::new(),
    };
    match currency {
        Some(code) => format!("{amounts} {code}"),
        None => amounts,
    }
}
