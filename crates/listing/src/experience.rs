//! Experience parsing: year ranges from free text, seniority hints and a
//! numeric `experience_years` field.
use rules::RuleSet;

use crate::error::{Field, ValidationError};
use crate::sanitize::collapse_whitespace;
use crate::types::{ExperienceRequirement, Parsed};

pub const MAX_YEARS: u8 = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceInput<'a> {
    pub text: Option<&'a str>,
    pub years: Option<f64>,
}

pub struct ExperienceParser<'r> {
    rules: &'r RuleSet,
}

impl<'r> ExperienceParser<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Parses text alone: patterns first, then the years hint of any
    /// seniority level named in the text.
    pub fn parse_text(
        &self,
        text: &str,
    ) -> Result<Parsed<ExperienceRequirement>, Vec<ValidationError>> {
        let text = collapse_whitespace(text);
        let (min, max, recognized) = if let Some(found) = self.rules.match_experience(&text) {
            (found.min, found.max, true)
        } else if let Some(hint) = self
            .rules
            .detect_seniority(&text)
            .and_then(|level| self.rules.seniority_years(level))
        {
            (hint.min.map(f64::from), hint.max.map(f64::from), true)
        } else {
            (None, None, false)
        };

        let mut errors = Vec::new();
        let min_years =
            min.and_then(|value| collect(to_years(value, Field::Experience), &mut errors));
        let max_years =
            max.and_then(|value| collect(to_years(value, Field::Experience), &mut errors));
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Parsed {
            value: ExperienceRequirement {
                min_years,
                max_years,
                original_text: Some(text),
            },
            recognized,
        })
    }

    /// Returns `Ok(None)` when neither text nor years were supplied.
    pub fn parse(
        &self,
        input: &ExperienceInput<'_>,
    ) -> Result<Option<Parsed<ExperienceRequirement>>, Vec<ValidationError>> {
        let years = match input.years {
            Some(value) => Some(to_years(value, Field::ExperienceYears).map_err(|err| vec![err])?),
            None => None,
        };

        let text = input.text.filter(|text| !text.trim().is_empty());
        let mut parsed = match (text, years) {
            (Some(text), _) => self.parse_text(text)?,
            (None, Some(_)) => Parsed {
                value: ExperienceRequirement::default(),
                recognized: true,
            },
            (None, None) => return Ok(None),
        };

        let experience = &mut parsed.value;
        if experience.min_years.is_none() {
            experience.min_years = years;
        }
        if let (Some(min), Some(max)) = (experience.min_years, experience.max_years) {
            if min > max {
                return Err(vec![ValidationError::RangeInverted {
                    field: Field::Experience,
                    min: f64::from(min),
                    max: f64::from(max),
                }]);
            }
        }
        Ok(Some(parsed))
    }
}

/// Whole years in `0..=50`; fractions are truncated.
fn to_years(value: f64, field: Field) -> Result<u8, ValidationError> {
    if !(0.0..=f64::from(MAX_YEARS)).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            bounds: "0..=50",
        });
    }
    Ok(value.trunc() as u8)
}

fn collect<T>(result: Result<T, ValidationError>, errors: &mut Vec<ValidationError>) -> Option<T> {
    result.map_err(|err| errors.push(err)).ok()
}
