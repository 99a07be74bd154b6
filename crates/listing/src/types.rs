//! Canonical data model for normalized job listings.
//!
//! ```text
//! RawRecord (untyped map)
//!
//!         ↓ JobListingBuilder::build()
//!
//! JobListing
//! ├── job_id / source / source_url      identity, non-empty
//! ├── title / company / description     whitespace collapsed
//! ├── job_type / seniority              closed enums
//! ├── salary: Option<SalaryInfo>
//! ├── experience: Option<ExperienceRequirement>
//! ├── skills / languages / requirements ordered, deduplicated
//! ├── posted_date / scraped_at / expiry_date
//! └── is_remote / has_salary_info / is_active (derived)
//! ```
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::to_slug;

/// Employment type of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
    Temporary,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Internship,
        JobType::Freelance,
        JobType::Temporary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Freelance => "freelance",
            JobType::Temporary => "temporary",
        }
    }

    /// Matches an already normalized token (see
    /// [`normalize_token`](crate::normalize_token)) against names and aliases.
    pub fn from_token(token: &str) -> Option<Self> {
        let job_type = match token {
            "full_time" | "fulltime" | "permanent" => JobType::FullTime,
            "part_time" | "parttime" => JobType::PartTime,
            "contract" | "contractor" => JobType::Contract,
            "internship" | "intern" => JobType::Internship,
            "freelance" | "freelancer" => JobType::Freelance,
            "temporary" | "temp" => JobType::Temporary,
            _ => return None,
        };
        Some(job_type)
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seniority of the advertised role, from most junior to most senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Manager,
    Director,
    Executive,
}

impl SeniorityLevel {
    pub const ALL: [SeniorityLevel; 8] = [
        SeniorityLevel::Entry,
        SeniorityLevel::Junior,
        SeniorityLevel::Mid,
        SeniorityLevel::Senior,
        SeniorityLevel::Lead,
        SeniorityLevel::Manager,
        SeniorityLevel::Director,
        SeniorityLevel::Executive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SeniorityLevel::Entry => "entry",
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Mid => "mid",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Lead => "lead",
            SeniorityLevel::Manager => "manager",
            SeniorityLevel::Director => "director",
            SeniorityLevel::Executive => "executive",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let level = match token {
            "entry" | "entry_level" => SeniorityLevel::Entry,
            "junior" | "jr" => SeniorityLevel::Junior,
            "mid" | "mid_level" | "intermediate" => SeniorityLevel::Mid,
            "senior" | "sr" => SeniorityLevel::Senior,
            "lead" | "team_lead" | "tech_lead" => SeniorityLevel::Lead,
            "manager" => SeniorityLevel::Manager,
            "director" => SeniorityLevel::Director,
            "executive" | "c_level" => SeniorityLevel::Executive,
            _ => return None,
        };
        Some(level)
    }
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized compensation.
///
/// `original_text` is kept for auditing. A salary whose text could not be
/// parsed still exists, with both amounts unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryInfo {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub currency: Option<String>,
    /// Pay period such as `"per month"`.
    pub period: Option<String>,
    pub is_negotiable: bool,
    pub original_text: Option<String>,
}

impl SalaryInfo {
    pub fn has_amount(&self) -> bool {
        self.min_amount.is_some() || self.max_amount.is_some()
    }
}

/// Required experience in whole years, `0..=50`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRequirement {
    pub min_years: Option<u8>,
    pub max_years: Option<u8>,
    pub original_text: Option<String>,
}

impl ExperienceRequirement {
    pub fn has_years(&self) -> bool {
        self.min_years.is_some() || self.max_years.is_some()
    }
}

/// A sub-parser result together with whether its text was recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub recognized: bool,
}

/// The canonical, validated job listing.
///
/// Only [`JobListingBuilder`](crate::JobListingBuilder) produces listings
/// that satisfy every invariant; the fields are public for reading and
/// serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub job_id: String,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub job_type: Option<JobType>,
    pub seniority: Option<SeniorityLevel>,
    pub work_arrangement: Option<String>,
    pub salary: Option<SalaryInfo>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub experience: Option<ExperienceRequirement>,
    pub posted_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_remote: bool,
    pub has_salary_info: bool,
    pub is_active: bool,
}

impl JobListing {
    /// URL-friendly slug of the title, e.g. `"c-developer"`.
    pub fn title_slug(&self) -> String {
        to_slug(&self.title)
    }

    pub fn is_expired(&self) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry < self.scraped_at)
    }
}

impl fmt::Display for JobListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.job_id, self.title, self.company)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_tokens_round_trip_through_as_str() {
        for job_type in JobType::ALL {
            assert_eq!(JobType::from_token(job_type.as_str()), Some(job_type));
        }
        for level in SeniorityLevel::ALL {
            assert_eq!(SeniorityLevel::from_token(level.as_str()), Some(level));
        }
    }

    #[test]
    fn enums_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobType::FullTime).expect("serialize"),
            "\"full_time\""
        );
        assert_eq!(
            serde_json::to_string(&SeniorityLevel::Executive).expect("serialize"),
            "\"executive\""
        );
    }

    #[test]
    fn salary_amount_presence() {
        let mut salary = SalaryInfo {
            original_text: Some("Competitive".into()),
            ..Default::default()
        };
        assert!(!salary.has_amount());
        salary.max_amount = Some(9000.0);
        assert!(salary.has_amount());
    }
}
