//! Job Listing Normalization
//!
//! This is where scraped job postings become trustworthy data. Site
//! extractors hand us loosely structured records (free-text salaries,
//! inconsistent enum spellings, stray whitespace) and we turn each one into a
//! strict [`JobListing`] or a precise list of what is wrong with it.
//!
//! ## What we do here
//!
//! - **Sanitize fields** - collapse whitespace, drop control characters,
//!   dedupe list fields while keeping their order
//! - **Parse salaries and experience** - ordered, rule-driven patterns from a
//!   [`RuleSet`](rules::RuleSet); unrecognized text is kept, not discarded
//! - **Classify** - job type and seniority tokens map onto closed enums
//! - **Validate** - identifier shape, description case gate, inverted ranges,
//!   every failure tagged with its [`Field`]
//! - **Batch** - [`validate_records`] runs many records (in parallel with the
//!   `parallel` feature) and returns a [`ValidationReport`] in input order
//!
//! The crate does no I/O and never logs; callers decide what to do with the
//! outcome.
//!
//! ## Example
//!
//! ```
//! use listing::{BatchOptions, BatchStatus, JobListingBuilder, RawRecord, validate_records};
//! use rules::RuleSet;
//!
//! let rules = RuleSet::standard();
//! let builder = JobListingBuilder::new(&rules);
//!
//! let good = RawRecord::new()
//!     .with("job_id", "bayt_42")
//!     .with("source", "bayt")
//!     .with("source_url", "https://www.bayt.com/en/job/42")
//!     .with("title", "Data Analyst")
//!     .with("company", "Gulf Trading")
//!     .with("description", "Analyse sales data.")
//!     .with("work_arrangement", "Remote");
//! let bad = good.clone().with("job_id", "bad-id");
//!
//! let report = validate_records(&[good, bad], &builder, &BatchOptions::default());
//! assert_eq!(report.status(), BatchStatus::Partial);
//! assert!(report.records()[0].outcome.listing().is_some_and(|listing| listing.is_remote));
//! ```
mod builder;
mod classify;
mod error;
mod experience;
mod raw;
mod report;
mod salary;
mod sanitize;
mod types;

pub use crate::builder::{is_canonical_identifier, parse_timestamp, Built, JobListingBuilder};
pub use crate::classify::{classify_job_type, classify_seniority, normalize_token};
pub use crate::error::{
    EnumRejection, ErrorKind, Field, Notice, ValidationError, ValidationFailure,
};
pub use crate::experience::{ExperienceInput, ExperienceParser, MAX_YEARS};
pub use crate::raw::{RawRecord, RawValue, TypedToken};
pub use crate::report::{
    validate_records, validate_records_with, BatchOptions, BatchStatus, RecordOutcome,
    RecordReport, ValidationReport,
};
pub use crate::salary::{SalaryInput, SalaryParser};
pub use crate::sanitize::{collapse_whitespace, dedupe_preserve_order, sanitize_value, to_slug};
pub use crate::types::{
    ExperienceRequirement, JobListing, JobType, Parsed, SalaryInfo, SeniorityLevel,
};
