//! Batch validation and its report.
//!
//! Records are validated independently; one failure never affects another.
//! With the `parallel` feature and [`BatchOptions::parallel`] set, records are
//! spread over the rayon pool and merged by index, so the report is always in
//! input order.
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::builder::JobListingBuilder;
use crate::error::{Notice, ValidationFailure};
use crate::raw::RawRecord;
use crate::types::JobListing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Validate records on the rayon pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Accepted {
        listing: JobListing,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        notices: Vec<Notice>,
    },
    Rejected(ValidationFailure),
}

impl RecordOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RecordOutcome::Accepted { .. })
    }

    pub fn listing(&self) -> Option<&JobListing> {
        match self {
            RecordOutcome::Accepted { listing, .. } => Some(listing),
            RecordOutcome::Rejected(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            RecordOutcome::Accepted { .. } => None,
            RecordOutcome::Rejected(failure) => Some(failure),
        }
    }
}

/// Outcome of one input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    /// Raw `job_id`, or `#<index>` when the record has none.
    pub input_id: String,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Empty,
    Succeeded,
    Partial,
    Failed,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            BatchStatus::Empty => "empty",
            BatchStatus::Succeeded => "succeeded",
            BatchStatus::Partial => "partial",
            BatchStatus::Failed => "failed",
        };
        f.write_str(status)
    }
}

/// Immutable result of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    status: BatchStatus,
    attempted: usize,
    succeeded: usize,
    failed: usize,
    records: Vec<RecordReport>,
}

impl ValidationReport {
    fn from_records(records: Vec<RecordReport>) -> Self {
        let attempted = records.len();
        let succeeded = records
            .iter()
            .filter(|record| record.outcome.is_accepted())
            .count();
        let failed = attempted - succeeded;
        let status = match (succeeded, failed) {
            (0, 0) => BatchStatus::Empty,
            (_, 0) => BatchStatus::Succeeded,
            (0, _) => BatchStatus::Failed,
            _ => BatchStatus::Partial,
        };
        Self {
            status,
            attempted,
            succeeded,
            failed,
            records,
        }
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Per-record outcomes, in input order.
    pub fn records(&self) -> &[RecordReport] {
        &self.records
    }

    pub fn listings(&self) -> impl Iterator<Item = &JobListing> {
        self.records
            .iter()
            .filter_map(|record| record.outcome.listing())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ValidationFailure)> {
        self.records.iter().filter_map(|record| {
            record
                .outcome
                .failure()
                .map(|failure| (record.input_id.as_str(), failure))
        })
    }
}

/// Validates every record and reports outcomes in input order.
pub fn validate_records(
    records: &[RawRecord],
    builder: &JobListingBuilder<'_>,
    options: &BatchOptions,
) -> ValidationReport {
    validate_records_with(records, builder, options, |_, _| {})
}

/// Like [`validate_records`], calling `inspect` once per record with its
/// report and build time. `inspect` may run on several threads at once.
pub fn validate_records_with<F>(
    records: &[RawRecord],
    builder: &JobListingBuilder<'_>,
    options: &BatchOptions,
    inspect: F,
) -> ValidationReport
where
    F: Fn(&RecordReport, Duration) + Sync + Send,
{
    let process = |(index, raw): (usize, &RawRecord)| {
        let start = Instant::now();
        let outcome = match builder.build_with_notices(raw) {
            Ok(built) => RecordOutcome::Accepted {
                listing: built.listing,
                notices: built.notices,
            },
            Err(failure) => RecordOutcome::Rejected(failure),
        };
        let report = RecordReport {
            input_id: raw
                .job_id_hint()
                .map_or_else(|| format!("#{index}"), str::to_string),
            outcome,
        };
        inspect(&report, start.elapsed());
        report
    };

    let mut reports = Vec::with_capacity(records.len());
    #[cfg(feature = "parallel")]
    if options.parallel {
        records
            .par_iter()
            .enumerate()
            .map(process)
            .collect_into_vec(&mut reports);
        return ValidationReport::from_records(reports);
    }
    #[cfg(not(feature = "parallel"))]
    let _ = options.parallel;

    reports.extend(records.iter().enumerate().map(process));
    ValidationReport::from_records(reports)
}

#[cfg(test)]
mod tests {
    use rules::RuleSet;

    use super::*;

    fn record(job_id: &str, description: &str) -> RawRecord {
        RawRecord::new()
            .with("job_id", job_id)
            .with("source", "bayt")
            .with("source_url", "https://www.bayt.com/en/job/1")
            .with("title", "Accountant")
            .with("company", "Gulf Trading")
            .with("description", description)
    }

    #[test]
    fn empty_batch_has_empty_status() {
        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let report = validate_records(&[], &builder, &BatchOptions::default());
        assert_eq!(report.status(), BatchStatus::Empty);
        assert_eq!(report.attempted(), 0);
    }

    #[test]
    fn partial_batch_keeps_order_and_counts() {
        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records = vec![
            record("bayt_1", "Keep the books."),
            record("bad-id", "Keep the books."),
            record("bayt_3", "Keep the books."),
        ];
        for options in [BatchOptions::sequential(), BatchOptions::default()] {
            let report = validate_records(&records, &builder, &options);
            assert_eq!(report.status(), BatchStatus::Partial);
            assert_eq!((report.attempted(), report.succeeded(), report.failed()), (3, 2, 1));
            let ids: Vec<&str> = report
                .records()
                .iter()
                .map(|record| record.input_id.as_str())
                .collect();
            assert_eq!(ids, vec!["bayt_1", "bad-id", "bayt_3"]);
            assert!(!report.records()[1].outcome.is_accepted());
        }
    }

    #[test]
    fn records_without_id_are_indexed() {
        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records = vec![RawRecord::new(), RawRecord::new()];
        let report = validate_records(&records, &builder, &BatchOptions::sequential());
        assert_eq!(report.status(), BatchStatus::Failed);
        let ids: Vec<&str> = report.failures().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["#0", "#1"]);
    }

    #[test]
    fn inspect_sees_every_record() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records: Vec<RawRecord> = (0..20)
            .map(|i| record(&format!("bayt_{i}"), "Keep the books."))
            .collect();
        let seen = AtomicUsize::new(0);
        let report = validate_records_with(&records, &builder, &BatchOptions::default(), |_, _| {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(seen.load(Ordering::Relaxed), 20);
        assert_eq!(report.status(), BatchStatus::Succeeded);
    }

    #[test]
    fn report_serializes_with_summary_and_tagged_outcomes() {
        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records = vec![record("bayt_1", "Keep the books."), record("bayt_2", "lowercase")];
        let report = validate_records(&records, &builder, &BatchOptions::sequential());
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["status"], "partial");
        assert_eq!(json["attempted"], 2);
        assert_eq!(json["records"][0]["status"], "accepted");
        assert_eq!(json["records"][0]["listing"]["job_id"], "bayt_1");
        assert_eq!(json["records"][1]["status"], "rejected");
        assert_eq!(json["records"][1]["errors"][0]["kind"], "description_case_violation");
    }
}
