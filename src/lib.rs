//! Workspace umbrella crate for jobnorm, the job-listing normalization engine.
//!
//! This crate stitches the rule compiler and the listing builder together so
//! callers can go from configuration and raw scraped records to a
//! [`ValidationReport`] with a single API entry point. Batches are traced with
//! `tracing` and can feed an optional process-wide [`ValidationMetrics`]
//! recorder.

pub mod config;
pub mod records;
#[cfg(feature = "cli")]
pub mod telemetry;

pub use listing::{
    BatchOptions, BatchStatus, Built, EnumRejection, ErrorKind, ExperienceInput,
    ExperienceParser, ExperienceRequirement, Field, JobListing, JobListingBuilder, JobType,
    MAX_YEARS, Notice, Parsed, RawRecord, RawValue, RecordOutcome, RecordReport, SalaryInfo,
    SalaryInput, SalaryParser, SeniorityLevel, TypedToken, ValidationError, ValidationFailure,
    ValidationReport, classify_job_type, classify_seniority, collapse_whitespace,
    dedupe_preserve_order, is_canonical_identifier, normalize_token, parse_timestamp,
    sanitize_value, to_slug, validate_records, validate_records_with,
};
pub use rules::{
    Bound, CompiledPattern, DetectionStrategy, OrderedTable, PatternDefinition, PatternMatch,
    RuleError, RuleSet, RuleSetDefinition, SeniorityDefinition, YearsHint, parse_amount,
    standard_definition,
};

pub use crate::config::{ConfigLoadError, JobnormConfig};
pub use crate::records::{RecordFormat, RecordsError, load_records, parse_records};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use tracing::{Level, info, warn};

/// Errors that stop a whole pipeline run. Per-record validation failures are
/// never errors here; they are reported in the [`ValidationReport`].
#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigLoadError),
    Rules(RuleError),
    Records(RecordsError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
            PipelineError::Rules(err) => write!(f, "rule set failed to compile: {err}"),
            PipelineError::Records(err) => write!(f, "record input failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Config(err) => Some(err),
            PipelineError::Rules(err) => Some(err),
            PipelineError::Records(err) => Some(err),
        }
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

impl From<RuleError> for PipelineError {
    fn from(value: RuleError) -> Self {
        PipelineError::Rules(value)
    }
}

impl From<RecordsError> for PipelineError {
    fn from(value: RecordsError) -> Self {
        PipelineError::Records(value)
    }
}

/// Metrics observer for batch validation.
pub trait ValidationMetrics: Send + Sync {
    /// Called once per record, possibly from several threads at once.
    fn record_listing(&self, latency: Duration, result: Result<(), &ValidationFailure>);
    fn record_batch(&self, latency: Duration, report: &ValidationReport);
}

/// Install or clear the global validation metrics recorder.
pub fn set_validation_metrics(recorder: Option<Arc<dyn ValidationMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("validation metrics lock poisoned");
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ValidationMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn ValidationMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn ValidationMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn ValidationMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_listing(&self, latency: Duration, result: Result<(), &ValidationFailure>) {
        self.recorder.record_listing(latency, result);
    }

    fn record_batch(self, report: &ValidationReport) {
        self.recorder.record_batch(self.start.elapsed(), report);
    }
}

/// Validate a batch of raw records, tracing each outcome.
///
/// Emits a `jobnorm.batch` span with `listing_accepted` / `listing_rejected`
/// events per record and a closing `batch_complete` event.
pub fn validate_batch(
    records: &[RawRecord],
    builder: &JobListingBuilder<'_>,
    options: &BatchOptions,
) -> ValidationReport {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "jobnorm.batch",
        records = records.len(),
        parallel = options.parallel
    );
    let _guard = span.enter();
    let metrics = MetricsSpan::start();

    // Record callbacks may run on pool threads, so events name their parent.
    let report = validate_records_with(records, builder, options, |record, latency| {
        let elapsed_micros = latency.as_micros();
        match &record.outcome {
            RecordOutcome::Accepted { notices, .. } => {
                info!(
                    parent: &span,
                    input_id = %record.input_id,
                    notices = notices.len(),
                    elapsed_micros,
                    "listing_accepted"
                );
                if let Some(metrics) = metrics.as_ref() {
                    metrics.record_listing(latency, Ok(()));
                }
            }
            RecordOutcome::Rejected(failure) => {
                warn!(
                    parent: &span,
                    input_id = %record.input_id,
                    errors = failure.errors().len(),
                    error = %failure,
                    elapsed_micros,
                    "listing_rejected"
                );
                if let Some(metrics) = metrics.as_ref() {
                    metrics.record_listing(latency, Err(failure));
                }
            }
        }
    });

    info!(
        status = %report.status(),
        attempted = report.attempted(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        elapsed_micros = start.elapsed().as_micros(),
        "batch_complete"
    );
    if let Some(metrics) = metrics {
        metrics.record_batch(&report);
    }
    report
}

/// Compiles the rule set the configuration points at.
///
/// A configured source that cannot be read or compiled is an error; no
/// source at all yields an empty rule set and a warning.
pub fn resolve_rules(config: &JobnormConfig) -> Result<RuleSet, PipelineError> {
    if let Some(path) = config.rules_path() {
        let definition = crate::config::load_rule_definition(&path)?;
        let rules = RuleSet::compile(definition)?;
        info!(
            path = %path.display(),
            salary_patterns = rules.salary_pattern_count(),
            experience_patterns = rules.experience_pattern_count(),
            "rules_loaded"
        );
        return Ok(rules);
    }
    if let Some(definition) = &config.rules.inline {
        return Ok(RuleSet::compile(definition.clone())?);
    }
    if config.rules.builtin {
        return Ok(RuleSet::standard());
    }
    warn!("no rule set configured; salary, experience and seniority text will not be recognized");
    Ok(RuleSet::empty())
}

/// Resolve rules from `config` and validate `records` with them.
pub fn run_pipeline(
    config: &JobnormConfig,
    records: &[RawRecord],
) -> Result<ValidationReport, PipelineError> {
    let rules = resolve_rules(config)?;
    let builder = JobListingBuilder::new(&rules);
    Ok(validate_batch(records, &builder, &config.batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn base_record(job_id: &str) -> RawRecord {
        RawRecord::new()
            .with("job_id", job_id)
            .with("source", "wuzzuf")
            .with("source_url", "https://wuzzuf.net/jobs/p/12345")
            .with("title", "Senior Python Developer")
            .with("company", "Tech Corp")
            .with("description", "Build data pipelines.")
            .with("salary", "EGP 15,000 - 20,000 per month")
    }

    #[test]
    fn validate_batch_reports_in_order() {
        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records = vec![base_record("wuzzuf_1"), base_record("bad id"), base_record("wuzzuf_3")];

        let report = validate_batch(&records, &builder, &BatchOptions::default());

        assert_eq!(report.status(), BatchStatus::Partial);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.records()[1].input_id, "bad id");
        let salary = report.records()[0]
            .outcome
            .listing()
            .and_then(|listing| listing.salary.as_ref())
            .expect("salary parsed");
        assert_eq!(salary.currency.as_deref(), Some("EGP"));
    }

    #[test]
    fn run_pipeline_with_inline_rules() {
        let config = JobnormConfig::from_yaml(
            r#"
version: "1.0"
rules:
  inline:
    currencies:
      AED: ["dhs"]
    range_patterns:
      - "<num> - <num> <currency>"
batch:
  parallel: false
"#,
        )
        .unwrap();
        let record = base_record("bayt_9").with("salary", "8,000 - 12,000 Dhs");

        let report = run_pipeline(&config, &[record]).unwrap();

        let listing = report.listings().next().expect("accepted");
        let salary = listing.salary.as_ref().expect("salary");
        assert_eq!(salary.min_amount, Some(8000.0));
        assert_eq!(salary.max_amount, Some(12000.0));
        assert_eq!(salary.currency.as_deref(), Some("AED"));
    }

    #[test]
    fn run_pipeline_without_rules_keeps_salary_text() {
        let config = JobnormConfig::default();
        let report = run_pipeline(&config, &[base_record("wuzzuf_2")]).unwrap();

        let listing = report.listings().next().expect("accepted");
        let salary = listing.salary.as_ref().expect("salary kept");
        assert_eq!(salary.min_amount, None);
        assert_eq!(
            salary.original_text.as_deref(),
            Some("EGP 15,000 - 20,000 per month")
        );
    }

    #[test]
    fn missing_rules_file_is_fatal() {
        let config =
            JobnormConfig::from_yaml("rules:\n  path: /nonexistent/jobnorm/rules.yml").unwrap();
        let result = run_pipeline(&config, &[base_record("wuzzuf_1")]);
        assert!(matches!(
            result,
            Err(PipelineError::Config(ConfigLoadError::FileRead(_)))
        ));
    }

    #[test]
    fn invalid_rules_file_is_fatal() {
        let mut rules_file = NamedTempFile::new().unwrap();
        rules_file
            .write_all(b"range_patterns:\n  - \"from <amount>\"\n")
            .unwrap();
        let mut config = JobnormConfig::default();
        config.rules.path = Some(rules_file.path().to_path_buf());

        let result = run_pipeline(&config, &[]);
        assert!(matches!(
            result,
            Err(PipelineError::Rules(RuleError::UnknownPlaceholder { .. }))
        ));
    }

    #[test]
    fn pipeline_error_exposes_source() {
        let err = PipelineError::from(ConfigLoadError::Validation("bad".into()));
        assert!(err.to_string().starts_with("configuration failure"));
        assert!(err.source().is_some());
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Arc<RwLock<Vec<&'static str>>>,
    }

    impl CountingMetrics {
        fn new() -> Self {
            Self {
                events: Arc::new(RwLock::new(Vec::new())),
            }
        }

        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl ValidationMetrics for CountingMetrics {
        fn record_listing(&self, _latency: Duration, result: Result<(), &ValidationFailure>) {
            let label = if result.is_ok() {
                "listing_ok"
            } else {
                "listing_err"
            };
            self.events.write().unwrap().push(label);
        }

        fn record_batch(&self, _latency: Duration, report: &ValidationReport) {
            let label = match report.status() {
                BatchStatus::Empty => "batch_empty",
                BatchStatus::Succeeded => "batch_succeeded",
                BatchStatus::Partial => "batch_partial",
                BatchStatus::Failed => "batch_failed",
            };
            self.events.write().unwrap().push(label);
        }
    }

    #[test]
    fn metrics_recorder_tracks_batch_outcome() {
        let metrics = Arc::new(CountingMetrics::new());
        set_validation_metrics(Some(metrics.clone()));

        let rules = RuleSet::standard();
        let builder = JobListingBuilder::new(&rules);
        let records = vec![base_record("wuzzuf_7"), base_record("bad-id")];
        let report = validate_batch(&records, &builder, &BatchOptions::sequential());

        assert_eq!(report.status(), BatchStatus::Partial);

        let events = metrics.snapshot();
        assert!(events.contains(&"listing_ok"));
        assert!(events.contains(&"listing_err"));
        assert!(events.contains(&"batch_partial"));

        set_validation_metrics(None);
    }
}
