use std::io::Write;
use std::path::Path;

use jobnorm::config::load_rule_definition;
use jobnorm::{
    BatchStatus, ConfigLoadError, EnumRejection, ErrorKind, Field, JobListingBuilder, JobType,
    JobnormConfig, PipelineError, RawRecord, RawValue, RecordsError, RuleError, RuleSet,
    RuleSetDefinition, ValidationError, load_records, run_pipeline, standard_definition,
};
use tempfile::{Builder, NamedTempFile};

fn base_record() -> RawRecord {
    RawRecord::new()
        .with("job_id", "wuzzuf_12345")
        .with("source", "wuzzuf")
        .with("source_url", "https://wuzzuf.net/jobs/p/12345")
        .with("title", "Backend Developer")
        .with("company", "Tech Corp")
        .with("description", "Design APIs.")
}

#[test]
fn shipped_rule_file_matches_builtin_rules() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/rules.yml");
    let definition = load_rule_definition(&path).expect("shipped rules parse");
    assert_eq!(definition, standard_definition());
}

#[test]
fn shipped_pipeline_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/jobnorm.yml");
    let config = JobnormConfig::from_file(&path).expect("shipped config parses");

    let report = run_pipeline(&config, &[base_record().with("salary", "USD 3,000 - 4,000")])
        .expect("pipeline runs");

    assert_eq!(report.status(), BatchStatus::Succeeded);
    let listing = report.listings().next().expect("listing");
    assert_eq!(
        listing.salary.as_ref().and_then(|salary| salary.currency.as_deref()),
        Some("USD")
    );
}

#[test]
fn unreadable_rules_fail_the_whole_run() {
    let config = JobnormConfig::from_yaml("rules:\n  path: /nonexistent/rules.yml")
        .expect("config itself is valid");

    let result = run_pipeline(&config, &[base_record()]);

    assert!(matches!(
        result,
        Err(PipelineError::Config(ConfigLoadError::FileRead(_)))
    ));
}

#[test]
fn malformed_rules_yaml_fails_the_whole_run() {
    let mut rules_file = NamedTempFile::new().unwrap();
    rules_file.write_all(b"currencies: [not, a, map]\n").unwrap();
    let mut config = JobnormConfig::default();
    config.set_rules(jobnorm::config::RulesConfig::from_path(rules_file.path()));

    let result = run_pipeline(&config, &[base_record()]);

    assert!(matches!(
        result,
        Err(PipelineError::Config(ConfigLoadError::YamlParse(_)))
    ));
}

#[test]
fn rule_compile_errors_name_the_pattern() {
    let mut definition = RuleSetDefinition::default();
    definition.range_patterns.push("<num> - <num> - <num>".into());

    let err = RuleSet::compile(definition).expect_err("three numbers");

    assert!(matches!(err, RuleError::TooManyNumbers { .. }));
    assert!(err.to_string().contains("<num> - <num> - <num>"));
}

#[test]
fn currency_placeholder_needs_currencies() {
    let mut definition = RuleSetDefinition::default();
    definition.range_patterns.push("<num> <currency>".into());

    let err = RuleSet::compile(definition).expect_err("no currencies");

    assert!(matches!(err, RuleError::NoCurrencies { .. }));
}

#[test]
fn unsupported_config_version_is_rejected() {
    let result = JobnormConfig::from_yaml("version: \"3\"");
    assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(_))));
}

#[test]
fn malformed_records_file_is_reported_with_line() {
    let mut file = Builder::new().suffix(".jsonl").tempfile().unwrap();
    writeln!(file, "{{\"job_id\": \"wuzzuf_1\"}}").unwrap();
    writeln!(file, "not json").unwrap();

    let err = load_records(file.path()).expect_err("second line is invalid");

    assert!(matches!(err, RecordsError::Line { line: 2, .. }));
    assert!(PipelineError::from(err).to_string().contains("line 2"));
}

#[test]
fn failures_are_collected_per_field() {
    let rules = RuleSet::standard();
    let builder = JobListingBuilder::new(&rules);
    let record = base_record()
        .with("job_id", "")
        .with("job_type", RawValue::from(JobType::Contract))
        .with("salary_min", -5)
        .with("experience_years", 75)
        .with("posted_date", "last tuesday")
        .with("skills", true);

    let failure = builder.build(&record).expect_err("invalid");

    assert!(failure.has(Field::JobId, ErrorKind::EmptyRequiredField));
    assert!(failure.has(Field::SalaryMin, ErrorKind::OutOfRange));
    assert!(failure.has(Field::ExperienceYears, ErrorKind::OutOfRange));
    assert!(failure.has(Field::PostedDate, ErrorKind::InvalidTimestamp));
    assert!(failure.has(Field::Skills, ErrorKind::WrongType));
    assert!(failure.errors().iter().any(|err| matches!(
        err,
        ValidationError::InvalidEnumInput {
            field: Field::JobType,
            rejection: EnumRejection::TypedValue(_),
        }
    )));
}

#[test]
fn failure_serializes_field_kind_and_message() {
    let rules = RuleSet::standard();
    let builder = JobListingBuilder::new(&rules);
    let failure = builder
        .build(&base_record().with("job_id", "bad-id"))
        .expect_err("invalid");

    let json = serde_json::to_value(&failure).expect("serialize");

    assert_eq!(json["errors"][0]["field"], "job_id");
    assert_eq!(json["errors"][0]["kind"], "invalid_identifier_format");
    assert!(json["errors"][0]["message"].as_str().is_some());
}
