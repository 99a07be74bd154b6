//! End-to-end behaviour of the listing pipeline on realistic scraped records.

use chrono::{TimeZone, Utc};
use jobnorm::{
    BatchOptions, BatchStatus, ErrorKind, ExperienceRequirement, Field, JobListingBuilder,
    JobType, Notice, RawRecord, RawValue, RuleSet, SeniorityLevel, validate_batch,
};

fn wuzzuf_record() -> RawRecord {
    RawRecord::new()
        .with("job_id", "wuzzuf_12345")
        .with("source", "wuzzuf")
        .with("source_url", "https://wuzzuf.net/x")
        .with("title", "  Software Engineer  ")
        .with("company", "Tech Corp")
        .with("description", "An exciting role in a dynamic company.")
        .with("salary_min", 15000)
        .with("salary_max", 20000)
        .with("currency", "AED")
}

fn builder(rules: &RuleSet) -> JobListingBuilder<'_> {
    JobListingBuilder::new(rules).with_clock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

#[test]
fn structured_salary_record_builds() {
    let rules = RuleSet::standard();
    let listing = builder(&rules).build(&wuzzuf_record()).expect("valid listing");

    assert_eq!(listing.title, "Software Engineer");
    assert!(listing.has_salary_info);
    let salary = listing.salary.as_ref().expect("salary");
    assert_eq!(salary.min_amount, Some(15000.0));
    assert_eq!(salary.max_amount, Some(20000.0));
    assert_eq!(salary.currency.as_deref(), Some("AED"));
    assert!(!listing.is_remote);
    assert!(listing.is_active);
}

#[test]
fn lowercase_description_is_rejected() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record().with("description", "an exciting role");

    let failure = builder(&rules).build(&record).expect_err("case violation");

    assert!(failure.has(Field::Description, ErrorKind::DescriptionCaseViolation));
}

#[test]
fn bad_identifier_fails_only_its_record() {
    let rules = RuleSet::standard();
    let builder = builder(&rules);
    let records = vec![
        wuzzuf_record(),
        wuzzuf_record().with("job_id", "bad-id"),
        wuzzuf_record().with("job_id", "wuzzuf_12346"),
    ];

    let report = validate_batch(&records, &builder, &BatchOptions::default());

    assert_eq!(report.status(), BatchStatus::Partial);
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.failed(), 1);
    let (input_id, failure) = report.failures().next().expect("one failure");
    assert_eq!(input_id, "bad-id");
    assert!(failure.has(Field::JobId, ErrorKind::InvalidIdentifierFormat));
    assert!(report.records()[0].outcome.is_accepted());
    assert!(report.records()[2].outcome.is_accepted());
}

#[test]
fn identifiers_with_space_or_hyphen_are_rejected() {
    let rules = RuleSet::standard();
    let builder = builder(&rules);
    for id in ["wuzzuf 12345", "wuzzuf-12345", "a b-c"] {
        let failure = builder
            .build(&wuzzuf_record().with("job_id", id))
            .expect_err("bad identifier");
        assert!(
            failure.has(Field::JobId, ErrorKind::InvalidIdentifierFormat),
            "{id} should be rejected"
        );
    }
}

#[test]
fn text_fields_drive_every_parser() {
    let rules = RuleSet::standard();
    let record = RawRecord::new()
        .with("job_id", "bayt_778")
        .with("source", "bayt")
        .with("source_url", "https://www.bayt.com/en/job/778")
        .with("title", "Senior Backend Engineer")
        .with("company", "Gulf Fintech")
        .with("description", "Own our payments platform.")
        .with("location", "Dubai,   UAE")
        .with("job_type", "Full-Time")
        .with("work_arrangement", "REMOTE")
        .with("salary", "AED 25,000 - 32,000 per month, negotiable")
        .with("experience", "5+ years of backend experience")
        .with(
            "skills",
            RawValue::List(vec!["Rust".into(), " rust ".into(), "PostgreSQL".into()]),
        )
        .with("languages", "English, Arabic, english")
        .with("posted_date", "2024-02-20")
        .with("expiry_date", "2024-04-01T00:00:00Z");

    let built = builder(&rules).build_with_notices(&record).expect("valid");
    let listing = built.listing;

    assert!(built.notices.is_empty());
    assert_eq!(listing.location.as_deref(), Some("Dubai, UAE"));
    assert_eq!(listing.job_type, Some(JobType::FullTime));
    assert_eq!(listing.seniority, Some(SeniorityLevel::Senior));
    assert!(listing.is_remote);

    let salary = listing.salary.as_ref().expect("salary");
    assert_eq!((salary.min_amount, salary.max_amount), (Some(25000.0), Some(32000.0)));
    assert_eq!(salary.currency.as_deref(), Some("AED"));
    assert_eq!(salary.period.as_deref(), Some("per month"));
    assert!(salary.is_negotiable);

    assert_eq!(
        listing.experience,
        Some(ExperienceRequirement {
            min_years: Some(5),
            max_years: None,
            original_text: Some("5+ years of backend experience".to_string()),
        })
    );
    assert_eq!(listing.skills, vec!["Rust", "PostgreSQL"]);
    assert_eq!(listing.languages, vec!["English", "Arabic"]);
    assert!(listing.is_active);
    assert_eq!(listing.title_slug(), "senior-backend-engineer");
}

#[test]
fn unparseable_salary_is_kept_with_notice() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record()
        .with("salary_min", RawValue::Null)
        .with("salary_max", RawValue::Null)
        .with("salary", "Competitive");

    let built = builder(&rules).build_with_notices(&record).expect("valid");

    let salary = built.listing.salary.as_ref().expect("salary kept");
    assert_eq!(salary.original_text.as_deref(), Some("Competitive"));
    assert!(!built.listing.has_salary_info);
    assert_eq!(
        built.notices,
        vec![Notice::UnparseableButPresent {
            field: Field::Salary
        }]
    );
}

#[test]
fn no_salary_means_no_salary_info() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record()
        .with("salary_min", RawValue::Null)
        .with("salary_max", RawValue::Null)
        .with("currency", RawValue::Null);

    let listing = builder(&rules).build(&record).expect("valid");

    assert!(listing.salary.is_none());
    assert!(!listing.has_salary_info);
}

#[test]
fn inverted_salary_is_never_swapped() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record().with("salary_min", 30000).with("salary_max", 20000);

    let failure = builder(&rules).build(&record).expect_err("inverted");

    assert!(failure.has(Field::Salary, ErrorKind::RangeInverted));
}

#[test]
fn inverted_experience_is_rejected() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record().with("experience", "7 - 3 years");

    let failure = builder(&rules).build(&record).expect_err("inverted");

    assert!(failure.has(Field::Experience, ErrorKind::RangeInverted));
}

#[test]
fn every_problem_is_reported_at_once() {
    let rules = RuleSet::standard();
    let record = RawRecord::new()
        .with("job_id", "bad id")
        .with("source", "wuzzuf")
        .with("title", "Engineer")
        .with("company", "   ")
        .with("description", "lowercase start")
        .with("job_type", "gig");

    let failure = builder(&rules).build(&record).expect_err("invalid");

    assert!(failure.has(Field::JobId, ErrorKind::InvalidIdentifierFormat));
    assert!(failure.has(Field::SourceUrl, ErrorKind::EmptyRequiredField));
    assert!(failure.has(Field::Company, ErrorKind::EmptyRequiredField));
    assert!(failure.has(Field::Description, ErrorKind::DescriptionCaseViolation));
    assert!(failure.has(Field::JobType, ErrorKind::InvalidEnumInput));
}

#[test]
fn expired_listing_is_inactive() {
    let rules = RuleSet::standard();
    let record = wuzzuf_record()
        .with("scraped_at", "2024-03-01T00:00:00Z")
        .with("expiry_date", "2024-02-01");

    let listing = builder(&rules).build(&record).expect("valid");

    assert!(listing.is_expired());
    assert!(!listing.is_active);
}
