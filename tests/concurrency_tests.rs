//! Concurrency and thread safety tests for jobnorm

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use jobnorm::{
    BatchOptions, BatchStatus, JobListingBuilder, RawRecord, RuleSet, validate_batch,
};

fn create_test_record(index: usize) -> RawRecord {
    let job_id = if index % 7 == 3 {
        format!("bad-id-{index}")
    } else {
        format!("wuzzuf_{index}")
    };
    RawRecord::new()
        .with("job_id", job_id)
        .with("source", "wuzzuf")
        .with("source_url", format!("https://wuzzuf.net/jobs/p/{index}"))
        .with("title", "Junior Data Analyst")
        .with("company", "Tech Corp")
        .with("description", "Report on weekly sales.")
        .with("salary", format!("{} - {} EGP monthly", 8000 + index, 12000 + index))
}

#[test]
fn parallel_batch_preserves_input_order() {
    let rules = RuleSet::standard();
    let builder = JobListingBuilder::new(&rules);
    let records: Vec<RawRecord> = (0..500).map(create_test_record).collect();

    let report = validate_batch(&records, &builder, &BatchOptions::default());

    assert_eq!(report.attempted(), 500);
    assert_eq!(report.status(), BatchStatus::Partial);
    for (index, record) in report.records().iter().enumerate() {
        assert_eq!(record.input_id, records[index].job_id_hint().unwrap());
        assert_eq!(record.outcome.is_accepted(), index % 7 != 3);
        if let Some(listing) = record.outcome.listing() {
            let salary = listing.salary.as_ref().expect("salary");
            assert_eq!(salary.min_amount, Some((8000 + index) as f64));
        }
    }
}

#[test]
fn shared_rule_set_across_threads() {
    let rules = Arc::new(RuleSet::standard());
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let rules = Arc::clone(&rules);
            thread::spawn(move || {
                let builder = JobListingBuilder::new(&rules).with_clock(now);
                let records: Vec<RawRecord> = (worker * 50..(worker + 1) * 50)
                    .map(create_test_record)
                    .collect();
                validate_batch(&records, &builder, &BatchOptions::sequential())
            })
        })
        .collect();

    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let builder = JobListingBuilder::new(&rules).with_clock(now);
    for (worker, report) in reports.iter().enumerate() {
        let records: Vec<RawRecord> = (worker * 50..(worker + 1) * 50)
            .map(create_test_record)
            .collect();
        let expected = validate_batch(&records, &builder, &BatchOptions::sequential());
        assert_eq!(report, &expected, "worker {worker} diverged");
    }
}

#[test]
fn builder_is_shareable_by_reference() {
    fn assert_sync<T: Sync>(_: &T) {}

    let rules = RuleSet::standard();
    let builder = JobListingBuilder::new(&rules);
    assert_sync(&builder);
    assert_sync(&rules);

    let records: Vec<RawRecord> = (0..40).map(create_test_record).collect();
    let options = BatchOptions::default();
    thread::scope(|scope| {
        let first = scope.spawn(|| validate_batch(&records[..20], &builder, &options));
        let second = scope.spawn(|| validate_batch(&records[20..], &builder, &options));
        let first = first.join().unwrap();
        let second = second.join().unwrap();
        assert_eq!(first.attempted() + second.attempted(), 40);
        assert_eq!(first.records()[0].input_id, "wuzzuf_0");
        assert_eq!(second.records()[0].input_id, "wuzzuf_20");
    });
}
