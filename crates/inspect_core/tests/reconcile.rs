use std::collections::HashSet;
use std::sync::Once;

use inspect_core::{
    merge_resumed, reconcile, DuplicatePolicy, Outcome, RawRecord, ReconcileOptions, ResultRecord,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(inspect_logging::initialize_for_tests);
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_run_without_outcomes_queues_everything() {
    init_logging();
    let raw = vec![
        RawRecord::pending("https://a.example/"),
        RawRecord::pending("https://b.example/"),
    ];

    let split = reconcile(raw, ReconcileOptions::default());

    assert_eq!(split.residual, urls(&["https://a.example/", "https://b.example/"]));
    assert!(split.seeded.is_empty());
    assert!(!split.is_noop());
}

#[test]
fn rows_with_outcome_are_seeded_and_keep_order() {
    init_logging();
    let raw = vec![
        RawRecord::completed("https://a.example/", "Submitted and indexed"),
        RawRecord::pending("https://b.example/"),
        RawRecord::completed("https://c.example/", "ERROR: timeout"),
        RawRecord {
            identifier: "https://d.example/".into(),
            outcome: Some("  ".into()),
            ..Default::default()
        },
    ];

    let split = reconcile(raw, ReconcileOptions::default());

    assert_eq!(split.residual, urls(&["https://b.example/", "https://d.example/"]));
    assert_eq!(
        split.seeded,
        vec![
            ResultRecord::new("https://a.example/", Outcome::indexed("Submitted and indexed")),
            ResultRecord::new("https://c.example/", Outcome::failed("timeout")),
        ]
    );
}

#[test]
fn partition_is_complete_without_duplicates() {
    init_logging();
    let raw: Vec<RawRecord> = (0..20)
        .map(|i| {
            let url = format!("https://site.example/{i}");
            if i % 3 == 0 {
                RawRecord::completed(url, "Crawled - currently not indexed")
            } else {
                RawRecord::pending(url)
            }
        })
        .collect();
    let all: HashSet<String> = raw.iter().map(|r| r.identifier.clone()).collect();

    let split = reconcile(raw.clone(), ReconcileOptions::default());

    assert_eq!(split.residual.len() + split.seeded.len(), raw.len());
    let residual: HashSet<String> = split.residual.iter().cloned().collect();
    let seeded: HashSet<String> = split.seeded.iter().map(|r| r.identifier.clone()).collect();
    assert!(residual.is_disjoint(&seeded));
    assert_eq!(&residual | &seeded, all);
}

#[test]
fn completed_checkpoint_yields_no_work() {
    init_logging();
    let raw = vec![
        RawRecord::completed("https://a.example/", "PASSED"),
        RawRecord::completed("https://b.example/", "ERROR: timeout"),
    ];

    let split = reconcile(raw, ReconcileOptions::default());

    assert!(split.is_noop());
    assert_eq!(split.seeded.len(), 2);
}

#[test]
fn seeded_urls_are_never_requeued() {
    init_logging();
    let raw = vec![
        RawRecord::pending("https://a.example/"),
        RawRecord::completed("https://a.example/", "PASSED"),
        RawRecord::pending("https://b.example/"),
    ];

    let split = reconcile(raw, ReconcileOptions::default());

    assert_eq!(split.residual, urls(&["https://b.example/"]));
    assert_eq!(split.skipped_duplicates, 1);
}

#[test]
fn duplicates_are_preserved_by_default() {
    init_logging();
    let raw = vec![
        RawRecord::pending("https://a.example/"),
        RawRecord::pending("https://a.example/"),
    ];

    let split = reconcile(raw, ReconcileOptions::default());

    assert_eq!(split.residual, urls(&["https://a.example/", "https://a.example/"]));
    assert_eq!(split.skipped_duplicates, 0);
}

#[test]
fn first_wins_drops_repeated_urls() {
    init_logging();
    let raw = vec![
        RawRecord::pending("https://a.example/"),
        RawRecord::pending("https://b.example/"),
        RawRecord::pending("https://a.example/"),
    ];
    let options = ReconcileOptions {
        duplicates: DuplicatePolicy::FirstWins,
        ..Default::default()
    };

    let split = reconcile(raw, options);

    assert_eq!(split.residual, urls(&["https://a.example/", "https://b.example/"]));
    assert_eq!(split.skipped_duplicates, 1);
}

#[test]
fn failures_count_as_done_unless_retry_is_requested() {
    init_logging();
    let raw = vec![
        RawRecord::completed("https://a.example/", "PASSED"),
        RawRecord::completed("https://b.example/", "Error: rate limited"),
    ];

    let kept = reconcile(raw.clone(), ReconcileOptions::default());
    assert!(kept.is_noop());
    assert_eq!(kept.requeued_failures, 0);

    let retried = reconcile(
        raw,
        ReconcileOptions {
            retry_failed: true,
            ..Default::default()
        },
    );
    assert_eq!(retried.residual, urls(&["https://b.example/"]));
    assert_eq!(retried.seeded.len(), 1);
    assert_eq!(retried.requeued_failures, 1);
}

#[test]
fn retried_failure_is_dropped_when_another_row_succeeded() {
    init_logging();
    let raw = vec![
        RawRecord::completed("https://a.example/", "ERROR: timeout"),
        RawRecord::completed("https://a.example/", "PASSED"),
    ];
    let options = ReconcileOptions {
        retry_failed: true,
        ..Default::default()
    };

    let split = reconcile(raw, options);

    assert!(split.is_noop());
    assert_eq!(split.seeded.len(), 1);
}

#[test]
fn progress_file_result_is_carried_forward_once() {
    init_logging();
    let resumed = vec![RawRecord {
        identifier: "https://a.example/".into(),
        outcome: Some("Submitted and indexed".into()),
        verdict: Some("PASS".into()),
        last_crawl_time: None,
    }];
    let input = vec![
        RawRecord::completed("https://a.example/", "Submitted and indexed"),
        RawRecord::pending("https://b.example/"),
    ];

    let split = reconcile(merge_resumed(resumed, input), ReconcileOptions::default());

    assert_eq!(
        split.seeded,
        vec![ResultRecord::new(
            "https://a.example/",
            Outcome::indexed("Submitted and indexed").with_metadata(Some("PASS".into()), None),
        )]
    );
    assert_eq!(split.residual, urls(&["https://b.example/"]));
}

#[test]
fn progress_file_wins_over_older_input_result() {
    init_logging();
    let resumed = vec![RawRecord::completed("https://a.example/", "ERROR: timeout")];
    let input = vec![
        RawRecord::completed("https://a.example/", "Submitted and indexed"),
        RawRecord::pending("https://a.example/"),
    ];
    let options = ReconcileOptions {
        retry_failed: true,
        ..Default::default()
    };

    let split = reconcile(merge_resumed(resumed, input), options);

    assert!(split.seeded.is_empty());
    assert_eq!(split.residual, urls(&["https://a.example/"]));
    assert_eq!(split.requeued_failures, 1);
}

#[test]
fn unchecked_progress_rows_do_not_hide_input_rows() {
    init_logging();
    let resumed = vec![RawRecord::pending("https://a.example/")];
    let input = vec![RawRecord::completed("https://a.example/", "PASSED")];

    let merged = merge_resumed(resumed, input);

    assert_eq!(merged.len(), 2);
    assert!(reconcile(merged, ReconcileOptions::default()).is_noop());
}
