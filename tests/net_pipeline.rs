// tests/net_pipeline.rs
use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

use tk_aanwezig::config::options::{DateSelector, MismatchPolicy, NetOptions, RunOptions, Selection};
use tk_aanwezig::core::net::Api;
use tk_aanwezig::progress::{NullProgress, Progress};
use tk_aanwezig::roster::Roster;
use tk_aanwezig::runner::{self, SkipReason};
use tk_aanwezig::specs::report::ListSource;
use tk_aanwezig::{store, PresenceError};

const TUSSEN: &[u8] = include_bytes!("fixtures/verslag_tussenpublicatie.xml");
const VOOR: &[u8] = include_bytes!("fixtures/verslag_voorpublicatie.xml");

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn net(server: &MockServer) -> NetOptions {
    NetOptions { api_url: server.base_url(), timeout_secs: 5, retries: 2, backoff_ms: 1 }
}

fn roster() -> Roster {
    Roster::from_keys(["aardema", "aartsen", "elabassi", "agema", "vanbaarle", "bamenga"])
}

fn mock_day<'a>(server: &'a MockServer) -> Vec<httpmock::Mock<'a>> {
    let listing = server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(200).json_body(json!({
            "value": [
                { "Id": "voor-1", "Soort": "Voorpublicatie", "Verwijderd": false },
                { "Id": "tussen-2", "Soort": "Tussenpublicatie", "Verwijderd": false }
            ]
        }));
    });
    let voor = server.mock(|when, then| {
        when.method(GET).path("/Verslag/voor-1/resource");
        then.status(200).header("content-type", "application/xml").body(VOOR);
    });
    let tussen = server.mock(|when, then| {
        when.method(GET).path("/Verslag/tussen-2/resource");
        then.status(200).header("content-type", "application/xml").body(TUSSEN);
    });
    vec![listing, voor, tussen]
}

#[derive(Default)]
struct Recorder {
    total: usize,
    done: Vec<NaiveDate>,
    failed: Vec<NaiveDate>,
    finished: bool,
}

impl Progress for Recorder {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }
    fn item_done(&mut self, date: NaiveDate) {
        self.done.push(date);
    }
    fn item_failed(&mut self, date: NaiveDate, _msg: &str) {
        self.failed.push(date);
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn server_errors_are_retried_then_reported() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(500);
    });

    let api = Api::new(&net(&server)).unwrap();
    match api.get_bytes("/Verslag") {
        Err(PresenceError::Http { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HTTP 500, got {other:?}"),
    }
    mock.assert_calls(3);
}

#[test]
fn rate_limits_are_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(429).header("retry-after", "0");
    });

    let api = Api::new(&net(&server)).unwrap();
    assert!(api.get_bytes("/Verslag").is_err());
    mock.assert_calls(3);
}

#[test]
fn huge_retry_after_is_not_fatal() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(429).header("retry-after", "18446744073709551615");
    });

    let api = Api::new(&NetOptions { retries: 0, ..net(&server) }).unwrap();
    match api.get_bytes("/Verslag") {
        Err(PresenceError::Http { status, .. }) => assert_eq!(status, 429),
        other => panic!("expected HTTP 429, got {other:?}"),
    }
    mock.assert_calls(1);
}

#[test]
fn client_errors_fail_without_retry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Verslag/gone/resource");
        then.status(404);
    });

    let api = Api::new(&net(&server)).unwrap();
    let err = api.get_bytes("/Verslag/gone/resource").unwrap_err();
    assert!(!err.is_transient());
    mock.assert_calls(1);
}

#[test]
fn latest_published_report_is_reconciled_and_logged() {
    let server = MockServer::start();
    let mocks = mock_day(&server);
    let logs = tempdir().unwrap();

    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let mut rec = Recorder::default();
    let summary = runner::run_at(
        &opts,
        &DateSelector::One(d("2024-04-09")),
        roster(),
        d("2030-01-01"),
        Some(&mut rec as &mut dyn Progress),
    )
    .unwrap();

    assert!(summary.failed.is_empty());
    assert_eq!(summary.days.len(), 1);
    let day = &summary.days[0];
    assert_eq!(day.skipped, None);
    assert_eq!(day.reports.len(), 1);

    let report = &day.reports[0];
    assert_eq!(report.id, "tussen-2");
    assert_eq!(report.source, ListSource::Marker);
    assert_eq!(report.declared, Some(5));

    let result = report.result.as_ref().unwrap();
    assert_eq!(result.present.len(), 5);
    let absent: Vec<&str> = result.absent.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(absent, vec!["aartsen"]);
    let agema = result.present.iter().find(|e| e.key == "agema").unwrap();
    assert_eq!(agema.display.as_ref().map(|d| d.party.as_str()), Some("PVV"));

    let logged = store::read_day(&store::log_path(logs.path(), d("2024-04-09"))).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].report_id, None);
    assert_eq!(logged[0].absent, vec!["aartsen"]);

    assert_eq!((rec.total, rec.done.len(), rec.finished), (1, 1, true));
    for m in &mocks {
        m.assert_calls(1);
    }
}

#[test]
fn all_reports_are_logged_with_ids() {
    let server = MockServer::start();
    let _mocks = mock_day(&server);
    let logs = tempdir().unwrap();

    let mut opts = RunOptions { net: net(&server), selection: Selection::All, ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let mut quiet = NullProgress;
    let summary = runner::run_at(
        &opts,
        &DateSelector::One(d("2024-04-09")),
        roster(),
        d("2030-01-01"),
        Some(&mut quiet as &mut dyn Progress),
    )
    .unwrap();

    let day = &summary.days[0];
    assert_eq!(day.reports.len(), 2);
    // The prepublication has no attendance paragraph.
    assert!(day.reports[0].result.is_none());
    assert!(day.reports[1].result.is_some());

    let logged = store::read_day(&store::log_path(logs.path(), d("2024-04-09"))).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].report_id.as_deref(), Some("tussen-2"));
}

#[test]
fn strict_policy_fails_only_that_report() {
    let server = MockServer::start();
    let _mocks = mock_day(&server);
    let logs = tempdir().unwrap();

    let mut opts = RunOptions {
        net: net(&server),
        policy: MismatchPolicy::Strict,
        ..RunOptions::default()
    };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let small = Roster::from_keys(["agema", "bamenga"]);
    let summary =
        runner::run_at(&opts, &DateSelector::One(d("2024-04-09")), small, d("2030-01-01"), None).unwrap();

    let day = &summary.days[0];
    assert!(day.reports.is_empty());
    assert_eq!(day.errors.len(), 1);
    assert_eq!(day.errors[0].0, "tussen-2");
    assert!(day.errors[0].1.contains("aardema"));
}

#[test]
fn api_error_marks_the_date_failed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(200).json_body(json!({ "error": { "message": "Invalid filter" } }));
    });
    let logs = tempdir().unwrap();
    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let mut rec = Recorder::default();
    let summary = runner::run_at(
        &opts,
        &DateSelector::One(d("2024-04-09")),
        roster(),
        d("2030-01-01"),
        Some(&mut rec as &mut dyn Progress),
    )
    .unwrap();

    assert!(summary.days.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.contains("Invalid filter"));
    assert_eq!(rec.failed, vec![d("2024-04-09")]);
}

const EARLIER_LOG: &str = "Aanwezig:\nagema\n\nAfwezig:\naartsen\n";

fn seed_log(dir: &std::path::Path, date: NaiveDate) -> std::path::PathBuf {
    let path = store::log_path(dir, date);
    std::fs::write(&path, EARLIER_LOG).unwrap();
    path
}

#[test]
fn failed_listing_keeps_the_earlier_log() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(503);
    });
    let logs = tempdir().unwrap();
    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();
    let path = seed_log(logs.path(), d("2024-04-09"));

    let summary =
        runner::run_at(&opts, &DateSelector::One(d("2024-04-09")), roster(), d("2030-01-01"), None).unwrap();

    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.contains("503"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EARLIER_LOG);
}

#[test]
fn strict_failure_keeps_the_earlier_log() {
    let server = MockServer::start();
    let _mocks = mock_day(&server);
    let logs = tempdir().unwrap();
    let mut opts = RunOptions {
        net: net(&server),
        policy: MismatchPolicy::Strict,
        ..RunOptions::default()
    };
    opts.paths.logs_dir = logs.path().to_path_buf();
    let path = seed_log(logs.path(), d("2024-04-09"));

    let small = Roster::from_keys(["agema", "bamenga"]);
    let summary =
        runner::run_at(&opts, &DateSelector::One(d("2024-04-09")), small, d("2030-01-01"), None).unwrap();

    assert_eq!(summary.days[0].errors.len(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EARLIER_LOG);
}

#[test]
fn empty_listing_skips_the_day() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(200).json_body(json!({ "value": [] }));
    });
    let logs = tempdir().unwrap();
    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let path = seed_log(logs.path(), d("2024-04-09"));

    let summary =
        runner::run_at(&opts, &DateSelector::One(d("2024-04-09")), roster(), d("2030-01-01"), None).unwrap();
    assert_eq!(summary.days[0].skipped, Some(SkipReason::NoReports));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EARLIER_LOG);
}

#[test]
fn weekends_and_today_make_no_requests() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.method(GET);
        then.status(500);
    });
    let logs = tempdir().unwrap();
    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    // Fri 5 Apr (exclusive) through Sun 7 Apr, with Sunday as "today".
    let summary = runner::run_at(
        &opts,
        &DateSelector::range(d("2024-04-05"), d("2024-04-07")),
        roster(),
        d("2024-04-07"),
        None,
    )
    .unwrap();

    let skipped: Vec<_> = summary.days.iter().map(|d| d.skipped).collect();
    assert_eq!(skipped, vec![Some(SkipReason::Weekend), Some(SkipReason::Weekend)]);
    any.assert_calls(0);
}

#[test]
fn long_ranges_come_back_sorted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(200).json_body(json!({ "value": [] }));
    });
    let logs = tempdir().unwrap();
    let mut opts = RunOptions { net: net(&server), ..RunOptions::default() };
    opts.paths.logs_dir = logs.path().to_path_buf();

    let dates = DateSelector::range(d("2024-04-01"), d("2024-04-21"));
    let summary = runner::run_at(&opts, &dates, roster(), d("2030-01-01"), None).unwrap();

    let got: Vec<NaiveDate> = summary.days.iter().map(|d| d.date).collect();
    assert_eq!(got, dates.days());
    assert!(summary.failed.is_empty());
}
