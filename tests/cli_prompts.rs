// tests/cli_prompts.rs
use std::io::Cursor;

use chrono::NaiveDate;
use clap::Parser;
use httpmock::prelude::*;
use serde_json::json;

use tk_aanwezig::cli::{self, Args};
use tk_aanwezig::config::options::{
    DateSelector, ExtractMode, MatchStrategy, MismatchPolicy, NetOptions, Selection,
};
use tk_aanwezig::core::net::Api;
use tk_aanwezig::reconcile::MatchResult;
use tk_aanwezig::roster::RosterEntry;
use tk_aanwezig::runner::{DayOutcome, ReportOutcome, RunSummary, SkipReason};
use tk_aanwezig::specs::report::{ListSource, ReportHeader};
use tk_aanwezig::PresenceError;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[test]
fn single_date_after_bad_menu_choice() {
    let mut input = Cursor::new("3\n1\n2024-13-01\n2024-04-09\n");
    let mut out = Vec::new();
    let sel = cli::prompt_dates(&mut input, &mut out).unwrap();
    assert_eq!(sel, DateSelector::One(d("2024-04-09")));

    let text = output(out);
    assert!(text.contains("Verkeerde invoer"));
    assert!(text.contains("invalid date '2024-13-01'"));
}

#[test]
fn range_is_ordered() {
    let mut input = Cursor::new("2\n2024-04-12\n2024-04-08\n");
    let mut out = Vec::new();
    let sel = cli::prompt_dates(&mut input, &mut out).unwrap();
    assert_eq!(sel, DateSelector::Range { from: d("2024-04-08"), to: d("2024-04-12") });
}

#[test]
fn closed_input_is_an_input_error() {
    let mut input = Cursor::new("");
    let mut out = Vec::new();
    assert!(matches!(cli::prompt_dates(&mut input, &mut out), Err(PresenceError::Input(_))));
}

#[test]
fn yes_no_reasks_until_answered() {
    let mut input = Cursor::new("misschien\nJa\n");
    let mut out = Vec::new();
    assert!(cli::prompt_yes_no(&mut input, &mut out, "Doorgaan? j/n: ").unwrap());
    assert_eq!(output(out).matches("Doorgaan?").count(), 2);

    let mut input = Cursor::new("n\n");
    assert!(!cli::prompt_yes_no(&mut input, &mut Vec::new(), "? ").unwrap());
}

#[test]
fn flags_map_onto_run_options() {
    let args = Args::parse_from([
        "tk_aanwezig",
        "--date",
        "2024-04-09",
        "--strict",
        "--matcher",
        "similarity",
        "--threshold",
        "0.8",
        "--select",
        "soort=Tussenpublicatie",
        "--speakers",
        "--no-chart",
    ]);
    assert!(!args.is_interactive());
    let opts = args.to_options();
    assert_eq!(opts.policy, MismatchPolicy::Strict);
    assert_eq!(opts.matcher, MatchStrategy::Similarity { threshold: 0.8 });
    assert_eq!(opts.selection, Selection::BySoort("Tussenpublicatie".into()));
    assert_eq!(opts.extract, ExtractMode::WithSpeakers);
    assert!(!opts.chart);
}

#[test]
fn report_menu_resolves_fragments() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(200).json_body(json!({
            "value": [
                { "Id": "4b1e-aaaa", "Soort": "Voorpublicatie" },
                { "Id": "4b1e-bbbb", "Soort": "Tussenpublicatie" }
            ]
        }));
    });
    let api = Api::new(&NetOptions { api_url: server.base_url(), retries: 0, ..NetOptions::default() }).unwrap();

    // Unknown fragment, then an ambiguous one that is declined, then a unique one.
    let mut input = Cursor::new("zzzz\n4b1e\nn\nbbbb\n");
    let mut out = Vec::new();
    let sel = cli::choose_reports(&api, d("2024-04-09"), &mut input, &mut out).unwrap();
    assert_eq!(sel, Some(Selection::ByIdFragments(vec!["4b1e-bbbb".into()])));

    let text = output(out);
    assert!(text.contains("Geen verslag gevonden voor 'zzzz'"));
    assert!(text.contains("past op 2 verslagen"));

    let mut input = Cursor::new("exit\n");
    assert_eq!(cli::choose_reports(&api, d("2024-04-09"), &mut input, &mut Vec::new()).unwrap(), None);
}

#[test]
fn report_menu_falls_back_to_latest_when_listing_fails() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/Verslag");
        then.status(500);
    });
    let api = Api::new(&NetOptions { api_url: server.base_url(), retries: 0, ..NetOptions::default() }).unwrap();

    let mut out = Vec::new();
    let sel = cli::choose_reports(&api, d("2024-04-09"), &mut Cursor::new(""), &mut out).unwrap();
    assert_eq!(sel, Some(Selection::Latest));
    assert!(out.is_empty());
    mock.assert_calls(1);
}

fn report(id: &str, present: &[&str], absent: &[&str]) -> ReportOutcome {
    ReportOutcome {
        id: id.to_string(),
        header: ReportHeader { soort: Some("Tussenpublicatie".into()), ..ReportHeader::default() },
        source: ListSource::Marker,
        declared: Some(present.len()),
        result: Some(MatchResult {
            present: present.iter().map(|k| RosterEntry::bare(k)).collect(),
            absent: absent.iter().map(|k| RosterEntry::bare(k)).collect(),
            unmatched: Vec::new(),
            token_count: present.len(),
        }),
    }
}

#[test]
fn summary_lists_days_and_totals() {
    let run_summary = RunSummary {
        days: vec![
            DayOutcome {
                date: d("2024-04-06"),
                skipped: Some(SkipReason::Weekend),
                reports: Vec::new(),
                errors: Vec::new(),
            },
            DayOutcome {
                date: d("2024-04-09"),
                skipped: None,
                reports: vec![report("r1", &["agema", "bamenga"], &["aartsen"])],
                errors: Vec::new(),
            },
            DayOutcome {
                date: d("2024-04-10"),
                skipped: None,
                reports: vec![report("r2", &["agema"], &["aartsen", "bamenga"])],
                errors: vec![("r3".into(), "HTTP 404".into())],
            },
        ],
        failed: vec![(d("2024-04-11"), "API error: boom".into())],
    };

    let mut out = Vec::new();
    cli::print_summary(&mut out, &run_summary).unwrap();
    let text = output(out);

    assert!(text.contains("2024-04-06: overgeslagen (Weekend)"));
    assert!(text.contains("2024-04-09 verslag r1 (Tussenpublicatie)"));
    assert!(text.contains("2 / 3 kamerleden aanwezig, 1 afwezigen"));
    assert!(text.contains("2024-04-10: verslag r3 mislukt: HTTP 404"));
    assert!(text.contains("2024-04-11: mislukt: API error: boom"));
    assert!(text.contains("Totaal over 2 verslagen: 3 aanwezig, 3 afwezig"));
}
