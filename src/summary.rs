// src/summary.rs
use std::collections::HashMap;
use std::path::Path;

use crate::config::consts::EXPORT_SEP;
use crate::csv::to_table;
use crate::error::Result;
use crate::file::{append_rows, write_rows_start};
use crate::reconcile::MatchResult;
use crate::runner::DayOutcome;

/// "143 / 150 kamerleden aanwezig, 7 afwezigen"
pub fn summary_line(result: &MatchResult) -> String {
    let total = result.present.len() + result.absent.len();
    format!(
        "{} / {} kamerleden aanwezig, {} afwezigen",
        result.present.len(),
        total,
        result.absent.len()
    )
}

/// Warning line when not every extracted name found a member.
pub fn mismatch_line(result: &MatchResult) -> Option<String> {
    if result.is_complete() {
        return None;
    }
    Some(format!(
        "Aantal Kamerleden matcht niet met het aanwezige aantal: is {} maar moet zijn {} (niet gevonden: {})",
        result.matched(),
        result.token_count,
        result.unmatched.join(", ")
    ))
}

pub const ABSENT_HEADERS: [&str; 4] = ["Weergavenaam", "Voornaam", "Achternaam", "Partij"];
pub const COUNT_HEADERS: [&str; 2] = ["Kamerlid", "Afwezig"];

pub fn headers(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| s!(*c)).collect()
}

/// Absent members with whatever display parts are known.
pub fn absent_rows(result: &MatchResult) -> Vec<Vec<String>> {
    result
        .absent
        .iter()
        .map(|e| match &e.display {
            Some(d) => vec![
                s!(e.label()),
                d.first_name.clone(),
                d.last_name.clone(),
                d.party.clone(),
            ],
            None => vec![e.key.clone(), s!(), s!(), s!()],
        })
        .collect()
}

pub fn absent_table(result: &MatchResult) -> String {
    to_table(&headers(&ABSENT_HEADERS), &absent_rows(result))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbsenteeCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// How often each member was absent over the reconciled reports,
/// most absences first, then by key.
pub fn absentee_counts(days: &[DayOutcome]) -> Vec<AbsenteeCount> {
    let mut by_key: HashMap<&str, AbsenteeCount> = HashMap::new();
    for result in days.iter().flat_map(|d| d.results()) {
        for e in &result.absent {
            by_key
                .entry(e.key.as_str())
                .or_insert_with(|| AbsenteeCount { key: e.key.clone(), label: s!(e.label()), count: 0 })
                .count += 1;
        }
    }
    let mut out: Vec<AbsenteeCount> = by_key.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    out
}

pub fn count_rows(counts: &[AbsenteeCount]) -> Vec<Vec<String>> {
    counts
        .iter()
        .map(|c| vec![c.label.clone(), c.count.to_string()])
        .collect()
}

pub fn counts_table(counts: &[AbsenteeCount]) -> String {
    to_table(&headers(&COUNT_HEADERS), &count_rows(counts))
}

/// Write the absentee counts as CSV with a header row.
pub fn export_counts(path: &Path, counts: &[AbsenteeCount]) -> Result<()> {
    let headers = [s!("Sleutel"), s!("Kamerlid"), s!("Afwezig")];
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|c| vec![c.key.clone(), c.label.clone(), c.count.to_string()])
        .collect();
    write_rows_start(path, Some(&headers[..]), EXPORT_SEP)?;
    append_rows(path, &rows, EXPORT_SEP)
}

/// Present and absent totals over all reconciled reports.
pub fn totals(days: &[DayOutcome]) -> (usize, usize) {
    days.iter()
        .flat_map(|d| d.results())
        .fold((0, 0), |(p, a), r| (p + r.present.len(), a + r.absent.len()))
}
