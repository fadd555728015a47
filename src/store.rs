// src/store.rs
//
// Per-date attendance logs: `{logs_dir}/log{YYYY-MM-DD}.txt`.
//
//   Aanwezig:
//   <name>
//   ...
//
//   Afwezig:
//   <name>
//
// A day with several reconciled reports gets one `Verslag <id>` line before
// each pair of sections.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::Result;
use crate::file::{append_lines, write_lines};
use crate::reconcile::MatchResult;

pub const PRESENT_HEADER: &str = "Aanwezig:";
pub const ABSENT_HEADER: &str = "Afwezig:";
const REPORT_PREFIX: &str = "Verslag ";

pub fn log_path(logs_dir: &Path, date: NaiveDate) -> PathBuf {
    logs_dir.join(format!("log{}.txt", date.format("%Y-%m-%d")))
}

/// Create or truncate the day's log and return its path.
pub fn start_day(logs_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let path = log_path(logs_dir, date);
    write_lines(&path, &[])?;
    Ok(path)
}

/// Append the present and absent sections for one report.
pub fn append_report(path: &Path, report_id: Option<&str>, result: &MatchResult) -> Result<()> {
    let tag = report_id.map(|id| join!(REPORT_PREFIX, id));
    let mut lines: Vec<&str> = Vec::with_capacity(result.present.len() + result.absent.len() + 4);
    if let Some(t) = &tag {
        lines.push(t);
    }
    lines.push(PRESENT_HEADER);
    lines.extend(result.present.iter().map(|e| e.label()));
    lines.push("");
    lines.push(ABSENT_HEADER);
    lines.extend(result.absent.iter().map(|e| e.label()));
    append_lines(path, &lines)
}

/// One pair of sections read back from a day log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayLog {
    pub report_id: Option<String>,
    pub present: Vec<String>,
    pub absent: Vec<String>,
}

pub fn read_day(path: &Path) -> Result<Vec<DayLog>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_day(&text))
}

pub fn parse_day(text: &str) -> Vec<DayLog> {
    enum Section { None, Present, Absent }

    let mut out: Vec<DayLog> = Vec::new();
    let mut section = Section::None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(id) = line.strip_prefix(REPORT_PREFIX) {
            out.push(DayLog { report_id: Some(s!(id)), ..DayLog::default() });
            section = Section::None;
            continue;
        }
        match line {
            PRESENT_HEADER => {
                // A new pair starts unless an id line just opened one.
                let fresh = matches!(out.last(), Some(d) if d.present.is_empty() && d.absent.is_empty() && d.report_id.is_some());
                if !fresh {
                    out.push(DayLog::default());
                }
                section = Section::Present;
            }
            ABSENT_HEADER => section = Section::Absent,
            "" => {}
            name => {
                let Some(day) = out.last_mut() else { continue };
                match section {
                    Section::Present => day.present.push(s!(name)),
                    Section::Absent => day.absent.push(s!(name)),
                    Section::None => {}
                }
            }
        }
    }
    out
}
