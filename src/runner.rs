// src/runner.rs
use std::{
    path::PathBuf, thread, time::Duration,
    sync::{ mpsc, Arc, atomic::{ AtomicUsize, Ordering }},
};

use chrono::{Datelike, Local, NaiveDate, Weekday};
use log::{error, info, warn};

use crate::{
    config::consts::{ workers, JITTER_MS, PARALLEL_THRESHOLD_DAYS, REQUEST_PAUSE_MS },
    config::options::{ DateSelector, RunOptions, Selection },
    core::net::Api,
    error::Result,
    progress::Progress,
    reconcile::{ reconcile, MatchResult },
    roster::Roster,
    select,
    specs::{ listing::{ self, ReportMeta }, report::{ ListSource, Report, ReportHeader } },
    store,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Weekend,
    /// Today's report is not final yet.
    Today,
    NoReports,
    /// Reports exist, none is a published plenary one.
    NoEligible,
}

#[derive(Clone, Debug)]
pub struct ReportOutcome {
    pub id: String,
    pub header: ReportHeader,
    pub source: ListSource,
    pub declared: Option<usize>,
    /// `None` when the report had no attendance list.
    pub result: Option<MatchResult>,
}

#[derive(Clone, Debug)]
pub struct DayOutcome {
    pub date: NaiveDate,
    pub skipped: Option<SkipReason>,
    pub reports: Vec<ReportOutcome>,
    /// Reports that failed, as (id, message); siblings still ran.
    pub errors: Vec<(String, String)>,
}

impl DayOutcome {
    fn skipped(date: NaiveDate, reason: SkipReason) -> Self {
        Self { date, skipped: Some(reason), reports: Vec::new(), errors: Vec::new() }
    }

    /// Reconciled results of this day, in report order.
    pub fn results(&self) -> impl Iterator<Item = &MatchResult> {
        self.reports.iter().filter_map(|r| r.result.as_ref())
    }
}

/// What a run produced, sorted by date.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub days: Vec<DayOutcome>,
    pub failed: Vec<(NaiveDate, String)>,
}

pub fn skip_reason(date: NaiveDate, today: NaiveDate) -> Option<SkipReason> {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        Some(SkipReason::Weekend)
    } else if date == today {
        Some(SkipReason::Today)
    } else {
        None
    }
}

/// Fetch, pick, extract and reconcile the reports of one date.
///
/// Errors on the listing are returned; errors on a single report are kept in
/// [`DayOutcome::errors`] so the other reports of the day still run.
pub fn process_day(
    api: &Api,
    roster: &Roster,
    opts: &RunOptions,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<DayOutcome> {
    if let Some(reason) = skip_reason(date, today) {
        info!("{date}: skipped ({reason:?})");
        return Ok(DayOutcome::skipped(date, reason));
    }

    let metas = listing::fetch(api, date)?;
    if metas.is_empty() {
        info!("{date}: no reports");
        return Ok(DayOutcome::skipped(date, SkipReason::NoReports));
    }

    let mut day = DayOutcome { date, skipped: None, reports: Vec::new(), errors: Vec::new() };

    let mut fetched: Vec<(&ReportMeta, Report)> = Vec::new();
    for i in select::prefilter(&metas, &opts.selection) {
        let meta = &metas[i];
        match listing::fetch_resource(api, &meta.id).and_then(|b| Report::parse(&b)) {
            Ok(report) => fetched.push((meta, report)),
            Err(e) => {
                warn!("{date}: report {} skipped: {e}", meta.id);
                day.errors.push((meta.id.clone(), e.to_string()));
            }
        }
    }

    if opts.selection == Selection::Latest {
        let headers: Vec<ReportHeader> = fetched.iter().map(|(_, r)| r.header.clone()).collect();
        match select::latest(&headers) {
            Some(i) => {
                let keep = fetched.swap_remove(i);
                fetched = vec![keep];
            }
            None => {
                if day.errors.is_empty() {
                    info!("{date}: no published plenary report");
                    day.skipped = Some(SkipReason::NoEligible);
                }
                return Ok(day);
            }
        }
    }

    // The day's log is only replaced once there is something to write.
    let mut log_file: Option<PathBuf> = None;
    let tag_reports = fetched.len() > 1;
    for (meta, report) in fetched {
        match reconcile_report(roster, opts, meta, &report) {
            Ok(outcome) => {
                if let Some(result) = &outcome.result {
                    if log_file.is_none() {
                        log_file = Some(store::start_day(&opts.paths.logs_dir, date)?);
                    }
                    if let Some(path) = &log_file {
                        let tag = tag_reports.then_some(meta.id.as_str());
                        store::append_report(path, tag, result)?;
                    }
                }
                day.reports.push(outcome);
            }
            Err(e) => {
                warn!("{date}: report {} failed: {e}", meta.id);
                day.errors.push((meta.id.clone(), e.to_string()));
            }
        }
    }
    Ok(day)
}

fn reconcile_report(
    roster: &Roster,
    opts: &RunOptions,
    meta: &ReportMeta,
    report: &Report,
) -> Result<ReportOutcome> {
    let attendance = report.attendance(opts.extract);
    let mut outcome = ReportOutcome {
        id: meta.id.clone(),
        header: report.header.clone(),
        source: attendance.source,
        declared: attendance.declared,
        result: None,
    };
    if attendance.is_empty() {
        info!("Report {}: no attendance list", meta.id);
        return Ok(outcome);
    }

    // Parties come from the speaker records of the same report.
    let parties: Vec<(String, String)> = report
        .speakers()
        .into_iter()
        .filter(|s| !s.display.party.is_empty())
        .map(|s| (s.key, s.display.party))
        .collect();
    let result = if parties.is_empty() {
        reconcile(roster, &attendance.tokens, opts.matcher)?
    } else {
        let mut enriched = roster.clone();
        enriched.attach_parties(&parties);
        reconcile(&enriched, &attendance.tokens, opts.matcher)?
    };
    opts.policy.check(&result)?;
    outcome.result = Some(result);
    Ok(outcome)
}

/// Run every date of `dates` against `roster`.
pub fn run(
    opts: &RunOptions,
    dates: &DateSelector,
    roster: Roster,
    progress: Option<&mut (dyn Progress + '_)>,
) -> Result<RunSummary> {
    run_at(opts, dates, roster, Local::now().date_naive(), progress)
}

/// [`run`] with an explicit "today".
pub fn run_at(
    opts: &RunOptions,
    dates: &DateSelector,
    roster: Roster,
    today: NaiveDate,
    mut progress: Option<&mut (dyn Progress + '_)>,
) -> Result<RunSummary> {
    let api = Api::new(&opts.net)?;
    let days = dates.days();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(days.len());
    }

    let mut summary = if dates.span_days() > PARALLEL_THRESHOLD_DAYS {
        status!(progress, "Processing {} dates on {} workers…", days.len(), workers());
        run_pool(api, opts, roster, days, today, progress.as_deref_mut())
    } else {
        run_sequential(&api, opts, &roster, &days, today, progress.as_deref_mut())
    };

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    // Sort
    summary.days.sort_by_key(|d| d.date);
    summary.failed.sort_by_key(|(d, _)| *d);
    Ok(summary)
}

fn run_sequential(
    api: &Api,
    opts: &RunOptions,
    roster: &Roster,
    days: &[NaiveDate],
    today: NaiveDate,
    mut progress: Option<&mut (dyn Progress + '_)>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for &date in days {
        match process_day(api, roster, opts, date, today) {
            Ok(day) => {
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(date);
                }
                summary.days.push(day);
            }
            Err(e) => {
                error!("{date}: {e}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(date, &e.to_string());
                }
                summary.failed.push((date, e.to_string()));
            }
        }
    }
    summary
}

fn run_pool(
    api: Api,
    opts: &RunOptions,
    roster: Roster,
    days: Vec<NaiveDate>,
    today: NaiveDate,
    mut progress: Option<&mut (dyn Progress + '_)>,
) -> RunSummary {
    type DayResult = (NaiveDate, std::result::Result<DayOutcome, String>);

    let api = Arc::new(api);
    let roster = Arc::new(roster);
    let opts = Arc::new(opts.clone());
    let days = Arc::new(days);
    let counter = Arc::new(AtomicUsize::new(0));
    let (res_tx, res_rx) = mpsc::channel::<DayResult>();

    let n_workers = workers().min(days.len()).max(1);

    for _ in 0..n_workers {
        let api = Arc::clone(&api);
        let roster = Arc::clone(&roster);
        let opts = Arc::clone(&opts);
        let days = Arc::clone(&days);
        let idx = Arc::clone(&counter);
        let tx = res_tx.clone();

        thread::spawn(move || {
            loop {
                let i = idx.fetch_add(1, Ordering::Relaxed);
                if i >= days.len() {
                    break;
                }
                let date = days[i];
                let result = process_day(&api, &roster, &opts, date, today)
                    .map_err(|e| e.to_string());
                let fetched = matches!(&result, Ok(d) if d.skipped != Some(SkipReason::Weekend) && d.skipped != Some(SkipReason::Today));
                if tx.send((date, result)).is_err() {
                    break;
                }
                if fetched {
                    let jitter = date.ordinal() as u64 % JITTER_MS;
                    thread::sleep(Duration::from_millis(REQUEST_PAUSE_MS + jitter)); // be polite
                }
            }
        });
    }
    drop(res_tx); // main thread is sole receiver now

    // Aggregate; arrival order is arbitrary, run_at sorts afterwards.
    let mut summary = RunSummary::default();
    for _ in 0..days.len() {
        match res_rx.recv() {
            Ok((date, Ok(day))) => {
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(date);
                }
                summary.days.push(day);
            }
            Ok((date, Err(msg))) => {
                error!("{date}: {msg}");
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(date, &msg);
                }
                summary.failed.push((date, msg));
            }
            Err(_) => break, // workers ended early; bail gracefully
        }
    }
    summary
}
