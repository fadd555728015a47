// src/cli.rs
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use log::{info, warn};

use crate::{
    config::consts::*,
    config::options::*,
    core::net::Api,
    error::{PresenceError, Result},
    logging,
    progress::{ConsoleProgress, Progress},
    roster::Roster,
    runner::{self, RunSummary},
    select::{self, Choice},
    specs::{listing, persons},
    summary,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Matcher {
    Prefix,
    Similarity,
}

/// Attendance of Tweede Kamer members per plenary report.
///
/// Without --date or --from/--to the dates are asked interactively.
#[derive(Debug, Parser)]
#[command(name = "tk_aanwezig", version)]
pub struct Args {
    /// Single date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["from", "to"])]
    pub date: Option<NaiveDate>,

    /// Range start (exclusive), YYYY-MM-DD
    #[arg(long, value_parser = parse_date, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Range end (inclusive), YYYY-MM-DD
    #[arg(long, value_parser = parse_date, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Mirror log lines into <logs-dir>/debug.log
    #[arg(long)]
    pub log_file: bool,

    /// Fail a report when an extracted name matches nobody
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = Matcher::Prefix)]
    pub matcher: Matcher,

    /// Acceptance threshold for --matcher similarity
    #[arg(long, default_value_t = SIMILARITY_THRESHOLD)]
    pub threshold: f64,

    /// latest | all | soort=<name> | comma-separated report ID fragments
    #[arg(long)]
    pub select: Option<String>,

    /// Use speaker records when a report has no attendance list
    #[arg(long)]
    pub speakers: bool,

    /// Show the pie chart window
    #[arg(long, conflicts_with = "no_chart")]
    pub chart: bool,

    /// Never ask about the chart
    #[arg(long)]
    pub no_chart: bool,

    /// Write absentee counts as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Rebuild the roster files from the API before running
    #[arg(long)]
    pub refresh_roster: bool,

    #[arg(long, env = "TK_ROSTER", default_value = ROSTER_FILE)]
    pub roster: PathBuf,

    #[arg(long, env = "TK_NAMES", default_value = NAMES_FILE)]
    pub names: PathBuf,

    #[arg(long, env = "TK_LOGS_DIR", default_value = LOGS_DIR)]
    pub logs_dir: PathBuf,

    #[arg(long, env = "TK_API_URL", default_value = API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = TIMEOUT_SECS)]
    pub timeout: u64,

    /// Retries for failed requests
    #[arg(long, default_value_t = MAX_RETRIES)]
    pub retries: u32,
}

impl Args {
    pub fn is_interactive(&self) -> bool {
        self.date.is_none() && self.from.is_none()
    }

    pub fn to_options(&self) -> RunOptions {
        RunOptions {
            selection: self
                .select
                .as_deref()
                .map(select::parse_selection_arg)
                .unwrap_or(Selection::Latest),
            matcher: match self.matcher {
                Matcher::Prefix => MatchStrategy::Prefix,
                Matcher::Similarity => MatchStrategy::Similarity { threshold: self.threshold },
            },
            policy: if self.strict { MismatchPolicy::Strict } else { MismatchPolicy::Advisory },
            extract: if self.speakers { ExtractMode::WithSpeakers } else { ExtractMode::MarkerOnly },
            net: NetOptions {
                api_url: self.api_url.clone(),
                timeout_secs: self.timeout,
                retries: self.retries,
                ..NetOptions::default()
            },
            paths: PathOptions {
                roster: self.roster.clone(),
                names: self.names.clone(),
                logs_dir: self.logs_dir.clone(),
            },
            chart: self.chart,
            export: self.export.clone(),
        }
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| PresenceError::Date(s!(s.trim())))
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    let mirror = args.log_file.then(|| args.logs_dir.join(DEBUG_LOG_FILE));
    logging::init(args.debug, mirror.as_deref());

    let mut opts = args.to_options();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    if args.refresh_roster {
        let api = Api::new(&opts.net)?;
        let roster = persons::fetch_roster(&api)?;
        roster.save(&opts.paths.roster, &opts.paths.names)?;
        println!("{} Kamerleden opgeslagen in {}", roster.len(), opts.paths.roster.display());
        if args.is_interactive() {
            return Ok(());
        }
    }

    let dates = match (args.date, args.from, args.to) {
        (Some(d), _, _) => DateSelector::One(d),
        (None, Some(a), Some(b)) => DateSelector::range(a, b),
        _ => prompt_dates(&mut input, &mut out)?,
    };

    if args.is_interactive() {
        if !args.chart && !args.no_chart {
            opts.chart = prompt_yes_no(&mut input, &mut out, "Grafiekje maken? j/n: ")?;
        }
        if args.select.is_none() {
            if let DateSelector::One(date) = dates {
                let api = Api::new(&opts.net)?;
                match choose_reports(&api, date, &mut input, &mut out)? {
                    Some(sel) => opts.selection = sel,
                    None => return Ok(()),
                }
            }
        }
    }

    let roster = Roster::load(&opts.paths.roster, &opts.paths.names)?;
    info!("Roster: {} members", roster.len());

    let mut console = ConsoleProgress::default();
    let progress: Option<&mut dyn Progress> = match dates {
        DateSelector::Range { .. } => Some(&mut console),
        DateSelector::One(_) => None,
    };
    let run_summary = runner::run(&opts, &dates, roster, progress)?;

    print_summary(&mut out, &run_summary)?;
    finish(&opts, &run_summary)
}

/// Menu: single date or range. Re-asks until the answer parses.
pub fn prompt_dates<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<DateSelector> {
    loop {
        let choice = ask(input, out, "1: Zelf datum opgeven\n2: Bereik van data\nUw keuze: ")?;
        match choice.as_str() {
            "1" => {
                let d = prompt_date(input, out, "Geef een datum op (YYYY-MM-DD): ")?;
                return Ok(DateSelector::One(d));
            }
            "2" => {
                let a = prompt_date(input, out, "Geef een eerste datum op (YYYY-MM-DD): ")?;
                let b = prompt_date(input, out, "Geef een tweede datum op (YYYY-MM-DD): ")?;
                return Ok(DateSelector::range(a, b));
            }
            _ => writeln!(out, "Verkeerde invoer (alleen \"1\" of \"2\")")?,
        }
    }
}

pub fn prompt_date<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<NaiveDate> {
    loop {
        let line = ask(input, out, question)?;
        match parse_date(&line) {
            Ok(d) => return Ok(d),
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

pub fn prompt_yes_no<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<bool> {
    loop {
        match ask(input, out, question)?.to_lowercase().as_str() {
            "j" | "ja" | "y" | "yes" => return Ok(true),
            "n" | "nee" | "no" => return Ok(false),
            _ => writeln!(out, "Verkeerde invoer (alleen \"j\" of \"n\")")?,
        }
    }
}

/// Let the user pick among a day's reports. `None` means exit.
pub fn choose_reports<R: BufRead, W: Write>(
    api: &Api,
    date: NaiveDate,
    input: &mut R,
    out: &mut W,
) -> Result<Option<Selection>> {
    // The run lists the day again, so a failure here only skips the menu.
    let metas = match listing::fetch(api, date) {
        Ok(metas) => metas,
        Err(e) => {
            warn!("{date}: cannot list reports ({e}); using the latest");
            return Ok(Some(Selection::Latest));
        }
    };
    if metas.len() <= 1 {
        return Ok(Some(Selection::Latest));
    }

    writeln!(out, "Verslagen op {date}:")?;
    for m in &metas {
        writeln!(
            out,
            "  {}  {}  {}  {}",
            m.id,
            m.soort.as_deref().unwrap_or("-"),
            m.status.as_deref().unwrap_or("-"),
            m.gewijzigd_op.as_deref().unwrap_or("-"),
        )?;
    }

    loop {
        let line = ask(
            input,
            out,
            "Kies verslag-ID's (Enter = meest recent, all = alle, exit = stoppen): ",
        )?;
        let frags = match select::parse_choice(&line) {
            Choice::Exit => return Ok(None),
            Choice::Select(Selection::ByIdFragments(f)) => f,
            Choice::Select(sel) => return Ok(Some(sel)),
        };

        let found = select::match_fragments(&metas, &frags);
        for u in &found.unknown {
            writeln!(out, "Geen verslag gevonden voor '{u}'")?;
        }
        if found.picked.is_empty() {
            continue;
        }
        let mut confirmed = true;
        for (frag, hits) in &found.ambiguous {
            let q = format!("'{frag}' past op {} verslagen. Allemaal gebruiken? j/n: ", hits.len());
            if !prompt_yes_no(input, out, &q)? {
                confirmed = false;
                break;
            }
        }
        if confirmed {
            let ids = found.picked.iter().map(|i| metas[*i].id.clone()).collect();
            return Ok(Some(Selection::ByIdFragments(ids)));
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> Result<String> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = s!();
    if input.read_line(&mut line)? == 0 {
        return Err(PresenceError::Input(s!("input closed")));
    }
    Ok(line.trim().to_string())
}

/// Per-day results, then absentee counts when more than one report ran.
pub fn print_summary<W: Write>(out: &mut W, run_summary: &RunSummary) -> Result<()> {
    let mut reconciled = 0usize;
    for day in &run_summary.days {
        if let Some(reason) = day.skipped {
            writeln!(out, "{}: overgeslagen ({reason:?})", day.date)?;
            continue;
        }
        for report in &day.reports {
            let kind = report.header.soort.as_deref().unwrap_or("?");
            writeln!(out, "\n{} verslag {} ({kind})", day.date, report.id)?;
            let Some(result) = &report.result else {
                writeln!(out, "Geen aanwezigheidslijst gevonden")?;
                continue;
            };
            reconciled += 1;
            writeln!(out, "{}", summary::summary_line(result))?;
            if let Some(line) = summary::mismatch_line(result) {
                writeln!(out, "{line}")?;
            }
            if !result.absent.is_empty() {
                write!(out, "{}", summary::absent_table(result))?;
            }
        }
        for (id, msg) in &day.errors {
            writeln!(out, "{}: verslag {id} mislukt: {msg}", day.date)?;
        }
    }
    for (date, msg) in &run_summary.failed {
        writeln!(out, "{date}: mislukt: {msg}")?;
    }

    if reconciled > 1 {
        let counts = summary::absentee_counts(&run_summary.days);
        let (present, absent) = summary::totals(&run_summary.days);
        writeln!(out, "\nTotaal over {reconciled} verslagen: {present} aanwezig, {absent} afwezig")?;
        write!(out, "{}", summary::counts_table(&counts))?;
    }
    Ok(())
}

fn finish(opts: &RunOptions, run_summary: &RunSummary) -> Result<()> {
    if let Some(path) = &opts.export {
        let counts = summary::absentee_counts(&run_summary.days);
        summary::export_counts(path, &counts)?;
        info!("Absentee counts written to {}", path.display());
    }
    if opts.chart {
        show_chart(run_summary);
    }
    Ok(())
}

#[cfg(feature = "chart")]
fn show_chart(run_summary: &RunSummary) {
    use crate::gui::{self, ChartData};

    let results: Vec<_> = run_summary.days.iter().flat_map(|d| d.results()).collect();
    let data = match results.as_slice() {
        [] => {
            warn!("Nothing to chart");
            return;
        }
        [single] => ChartData {
            title: s!("Aanwezigheid"),
            present: single.present.len(),
            absent: single.absent.len(),
            headers: summary::headers(&summary::ABSENT_HEADERS),
            rows: summary::absent_rows(single),
        },
        _ => {
            let (present, absent) = summary::totals(&run_summary.days);
            ChartData {
                title: format!("Aanwezigheid over {} verslagen", results.len()),
                present,
                absent,
                headers: summary::headers(&summary::COUNT_HEADERS),
                rows: summary::count_rows(&summary::absentee_counts(&run_summary.days)),
            }
        }
    };
    if let Err(e) = gui::run(data) {
        warn!("Chart window failed: {e}");
    }
}

#[cfg(not(feature = "chart"))]
fn show_chart(_run_summary: &RunSummary) {
    warn!("Built without the 'chart' feature; no chart shown");
}
