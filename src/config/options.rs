// src/config/options.rs
use std::path::PathBuf;

use chrono::NaiveDate;

use super::consts::*;

#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub selection: Selection,
    pub matcher: MatchStrategy,
    pub policy: MismatchPolicy,
    pub extract: ExtractMode,
    pub net: NetOptions,
    pub paths: PathOptions,
    pub chart: bool,
    pub export: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            selection: Selection::Latest,
            matcher: MatchStrategy::Prefix,
            policy: MismatchPolicy::Advisory,
            extract: ExtractMode::MarkerOnly,
            net: NetOptions::default(),
            paths: PathOptions::default(),
            chart: false,
            export: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateSelector {
    One(NaiveDate),
    /// Exclusive `from`, inclusive `to`: the first processed day is `from + 1`.
    Range { from: NaiveDate, to: NaiveDate },
}

impl DateSelector {
    /// Build a range, swapping the ends if they were given backwards.
    pub fn range(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            DateSelector::Range { from: a, to: b }
        } else {
            DateSelector::Range { from: b, to: a }
        }
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        match self {
            DateSelector::One(d) => vec![*d],
            DateSelector::Range { from, to } => from
                .iter_days()
                .skip(1)
                .take_while(|d| d <= to)
                .collect(),
        }
    }

    pub fn span_days(&self) -> i64 {
        match self {
            DateSelector::One(_) => 1,
            DateSelector::Range { from, to } => (*to - *from).num_days(),
        }
    }
}

/// Which of a day's reports get reconciled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Most recent non-prepublication plenary report.
    Latest,
    All,
    /// Reports whose `Soort` matches, case-insensitive.
    BySoort(String),
    /// Reports whose `Id` contains any of the fragments.
    ByIdFragments(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchStrategy {
    /// Anchored prefix comparison that tolerates one differing tail character.
    Prefix,
    /// Sørensen–Dice bigram similarity with an acceptance threshold.
    Similarity { threshold: f64 },
}

impl MatchStrategy {
    pub fn similarity() -> Self {
        MatchStrategy::Similarity { threshold: SIMILARITY_THRESHOLD }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Log the unmatched names and keep the partial partition.
    Advisory,
    /// Fail the report when any extracted name stays unmatched.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractMode {
    MarkerOnly,
    /// Fall back to the speaker records when the attendance paragraph is missing.
    WithSpeakers,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetOptions {
    pub api_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            api_url: s!(API_URL),
            timeout_secs: TIMEOUT_SECS,
            retries: MAX_RETRIES,
            backoff_ms: BACKOFF_BASE_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathOptions {
    pub roster: PathBuf,
    pub names: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            roster: PathBuf::from(ROSTER_FILE),
            names: PathBuf::from(NAMES_FILE),
            logs_dir: PathBuf::from(LOGS_DIR),
        }
    }
}
