// src/reconcile.rs
//! Partition a roster into present and absent members given the names
//! extracted from a report.
//!
//! Roster order decides who gets a token first, and every token is consumed
//! at most once. Names that no roster entry claims end up in
//! [`MatchResult::unmatched`]; whether that is fatal is up to the caller
//! (see [`MismatchPolicy::check`]).

use std::collections::HashSet;

use log::{debug, warn};

use crate::config::options::{MatchStrategy, MismatchPolicy};
use crate::error::{PresenceError, Result};
use crate::roster::{Roster, RosterEntry};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub present: Vec<RosterEntry>,
    pub absent: Vec<RosterEntry>,
    /// Extracted names no roster entry claimed, in list order.
    pub unmatched: Vec<String>,
    /// Non-empty names that went into matching.
    pub token_count: usize,
}

impl MatchResult {
    pub fn matched(&self) -> usize {
        self.present.len()
    }

    /// Every extracted name found a roster entry.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Anchored prefix comparison of roster `key` (target) and extracted `token` (source).
///
/// Counts equal characters from the start until the first difference and
/// accepts once the run covers all but the last character of the token,
/// also when either string runs out first. A one-character token therefore
/// matches any key.
pub fn prefix_match(key: &str, token: &str) -> bool {
    let need = token.chars().count().saturating_sub(1);
    if need == 0 {
        return true;
    }
    let mut run = 0usize;
    for (a, b) in key.chars().zip(token.chars()) {
        if a != b {
            break;
        }
        run += 1;
        if run >= need {
            return true;
        }
    }
    run >= need
}

pub fn similarity(key: &str, token: &str) -> f64 {
    strsim::sorensen_dice(key, token)
}

/// Reject lists that cannot be reconciled and drop empty entries.
fn validate(tokens: &[String]) -> Result<Vec<&str>> {
    let names: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty())
        .collect();
    if names.is_empty() {
        return Err(PresenceError::Input(s!("no members found in attendance list")));
    }
    let mut seen = HashSet::with_capacity(names.len());
    for name in &names {
        if !seen.insert(*name) {
            return Err(PresenceError::Input(format!(
                "duplicate name in attendance list: {name}"
            )));
        }
    }
    Ok(names)
}

fn pick_token(key: &str, names: &[&str], consumed: &[bool], strategy: MatchStrategy) -> Option<usize> {
    let open = names.iter().enumerate().filter(|(i, _)| !consumed[*i]);
    match strategy {
        MatchStrategy::Prefix => open
            .filter(|(_, t)| prefix_match(key, t))
            .map(|(i, _)| i)
            .next(),
        MatchStrategy::Similarity { threshold } => {
            let mut best: Option<(usize, f64)> = None;
            for (i, t) in open {
                let score = similarity(key, t);
                if score < threshold {
                    continue;
                }
                // strict '>' keeps the earliest token on ties
                if best.is_none_or(|(_, b)| score > b) {
                    best = Some((i, score));
                }
            }
            best.map(|(i, _)| i)
        }
    }
}

/// Split `roster` into present and absent members.
///
/// Fails with [`PresenceError::Input`] when `tokens` has no non-empty name
/// or repeats a name. Never fails because a single name went unmatched.
pub fn reconcile(roster: &Roster, tokens: &[String], strategy: MatchStrategy) -> Result<MatchResult> {
    let names = validate(tokens)?;
    let mut consumed = vec![false; names.len()];
    let mut present = Vec::new();
    let mut absent = Vec::new();

    for entry in roster.entries() {
        match pick_token(&entry.key, &names, &consumed, strategy) {
            Some(i) => {
                consumed[i] = true;
                debug!("match: {} <- {}", entry.key, names[i]);
                present.push(entry.clone());
            }
            None => absent.push(entry.clone()),
        }
    }

    let unmatched = names
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(n, _)| n.to_string())
        .collect();

    Ok(MatchResult { present, absent, unmatched, token_count: names.len() })
}

impl MismatchPolicy {
    /// Apply the policy to a finished partition.
    pub fn check(self, result: &MatchResult) -> Result<()> {
        if result.is_complete() {
            return Ok(());
        }
        let mismatch = PresenceError::Mismatch {
            matched: result.matched(),
            expected: result.token_count,
            unmatched: result.unmatched.clone(),
        };
        match self {
            MismatchPolicy::Strict => Err(mismatch),
            MismatchPolicy::Advisory => {
                warn!("{mismatch}");
                Ok(())
            }
        }
    }
}
