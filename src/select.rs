// src/select.rs
//! Picking which of a day's reports to reconcile.

use crate::config::options::Selection;
use crate::specs::listing::ReportMeta;
use crate::specs::report::ReportHeader;

/// Parsed answer to the interactive report prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice {
    Select(Selection),
    Exit,
}

/// Enter → latest, `all`, `exit`, otherwise comma-separated ID fragments.
pub fn parse_choice(line: &str) -> Choice {
    let t = line.trim();
    match t.to_lowercase().as_str() {
        "" | "latest" => Choice::Select(Selection::Latest),
        "all" => Choice::Select(Selection::All),
        "exit" | "quit" => Choice::Exit,
        _ => Choice::Select(Selection::ByIdFragments(split_fragments(t))),
    }
}

/// Value of `--select`: `latest`, `all`, `soort=<name>` or ID fragments.
pub fn parse_selection_arg(arg: &str) -> Selection {
    let t = arg.trim();
    if let Some(kind) = t.strip_prefix("soort=") {
        return Selection::BySoort(s!(kind.trim()));
    }
    match parse_choice(t) {
        Choice::Select(sel) => sel,
        Choice::Exit => Selection::Latest,
    }
}

fn split_fragments(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of resolving ID fragments against a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentMatch {
    /// Listing indices, deduplicated, in listing order.
    pub picked: Vec<usize>,
    /// Fragments that hit more than one report, with the hits.
    pub ambiguous: Vec<(String, Vec<usize>)>,
    pub unknown: Vec<String>,
}

pub fn match_fragments(metas: &[ReportMeta], fragments: &[String]) -> FragmentMatch {
    let mut out = FragmentMatch::default();
    for frag in fragments {
        let needle = frag.to_lowercase();
        let hits: Vec<usize> = metas
            .iter()
            .enumerate()
            .filter(|(_, m)| m.id.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        match hits.len() {
            0 => out.unknown.push(frag.clone()),
            1 => out.picked.push(hits[0]),
            _ => {
                out.picked.extend(&hits);
                out.ambiguous.push((frag.clone(), hits));
            }
        }
    }
    out.picked.sort_unstable();
    out.picked.dedup();
    out
}

/// Listing indices a selection keeps before any document is fetched.
/// `Latest` keeps everything; it needs the headers to decide.
pub fn prefilter(metas: &[ReportMeta], selection: &Selection) -> Vec<usize> {
    match selection {
        Selection::Latest | Selection::All => (0..metas.len()).collect(),
        Selection::BySoort(kind) => metas
            .iter()
            .enumerate()
            .filter(|(_, m)| m.soort.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(kind)))
            .map(|(i, _)| i)
            .collect(),
        Selection::ByIdFragments(frags) => match_fragments(metas, frags).picked,
    }
}

/// Index of the eligible header with the greatest full timestamp.
/// Headers without a timestamp sort below all others; ties keep the first.
pub fn latest(headers: &[ReportHeader]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, h) in headers.iter().enumerate() {
        if !h.eligible_as_latest() {
            continue;
        }
        match best {
            Some(b) if headers[b].timestamp >= h.timestamp => {}
            _ => best = Some(i),
        }
    }
    best
}
