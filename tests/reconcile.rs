// tests/reconcile.rs
use std::collections::HashSet;

use tk_aanwezig::config::options::{MatchStrategy, MismatchPolicy};
use tk_aanwezig::reconcile::reconcile;
use tk_aanwezig::roster::Roster;
use tk_aanwezig::PresenceError;

fn toks(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn keys(entries: &[tk_aanwezig::roster::RosterEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.key.as_str()).collect()
}

fn roster() -> Roster {
    Roster::from_keys(["aardema", "aartsen", "elabassi", "agema", "vanbaarle", "bamenga"])
}

#[test]
fn exact_match_marks_everyone_present() {
    let r = Roster::from_keys(["agema", "baarle"]);
    let res = reconcile(&r, &toks(&["agema", "baarle"]), MatchStrategy::Prefix).unwrap();
    assert_eq!(keys(&res.present), vec!["agema", "baarle"]);
    assert!(res.absent.is_empty());
    assert!(res.is_complete());
}

#[test]
fn one_extra_trailing_char_still_matches() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["agemaa"]), MatchStrategy::Prefix).unwrap();
    assert_eq!(keys(&res.present), vec!["agema"]);
    assert!(res.absent.is_empty());
}

#[test]
fn unrelated_name_is_reported_not_dropped() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["white"]), MatchStrategy::Prefix).unwrap();
    assert!(res.present.is_empty());
    assert_eq!(keys(&res.absent), vec!["agema"]);
    assert_eq!(res.unmatched, vec!["white"]);
    assert_eq!(res.token_count, 1);
    assert!(!res.is_complete());
}

#[test]
fn single_letter_token_takes_the_first_open_member() {
    let r = Roster::from_keys(["agema", "bamenga"]);
    let res = reconcile(&r, &toks(&["x"]), MatchStrategy::Prefix).unwrap();
    assert_eq!(keys(&res.present), vec!["agema"]);
    assert_eq!(keys(&res.absent), vec!["bamenga"]);
    assert!(res.is_complete());
}

#[test]
fn partition_is_complete_and_disjoint() {
    let r = roster();
    let res = reconcile(
        &r,
        &toks(&["aardema", "agema", "vanbaarle", "bamenga", "elabassi", "white"]),
        MatchStrategy::Prefix,
    )
    .unwrap();

    let present: HashSet<&str> = keys(&res.present).into_iter().collect();
    let absent: HashSet<&str> = keys(&res.absent).into_iter().collect();
    assert!(present.is_disjoint(&absent));
    let all: HashSet<&str> = present.union(&absent).copied().collect();
    let expected: HashSet<&str> = keys(r.entries()).into_iter().collect();
    assert_eq!(all, expected);
    assert_eq!(keys(&res.absent), vec!["aartsen"]);
}

#[test]
fn each_token_is_consumed_once() {
    // Both keys accept "agem", only the first in roster order gets it.
    let r = Roster::from_keys(["agema", "agemb"]);
    let res = reconcile(&r, &toks(&["agem"]), MatchStrategy::Prefix).unwrap();
    assert_eq!(keys(&res.present), vec!["agema"]);
    assert_eq!(keys(&res.absent), vec!["agemb"]);
    assert_eq!(res.present.len() + res.unmatched.len(), res.token_count);
}

#[test]
fn reconciling_twice_gives_the_same_partition() {
    let r = roster();
    let t = toks(&["agema", "bamengaa", "vanbaarl", "nobody"]);
    let a = reconcile(&r, &t, MatchStrategy::Prefix).unwrap();
    let b = reconcile(&r, &t, MatchStrategy::Prefix).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_input_is_rejected() {
    let r = roster();
    assert!(matches!(
        reconcile(&r, &[], MatchStrategy::Prefix),
        Err(PresenceError::Input(_))
    ));
    assert!(matches!(
        reconcile(&r, &toks(&[""]), MatchStrategy::Prefix),
        Err(PresenceError::Input(_))
    ));
}

#[test]
fn empty_tokens_among_names_are_ignored() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["", "agema", ""]), MatchStrategy::Prefix).unwrap();
    assert_eq!(res.token_count, 1);
    assert!(res.is_complete());
}

#[test]
fn duplicate_names_are_rejected() {
    let r = roster();
    let err = reconcile(&r, &toks(&["agema", "bamenga", "agema"]), MatchStrategy::Prefix).unwrap_err();
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn similarity_matcher_bridges_a_missing_letter() {
    let r = Roster::from_keys(["vanbaarle", "bamenga"]);
    let res = reconcile(
        &r,
        &toks(&["vanbarle", "bamenga"]),
        MatchStrategy::Similarity { threshold: 0.8 },
    )
    .unwrap();
    assert_eq!(keys(&res.present), vec!["vanbaarle", "bamenga"]);
}

#[test]
fn similarity_matcher_respects_threshold() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["white"]), MatchStrategy::similarity()).unwrap();
    assert!(res.present.is_empty());
    assert_eq!(res.unmatched, vec!["white"]);
}

#[test]
fn advisory_policy_keeps_partial_result() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["agema", "white"]), MatchStrategy::Prefix).unwrap();
    assert!(MismatchPolicy::Advisory.check(&res).is_ok());
}

#[test]
fn strict_policy_fails_on_unmatched_names() {
    let r = Roster::from_keys(["agema"]);
    let res = reconcile(&r, &toks(&["agema", "white"]), MatchStrategy::Prefix).unwrap();
    match MismatchPolicy::Strict.check(&res) {
        Err(PresenceError::Mismatch { matched, expected, unmatched }) => {
            assert_eq!((matched, expected), (1, 2));
            assert_eq!(unmatched, vec!["white"]);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    let complete = reconcile(&r, &toks(&["agema"]), MatchStrategy::Prefix).unwrap();
    assert!(MismatchPolicy::Strict.check(&complete).is_ok());
}
