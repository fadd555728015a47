// src/roster.rs
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::config::consts::NOMINAL_ROSTER_SIZE;
use crate::core::sanitize::{normalize_key, normalize_ws};
use crate::error::Result;
use crate::file::write_lines;

/// Human-facing name parts for one member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub party: String,
}

impl DisplayInfo {
    /// Split a "First Last" line; everything after the first word is the surname.
    pub fn from_full_name(line: &str) -> Self {
        let full = normalize_ws(line);
        let (first, last) = match full.split_once(' ') {
            Some((f, l)) => (s!(f), s!(l)),
            None => (s!(), full.clone()),
        };
        Self { display_name: full, first_name: first, last_name: last, party: s!() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub key: String,
    pub display: Option<DisplayInfo>,
}

impl RosterEntry {
    pub fn bare(key: &str) -> Self {
        Self { key: normalize_key(key), display: None }
    }

    pub fn with_display(key: &str, display: DisplayInfo) -> Self {
        Self { key: normalize_key(key), display: Some(display) }
    }

    /// Display name when known, otherwise the key.
    pub fn label(&self) -> &str {
        match &self.display {
            Some(d) if !d.display_name.is_empty() => &d.display_name,
            _ => &self.key,
        }
    }
}

/// Ordered list of members with unique keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Drops empty keys and later duplicates.
    pub fn from_entries(entries: Vec<RosterEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(entries.len());
        for e in entries {
            if e.key.is_empty() {
                continue;
            }
            if !seen.insert(e.key.clone()) {
                warn!("Roster: duplicate key '{}' ignored", e.key);
                continue;
            }
            kept.push(e);
        }
        Self { entries: kept }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_entries(keys.into_iter().map(|k| RosterEntry::bare(k.as_ref())).collect())
    }

    /// Build from the roster file text and the optional names file text.
    /// Names are aligned with keys by line position.
    pub fn parse(roster_text: &str, names_text: Option<&str>) -> Self {
        let keys: Vec<&str> = roster_text.lines().filter(|l| !l.trim().is_empty()).collect();
        let names: Vec<&str> = names_text
            .map(|t| t.lines().filter(|l| !l.trim().is_empty()).collect())
            .unwrap_or_default();

        if !names.is_empty() && names.len() != keys.len() {
            warn!(
                "Names file has {} lines, roster has {}; unmatched positions stay bare",
                names.len(),
                keys.len()
            );
        }

        let entries = keys
            .iter()
            .enumerate()
            .map(|(i, key)| match names.get(i) {
                Some(name) => RosterEntry::with_display(key, DisplayInfo::from_full_name(name)),
                None => RosterEntry::bare(key),
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Read the roster file and, when present, the aligned names file.
    pub fn load(roster_path: &Path, names_path: &Path) -> Result<Self> {
        let roster_text = fs::read_to_string(roster_path)?;
        let names_text = match fs::read_to_string(names_path) {
            Ok(t) => Some(t),
            Err(e) => {
                info!("No names file at {} ({e}); using bare keys", names_path.display());
                None
            }
        };
        let roster = Self::parse(&roster_text, names_text.as_deref());
        if roster.len() != NOMINAL_ROSTER_SIZE {
            warn!(
                "Roster has {} members, expected {NOMINAL_ROSTER_SIZE}",
                roster.len()
            );
        }
        Ok(roster)
    }

    /// Write the roster file and the aligned names file.
    pub fn save(&self, roster_path: &Path, names_path: &Path) -> Result<()> {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key.clone()).collect();
        let names: Vec<String> = self.entries.iter().map(|e| s!(e.label())).collect();
        write_lines(roster_path, &keys)?;
        write_lines(names_path, &names)?;
        Ok(())
    }

    /// Fill in party names from speaker records that share a key.
    pub fn attach_parties(&mut self, parties: &[(String, String)]) {
        for entry in &mut self.entries {
            if let Some((_, party)) = parties.iter().find(|(k, _)| *k == entry.key) {
                let display = entry.display.get_or_insert_with(|| DisplayInfo {
                    display_name: entry.key.clone(),
                    ..DisplayInfo::default()
                });
                if display.party.is_empty() {
                    display.party = party.clone();
                }
            }
        }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
