// src/specs/persons.rs
//
// Current members from `/Persoon`, used to rebuild the roster files.

use log::info;
use serde::Deserialize;
use serde_json::Value;

use crate::core::net::{odata_filter, Api};
use crate::core::sanitize::normalize_ws;
use crate::error::{PresenceError, Result};
use crate::roster::{DisplayInfo, Roster, RosterEntry};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Persoon {
    pub id: String,
    #[serde(default)]
    pub tussenvoegsel: Option<String>,
    #[serde(default)]
    pub achternaam: Option<String>,
    #[serde(default)]
    pub voornamen: Option<String>,
    #[serde(default)]
    pub roepnaam: Option<String>,
}

impl Persoon {
    /// "van Baarle": particle plus surname.
    pub fn surname(&self) -> String {
        let particle = self.tussenvoegsel.as_deref().unwrap_or("");
        let last = self.achternaam.as_deref().unwrap_or("");
        normalize_ws(&join!(particle, " ", last))
    }

    /// Roepnaam, or the given names when no roepnaam is registered.
    pub fn first_name(&self) -> String {
        let first = self
            .roepnaam
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .or(self.voornamen.as_deref())
            .unwrap_or("");
        normalize_ws(first)
    }

    pub fn to_entry(&self) -> RosterEntry {
        let last = self.surname();
        let first = self.first_name();
        let display = DisplayInfo {
            display_name: normalize_ws(&join!(&first, " ", &last)),
            first_name: first,
            last_name: last.clone(),
            party: s!(),
        };
        RosterEntry::with_display(&last, display)
    }
}

pub fn members_path() -> String {
    let filter = odata_filter("Verwijderd eq false and Functie eq 'Tweede Kamerlid'");
    join!(
        "/Persoon?$filter=",
        &filter,
        "&$select=Id,Tussenvoegsel,Achternaam,Voornamen,Roepnaam"
    )
}

pub fn parse(body: &Value) -> Result<Vec<Persoon>> {
    if let Some(msg) = body.pointer("/error/message").and_then(Value::as_str) {
        return Err(PresenceError::Api(s!(msg)));
    }
    let rows = body
        .get("value")
        .cloned()
        .ok_or_else(|| PresenceError::Parse(s!("person listing has no 'value' array")))?;
    Ok(serde_json::from_value(rows)?)
}

/// Roster of current members, sorted by key.
pub fn fetch_roster(api: &Api) -> Result<Roster> {
    let body = api.get_json(&members_path())?;
    let mut entries: Vec<RosterEntry> = parse(&body)?
        .iter()
        .filter(|p| p.achternaam.as_deref().is_some_and(|a| !a.trim().is_empty()))
        .map(Persoon::to_entry)
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    info!("Fetched {} current members", entries.len());
    Ok(Roster::from_entries(entries))
}
