// src/specs/report.rs
//
// Report document (`/Verslag/{id}/resource`): header attributes, the
// attendance paragraph and the speaker records.
//
// Layout (namespace VERSLAG_NS, prefixes vary):
//   <vlosCoreDocument soort=".." status=".." Timestamp="2024-04-09T20:08:55+02:00">
//     <vergadering soort="Plenair"> <titel/> <zaal>Plenaire zaal</zaal> ... </vergadering>
//     ... <alineaitem>Aanwezig zijn 143 leden der Kamer, te weten:</alineaitem>
//         <alineaitem>Agema, Van Baarle en Bamenga,</alineaitem>
//     ... <spreker soort="Tweede Kamerlid" objectid=".."> <weergavenaam/> <voornaam/>
//         <achternaam/> <fractie/> <functie/> </spreker>

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use log::{debug, warn};

use crate::config::consts::{
    MARKER, MEMBER_FUNCTION_PREFIX, MEMBER_SPEAKER_KIND, PLENARY_ROOM, PREPUBLICATION, VERSLAG_NS,
};
use crate::config::options::ExtractMode;
use crate::core::sanitize::{normalize_key, normalize_ws, tokenize};
use crate::core::xml::{self, Element};
use crate::error::Result;
use crate::roster::DisplayInfo;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportHeader {
    /// Publication stage: Voorpublicatie, Tussenpublicatie, ...
    pub soort: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub meeting_kind: Option<String>,
    pub title: Option<String>,
    pub room: Option<String>,
}

impl ReportHeader {
    fn from_root(root: &Element) -> Self {
        let meeting = root.child("vergadering");
        let timestamp = root.attr("Timestamp").and_then(|t| {
            DateTime::parse_from_rfc3339(t.trim())
                .map_err(|e| debug!("Unparsable Timestamp '{t}': {e}"))
                .ok()
        });
        Self {
            soort: root.attr("soort").map(str::to_string),
            status: root.attr("status").map(str::to_string),
            timestamp,
            meeting_kind: meeting.and_then(|m| m.attr("soort")).map(str::to_string),
            title: meeting.and_then(|m| m.child_text("titel")),
            room: meeting.and_then(|m| m.child_text("zaal")),
        }
    }

    pub fn is_plenary(&self) -> bool {
        self.room.as_deref() == Some(PLENARY_ROOM)
    }

    pub fn is_prepublication(&self) -> bool {
        self.soort.as_deref() == Some(PREPUBLICATION)
    }

    /// Can stand in as the day's report: plenary and past the prepublication stage.
    pub fn eligible_as_latest(&self) -> bool {
        self.is_plenary() && !self.is_prepublication()
    }
}

/// A member who spoke during the meeting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Speaker {
    pub key: String,
    pub display: DisplayInfo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListSource {
    /// No attendance data in this report.
    #[default]
    None,
    /// The paragraph after the attendance marker.
    Marker,
    /// Speaker records standing in for a missing list.
    Speakers,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attendance {
    pub tokens: Vec<String>,
    /// Count from "Aanwezig zijn N leden der Kamer", when stated.
    pub declared: Option<usize>,
    pub source: ListSource,
}

impl Attendance {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

pub struct Report {
    pub header: ReportHeader,
    root: Element,
}

impl Report {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = xml::parse(bytes)?;
        if !root.attrs.iter().any(|(_, v)| v == VERSLAG_NS) {
            debug!("Report root <{}> lacks the vergaderverslag namespace", root.name);
        }
        Ok(Self { header: ReportHeader::from_root(&root), root })
    }

    /// Text of every `alineaitem`, whitespace-normalized, in document order.
    pub fn paragraphs(&self) -> Vec<String> {
        self.root
            .descendants("alineaitem")
            .into_iter()
            .map(|p| normalize_ws(&p.text()))
            .collect()
    }

    /// Unique members among the speakers, by `objectid`.
    pub fn speakers(&self) -> Vec<Speaker> {
        let mut seen_ids = HashSet::new();
        let mut seen_keys = HashSet::new();
        let mut out = Vec::new();

        for sp in self.root.descendants("spreker") {
            if let Some(id) = sp.attr("objectid") {
                if !seen_ids.insert(id) {
                    continue;
                }
            }
            let functie = sp.child_text("functie").unwrap_or_default().to_lowercase();
            let is_member = functie.starts_with(MEMBER_FUNCTION_PREFIX)
                || sp.attr("soort") == Some(MEMBER_SPEAKER_KIND);
            if !is_member {
                continue;
            }
            let Some(name) = sp.child_text("weergavenaam").filter(|n| !n.is_empty()) else {
                continue;
            };
            let key = normalize_key(&name);
            if !seen_keys.insert(key.clone()) {
                continue;
            }
            out.push(Speaker {
                key,
                display: DisplayInfo {
                    display_name: name,
                    first_name: sp.child_text("voornaam").unwrap_or_default(),
                    last_name: sp.child_text("achternaam").unwrap_or_default(),
                    party: sp.child_text("fractie").unwrap_or_default(),
                },
            });
        }
        out
    }

    /// Names of the members reported present.
    ///
    /// The list is the text after the marker in the same paragraph, or else
    /// the next non-blank paragraph. A missing marker gives an empty list. With
    /// [`ExtractMode::WithSpeakers`] a missing list or a declared count of 0
    /// falls back to the speaker records.
    pub fn attendance(&self, mode: ExtractMode) -> Attendance {
        let paras = self.paragraphs();
        let Some(idx) = paras.iter().position(|p| p.contains(MARKER)) else {
            return self.fallback(mode, None);
        };

        let para = &paras[idx];
        let declared = declared_count(para);
        if declared == Some(0) && mode == ExtractMode::WithSpeakers {
            return self.fallback(mode, declared);
        }

        let remainder = para.split_once(MARKER).map(|(_, r)| r.trim()).unwrap_or("");
        let list = if !remainder.is_empty() {
            remainder
        } else {
            paras[idx + 1..]
                .iter()
                .map(|p| p.trim())
                .find(|p| !p.is_empty())
                .unwrap_or("")
        };

        let tokens = tokenize(list);
        if tokens.is_empty() {
            return self.fallback(mode, declared);
        }
        if let Some(n) = declared {
            if n != tokens.len() {
                warn!("Report declares {n} members present, list has {}", tokens.len());
            }
        }
        Attendance { tokens, declared, source: ListSource::Marker }
    }

    fn fallback(&self, mode: ExtractMode, declared: Option<usize>) -> Attendance {
        if mode == ExtractMode::MarkerOnly {
            return Attendance { declared, ..Attendance::default() };
        }
        let tokens: Vec<String> = self.speakers().into_iter().map(|s| s.key).collect();
        if tokens.is_empty() {
            return Attendance { declared, ..Attendance::default() };
        }
        debug!("Using {} speaker record(s) as attendance", tokens.len());
        Attendance { tokens, declared, source: ListSource::Speakers }
    }
}

/// "Aanwezig zijn 143 leden der Kamer, te weten:" → 143
pub fn declared_count(paragraph: &str) -> Option<usize> {
    let head = paragraph.split_once(MARKER)?.0;
    let after = head.split_once("Aanwezig zijn")?.1;
    after.trim().parse().ok()
}

/// Tokens from the attendance paragraph only; empty when the report has none.
pub fn extract_members(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(Report::parse(bytes)?.attendance(ExtractMode::MarkerOnly).tokens)
}
