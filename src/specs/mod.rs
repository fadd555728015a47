// src/specs/mod.rs
//! # Endpoint "specs"
//!
//! One module per API resource. Each knows the resource path, the shape of
//! the body and how to pull out what the rest of the tool needs:
//!
//! - `listing` – `/Verslag` rows for one day (`ReportMeta`).
//! - `report` – the report XML: header, attendance paragraph, speakers.
//! - `persons` – `/Persoon` rows for rebuilding the roster.
//!
//! Specs only fetch and extract. Choosing reports, matching names and
//! writing files live in `select`, `reconcile` and `store`.
//!
//! Parsers take bodies, not connections, so they are testable offline
//! against captured fixtures.
pub mod listing;
pub mod persons;
pub mod report;
