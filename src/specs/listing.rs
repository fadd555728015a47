// src/specs/listing.rs

use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::core::net::{odata_filter, Api};
use crate::error::{PresenceError, Result};

/// One row of the `/Verslag` listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportMeta {
    pub id: String,
    #[serde(default)]
    pub soort: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_length: Option<u64>,
    #[serde(default)]
    pub gewijzigd_op: Option<String>,
    #[serde(default)]
    pub api_gewijzigd_op: Option<String>,
    #[serde(default)]
    pub verwijderd: Option<bool>,
    #[serde(default, rename = "Vergadering_Id")]
    pub vergadering_id: Option<String>,
}

pub fn listing_path(date: NaiveDate) -> String {
    let filter = format!(
        "year(GewijzigdOp) eq {} and month(GewijzigdOp) eq {} and day(GewijzigdOp) eq {}",
        date.year(),
        date.month(),
        date.day()
    );
    join!("/Verslag?$filter=", &odata_filter(&filter))
}

pub fn resource_path(id: &str) -> String {
    format!("/Verslag/{id}/resource")
}

/// Parse a listing body. Deleted rows are dropped; an empty list means
/// there is no report for that day.
pub fn parse(body: &Value) -> Result<Vec<ReportMeta>> {
    if let Some(err) = body.get("error") {
        let msg = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(PresenceError::Api(s!(msg)));
    }
    let rows = body
        .get("value")
        .cloned()
        .ok_or_else(|| PresenceError::Parse(s!("listing has no 'value' array")))?;
    let metas: Vec<ReportMeta> = serde_json::from_value(rows)?;
    Ok(metas.into_iter().filter(|m| m.verwijderd != Some(true)).collect())
}

/// Reports modified on `date`.
pub fn fetch(api: &Api, date: NaiveDate) -> Result<Vec<ReportMeta>> {
    let body = api.get_json(&listing_path(date))?;
    let metas = parse(&body)?;
    debug!("{date}: {} report(s) listed", metas.len());
    Ok(metas)
}

pub fn fetch_resource(api: &Api, id: &str) -> Result<Vec<u8>> {
    api.get_bytes(&resource_path(id))
}
