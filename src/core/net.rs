// src/core/net.rs

// Blocking HTTP GET with a per-request timeout and bounded retries.

use std::{thread, time::Duration};

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;

use crate::config::consts::{MAX_RETRY_AFTER_SECS, USER_AGENT};
use crate::config::options::NetOptions;
use crate::error::{PresenceError, Result};

pub struct Api {
    http: Client,
    base: String,
    retries: u32,
    backoff_ms: u64,
}

impl Api {
    pub fn new(net: &NetOptions) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(net.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base: net.api_url.trim_end_matches('/').to_string(),
            retries: net.retries,
            backoff_ms: net.backoff_ms,
        })
    }

    /// GET `{base}{path}` and return the body.
    ///
    /// 429 and 5xx answers and transport failures are retried with doubling
    /// backoff; other non-success statuses fail at once.
    pub fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = join!(&self.base, path);
        let mut backoff_ms = self.backoff_ms;

        for attempt in 0..=self.retries {
            debug!("GET {url} (attempt {})", attempt + 1);
            let err = match self.http.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp.bytes()?.to_vec());
                    }
                    let code = status.as_u16();
                    let err = PresenceError::Http { status: code, url: url.clone() };
                    if !err.is_transient() {
                        return Err(err);
                    }
                    backoff_ms = retry_delay_ms(backoff_ms, retry_after_secs(&resp));
                    err
                }
                Err(e) => PresenceError::Network(e),
            };

            if attempt == self.retries {
                return Err(err);
            }
            warn!("{err}; retrying in {backoff_ms} ms");
            thread::sleep(Duration::from_millis(backoff_ms));
            backoff_ms = backoff_ms.saturating_mul(2);
        }

        // The loop always returns on its last attempt.
        Err(PresenceError::Http { status: 0, url })
    }

    pub fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let bytes = self.get_bytes(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn retry_after_secs(resp: &reqwest::blocking::Response) -> Option<u64> {
    resp.headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Wait before the next attempt: the backoff, raised to the server's
/// `Retry-After` (capped at `MAX_RETRY_AFTER_SECS`).
fn retry_delay_ms(backoff_ms: u64, retry_after: Option<u64>) -> u64 {
    match retry_after {
        Some(secs) => backoff_ms.max(secs.min(MAX_RETRY_AFTER_SECS).saturating_mul(1000)),
        None => backoff_ms,
    }
}

/// Percent-encode the spaces and quotes of an OData `$filter` expression.
pub fn odata_filter(expr: &str) -> String {
    expr.replace(' ', "%20").replace('\'', "%27")
}
