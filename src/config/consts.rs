// src/config/consts.rs

// Net config
pub const API_URL: &str = "https://gegevensmagazijn.tweedekamer.nl/OData/v4/2.0";
pub const USER_AGENT: &str = concat!("tk_aanwezig/", env!("CARGO_PKG_VERSION"));
pub const TIMEOUT_SECS: u64 = 30;
pub const MAX_RETRIES: u32 = 3;
pub const BACKOFF_BASE_MS: u64 = 500;
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

// Report documents
pub const VERSLAG_NS: &str = "http://www.tweedekamer.nl/ggm/vergaderverslag/v1.0";
pub const MARKER: &str = "leden der Kamer, te weten:";
pub const PLENARY_ROOM: &str = "Plenaire zaal";
pub const PREPUBLICATION: &str = "Voorpublicatie";
pub const MEMBER_FUNCTION_PREFIX: &str = "lid tweede kamer";
pub const MEMBER_SPEAKER_KIND: &str = "Tweede Kamerlid";

// Local files
pub const ROSTER_FILE: &str = "files/2dekmrledn.txt";
pub const NAMES_FILE: &str = "files/file.txt";
pub const LOGS_DIR: &str = "files/logs";
pub const DEBUG_LOG_FILE: &str = "debug.log";
pub const EXPORT_SEP: char = ',';

// Roster
pub const NOMINAL_ROSTER_SIZE: usize = 150;

// Matching
pub const SIMILARITY_THRESHOLD: f64 = 0.90;

// Concurrency
pub const PARALLEL_THRESHOLD_DAYS: i64 = 10;
pub const RESERVED_CORES: usize = 2;
pub const REQUEST_PAUSE_MS: u64 = 75; // be polite
pub const JITTER_MS: u64 = 50; // extra 0..50 ms

/// Worker count for range runs: all cores but two, at least one.
pub fn workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(RESERVED_CORES)
        .max(1)
}
