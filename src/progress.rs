// src/progress.rs
use chrono::NaiveDate;

/// Lightweight progress reporting used by date-range runs.
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the number of dates to process.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One date finished (reports reconciled or skipped).
    fn item_done(&mut self, _date: NaiveDate) {}

    fn item_failed(&mut self, _date: NaiveDate, _msg: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Prints `[done/total] date` lines to stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn item_done(&mut self, date: NaiveDate) {
        self.done += 1;
        eprintln!("[{}/{}] {date}", self.done, self.total);
    }

    fn item_failed(&mut self, date: NaiveDate, msg: &str) {
        self.done += 1;
        eprintln!("[{}/{}] {date} failed: {msg}", self.done, self.total);
    }
}
