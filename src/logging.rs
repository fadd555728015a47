// src/logging.rs
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use env_logger::{Builder, Env, Target};

static START: OnceLock<Instant> = OnceLock::new();

fn start() -> Instant {
    *START.get_or_init(Instant::now)
}

pub fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Writes every log line to stderr and to a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

/// Install the global logger once at startup.
///
/// `debug` raises the default level from `info` to `debug`; `RUST_LOG`
/// still wins when set. With `mirror` the same lines are appended to that file.
pub fn init(debug: bool, mirror: Option<&Path>) {
    start();
    let level = if debug { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));

    builder.format(|buf, record| {
        let elapsed = fmt_elapsed(start().elapsed().as_millis());
        writeln!(buf, "[{elapsed}][{}] {}", record.level(), record.args())
    });

    if let Some(path) = mirror {
        if let Some(parent) = path.parent() {
            let _ = crate::file::ensure_directory(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(Tee { file })));
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
        }
    }

    // A second init (tests, repeated runs) keeps the first logger.
    let _ = builder.try_init();
}
