use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

struct RepofanLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: LevelFilter,
    start: Instant,
}

impl Log for RepofanLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("[{}] {} - {}", record.level(), record.target(), record.args());

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Parse a `RUST_LOG`-style level, falling back to `warn`.
fn parse_filter(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Initialize the global logger. Must be called once before any logging.
///
/// # Errors
///
/// Returns `log::SetLoggerError` if a logger is already installed.
pub fn init(log_file: Option<std::fs::File>) -> Result<(), log::SetLoggerError> {
    let filter = parse_filter(std::env::var("RUST_LOG").ok().as_deref());

    let logger = RepofanLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
