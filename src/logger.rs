use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

static LOGGER: FileLogger = FileLogger;

/// Appends records to the file opened by [`init`]. The terminal belongs to the
/// UI, so nothing is ever written to stdout or stderr.
struct FileLogger;

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            record,
        );
        if let Ok(mut guard) = LOG_FILE.lock()
            && let Some(file) = guard.as_mut()
        {
            let _ = writeln!(file, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock()
            && let Some(file) = guard.as_mut()
        {
            let _ = file.flush();
        }
    }
}

fn format_record(timestamp: &str, record: &Record) -> String {
    format!(
        "[{}] {:<5} {}: {}",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

/// Opens `path` for appending and installs the file logger. Calling it again
/// switches the output file; the logger itself is registered only once.
pub fn init(path: &Path, level: LevelFilter) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    match LOG_FILE.lock() {
        Ok(mut guard) => *guard = Some(file),
        Err(poisoned) => *poisoned.into_inner() = Some(file),
    }
    // Fails only if a logger is already installed, which is fine on re-init.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
    Ok(())
}
