use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Appends timestamped lines to a log file and optionally echoes them to stdout.
pub struct Logger {
    log_file: Option<Mutex<File>>,
    logger_println: bool,
}

impl Logger {
    /// Opens `path` in append mode when `active_logger` is set. If the file cannot be
    /// opened the logger keeps echoing to stdout and reports the failure on stderr.
    pub fn new<P: AsRef<Path>>(path: P, active_logger: bool, logger_println: bool) -> Self {
        let log_file = if active_logger {
            match OpenOptions::new().append(true).create(true).open(path.as_ref()) {
                Ok(file) => Some(Mutex::new(file)),
                Err(e) => {
                    eprintln!("Cannot open log file {}: {e}", path.as_ref().display());
                    None
                }
            }
        } else {
            None
        };
        Self { log_file, logger_println }
    }

    pub fn disabled() -> Self {
        Self { log_file: None, logger_println: false }
    }

    pub fn now() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    pub fn write(&self, content: &str) {
        if let Some(log_file) = &self.log_file {
            if let Ok(mut file) = log_file.lock() {
                let _ = writeln!(file, "{},{}", Self::now(), content);
            }
        }
        if self.logger_println {
            println!("{}", content)
        }
    }
}
