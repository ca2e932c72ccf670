/*!
 * Console logger for host applications.
 *
 * The library itself only talks to the `log` facade. Embedders that do not
 * bring their own logger can install this one: colored, timestamped lines on
 * stderr, filtered by the configured level.
 */

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::app_config::LogLevel;

// @struct: Stderr logger with per-level colors
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    // @creates: New logger with specified level
    pub fn new(level: LevelFilter) -> Self {
        ConsoleLogger { level }
    }

    // @initializes: Global logger, fails if one is already installed
    pub fn init(level: LogLevel) -> Result<(), SetLoggerError> {
        let filter = level.to_level_filter();
        log::set_boxed_logger(Box::new(ConsoleLogger::new(filter)))?;
        log::set_max_level(filter);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }

    // @returns: Rendered line without trailing newline
    fn format_record(record: &Record) -> String {
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, tag) = Self::style_for_level(record.level());
        format!("{}{} {} {}\x1B[0m", color, now, tag, record.args())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}", Self::format_record(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
