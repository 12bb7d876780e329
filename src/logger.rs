//! Module containing logger implementation.

use crate::{
    ffi::string::StrView,
    sys::{self, level},
};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// The main logger implementation for the `log` facade crate. Records are
/// forwarded to the host `wasi:logging` import, using the record target as
/// the logging context.
pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.level() {
            Level::Error => level::ERROR,
            Level::Warn => level::WARN,
            Level::Info => level::INFO,
            Level::Debug => level::DEBUG,
            Level::Trace => level::TRACE,
        };
        let context = StrView::new(record.target());
        let message = record.args().to_string();

        write(level, context, StrView::new(&message));
    }

    fn flush(&self) {}
}

/// Writes a single message to the host log.
pub(crate) fn write(level: i32, context: StrView, message: StrView) {
    // SAFETY: Both views are valid for the duration of the call, and the host
    // copies the strings before returning.
    unsafe {
        sys::logging::log(
            level,
            context.as_ptr(),
            context.len(),
            message.as_ptr(),
            message.len(),
        );
    }
}

/// Initialize logging at the `Debug` level.
///
/// # Panics
///
/// Panics if a logger was already installed.
pub fn init() {
    init_with_level(LevelFilter::Debug).unwrap();
}

/// Initialize logging with the specified maximum level.
///
/// Returns an error, leaving the maximum level untouched, if a logger was
/// already installed.
pub fn init_with_level(level: LevelFilter) -> Result<(), SetLoggerError> {
    static LOGGER: Logger = Logger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
