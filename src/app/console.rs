// logdyn-viewer - app/console.rs
//
// Console-equivalent sinks that every dispatched record is mirrored to.
// The browser host writes to the page console (see `web.rs`); native hosts
// write through `tracing` on a dedicated target.

use crate::core::model::{ConsoleMethod, LogRecord};
use crate::util::constants::CONSOLE_TARGET;

/// Destination for mirrored records.
pub trait ConsoleSink {
    fn write(&mut self, method: ConsoleMethod, line: &str);
}

/// Console line for a record: `LEVEL : message`.
pub fn console_line(record: &LogRecord) -> String {
    format!("{} : {}", record.level, record.message)
}

/// Mirrors records into the installed `tracing` subscriber.
///
/// `info`, `warn` and `error` map to the matching tracing levels; the
/// generic `log` method is emitted at info level with `method = "log"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&mut self, method: ConsoleMethod, line: &str) {
        match method {
            ConsoleMethod::Info => {
                tracing::info!(target: CONSOLE_TARGET, method = "info", "{line}")
            }
            ConsoleMethod::Warn => {
                tracing::warn!(target: CONSOLE_TARGET, method = "warn", "{line}")
            }
            ConsoleMethod::Error => {
                tracing::error!(target: CONSOLE_TARGET, method = "error", "{line}")
            }
            ConsoleMethod::Log => {
                tracing::info!(target: CONSOLE_TARGET, method = "log", "{line}")
            }
        }
    }
}

/// Keeps every mirrored line in memory, in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    lines: Vec<(ConsoleMethod, String)>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[(ConsoleMethod, String)] {
        &self.lines
    }
}

impl ConsoleSink for MemoryConsole {
    fn write(&mut self, method: ConsoleMethod, line: &str) {
        self.lines.push((method, line.to_string()));
    }
}
