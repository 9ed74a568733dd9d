//! Opt-in diagnostic log
//!
//! The library only emits `tracing` events. A [`DiagnosticLog`] is a private
//! subscriber that a [`Propagator`](crate::Propagator) installs for the duration of
//! one call, writing lines of the form
//!
//! ```text
//! 2026-01-01T12:00:00.000000Z - errprop::differentiator - DEBUG - Created variables --> (x, y)
//! ```
//!
//! Nothing in the library reads the log back.

use crate::PropagationError;
use std::fmt;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// File name used when the caller asks for a log without naming one
pub const DEFAULT_LOG_FILE: &str = "log_propagation.log";

/// `timestamp - component - level - message`
struct DashFormat;

impl<S, N> FormatEvent<S, N> for DashFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        SystemTime.format_time(&mut writer)?;
        let meta = event.metadata();
        write!(writer, " - {} - {} - ", meta.target(), meta.level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// A log sink that is active only inside [`in_scope`](Self::in_scope)
#[derive(Clone)]
pub struct DiagnosticLog {
    dispatch: Dispatch,
    destination: String,
}

impl DiagnosticLog {
    /// Log to a file, truncating it and creating missing parent directories.
    ///
    /// # Errors
    /// `LogSetup` if the directory or the file cannot be created.
    pub fn to_file(path: impl AsRef<Path>) -> Result<Self, PropagationError> {
        let path = path.as_ref();
        let setup_error = |e: std::io::Error| PropagationError::LogSetup {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(setup_error)?;
        }
        let file = File::create(path).map_err(setup_error)?;

        let mut log = Self::to_writer(Mutex::new(file));
        log.destination = path.display().to_string();
        Ok(log)
    }

    /// Log to [`DEFAULT_LOG_FILE`] in the working directory
    ///
    /// # Errors
    /// Same as [`to_file`](Self::to_file).
    pub fn to_default_file() -> Result<Self, PropagationError> {
        Self::to_file(DEFAULT_LOG_FILE)
    }

    /// Log to any `tracing-subscriber` writer
    pub fn to_writer<W>(make_writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .event_format(DashFormat)
            .with_writer(make_writer)
            .with_max_level(Level::DEBUG)
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
            destination: "<writer>".to_owned(),
        }
    }

    /// Where the lines go
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Run `f` with this log as the current subscriber
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("destination", &self.destination)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_line_format() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let log = DiagnosticLog::to_writer(move || sink.clone());

        log.in_scope(|| tracing::debug!(target: "errprop::test", "value --> {}", 42));

        let out = buffer.contents();
        let line = out.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(4, " - ").collect();
        assert_eq!(parts.len(), 4);
        assert!(parts[0].contains('T'));
        assert_eq!(parts[1], "errprop::test");
        assert_eq!(parts[2], "DEBUG");
        assert_eq!(parts[3], "value --> 42");
    }

    #[test]
    fn test_events_outside_scope_are_dropped() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let log = DiagnosticLog::to_writer(move || sink.clone());

        tracing::error!("not captured");
        log.in_scope(|| tracing::info!("captured"));

        let out = buffer.contents();
        assert!(out.contains("captured"));
        assert!(!out.contains("not captured"));
    }

    #[test]
    fn test_trace_level_is_filtered() {
        let buffer = Buffer::default();
        let sink = buffer.clone();
        let log = DiagnosticLog::to_writer(move || sink.clone());

        log.in_scope(|| tracing::trace!("too fine"));
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file
        let err = DiagnosticLog::to_file(dir.path()).unwrap_err();
        assert!(matches!(err, PropagationError::LogSetup { .. }));
    }
}
