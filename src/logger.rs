use std::{
    ops::Deref,
    path::Path,
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use chrono::Utc;
use colored::{ColoredString, Colorize};
use crossbeam_channel::{RecvTimeoutError, Sender, bounded, unbounded};

use crate::{config::SPAWNLOG_ENV, log_writer::LogFile};

/// Severity of a single log record. A closed set; nothing in the crate
/// dispatches a logging call by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    fn label(self) -> ColoredString {
        match self {
            Severity::Debug => "DEBUG".blue(),
            Severity::Info => "INFO".green(),
            Severity::Warn => "WARN".yellow(),
            Severity::Error => "ERROR".red(),
            Severity::Fatal => "FATAL".red().bold(),
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warn,
            log::Level::Info => Severity::Info,
            log::Level::Debug | log::Level::Trace => Severity::Debug,
        }
    }
}

/// The severity operations a logger forwards. Exactly these five calls,
/// all lowered to [`SeverityLog::log`].
pub trait SeverityLog {
    fn log(&self, severity: Severity, message: &str);

    fn debug(&self, message: &str) {
        self.log(Severity::Debug, message)
    }
    fn info(&self, message: &str) {
        self.log(Severity::Info, message)
    }
    fn warn(&self, message: &str) {
        self.log(Severity::Warn, message)
    }
    fn error(&self, message: &str) {
        self.log(Severity::Error, message)
    }
    fn fatal(&self, message: &str) {
        self.log(Severity::Fatal, message)
    }
}

#[derive(Debug, Clone)]
pub enum LogMessage {
    Record { severity: Severity, message: String },
    Flush(Sender<()>),
    Shutdown,
}

/// Channel into a file's writer thread, joined and flushed on shutdown.
pub struct LogSender {
    sender: Sender<Arc<LogMessage>>,
    handler: Arc<Mutex<Option<JoinHandle<bool>>>>,
}

impl Deref for LogSender {
    type Target = Sender<Arc<LogMessage>>;
    fn deref(&self) -> &Self::Target {
        &self.sender
    }
}

impl Drop for LogSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl LogSender {
    pub fn new(sender: Sender<Arc<LogMessage>>, handler: JoinHandle<bool>) -> Self {
        Self {
            sender,
            handler: Arc::new(Mutex::new(Some(handler))),
        }
    }

    /// Asks the writer thread to flush and waits until it has.
    pub fn flush(&self) {
        let (ack, done) = bounded::<()>(1);
        if self.send(Arc::new(LogMessage::Flush(ack))).is_ok() {
            let _ = done.recv();
        }
    }

    pub fn shutdown(&self) {
        let mut guard = self.handler.lock().unwrap();
        if let Some(handle) = guard.take() {
            // Ignore the send error if the channel is already closed
            let _ = self.send(Arc::new(LogMessage::Shutdown));
            if !handle.join().expect("Unable to join logger thread") {
                panic!("Logger thread shutdown failed");
            }
        }
    }
}

fn format_log(severity: Severity, message: &str) -> String {
    let time = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    format!("[{time} {}] {message}", severity.label())
}

pub(crate) fn spawn_log_thread(mut writer: LogFile) -> LogSender {
    let (sender, receiver) = unbounded::<Arc<LogMessage>>();
    let handler = std::thread::spawn(move || {
        let mut batch = Vec::with_capacity(32);
        let flush_interval = Duration::from_millis(SPAWNLOG_ENV.FLUSH_INTERVAL_MS);
        let mut last_flush = Instant::now();
        loop {
            // Wake at the latest when the next flush is due
            let elapsed = last_flush.elapsed();
            let timeout = if elapsed >= flush_interval {
                Duration::from_millis(1)
            } else {
                flush_interval - elapsed
            };

            match receiver.recv_timeout(timeout) {
                Ok(msg) => {
                    batch.push(msg);
                    while let Ok(msg) = receiver.try_recv() {
                        batch.push(msg);
                        if batch.len() >= 32 {
                            break;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_flush.elapsed() >= flush_interval {
                        writer.flush();
                        last_flush = Instant::now();
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let mut should_shutdown = false;
            for log_message in batch.drain(..) {
                match log_message.as_ref() {
                    LogMessage::Shutdown => {
                        should_shutdown = true;
                        break;
                    }
                    LogMessage::Record { severity, message } => {
                        writer.regular(&format_log(*severity, message));
                    }
                    LogMessage::Flush(ack) => {
                        writer.flush();
                        last_flush = Instant::now();
                        ack.send(()).ok();
                    }
                }
            }

            if should_shutdown || last_flush.elapsed() >= flush_interval {
                writer.flush();
                last_flush = Instant::now();
            }

            if should_shutdown {
                break;
            }
        }
        true
    });
    LogSender::new(sender, handler)
}

/// The logging primitive. Bound to one file at construction; a dedicated
/// thread appends formatted, timestamped lines and owns the file handle
/// until the logger is dropped, which joins the thread and flushes.
pub struct FileLogger {
    sender: LogSender,
}

impl FileLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let writer = LogFile::new(path)?;
        Ok(Self {
            sender: spawn_log_thread(writer),
        })
    }

    /// Flushes buffered records through the writer thread, returning once
    /// they are on disk.
    pub fn flush(&self) {
        self.sender.flush();
    }

    pub(crate) fn shutdown(&self) {
        self.sender.shutdown();
    }
}

impl SeverityLog for FileLogger {
    fn log(&self, severity: Severity, message: &str) {
        let record = LogMessage::Record {
            severity,
            message: message.into(),
        };
        self.sender.send(Arc::new(record)).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logger_formats_and_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger.log");
        let logger = FileLogger::new(&path).unwrap();
        logger.info("rust is awesome !");
        logger.fatal("giving up");
        drop(logger);
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let first = lines.next().unwrap();
        assert!(first.starts_with('['));
        assert!(first.contains("INFO"));
        assert!(first.ends_with("rust is awesome !"));
        let second = lines.next().unwrap();
        assert!(second.contains("FATAL"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_flush_makes_records_visible_without_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flush.log");
        let logger = FileLogger::new(&path).unwrap();
        logger.info("visible right away");
        logger.flush();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("visible right away"));
    }

    #[test]
    fn test_severity_from_log_level() {
        assert_eq!(Severity::from(log::Level::Error), Severity::Error);
        assert_eq!(Severity::from(log::Level::Trace), Severity::Debug);
    }
}
