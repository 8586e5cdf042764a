//! # spawnlog
//! File logger that spawns named child loggers into sibling log files.
//!
//! A [`SpawningLogger`] is bound to one log file. Asking it to `spawn` a
//! child by name opens a second logger whose file name is derived from the
//! parent's, in the same directory. Spawning the same name twice returns
//! the same child.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! spawnlog = "0.1.0"
//! ```
//!
//! ```rust
//! use spawnlog::{SeverityLog, SpawningLogger};
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_usage");
//! let logger = SpawningLogger::new(dir.join("server.log")).unwrap();
//! logger.info("server started");
//! // => creates server.log
//! ```
//!
//! ## Spawning child loggers
//! ```rust
//! use spawnlog::{SeverityLog, SpawningLogger};
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_spawn");
//! let logger = SpawningLogger::new(dir.join("server.log")).unwrap();
//! let child = logger.spawn("worker1").unwrap();
//! child.warn("worker1 is idle");
//! // => creates server.log and server_worker1.log side by side
//! ```
//!
//! ## Child prefix
//! A configured prefix is inserted between the parent's file stem and the
//! child name:
//! ```rust
//! use spawnlog::SpawningLogger;
//!
//! spawnlog::configure(|c| c.child_prefix = Some("worker".into()));
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_prefix");
//! let logger = SpawningLogger::new(dir.join("server.log")).unwrap();
//! logger.spawn("1").unwrap();
//! // => creates server.log and server_worker_1.log
//! # spawnlog::reset_config();
//! ```
//!
//! ## Log subdirectory
//! When a subdirectory is configured, every root logger's files land one
//! level below the given path:
//! ```rust
//! use spawnlog::SpawningLogger;
//!
//! spawnlog::configure(|c| c.subdir = Some("production".into()));
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_subdir");
//! let logger = SpawningLogger::new(dir.join("log/server.log")).unwrap();
//! logger.spawn("1").unwrap();
//! // => creates log/production/server.log and log/production/server_1.log
//! # spawnlog::reset_config();
//! ```
//!
//! ## Logging to parent and child in one call
//! ```rust
//! use spawnlog::{Severity, SpawningLogger};
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_both");
//! let logger = SpawningLogger::new(dir.join("server.log")).unwrap();
//! logger.self_and_spawn("worker_1", Severity::Error, "server shutdown").unwrap();
//! // => "server shutdown" shows up in server.log and in server_worker_1.log
//! ```
//!
//! ## Serving the `log` facade
//! A root logger can back the `log` macros. Records below `Info` are
//! filtered by default; the guard flushes and shuts the writer threads
//! down when dropped.
//! ```rust
//! use std::sync::Arc;
//! use spawnlog::SpawningLogger;
//!
//! let dir = std::env::temp_dir().join("spawnlog_doc_facade");
//! let logger = Arc::new(SpawningLogger::new(dir.join("server.log")).unwrap());
//! let _guard = Arc::clone(&logger).init_global().unwrap();
//! log::info!("served through the facade");
//! // _guard ensures the record is flushed when dropped
//! ```

mod config;
mod error;
mod log_writer;
mod logger;
mod spawner;

pub use config::{SpawnConfig, configure, reset_config};
pub use error::Error;
pub use logger::{FileLogger, Severity, SeverityLog};
pub use spawner::{LoggerGuard, SpawningLogger};
