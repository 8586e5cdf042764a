use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use crate::{
    config,
    error::Error,
    logger::{FileLogger, Severity, SeverityLog},
};

/// A file logger that can spawn named child loggers into sibling files.
///
/// Children write to `<parent stem>_<child name><parent extension>` in the
/// parent's log directory (with the configured child prefix inserted before
/// the child name when set). A child is constructed once per name and the
/// same instance is handed back on every later `spawn` with that name.
pub struct SpawningLogger {
    log_dir: PathBuf,
    file_name: String,
    children: Mutex<HashMap<String, Arc<SpawningLogger>>>,
    logger: FileLogger,
}

impl SpawningLogger {
    /// Opens a root logger at `path`. The directory portion of the resolved
    /// path (plus the configured subdirectory, when set) is created if
    /// absent, then the log file itself is created or appended to.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config = config::snapshot();
        Self::open(path.as_ref(), config.subdir())
    }

    /// Children land directly in the parent's log directory, so spawning
    /// passes `subdir = None` here and the configured subdirectory is never
    /// applied twice along a spawn chain.
    fn open(path: &Path, subdir: Option<&str>) -> Result<Self, Error> {
        let path = std::path::absolute(path)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| Error::InvalidPath(path.clone()))?;

        let mut log_dir = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::InvalidPath(path.clone()))?;
        if let Some(subdir) = subdir {
            log_dir.push(subdir);
        }
        if !log_dir.is_dir() {
            fs::create_dir_all(&log_dir).map_err(|source| Error::CreateDir {
                path: log_dir.clone(),
                source,
            })?;
        }

        let logger = FileLogger::new(log_dir.join(&file_name))?;
        Ok(Self {
            log_dir,
            file_name,
            children: Mutex::new(HashMap::new()),
            logger,
        })
    }

    /// Returns the child logger for `child_name`, constructing it (and its
    /// log file) on first request.
    pub fn spawn(&self, child_name: &str) -> Result<Arc<SpawningLogger>, Error> {
        if child_name.is_empty() {
            return Err(Error::EmptyChildName);
        }
        // The lock spans check, construction and store, so concurrent spawns
        // of one name construct at most one child.
        let mut children = self.children.lock().unwrap();
        if let Some(child) = children.get(child_name) {
            return Ok(Arc::clone(child));
        }
        let child = Arc::new(self.create_child_logger(child_name)?);
        children.insert(child_name.to_string(), Arc::clone(&child));
        Ok(child)
    }

    /// Logs `message` at `severity` into this logger's file, then spawns
    /// `child_name` and logs the same record into the child's file.
    pub fn self_and_spawn(
        &self,
        child_name: &str,
        severity: Severity,
        message: &str,
    ) -> Result<Arc<SpawningLogger>, Error> {
        self.log(severity, message);
        let child = self.spawn(child_name)?;
        child.log(severity, message);
        Ok(child)
    }

    /// Installs this logger as the `log` facade backend for the process,
    /// filtering records below `Info` (use
    /// [`Self::init_global_with_level`] for another level). Keep the `Arc`
    /// around to go on spawning children from it, and hold the returned
    /// guard so buffered records are flushed when the session ends.
    #[must_use = "LoggerGuard must be kept alive so buffered records are flushed. Do \"let _guard = logger.init_global();\""]
    pub fn init_global(self: Arc<Self>) -> Result<LoggerGuard, log::SetLoggerError> {
        self.init_global_with_level(log::LevelFilter::Info)
    }

    /// Like [`Self::init_global`], with an explicit maximum level.
    #[must_use = "LoggerGuard must be kept alive so buffered records are flushed. Do \"let _guard = logger.init_global_with_level(level);\""]
    pub fn init_global_with_level(
        self: Arc<Self>,
        level: log::LevelFilter,
    ) -> Result<LoggerGuard, log::SetLoggerError> {
        let guard = LoggerGuard {
            root: Arc::clone(&self),
        };
        log::set_boxed_logger(Box::new(GlobalSpawningLogger(self)))?;
        log::set_max_level(level);
        Ok(guard)
    }

    /// Shuts down this logger's writer thread and every spawned child's,
    /// flushing what they buffered.
    fn shutdown(&self) {
        for child in self.children.lock().unwrap().values() {
            child.shutdown();
        }
        self.logger.shutdown();
    }

    fn create_child_logger(&self, child_name: &str) -> Result<SpawningLogger, Error> {
        let config = config::snapshot();
        let file_name = derived_file_name(&self.file_name, config.child_prefix(), child_name);
        Self::open(&self.log_dir.join(file_name), None)
    }
}

impl SeverityLog for SpawningLogger {
    fn log(&self, severity: Severity, message: &str) {
        self.logger.log(severity, message)
    }
}

impl log::Log for SpawningLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        SeverityLog::log(self, record.level().into(), &record.args().to_string());
    }

    fn flush(&self) {
        self.logger.flush();
    }
}

/// Guard handed out by [`SpawningLogger::init_global`]. Dropping it shuts
/// down the installed logger's writer threads, children included, so
/// everything still buffered reaches disk.
pub struct LoggerGuard {
    root: Arc<SpawningLogger>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        self.root.shutdown();
    }
}

struct GlobalSpawningLogger(Arc<SpawningLogger>);

impl log::Log for GlobalSpawningLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        log::Log::enabled(self.0.as_ref(), metadata)
    }

    fn log(&self, record: &log::Record) {
        log::Log::log(self.0.as_ref(), record);
    }

    fn flush(&self) {
        log::Log::flush(self.0.as_ref());
    }
}

/// Builds a sibling file name from the parent's: the parent's stem, the
/// configured prefix (when set) and the child name, joined by `_`, with the
/// parent's extension re-appended.
///
/// `server.log` + prefix `worker` + child `1` => `server_worker_1.log`
fn derived_file_name(parent: &str, child_prefix: Option<&str>, child_name: &str) -> String {
    let parent_path = Path::new(parent);
    let stem = parent_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(parent);
    let basename = [Some(stem), child_prefix, Some(child_name)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("_");
    match parent_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{basename}.{ext}"),
        None => basename,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::MutexGuard;

    use tempfile::TempDir;

    use super::*;

    // These tests mutate the process-wide config, so they run serialized.
    static CONFIG_LOCK: Mutex<()> = Mutex::new(());

    fn config_guard() -> MutexGuard<'static, ()> {
        let guard = CONFIG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        config::reset_config();
        guard
    }

    #[test]
    fn test_derived_file_name() {
        assert_eq!(derived_file_name("server.log", None, "1"), "server_1.log");
        assert_eq!(
            derived_file_name("server.log", Some("worker"), "1"),
            "server_worker_1.log"
        );
        assert_eq!(derived_file_name("server", Some("worker"), "1"), "server_worker_1");
        assert_eq!(
            derived_file_name("server.tar.gz", None, "1"),
            "server.tar_1.gz"
        );
    }

    #[test]
    fn test_creates_subdir_if_missing() {
        let _guard = config_guard();
        config::configure(|c| c.subdir = Some("development".into()));
        let dir = TempDir::new().unwrap();

        SpawningLogger::new(dir.path().join("test_file.log")).unwrap();

        assert!(dir.path().join("development").is_dir());
        assert!(dir.path().join("development/test_file.log").is_file());
    }

    #[test]
    fn test_spawn_creates_sibling_file() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        logger.spawn("childid").unwrap();
        assert!(dir.path().join("test_file_childid.log").is_file());
    }

    #[test]
    fn test_child_file_name_includes_child_prefix() {
        let _guard = config_guard();
        config::configure(|c| c.child_prefix = Some("childprefix".into()));
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        logger.spawn("childid").unwrap();
        assert!(dir.path().join("test_file_childprefix_childid.log").is_file());
    }

    #[test]
    fn test_spawn_rejects_empty_child_name() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        assert!(matches!(logger.spawn(""), Err(Error::EmptyChildName)));
        // only the parent's own file exists
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_spawn_returns_the_same_instance() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        let first = logger.spawn("childid").unwrap();
        let second = logger.spawn("childid").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_children_spawn_their_own_children() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        let child = logger.spawn("child1").unwrap();
        child.spawn("child2").unwrap();
        // grandchildren stay in the root's directory, no extra nesting
        assert!(dir.path().join("test_file_child1_child2.log").is_file());
    }

    #[test]
    fn test_subdir_is_not_applied_twice_when_spawning() {
        let _guard = config_guard();
        config::configure(|c| {
            c.subdir = Some("production".into());
            c.child_prefix = Some("worker".into());
        });
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("log/server.log")).unwrap();
        logger.spawn("1").unwrap();

        assert!(dir.path().join("log/production/server.log").is_file());
        assert!(dir.path().join("log/production/server_worker_1.log").is_file());
        assert!(!dir.path().join("log/production/production").exists());
    }

    #[test]
    fn test_facade_forwards_records_and_flushes() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = Arc::new(SpawningLogger::new(dir.path().join("server.log")).unwrap());
        let facade_guard = Arc::clone(&logger).init_global().unwrap();

        assert_eq!(log::max_level(), log::LevelFilter::Info);
        log::info!("hello through the facade");
        log::debug!("below the default level");
        log::logger().flush();

        let content = fs::read_to_string(dir.path().join("server.log")).unwrap();
        assert!(content.contains("hello through the facade"));
        assert!(!content.contains("below the default level"));

        // the guard flushes children too, without waiting on any interval
        logger.self_and_spawn("w1", Severity::Warn, "winding down").unwrap();
        drop(facade_guard);
        let child = fs::read_to_string(dir.path().join("server_w1.log")).unwrap();
        assert!(child.contains("winding down"));
    }

    #[test]
    fn test_self_and_spawn_logs_into_both_files() {
        let _guard = config_guard();
        let dir = TempDir::new().unwrap();
        let logger = SpawningLogger::new(dir.path().join("test_file.log")).unwrap();
        logger
            .self_and_spawn("childid", Severity::Error, "server shutdown")
            .unwrap();
        drop(logger);

        for name in ["test_file.log", "test_file_childid.log"] {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(content.contains("server shutdown"), "missing record in {name}");
        }
    }
}
