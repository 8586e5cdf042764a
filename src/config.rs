use std::sync::{LazyLock, RwLock};

use derive_from_env::FromEnv;

#[derive(FromEnv)]
#[from_env(prefix = "SPAWNLOG")]
#[allow(non_snake_case)]
pub struct SpawnLogEnv {
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
}

pub static SPAWNLOG_ENV: LazyLock<SpawnLogEnv> =
    LazyLock::new(|| SpawnLogEnv::from_env().unwrap());

/// Process-wide settings applied to every logger constructed after they are
/// set. Mutate through [`configure`], restore defaults with [`reset_config`]
/// (tests should reset between runs).
#[derive(Debug, Default, Clone)]
pub struct SpawnConfig {
    /// Extra name component inserted between a parent's file stem and the
    /// child name when deriving a child's file name.
    pub child_prefix: Option<String>,
    /// Subdirectory appended to the parent directory of every root logger
    /// path, so all log files land one level down.
    pub subdir: Option<String>,
}

impl SpawnConfig {
    pub(crate) fn child_prefix(&self) -> Option<&str> {
        self.child_prefix.as_deref().filter(|p| !p.is_empty())
    }

    pub(crate) fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref().filter(|s| !s.is_empty())
    }
}

static SPAWN_CONFIG: RwLock<SpawnConfig> = RwLock::new(SpawnConfig {
    child_prefix: None,
    subdir: None,
});

/// Updates the process-wide spawn configuration.
///
/// ```rust
/// spawnlog::configure(|c| c.child_prefix = Some("worker".into()));
/// # spawnlog::reset_config();
/// ```
pub fn configure(f: impl FnOnce(&mut SpawnConfig)) {
    f(&mut SPAWN_CONFIG.write().unwrap());
}

/// Restores the default (unset) spawn configuration.
pub fn reset_config() {
    *SPAWN_CONFIG.write().unwrap() = SpawnConfig::default();
}

/// Snapshot taken once per logger construction.
pub(crate) fn snapshot() -> SpawnConfig {
    SPAWN_CONFIG.read().unwrap().clone()
}

#[test]
fn test_empty_components_count_as_unset() {
    let config = SpawnConfig {
        child_prefix: Some(String::new()),
        subdir: Some(String::new()),
    };
    assert_eq!(config.child_prefix(), None);
    assert_eq!(config.subdir(), None);
}
