//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! The free functions at the bottom of this module (`database_path()`,
//! `marking_threads()`, ...) are shorthands for reading one field of the
//! global instance.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    /// Identifier written into `grading_units.claimed_by` by this node.
    pub node_id: String,
    /// Number of worker tasks draining the marking queue.
    pub marking_threads: usize,
    /// Milliseconds between two poller cycles.
    pub marking_poll_interval_ms: u64,
    /// Milliseconds after which a claimed grading unit may be reclaimed.
    pub marking_work_timeout_ms: u64,
    /// Capacity of the in-process queue, also the upper bound of one claim batch.
    pub marking_fetch_rate: usize,
    /// `oldest` or `newest`.
    pub marking_claim_order: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Malformed numeric values fall back to their defaults with a warning.
    /// `DATABASE_PATH` has no default and is left empty when unset; callers
    /// that need a database check it when connecting.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "marking-node".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "marking=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "marking.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_default(),
            node_id: env::var("NODE_ID")
                .unwrap_or_else(|_| format!("node-{}", std::process::id())),
            marking_threads: parsed_or("MARKING_THREADS", 4),
            marking_poll_interval_ms: parsed_or("MARKING_POLL_INTERVAL_MS", 10_000),
            marking_work_timeout_ms: parsed_or("MARKING_WORK_TIMEOUT_MS", 120_000),
            marking_fetch_rate: parsed_or("MARKING_FETCH_RATE", 16),
            marking_claim_order: env::var("MARKING_CLAIM_ORDER")
                .unwrap_or_else(|_| "oldest".into()),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    /// Override `env` value.
    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_node_id(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.node_id = value.into());
    }

    pub fn set_marking_threads(value: usize) {
        AppConfig::set_field(|cfg| cfg.marking_threads = value);
    }

    pub fn set_marking_poll_interval_ms(value: u64) {
        AppConfig::set_field(|cfg| cfg.marking_poll_interval_ms = value);
    }

    pub fn set_marking_work_timeout_ms(value: u64) {
        AppConfig::set_field(|cfg| cfg.marking_work_timeout_ms = value);
    }

    pub fn set_marking_fetch_rate(value: usize) {
        AppConfig::set_field(|cfg| cfg.marking_fetch_rate = value);
    }

    pub fn set_marking_claim_order(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.marking_claim_order = value.into());
    }
}

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn node_id() -> String {
    AppConfig::global().node_id.clone()
}

pub fn marking_threads() -> usize {
    AppConfig::global().marking_threads
}

pub fn marking_poll_interval_ms() -> u64 {
    AppConfig::global().marking_poll_interval_ms
}

pub fn marking_work_timeout_ms() -> u64 {
    AppConfig::global().marking_work_timeout_ms
}

pub fn marking_fetch_rate() -> usize {
    AppConfig::global().marking_fetch_rate
}

pub fn marking_claim_order() -> String {
    AppConfig::global().marking_claim_order.clone()
}
