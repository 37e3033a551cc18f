/// Lumen Engine - process-wide state for logging and configuration
///
/// This module provides global singleton storage for the active logger and
/// the configuration the engine was initialized with. It uses thread-safe
/// static storage with RwLock for safe concurrent access.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::config::Config;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure
struct EngineState {
    /// Configuration passed to `initialize`, cleared on shutdown
    config: RwLock<Option<Config>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            config: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use lumen_engine::lumen::{Config, Engine};
///
/// Engine::initialize(Config::default())?;
/// let frames = Engine::config()?.frames_in_flight;
/// Engine::shutdown();
/// # Ok::<(), lumen_engine::lumen::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine with a validated configuration
    ///
    /// Calling this again replaces the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the configuration is invalid or the
    /// configuration lock is poisoned.
    pub fn initialize(config: Config) -> Result<()> {
        config.validate()?;

        let state = ENGINE_STATE.get_or_init(EngineState::new);
        let mut lock = state.config.write().map_err(|_| {
            crate::engine_error!("lumen::Engine", "Configuration lock poisoned");
            Error::InitializationFailed("Configuration lock poisoned".to_string())
        })?;

        crate::engine_info!(
            "lumen::Engine",
            "Engine initialized ({} frames in flight)",
            config.frames_in_flight
        );
        *lock = Some(config);
        Ok(())
    }

    /// Shutdown the engine
    ///
    /// After calling this, `initialize()` must be called again before
    /// `config()` succeeds.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut config) = state.config.write() {
                if config.take().is_some() {
                    crate::engine_info!("lumen::Engine", "Engine shut down");
                }
            }
        }
    }

    /// Get a copy of the active configuration
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if `initialize()` has not been called.
    pub fn config() -> Result<Config> {
        let state = ENGINE_STATE.get().ok_or_else(|| {
            Error::NotInitialized("Engine not initialized. Call Engine::initialize() first.".to_string())
        })?;

        let lock = state.config.read().map_err(|_| {
            crate::engine_error!("lumen::Engine", "Configuration lock poisoned");
            Error::BackendError("Configuration lock poisoned".to_string())
        })?;

        lock.clone().ok_or_else(|| {
            Error::NotInitialized("Engine not initialized. Call Engine::initialize() first.".to_string())
        })
    }

    /// Whether `initialize()` has been called since the last shutdown
    pub fn is_initialized() -> bool {
        ENGINE_STATE
            .get()
            .and_then(|state| state.config.read().ok().map(|c| c.is_some()))
            .unwrap_or(false)
    }

    /// Reset all state for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut config) = state.config.write() {
                *config = None;
            }
        }
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, network logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lumen_engine::lumen::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
