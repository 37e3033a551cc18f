//! Unit tests for Engine singleton manager
//!
//! IMPORTANT: ENGINE_STATE and LOGGER are global OnceLocks shared across all tests.
//! All tests are marked with #[serial] to run sequentially.

use crate::lumen::{Config, Engine, Error};
use crate::lumen::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Test logger that captures log entries for verification
#[derive(Clone)]
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl TestLogger {
    fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        // Parallel non-serial tests share the global logger
        if entry.source != "lumen::test" && entry.source != "lumen::Engine" {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        entries.push(format!("{:?}: {}", entry.severity, entry.message));
    }
}

fn setup() {
    Engine::reset_for_testing();
}

// ============================================================================
// INITIALIZATION AND SHUTDOWN TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_initialize_stores_config() {
    setup();
    let config = Config {
        frames_in_flight: 3,
        ..Config::default()
    };

    Engine::initialize(config).unwrap();

    assert!(Engine::is_initialized());
    assert_eq!(Engine::config().unwrap().frames_in_flight, 3);
    Engine::shutdown();
}

#[test]
#[serial]
fn test_engine_initialize_rejects_invalid_config() {
    setup();
    let config = Config {
        frames_in_flight: 0,
        ..Config::default()
    };

    let result = Engine::initialize(config);

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert!(!Engine::is_initialized());
}

#[test]
#[serial]
fn test_engine_config_before_initialize_fails() {
    setup();
    let result = Engine::config();
    assert!(matches!(result, Err(Error::NotInitialized(_))));
}

#[test]
#[serial]
fn test_engine_shutdown_clears_config() {
    setup();
    Engine::initialize(Config::default()).unwrap();

    Engine::shutdown();

    assert!(!Engine::is_initialized());
    assert!(Engine::config().is_err());
}

#[test]
#[serial]
fn test_engine_shutdown_without_initialize_is_noop() {
    setup();
    Engine::shutdown();
    Engine::shutdown();
    assert!(!Engine::is_initialized());
}

#[test]
#[serial]
fn test_engine_reinitialize_replaces_config() {
    setup();
    Engine::initialize(Config::default()).unwrap();
    Engine::initialize(Config { frames_in_flight: 1, ..Config::default() }).unwrap();

    assert_eq!(Engine::config().unwrap().frames_in_flight, 1);
    Engine::shutdown();
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_entries() {
    setup();
    let logger = TestLogger::new();
    Engine::set_logger(logger.clone());

    Engine::log(LogSeverity::Warn, "lumen::test", "first".to_string());
    Engine::log_detailed(LogSeverity::Error, "lumen::test", "second".to_string(), "x.rs", 7);

    Engine::reset_logger();
    assert_eq!(logger.entries(), vec!["Warn: first".to_string(), "Error: second".to_string()]);
}

#[test]
#[serial]
fn test_initialize_logs_frames_in_flight() {
    setup();
    let logger = TestLogger::new();
    Engine::set_logger(logger.clone());

    Engine::initialize(Config::default()).unwrap();

    Engine::reset_logger();
    Engine::shutdown();
    assert!(logger.entries().iter().any(|e| e.contains("2 frames in flight")));
}

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    setup();
    let logger = TestLogger::new();
    Engine::set_logger(logger.clone());
    Engine::reset_logger();

    Engine::log(LogSeverity::Info, "lumen::test", "not captured".to_string());

    assert!(logger.entries().is_empty());
}
