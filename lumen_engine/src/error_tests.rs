//! Unit tests for error.rs
//!
//! Tests Error display, classification and trait implementations.

use crate::error::{Error, ErrorKind, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkQueueSubmit failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_frame_slot_out_of_range_display() {
    let err = Error::FrameSlotOutOfRange { slot: 5, frames_in_flight: 2 };
    let display = format!("{}", err);
    assert!(display.contains("5"));
    assert!(display.contains("2"));
}

#[test]
fn test_surface_out_of_date_display() {
    assert_eq!(format!("{}", Error::SurfaceOutOfDate), "Surface out of date");
}

#[test]
fn test_resource_state_display() {
    let err = Error::ResourceState("uniform buffer 1 is not mapped".to_string());
    assert!(format!("{}", err).contains("not mapped"));
}

// ============================================================================
// CLASSIFICATION TESTS
// ============================================================================

#[test]
fn test_fatal_kinds() {
    assert_eq!(Error::BackendError(String::new()).kind(), ErrorKind::Fatal);
    assert_eq!(Error::OutOfMemory.kind(), ErrorKind::Fatal);
    assert_eq!(Error::InitializationFailed(String::new()).kind(), ErrorKind::Fatal);
    assert_eq!(Error::DeviceLost.kind(), ErrorKind::Fatal);
    assert!(Error::DeviceLost.is_fatal());
}

#[test]
fn test_precondition_kinds() {
    let err = Error::FrameSlotOutOfRange { slot: 3, frames_in_flight: 3 };
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(Error::NotInitialized(String::new()).kind(), ErrorKind::Precondition);
    assert_eq!(Error::PreconditionViolation(String::new()).kind(), ErrorKind::Precondition);
    assert!(!err.is_fatal());
    assert!(!err.is_transient());
}

#[test]
fn test_transient_kinds() {
    assert!(Error::SurfaceOutOfDate.is_transient());
    assert!(Error::Timeout("fence".to_string()).is_transient());
    assert!(!Error::SurfaceOutOfDate.is_fatal());
}

#[test]
fn test_resource_state_kinds() {
    assert_eq!(Error::ResourceState(String::new()).kind(), ErrorKind::ResourceState);
    assert_eq!(Error::InvalidResource(String::new()).kind(), ErrorKind::ResourceState);
}

#[test]
fn test_match_on_kind_for_recovery() {
    let errors = vec![
        Error::SurfaceOutOfDate,
        Error::DeviceLost,
        Error::FrameSlotOutOfRange { slot: 9, frames_in_flight: 2 },
    ];
    let recoverable: Vec<bool> = errors
        .iter()
        .map(|e| matches!(e.kind(), ErrorKind::Transient))
        .collect();
    assert_eq!(recoverable, vec![true, false, false]);
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::Timeout("acquire".to_string());
    assert_eq!(err.clone(), err);
}

#[test]
fn test_result_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::SurfaceOutOfDate)
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::SurfaceOutOfDate));
}
