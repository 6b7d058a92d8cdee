//! Error types for podwire.

use thiserror::Error;

/// Main error type for all podwire operations.
#[derive(Debug, Error)]
pub enum PodError {
    /// I/O error reported by the device transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while rendering an observer view.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structural framing error (continuation without begin, re-begin, ...).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No registry descriptor for this (type, subtype) pair.
    #[error("Unknown message type: type {mtype:#06x}, subtype {subtype:#06x}")]
    UnknownMessage { mtype: u16, subtype: u16 },

    /// A binary setter rejected the value for this parameter variant.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Value rejected by domain validation; the model was not touched.
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Referenced item, parameter, preset or set does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Action requires a running controller.
    #[error("Controller is not running")]
    NotRunning,

    /// Start requested while the controller is already running.
    #[error("Controller is already running")]
    AlreadyRunning,

    /// Transport fault as reported to observers.
    #[error("Device error: {0}")]
    Device(String),

    /// Channel to a controller task closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Bulk scan gave up waiting for the device to answer.
    #[error("Timed out waiting for device response")]
    ScanTimeout,
}

/// Result type alias using PodError.
pub type Result<T> = std::result::Result<T, PodError>;
