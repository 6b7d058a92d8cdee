//! Transport module - access to the hardware device handle.
//!
//! The device is driven through blocking calls; the controller runs them
//! on tokio's blocking pool. Provides:
//! - The [`Transport`] trait implemented by device backends
//! - [`MemoryDevice`], a scripted in-memory device

mod memory;

pub use memory::{MemoryDevice, Responder};

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// One entry of the device enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Identifier passed to [`Transport::open`].
    pub id: String,
    /// Human readable name.
    pub name: String,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Raw device handle.
///
/// Methods take `&self` so that the reader and the writer can share one
/// handle; implementations synchronize internally.
pub trait Transport: Send + Sync + 'static {
    /// Open the named device.
    fn open(&self, device: &str) -> Result<()>;

    /// Read at most `max` bytes.
    ///
    /// An empty buffer means "no data yet" and is not an error.
    fn read(&self, max: usize) -> Result<Bytes>;

    /// Write `data`, returning the number of bytes written.
    fn write(&self, data: &[u8]) -> Result<usize>;

    fn close(&self) -> Result<()>;

    fn is_open(&self) -> bool;

    /// Devices that can be opened.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;
}
