//! Wire format constants and fixed-offset field access.
//!
//! Raw frame layout:
//! ```text
//! ┌──────────┬──────────┬──────────────┐
//! │ Size     │ Kind     │ Payload      │
//! │ 2 bytes  │ 2 bytes  │ N bytes      │
//! │ uint16 LE│ uint16 LE│              │
//! └──────────┴──────────┴──────────────┘
//! ```
//!
//! Message layout, once frame payloads are concatenated:
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┐
//! │ Type     │ Marker   │ Subtype  │ Fields            │
//! │ 2 bytes  │ 4 bytes  │ 2 bytes  │ fixed offsets     │
//! │ uint16 LE│ uint32 LE│ uint16 LE│                   │
//! └──────────┴──────────┴──────────┴───────────────────┘
//! ```
//!
//! All multi-byte integers are Little Endian.

use crate::error::{PodError, Result};

/// Raw frame header size in bytes (size + kind).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest payload carried by a single outbound raw frame.
pub const MAX_FRAME_PAYLOAD: usize = 60;

/// Message header size in bytes (type + marker + subtype).
pub const MESSAGE_HEADER_SIZE: usize = 8;

/// Marker written by the editor in bytes 2..6 of every outbound message.
pub const WRITE_MARKER: u32 = 0x0801_400A;

/// Marker the device puts in bytes 2..6 of the messages it sends.
pub const READ_MARKER: u32 = 0x4000_080A;

/// Raw frame kind codes.
pub mod kind {
    /// First frame of a message.
    pub const BEGIN: u16 = 1;
    /// Frame extending the message in progress.
    pub const CONTINUATION: u16 = 4;
}

/// Binary value type tags carried by parameter and setup changes.
pub mod value_type {
    /// Value is a little-endian 32-bit integer.
    pub const INT32: u32 = 0;
    /// Value is a little-endian 32-bit float.
    pub const FLOAT32: u32 = 1;
}

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Message type code.
    pub mtype: u16,
    /// Direction marker.
    pub marker: u32,
    /// Message subtype code.
    pub subtype: u16,
}

impl MessageHeader {
    /// Header for a message sent by the editor.
    pub fn outbound(mtype: u16, subtype: u16) -> Self {
        Self {
            mtype,
            marker: WRITE_MARKER,
            subtype,
        }
    }

    /// Encode the header to its 8 wire bytes.
    pub fn encode(&self) -> [u8; MESSAGE_HEADER_SIZE] {
        let mut buf = [0u8; MESSAGE_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.mtype.to_le_bytes());
        buf[2..6].copy_from_slice(&self.marker.to_le_bytes());
        buf[6..8].copy_from_slice(&self.subtype.to_le_bytes());
        buf
    }

    /// Decode a header from the first 8 bytes of `buf`.
    ///
    /// Returns `None` while fewer than 8 bytes are available.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < MESSAGE_HEADER_SIZE {
            return None;
        }
        Some(Self {
            mtype: u16::from_le_bytes([buf[0], buf[1]]),
            marker: u32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]),
            subtype: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }
}

fn field(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    buf.get(offset..offset + len).ok_or_else(|| {
        PodError::Protocol(format!(
            "field at offset {} needs {} bytes, message has {}",
            offset,
            len,
            buf.len()
        ))
    })
}

/// Read a single byte at `offset`.
#[inline]
pub fn u8_at(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(field(buf, offset, 1)?[0])
}

/// Read a little-endian u16 at `offset`.
#[inline]
pub fn u16_at(buf: &[u8], offset: usize) -> Result<u16> {
    let b = field(buf, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read a little-endian u32 at `offset`.
#[inline]
pub fn u32_at(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_le_bytes(bytes4_at(buf, offset)?))
}

/// Read 4 raw bytes at `offset`.
#[inline]
pub fn bytes4_at(buf: &[u8], offset: usize) -> Result<[u8; 4]> {
    let b = field(buf, offset, 4)?;
    Ok([b[0], b[1], b[2], b[3]])
}

/// Read `len` raw bytes at `offset`.
#[inline]
pub fn bytes_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    field(buf, offset, len)
}

/// Decode a NUL/space padded name field.
pub fn padded_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}
