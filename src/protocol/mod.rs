//! Protocol module - raw frames and the message wire format.
//!
//! This module implements the transport-level layer:
//! - 4-byte raw frame header decoding/encoding
//! - Splitting outbound messages into frames
//! - Message header and fixed-offset field readers

mod frame;
mod wire_format;

pub use frame::{split_message, FrameKind, RawFrame};
pub use wire_format::{
    bytes4_at, bytes_at, kind, padded_name, u16_at, u32_at, u8_at, value_type, MessageHeader,
    FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD, MESSAGE_HEADER_SIZE, READ_MARKER, WRITE_MARKER,
};
