//! Raw transport frames.
//!
//! A device read yields exactly one raw frame: a 4-byte frame header followed
//! by a payload slice. Decoding never fails; a frame kind the engine does not
//! understand is carried as [`FrameKind::Unknown`] and rejected by the
//! assembler.
//!
//! # Example
//!
//! ```
//! use podwire::protocol::{FrameKind, RawFrame};
//! use bytes::Bytes;
//!
//! let frame = RawFrame::decode(Bytes::from_static(&[3, 0, 1, 0, b'a', b'b', b'c']));
//! assert_eq!(frame.kind(), FrameKind::Begin);
//! assert_eq!(frame.payload(), b"abc");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{kind, FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD};

/// Frame kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Starts a new message.
    Begin,
    /// Extends the message in progress.
    Continuation,
    /// Any other kind code.
    Unknown(u16),
}

impl FrameKind {
    /// Map a wire code to a frame kind.
    pub fn from_code(code: u16) -> Self {
        match code {
            kind::BEGIN => FrameKind::Begin,
            kind::CONTINUATION => FrameKind::Continuation,
            other => FrameKind::Unknown(other),
        }
    }

    /// Wire code of this kind.
    pub fn code(self) -> u16 {
        match self {
            FrameKind::Begin => kind::BEGIN,
            FrameKind::Continuation => kind::CONTINUATION,
            FrameKind::Unknown(code) => code,
        }
    }
}

/// A single transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    declared_size: u16,
    kind: FrameKind,
    payload: Bytes,
}

impl RawFrame {
    /// Create a frame whose declared size is the payload length.
    pub fn new(kind: FrameKind, payload: Bytes) -> Self {
        Self {
            declared_size: payload.len() as u16,
            kind,
            payload,
        }
    }

    /// Decode a frame from one device read.
    ///
    /// Everything from offset 4 onward is payload. Buffers shorter than the
    /// frame header decode to an unknown kind with whatever header bytes
    /// exist and an empty payload.
    pub fn decode(buf: Bytes) -> Self {
        if buf.len() < FRAME_HEADER_SIZE {
            let size = match buf.len() {
                0 | 1 => 0,
                _ => u16::from_le_bytes([buf[0], buf[1]]),
            };
            return Self {
                declared_size: size,
                kind: FrameKind::Unknown(0),
                payload: Bytes::new(),
            };
        }

        let declared_size = u16::from_le_bytes([buf[0], buf[1]]);
        let code = u16::from_le_bytes([buf[2], buf[3]]);
        Self {
            declared_size,
            kind: FrameKind::from_code(code),
            payload: buf.slice(FRAME_HEADER_SIZE..),
        }
    }

    /// Encode header and payload into one write buffer.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        buf.put_u16_le(self.declared_size);
        buf.put_u16_le(self.kind.code());
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    /// Declared frame size from the header.
    #[inline]
    pub fn declared_size(&self) -> u16 {
        self.declared_size
    }

    /// Frame kind.
    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as Bytes (cheap clone).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }
}

/// Split an encoded message into outbound raw frames.
///
/// The first frame is `Begin`, the rest are `Continuation`, and no frame
/// carries more than [`MAX_FRAME_PAYLOAD`] bytes.
pub fn split_message(message: &Bytes) -> Vec<RawFrame> {
    if message.is_empty() {
        return vec![RawFrame::new(FrameKind::Begin, Bytes::new())];
    }

    let mut frames = Vec::with_capacity(message.len().div_ceil(MAX_FRAME_PAYLOAD));
    let mut offset = 0;
    while offset < message.len() {
        let end = (offset + MAX_FRAME_PAYLOAD).min(message.len());
        let kind = if offset == 0 {
            FrameKind::Begin
        } else {
            FrameKind::Continuation
        };
        frames.push(RawFrame::new(kind, message.slice(offset..end)));
        offset = end;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_begin() {
        let frame = RawFrame::decode(Bytes::from_static(&[0x14, 0x00, 0x01, 0x00, 1, 2, 3]));
        assert_eq!(frame.declared_size(), 0x14);
        assert_eq!(frame.kind(), FrameKind::Begin);
        assert_eq!(frame.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_decode_continuation() {
        let frame = RawFrame::decode(Bytes::from_static(&[0x02, 0x00, 0x04, 0x00, 9, 9]));
        assert_eq!(frame.kind(), FrameKind::Continuation);
        assert_eq!(frame.payload(), &[9, 9]);
    }

    #[test]
    fn test_decode_unknown_kind_keeps_payload() {
        let frame = RawFrame::decode(Bytes::from_static(&[0x01, 0x00, 0x07, 0x00, 0xAA]));
        assert_eq!(frame.kind(), FrameKind::Unknown(7));
        assert_eq!(frame.payload(), &[0xAA]);
    }

    #[test]
    fn test_decode_short_buffer() {
        let frame = RawFrame::decode(Bytes::from_static(&[0x05, 0x00, 0x01]));
        assert_eq!(frame.declared_size(), 5);
        assert_eq!(frame.kind(), FrameKind::Unknown(0));
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_encode_layout() {
        let frame = RawFrame::new(FrameKind::Continuation, Bytes::from_static(b"xyz"));
        assert_eq!(&frame.encode()[..], &[3, 0, 4, 0, b'x', b'y', b'z']);
    }

    #[test]
    fn test_split_message_chunks() {
        let message = Bytes::from(vec![7u8; 130]);
        let frames = split_message(&message);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].kind(), FrameKind::Begin);
        assert_eq!(frames[1].kind(), FrameKind::Continuation);
        assert_eq!(frames[2].kind(), FrameKind::Continuation);
        assert_eq!(frames[0].declared_size(), 60);
        assert_eq!(frames[2].declared_size(), 10);
    }

    #[test]
    fn test_split_short_message_single_frame() {
        let message = Bytes::from(vec![1u8; 20]);
        let frames = split_message(&message);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload().len(), 20);
    }
}
