//! Reassembly of raw frames into complete messages.
//!
//! State machine:
//! - `Empty`: waiting for a Begin frame
//! - `Accumulating`: collecting Continuation frames; the (type, subtype)
//!   pair is resolved once, as soon as 8 bytes are available
//! - `Ready`: the declared length has been reached
//!
//! An assembler handles exactly one message. Once it is ready the caller
//! takes the message with [`Assembler::into_message`] and starts a fresh
//! assembler for the next Begin frame.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use podwire::message::{Assembler, MessageKind};
//! use podwire::protocol::{FrameKind, MessageHeader, RawFrame, READ_MARKER};
//!
//! let header = MessageHeader { mtype: 4, marker: READ_MARKER, subtype: 0x1300 };
//! let mut body = header.encode().to_vec();
//! body.resize(20, 0);
//!
//! let mut asm = Assembler::new();
//! assert!(!asm.push(&RawFrame::new(FrameKind::Begin, Bytes::copy_from_slice(&body[..6]))).unwrap());
//! assert!(asm.push(&RawFrame::new(FrameKind::Continuation, Bytes::copy_from_slice(&body[6..]))).unwrap());
//! assert_eq!(asm.into_message().unwrap().kind(), MessageKind::ActiveChange);
//! ```

use bytes::{Bytes, BytesMut};
use tracing::warn;

use super::parse::Outcome;
use super::registry::{Descriptor, Registry};
use super::MessageKind;
use crate::error::{PodError, Result};
use crate::model::PedalBoard;
use crate::protocol::{FrameKind, MessageHeader, RawFrame};

#[derive(Debug, Clone, Copy)]
enum State {
    Empty,
    Accumulating {
        descriptor: Option<&'static Descriptor>,
    },
    Ready {
        descriptor: &'static Descriptor,
    },
}

/// Collects the frames of one message.
#[derive(Debug)]
pub struct Assembler {
    buffer: BytesMut,
    state: State,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            state: State::Empty,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    /// Bytes collected so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one raw frame.
    ///
    /// Returns `Ok(true)` once the message is complete. Structural errors
    /// leave the assembler untouched; an unknown (type, subtype) pair
    /// discards the partial message.
    pub fn push(&mut self, frame: &RawFrame) -> Result<bool> {
        match (frame.kind(), self.state) {
            (FrameKind::Unknown(code), _) => Err(PodError::Protocol(format!(
                "unsupported frame kind {}",
                code
            ))),
            (FrameKind::Begin, State::Empty) => {
                self.buffer.extend_from_slice(frame.payload());
                self.state = State::Accumulating { descriptor: None };
                self.advance()
            }
            (FrameKind::Begin, _) => Err(PodError::Protocol(
                "cannot re-initialize in-progress message".to_string(),
            )),
            (FrameKind::Continuation, State::Accumulating { .. }) => {
                self.buffer.extend_from_slice(frame.payload());
                self.advance()
            }
            (FrameKind::Continuation, State::Empty) => Err(PodError::Protocol(
                "extend called on non-extendable state".to_string(),
            )),
            (FrameKind::Continuation, State::Ready { .. }) => Err(PodError::Protocol(
                "message is already complete".to_string(),
            )),
        }
    }

    fn advance(&mut self) -> Result<bool> {
        let State::Accumulating { descriptor } = self.state else {
            return Ok(self.is_ready());
        };

        let descriptor = match descriptor {
            Some(d) => d,
            None => {
                let Some(header) = MessageHeader::decode(&self.buffer) else {
                    return Ok(false);
                };
                match Registry::global().lookup(header.mtype, header.subtype) {
                    Some(d) => d,
                    None => {
                        self.buffer.clear();
                        self.state = State::Empty;
                        return Err(PodError::UnknownMessage {
                            mtype: header.mtype,
                            subtype: header.subtype,
                        });
                    }
                }
            }
        };

        if self.buffer.len() >= descriptor.length {
            self.state = State::Ready { descriptor };
            Ok(true)
        } else {
            self.state = State::Accumulating {
                descriptor: Some(descriptor),
            };
            Ok(false)
        }
    }

    /// The completed message, or `None` if not ready.
    pub fn into_message(self) -> Option<Message> {
        match self.state {
            State::Ready { descriptor } => Some(Message {
                descriptor,
                data: self.buffer.freeze(),
            }),
            _ => None,
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete, resolved message.
#[derive(Debug, Clone)]
pub struct Message {
    descriptor: &'static Descriptor,
    data: Bytes,
}

impl Message {
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.descriptor.kind
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    #[inline]
    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    /// Full message bytes, header included.
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Apply the message to the board. The caller holds the board lock.
    pub fn parse(&self, pb: &mut PedalBoard) -> Outcome {
        let Some(parser) = self.descriptor.parser else {
            return Outcome::warning(
                PodError::Protocol(format!("no decoder for {} message", self.name())),
                None,
            );
        };
        parser(&self.data, pb).unwrap_or_else(|e| {
            warn!("{} message not applied: {}", self.name(), e);
            Outcome::warning(e, None)
        })
    }
}
