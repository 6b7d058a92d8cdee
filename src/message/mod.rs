//! Message layer - reassembly, registry lookup, decoding and encoding.
//!
//! Inbound bytes flow through the layers in order:
//! raw frames ([`crate::protocol`]) → [`Assembler`] → [`Registry`] lookup →
//! decoder applied to the board → [`Outcome`].
//!
//! Outbound messages are built by the functions in [`encode`] and split
//! into frames by the writer.

mod assembler;
pub mod encode;
pub mod parse;
mod registry;
pub mod setup;

pub use assembler::{Assembler, Message};
pub use parse::Outcome;
pub use registry::{Descriptor, Parser, Registry, UNKNOWN};

/// Every message kind the device speaks.
///
/// Discriminants index the static descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ActiveChange,
    TypeChange,
    ParameterChange,
    ParameterChangeMin,
    ParameterChangeMax,
    TempoChange,
    TempoChange2,
    PresetChange,
    PresetChangeAlert,
    PresetLoad,
    PresetSet,
    PresetQuery,
    SetChange,
    SetLoad,
    SetQuery,
    SetupChange,
    Unknown,
}

impl MessageKind {
    /// Static descriptor of this kind.
    #[inline]
    pub fn descriptor(self) -> &'static Descriptor {
        Registry::global().descriptor(self)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::MessageKind;
    use crate::protocol::{MessageHeader, READ_MARKER};

    /// Zeroed inbound message of the declared length, header filled in.
    pub fn inbound(kind: MessageKind) -> Vec<u8> {
        let d = kind.descriptor();
        let header = MessageHeader {
            mtype: d.mtype,
            marker: READ_MARKER,
            subtype: d.subtype,
        };
        let mut buf = vec![0u8; d.length.max(8)];
        buf[..8].copy_from_slice(&header.encode());
        buf
    }

    pub fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}
