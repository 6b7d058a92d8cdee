//! Encoders for outbound messages.
//!
//! Every encoder returns the complete message (header included) as
//! `Bytes`. Splitting into raw frames happens in the writer.
//!
//! # Example
//!
//! ```
//! use podwire::message::encode;
//!
//! let msg = encode::active_change(4, true);
//! assert_eq!(msg.len(), 20);
//! assert_eq!(&msg[12..16], &4u32.to_le_bytes());
//! assert_eq!(&msg[16..20], &1u32.to_le_bytes());
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::parse::{PRESET_ITEMS_OFFSET, PRESET_ITEM_STRIDE};
use super::setup;
use super::MessageKind;
use crate::error::{PodError, Result};
use crate::model::{Dt, DtField, Parameter, Rig, Slot, PRESET_ITEM_ORDER, PRESET_NAME_LEN};
use crate::protocol::{value_type, MessageHeader};

/// Preset or set id meaning "the one currently selected on the device".
pub const CURRENT: u16 = 0xFFFF;

/// Low word the editor uses for disabled models.
const DISABLED_LOW: u32 = 0xFFFF;

/// High word the device expects on disabled models.
const DISABLED_WIRE_HIGH: u32 = 0x7FFF_0000;

/// Part of the preset dump copied verbatim into a preset set.
const DUMP_COPY_START: usize = 24;

/// Little-endian message writer.
///
/// Starts with the outbound header of the given kind.
pub struct MessageBuilder {
    buf: BytesMut,
}

impl MessageBuilder {
    pub fn new(kind: MessageKind) -> Self {
        let d = kind.descriptor();
        let mut buf = BytesMut::with_capacity(d.length);
        buf.put_slice(&MessageHeader::outbound(d.mtype, d.subtype).encode());
        Self { buf }
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.buf.put_u16_le(v);
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.buf.put_u32_le(v);
        self
    }

    pub fn bytes(mut self, v: &[u8]) -> Self {
        self.buf.put_slice(v);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

pub fn active_change(item_id: u32, active: bool) -> Bytes {
    MessageBuilder::new(MessageKind::ActiveChange)
        .u32(0)
        .u32(item_id)
        .u32(u32::from(active))
        .finish()
}

/// Wire form of a model code.
///
/// Disabled models (low word 0xFFFF) go out with a 0x7FFF high word.
pub fn wire_model_code(code: u32) -> u32 {
    if code & 0xFFFF == DISABLED_LOW {
        (code & 0xFFFF) + DISABLED_WIRE_HIGH
    } else {
        code
    }
}

pub fn type_change(item_id: u32, code: u32) -> Bytes {
    MessageBuilder::new(MessageKind::TypeChange)
        .u32(0)
        .u32(item_id)
        .u32(wire_model_code(code))
        .finish()
}

/// Parameter change for one value slot of an item parameter.
pub fn parameter_change(item_id: u32, param: &Parameter, slot: Slot) -> Bytes {
    let kind = match slot {
        Slot::Current => MessageKind::ParameterChange,
        Slot::Min => MessageKind::ParameterChangeMin,
        Slot::Max => MessageKind::ParameterChangeMax,
    };
    MessageBuilder::new(kind)
        .u32(0)
        .u32(item_id)
        .u32(param.value_type())
        .u32(param.id())
        .bytes(&param.bin(slot))
        .finish()
}

/// Wire value of a tempo parameter: a note division, or 0 for free Hz.
pub fn tempo_wire_value(param: &Parameter) -> u32 {
    let v = param.current_f32();
    if v > 1.0 {
        v.round() as u32
    } else {
        0
    }
}

/// Tempo change for the `nth` (0 or 1) tempo parameter of an item.
pub fn tempo_change(item_id: u32, nth: usize, param: &Parameter) -> Bytes {
    let kind = if nth == 0 {
        MessageKind::TempoChange
    } else {
        MessageKind::TempoChange2
    };
    MessageBuilder::new(kind)
        .u32(0)
        .u32(item_id)
        .u32(tempo_wire_value(param))
        .finish()
}

pub fn preset_change(preset: u32) -> Bytes {
    MessageBuilder::new(MessageKind::PresetChange)
        .u32(preset)
        .finish()
}

pub fn set_change(set: u32) -> Bytes {
    MessageBuilder::new(MessageKind::SetChange).u32(set).finish()
}

/// Ask for a preset dump. [`CURRENT`] selects the active one.
pub fn preset_query(preset: u16, set: u16) -> Bytes {
    MessageBuilder::new(MessageKind::PresetQuery)
        .u16(preset)
        .u16(set)
        .finish()
}

pub fn set_query(set: u32) -> Bytes {
    MessageBuilder::new(MessageKind::SetQuery).u32(set).finish()
}

pub fn setup_change(setup_id: u32, vtype: u32, value: [u8; 4]) -> Bytes {
    MessageBuilder::new(MessageKind::SetupChange)
        .u32(0)
        .u32(vtype)
        .u32(setup_id)
        .bytes(&value)
        .finish()
}

/// Setup change carrying the current value of a setup-addressed parameter.
pub fn setup_param_change(setup_id: u32, param: &Parameter) -> Bytes {
    setup_change(setup_id, param.value_type(), param.bin(Slot::Current))
}

/// Setup change for one DT switch.
pub fn dt_change(dt: &Dt, field: DtField) -> Bytes {
    setup_change(
        setup::dt_id(dt.id(), field),
        value_type::INT32,
        [dt.bin(field), 0, 0, 0],
    )
}

/// "Save preset": the last dump with the rig's positions patched in.
///
/// `dump` is a full preset-load message as received from the device.
pub fn preset_set(
    rig: &Rig,
    dump: &[u8],
    preset: u16,
    set: u16,
    name: [u8; PRESET_NAME_LEN],
) -> Result<Bytes> {
    let load_len = MessageKind::PresetLoad.descriptor().length;
    let Some(dump) = dump.get(..load_len) else {
        return Err(PodError::Protocol(format!(
            "preset dump has {} bytes, expected {}",
            dump.len(),
            load_len
        )));
    };

    let mut data = dump.to_vec();
    for (i, id) in PRESET_ITEM_ORDER.into_iter().enumerate() {
        let position = rig.item(id)?.position();
        let base = PRESET_ITEMS_OFFSET + i * PRESET_ITEM_STRIDE;
        data[base + 4..base + 6].copy_from_slice(&position.pos.to_le_bytes());
        data[base + 6] = position.class.code();
    }

    Ok(MessageBuilder::new(MessageKind::PresetSet)
        .u16(preset)
        .u16(set)
        .bytes(&name)
        .bytes(&data[DUMP_COPY_START..])
        .finish())
}
