//! Decoders for inbound messages.
//!
//! Each decoder reads fixed offsets of a complete message and applies the
//! change to the board. Decoders run with the board lock already held.
//! A decoder returning `Err` means the message could not be applied at all;
//! a field the model rejects is logged and reported as a `Warning` outcome
//! while the rest of the message is still applied.

use bytes::Bytes;
use tracing::{debug, warn};

use super::setup::{self, SetupTarget};
use crate::error::{PodError, Result};
use crate::model::{
    board_param, catalog::cab_param, DtField, Item, ItemRole, PedalBoard, Position,
    PositionClass, Slot, PRESET_ITEM_ORDER,
};
use crate::notify::{ChangeKind, Notification, Target};
use crate::protocol::{bytes4_at, bytes_at, padded_name, u16_at, u32_at, u8_at};

/// Offset of the first item record in a preset dump.
pub(crate) const PRESET_ITEMS_OFFSET: usize = 48;

/// Size of one item record in a preset dump.
pub(crate) const PRESET_ITEM_STRIDE: usize = 256;

const ITEM_PARAMS_OFFSET: usize = 16;
const PARAM_RECORD_SIZE: usize = 20;
const MAX_PARAM_RECORDS: usize = 12;

const CAB_RECORD_ORDER: [u32; 4] = [
    cab_param::LOW_CUT,
    cab_param::RES_LEVEL,
    cab_param::THUMP,
    cab_param::DECAY,
];

/// DT blocks: (dt id, offset of topology; class and mode follow).
const DT_OFFSETS: [(u8, usize); 2] = [(0, 3124), (1, 3132)];

/// Cab extras: (cab item id, early reflection offset, mic offset).
const CAB_EXTRA_OFFSETS: [(u32, usize, usize); 2] = [(1, 3412, 4096), (3, 3420, 4097)];

/// Board parameters stored as single bytes.
const BOARD_PARAM_OFFSETS: [(u32, usize); 3] = [
    (board_param::GUITAR_IN_Z, 3546),
    (board_param::INPUT1_SOURCE, 4102),
    (board_param::INPUT2_SOURCE, 4103),
];

/// Result of applying one message to the board.
#[derive(Debug)]
pub struct Outcome {
    pub kind: ChangeKind,
    pub error: Option<PodError>,
    pub target: Option<Target>,
}

impl Outcome {
    pub fn change(kind: ChangeKind, target: Target) -> Self {
        Self {
            kind,
            error: None,
            target: Some(target),
        }
    }

    /// Nothing to report.
    pub fn none() -> Self {
        Self {
            kind: ChangeKind::None,
            error: None,
            target: None,
        }
    }

    pub fn warning(error: PodError, target: Option<Target>) -> Self {
        Self {
            kind: ChangeKind::Warning,
            error: Some(error),
            target,
        }
    }

    pub fn into_notification(self) -> Notification {
        Notification::new(self.kind, self.error, self.target)
    }
}

#[inline]
fn item_id(data: &[u8]) -> Result<u32> {
    u32_at(data, 12)
}

fn byte_value(b: u8) -> [u8; 4] {
    [b, 0, 0, 0]
}

fn preset_target(pb: &PedalBoard) -> Target {
    match (pb.current_set(), pb.current_preset()) {
        (Some(set), Some(preset)) => Target::Preset { set, preset },
        _ => Target::Board,
    }
}

pub fn active_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    let id = item_id(data)?;
    let active = u32_at(data, 16)? > 0;
    debug!("Active change on item {}: {}", id, active);
    pb.rig_mut().item_mut(id)?.set_active(active);
    Ok(Outcome::change(ChangeKind::ActiveChange, Target::Item(id)))
}

pub fn type_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    let id = item_id(data)?;
    let code = u32_at(data, 16)?;
    pb.rig_mut().item_mut(id)?.retype(code)?;
    Ok(Outcome::change(ChangeKind::TypeChange, Target::Item(id)))
}

fn param_change(data: &[u8], pb: &mut PedalBoard, slot: Slot) -> Result<Outcome> {
    let id = item_id(data)?;
    let param_id = u32_at(data, 20)?;
    let value = bytes4_at(data, 24)?;
    let target = Target::ItemParam {
        item: id,
        param: param_id,
    };

    let item = pb.rig_mut().item_mut(id)?;
    let model = item.model_name();
    let param = item.param_mut(param_id).ok_or_else(|| {
        PodError::NotFound(format!("parameter {:#x} on item {} ({})", param_id, id, model))
    })?;
    if let Err(e) = param.set_bin(slot, value) {
        warn!("Parameter {} on {}: {}", param.name(), model, e);
        return Ok(Outcome::warning(e, Some(target)));
    }

    let kind = match slot {
        Slot::Current => ChangeKind::ParameterChange,
        Slot::Min => ChangeKind::ParameterChangeMin,
        Slot::Max => ChangeKind::ParameterChangeMax,
    };
    Ok(Outcome::change(kind, target))
}

pub fn parameter_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    param_change(data, pb, Slot::Current)
}

pub fn parameter_change_min(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    param_change(data, pb, Slot::Min)
}

pub fn parameter_change_max(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    param_change(data, pb, Slot::Max)
}

/// The device sends either a note division (> 1) or 0/1 for "free Hz".
fn tempo(data: &[u8], pb: &mut PedalBoard, nth: usize) -> Result<Outcome> {
    let id = item_id(data)?;
    let value = u32_at(data, 16)? as f32;

    let item = pb.rig_mut().item_mut(id)?;
    let param = item.tempo_param_mut(nth).ok_or_else(|| {
        PodError::NotFound(format!("tempo parameter {} on item {}", nth + 1, id))
    })?;
    let target = Target::ItemParam {
        item: id,
        param: param.id(),
    };
    if let Err(e) = param.set_bin(Slot::Current, value.to_le_bytes()) {
        warn!("Tempo parameter {}: {}", param.name(), e);
        return Ok(Outcome::warning(e, Some(target)));
    }
    Ok(Outcome::change(ChangeKind::ParameterChange, target))
}

pub fn tempo_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    tempo(data, pb, 0)
}

pub fn tempo_change_2(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    tempo(data, pb, 1)
}

pub fn preset_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    pb.select_preset(u32_at(data, 8)?);
    Ok(Outcome::change(ChangeKind::PresetChange, preset_target(pb)))
}

pub fn preset_change_alert(_data: &[u8], _pb: &mut PedalBoard) -> Result<Outcome> {
    Ok(Outcome::none())
}

pub fn set_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    pb.select_set(u32_at(data, 8)?);
    let target = pb.current_set().map_or(Target::Board, Target::Set);
    Ok(Outcome::change(ChangeKind::SetChange, target))
}

pub fn set_load(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    let name = padded_name(bytes_at(data, 12, data.len().saturating_sub(12))?);
    let set = pb
        .current_set_mut()
        .ok_or_else(|| PodError::NotFound("no current set".to_string()))?;
    debug!("Set {} is \"{}\"", set.id(), name);
    set.set_name(name);
    let id = set.id();
    Ok(Outcome::change(ChangeKind::SetLoad, Target::Set(id)))
}

pub fn setup_change(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    let setup_id = u32_at(data, 16)?;
    let value = bytes4_at(data, 20)?;

    let Some(setup_target) = setup::target(setup_id) else {
        debug!("Ignoring setup change for unknown id {:#x}", setup_id);
        return Ok(Outcome::none());
    };

    let rig = pb.rig_mut();
    let (param, target) = match setup_target {
        SetupTarget::Tempo => {
            rig.set_tempo(f32::from_le_bytes(value));
            return Ok(Outcome::change(ChangeKind::TempoChange, Target::Board));
        }
        SetupTarget::CabParam { cab, param } => {
            let target = Target::ItemParam { item: cab, param };
            let param = rig.item_mut(cab)?.param_mut(param).ok_or_else(|| {
                PodError::NotFound(format!("parameter {} on cab {}", param, cab))
            })?;
            (param, target)
        }
        SetupTarget::BoardParam(id) => (rig.param_mut(id)?, Target::BoardParam(id)),
    };

    if let Err(e) = param.set_bin(Slot::Current, value) {
        warn!("Setup {:#x} ({}): {}", setup_id, param.name(), e);
        return Ok(Outcome::warning(e, Some(target)));
    }
    Ok(Outcome::change(ChangeKind::ParameterChange, target))
}

fn set_logged(item: &mut Item, param_id: u32, value: [u8; 4]) {
    set_slots_logged(item, param_id, &[(Slot::Current, value)]);
}

/// Store each (slot, value) pair; a rejected value only skips its slot.
fn set_slots_logged(item: &mut Item, param_id: u32, values: &[(Slot, [u8; 4])]) {
    let model = item.model_name();
    match item.param_mut(param_id) {
        Some(param) => {
            for &(slot, value) in values {
                if let Err(e) = param.set_bin(slot, value) {
                    warn!("Preset load, {} {:?} on {}: {}", param.name(), slot, model, e);
                }
            }
        }
        None => warn!(
            "Preset load, parameter {:#x} does not exist on {}",
            param_id, model
        ),
    }
}

fn load_item(data: &[u8], base: usize, item: &mut Item) -> Result<()> {
    let code = u32_at(data, base)?;
    if let Err(e) = item.retype(code) {
        warn!("Preset load, item {}: {}", item.id(), e);
    }

    let pos = u16_at(data, base + 4)?;
    let class_code = u8_at(data, base + 6)?;
    match PositionClass::from_code(class_code) {
        Some(class) => item.restore_position(Position::new(pos, class)),
        None => warn!(
            "Preset load, item {}: unknown position class {}",
            item.id(),
            class_code
        ),
    }

    item.set_active(u8_at(data, base + 8)? == 1);
    let markers = [u8_at(data, base + 9)?, u8_at(data, base + 10)?];

    let records = base + ITEM_PARAMS_OFFSET;
    if item.role() == ItemRole::Cab {
        for (i, param_id) in CAB_RECORD_ORDER.into_iter().enumerate() {
            let value = bytes4_at(data, records + i * PARAM_RECORD_SIZE + 4)?;
            set_logged(item, param_id, value);
        }
        return Ok(());
    }

    let count = item.params().len().min(MAX_PARAM_RECORDS);
    let mut tempo_seen = 0;
    for i in 0..count {
        let record = records + i * PARAM_RECORD_SIZE;
        let param_id = u32_at(data, record)?;
        let mut value = bytes4_at(data, record + 4)?;

        let is_tempo = item.param(param_id).is_some_and(|p| p.is_tempo());
        if is_tempo {
            if let Some(&marker) = markers.get(tempo_seen) {
                if marker > 1 {
                    value = f32::from(marker).to_le_bytes();
                }
            }
            tempo_seen += 1;
        }
        let min = bytes4_at(data, record + 8)?;
        let max = bytes4_at(data, record + 12)?;
        set_slots_logged(
            item,
            param_id,
            &[(Slot::Current, value), (Slot::Min, min), (Slot::Max, max)],
        );
    }
    Ok(())
}

/// Full preset dump.
///
/// The dump is applied to the live rig, kept as the template for
/// "save preset", and copied into the current preset slot.
pub fn preset_load(data: &[u8], pb: &mut PedalBoard) -> Result<Outcome> {
    let name = padded_name(bytes_at(data, 8, 32)?);
    debug!("Preset load \"{}\"", name);

    for (i, id) in PRESET_ITEM_ORDER.into_iter().enumerate() {
        let item = pb.rig_mut().item_mut(id)?;
        load_item(data, PRESET_ITEMS_OFFSET + i * PRESET_ITEM_STRIDE, item)?;
    }

    for (dt_id, offset) in DT_OFFSETS {
        let dt = pb.rig_mut().dt_mut(dt_id)?;
        for (field, at) in [
            (DtField::Topology, offset),
            (DtField::Class, offset + 1),
            (DtField::Mode, offset + 2),
        ] {
            if let Err(e) = dt.set_bin(field, u8_at(data, at)?) {
                warn!("Preset load, DT {}: {}", dt_id, e);
            }
        }
    }

    for (cab, er_offset, mic_offset) in CAB_EXTRA_OFFSETS {
        let item = pb.rig_mut().item_mut(cab)?;
        set_logged(item, cab_param::EARLY_REFLECTION, bytes4_at(data, er_offset)?);
        set_logged(item, cab_param::MIC, byte_value(u8_at(data, mic_offset)?));
    }

    for (param_id, offset) in BOARD_PARAM_OFFSETS {
        let param = pb.rig_mut().param_mut(param_id)?;
        if let Err(e) = param.set_bin(Slot::Current, byte_value(u8_at(data, offset)?)) {
            warn!("Preset load, {}: {}", param.name(), e);
        }
    }

    pb.set_last_dump(Bytes::copy_from_slice(data));
    pb.store_current_preset(&name);
    Ok(Outcome::change(ChangeKind::PresetLoad, preset_target(pb)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::testing::{inbound, put};
    use crate::message::MessageKind;
    use crate::model::catalog::{AMP_DISABLED, PEDAL_NONE};

    const HIWAY: u32 = 458_760;
    const STEREO_DELAY: u32 = 33_685_523;
    const PHASER: u32 = 33_751_074;
    const CELEST: u32 = 17_235_970;

    fn item_message(kind: MessageKind, item: u32, value: u32) -> Vec<u8> {
        let mut buf = inbound(kind);
        put(&mut buf, 12, &item.to_le_bytes());
        put(&mut buf, 16, &value.to_le_bytes());
        buf
    }

    fn param_message(kind: MessageKind, item: u32, param: u32, value: [u8; 4]) -> Vec<u8> {
        let mut buf = inbound(kind);
        put(&mut buf, 12, &item.to_le_bytes());
        put(&mut buf, 20, &param.to_le_bytes());
        put(&mut buf, 24, &value);
        buf
    }

    fn setup_message(setup_id: u32, value: [u8; 4]) -> Vec<u8> {
        let mut buf = inbound(MessageKind::SetupChange);
        put(&mut buf, 16, &setup_id.to_le_bytes());
        put(&mut buf, 20, &value);
        buf
    }

    #[test]
    fn test_active_change() {
        let mut pb = PedalBoard::new();
        let out = active_change(&item_message(MessageKind::ActiveChange, 3, 0), &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::ActiveChange);
        assert_eq!(out.target, Some(Target::Item(3)));
        assert!(!pb.rig().item(3).unwrap().active());

        active_change(&item_message(MessageKind::ActiveChange, 3, 7), &mut pb).unwrap();
        assert!(pb.rig().item(3).unwrap().active());
    }

    #[test]
    fn test_active_change_unknown_item() {
        let mut pb = PedalBoard::new();
        let err = active_change(&item_message(MessageKind::ActiveChange, 40, 1), &mut pb);
        assert!(matches!(err, Err(PodError::NotFound(_))));
    }

    #[test]
    fn test_type_change_accepts_wire_empty_code() {
        let mut pb = PedalBoard::new();
        type_change(&item_message(MessageKind::TypeChange, 2, HIWAY), &mut pb).unwrap();
        assert_eq!(pb.rig().item(2).unwrap().model_name(), "Hiway 100");

        let out = type_change(&item_message(MessageKind::TypeChange, 2, 0x7FFF_FFFF), &mut pb)
            .unwrap();
        assert_eq!(out.kind, ChangeKind::TypeChange);
        assert_eq!(pb.rig().item(2).unwrap().model_code(), AMP_DISABLED);
    }

    #[test]
    fn test_parameter_change_slots() {
        let mut pb = PedalBoard::new();
        pb.rig_mut().item_mut(0).unwrap().retype(HIWAY).unwrap();

        let msg = param_message(MessageKind::ParameterChange, 0, 0x3F10_0003, 0.5f32.to_le_bytes());
        let out = parameter_change(&msg, &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::ParameterChange);

        let msg = param_message(MessageKind::ParameterChangeMax, 0, 0x3F10_0003, 0.9f32.to_le_bytes());
        let out = parameter_change_max(&msg, &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::ParameterChangeMax);

        let drive = pb.rig().item(0).unwrap().param(0x3F10_0003).unwrap();
        assert_eq!(drive.text(Slot::Current), "50%");
        assert_eq!(drive.text(Slot::Max), "90%");
        assert_eq!(drive.text(Slot::Min), "0%");
    }

    #[test]
    fn test_parameter_change_mismatch_is_warning() {
        let mut pb = PedalBoard::new();
        pb.rig_mut().item_mut(0).unwrap().retype(HIWAY).unwrap();

        let msg = param_message(MessageKind::ParameterChange, 0, 0x3F10_0003, 7.0f32.to_le_bytes());
        let out = parameter_change(&msg, &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::Warning);
        assert!(matches!(out.error, Some(PodError::TypeMismatch(_))));
        let drive = pb.rig().item(0).unwrap().param(0x3F10_0003).unwrap();
        assert_eq!(drive.text(Slot::Current), "0%");
    }

    #[test]
    fn test_tempo_change_targets_nth_tempo_param() {
        let mut pb = PedalBoard::new();
        pb.rig_mut().item_mut(6).unwrap().retype(STEREO_DELAY).unwrap();

        let out = tempo_change_2(&item_message(MessageKind::TempoChange2, 6, 7), &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::ParameterChange);
        assert_eq!(
            out.target,
            Some(Target::ItemParam {
                item: 6,
                param: 0x3F10_0002
            })
        );
        let item = pb.rig().item(6).unwrap();
        assert_eq!(item.param(0x3F10_0002).unwrap().current_f32(), 7.0);
        assert_eq!(item.param(0x3F10_0000).unwrap().current_f32(), 0.0);

        // Phaser has a single tempo parameter.
        pb.rig_mut().item_mut(7).unwrap().retype(PHASER).unwrap();
        assert!(tempo_change_2(&item_message(MessageKind::TempoChange2, 7, 7), &mut pb).is_err());
    }

    #[test]
    fn test_preset_and_set_change() {
        let mut pb = PedalBoard::new();
        let mut msg = inbound(MessageKind::SetChange);
        put(&mut msg, 8, &4u32.to_le_bytes());
        let out = set_change(&msg, &mut pb).unwrap();
        assert_eq!(out.target, Some(Target::Set(4)));

        let mut msg = inbound(MessageKind::PresetChange);
        put(&mut msg, 8, &9u32.to_le_bytes());
        let out = preset_change(&msg, &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::PresetChange);
        assert_eq!(out.target, Some(Target::Preset { set: 4, preset: 9 }));
    }

    #[test]
    fn test_set_load_names_current_set() {
        let mut pb = PedalBoard::new();
        pb.select_set(2);
        // The name runs past the declared length, up to the end of the frame.
        let mut msg = inbound(MessageKind::SetLoad);
        msg.extend_from_slice(b"Gig\0\0\0");
        let out = set_load(&msg, &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::SetLoad);
        assert_eq!(pb.set(2).unwrap().name(), "Gig");
    }

    #[test]
    fn test_setup_change_routes() {
        let mut pb = PedalBoard::new();

        let out = setup_change(&setup_message(0x17, 98.5f32.to_le_bytes()), &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::TempoChange);
        assert_eq!(pb.rig().tempo(), 98.5);

        let out = setup_change(&setup_message(0x35, [3, 0, 0, 0]), &mut pb).unwrap();
        assert_eq!(
            out.target,
            Some(Target::ItemParam {
                item: 3,
                param: cab_param::MIC
            })
        );
        let mic = pb.rig().item(3).unwrap().param(cab_param::MIC).unwrap();
        assert_eq!(mic.text(Slot::Current), "421 Dyn");

        let out = setup_change(&setup_message(0x55, [7, 0, 0, 0]), &mut pb).unwrap();
        assert_eq!(out.target, Some(Target::BoardParam(board_param::GUITAR_IN_Z)));
        assert_eq!(
            pb.rig().param(board_param::GUITAR_IN_Z).unwrap().text(Slot::Current),
            "1M"
        );

        let out = setup_change(&setup_message(0x99, [0; 4]), &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::None);
    }

    fn item_record(buf: &mut [u8], slot: usize, code: u32, pos: u16, class: u8, active: u8) {
        let base = PRESET_ITEMS_OFFSET + slot * PRESET_ITEM_STRIDE;
        put(buf, base, &code.to_le_bytes());
        put(buf, base + 4, &pos.to_le_bytes());
        put(buf, base + 6, &[class]);
        put(buf, base + 8, &[active]);
    }

    fn param_record(buf: &mut [u8], slot: usize, index: usize, id: u32, value: f32) {
        let record = PRESET_ITEMS_OFFSET + slot * PRESET_ITEM_STRIDE + 16 + index * 20;
        put(buf, record, &id.to_le_bytes());
        put(buf, record + 4, &value.to_le_bytes());
    }

    fn param_bounds(buf: &mut [u8], slot: usize, index: usize, min: f32, max: f32) {
        let record = PRESET_ITEMS_OFFSET + slot * PRESET_ITEM_STRIDE + 16 + index * 20;
        put(buf, record + 8, &min.to_le_bytes());
        put(buf, record + 12, &max.to_le_bytes());
    }

    fn preset_dump() -> Vec<u8> {
        let mut buf = inbound(MessageKind::PresetLoad);
        put(&mut buf, 8, b"Clean Chorus");
        // Interleave slot 1 is amp B (item 2), slot 2 is cab A (item 1).
        item_record(&mut buf, 0, AMP_DISABLED, 0, 7, 0);
        item_record(&mut buf, 1, HIWAY, 0, 8, 1);
        param_record(&mut buf, 1, 0, 0x3F10_0003, 0.25);
        item_record(&mut buf, 2, CELEST, 0, 7, 1);
        param_record(&mut buf, 2, 0, cab_param::LOW_CUT, 0.5);
        param_record(&mut buf, 2, 2, cab_param::THUMP, 0.75);
        item_record(&mut buf, 3, 0x7FFF_FFFF, 0, 8, 0);
        for slot in 4..12 {
            item_record(&mut buf, slot, PEDAL_NONE, (slot - 4) as u16, 0, 1);
        }
        // Pedal 5 (slot 5) is a stereo delay with one note marker.
        item_record(&mut buf, 5, STEREO_DELAY, 1, 3, 1);
        put(&mut buf, PRESET_ITEMS_OFFSET + 5 * PRESET_ITEM_STRIDE + 9, &[7, 0]);
        param_record(&mut buf, 5, 0, 0x3F10_0000, 0.1);
        param_record(&mut buf, 5, 2, 0x3F10_0002, 0.3);
        put(&mut buf, 3132, &[2, 0x7F, 0]);
        put(&mut buf, 3412, &0.5f32.to_le_bytes());
        put(&mut buf, 4096, &[6]);
        put(&mut buf, 3546, &[1]);
        put(&mut buf, 4102, &[5]);
        buf
    }

    #[test]
    fn test_preset_load_interleave_order() {
        let mut pb = PedalBoard::new();
        let out = preset_load(&preset_dump(), &mut pb).unwrap();
        assert_eq!(out.kind, ChangeKind::PresetLoad);
        assert_eq!(out.target, Some(Target::Preset { set: 0, preset: 0 }));

        let rig = pb.rig();
        assert_eq!(rig.item(0).unwrap().model_code(), AMP_DISABLED);
        assert_eq!(rig.item(2).unwrap().model_name(), "Hiway 100");
        assert_eq!(rig.item(1).unwrap().model_name(), "112 Celest 12-H");
        assert!(rig.item(1).unwrap().active());
        assert!(!rig.item(3).unwrap().active());
        assert_eq!(
            rig.item(2).unwrap().param(0x3F10_0003).unwrap().text(Slot::Current),
            "25%"
        );
    }

    #[test]
    fn test_preset_load_cab_and_extras() {
        let mut pb = PedalBoard::new();
        preset_load(&preset_dump(), &mut pb).unwrap();
        let rig = pb.rig();

        let cab = rig.item(1).unwrap();
        assert_eq!(cab.param(cab_param::LOW_CUT).unwrap().text(Slot::Current), "260Hz");
        assert_eq!(cab.param(cab_param::RES_LEVEL).unwrap().text(Slot::Current), "0%");
        assert_eq!(cab.param(cab_param::THUMP).unwrap().text(Slot::Current), "75%");
        assert_eq!(cab.param(cab_param::EARLY_REFLECTION).unwrap().text(Slot::Current), "50%");
        assert_eq!(cab.param(cab_param::MIC).unwrap().text(Slot::Current), "67 Cond");

        let dt1 = rig.dt(1).unwrap();
        assert_eq!(dt1.topology(), "III");
        assert_eq!(dt1.class(), "A/B");
        assert_eq!(dt1.mode(), "Tri");

        assert_eq!(
            rig.param(board_param::GUITAR_IN_Z).unwrap().text(Slot::Current),
            "22K"
        );
        assert_eq!(
            rig.param(board_param::INPUT1_SOURCE).unwrap().text(Slot::Current),
            "Guitar+Aux"
        );
    }

    #[test]
    fn test_preset_load_tempo_markers_and_position() {
        let mut pb = PedalBoard::new();
        preset_load(&preset_dump(), &mut pb).unwrap();

        let delay = pb.rig().item(5).unwrap();
        assert_eq!(delay.model_name(), "Stereo Delay");
        assert_eq!(delay.position(), Position::new(1, PositionClass::AEnd));
        // First marker is a note division, second falls back to the record.
        assert_eq!(delay.param(0x3F10_0000).unwrap().current_f32(), 7.0);
        assert!((delay.param(0x3F10_0002).unwrap().current_f32() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_preset_load_stores_snapshot_and_dump() {
        let mut pb = PedalBoard::new();
        pb.select_set(1);
        pb.select_preset(6);
        let dump = preset_dump();
        preset_load(&dump, &mut pb).unwrap();

        assert_eq!(pb.last_dump().map(|d| d.len()), Some(dump.len()));
        let preset = pb.set(1).unwrap().preset(6).unwrap();
        assert_eq!(preset.name(), "Clean Chorus");
        assert_eq!(preset.rig().item(2).unwrap().model_name(), "Hiway 100");
    }

    #[test]
    fn test_preset_load_bad_param_keeps_going() {
        let mut pb = PedalBoard::new();
        let mut dump = preset_dump();
        // Out-of-range value for amp B's first record.
        param_record(&mut dump, 1, 0, 0x3F10_0003, 4.0);
        preset_load(&dump, &mut pb).unwrap();
        let rig = pb.rig();
        assert_eq!(
            rig.item(2).unwrap().param(0x3F10_0003).unwrap().text(Slot::Current),
            "0%"
        );
        assert_eq!(rig.item(1).unwrap().model_name(), "112 Celest 12-H");
    }

    #[test]
    fn test_preset_load_applies_min_max() {
        let mut pb = PedalBoard::new();
        let mut dump = preset_dump();
        param_record(&mut dump, 1, 0, 0x3F10_0003, 0.5);
        param_bounds(&mut dump, 1, 0, 0.2, 0.9);
        preset_load(&dump, &mut pb).unwrap();

        let drive = pb.rig().item(2).unwrap().param(0x3F10_0003).unwrap();
        assert_eq!(drive.text(Slot::Current), "50%");
        assert_eq!(drive.text(Slot::Min), "20%");
        assert_eq!(drive.text(Slot::Max), "90%");
    }

    #[test]
    fn test_preset_load_bad_bound_keeps_current() {
        let mut pb = PedalBoard::new();
        let mut dump = preset_dump();
        param_record(&mut dump, 1, 0, 0x3F10_0003, 0.5);
        param_bounds(&mut dump, 1, 0, 3.0, 0.9);
        preset_load(&dump, &mut pb).unwrap();

        let drive = pb.rig().item(2).unwrap().param(0x3F10_0003).unwrap();
        assert_eq!(drive.text(Slot::Current), "50%");
        assert_eq!(drive.text(Slot::Min), "0%");
        assert_eq!(drive.text(Slot::Max), "90%");
    }
}
