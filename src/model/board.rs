//! The live pedal board and the shared lock that guards the whole model.
//!
//! All model state (the live [`Rig`], the 8 sets of 64 presets, the
//! current set/preset pointers) lives in one [`PedalBoard`] behind a single
//! mutex. Nothing below the board locks anything on its own: whoever holds
//! the [`SharedBoard`] guard may touch any entity.
//!
//! # Example
//!
//! ```
//! use podwire::model::{PositionClass, SharedBoard};
//!
//! let board = SharedBoard::new();
//! {
//!     let mut pb = board.lock();
//!     pb.rig_mut().move_item(4, 3, PositionClass::Start).unwrap();
//! }
//! let pb = board.lock();
//! assert_eq!(pb.rig().item(4).unwrap().position().pos, 3);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use super::dt::Dt;
use super::item::{Item, ItemRole, Position, PositionClass, ITEM_COUNT, PEDAL_COUNT};
use super::parameter::{ListEncoding, ParamKind, Parameter};
use super::preset::{Preset, Set};
use crate::error::{PodError, Result};

/// Item ids in the order they are laid out inside a preset dump.
pub const PRESET_ITEM_ORDER: [u32; ITEM_COUNT] = [0, 2, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Number of sets stored on the device.
pub const NUMBER_SET: usize = 8;

/// Number of presets per set.
pub const PRESETS_PER_SET: usize = 64;

/// Board-level parameter ids.
pub mod board_param {
    pub const INPUT1_SOURCE: u32 = 0;
    pub const INPUT2_SOURCE: u32 = 1;
    pub const GUITAR_IN_Z: u32 = 2;
}

const INPUT1_SOURCES: &[&str] = &[
    "Guitar",
    "Mic",
    "Aux",
    "",
    "Guitar+Aux",
    "Guitar+Variax",
    "Guitar+Aux+Variax",
    "Variax",
    "Variax Mags",
];

const INPUT2_SOURCES: &[&str] = &[
    "Same",
    "Guitar",
    "Mic",
    "Aux",
    "",
    "Guitar+Aux",
    "Guitar+Variax",
    "Guitar+Aux+Variax",
    "Variax",
    "Variax Mags",
];

const GUITAR_IN_Z: &[&str] = &[
    "Auto", "22K", "32K", "70K", "90K", "136K", "230K", "1M", "3.5M",
];

fn board_params() -> Vec<Parameter> {
    let list = |entries: &'static [&'static str], shift: i32| ParamKind::List {
        entries,
        encoding: ListEncoding::Int32,
        shift,
    };
    vec![
        Parameter::new(
            board_param::INPUT1_SOURCE,
            "Input 1 Source",
            list(INPUT1_SOURCES, 1),
        ),
        Parameter::new(
            board_param::INPUT2_SOURCE,
            "Input 2 Source",
            list(INPUT2_SOURCES, 0),
        ),
        Parameter::new(board_param::GUITAR_IN_Z, "Guitar In-Z", list(GUITAR_IN_Z, 0)),
    ]
}

/// One complete configuration: 12 items, 2 DT blocks, board parameters and
/// tempo. The live board and every stored preset each own one.
#[derive(Debug, Clone)]
pub struct Rig {
    items: Vec<Item>,
    dts: [Dt; 2],
    params: Vec<Parameter>,
    tempo: f32,
}

impl Rig {
    /// Default rig: disabled amps, no cabs, eight empty pedals.
    pub fn new() -> Self {
        let mut items = Vec::with_capacity(ITEM_COUNT);
        items.push(Item::placeholder(
            0,
            ItemRole::Amp,
            Position::new(0, PositionClass::AmpA),
        ));
        items.push(Item::placeholder(
            1,
            ItemRole::Cab,
            Position::new(0, PositionClass::AmpA),
        ));
        items.push(Item::placeholder(
            2,
            ItemRole::Amp,
            Position::new(0, PositionClass::AmpB),
        ));
        items.push(Item::placeholder(
            3,
            ItemRole::Cab,
            Position::new(0, PositionClass::AmpB),
        ));
        for slot in 0..PEDAL_COUNT {
            items.push(Item::placeholder(
                u32::from(slot) + 4,
                ItemRole::Pedal,
                Position::new(slot, PositionClass::Start),
            ));
        }

        Self {
            items,
            dts: [Dt::new(0, 0), Dt::new(1, 2)],
            params: board_params(),
            tempo: 120.0,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: u32) -> Result<&Item> {
        self.items
            .iter()
            .find(|i| i.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("item {}", id)))
    }

    pub fn item_mut(&mut self, id: u32) -> Result<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("item {}", id)))
    }

    pub fn dts(&self) -> &[Dt; 2] {
        &self.dts
    }

    pub fn dt(&self, id: u8) -> Result<&Dt> {
        self.dts
            .iter()
            .find(|d| d.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("DT {}", id)))
    }

    pub fn dt_mut(&mut self, id: u8) -> Result<&mut Dt> {
        self.dts
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("DT {}", id)))
    }

    /// DT block paired with amp `amp_id`.
    pub fn dt_for_amp(&self, amp_id: u32) -> Option<&Dt> {
        self.dts.iter().find(|d| d.amp_id() == amp_id)
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn param(&self, id: u32) -> Result<&Parameter> {
        self.params
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("board parameter {}", id)))
    }

    pub fn param_mut(&mut self, id: u32) -> Result<&mut Parameter> {
        self.params
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| PodError::NotFound(format!("board parameter {}", id)))
    }

    /// Board tempo in BPM.
    #[inline]
    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo = bpm;
    }

    /// Items of one position class, sorted by slot index.
    ///
    /// The B amp section only exists when the A section holds something.
    pub fn items_in_class(&self, class: PositionClass) -> Vec<&Item> {
        if class == PositionClass::AmpB && self.items_in_class(PositionClass::AmpA).is_empty() {
            return Vec::new();
        }
        let mut found: Vec<&Item> = self
            .items
            .iter()
            .filter(|i| i.position().class == class)
            .collect();
        found.sort_by_key(|i| i.position().pos);
        found
    }

    /// Move an item in the signal chain.
    ///
    /// Only amp 0 moves, dragging cab 0 along; cabs never move on their own.
    /// A pedal shifts the pedals between its old and new slot by one.
    pub fn move_item(&mut self, id: u32, pos: u16, class: PositionClass) -> Result<()> {
        match self.item(id)?.role() {
            ItemRole::Amp => {
                if id != 0 {
                    return Ok(());
                }
                let (amp_pos, cab_pos) = match class {
                    PositionClass::Start => (5, 6),
                    PositionClass::End => (7, 8),
                    _ => (0, 3),
                };
                for (item_id, slot) in [(0, amp_pos), (1, cab_pos)] {
                    let item = self.item_mut(item_id)?;
                    let current = item.position();
                    item.set_position(Position::new(slot, current.class));
                }
                Ok(())
            }
            ItemRole::Cab => Ok(()),
            ItemRole::Pedal => self.move_pedal(id, pos, class),
        }
    }

    fn move_pedal(&mut self, id: u32, pos: u16, class: PositionClass) -> Result<()> {
        if class.is_amp_slot() || pos >= PEDAL_COUNT {
            return Err(PodError::Validation(format!(
                "pedal cannot move to slot {} ({:?})",
                pos, class
            )));
        }
        let old = i32::from(self.item(id)?.position().pos);
        let new = i32::from(pos);
        let step = if new > old { 1 } else { -1 };

        let mut slot = old + step;
        while slot != new + step {
            let neighbour = self.items.iter_mut().find(|i| {
                i.role() == ItemRole::Pedal && i.id() != id && i32::from(i.position().pos) == slot
            });
            if let Some(other) = neighbour {
                let current = other.position();
                other.set_position(Position::new((slot - step) as u16, current.class));
            }
            slot += step;
        }

        self.item_mut(id)?.set_position(Position::new(pos, class));
        Ok(())
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole editor model: the live rig plus every stored set and preset.
#[derive(Debug)]
pub struct PedalBoard {
    rig: Rig,
    sets: Vec<Set>,
    current_set: Option<u8>,
    current_preset: Option<u8>,
    last_dump: Option<Bytes>,
}

impl PedalBoard {
    pub fn new() -> Self {
        Self {
            rig: Rig::new(),
            sets: (0..NUMBER_SET as u8).map(Set::new).collect(),
            current_set: Some(0),
            current_preset: Some(0),
            last_dump: None,
        }
    }

    #[inline]
    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    #[inline]
    pub fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }

    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    pub fn set(&self, id: u8) -> Result<&Set> {
        self.sets
            .get(id as usize)
            .ok_or_else(|| PodError::NotFound(format!("set {}", id)))
    }

    pub fn set_mut(&mut self, id: u8) -> Result<&mut Set> {
        self.sets
            .get_mut(id as usize)
            .ok_or_else(|| PodError::NotFound(format!("set {}", id)))
    }

    #[inline]
    pub fn current_set(&self) -> Option<u8> {
        self.current_set
    }

    #[inline]
    pub fn current_preset(&self) -> Option<u8> {
        self.current_preset
    }

    /// Point at set `id`. Out-of-range ids clear the pointer. The preset
    /// pointer is left alone and now indexes into the new set.
    pub fn select_set(&mut self, id: u32) {
        self.current_set = u8::try_from(id).ok().filter(|&s| (s as usize) < NUMBER_SET);
    }

    /// Point at preset `id` of the current set.
    pub fn select_preset(&mut self, id: u32) {
        self.current_preset = match self.current_set {
            Some(_) => u8::try_from(id)
                .ok()
                .filter(|&p| (p as usize) < PRESETS_PER_SET),
            None => None,
        };
    }

    pub fn current_set_mut(&mut self) -> Option<&mut Set> {
        let id = self.current_set?;
        self.sets.get_mut(id as usize)
    }

    pub fn current_preset_mut(&mut self) -> Option<&mut Preset> {
        let preset = self.current_preset?;
        self.current_set_mut()?.preset_mut(preset)
    }

    /// Copy the live rig into the current preset slot, if any.
    pub fn store_current_preset(&mut self, name: &str) {
        let rig = self.rig.clone();
        if let Some(preset) = self.current_preset_mut() {
            preset.set_name(name);
            *preset.rig_mut() = rig;
        }
    }

    /// Last preset dump received from the device.
    pub fn last_dump(&self) -> Option<&Bytes> {
        self.last_dump.as_ref()
    }

    pub fn set_last_dump(&mut self, dump: Bytes) {
        self.last_dump = Some(dump);
    }
}

impl Default for PedalBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to the board-wide lock.
#[derive(Debug, Clone, Default)]
pub struct SharedBoard {
    inner: Arc<Mutex<PedalBoard>>,
}

impl SharedBoard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PedalBoard::new())),
        }
    }

    /// Acquire the board lock.
    ///
    /// A panic in another holder does not leave the model unusable; the
    /// guard is recovered from the poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, PedalBoard> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parameter::Slot;

    fn pedal_positions(rig: &Rig) -> Vec<(u32, u16)> {
        (4..12)
            .map(|id| (id, rig.item(id).unwrap().position().pos))
            .collect()
    }

    #[test]
    fn test_default_rig() {
        let rig = Rig::new();
        assert_eq!(rig.items().len(), ITEM_COUNT);
        assert_eq!(rig.item(2).unwrap().position().class, PositionClass::AmpB);
        assert_eq!(rig.item(3).unwrap().role(), ItemRole::Cab);
        assert_eq!(rig.item(11).unwrap().position().pos, 7);
        assert_eq!(rig.dt_for_amp(2).unwrap().id(), 1);
        assert!(rig.item(12).is_err());
    }

    #[test]
    fn test_board_params() {
        let mut rig = Rig::new();
        assert_eq!(
            rig.param(board_param::INPUT1_SOURCE).unwrap().text(Slot::Current),
            "Guitar"
        );
        let input2 = rig.param_mut(board_param::INPUT2_SOURCE).unwrap();
        input2.set_text(Slot::Current, "Mic").unwrap();
        assert_eq!(input2.bin(Slot::Current), 2i32.to_le_bytes());
        assert!(input2.set_text(Slot::Current, "").is_err());
        assert!(rig
            .param_mut(board_param::INPUT1_SOURCE)
            .unwrap()
            .set_bin(Slot::Current, 4i32.to_le_bytes())
            .is_err());
    }

    #[test]
    fn test_items_in_class() {
        let mut rig = Rig::new();
        let amps: Vec<u32> = rig
            .items_in_class(PositionClass::AmpA)
            .iter()
            .map(|i| i.id())
            .collect();
        assert_eq!(amps, vec![0, 1]);

        rig.move_item(7, 0, PositionClass::End).unwrap();
        let start: Vec<u32> = rig
            .items_in_class(PositionClass::Start)
            .iter()
            .map(|i| i.id())
            .collect();
        assert_eq!(start, vec![4, 5, 6, 8, 9, 10, 11]);
    }

    #[test]
    fn test_amp_b_hidden_without_amp_a() {
        let mut rig = Rig::new();
        rig.item_mut(0)
            .unwrap()
            .restore_position(Position::new(0, PositionClass::Start));
        rig.item_mut(1)
            .unwrap()
            .restore_position(Position::new(0, PositionClass::Start));
        assert!(rig.items_in_class(PositionClass::AmpB).is_empty());
    }

    #[test]
    fn test_move_amp_drags_cab() {
        let mut rig = Rig::new();
        rig.move_item(0, 0, PositionClass::Start).unwrap();
        assert_eq!(rig.item(0).unwrap().position().pos, 5);
        assert_eq!(rig.item(1).unwrap().position().pos, 6);

        rig.move_item(0, 0, PositionClass::End).unwrap();
        assert_eq!(rig.item(0).unwrap().position().pos, 7);
        assert_eq!(rig.item(1).unwrap().position().pos, 8);

        rig.move_item(0, 0, PositionClass::AStart).unwrap();
        assert_eq!(rig.item(0).unwrap().position().pos, 0);
        assert_eq!(rig.item(1).unwrap().position().pos, 3);

        // Amp B and cabs do not move.
        rig.move_item(2, 4, PositionClass::Start).unwrap();
        assert_eq!(rig.item(2).unwrap().position().pos, 0);
    }

    #[test]
    fn test_move_pedal_forward_and_back() {
        let mut rig = Rig::new();
        rig.move_item(5, 3, PositionClass::Start).unwrap();
        assert_eq!(
            pedal_positions(&rig),
            vec![(4, 0), (5, 3), (6, 1), (7, 2), (8, 4), (9, 5), (10, 6), (11, 7)]
        );

        rig.move_item(5, 0, PositionClass::Start).unwrap();
        assert_eq!(
            pedal_positions(&rig),
            vec![(4, 1), (5, 0), (6, 2), (7, 3), (8, 4), (9, 5), (10, 6), (11, 7)]
        );
    }

    #[test]
    fn test_move_pedal_rejects_amp_slots() {
        let mut rig = Rig::new();
        assert!(rig.move_item(4, 1, PositionClass::AmpA).is_err());
        assert!(rig.move_item(4, 8, PositionClass::Start).is_err());
        assert_eq!(rig.item(4).unwrap().position().pos, 0);
    }

    #[test]
    fn test_current_pointers() {
        let mut pb = PedalBoard::new();
        assert_eq!((pb.current_set(), pb.current_preset()), (Some(0), Some(0)));

        pb.select_set(3);
        assert_eq!((pb.current_set(), pb.current_preset()), (Some(3), Some(0)));
        pb.select_preset(12);
        assert_eq!(pb.current_preset(), Some(12));
        pb.select_preset(64);
        assert_eq!(pb.current_preset(), None);

        pb.select_set(8);
        pb.select_preset(1);
        assert_eq!((pb.current_set(), pb.current_preset()), (None, None));
    }

    #[test]
    fn test_select_set_keeps_preset_pointer() {
        let mut pb = PedalBoard::new();
        pb.select_preset(7);
        pb.select_set(2);
        assert_eq!((pb.current_set(), pb.current_preset()), (Some(2), Some(7)));
        pb.current_preset_mut().unwrap().set_name("Lead");
        assert_eq!(pb.set(2).unwrap().preset(7).unwrap().name(), "Lead");
        assert_eq!(pb.set(0).unwrap().preset(7).unwrap().name(), "New Tone");
    }

    #[test]
    fn test_store_current_preset() {
        let mut pb = PedalBoard::new();
        pb.select_set(1);
        pb.select_preset(5);
        pb.rig_mut().item_mut(4).unwrap().set_active(false);
        pb.store_current_preset("Crunch");

        let preset = pb.set(1).unwrap().preset(5).unwrap();
        assert_eq!(preset.name(), "Crunch");
        assert!(!preset.rig().item(4).unwrap().active());
        assert!(pb.set(0).unwrap().preset(5).unwrap().rig().item(4).unwrap().active());
    }

    #[test]
    fn test_shared_board_lock() {
        let board = SharedBoard::new();
        let other = board.clone();
        other.lock().rig_mut().set_tempo(90.0);
        assert_eq!(board.lock().rig().tempo(), 90.0);
    }
}
