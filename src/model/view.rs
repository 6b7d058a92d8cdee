//! Read-only snapshots of the model for observers.
//!
//! Views are built while the board lock is held and own all their data,
//! so they can be handed to a UI thread or rendered as JSON afterwards.

use serde::Serialize;

use super::board::{PedalBoard, Rig};
use super::dt::Dt;
use super::item::{Item, ItemRole, Position};
use super::parameter::{Parameter, Slot};
use super::preset::{Preset, Set};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamView {
    pub id: u32,
    pub name: &'static str,
    pub value: String,
    pub min: String,
    pub max: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<&'static str>,
    pub free_text: bool,
}

impl From<&Parameter> for ParamView {
    fn from(p: &Parameter) -> Self {
        Self {
            id: p.id(),
            name: p.name(),
            value: p.text(Slot::Current),
            min: p.text(Slot::Min),
            max: p.text(Slot::Max),
            allowed_values: p.allowed_values(),
            free_text: p.accepts_free_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: u32,
    pub role: ItemRole,
    pub model: &'static str,
    pub category: &'static str,
    pub active: bool,
    pub position: Position,
    pub params: Vec<ParamView>,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id(),
            role: item.role(),
            model: item.model_name(),
            category: item.category(),
            active: item.active(),
            position: item.position(),
            params: item.params().iter().map(ParamView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DtView {
    pub id: u8,
    pub amp_id: u32,
    pub class: &'static str,
    pub mode: &'static str,
    pub topology: &'static str,
}

impl From<&Dt> for DtView {
    fn from(dt: &Dt) -> Self {
        Self {
            id: dt.id(),
            amp_id: dt.amp_id(),
            class: dt.class(),
            mode: dt.mode(),
            topology: dt.topology(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigView {
    pub tempo: f32,
    pub items: Vec<ItemView>,
    pub dts: Vec<DtView>,
    pub params: Vec<ParamView>,
}

impl From<&Rig> for RigView {
    fn from(rig: &Rig) -> Self {
        Self {
            tempo: rig.tempo(),
            items: rig.items().iter().map(ItemView::from).collect(),
            dts: rig.dts().iter().map(DtView::from).collect(),
            params: rig.params().iter().map(ParamView::from).collect(),
        }
    }
}

/// Preset list entry. The full rig of a stored preset is not included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetView {
    pub id: u8,
    pub display_id: String,
    pub name: String,
}

impl From<&Preset> for PresetView {
    fn from(p: &Preset) -> Self {
        Self {
            id: p.id(),
            display_id: p.display_id(),
            name: p.name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetView {
    pub id: u8,
    pub name: String,
    pub presets: Vec<PresetView>,
}

impl From<&Set> for SetView {
    fn from(s: &Set) -> Self {
        Self {
            id: s.id(),
            name: s.name().to_string(),
            presets: s.presets().iter().map(PresetView::from).collect(),
        }
    }
}

/// Snapshot of the live board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub current_set: Option<u8>,
    pub current_preset: Option<u8>,
    pub rig: RigView,
    pub sets: Vec<String>,
}

impl From<&PedalBoard> for BoardView {
    fn from(pb: &PedalBoard) -> Self {
        Self {
            current_set: pb.current_set(),
            current_preset: pb.current_preset(),
            rig: RigView::from(pb.rig()),
            sets: pb.sets().iter().map(|s| s.name().to_string()).collect(),
        }
    }
}

/// Render any view as JSON.
pub fn to_json<T: Serialize>(view: &T) -> Result<String> {
    Ok(serde_json::to_string(view)?)
}
