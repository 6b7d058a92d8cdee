//! In-memory model of the device: items, parameters, DT blocks, the live
//! board and the stored sets and presets.

pub mod catalog;
mod board;
mod dt;
mod item;
mod parameter;
mod preset;
pub mod view;

pub use board::{
    board_param, PedalBoard, Rig, SharedBoard, NUMBER_SET, PRESETS_PER_SET, PRESET_ITEM_ORDER,
};
pub use dt::{Dt, DtField, TOPOLOGIES};
pub use item::{Item, ItemRole, Position, PositionClass, ITEM_COUNT, PEDAL_COUNT};
pub use parameter::{ListEncoding, ParamDef, ParamKind, Parameter, Slot, TEMPO_NOTES};
pub use preset::{Preset, Set, PRESET_NAME_LEN};
