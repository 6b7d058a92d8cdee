//! Board items: the two amps, two cabs and eight pedals.
//!
//! Items are never created or destroyed after the board is built. Changing
//! an item's model rebuilds the item from the catalog and swaps it in place,
//! so any parameter borrowed before the change is gone afterwards.

use serde::Serialize;

use super::catalog::{self, ModelDef};
use super::parameter::Parameter;
use crate::error::{PodError, Result};

/// Number of items on a board.
pub const ITEM_COUNT: usize = 12;

/// Number of pedal slots.
pub const PEDAL_COUNT: u16 = 8;

/// Role of a board item, fixed by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemRole {
    Amp,
    Cab,
    Pedal,
}

impl ItemRole {
    /// Ids 0 and 2 are amps, 1 and 3 are cabs, 4 to 11 are pedals.
    pub fn for_id(id: u32) -> Option<Self> {
        match id {
            0 | 2 => Some(ItemRole::Amp),
            1 | 3 => Some(ItemRole::Cab),
            4..=11 => Some(ItemRole::Pedal),
            _ => None,
        }
    }
}

/// Where in the signal chain a slot sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PositionClass {
    Start,
    AStart,
    BStart,
    AEnd,
    BEnd,
    End,
    AmpA,
    AmpB,
}

impl PositionClass {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PositionClass::Start),
            1 => Some(PositionClass::AStart),
            2 => Some(PositionClass::BStart),
            3 => Some(PositionClass::AEnd),
            4 => Some(PositionClass::BEnd),
            5 => Some(PositionClass::End),
            7 => Some(PositionClass::AmpA),
            8 => Some(PositionClass::AmpB),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            PositionClass::Start => 0,
            PositionClass::AStart => 1,
            PositionClass::BStart => 2,
            PositionClass::AEnd => 3,
            PositionClass::BEnd => 4,
            PositionClass::End => 5,
            PositionClass::AmpA => 7,
            PositionClass::AmpB => 8,
        }
    }

    /// Slots reserved for the amp/cab pairs.
    #[inline]
    pub fn is_amp_slot(self) -> bool {
        matches!(self, PositionClass::AmpA | PositionClass::AmpB)
    }

    /// Slots of the A/B split section.
    #[inline]
    pub fn is_split(self) -> bool {
        matches!(
            self,
            PositionClass::AStart | PositionClass::BStart | PositionClass::AEnd | PositionClass::BEnd
        )
    }
}

/// Slot index plus position class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub pos: u16,
    pub class: PositionClass,
}

impl Position {
    pub fn new(pos: u16, class: PositionClass) -> Self {
        Self { pos, class }
    }
}

/// One amp, cab or pedal slot.
#[derive(Debug, Clone)]
pub struct Item {
    id: u32,
    role: ItemRole,
    model: &'static ModelDef,
    active: bool,
    position: Position,
    params: Vec<Parameter>,
}

impl Item {
    /// Build the item with id `id` as an instance of model `code`.
    pub fn new(id: u32, code: u32, position: Position) -> Result<Self> {
        let role = ItemRole::for_id(id)
            .ok_or_else(|| PodError::NotFound(format!("item id {}", id)))?;
        let model = catalog::resolve(role, code).ok_or_else(|| {
            PodError::NotFound(format!("{:?} model code {:#x}", role, code))
        })?;
        Ok(Self::from_model(id, role, model, position))
    }

    /// Build an empty slot ("disabled" amp, "No Cab", "None" pedal).
    pub fn empty(id: u32, position: Position) -> Result<Self> {
        let role = ItemRole::for_id(id)
            .ok_or_else(|| PodError::NotFound(format!("item id {}", id)))?;
        Ok(Self::placeholder(id, role, position))
    }

    pub(crate) fn placeholder(id: u32, role: ItemRole, position: Position) -> Self {
        Self::from_model(id, role, catalog::empty_model(role), position)
    }

    fn from_model(id: u32, role: ItemRole, model: &'static ModelDef, position: Position) -> Self {
        Self {
            id,
            role,
            model,
            active: true,
            position,
            params: model.params.iter().map(Parameter::from_def).collect(),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn role(&self) -> ItemRole {
        self.role
    }

    /// Model-type code as used internally.
    #[inline]
    pub fn model_code(&self) -> u32 {
        self.model.code
    }

    #[inline]
    pub fn model_name(&self) -> &'static str {
        self.model.name
    }

    #[inline]
    pub fn category(&self) -> &'static str {
        self.model.category
    }

    /// Whether the amp model has a companion switch block.
    #[inline]
    pub fn has_dt(&self) -> bool {
        self.model.has_dt
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn param(&self, id: u32) -> Option<&Parameter> {
        self.params.iter().find(|p| p.id() == id)
    }

    pub fn param_mut(&mut self, id: u32) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.id() == id)
    }

    /// Index among this item's tempo-linked parameters (0 or 1).
    pub fn tempo_index(&self, param_id: u32) -> Option<usize> {
        self.params
            .iter()
            .filter(|p| p.is_tempo())
            .position(|p| p.id() == param_id)
    }

    /// The `nth` tempo-linked parameter.
    pub fn tempo_param_mut(&mut self, nth: usize) -> Option<&mut Parameter> {
        self.params.iter_mut().filter(|p| p.is_tempo()).nth(nth)
    }

    /// Replace the item with a fresh instance of model `code`.
    ///
    /// Id and position survive; the parameter list is rebuilt from the
    /// catalog. On error the item is left untouched.
    pub fn retype(&mut self, code: u32) -> Result<()> {
        let model = catalog::resolve(self.role, code).ok_or_else(|| {
            PodError::NotFound(format!("{:?} model code {:#x}", self.role, code))
        })?;
        self.rebuild(model);
        Ok(())
    }

    /// Re-type by model name (and category, for pedals).
    pub fn retype_by_name(&mut self, category: &str, name: &str) -> Result<()> {
        let model = catalog::by_name(self.role, category, name).ok_or_else(|| {
            PodError::Validation(format!("unknown {:?} model \"{}\"", self.role, name))
        })?;
        self.rebuild(model);
        Ok(())
    }

    /// Swap in `model` with fresh parameters; id, position and the active
    /// flag carry over.
    fn rebuild(&mut self, model: &'static ModelDef) {
        let active = self.active;
        *self = Self::from_model(self.id, self.role, model, self.position);
        self.active = active;
    }

    /// Store a position reported by the device, skipping classes the role
    /// cannot occupy.
    pub fn restore_position(&mut self, position: Position) {
        let allowed = match self.role {
            ItemRole::Amp => !position.class.is_split(),
            ItemRole::Pedal => !position.class.is_amp_slot(),
            ItemRole::Cab => true,
        };
        if allowed {
            self.position = position;
        }
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}
