//! Message registry: exact (type, subtype) lookup of message descriptors.
//!
//! The table is static; the lookup index is built on first use.
//!
//! # Example
//!
//! ```
//! use podwire::message::{MessageKind, Registry};
//!
//! let registry = Registry::global();
//! let active = registry.lookup(4, 0x1300).unwrap();
//! assert_eq!(active.kind, MessageKind::ActiveChange);
//! assert_eq!(active.length, 20);
//! assert!(registry.lookup(4, 0x1301).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use super::parse::{self, Outcome};
use super::MessageKind;
use crate::error::Result;
use crate::model::PedalBoard;

/// Decode routine. Runs with the board lock held.
pub type Parser = fn(&[u8], &mut PedalBoard) -> Result<Outcome>;

/// Static description of one message kind.
pub struct Descriptor {
    pub kind: MessageKind,
    pub mtype: u16,
    pub subtype: u16,
    /// Total length in bytes, header included.
    pub length: usize,
    pub name: &'static str,
    /// `None` for messages that are recognized but not actionable.
    pub parser: Option<Parser>,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("mtype", &self.mtype)
            .field("subtype", &format_args!("{:#06x}", self.subtype))
            .field("length", &self.length)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

const fn entry(
    kind: MessageKind,
    mtype: u16,
    subtype: u16,
    length: usize,
    name: &'static str,
    parser: Option<Parser>,
) -> Descriptor {
    Descriptor {
        kind,
        mtype,
        subtype,
        length,
        name,
        parser,
    }
}

/// Indexed by `MessageKind as usize`.
#[rustfmt::skip]
static DESCRIPTORS: [Descriptor; 16] = {
    use parse::*;
    use MessageKind as K;
    [
        entry(K::ActiveChange, 4, 0x1300, 20, "Item Active Change", Some(active_change)),
        entry(K::TypeChange, 4, 0x1100, 20, "Item Type Change", Some(type_change)),
        entry(K::ParameterChange, 6, 0x2D00, 28, "Parameter Change", Some(parameter_change)),
        entry(K::ParameterChangeMin, 6, 0x2E00, 28, "Parameter Change Min", Some(parameter_change_min)),
        entry(K::ParameterChangeMax, 6, 0x2F00, 28, "Parameter Change Max", Some(parameter_change_max)),
        entry(K::TempoChange, 4, 0x1400, 20, "Parameter Tempo Change", Some(tempo_change)),
        entry(K::TempoChange2, 4, 0x3100, 20, "Parameter Tempo Change 2", Some(tempo_change_2)),
        entry(K::PresetChange, 2, 0x2700, 12, "Preset Change", Some(preset_change)),
        entry(K::PresetChangeAlert, 1, 0x2300, 8, "Alert Preset Change", Some(preset_change_alert)),
        entry(K::PresetLoad, 1025, 0x0100, 4104, "Preset Load", Some(preset_load)),
        entry(K::PresetSet, 1026, 0x0200, 4108, "Preset Set", None),
        entry(K::PresetQuery, 2, 0x0000, 12, "Preset Query", None),
        entry(K::SetChange, 2, 0x2C00, 12, "Set Change", Some(set_change)),
        entry(K::SetLoad, 6, 0x2900, 12, "Set Load", Some(set_load)),
        entry(K::SetQuery, 2, 0x2800, 12, "Set Query", None),
        entry(K::SetupChange, 5, 0x1600, 24, "Setup Change", Some(setup_change)),
    ]
};

/// Sentinel for messages no descriptor matches.
pub static UNKNOWN: Descriptor = entry(MessageKind::Unknown, 0, 0, 0, "Unknown", None);

/// Lookup index over the static descriptor table.
pub struct Registry {
    index: HashMap<(u16, u16), &'static Descriptor>,
}

impl Registry {
    fn build() -> Self {
        let index = DESCRIPTORS
            .iter()
            .map(|d| ((d.mtype, d.subtype), d))
            .collect();
        Self { index }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    /// Exact match on (type, subtype).
    pub fn lookup(&self, mtype: u16, subtype: u16) -> Option<&'static Descriptor> {
        self.index.get(&(mtype, subtype)).copied()
    }

    /// Like [`lookup`](Self::lookup), but yields the "Unknown" sentinel on a miss.
    pub fn lookup_or_unknown(&self, mtype: u16, subtype: u16) -> &'static Descriptor {
        self.lookup(mtype, subtype).unwrap_or(&UNKNOWN)
    }

    /// Descriptor of a known kind.
    pub fn descriptor(&self, kind: MessageKind) -> &'static Descriptor {
        DESCRIPTORS.get(kind as usize).unwrap_or(&UNKNOWN)
    }

    /// Every known descriptor, in table order.
    pub fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }
}
