//! Built-in model catalog.
//!
//! Each board item is an instance of one catalog entry, selected by its
//! model-type code. The device supports far more models than listed here;
//! this table carries a representative subset per category so that every
//! parameter variant is in use.

use std::collections::BTreeMap;

use super::item::ItemRole;
use super::parameter::{ListEncoding, ParamDef, ParamKind};

/// Amp slot is empty.
pub const AMP_DISABLED: u32 = 0x0007_FFFF;
/// Cab slot is empty.
pub const NO_CAB: u32 = 0x0107_FFFF;
/// Pedal slot is empty.
pub const PEDAL_NONE: u32 = 0x020D_FFFF;

/// Low word shared by every empty-slot code.
pub const EMPTY_LOW_WORD: u32 = 0xFFFF;

/// Cab parameter ids.
pub mod cab_param {
    pub const LOW_CUT: u32 = 0;
    pub const RES_LEVEL: u32 = 1;
    pub const THUMP: u32 = 2;
    pub const DECAY: u32 = 3;
    pub const EARLY_REFLECTION: u32 = 4;
    pub const MIC: u32 = 5;
}

/// One catalog entry.
#[derive(Debug)]
pub struct ModelDef {
    pub code: u32,
    pub name: &'static str,
    pub category: &'static str,
    pub params: &'static [ParamDef],
    pub has_dt: bool,
}

const fn pct(id: u32, name: &'static str) -> ParamDef {
    ParamDef::new(id, name, ParamKind::PerCent)
}

const MICS: &[&str] = &[
    "57 On XS", "57 Off XS", "409 Dyn", "421 Dyn", "4038 Rbn", "121 Rbn", "67 Cond", "87 Cond",
];

const AMP_PARAMS: &[ParamDef] = &[
    pct(0x3F10_0003, "Drive"),
    pct(0x3F10_0000, "Bass"),
    pct(0x3F10_0001, "Mid"),
    pct(0x3F10_0002, "Treble"),
    pct(0x3F10_0004, "Presence"),
    pct(0x3F10_0005, "Volume"),
    pct(0x3F10_000B, "Master"),
    pct(0x3F10_0008, "SAG"),
    pct(0x3F10_0007, "HUM"),
    pct(0x3F10_0009, "Bias"),
    pct(0x3F10_000A, "Bias X"),
];

const CAB_PARAMS: &[ParamDef] = &[
    pct(cab_param::EARLY_REFLECTION, "E.R."),
    ParamDef::new(
        cab_param::LOW_CUT,
        "Low Cut",
        ParamKind::Frequency {
            min: 20.0,
            max: 500.0,
        },
    ),
    pct(cab_param::RES_LEVEL, "Res Level"),
    pct(cab_param::THUMP, "Thump"),
    pct(cab_param::DECAY, "Decay"),
    ParamDef::new(
        cab_param::MIC,
        "Mic Model",
        ParamKind::List {
            entries: MICS,
            encoding: ListEncoding::Int32,
            shift: 0,
        },
    ),
];

const fn amp(code: u32, name: &'static str) -> ModelDef {
    ModelDef {
        code,
        name,
        category: "Amp",
        params: AMP_PARAMS,
        has_dt: true,
    }
}

const fn cab(code: u32, name: &'static str) -> ModelDef {
    ModelDef {
        code,
        name,
        category: "Cab",
        params: CAB_PARAMS,
        has_dt: false,
    }
}

const fn pedal(
    code: u32,
    category: &'static str,
    name: &'static str,
    params: &'static [ParamDef],
) -> ModelDef {
    ModelDef {
        code,
        name,
        category,
        params,
        has_dt: false,
    }
}

static AMPS: &[ModelDef] = &[
    ModelDef {
        code: AMP_DISABLED,
        name: "Amp Disabled",
        category: "Amp",
        params: &[],
        has_dt: false,
    },
    amp(458_752, "phD Motorway"),
    amp(458_753, "Tweed B-Man Normal"),
    amp(458_754, "Tweed B-Man Bright"),
    amp(458_755, "Blackface 'Lux Normal"),
    amp(458_760, "Hiway 100"),
    amp(458_773, "Brit J-800"),
];

static CABS: &[ModelDef] = &[
    cab(NO_CAB, "No Cab"),
    cab(17_235_968, "212 PhD Ported"),
    cab(17_235_969, "6x9 Super O"),
    cab(17_235_970, "112 Celest 12-H"),
    cab(17_235_971, "112 BF 'Lux"),
    cab(17_235_972, "112 Field Coil"),
];

const DELAY_TIME: ParamKind = ParamKind::Tempo {
    min: 20.0,
    max: 2000.0,
};

const MOD_SPEED: ParamKind = ParamKind::Tempo {
    min: 0.10,
    max: 15.0,
};

const RED_COMP: &[ParamDef] = &[pct(0x3F10_0001, "Sustain"), pct(0x3F10_0002, "Level")];

const NOISE_GATE: &[ParamDef] = &[pct(0x3F10_0001, "Threshold"), pct(0x3F10_0002, "Decay")];

const HARD_GATE: &[ParamDef] = &[
    ParamDef::new(
        0x3F10_0000,
        "Open Threshold",
        ParamKind::Range {
            min: -96.0,
            max: 0.0,
        },
    ),
    ParamDef::new(
        0x3F10_0001,
        "Close Threshold",
        ParamKind::Range {
            min: -96.0,
            max: 0.0,
        },
    ),
    ParamDef::new(0x3F10_0002, "Hold", ParamKind::Time { max_ms: 800 }),
    ParamDef::new(0x3F10_0003, "Decay", ParamKind::Time { max_ms: 4000 }),
];

const DIGITAL_DELAY: &[ParamDef] = &[
    ParamDef::new(0x3F10_0000, "Time", DELAY_TIME),
    pct(0x3F10_0001, "FDBK"),
    pct(0x3F10_0002, "Bass"),
    pct(0x3F10_0003, "Treble"),
    pct(0x3F10_0004, "Mix"),
];

const STEREO_DELAY: &[ParamDef] = &[
    ParamDef::new(0x3F10_0000, "L Time", DELAY_TIME),
    pct(0x3F10_0001, "L-FDBK"),
    ParamDef::new(0x3F10_0002, "R Time", DELAY_TIME),
    pct(0x3F10_0003, "R-FDBK"),
    pct(0x3F10_0004, "Mix"),
];

const PHASER: &[ParamDef] = &[
    ParamDef::new(0x3F10_0000, "Speed", MOD_SPEED),
    pct(0x3F10_0001, "Depth"),
    pct(0x3F10_0002, "Fdbk"),
    ParamDef::new(
        0x3F10_0003,
        "Stages",
        ParamKind::List {
            entries: &["STG 4", "STG 8", "STG 12", "STG 16"],
            encoding: ListEncoding::Float32,
            shift: 0,
        },
    ),
    pct(0x3F10_0005, "Mix"),
];

const FREQUENCY_SHIFTER: &[ParamDef] = &[
    ParamDef::new(
        0x3F10_0001,
        "Freq",
        ParamKind::Frequency {
            min: 0.0,
            max: 3520.0,
        },
    ),
    ParamDef::new(
        0x3F10_0002,
        "Mode",
        ParamKind::List {
            entries: &["Up", "Down", "Stereo"],
            encoding: ListEncoding::Float32,
            shift: 0,
        },
    ),
    pct(0x3F10_0005, "Mix"),
];

const SPRING_63: &[ParamDef] = &[
    pct(0x3F10_0001, "Decay"),
    ParamDef::new(0x3F10_0002, "Predelay", ParamKind::Time { max_ms: 200 }),
    pct(0x3F10_0003, "Tone"),
    pct(0x3F10_0005, "Mix"),
];

const JET_FUZZ: &[ParamDef] = &[
    pct(0x3F10_0001, "Drive"),
    pct(0x3F10_0002, "Fdbk"),
    pct(0x3F10_0003, "Tone"),
    pct(0x3F10_0004, "Speed"),
    pct(0x3F10_0005, "Output"),
];

const VETTA_WAH: &[ParamDef] = &[pct(0x3F10_0001, "Position"), pct(0x3F10_0005, "Mix")];

const VOLUME: &[ParamDef] = &[pct(0x3F10_0001, "Volume Level")];

const PAN: &[ParamDef] = &[ParamDef::new(
    0x3F10_0001,
    "Pan L-R Balance",
    ParamKind::Range {
        min: -100.0,
        max: 100.0,
    },
)];

const TRON_UP: &[ParamDef] = &[
    pct(0x3F10_0001, "Freq"),
    pct(0x3F10_0002, "Q"),
    ParamDef::new(
        0x3F10_0003,
        "Range",
        ParamKind::List {
            entries: &["Low", "High"],
            encoding: ListEncoding::Float32,
            shift: 0,
        },
    ),
    ParamDef::new(
        0x3F10_0004,
        "Type",
        ParamKind::List {
            entries: &["LP", "BP", "HP"],
            encoding: ListEncoding::Float32,
            shift: 0,
        },
    ),
    pct(0x3F10_0005, "Mix"),
];

static PEDALS: &[ModelDef] = &[
    pedal(PEDAL_NONE, "None", "None", &[]),
    pedal(33_554_443, "Dynamics", "Red Comp", RED_COMP),
    pedal(33_554_449, "Dynamics", "Noise Gate", NOISE_GATE),
    pedal(33_554_451, "Dynamics", "Hard Gate", HARD_GATE),
    pedal(33_685_521, "Delay", "Digital Delay", DIGITAL_DELAY),
    pedal(33_685_523, "Delay", "Stereo Delay", STEREO_DELAY),
    pedal(33_751_074, "Modulation", "Phaser", PHASER),
    pedal(33_751_106, "Modulation", "Frequency Shifter", FREQUENCY_SHIFTER),
    pedal(33_816_604, "Reverb", "'63 Spring", SPRING_63),
    pedal(33_882_122, "Distortion", "Jet Fuzz", JET_FUZZ),
    pedal(33_947_659, "Wah", "Vetta Wah", VETTA_WAH),
    pedal(34_013_188, "Volume/Pan", "Volume", VOLUME),
    pedal(34_013_189, "Volume/Pan", "Pan", PAN),
    pedal(34_209_807, "Filter", "Tron Up", TRON_UP),
];

fn table(role: ItemRole) -> &'static [ModelDef] {
    match role {
        ItemRole::Amp => AMPS,
        ItemRole::Cab => CABS,
        ItemRole::Pedal => PEDALS,
    }
}

/// Code of the empty-slot model for `role`.
pub fn empty_code(role: ItemRole) -> u32 {
    match role {
        ItemRole::Amp => AMP_DISABLED,
        ItemRole::Cab => NO_CAB,
        ItemRole::Pedal => PEDAL_NONE,
    }
}

/// The empty-slot model for `role`, always the first catalog entry.
pub fn empty_model(role: ItemRole) -> &'static ModelDef {
    &table(role)[0]
}

/// Exact lookup by model-type code.
pub fn by_code(role: ItemRole, code: u32) -> Option<&'static ModelDef> {
    table(role).iter().find(|m| m.code == code)
}

/// Lookup accepting the device's wire form of the empty-slot code.
///
/// The device reports empty slots with a `0x7FFF` high word; any code whose
/// low word is `0xFFFF` and that is not itself in the catalog resolves to
/// the role's empty model.
pub fn resolve(role: ItemRole, code: u32) -> Option<&'static ModelDef> {
    by_code(role, code).or_else(|| {
        if code & 0xFFFF == EMPTY_LOW_WORD {
            Some(empty_model(role))
        } else {
            None
        }
    })
}

/// Lookup by name. `category` is only significant for pedals.
pub fn by_name(role: ItemRole, category: &str, name: &str) -> Option<&'static ModelDef> {
    table(role)
        .iter()
        .find(|m| m.name == name && (role != ItemRole::Pedal || m.category == category))
}

/// Model names for `role`, in catalog order.
pub fn names(role: ItemRole) -> Vec<&'static str> {
    table(role).iter().map(|m| m.name).collect()
}

/// Pedal model names grouped by category.
pub fn pedal_names() -> BTreeMap<&'static str, Vec<&'static str>> {
    let mut map: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
    for model in PEDALS {
        map.entry(model.category).or_default().push(model.name);
    }
    map
}
