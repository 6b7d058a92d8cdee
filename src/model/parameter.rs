//! Parameters and their variant-specific value semantics.
//!
//! Every parameter stores three 4-byte binary slots (current, min, max) in
//! the representation the device uses on the wire. The [`ParamKind`] decides
//! how those bytes are validated and how they convert to and from the human
//! strings shown by an editor.
//!
//! # Example
//!
//! ```
//! use podwire::model::{ParamKind, Parameter, Slot};
//!
//! let mut drive = Parameter::new(0x3F10_0003, "Drive", ParamKind::PerCent);
//! drive.set_text(Slot::Current, "42%").unwrap();
//! assert_eq!(drive.text(Slot::Current), "42%");
//! assert!(drive.set_text(Slot::Current, "142").is_err());
//! ```

use crate::error::{PodError, Result};
use crate::protocol::value_type;

/// Note divisions selectable on tempo-linked parameters.
pub const TEMPO_NOTES: &[&str] = &[
    "Whole", "1/2 (dot)", "1/2", "1/2 (3)", "1/4 (dot)", "1/4", "1/4 (3)", "8th (dot)", "8th",
    "8th (3)", "16 (dot)", "16", "16 (3)", "32 (dot)", "32", "32 (3)", "64 (dot)", "64",
    "64 (3)",
];

/// Stored tempo values above this are note divisions (index + 2).
const TEMPO_NOTE_OFFSET: usize = 2;

/// Value slot addressed by parameter change messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Current,
    Min,
    Max,
}

/// Binary representation used by list parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEncoding {
    /// Index plus shift, as a little-endian i32.
    Int32,
    /// Index normalized over the list, as a little-endian f32.
    Float32,
}

/// Parameter variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// 0..1 shown as a percentage.
    PerCent,
    /// 0..1 mapped linearly onto `min..max`.
    Range { min: f32, max: f32 },
    /// 0..1 mapped onto `min..max` Hz.
    Frequency { min: f32, max: f32 },
    /// 0..1 of `max_ms` milliseconds.
    Time { max_ms: u32 },
    /// Either a note division (> 1) or 0..1 mapped onto `min..max` Hz.
    Tempo { min: f32, max: f32 },
    /// One of a fixed set of names. Empty names are reserved slots.
    List {
        entries: &'static [&'static str],
        encoding: ListEncoding,
        shift: i32,
    },
    /// Placeholder that carries no value.
    Null,
}

/// Static description of a parameter, as found in the model catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub id: u32,
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamDef {
    pub const fn new(id: u32, name: &'static str, kind: ParamKind) -> Self {
        Self { id, name, kind }
    }
}

#[inline]
fn as_f32(bin: [u8; 4]) -> f32 {
    f32::from_le_bytes(bin)
}

#[inline]
fn as_i32(bin: [u8; 4]) -> i32 {
    i32::from_le_bytes(bin)
}

fn normalized(bin: [u8; 4]) -> Result<()> {
    let v = as_f32(bin);
    if !(0.0..=1.0).contains(&v) {
        return Err(PodError::TypeMismatch(format!(
            "binary value {} must be between 0 and 1",
            v
        )));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(s: &str, strip: &[&str]) -> Result<T> {
    let mut cleaned = s.replace(' ', "");
    for suffix in strip {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned
        .parse()
        .map_err(|_| PodError::Validation(format!("\"{}\" is not a number", s)))
}

fn scale(min: f32, max: f32, v: f32) -> Result<[u8; 4]> {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if !(lo..=hi).contains(&v) {
        return Err(PodError::Validation(format!(
            "value must be between {:.1} and {:.1}",
            lo, hi
        )));
    }
    Ok(((v - min) / (max - min)).to_le_bytes())
}

impl ParamKind {
    /// Initial binary value of a freshly built parameter.
    pub fn default_bin(&self) -> [u8; 4] {
        match *self {
            ParamKind::List {
                encoding: ListEncoding::Int32,
                shift,
                ..
            } => shift.to_le_bytes(),
            ParamKind::Null => [0; 4],
            _ => 0f32.to_le_bytes(),
        }
    }

    /// Wire value type tag.
    pub fn value_type(&self) -> u32 {
        match self {
            ParamKind::List {
                encoding: ListEncoding::Int32,
                ..
            } => value_type::INT32,
            _ => value_type::FLOAT32,
        }
    }

    /// Validate raw bytes received from the device.
    pub fn check_bin(&self, bin: [u8; 4]) -> Result<()> {
        match *self {
            ParamKind::PerCent
            | ParamKind::Range { .. }
            | ParamKind::Frequency { .. }
            | ParamKind::Time { .. } => normalized(bin),
            ParamKind::Tempo { .. } => {
                let v = as_f32(bin);
                let limit = (TEMPO_NOTES.len() + TEMPO_NOTE_OFFSET - 1) as f32;
                if !(0.0..=limit).contains(&v) {
                    return Err(PodError::TypeMismatch(format!(
                        "binary tempo value {} must be between 0 and {}",
                        v, limit
                    )));
                }
                Ok(())
            }
            ParamKind::List {
                entries,
                encoding: ListEncoding::Int32,
                shift,
            } => {
                let v = as_i32(bin);
                let last = entries.len() as i32 + shift - 1;
                if v < shift || v > last {
                    return Err(PodError::TypeMismatch(format!(
                        "binary value {} must be between {} and {}",
                        v, shift, last
                    )));
                }
                if entries[(v - shift) as usize].is_empty() {
                    return Err(PodError::TypeMismatch(format!(
                        "binary value {} is a reserved entry",
                        v
                    )));
                }
                Ok(())
            }
            ParamKind::List {
                encoding: ListEncoding::Float32,
                ..
            } => normalized(bin),
            ParamKind::Null => Err(PodError::TypeMismatch(
                "parameter carries no value".to_string(),
            )),
        }
    }

    /// Render raw bytes as the editor string.
    pub fn render(&self, bin: [u8; 4]) -> String {
        match *self {
            ParamKind::PerCent => format!("{}%", (as_f32(bin) * 100.0).round() as i32),
            ParamKind::Range { min, max } => format!("{:.1}", as_f32(bin) * (max - min) + min),
            ParamKind::Frequency { min, max } => {
                format!("{}Hz", (as_f32(bin) * (max - min) + min).round() as i32)
            }
            ParamKind::Time { max_ms } => format!("{}ms", (as_f32(bin) * max_ms as f32) as i32),
            ParamKind::Tempo { min, max } => {
                let v = as_f32(bin);
                if v > 1.0 {
                    (v as usize)
                        .checked_sub(TEMPO_NOTE_OFFSET)
                        .and_then(|i| TEMPO_NOTES.get(i))
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("{:.0}", v))
                } else {
                    format!("{:.2}Hz", v * (max - min) + min)
                }
            }
            ParamKind::List {
                entries,
                encoding,
                shift,
            } => {
                let index = match encoding {
                    ListEncoding::Int32 => (as_i32(bin) - shift) as isize,
                    ListEncoding::Float32 => {
                        let span = (entries.len() as i32 - 1 + shift) as f32;
                        (as_f32(bin) * span).round() as isize
                    }
                };
                usize::try_from(index)
                    .ok()
                    .and_then(|i| entries.get(i))
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            }
            ParamKind::Null => String::new(),
        }
    }

    /// Parse an editor string into raw bytes.
    pub fn parse(&self, s: &str) -> Result<[u8; 4]> {
        match *self {
            ParamKind::PerCent => {
                let v: i32 = parse_number(s, &["%"])?;
                if !(0..=100).contains(&v) {
                    return Err(PodError::Validation(
                        "value must be between 0 and 100".to_string(),
                    ));
                }
                Ok((v as f32 / 100.0).to_le_bytes())
            }
            ParamKind::Range { min, max } => scale(min, max, parse_number(s, &[])?),
            ParamKind::Frequency { min, max } => {
                let v: i32 = parse_number(s, &["Hz", "hz"])?;
                scale(min, max, v as f32)
            }
            ParamKind::Time { max_ms } => {
                let v: i32 = parse_number(s, &["ms"])?;
                if v < 0 || v as u32 > max_ms {
                    return Err(PodError::Validation(format!(
                        "value must be between 0 and {}",
                        max_ms
                    )));
                }
                Ok((v as f32 / max_ms as f32).to_le_bytes())
            }
            ParamKind::Tempo { min, max } => {
                if let Some(i) = TEMPO_NOTES.iter().position(|n| *n == s) {
                    return Ok(((i + TEMPO_NOTE_OFFSET) as f32).to_le_bytes());
                }
                let v: f32 = parse_number(s, &["Hz", "hz"])?;
                scale(min, max, v).map_err(|_| {
                    PodError::Validation(format!(
                        "value must be between {:.2} and {:.2} or a note division",
                        min, max
                    ))
                })
            }
            ParamKind::List {
                entries,
                encoding,
                shift,
            } => {
                if s.is_empty() {
                    return Err(PodError::Validation("value must not be empty".to_string()));
                }
                let i = entries.iter().position(|e| *e == s).ok_or_else(|| {
                    PodError::Validation(format!("\"{}\" is not an allowed value", s))
                })?;
                Ok(match encoding {
                    ListEncoding::Int32 => (i as i32 + shift).to_le_bytes(),
                    ListEncoding::Float32 => {
                        let span = (entries.len() as i32 - 1 + shift) as f32;
                        (i as f32 / span).to_le_bytes()
                    }
                })
            }
            ParamKind::Null => Err(PodError::Validation(
                "parameter carries no value".to_string(),
            )),
        }
    }
}

/// A live parameter of a board item or of the board itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    id: u32,
    name: &'static str,
    kind: ParamKind,
    current: [u8; 4],
    min: [u8; 4],
    max: [u8; 4],
}

impl Parameter {
    /// Create a parameter holding the variant's default value.
    pub fn new(id: u32, name: &'static str, kind: ParamKind) -> Self {
        let initial = kind.default_bin();
        Self {
            id,
            name,
            kind,
            current: initial,
            min: initial,
            max: initial,
        }
    }

    /// Instantiate a catalog definition.
    pub fn from_def(def: &ParamDef) -> Self {
        Self::new(def.id, def.name, def.kind)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    #[inline]
    pub fn is_tempo(&self) -> bool {
        matches!(self.kind, ParamKind::Tempo { .. })
    }

    /// Wire value type tag.
    #[inline]
    pub fn value_type(&self) -> u32 {
        self.kind.value_type()
    }

    /// Raw bytes stored in `slot`.
    pub fn bin(&self, slot: Slot) -> [u8; 4] {
        match slot {
            Slot::Current => self.current,
            Slot::Min => self.min,
            Slot::Max => self.max,
        }
    }

    /// Store raw bytes into `slot` after variant validation.
    ///
    /// On error the slot keeps its previous value.
    pub fn set_bin(&mut self, slot: Slot, bin: [u8; 4]) -> Result<()> {
        self.kind.check_bin(bin)?;
        *self.slot_mut(slot) = bin;
        Ok(())
    }

    /// Editor string for `slot`.
    pub fn text(&self, slot: Slot) -> String {
        self.kind.render(self.bin(slot))
    }

    /// Parse an editor string into `slot`.
    ///
    /// On error the slot keeps its previous value.
    pub fn set_text(&mut self, slot: Slot, s: &str) -> Result<()> {
        let bin = self.kind.parse(s)?;
        *self.slot_mut(slot) = bin;
        Ok(())
    }

    /// Current value as a float, for tempo handling.
    #[inline]
    pub fn current_f32(&self) -> f32 {
        as_f32(self.current)
    }

    /// Values an editor may offer in a drop-down.
    pub fn allowed_values(&self) -> Vec<&'static str> {
        match self.kind {
            ParamKind::Tempo { .. } => TEMPO_NOTES.to_vec(),
            ParamKind::List { entries, .. } => {
                entries.iter().copied().filter(|e| !e.is_empty()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Whether free-form values outside `allowed_values` are accepted.
    pub fn accepts_free_text(&self) -> bool {
        !matches!(self.kind, ParamKind::List { .. } | ParamKind::Null)
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut [u8; 4] {
        match slot {
            Slot::Current => &mut self.current,
            Slot::Min => &mut self.min,
            Slot::Max => &mut self.max,
        }
    }
}
