//! Stored presets and the sets that own them.

use super::board::{Rig, PRESETS_PER_SET};

/// Length of a preset name on the device.
pub const PRESET_NAME_LEN: usize = 16;

const DEFAULT_PRESET_NAME: &str = "New Tone";

/// A stored configuration snapshot.
#[derive(Debug, Clone)]
pub struct Preset {
    id: u8,
    name: [u8; PRESET_NAME_LEN],
    rig: Rig,
}

impl Preset {
    pub fn new(id: u8) -> Self {
        let mut preset = Self {
            id,
            name: [b' '; PRESET_NAME_LEN],
            rig: Rig::new(),
        };
        preset.set_name(DEFAULT_PRESET_NAME);
        preset
    }

    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Bank/letter label shown on the device, e.g. `"1A"`, `"16D"`.
    pub fn display_id(&self) -> String {
        let bank = self.id / 4 + 1;
        let letter = char::from(b'A' + self.id % 4);
        format!("{}{}", bank, letter)
    }

    /// Name with the space padding removed.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name)
            .trim_matches(|c| c == ' ' || c == '\0')
            .to_string()
    }

    /// Name as stored on the device.
    #[inline]
    pub fn raw_name(&self) -> [u8; PRESET_NAME_LEN] {
        self.name
    }

    /// Store `name`, truncated to 16 bytes and padded with spaces.
    pub fn set_name(&mut self, name: &str) {
        self.name = [b' '; PRESET_NAME_LEN];
        let src = name.as_bytes();
        let len = src.len().min(PRESET_NAME_LEN);
        self.name[..len].copy_from_slice(&src[..len]);
    }

    #[inline]
    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    #[inline]
    pub fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }
}

/// A bank of 64 presets.
#[derive(Debug, Clone)]
pub struct Set {
    id: u8,
    name: String,
    presets: Vec<Preset>,
}

impl Set {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            name: format!("Set {}", u32::from(id) + 1),
            presets: (0..PRESETS_PER_SET as u8).map(Preset::new).collect(),
        }
    }

    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn preset(&self, id: u8) -> Option<&Preset> {
        self.presets.get(id as usize)
    }

    pub fn preset_mut(&mut self, id: u8) -> Option<&mut Preset> {
        self.presets.get_mut(id as usize)
    }
}
