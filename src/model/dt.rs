//! Amp companion switch block (class, mode, topology).

use crate::error::{PodError, Result};

/// Topology names, indexed by their binary value.
pub const TOPOLOGIES: [&str; 4] = ["I", "II", "III", "IV"];

const ON: u8 = 0x7F;

/// DT field addressed by setup change messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtField {
    Topology,
    Mode,
    Class,
}

/// Per-amp companion switch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dt {
    id: u8,
    amp_id: u32,
    class: bool,
    mode: bool,
    topology: u8,
}

fn flag_from_bin(field: &str, data: u8) -> Result<bool> {
    match data {
        0 => Ok(false),
        ON => Ok(true),
        other => Err(PodError::TypeMismatch(format!(
            "wrong binary value for {}: {:#x}",
            field, other
        ))),
    }
}

impl Dt {
    pub fn new(id: u8, amp_id: u32) -> Self {
        Self {
            id,
            amp_id,
            class: false,
            mode: false,
            topology: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Id of the amp this block belongs to.
    #[inline]
    pub fn amp_id(&self) -> u32 {
        self.amp_id
    }

    /// Binary value of `field` as sent on the wire.
    pub fn bin(&self, field: DtField) -> u8 {
        match field {
            DtField::Topology => self.topology,
            DtField::Mode => {
                if self.mode {
                    ON
                } else {
                    0
                }
            }
            DtField::Class => {
                if self.class {
                    ON
                } else {
                    0
                }
            }
        }
    }

    /// Store a binary value received from the device.
    pub fn set_bin(&mut self, field: DtField, data: u8) -> Result<()> {
        match field {
            DtField::Topology => {
                if data as usize >= TOPOLOGIES.len() {
                    return Err(PodError::TypeMismatch(format!(
                        "wrong binary value for topology: {:#x}",
                        data
                    )));
                }
                self.topology = data;
            }
            DtField::Mode => self.mode = flag_from_bin("mode", data)?,
            DtField::Class => self.class = flag_from_bin("class", data)?,
        }
        Ok(())
    }

    /// "A" or "A/B".
    pub fn class(&self) -> &'static str {
        if self.class {
            "A/B"
        } else {
            "A"
        }
    }

    /// "Tri" or "Pent".
    pub fn mode(&self) -> &'static str {
        if self.mode {
            "Pent"
        } else {
            "Tri"
        }
    }

    pub fn topology(&self) -> &'static str {
        TOPOLOGIES[self.topology as usize]
    }

    pub fn set_class(&mut self, s: &str) -> Result<()> {
        self.class = match s {
            "A" => false,
            "A/B" => true,
            _ => {
                return Err(PodError::Validation(format!(
                    "class must be \"A\" or \"A/B\", got \"{}\"",
                    s
                )))
            }
        };
        Ok(())
    }

    pub fn set_mode(&mut self, s: &str) -> Result<()> {
        self.mode = match s {
            "Tri" => false,
            "Pent" => true,
            _ => {
                return Err(PodError::Validation(format!(
                    "mode must be \"Tri\" or \"Pent\", got \"{}\"",
                    s
                )))
            }
        };
        Ok(())
    }

    pub fn set_topology(&mut self, s: &str) -> Result<()> {
        let index = TOPOLOGIES.iter().position(|t| *t == s).ok_or_else(|| {
            PodError::Validation(format!("unknown topology \"{}\"", s))
        })?;
        self.topology = index as u8;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dt = Dt::new(1, 2);
        assert_eq!(dt.amp_id(), 2);
        assert_eq!(dt.class(), "A");
        assert_eq!(dt.mode(), "Tri");
        assert_eq!(dt.topology(), "I");
    }

    #[test]
    fn test_binary_flags() {
        let mut dt = Dt::new(0, 0);
        dt.set_bin(DtField::Class, 0x7F).unwrap();
        dt.set_bin(DtField::Mode, 0x7F).unwrap();
        assert_eq!(dt.class(), "A/B");
        assert_eq!(dt.mode(), "Pent");
        assert_eq!(dt.bin(DtField::Class), 0x7F);

        assert!(dt.set_bin(DtField::Class, 0x01).is_err());
        assert_eq!(dt.class(), "A/B");
    }

    #[test]
    fn test_topology_bounds() {
        let mut dt = Dt::new(0, 0);
        dt.set_bin(DtField::Topology, 3).unwrap();
        assert_eq!(dt.topology(), "IV");
        assert!(matches!(
            dt.set_bin(DtField::Topology, 4),
            Err(PodError::TypeMismatch(_))
        ));
        assert_eq!(dt.bin(DtField::Topology), 3);
    }

    #[test]
    fn test_text_setters() {
        let mut dt = Dt::new(0, 0);
        dt.set_topology("III").unwrap();
        dt.set_mode("Pent").unwrap();
        dt.set_class("A/B").unwrap();
        assert_eq!(dt.bin(DtField::Topology), 2);
        assert!(matches!(dt.set_mode("Square"), Err(PodError::Validation(_))));
        assert!(dt.set_topology("V").is_err());
    }
}
