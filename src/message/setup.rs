//! Setup-change id table.
//!
//! Cab settings, board inputs, board tempo and the DT switches are not
//! addressed as item parameters but through "setup" ids.

use crate::model::{board_param, catalog::cab_param, DtField};

pub const TEMPO: u32 = 0x17;

/// DT setup ids start here, three per block.
const DT_BASE: u32 = 0x26;

/// Target of a setup id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTarget {
    /// Board tempo in BPM.
    Tempo,
    /// A cab parameter; `cab` is the item id (1 or 3).
    CabParam { cab: u32, param: u32 },
    /// A board-level parameter.
    BoardParam(u32),
}

const fn cab0(param: u32) -> SetupTarget {
    SetupTarget::CabParam { cab: 1, param }
}

const fn cab1(param: u32) -> SetupTarget {
    SetupTarget::CabParam { cab: 3, param }
}

static TABLE: &[(u32, SetupTarget)] = &[
    (TEMPO, SetupTarget::Tempo),
    (0x32, cab0(cab_param::EARLY_REFLECTION)),
    (0x33, cab1(cab_param::EARLY_REFLECTION)),
    (0x34, cab0(cab_param::MIC)),
    (0x35, cab1(cab_param::MIC)),
    (0x36, SetupTarget::BoardParam(board_param::INPUT1_SOURCE)),
    (0x37, SetupTarget::BoardParam(board_param::INPUT2_SOURCE)),
    (0x55, SetupTarget::BoardParam(board_param::GUITAR_IN_Z)),
    (0x57, cab0(cab_param::LOW_CUT)),
    (0x58, cab1(cab_param::LOW_CUT)),
    (0x59, cab0(cab_param::RES_LEVEL)),
    (0x5A, cab1(cab_param::RES_LEVEL)),
    (0x5B, cab0(cab_param::THUMP)),
    (0x5C, cab1(cab_param::THUMP)),
    (0x5D, cab0(cab_param::DECAY)),
    (0x5E, cab1(cab_param::DECAY)),
];

/// Resolve a setup id received from the device.
pub fn target(id: u32) -> Option<SetupTarget> {
    TABLE.iter().find(|(k, _)| *k == id).map(|(_, t)| *t)
}

/// Setup id for `target`, if it has one.
pub fn id_for(target: SetupTarget) -> Option<u32> {
    TABLE.iter().find(|(_, t)| *t == target).map(|(k, _)| *k)
}

/// Setup id of one DT field.
pub fn dt_id(dt: u8, field: DtField) -> u32 {
    let offset = match field {
        DtField::Topology => 0,
        DtField::Mode => 1,
        DtField::Class => 2,
    };
    DT_BASE + 3 * u32::from(dt) + offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_ways() {
        assert_eq!(target(0x17), Some(SetupTarget::Tempo));
        assert_eq!(target(0x5C), Some(cab1(cab_param::THUMP)));
        assert_eq!(
            id_for(SetupTarget::BoardParam(board_param::GUITAR_IN_Z)),
            Some(0x55)
        );
        assert_eq!(id_for(cab0(cab_param::MIC)), Some(0x34));
        assert_eq!(target(0x99), None);
    }

    #[test]
    fn test_keys_unique() {
        for (i, (a, _)) in TABLE.iter().enumerate() {
            assert!(TABLE[i + 1..].iter().all(|(b, _)| a != b));
        }
    }

    #[test]
    fn test_dt_ids() {
        assert_eq!(dt_id(0, DtField::Topology), 0x26);
        assert_eq!(dt_id(0, DtField::Class), 0x28);
        assert_eq!(dt_id(1, DtField::Topology), 0x29);
        assert_eq!(dt_id(1, DtField::Mode), 0x2A);
        // DT ids are encode-only.
        assert_eq!(target(0x26), None);
    }
}
