// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Chips and the electrical lanes they expose.
//!
//! A _chip_ is one endpoint of the platform's internal wiring: either a
//! SerDes block inside the switching ASIC (an "iphy" core, conventionally
//! named `BC0`, `BC1`, ...) or a front-panel transceiver cage (named after
//! the ports it serves, e.g. `eth1/2`). A [`Pin`] is a single electrical
//! lane on one of those chips.

use std::fmt;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// The number of SerDes lanes on any chip in this class of platform, for
/// both the ASIC cores and the transceiver cages.
pub const MAX_LANES_PER_CHIP: u8 = 8;

/// The role a chip plays in the platform's data path.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    JsonSchema,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChipType {
    /// A SerDes block inside the switching ASIC.
    Iphy,
    /// An external retimer PHY between the ASIC and the front panel.
    Xphy,
    /// A front-panel transceiver cage.
    Transceiver,
}

impl ChipType {
    /// The integer code used for this chip type in the table format.
    pub const fn code(&self) -> i32 {
        match self {
            ChipType::Iphy => 1,
            ChipType::Xphy => 2,
            ChipType::Transceiver => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ChipType::Iphy),
            2 => Some(ChipType::Xphy),
            3 => Some(ChipType::Transceiver),
            _ => None,
        }
    }
}

impl fmt::Display for ChipType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChipType::Iphy => write!(f, "iphy"),
            ChipType::Xphy => write!(f, "xphy"),
            ChipType::Transceiver => write!(f, "transceiver"),
        }
    }
}

/// A single chip declared by the platform mapping.
#[derive(
    Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
)]
pub struct Chip {
    /// The chip's unique name, as referenced by every [`Pin`] in the table.
    pub name: String,
    /// The chip's role in the data path.
    pub chip_type: ChipType,
    /// The physical index of the chip on the board.
    pub physical_id: i32,
}

/// A single electrical lane on a chip.
#[derive(
    Clone,
    Debug,
    Deserialize,
    Eq,
    Hash,
    JsonSchema,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Pin {
    /// The name of the chip the lane belongs to.
    pub chip: String,
    /// The 0-based lane index within the chip.
    pub lane: u8,
}

impl Pin {
    pub fn new(chip: impl Into<String>, lane: u8) -> Self {
        Self { chip: chip.into(), lane }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.chip, self.lane)
    }
}

/// A chip reference in a TX-equalization override.
///
/// Overrides may name a concrete chip or apply to every chip via the `"ALL"`
/// wildcard in the table format. The wildcard is modeled here rather than as
/// a magic string so that matching logic is written once, in
/// [`PlatformMap::tx_taps`](crate::PlatformMap::tx_taps).
#[derive(
    Clone,
    Debug,
    Deserialize,
    Eq,
    Hash,
    JsonSchema,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChipRef {
    /// A reference to one declared chip, by name.
    Exact(String),
    /// The `"ALL"` wildcard, matching any chip.
    AllChips,
}

/// The name the wildcard carries in the table format.
pub(crate) const ALL_CHIPS: &str = "ALL";

impl ChipRef {
    pub fn from_table_name(name: &str) -> Self {
        if name == ALL_CHIPS {
            ChipRef::AllChips
        } else {
            ChipRef::Exact(name.to_string())
        }
    }

    pub fn table_name(&self) -> &str {
        match self {
            ChipRef::Exact(name) => name,
            ChipRef::AllChips => ALL_CHIPS,
        }
    }

    /// Whether this reference matches the given concrete chip name.
    pub fn matches(&self, chip: &str) -> bool {
        match self {
            ChipRef::Exact(name) => name == chip,
            ChipRef::AllChips => true,
        }
    }
}

impl fmt::Display for ChipRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}
