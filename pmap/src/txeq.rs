// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! TX-equalization overrides.
//!
//! Channel loss between an ASIC lane and its cage varies with the board
//! routing and the profile's signaling rate, so platforms ship per-profile
//! transmit equalizer settings alongside the wiring table. An override names
//! the profiles it applies to and the lanes it covers; a lane entry may name
//! a concrete chip or apply to all of them. Lanes with no matching override
//! run the SerDes vendor defaults -- explicitly *not* zero taps, which would
//! produce a dead link on most channels.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use std::collections::BTreeSet;

use crate::chip::ChipRef;
use crate::map::PlatformMap;
use crate::ports::ProfileId;

/// SerDes transmit equalizer coefficients.
///
/// These are driver tap values, not physical units; their scale is defined
/// by the SerDes vendor.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    JsonSchema,
    PartialEq,
    Serialize,
)]
pub struct TxTaps {
    pub pre: i32,
    pub pre2: i32,
    pub pre3: i32,
    pub main: i32,
    pub post: i32,
    pub post2: i32,
    pub post3: i32,
}

/// The taps to drive one lane with, under a [`TapOverride`].
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct LaneTaps {
    pub chip: ChipRef,
    pub lane: u8,
    pub tx: TxTaps,
}

/// One TX-equalization override from the mapping table.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct TapOverride {
    /// The profiles this override applies to.
    pub profiles: BTreeSet<ProfileId>,
    /// Per-lane taps, in table order.
    pub lanes: Vec<LaneTaps>,
}

impl TapOverride {
    /// Find the taps this override supplies for `(chip, lane)`, if any.
    ///
    /// An exact chip match wins over the `ALL` wildcard for the same lane.
    /// If no entry covers the lane at all, the override's lane-0 wildcard
    /// entry is reused: narrow profiles share a single lane-0 definition
    /// that applies to whichever lane the port actually lands on.
    fn lookup(&self, chip: &str, lane: u8) -> Option<TxTaps> {
        let mut wildcard = None;
        for entry in &self.lanes {
            if entry.lane != lane || !entry.chip.matches(chip) {
                continue;
            }
            match entry.chip {
                ChipRef::Exact(_) => return Some(entry.tx),
                ChipRef::AllChips => wildcard = Some(entry.tx),
            }
        }
        if wildcard.is_some() {
            return wildcard;
        }
        self.lanes
            .iter()
            .find(|entry| {
                entry.lane == 0 && entry.chip == ChipRef::AllChips
            })
            .map(|entry| entry.tx)
    }
}

impl PlatformMap {
    /// Look up the TX taps to program for `(chip, lane)` when it runs
    /// `profile`.
    ///
    /// `None` means no override applies and the SerDes should run vendor
    /// default taps.
    pub fn tx_taps(
        &self,
        chip: &str,
        lane: u8,
        profile: ProfileId,
    ) -> Option<TxTaps> {
        self.tap_overrides
            .iter()
            .filter(|over| over.profiles.contains(&profile))
            .find_map(|over| over.lookup(chip, lane))
    }
}
