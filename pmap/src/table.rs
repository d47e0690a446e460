// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! The platform mapping table format, as it appears on the wire.
//!
//! Each platform ships its mapping as a JSON blob compiled into the binary.
//! The structs here mirror that format field-for-field so that existing
//! tables and the tooling that generates them keep working unmodified; in
//! particular, port and profile ids are decimal-string map keys, enums are
//! bare integer codes, and the `"ALL"` chip wildcard is a literal string.
//! Nothing outside the loader should touch these types: the typed model in
//! [`crate::PlatformMap`] is the real API.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// A complete platform mapping table.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct MappingTable {
    /// Logical ports, keyed by decimal port id.
    pub ports: BTreeMap<String, PortTableEntry>,
    /// Every chip the port entries may reference.
    pub chips: Vec<ChipEntry>,
    /// TX-equalization overrides, keyed by profile.
    #[serde(rename = "portConfigOverrides", default)]
    pub port_config_overrides: Vec<ConfigOverrideEntry>,
    /// Platform-wide electrical definitions of the supported profiles.
    #[serde(rename = "platformSupportedProfiles")]
    pub platform_supported_profiles: Vec<SupportedProfileEntry>,
}

impl MappingTable {
    /// Parse a table from its JSON text.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Render the table back to JSON text.
    pub fn to_text(&self) -> String {
        // MappingTable contains no non-string map keys, so serialization
        // cannot fail.
        serde_json::to_string_pretty(self).unwrap()
    }
}

/// One port's entry in the `ports` map.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct PortTableEntry {
    pub mapping: PortMappingEntry,
    /// Per-profile lane assignments, keyed by decimal profile id.
    #[serde(rename = "supportedProfiles")]
    pub supported_profiles: BTreeMap<String, ProfileTableEntry>,
}

/// The static identity and wiring of a port.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct PortMappingEntry {
    pub id: u32,
    pub name: String,
    #[serde(rename = "controllingPort")]
    pub controlling_port: u32,
    pub pins: Vec<ConnectionEntry>,
    #[serde(rename = "portType")]
    pub port_type: i32,
    #[serde(
        rename = "attachedCoreId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attached_core_id: Option<i32>,
    #[serde(
        rename = "attachedCorePortIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attached_core_port_index: Option<i32>,
}

/// One a-to-z lane connection in a port's static wiring.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ConnectionEntry {
    pub a: PinEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<ZEndEntry>,
}

/// The far end of a lane connection.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ZEndEntry {
    pub end: PinEntry,
}

/// A chip/lane pair.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct PinEntry {
    pub chip: String,
    pub lane: u8,
}

/// A port's lane assignment under one profile.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ProfileTableEntry {
    /// Absent and empty both mean "no sibling is disabled".
    #[serde(
        rename = "subsumedPorts",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subsumed_ports: Option<Vec<u32>>,
    pub pins: ProfilePinsEntry,
}

/// The active pins under a profile, in logical lane order.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ProfilePinsEntry {
    pub iphy: Vec<PinConfigEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transceiver: Option<Vec<PinConfigEntry>>,
}

/// A pin reference, optionally carrying TX-equalization settings when used
/// inside a config override.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct PinConfigEntry {
    pub id: PinEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx: Option<TxTapsEntry>,
}

/// SerDes transmit equalizer coefficients.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct TxTapsEntry {
    #[serde(default)]
    pub pre: i32,
    #[serde(default)]
    pub pre2: i32,
    #[serde(default)]
    pub pre3: i32,
    pub main: i32,
    #[serde(default)]
    pub post: i32,
    #[serde(default)]
    pub post2: i32,
    #[serde(default)]
    pub post3: i32,
}

/// A TX-equalization override: when a lane runs one of the factor's
/// profiles, drive it with the listed taps.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ConfigOverrideEntry {
    pub factor: OverrideFactorEntry,
    pub pins: ProfilePinsEntry,
}

/// What an override applies to.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct OverrideFactorEntry {
    pub profiles: Vec<u16>,
}

/// The platform-wide definition of one profile.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct SupportedProfileEntry {
    pub factor: ProfileFactorEntry,
    pub profile: ProfileConfigEntry,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ProfileFactorEntry {
    #[serde(rename = "profileID")]
    pub profile_id: u16,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ProfileConfigEntry {
    pub speed: u32,
    pub iphy: IphyConfigEntry,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct IphyConfigEntry {
    #[serde(rename = "numLanes")]
    pub num_lanes: u8,
    pub modulation: i32,
    pub fec: i32,
    pub medium: i32,
    #[serde(rename = "interfaceMode")]
    pub interface_mode: i32,
    #[serde(rename = "interfaceType")]
    pub interface_type: i32,
}

/// A chip declaration.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct ChipEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub chip_type: i32,
    #[serde(rename = "physicalID")]
    pub physical_id: i32,
}
