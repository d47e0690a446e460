// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Logical ports and the profiles they support.
//!
//! A logical port owns a fixed slice of the platform's wiring: an ordered
//! list of ASIC-to-transceiver lane connections. Which of those lanes are
//! actually driven depends on the _profile_ the port is configured to run --
//! a platform-defined combination of speed, lane count, modulation, and FEC.
//! Ports sharing a cage are ganged into a group; configuring one member with
//! a wide profile claims lanes that narrower siblings would otherwise use,
//! rendering them _subsumed_ for as long as that configuration is active.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::chip::Pin;

/// The stable integer identifier of a logical port.
///
/// Port ids appear as decimal-string map keys in the table format; they are
/// converted to this newtype at load time and never handled as strings past
/// the parser.
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
#[serde(transparent)]
pub struct PortId(pub u32);

impl PortId {
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PortId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(PortId)
    }
}

/// The identifier of a speed/FEC profile.
///
/// Like port ids, profile ids are decimal-string map keys on the wire and
/// integers everywhere else.
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
#[serde(transparent)]
pub struct ProfileId(pub u16);

impl ProfileId {
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for ProfileId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(ProfileId)
    }
}

/// The role of a logical port.
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
pub enum PortType {
    /// A normal front-panel interface port.
    Interface,
    /// A fabric port on a multi-chip platform.
    Fabric,
    /// The port punting traffic to the local CPU.
    Cpu,
    /// A recycle port looping traffic back through the pipeline.
    Recycle,
    /// An out-of-band management port.
    Management,
    /// An eventor port generating in-band telemetry.
    Eventor,
}

impl PortType {
    /// The integer code used for this port type in the table format.
    pub const fn code(&self) -> i32 {
        match self {
            PortType::Interface => 0,
            PortType::Fabric => 1,
            PortType::Cpu => 2,
            PortType::Recycle => 3,
            PortType::Management => 4,
            PortType::Eventor => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(PortType::Interface),
            1 => Some(PortType::Fabric),
            2 => Some(PortType::Cpu),
            3 => Some(PortType::Recycle),
            4 => Some(PortType::Management),
            5 => Some(PortType::Eventor),
            _ => None,
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PortType::Interface => "interface",
            PortType::Fabric => "fabric",
            PortType::Cpu => "cpu",
            PortType::Recycle => "recycle",
            PortType::Management => "management",
            PortType::Eventor => "eventor",
        };
        write!(f, "{name}")
    }
}

/// A structured front-panel port name, `eth<pim>/<cage>/<lane>`.
///
/// The name encodes where the port lands on the chassis: the PIM (module
/// slot, always 1 on fixed-configuration platforms), the transceiver cage on
/// that module, and the first cage lane the port drives.
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
pub struct PortName {
    pub pim: u8,
    pub cage: u8,
    pub lane: u8,
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "eth{}/{}/{}", self.pim, self.cage, self.lane)
    }
}

impl FromStr for PortName {
    type Err = BadPortName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = regex::Regex::new(r"^eth(\d+)/(\d+)/(\d+)$").unwrap();
        let caps = re.captures(s).ok_or_else(|| BadPortName(s.to_string()))?;
        let field = |i: usize| {
            caps[i].parse::<u8>().map_err(|_| BadPortName(s.to_string()))
        };
        Ok(PortName { pim: field(1)?, cage: field(2)?, lane: field(3)? })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid port name '{0}', expected 'eth<pim>/<cage>/<lane>'")]
pub struct BadPortName(pub String);

/// One lane of the static wiring between an ASIC core and a transceiver cage.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct PinConnection {
    /// The ASIC-side lane.
    pub a: Pin,
    /// The transceiver-side lane, if the port reaches the front panel.
    /// CPU and recycle ports have no z-side.
    pub z: Option<Pin>,
}

/// A port's configuration under one supported profile.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct PortProfile {
    /// Sibling ports rendered unusable while this port runs this profile.
    /// Empty for profiles narrow enough to leave the rest of the group
    /// intact.
    pub subsumed_ports: Vec<PortId>,
    /// The ASIC lanes driven under this profile, in logical lane order.
    /// Order is meaningful: it establishes the logical-to-physical lane
    /// numbering the ASIC driver programs.
    pub iphy_pins: Vec<Pin>,
    /// The transceiver lanes driven under this profile, in logical lane
    /// order.
    pub transceiver_pins: Vec<Pin>,
}

/// A logical port and its place in the platform's wiring.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Port {
    pub id: PortId,
    /// The front-panel name, e.g. `eth1/2/1`.
    pub name: String,
    /// The port leading this port's ganged group. Self-referential for a
    /// port that leads its own group.
    pub controlling_port: PortId,
    /// The full static wiring available to the port, independent of any
    /// configured profile.
    pub pins: Vec<PinConnection>,
    pub port_type: PortType,
    /// The ASIC core the port attaches to, on platforms that expose the
    /// core mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_core_id: Option<i32>,
    /// The port's index within that core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_core_port_index: Option<i32>,
    /// The profiles this wiring supports, and what each one claims.
    pub supported_profiles: BTreeMap<ProfileId, PortProfile>,
}

impl Port {
    /// Whether this port leads its own ganged group.
    pub fn is_controlling(&self) -> bool {
        self.controlling_port == self.id
    }
}

/// The platform-wide electrical definition of a profile, independent of any
/// specific port.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct ProfileConfig {
    /// Link speed in Mb/s.
    pub speed_mbps: u32,
    /// The number of ASIC lanes the profile drives.
    pub num_lanes: u8,
    /// Modulation scheme code (NRZ, PAM4, ...), as in the table format.
    pub modulation: i32,
    /// FEC scheme code.
    pub fec: i32,
    /// Medium code (copper, optical, ...).
    pub medium: i32,
    /// Interface mode code.
    pub interface_mode: i32,
    /// Interface type code.
    pub interface_type: i32,
}
