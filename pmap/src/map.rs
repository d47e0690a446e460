// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Loading a platform mapping table into its typed, immutable model.
//!
//! The loader is deliberately strict: a table with a structural defect -- a
//! pin naming an undeclared chip, two ports claiming the same id -- must
//! never be used to program hardware, so [`PlatformMap::from_table_text`]
//! fails fast rather than dropping the offending entry. Deeper wiring
//! invariants are checked separately and exhaustively by
//! [`PlatformMap::validate`](crate::PlatformMap::validate), which exists to
//! produce a complete defect report rather than stopping at the first
//! problem.

use std::collections::BTreeMap;

use crate::chip::Chip;
use crate::chip::ChipRef;
use crate::chip::ChipType;
use crate::chip::Pin;
use crate::group::ResolveError;
use crate::ports::PinConnection;
use crate::ports::Port;
use crate::ports::PortId;
use crate::ports::PortName;
use crate::ports::PortProfile;
use crate::ports::PortType;
use crate::ports::ProfileConfig;
use crate::ports::ProfileId;
use crate::table;
use crate::table::MappingTable;
use crate::txeq::LaneTaps;
use crate::txeq::TapOverride;
use crate::txeq::TxTaps;

/// A structural defect found while loading a table.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed mapping table: {0}")]
    MalformedStructure(#[from] serde_json::Error),

    #[error("port {port} references undeclared chip \"{chip}\"")]
    DanglingReference { port: PortId, chip: String },

    #[error("config override references undeclared chip \"{chip}\"")]
    DanglingOverrideChip { chip: String },

    #[error("duplicate port id {0}")]
    DuplicatePortId(PortId),

    #[error("duplicate chip \"{0}\"")]
    DuplicateChip(String),

    #[error("duplicate platform profile {0}")]
    DuplicateProfile(ProfileId),

    #[error("port key \"{0}\" is not a decimal port id")]
    BadPortKey(String),

    #[error("port key \"{key}\" disagrees with mapping id {id}")]
    PortKeyMismatch { key: String, id: PortId },

    #[error("profile key \"{key}\" on port {port} is not a decimal profile id")]
    BadProfileKey { port: PortId, key: String },

    #[error("chip \"{chip}\" has unknown type code {code}")]
    UnknownChipType { chip: String, code: i32 },

    #[error("port {port} has unknown port type code {code}")]
    UnknownPortType { port: PortId, code: i32 },
}

/// A platform's wiring description, loaded and cross-linked.
///
/// Construct one with [`PlatformMap::from_table_text`] (or
/// [`PlatformMap::from_table`] for an already-parsed table, which the test
/// fixtures use). The map is immutable from then on; every method takes
/// `&self` and the type is freely shareable across threads.
#[derive(Clone, Debug)]
pub struct PlatformMap {
    pub(crate) chips: BTreeMap<String, Chip>,
    pub(crate) ports: BTreeMap<PortId, Port>,
    pub(crate) profiles: BTreeMap<ProfileId, ProfileConfig>,
    pub(crate) tap_overrides: Vec<TapOverride>,
}

impl PlatformMap {
    /// Load a platform map from the JSON text of its mapping table.
    ///
    /// This is the entry point the per-platform wrappers feed their embedded
    /// table literal into.
    pub fn from_table_text(text: &str) -> Result<Self, ParseError> {
        Self::from_table(MappingTable::from_text(text)?)
    }

    /// Load a platform map from an already-parsed table.
    pub fn from_table(table: MappingTable) -> Result<Self, ParseError> {
        let mut chips = BTreeMap::new();
        for entry in &table.chips {
            let chip_type = ChipType::from_code(entry.chip_type).ok_or(
                ParseError::UnknownChipType {
                    chip: entry.name.clone(),
                    code: entry.chip_type,
                },
            )?;
            let chip = Chip {
                name: entry.name.clone(),
                chip_type,
                physical_id: entry.physical_id,
            };
            if chips.insert(entry.name.clone(), chip).is_some() {
                return Err(ParseError::DuplicateChip(entry.name.clone()));
            }
        }

        let mut ports = BTreeMap::new();
        for (key, entry) in &table.ports {
            let id = key
                .parse::<u32>()
                .map(PortId)
                .map_err(|_| ParseError::BadPortKey(key.clone()))?;
            if entry.mapping.id != id.as_u32() {
                return Err(ParseError::PortKeyMismatch {
                    key: key.clone(),
                    id: PortId(entry.mapping.id),
                });
            }
            let port = build_port(id, entry, &chips)?;
            if ports.insert(id, port).is_some() {
                return Err(ParseError::DuplicatePortId(id));
            }
        }

        let mut profiles = BTreeMap::new();
        for entry in &table.platform_supported_profiles {
            let id = ProfileId(entry.factor.profile_id);
            let iphy = &entry.profile.iphy;
            let config = ProfileConfig {
                speed_mbps: entry.profile.speed,
                num_lanes: iphy.num_lanes,
                modulation: iphy.modulation,
                fec: iphy.fec,
                medium: iphy.medium,
                interface_mode: iphy.interface_mode,
                interface_type: iphy.interface_type,
            };
            if profiles.insert(id, config).is_some() {
                return Err(ParseError::DuplicateProfile(id));
            }
        }

        let mut tap_overrides = Vec::new();
        for entry in &table.port_config_overrides {
            tap_overrides.push(build_override(entry, &chips)?);
        }

        Ok(Self { chips, ports, profiles, tap_overrides })
    }

    /// Render the model back into its wire-format table.
    pub fn to_table(&self) -> MappingTable {
        MappingTable {
            ports: self
                .ports
                .values()
                .map(|p| (p.id.to_string(), port_to_table(p)))
                .collect(),
            chips: self
                .chips
                .values()
                .map(|c| table::ChipEntry {
                    name: c.name.clone(),
                    chip_type: c.chip_type.code(),
                    physical_id: c.physical_id,
                })
                .collect(),
            port_config_overrides: self
                .tap_overrides
                .iter()
                .map(override_to_table)
                .collect(),
            platform_supported_profiles: self
                .profiles
                .iter()
                .map(|(id, config)| table::SupportedProfileEntry {
                    factor: table::ProfileFactorEntry {
                        profile_id: id.as_u16(),
                    },
                    profile: table::ProfileConfigEntry {
                        speed: config.speed_mbps,
                        iphy: table::IphyConfigEntry {
                            num_lanes: config.num_lanes,
                            modulation: config.modulation,
                            fec: config.fec,
                            medium: config.medium,
                            interface_mode: config.interface_mode,
                            interface_type: config.interface_type,
                        },
                    },
                })
                .collect(),
        }
    }

    /// Return the port with the given id, if any.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    /// Return an iterator over all ports, in id order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Return the chip with the given name, if any.
    pub fn chip(&self, name: &str) -> Option<&Chip> {
        self.chips.get(name)
    }

    /// Return an iterator over all declared chips, in name order.
    pub fn chips(&self) -> impl Iterator<Item = &Chip> {
        self.chips.values()
    }

    /// Return the platform-wide electrical definition of a profile, if the
    /// platform supports it.
    pub fn profile_config(&self, id: ProfileId) -> Option<&ProfileConfig> {
        self.profiles.get(&id)
    }

    /// Return an iterator over all platform-supported profiles.
    pub fn profiles(
        &self,
    ) -> impl Iterator<Item = (ProfileId, &ProfileConfig)> {
        self.profiles.iter().map(|(id, config)| (*id, config))
    }

    /// Return the TX-equalization overrides, in table order.
    pub fn tap_overrides(&self) -> &[TapOverride] {
        &self.tap_overrides
    }

    /// Look up a port by its front-panel name.
    pub fn port_id_by_name(&self, name: &str) -> Option<PortId> {
        self.ports.values().find(|p| p.name == name).map(|p| p.id)
    }

    /// Return the ASIC core a port's wiring lands on.
    pub fn port_iphy_chip(&self, id: PortId) -> Result<&Chip, ResolveError> {
        let port =
            self.ports.get(&id).ok_or(ResolveError::NoSuchPort(id))?;
        let pin = port
            .pins
            .first()
            .ok_or(ResolveError::NoWiring(id))?;
        self.chips
            .get(&pin.a.chip)
            .ok_or_else(|| ResolveError::NoWiring(id))
    }

    /// Return the highest speed any of a port's supported profiles reaches,
    /// in Mb/s.
    pub fn port_max_speed(&self, id: PortId) -> Result<u32, ResolveError> {
        let port =
            self.ports.get(&id).ok_or(ResolveError::NoSuchPort(id))?;
        Ok(port
            .supported_profiles
            .keys()
            .filter_map(|profile| self.profiles.get(profile))
            .map(|config| config.speed_mbps)
            .max()
            .unwrap_or(0))
    }

    /// Return the PIM slot a port's name places it in.
    pub fn pim_id(&self, id: PortId) -> Result<u8, ResolveError> {
        let port =
            self.ports.get(&id).ok_or(ResolveError::NoSuchPort(id))?;
        let name: PortName = port.name.parse().map_err(|_| {
            ResolveError::UnparseablePortName {
                port: id,
                name: port.name.clone(),
            }
        })?;
        Ok(name.pim)
    }
}

fn resolve_pin(
    port: PortId,
    pin: &table::PinEntry,
    chips: &BTreeMap<String, Chip>,
) -> Result<Pin, ParseError> {
    if !chips.contains_key(&pin.chip) {
        return Err(ParseError::DanglingReference {
            port,
            chip: pin.chip.clone(),
        });
    }
    Ok(Pin { chip: pin.chip.clone(), lane: pin.lane })
}

fn build_port(
    id: PortId,
    entry: &table::PortTableEntry,
    chips: &BTreeMap<String, Chip>,
) -> Result<Port, ParseError> {
    let port_type = PortType::from_code(entry.mapping.port_type).ok_or(
        ParseError::UnknownPortType { port: id, code: entry.mapping.port_type },
    )?;

    let mut pins = Vec::with_capacity(entry.mapping.pins.len());
    for conn in &entry.mapping.pins {
        pins.push(PinConnection {
            a: resolve_pin(id, &conn.a, chips)?,
            z: conn
                .z
                .as_ref()
                .map(|z| resolve_pin(id, &z.end, chips))
                .transpose()?,
        });
    }

    let mut supported_profiles = BTreeMap::new();
    for (key, profile) in &entry.supported_profiles {
        let profile_id = key.parse::<u16>().map(ProfileId).map_err(|_| {
            ParseError::BadProfileKey { port: id, key: key.clone() }
        })?;
        let iphy_pins = profile
            .pins
            .iphy
            .iter()
            .map(|p| resolve_pin(id, &p.id, chips))
            .collect::<Result<Vec<_>, _>>()?;
        let transceiver_pins = profile
            .pins
            .transceiver
            .iter()
            .flatten()
            .map(|p| resolve_pin(id, &p.id, chips))
            .collect::<Result<Vec<_>, _>>()?;
        supported_profiles.insert(
            profile_id,
            PortProfile {
                subsumed_ports: profile
                    .subsumed_ports
                    .iter()
                    .flatten()
                    .map(|p| PortId(*p))
                    .collect(),
                iphy_pins,
                transceiver_pins,
            },
        );
    }

    Ok(Port {
        id,
        name: entry.mapping.name.clone(),
        controlling_port: PortId(entry.mapping.controlling_port),
        pins,
        port_type,
        attached_core_id: entry.mapping.attached_core_id,
        attached_core_port_index: entry.mapping.attached_core_port_index,
        supported_profiles,
    })
}

fn build_override(
    entry: &table::ConfigOverrideEntry,
    chips: &BTreeMap<String, Chip>,
) -> Result<TapOverride, ParseError> {
    let mut lanes = Vec::with_capacity(entry.pins.iphy.len());
    for pin in &entry.pins.iphy {
        let chip = ChipRef::from_table_name(&pin.id.chip);
        if let ChipRef::Exact(name) = &chip {
            if !chips.contains_key(name) {
                return Err(ParseError::DanglingOverrideChip {
                    chip: name.clone(),
                });
            }
        }
        // An override entry without taps overrides nothing; drop it rather
        // than resolve to all-zero coefficients later.
        let Some(tx) = &pin.tx else {
            continue;
        };
        lanes.push(LaneTaps {
            chip,
            lane: pin.id.lane,
            tx: TxTaps {
                pre: tx.pre,
                pre2: tx.pre2,
                pre3: tx.pre3,
                main: tx.main,
                post: tx.post,
                post2: tx.post2,
                post3: tx.post3,
            },
        });
    }
    Ok(TapOverride {
        profiles: entry.factor.profiles.iter().map(|p| ProfileId(*p)).collect(),
        lanes,
    })
}

fn port_to_table(port: &Port) -> table::PortTableEntry {
    table::PortTableEntry {
        mapping: table::PortMappingEntry {
            id: port.id.as_u32(),
            name: port.name.clone(),
            controlling_port: port.controlling_port.as_u32(),
            pins: port
                .pins
                .iter()
                .map(|conn| table::ConnectionEntry {
                    a: pin_to_table(&conn.a),
                    z: conn.z.as_ref().map(|end| table::ZEndEntry {
                        end: pin_to_table(end),
                    }),
                })
                .collect(),
            port_type: port.port_type.code(),
            attached_core_id: port.attached_core_id,
            attached_core_port_index: port.attached_core_port_index,
        },
        supported_profiles: port
            .supported_profiles
            .iter()
            .map(|(id, profile)| {
                (id.to_string(), profile_to_table(profile))
            })
            .collect(),
    }
}

fn profile_to_table(profile: &PortProfile) -> table::ProfileTableEntry {
    table::ProfileTableEntry {
        subsumed_ports: if profile.subsumed_ports.is_empty() {
            None
        } else {
            Some(
                profile.subsumed_ports.iter().map(|p| p.as_u32()).collect(),
            )
        },
        pins: table::ProfilePinsEntry {
            iphy: profile.iphy_pins.iter().map(pin_config_to_table).collect(),
            transceiver: if profile.transceiver_pins.is_empty() {
                None
            } else {
                Some(
                    profile
                        .transceiver_pins
                        .iter()
                        .map(pin_config_to_table)
                        .collect(),
                )
            },
        },
    }
}

fn override_to_table(over: &TapOverride) -> table::ConfigOverrideEntry {
    table::ConfigOverrideEntry {
        factor: table::OverrideFactorEntry {
            profiles: over.profiles.iter().map(|p| p.as_u16()).collect(),
        },
        pins: table::ProfilePinsEntry {
            iphy: over
                .lanes
                .iter()
                .map(|lane| table::PinConfigEntry {
                    id: table::PinEntry {
                        chip: lane.chip.table_name().to_string(),
                        lane: lane.lane,
                    },
                    tx: Some(table::TxTapsEntry {
                        pre: lane.tx.pre,
                        pre2: lane.tx.pre2,
                        pre3: lane.tx.pre3,
                        main: lane.tx.main,
                        post: lane.tx.post,
                        post2: lane.tx.post2,
                        post3: lane.tx.post3,
                    }),
                })
                .collect(),
            transceiver: None,
        },
    }
}

fn pin_to_table(pin: &Pin) -> table::PinEntry {
    table::PinEntry { chip: pin.chip.clone(), lane: pin.lane }
}

fn pin_config_to_table(pin: &Pin) -> table::PinConfigEntry {
    table::PinConfigEntry { id: pin_to_table(pin), tx: None }
}
