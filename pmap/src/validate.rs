// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Exhaustive invariant checking over a loaded platform map.
//!
//! Parsing already rejects structurally broken tables; validation covers the
//! wiring-level invariants that a syntactically fine table can still get
//! wrong, such as a profile listing four lanes where its platform definition
//! says eight. Violations are collected rather than returned at the first
//! hit: the report goes back to whoever generated the table, and a complete
//! list saves a regeneration round-trip per defect. Whether any violation is
//! fatal is the caller's policy; the recommended default is fatal, since a
//! mis-wired table silently misprograms hardware.

use std::fmt;

use crate::chip::ChipType;
use crate::chip::Pin;
use crate::chip::MAX_LANES_PER_CHIP;
use crate::map::PlatformMap;
use crate::ports::PortId;
use crate::ports::PortName;
use crate::ports::PortType;
use crate::ports::ProfileId;

/// One invariant violation found in a platform map.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    /// The port the violation was found on, if it is port-scoped.
    pub port_id: Option<PortId>,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.port_id {
            Some(port) => write!(f, "port {port}: {}", self.kind),
            None => write!(f, "platform: {}", self.kind),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("controlling port {0} does not exist")]
    UnknownControllingPort(PortId),

    #[error("profile {0} is not platform-supported")]
    UnknownProfile(ProfileId),

    #[error(
        "profile {profile} declares {expected} lanes but lists {found} iphy pins"
    )]
    LaneCountMismatch { profile: ProfileId, expected: u8, found: usize },

    #[error("profile {0} subsumes the port itself")]
    SelfSubsumed(ProfileId),

    #[error("profile {profile} subsumes nonexistent port {subsumed}")]
    UnknownSubsumedPort { profile: ProfileId, subsumed: PortId },

    #[error(
        "profile {profile} subsumes port {subsumed}, which is wired to a different group"
    )]
    SubsumedOutsideGroup { profile: ProfileId, subsumed: PortId },

    #[error("pin {pin} exceeds the chip's {max}-lane width")]
    LaneOutOfRange { pin: Pin, max: u8 },

    #[error("name \"{0}\" is not a front-panel port name")]
    BadPortName(String),

    #[error("pin {pin} references a {found} chip where {expected} is required")]
    ChipTypeMismatch { pin: Pin, expected: ChipType, found: ChipType },
}

impl PlatformMap {
    /// Check every wiring invariant, returning the complete list of
    /// violations. An empty list means the map is clean.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for port in self.ports() {
            let mut port_errors = PortErrors { port: port.id, errors: &mut errors };

            if self.port(port.controlling_port).is_none() {
                port_errors.push(ValidationErrorKind::UnknownControllingPort(
                    port.controlling_port,
                ));
            }

            if port.port_type == PortType::Interface
                && port.name.parse::<PortName>().is_err()
            {
                port_errors
                    .push(ValidationErrorKind::BadPortName(port.name.clone()));
            }

            for conn in &port.pins {
                self.check_pin(&conn.a, ChipType::Iphy, &mut port_errors);
                if let Some(z) = &conn.z {
                    self.check_pin(z, ChipType::Transceiver, &mut port_errors);
                }
            }

            for (profile_id, profile) in &port.supported_profiles {
                match self.profile_config(*profile_id) {
                    None => port_errors.push(
                        ValidationErrorKind::UnknownProfile(*profile_id),
                    ),
                    Some(config) => {
                        if usize::from(config.num_lanes)
                            != profile.iphy_pins.len()
                        {
                            port_errors.push(
                                ValidationErrorKind::LaneCountMismatch {
                                    profile: *profile_id,
                                    expected: config.num_lanes,
                                    found: profile.iphy_pins.len(),
                                },
                            );
                        }
                    }
                }

                for pin in &profile.iphy_pins {
                    self.check_pin(pin, ChipType::Iphy, &mut port_errors);
                }
                for pin in &profile.transceiver_pins {
                    self.check_pin(
                        pin,
                        ChipType::Transceiver,
                        &mut port_errors,
                    );
                }

                for subsumed in &profile.subsumed_ports {
                    if *subsumed == port.id {
                        port_errors.push(ValidationErrorKind::SelfSubsumed(
                            *profile_id,
                        ));
                        continue;
                    }
                    let Some(other) = self.port(*subsumed) else {
                        port_errors.push(
                            ValidationErrorKind::UnknownSubsumedPort {
                                profile: *profile_id,
                                subsumed: *subsumed,
                            },
                        );
                        continue;
                    };
                    // A port can only subsume siblings wired to the same
                    // ASIC core.
                    if iphy_chip(other) != iphy_chip(port) {
                        port_errors.push(
                            ValidationErrorKind::SubsumedOutsideGroup {
                                profile: *profile_id,
                                subsumed: *subsumed,
                            },
                        );
                    }
                }
            }
        }

        for over in self.tap_overrides() {
            for lane in &over.lanes {
                if lane.lane >= MAX_LANES_PER_CHIP {
                    errors.push(ValidationError {
                        port_id: None,
                        kind: ValidationErrorKind::LaneOutOfRange {
                            pin: Pin::new(lane.chip.table_name(), lane.lane),
                            max: MAX_LANES_PER_CHIP,
                        },
                    });
                }
            }
        }

        errors
    }

    fn check_pin(
        &self,
        pin: &Pin,
        expected: ChipType,
        errors: &mut PortErrors<'_>,
    ) {
        if pin.lane >= MAX_LANES_PER_CHIP {
            errors.push(ValidationErrorKind::LaneOutOfRange {
                pin: pin.clone(),
                max: MAX_LANES_PER_CHIP,
            });
        }
        // The chip exists; parsing guarantees it. Its role might still be
        // wrong.
        if let Some(chip) = self.chip(&pin.chip) {
            if chip.chip_type != expected {
                errors.push(ValidationErrorKind::ChipTypeMismatch {
                    pin: pin.clone(),
                    expected,
                    found: chip.chip_type,
                });
            }
        }
    }
}

fn iphy_chip(port: &crate::ports::Port) -> Option<&str> {
    port.pins.first().map(|conn| conn.a.chip.as_str())
}

struct PortErrors<'a> {
    port: PortId,
    errors: &'a mut Vec<ValidationError>,
}

impl PortErrors<'_> {
    fn push(&mut self, kind: ValidationErrorKind) {
        self.errors
            .push(ValidationError { port_id: Some(self.port), kind });
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationErrorKind;
    use crate::map::PlatformMap;
    use crate::ports::PortId;
    use crate::ports::ProfileId;

    fn base_table() -> String {
        r#"
        {
          "ports": {
            "1": {
              "mapping": {
                "id": 1,
                "name": "eth1/1/1",
                "controllingPort": 1,
                "pins": [
                  {
                    "a": { "chip": "BC0", "lane": 0 },
                    "z": { "end": { "chip": "eth1/1", "lane": 0 } }
                  },
                  {
                    "a": { "chip": "BC0", "lane": 1 },
                    "z": { "end": { "chip": "eth1/1", "lane": 1 } }
                  }
                ],
                "portType": 0
              },
              "supportedProfiles": {
                "24": {
                  "subsumedPorts": [2],
                  "pins": {
                    "iphy": [
                      { "id": { "chip": "BC0", "lane": 0 } },
                      { "id": { "chip": "BC0", "lane": 1 } }
                    ],
                    "transceiver": [
                      { "id": { "chip": "eth1/1", "lane": 0 } },
                      { "id": { "chip": "eth1/1", "lane": 1 } }
                    ]
                  }
                }
              }
            },
            "2": {
              "mapping": {
                "id": 2,
                "name": "eth1/1/2",
                "controllingPort": 2,
                "pins": [
                  {
                    "a": { "chip": "BC0", "lane": 1 },
                    "z": { "end": { "chip": "eth1/1", "lane": 1 } }
                  }
                ],
                "portType": 0
              },
              "supportedProfiles": {
                "23": {
                  "pins": {
                    "iphy": [ { "id": { "chip": "BC0", "lane": 1 } } ],
                    "transceiver": [
                      { "id": { "chip": "eth1/1", "lane": 1 } }
                    ]
                  }
                }
              }
            }
          },
          "chips": [
            { "name": "BC0", "type": 1, "physicalID": 0 },
            { "name": "eth1/1", "type": 3, "physicalID": 1 }
          ],
          "portConfigOverrides": [],
          "platformSupportedProfiles": [
            {
              "factor": { "profileID": 23 },
              "profile": {
                "speed": 100000,
                "iphy": {
                  "numLanes": 1,
                  "modulation": 2,
                  "fec": 11,
                  "medium": 2,
                  "interfaceMode": 3,
                  "interfaceType": 3
                }
              }
            },
            {
              "factor": { "profileID": 24 },
              "profile": {
                "speed": 200000,
                "iphy": {
                  "numLanes": 2,
                  "modulation": 2,
                  "fec": 11,
                  "medium": 2,
                  "interfaceMode": 4,
                  "interfaceType": 4
                }
              }
            }
          ]
        }
        "#
        .to_string()
    }

    fn kinds_of(text: &str) -> Vec<ValidationErrorKind> {
        PlatformMap::from_table_text(text)
            .unwrap()
            .validate()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_clean_table() {
        assert_eq!(kinds_of(&base_table()), vec![]);
    }

    #[test]
    fn test_unknown_controlling_port() {
        let text =
            base_table().replace(r#""controllingPort": 2,"#, r#""controllingPort": 9,"#);
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::UnknownControllingPort(PortId(9))]
        );
    }

    #[test]
    fn test_lane_count_mismatch() {
        let text = base_table().replace(r#""numLanes": 2,"#, r#""numLanes": 4,"#);
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::LaneCountMismatch {
                profile: ProfileId(24),
                expected: 4,
                found: 2,
            }]
        );
    }

    #[test]
    fn test_unknown_profile() {
        let text = base_table().replace(
            r#""factor": { "profileID": 23 },"#,
            r#""factor": { "profileID": 29 },"#,
        );
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::UnknownProfile(ProfileId(23))]
        );
    }

    #[test]
    fn test_self_subsumed() {
        let text =
            base_table().replace(r#""subsumedPorts": [2],"#, r#""subsumedPorts": [1],"#);
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::SelfSubsumed(ProfileId(24))]
        );
    }

    #[test]
    fn test_unknown_subsumed_port() {
        let text =
            base_table().replace(r#""subsumedPorts": [2],"#, r#""subsumedPorts": [7],"#);
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::UnknownSubsumedPort {
                profile: ProfileId(24),
                subsumed: PortId(7),
            }]
        );
    }

    #[test]
    fn test_subsumed_outside_group() {
        // Rewire the shared lane onto a second ASIC core. Port 1 still
        // claims to subsume port 2, but port 2's wiring now lands on BC1.
        let text = base_table()
            .replace(
                r#""chip": "BC0", "lane": 1"#,
                r#""chip": "BC1", "lane": 1"#,
            )
            .replace(
                r#"{ "name": "BC0", "type": 1, "physicalID": 0 },"#,
                r#"{ "name": "BC0", "type": 1, "physicalID": 0 },
            { "name": "BC1", "type": 1, "physicalID": 4 },"#,
            );
        assert_eq!(
            kinds_of(&text),
            vec![ValidationErrorKind::SubsumedOutsideGroup {
                profile: ProfileId(24),
                subsumed: PortId(2),
            }]
        );
    }

    #[test]
    fn test_lane_out_of_range() {
        let text = base_table().replace(
            r#""iphy": [ { "id": { "chip": "BC0", "lane": 1 } } ],"#,
            r#""iphy": [ { "id": { "chip": "BC0", "lane": 8 } } ],"#,
        );
        let kinds = kinds_of(&text);
        assert_eq!(kinds.len(), 1);
        assert!(matches!(
            kinds[0],
            ValidationErrorKind::LaneOutOfRange { max: 8, .. }
        ));
    }

    #[test]
    fn test_chip_type_mismatch() {
        // Swapping the cage's type code makes every z-side and transceiver
        // pin land on a non-transceiver chip.
        let text = base_table().replace(
            r#"{ "name": "eth1/1", "type": 3, "physicalID": 1 }"#,
            r#"{ "name": "eth1/1", "type": 1, "physicalID": 1 }"#,
        );
        let kinds = kinds_of(&text);
        assert!(!kinds.is_empty());
        assert!(kinds.iter().all(|k| matches!(
            k,
            ValidationErrorKind::ChipTypeMismatch { .. }
        )));
    }
}
