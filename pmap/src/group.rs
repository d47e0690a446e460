// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Resolving `(port, profile)` requests into hardware programming plans.
//!
//! Ports that share a transceiver cage form a ganged group, addressed
//! through its _controlling_ port. Configuring the controlling port with a
//! wide profile claims lanes its siblings would otherwise use; those
//! siblings are _subsumed_ and cannot be enabled until the wide
//! configuration is torn down. [`PlatformMap::port_group_plan`] computes the
//! plan for one request as a pure lookup; [`GroupState`] layers the
//! one-active-member-per-group rule on top for callers that apply plans to
//! live hardware.
//!
//! Every failure here is a rejected request, not a crash: an operator asking
//! for an 8-lane profile on a 4-lane port is an expected runtime condition.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::chip::Pin;
use crate::map::PlatformMap;
use crate::ports::PortId;
use crate::ports::ProfileId;

/// Why a resolution request was rejected.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("port {0} does not exist")]
    NoSuchPort(PortId),

    #[error("port {port} is controlled by port {controlling}, address the group through it")]
    NotAControllingPort { port: PortId, controlling: PortId },

    #[error("port {port} has no wiring for profile {profile}")]
    UnsupportedProfile { port: PortId, profile: ProfileId },

    #[error("port {port} is subsumed by the active configuration of port {by}")]
    PortSubsumed { port: PortId, by: PortId },

    #[error(
        "activating port {port} would subsume port {active}, which is active"
    )]
    SubsumesActivePort { port: PortId, active: PortId },

    #[error("port {0} has no usable wiring")]
    NoWiring(PortId),

    #[error("port {port} has unparseable name \"{name}\"")]
    UnparseablePortName { port: PortId, name: String },
}

/// The full hardware programming directive for one port-group request.
#[derive(
    Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize,
)]
pub struct PortGroupPlan {
    /// The port the request addressed.
    pub active_port: PortId,
    /// The profile the plan was resolved for.
    pub profile: ProfileId,
    /// The ASIC lanes to program, in logical lane order.
    pub active_iphy_pins: Vec<Pin>,
    /// The transceiver lanes to program, in logical lane order.
    pub active_transceiver_pins: Vec<Pin>,
    /// Sibling ports that must be disabled while this plan is active.
    pub disabled_ports: BTreeSet<PortId>,
}

impl PlatformMap {
    /// Compute the programming plan for running `profile` on the group led
    /// by `port`.
    ///
    /// This is a pure function of the mapping: the same request always
    /// yields the same plan, and nothing is recorded. Whether the group is
    /// free to be reconfigured is [`GroupState`]'s business.
    pub fn port_group_plan(
        &self,
        port: PortId,
        profile: ProfileId,
    ) -> Result<PortGroupPlan, ResolveError> {
        let entry =
            self.port(port).ok_or(ResolveError::NoSuchPort(port))?;
        if !entry.is_controlling() {
            return Err(ResolveError::NotAControllingPort {
                port,
                controlling: entry.controlling_port,
            });
        }
        let config = entry
            .supported_profiles
            .get(&profile)
            .ok_or(ResolveError::UnsupportedProfile { port, profile })?;
        Ok(PortGroupPlan {
            active_port: port,
            profile,
            active_iphy_pins: config.iphy_pins.clone(),
            active_transceiver_pins: config.transceiver_pins.clone(),
            disabled_ports: config.subsumed_ports.iter().copied().collect(),
        })
    }
}

/// Tracks which member of each port group is active, enforcing the
/// one-active-member rule.
///
/// The tracker holds no reference to the [`PlatformMap`]; callers pass it to
/// [`GroupState::activate`], which keeps the map freely shareable and the
/// tracker cheap to own wherever the caller serializes reconfiguration.
#[derive(Clone, Debug, Default)]
pub struct GroupState {
    active: BTreeMap<PortId, PortGroupPlan>,
}

impl GroupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `profile` on the group led by `port`, recording the
    /// resolved plan.
    ///
    /// Re-activating a port that is already active replaces its plan, so a
    /// speed change on a group needs no explicit deactivation. The request
    /// is rejected with [`ResolveError::PortSubsumed`] if `port` is disabled
    /// by a sibling's active plan, and with
    /// [`ResolveError::SubsumesActivePort`] if the new plan would disable a
    /// sibling that is itself active.
    pub fn activate(
        &mut self,
        map: &PlatformMap,
        port: PortId,
        profile: ProfileId,
    ) -> Result<PortGroupPlan, ResolveError> {
        if let Some(by) = self.subsumed_by(port) {
            return Err(ResolveError::PortSubsumed { port, by });
        }
        let plan = map.port_group_plan(port, profile)?;
        if let Some(active) = self
            .active
            .keys()
            .find(|active| **active != port && plan.disabled_ports.contains(*active))
        {
            return Err(ResolveError::SubsumesActivePort {
                port,
                active: *active,
            });
        }
        self.active.insert(port, plan.clone());
        Ok(plan)
    }

    /// Tear down the active plan on the group led by `port`, returning it
    /// if there was one.
    pub fn deactivate(&mut self, port: PortId) -> Option<PortGroupPlan> {
        self.active.remove(&port)
    }

    /// The active plan for the group led by `port`, if any.
    pub fn active_plan(&self, port: PortId) -> Option<&PortGroupPlan> {
        self.active.get(&port)
    }

    /// If `port` is disabled by some sibling's active plan, return that
    /// sibling.
    pub fn subsumed_by(&self, port: PortId) -> Option<PortId> {
        self.active
            .iter()
            .find(|(owner, plan)| {
                **owner != port && plan.disabled_ports.contains(&port)
            })
            .map(|(owner, _)| *owner)
    }

    /// Iterate over the active plans, in port order.
    pub fn active_plans(
        &self,
    ) -> impl Iterator<Item = (PortId, &PortGroupPlan)> {
        self.active.iter().map(|(port, plan)| (*port, plan))
    }
}

#[cfg(test)]
mod tests {
    use super::GroupState;
    use super::ResolveError;
    use crate::map::PlatformMap;
    use crate::ports::PortId;
    use crate::ports::ProfileId;

    // Two ports ganged on BC2: port 1 can run both lanes (profile 24,
    // subsuming port 2) or one lane (profile 23); port 2 runs lane 1 only.
    fn two_port_group() -> PlatformMap {
        PlatformMap::from_table_text(
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
                        "a": { "chip": "BC2", "lane": 0 },
                        "z": { "end": { "chip": "eth1/1", "lane": 0 } }
                      },
                      {
                        "a": { "chip": "BC2", "lane": 1 },
                        "z": { "end": { "chip": "eth1/1", "lane": 1 } }
                      }
                    ],
                    "portType": 0
                  },
                  "supportedProfiles": {
                    "23": {
                      "pins": {
                        "iphy": [ { "id": { "chip": "BC2", "lane": 0 } } ],
                        "transceiver": [
                          { "id": { "chip": "eth1/1", "lane": 0 } }
                        ]
                      }
                    },
                    "24": {
                      "subsumedPorts": [2],
                      "pins": {
                        "iphy": [
                          { "id": { "chip": "BC2", "lane": 0 } },
                          { "id": { "chip": "BC2", "lane": 1 } }
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
                        "a": { "chip": "BC2", "lane": 1 },
                        "z": { "end": { "chip": "eth1/1", "lane": 1 } }
                      }
                    ],
                    "portType": 0
                  },
                  "supportedProfiles": {
                    "23": {
                      "pins": {
                        "iphy": [ { "id": { "chip": "BC2", "lane": 1 } } ],
                        "transceiver": [
                          { "id": { "chip": "eth1/1", "lane": 1 } }
                        ]
                      }
                    }
                  }
                }
              },
              "chips": [
                { "name": "BC2", "type": 1, "physicalID": 2 },
                { "name": "eth1/1", "type": 3, "physicalID": 8 }
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
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_is_pure() {
        let map = two_port_group();
        let a = map.port_group_plan(PortId(1), ProfileId(24)).unwrap();
        let b = map.port_group_plan(PortId(1), ProfileId(24)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.active_iphy_pins.len(), 2);
        assert_eq!(a.disabled_ports.len(), 1);
    }

    #[test]
    fn test_unsupported_profile() {
        let map = two_port_group();
        assert_eq!(
            map.port_group_plan(PortId(2), ProfileId(24)),
            Err(ResolveError::UnsupportedProfile {
                port: PortId(2),
                profile: ProfileId(24),
            })
        );
    }

    #[test]
    fn test_no_such_port() {
        let map = two_port_group();
        assert_eq!(
            map.port_group_plan(PortId(5), ProfileId(23)),
            Err(ResolveError::NoSuchPort(PortId(5)))
        );
    }

    #[test]
    fn test_subsumed_rejected_while_wide_profile_active() {
        let map = two_port_group();
        let mut state = GroupState::new();
        state.activate(&map, PortId(1), ProfileId(24)).unwrap();
        assert_eq!(
            state.activate(&map, PortId(2), ProfileId(23)).unwrap_err(),
            ResolveError::PortSubsumed { port: PortId(2), by: PortId(1) },
        );
        assert_eq!(state.subsumed_by(PortId(2)), Some(PortId(1)));

        // Tearing the wide profile down frees the sibling.
        state.deactivate(PortId(1)).unwrap();
        state.activate(&map, PortId(2), ProfileId(23)).unwrap();
    }

    #[test]
    fn test_widening_over_active_sibling_rejected() {
        let map = two_port_group();
        let mut state = GroupState::new();
        state.activate(&map, PortId(2), ProfileId(23)).unwrap();
        assert_eq!(
            state.activate(&map, PortId(1), ProfileId(24)).unwrap_err(),
            ResolveError::SubsumesActivePort {
                port: PortId(1),
                active: PortId(2),
            },
        );
        // The narrow profile on port 1 leaves port 2's lane alone.
        state.activate(&map, PortId(1), ProfileId(23)).unwrap();
    }

    #[test]
    fn test_reactivate_replaces_plan() {
        let map = two_port_group();
        let mut state = GroupState::new();
        state.activate(&map, PortId(1), ProfileId(23)).unwrap();
        let plan = state.activate(&map, PortId(1), ProfileId(24)).unwrap();
        assert_eq!(plan.profile, ProfileId(24));
        assert_eq!(state.active_plans().count(), 1);
    }
}
