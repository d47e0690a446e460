// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! End-to-end tests over a representative mapping table: one 8-lane cage
//! (`eth1/2`) wired straight through to ASIC core `BC0`, with an 800G
//! whole-cage profile (39), a 4-lane 200G profile (25), and a single-lane
//! 100G profile (42).

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use pmap::GroupState;
use pmap::Pin;
use pmap::PlatformMap;
use pmap::PortId;
use pmap::ProfileId;
use pmap::ResolveError;
use pmap::TxTaps;

const TABLE: &str = include_str!("testdata/eight_lane_group.json");

fn load() -> PlatformMap {
    PlatformMap::from_table_text(TABLE).expect("fixture table loads")
}

fn bc0(lanes: impl IntoIterator<Item = u8>) -> Vec<Pin> {
    lanes.into_iter().map(|l| Pin::new("BC0", l)).collect()
}

fn cage(lanes: impl IntoIterator<Item = u8>) -> Vec<Pin> {
    lanes.into_iter().map(|l| Pin::new("eth1/2", l)).collect()
}

fn port_set(ids: impl IntoIterator<Item = u32>) -> BTreeSet<PortId> {
    ids.into_iter().map(PortId).collect()
}

#[test]
fn fixture_is_valid() {
    let errors = load().validate();
    assert_eq!(errors, vec![]);
}

#[test]
fn single_lane_profile_subsumes_nothing() {
    let map = load();
    let plan = map.port_group_plan(PortId(1), ProfileId(42)).unwrap();
    assert_eq!(plan.active_iphy_pins, bc0([0]));
    assert_eq!(plan.active_transceiver_pins, cage([0]));
    assert_eq!(plan.disabled_ports, BTreeSet::new());
}

#[test]
fn whole_cage_profile_subsumes_group() {
    let map = load();
    let plan = map.port_group_plan(PortId(1), ProfileId(39)).unwrap();
    assert_eq!(plan.active_iphy_pins, bc0(0..8));
    assert_eq!(plan.active_transceiver_pins, cage(0..8));
    assert_eq!(plan.disabled_ports, port_set(2..=8));
}

#[test]
fn four_lane_profile_subsumes_half_group() {
    let map = load();
    let plan = map.port_group_plan(PortId(1), ProfileId(25)).unwrap();
    assert_eq!(plan.active_iphy_pins, bc0(0..4));
    assert_eq!(plan.disabled_ports, port_set([2, 3, 4]));
}

#[test]
fn sibling_rejected_while_whole_cage_active() {
    let map = load();
    let mut state = GroupState::new();
    state.activate(&map, PortId(1), ProfileId(39)).unwrap();
    assert_eq!(
        state.activate(&map, PortId(2), ProfileId(42)).unwrap_err(),
        ResolveError::PortSubsumed { port: PortId(2), by: PortId(1) },
    );
}

#[test]
fn independent_half_groups_coexist() {
    let map = load();
    let mut state = GroupState::new();
    // Lanes 0-3 on port 1, lanes 4-7 on port 5: disjoint claims.
    state.activate(&map, PortId(1), ProfileId(25)).unwrap();
    state.activate(&map, PortId(5), ProfileId(25)).unwrap();
    assert_eq!(state.active_plans().count(), 2);
    // Port 6 is claimed by port 5's half of the cage.
    assert_eq!(state.subsumed_by(PortId(6)), Some(PortId(5)));
    assert_eq!(state.subsumed_by(PortId(5)), None);
}

#[test]
fn plan_resolution_is_idempotent() {
    let map = load();
    for profile in [25, 39, 42] {
        let a = map.port_group_plan(PortId(1), ProfileId(profile)).unwrap();
        let b = map.port_group_plan(PortId(1), ProfileId(profile)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn tap_lookup_single_lane_profile() {
    let map = load();
    assert_eq!(
        map.tx_taps("BC0", 0, ProfileId(42)),
        Some(TxTaps {
            pre: -36,
            pre2: 14,
            pre3: -4,
            main: 112,
            post: 0,
            post2: 0,
            post3: 0,
        })
    );
}

#[test]
fn tap_lookup_falls_back_to_shared_lane_zero() {
    let map = load();
    // Port 4 runs profile 42 on BC0 lane 3; the override only defines the
    // shared lane-0 wildcard entry, which applies to whichever lane the
    // port lands on.
    assert_eq!(
        map.tx_taps("BC0", 3, ProfileId(42)),
        map.tx_taps("BC0", 0, ProfileId(42)),
    );
}

#[test]
fn tap_lookup_per_lane_entries() {
    let map = load();
    for lane in 0..8 {
        let taps = map.tx_taps("BC0", lane, ProfileId(39)).unwrap();
        assert_eq!(taps.main, 140);
        assert_eq!(taps.pre, -24);
    }
}

#[test]
fn tap_lookup_without_override() {
    let map = load();
    // Profile 99 has no override entry; vendor defaults apply.
    assert_eq!(map.tx_taps("BC0", 0, ProfileId(99)), None);
}

#[test]
fn table_round_trips_through_wire_format() {
    let map = load();
    let text = map.to_table().to_text();
    let again = PlatformMap::from_table_text(&text).unwrap();
    assert_eq!(again.validate(), vec![]);
    for profile in [25, 39, 42] {
        assert_eq!(
            map.port_group_plan(PortId(1), ProfileId(profile)).unwrap(),
            again.port_group_plan(PortId(1), ProfileId(profile)).unwrap(),
        );
    }
    assert_eq!(
        map.tx_taps("BC0", 0, ProfileId(42)),
        again.tx_taps("BC0", 0, ProfileId(42)),
    );
}

#[test]
fn name_and_speed_lookups() {
    let map = load();
    assert_eq!(map.port_id_by_name("eth1/2/5"), Some(PortId(5)));
    assert_eq!(map.port_max_speed(PortId(1)).unwrap(), 800_000);
    assert_eq!(map.port_max_speed(PortId(2)).unwrap(), 100_000);
    assert_eq!(map.pim_id(PortId(8)).unwrap(), 1);
}
