// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! Platform mapping tables for fixed-configuration switch platforms.
//!
//! A switch platform wires the SerDes lanes of its switching ASIC to a set of
//! front-panel transceiver cages. That wiring is fixed at board layout time,
//! and the switch software needs an authoritative description of it: which
//! ASIC lanes reach which cage, which speed/FEC profiles each port can run,
//! and which sibling ports become unusable when a port is configured to run a
//! profile wide enough to claim their lanes. This crate models that
//! description -- the _platform mapping_ -- and the read-only resolvers built
//! on top of it.
//!
//! The table itself arrives as a JSON blob, typically compiled into the
//! binary as a string literal, one per platform. [`PlatformMap::from_table_text`]
//! parses it into an integer-keyed, immutable model and fails fast on
//! structural defects; [`PlatformMap::validate`] then checks the deeper
//! wiring invariants exhaustively, producing a batch report suitable for
//! handing back to the hardware team when the table itself is wrong.
//!
//! Everything downstream of load is a pure lookup. The two resolvers of
//! interest are:
//!
//! - the port-group resolver ([`PlatformMap::port_group_plan`]), which turns
//!   a `(controlling port, profile)` request into the exact set of ASIC and
//!   transceiver lanes to program, along with the sibling ports subsumed by
//!   that choice; and
//! - the TX-equalization resolver ([`PlatformMap::tx_taps`]), which looks up
//!   per-profile SerDes transmit tap overrides, with wildcard-chip matching.
//!
//! A loaded [`PlatformMap`] never changes, so it can be shared freely across
//! threads without synchronization.

mod chip;
mod group;
mod map;
mod ports;
mod table;
mod txeq;
mod validate;

pub use chip::Chip;
pub use chip::ChipRef;
pub use chip::ChipType;
pub use chip::Pin;
pub use chip::MAX_LANES_PER_CHIP;
pub use group::GroupState;
pub use group::PortGroupPlan;
pub use group::ResolveError;
pub use map::ParseError;
pub use map::PlatformMap;
pub use ports::BadPortName;
pub use ports::PinConnection;
pub use ports::Port;
pub use ports::PortId;
pub use ports::PortName;
pub use ports::PortProfile;
pub use ports::PortType;
pub use ports::ProfileConfig;
pub use ports::ProfileId;
pub use table::MappingTable;
pub use txeq::LaneTaps;
pub use txeq::TapOverride;
pub use txeq::TxTaps;
pub use validate::ValidationError;
pub use validate::ValidationErrorKind;
