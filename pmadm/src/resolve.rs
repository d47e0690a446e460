// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

use std::io::stdout;
use std::io::Write;

use anyhow::Context;
use structopt::*;
use tabwriter::TabWriter;

use pmap::PlatformMap;
use pmap::PortId;
use pmap::ProfileId;

#[derive(Debug, StructOpt)]
pub struct Resolve {
    /// The controlling port of the group.
    port: PortId,
    /// The profile to resolve for.
    profile: ProfileId,
}

#[derive(Debug, StructOpt)]
pub struct Taps {
    /// The ASIC core, e.g. BC0.
    chip: String,
    /// The 0-based lane within the chip.
    lane: u8,
    /// The profile the lane runs.
    profile: ProfileId,
}

pub fn exec_resolve(map: &PlatformMap, cmd: Resolve) -> anyhow::Result<()> {
    let plan = map
        .port_group_plan(cmd.port, cmd.profile)
        .context("request rejected")?;

    println!("port {} profile {}:", plan.active_port, plan.profile);
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "  LANE\tASIC\tTRANSCEIVER")?;
    for (index, pin) in plan.active_iphy_pins.iter().enumerate() {
        let z = plan
            .active_transceiver_pins
            .get(index)
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        writeln!(tw, "  {index}\t{pin}\t{z}")?;
    }
    tw.flush()?;

    if plan.disabled_ports.is_empty() {
        println!("subsumes: none");
    } else {
        println!(
            "subsumes: {}",
            plan.disabled_ports
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    Ok(())
}

pub fn exec_taps(map: &PlatformMap, cmd: Taps) -> anyhow::Result<()> {
    match map.tx_taps(&cmd.chip, cmd.lane, cmd.profile) {
        Some(taps) => {
            println!(
                "{}:{} profile {}: pre={} pre2={} pre3={} main={} post={} post2={} post3={}",
                cmd.chip,
                cmd.lane,
                cmd.profile,
                taps.pre,
                taps.pre2,
                taps.pre3,
                taps.main,
                taps.post,
                taps.post2,
                taps.post3,
            );
        }
        None => {
            println!(
                "{}:{} profile {}: no override, vendor default taps apply",
                cmd.chip, cmd.lane, cmd.profile,
            );
        }
    }
    Ok(())
}
