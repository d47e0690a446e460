// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

use std::io::stdout;
use std::io::Write;

use structopt::*;
use tabwriter::TabWriter;

use pmap::PlatformMap;

use crate::port::speed_label;

/// Inspect the platform-supported profiles.
#[derive(Debug, StructOpt)]
pub enum Profile {
    /// List all platform-supported profiles.
    #[structopt(visible_alias = "ls")]
    List,
}

pub fn exec(map: &PlatformMap, cmd: Profile) -> anyhow::Result<()> {
    match cmd {
        Profile::List => list(map),
    }
}

fn list(map: &PlatformMap) -> anyhow::Result<()> {
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "PROFILE\tSPEED\tLANES\tMODULATION\tFEC\tMEDIUM\tPORTS")?;
    for (id, config) in map.profiles() {
        let ports = map
            .ports()
            .filter(|port| port.supported_profiles.contains_key(&id))
            .count();
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            id,
            speed_label(config.speed_mbps),
            config.num_lanes,
            config.modulation,
            config.fec,
            config.medium,
            ports,
        )?;
    }
    tw.flush()?;
    Ok(())
}
