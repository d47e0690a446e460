// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

use std::io::stdout;
use std::io::Write;

use anyhow::anyhow;
use structopt::*;
use tabwriter::TabWriter;

use pmap::PlatformMap;
use pmap::PortId;

/// Inspect the logical ports in the mapping.
#[derive(Debug, StructOpt)]
pub enum Port {
    /// List all ports.
    #[structopt(visible_alias = "ls")]
    List,
    /// Show one port's wiring and supported profiles.
    Get {
        /// The port id, or a front-panel name such as eth1/2/1.
        port: String,
    },
}

pub fn exec(map: &PlatformMap, cmd: Port) -> anyhow::Result<()> {
    match cmd {
        Port::List => list(map),
        Port::Get { port } => get(map, &port),
    }
}

fn list(map: &PlatformMap) -> anyhow::Result<()> {
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "ID\tNAME\tTYPE\tCONTROLLING\tLANES\tMAX SPEED\tPROFILES")?;
    for port in map.ports() {
        let profiles = port
            .supported_profiles
            .keys()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            port.id,
            port.name,
            port.port_type,
            port.controlling_port,
            port.pins.len(),
            speed_label(map.port_max_speed(port.id).unwrap_or(0)),
            profiles,
        )?;
    }
    tw.flush()?;
    Ok(())
}

fn get(map: &PlatformMap, port: &str) -> anyhow::Result<()> {
    let id = match port.parse::<PortId>() {
        Ok(id) => id,
        Err(_) => map
            .port_id_by_name(port)
            .ok_or_else(|| anyhow!("no port named \"{port}\""))?,
    };
    let port =
        map.port(id).ok_or_else(|| anyhow!("no port with id {id}"))?;

    println!("port {} ({})", port.id, port.name);
    println!("type: {}", port.port_type);
    println!("controlling port: {}", port.controlling_port);

    println!("wiring:");
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "  ASIC\tTRANSCEIVER")?;
    for conn in &port.pins {
        let z = conn
            .z
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        writeln!(tw, "  {}\t{}", conn.a, z)?;
    }
    tw.flush()?;

    println!("profiles:");
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "  PROFILE\tSPEED\tIPHY LANES\tSUBSUMES")?;
    for (profile_id, profile) in &port.supported_profiles {
        let speed = map
            .profile_config(*profile_id)
            .map(|config| speed_label(config.speed_mbps))
            .unwrap_or_else(|| "?".to_string());
        let subsumes = if profile.subsumed_ports.is_empty() {
            "-".to_string()
        } else {
            profile
                .subsumed_ports
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        writeln!(
            tw,
            "  {}\t{}\t{}\t{}",
            profile_id,
            speed,
            profile.iphy_pins.len(),
            subsumes,
        )?;
    }
    tw.flush()?;
    Ok(())
}

pub fn speed_label(mbps: u32) -> String {
    if mbps == 0 {
        "-".to_string()
    } else if mbps % 1000 == 0 {
        format!("{}G", mbps / 1000)
    } else {
        format!("{mbps}M")
    }
}
