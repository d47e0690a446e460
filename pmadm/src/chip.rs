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

/// Inspect the chips declared by the mapping.
#[derive(Debug, StructOpt)]
pub enum Chip {
    /// List all declared chips.
    #[structopt(visible_alias = "ls")]
    List,
}

pub fn exec(map: &PlatformMap, cmd: Chip) -> anyhow::Result<()> {
    match cmd {
        Chip::List => list(map),
    }
}

fn list(map: &PlatformMap) -> anyhow::Result<()> {
    let mut tw = TabWriter::new(stdout());
    writeln!(tw, "NAME\tTYPE\tPHYSICAL ID")?;
    for chip in map.chips() {
        writeln!(tw, "{}\t{}\t{}", chip.name, chip.chip_type, chip.physical_id)?;
    }
    tw.flush()?;
    Ok(())
}
