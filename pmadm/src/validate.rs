// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

use anyhow::bail;
use colored::*;

use pmap::PlatformMap;

pub fn exec(map: &PlatformMap) -> anyhow::Result<()> {
    let errors = map.validate();
    if errors.is_empty() {
        println!(
            "{}: {} ports, {} chips, {} profiles",
            "table is clean".green(),
            map.ports().count(),
            map.chips().count(),
            map.profiles().count(),
        );
        return Ok(());
    }

    for error in &errors {
        println!("{}: {error}", "error".red());
    }
    bail!("table failed validation with {} error(s)", errors.len());
}
