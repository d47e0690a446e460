// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2025 Oxide Computer Company

//! `pmadm` loads a platform mapping table from disk, validates it, and
//! answers the questions the resolvers would be asked at runtime. Its main
//! consumer is a hardware or platform engineer iterating on a generated
//! table before it is baked into an agent build.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use slog::debug;
use slog::Drain;
use structopt::*;

use pmap::PlatformMap;

mod chip;
mod port;
mod profile;
mod resolve;
mod validate;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "pmadm",
    about = "inspects and validates switch platform mapping tables",
    version = "0.1.0"
)]
struct GlobalOpts {
    #[structopt(
        short,
        long,
        help = "path to the platform mapping JSON table"
    )]
    mapping: PathBuf,

    #[structopt(short, long, help = "log at debug level")]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    /// Check the table against the platform wiring invariants.
    Validate,
    Chip(chip::Chip),
    Port(port::Port),
    Profile(profile::Profile),
    /// Compute the programming plan for a (port, profile) request.
    Resolve(resolve::Resolve),
    /// Look up the TX equalization taps for a (chip, lane, profile) triple.
    Taps(resolve::Taps),
}

fn init_log(verbose: bool) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let level = if verbose {
        slog::Level::Debug
    } else {
        slog::Level::Info
    };
    let drain = drain.filter_level(level).fuse();
    slog::Logger::root(drain, slog::o!())
}

fn main() -> anyhow::Result<()> {
    let opts = GlobalOpts::from_args();
    let log = init_log(opts.verbose);

    let text = fs::read_to_string(&opts.mapping).with_context(|| {
        format!("failed to read {}", opts.mapping.display())
    })?;
    debug!(log, "read mapping table"; "bytes" => text.len());
    let map = PlatformMap::from_table_text(&text)
        .context("mapping table failed to load")?;
    debug!(log, "loaded mapping table";
        "ports" => map.ports().count(),
        "chips" => map.chips().count(),
    );

    match opts.cmd {
        Commands::Validate => validate::exec(&map),
        Commands::Chip(cmd) => chip::exec(&map, cmd),
        Commands::Port(cmd) => port::exec(&map, cmd),
        Commands::Profile(cmd) => profile::exec(&map, cmd),
        Commands::Resolve(cmd) => resolve::exec_resolve(&map, cmd),
        Commands::Taps(cmd) => resolve::exec_taps(&map, cmd),
    }
}
