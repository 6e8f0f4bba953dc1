// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host tool for the latchboot recovery protocol via USB CDC.
//!
//! Usage:
//!   latchboot-upload --port /dev/ttyACM0 info
//!   latchboot-upload --port /dev/ttyACM0 flash firmware.bin --boot
//!   latchboot-upload --port /dev/ttyACM0 reboot

mod cli;
mod commands;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
