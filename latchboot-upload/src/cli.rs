// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::transport::Transport;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "latchboot-upload")]
#[command(about = "Talk to a latchboot bootloader in recovery mode")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyACM0)
    #[arg(short, long)]
    pub port: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show board id and flash layout
    Info,

    /// Erase, program and verify an application image
    Flash {
        /// Raw application binary, linked for the board's load address
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Launch the application once verified
        #[arg(short, long)]
        boot: bool,
    },

    /// Erase the whole application region
    Erase,

    /// Dump the one-time-programmable region
    Otp,

    /// Print the factory unique ID
    Serial,

    /// Leave recovery and launch the installed application
    Boot,

    /// Reboot the device
    Reboot,
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let mut transport = Transport::new(&cli.port)?;

    match cli.command {
        Commands::Info => commands::info(&mut transport),
        Commands::Flash { file, boot } => commands::flash(&mut transport, &file, boot),
        Commands::Erase => commands::erase(&mut transport),
        Commands::Otp => commands::otp(&mut transport),
        Commands::Serial => commands::serial(&mut transport),
        Commands::Boot => commands::boot(&mut transport),
        Commands::Reboot => commands::reboot(&mut transport),
    }
}
