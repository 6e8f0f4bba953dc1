// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Recovery command protocol between the bootloader and a host.
//!
//! Frames are postcard-serialised and COBS-framed. Every command gets exactly
//! one response. This module provides types that work in both `no_std`
//! (embedded) and `std` (host) environments.

#[cfg(feature = "std")]
extern crate alloc;

use serde::{Deserialize, Serialize};

/// Maximum words carried by one `ProgramWords` command.
pub const MAX_PROGRAM_WORDS: usize = 256;

/// Largest encoded frame, with room for COBS overhead.
pub const MAX_FRAME_SIZE: usize = 2048;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetInfo,
    GetSectorSize {
        sector: u32,
    },
    EraseSector {
        sector: u32,
    },
    #[cfg(not(feature = "std"))]
    ProgramWords {
        address: u32,
        words: heapless::Vec<u32, MAX_PROGRAM_WORDS>,
    },
    #[cfg(feature = "std")]
    ProgramWords {
        address: u32,
        words: alloc::vec::Vec<u32>,
    },
    ReadWord {
        address: u32,
    },
    ReadOtp {
        offset: u32,
    },
    ReadUniqueId {
        offset: u32,
    },
    /// CRC-32 (ISO HDLC) over `length` bytes from logical `address`.
    Crc {
        address: u32,
        length: u32,
    },
    /// Leave recovery and try to launch the application.
    Boot,
    Reboot,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ack(AckStatus),
    Info {
        board_id: u32,
        sector_count: u32,
        app_size_max: u32,
    },
    Word(u32),
    Crc(u32),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStatus {
    Ok,
    /// Erase skipped because the sector was already blank.
    AlreadyBlank,
    BadSector,
    BadAddress,
    BadCommand,
}
