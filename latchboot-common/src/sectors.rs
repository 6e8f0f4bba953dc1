// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board sector table: pure lookups over a fixed, non-uniform layout.
//!
//! Index 0 is the first sector after the reserved bootloader region. Sizes
//! are fixed when the board is built; bases are derived, never stored.

use serde::{Deserialize, Serialize};

/// One erasable flash sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SectorDescriptor {
    /// Opaque id handed to the erase hardware (sector number, flash offset, ...).
    pub sector_id: u32,
    /// Size in bytes.
    pub size: u32,
}

impl SectorDescriptor {
    pub const fn new(sector_id: u32, size: u32) -> Self {
        Self { sector_id, size }
    }
}

/// Size of logical sector `index`, or 0 if there is no such sector.
pub fn sector_size(sectors: &[SectorDescriptor], index: usize) -> u32 {
    sectors.get(index).map_or(0, |s| s.size)
}

/// Logical address of the first byte of sector `index`.
///
/// For `index >= sectors.len()` this is the end of the region.
pub fn sector_base(sectors: &[SectorDescriptor], index: usize) -> u32 {
    sectors.iter().take(index).map(|s| s.size).sum()
}

/// Total size of all sectors, i.e. the largest application that fits.
pub fn region_size(sectors: &[SectorDescriptor]) -> u32 {
    sectors.iter().map(|s| s.size).sum()
}

/// Index of the sector holding logical `address`.
pub fn sector_containing(sectors: &[SectorDescriptor], address: u32) -> Option<usize> {
    let mut base = 0u32;
    for (index, sector) in sectors.iter().enumerate() {
        if address < base + sector.size {
            return Some(index);
        }
        base += sector.size;
    }
    None
}
