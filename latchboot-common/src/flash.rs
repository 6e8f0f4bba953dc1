// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash access for the application region, OTP and unique-ID reads.
//!
//! This module provides the operations recovery mode uses to install an image:
//! - Erase a logical sector (skipped when it already reads blank)
//! - Program and read single words at logical addresses
//! - Read the one-time-programmable and factory unique-ID regions
//!
//! Logical address 0 is the first byte of sector 0; the physical address is
//! `load_address + logical`. Invalid input never faults: reads return 0,
//! writes and erases become no-ops.

use crate::hal::FlashHardware;
use crate::sectors::{self, SectorDescriptor};

/// Value of a word in erased NOR flash.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Access width of every operation in this module.
pub const WORD_SIZE: u32 = 4;

/// Size of the one-time-programmable region.
pub const OTP_SIZE: u32 = 512;

/// Board flash description.
#[derive(Clone, Copy, Debug)]
pub struct FlashLayout<'a> {
    /// Application sectors, in address order.
    pub sectors: &'a [SectorDescriptor],
    /// Physical address of logical address 0.
    pub load_address: u32,
    /// Physical base of the OTP region (`OTP_SIZE` bytes).
    pub otp_base: u32,
    /// Physical base of the factory unique-ID words.
    pub unique_id_base: u32,
}

impl FlashLayout<'_> {
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Returns 0 when `index` is past the end of the table.
    pub fn sector_size(&self, index: usize) -> u32 {
        sectors::sector_size(self.sectors, index)
    }

    pub fn sector_base(&self, index: usize) -> u32 {
        sectors::sector_base(self.sectors, index)
    }

    /// Largest image the region can hold.
    pub fn app_size_max(&self) -> u32 {
        sectors::region_size(self.sectors)
    }

    /// Whether `[address, address + width)` lies inside the application region.
    pub fn contains(&self, address: u32, width: u32) -> bool {
        address
            .checked_add(width)
            .is_some_and(|end| end <= self.app_size_max())
    }
}

/// What `erase` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseOutcome {
    /// The sector held data and was erased.
    Erased,
    /// Every word already read as erased; the hardware was not touched.
    AlreadyBlank,
    /// Index past the end of the table; nothing happened.
    NoSuchSector,
}

/// Word-level flash operations over a board layout.
pub struct FlashAccess<'a, H> {
    layout: FlashLayout<'a>,
    hw: H,
}

impl<'a, H: FlashHardware> FlashAccess<'a, H> {
    pub fn new(layout: FlashLayout<'a>, hw: H) -> Self {
        Self { layout, hw }
    }

    pub fn layout(&self) -> &FlashLayout<'a> {
        &self.layout
    }

    /// See [`FlashLayout::sector_size`].
    pub fn sector_size(&self, index: usize) -> u32 {
        self.layout.sector_size(index)
    }

    /// Erase logical sector `index` unless it already reads blank.
    ///
    /// Calling this repeatedly is safe: once a sector is blank, further calls
    /// only read it.
    pub fn erase(&mut self, index: usize) -> EraseOutcome {
        let Some(sector) = self.layout.sectors.get(index).copied() else {
            return EraseOutcome::NoSuchSector;
        };

        let base = self.layout.sector_base(index);
        if self.is_blank(base, sector.size) {
            debug!("sector {=usize} already blank", index);
            return EraseOutcome::AlreadyBlank;
        }

        self.hw.erase_sector(&sector);
        debug!("sector {=usize} erased", index);
        EraseOutcome::Erased
    }

    /// Program one word at a logical address. The word must be erased first.
    ///
    /// Returns false, without writing, if the address is misaligned or the
    /// word would fall outside the application region.
    pub fn program_word(&mut self, address: u32, value: u32) -> bool {
        if address % WORD_SIZE != 0 || !self.layout.contains(address, WORD_SIZE) {
            return false;
        }
        self.hw.program_word(self.layout.load_address + address, value);
        true
    }

    /// Read one word at a logical address.
    ///
    /// Returns 0 for misaligned or out-of-region addresses without touching
    /// memory.
    pub fn read_word(&self, address: u32) -> u32 {
        if address % WORD_SIZE != 0 || !self.layout.contains(address, WORD_SIZE) {
            return 0;
        }
        self.hw.read_word(self.layout.load_address + address)
    }

    /// Read one word of the OTP region. Returns 0 for misaligned offsets and
    /// offsets whose word would extend past the region.
    pub fn read_otp(&self, offset: u32) -> u32 {
        if offset % WORD_SIZE != 0 || offset > OTP_SIZE - WORD_SIZE {
            return 0;
        }
        self.hw.read_word(self.layout.otp_base + offset)
    }

    /// Read one word of the factory unique ID. Returns 0 for misaligned
    /// offsets; there is no upper bound.
    pub fn read_unique_id(&self, offset: u32) -> u32 {
        if offset % WORD_SIZE != 0 {
            return 0;
        }
        self.hw.read_word(self.layout.unique_id_base.wrapping_add(offset))
    }

    fn is_blank(&self, base: u32, size: u32) -> bool {
        (0..size)
            .step_by(WORD_SIZE as usize)
            .all(|offset| self.read_word(base + offset) == ERASED_WORD)
    }
}
