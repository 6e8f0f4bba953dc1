// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot-delay request embedded in the application image.
//!
//! An application can ask the bootloader to wait before launching it, giving
//! a companion computer a window to push new firmware. The request is two
//! words at a board-fixed logical address: the first carries a 24-bit pattern
//! with the delay in seconds in its low byte, the second is a fixed constant.
//! Anything that does not match is ignored.

use crate::flash::FlashAccess;
use crate::hal::FlashHardware;

pub const DEFAULT_SIGNATURE1: u32 = 0x92C2_ECFF;
pub const DEFAULT_SIGNATURE2: u32 = 0xC505_7D5D;
pub const DEFAULT_MAX_DELAY_SECS: u32 = 30;

/// Bits of the first word compared against the pattern.
const PATTERN_MASK: u32 = 0xFFFF_FF00;
const DELAY_MASK: u32 = 0x0000_00FF;

/// Where and how a board accepts boot-delay requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootDelayConfig {
    /// Logical flash address of the first word.
    pub address: u32,
    /// Only the high 24 bits are compared.
    pub signature1: u32,
    pub signature2: u32,
    pub max_delay_secs: u32,
}

impl BootDelayConfig {
    /// Config using the standard signatures and 30 s cap.
    pub const fn at(address: u32) -> Self {
        Self {
            address,
            signature1: DEFAULT_SIGNATURE1,
            signature2: DEFAULT_SIGNATURE2,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }

    /// Encode a request for `delay_secs` seconds, in the layout `read`
    /// expects. An application links this crate to fill in its record.
    pub fn encode(&self, delay_secs: u8) -> BootDelayRequest {
        BootDelayRequest {
            word1: (self.signature1 & PATTERN_MASK) | delay_secs as u32,
            word2: self.signature2,
        }
    }
}

/// Raw request words as read from flash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootDelayRequest {
    pub word1: u32,
    pub word2: u32,
}

impl BootDelayRequest {
    pub fn read<F: FlashHardware>(flash: &FlashAccess<'_, F>, config: &BootDelayConfig) -> Self {
        Self {
            word1: flash.read_word(config.address),
            word2: flash.read_word(config.address.wrapping_add(4)),
        }
    }

    /// Requested delay in seconds, or `None` if the signatures do not match
    /// or the delay exceeds the configured maximum.
    pub fn delay_secs(&self, config: &BootDelayConfig) -> Option<u32> {
        if self.word2 != config.signature2 {
            return None;
        }
        if self.word1 & PATTERN_MASK != config.signature1 & PATTERN_MASK {
            return None;
        }
        let delay = self.word1 & DELAY_MASK;
        (delay <= config.max_delay_secs).then_some(delay)
    }
}
