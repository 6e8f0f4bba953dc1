// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware collaborator traits.
//!
//! The board crate implements these on real peripherals; tests implement them
//! with simulated register banks. All methods are synchronous and must not
//! block for longer than a single register access, except where noted.

use crate::flash::FlashAccess;
use crate::sectors::SectorDescriptor;

/// Reset-surviving register domain (backup registers, watchdog scratch, ...).
///
/// The domain is write-protected in normal operation; callers bracket every
/// access with `enable_access` / `disable_access`. Use
/// [`crate::signature::BackupDomainGuard`] rather than calling these directly.
pub trait BackupDomain {
    fn enable_access(&mut self);
    fn disable_access(&mut self);
    fn read_register(&self) -> u32;
    fn write_register(&mut self, value: u32);
}

/// Raw flash operations on absolute (physical) addresses.
pub trait FlashHardware {
    /// Read the word at `address`. Only called with word-aligned addresses.
    fn read_word(&self, address: u32) -> u32;
    /// Program one word. The target must already be erased.
    fn program_word(&mut self, address: u32, value: u32);
    /// Erase one physical sector.
    fn erase_sector(&mut self, sector: &SectorDescriptor);
}

/// Pins used by the strap detector.
///
/// Boards wired for a single strap pin never see the output methods called.
pub trait StrapPins {
    /// (Re)apply direction and pull configuration of the sense pin.
    fn configure_input(&mut self);
    /// Drive the loopback pin as a push-pull output.
    fn configure_output(&mut self);
    fn set_output(&mut self, high: bool);
    fn input_is_high(&mut self) -> bool;
    /// Return the loopback pin to a floating input.
    fn release_output(&mut self);
}

/// Free-running timer used to pace serial line sampling.
pub trait BitTimer {
    fn set_period_ns(&mut self, period_ns: u32);
    fn enable(&mut self);
    fn disable(&mut self);
    fn tick_flag_is_set(&mut self) -> bool;
    fn clear_tick_flag(&mut self);
}

/// Serial receive line and its UART.
pub trait SerialLine {
    /// Current level of the RX pin.
    fn rx_is_high(&mut self) -> bool;
    /// Whether the UART latched a break condition.
    fn hardware_break_detected(&mut self) -> bool;
}

/// A digital "host is here" signal, e.g. VBUS sense.
pub trait PresenceSignal {
    fn is_asserted(&mut self) -> bool;
}

/// The two places control can go after the decision is made.
pub trait Application<F: FlashHardware> {
    /// Jump to the installed image. Only returns if the image is absent or
    /// invalid, or if it returns control.
    fn transfer_control_to_application(&mut self);

    /// Run the recovery command loop. Returns when `timeout_ms` elapses or a
    /// new image has been installed. A timeout of 0 never elapses.
    fn recovery_loop(&mut self, timeout_ms: u32, flash: &mut FlashAccess<'_, F>);
}

/// Placeholder for a signal the board does not wire up.
///
/// Reads as idle on every trait it implements, so a `SensorSet` for a board
/// without a strap, VBUS sense or serial console still type-checks and never
/// holds the boot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unwired;

impl StrapPins for Unwired {
    fn configure_input(&mut self) {}
    fn configure_output(&mut self) {}
    fn set_output(&mut self, _high: bool) {}
    fn input_is_high(&mut self) -> bool {
        false
    }
    fn release_output(&mut self) {}
}

impl PresenceSignal for Unwired {
    fn is_asserted(&mut self) -> bool {
        false
    }
}

impl SerialLine for Unwired {
    fn rx_is_high(&mut self) -> bool {
        true
    }
    fn hardware_break_detected(&mut self) -> bool {
        false
    }
}

impl BitTimer for Unwired {
    fn set_period_ns(&mut self, _period_ns: u32) {}
    fn enable(&mut self) {}
    fn disable(&mut self) {}
    fn tick_flag_is_set(&mut self) -> bool {
        true
    }
    fn clear_tick_flag(&mut self) {}
}
