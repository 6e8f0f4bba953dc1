// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot decision core and flash sector abstraction for latchboot.
//!
//! This crate supports both `no_std` (embedded) and `std` (host) environments:
//! - Default: `no_std` mode for embedded targets
//! - `std` feature: Enables `std` support for host tools
//! - `defmt` feature: Logs boot decisions through `defmt`
//!
//! Nothing in here touches hardware directly. Every register, pin, timer and
//! flash access goes through the traits in [`hal`], which the board crate
//! implements and the tests simulate.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate alloc;

#[macro_use]
mod log;

pub mod boot_delay;
pub mod boot_fsm;
pub mod break_detect;
pub mod flash;
pub mod hal;
pub mod protocol;
pub mod recovery;
pub mod sectors;
pub mod signature;
pub mod strap;

// Re-export commonly used types
pub use boot_delay::{BootDelayConfig, BootDelayRequest};
pub use boot_fsm::{BoardConfig, BootDecision, BootEngine, HoldReason, SensorSet, Sensors};
pub use break_detect::{BreakDetector, LineSamples};
pub use flash::{EraseOutcome, FlashAccess, FlashLayout, ERASED_WORD};
pub use protocol::{AckStatus, Command, Response, MAX_PROGRAM_WORDS};
pub use recovery::{Flow, RecoverySession};
pub use sectors::SectorDescriptor;
pub use signature::{SignatureStore, BOOT_SIGNATURE};
pub use strap::{StrapConfig, StrapDetector, VoteSample};
