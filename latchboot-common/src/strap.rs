// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Strap-pin detector: noise-tolerant "force recovery" sensing.
//!
//! Two wirings are supported. A loopback strap ties an output pin to an input
//! pin; the output toggles and the input has to follow it, which rejects
//! coupling between unrelated wires. A single-pin strap pulls one input to a
//! known level. Either way the verdict is a vote over a fixed sample count.

use crate::hal::StrapPins;

/// Output toggles (high then low) in the loopback pattern.
pub const LOOPBACK_CYCLES: u32 = 10;

/// Input samples taken per driven level.
pub const SAMPLES_PER_LEVEL: u32 = 20;

/// Samples taken for a single-pin strap.
pub const SINGLE_PIN_SAMPLES: u32 = 200;

/// Minimum share of agreeing samples, in percent.
pub const AGREEMENT_PERCENT: u32 = 90;

/// How the board wires its strap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StrapConfig {
    /// No strap on this board.
    Absent,
    /// Output pin looped back into an input pin.
    Loopback,
    /// One input pin with a pull; forced when it reads `expected_high`.
    SinglePin { expected_high: bool },
}

/// Running vote over a sampling window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteSample {
    pub samples: u32,
    pub agreeing: u32,
}

impl VoteSample {
    pub fn record(&mut self, agrees: bool) {
        self.samples += 1;
        if agrees {
            self.agreeing += 1;
        }
    }

    /// Whether at least `percent` of the samples agreed. An empty window never
    /// passes.
    pub fn meets(&self, percent: u32) -> bool {
        self.samples > 0 && self.agreeing * 100 >= self.samples * percent
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StrapDetector {
    config: StrapConfig,
}

impl StrapDetector {
    pub const fn new(config: StrapConfig) -> Self {
        Self { config }
    }

    /// Sample the strap and vote. Always runs the full sample count.
    pub fn is_forced<P: StrapPins>(&self, pins: &mut P) -> bool {
        let vote = match self.config {
            StrapConfig::Absent => return false,
            StrapConfig::Loopback => sample_loopback(pins),
            StrapConfig::SinglePin { expected_high } => sample_single(pins, expected_high),
        };

        let forced = vote.meets(AGREEMENT_PERCENT);
        debug!(
            "strap vote {=u32}/{=u32} forced={=bool}",
            vote.agreeing,
            vote.samples,
            forced
        );
        forced
    }
}

fn sample_loopback<P: StrapPins>(pins: &mut P) -> VoteSample {
    let mut vote = VoteSample::default();

    pins.configure_input();
    pins.configure_output();

    for _ in 0..LOOPBACK_CYCLES {
        for level in [true, false] {
            pins.set_output(level);
            for _ in 0..SAMPLES_PER_LEVEL {
                vote.record(pins.input_is_high() == level);
            }
        }
    }

    pins.release_output();
    vote
}

fn sample_single<P: StrapPins>(pins: &mut P, expected_high: bool) -> VoteSample {
    let mut vote = VoteSample::default();

    pins.configure_input();

    for _ in 0..SINGLE_PIN_SAMPLES {
        vote.record(pins.input_is_high() == expected_high);
    }

    vote
}
