// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial break detector.
//!
//! Samples the RX line twice per bit time for three character frames
//! (1 start + 8 data + 1 stop bits each) and classifies the line as held low
//! when it reads overwhelmingly low. An idle line reads high and never
//! triggers.

use crate::hal::{BitTimer, SerialLine};

/// Bits in one character frame.
pub const BITS_PER_FRAME: u32 = 10;

/// Frames observed per detection.
pub const FRAMES_SAMPLED: u32 = 3;

/// Samples per detection: two per bit.
pub const SAMPLE_COUNT: u32 = FRAMES_SAMPLED * BITS_PER_FRAME * 2;

/// Low samples needed per high sample.
pub const LOW_TO_HIGH_RATIO: u32 = 9;

/// Low/high tally of one sampling window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineSamples {
    pub low: u32,
    pub high: u32,
}

impl LineSamples {
    pub fn total(&self) -> u32 {
        self.low + self.high
    }

    /// Line held low: more low than high and either no high at all or at
    /// least `LOW_TO_HIGH_RATIO` low samples per high one.
    pub fn indicates_break(&self) -> bool {
        self.low > self.high && (self.high == 0 || self.low >= self.high * LOW_TO_HIGH_RATIO)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BreakDetector {
    half_bit_ns: u32,
}

impl BreakDetector {
    /// Detector for a line running at `baud`.
    ///
    /// Panics if `baud` is 0 or too large for the half-bit arithmetic; in a
    /// const context that is a compile error.
    pub const fn for_baud(baud: u32) -> Self {
        assert!(baud > 0 && baud <= u32::MAX / 2, "baud out of range");
        Self {
            half_bit_ns: 1_000_000_000 / (baud * 2),
        }
    }

    pub fn half_bit_ns(&self) -> u32 {
        self.half_bit_ns
    }

    /// Take `SAMPLE_COUNT` timer-paced samples of the RX line.
    pub fn sample<T: BitTimer, L: SerialLine>(&self, timer: &mut T, line: &mut L) -> LineSamples {
        let mut samples = LineSamples::default();

        timer.set_period_ns(self.half_bit_ns);
        timer.enable();

        while samples.total() < SAMPLE_COUNT {
            if timer.tick_flag_is_set() {
                timer.clear_tick_flag();
                if line.rx_is_high() {
                    samples.high += 1;
                } else {
                    samples.low += 1;
                }
            }
        }

        timer.disable();
        samples
    }

    /// Whether the host is holding the line in break.
    pub fn is_break<T: BitTimer, L: SerialLine>(&self, timer: &mut T, line: &mut L) -> bool {
        let samples = self.sample(timer, line);
        let detected = line.hardware_break_detected() || samples.indicates_break();
        debug!(
            "rx low={=u32} high={=u32} break={=bool}",
            samples.low,
            samples.high,
            detected
        );
        detected
    }
}
