// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the serial break detector.

mod support;

use latchboot_common::break_detect::{BreakDetector, LineSamples, SAMPLE_COUNT};
use support::{ScriptedLine, TickingTimer};

fn samples(low: u32, high: u32) -> LineSamples {
    LineSamples { low, high }
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_all_low_is_break() {
    assert!(samples(60, 0).indicates_break());
}

#[test]
fn test_all_high_is_not_break() {
    assert!(!samples(0, 60).indicates_break());
}

#[test]
fn test_mostly_high_is_not_break() {
    assert!(!samples(6, 54).indicates_break());
}

#[test]
fn test_exact_nine_to_one_low_is_break() {
    assert!(samples(54, 6).indicates_break());
}

#[test]
fn test_just_under_nine_to_one_is_not_break() {
    assert!(!samples(53, 7).indicates_break());
    assert!(!samples(44, 5).indicates_break());
}

#[test]
fn test_low_majority_without_ratio_is_not_break() {
    assert!(!samples(40, 20).indicates_break());
}

// =============================================================================
// Sampling
// =============================================================================

#[test]
fn test_sample_takes_exactly_sixty_ticks() {
    let detector = BreakDetector::for_baud(115_200);
    let mut timer = TickingTimer::default();
    let mut line = ScriptedLine::idle();

    let result = detector.sample(&mut timer, &mut line);

    assert_eq!(result.total(), SAMPLE_COUNT);
    assert_eq!(line.reads, SAMPLE_COUNT as usize);
    assert_eq!(timer.ticks, SAMPLE_COUNT as usize);
}

#[test]
fn test_sample_only_reads_line_on_tick() {
    let detector = BreakDetector::for_baud(115_200);
    let mut timer = TickingTimer::default();
    let mut line = ScriptedLine::idle();

    detector.sample(&mut timer, &mut line);

    // The simulated flag is set on every other poll.
    assert_eq!(timer.polls, 2 * SAMPLE_COUNT as usize);
}

#[test]
fn test_sample_programs_half_bit_period_and_stops_timer() {
    let detector = BreakDetector::for_baud(57_600);
    let mut timer = TickingTimer::default();

    detector.sample(&mut timer, &mut ScriptedLine::idle());

    assert_eq!(timer.period_ns, 8680);
    assert_eq!(timer.enables, 1);
    assert_eq!(timer.disables, 1);
    assert!(!timer.enabled);
}

// =============================================================================
// Detection
// =============================================================================

#[test]
fn test_idle_line_is_not_break() {
    let detector = BreakDetector::for_baud(115_200);
    assert!(!detector.is_break(&mut TickingTimer::default(), &mut ScriptedLine::idle()));
}

#[test]
fn test_held_low_line_is_break() {
    let detector = BreakDetector::for_baud(115_200);
    let mut line = ScriptedLine::new(vec![false]);
    assert!(detector.is_break(&mut TickingTimer::default(), &mut line));
}

#[test]
fn test_repeated_break_frames_are_break() {
    // One high sample in every ten: 54 low, 6 high.
    let detector = BreakDetector::for_baud(115_200);
    let mut line = ScriptedLine::low_then_high(9, 1);
    assert!(detector.is_break(&mut TickingTimer::default(), &mut line));
}

#[test]
fn test_normal_traffic_is_not_break() {
    // 0x55 frames: start bit low then alternating data, stop bit high.
    let frame = [false, true, false, true, false, true, false, true, false, true];
    let levels: Vec<bool> = frame.iter().flat_map(|&b| [b, b]).collect();
    let detector = BreakDetector::for_baud(115_200);

    assert!(!detector.is_break(&mut TickingTimer::default(), &mut ScriptedLine::new(levels)));
}

#[test]
fn test_hardware_break_flag_wins_on_idle_line() {
    let detector = BreakDetector::for_baud(115_200);
    let mut line = ScriptedLine::idle();
    line.hardware_break = true;

    assert!(detector.is_break(&mut TickingTimer::default(), &mut line));
}
