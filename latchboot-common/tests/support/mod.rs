// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Simulated hardware shared by the integration tests.
//!
//! Every simulator keeps its state behind `Rc<RefCell<_>>` so a test can hand
//! one clone to the code under test and inspect the other.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use latchboot_common::flash::{FlashAccess, FlashLayout, ERASED_WORD};
use latchboot_common::hal::{
    Application, BackupDomain, BitTimer, FlashHardware, SerialLine, StrapPins,
};
use latchboot_common::boot_fsm::Sensors;
use latchboot_common::sectors::SectorDescriptor;

// =============================================================================
// Flash
// =============================================================================

pub const LOAD_ADDRESS: u32 = 0x0800_4000;
pub const OTP_BASE: u32 = 0x1FFF_7800;
pub const UNIQUE_ID_BASE: u32 = 0x1FFF_7A10;

/// Non-uniform table; sector ids are the physical start addresses so the
/// simulator knows what to wipe.
pub const SECTORS: [SectorDescriptor; 4] = [
    SectorDescriptor::new(0x0800_4000, 0x1000),
    SectorDescriptor::new(0x0800_5000, 0x1000),
    SectorDescriptor::new(0x0800_6000, 0x2000),
    SectorDescriptor::new(0x0800_8000, 0x4000),
];

pub fn layout() -> FlashLayout<'static> {
    FlashLayout {
        sectors: &SECTORS,
        load_address: LOAD_ADDRESS,
        otp_base: OTP_BASE,
        unique_id_base: UNIQUE_ID_BASE,
    }
}

#[derive(Default)]
pub struct FlashState {
    /// Programmed words by physical address; anything absent reads erased.
    pub words: BTreeMap<u32, u32>,
    /// Sector ids passed to the erase hardware, in order.
    pub erases: Vec<u32>,
    pub reads: usize,
    pub programs: Vec<(u32, u32)>,
}

#[derive(Clone, Default)]
pub struct SimFlash {
    pub state: Rc<RefCell<FlashState>>,
}

impl SimFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a word at a physical address, bypassing program semantics.
    pub fn poke(&self, address: u32, value: u32) {
        self.state.borrow_mut().words.insert(address, value);
    }

    pub fn erase_count(&self) -> usize {
        self.state.borrow().erases.len()
    }

    pub fn read_count(&self) -> usize {
        self.state.borrow().reads
    }
}

impl FlashHardware for SimFlash {
    fn read_word(&self, address: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        state.words.get(&address).copied().unwrap_or(ERASED_WORD)
    }

    fn program_word(&mut self, address: u32, value: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.push((address, value));
        // NOR flash can only clear bits.
        let old = state.words.get(&address).copied().unwrap_or(ERASED_WORD);
        state.words.insert(address, old & value);
    }

    fn erase_sector(&mut self, sector: &SectorDescriptor) {
        let mut state = self.state.borrow_mut();
        state.erases.push(sector.sector_id);
        let start = sector.sector_id;
        let end = sector.sector_id + sector.size;
        state.words.retain(|&addr, _| addr < start || addr >= end);
    }
}

pub fn sim_flash_access() -> (FlashAccess<'static, SimFlash>, SimFlash) {
    let sim = SimFlash::new();
    (FlashAccess::new(layout(), sim.clone()), sim)
}

// =============================================================================
// Backup domain
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupEvent {
    Enable,
    Disable,
    Read(u32),
    Write(u32),
    /// Write attempted while the domain was protected; ignored.
    RejectedWrite(u32),
}

#[derive(Default)]
pub struct BackupState {
    pub value: u32,
    pub enabled: bool,
    pub events: Vec<BackupEvent>,
}

#[derive(Clone, Default)]
pub struct SimBackupDomain {
    pub state: Rc<RefCell<BackupState>>,
}

impl SimBackupDomain {
    pub fn with_value(value: u32) -> Self {
        let sim = Self::default();
        sim.state.borrow_mut().value = value;
        sim
    }

    /// Register contents, read without going through the domain protocol.
    pub fn peek(&self) -> u32 {
        self.state.borrow().value
    }

    pub fn events(&self) -> Vec<BackupEvent> {
        self.state.borrow().events.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }
}

impl BackupDomain for SimBackupDomain {
    fn enable_access(&mut self) {
        let mut state = self.state.borrow_mut();
        state.enabled = true;
        state.events.push(BackupEvent::Enable);
    }

    fn disable_access(&mut self) {
        let mut state = self.state.borrow_mut();
        state.enabled = false;
        state.events.push(BackupEvent::Disable);
    }

    fn read_register(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let value = state.value;
        state.events.push(BackupEvent::Read(value));
        value
    }

    fn write_register(&mut self, value: u32) {
        let mut state = self.state.borrow_mut();
        if state.enabled {
            state.value = value;
            state.events.push(BackupEvent::Write(value));
        } else {
            state.events.push(BackupEvent::RejectedWrite(value));
        }
    }
}

// =============================================================================
// Strap pins
// =============================================================================

/// Input level as a function of (read index, currently driven output level).
pub type LevelFn = Box<dyn FnMut(usize, bool) -> bool>;

pub struct ScriptedPins {
    level: LevelFn,
    output: bool,
    pub reads: usize,
    pub input_configs: usize,
    pub output_configs: usize,
    pub releases: usize,
}

impl ScriptedPins {
    pub fn new(level: impl FnMut(usize, bool) -> bool + 'static) -> Self {
        Self {
            level: Box::new(level),
            output: false,
            reads: 0,
            input_configs: 0,
            output_configs: 0,
            releases: 0,
        }
    }

    /// Input that always reads `high`.
    pub fn constant(high: bool) -> Self {
        Self::new(move |_, _| high)
    }

    /// Input wired to the output pin, with reads at the given indices flipped.
    pub fn looped_with_glitches(glitches: Vec<usize>) -> Self {
        Self::new(move |i, out| if glitches.contains(&i) { !out } else { out })
    }
}

impl StrapPins for ScriptedPins {
    fn configure_input(&mut self) {
        self.input_configs += 1;
    }

    fn configure_output(&mut self) {
        self.output_configs += 1;
    }

    fn set_output(&mut self, high: bool) {
        self.output = high;
    }

    fn input_is_high(&mut self) -> bool {
        let level = (self.level)(self.reads, self.output);
        self.reads += 1;
        level
    }

    fn release_output(&mut self) {
        self.releases += 1;
    }
}

// =============================================================================
// Serial line and timer
// =============================================================================

/// RX line replaying a fixed pattern of levels.
pub struct ScriptedLine {
    levels: Vec<bool>,
    pub reads: usize,
    pub hardware_break: bool,
}

impl ScriptedLine {
    pub fn new(levels: Vec<bool>) -> Self {
        Self {
            levels,
            reads: 0,
            hardware_break: false,
        }
    }

    /// `low` low samples followed by `high` high samples, repeating.
    pub fn low_then_high(low: usize, high: usize) -> Self {
        let mut levels = vec![false; low];
        levels.extend(std::iter::repeat(true).take(high));
        Self::new(levels)
    }

    pub fn idle() -> Self {
        Self::new(vec![true])
    }
}

impl SerialLine for ScriptedLine {
    fn rx_is_high(&mut self) -> bool {
        let level = self.levels[self.reads % self.levels.len()];
        self.reads += 1;
        level
    }

    fn hardware_break_detected(&mut self) -> bool {
        self.hardware_break
    }
}

/// Timer whose flag is set on every other poll.
#[derive(Default)]
pub struct TickingTimer {
    pub period_ns: u32,
    pub enabled: bool,
    pub enables: usize,
    pub disables: usize,
    pub polls: usize,
    pub ticks: usize,
    pending: bool,
}

impl BitTimer for TickingTimer {
    fn set_period_ns(&mut self, period_ns: u32) {
        self.period_ns = period_ns;
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.enables += 1;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }

    fn tick_flag_is_set(&mut self) -> bool {
        assert!(self.enabled, "polled a stopped timer");
        self.polls += 1;
        if self.polls % 2 == 0 {
            self.pending = true;
        }
        self.pending
    }

    fn clear_tick_flag(&mut self) {
        if self.pending {
            self.ticks += 1;
        }
        self.pending = false;
    }
}

// =============================================================================
// Sensors and application
// =============================================================================

#[derive(Default)]
pub struct SensorState {
    pub strap: bool,
    pub presence: bool,
    pub serial_break: bool,
    pub strap_polls: usize,
    pub presence_polls: usize,
    pub break_polls: usize,
}

#[derive(Clone, Default)]
pub struct MockSensors {
    pub state: Rc<RefCell<SensorState>>,
}

impl MockSensors {
    pub fn set_strap(&self, on: bool) {
        self.state.borrow_mut().strap = on;
    }

    pub fn set_presence(&self, on: bool) {
        self.state.borrow_mut().presence = on;
    }

    pub fn set_break(&self, on: bool) {
        self.state.borrow_mut().serial_break = on;
    }
}

impl Sensors for MockSensors {
    fn strap_forced(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.strap_polls += 1;
        state.strap
    }

    fn presence_asserted(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.presence_polls += 1;
        state.presence
    }

    fn break_detected(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.break_polls += 1;
        state.serial_break
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// Launch requested; carries the signature register at that moment.
    Launch { signature: u32 },
    Recovery { timeout_ms: u32 },
}

/// Application whose launch always returns, as if the image were invalid.
#[derive(Clone)]
pub struct RecordingApp {
    backup: SimBackupDomain,
    pub events: Rc<RefCell<Vec<AppEvent>>>,
}

impl RecordingApp {
    pub fn new(backup: SimBackupDomain) -> Self {
        Self {
            backup,
            events: Rc::default(),
        }
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().clone()
    }

    pub fn launches(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, AppEvent::Launch { .. }))
            .count()
    }
}

impl Application<SimFlash> for RecordingApp {
    fn transfer_control_to_application(&mut self) {
        let signature = self.backup.peek();
        self.events.borrow_mut().push(AppEvent::Launch { signature });
    }

    fn recovery_loop(&mut self, timeout_ms: u32, _flash: &mut FlashAccess<'_, SimFlash>) {
        self.events
            .borrow_mut()
            .push(AppEvent::Recovery { timeout_ms });
    }
}
