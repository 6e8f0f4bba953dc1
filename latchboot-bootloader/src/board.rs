// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Raspberry Pi Pico board definition.
//!
//! Flash map (2 MiB):
//!   0x1000_0000  bootloader, 64 KiB
//!   0x1001_0000  application, 1920 KiB in 19 sectors
//!   0x101F_0000  factory page: 512 B OTP/calibration, then the unique ID

use embedded_hal::digital::InputPin;
use latchboot_common::boot_delay::BootDelayConfig;
use latchboot_common::boot_fsm::{BoardConfig, BootEngine, SensorSet, DEFAULT_BOOT_DELAY_MS};
use latchboot_common::break_detect::BreakDetector;
use latchboot_common::flash::{FlashAccess, FlashLayout};
use latchboot_common::hal::{BackupDomain, BitTimer, PresenceSignal, SerialLine, StrapPins};
use latchboot_common::sectors::SectorDescriptor;
use latchboot_common::signature::SignatureStore;
use latchboot_common::strap::{StrapConfig, StrapDetector};
use rp2040_hal as hal;

use crate::flash::Rp2040Flash;
use crate::peripherals::{Peripherals, StrapPin, Uart0, VbusPin};
use crate::recovery::PicoApp;

/// Reported to the host in `GetInfo`.
pub const BOARD_ID: u32 = 0x0000_2040;

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const APP_BASE: u32 = 0x1001_0000;
const FACTORY_BASE: u32 = 0x101F_0000;

pub const SERIAL_BAUD: u32 = 115_200;

const KIB: u32 = 1024;
const SECTOR_COUNT: usize = 19;

pub const CONFIG: BoardConfig = BoardConfig {
    default_delay_ms: DEFAULT_BOOT_DELAY_MS,
    boot_delay: Some(BootDelayConfig::at(0x1A0)),
    boot_fail_detect: true,
};

/// GP2 with the internal pull-up; a jumper to ground holds the board in
/// recovery.
pub const STRAP: StrapConfig = StrapConfig::SinglePin {
    expected_high: false,
};

/// 4 x 16 KiB, 1 x 64 KiB, 14 x 128 KiB. Ids are flash offsets.
const fn sector_table() -> [SectorDescriptor; SECTOR_COUNT] {
    let mut table = [SectorDescriptor::new(0, 0); SECTOR_COUNT];
    let mut offset = APP_BASE - FLASH_BASE;
    let mut i = 0;
    while i < SECTOR_COUNT {
        let size = if i < 4 {
            16 * KIB
        } else if i == 4 {
            64 * KIB
        } else {
            128 * KIB
        };
        table[i] = SectorDescriptor::new(offset, size);
        offset += size;
        i += 1;
    }
    table
}

pub static SECTORS: [SectorDescriptor; SECTOR_COUNT] = sector_table();

/// Application end must not run into the factory page.
const _: () = assert!(APP_BASE + 4 * 16 * KIB + 64 * KIB + 14 * 128 * KIB == FACTORY_BASE);

pub fn layout() -> FlashLayout<'static> {
    FlashLayout {
        sectors: &SECTORS,
        load_address: APP_BASE,
        otp_base: FACTORY_BASE,
        unique_id_base: FACTORY_BASE + 0x200,
    }
}

pub type Sensors = SensorSet<StrapInput, VbusSense, SystemBitTimer, UartLine>;
pub type Engine = BootEngine<'static, WatchdogScratch, Rp2040Flash, Sensors, PicoApp>;

/// Wire the board's peripherals into a boot engine.
pub fn engine(p: Peripherals) -> Engine {
    let sensors = SensorSet::new(StrapDetector::new(STRAP), StrapInput(p.strap_pin))
        .with_presence(VbusSense(p.vbus_pin))
        .with_serial(
            BreakDetector::for_baud(SERIAL_BAUD),
            SystemBitTimer::new(p.timer),
            UartLine { _uart: p.uart },
        );

    BootEngine::new(
        CONFIG,
        SignatureStore::new(WatchdogScratch),
        FlashAccess::new(layout(), Rp2040Flash::new()),
        sensors,
        PicoApp::new(p.timer, p.led_pin, p.usb),
    )
}

// --- Signature register ---

const WATCHDOG_SCRATCH0: *mut u32 = 0x4005_800C as *mut u32;

/// Watchdog SCRATCH0. Survives watchdog and soft resets, cleared on power-up.
pub struct WatchdogScratch;

impl BackupDomain for WatchdogScratch {
    // Scratch registers have no write protection.
    fn enable_access(&mut self) {}
    fn disable_access(&mut self) {}

    fn read_register(&self) -> u32 {
        unsafe { WATCHDOG_SCRATCH0.read_volatile() }
    }

    fn write_register(&mut self, value: u32) {
        unsafe { WATCHDOG_SCRATCH0.write_volatile(value) }
    }
}

// --- Strap and presence ---

const STRAP_GPIO: u32 = 2;
const SIO_GPIO_OE_CLR: *mut u32 = 0xD000_0028 as *mut u32;
const PADS_BANK0: u32 = 0x4001_C000;
const PAD_OD: u32 = 1 << 7;
const PAD_IE: u32 = 1 << 6;
const PAD_PUE: u32 = 1 << 3;
const PAD_PDE: u32 = 1 << 2;
const ATOMIC_SET: u32 = 0x2000;
const ATOMIC_CLR: u32 = 0x3000;

/// Single sense pin on GP2. Input with pull-up, re-applied before every
/// sampling run in case the application left the pad configured otherwise.
pub struct StrapInput(StrapPin);

impl StrapPins for StrapInput {
    fn configure_input(&mut self) {
        let pad = PADS_BANK0 + 4 + 4 * STRAP_GPIO;
        unsafe {
            SIO_GPIO_OE_CLR.write_volatile(1 << STRAP_GPIO);
            ((pad + ATOMIC_CLR) as *mut u32).write_volatile(PAD_OD | PAD_PDE);
            ((pad + ATOMIC_SET) as *mut u32).write_volatile(PAD_IE | PAD_PUE);
        }
    }
    fn configure_output(&mut self) {}
    fn set_output(&mut self, _high: bool) {}

    fn input_is_high(&mut self) -> bool {
        self.0.is_high().unwrap_or(true)
    }

    fn release_output(&mut self) {}
}

/// VBUS sense on GP24, high while USB power is present.
pub struct VbusSense(VbusPin);

impl PresenceSignal for VbusSense {
    fn is_asserted(&mut self) -> bool {
        self.0.is_high().unwrap_or(false)
    }
}

// --- Serial break ---

const SIO_GPIO_IN: *const u32 = 0xD000_0004 as *const u32;
const UART0_RIS: *const u32 = 0x4003_403C as *const u32;
const UART0_ICR: *mut u32 = 0x4003_4044 as *mut u32;
/// Break error, raw interrupt status. Latches when the break character
/// reaches the FIFO, whether or not anything reads the data register.
const INT_BREAK_ERROR: u32 = 1 << 9;
const RX_PIN: u32 = 1;

pub struct UartLine {
    _uart: Uart0,
}

impl SerialLine for UartLine {
    fn rx_is_high(&mut self) -> bool {
        unsafe { SIO_GPIO_IN.read_volatile() & (1 << RX_PIN) != 0 }
    }

    fn hardware_break_detected(&mut self) -> bool {
        let ris = unsafe { UART0_RIS.read_volatile() };
        if ris & INT_BREAK_ERROR == 0 {
            return false;
        }
        unsafe { UART0_ICR.write_volatile(INT_BREAK_ERROR) };
        true
    }
}

/// Sampling clock derived from the 1 MHz system timer. Deadlines accumulate
/// in nanoseconds so sub-microsecond periods average out.
pub struct SystemBitTimer {
    timer: hal::Timer,
    period_ns: u64,
    deadline_ns: u64,
}

impl SystemBitTimer {
    pub fn new(timer: hal::Timer) -> Self {
        Self {
            timer,
            period_ns: 0,
            deadline_ns: 0,
        }
    }

    fn now_ns(&self) -> u64 {
        self.timer.get_counter().ticks() * 1000
    }
}

impl BitTimer for SystemBitTimer {
    fn set_period_ns(&mut self, period_ns: u32) {
        self.period_ns = u64::from(period_ns);
    }

    fn enable(&mut self) {
        self.deadline_ns = self.now_ns() + self.period_ns;
    }

    fn disable(&mut self) {}

    fn tick_flag_is_set(&mut self) -> bool {
        self.now_ns() >= self.deadline_ns
    }

    fn clear_tick_flag(&mut self) {
        self.deadline_ns += self.period_ns;
    }
}
