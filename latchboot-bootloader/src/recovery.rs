// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Recovery mode over USB CDC, and the board's [`Application`] binding.
//!
//! The USB device is brought up the first time recovery is entered and stays
//! enumerated across sessions, so a host that is already attached keeps its
//! port when a launch attempt falls back into recovery.

use embedded_hal::digital::OutputPin;
use latchboot_common::flash::FlashAccess;
use latchboot_common::hal::Application;
use latchboot_common::recovery::{Flow, RecoverySession};
use rp2040_hal as hal;
use usb_device::class_prelude::UsbBusAllocator;

use crate::board::BOARD_ID;
use crate::boot;
use crate::flash::Rp2040Flash;
use crate::peripherals::{self, LedPin, UsbPeripherals};
use crate::usb_transport::UsbTransport;

pub struct PicoApp {
    timer: hal::Timer,
    led: LedPin,
    usb: Option<UsbPeripherals>,
    transport: Option<UsbTransport>,
}

impl PicoApp {
    pub fn new(timer: hal::Timer, led: LedPin, usb: UsbPeripherals) -> Self {
        Self {
            timer,
            led,
            usb: Some(usb),
            transport: None,
        }
    }

    fn transport(&mut self) -> Option<&mut UsbTransport> {
        if self.transport.is_none() {
            let mut usb = self.usb.take()?;
            let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
                usb.regs,
                usb.dpram,
                usb.clock,
                true,
                &mut usb.resets,
            ));
            let bus = peripherals::store_usb_bus(usb_bus);
            self.transport = Some(UsbTransport::new(bus));
            defmt::println!("USB CDC initialized");
        }
        self.transport.as_mut()
    }
}

impl Application<Rp2040Flash> for PicoApp {
    fn transfer_control_to_application(&mut self) {
        boot::launch(&mut self.timer);
    }

    fn recovery_loop(&mut self, timeout_ms: u32, flash: &mut FlashAccess<'_, Rp2040Flash>) {
        let timer = self.timer;
        self.led.set_high().ok();
        if let Some(transport) = self.transport() {
            run(transport, &timer, flash, timeout_ms);
        }
        self.led.set_low().ok();
    }
}

/// Serve commands until `Boot`, or until the timeout elapses with no host.
fn run(
    transport: &mut UsbTransport,
    timer: &hal::Timer,
    flash: &mut FlashAccess<'_, Rp2040Flash>,
    timeout_ms: u32,
) {
    let mut session = RecoverySession::new(BOARD_ID, timeout_ms);
    let started = timer.get_counter();

    loop {
        transport.poll();

        if let Some(cmd) = transport.try_receive() {
            let (response, flow) = session.handle(flash, cmd);
            transport.send(&response);
            match flow {
                Flow::Continue => {}
                Flow::Boot => {
                    defmt::println!("Boot requested by host");
                    return;
                }
                Flow::Reboot => reboot(transport),
            }
        }

        let elapsed_ms = timer
            .get_counter()
            .checked_duration_since(started)
            .map_or(0, |d| d.to_millis());
        if session.expired(elapsed_ms) {
            defmt::println!("Recovery timed out after {=u32} ms", timeout_ms);
            return;
        }
    }
}

fn reboot(transport: &mut UsbTransport) -> ! {
    // Keep servicing USB long enough for the ACK to leave.
    for _ in 0..10_000 {
        transport.poll();
    }
    cortex_m::asm::delay(12_000_000);
    cortex_m::peripheral::SCB::sys_reset();
}
