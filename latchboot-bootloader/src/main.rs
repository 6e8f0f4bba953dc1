// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! latchboot for the Raspberry Pi Pico: anti-brick boot decision with a USB
//! CDC recovery mode.

#![no_std]
#![no_main]

mod board;
mod boot;
mod flash;
mod peripherals;
mod recovery;
mod usb_transport;

use defmt_rtt as _;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let p = peripherals::init();
    flash::init();

    board::engine(p).run()
}
