// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application validation and handoff.

use embedded_hal::delay::DelayNs;
use rp2040_hal as hal;

use crate::board::{self, APP_BASE};

const RAM_START: u32 = 0x2000_0000;
const RAM_END: u32 = 0x2004_2000;

struct VectorTable {
    initial_sp: u32,
    reset_vector: u32,
}

impl VectorTable {
    unsafe fn read_from(addr: u32) -> Self {
        Self {
            initial_sp: (addr as *const u32).read_volatile(),
            reset_vector: (addr as *const u32).offset(1).read_volatile(),
        }
    }

    /// Stack in SRAM, reset handler inside the application region. Erased
    /// flash fails both.
    fn is_valid(&self) -> bool {
        let app_end = APP_BASE + board::layout().app_size_max();
        (RAM_START..=RAM_END).contains(&self.initial_sp)
            && (APP_BASE..app_end).contains(&(self.reset_vector & !1))
    }
}

/// Jump to the installed application. Returns only if there is none.
pub fn launch(timer: &mut hal::Timer) {
    let vt = unsafe { VectorTable::read_from(APP_BASE) };
    if !vt.is_valid() {
        defmt::warn!(
            "no valid application at 0x{:08x} (sp=0x{:08x} reset=0x{:08x})",
            APP_BASE,
            vt.initial_sp,
            vt.reset_vector
        );
        return;
    }

    defmt::println!("Jumping to application at 0x{:08x}", vt.reset_vector);
    // Let RTT drain.
    timer.delay_ms(10u32);

    unsafe {
        prepare_for_firmware_handoff();
        relocate_vector_table(APP_BASE);
        jump_to_firmware(vt.initial_sp, vt.reset_vector);
    }
}

/// Clocks are left configured; the application's runtime init switches away
/// from the PLLs before reconfiguring them.
unsafe fn prepare_for_firmware_handoff() {
    cortex_m::interrupt::disable();

    // Clear all pending interrupts in NVIC
    const NVIC_ICPR: *mut u32 = 0xE000_E280 as *mut u32;
    NVIC_ICPR.write_volatile(0xFFFF_FFFF);

    // Disable all NVIC interrupts
    const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
    NVIC_ICER.write_volatile(0xFFFF_FFFF);
}

unsafe fn relocate_vector_table(base: u32) {
    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    SCB_VTOR.write_volatile(base);

    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

unsafe fn jump_to_firmware(initial_sp: u32, reset_vector: u32) -> ! {
    core::arch::asm!(
        "msr msp, {sp}",
        "cpsie i",  // Re-enable interrupts before jumping (SDK expects PRIMASK=0)
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}
