// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Persistent signature store: one 32-bit value that survives a warm reset.
//!
//! The value only means something when it equals [`BOOT_SIGNATURE`]; anything
//! else, including the undefined contents after a power cycle, reads as
//! "absent".

use crate::hal::BackupDomain;

/// Reserved value meaning "stay in recovery on the next reset".
pub const BOOT_SIGNATURE: u32 = 0xB007_B007;

/// Value written to consume the signature.
pub const CLEARED_SIGNATURE: u32 = 0;

/// Scoped access to the backup domain.
///
/// Construction enables access; dropping the guard disables it again, on
/// every exit path.
pub struct BackupDomainGuard<'a, B: BackupDomain> {
    domain: &'a mut B,
}

impl<'a, B: BackupDomain> BackupDomainGuard<'a, B> {
    pub fn new(domain: &'a mut B) -> Self {
        domain.enable_access();
        Self { domain }
    }

    pub fn read(&self) -> u32 {
        self.domain.read_register()
    }

    pub fn write(&mut self, value: u32) {
        self.domain.write_register(value);
    }
}

impl<B: BackupDomain> Drop for BackupDomainGuard<'_, B> {
    fn drop(&mut self) {
        self.domain.disable_access();
    }
}

/// The anti-brick latch register.
pub struct SignatureStore<B> {
    domain: B,
}

impl<B: BackupDomain> SignatureStore<B> {
    pub fn new(domain: B) -> Self {
        Self { domain }
    }

    pub fn get(&mut self) -> u32 {
        BackupDomainGuard::new(&mut self.domain).read()
    }

    pub fn set(&mut self, value: u32) {
        BackupDomainGuard::new(&mut self.domain).write(value);
    }

    pub fn is_armed(&mut self) -> bool {
        self.get() == BOOT_SIGNATURE
    }

    /// Latch "stay in recovery" for the next reset.
    pub fn arm(&mut self) {
        self.set(BOOT_SIGNATURE);
    }

    pub fn clear(&mut self) {
        self.set(CLEARED_SIGNATURE);
    }

    /// Consume the latch: returns whether it was armed and clears it if so.
    pub fn take_armed(&mut self) -> bool {
        let armed = self.is_armed();
        if armed {
            self.clear();
        }
        armed
    }
}
