// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot decision FSM - combines every "stay in recovery" signal.
//!
//! On each reset the engine starts from "try to boot with the default
//! timeout" and lets each signal, in fixed priority order, weaken that
//! decision. It never strengthens it again. If it ends up booting and control
//! comes back, the anti-brick latch makes sure the next reset lands in
//! recovery instead of another doomed launch.
//!
//! All hardware sits behind traits so the same logic runs against a real
//! board or a simulated one.

use crate::boot_delay::{BootDelayConfig, BootDelayRequest};
use crate::break_detect::BreakDetector;
use crate::flash::FlashAccess;
use crate::hal::{Application, BackupDomain, BitTimer, FlashHardware, PresenceSignal, SerialLine, StrapPins};
use crate::signature::SignatureStore;
use crate::strap::StrapDetector;

/// Recovery timeout used when nothing asks for more.
pub const DEFAULT_BOOT_DELAY_MS: u32 = 5000;

/// Timeout value meaning "wait until an image is installed".
pub const NO_TIMEOUT: u32 = 0;

/// Board-level switches for the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    pub default_delay_ms: u32,
    /// `None` if the board does not honour boot-delay requests.
    pub boot_delay: Option<BootDelayConfig>,
    /// Arm the latch before every launch.
    pub boot_fail_detect: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: DEFAULT_BOOT_DELAY_MS,
            boot_delay: None,
            boot_fail_detect: false,
        }
    }
}

/// First signal that cancelled the boot attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldReason {
    Signature,
    BootDelay,
    Strap,
    Presence,
    SerialBreak,
}

/// Result of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootDecision {
    pub try_boot: bool,
    /// Recovery timeout in milliseconds; [`NO_TIMEOUT`] waits forever.
    pub timeout_ms: u32,
    pub held_by: Option<HoldReason>,
}

impl BootDecision {
    pub fn new(default_delay_ms: u32) -> Self {
        Self {
            try_boot: true,
            timeout_ms: default_delay_ms,
            held_by: None,
        }
    }

    /// Cancel the boot attempt, remembering the first reason.
    pub fn hold(&mut self, reason: HoldReason) {
        self.try_boot = false;
        if self.held_by.is_none() {
            self.held_by = Some(reason);
        }
    }

    /// Raise the timeout to at least `timeout_ms`. Never lowers it.
    pub fn extend_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = self.timeout_ms.max(timeout_ms);
    }
}

/// Signals sampled on every evaluation.
pub trait Sensors {
    fn strap_forced(&mut self) -> bool;
    fn presence_asserted(&mut self) -> bool;
    fn break_detected(&mut self) -> bool;
}

/// The stock [`Sensors`]: a strap detector plus whatever optional signals the
/// board wires up. Missing signals read as idle.
pub struct SensorSet<P, V, T, L> {
    strap: StrapDetector,
    strap_pins: P,
    presence: Option<V>,
    serial: Option<(BreakDetector, T, L)>,
}

impl<P, V, T, L> SensorSet<P, V, T, L> {
    pub fn new(strap: StrapDetector, strap_pins: P) -> Self {
        Self {
            strap,
            strap_pins,
            presence: None,
            serial: None,
        }
    }

    pub fn with_presence(mut self, presence: V) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_serial(mut self, detector: BreakDetector, timer: T, line: L) -> Self {
        self.serial = Some((detector, timer, line));
        self
    }
}

impl<P, V, T, L> Sensors for SensorSet<P, V, T, L>
where
    P: StrapPins,
    V: PresenceSignal,
    T: BitTimer,
    L: SerialLine,
{
    fn strap_forced(&mut self) -> bool {
        self.strap.is_forced(&mut self.strap_pins)
    }

    fn presence_asserted(&mut self) -> bool {
        self.presence.as_mut().is_some_and(|p| p.is_asserted())
    }

    fn break_detected(&mut self) -> bool {
        match self.serial.as_mut() {
            Some((detector, timer, line)) => detector.is_break(timer, line),
            None => false,
        }
    }
}

/// Owns every collaborator for the reset-to-launch sequence.
pub struct BootEngine<'a, B, F, S, A> {
    config: BoardConfig,
    signature: SignatureStore<B>,
    flash: FlashAccess<'a, F>,
    sensors: S,
    app: A,
}

impl<'a, B, F, S, A> BootEngine<'a, B, F, S, A>
where
    B: BackupDomain,
    F: FlashHardware,
    S: Sensors,
    A: Application<F>,
{
    pub fn new(
        config: BoardConfig,
        signature: SignatureStore<B>,
        flash: FlashAccess<'a, F>,
        sensors: S,
        app: A,
    ) -> Self {
        Self {
            config,
            signature,
            flash,
            sensors,
            app,
        }
    }

    /// Evaluate every signal once, in priority order.
    pub fn decide(&mut self) -> BootDecision {
        let mut decision = BootDecision::new(self.config.default_delay_ms);

        if self.signature.take_armed() {
            decision.hold(HoldReason::Signature);
            decision.timeout_ms = NO_TIMEOUT;
        }

        if let Some(delay) = self.requested_delay_secs() {
            decision.hold(HoldReason::BootDelay);
            decision.extend_timeout(delay.saturating_mul(1000));
        }

        if self.sensors.strap_forced() {
            decision.hold(HoldReason::Strap);
        }

        if self.sensors.presence_asserted() {
            decision.hold(HoldReason::Presence);
        }

        if self.sensors.break_detected() {
            decision.hold(HoldReason::SerialBreak);
        }

        info!(
            "decision: try_boot={=bool} timeout={=u32}ms held_by={}",
            decision.try_boot,
            decision.timeout_ms,
            decision.held_by
        );
        decision
    }

    /// Decide, and launch if nothing held the boot.
    ///
    /// Returns the timeout for the first recovery session. Only returns at all
    /// when staying in recovery.
    pub fn start(&mut self) -> u32 {
        let decision = self.decide();
        if !decision.try_boot {
            return decision.timeout_ms;
        }

        self.launch();

        // Launch came back: make the next reset stop in recovery too.
        self.signature.arm();
        warn!("application did not start, staying in recovery");
        NO_TIMEOUT
    }

    /// Called each time the recovery loop returns. Re-checks the operator
    /// signals and, if released, attempts a launch.
    ///
    /// Returns the timeout for the next recovery session.
    pub fn after_recovery(&mut self, timeout_ms: u32) -> u32 {
        if self.sensors.strap_forced() {
            debug!("strap still asserted");
            return timeout_ms;
        }
        if self.sensors.break_detected() {
            debug!("serial break still asserted");
            return timeout_ms;
        }

        self.launch();

        warn!("application did not start, staying in recovery");
        NO_TIMEOUT
    }

    /// The whole reset sequence. Leaves only by launching an application.
    pub fn run(&mut self) -> ! {
        let mut timeout_ms = self.start();
        loop {
            info!("entering recovery, timeout={=u32}ms", timeout_ms);
            self.app.recovery_loop(timeout_ms, &mut self.flash);
            timeout_ms = self.after_recovery(timeout_ms);
        }
    }

    fn launch(&mut self) {
        if self.config.boot_fail_detect {
            self.signature.arm();
        }
        info!("launching application");
        self.app.transfer_control_to_application();
    }

    fn requested_delay_secs(&self) -> Option<u32> {
        let config = self.config.boot_delay.as_ref()?;
        BootDelayRequest::read(&self.flash, config).delay_secs(config)
    }
}
