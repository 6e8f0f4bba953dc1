// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Recovery command handling, independent of the transport.
//!
//! The board feeds decoded [`Command`]s in and sends back the returned
//! [`Response`]. The session also tracks the recovery timeout: it elapses only
//! if no command has been handled yet.

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::flash::{EraseOutcome, FlashAccess, WORD_SIZE};
use crate::hal::FlashHardware;
use crate::protocol::{AckStatus, Command, Response, MAX_PROGRAM_WORDS};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// What the transport loop should do after sending the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    Continue,
    /// Leave recovery and attempt a launch.
    Boot,
    /// Reset the chip.
    Reboot,
}

pub struct RecoverySession {
    board_id: u32,
    timeout_ms: u32,
    active: bool,
}

impl RecoverySession {
    /// `timeout_ms` of 0 never elapses.
    pub fn new(board_id: u32, timeout_ms: u32) -> Self {
        Self {
            board_id,
            timeout_ms,
            active: false,
        }
    }

    /// Whether a host has talked to us during this session.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn expired(&self, elapsed_ms: u64) -> bool {
        self.timeout_ms != 0 && !self.active && elapsed_ms >= u64::from(self.timeout_ms)
    }

    pub fn handle<F: FlashHardware>(
        &mut self,
        flash: &mut FlashAccess<'_, F>,
        cmd: Command,
    ) -> (Response, Flow) {
        if !self.active {
            debug!("host connected, timeout cancelled");
        }
        self.active = true;

        let response = match cmd {
            Command::GetInfo => {
                let layout = flash.layout();
                Response::Info {
                    board_id: self.board_id,
                    sector_count: layout.sector_count() as u32,
                    app_size_max: layout.app_size_max(),
                }
            }
            Command::GetSectorSize { sector } => {
                Response::Word(flash.sector_size(sector as usize))
            }
            Command::EraseSector { sector } => Response::Ack(match flash.erase(sector as usize) {
                EraseOutcome::Erased => AckStatus::Ok,
                EraseOutcome::AlreadyBlank => AckStatus::AlreadyBlank,
                EraseOutcome::NoSuchSector => AckStatus::BadSector,
            }),
            Command::ProgramWords { address, words } => {
                Response::Ack(program_words(flash, address, &words))
            }
            Command::ReadWord { address } => Response::Word(flash.read_word(address)),
            Command::ReadOtp { offset } => Response::Word(flash.read_otp(offset)),
            Command::ReadUniqueId { offset } => Response::Word(flash.read_unique_id(offset)),
            Command::Crc { address, length } => {
                if !flash.layout().contains(address, length) {
                    Response::Ack(AckStatus::BadAddress)
                } else {
                    Response::Crc(crc32(flash, address, length))
                }
            }
            Command::Boot => return (Response::Ack(AckStatus::Ok), Flow::Boot),
            Command::Reboot => return (Response::Ack(AckStatus::Ok), Flow::Reboot),
        };

        (response, Flow::Continue)
    }
}

/// All-or-nothing range check, then one word at a time.
fn program_words<F: FlashHardware>(
    flash: &mut FlashAccess<'_, F>,
    address: u32,
    words: &[u32],
) -> AckStatus {
    if words.len() > MAX_PROGRAM_WORDS {
        return AckStatus::BadCommand;
    }
    let length = words.len() as u32 * WORD_SIZE;
    if address % WORD_SIZE != 0 || !flash.layout().contains(address, length) {
        return AckStatus::BadAddress;
    }

    for (i, &word) in words.iter().enumerate() {
        flash.program_word(address + i as u32 * WORD_SIZE, word);
    }
    AckStatus::Ok
}

/// CRC-32 (ISO HDLC) over `length` bytes of the application region. The
/// caller has already checked the range.
pub fn crc32<F: FlashHardware>(flash: &FlashAccess<'_, F>, address: u32, length: u32) -> u32 {
    let end = address + length;
    let mut digest = CRC32.digest();
    let mut word_address = address & !(WORD_SIZE - 1);

    while word_address < end {
        let bytes = flash.read_word(word_address).to_le_bytes();
        let lo = address.saturating_sub(word_address) as usize;
        let hi = (end - word_address).min(WORD_SIZE) as usize;
        digest.update(&bytes[lo..hi]);
        word_address += WORD_SIZE;
    }

    digest.finalize()
}
