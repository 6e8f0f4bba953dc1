// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for bootloader operations.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use crc::{Crc, CRC_32_ISO_HDLC};
use indicatif::{ProgressBar, ProgressStyle};

use latchboot_common::flash::{ERASED_WORD, OTP_SIZE, WORD_SIZE};
use latchboot_common::protocol::{AckStatus, Command, Response, MAX_PROGRAM_WORDS};
use latchboot_common::sectors::{self, SectorDescriptor};

use crate::transport::Transport;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Large sectors take around a second each to erase.
const ERASE_TIMEOUT_MS: u64 = 10_000;

/// Words in the factory unique ID.
const SERIAL_WORDS: u32 = 3;

struct DeviceInfo {
    board_id: u32,
    app_size_max: u32,
    sectors: Vec<SectorDescriptor>,
}

fn query_info(transport: &mut Transport) -> Result<DeviceInfo> {
    let (board_id, sector_count, app_size_max) = match transport.send_recv(&Command::GetInfo)? {
        Response::Info {
            board_id,
            sector_count,
            app_size_max,
        } => (board_id, sector_count, app_size_max),
        other => bail!("Unexpected response to GetInfo: {:?}", other),
    };

    let mut sectors = Vec::with_capacity(sector_count as usize);
    for sector in 0..sector_count {
        let size = transport.word(&Command::GetSectorSize { sector })?;
        sectors.push(SectorDescriptor::new(sector, size));
    }

    Ok(DeviceInfo {
        board_id,
        app_size_max,
        sectors,
    })
}

/// Display board id and flash layout.
pub fn info(transport: &mut Transport) -> Result<()> {
    let info = query_info(transport)?;

    println!("Bootloader Info:");
    println!("  Board id:     0x{:08x}", info.board_id);
    println!("  App size max: {} KiB", info.app_size_max / 1024);
    println!("  Sectors:      {}", info.sectors.len());
    for (index, sector) in info.sectors.iter().enumerate() {
        println!(
            "    {:2}: 0x{:06x} {:4} KiB",
            index,
            sectors::sector_base(&info.sectors, index),
            sector.size / 1024
        );
    }

    Ok(())
}

/// Erase, program and verify an application image.
pub fn flash(transport: &mut Transport, file: &Path, boot_after: bool) -> Result<()> {
    let image = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if image.is_empty() {
        bail!("{} is empty", file.display());
    }
    let crc32 = CRC32.checksum(&image);

    println!(
        "Firmware: {} ({} bytes, CRC32: 0x{:08x})",
        file.display(),
        image.len(),
        crc32
    );

    let info = query_info(transport)?;
    let size = image.len() as u32;
    if size > info.app_size_max {
        bail!(
            "Image is {} bytes, the board holds at most {}",
            size,
            info.app_size_max
        );
    }

    let last = sectors_to_erase(&info.sectors, size)?;
    for sector in 0..=last {
        erase_sector(transport, sector as u32)?;
    }

    let words = image_words(&image);
    let pb = ProgressBar::new(size as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut address = 0u32;
    for block in words.chunks(MAX_PROGRAM_WORDS) {
        let status = transport.ack(&Command::ProgramWords {
            address,
            words: block.to_vec(),
        })?;
        if status != AckStatus::Ok {
            pb.abandon();
            bail!("Program failed at 0x{:06x}: {:?}", address, status);
        }

        address += block.len() as u32 * WORD_SIZE;
        pb.set_position(u64::from(address.min(size)));
    }

    pb.finish_with_message("Program complete");
    println!();

    print!("Verifying... ");
    std::io::stdout().flush()?;

    let response = transport.send_recv_timeout(
        &Command::Crc {
            address: 0,
            length: size,
        },
        ERASE_TIMEOUT_MS,
    )?;
    match response {
        Response::Crc(actual) if actual == crc32 => println!("OK"),
        Response::Crc(actual) => bail!(
            "CRC verification failed: expected 0x{:08x}, device has 0x{:08x}",
            crc32,
            actual
        ),
        _ => bail!("Unexpected response: {:?}", response),
    }

    if boot_after {
        return boot(transport);
    }

    println!();
    println!("Firmware flashed successfully!");
    println!(
        "Use 'latchboot-upload --port {} boot' to start it.",
        transport.port_name()
    );
    Ok(())
}

/// Erase the whole application region.
pub fn erase(transport: &mut Transport) -> Result<()> {
    let info = query_info(transport)?;
    for sector in 0..info.sectors.len() {
        erase_sector(transport, sector as u32)?;
    }
    println!("Application region erased.");
    Ok(())
}

fn erase_sector(transport: &mut Transport, sector: u32) -> Result<()> {
    print!("Erasing sector {}... ", sector);
    std::io::stdout().flush()?;

    match transport.send_recv_timeout(&Command::EraseSector { sector }, ERASE_TIMEOUT_MS)? {
        Response::Ack(AckStatus::Ok) => println!("OK"),
        Response::Ack(AckStatus::AlreadyBlank) => println!("blank"),
        Response::Ack(status) => bail!("Erase of sector {} failed: {:?}", sector, status),
        other => bail!("Unexpected response: {:?}", other),
    }
    Ok(())
}

/// Dump the OTP region, one row of four words per line.
pub fn otp(transport: &mut Transport) -> Result<()> {
    for row in (0..OTP_SIZE).step_by(16) {
        let mut line = format!("{:03x}:", row);
        for offset in (row..row + 16).step_by(WORD_SIZE as usize) {
            let word = transport.word(&Command::ReadOtp { offset })?;
            line.push_str(&format!(" {:08x}", word));
        }
        println!("{}", line);
    }
    Ok(())
}

/// Print the factory unique ID.
pub fn serial(transport: &mut Transport) -> Result<()> {
    let mut id = String::new();
    for i in 0..SERIAL_WORDS {
        let word = transport.word(&Command::ReadUniqueId {
            offset: i * WORD_SIZE,
        })?;
        id.push_str(&format!("{:08x}", word));
    }
    println!("{}", id);
    Ok(())
}

/// Ask the bootloader to launch the installed application.
pub fn boot(transport: &mut Transport) -> Result<()> {
    print!("Booting application... ");
    std::io::stdout().flush()?;

    match transport.ack(&Command::Boot)? {
        AckStatus::Ok => println!("OK"),
        status => bail!("Boot failed: {:?}", status),
    }
    Ok(())
}

/// Reboot the device.
pub fn reboot(transport: &mut Transport) -> Result<()> {
    print!("Rebooting device... ");
    std::io::stdout().flush()?;

    match transport.ack(&Command::Reboot)? {
        AckStatus::Ok => println!("OK"),
        status => bail!("Reboot failed: {:?}", status),
    }
    Ok(())
}

/// Index of the last sector an image of `size` bytes touches.
fn sectors_to_erase(table: &[SectorDescriptor], size: u32) -> Result<usize> {
    sectors::sector_containing(table, size.saturating_sub(1))
        .with_context(|| format!("No sector covers an image of {} bytes", size))
}

/// Little-endian words, the tail padded with erased bytes.
fn image_words(image: &[u8]) -> Vec<u32> {
    image
        .chunks(WORD_SIZE as usize)
        .map(|chunk| {
            let mut bytes = ERASED_WORD.to_le_bytes();
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [SectorDescriptor; 3] = [
        SectorDescriptor::new(0, 0x4000),
        SectorDescriptor::new(1, 0x4000),
        SectorDescriptor::new(2, 0x10000),
    ];

    #[test]
    fn test_image_words_pads_tail_with_erased_bytes() {
        assert_eq!(
            image_words(&[1, 2, 3, 4, 5]),
            vec![0x0403_0201, 0xFFFF_FF05]
        );
    }

    #[test]
    fn test_sectors_to_erase_covers_last_byte() {
        assert_eq!(sectors_to_erase(&TABLE, 1).unwrap(), 0);
        assert_eq!(sectors_to_erase(&TABLE, 0x4000).unwrap(), 0);
        assert_eq!(sectors_to_erase(&TABLE, 0x4001).unwrap(), 1);
        assert_eq!(sectors_to_erase(&TABLE, 0x18000).unwrap(), 2);
    }

    #[test]
    fn test_sectors_to_erase_rejects_oversized_image() {
        assert!(sectors_to_erase(&TABLE, 0x18001).is_err());
    }
}
