// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for protocol types and framing.

use latchboot_common::protocol::{
    AckStatus, Command, Response, MAX_FRAME_SIZE, MAX_PROGRAM_WORDS,
};

fn encode<T: serde::Serialize>(value: &T) -> Vec<u8> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    postcard::to_slice_cobs(value, &mut buf)
        .expect("frame fits")
        .to_vec()
}

fn decode<'a, T: serde::Deserialize<'a>>(frame: &'a mut [u8]) -> T {
    postcard::from_bytes_cobs(frame).expect("valid frame")
}

// --- Constants ---

#[test]
fn test_program_words_limit() {
    assert_eq!(MAX_PROGRAM_WORDS, 256);
}

#[test]
fn test_full_program_frame_fits() {
    let cmd = Command::ProgramWords {
        address: 0x00FF_FFFC,
        words: (0..MAX_PROGRAM_WORDS as u32).map(|_| u32::MAX).collect(),
    };
    let frame = encode(&cmd);
    assert!(frame.len() <= MAX_FRAME_SIZE);
}

// --- Framing ---

#[test]
fn test_frame_ends_with_delimiter_only() {
    let frame = encode(&Command::EraseSector { sector: 0 });
    assert_eq!(frame.last(), Some(&0));
    assert!(!frame[..frame.len() - 1].contains(&0));
}

#[test]
fn test_program_words_frame_decodes() {
    let cmd = Command::ProgramWords {
        address: 0x100,
        words: [0xDEAD_BEEF, 0, 0xFFFF_FFFF].into_iter().collect(),
    };
    let mut frame = encode(&cmd);
    let decoded: Command = decode(&mut frame);
    assert_eq!(decoded, cmd);
}

#[test]
fn test_crc_command_decodes() {
    let cmd = Command::Crc {
        address: 0,
        length: 0x1_0000,
    };
    let mut frame = encode(&cmd);
    assert_eq!(decode::<Command>(&mut frame), cmd);
}

#[test]
fn test_info_response_decodes() {
    let resp = Response::Info {
        board_id: 0x2040,
        sector_count: 19,
        app_size_max: 0x1E_0000,
    };
    let mut frame = encode(&resp);
    assert_eq!(decode::<Response>(&mut frame), resp);
}

#[test]
fn test_truncated_frame_is_rejected() {
    let mut frame = encode(&Response::Word(0x1234_5678));
    frame.truncate(2);
    assert!(postcard::from_bytes_cobs::<Response>(&mut frame).is_err());
}

#[test]
fn test_unknown_variant_is_rejected() {
    let mut buf = [0u8; 16];
    let frame = postcard::to_slice_cobs(&200u8, &mut buf).expect("frame fits");
    assert!(postcard::from_bytes_cobs::<Command>(frame).is_err());
}

// --- AckStatus ---

#[test]
fn test_ack_status_equality() {
    assert_eq!(AckStatus::Ok, AckStatus::Ok);
    assert_ne!(AckStatus::Ok, AckStatus::AlreadyBlank);
    assert_ne!(AckStatus::BadSector, AckStatus::BadAddress);
}

#[test]
fn test_ack_status_debug() {
    assert_eq!(format!("{:?}", AckStatus::Ok), "Ok");
    assert_eq!(format!("{:?}", AckStatus::AlreadyBlank), "AlreadyBlank");
    assert_eq!(format!("{:?}", AckStatus::BadSector), "BadSector");
    assert_eq!(format!("{:?}", AckStatus::BadAddress), "BadAddress");
    assert_eq!(format!("{:?}", AckStatus::BadCommand), "BadCommand");
}

// --- Command / Response ---

#[test]
fn test_command_debug_names() {
    assert!(format!("{:?}", Command::GetInfo).contains("GetInfo"));
    assert!(format!("{:?}", Command::Boot).contains("Boot"));
    assert!(format!("{:?}", Command::Reboot).contains("Reboot"));
    let debug = format!("{:?}", Command::ReadOtp { offset: 16 });
    assert!(debug.contains("ReadOtp"));
    assert!(debug.contains("16"));
}

#[test]
fn test_response_ack_debug() {
    let debug = format!("{:?}", Response::Ack(AckStatus::AlreadyBlank));
    assert!(debug.contains("Ack"));
    assert!(debug.contains("AlreadyBlank"));
}
