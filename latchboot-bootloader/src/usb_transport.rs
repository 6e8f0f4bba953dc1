// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! USB CDC transport with COBS-framed postcard serialization.

use latchboot_common::protocol::{Command, Response, MAX_FRAME_SIZE};
use rp2040_hal::usb::UsbBus;
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

/// One full-speed bulk packet.
const PACKET_SIZE: usize = 64;

pub struct UsbTransport {
    serial: SerialPort<'static, UsbBus>,
    usb_dev: UsbDevice<'static, UsbBus>,
    rx_buf: [u8; MAX_FRAME_SIZE],
    rx_pos: usize,
    /// Bytes read from the endpoint but not yet framed.
    packet: [u8; PACKET_SIZE],
    packet_pos: usize,
    packet_len: usize,
}

impl UsbTransport {
    pub fn new(usb_bus: &'static UsbBusAllocator<UsbBus>) -> Self {
        let serial = SerialPort::new(usb_bus);
        let usb_dev = UsbDeviceBuilder::new(usb_bus, UsbVidPid(0x2E8A, 0x000A))
            .strings(&[StringDescriptors::default()
                .manufacturer("ADNT")
                .product("latchboot recovery")
                .serial_number("0001")])
            .unwrap()
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();

        Self {
            serial,
            usb_dev,
            rx_buf: [0u8; MAX_FRAME_SIZE],
            rx_pos: 0,
            packet: [0u8; PACKET_SIZE],
            packet_pos: 0,
            packet_len: 0,
        }
    }

    /// Poll USB device. Must be called frequently.
    pub fn poll(&mut self) -> bool {
        self.usb_dev.poll(&mut [&mut self.serial])
    }

    /// Try to receive a complete COBS-framed command.
    ///
    /// Frames that fail to decode or overflow the buffer are dropped. Bytes
    /// after a delimiter stay queued for the next call.
    pub fn try_receive(&mut self) -> Option<Command> {
        if self.packet_pos == self.packet_len {
            match self.serial.read(&mut self.packet) {
                Ok(count) if count > 0 => {
                    self.packet_pos = 0;
                    self.packet_len = count;
                }
                _ => return None,
            }
        }

        while self.packet_pos < self.packet_len {
            let byte = self.packet[self.packet_pos];
            self.packet_pos += 1;

            if byte == 0x00 {
                if self.rx_pos == 0 {
                    continue;
                }
                let result = postcard::from_bytes_cobs::<Command>(&mut self.rx_buf[..self.rx_pos]);
                self.rx_pos = 0;
                match result {
                    Ok(cmd) => return Some(cmd),
                    Err(_) => defmt::debug!("dropping malformed frame"),
                }
            } else if self.rx_pos < MAX_FRAME_SIZE {
                self.rx_buf[self.rx_pos] = byte;
                self.rx_pos += 1;
            } else {
                // Overflow, discard frame
                self.rx_pos = 0;
            }
        }
        None
    }

    /// Send a response as a COBS-framed postcard message.
    pub fn send(&mut self, resp: &Response) {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        if let Ok(encoded) = postcard::to_slice_cobs(resp, &mut buf) {
            let mut offset = 0;
            while offset < encoded.len() {
                match self.serial.write(&encoded[offset..]) {
                    Ok(n) => offset += n,
                    Err(UsbError::WouldBlock) => {
                        self.poll();
                    }
                    Err(_) => break,
                }
            }
        }
    }
}
