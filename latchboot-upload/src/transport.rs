// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport layer for bootloader communication.

use anyhow::{anyhow, bail, Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use latchboot_common::protocol::{AckStatus, Command, Response, MAX_FRAME_SIZE};

/// Default timeout for serial operations in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// USB CDC transport for communicating with the bootloader.
pub struct Transport {
    port: Box<dyn SerialPort>,
    rx_buf: Vec<u8>,
}

impl Transport {
    /// Open the specified serial port with the default timeout.
    pub fn new(port_name: &str) -> Result<Self> {
        let port = serialport::new(port_name, 115200)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self {
            port,
            rx_buf: Vec::with_capacity(MAX_FRAME_SIZE),
        })
    }

    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    fn send(&mut self, cmd: &Command) -> Result<()> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = postcard::to_slice_cobs(cmd, &mut buf)
            .map_err(|e| anyhow!("Failed to serialize command: {}", e))?;
        self.port
            .write_all(encoded)
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Response> {
        self.rx_buf.clear();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    self.rx_buf.push(byte[0]);
                    if byte[0] == 0 {
                        break;
                    }
                    if self.rx_buf.len() > MAX_FRAME_SIZE {
                        bail!("Response frame exceeds {} bytes", MAX_FRAME_SIZE);
                    }
                }
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    bail!("Timeout waiting for response");
                }
                Err(e) => bail!("Serial read error: {}", e),
            }
        }

        postcard::from_bytes_cobs(&mut self.rx_buf).map_err(|e| {
            anyhow!(
                "Failed to deserialize response: {} (raw {} bytes: {:02x?})",
                e,
                self.rx_buf.len(),
                &self.rx_buf[..self.rx_buf.len().min(32)]
            )
        })
    }

    fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
    }

    /// Send a command and wait for the response.
    pub fn send_recv(&mut self, cmd: &Command) -> Result<Response> {
        self.drain_rx();
        self.send(cmd)?;
        self.receive()
    }

    /// Send a command and wait for the response with a custom timeout.
    pub fn send_recv_timeout(&mut self, cmd: &Command, timeout_ms: u64) -> Result<Response> {
        let old_timeout = self.port.timeout();
        self.port
            .set_timeout(Duration::from_millis(timeout_ms))
            .context("Failed to set timeout")?;

        let result = self.send_recv(cmd);

        let _ = self.port.set_timeout(old_timeout);
        result
    }

    /// Send a command that answers with a plain acknowledgement.
    pub fn ack(&mut self, cmd: &Command) -> Result<AckStatus> {
        match self.send_recv(cmd)? {
            Response::Ack(status) => Ok(status),
            other => bail!("Unexpected response to {:?}: {:?}", cmd, other),
        }
    }

    /// Send a command that answers with a single word.
    pub fn word(&mut self, cmd: &Command) -> Result<u32> {
        match self.send_recv(cmd)? {
            Response::Word(value) => Ok(value),
            other => bail!("Unexpected response to {:?}: {:?}", cmd, other),
        }
    }
}
