// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

//! The capability of transport consumed by the AV/C codec and the reader of Configuration ROM.

use std::time::Duration;

/// The offset of Configuration ROM in address space of node.
pub const CONFIG_ROM_OFFSET: u64 = 0xfffff0000400;

/// The maximum size of Configuration ROM in general format.
pub const CONFIG_ROM_SIZE: usize = 1024;

/// The maximum address in 48 bit address space of node.
pub const ADDRESS_MAX: u64 = 0xffffffffffff;

/// The error of transport.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// No response arrives within the timeout.
    #[error("timeout")]
    Timeout,
    /// Any failure in the transport.
    #[error("{0}")]
    Io(String),
}

/// Check whether the range of address is within 48 bit address space.
pub fn check_address(addr: u64, length: usize) -> Result<(), TransportError> {
    let end = addr.checked_add(length as u64);
    match end {
        Some(end) if addr <= ADDRESS_MAX && end <= ADDRESS_MAX + 1 => Ok(()),
        _ => Err(TransportError::Io(format!(
            "address 0x{:x} with {} bytes is over 48 bit address space",
            addr, length
        ))),
    }
}

/// The trait for transport to node in IEEE 1394 bus.
///
/// The implementation of read and write operations should check the address by `check_address()`
/// before any transaction.
pub trait Ta1394Transport {
    /// Read a quadlet at the address.
    fn read_quadlet(&self, addr: u64) -> Result<u32, TransportError>;

    /// Read a block of the length at the address.
    fn read_block(&self, addr: u64, length: usize) -> Result<Vec<u8>, TransportError>;

    /// Write a block at the address.
    fn write_block(&self, addr: u64, data: &[u8]) -> Result<(), TransportError>;

    /// Transmit request frame of Function Control Protocol, then return the first response frame.
    fn fcp_exchange(&self, req: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Wait for the next response frame of Function Control Protocol, typically the final
    /// response of deferred transaction.
    fn fcp_receive(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let _ = timeout;
        Err(TransportError::Timeout)
    }

    /// Read content of Configuration ROM, just as long as the blocks referred from the root
    /// directory.
    fn read_config_rom(&self) -> Result<Vec<u8>, TransportError> {
        let read_to = |rom: &mut Vec<u8>, end: usize| -> Result<(), TransportError> {
            while rom.len() < end.min(CONFIG_ROM_SIZE) {
                let quadlet = self.read_quadlet(CONFIG_ROM_OFFSET + rom.len() as u64)?;
                rom.extend_from_slice(&quadlet.to_be_bytes());
            }
            Ok(())
        };

        let mut rom = Vec::new();
        read_to(&mut rom, 4)?;

        let root_pos = 4 + 4 * rom[0] as usize;
        let mut directories = vec![root_pos];

        while let Some(header_pos) = directories.pop() {
            read_to(&mut rom, header_pos + 4)?;
            if rom.len() < header_pos + 4 {
                continue;
            }
            let length = 4 * u16::from_be_bytes([rom[header_pos], rom[header_pos + 1]]) as usize;
            let end = header_pos + 4 + length;
            read_to(&mut rom, end)?;

            let mut pos = header_pos + 4;
            while pos + 4 <= end.min(rom.len()) {
                let entry_type = rom[pos] >> 6;
                let value = u32::from_be_bytes([0, rom[pos + 1], rom[pos + 2], rom[pos + 3]]);
                let target = pos + 4 * value as usize;
                if value > 0 && target < CONFIG_ROM_SIZE {
                    match entry_type {
                        2 => {
                            read_to(&mut rom, target + 4)?;
                            if rom.len() >= target + 4 {
                                let length =
                                    4 * u16::from_be_bytes([rom[target], rom[target + 1]]) as usize;
                                read_to(&mut rom, target + 4 + length)?;
                            }
                        }
                        3 => directories.push(target),
                        _ => (),
                    }
                }
                pos += 4;
            }
        }

        Ok(rom)
    }
}
