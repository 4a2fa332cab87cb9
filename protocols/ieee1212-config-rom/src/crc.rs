// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

//! The module includes the computation of CRC-16 for directory and leaf blocks in IEEE 1212.

/// Compute CRC-16 defined in IEEE 1212 for the body of block. The length of body should be
/// multiples of 4; remaining bytes are ignored.
pub fn crc16(body: &[u8]) -> u16 {
    let mut crc = 0u32;
    body.chunks_exact(4).for_each(|quadlet| {
        let data = u32::from_be_bytes([quadlet[0], quadlet[1], quadlet[2], quadlet[3]]);
        (0..=28).rev().step_by(4).for_each(|shift| {
            let sum = ((crc >> 12) ^ (data >> shift)) & 0x0f;
            crc = (crc << 4) ^ (sum << 12) ^ (sum << 5) ^ sum;
        });
        crc &= 0xffff;
    });
    crc as u16
}
