// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

//! The module includes structure for bus information block defined in IEEE 1394.

use std::convert::TryFrom;

/// The structure represents bus information block defined in IEEE 1394.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ieee1394BusInfo {
    /// Isochronous resource manager capable.
    pub irmc: bool,
    /// Cycle master capable.
    pub cmc: bool,
    /// Isochronous transaction capable.
    pub isc: bool,
    /// Bus manager capable.
    pub bmc: bool,
    /// Power manager capable.
    pub pmc: bool,
    /// The accuracy of cycle clock, in parts per million.
    pub cyc_clk_acc: u8,
    /// The maximum size of payload for block write request, in exponent of 2 minus 1.
    pub max_rec: u8,
    /// The maximum size of block read from configuration ROM.
    pub max_rom: u8,
    /// The generation of configuration ROM, incremented at any change.
    pub generation: u8,
    /// The speed of link layer.
    pub link_spd: u8,
    /// The OUI of node vendor.
    pub node_vendor_id: u32,
    /// The identifier of chip, in 40 bits.
    pub chip_id: u64,
}

impl Ieee1394BusInfo {
    /// The name in bus information block.
    pub const BUS_NAME: [u8; 4] = *b"1394";

    const LENGTH: usize = 16;

    /// The globally unique identifier of node in 64 bits.
    pub fn guid(&self) -> u64 {
        ((self.node_vendor_id as u64) << 40) | (self.chip_id & 0xffffffffff)
    }
}

impl TryFrom<&[u8]> for Ieee1394BusInfo {
    type Error = String;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        if raw.len() < Self::LENGTH {
            Err(format!("{} bytes are too short for bus information", raw.len()))?;
        }
        if raw[..4] != Self::BUS_NAME {
            Err(format!("unexpected bus name: {:02x?}", &raw[..4]))?;
        }

        let mut quadlet = [0; 4];
        quadlet.copy_from_slice(&raw[4..8]);
        let caps = u32::from_be_bytes(quadlet);

        quadlet.copy_from_slice(&raw[8..12]);
        let guid_hi = u32::from_be_bytes(quadlet);
        quadlet.copy_from_slice(&raw[12..16]);
        let guid_lo = u32::from_be_bytes(quadlet);

        Ok(Self {
            irmc: caps & 0x80000000 > 0,
            cmc: caps & 0x40000000 > 0,
            isc: caps & 0x20000000 > 0,
            bmc: caps & 0x10000000 > 0,
            pmc: caps & 0x08000000 > 0,
            cyc_clk_acc: ((caps >> 16) & 0xff) as u8,
            max_rec: ((caps >> 12) & 0x0f) as u8,
            max_rom: ((caps >> 8) & 0x03) as u8,
            generation: ((caps >> 4) & 0x0f) as u8,
            link_spd: (caps & 0x07) as u8,
            node_vendor_id: guid_hi >> 8,
            chip_id: (((guid_hi & 0xff) as u64) << 32) | guid_lo as u64,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bus_info_from_raw() {
        let raw = [
            0x31, 0x33, 0x39, 0x34, 0xf0, 0x64, 0xb2, 0x23, 0x00, 0x0f, 0xf2, 0x01, 0x23, 0x45,
            0x67, 0x89,
        ];
        let info = Ieee1394BusInfo::try_from(&raw[..]).unwrap();
        assert_eq!(true, info.irmc);
        assert_eq!(true, info.cmc);
        assert_eq!(true, info.isc);
        assert_eq!(true, info.bmc);
        assert_eq!(false, info.pmc);
        assert_eq!(100, info.cyc_clk_acc);
        assert_eq!(11, info.max_rec);
        assert_eq!(2, info.max_rom);
        assert_eq!(2, info.generation);
        assert_eq!(3, info.link_spd);
        assert_eq!(0x000ff2, info.node_vendor_id);
        assert_eq!(0x0123456789, info.chip_id);
        assert_eq!(0x000ff20123456789, info.guid());
    }

    #[test]
    fn bus_info_with_other_name() {
        let raw = [0x31, 0x32, 0x31, 0x32, 0x00, 0x00, 0x00, 0x00];
        assert!(Ieee1394BusInfo::try_from(&raw[..]).is_err());

        let mut raw = [0; 16];
        raw[..4].copy_from_slice(b"ABCD");
        assert!(Ieee1394BusInfo::try_from(&raw[..]).is_err());
    }
}
