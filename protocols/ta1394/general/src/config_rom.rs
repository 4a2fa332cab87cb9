// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

//! Typical data layout of Configuration ROM for AV/C devices defined by 1394 Trading Association.
//!
//! The immediate entry for vendor or model is followed by the leaf entry for textual descriptor
//! of its name. The model entry is either in root directory or in unit directory.

use {ieee1212_config_rom::*, std::convert::TryFrom};

/// The data of vendor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VendorData<'a> {
    pub vendor_id: u32,
    pub vendor_name: &'a str,
}

/// The data of unit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitData<'a> {
    pub model_id: u32,
    pub model_name: &'a str,
    pub specifier_id: u32,
    pub version: u32,
}

impl<'a> UnitData<'a> {
    /// Whether the unit is for AV/C command set defined by 1394 Trading Association.
    pub fn is_avc(&self) -> bool {
        self.specifier_id == UnitDirectory::SPECIFIER_ID_TA1394
            && self.version == UnitDirectory::VERSION_AVC
    }
}

/// For detection of typical layout.
pub trait Ta1394ConfigRom<'a> {
    fn get_vendor(&'a self) -> Option<VendorData<'a>>;
    fn get_model(&'a self) -> Option<UnitData<'a>>;
}

impl<'a> Ta1394ConfigRom<'a> for ConfigRom<'a> {
    fn get_vendor(&'a self) -> Option<VendorData<'a>> {
        detect_desc_text(&self.root, KeyType::Vendor).map(|(vendor_id, vendor_name)| VendorData {
            vendor_id,
            vendor_name,
        })
    }

    fn get_model(&'a self) -> Option<UnitData<'a>> {
        self.root.iter().find_map(|entry| match &entry.data {
            EntryData::Directory(entries) if entry.key == KeyType::Unit => {
                let (_, specifier_id) = find_immediate(entries, KeyType::SpecifierId)?;
                let (_, version) = find_immediate(entries, KeyType::Version)?;
                let (model_id, model_name) = detect_desc_text(entries, KeyType::Model)
                    .or_else(|| detect_desc_text(&self.root, KeyType::Model))?;
                Some(UnitData {
                    model_id,
                    model_name,
                    specifier_id,
                    version,
                })
            }
            _ => None,
        })
    }
}

fn detect_desc_text<'a>(entries: &'a [Entry<'a>], key_type: KeyType) -> Option<(u32, &'a str)> {
    entries.windows(2).find_map(|pair| match (&pair[0].data, pair[1].key) {
        (EntryData::Immediate(value), KeyType::Descriptor) if pair[0].key == key_type => {
            DescriptorLeaf::try_from(&pair[1])
                .ok()
                .and_then(|desc| match desc.data {
                    DescriptorData::Textual(d) if d.is_minimal_ascii() => Some((*value, d.text)),
                    _ => None,
                })
        }
        _ => None,
    })
}
