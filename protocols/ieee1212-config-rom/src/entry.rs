// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

//! For directory entries, the module includes structure, enumeration and trait implementation.
//!
//! Entry structure represents directory entry. KeyType enumerations represents key of entry.
//! EntryData enumeration represents type of directory entry, including its content.

/// The structure to represent directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub key: KeyType,
    pub data: EntryData<'a>,
    /// The offset of the entry in the image, in byte unit.
    pub offset: usize,
}

/// The enumeration to represent key of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Descriptor,
    BusDependentInfo,
    Vendor,
    HardwareVersion,
    Module,
    NodeCapabilities,
    Eui64,
    Unit,
    SpecifierId,
    Version,
    DependentInfo,
    UnitLocation,
    Model,
    Instance,
    Keyword,
    Feature,
    ModifiableDescriptor,
    DirectoryId,
    Reserved(u8),
}

impl From<u8> for KeyType {
    fn from(val: u8) -> Self {
        match val {
            0x01 => KeyType::Descriptor,
            0x02 => KeyType::BusDependentInfo,
            0x03 => KeyType::Vendor,
            0x04 => KeyType::HardwareVersion,
            0x07 => KeyType::Module,
            0x0c => KeyType::NodeCapabilities,
            0x0d => KeyType::Eui64,
            0x11 => KeyType::Unit,
            0x12 => KeyType::SpecifierId,
            0x13 => KeyType::Version,
            0x14 => KeyType::DependentInfo,
            0x15 => KeyType::UnitLocation,
            0x17 => KeyType::Model,
            0x18 => KeyType::Instance,
            0x19 => KeyType::Keyword,
            0x1a => KeyType::Feature,
            0x1f => KeyType::ModifiableDescriptor,
            0x20 => KeyType::DirectoryId,
            _ => KeyType::Reserved(val),
        }
    }
}

impl From<KeyType> for u8 {
    fn from(key: KeyType) -> Self {
        match key {
            KeyType::Descriptor => 0x01,
            KeyType::BusDependentInfo => 0x02,
            KeyType::Vendor => 0x03,
            KeyType::HardwareVersion => 0x04,
            KeyType::Module => 0x07,
            KeyType::NodeCapabilities => 0x0c,
            KeyType::Eui64 => 0x0d,
            KeyType::Unit => 0x11,
            KeyType::SpecifierId => 0x12,
            KeyType::Version => 0x13,
            KeyType::DependentInfo => 0x14,
            KeyType::UnitLocation => 0x15,
            KeyType::Model => 0x17,
            KeyType::Instance => 0x18,
            KeyType::Keyword => 0x19,
            KeyType::Feature => 0x1a,
            KeyType::ModifiableDescriptor => 0x1f,
            KeyType::DirectoryId => 0x20,
            KeyType::Reserved(val) => val,
        }
    }
}

/// The type of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Immediate,
    CsrOffset,
    Leaf,
    Directory,
}

/// The enumeration to represent type of directory entry and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData<'a> {
    Immediate(u32),
    CsrOffset(usize),
    Leaf(&'a [u8]),
    Directory(Vec<Entry<'a>>),
}

impl<'a> EntryData<'a> {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Immediate(_) => EntryKind::Immediate,
            Self::CsrOffset(_) => EntryKind::CsrOffset,
            Self::Leaf(_) => EntryKind::Leaf,
            Self::Directory(_) => EntryKind::Directory,
        }
    }
}

/// Find the first immediate entry for the key, and return its index and value.
pub fn find_immediate(entries: &[Entry], key: KeyType) -> Option<(usize, u32)> {
    entries
        .iter()
        .enumerate()
        .find_map(|(i, entry)| match &entry.data {
            EntryData::Immediate(value) if entry.key == key => Some((i, *value)),
            _ => None,
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_type_from() {
        (0..0x40u8).for_each(|val| {
            let key = KeyType::from(val);
            assert_eq!(val, u8::from(key));
        });
        assert_eq!(KeyType::Reserved(0x38), KeyType::from(0x38));
    }

    #[test]
    fn find_immediate_entry() {
        let entries = [
            Entry {
                key: KeyType::Model,
                data: EntryData::Leaf(&[]),
                offset: 0,
            },
            Entry {
                key: KeyType::Vendor,
                data: EntryData::Immediate(0x00a02d),
                offset: 4,
            },
            Entry {
                key: KeyType::Model,
                data: EntryData::Immediate(0x000010),
                offset: 8,
            },
        ];
        assert_eq!(Some((2, 0x000010)), find_immediate(&entries, KeyType::Model));
        assert_eq!(Some((1, 0x00a02d)), find_immediate(&entries, KeyType::Vendor));
        assert_eq!(None, find_immediate(&entries, KeyType::Version));
        assert_eq!(EntryKind::Leaf, entries[0].data.kind());
    }
}
