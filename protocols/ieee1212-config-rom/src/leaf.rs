// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

//! Leaf entry has structured data. The module includes structure, enumeration and trait
//! implementation to parse it.
//!
//! DescriptorLeaf structure represents descriptor itself. The structure implements TryFrom trait
//! to convert from the content of leaf entry. DescriptorData enumeration represents data of
//! descriptor. TextualDescriptorData represents the data of Textual descriptor. Eui64Leaf,
//! UnitLocationLeaf, and KeywordLeaf represent the other leaves with fixed layout.

use super::*;

use std::convert::TryFrom;

/// The structure to represent error cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafParseError {
    pub ctx: LeafParseCtx,
    pub msg: String,
}

impl LeafParseError {
    pub fn new(ctx: LeafParseCtx, msg: String) -> Self {
        LeafParseError { ctx, msg }
    }
}

impl std::fmt::Display for LeafParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.ctx, self.msg)
    }
}

impl std::error::Error for LeafParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafParseCtx {
    TooShort,
    InvalidTextString,
    UnsupportedTextEncoding,
    UnsupportedType,
    WrongDirectoryEntry,
}

impl std::fmt::Display for LeafParseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ctx = match self {
            LeafParseCtx::TooShort => "too short leaf",
            LeafParseCtx::InvalidTextString => "invalid text string in leaf",
            LeafParseCtx::UnsupportedTextEncoding => "unsupported encoding of text",
            LeafParseCtx::UnsupportedType => "unsupported type",
            LeafParseCtx::WrongDirectoryEntry => "wrong directory entry",
        };
        write!(f, "{}", ctx)
    }
}

fn check_length(raw: &[u8], length: usize) -> Result<(), LeafParseError> {
    if raw.len() < length {
        let msg = format!("{} bytes, but {} bytes required", raw.len(), length);
        Err(LeafParseError::new(LeafParseCtx::TooShort, msg))
    } else {
        Ok(())
    }
}

/// The structure represents data of textual descriptor.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextualDescriptorData<'a> {
    pub width: u8,
    pub character_set: u16,
    pub language: u16,
    pub text: &'a str,
}

impl<'a> TextualDescriptorData<'a> {
    /// Whether the text is encoded in fixed one-byte width, minimal ASCII, and no language.
    pub fn is_minimal_ascii(&self) -> bool {
        self.width == 0 && self.character_set == 0 && self.language == 0
    }
}

impl<'a> TryFrom<&'a [u8]> for TextualDescriptorData<'a> {
    type Error = LeafParseError;

    fn try_from(raw: &'a [u8]) -> Result<Self, Self::Error> {
        check_length(raw, 4)?;

        let mut quadlet = [0; 4];
        quadlet.copy_from_slice(&raw[..4]);
        let meta = u32::from_be_bytes(quadlet);
        let width = ((meta & 0xf0000000) >> 28) as u8;
        let character_set = ((meta & 0x0fff0000) >> 16) as u16;
        let language = (meta & 0x0000ffff) as u16;

        // Strip trailing NULs as padding to quadlet boundary.
        let literal = &raw[4..];
        let length = literal
            .iter()
            .rposition(|&c| c != 0x00)
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let text = std::str::from_utf8(&literal[..length]).map_err(|e| {
            LeafParseError::new(LeafParseCtx::InvalidTextString, e.to_string())
        })?;

        Ok(TextualDescriptorData {
            width,
            character_set,
            language,
            text,
        })
    }
}

/// The enumeration represents data of descriptor according to its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorData<'a> {
    Textual(TextualDescriptorData<'a>),
    /// The type of descriptor and its content.
    Reserved(u8, &'a [u8]),
}

impl<'a> DescriptorData<'a> {
    const TEXTUAL_DESCRIPTOR_TYPE: u8 = 0;
}

/// The structure represents descriptor in content of leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorLeaf<'a> {
    pub spec_id: u32,
    pub data: DescriptorData<'a>,
}

impl<'a> TryFrom<&'a [u8]> for DescriptorLeaf<'a> {
    type Error = LeafParseError;

    fn try_from(raw: &'a [u8]) -> Result<Self, Self::Error> {
        check_length(raw, 4)?;

        let mut quadlet = [0; 4];
        quadlet.copy_from_slice(&raw[..4]);
        let spec_id = u32::from_be_bytes(quadlet) & 0x00ffffff;
        let desc_type = raw[0];

        // NOTE: The layout of textual descriptor is defined just for the specifier id 0.
        let data = if spec_id == 0 && desc_type == DescriptorData::TEXTUAL_DESCRIPTOR_TYPE {
            TextualDescriptorData::try_from(&raw[4..]).map(|d| DescriptorData::Textual(d))?
        } else {
            DescriptorData::Reserved(desc_type, &raw[4..])
        };

        Ok(Self { spec_id, data })
    }
}

impl<'a> TryFrom<&'a Entry<'a>> for DescriptorLeaf<'a> {
    type Error = LeafParseError;

    fn try_from(entry: &'a Entry<'a>) -> Result<Self, Self::Error> {
        if let EntryData::Leaf(leaf) = &entry.data {
            Self::try_from(&leaf[..])
        } else {
            let label = match &entry.data {
                EntryData::Immediate(_) => "immediate",
                EntryData::CsrOffset(_) => "csr-offset",
                EntryData::Directory(_) => "directory",
                EntryData::Leaf(_) => unreachable!(),
            };
            let msg = format!("{} entry", label);
            Err(Self::Error::new(LeafParseCtx::WrongDirectoryEntry, msg))
        }
    }
}

/// The structure represents leaf for EUI-64.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eui64Leaf(pub u64);

impl TryFrom<&[u8]> for Eui64Leaf {
    type Error = LeafParseError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        check_length(raw, 8)?;

        let mut octlet = [0; 8];
        octlet.copy_from_slice(&raw[..8]);
        Ok(Self(u64::from_be_bytes(octlet)))
    }
}

/// The structure represents leaf for unit location, the range of address space for the unit.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLocationLeaf {
    pub base_address: u64,
    pub upper_bound: u64,
}

impl TryFrom<&[u8]> for UnitLocationLeaf {
    type Error = LeafParseError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        check_length(raw, 16)?;

        let mut octlet = [0; 8];
        octlet.copy_from_slice(&raw[..8]);
        let base_address = u64::from_be_bytes(octlet);
        octlet.copy_from_slice(&raw[8..16]);
        let upper_bound = u64::from_be_bytes(octlet);
        Ok(Self {
            base_address,
            upper_bound,
        })
    }
}

/// The structure represents leaf for keywords, the list of strings terminated by NUL.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct KeywordLeaf<'a>(pub Vec<&'a str>);

impl<'a> TryFrom<&'a [u8]> for KeywordLeaf<'a> {
    type Error = LeafParseError;

    fn try_from(raw: &'a [u8]) -> Result<Self, Self::Error> {
        raw.split(|&c| c == 0x00)
            .filter(|literal| !literal.is_empty())
            .map(|literal| {
                std::str::from_utf8(literal).map_err(|e| {
                    LeafParseError::new(LeafParseCtx::InvalidTextString, e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|keywords| Self(keywords))
    }
}
