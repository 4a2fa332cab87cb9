// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

#![doc = include_str!("../README.md")]

mod bus_info;
mod crc;
mod entry;
mod leaf;
mod parser;

pub use {bus_info::*, crc::*, entry::*, leaf::*, parser::*};

use std::convert::TryFrom;

/// The structure to express content of configuration ROM in IEEE 1212.
///
/// The structure implements std::convert::TryFrom<&[u8]> to lex raw data of configuration ROM.
/// The structure refers to content of the raw data, thus has the same lifetime of the raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRom<'a> {
    /// The content of bus information block.
    pub bus_info: &'a [u8],
    /// The directory entries in root directory block.
    pub root: Vec<Entry<'a>>,
}

/// Lex the raw data of configuration ROM.
pub fn lex(raw: &[u8]) -> Result<ConfigRom<'_>, ConfigRomParseError> {
    ConfigRom::try_from(raw)
}

/// The reason of structural failure to lex configuration ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// The length of bus information block is zero or over the image.
    BadBusInfoLength,
    /// The length of directory block is over the image.
    BadDirectoryLength,
    /// The length of leaf block is over the image, or too short for its content.
    BadLeafLength,
    /// The CRC-16 in block header is different from the computed one.
    BadCrc,
    /// The offset in directory entry points backward, or outside of the image.
    BadOffset,
    /// The directory entry points to the directory including itself.
    Cycle,
    /// The entry required in the directory is missing.
    MissingEntry(KeyType),
    /// The entry has unexpected type.
    UnexpectedEntryType(KeyType),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadBusInfoLength => write!(f, "bad length of bus information block"),
            Self::BadDirectoryLength => write!(f, "bad length of directory block"),
            Self::BadLeafLength => write!(f, "bad length of leaf block"),
            Self::BadCrc => write!(f, "CRC mismatch"),
            Self::BadOffset => write!(f, "bad offset to block"),
            Self::Cycle => write!(f, "cyclic reference of directory"),
            Self::MissingEntry(key) => write!(f, "missing {:?} entry", key),
            Self::UnexpectedEntryType(key) => write!(f, "unexpected type of {:?} entry", key),
        }
    }
}

/// The structure to express error cause to parse raw data of configuration ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRomParseError {
    /// The stack of context from the outermost.
    pub ctx: Vec<ConfigRomParseCtx>,
    /// The reason of failure.
    pub cause: MalformedReason,
    /// The offset in the image, in byte unit.
    pub offset: usize,
}

impl ConfigRomParseError {
    pub(crate) fn new(ctx: ConfigRomParseCtx, cause: MalformedReason, offset: usize) -> Self {
        ConfigRomParseError {
            ctx: vec![ctx],
            cause,
            offset,
        }
    }

    fn within(mut self, ctx: ConfigRomParseCtx) -> Self {
        self.ctx.insert(0, ctx);
        self
    }
}

impl std::fmt::Display for ConfigRomParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ctx = String::new();

        let mut ctx_iter = self.ctx.iter();
        ctx_iter
            .by_ref()
            .nth(0)
            .map(|c| ctx.push_str(&c.to_string()));
        ctx_iter.for_each(|c| {
            ctx.push_str(" -> ");
            ctx.push_str(&c.to_string());
        });

        write!(f, "{}: {} at offset {}", ctx, self.cause, self.offset)
    }
}

impl std::error::Error for ConfigRomParseError {}

/// The context to parse configuration ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigRomParseCtx {
    BusInfo,
    RootDirectory,
    DirectoryEntry(u8),
    Leaf(u8),
}

impl std::fmt::Display for ConfigRomParseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigRomParseCtx::BusInfo => write!(f, "bus-info"),
            ConfigRomParseCtx::RootDirectory => write!(f, "root-directory"),
            ConfigRomParseCtx::DirectoryEntry(key) => {
                write!(f, "directory-entry (key: 0x{:02x})", key)
            }
            ConfigRomParseCtx::Leaf(key) => write!(f, "leaf (key: 0x{:02x})", key),
        }
    }
}

impl<'a> TryFrom<&'a [u8]> for ConfigRom<'a> {
    type Error = ConfigRomParseError;

    fn try_from(raw: &'a [u8]) -> Result<Self, Self::Error> {
        let ctx = ConfigRomParseCtx::BusInfo;

        // NOTE: The CRC in the header of bus information block is not checked since it is zero in
        // many devices.
        let bus_info_length = raw.first().map(|&quads| 4 * quads as usize).unwrap_or(0);
        if bus_info_length == 0 || 4 + bus_info_length > raw.len() {
            Err(ConfigRomParseError::new(
                ctx,
                MalformedReason::BadBusInfoLength,
                0,
            ))?;
        }

        let mut pos = 4;
        let bus_info = &raw[pos..(pos + bus_info_length)];
        pos += bus_info_length;

        let root_pos = pos;
        let (body_pos, length) =
            read_block_header(raw, root_pos, MalformedReason::BadDirectoryLength).map_err(
                |(cause, offset)| {
                    ConfigRomParseError::new(ConfigRomParseCtx::RootDirectory, cause, offset)
                },
            )?;

        let mut ancestors = vec![root_pos];
        get_directory_entry_list(raw, body_pos, length, &mut ancestors)
            .map_err(|e| e.within(ConfigRomParseCtx::RootDirectory))
            .map(|root| ConfigRom { bus_info, root })
    }
}

const ENTRY_KEY_IMMEDIATE: u8 = 0;
const ENTRY_KEY_CSR_OFFSET: u8 = 1;
const ENTRY_KEY_LEAF: u8 = 2;
const ENTRY_KEY_DIRECTORY: u8 = 3;

// Check the header of block and return the position and the length of its body.
fn read_block_header(
    raw: &[u8],
    header_pos: usize,
    bad_length: MalformedReason,
) -> Result<(usize, usize), (MalformedReason, usize)> {
    if header_pos + 4 > raw.len() {
        Err((MalformedReason::BadOffset, header_pos))?;
    }

    let doublet = [raw[header_pos], raw[header_pos + 1]];
    let length = 4 * u16::from_be_bytes(doublet) as usize;
    let doublet = [raw[header_pos + 2], raw[header_pos + 3]];
    let crc = u16::from_be_bytes(doublet);

    let body_pos = header_pos + 4;
    if body_pos + length > raw.len() {
        Err((bad_length, header_pos))?;
    }

    if crc16(&raw[body_pos..(body_pos + length)]) != crc {
        Err((MalformedReason::BadCrc, header_pos))?;
    }

    Ok((body_pos, length))
}

fn get_directory_entry_list<'a>(
    raw: &'a [u8],
    directory_pos: usize,
    directory_length: usize,
    ancestors: &mut Vec<usize>,
) -> Result<Vec<Entry<'a>>, ConfigRomParseError> {
    let mut entries = Vec::new();

    let mut pos = directory_pos;

    while pos < directory_pos + directory_length {
        let entry_type = raw[pos] >> 6;
        let key = raw[pos] & 0x3f;
        let quadlet = [0, raw[pos + 1], raw[pos + 2], raw[pos + 3]];
        let value = u32::from_be_bytes(quadlet);

        let ctx = ConfigRomParseCtx::DirectoryEntry(key);

        let entry_data = match entry_type {
            ENTRY_KEY_IMMEDIATE => EntryData::Immediate(value),
            ENTRY_KEY_CSR_OFFSET => {
                // NOTE: The maximum value of value field in directory entry is 0x00ffffff. The
                // maximum value multipled by 4 is within 0x0fffffff, therefore no need to detect
                // error.
                let offset = 0xfffff0000000 + (4 * value as usize);
                EntryData::CsrOffset(offset)
            }
            _ => {
                let header_pos = pos + 4 * value as usize;

                if ancestors.iter().any(|&p| p == header_pos) {
                    Err(ConfigRomParseError::new(ctx, MalformedReason::Cycle, pos))?;
                }
                if header_pos <= pos || header_pos >= raw.len() {
                    Err(ConfigRomParseError::new(ctx, MalformedReason::BadOffset, pos))?;
                }

                if entry_type == ENTRY_KEY_LEAF {
                    let (body_pos, length) =
                        read_block_header(raw, header_pos, MalformedReason::BadLeafLength)
                            .map_err(|(cause, offset)| {
                                ConfigRomParseError::new(ctx, cause, offset)
                            })?;
                    EntryData::Leaf(&raw[body_pos..(body_pos + length)])
                } else {
                    debug_assert_eq!(entry_type, ENTRY_KEY_DIRECTORY);
                    let (body_pos, length) =
                        read_block_header(raw, header_pos, MalformedReason::BadDirectoryLength)
                            .map_err(|(cause, offset)| {
                                ConfigRomParseError::new(ctx, cause, offset)
                            })?;
                    ancestors.push(header_pos);
                    let res = get_directory_entry_list(raw, body_pos, length, ancestors);
                    ancestors.pop();
                    res.map(|entries| EntryData::Directory(entries))
                        .map_err(|e| e.within(ctx))?
                }
            }
        };

        entries.push(Entry {
            key: KeyType::from(key),
            data: entry_data,
            offset: pos,
        });
        pos += 4;
    }

    Ok(entries)
}
