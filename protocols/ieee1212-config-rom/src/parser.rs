// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

//! The module includes the parser to give semantic meaning to the tree of directory entries.
//!
//! The meaning of each entry is looked up in layered key dictionaries in the order of vendor,
//! specifier, bus, and generic IEEE 1212. The dictionaries for vendor and specifier are given by
//! the caller as the handlers in HandlerSet structure. The entry unknown to any dictionary is not
//! an error; it is named after its key.

use {super::*, std::borrow::Cow, std::convert::TryFrom, tracing::debug};

/// The error to parse configuration ROM.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigRomError {
    /// The content does not match to the format.
    #[error("malformed configuration ROM: {0}")]
    Malformed(#[from] ConfigRomParseError),
    /// The content is valid but not handled.
    #[error("unsupported content at offset {offset}: {reason}")]
    Unsupported { reason: String, offset: usize },
    /// The fields are not consistent with each other.
    #[error("inconsistent configuration ROM: {reason}")]
    Inconsistent { reason: String },
}

/// The context of directory in which the entry is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryContext {
    Root,
    Vendor(u32),
    Specifier { spec_id: u32, version: u32 },
    BusDependent,
    Keyword,
}

/// The layout of leaf to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafLayout {
    Descriptor,
    Eui64,
    UnitLocation,
    Keyword,
    Raw,
}

/// The definition of key in dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub name: Cow<'static, str>,
    pub layout: LeafLayout,
}

impl KeyDefinition {
    pub fn new(name: impl Into<Cow<'static, str>>, layout: LeafLayout) -> Self {
        Self {
            name: name.into(),
            layout,
        }
    }
}

/// The trait for dictionary of keys.
pub trait KeyDictionary {
    /// Look up the definition of key for the type of entry.
    fn lookup(&self, key: u8, kind: EntryKind) -> Option<KeyDefinition>;
}

/// The trait for handler of keys specific to vendor.
pub trait VendorKeyHandler: KeyDictionary {
    /// The OUI of vendor.
    fn vendor_id(&self) -> u32;

    /// Decode the content of descriptor leaf which is not minimal ASCII text.
    fn decode_descriptor(
        &self,
        _descriptor_type: u8,
        _specifier_id: u32,
        _content: &[u8],
    ) -> Option<ItemValue> {
        None
    }
}

/// The trait for handler of keys specific to specifier of unit.
pub trait SpecifierKeyHandler: KeyDictionary {
    /// The identifier of specifier.
    fn specifier_id(&self) -> u32;

    /// Whether to handle the version of unit.
    fn supports_version(&self, _version: u32) -> bool {
        true
    }
}

/// The set of handlers for the keys specific to vendors and specifiers.
#[derive(Default)]
pub struct HandlerSet {
    vendor: Vec<Box<dyn VendorKeyHandler>>,
    specifier: Vec<Box<dyn SpecifierKeyHandler>>,
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vendors: Vec<u32> = self.vendor.iter().map(|h| h.vendor_id()).collect();
        let specifiers: Vec<u32> = self.specifier.iter().map(|h| h.specifier_id()).collect();
        f.debug_struct("HandlerSet")
            .field("vendor", &vendors)
            .field("specifier", &specifiers)
            .finish()
    }
}

impl HandlerSet {
    pub fn add_vendor_handler<H: VendorKeyHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.vendor.push(Box::new(handler));
        self
    }

    pub fn add_specifier_handler<H: SpecifierKeyHandler + 'static>(
        &mut self,
        handler: H,
    ) -> &mut Self {
        self.specifier.push(Box::new(handler));
        self
    }

    fn vendor_handler(&self, vendor_id: u32) -> Option<&dyn VendorKeyHandler> {
        self.vendor
            .iter()
            .find(|h| h.vendor_id() == vendor_id)
            .map(|h| h.as_ref())
    }

    fn specifier_handler(&self, spec_id: u32, version: u32) -> Option<&dyn SpecifierKeyHandler> {
        self.specifier
            .iter()
            .find(|h| h.specifier_id() == spec_id && h.supports_version(version))
            .map(|h| h.as_ref())
    }
}

/// The dictionary of keys defined in IEEE 1394 for its bus.
#[derive(Default, Debug, Clone, Copy)]
pub struct Ieee1394BusKeys;

impl KeyDictionary for Ieee1394BusKeys {
    fn lookup(&self, key: u8, kind: EntryKind) -> Option<KeyDefinition> {
        match (KeyType::from(key), kind) {
            (KeyType::Eui64, EntryKind::Leaf) => {
                Some(KeyDefinition::new("node_unique_id", LeafLayout::Eui64))
            }
            (KeyType::Module, EntryKind::Immediate) => {
                Some(KeyDefinition::new("module_vendor_id", LeafLayout::Raw))
            }
            (KeyType::BusDependentInfo, EntryKind::Directory) => {
                Some(KeyDefinition::new("ieee1394_dependent_info", LeafLayout::Raw))
            }
            _ => None,
        }
    }
}

/// The dictionary of generic keys defined in IEEE 1212.
#[derive(Default, Debug, Clone, Copy)]
pub struct Ieee1212Keys;

impl KeyDictionary for Ieee1212Keys {
    fn lookup(&self, key: u8, kind: EntryKind) -> Option<KeyDefinition> {
        let name = match KeyType::from(key) {
            KeyType::Descriptor => "descriptor",
            KeyType::BusDependentInfo => "bus_dependent_info",
            KeyType::Vendor => "vendor",
            KeyType::HardwareVersion => "hardware_version",
            KeyType::Module => "module",
            KeyType::NodeCapabilities => "node_capabilities",
            KeyType::Eui64 => "eui64",
            KeyType::Unit => "unit",
            KeyType::SpecifierId => "specifier_id",
            KeyType::Version => "version",
            KeyType::DependentInfo => "dependent_info",
            KeyType::UnitLocation => "unit_location",
            KeyType::Model => "model",
            KeyType::Instance => "instance",
            KeyType::Keyword => "keyword",
            KeyType::Feature => "feature",
            KeyType::ModifiableDescriptor => "modifiable_descriptor",
            KeyType::DirectoryId => "directory_id",
            KeyType::Reserved(_) => return None,
        };
        let layout = match (KeyType::from(key), kind) {
            (KeyType::Descriptor, EntryKind::Leaf) => LeafLayout::Descriptor,
            (KeyType::Eui64, EntryKind::Leaf) => LeafLayout::Eui64,
            (KeyType::UnitLocation, EntryKind::Leaf) => LeafLayout::UnitLocation,
            (KeyType::Keyword, EntryKind::Leaf) => LeafLayout::Keyword,
            _ => LeafLayout::Raw,
        };
        Some(KeyDefinition::new(name, layout))
    }
}

/// The decoded value of directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValue {
    Immediate(u32),
    CsrOffset(usize),
    Text(String),
    Eui64(u64),
    UnitLocation { base_address: u64, upper_bound: u64 },
    Keywords(Vec<String>),
    Raw(Vec<u8>),
    Directory(Vec<DirectoryItem>),
}

/// The directory entry with semantic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryItem {
    pub key: u8,
    pub kind: EntryKind,
    pub name: Cow<'static, str>,
    pub value: ItemValue,
}

/// The content of unit directory.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct UnitDirectory {
    pub specifier_id: u32,
    pub version: u32,
    pub model_id: Option<u32>,
    pub model_name: Option<String>,
    /// The other entries defined by the specifier.
    pub extras: Vec<DirectoryItem>,
}

impl UnitDirectory {
    /// The specifier identifier of 1394 Trading Association.
    pub const SPECIFIER_ID_TA1394: u32 = 0x00a02d;
    /// The version for AV/C units defined by 1394 Trading Association.
    pub const VERSION_AVC: u32 = 0x010001;

    /// Whether the unit is controlled by AV/C commands.
    pub fn is_avc(&self) -> bool {
        self.specifier_id == Self::SPECIFIER_ID_TA1394 && self.version == Self::VERSION_AVC
    }
}

/// The identity of device parsed from configuration ROM.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// The bus information block when it is for IEEE 1394 bus.
    pub bus_info: Option<Ieee1394BusInfo>,
    pub vendor_id: u32,
    pub vendor_name: Option<String>,
    pub model_id: u32,
    pub model_name: Option<String>,
    pub node_capabilities: u32,
    pub guid: u64,
    pub unit_directories: Vec<UnitDirectory>,
    pub dependent_info: Option<Vec<DirectoryItem>>,
    /// The other entries in root directory.
    pub extras: Vec<DirectoryItem>,
}

/// Parse the lexed configuration ROM to detect identity of device.
pub fn parse(rom: &ConfigRom, handlers: &HandlerSet) -> Result<DeviceIdentity, ConfigRomError> {
    let bus_info = Ieee1394BusInfo::try_from(rom.bus_info).ok();
    let mut parser = Parser {
        handlers,
        ieee1394: bus_info.is_some(),
        vendor_id: 0,
        stack: vec![DirectoryContext::Root],
    };
    parser.parse_root(&rom.root, bus_info)
}

/// Lex and parse the raw data of configuration ROM.
pub fn parse_config_rom(raw: &[u8], handlers: &HandlerSet) -> Result<DeviceIdentity, ConfigRomError> {
    let rom = ConfigRom::try_from(raw)?;
    parse(&rom, handlers)
}

fn missing_entry(ctx: ConfigRomParseCtx, key: KeyType, offset: usize) -> ConfigRomError {
    ConfigRomParseError::new(ctx, MalformedReason::MissingEntry(key), offset).into()
}

fn leaf_error(key: u8, err: LeafParseError, offset: usize) -> ConfigRomError {
    match err.ctx {
        LeafParseCtx::TooShort => ConfigRomParseError::new(
            ConfigRomParseCtx::Leaf(key),
            MalformedReason::BadLeafLength,
            offset,
        )
        .into(),
        _ => ConfigRomError::Unsupported {
            reason: err.to_string(),
            offset,
        },
    }
}

struct Parser<'h> {
    handlers: &'h HandlerSet,
    ieee1394: bool,
    vendor_id: u32,
    stack: Vec<DirectoryContext>,
}

impl<'h> Parser<'h> {
    fn current_vendor(&self) -> u32 {
        self.stack
            .iter()
            .rev()
            .find_map(|ctx| match ctx {
                DirectoryContext::Vendor(vendor_id) => Some(*vendor_id),
                _ => None,
            })
            .unwrap_or(self.vendor_id)
    }

    fn current_specifier(&self) -> Option<(u32, u32)> {
        self.stack.iter().rev().find_map(|ctx| match ctx {
            DirectoryContext::Specifier { spec_id, version } => Some((*spec_id, *version)),
            _ => None,
        })
    }

    fn lookup(&self, key: u8, kind: EntryKind) -> KeyDefinition {
        self.handlers
            .vendor_handler(self.current_vendor())
            .and_then(|h| h.lookup(key, kind))
            .or_else(|| {
                self.current_specifier()
                    .and_then(|(spec_id, version)| {
                        self.handlers.specifier_handler(spec_id, version)
                    })
                    .and_then(|h| h.lookup(key, kind))
            })
            .or_else(|| {
                if self.ieee1394 {
                    Ieee1394BusKeys.lookup(key, kind)
                } else {
                    None
                }
            })
            .or_else(|| Ieee1212Keys.lookup(key, kind))
            .unwrap_or_else(|| {
                debug!(key, ?kind, context = ?self.stack.last(), "unknown key");
                KeyDefinition::new(format!("key_0x{:02x}", key), LeafLayout::Raw)
            })
    }

    fn parse_root(
        &mut self,
        root: &[Entry],
        bus_info: Option<Ieee1394BusInfo>,
    ) -> Result<DeviceIdentity, ConfigRomError> {
        let ctx = ConfigRomParseCtx::RootDirectory;
        let offset = root.first().map(|entry| entry.offset).unwrap_or(0);
        let mut consumed = Vec::new();

        let (pos, vendor_id) = find_immediate(root, KeyType::Vendor)
            .ok_or_else(|| missing_entry(ctx, KeyType::Vendor, offset))?;
        consumed.push(pos);
        self.vendor_id = vendor_id;

        let vendor_name = self.detect_desc_text(root, pos)?.map(|(pos, text)| {
            consumed.push(pos);
            text
        });

        let root_models: Vec<(usize, u32)> = root
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match &entry.data {
                EntryData::Immediate(value) if entry.key == KeyType::Model => Some((i, *value)),
                _ => None,
            })
            .collect();
        root_models.iter().for_each(|(pos, _)| consumed.push(*pos));

        let mut model_name = match root_models.first() {
            Some((pos, _)) => self.detect_desc_text(root, *pos)?.map(|(pos, text)| {
                consumed.push(pos);
                text
            }),
            None => None,
        };

        let (pos, node_capabilities) = find_immediate(root, KeyType::NodeCapabilities)
            .ok_or_else(|| missing_entry(ctx, KeyType::NodeCapabilities, offset))?;
        consumed.push(pos);

        let mut unit_directories = Vec::new();
        for (i, entry) in root.iter().enumerate() {
            if entry.key != KeyType::Unit {
                continue;
            }
            match &entry.data {
                EntryData::Directory(entries) => {
                    let unit = self.parse_unit(entries, entry.offset)?;
                    unit_directories.push(unit);
                    consumed.push(i);
                }
                _ => {
                    let cause = MalformedReason::UnexpectedEntryType(KeyType::Unit);
                    Err(ConfigRomParseError::new(ctx, cause, entry.offset))?;
                }
            }
        }

        let mut dependent_info = None;
        if let Some((i, entries)) = root.iter().enumerate().find_map(|(i, entry)| match &entry.data {
            EntryData::Directory(entries) if entry.key == KeyType::DependentInfo => {
                Some((i, entries))
            }
            _ => None,
        }) {
            dependent_info = Some(self.decode_entries(entries, &[])?);
            consumed.push(i);
        }

        let mut model_ids = root_models
            .iter()
            .map(|(_, model_id)| *model_id)
            .chain(unit_directories.iter().filter_map(|unit| unit.model_id));
        let model_id = model_ids
            .next()
            .ok_or_else(|| missing_entry(ctx, KeyType::Model, offset))?;
        if let Some(other) = model_ids.find(|&id| id != model_id) {
            let reason = format!("model id 0x{:06x} differs from 0x{:06x}", other, model_id);
            Err(ConfigRomError::Inconsistent { reason })?;
        }

        if model_name.is_none() {
            model_name = unit_directories
                .iter()
                .find_map(|unit| unit.model_name.clone());
        }

        let guid = match bus_info {
            Some(info) => info.guid(),
            None => {
                let (pos, guid) = self
                    .detect_eui64(root)?
                    .ok_or_else(|| missing_entry(ctx, KeyType::Eui64, offset))?;
                consumed.push(pos);
                guid
            }
        };

        let extras = self.decode_entries(root, &consumed)?;

        Ok(DeviceIdentity {
            bus_info,
            vendor_id,
            vendor_name,
            model_id,
            model_name,
            node_capabilities,
            guid,
            unit_directories,
            dependent_info,
            extras,
        })
    }

    fn parse_unit(&mut self, entries: &[Entry], offset: usize) -> Result<UnitDirectory, ConfigRomError> {
        let ctx = ConfigRomParseCtx::DirectoryEntry(KeyType::Unit.into());

        let (spec_pos, specifier_id) = find_immediate(entries, KeyType::SpecifierId)
            .ok_or_else(|| missing_entry(ctx, KeyType::SpecifierId, offset))?;
        let (version_pos, version) = find_immediate(entries, KeyType::Version)
            .ok_or_else(|| missing_entry(ctx, KeyType::Version, offset))?;

        self.stack.push(DirectoryContext::Specifier {
            spec_id: specifier_id,
            version,
        });
        let res = self.parse_unit_content(entries, vec![spec_pos, version_pos]);
        self.stack.pop();
        let (model_id, model_name, extras) = res?;

        Ok(UnitDirectory {
            specifier_id,
            version,
            model_id,
            model_name,
            extras,
        })
    }

    fn parse_unit_content(
        &mut self,
        entries: &[Entry],
        mut consumed: Vec<usize>,
    ) -> Result<(Option<u32>, Option<String>, Vec<DirectoryItem>), ConfigRomError> {
        let mut model_id = None;
        let mut model_name = None;

        for (i, entry) in entries.iter().enumerate() {
            if let (KeyType::Model, EntryData::Immediate(value)) = (entry.key, &entry.data) {
                match model_id {
                    None => {
                        model_id = Some(*value);
                        model_name = self.detect_desc_text(entries, i)?.map(|(pos, text)| {
                            consumed.push(pos);
                            text
                        });
                    }
                    Some(id) if id != *value => {
                        let reason =
                            format!("model id 0x{:06x} differs from 0x{:06x} in unit", value, id);
                        Err(ConfigRomError::Inconsistent { reason })?;
                    }
                    _ => (),
                }
                consumed.push(i);
            }
        }

        let extras = self.decode_entries(entries, &consumed)?;

        Ok((model_id, model_name, extras))
    }

    // The textual descriptor leaf or directory just after the entry is for the entry.
    fn detect_desc_text(
        &self,
        entries: &[Entry],
        pos: usize,
    ) -> Result<Option<(usize, String)>, ConfigRomError> {
        let entry = match entries.get(pos + 1) {
            Some(entry) if entry.key == KeyType::Descriptor => entry,
            _ => return Ok(None),
        };
        let text = match &entry.data {
            EntryData::Leaf(leaf) => match self.decode_descriptor(leaf, entry.offset)? {
                ItemValue::Text(text) => Some(text),
                _ => None,
            },
            EntryData::Directory(descs) => {
                let mut text = None;
                for desc in descs.iter().filter(|desc| desc.key == KeyType::Descriptor) {
                    if let EntryData::Leaf(leaf) = &desc.data {
                        if let ItemValue::Text(t) = self.decode_descriptor(leaf, desc.offset)? {
                            text = Some(t);
                            break;
                        }
                    }
                }
                text
            }
            _ => None,
        };
        Ok(text.map(|text| (pos + 1, text)))
    }

    fn detect_eui64(&self, entries: &[Entry]) -> Result<Option<(usize, u64)>, ConfigRomError> {
        let key = KeyType::Eui64.into();
        match entries
            .iter()
            .enumerate()
            .find_map(|(i, entry)| match &entry.data {
                EntryData::Leaf(leaf) if entry.key == KeyType::Eui64 => Some((i, leaf, entry)),
                _ => None,
            }) {
            Some((i, leaf, entry)) => Eui64Leaf::try_from(&leaf[..])
                .map(|eui64| Some((i, eui64.0)))
                .map_err(|err| leaf_error(key, err, entry.offset)),
            None => Ok(None),
        }
    }

    fn decode_descriptor(&self, leaf: &[u8], offset: usize) -> Result<ItemValue, ConfigRomError> {
        let key = KeyType::Descriptor.into();
        let desc = DescriptorLeaf::try_from(leaf).map_err(|err| leaf_error(key, err, offset))?;
        match desc.data {
            DescriptorData::Textual(d) => {
                if !d.is_minimal_ascii() {
                    let reason = format!(
                        "textual descriptor in width {}, character set {}, language {}",
                        d.width, d.character_set, d.language
                    );
                    Err(ConfigRomError::Unsupported { reason, offset })
                } else if !d.text.is_ascii() {
                    let reason = "textual descriptor with non-ASCII character".to_string();
                    Err(ConfigRomError::Unsupported { reason, offset })
                } else {
                    Ok(ItemValue::Text(d.text.to_string()))
                }
            }
            DescriptorData::Reserved(desc_type, content) => Ok(self
                .handlers
                .vendor_handler(self.current_vendor())
                .and_then(|h| h.decode_descriptor(desc_type, desc.spec_id, content))
                .unwrap_or_else(|| ItemValue::Raw(leaf.to_vec()))),
        }
    }

    fn decode_leaf(
        &self,
        key: u8,
        layout: LeafLayout,
        leaf: &[u8],
        offset: usize,
    ) -> Result<ItemValue, ConfigRomError> {
        match layout {
            LeafLayout::Descriptor => self.decode_descriptor(leaf, offset),
            LeafLayout::Eui64 => Eui64Leaf::try_from(leaf)
                .map(|eui64| ItemValue::Eui64(eui64.0))
                .map_err(|err| leaf_error(key, err, offset)),
            LeafLayout::UnitLocation => UnitLocationLeaf::try_from(leaf)
                .map(|location| ItemValue::UnitLocation {
                    base_address: location.base_address,
                    upper_bound: location.upper_bound,
                })
                .map_err(|err| leaf_error(key, err, offset)),
            LeafLayout::Keyword => KeywordLeaf::try_from(leaf)
                .map(|keywords| {
                    ItemValue::Keywords(keywords.0.iter().map(|k| k.to_string()).collect())
                })
                .map_err(|err| leaf_error(key, err, offset)),
            LeafLayout::Raw => Ok(ItemValue::Raw(leaf.to_vec())),
        }
    }

    fn decode_entries(
        &mut self,
        entries: &[Entry],
        consumed: &[usize],
    ) -> Result<Vec<DirectoryItem>, ConfigRomError> {
        entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .map(|(_, entry)| self.decode_entry(entry))
            .collect()
    }

    fn decode_entry(&mut self, entry: &Entry) -> Result<DirectoryItem, ConfigRomError> {
        let key = u8::from(entry.key);
        let kind = entry.data.kind();
        let def = self.lookup(key, kind);

        let value = match &entry.data {
            EntryData::Immediate(value) => ItemValue::Immediate(*value),
            EntryData::CsrOffset(offset) => ItemValue::CsrOffset(*offset),
            EntryData::Leaf(leaf) => {
                let ctx = if entry.key == KeyType::Keyword {
                    Some(DirectoryContext::Keyword)
                } else {
                    None
                };
                self.within(ctx, |parser| {
                    parser.decode_leaf(key, def.layout, leaf, entry.offset)
                })?
            }
            EntryData::Directory(entries) => {
                let ctx = match entry.key {
                    KeyType::Unit => Some(DirectoryContext::Specifier {
                        spec_id: find_immediate(entries, KeyType::SpecifierId)
                            .map(|(_, v)| v)
                            .unwrap_or_default(),
                        version: find_immediate(entries, KeyType::Version)
                            .map(|(_, v)| v)
                            .unwrap_or_default(),
                    }),
                    KeyType::Vendor => Some(DirectoryContext::Vendor(self.current_vendor())),
                    KeyType::BusDependentInfo => Some(DirectoryContext::BusDependent),
                    _ => None,
                };
                self.within(ctx, |parser| parser.decode_entries(entries, &[]))
                    .map(|items| ItemValue::Directory(items))?
            }
        };

        Ok(DirectoryItem {
            key,
            kind,
            name: def.name,
            value,
        })
    }

    fn within<T, F>(&mut self, ctx: Option<DirectoryContext>, func: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        match ctx {
            Some(ctx) => {
                self.stack.push(ctx);
                let res = func(self);
                self.stack.pop();
                res
            }
            None => func(self),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{block, bus_info_block, minimal_image};

    enum Item {
        Quadlet(u32),
        Block(u8, Vec<u8>),
    }

    // Lay out the root directory followed by the blocks referred by its entries.
    fn layout(root: &[Item]) -> Vec<u8> {
        let mut raw = bus_info_block();
        let root_pos = raw.len();
        let mut next = root_pos + 4 + 4 * root.len();
        let mut quadlets = Vec::new();
        let mut blocks = Vec::new();
        root.iter().enumerate().for_each(|(i, item)| match item {
            Item::Quadlet(quadlet) => quadlets.push(*quadlet),
            Item::Block(head, content) => {
                let entry_pos = root_pos + 4 + 4 * i;
                let value = ((next - entry_pos) / 4) as u32;
                quadlets.push(((*head as u32) << 24) | value);
                next += content.len();
                blocks.extend_from_slice(content);
            }
        });
        raw.append(&mut block(&quadlets));
        raw.append(&mut blocks);
        raw
    }

    fn leaf(body: &[u8]) -> Vec<u8> {
        let mut body = body.to_vec();
        while body.len() % 4 > 0 {
            body.push(0);
        }
        let quadlets: Vec<u32> = body
            .chunks(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        block(&quadlets)
    }

    fn text_leaf(text: &str) -> Vec<u8> {
        let mut body = vec![0; 8];
        body.extend_from_slice(text.as_bytes());
        leaf(&body)
    }

    fn unit(quadlets: &[u32]) -> Vec<u8> {
        block(quadlets)
    }

    #[test]
    fn parse_minimal_rom() {
        let raw = minimal_image();
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        assert_eq!(0x00002d, identity.vendor_id);
        assert_eq!(None, identity.vendor_name);
        assert_eq!(0x000010, identity.model_id);
        assert_eq!(None, identity.model_name);
        assert_eq!(0x0083c0, identity.node_capabilities);
        assert_eq!(0x00002d0123456789, identity.guid);
        assert_eq!(1, identity.unit_directories.len());
        let unit = &identity.unit_directories[0];
        assert_eq!(0x00a02d, unit.specifier_id);
        assert_eq!(0x010001, unit.version);
        assert_eq!(Some(0x000010), unit.model_id);
        assert!(unit.is_avc());
        assert_eq!(Vec::<DirectoryItem>::new(), unit.extras);
        assert_eq!(Vec::<DirectoryItem>::new(), identity.extras);
        assert_eq!(None, identity.dependent_info);

        let bus_info = identity.bus_info.unwrap();
        assert_eq!(0x00002d, bus_info.node_vendor_id);
        assert_eq!(true, bus_info.irmc);
    }

    #[test]
    fn parse_vendor_and_model_names() {
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Block(0x81, text_leaf("Vendor")),
            Item::Quadlet(0x17000010),
            Item::Block(0x81, text_leaf("Model name")),
            Item::Quadlet(0x0c0083c0),
            Item::Block(0xd1, unit(&[0x1200a02d, 0x13010001])),
        ]);
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        assert_eq!(Some("Vendor".to_string()), identity.vendor_name);
        assert_eq!(Some("Model name".to_string()), identity.model_name);
        assert_eq!(Vec::<DirectoryItem>::new(), identity.extras);
        assert_eq!(None, identity.unit_directories[0].model_id);
    }

    #[test]
    fn parse_model_in_unit_directory() {
        // The descriptor leaf follows the unit directory.
        let mut content = unit(&[0x1200a02d, 0x13010001, 0x17000123, 0x81000001]);
        content.append(&mut text_leaf("Unit model"));
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x0c0083c0),
            Item::Block(0xd1, content),
        ]);
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        assert_eq!(0x000123, identity.model_id);
        assert_eq!(Some("Unit model".to_string()), identity.model_name);
        let unit = &identity.unit_directories[0];
        assert_eq!(Some(0x000123), unit.model_id);
        assert_eq!(Some("Unit model".to_string()), unit.model_name);
    }

    #[test]
    fn parse_missing_required_entries() {
        let raw = layout(&[Item::Quadlet(0x17000010), Item::Quadlet(0x0c0083c0)]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        if let ConfigRomError::Malformed(e) = err {
            assert_eq!(MalformedReason::MissingEntry(KeyType::Vendor), e.cause);
        } else {
            unreachable!();
        }

        let raw = layout(&[Item::Quadlet(0x0300002d), Item::Quadlet(0x17000010)]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        if let ConfigRomError::Malformed(e) = err {
            assert_eq!(MalformedReason::MissingEntry(KeyType::NodeCapabilities), e.cause);
        } else {
            unreachable!();
        }

        let raw = layout(&[Item::Quadlet(0x0300002d), Item::Quadlet(0x0c0083c0)]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        if let ConfigRomError::Malformed(e) = err {
            assert_eq!(MalformedReason::MissingEntry(KeyType::Model), e.cause);
        } else {
            unreachable!();
        }

        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
            Item::Block(0xd1, unit(&[0x13010001])),
        ]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        if let ConfigRomError::Malformed(e) = err {
            assert_eq!(MalformedReason::MissingEntry(KeyType::SpecifierId), e.cause);
            assert_eq!(vec![ConfigRomParseCtx::DirectoryEntry(0x11)], e.ctx);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn parse_inconsistent_model() {
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
            Item::Block(0xd1, unit(&[0x1200a02d, 0x13010001, 0x17000011])),
        ]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        assert!(matches!(err, ConfigRomError::Inconsistent { .. }));

        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
            Item::Quadlet(0x17000012),
        ]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        assert!(matches!(err, ConfigRomError::Inconsistent { .. }));
    }

    #[test]
    fn parse_unsupported_text() {
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Block(0x81, leaf(&[0, 0, 0, 0, 0x80, 0x00, 0x00, 0x09, 0x41, 0x00])),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
        ]);
        let err = parse_config_rom(&raw, &HandlerSet::default()).unwrap_err();
        if let ConfigRomError::Unsupported { offset, .. } = err {
            assert_eq!(28, offset);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn parse_unknown_and_bus_keys() {
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
            Item::Quadlet(0x38000001),
            Item::Block(0x8d, leaf(&[0x00, 0x00, 0x2d, 0x01, 0x23, 0x45, 0x67, 0x89])),
            Item::Block(0xb9, leaf(&[0xaa, 0xbb])),
        ]);
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        assert_eq!(
            vec![
                DirectoryItem {
                    key: 0x38,
                    kind: EntryKind::Immediate,
                    name: "key_0x38".into(),
                    value: ItemValue::Immediate(1),
                },
                DirectoryItem {
                    key: 0x0d,
                    kind: EntryKind::Leaf,
                    name: "node_unique_id".into(),
                    value: ItemValue::Eui64(0x00002d0123456789),
                },
                DirectoryItem {
                    key: 0x39,
                    kind: EntryKind::Leaf,
                    name: "key_0x39".into(),
                    value: ItemValue::Raw(vec![0xaa, 0xbb, 0x00, 0x00]),
                },
            ],
            identity.extras
        );
    }

    #[derive(Default)]
    struct TestVendorHandler;

    impl KeyDictionary for TestVendorHandler {
        fn lookup(&self, key: u8, kind: EntryKind) -> Option<KeyDefinition> {
            match (key, kind) {
                (0x38, EntryKind::Immediate) => Some(KeyDefinition::new("firmware", LeafLayout::Raw)),
                _ => None,
            }
        }
    }

    impl VendorKeyHandler for TestVendorHandler {
        fn vendor_id(&self) -> u32 {
            0x00002d
        }

        fn decode_descriptor(&self, desc_type: u8, _: u32, content: &[u8]) -> Option<ItemValue> {
            if desc_type == 0x01 {
                Some(ItemValue::Text(format!("icon of {} bytes", content.len())))
            } else {
                None
            }
        }
    }

    #[derive(Default)]
    struct TestSpecifierHandler;

    impl KeyDictionary for TestSpecifierHandler {
        fn lookup(&self, key: u8, kind: EntryKind) -> Option<KeyDefinition> {
            match (key, kind) {
                (0x39, EntryKind::Immediate) => Some(KeyDefinition::new("plug_count", LeafLayout::Raw)),
                _ => None,
            }
        }
    }

    impl SpecifierKeyHandler for TestSpecifierHandler {
        fn specifier_id(&self) -> u32 {
            0x00a02d
        }
    }

    #[test]
    fn parse_with_handlers() {
        let raw = layout(&[
            Item::Quadlet(0x0300002d),
            Item::Quadlet(0x17000010),
            Item::Quadlet(0x0c0083c0),
            Item::Quadlet(0x38000002),
            Item::Quadlet(0x39000003),
            Item::Block(0x81, leaf(&[0x01, 0x00, 0x00, 0x00, 0x11, 0x22, 0x33, 0x44])),
            Item::Block(0xd1, unit(&[0x1200a02d, 0x13010001, 0x39000004])),
            Item::Block(0xd4, block(&[0x38000005])),
        ]);

        let mut handlers = HandlerSet::default();
        handlers
            .add_vendor_handler(TestVendorHandler)
            .add_specifier_handler(TestSpecifierHandler);

        let identity = parse_config_rom(&raw, &handlers).unwrap();
        let names: Vec<&str> = identity.extras.iter().map(|item| item.name.as_ref()).collect();
        assert_eq!(vec!["firmware", "key_0x39", "descriptor"], names);
        assert_eq!(
            ItemValue::Text("icon of 4 bytes".to_string()),
            identity.extras[2].value
        );

        let unit = &identity.unit_directories[0];
        assert_eq!(1, unit.extras.len());
        assert_eq!("plug_count", unit.extras[0].name);
        assert_eq!(ItemValue::Immediate(4), unit.extras[0].value);

        let dependent_info = identity.dependent_info.unwrap();
        assert_eq!(1, dependent_info.len());
        assert_eq!("firmware", dependent_info[0].name);

        // Without handlers.
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        let names: Vec<&str> = identity.extras.iter().map(|item| item.name.as_ref()).collect();
        assert_eq!(vec!["key_0x38", "key_0x39", "descriptor"], names);
        assert_eq!(
            ItemValue::Raw(vec![0x01, 0x00, 0x00, 0x00, 0x11, 0x22, 0x33, 0x44]),
            identity.extras[2].value
        );
    }

    #[test]
    fn parse_without_ieee1394_bus_info() {
        let mut raw = vec![0x01, 0x01, 0x00, 0x00];
        raw.extend_from_slice(b"1212");
        let root_pos = raw.len();
        raw.append(&mut block(&[0x0300002d, 0x17000010, 0x0c0083c0, 0x8d000001]));
        assert_eq!(8, root_pos);
        raw.append(&mut block(&[0x00000001, 0x00000002]));
        let identity = parse_config_rom(&raw, &HandlerSet::default()).unwrap();
        assert_eq!(None, identity.bus_info);
        assert_eq!(0x0000000100000002, identity.guid);
        assert_eq!(Vec::<DirectoryItem>::new(), identity.extras);
    }
}
