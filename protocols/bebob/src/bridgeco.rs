// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol implementation defined by BridgeCo. AG for its BridgeCo. Enhanced Break Out Box
//! (BeBoB) solution.
//!
//! The module includes structure, enumeration, trait and its implementation for AV/C command
//! extensions defined by BridgeCo. AG for BeBoB solution. The plug is addressed by 5 bytes in
//! operands, while the AV/C frame is addressed to the unit or the subunit which owns the plug.
//! `BcoPlugLocation` carries both of them.

use super::*;

//
// Bco Extended Plug Info command
//

/// Type of address to plug for unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoPlugAddrUnitType {
    /// Address to unit for isochronous input/output.
    Isoc,
    /// Address to unit for external input/output.
    Ext,
    /// Address to unit for asynchronous input/output.
    Async,
}

impl Default for BcoPlugAddrUnitType {
    fn default() -> Self {
        Self::Isoc
    }
}

impl BcoPlugAddrUnitType {
    const ISOC: u8 = 0x00;
    const EXT: u8 = 0x01;
    const ASYNC: u8 = 0x02;
}

impl TryFrom<u8> for BcoPlugAddrUnitType {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            Self::ISOC => Ok(Self::Isoc),
            Self::EXT => Ok(Self::Ext),
            Self::ASYNC => Ok(Self::Async),
            _ => Err(AvcRespParseError::UnexpectedOperands(0)),
        }
    }
}

impl From<BcoPlugAddrUnitType> for u8 {
    fn from(plug_type: BcoPlugAddrUnitType) -> Self {
        match plug_type {
            BcoPlugAddrUnitType::Isoc => BcoPlugAddrUnitType::ISOC,
            BcoPlugAddrUnitType::Ext => BcoPlugAddrUnitType::EXT,
            BcoPlugAddrUnitType::Async => BcoPlugAddrUnitType::ASYNC,
        }
    }
}

/// Address to plug for unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoPlugAddrUnit {
    /// The type of unit to address to.
    pub plug_type: BcoPlugAddrUnitType,
    /// The numeric identifier of plug in the unit.
    pub plug_id: u8,
}

impl Default for BcoPlugAddrUnit {
    fn default() -> Self {
        Self {
            plug_type: Default::default(),
            plug_id: 0xff,
        }
    }
}

impl BcoPlugAddrUnit {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let plug_type = BcoPlugAddrUnitType::try_from(raw[0])?;
        Ok(Self {
            plug_type,
            plug_id: raw[1],
        })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.plug_type.into(), self.plug_id, 0xff]
    }
}

/// Address to plug for subunit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoPlugAddrSubunit {
    /// The numeric identifier of plug in the subunit.
    pub plug_id: u8,
}

impl Default for BcoPlugAddrSubunit {
    fn default() -> Self {
        Self { plug_id: 0xff }
    }
}

impl BcoPlugAddrSubunit {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(Self { plug_id: raw[0] })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.plug_id, 0xff, 0xff]
    }
}

/// Address to plug for function block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BcoPlugAddrFuncBlk {
    /// The numeric type of function block.
    pub func_blk_type: u8,
    /// The numeric identifier of function block.
    pub func_blk_id: u8,
    /// The numeric identifier of plug in the function block.
    pub plug_id: u8,
}

impl Default for BcoPlugAddrFuncBlk {
    fn default() -> Self {
        Self {
            func_blk_type: 0xff,
            func_blk_id: 0xff,
            plug_id: 0xff,
        }
    }
}

impl BcoPlugAddrFuncBlk {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(Self {
            func_blk_type: raw[0],
            func_blk_id: raw[1],
            plug_id: raw[2],
        })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.func_blk_type, self.func_blk_id, self.plug_id]
    }
}

/// Mode of address to plug.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoPlugAddrMode {
    /// Address to unit.
    Unit(BcoPlugAddrUnit),
    /// Address to subunit.
    Subunit(BcoPlugAddrSubunit),
    /// Address to function block.
    FuncBlk(BcoPlugAddrFuncBlk),
}

impl Default for BcoPlugAddrMode {
    fn default() -> Self {
        Self::Unit(Default::default())
    }
}

impl BcoPlugAddrMode {
    const LENGTH: usize = 4;

    const UNIT: u8 = 0x00;
    const SUBUNIT: u8 = 0x01;
    const FUNCBLK: u8 = 0x02;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let data = &raw[1..Self::LENGTH];
        let mode = match raw[0] {
            Self::UNIT => BcoPlugAddrUnit::from_raw(data).map(Self::Unit),
            Self::SUBUNIT => BcoPlugAddrSubunit::from_raw(data).map(Self::Subunit),
            Self::FUNCBLK => BcoPlugAddrFuncBlk::from_raw(data).map(Self::FuncBlk),
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        }
        .map_err(|err| err.add_offset(1))?;

        Ok(mode)
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let (mode, data) = match self {
            Self::Unit(d) => (Self::UNIT, d.to_raw()),
            Self::Subunit(d) => (Self::SUBUNIT, d.to_raw()),
            Self::FuncBlk(d) => (Self::FUNCBLK, d.to_raw()),
        };
        [mode, data[0], data[1], data[2]]
    }
}

/// Address of plug in operands of BridgeCo extended commands.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoPlugAddr {
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The mode to address for the plug.
    pub mode: BcoPlugAddrMode,
}

impl BcoPlugAddr {
    /// The length of address in operands.
    pub const LENGTH: usize = 5;

    /// Instantiate address structure to plug for unit.
    pub fn new_for_unit(
        direction: PlugDirection,
        plug_type: BcoPlugAddrUnitType,
        plug_id: u8,
    ) -> Self {
        Self {
            direction,
            mode: BcoPlugAddrMode::Unit(BcoPlugAddrUnit { plug_type, plug_id }),
        }
    }

    /// Instantiate address structure to plug for subunit.
    pub fn new_for_subunit(direction: PlugDirection, plug_id: u8) -> Self {
        Self {
            direction,
            mode: BcoPlugAddrMode::Subunit(BcoPlugAddrSubunit { plug_id }),
        }
    }

    /// Instantiate address structure to plug for function block.
    pub fn new_for_func_blk(
        direction: PlugDirection,
        func_blk_type: u8,
        func_blk_id: u8,
        plug_id: u8,
    ) -> Self {
        Self {
            direction,
            mode: BcoPlugAddrMode::FuncBlk(BcoPlugAddrFuncBlk {
                func_blk_type,
                func_blk_id,
                plug_id,
            }),
        }
    }

    pub fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let direction = PlugDirection::try_from(raw[0])?;
        let mode = BcoPlugAddrMode::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
        Ok(Self { direction, mode })
    }

    pub fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mode = self.mode.to_raw();
        [self.direction.into(), mode[0], mode[1], mode[2], mode[3]]
    }
}

/// The location of plug, including the destination of AV/C frame and the address of plug in
/// operands.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoPlugLocation {
    /// The destination of AV/C frame.
    pub subunit: AvcAddr,
    /// The address of plug in operands.
    pub addr: BcoPlugAddr,
}

impl BcoPlugLocation {
    /// The plug of unit.
    pub fn new_for_unit(
        direction: PlugDirection,
        plug_type: BcoPlugAddrUnitType,
        plug_id: u8,
    ) -> Self {
        Self {
            subunit: AvcAddr::Unit,
            addr: BcoPlugAddr::new_for_unit(direction, plug_type, plug_id),
        }
    }

    /// The plug of subunit.
    pub fn new_for_subunit(subunit: &AvcAddrSubunit, direction: PlugDirection, plug_id: u8) -> Self {
        Self {
            subunit: AvcAddr::Subunit(*subunit),
            addr: BcoPlugAddr::new_for_subunit(direction, plug_id),
        }
    }

    /// The plug of function block in subunit.
    pub fn new_for_func_blk(
        subunit: &AvcAddrSubunit,
        direction: PlugDirection,
        func_blk_type: u8,
        func_blk_id: u8,
        plug_id: u8,
    ) -> Self {
        Self {
            subunit: AvcAddr::Subunit(*subunit),
            addr: BcoPlugAddr::new_for_func_blk(direction, func_blk_type, func_blk_id, plug_id),
        }
    }

    /// Whether the plug receives signal from the other plug inside of the unit. The output plug
    /// of unit and the input plug of subunit or function block are the case.
    pub fn is_signal_destination(&self) -> bool {
        match self.addr.mode {
            BcoPlugAddrMode::Unit(_) => self.addr.direction == PlugDirection::Output,
            _ => self.addr.direction == PlugDirection::Input,
        }
    }
}

impl From<&BcoIoPlugAddr> for BcoPlugLocation {
    fn from(io_addr: &BcoIoPlugAddr) -> Self {
        let direction = io_addr.direction;
        match &io_addr.mode {
            BcoIoPlugAddrMode::Unit(d) => Self::new_for_unit(direction, d.plug_type, d.plug_id),
            BcoIoPlugAddrMode::Subunit(s, d) => Self::new_for_subunit(s, direction, d.plug_id),
            BcoIoPlugAddrMode::FuncBlk(s, d) => Self::new_for_func_blk(
                s,
                direction,
                d.func_blk_type,
                d.func_blk_id,
                d.plug_id,
            ),
        }
    }
}

/// Mode to address to plug for input and output direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoIoPlugAddrMode {
    /// Address to unit.
    Unit(BcoPlugAddrUnit),
    /// Address to subunit.
    Subunit(AvcAddrSubunit, BcoPlugAddrSubunit),
    /// Address to function block.
    FuncBlk(AvcAddrSubunit, BcoPlugAddrFuncBlk),
}

impl Default for BcoIoPlugAddrMode {
    fn default() -> Self {
        Self::Unit(Default::default())
    }
}

impl BcoIoPlugAddrMode {
    const LENGTH: usize = 6;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        // The type and identifier of subunit are not packed in one byte.
        let subunit = AvcAddrSubunit::new(AvcSubunitType::from(raw[1]), raw[2]);
        match raw[0] {
            BcoPlugAddrMode::UNIT => BcoPlugAddrUnit::from_raw(&raw[1..4])
                .map(Self::Unit)
                .map_err(|err| err.add_offset(1)),
            BcoPlugAddrMode::SUBUNIT => BcoPlugAddrSubunit::from_raw(&raw[3..6])
                .map(|d| Self::Subunit(subunit, d))
                .map_err(|err| err.add_offset(3)),
            BcoPlugAddrMode::FUNCBLK => BcoPlugAddrFuncBlk::from_raw(&raw[3..6])
                .map(|d| Self::FuncBlk(subunit, d))
                .map_err(|err| err.add_offset(3)),
            _ => Err(AvcRespParseError::UnexpectedOperands(0)),
        }
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0xff; Self::LENGTH];
        match self {
            Self::Unit(d) => {
                raw[0] = BcoPlugAddrMode::UNIT;
                raw[1..4].copy_from_slice(&d.to_raw());
            }
            Self::Subunit(s, d) => {
                raw[0] = BcoPlugAddrMode::SUBUNIT;
                raw[1] = s.subunit_type.into();
                raw[2] = s.subunit_id;
                raw[3..6].copy_from_slice(&d.to_raw());
            }
            Self::FuncBlk(s, d) => {
                raw[0] = BcoPlugAddrMode::FUNCBLK;
                raw[1] = s.subunit_type.into();
                raw[2] = s.subunit_id;
                raw[3..6].copy_from_slice(&d.to_raw());
            }
        }
        raw
    }
}

/// Address to plug connected to the other plug.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoIoPlugAddr {
    /// For direction of plug.
    pub direction: PlugDirection,
    /// The mode to address for the plug.
    pub mode: BcoIoPlugAddrMode,
}

impl BcoIoPlugAddr {
    const LENGTH: usize = 7;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let direction = PlugDirection::try_from(raw[0])?;
        let mode = BcoIoPlugAddrMode::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
        Ok(Self { direction, mode })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        raw[0] = self.direction.into();
        raw[1..].copy_from_slice(&self.mode.to_raw());
        raw
    }
}

/// The type of plug.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoPlugType {
    /// For isochronous communication.
    Isoc,
    /// For asynchronous communication.
    Async,
    /// For MIDI messages.
    Midi,
    /// For synchronization.
    Sync,
    /// For analog signal.
    Analog,
    /// For digital signal.
    Digital,
    /// For sampling clock.
    Clock,
}

impl Default for BcoPlugType {
    fn default() -> Self {
        Self::Isoc
    }
}

impl BcoPlugType {
    const ISOC_STREAM: u8 = 0x00;
    const ASYNC_STREAM: u8 = 0x01;
    const MIDI: u8 = 0x02;
    const SYNC: u8 = 0x03;
    const ANALOG: u8 = 0x04;
    const DIGITAL: u8 = 0x05;
    const CLOCK: u8 = 0x06;
}

impl TryFrom<u8> for BcoPlugType {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            Self::ISOC_STREAM => Ok(Self::Isoc),
            Self::ASYNC_STREAM => Ok(Self::Async),
            Self::MIDI => Ok(Self::Midi),
            Self::SYNC => Ok(Self::Sync),
            Self::ANALOG => Ok(Self::Analog),
            Self::DIGITAL => Ok(Self::Digital),
            Self::CLOCK => Ok(Self::Clock),
            _ => Err(AvcRespParseError::UnexpectedOperands(0)),
        }
    }
}

impl From<BcoPlugType> for u8 {
    fn from(plug_type: BcoPlugType) -> Self {
        match plug_type {
            BcoPlugType::Isoc => BcoPlugType::ISOC_STREAM,
            BcoPlugType::Async => BcoPlugType::ASYNC_STREAM,
            BcoPlugType::Midi => BcoPlugType::MIDI,
            BcoPlugType::Sync => BcoPlugType::SYNC,
            BcoPlugType::Analog => BcoPlugType::ANALOG,
            BcoPlugType::Digital => BcoPlugType::DIGITAL,
            BcoPlugType::Clock => BcoPlugType::CLOCK,
        }
    }
}

/// Physical location of data channel for multi bit linear audio.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoLocation {
    LeftFront,
    RightFront,
    Center,
    LowFrequencyEffect,
    LeftSurround,
    RightSurround,
    LeftCenter,
    RightCenter,
    Surround,
    SideLeft,
    SideRight,
    Top,
    Bottom,
    LeftFrontEffect,
    RightFrontEffect,
    NoPosition,
}

impl Default for BcoLocation {
    fn default() -> Self {
        Self::NoPosition
    }
}

impl BcoLocation {
    const NO_POSITION: u8 = 0xff;

    // The value from 0x01 in order.
    const POSITIONS: [Self; 15] = [
        Self::LeftFront,
        Self::RightFront,
        Self::Center,
        Self::LowFrequencyEffect,
        Self::LeftSurround,
        Self::RightSurround,
        Self::LeftCenter,
        Self::RightCenter,
        Self::Surround,
        Self::SideLeft,
        Self::SideRight,
        Self::Top,
        Self::Bottom,
        Self::LeftFrontEffect,
        Self::RightFrontEffect,
    ];
}

impl TryFrom<u8> for BcoLocation {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        if val == Self::NO_POSITION {
            Ok(Self::NoPosition)
        } else {
            (val as usize)
                .checked_sub(1)
                .and_then(|pos| Self::POSITIONS.get(pos))
                .copied()
                .ok_or(AvcRespParseError::UnexpectedOperands(0))
        }
    }
}

impl From<BcoLocation> for u8 {
    fn from(loc: BcoLocation) -> Self {
        BcoLocation::POSITIONS
            .iter()
            .position(|l| *l == loc)
            .map(|pos| (pos + 1) as u8)
            .unwrap_or(BcoLocation::NO_POSITION)
    }
}

/// Information about data channel for multi bit linear audio.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BcoChannelInfo {
    /// The position of channel in data frame.
    pub pos: u8,
    /// The location of channel for playback or capture.
    pub loc: BcoLocation,
}

impl Default for BcoChannelInfo {
    fn default() -> Self {
        Self {
            pos: 0xff,
            loc: Default::default(),
        }
    }
}

impl BcoChannelInfo {
    const LENGTH: usize = 2;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let loc = BcoLocation::try_from(raw[1]).map_err(|err| err.add_offset(1))?;
        Ok(Self { pos: raw[0], loc })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.pos, self.loc.into()]
    }
}

/// Cluster with single or multiple data channels.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct BcoCluster {
    /// The entries of cluster.
    pub entries: Vec<BcoChannelInfo>,
}

impl BcoCluster {
    const LENGTH_MIN: usize = 1;

    fn length(&self) -> usize {
        Self::LENGTH_MIN + self.entries.len() * BcoChannelInfo::LENGTH
    }

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let count = raw[0] as usize;
        let length = Self::LENGTH_MIN + count * BcoChannelInfo::LENGTH;
        if raw.len() < length {
            Err(AvcRespParseError::TooShortResp(length))?;
        }

        let mut entries = Vec::with_capacity(count);
        let mut pos = Self::LENGTH_MIN;
        while pos < length {
            let entry = BcoChannelInfo::from_raw(&raw[pos..]).map_err(|err| err.add_offset(pos))?;
            entries.push(entry);
            pos += BcoChannelInfo::LENGTH;
        }

        Ok(Self { entries })
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.length());
        raw.push(self.entries.len() as u8);
        self.entries
            .iter()
            .for_each(|entry| raw.extend_from_slice(&entry.to_raw()));
        raw
    }
}

/// Name of data channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BcoChannelName {
    /// The channel in data frame, starting from 1.
    pub ch: u8,
    /// The name of channel.
    pub name: String,
}

impl Default for BcoChannelName {
    fn default() -> Self {
        Self {
            ch: 0xff,
            name: Default::default(),
        }
    }
}

/// Type of physical port.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoPortType {
    Speaker,
    Headphone,
    Microphone,
    Line,
    Spdif,
    Adat,
    Tdif,
    Madi,
    Analog,
    Digital,
    Midi,
    NoType,
}

impl Default for BcoPortType {
    fn default() -> Self {
        Self::NoType
    }
}

impl BcoPortType {
    const NO_TYPE: u8 = 0xff;

    // The value from 0x00 in order.
    const TYPES: [Self; 11] = [
        Self::Speaker,
        Self::Headphone,
        Self::Microphone,
        Self::Line,
        Self::Spdif,
        Self::Adat,
        Self::Tdif,
        Self::Madi,
        Self::Analog,
        Self::Digital,
        Self::Midi,
    ];
}

impl TryFrom<u8> for BcoPortType {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        if val == Self::NO_TYPE {
            Ok(Self::NoType)
        } else {
            Self::TYPES
                .get(val as usize)
                .copied()
                .ok_or(AvcRespParseError::UnexpectedOperands(0))
        }
    }
}

impl From<BcoPortType> for u8 {
    fn from(port_type: BcoPortType) -> Self {
        BcoPortType::TYPES
            .iter()
            .position(|t| *t == port_type)
            .map(|pos| pos as u8)
            .unwrap_or(BcoPortType::NO_TYPE)
    }
}

/// Information about cluster of data channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BcoClusterInfo {
    /// The index of cluster, starting from 1.
    pub index: u8,
    /// The type of port for the cluster.
    pub port_type: BcoPortType,
    /// The name of cluster.
    pub name: String,
}

impl Default for BcoClusterInfo {
    fn default() -> Self {
        Self {
            index: 0xff,
            port_type: Default::default(),
            name: Default::default(),
        }
    }
}

impl BcoClusterInfo {
    const LENGTH_MIN: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let port_type = BcoPortType::try_from(raw[1]).map_err(|err| err.add_offset(1))?;
        let name = parse_name(&raw[2..]).map_err(|err| err.add_offset(2))?;
        Ok(Self {
            index: raw[0],
            port_type,
            name,
        })
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = vec![self.index, self.port_type.into()];
        build_name(&mut raw, &self.name);
        raw
    }
}

// The name is prefixed by its length.
fn parse_name(raw: &[u8]) -> Result<String, AvcRespParseError> {
    if raw.is_empty() {
        Err(AvcRespParseError::TooShortResp(1))?;
    }

    let length = 1 + raw[0] as usize;
    if raw.len() < length {
        Err(AvcRespParseError::TooShortResp(length))?;
    }

    Ok(String::from_utf8_lossy(&raw[1..length]).into_owned())
}

fn build_name(raw: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    let length = bytes.len().min(u8::MAX as usize);
    raw.push(length as u8);
    raw.extend_from_slice(&bytes[..length]);
}

/// Type of information about plug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BcoPlugInfo {
    /// The type of plug.
    Type(BcoPlugType),
    /// The name of plug.
    Name(String),
    /// The number of channels in the plug.
    ChCount(u8),
    /// The position of channels in each cluster in the plug.
    ChPositions(Vec<BcoCluster>),
    /// The name of channel in the plug.
    ChName(BcoChannelName),
    /// The plug information as signal source to the plug.
    Input(BcoIoPlugAddr),
    /// The plug information as signal destination from the plug.
    Outputs(Vec<BcoIoPlugAddr>),
    /// The data of each cluster in the plug.
    ClusterInfo(BcoClusterInfo),
    Reserved(Vec<u8>),
}

impl Default for BcoPlugInfo {
    fn default() -> Self {
        Self::Type(Default::default())
    }
}

impl BcoPlugInfo {
    const TYPE: u8 = 0x00;
    const NAME: u8 = 0x01;
    const CH_COUNT: u8 = 0x02;
    const CH_POSITIONS: u8 = 0x03;
    const CH_NAME: u8 = 0x04;
    const INPUT: u8 = 0x05;
    const OUTPUTS: u8 = 0x06;
    const CLUSTER_INFO: u8 = 0x07;

    const LENGTH_MIN: usize = 2;

    fn info_type(&self) -> u8 {
        match self {
            Self::Type(_) => Self::TYPE,
            Self::Name(_) => Self::NAME,
            Self::ChCount(_) => Self::CH_COUNT,
            Self::ChPositions(_) => Self::CH_POSITIONS,
            Self::ChName(_) => Self::CH_NAME,
            Self::Input(_) => Self::INPUT,
            Self::Outputs(_) => Self::OUTPUTS,
            Self::ClusterInfo(_) => Self::CLUSTER_INFO,
            Self::Reserved(d) => d.first().copied().unwrap_or(0xff),
        }
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(Self::LENGTH_MIN);
        if let Self::Reserved(d) = self {
            raw.extend_from_slice(d);
            return raw;
        }

        raw.push(self.info_type());
        match self {
            Self::Type(plug_type) => raw.push(u8::from(*plug_type)),
            Self::Name(name) => build_name(&mut raw, name),
            Self::ChCount(count) => raw.push(*count),
            Self::ChPositions(clusters) => {
                raw.push(clusters.len() as u8);
                clusters
                    .iter()
                    .for_each(|cluster| raw.append(&mut cluster.to_raw()));
            }
            Self::ChName(d) => {
                raw.push(d.ch);
                build_name(&mut raw, &d.name);
            }
            Self::Input(plug_addr) => raw.extend_from_slice(&plug_addr.to_raw()),
            Self::Outputs(plug_addrs) => {
                raw.push(plug_addrs.len() as u8);
                plug_addrs
                    .iter()
                    .for_each(|plug_addr| raw.extend_from_slice(&plug_addr.to_raw()));
            }
            Self::ClusterInfo(d) => raw.append(&mut d.to_raw()),
            Self::Reserved(_) => (),
        }
        raw
    }

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let info = match raw[0] {
            Self::TYPE => BcoPlugType::try_from(raw[1])
                .map(Self::Type)
                .map_err(|err| err.add_offset(1))?,
            Self::NAME => parse_name(&raw[1..])
                .map(Self::Name)
                .map_err(|err| err.add_offset(1))?,
            Self::CH_COUNT => Self::ChCount(raw[1]),
            Self::CH_POSITIONS => {
                let count = raw[1] as usize;
                let mut clusters = Vec::with_capacity(count);
                let mut pos = 2;
                while clusters.len() < count {
                    let cluster =
                        BcoCluster::from_raw(&raw[pos..]).map_err(|err| err.add_offset(pos))?;
                    pos += cluster.length();
                    clusters.push(cluster);
                }
                Self::ChPositions(clusters)
            }
            Self::CH_NAME => {
                let name = parse_name(&raw[2..]).map_err(|err| err.add_offset(2))?;
                Self::ChName(BcoChannelName { ch: raw[1], name })
            }
            Self::INPUT => BcoIoPlugAddr::from_raw(&raw[1..])
                .map(Self::Input)
                .map_err(|err| err.add_offset(1))?,
            Self::OUTPUTS => {
                let count = raw[1] as usize;
                let mut plug_addrs = Vec::with_capacity(count);
                let mut pos = 2;
                while plug_addrs.len() < count {
                    let plug_addr =
                        BcoIoPlugAddr::from_raw(&raw[pos..]).map_err(|err| err.add_offset(pos))?;
                    plug_addrs.push(plug_addr);
                    pos += BcoIoPlugAddr::LENGTH;
                }
                Self::Outputs(plug_addrs)
            }
            Self::CLUSTER_INFO => BcoClusterInfo::from_raw(&raw[1..])
                .map(Self::ClusterInfo)
                .map_err(|err| err.add_offset(1))?,
            _ => Self::Reserved(raw.to_vec()),
        };

        Ok(info)
    }
}

/// AV/C command for extended plug information.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPlugInfo {
    /// The address of plug.
    pub addr: BcoPlugAddr,
    /// The type of plug information
    pub info: BcoPlugInfo,
}

impl ExtendedPlugInfo {
    const SUBFUNC: u8 = 0xc0;

    const INFO_POS: usize = 1 + BcoPlugAddr::LENGTH;

    /// Instantiate extended plug info structure with parameters.
    pub fn new(addr: &BcoPlugAddr, info: BcoPlugInfo) -> Self {
        Self { addr: *addr, info }
    }
}

impl AvcOp for ExtendedPlugInfo {
    const OPCODE: u8 = PlugInfo::OPCODE;
    // The subfunction and the address of plug.
    const ECHO_LENGTH: usize = 1 + BcoPlugAddr::LENGTH;
}

impl AvcStatus for ExtendedPlugInfo {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        let mut operands = vec![Self::SUBFUNC];
        operands.extend_from_slice(&self.addr.to_raw());
        operands.append(&mut self.info.to_raw());
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::INFO_POS + BcoPlugInfo::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(
                Self::INFO_POS + BcoPlugInfo::LENGTH_MIN,
            ))?;
        }

        if operands[0] != Self::SUBFUNC {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let addr = BcoPlugAddr::from_raw(&operands[1..]).map_err(|err| err.add_offset(1))?;
        if addr != self.addr {
            Err(AvcRespParseError::UnexpectedOperands(1))?;
        }

        if operands[Self::INFO_POS] != self.info.info_type() {
            Err(AvcRespParseError::UnexpectedOperands(Self::INFO_POS))?;
        }

        self.info = BcoPlugInfo::from_raw(&operands[Self::INFO_POS..])
            .map_err(|err| err.add_offset(Self::INFO_POS))?;

        Ok(())
    }
}

//
// Bco Extended Subunit Info command
//

/// Entry for information about function block in subunit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedSubunitInfoEntry {
    /// The type of function block.
    pub func_blk_type: u8,
    /// The numeric identifier of function block.
    pub func_blk_id: u8,
    /// The purpose of function block.
    pub func_blk_purpose: u8,
    /// The number of input plugs.
    pub input_plugs: u8,
    /// The number of output plugs.
    pub output_plugs: u8,
}

impl Default for ExtendedSubunitInfoEntry {
    fn default() -> Self {
        Self {
            func_blk_type: 0xff,
            func_blk_id: 0xff,
            func_blk_purpose: 0xff,
            input_plugs: 0xff,
            output_plugs: 0xff,
        }
    }
}

impl ExtendedSubunitInfoEntry {
    const LENGTH: usize = 5;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(Self {
            func_blk_type: raw[0],
            func_blk_id: raw[1],
            func_blk_purpose: raw[2],
            input_plugs: raw[3],
            output_plugs: raw[4],
        })
    }
}

/// AV/C command for extended subunit information. Each page has 5 entries at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSubunitInfo {
    /// The numeric identifier of page.
    pub page: u8,
    /// The type of function block.
    pub func_blk_type: u8,
    /// The entries for subunit information.
    pub entries: Vec<ExtendedSubunitInfoEntry>,
}

impl Default for ExtendedSubunitInfo {
    fn default() -> Self {
        Self {
            page: 0xff,
            func_blk_type: 0xff,
            entries: Default::default(),
        }
    }
}

impl ExtendedSubunitInfo {
    /// The value of function block type to match any type.
    pub const ANY_FUNC_BLK_TYPE: u8 = 0xff;

    /// The maximum number of entries in a page.
    pub const ENTRY_COUNT: usize = 5;

    const LENGTH: usize = 2 + Self::ENTRY_COUNT * ExtendedSubunitInfoEntry::LENGTH;
    const EMPTY_ENTRY: u8 = 0xff;

    /// Instantiate structure with the numeric identifier of page and the type of function block.
    pub fn new(page: u8, func_blk_type: u8) -> Self {
        Self {
            page,
            func_blk_type,
            ..Default::default()
        }
    }
}

impl AvcOp for ExtendedSubunitInfo {
    const OPCODE: u8 = SubunitInfo::OPCODE;
    const ECHO_LENGTH: usize = 2;
}

impl AvcStatus for ExtendedSubunitInfo {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        let mut operands = vec![0xff; Self::LENGTH];
        operands[0] = self.page;
        operands[1] = self.func_blk_type;
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }
        if self.page != operands[0] {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }
        if self.func_blk_type != operands[1] {
            Err(AvcRespParseError::UnexpectedOperands(1))?;
        }

        let mut entries = Vec::with_capacity(Self::ENTRY_COUNT);
        let mut pos = 2;
        while pos < Self::LENGTH {
            if operands[pos] != Self::EMPTY_ENTRY {
                let entry = ExtendedSubunitInfoEntry::from_raw(&operands[pos..])
                    .map_err(|err| err.add_offset(pos))?;
                entries.push(entry);
            }
            pos += ExtendedSubunitInfoEntry::LENGTH;
        }
        self.entries = entries;

        Ok(())
    }
}

//
// Bco Extended Stream Format Info command
//

/// Format of isochronous packet stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BcoStreamFormat {
    /// For compound AM824 stream, or AM824 stream for synchronization.
    Am824(StreamFormat),
    /// The other formats are not supported in the implementation.
    Reserved(Vec<u8>),
}

impl Default for BcoStreamFormat {
    fn default() -> Self {
        Self::Reserved(Default::default())
    }
}

impl BcoStreamFormat {
    /// Refer to the stream format of AM824 family.
    pub fn as_am824_stream(&self) -> Option<&StreamFormat> {
        match self {
            Self::Am824(fmt) => Some(fmt),
            Self::Reserved(_) => None,
        }
    }

    fn is_supported(raw: &[u8]) -> bool {
        match raw {
            [StreamFormat::HIER_ROOT_AM, StreamFormat::HIER_LEVEL_1_COMPOUND_AM824, ..] => true,
            [StreamFormat::HIER_ROOT_AM, StreamFormat::HIER_LEVEL_1_AM824, class, ..] => {
                *class == u8::from(ChannelClass::SyncStream)
            }
            _ => false,
        }
    }

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if Self::is_supported(raw) {
            StreamFormat::decode(raw)
                .map(Self::Am824)
                .map_err(AvcRespParseError::from)
        } else {
            Ok(Self::Reserved(raw.to_vec()))
        }
    }

    fn to_raw(&self) -> Result<Vec<u8>, AvcCmdBuildError> {
        match self {
            Self::Am824(fmt) => fmt.encode().map_err(|_| AvcCmdBuildError::InvalidOperands),
            Self::Reserved(raw) => Ok(raw.clone()),
        }
    }
}

/// The status to support the stream format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BcoSupportStatus {
    /// The format is already set and stream is available.
    Active,
    /// The format is already set but stream is not available.
    Inactive,
    /// The format is not set yet.
    NoStreamFormat,
    NotUsed,
}

impl Default for BcoSupportStatus {
    fn default() -> Self {
        Self::NotUsed
    }
}

impl BcoSupportStatus {
    const ACTIVE: u8 = 0x00;
    const INACTIVE: u8 = 0x01;
    const NO_STREAM_FORMAT: u8 = 0x02;
    const NOT_USED: u8 = 0xff;
}

impl TryFrom<u8> for BcoSupportStatus {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            Self::ACTIVE => Ok(Self::Active),
            Self::INACTIVE => Ok(Self::Inactive),
            Self::NO_STREAM_FORMAT => Ok(Self::NoStreamFormat),
            Self::NOT_USED => Ok(Self::NotUsed),
            _ => Err(AvcRespParseError::UnexpectedOperands(0)),
        }
    }
}

impl From<BcoSupportStatus> for u8 {
    fn from(status: BcoSupportStatus) -> Self {
        match status {
            BcoSupportStatus::Active => BcoSupportStatus::ACTIVE,
            BcoSupportStatus::Inactive => BcoSupportStatus::INACTIVE,
            BcoSupportStatus::NoStreamFormat => BcoSupportStatus::NO_STREAM_FORMAT,
            BcoSupportStatus::NotUsed => BcoSupportStatus::NOT_USED,
        }
    }
}

/// The common part of extended stream format command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct BcoExtendedStreamFormat {
    subfunc: u8,
    plug_addr: BcoPlugAddr,
    support_status: BcoSupportStatus,
}

impl BcoExtendedStreamFormat {
    const OPCODE: u8 = 0x2f;

    const LENGTH: usize = 2 + BcoPlugAddr::LENGTH;

    // The subfunction and the address of plug, except for the status of support.
    const ECHO_LENGTH: usize = Self::LENGTH - 1;

    fn new(subfunc: u8, plug_addr: &BcoPlugAddr) -> Self {
        Self {
            subfunc,
            plug_addr: *plug_addr,
            support_status: Default::default(),
        }
    }

    fn build_operands(&self) -> Vec<u8> {
        let mut operands = Vec::with_capacity(Self::LENGTH);
        operands.push(self.subfunc);
        operands.extend_from_slice(&self.plug_addr.to_raw());
        operands.push(self.support_status.into());
        operands
    }

    fn parse_operands(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        if operands[0] != self.subfunc {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let plug_addr = BcoPlugAddr::from_raw(&operands[1..]).map_err(|err| err.add_offset(1))?;
        if plug_addr != self.plug_addr {
            Err(AvcRespParseError::UnexpectedOperands(1))?;
        }

        self.support_status = BcoSupportStatus::try_from(operands[Self::LENGTH - 1])
            .map_err(|err| err.add_offset(Self::LENGTH - 1))?;

        Ok(())
    }
}

/// AV/C command for single subfunction of extension of stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedStreamFormatSingle {
    /// The status to support the stream format.
    pub support_status: BcoSupportStatus,
    /// The stream format.
    pub stream_format: BcoStreamFormat,
    op: BcoExtendedStreamFormat,
}

impl ExtendedStreamFormatSingle {
    const SUBFUNC: u8 = 0xc0;

    pub fn new(plug_addr: &BcoPlugAddr) -> Self {
        Self {
            support_status: Default::default(),
            stream_format: Default::default(),
            op: BcoExtendedStreamFormat::new(Self::SUBFUNC, plug_addr),
        }
    }

    fn parse_operands(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.op.parse_operands(operands)?;
        self.support_status = self.op.support_status;

        let pos = BcoExtendedStreamFormat::LENGTH;
        self.stream_format =
            BcoStreamFormat::from_raw(&operands[pos..]).map_err(|err| err.add_offset(pos))?;

        Ok(())
    }
}

impl AvcOp for ExtendedStreamFormatSingle {
    const OPCODE: u8 = BcoExtendedStreamFormat::OPCODE;
    const ECHO_LENGTH: usize = BcoExtendedStreamFormat::ECHO_LENGTH;
}

impl AvcStatus for ExtendedStreamFormatSingle {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.op.support_status = BcoSupportStatus::NotUsed;
        Ok(self.op.build_operands())
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        ExtendedStreamFormatSingle::parse_operands(self, operands)
    }
}

impl AvcControl for ExtendedStreamFormatSingle {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        if let BcoStreamFormat::Reserved(_) = &self.stream_format {
            Err(AvcCmdBuildError::InvalidOperands)?;
        }

        self.op.support_status = BcoSupportStatus::Active;
        let mut operands = self.op.build_operands();
        operands.append(&mut self.stream_format.to_raw()?);
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        ExtendedStreamFormatSingle::parse_operands(self, operands)
    }
}

/// AV/C command for list subfunction of extension of stream format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedStreamFormatList {
    /// The status to support the stream format.
    pub support_status: BcoSupportStatus,
    /// The index of stream format.
    pub index: u8,
    /// The stream format.
    pub stream_format: BcoStreamFormat,
    op: BcoExtendedStreamFormat,
}

impl ExtendedStreamFormatList {
    const SUBFUNC: u8 = 0xc1;

    const INDEX_POS: usize = BcoExtendedStreamFormat::LENGTH;

    /// Instantiate extended stream format list structure with parameters.
    pub fn new(plug_addr: &BcoPlugAddr, index: u8) -> Self {
        Self {
            support_status: Default::default(),
            index,
            stream_format: Default::default(),
            op: BcoExtendedStreamFormat::new(Self::SUBFUNC, plug_addr),
        }
    }

    /// Retrieve entries of stream format for the plug by increasing the index until the target
    /// reports no more entry.
    pub fn enumerate<A: Ta1394Avc>(
        avc: &A,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<Vec<BcoStreamFormat>, AvcError> {
        let mut entries = Vec::new();
        for index in 0..u8::MAX {
            let mut op = Self::new(&location.addr, index);
            match avc.status(&location.subunit, &mut op, timeout_ms) {
                Ok(_) => entries.push(op.stream_format),
                Err(AvcError::NotImplemented) | Err(AvcError::Rejected) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(entries)
    }
}

impl AvcOp for ExtendedStreamFormatList {
    const OPCODE: u8 = BcoExtendedStreamFormat::OPCODE;
    const ECHO_LENGTH: usize = BcoExtendedStreamFormat::ECHO_LENGTH;
}

impl AvcStatus for ExtendedStreamFormatList {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.op.support_status = BcoSupportStatus::NotUsed;
        let mut operands = self.op.build_operands();
        operands.push(self.index);
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::INDEX_POS + 1 {
            Err(AvcRespParseError::TooShortResp(Self::INDEX_POS + 1))?;
        }

        self.op.parse_operands(operands)?;
        self.support_status = self.op.support_status;

        if operands[Self::INDEX_POS] != self.index {
            Err(AvcRespParseError::UnexpectedOperands(Self::INDEX_POS))?;
        }

        let pos = Self::INDEX_POS + 1;
        self.stream_format =
            BcoStreamFormat::from_raw(&operands[pos..]).map_err(|err| err.add_offset(pos))?;

        Ok(())
    }
}

/// The operations of BridgeCo extensions for plugs, function blocks and stream formats.
pub trait BcoPlugOperation: Ta1394Avc {
    /// Retrieve the type of information about the plug.
    fn get_bco_plug_info(
        &self,
        location: &BcoPlugLocation,
        info: BcoPlugInfo,
        timeout_ms: u32,
    ) -> Result<BcoPlugInfo, AvcError> {
        let mut op = ExtendedPlugInfo::new(&location.addr, info);
        self.status(&location.subunit, &mut op, timeout_ms)?;
        Ok(op.info)
    }

    fn get_plug_type(
        &self,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<BcoPlugType, AvcError> {
        match self.get_bco_plug_info(location, BcoPlugInfo::Type(Default::default()), timeout_ms)? {
            BcoPlugInfo::Type(plug_type) => Ok(plug_type),
            _ => Err(unexpected_info()),
        }
    }

    fn get_plug_name(&self, location: &BcoPlugLocation, timeout_ms: u32) -> Result<String, AvcError> {
        match self.get_bco_plug_info(location, BcoPlugInfo::Name(Default::default()), timeout_ms)? {
            BcoPlugInfo::Name(name) => Ok(name),
            _ => Err(unexpected_info()),
        }
    }

    fn get_plug_ch_count(&self, location: &BcoPlugLocation, timeout_ms: u32) -> Result<u8, AvcError> {
        match self.get_bco_plug_info(location, BcoPlugInfo::ChCount(0xff), timeout_ms)? {
            BcoPlugInfo::ChCount(count) => Ok(count),
            _ => Err(unexpected_info()),
        }
    }

    /// Retrieve the name of channel, starting from 1.
    fn get_plug_ch_name(
        &self,
        location: &BcoPlugLocation,
        ch: u8,
        timeout_ms: u32,
    ) -> Result<BcoChannelName, AvcError> {
        let info = BcoPlugInfo::ChName(BcoChannelName {
            ch,
            name: Default::default(),
        });
        match self.get_bco_plug_info(location, info, timeout_ms)? {
            BcoPlugInfo::ChName(d) if d.ch == ch => Ok(d),
            _ => Err(unexpected_info()),
        }
    }

    fn get_plug_ch_positions(
        &self,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<Vec<BcoCluster>, AvcError> {
        let info = BcoPlugInfo::ChPositions(Default::default());
        match self.get_bco_plug_info(location, info, timeout_ms)? {
            BcoPlugInfo::ChPositions(clusters) => Ok(clusters),
            _ => Err(unexpected_info()),
        }
    }

    /// Retrieve the information of cluster, starting from 1.
    fn get_plug_cluster_info(
        &self,
        location: &BcoPlugLocation,
        index: u8,
        timeout_ms: u32,
    ) -> Result<BcoClusterInfo, AvcError> {
        let info = BcoPlugInfo::ClusterInfo(BcoClusterInfo {
            index,
            ..Default::default()
        });
        match self.get_bco_plug_info(location, info, timeout_ms)? {
            BcoPlugInfo::ClusterInfo(d) if d.index == index => Ok(d),
            _ => Err(unexpected_info()),
        }
    }

    /// Retrieve the plug as the source of signal to the plug.
    fn get_plug_input(
        &self,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<BcoIoPlugAddr, AvcError> {
        match self.get_bco_plug_info(location, BcoPlugInfo::Input(Default::default()), timeout_ms)? {
            BcoPlugInfo::Input(plug_addr) => Ok(plug_addr),
            _ => Err(unexpected_info()),
        }
    }

    /// Retrieve the plugs as the destination of signal from the plug.
    fn get_plug_outputs(
        &self,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<Vec<BcoIoPlugAddr>, AvcError> {
        let info = BcoPlugInfo::Outputs(Default::default());
        match self.get_bco_plug_info(location, info, timeout_ms)? {
            BcoPlugInfo::Outputs(plug_addrs) => Ok(plug_addrs),
            _ => Err(unexpected_info()),
        }
    }

    /// Retrieve all of function blocks in the subunit by paging until the target reports no more
    /// page.
    fn get_func_blks(
        &self,
        subunit: &AvcAddrSubunit,
        timeout_ms: u32,
    ) -> Result<Vec<ExtendedSubunitInfoEntry>, AvcError> {
        let addr = AvcAddr::Subunit(*subunit);
        let mut entries = Vec::new();
        for page in 0..u8::MAX {
            let mut op = ExtendedSubunitInfo::new(page, ExtendedSubunitInfo::ANY_FUNC_BLK_TYPE);
            match self.status(&addr, &mut op, timeout_ms) {
                Ok(_) => (),
                Err(AvcError::NotImplemented) | Err(AvcError::Rejected) => break,
                Err(err) => return Err(err),
            }
            let count = op.entries.len();
            entries.append(&mut op.entries);
            if count < ExtendedSubunitInfo::ENTRY_COUNT {
                break;
            }
        }
        Ok(entries)
    }

    /// Retrieve current stream format of the plug.
    fn get_stream_format(
        &self,
        location: &BcoPlugLocation,
        timeout_ms: u32,
    ) -> Result<(BcoSupportStatus, BcoStreamFormat), AvcError> {
        let mut op = ExtendedStreamFormatSingle::new(&location.addr);
        self.status(&location.subunit, &mut op, timeout_ms)?;
        Ok((op.support_status, op.stream_format))
    }

    /// Change stream format of the plug.
    fn set_stream_format(
        &self,
        location: &BcoPlugLocation,
        stream_format: &StreamFormat,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let mut op = ExtendedStreamFormatSingle::new(&location.addr);
        op.stream_format = BcoStreamFormat::Am824(stream_format.clone());
        self.control(&location.subunit, &mut op, timeout_ms)
    }
}

impl<O: Ta1394Avc> BcoPlugOperation for O {}

fn unexpected_info() -> AvcError {
    AvcError::Protocol(AvcRespParseError::UnexpectedOperands(ExtendedPlugInfo::INFO_POS))
}
