// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

#![doc = include_str!("../README.md")]

/// Encoder and decoder of FDF field in Audio and Music Data Transmission Protocol.
pub mod amdtp;

use {std::convert::TryFrom, ta1394_avc_general::*};

/// The AV/C address of first audio subunit for convenience.
pub const AUDIO_SUBUNIT_0_ADDR: AvcAddr = AvcAddr::Subunit(AUDIO_SUBUNIT_0);

/// The AV/C address of audio subunit with the identifier.
pub fn audio_subunit_addr(subunit_id: u8) -> AvcAddr {
    AvcAddr::Subunit(AvcAddrSubunit::new(AvcSubunitType::Audio, subunit_id))
}

/// The type of function block in audio subunit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AudioFuncBlkType {
    /// Selector function block.
    Selector,
    /// Feature function block.
    Feature,
    /// Processing function block.
    Processing,
    Reserved(u8),
}

impl Default for AudioFuncBlkType {
    fn default() -> Self {
        Self::Reserved(0xff)
    }
}

impl AudioFuncBlkType {
    const SELECTOR: u8 = 0x80;
    const FEATURE: u8 = 0x81;
    const PROCESSING: u8 = 0x82;

    fn from_val(val: u8) -> Self {
        match val {
            Self::SELECTOR => Self::Selector,
            Self::FEATURE => Self::Feature,
            Self::PROCESSING => Self::Processing,
            _ => Self::Reserved(val),
        }
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::Selector => Self::SELECTOR,
            Self::Feature => Self::FEATURE,
            Self::Processing => Self::PROCESSING,
            Self::Reserved(val) => *val,
        }
    }
}

/// For attributes of control (clause "4.8 Control Attributes").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CtlAttr {
    /// Minimum scale.
    Resolution,
    /// Minimum setting.
    Minimum,
    /// Maximum setting.
    Maximum,
    /// Default setting.
    Default,
    /// Minimum moving time.
    Duration,
    /// Current setting.
    Current,
    /// Request to change the value during a period equals to a number of Duration.
    Move,
    /// Relative setting in unit steps.
    Delta,
    Reserved(u8),
}

impl Default for CtlAttr {
    fn default() -> Self {
        Self::Reserved(0xff)
    }
}

impl CtlAttr {
    const RESOLUTION: u8 = 0x01;
    const MINIMUM: u8 = 0x02;
    const MAXIMUM: u8 = 0x03;
    const DEFAULT: u8 = 0x04;
    const DURATION: u8 = 0x08;
    const CURRENT: u8 = 0x10;
    const MOVE: u8 = 0x18;
    const DELTA: u8 = 0x19;
}

impl From<u8> for CtlAttr {
    fn from(val: u8) -> Self {
        match val {
            Self::RESOLUTION => Self::Resolution,
            Self::MINIMUM => Self::Minimum,
            Self::MAXIMUM => Self::Maximum,
            Self::DEFAULT => Self::Default,
            Self::DURATION => Self::Duration,
            Self::CURRENT => Self::Current,
            Self::MOVE => Self::Move,
            Self::DELTA => Self::Delta,
            _ => Self::Reserved(val),
        }
    }
}

impl From<CtlAttr> for u8 {
    fn from(attr: CtlAttr) -> Self {
        match attr {
            CtlAttr::Resolution => CtlAttr::RESOLUTION,
            CtlAttr::Minimum => CtlAttr::MINIMUM,
            CtlAttr::Maximum => CtlAttr::MAXIMUM,
            CtlAttr::Default => CtlAttr::DEFAULT,
            CtlAttr::Duration => CtlAttr::DURATION,
            CtlAttr::Current => CtlAttr::CURRENT,
            CtlAttr::Move => CtlAttr::MOVE,
            CtlAttr::Delta => CtlAttr::DELTA,
            CtlAttr::Reserved(val) => val,
        }
    }
}

impl std::fmt::Display for CtlAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution => write!(f, "resolution"),
            Self::Minimum => write!(f, "minimum"),
            Self::Maximum => write!(f, "maximum"),
            Self::Default => write!(f, "default"),
            Self::Duration => write!(f, "duration"),
            Self::Current => write!(f, "current"),
            Self::Move => write!(f, "move"),
            Self::Delta => write!(f, "delta"),
            Self::Reserved(val) => write!(f, "reserved: {}", val),
        }
    }
}

/// For control information in frame of function block command.
#[derive(Clone, Debug, Eq, PartialEq)]
struct AudioFuncBlkCtl {
    /// The value of control_selector field for the type of control.
    selector: u8,
    /// The data in control_data field according to the type.
    data: Vec<u8>,
}

impl Default for AudioFuncBlkCtl {
    fn default() -> Self {
        Self {
            selector: 0xff,
            data: Default::default(),
        }
    }
}

impl AudioFuncBlkCtl {
    const LENGTH_MIN: usize = 1;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }
        let mut ctl = Self {
            selector: raw[0],
            data: Default::default(),
        };
        if raw.len() > 1 {
            let length = raw[1] as usize;
            if raw.len() < 2 + length {
                Err(AvcRespParseError::TooShortResp(2 + length))?;
            }
            ctl.data.extend_from_slice(&raw[2..(2 + length)]);
        }
        Ok(ctl)
    }

    fn to_raw(&self) -> Result<Vec<u8>, AvcCmdBuildError> {
        let mut raw = Vec::with_capacity(2 + self.data.len());
        raw.push(self.selector);
        if self.data.len() > 0 {
            let length =
                u8::try_from(self.data.len()).map_err(|_| AvcCmdBuildError::InvalidOperands)?;
            raw.push(length);
            raw.extend_from_slice(&self.data);
        }
        Ok(raw)
    }
}

/// For operands of frame in function block command (clause "10. Audio Subunit FUNCTION_BLOCK
/// command")
#[derive(Clone, Debug, Eq, PartialEq)]
struct AudioFuncBlk {
    func_blk_type: AudioFuncBlkType,
    func_blk_id: u8,
    ctl_attr: CtlAttr,
    audio_selector_data: Vec<u8>,
    ctl: AudioFuncBlkCtl,
}

impl Default for AudioFuncBlk {
    fn default() -> Self {
        Self {
            func_blk_type: Default::default(),
            func_blk_id: 0xff,
            ctl_attr: Default::default(),
            audio_selector_data: Default::default(),
            ctl: Default::default(),
        }
    }
}

impl AudioFuncBlk {
    const HEADER_LENGTH: usize = 4;

    fn build_operands(&self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        if let AvcAddr::Subunit(AvcAddrSubunit {
            subunit_type: AvcSubunitType::Audio,
            subunit_id: _,
        }) = addr
        {
            let audio_selector_length = u8::try_from(1 + self.audio_selector_data.len())
                .map_err(|_| AvcCmdBuildError::InvalidOperands)?;

            let mut operands = Vec::new();
            operands.push(self.func_blk_type.to_val());
            operands.push(self.func_blk_id);
            operands.push(self.ctl_attr.into());
            operands.push(audio_selector_length);
            operands.extend_from_slice(&self.audio_selector_data);
            operands.append(&mut self.ctl.to_raw()?);
            Ok(operands)
        } else {
            Err(AvcCmdBuildError::InvalidAddress)
        }
    }

    fn parse_operands(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::HEADER_LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::HEADER_LENGTH))?;
        }
        let func_blk_type = AudioFuncBlkType::from_val(operands[0]);
        if func_blk_type != self.func_blk_type {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let func_blk_id = operands[1];
        if func_blk_id != self.func_blk_id {
            Err(AvcRespParseError::UnexpectedOperands(1))?;
        }

        let ctl_attr = CtlAttr::from(operands[2]);
        if ctl_attr != self.ctl_attr {
            Err(AvcRespParseError::UnexpectedOperands(2))?;
        }

        let audio_selector_length = operands[3] as usize;
        if audio_selector_length < 1 {
            Err(AvcRespParseError::UnexpectedOperands(3))?;
        } else if operands.len() < 3 + audio_selector_length {
            Err(AvcRespParseError::TooShortResp(3 + audio_selector_length))?;
        }
        let ctl_pos = 3 + audio_selector_length;
        self.audio_selector_data = operands[Self::HEADER_LENGTH..ctl_pos].to_vec();

        self.ctl = AudioFuncBlkCtl::from_raw(&operands[ctl_pos..])
            .map_err(|err| err.add_offset(ctl_pos))?;

        Ok(())
    }

    /// The offset of control data in operands.
    fn ctl_data_pos(&self) -> usize {
        Self::HEADER_LENGTH + self.audio_selector_data.len() + 2
    }
}

impl AvcOp for AudioFuncBlk {
    const OPCODE: u8 = 0xb8;
    // The type and the numeric identifier of function block, and the attribute of control.
    const ECHO_LENGTH: usize = 3;
}

impl AvcStatus for AudioFuncBlk {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        AudioFuncBlk::build_operands(self, addr)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AudioFuncBlk::parse_operands(self, operands)
    }
}

impl AvcControl for AudioFuncBlk {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        AudioFuncBlk::build_operands(self, addr)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AudioFuncBlk::parse_operands(self, operands)
    }
}

///
/// AV/C Audio Subunit FUNCTION_BLOCK command for Selector function block
///
/// Described in clause "10.2 Selector function block".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AudioSelector {
    pub input_plug_id: u8,
    func_blk: AudioFuncBlk,
}

impl AudioSelector {
    const SELECTOR_CONTROL: u8 = 0x01;

    pub fn new(func_blk_id: u8, ctl_attr: CtlAttr, input_plug_id: u8) -> Self {
        Self {
            input_plug_id,
            func_blk: AudioFuncBlk {
                func_blk_type: AudioFuncBlkType::Selector,
                func_blk_id,
                ctl_attr,
                ..Default::default()
            },
        }
    }

    fn build_func_blk(&mut self) {
        self.func_blk.audio_selector_data = vec![self.input_plug_id];
        self.func_blk.ctl = AudioFuncBlkCtl {
            selector: Self::SELECTOR_CONTROL,
            data: Vec::new(),
        };
    }

    fn parse_func_blk(&mut self) -> Result<(), AvcRespParseError> {
        if self.func_blk.audio_selector_data.len() != 1 {
            Err(AvcRespParseError::UnexpectedOperands(3))
        } else if self.func_blk.ctl.selector != Self::SELECTOR_CONTROL {
            Err(AvcRespParseError::UnexpectedOperands(5))
        } else if self.func_blk.ctl.data.len() > 0 {
            Err(AvcRespParseError::UnexpectedOperands(6))
        } else {
            self.input_plug_id = self.func_blk.audio_selector_data[0];
            Ok(())
        }
    }
}

impl AvcOp for AudioSelector {
    const OPCODE: u8 = AudioFuncBlk::OPCODE;
    const ECHO_LENGTH: usize = AudioFuncBlk::ECHO_LENGTH;
}

impl AvcStatus for AudioSelector {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcStatus::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcStatus::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

impl AvcControl for AudioSelector {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcControl::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcControl::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

const TRUE: u8 = 0x70;
const FALSE: u8 = 0x60;

fn i16_vector_to_raw(data: &[i16]) -> Vec<u8> {
    data.iter().flat_map(|d| d.to_be_bytes().to_vec()).collect()
}

fn u16_vector_to_raw(data: &[u16]) -> Vec<u8> {
    data.iter().flat_map(|d| d.to_be_bytes().to_vec()).collect()
}

fn bool_vector_to_raw(data: &[bool]) -> Vec<u8> {
    data.iter().map(|&d| if d { TRUE } else { FALSE }).collect()
}

fn i16_vector_from_raw(raw: &[u8]) -> Result<Vec<i16>, usize> {
    if raw.len() % 2 > 0 {
        Err(raw.len() - 1)?;
    }
    Ok(raw
        .chunks_exact(2)
        .map(|doublet| i16::from_be_bytes([doublet[0], doublet[1]]))
        .collect())
}

fn u16_vector_from_raw(raw: &[u8]) -> Result<Vec<u16>, usize> {
    if raw.len() % 2 > 0 {
        Err(raw.len() - 1)?;
    }
    Ok(raw
        .chunks_exact(2)
        .map(|doublet| u16::from_be_bytes([doublet[0], doublet[1]]))
        .collect())
}

fn i16_from_raw(raw: &[u8]) -> Result<i16, usize> {
    if raw.len() != 2 {
        Err(0)
    } else {
        Ok(i16::from_be_bytes([raw[0], raw[1]]))
    }
}

// The boolean value is strictly either true or false.
fn bool_vector_from_raw(raw: &[u8]) -> Result<Vec<bool>, usize> {
    raw.iter()
        .enumerate()
        .map(|(i, &b)| match b {
            TRUE => Ok(true),
            FALSE => Ok(false),
            _ => Err(i),
        })
        .collect()
}

fn i8_vector_from_raw(raw: &[u8]) -> Vec<i8> {
    raw.iter().map(|&b| b as i8).collect()
}

/// The type of Feature Control.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FeatureCtl {
    /// Clause 10.3.1 Mute Control.
    Mute(Vec<bool>),
    /// Clause 10.3.2 Volume Control.
    Volume(Vec<i16>),
    /// Clause 10.3.3 LR Balance Control.
    LrBalance(i16),
    /// Clause 10.3.4 FR Balance Control.
    FrBalance(i16),
    /// Clause 10.3.5 Bass Control.
    Bass(Vec<i8>),
    /// Clause 10.3.6 Mid Control.
    Mid(Vec<i8>),
    /// Clause 10.3.7 Treble Control.
    Treble(Vec<i8>),
    /// Clause 10.3.9 Automatic Gain Control.
    AutomaticGain(Vec<bool>),
    /// Clause 10.3.10 Delay Control.
    Delay(Vec<u16>),
    /// Clause 10.3.11 Bass Boost Control.
    BassBoost(Vec<bool>),
    /// Clause 10.3.12 Loudness Control.
    Loudness(Vec<bool>),
    /// The selector and data of the other control.
    Reserved(u8, Vec<u8>),
}

impl FeatureCtl {
    const MUTE: u8 = 0x01;
    const VOLUME: u8 = 0x02;
    const LR_BALANCE: u8 = 0x03;
    const FR_BALANCE: u8 = 0x04;
    const BASS: u8 = 0x05;
    const MID: u8 = 0x06;
    const TREBLE: u8 = 0x07;
    const AUTOMATIC_GAIN: u8 = 0x09;
    const DELAY: u8 = 0x0a;
    const BASS_BOOST: u8 = 0x0b;
    const LOUDNESS: u8 = 0x0c;

    pub const INFINITY: i16 = 0x7ffeu16 as i16;
    pub const NEG_INFINITY: i16 = 0x8000u16 as i16;
    /// The value in status request.
    pub const UNKNOWN: i16 = 0x7fff;

    fn to_ctl(&self) -> AudioFuncBlkCtl {
        let (selector, data) = match self {
            Self::Mute(data) => (Self::MUTE, bool_vector_to_raw(data)),
            Self::Volume(data) => (Self::VOLUME, i16_vector_to_raw(data)),
            Self::LrBalance(data) => (Self::LR_BALANCE, data.to_be_bytes().to_vec()),
            Self::FrBalance(data) => (Self::FR_BALANCE, data.to_be_bytes().to_vec()),
            Self::Bass(data) => (Self::BASS, data.iter().map(|v| *v as u8).collect()),
            Self::Mid(data) => (Self::MID, data.iter().map(|v| *v as u8).collect()),
            Self::Treble(data) => (Self::TREBLE, data.iter().map(|v| *v as u8).collect()),
            Self::AutomaticGain(data) => (Self::AUTOMATIC_GAIN, bool_vector_to_raw(data)),
            Self::Delay(data) => (Self::DELAY, u16_vector_to_raw(data)),
            Self::BassBoost(data) => (Self::BASS_BOOST, bool_vector_to_raw(data)),
            Self::Loudness(data) => (Self::LOUDNESS, bool_vector_to_raw(data)),
            Self::Reserved(selector, data) => (*selector, data.to_vec()),
        };
        AudioFuncBlkCtl { selector, data }
    }

    /// The error includes the offset of unexpected byte in control data.
    fn from_ctl(ctl: &AudioFuncBlkCtl) -> Result<Self, usize> {
        let data = &ctl.data;
        let ctl = match ctl.selector {
            Self::MUTE => Self::Mute(bool_vector_from_raw(data)?),
            Self::VOLUME => Self::Volume(i16_vector_from_raw(data)?),
            Self::LR_BALANCE => Self::LrBalance(i16_from_raw(data)?),
            Self::FR_BALANCE => Self::FrBalance(i16_from_raw(data)?),
            Self::BASS => Self::Bass(i8_vector_from_raw(data)),
            Self::MID => Self::Mid(i8_vector_from_raw(data)),
            Self::TREBLE => Self::Treble(i8_vector_from_raw(data)),
            Self::AUTOMATIC_GAIN => Self::AutomaticGain(bool_vector_from_raw(data)?),
            Self::DELAY => Self::Delay(u16_vector_from_raw(data)?),
            Self::BASS_BOOST => Self::BassBoost(bool_vector_from_raw(data)?),
            Self::LOUDNESS => Self::Loudness(bool_vector_from_raw(data)?),
            selector => Self::Reserved(selector, data.to_vec()),
        };
        Ok(ctl)
    }
}

/// For the value of audio_channel_number field described in clause "10.3 Feature function
/// block".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AudioCh {
    /// Master channel.
    Master,
    /// Each of channel.
    Each(u8),
    /// Void channel.
    Void,
    /// All channels.
    All,
}

impl Default for AudioCh {
    fn default() -> Self {
        Self::All
    }
}

impl AudioCh {
    const MASTER: u8 = 0x00;
    const VOID: u8 = 0xfe;
    const ALL: u8 = 0xff;
}

impl From<u8> for AudioCh {
    fn from(val: u8) -> Self {
        match val {
            Self::MASTER => Self::Master,
            Self::ALL => Self::All,
            Self::VOID => Self::Void,
            _ => Self::Each(val - 1),
        }
    }
}

impl From<AudioCh> for u8 {
    fn from(ch: AudioCh) -> Self {
        match ch {
            AudioCh::Master => AudioCh::MASTER,
            AudioCh::All => AudioCh::ALL,
            AudioCh::Void => AudioCh::VOID,
            AudioCh::Each(val) => val.saturating_add(1).min(AudioCh::VOID - 1),
        }
    }
}

///
/// AV/C Audio Subunit FUNCTION_BLOCK command for Feature function block
///
/// Described in 10.3 Feature function block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AudioFeature {
    /// The channels to address.
    pub audio_ch_num: AudioCh,
    /// The control to manipulate.
    pub ctl: FeatureCtl,

    func_blk: AudioFuncBlk,
}

impl AudioFeature {
    pub fn new(func_blk_id: u8, ctl_attr: CtlAttr, audio_ch_num: AudioCh, ctl: FeatureCtl) -> Self {
        Self {
            audio_ch_num,
            ctl,
            func_blk: AudioFuncBlk {
                func_blk_type: AudioFuncBlkType::Feature,
                func_blk_id,
                ctl_attr,
                ..Default::default()
            },
        }
    }

    fn build_func_blk(&mut self) {
        self.func_blk.audio_selector_data = vec![self.audio_ch_num.into()];
        self.func_blk.ctl = self.ctl.to_ctl();
    }

    fn parse_func_blk(&mut self) -> Result<(), AvcRespParseError> {
        if self.func_blk.audio_selector_data.len() != 1 {
            Err(AvcRespParseError::UnexpectedOperands(3))?;
        }
        let audio_ch_num = AudioCh::from(self.func_blk.audio_selector_data[0]);
        if audio_ch_num != self.audio_ch_num {
            Err(AvcRespParseError::UnexpectedOperands(4))?;
        }
        let ctl_data_pos = self.func_blk.ctl_data_pos();
        self.ctl = FeatureCtl::from_ctl(&self.func_blk.ctl)
            .map_err(|pos| AvcRespParseError::UnexpectedOperands(ctl_data_pos + pos))?;
        Ok(())
    }
}

impl AvcOp for AudioFeature {
    const OPCODE: u8 = AudioFuncBlk::OPCODE;
    const ECHO_LENGTH: usize = AudioFuncBlk::ECHO_LENGTH;
}

impl AvcStatus for AudioFeature {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcStatus::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcStatus::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

impl AvcControl for AudioFeature {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcControl::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcControl::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

/// The type of processing control.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProcessingCtl {
    Enable(bool),
    Mode(Vec<u8>),
    /// The coefficients of mixer in 16 bit signed integer.
    Mixer(Vec<i16>),
    /// The selector and data of the other control.
    Reserved(u8, Vec<u8>),
}

impl ProcessingCtl {
    const ENABLE: u8 = 0x01;
    const MODE: u8 = 0x02;
    const MIXER: u8 = 0x03;

    pub const INFINITY: i16 = 0x7ffeu16 as i16;
    pub const NEG_INFINITY: i16 = 0x8000u16 as i16;

    fn to_ctl(&self) -> AudioFuncBlkCtl {
        let (selector, data) = match self {
            Self::Enable(data) => (Self::ENABLE, bool_vector_to_raw(&[*data])),
            Self::Mode(data) => (Self::MODE, data.to_vec()),
            Self::Mixer(data) => (Self::MIXER, i16_vector_to_raw(data)),
            Self::Reserved(selector, data) => (*selector, data.to_vec()),
        };
        AudioFuncBlkCtl { selector, data }
    }

    fn from_ctl(ctl: &AudioFuncBlkCtl) -> Result<Self, usize> {
        let data = &ctl.data;
        let ctl = match ctl.selector {
            Self::ENABLE => {
                let vals = bool_vector_from_raw(data)?;
                if vals.len() != 1 {
                    return Err(0);
                }
                Self::Enable(vals[0])
            }
            Self::MODE => Self::Mode(data.to_vec()),
            Self::MIXER => Self::Mixer(i16_vector_from_raw(data)?),
            selector => Self::Reserved(selector, data.to_vec()),
        };
        Ok(ctl)
    }
}

///
/// AV/C Audio Subunit FUNCTION_BLOCK command for processing function block
///
/// Described in 10.4 Processing function block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AudioProcessing {
    /// Function block input plug number (FBPN).
    pub input_plug_id: u8,
    /// Input audio channel (ICN).
    pub input_ch: AudioCh,
    /// Output audio channel (OCN).
    pub output_ch: AudioCh,
    /// Processing function block type dependent parameters.
    pub ctl: ProcessingCtl,

    func_blk: AudioFuncBlk,
}

impl AudioProcessing {
    pub fn new(
        func_blk_id: u8,
        ctl_attr: CtlAttr,
        input_plug_id: u8,
        input_ch: AudioCh,
        output_ch: AudioCh,
        ctl: ProcessingCtl,
    ) -> Self {
        Self {
            input_plug_id,
            input_ch,
            output_ch,
            ctl,
            func_blk: AudioFuncBlk {
                func_blk_type: AudioFuncBlkType::Processing,
                func_blk_id,
                ctl_attr,
                ..Default::default()
            },
        }
    }

    fn build_func_blk(&mut self) {
        self.func_blk.audio_selector_data = vec![
            self.input_plug_id,
            self.input_ch.into(),
            self.output_ch.into(),
        ];
        self.func_blk.ctl = self.ctl.to_ctl();
    }

    fn parse_func_blk(&mut self) -> Result<(), AvcRespParseError> {
        if self.func_blk.audio_selector_data.len() != 3 {
            Err(AvcRespParseError::UnexpectedOperands(3))?;
        }

        if self.func_blk.audio_selector_data[0] != self.input_plug_id {
            Err(AvcRespParseError::UnexpectedOperands(4))?;
        }

        let input_ch = AudioCh::from(self.func_blk.audio_selector_data[1]);
        if input_ch != self.input_ch {
            Err(AvcRespParseError::UnexpectedOperands(5))?;
        }

        let output_ch = AudioCh::from(self.func_blk.audio_selector_data[2]);
        if output_ch != self.output_ch {
            Err(AvcRespParseError::UnexpectedOperands(6))?;
        }

        let ctl_data_pos = self.func_blk.ctl_data_pos();
        self.ctl = ProcessingCtl::from_ctl(&self.func_blk.ctl)
            .map_err(|pos| AvcRespParseError::UnexpectedOperands(ctl_data_pos + pos))?;
        Ok(())
    }
}

impl AvcOp for AudioProcessing {
    const OPCODE: u8 = AudioFuncBlk::OPCODE;
    const ECHO_LENGTH: usize = AudioFuncBlk::ECHO_LENGTH;
}

impl AvcStatus for AudioProcessing {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcStatus::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcStatus::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

impl AvcControl for AudioProcessing {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_func_blk();
        AvcControl::build_operands(&mut self.func_blk, addr)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        AvcControl::parse_operands(&mut self.func_blk, addr, operands)?;
        self.parse_func_blk()
    }
}

fn single_value<T: Copy>(data: &[T], pos: usize) -> Result<T, AvcError> {
    match data {
        [val] => Ok(*val),
        _ => Err(AvcRespParseError::UnexpectedOperands(pos).into()),
    }
}

/// The operations for function blocks in audio subunit.
///
/// The subunit is addressed by its identifier. The mixer coefficient is addressed by the pair of
/// processing function block and the function block connected to its input plug.
pub trait AudioFunctionBlockOperation: Ta1394Avc {
    /// Select the input plug of selector function block.
    fn set_selector(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        input_plug_id: u8,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let mut op = AudioSelector::new(func_blk_id, ctl_attr, input_plug_id);
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_selector(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        timeout_ms: u32,
    ) -> Result<u8, AvcError> {
        let mut op = AudioSelector::new(func_blk_id, ctl_attr, 0xff);
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
            .map(|_| op.input_plug_id)
    }

    fn set_mute(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        mute: bool,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let ctl = FeatureCtl::Mute(vec![mute]);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_mute(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        timeout_ms: u32,
    ) -> Result<bool, AvcError> {
        let ctl = FeatureCtl::Mute(vec![false]);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)?;
        let pos = op.func_blk.ctl_data_pos();
        match &op.ctl {
            FeatureCtl::Mute(data) => single_value(data, pos),
            _ => Err(AvcRespParseError::UnexpectedOperands(pos - 2).into()),
        }
    }

    fn set_volume(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        volume: i16,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let ctl = FeatureCtl::Volume(vec![volume]);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_volume(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        timeout_ms: u32,
    ) -> Result<i16, AvcError> {
        let ctl = FeatureCtl::Volume(vec![FeatureCtl::UNKNOWN]);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)?;
        let pos = op.func_blk.ctl_data_pos();
        match &op.ctl {
            FeatureCtl::Volume(data) => single_value(data, pos),
            _ => Err(AvcRespParseError::UnexpectedOperands(pos - 2).into()),
        }
    }

    fn set_lr_balance(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        balance: i16,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let ctl = FeatureCtl::LrBalance(balance);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_lr_balance(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        audio_ch: AudioCh,
        timeout_ms: u32,
    ) -> Result<i16, AvcError> {
        let ctl = FeatureCtl::LrBalance(FeatureCtl::UNKNOWN);
        let mut op = AudioFeature::new(func_blk_id, ctl_attr, audio_ch, ctl);
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)?;
        match op.ctl {
            FeatureCtl::LrBalance(balance) => Ok(balance),
            _ => Err(AvcRespParseError::UnexpectedOperands(op.func_blk.ctl_data_pos() - 2).into()),
        }
    }

    /// Set the coefficient from the input channel of the function block connected to the input
    /// plug to the output channel.
    fn set_mixer_coefficient(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        input_plug_id: u8,
        input_ch: AudioCh,
        output_ch: AudioCh,
        coefficient: i16,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let ctl = ProcessingCtl::Mixer(vec![coefficient]);
        let mut op = AudioProcessing::new(
            func_blk_id,
            ctl_attr,
            input_plug_id,
            input_ch,
            output_ch,
            ctl,
        );
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_mixer_coefficient(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        input_plug_id: u8,
        input_ch: AudioCh,
        output_ch: AudioCh,
        timeout_ms: u32,
    ) -> Result<i16, AvcError> {
        let ctl = ProcessingCtl::Mixer(vec![-1]);
        let mut op = AudioProcessing::new(
            func_blk_id,
            ctl_attr,
            input_plug_id,
            input_ch,
            output_ch,
            ctl,
        );
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)?;
        let pos = op.func_blk.ctl_data_pos();
        match &op.ctl {
            ProcessingCtl::Mixer(data) => single_value(data, pos),
            _ => Err(AvcRespParseError::UnexpectedOperands(pos - 2).into()),
        }
    }

    /// Set all of coefficients between the function block and the one connected to the input plug
    /// at once.
    fn set_mixer_coefficients(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        input_plug_id: u8,
        coefficients: &[i16],
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let ctl = ProcessingCtl::Mixer(coefficients.to_vec());
        let mut op = AudioProcessing::new(
            func_blk_id,
            ctl_attr,
            input_plug_id,
            AudioCh::All,
            AudioCh::All,
            ctl,
        );
        self.control(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)
    }

    fn get_mixer_coefficients(
        &self,
        subunit_id: u8,
        ctl_attr: CtlAttr,
        func_blk_id: u8,
        input_plug_id: u8,
        timeout_ms: u32,
    ) -> Result<Vec<i16>, AvcError> {
        let ctl = ProcessingCtl::Mixer(Vec::new());
        let mut op = AudioProcessing::new(
            func_blk_id,
            ctl_attr,
            input_plug_id,
            AudioCh::All,
            AudioCh::All,
            ctl,
        );
        self.status(&audio_subunit_addr(subunit_id), &mut op, timeout_ms)?;
        match op.ctl {
            ProcessingCtl::Mixer(data) => Ok(data),
            _ => Err(AvcRespParseError::UnexpectedOperands(op.func_blk.ctl_data_pos() - 2).into()),
        }
    }
}

impl<O: Ta1394Avc> AudioFunctionBlockOperation for O {}

#[cfg(test)]
mod test {
    use {
        crate::*,
        std::{cell::RefCell, collections::VecDeque},
    };

    /// The target to respond with prepared frames in order.
    #[derive(Default)]
    struct ScriptedAvc {
        requests: RefCell<Vec<Vec<u8>>>,
        responses: RefCell<VecDeque<Vec<u8>>>,
    }

    impl ScriptedAvc {
        fn new(responses: &[&[u8]]) -> Self {
            Self {
                responses: RefCell::new(responses.iter().map(|r| r.to_vec()).collect()),
                ..Default::default()
            }
        }
    }

    impl Ta1394Avc for ScriptedAvc {
        fn transaction(&self, frame: &[u8], timeout_ms: u32) -> Result<Vec<u8>, AvcError> {
            self.requests.borrow_mut().push(frame.to_vec());
            let resp = self
                .responses
                .borrow_mut()
                .pop_front()
                .ok_or(AvcError::Timeout(timeout_ms))?;
            let kind = AvcCmdType::from(frame[0] & 0x0f);
            classify_response(kind, AvcRespCode::from(resp[0] & Self::RESP_CODE_MASK))
                .map(|_| resp)
        }
    }

    #[test]
    fn func_blk_operands() {
        let mut op = AudioFuncBlk {
            func_blk_type: AudioFuncBlkType::Selector,
            func_blk_id: 0xfe,
            ctl_attr: CtlAttr::Resolution,
            audio_selector_data: vec![0xde, 0xad, 0xbe, 0xef],
            ctl: AudioFuncBlkCtl {
                selector: 0x11,
                data: vec![0xbe, 0xef],
            },
        };
        let operands = AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x80, 0xfe, 0x01, 0x05, 0xde, 0xad, 0xbe, 0xef, 0x11, 0x02, 0xbe, 0xef]
        );

        let expected = op.clone();
        op.audio_selector_data.clear();
        op.ctl = Default::default();
        AvcStatus::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(expected, op);
        assert_eq!(10, op.ctl_data_pos());

        // For the case that audio_selector_data is empty.
        let mut op = AudioFuncBlk {
            func_blk_type: AudioFuncBlkType::Feature,
            func_blk_id: 0xfb,
            ctl_attr: CtlAttr::Default,
            ctl: AudioFuncBlkCtl {
                selector: 0x14,
                data: vec![0xfe, 0xeb, 0xda, 0xed],
            },
            ..Default::default()
        };
        let operands = AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x81, 0xfb, 0x04, 0x01, 0x14, 0x04, 0xfe, 0xeb, 0xda, 0xed]
        );
        let expected = op.clone();
        AvcControl::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(expected, op);

        // For the case that ctl_data is empty.
        let mut op = AudioFuncBlk {
            func_blk_type: AudioFuncBlkType::Processing,
            func_blk_id: 0xfa,
            ctl_attr: CtlAttr::Duration,
            audio_selector_data: vec![0xda, 0xed],
            ctl: AudioFuncBlkCtl {
                selector: 0x15,
                ..Default::default()
            },
        };
        let operands = AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(&operands, &[0x82, 0xfa, 0x08, 0x03, 0xda, 0xed, 0x15]);
        let expected = op.clone();
        AvcStatus::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(expected, op);

        assert_eq!(
            Err(AvcCmdBuildError::InvalidAddress),
            AvcStatus::build_operands(&mut op, &AvcAddr::Unit)
        );
    }

    #[test]
    fn func_blk_oversized_operands() {
        let mut op = AudioFuncBlk {
            func_blk_type: AudioFuncBlkType::Processing,
            func_blk_id: 0x01,
            ctl_attr: CtlAttr::Current,
            audio_selector_data: vec![0xff; 254],
            ctl: AudioFuncBlkCtl {
                selector: 0x03,
                data: vec![0x00; 255],
            },
        };
        let operands = AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(0xff, operands[3]);
        assert_eq!(0xff, operands[4 + 254 + 1]);

        op.ctl.data.push(0x00);
        assert_eq!(
            Err(AvcCmdBuildError::InvalidOperands),
            AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR)
        );

        op.ctl.data.pop();
        op.audio_selector_data.push(0xff);
        assert_eq!(
            Err(AvcCmdBuildError::InvalidOperands),
            AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR)
        );

        // The coefficients over the length of control data.
        let avc = ScriptedAvc::new(&[]);
        assert_eq!(
            Err(AvcError::CmdBuild(AvcCmdBuildError::InvalidOperands)),
            avc.set_mixer_coefficients(0, CtlAttr::Current, 0x05, 0x02, &[0; 128], 100)
        );
        assert_eq!(0, avc.requests.borrow().len());
    }

    #[test]
    fn func_blk_malformed_operands() {
        let mut op = AudioFuncBlk {
            func_blk_type: AudioFuncBlkType::Feature,
            func_blk_id: 0x01,
            ctl_attr: CtlAttr::Current,
            ..Default::default()
        };
        assert_eq!(
            Err(AvcRespParseError::TooShortResp(4)),
            op.parse_operands(&[0x81, 0x01, 0x10])
        );
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(1)),
            op.parse_operands(&[0x81, 0x02, 0x10, 0x02, 0x01, 0x02])
        );
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(2)),
            op.parse_operands(&[0x81, 0x01, 0x02, 0x02, 0x01, 0x02])
        );
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(3)),
            op.parse_operands(&[0x81, 0x01, 0x10, 0x00, 0x01, 0x02])
        );
        // The length of control data is over the frame.
        assert_eq!(
            Err(AvcRespParseError::TooShortResp(9)),
            op.parse_operands(&[0x81, 0x01, 0x10, 0x02, 0x01, 0x02, 0x02, 0x00])
        );
    }

    #[test]
    fn audio_selector_operands() {
        let mut op = AudioSelector::new(0xe5, CtlAttr::Duration, 0x28);
        let operands = AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(&operands, &[0x80, 0xe5, 0x08, 0x02, 0x28, 0x01]);

        op.input_plug_id = 0xff;
        AvcStatus::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(op.input_plug_id, 0x28);

        let mut op = AudioSelector::new(0x1e, CtlAttr::Move, 0x96);
        let operands = AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(&operands, &[0x80, 0x1e, 0x18, 0x02, 0x96, 0x01]);

        AvcControl::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(op.input_plug_id, 0x96);
    }

    #[test]
    fn ctl_attr_and_audio_ch_from() {
        [0x01, 0x02, 0x03, 0x04, 0x08, 0x10, 0x18, 0x19, 0x05]
            .iter()
            .for_each(|&val| assert_eq!(val, u8::from(CtlAttr::from(val))));
        assert_eq!("current", CtlAttr::Current.to_string());

        (0..=u8::MAX).for_each(|val| assert_eq!(val, u8::from(AudioCh::from(val))));
        assert_eq!(AudioCh::Each(0), AudioCh::from(0x01));
        assert_eq!(AudioCh::Void, AudioCh::from(0xfe));
    }

    #[test]
    fn featurectl_from() {
        let ctls = [
            FeatureCtl::Mute(vec![false, true, false]),
            FeatureCtl::Volume(vec![0x1234, 0x3456, 0x789a]),
            FeatureCtl::LrBalance(-123),
            FeatureCtl::FrBalance(321),
            FeatureCtl::Bass(vec![10, -10, 20, -20]),
            FeatureCtl::Mid(vec![30, -30, -40, 40]),
            FeatureCtl::Treble(vec![50, 60, -70, -80]),
            FeatureCtl::AutomaticGain(vec![false, true, false]),
            FeatureCtl::Delay(vec![0x1234, 0x3456, 0x789a]),
            FeatureCtl::BassBoost(vec![true, false, true]),
            FeatureCtl::Loudness(vec![false, true, false]),
            FeatureCtl::Reserved(0x08, vec![0xad, 0xbe, 0xef]),
        ];
        ctls.iter()
            .for_each(|ctl| assert_eq!(Ok(ctl.clone()), FeatureCtl::from_ctl(&ctl.to_ctl())));

        let ctl = AudioFuncBlkCtl {
            selector: 0x01,
            data: vec![0x70, 0x60, 0x50],
        };
        assert_eq!(Err(2), FeatureCtl::from_ctl(&ctl));

        let ctl = AudioFuncBlkCtl {
            selector: 0x02,
            data: vec![0x01, 0x02, 0x03],
        };
        assert_eq!(Err(2), FeatureCtl::from_ctl(&ctl));
    }

    #[test]
    fn audio_feature_operands() {
        let ctl = FeatureCtl::Volume(vec![-1234, 5678, 3210]);
        let mut op = AudioFeature::new(0x03, CtlAttr::Minimum, AudioCh::Each(0x1b), ctl.clone());
        let operands = AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x81, 0x03, 0x02, 0x02, 0x1c, 0x02, 0x06, 0xfb, 0x2e, 0x16, 0x2e, 0x0c, 0x8a]
        );

        AvcStatus::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(AudioCh::Each(0x1b), op.audio_ch_num);
        assert_eq!(ctl, op.ctl);

        let ctl = FeatureCtl::Treble(vec![40, -33, 123, -96]);
        let mut op = AudioFeature::new(0x33, CtlAttr::Resolution, AudioCh::Each(0xd8), ctl.clone());
        let operands = AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x81, 0x33, 0x01, 0x02, 0xd9, 0x07, 0x04, 0x28, 0xdf, 0x7b, 0xa0]
        );

        AvcControl::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(AudioCh::Each(0xd8), op.audio_ch_num);
        assert_eq!(ctl, op.ctl);

        // The boolean value out of definition.
        let ctl = FeatureCtl::Mute(vec![false]);
        let mut op = AudioFeature::new(0x01, CtlAttr::Current, AudioCh::Master, ctl);
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(7)),
            AvcStatus::parse_operands(
                &mut op,
                &AUDIO_SUBUNIT_0_ADDR,
                &[0x81, 0x01, 0x10, 0x02, 0x00, 0x01, 0x01, 0x00]
            )
        );

        // The response for the other channel.
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(4)),
            AvcStatus::parse_operands(
                &mut op,
                &AUDIO_SUBUNIT_0_ADDR,
                &[0x81, 0x01, 0x10, 0x02, 0x01, 0x01, 0x01, 0x70]
            )
        );
    }

    #[test]
    fn processingctl_from() {
        let ctls = [
            ProcessingCtl::Enable(true),
            ProcessingCtl::Mode(vec![0xde, 0xad, 0xbe, 0xef]),
            ProcessingCtl::Mixer(vec![-73, -157]),
            ProcessingCtl::Reserved(0x04, vec![0x01]),
        ];
        ctls.iter()
            .for_each(|ctl| assert_eq!(Ok(ctl.clone()), ProcessingCtl::from_ctl(&ctl.to_ctl())));

        let ctl = AudioFuncBlkCtl {
            selector: 0x01,
            data: vec![0x70, 0x70],
        };
        assert_eq!(Err(0), ProcessingCtl::from_ctl(&ctl));
    }

    #[test]
    fn audio_processing_operands() {
        let ctl = ProcessingCtl::Enable(true);
        let mut op = AudioProcessing::new(
            0xf5,
            CtlAttr::Default,
            0x71,
            AudioCh::Each(0xa8),
            AudioCh::Each(0x3e),
            ctl.clone(),
        );
        let operands = AvcStatus::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x82, 0xf5, 0x04, 0x04, 0x71, 0xa9, 0x3f, 0x01, 0x01, 0x70]
        );

        AvcStatus::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(0x71, op.input_plug_id);
        assert_eq!(AudioCh::Each(0xa8), op.input_ch);
        assert_eq!(AudioCh::Each(0x3e), op.output_ch);
        assert_eq!(ctl, op.ctl);

        let ctl = ProcessingCtl::Mixer(vec![10, -10]);
        let mut op = AudioProcessing::new(
            0x11,
            CtlAttr::Minimum,
            0x22,
            AudioCh::Each(0x32),
            AudioCh::Each(0x43),
            ctl.clone(),
        );
        let operands = AvcControl::build_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR).unwrap();
        assert_eq!(
            &operands,
            &[0x82, 0x11, 0x02, 0x04, 0x22, 0x33, 0x44, 0x03, 0x04, 0x00, 0x0a, 0xff, 0xf6]
        );

        AvcControl::parse_operands(&mut op, &AUDIO_SUBUNIT_0_ADDR, &operands).unwrap();
        assert_eq!(0x22, op.input_plug_id);
        assert_eq!(AudioCh::Each(0x32), op.input_ch);
        assert_eq!(AudioCh::Each(0x43), op.output_ch);
        assert_eq!(ctl, op.ctl);

        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(4)),
            AvcControl::parse_operands(
                &mut op,
                &AUDIO_SUBUNIT_0_ADDR,
                &[0x82, 0x11, 0x02, 0x04, 0x23, 0x33, 0x44, 0x03, 0x02, 0x00, 0x0a]
            )
        );
    }

    #[test]
    fn selector_operation() {
        let avc = ScriptedAvc::new(&[
            &[0x09, 0x08, 0xb8, 0x80, 0x02, 0x10, 0x02, 0x01, 0x01],
            &[0x0c, 0x08, 0xb8, 0x80, 0x02, 0x10, 0x02, 0x03, 0x01],
        ]);
        avc.set_selector(0, CtlAttr::Current, 0x02, 0x01, 100).unwrap();
        assert_eq!(Ok(0x03), avc.get_selector(0, CtlAttr::Current, 0x02, 100));
        assert_eq!(
            vec![
                vec![0x00, 0x08, 0xb8, 0x80, 0x02, 0x10, 0x02, 0x01, 0x01],
                vec![0x01, 0x08, 0xb8, 0x80, 0x02, 0x10, 0x02, 0xff, 0x01],
            ],
            *avc.requests.borrow()
        );
    }

    #[test]
    fn feature_operation() {
        let avc = ScriptedAvc::new(&[
            &[0x0c, 0x09, 0xb8, 0x81, 0x01, 0x10, 0x02, 0x00, 0x01, 0x01, 0x70],
            &[0x0c, 0x09, 0xb8, 0x81, 0x01, 0x10, 0x02, 0x00, 0x01, 0x01, 0x5f],
            &[0x09, 0x08, 0xb8, 0x81, 0x02, 0x10, 0x02, 0x02, 0x02, 0x02, 0xfe, 0x00],
            &[0x0c, 0x08, 0xb8, 0x81, 0x02, 0x03, 0x02, 0x02, 0x02, 0x02, 0x00, 0x00],
            &[0x0c, 0x08, 0xb8, 0x81, 0x02, 0x10, 0x02, 0x00, 0x03, 0x02, 0x80, 0x00],
        ]);
        assert_eq!(
            Ok(true),
            avc.get_mute(1, CtlAttr::Current, 0x01, AudioCh::Master, 100)
        );
        assert_eq!(
            Err(AvcError::Protocol(AvcRespParseError::UnexpectedOperands(7))),
            avc.get_mute(1, CtlAttr::Current, 0x01, AudioCh::Master, 100)
        );
        avc.set_volume(0, CtlAttr::Current, 0x02, AudioCh::Each(1), -512, 100)
            .unwrap();
        assert_eq!(
            Ok(0),
            avc.get_volume(0, CtlAttr::Maximum, 0x02, AudioCh::Each(1), 100)
        );
        assert_eq!(
            Ok(FeatureCtl::NEG_INFINITY),
            avc.get_lr_balance(0, CtlAttr::Current, 0x02, AudioCh::Master, 100)
        );

        let requests = avc.requests.borrow();
        assert_eq!(
            &[0x01, 0x09, 0xb8, 0x81, 0x01, 0x10, 0x02, 0x00, 0x01, 0x01, 0x60],
            &requests[0][..]
        );
        assert_eq!(
            &[0x00, 0x08, 0xb8, 0x81, 0x02, 0x10, 0x02, 0x02, 0x02, 0x02, 0xfe, 0x00],
            &requests[2][..]
        );
        assert_eq!(
            &[0x01, 0x08, 0xb8, 0x81, 0x02, 0x03, 0x02, 0x02, 0x02, 0x02, 0x7f, 0xff],
            &requests[3][..]
        );
        assert_eq!(
            &[0x01, 0x08, 0xb8, 0x81, 0x02, 0x10, 0x02, 0x00, 0x03, 0x02, 0x7f, 0xff],
            &requests[4][..]
        );
    }

    #[test]
    fn mixer_operation() {
        let avc = ScriptedAvc::new(&[
            &[
                0x09, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0x01, 0x02, 0x03, 0x02, 0x7f, 0xfe,
            ],
            &[
                0x0c, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0x01, 0x02, 0x03, 0x02, 0x00, 0x00,
            ],
            &[
                0x09, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0xff, 0xff, 0x03, 0x04, 0x7f, 0xfe,
                0x80, 0x00,
            ],
            &[
                0x0c, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0xff, 0xff, 0x03, 0x08, 0x7f, 0xfe,
                0x80, 0x00, 0x80, 0x00, 0x7f, 0xfe,
            ],
        ]);

        avc.set_mixer_coefficient(
            0,
            CtlAttr::Current,
            0x05,
            0x02,
            AudioCh::Each(0),
            AudioCh::Each(1),
            ProcessingCtl::INFINITY,
            100,
        )
        .unwrap();
        assert_eq!(
            Ok(0),
            avc.get_mixer_coefficient(
                0,
                CtlAttr::Current,
                0x05,
                0x02,
                AudioCh::Each(0),
                AudioCh::Each(1),
                100
            )
        );
        avc.set_mixer_coefficients(
            0,
            CtlAttr::Current,
            0x05,
            0x02,
            &[ProcessingCtl::INFINITY, ProcessingCtl::NEG_INFINITY],
            100,
        )
        .unwrap();
        assert_eq!(
            Ok(vec![
                ProcessingCtl::INFINITY,
                ProcessingCtl::NEG_INFINITY,
                ProcessingCtl::NEG_INFINITY,
                ProcessingCtl::INFINITY,
            ]),
            avc.get_mixer_coefficients(0, CtlAttr::Current, 0x05, 0x02, 100)
        );

        let requests = avc.requests.borrow();
        assert_eq!(
            &[0x01, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0x01, 0x02, 0x03, 0x02, 0xff, 0xff],
            &requests[1][..]
        );
        assert_eq!(
            &[0x01, 0x08, 0xb8, 0x82, 0x05, 0x10, 0x04, 0x02, 0xff, 0xff, 0x03],
            &requests[3][..]
        );
    }

    #[test]
    fn operation_failure() {
        let avc = ScriptedAvc::new(&[&[0x0a, 0x08, 0xb8, 0x80, 0x02, 0x10, 0x02, 0x01, 0x01]]);
        assert_eq!(
            Err(AvcError::Rejected),
            avc.set_selector(0, CtlAttr::Current, 0x02, 0x01, 100)
        );
        assert_eq!(
            Err(AvcError::Timeout(100)),
            avc.get_selector(0, CtlAttr::Current, 0x02, 100)
        );
    }
}
