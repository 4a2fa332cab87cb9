// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod config_rom;
pub mod general;

mod codec;
mod transport;

pub use {codec::*, transport::*};

/// The type of subunit for AV/C address defined by 1394 Trading Association.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AvcSubunitType {
    Monitor,
    Audio,
    Printer,
    Disc,
    Tape,
    Tuner,
    Ca,
    Camera,
    Panel,
    BulletinBoard,
    CameraStorage,
    Music,
    VendorUnique,
    Extended,
    Reserved(u8),
}

impl Default for AvcSubunitType {
    fn default() -> Self {
        Self::Reserved(AvcAddrSubunit::SUBUNIT_TYPE_MASK)
    }
}

impl AvcSubunitType {
    const MONITOR: u8 = 0x00;
    const AUDIO: u8 = 0x01;
    const PRINTER: u8 = 0x02;
    const DISC: u8 = 0x03;
    const TAPE: u8 = 0x04;
    const TUNER: u8 = 0x05;
    const CA: u8 = 0x06;
    const CAMERA: u8 = 0x07;
    const PANEL: u8 = 0x09;
    const BULLETIN_BOARD: u8 = 0x0a;
    const CAMERA_STORAGE: u8 = 0x0b;
    const MUSIC: u8 = 0x0c;
    const VENDOR_UNIQUE: u8 = 0x1c;
    const EXTENDED: u8 = 0x1e;
}

impl From<u8> for AvcSubunitType {
    fn from(val: u8) -> Self {
        match val {
            Self::MONITOR => Self::Monitor,
            Self::AUDIO => Self::Audio,
            Self::PRINTER => Self::Printer,
            Self::DISC => Self::Disc,
            Self::TAPE => Self::Tape,
            Self::TUNER => Self::Tuner,
            Self::CA => Self::Ca,
            Self::CAMERA => Self::Camera,
            Self::PANEL => Self::Panel,
            Self::BULLETIN_BOARD => Self::BulletinBoard,
            Self::CAMERA_STORAGE => Self::CameraStorage,
            Self::MUSIC => Self::Music,
            Self::VENDOR_UNIQUE => Self::VendorUnique,
            Self::EXTENDED => Self::Extended,
            _ => Self::Reserved(val),
        }
    }
}

impl From<AvcSubunitType> for u8 {
    fn from(subunit_type: AvcSubunitType) -> Self {
        match subunit_type {
            AvcSubunitType::Monitor => AvcSubunitType::MONITOR,
            AvcSubunitType::Audio => AvcSubunitType::AUDIO,
            AvcSubunitType::Printer => AvcSubunitType::PRINTER,
            AvcSubunitType::Disc => AvcSubunitType::DISC,
            AvcSubunitType::Tape => AvcSubunitType::TAPE,
            AvcSubunitType::Tuner => AvcSubunitType::TUNER,
            AvcSubunitType::Ca => AvcSubunitType::CA,
            AvcSubunitType::Camera => AvcSubunitType::CAMERA,
            AvcSubunitType::Panel => AvcSubunitType::PANEL,
            AvcSubunitType::BulletinBoard => AvcSubunitType::BULLETIN_BOARD,
            AvcSubunitType::CameraStorage => AvcSubunitType::CAMERA_STORAGE,
            AvcSubunitType::Music => AvcSubunitType::MUSIC,
            AvcSubunitType::VendorUnique => AvcSubunitType::VENDOR_UNIQUE,
            AvcSubunitType::Extended => AvcSubunitType::EXTENDED,
            AvcSubunitType::Reserved(value) => value,
        }
    }
}

/// The AV/C address of first music subunit for convenience.
pub const MUSIC_SUBUNIT_0: AvcAddrSubunit = AvcAddrSubunit {
    subunit_type: AvcSubunitType::Music,
    subunit_id: 0,
};

/// The AV/C address of first audio subunit for convenience.
pub const AUDIO_SUBUNIT_0: AvcAddrSubunit = AvcAddrSubunit {
    subunit_type: AvcSubunitType::Audio,
    subunit_id: 0,
};

/// The data of AV/C address in subunit case.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct AvcAddrSubunit {
    pub subunit_type: AvcSubunitType,
    pub subunit_id: u8,
}

impl AvcAddrSubunit {
    pub const SUBUNIT_TYPE_SHIFT: usize = 3;
    pub const SUBUNIT_TYPE_MASK: u8 = 0x1f;
    pub const SUBUNIT_ID_SHIFT: usize = 0;
    pub const SUBUNIT_ID_MASK: u8 = 0x07;

    pub fn new(subunit_type: AvcSubunitType, subunit_id: u8) -> Self {
        AvcAddrSubunit {
            subunit_type,
            subunit_id: subunit_id & Self::SUBUNIT_ID_MASK,
        }
    }
}

impl From<u8> for AvcAddrSubunit {
    fn from(val: u8) -> Self {
        let subunit_type =
            AvcSubunitType::from((val >> Self::SUBUNIT_TYPE_SHIFT) & Self::SUBUNIT_TYPE_MASK);
        let subunit_id = (val >> Self::SUBUNIT_ID_SHIFT) & Self::SUBUNIT_ID_MASK;
        AvcAddrSubunit {
            subunit_type,
            subunit_id,
        }
    }
}

impl From<AvcAddrSubunit> for u8 {
    fn from(subunit: AvcAddrSubunit) -> Self {
        let val = u8::from(subunit.subunit_type);
        ((val & AvcAddrSubunit::SUBUNIT_TYPE_MASK) << AvcAddrSubunit::SUBUNIT_TYPE_SHIFT)
            | ((subunit.subunit_id & AvcAddrSubunit::SUBUNIT_ID_MASK)
                << AvcAddrSubunit::SUBUNIT_ID_SHIFT)
    }
}

/// For AV/C address in both unit and subunit cases.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AvcAddr {
    Unit,
    Subunit(AvcAddrSubunit),
}

impl Default for AvcAddr {
    fn default() -> Self {
        Self::Unit
    }
}

impl AvcAddr {
    pub const UNIT_ADDR: u8 = 0xff;
}

impl From<u8> for AvcAddr {
    fn from(val: u8) -> Self {
        match val {
            Self::UNIT_ADDR => AvcAddr::Unit,
            _ => AvcAddr::Subunit(AvcAddrSubunit::from(val)),
        }
    }
}

impl From<&AvcAddr> for u8 {
    fn from(addr: &AvcAddr) -> Self {
        match addr {
            AvcAddr::Unit => AvcAddr::UNIT_ADDR,
            AvcAddr::Subunit(d) => u8::from(*d),
        }
    }
}

impl From<AvcAddr> for u8 {
    fn from(addr: AvcAddr) -> Self {
        Self::from(&addr)
    }
}

/// The type of command in AV/C transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvcCmdType {
    /// Perform an operation to the addressed target.
    Control,
    /// Check current status of the addressed target.
    Status,
    /// Check whether the addressed target supports a particular Control command including operands.
    SpecificInquiry,
    /// Schedule notification of a change in the addressed target.
    Notify,
    /// Check whether the addressed target supports a particular Control command just with opcode.
    GeneralInquiry,
    Reserved(u8),
}

impl AvcCmdType {
    const CONTROL: u8 = 0x00;
    const STATUS: u8 = 0x01;
    const SPECIFIC_INQUIRY: u8 = 0x02;
    const NOTIFY: u8 = 0x03;
    const GENERAL_INQUIRY: u8 = 0x04;
}

impl From<u8> for AvcCmdType {
    fn from(val: u8) -> Self {
        match val {
            Self::CONTROL => Self::Control,
            Self::STATUS => Self::Status,
            Self::SPECIFIC_INQUIRY => Self::SpecificInquiry,
            Self::NOTIFY => Self::Notify,
            Self::GENERAL_INQUIRY => Self::GeneralInquiry,
            _ => Self::Reserved(val),
        }
    }
}

impl From<AvcCmdType> for u8 {
    fn from(code: AvcCmdType) -> Self {
        match code {
            AvcCmdType::Control => AvcCmdType::CONTROL,
            AvcCmdType::Status => AvcCmdType::STATUS,
            AvcCmdType::SpecificInquiry => AvcCmdType::SPECIFIC_INQUIRY,
            AvcCmdType::Notify => AvcCmdType::NOTIFY,
            AvcCmdType::GeneralInquiry => AvcCmdType::GENERAL_INQUIRY,
            AvcCmdType::Reserved(val) => val,
        }
    }
}

/// The status of response in AV/C transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvcRespCode {
    /// The target does not implement the requested command or the addressed subunit.
    NotImplemented,
    /// The requested CONTROL command has been processed or is scheduled to process.
    Accepted,
    /// The target refused to process the requested command due to some reasons.
    Rejected,
    /// The target is under transition state and can not process the requested STATUS command.
    InTransition,
    /// The target implements the inquired command or returns current status against the requested
    /// STATUS command.
    ImplementedStable,
    /// The actual notification scheduled by the NOTIFY command.
    Changed,
    /// The intermediate response during AV/C deferred transaction.
    Interim,
    Reserved(u8),
}

impl AvcRespCode {
    const NOT_IMPLEMENTED: u8 = 0x08;
    const ACCEPTED: u8 = 0x09;
    const REJECTED: u8 = 0x0a;
    const IN_TRANSITION: u8 = 0x0b;
    const IMPLEMENTED_STABLE: u8 = 0x0c;
    const CHANGED: u8 = 0x0d;
    const INTERIM: u8 = 0x0f;
}

impl From<u8> for AvcRespCode {
    fn from(val: u8) -> Self {
        match val {
            Self::NOT_IMPLEMENTED => Self::NotImplemented,
            Self::ACCEPTED => Self::Accepted,
            Self::REJECTED => Self::Rejected,
            Self::IN_TRANSITION => Self::InTransition,
            Self::IMPLEMENTED_STABLE => Self::ImplementedStable,
            Self::CHANGED => Self::Changed,
            Self::INTERIM => Self::Interim,
            _ => Self::Reserved(val),
        }
    }
}

impl From<AvcRespCode> for u8 {
    fn from(resp: AvcRespCode) -> Self {
        match resp {
            AvcRespCode::NotImplemented => AvcRespCode::NOT_IMPLEMENTED,
            AvcRespCode::Accepted => AvcRespCode::ACCEPTED,
            AvcRespCode::Rejected => AvcRespCode::REJECTED,
            AvcRespCode::InTransition => AvcRespCode::IN_TRANSITION,
            AvcRespCode::ImplementedStable => AvcRespCode::IMPLEMENTED_STABLE,
            AvcRespCode::Changed => AvcRespCode::CHANGED,
            AvcRespCode::Interim => AvcRespCode::INTERIM,
            AvcRespCode::Reserved(val) => val,
        }
    }
}

/// The error to build command frame for AV/C transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AvcCmdBuildError {
    /// Invalid address for the operation.
    InvalidAddress,
    /// Fail to prepare operands for the operation.
    InvalidOperands,
    /// The type of command in frame is not expected one.
    InvalidCommandType,
}

impl std::fmt::Display for AvcCmdBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::InvalidOperands => write!(f, "invalid operands"),
            Self::InvalidCommandType => write!(f, "invalid command type"),
        }
    }
}

impl std::error::Error for AvcCmdBuildError {}

/// The error to parse response frame for AV/C transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AvcRespParseError {
    /// The length of response frame is shorter than expected.
    TooShortResp(
        /// The expected length at least.
        usize,
    ),
    /// The status code in response frame is not expected.
    UnexpectedStatus(AvcRespCode),
    /// Any of operand in response frame is not expected.
    UnexpectedOperands(
        /// The first offset for unexpected operand.
        usize,
    ),
    /// The address or opcode in response frame is different from the ones in command frame.
    MismatchedResponse,
}

impl AvcRespParseError {
    /// Shift the offset in the error for the operands in outer layout.
    pub fn add_offset(&self, offset: usize) -> Self {
        match self {
            Self::TooShortResp(expected) => Self::TooShortResp(expected + offset),
            Self::UnexpectedOperands(pos) => Self::UnexpectedOperands(pos + offset),
            _ => *self,
        }
    }
}

impl std::fmt::Display for AvcRespParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShortResp(expected) => write!(f, "response frame too short {}", expected),
            Self::UnexpectedStatus(code) => {
                write!(f, "unexpected response status 0x{:02x}", u8::from(*code))
            }
            Self::UnexpectedOperands(offset) => {
                write!(f, "unexpected response operands at {}", offset)
            }
            Self::MismatchedResponse => write!(f, "response for the other command"),
        }
    }
}

impl std::error::Error for AvcRespParseError {}

/// The error of AV/C transaction.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AvcError {
    /// Fail to build command frame.
    #[error("fail to build command frame: {0}")]
    CmdBuild(#[from] AvcCmdBuildError),
    /// The target does not implement the command.
    #[error("the command is not implemented")]
    NotImplemented,
    /// The target rejects the command.
    #[error("the command is rejected")]
    Rejected,
    /// The target is in transition, thus the command can be retried.
    #[error("the target is in transition")]
    InTransition,
    /// The response is against the protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] AvcRespParseError),
    /// No response arrives within the timeout.
    #[error("no response within {0} ms")]
    Timeout(u32),
    /// The transport fails to communicate.
    #[error("transport failure: {0}")]
    TransportIo(String),
}

/// Check the status code in response frame against the type of command.
pub fn classify_response(cmd_type: AvcCmdType, rcode: AvcRespCode) -> Result<(), AvcError> {
    match (cmd_type, rcode) {
        (_, AvcRespCode::NotImplemented) => Err(AvcError::NotImplemented),
        (_, AvcRespCode::Rejected) => Err(AvcError::Rejected),
        (_, AvcRespCode::InTransition) => Err(AvcError::InTransition),
        (AvcCmdType::Control, AvcRespCode::Accepted) => Ok(()),
        (AvcCmdType::Status, AvcRespCode::ImplementedStable) => Ok(()),
        (AvcCmdType::SpecificInquiry, AvcRespCode::ImplementedStable) => Ok(()),
        (AvcCmdType::GeneralInquiry, AvcRespCode::ImplementedStable) => Ok(()),
        (AvcCmdType::Notify, AvcRespCode::Changed) => Ok(()),
        (_, code) => Err(AvcRespParseError::UnexpectedStatus(code).into()),
    }
}

/// For AV/C operation with opcode.
pub trait AvcOp {
    /// The code to specify operation.
    const OPCODE: u8;
    /// The number of leading operands which the target returns as is in any response.
    const ECHO_LENGTH: usize = 0;
}

/// The AV/C operation supporting control and specific inquiry command.
pub trait AvcControl {
    /// Build operands for command.
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError>;

    /// Parse operands in response.
    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError>;
}

/// The AV/C operation supporting status command.
pub trait AvcStatus {
    /// Build operands for command.
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError>;

    /// Parse operands in response.
    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError>;
}

/// The AV/C operation supporting notify command.
pub trait AvcNotify {
    /// Build operands for command.
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError>;

    /// Parse operands in response.
    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError>;
}

/// For AV/C transaction defined by 1394 Trading Association.
pub trait Ta1394Avc {
    /// The maximum size of frame in both command and response.
    const FRAME_SIZE: usize = 0x200;

    /// The mask for first byte of response frame to detect status code. The rest bits express
    /// Command/transaction set (CTS) but appears not to be used actually.
    const RESP_CODE_MASK: u8 = 0x0f;

    /// Transmit given command frame and return the final response frame.
    ///
    /// When detecting `AvcRespCode::Interim` in received response frame, the implementation
    /// should wait for further response frame as final result within the timeout, according to
    /// "deferred transaction" in AV/C general specification.
    fn transaction(&self, command_frame: &[u8], timeout_ms: u32) -> Result<Vec<u8>, AvcError>;

    /// Transmit given command frame and return the final response frame, which echoes the
    /// leading operands of command. The implementation can discard the other responses while
    /// waiting for the final one.
    fn echoed_transaction(
        &self,
        command_frame: &[u8],
        _: usize,
        timeout_ms: u32,
    ) -> Result<Vec<u8>, AvcError> {
        self.transaction(command_frame, timeout_ms)
    }

    fn compose_command_frame(
        ctype: AvcCmdType,
        addr: &AvcAddr,
        opcode: u8,
        operands: &[u8],
    ) -> Result<Vec<u8>, AvcCmdBuildError> {
        if 3 + operands.len() > Self::FRAME_SIZE {
            Err(AvcCmdBuildError::InvalidOperands)?;
        }

        let mut frame = Vec::with_capacity(3 + operands.len());
        frame.push(ctype.into());
        frame.push(addr.into());
        frame.push(opcode);
        frame.extend_from_slice(operands);
        Ok(frame)
    }

    fn detect_response_operands<'a>(
        frame: &'a [u8],
        addr: &AvcAddr,
        opcode: u8,
    ) -> Result<(AvcRespCode, &'a [u8]), AvcRespParseError> {
        if frame.len() < 3 {
            Err(AvcRespParseError::TooShortResp(3))
        } else if frame[1] != u8::from(addr) || frame[2] != opcode {
            Err(AvcRespParseError::MismatchedResponse)
        } else {
            let rcode = AvcRespCode::from(frame[0] & Self::RESP_CODE_MASK);
            Ok((rcode, &frame[3..]))
        }
    }

    fn check_operands_echo(
        command_frame: &[u8],
        operands: &[u8],
        echo_length: usize,
    ) -> Result<(), AvcRespParseError> {
        let echo = &command_frame[3..];
        let echo = &echo[..echo.len().min(echo_length)];
        if operands.starts_with(echo) {
            Ok(())
        } else {
            Err(AvcRespParseError::MismatchedResponse)
        }
    }

    fn control<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let operands = AvcControl::build_operands(op, addr)?;
        let command_frame =
            Self::compose_command_frame(AvcCmdType::Control, addr, O::OPCODE, &operands)?;
        let response_frame = self.echoed_transaction(&command_frame, O::ECHO_LENGTH, timeout_ms)?;
        let (rcode, operands) = Self::detect_response_operands(&response_frame, addr, O::OPCODE)?;
        Self::check_operands_echo(&command_frame, operands, O::ECHO_LENGTH)?;
        classify_response(AvcCmdType::Control, rcode)?;
        AvcControl::parse_operands(op, addr, operands)?;
        Ok(())
    }

    fn status<O: AvcOp + AvcStatus>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let operands = AvcStatus::build_operands(op, addr)?;
        let command_frame =
            Self::compose_command_frame(AvcCmdType::Status, addr, O::OPCODE, &operands)?;
        let response_frame = self.echoed_transaction(&command_frame, O::ECHO_LENGTH, timeout_ms)?;
        let (rcode, operands) = Self::detect_response_operands(&response_frame, addr, O::OPCODE)?;
        Self::check_operands_echo(&command_frame, operands, O::ECHO_LENGTH)?;
        classify_response(AvcCmdType::Status, rcode)?;
        AvcStatus::parse_operands(op, addr, operands)?;
        Ok(())
    }

    /// Inquire whether the target supports the control command. The lack of implementation is
    /// not an error but false.
    fn specific_inquiry<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<bool, AvcError> {
        let operands = AvcControl::build_operands(op, addr)?;
        let command_frame =
            Self::compose_command_frame(AvcCmdType::SpecificInquiry, addr, O::OPCODE, &operands)?;
        let response_frame =
            match self.echoed_transaction(&command_frame, O::ECHO_LENGTH, timeout_ms) {
                Ok(frame) => frame,
                Err(AvcError::NotImplemented) => return Ok(false),
                Err(err) => return Err(err),
            };
        let (rcode, operands) = Self::detect_response_operands(&response_frame, addr, O::OPCODE)?;
        Self::check_operands_echo(&command_frame, operands, O::ECHO_LENGTH)?;
        match classify_response(AvcCmdType::SpecificInquiry, rcode) {
            Ok(_) => {
                AvcControl::parse_operands(op, addr, operands)?;
                Ok(true)
            }
            Err(AvcError::NotImplemented) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn notify<O: AvcOp + AvcNotify>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let operands = AvcNotify::build_operands(op, addr)?;
        let command_frame =
            Self::compose_command_frame(AvcCmdType::Notify, addr, O::OPCODE, &operands)?;
        let response_frame = self.echoed_transaction(&command_frame, O::ECHO_LENGTH, timeout_ms)?;
        let (rcode, operands) = Self::detect_response_operands(&response_frame, addr, O::OPCODE)?;
        Self::check_operands_echo(&command_frame, operands, O::ECHO_LENGTH)?;
        classify_response(AvcCmdType::Notify, rcode)?;
        AvcNotify::parse_operands(op, addr, operands)?;
        Ok(())
    }
}
