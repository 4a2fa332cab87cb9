// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

//! A set of AV/C commands described in general specification.

use {super::*, std::convert::TryFrom};

/// The direction of plug.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PlugDirection {
    Input,
    Output,
}

impl Default for PlugDirection {
    fn default() -> Self {
        Self::Input
    }
}

impl PlugDirection {
    const INPUT: u8 = 0x00;
    const OUTPUT: u8 = 0x01;
}

impl From<PlugDirection> for u8 {
    fn from(direction: PlugDirection) -> Self {
        match direction {
            PlugDirection::Input => PlugDirection::INPUT,
            PlugDirection::Output => PlugDirection::OUTPUT,
        }
    }
}

impl TryFrom<u8> for PlugDirection {
    type Error = AvcRespParseError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            Self::INPUT => Ok(Self::Input),
            Self::OUTPUT => Ok(Self::Output),
            _ => Err(AvcRespParseError::UnexpectedOperands(0)),
        }
    }
}

/// AV/C UNIT INFO command.
///
/// Described in clause "9.2 UNIT INFO command".
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnitInfo {
    pub unit_type: AvcSubunitType,
    pub unit_id: u8,
    pub company_id: [u8; 3],
}

impl Default for UnitInfo {
    fn default() -> Self {
        Self {
            unit_type: AvcSubunitType::Reserved(AvcAddrSubunit::SUBUNIT_TYPE_MASK),
            unit_id: AvcAddrSubunit::SUBUNIT_ID_MASK,
            company_id: [0xff; 3],
        }
    }
}

impl UnitInfo {
    const FIRST_OPERAND: u8 = 0x07;

    pub fn new() -> Self {
        Default::default()
    }
}

impl AvcOp for UnitInfo {
    const OPCODE: u8 = 0x30;
}

impl AvcStatus for UnitInfo {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        if let AvcAddr::Subunit(_) = addr {
            Err(AvcCmdBuildError::InvalidAddress)
        } else {
            let mut operands = vec![Self::FIRST_OPERAND];
            operands.extend_from_slice(&[0xff; 4]);
            Ok(operands)
        }
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))?;
        }

        let subunit = AvcAddrSubunit::from(operands[1]);
        self.unit_type = subunit.subunit_type;
        self.unit_id = subunit.subunit_id;
        self.company_id.copy_from_slice(&operands[2..5]);
        Ok(())
    }
}

/// The data for each entry of subunit information.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SubunitInfoEntry {
    pub subunit_type: AvcSubunitType,
    pub maximum_id: u8,
}

impl SubunitInfoEntry {
    pub fn new(subunit_type: AvcSubunitType, maximum_id: u8) -> Self {
        SubunitInfoEntry {
            subunit_type,
            maximum_id,
        }
    }
}

/// AV/C SUBUNIT INFO command.
///
/// Described in clause "9.3 SUBUNIT INFO command". Each page has four entries at most.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubunitInfo {
    pub page: u8,
    pub extension_code: u8,
    pub entries: Vec<SubunitInfoEntry>,
}

impl SubunitInfo {
    /// The maximum value of page.
    pub const MAX_PAGE: u8 = 7;

    const PAGE_SHIFT: usize = 4;
    const PAGE_MASK: u8 = 0x07;
    const EXTENSION_CODE_SHIFT: usize = 0;
    const EXTENSION_CODE_MASK: u8 = 0x07;

    const ENTRY_COUNT: usize = 4;
    const EMPTY_ENTRY: u8 = 0xff;

    pub fn new(page: u8, extension_code: u8) -> Self {
        SubunitInfo {
            page,
            extension_code,
            entries: Vec::new(),
        }
    }
}

impl AvcOp for SubunitInfo {
    const OPCODE: u8 = 0x31;
    const ECHO_LENGTH: usize = 1;
}

impl AvcStatus for SubunitInfo {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        if let AvcAddr::Subunit(_) = addr {
            Err(AvcCmdBuildError::InvalidAddress)?;
        }
        if self.page > Self::MAX_PAGE {
            Err(AvcCmdBuildError::InvalidOperands)?;
        }

        let mut operands = vec![
            ((self.page & Self::PAGE_MASK) << Self::PAGE_SHIFT)
                | ((self.extension_code & Self::EXTENSION_CODE_MASK) << Self::EXTENSION_CODE_SHIFT),
        ];
        operands.extend_from_slice(&[0xff; Self::ENTRY_COUNT]);
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 1 + Self::ENTRY_COUNT {
            Err(AvcRespParseError::TooShortResp(1 + Self::ENTRY_COUNT))?;
        }

        self.page = (operands[0] >> Self::PAGE_SHIFT) & Self::PAGE_MASK;
        self.extension_code =
            (operands[0] >> Self::EXTENSION_CODE_SHIFT) & Self::EXTENSION_CODE_MASK;

        self.entries = operands[1..(1 + Self::ENTRY_COUNT)]
            .iter()
            .filter(|&operand| *operand != Self::EMPTY_ENTRY)
            .map(|&operand| {
                let subunit = AvcAddrSubunit::from(operand);
                SubunitInfoEntry::new(subunit.subunit_type, subunit.subunit_id)
            })
            .collect();

        Ok(())
    }
}

/// AV/C VENDOR-DEPENDENT command.
///
/// Described in clause "9.6 VENDOR-DEPENDENT commands". The content of data is opaque.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VendorDependent {
    pub company_id: [u8; 3],
    pub data: Vec<u8>,
}

impl VendorDependent {
    pub fn new(company_id: &[u8; 3]) -> Self {
        VendorDependent {
            company_id: *company_id,
            data: Vec::new(),
        }
    }

    fn build_envelope(&self) -> Result<Vec<u8>, AvcCmdBuildError> {
        if self.data.is_empty() {
            Err(AvcCmdBuildError::InvalidOperands)
        } else {
            let mut operands = self.company_id.to_vec();
            operands.extend_from_slice(&self.data);
            Ok(operands)
        }
    }

    fn parse_envelope(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 4 {
            Err(AvcRespParseError::TooShortResp(4))?;
        }
        if operands[..3] != self.company_id {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }
        self.data = operands[3..].to_vec();
        Ok(())
    }
}

impl AvcOp for VendorDependent {
    const OPCODE: u8 = 0x00;
    const ECHO_LENGTH: usize = 3;
}

impl AvcControl for VendorDependent {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_envelope()
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.parse_envelope(operands)
    }
}

impl AvcStatus for VendorDependent {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_envelope()
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.parse_envelope(operands)
    }
}

impl AvcNotify for VendorDependent {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.build_envelope()
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.parse_envelope(operands)
    }
}

/// The data of unit plugs for isochronous and external inputs/outputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugInfoUnitIsocExtData {
    pub isoc_input_plugs: u8,
    pub isoc_output_plugs: u8,
    pub external_input_plugs: u8,
    pub external_output_plugs: u8,
}

/// The data of unit plugs for asynchronous inputs/outputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugInfoUnitAsyncData {
    pub async_input_plugs: u8,
    pub async_output_plugs: u8,
}

/// The data of the number of plugs for inputs/outputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugInfoUnitOtherData {
    pub subfunction: u8,
    pub first_input_plug: u8,
    pub input_plugs: u8,
    pub first_output_plug: u8,
    pub output_plugs: u8,
}

/// Plug information for unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlugInfoUnitData {
    IsocExt(PlugInfoUnitIsocExtData),
    Async(PlugInfoUnitAsyncData),
    Other(PlugInfoUnitOtherData),
}

/// Plug information for subunit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugInfoSubunitData {
    pub dst_plugs: u8,
    pub src_plugs: u8,
}

/// AV/C PLUG INFO command.
///
/// Described in clause "10.1 PLUG INFO command".
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlugInfo {
    Unit(PlugInfoUnitData),
    Subunit(PlugInfoSubunitData),
}

impl PlugInfo {
    const SUBFUNC_UNIT_ISOC_EXT: u8 = 0x00;
    const SUBFUNC_UNIT_ASYNC: u8 = 0x01;
    const SUBFUNC_SUBUNIT: u8 = 0x00;

    pub fn new_for_unit_isoc_ext_plugs() -> Self {
        PlugInfo::Unit(PlugInfoUnitData::IsocExt(PlugInfoUnitIsocExtData {
            isoc_input_plugs: 0xff,
            isoc_output_plugs: 0xff,
            external_input_plugs: 0xff,
            external_output_plugs: 0xff,
        }))
    }

    pub fn new_for_unit_async_plugs() -> Self {
        PlugInfo::Unit(PlugInfoUnitData::Async(PlugInfoUnitAsyncData {
            async_input_plugs: 0xff,
            async_output_plugs: 0xff,
        }))
    }

    pub fn new_for_unit_other_plugs(subfunction: u8) -> Self {
        PlugInfo::Unit(PlugInfoUnitData::Other(PlugInfoUnitOtherData {
            subfunction,
            first_input_plug: 0xff,
            input_plugs: 0xff,
            first_output_plug: 0xff,
            output_plugs: 0xff,
        }))
    }

    pub fn new_for_subunit_plugs() -> Self {
        PlugInfo::Subunit(PlugInfoSubunitData {
            dst_plugs: 0xff,
            src_plugs: 0xff,
        })
    }
}

impl AvcOp for PlugInfo {
    const OPCODE: u8 = 0x02;
    const ECHO_LENGTH: usize = 1;
}

impl AvcStatus for PlugInfo {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        let subfunction = match (&self, addr) {
            (PlugInfo::Unit(u), AvcAddr::Unit) => match u {
                PlugInfoUnitData::IsocExt(_) => Self::SUBFUNC_UNIT_ISOC_EXT,
                PlugInfoUnitData::Async(_) => Self::SUBFUNC_UNIT_ASYNC,
                PlugInfoUnitData::Other(d) => d.subfunction,
            },
            (PlugInfo::Subunit(_), AvcAddr::Subunit(_)) => Self::SUBFUNC_SUBUNIT,
            _ => Err(AvcCmdBuildError::InvalidAddress)?,
        };
        let mut operands = vec![subfunction];
        operands.extend_from_slice(&[0xff; 4]);
        Ok(operands)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))?;
        }

        let subfunction = operands[0];
        let expected = match self {
            PlugInfo::Unit(PlugInfoUnitData::IsocExt(_)) => Self::SUBFUNC_UNIT_ISOC_EXT,
            PlugInfo::Unit(PlugInfoUnitData::Async(_)) => Self::SUBFUNC_UNIT_ASYNC,
            PlugInfo::Unit(PlugInfoUnitData::Other(d)) => d.subfunction,
            PlugInfo::Subunit(_) => Self::SUBFUNC_SUBUNIT,
        };
        if subfunction != expected {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        match self {
            PlugInfo::Unit(PlugInfoUnitData::IsocExt(d)) => {
                d.isoc_input_plugs = operands[1];
                d.isoc_output_plugs = operands[2];
                d.external_input_plugs = operands[3];
                d.external_output_plugs = operands[4];
            }
            PlugInfo::Unit(PlugInfoUnitData::Async(d)) => {
                d.async_input_plugs = operands[1];
                d.async_output_plugs = operands[2];
            }
            PlugInfo::Unit(PlugInfoUnitData::Other(d)) => {
                d.first_input_plug = operands[1];
                d.input_plugs = operands[2];
                d.first_output_plug = operands[3];
                d.output_plugs = operands[4];
            }
            PlugInfo::Subunit(s) => {
                s.dst_plugs = operands[1];
                s.src_plugs = operands[2];
            }
        }

        Ok(())
    }
}

/// The common data for plug signal format.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugSignalFormat {
    pub plug_id: u8,
    pub fmt: u8,
    pub fdf: [u8; 3],
}

impl Default for PlugSignalFormat {
    fn default() -> Self {
        Self {
            plug_id: 0xff,
            fmt: 0xff,
            fdf: [0xff; 3],
        }
    }
}

impl PlugSignalFormat {
    fn build_operands(&self, addr: &AvcAddr, for_status: bool) -> Result<Vec<u8>, AvcCmdBuildError> {
        if *addr != AvcAddr::Unit {
            Err(AvcCmdBuildError::InvalidAddress)?;
        }

        let mut operands = vec![self.plug_id];
        if for_status {
            operands.extend_from_slice(&[0xff; 4]);
        } else {
            operands.push(self.fmt);
            operands.extend_from_slice(&self.fdf);
        }
        Ok(operands)
    }

    fn parse_operands(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))?;
        }
        if operands[0] != self.plug_id {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }
        self.fmt = operands[1];
        self.fdf.copy_from_slice(&operands[2..5]);
        Ok(())
    }
}

/// AV/C INPUT PLUG SIGNAL FORMAT command.
///
/// Described in 10.10 INPUT PLUG SIGNAL FORMAT command.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct InputPlugSignalFormat(pub PlugSignalFormat);

impl InputPlugSignalFormat {
    pub fn new(plug_id: u8) -> Self {
        InputPlugSignalFormat(PlugSignalFormat {
            plug_id,
            ..Default::default()
        })
    }
}

impl AvcOp for InputPlugSignalFormat {
    const OPCODE: u8 = 0x19;
    const ECHO_LENGTH: usize = 1;
}

impl AvcControl for InputPlugSignalFormat {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.0.build_operands(addr, false)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(operands)
    }
}

impl AvcStatus for InputPlugSignalFormat {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.0.build_operands(addr, true)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(operands)
    }
}

/// AV/C OUTPUT PLUG SIGNAL FORMAT command.
///
/// Described in 10.11 OUTPUT PLUG SIGNAL FORMAT command.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct OutputPlugSignalFormat(pub PlugSignalFormat);

impl OutputPlugSignalFormat {
    pub fn new(plug_id: u8) -> Self {
        OutputPlugSignalFormat(PlugSignalFormat {
            plug_id,
            ..Default::default()
        })
    }
}

impl AvcOp for OutputPlugSignalFormat {
    const OPCODE: u8 = 0x18;
    const ECHO_LENGTH: usize = 1;
}

impl AvcControl for OutputPlugSignalFormat {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.0.build_operands(addr, false)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(operands)
    }
}

impl AvcStatus for OutputPlugSignalFormat {
    fn build_operands(&mut self, addr: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        self.0.build_operands(addr, true)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(operands)
    }
}

#[cfg(test)]
mod test {
    use crate::general::*;

    #[test]
    fn plug_direction_from() {
        assert_eq!(0x00, u8::from(PlugDirection::Input));
        assert_eq!(0x01, u8::from(PlugDirection::Output));
        assert_eq!(Ok(PlugDirection::Output), PlugDirection::try_from(0x01u8));
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            PlugDirection::try_from(0x02u8)
        );
    }

    #[test]
    fn unitinfo_operands() {
        let operands = [0x07, 0xde, 0xad, 0xbe, 0xef];
        let mut op = UnitInfo::new();
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.unit_type, AvcSubunitType::Reserved(0x1b));
        assert_eq!(op.unit_id, 0x06);
        assert_eq!(op.company_id, [0xad, 0xbe, 0xef]);

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &[0x07, 0xff, 0xff, 0xff, 0xff]);

        assert_eq!(
            Err(AvcCmdBuildError::InvalidAddress),
            AvcStatus::build_operands(&mut op, &AvcAddr::Subunit(MUSIC_SUBUNIT_0))
        );
        assert_eq!(
            Err(AvcRespParseError::TooShortResp(5)),
            AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands[..4])
        );
    }

    #[test]
    fn subunitinfo_operands() {
        let operands = [0xde, 0xad, 0xbe, 0xef, 0x3a];
        let mut op = SubunitInfo::new(0, 0);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.page, 0x05);
        assert_eq!(op.extension_code, 0x06);
        assert_eq!(
            op.entries,
            vec![
                SubunitInfoEntry::new(AvcSubunitType::Reserved(0x15), 0x05),
                SubunitInfoEntry::new(AvcSubunitType::Reserved(0x17), 0x06),
                SubunitInfoEntry::new(AvcSubunitType::Reserved(0x1d), 0x07),
                SubunitInfoEntry::new(AvcSubunitType::Camera, 0x02),
            ]
        );

        let operands = [0x10, 0x60, 0x08, 0xff, 0xff];
        let mut op = SubunitInfo::new(1, 0);
        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &[0x10, 0xff, 0xff, 0xff, 0xff]);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(
            op.entries,
            vec![
                SubunitInfoEntry::new(AvcSubunitType::Music, 0),
                SubunitInfoEntry::new(AvcSubunitType::Audio, 0),
            ]
        );

        let mut op = SubunitInfo::new(8, 0);
        assert_eq!(
            Err(AvcCmdBuildError::InvalidOperands),
            AvcStatus::build_operands(&mut op, &AvcAddr::Unit)
        );
    }

    #[test]
    fn vendor_dependent_operands() {
        let company_id = [0x00, 0x01, 0x02];
        let operands = [0x00, 0x01, 0x02, 0xde, 0xad, 0xbe, 0xef];
        let mut op = VendorDependent::new(&company_id);
        assert_eq!(
            Err(AvcCmdBuildError::InvalidOperands),
            AvcControl::build_operands(&mut op, &AvcAddr::Unit)
        );

        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.company_id, company_id);
        assert_eq!(&op.data, &[0xde, 0xad, 0xbe, 0xef]);

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &operands);

        let target = AvcControl::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &operands);

        let target = AvcNotify::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &operands);

        AvcControl::parse_operands(&mut op, &AvcAddr::Unit, &target).unwrap();
        assert_eq!(op.company_id, company_id);
        assert_eq!(&op.data, &[0xde, 0xad, 0xbe, 0xef]);

        let operands = [0x00, 0x01, 0x03, 0xde];
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            AvcControl::parse_operands(&mut op, &AvcAddr::Unit, &operands)
        );
    }

    #[test]
    fn pluginfo_operands() {
        let operands = [0x00, 0xde, 0xad, 0xbe, 0xef];
        let mut op = PlugInfo::new_for_unit_isoc_ext_plugs();
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(
            op,
            PlugInfo::Unit(PlugInfoUnitData::IsocExt(PlugInfoUnitIsocExtData {
                isoc_input_plugs: 0xde,
                isoc_output_plugs: 0xad,
                external_input_plugs: 0xbe,
                external_output_plugs: 0xef,
            }))
        );

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &[0x00, 0xff, 0xff, 0xff, 0xff]);

        let operands = [0x01, 0xde, 0xad, 0xff, 0xff];
        let mut op = PlugInfo::new_for_unit_async_plugs();
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(
            op,
            PlugInfo::Unit(PlugInfoUnitData::Async(PlugInfoUnitAsyncData {
                async_input_plugs: 0xde,
                async_output_plugs: 0xad,
            }))
        );

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &[0x01, 0xff, 0xff, 0xff, 0xff]);

        let operands = [0x53, 0xde, 0xad, 0xbe, 0xef];
        let mut op = PlugInfo::new_for_unit_other_plugs(0x53);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(
            op,
            PlugInfo::Unit(PlugInfoUnitData::Other(PlugInfoUnitOtherData {
                subfunction: 0x53,
                first_input_plug: 0xde,
                input_plugs: 0xad,
                first_output_plug: 0xbe,
                output_plugs: 0xef,
            }))
        );

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(&target, &[0x53, 0xff, 0xff, 0xff, 0xff]);

        let addr = AvcAddr::Subunit(AvcAddrSubunit::new(AvcSubunitType::Audio, 0x04));
        let operands = [0x00, 0xde, 0xad, 0xff, 0xff];
        let mut op = PlugInfo::new_for_subunit_plugs();
        AvcStatus::parse_operands(&mut op, &addr, &operands).unwrap();
        assert_eq!(
            op,
            PlugInfo::Subunit(PlugInfoSubunitData {
                dst_plugs: 0xde,
                src_plugs: 0xad,
            })
        );

        let target = AvcStatus::build_operands(&mut op, &addr).unwrap();
        assert_eq!(&target, &[0x00, 0xff, 0xff, 0xff, 0xff]);

        assert_eq!(
            Err(AvcCmdBuildError::InvalidAddress),
            AvcStatus::build_operands(&mut op, &AvcAddr::Unit)
        );

        let mut op = PlugInfo::new_for_unit_async_plugs();
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &[0x00, 0x01, 0x02, 0x03, 0x04])
        );
    }

    #[test]
    fn inputplugsignalformat_operands() {
        let operands = [0x1e, 0xde, 0xad, 0xbe, 0xef];
        let mut op = InputPlugSignalFormat::new(0x1e);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.0.plug_id, 0x1e);
        assert_eq!(op.0.fmt, 0xde);
        assert_eq!(op.0.fdf, [0xad, 0xbe, 0xef]);

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(target, &[0x1e, 0xff, 0xff, 0xff, 0xff]);

        let target = AvcControl::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(target, operands);

        let mut op = InputPlugSignalFormat::new(0x1e);
        AvcControl::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.0.plug_id, 0x1e);
        assert_eq!(op.0.fmt, 0xde);
        assert_eq!(op.0.fdf, [0xad, 0xbe, 0xef]);

        let mut op = InputPlugSignalFormat::new(0x00);
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands)
        );
    }

    #[test]
    fn outputplugsignalformat_operands() {
        let operands = [0x1e, 0xde, 0xad, 0xbe, 0xef];
        let mut op = OutputPlugSignalFormat::new(0x1e);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.0.plug_id, 0x1e);
        assert_eq!(op.0.fmt, 0xde);
        assert_eq!(op.0.fdf, [0xad, 0xbe, 0xef]);

        let target = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(target, &[0x1e, 0xff, 0xff, 0xff, 0xff]);

        let target = AvcControl::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(target, operands);

        assert_eq!(
            Err(AvcCmdBuildError::InvalidAddress),
            AvcControl::build_operands(&mut op, &AvcAddr::Subunit(MUSIC_SUBUNIT_0))
        );
    }
}
