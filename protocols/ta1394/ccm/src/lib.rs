// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

#![doc = include_str!("../README.md")]

use ta1394_avc_general::*;

/// Address of plug in unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalUnitAddr {
    /// The plug for isochronous stream.
    Isoc(
        /// The numeric identifier of plug.
        u8,
    ),
    /// The plug for external signal.
    Ext(
        /// The numeric identifier of plug.
        u8,
    ),
}

impl Default for SignalUnitAddr {
    fn default() -> Self {
        Self::Isoc(Self::PLUG_ID_MASK)
    }
}

impl SignalUnitAddr {
    const EXT_PLUG_FLAG: u8 = 0x80;
    const PLUG_ID_MASK: u8 = 0x7f;

    const LENGTH: usize = 2;

    pub fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }
        if raw[0] != AvcAddr::UNIT_ADDR {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let plug_id = raw[1] & Self::PLUG_ID_MASK;
        let plug = if raw[1] & Self::EXT_PLUG_FLAG > 0 {
            Self::Ext(plug_id)
        } else {
            Self::Isoc(plug_id)
        };
        Ok(plug)
    }

    pub fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        raw[0] = AvcAddr::UNIT_ADDR;
        raw[1] = match self {
            SignalUnitAddr::Isoc(val) => *val & Self::PLUG_ID_MASK,
            SignalUnitAddr::Ext(val) => Self::EXT_PLUG_FLAG | (*val & Self::PLUG_ID_MASK),
        };
        raw
    }
}

/// Address of plug in subunit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignalSubunitAddr {
    /// The address of subunit.
    pub subunit: AvcAddrSubunit,
    /// The numeric identifier of plug.
    pub plug_id: u8,
}

impl Default for SignalSubunitAddr {
    fn default() -> Self {
        Self {
            subunit: Default::default(),
            plug_id: 0xff,
        }
    }
}

impl SignalSubunitAddr {
    const LENGTH: usize = 2;

    pub fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }
        if raw[0] == AvcAddr::UNIT_ADDR {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let subunit = AvcAddrSubunit::from(raw[0]);
        let plug_id = raw[1];
        Ok(SignalSubunitAddr { subunit, plug_id })
    }

    pub fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        raw[0] = u8::from(self.subunit);
        raw[1] = self.plug_id;
        raw
    }
}

/// Address of plug for signal source or destination.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalAddr {
    Unit(SignalUnitAddr),
    Subunit(SignalSubunitAddr),
}

impl Default for SignalAddr {
    fn default() -> Self {
        Self::Unit(Default::default())
    }
}

impl SignalAddr {
    /// The length of address in operands.
    pub const LENGTH: usize = 2;

    pub fn new_for_isoc_unit(plug_id: u8) -> Self {
        SignalAddr::Unit(SignalUnitAddr::Isoc(plug_id & SignalUnitAddr::PLUG_ID_MASK))
    }

    pub fn new_for_ext_unit(plug_id: u8) -> Self {
        SignalAddr::Unit(SignalUnitAddr::Ext(plug_id & SignalUnitAddr::PLUG_ID_MASK))
    }

    pub fn new_for_subunit(subunit_type: AvcSubunitType, subunit_id: u8, plug_id: u8) -> Self {
        SignalAddr::Subunit(SignalSubunitAddr {
            subunit: AvcAddrSubunit::new(subunit_type, subunit_id),
            plug_id,
        })
    }

    /// Parse the address. The unit address in the first byte expresses the plug of unit.
    pub fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let addr = if raw[0] == AvcAddr::UNIT_ADDR {
            let data = SignalUnitAddr::from_raw(&raw)?;
            SignalAddr::Unit(data)
        } else {
            let data = SignalSubunitAddr::from_raw(&raw)?;
            SignalAddr::Subunit(data)
        };

        Ok(addr)
    }

    pub fn to_raw(&self) -> [u8; Self::LENGTH] {
        match self {
            SignalAddr::Unit(a) => a.to_raw(),
            SignalAddr::Subunit(a) => a.to_raw(),
        }
    }
}

/// AV/C SIGNAL SOURCE command
///
/// Described in clause 7.1.1 SIGNAL SOURCE control command format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignalSource {
    /// The source of signal.
    pub src: SignalAddr,
    /// The destination of signal.
    pub dst: SignalAddr,
}

impl SignalSource {
    const LENGTH_MIN: usize = 5;

    pub fn new(dst: &SignalAddr) -> Self {
        SignalSource {
            dst: *dst,
            ..Default::default()
        }
    }

    fn build_operands(&self, for_status: bool) -> Result<Vec<u8>, AvcCmdBuildError> {
        let mut operands = Vec::new();
        operands.push(0xff);

        if for_status {
            operands.extend_from_slice(&[0xff, 0xfe]);
        } else {
            operands.extend_from_slice(&self.src.to_raw());
        }

        operands.extend_from_slice(&self.dst.to_raw());
        Ok(operands)
    }

    fn parse_operands(&mut self, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        self.src = SignalAddr::from_raw(&operands[1..3]).map_err(|err| err.add_offset(1))?;
        self.dst = SignalAddr::from_raw(&operands[3..5]).map_err(|err| err.add_offset(3))?;
        Ok(())
    }
}

impl Default for SignalSource {
    fn default() -> Self {
        Self {
            src: Default::default(),
            dst: Default::default(),
        }
    }
}

impl AvcOp for SignalSource {
    const OPCODE: u8 = 0x1a;
}

impl AvcControl for SignalSource {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        SignalSource::build_operands(self, false)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        Self::parse_operands(self, operands)
    }
}

impl AvcStatus for SignalSource {
    fn build_operands(&mut self, _: &AvcAddr) -> Result<Vec<u8>, AvcCmdBuildError> {
        SignalSource::build_operands(self, true)
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        Self::parse_operands(self, operands)
    }
}

/// The operations for the source of signal to the destination plug, addressed to the unit.
pub trait SignalSourceOperation: Ta1394Avc {
    /// Connect the source to the destination.
    fn set_signal_source(
        &self,
        src: &SignalAddr,
        dst: &SignalAddr,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let mut op = SignalSource {
            src: *src,
            dst: *dst,
        };
        self.control(&AvcAddr::Unit, &mut op, timeout_ms)
    }

    /// Get the source connected to the destination.
    fn get_signal_source(&self, dst: &SignalAddr, timeout_ms: u32) -> Result<SignalAddr, AvcError> {
        let mut op = SignalSource::new(dst);
        self.status(&AvcAddr::Unit, &mut op, timeout_ms)?;
        if op.dst != *dst {
            Err(AvcRespParseError::UnexpectedOperands(3))?;
        }
        Ok(op.src)
    }

    /// Inquire whether the source can be connected to the destination. The lack of support is
    /// not an error.
    fn ask_signal_source(
        &self,
        src: &SignalAddr,
        dst: &SignalAddr,
        timeout_ms: u32,
    ) -> Result<bool, AvcError> {
        let mut op = SignalSource {
            src: *src,
            dst: *dst,
        };
        self.specific_inquiry(&AvcAddr::Unit, &mut op, timeout_ms)
    }
}

impl<O: Ta1394Avc> SignalSourceOperation for O {}

#[cfg(test)]
mod test {
    use {
        crate::*,
        std::{cell::RefCell, time::Duration},
    };

    #[test]
    fn signaladdr_from() {
        let raw = [0xff, 0x00];
        let addr = SignalAddr::from_raw(&raw).unwrap();
        assert_eq!(SignalAddr::new_for_isoc_unit(0), addr);
        assert_eq!(raw, addr.to_raw());

        let raw = [0xff, 0x87];
        let addr = SignalAddr::from_raw(&raw).unwrap();
        assert_eq!(SignalAddr::new_for_ext_unit(7), addr);
        assert_eq!(raw, addr.to_raw());

        let raw = [0x63, 0x07];
        let addr = SignalAddr::from_raw(&raw).unwrap();
        assert_eq!(
            SignalAddr::new_for_subunit(AvcSubunitType::Music, 3, 7),
            addr
        );
        assert_eq!(raw, addr.to_raw());

        assert_eq!(
            Err(AvcRespParseError::TooShortResp(2)),
            SignalAddr::from_raw(&[0xff])
        );
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            SignalUnitAddr::from_raw(&[0x60, 0x00])
        );
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            SignalSubunitAddr::from_raw(&[0xff, 0x00])
        );
    }

    #[test]
    fn signaladdr_round_trip() {
        (0..=u8::MAX).for_each(|first| {
            (0..=u8::MAX).for_each(|second| {
                let raw = [first, second];
                let addr = SignalAddr::from_raw(&raw).unwrap();
                assert_eq!(raw, addr.to_raw());
                assert_eq!(Ok(addr), SignalAddr::from_raw(&addr.to_raw()));
            });
        });
    }

    #[test]
    fn signalsource_operands() {
        let operands = [0x00, 0x2e, 0x1c, 0xff, 0x05];
        let dst = SignalAddr::Unit(SignalUnitAddr::Isoc(0x05));
        let src = SignalAddr::Subunit(SignalSubunitAddr {
            subunit: AvcAddrSubunit::new(AvcSubunitType::Tuner, 0x06),
            plug_id: 0x1c,
        });
        let mut op = SignalSource::new(&dst);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.src, src);
        assert_eq!(op.dst, dst);

        let targets = AvcStatus::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(targets, [0xff, 0xff, 0xfe, 0xff, 0x05]);

        let src = SignalAddr::Subunit(SignalSubunitAddr {
            subunit: AvcAddrSubunit::new(AvcSubunitType::Extended, 0x05),
            plug_id: 0x07,
        });
        let dst = SignalAddr::Unit(SignalUnitAddr::Ext(0x03));
        let mut op = SignalSource { src, dst };
        let targets = AvcControl::build_operands(&mut op, &AvcAddr::Unit).unwrap();
        assert_eq!(targets, [0xff, 0xf5, 0x07, 0xff, 0x83]);

        let mut op = SignalSource {
            src: SignalAddr::Unit(SignalUnitAddr::Isoc(0xf)),
            dst: SignalAddr::Unit(SignalUnitAddr::Isoc(0xf)),
        };
        AvcControl::parse_operands(&mut op, &AvcAddr::Unit, &targets).unwrap();
        assert_eq!(op.src, src);
        assert_eq!(op.dst, dst);
    }

    /// The transport which answers with the frame prepared in advance.
    #[derive(Default)]
    struct OneShotTransport {
        requests: RefCell<Vec<Vec<u8>>>,
        response: Vec<u8>,
    }

    impl Ta1394Transport for OneShotTransport {
        fn read_quadlet(&self, addr: u64) -> Result<u32, TransportError> {
            Err(TransportError::Io(format!("no memory at 0x{:x}", addr)))
        }

        fn read_block(&self, addr: u64, _: usize) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::Io(format!("no memory at 0x{:x}", addr)))
        }

        fn write_block(&self, addr: u64, _: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::Io(format!("no memory at 0x{:x}", addr)))
        }

        fn fcp_exchange(&self, req: &[u8], _: Duration) -> Result<Vec<u8>, TransportError> {
            self.requests.borrow_mut().push(req.to_vec());
            Ok(self.response.clone())
        }
    }

    fn codec(response: &[u8]) -> AvcCodec<OneShotTransport> {
        AvcCodec::new(OneShotTransport {
            response: response.to_vec(),
            ..Default::default()
        })
    }

    #[test]
    fn ask_signal_source_not_implemented() {
        let src = SignalAddr::new_for_ext_unit(1);
        let dst = SignalAddr::new_for_subunit(AvcSubunitType::Music, 0, 1);

        let avc = codec(&[0x08, 0xff, 0x1a, 0xff, 0xff, 0x81, 0x60, 0x01]);
        assert_eq!(Ok(false), avc.ask_signal_source(&src, &dst, avc.timeout_ms()));
        assert_eq!(
            vec![vec![0x02, 0xff, 0x1a, 0xff, 0xff, 0x81, 0x60, 0x01]],
            *avc.transport().requests.borrow()
        );

        let avc = codec(&[0x0c, 0xff, 0x1a, 0xff, 0xff, 0x81, 0x60, 0x01]);
        assert_eq!(Ok(true), avc.ask_signal_source(&src, &dst, avc.timeout_ms()));
    }

    #[test]
    fn set_and_get_signal_source() {
        let src = SignalAddr::new_for_subunit(AvcSubunitType::Music, 0, 1);
        let dst = SignalAddr::new_for_isoc_unit(0);

        let avc = codec(&[0x09, 0xff, 0x1a, 0xff, 0x60, 0x01, 0xff, 0x00]);
        assert_eq!(Ok(()), avc.set_signal_source(&src, &dst, avc.timeout_ms()));
        assert_eq!(
            vec![vec![0x00, 0xff, 0x1a, 0xff, 0x60, 0x01, 0xff, 0x00]],
            *avc.transport().requests.borrow()
        );

        let avc = codec(&[0x0c, 0xff, 0x1a, 0x00, 0x60, 0x01, 0xff, 0x00]);
        assert_eq!(Ok(src), avc.get_signal_source(&dst, avc.timeout_ms()));
        assert_eq!(
            vec![vec![0x01, 0xff, 0x1a, 0xff, 0xff, 0xfe, 0xff, 0x00]],
            *avc.transport().requests.borrow()
        );

        let avc = codec(&[0x0c, 0xff, 0x1a, 0x00, 0x60, 0x01, 0xff, 0x01]);
        assert_eq!(
            Err(AvcError::Protocol(AvcRespParseError::UnexpectedOperands(3))),
            avc.get_signal_source(&dst, avc.timeout_ms())
        );

        let avc = codec(&[0x0a, 0xff, 0x1a, 0xff, 0x60, 0x01, 0xff, 0x00]);
        assert_eq!(
            Err(AvcError::Rejected),
            avc.set_signal_source(&src, &dst, avc.timeout_ms())
        );
    }
}
