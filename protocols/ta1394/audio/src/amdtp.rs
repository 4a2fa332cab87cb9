// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Takashi Sakamoto

use {
    super::*,
    ta1394_avc_general::general::{
        InputPlugSignalFormat, OutputPlugSignalFormat, PlugDirection, PlugSignalFormat,
    },
};

/// The value of fmt field for Audio and Music Data Transmission Protocol.
pub const FMT_IS_AMDTP: u8 = 0x90;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AmdtpEventType {
    Am824,
    AudioPack,
    FloatingPoint,
    Reserved(u8),
}

impl Default for AmdtpEventType {
    fn default() -> Self {
        Self::Am824
    }
}

/// The content of FDF field for Audio and Music Data Transmission Protocol.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct AmdtpFdf {
    pub ev_type: AmdtpEventType,
    pub cmd_rate_ctl: bool,
    pub freq: u32,
}

impl AmdtpFdf {
    const EVT_MASK: u8 = 0x03;
    const EVT_SHIFT: usize = 4;

    const NFLAG_MASK: u8 = 0x01;
    const NFLAG_SHIFT: usize = 3;

    const SFC_MASK: u8 = 0x07;
    const SFC_SHIFT: usize = 0;

    const AM824: u8 = 0x00;
    const AUDIOPACK: u8 = 0x01;
    const FLOATINGPOINT: u8 = 0x02;

    /// The nominal sampling frequencies indexed by the code of sampling frequency (SFC).
    pub const FREQ_LIST: [u32; 7] = [32000, 44100, 48000, 88200, 96000, 176400, 192000];

    pub fn new(ev_type: AmdtpEventType, cmd_rate_ctl: bool, freq: u32) -> Self {
        AmdtpFdf {
            ev_type,
            cmd_rate_ctl,
            freq,
        }
    }

    /// Parse the FDF field. The code of sampling frequency out of the list is unexpected.
    pub fn parse(raw: &[u8; 3]) -> Result<Self, AvcRespParseError> {
        let ev_type = (raw[0] >> Self::EVT_SHIFT) & Self::EVT_MASK;
        let nflag = (raw[0] >> Self::NFLAG_SHIFT) & Self::NFLAG_MASK;
        let sfc = (raw[0] >> Self::SFC_SHIFT) & Self::SFC_MASK;

        let ev_type = match ev_type {
            Self::AM824 => AmdtpEventType::Am824,
            Self::AUDIOPACK => AmdtpEventType::AudioPack,
            Self::FLOATINGPOINT => AmdtpEventType::FloatingPoint,
            _ => AmdtpEventType::Reserved(ev_type),
        };

        let freq = Self::FREQ_LIST
            .iter()
            .nth(sfc as usize)
            .copied()
            .ok_or(AvcRespParseError::UnexpectedOperands(0))?;

        Ok(AmdtpFdf {
            ev_type,
            cmd_rate_ctl: nflag > 0,
            freq,
        })
    }

    /// Build the FDF field. The frequency out of the list is invalid.
    pub fn build(&self) -> Result<[u8; 3], AvcCmdBuildError> {
        let ev_type = match self.ev_type {
            AmdtpEventType::Am824 => Self::AM824,
            AmdtpEventType::AudioPack => Self::AUDIOPACK,
            AmdtpEventType::FloatingPoint => Self::FLOATINGPOINT,
            AmdtpEventType::Reserved(val) => val,
        };

        let sfc = Self::FREQ_LIST
            .iter()
            .position(|&freq| freq == self.freq)
            .ok_or(AvcCmdBuildError::InvalidOperands)? as u8;

        let mut raw = [0xff; 3];
        raw[0] = ((ev_type & Self::EVT_MASK) << Self::EVT_SHIFT)
            | ((self.cmd_rate_ctl as u8 & Self::NFLAG_MASK) << Self::NFLAG_SHIFT)
            | ((sfc & Self::SFC_MASK) << Self::SFC_SHIFT);
        Ok(raw)
    }
}

fn build_plug_signal_format(plug_id: u8, freq: u32) -> Result<PlugSignalFormat, AvcCmdBuildError> {
    let fdf = AmdtpFdf::new(AmdtpEventType::Am824, false, freq).build()?;
    Ok(PlugSignalFormat {
        plug_id,
        fmt: FMT_IS_AMDTP,
        fdf,
    })
}

fn parse_plug_signal_format(fmt: u8, fdf: &[u8; 3]) -> Result<u32, AvcError> {
    if fmt != FMT_IS_AMDTP {
        Err(AvcRespParseError::UnexpectedOperands(1))?;
    }
    AmdtpFdf::parse(fdf)
        .map(|fdf| fdf.freq)
        .map_err(|err| err.add_offset(2).into())
}

/// The operations for the format of signal at the plug of unit, to configure the nominal sampling
/// frequency of isochronous packet stream.
pub trait PlugSignalFormatOperation: Ta1394Avc {
    fn set_plug_signal_format(
        &self,
        direction: PlugDirection,
        plug_id: u8,
        freq: u32,
        timeout_ms: u32,
    ) -> Result<(), AvcError> {
        let data = build_plug_signal_format(plug_id, freq)?;
        match direction {
            PlugDirection::Input => {
                self.control(&AvcAddr::Unit, &mut InputPlugSignalFormat(data), timeout_ms)
            }
            PlugDirection::Output => {
                self.control(&AvcAddr::Unit, &mut OutputPlugSignalFormat(data), timeout_ms)
            }
        }
    }

    fn get_plug_signal_format(
        &self,
        direction: PlugDirection,
        plug_id: u8,
        timeout_ms: u32,
    ) -> Result<u32, AvcError> {
        match direction {
            PlugDirection::Input => {
                let mut op = InputPlugSignalFormat::new(plug_id);
                self.status(&AvcAddr::Unit, &mut op, timeout_ms)?;
                parse_plug_signal_format(op.0.fmt, &op.0.fdf)
            }
            PlugDirection::Output => {
                let mut op = OutputPlugSignalFormat::new(plug_id);
                self.status(&AvcAddr::Unit, &mut op, timeout_ms)?;
                parse_plug_signal_format(op.0.fmt, &op.0.fdf)
            }
        }
    }

    /// Inquire whether the plug supports the frequency. The lack of support is not an error.
    fn ask_plug_signal_format(
        &self,
        direction: PlugDirection,
        plug_id: u8,
        freq: u32,
        timeout_ms: u32,
    ) -> Result<bool, AvcError> {
        let data = build_plug_signal_format(plug_id, freq)?;
        match direction {
            PlugDirection::Input => {
                let mut op = InputPlugSignalFormat(data);
                self.specific_inquiry(&AvcAddr::Unit, &mut op, timeout_ms)
            }
            PlugDirection::Output => {
                let mut op = OutputPlugSignalFormat(data);
                self.specific_inquiry(&AvcAddr::Unit, &mut op, timeout_ms)
            }
        }
    }
}

impl<O: Ta1394Avc> PlugSignalFormatOperation for O {}

#[cfg(test)]
mod test {
    use {
        super::*,
        std::{cell::RefCell, collections::HashMap, time::Duration},
    };

    #[test]
    fn amdtp_fdf_from() {
        let fdf = AmdtpFdf::new(AmdtpEventType::Am824, false, 48000);
        assert_eq!(Ok([0x02, 0xff, 0xff]), fdf.build());

        let fdf = AmdtpFdf::new(AmdtpEventType::AudioPack, true, 192000);
        assert_eq!(Ok([0x1e, 0xff, 0xff]), fdf.build());
        assert_eq!(Ok(fdf), AmdtpFdf::parse(&[0x1e, 0xff, 0xff]));

        AmdtpFdf::FREQ_LIST.iter().for_each(|&freq| {
            let fdf = AmdtpFdf::new(AmdtpEventType::Am824, false, freq);
            assert_eq!(Ok(fdf), AmdtpFdf::parse(&fdf.build().unwrap()));
        });

        let fdf = AmdtpFdf::new(AmdtpEventType::Am824, false, 22050);
        assert_eq!(Err(AvcCmdBuildError::InvalidOperands), fdf.build());
        assert_eq!(
            Err(AvcRespParseError::UnexpectedOperands(0)),
            AmdtpFdf::parse(&[0x07, 0xff, 0xff])
        );
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

    #[test]
    fn set_output_plug_signal_format() {
        let transport = OneShotTransport {
            response: vec![0x09, 0xff, 0x18, 0x00, 0x90, 0x02, 0xff, 0xff],
            ..Default::default()
        };
        let avc = AvcCodec::new(transport);
        avc.set_plug_signal_format(PlugDirection::Output, 0, 48000, avc.timeout_ms())
            .unwrap();
        assert_eq!(
            vec![vec![0x00, 0xff, 0x18, 0x00, 0x90, 0x02, 0xff, 0xff]],
            *avc.transport().requests.borrow()
        );

        assert_eq!(
            Err(AvcError::CmdBuild(AvcCmdBuildError::InvalidOperands)),
            avc.set_plug_signal_format(PlugDirection::Input, 0, 22050, avc.timeout_ms())
        );
        assert_eq!(1, avc.transport().requests.borrow().len());
    }

    /// The unit which keeps the frequency per plug and supports some of frequencies.
    struct RateUnit {
        supported: Vec<u32>,
        current: RefCell<HashMap<(u8, u8), u32>>,
    }

    impl RateUnit {
        fn new(supported: &[u32]) -> Self {
            Self {
                supported: supported.to_vec(),
                current: Default::default(),
            }
        }
    }

    impl Ta1394Avc for RateUnit {
        fn transaction(&self, frame: &[u8], _: u32) -> Result<Vec<u8>, AvcError> {
            let key = (frame[2], frame[3]);
            let mut resp = frame.to_vec();
            let code = match AvcCmdType::from(frame[0]) {
                AvcCmdType::Status => {
                    let freq = self.current.borrow().get(&key).copied().unwrap_or(44100);
                    let fdf = AmdtpFdf::new(AmdtpEventType::Am824, false, freq);
                    resp[4] = FMT_IS_AMDTP;
                    resp[5..8].copy_from_slice(&fdf.build().unwrap());
                    AvcRespCode::ImplementedStable
                }
                kind => {
                    let mut fdf = [0; 3];
                    fdf.copy_from_slice(&frame[5..8]);
                    let freq = AmdtpFdf::parse(&fdf).unwrap().freq;
                    match (kind, self.supported.iter().any(|&f| f == freq)) {
                        (AvcCmdType::Control, true) => {
                            self.current.borrow_mut().insert(key, freq);
                            AvcRespCode::Accepted
                        }
                        (AvcCmdType::Control, false) => AvcRespCode::Rejected,
                        (_, true) => AvcRespCode::ImplementedStable,
                        (_, false) => AvcRespCode::NotImplemented,
                    }
                }
            };
            resp[0] = code.into();
            classify_response(AvcCmdType::from(frame[0]), code).map(|_| resp)
        }
    }

    #[test]
    fn ask_plug_signal_format_iff_settable() {
        let unit = RateUnit::new(&[44100, 48000, 88200, 96000]);

        [PlugDirection::Input, PlugDirection::Output]
            .iter()
            .for_each(|&direction| {
                AmdtpFdf::FREQ_LIST.iter().for_each(|&freq| {
                    let supported = unit
                        .ask_plug_signal_format(direction, 1, freq, 100)
                        .unwrap();
                    let settable = unit
                        .set_plug_signal_format(direction, 1, freq, 100)
                        .and_then(|_| unit.get_plug_signal_format(direction, 1, 100))
                        .map(|f| f == freq)
                        .unwrap_or(false);
                    assert_eq!(supported, settable, "{:?} {}", direction, freq);
                });
            });

        assert_eq!(
            Ok(96000),
            unit.get_plug_signal_format(PlugDirection::Input, 1, 100)
        );
        assert_eq!(
            Ok(44100),
            unit.get_plug_signal_format(PlugDirection::Output, 0, 100)
        );
    }

    #[test]
    fn get_plug_signal_format_unexpected() {
        struct FixedUnit(Vec<u8>);

        impl Ta1394Avc for FixedUnit {
            fn transaction(&self, _: &[u8], _: u32) -> Result<Vec<u8>, AvcError> {
                Ok(self.0.clone())
            }
        }

        let unit = FixedUnit(vec![0x0c, 0xff, 0x19, 0x00, 0x80, 0x02, 0xff, 0xff]);
        assert_eq!(
            Err(AvcError::Protocol(AvcRespParseError::UnexpectedOperands(1))),
            unit.get_plug_signal_format(PlugDirection::Input, 0, 100)
        );

        let unit = FixedUnit(vec![0x0c, 0xff, 0x19, 0x00, 0x90, 0x07, 0xff, 0xff]);
        assert_eq!(
            Err(AvcError::Protocol(AvcRespParseError::UnexpectedOperands(2))),
            unit.get_plug_signal_format(PlugDirection::Input, 0, 100)
        );
    }
}
