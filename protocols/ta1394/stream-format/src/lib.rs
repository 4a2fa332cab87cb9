// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

#![doc = include_str!("../README.md")]

use {std::convert::TryFrom, ta1394_avc_general::*};

/// The nominal sampling frequency of stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SamplingRate {
    R22050,
    R24000,
    R32000,
    R44100,
    R48000,
    R88200,
    R96000,
    R176400,
    R192000,
}

impl Default for SamplingRate {
    fn default() -> Self {
        Self::R44100
    }
}

impl SamplingRate {
    const FREQ_CODE_22050: u8 = 0x00;
    const FREQ_CODE_24000: u8 = 0x01;
    const FREQ_CODE_32000: u8 = 0x02;
    const FREQ_CODE_44100: u8 = 0x03;
    const FREQ_CODE_48000: u8 = 0x04;
    const FREQ_CODE_96000: u8 = 0x05;
    const FREQ_CODE_176400: u8 = 0x06;
    const FREQ_CODE_192000: u8 = 0x07;
    const FREQ_CODE_88200: u8 = 0x0a;

    /// The list of supported rates.
    pub const ALL: [Self; 9] = [
        Self::R22050,
        Self::R24000,
        Self::R32000,
        Self::R44100,
        Self::R48000,
        Self::R88200,
        Self::R96000,
        Self::R176400,
        Self::R192000,
    ];

    /// The frequency in Hz.
    pub fn hz(&self) -> u32 {
        match self {
            Self::R22050 => 22050,
            Self::R24000 => 24000,
            Self::R32000 => 32000,
            Self::R44100 => 44100,
            Self::R48000 => 48000,
            Self::R88200 => 88200,
            Self::R96000 => 96000,
            Self::R176400 => 176400,
            Self::R192000 => 192000,
        }
    }

    /// The code in stream format.
    pub fn to_code(&self) -> u8 {
        match self {
            Self::R22050 => Self::FREQ_CODE_22050,
            Self::R24000 => Self::FREQ_CODE_24000,
            Self::R32000 => Self::FREQ_CODE_32000,
            Self::R44100 => Self::FREQ_CODE_44100,
            Self::R48000 => Self::FREQ_CODE_48000,
            Self::R88200 => Self::FREQ_CODE_88200,
            Self::R96000 => Self::FREQ_CODE_96000,
            Self::R176400 => Self::FREQ_CODE_176400,
            Self::R192000 => Self::FREQ_CODE_192000,
        }
    }

    /// Parse the code in stream format.
    pub fn from_code(code: u8) -> Result<Self, StreamFormatError> {
        let rate = match code {
            Self::FREQ_CODE_22050 => Self::R22050,
            Self::FREQ_CODE_24000 => Self::R24000,
            Self::FREQ_CODE_32000 => Self::R32000,
            Self::FREQ_CODE_44100 => Self::R44100,
            Self::FREQ_CODE_48000 => Self::R48000,
            Self::FREQ_CODE_96000 => Self::R96000,
            Self::FREQ_CODE_176400 => Self::R176400,
            Self::FREQ_CODE_192000 => Self::R192000,
            Self::FREQ_CODE_88200 => Self::R88200,
            _ => Err(StreamFormatError::Unsupported { rate_code: code })?,
        };
        Ok(rate)
    }
}

impl TryFrom<u32> for SamplingRate {
    type Error = u32;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .find(|rate| rate.hz() == hz)
            .copied()
            .ok_or(hz)
    }
}

/// The mode of rate control.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RateCtl {
    /// Command-based rate control defined by 1394 Trading Association.
    CommandBased,
    /// Clock-based rate control.
    ClockBased,
    NotSupported,
}

impl Default for RateCtl {
    fn default() -> Self {
        Self::NotSupported
    }
}

impl RateCtl {
    const COMMAND_BASED: u8 = 0x00;
    const CLOCK_BASED: u8 = 0x01;
    const NOT_SUPPORTED: u8 = 0x02;

    const MASK: u8 = 0x03;

    fn to_val(&self) -> u8 {
        match self {
            Self::CommandBased => Self::COMMAND_BASED,
            Self::ClockBased => Self::CLOCK_BASED,
            Self::NotSupported => Self::NOT_SUPPORTED,
        }
    }

    fn from_val(val: u8) -> Result<Self, StreamFormatError> {
        match val & Self::MASK {
            Self::COMMAND_BASED => Ok(Self::CommandBased),
            Self::CLOCK_BASED => Ok(Self::ClockBased),
            Self::NOT_SUPPORTED => Ok(Self::NotSupported),
            rate_ctl => Err(StreamFormatError::Protocol { rate_ctl }),
        }
    }
}

/// The class of data channel in compound AM824 stream.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ChannelClass {
    /// S/PDIF for either uncompressed (PCM) or compressed (AC3/WMA) stream.
    Iec60958_3,
    /// AC 3 compressed stream.
    Iec61937_3,
    /// MPEG compressed stream.
    Iec61937_4,
    /// DTS (Digital Theater Systems) compressed stream.
    Iec61937_5,
    /// MPEG-2 AAC compressed stream.
    Iec61937_6,
    /// ATRAC and ATRAC 2/3 compressed stream.
    Iec61937_7,
    /// Uncompressed linear PCM data stream.
    MultiBitLinearAudioRaw,
    MultiBitLinearAudioDvd,
    OneBitAudioPlainRaw,
    OneBitAudioPlainSacd,
    OneBitAudioEncodedRaw,
    OneBitAudioEncodedSacd,
    HighPrecisionMultiBitLinearAudio,
    /// Multiplexed MIDI stream.
    MidiConformant,
    /// SMPTE time code defined in Audio and Music Data Transmission Protocol v2.1.
    SmpteTimeCodeConformant,
    /// Sample count defined in Audio and Music Data Transmission Protocol v2.1.
    SampleCount,
    /// Ancillary data defined in Audio and Music Data Transmission Protocol v2.1.
    AncillaryData,
    /// Delivery of synchronization information.
    SyncStream,
    DoNotCare,
    Reserved(u8),
}

impl Default for ChannelClass {
    fn default() -> Self {
        Self::DoNotCare
    }
}

impl ChannelClass {
    const IEC60958_3: u8 = 0x00;
    const IEC61937_3: u8 = 0x01;
    const IEC61937_4: u8 = 0x02;
    const IEC61937_5: u8 = 0x03;
    const IEC61937_6: u8 = 0x04;
    const IEC61937_7: u8 = 0x05;
    const MULTI_BIT_LINEAR_AUDIO_RAW: u8 = 0x06;
    const MULTI_BIT_LINEAR_AUDIO_DVD: u8 = 0x07;
    const ONE_BIT_AUDIO_PLAIN_RAW: u8 = 0x08;
    const ONE_BIT_AUDIO_PLAIN_SACD: u8 = 0x09;
    const ONE_BIT_AUDIO_ENCODED_RAW: u8 = 0x0a;
    const ONE_BIT_AUDIO_ENCODED_SACD: u8 = 0x0b;
    const HIGH_PRECISION_MULTI_BIT_LINEAR_AUDIO: u8 = 0x0c;
    const MIDI_CONFORMANT: u8 = 0x0d;
    const SMPTE_TIME_CODE_CONFORMANT: u8 = 0x0e;
    const SAMPLE_COUNT: u8 = 0x0f;
    const ANCILLARY_DATA: u8 = 0x10;
    const SYNC_STREAM: u8 = 0x40;
    const DO_NOT_CARE: u8 = 0xff;
}

impl From<u8> for ChannelClass {
    fn from(val: u8) -> Self {
        match val {
            Self::IEC60958_3 => Self::Iec60958_3,
            Self::IEC61937_3 => Self::Iec61937_3,
            Self::IEC61937_4 => Self::Iec61937_4,
            Self::IEC61937_5 => Self::Iec61937_5,
            Self::IEC61937_6 => Self::Iec61937_6,
            Self::IEC61937_7 => Self::Iec61937_7,
            Self::MULTI_BIT_LINEAR_AUDIO_RAW => Self::MultiBitLinearAudioRaw,
            Self::MULTI_BIT_LINEAR_AUDIO_DVD => Self::MultiBitLinearAudioDvd,
            Self::ONE_BIT_AUDIO_PLAIN_RAW => Self::OneBitAudioPlainRaw,
            Self::ONE_BIT_AUDIO_PLAIN_SACD => Self::OneBitAudioPlainSacd,
            Self::ONE_BIT_AUDIO_ENCODED_RAW => Self::OneBitAudioEncodedRaw,
            Self::ONE_BIT_AUDIO_ENCODED_SACD => Self::OneBitAudioEncodedSacd,
            Self::HIGH_PRECISION_MULTI_BIT_LINEAR_AUDIO => Self::HighPrecisionMultiBitLinearAudio,
            Self::MIDI_CONFORMANT => Self::MidiConformant,
            Self::SMPTE_TIME_CODE_CONFORMANT => Self::SmpteTimeCodeConformant,
            Self::SAMPLE_COUNT => Self::SampleCount,
            Self::ANCILLARY_DATA => Self::AncillaryData,
            Self::SYNC_STREAM => Self::SyncStream,
            Self::DO_NOT_CARE => Self::DoNotCare,
            _ => Self::Reserved(val),
        }
    }
}

impl From<ChannelClass> for u8 {
    fn from(class: ChannelClass) -> Self {
        match class {
            ChannelClass::Iec60958_3 => ChannelClass::IEC60958_3,
            ChannelClass::Iec61937_3 => ChannelClass::IEC61937_3,
            ChannelClass::Iec61937_4 => ChannelClass::IEC61937_4,
            ChannelClass::Iec61937_5 => ChannelClass::IEC61937_5,
            ChannelClass::Iec61937_6 => ChannelClass::IEC61937_6,
            ChannelClass::Iec61937_7 => ChannelClass::IEC61937_7,
            ChannelClass::MultiBitLinearAudioRaw => ChannelClass::MULTI_BIT_LINEAR_AUDIO_RAW,
            ChannelClass::MultiBitLinearAudioDvd => ChannelClass::MULTI_BIT_LINEAR_AUDIO_DVD,
            ChannelClass::OneBitAudioPlainRaw => ChannelClass::ONE_BIT_AUDIO_PLAIN_RAW,
            ChannelClass::OneBitAudioPlainSacd => ChannelClass::ONE_BIT_AUDIO_PLAIN_SACD,
            ChannelClass::OneBitAudioEncodedRaw => ChannelClass::ONE_BIT_AUDIO_ENCODED_RAW,
            ChannelClass::OneBitAudioEncodedSacd => ChannelClass::ONE_BIT_AUDIO_ENCODED_SACD,
            ChannelClass::HighPrecisionMultiBitLinearAudio => {
                ChannelClass::HIGH_PRECISION_MULTI_BIT_LINEAR_AUDIO
            }
            ChannelClass::MidiConformant => ChannelClass::MIDI_CONFORMANT,
            ChannelClass::SmpteTimeCodeConformant => ChannelClass::SMPTE_TIME_CODE_CONFORMANT,
            ChannelClass::SampleCount => ChannelClass::SAMPLE_COUNT,
            ChannelClass::AncillaryData => ChannelClass::ANCILLARY_DATA,
            ChannelClass::SyncStream => ChannelClass::SYNC_STREAM,
            ChannelClass::DoNotCare => ChannelClass::DO_NOT_CARE,
            ChannelClass::Reserved(val) => val,
        }
    }
}

/// The layout of stream format in wire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FormatLayout {
    /// Compound AM824 stream with the list of channel formation.
    Compound,
    /// AM824 stream for synchronization, which expresses a pair of raw audio channels.
    SyncStreamShorthand,
}

impl Default for FormatLayout {
    fn default() -> Self {
        Self::Compound
    }
}

/// The error to decode stream format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum StreamFormatError {
    /// The content is against the layout.
    #[error("malformed stream format at {offset}")]
    Malformed { offset: usize },
    /// The code of sampling rate is not supported.
    #[error("unsupported rate code 0x{rate_code:02x}")]
    Unsupported { rate_code: u8 },
    /// The value of rate control is reserved.
    #[error("reserved rate control {rate_ctl}")]
    Protocol { rate_ctl: u8 },
    /// The number of entries is over the capacity of the field.
    #[error("too many entries {count}")]
    TooManyEntries { count: usize },
}

impl From<StreamFormatError> for AvcRespParseError {
    fn from(err: StreamFormatError) -> Self {
        match err {
            StreamFormatError::Malformed { offset } => Self::UnexpectedOperands(offset),
            StreamFormatError::Unsupported { .. } => {
                Self::UnexpectedOperands(StreamFormat::RATE_CODE_POS)
            }
            StreamFormatError::Protocol { .. } => {
                Self::UnexpectedOperands(StreamFormat::RATE_CTL_POS)
            }
            StreamFormatError::TooManyEntries { .. } => {
                Self::UnexpectedOperands(StreamFormat::ENTRY_COUNT_POS)
            }
        }
    }
}

/// The entry of compound AM824 stream, for the number of data channels in the class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct CompoundEntry {
    /// The number of data channels.
    pub count: u8,
    /// The class of data channels.
    pub class: ChannelClass,
}

impl CompoundEntry {
    fn expand(entries: &[Self]) -> Vec<ChannelClass> {
        entries
            .iter()
            .flat_map(|entry| std::iter::repeat(entry.class).take(entry.count as usize))
            .collect()
    }

    // Coalesce the runs of the same class, up to the maximum count per entry.
    fn coalesce(formation: &[ChannelClass]) -> Vec<Self> {
        let mut entries: Vec<Self> = Vec::new();
        formation.iter().for_each(|&class| match entries.last_mut() {
            Some(entry) if entry.class == class && entry.count < u8::MAX => entry.count += 1,
            _ => entries.push(Self { count: 1, class }),
        });
        entries
    }
}

/// The stream format of AM824 family for isochronous packet stream.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct StreamFormat {
    /// The nominal sampling frequency.
    pub rate: SamplingRate,
    /// The mode of rate control.
    pub rate_ctl: RateCtl,
    /// Whether the stream is the source of synchronization.
    pub sync_src: bool,
    /// The class of each data channel.
    pub formation: Vec<ChannelClass>,
    /// The layout in wire.
    pub layout: FormatLayout,
    /// The entries as decoded, when they differ from the coalesced runs of formation; e.g. the
    /// runs of the same class split into several entries, or the entry without channels. They
    /// are encoded as is while they still express the formation. Empty for the other cases.
    pub entries: Vec<CompoundEntry>,
}

impl StreamFormat {
    /// The value in `format_hierarchy_root` field for Audio and Music.
    pub const HIER_ROOT_AM: u8 = 0x90;
    /// The value in `format_hierarchy_level_1` field for AM824.
    pub const HIER_LEVEL_1_AM824: u8 = 0x00;
    /// The value in `format_hierarchy_level_1` field for compound AM824.
    pub const HIER_LEVEL_1_COMPOUND_AM824: u8 = 0x40;

    const RATE_CODE_POS: usize = 2;
    const RATE_CTL_POS: usize = 3;

    const ENTRY_COUNT_POS: usize = 4;

    const COMPOUND_HEADER_LENGTH: usize = 5;
    const ENTRY_LENGTH: usize = 2;

    const SHORTHAND_LENGTH: usize = 6;
    const SHORTHAND_FREQ_SHIFT: usize = 4;

    /// Instantiate compound AM824 stream format.
    pub fn new(rate: SamplingRate, rate_ctl: RateCtl, formation: &[ChannelClass]) -> Self {
        Self {
            rate,
            rate_ctl,
            sync_src: false,
            formation: formation.to_vec(),
            layout: FormatLayout::Compound,
            entries: Vec::new(),
        }
    }

    /// The number of data channels.
    pub fn channel_count(&self) -> usize {
        self.formation.len()
    }

    /// Count the number of data channels for the class.
    pub fn count_of(&self, class: ChannelClass) -> usize {
        self.formation.iter().filter(|&c| *c == class).count()
    }

    /// Decode the stream format.
    pub fn decode(raw: &[u8]) -> Result<Self, StreamFormatError> {
        Self::decode_with_length(raw).map(|(fmt, _)| fmt)
    }

    /// Decode the stream format at the head of bytes, then return it with the length of
    /// consumed bytes.
    pub fn decode_with_length(raw: &[u8]) -> Result<(Self, usize), StreamFormatError> {
        if raw.len() < 2 {
            Err(StreamFormatError::Malformed { offset: raw.len() })?;
        }
        if raw[0] != Self::HIER_ROOT_AM {
            Err(StreamFormatError::Malformed { offset: 0 })?;
        }

        match raw[1] {
            Self::HIER_LEVEL_1_COMPOUND_AM824 => Self::decode_compound(raw),
            Self::HIER_LEVEL_1_AM824 => Self::decode_shorthand(raw),
            _ => Err(StreamFormatError::Malformed { offset: 1 }),
        }
    }

    fn decode_compound(raw: &[u8]) -> Result<(Self, usize), StreamFormatError> {
        if raw.len() < Self::COMPOUND_HEADER_LENGTH {
            Err(StreamFormatError::Malformed { offset: raw.len() })?;
        }

        let rate = SamplingRate::from_code(raw[Self::RATE_CODE_POS])?;
        let rate_ctl = RateCtl::from_val(raw[Self::RATE_CTL_POS])?;
        let sync_src = raw[Self::RATE_CTL_POS] & 0x04 > 0;
        let entry_count = raw[Self::ENTRY_COUNT_POS] as usize;

        let mut entries = Vec::with_capacity(entry_count);
        let mut pos = Self::COMPOUND_HEADER_LENGTH;
        for _ in 0..entry_count {
            if pos + Self::ENTRY_LENGTH > raw.len() {
                Err(StreamFormatError::Malformed { offset: pos })?;
            }
            entries.push(CompoundEntry {
                count: raw[pos],
                class: ChannelClass::from(raw[pos + 1]),
            });
            pos += Self::ENTRY_LENGTH;
        }

        let formation = CompoundEntry::expand(&entries);
        if entries == CompoundEntry::coalesce(&formation) {
            entries.clear();
        }

        let fmt = Self {
            rate,
            rate_ctl,
            sync_src,
            formation,
            layout: FormatLayout::Compound,
            entries,
        };
        Ok((fmt, pos))
    }

    fn decode_shorthand(raw: &[u8]) -> Result<(Self, usize), StreamFormatError> {
        if raw.len() < Self::SHORTHAND_LENGTH {
            Err(StreamFormatError::Malformed { offset: raw.len() })?;
        }
        if raw[2] != ChannelClass::SYNC_STREAM {
            Err(StreamFormatError::Malformed { offset: 2 })?;
        }

        let rate = SamplingRate::from_code(raw[4] >> Self::SHORTHAND_FREQ_SHIFT)?;
        let rate_ctl = RateCtl::from_val(raw[4])?;

        let fmt = Self {
            rate,
            rate_ctl,
            sync_src: false,
            formation: vec![ChannelClass::MultiBitLinearAudioRaw; 2],
            layout: FormatLayout::SyncStreamShorthand,
            entries: Vec::new(),
        };
        Ok((fmt, Self::SHORTHAND_LENGTH))
    }

    /// Encode the stream format. The entries of compound AM824 stream are limited up to 255.
    pub fn encode(&self) -> Result<Vec<u8>, StreamFormatError> {
        match self.layout {
            FormatLayout::Compound => self.encode_compound(),
            FormatLayout::SyncStreamShorthand => Ok(vec![
                Self::HIER_ROOT_AM,
                Self::HIER_LEVEL_1_AM824,
                ChannelClass::SYNC_STREAM,
                0xff,
                (self.rate.to_code() << Self::SHORTHAND_FREQ_SHIFT) | self.rate_ctl.to_val(),
                0xff,
            ]),
        }
    }

    fn encode_compound(&self) -> Result<Vec<u8>, StreamFormatError> {
        let coalesced;
        let entries = if !self.entries.is_empty()
            && CompoundEntry::expand(&self.entries) == self.formation
        {
            &self.entries
        } else {
            coalesced = CompoundEntry::coalesce(&self.formation);
            &coalesced
        };

        let entry_count = u8::try_from(entries.len()).map_err(|_| {
            StreamFormatError::TooManyEntries {
                count: entries.len(),
            }
        })?;

        let mut raw = Vec::with_capacity(
            Self::COMPOUND_HEADER_LENGTH + entries.len() * Self::ENTRY_LENGTH,
        );
        raw.push(Self::HIER_ROOT_AM);
        raw.push(Self::HIER_LEVEL_1_COMPOUND_AM824);
        raw.push(self.rate.to_code());
        raw.push(((self.sync_src as u8) << 2) | self.rate_ctl.to_val());
        raw.push(entry_count);
        entries.iter().for_each(|entry| {
            raw.push(entry.count);
            raw.push(entry.class.into());
        });
        Ok(raw)
    }
}
