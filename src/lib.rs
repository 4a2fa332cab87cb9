// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub use {
    firewire_bebob_protocols as bebob, ieee1212_config_rom as config_rom,
    ta1394_avc_audio as audio, ta1394_avc_ccm as ccm, ta1394_avc_general as general,
    ta1394_avc_stream_format as stream_format,
};

use {
    config_rom::{ConfigRomError, DeviceIdentity, HandlerSet},
    general::{Ta1394Transport, TransportError},
    tracing::debug,
};

/// The error to identify device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Fail to read the content of Configuration ROM.
    #[error("fail to read configuration ROM: {0}")]
    Transport(#[from] TransportError),
    /// Fail to parse the content of Configuration ROM.
    #[error(transparent)]
    ConfigRom(#[from] ConfigRomError),
}

/// Parse the content of Configuration ROM with the handlers for vendor and specifier keys.
pub fn parse_config_rom(raw: &[u8], handlers: &HandlerSet) -> Result<DeviceIdentity, ConfigRomError> {
    config_rom::parse_config_rom(raw, handlers)
}

/// Read Configuration ROM of the node by the transport, then parse it.
pub fn read_config_rom<T: Ta1394Transport>(
    transport: &T,
    handlers: &HandlerSet,
) -> Result<DeviceIdentity, IdentityError> {
    let raw = transport.read_config_rom()?;
    debug!(length = raw.len(), "configuration ROM");
    let identity = parse_config_rom(&raw, handlers)?;
    debug!(
        vendor_id = identity.vendor_id,
        model_id = identity.model_id,
        units = identity.unit_directories.len(),
    );
    Ok(identity)
}
