// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Snapshot of plugs in the unit and the routing of sampling clock.
//!
//! The module includes structure to walk through plugs of unit, subunits, and function blocks by
//! AV/C general commands and BridgeCo extensions, then to take snapshot of them. The failure to
//! describe each plug is not fatal and the plug is omitted from the snapshot.

use {
    super::{bridgeco::*, *},
    tracing::debug,
};

/// The description of plug.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlugDescriptor {
    /// The location of plug.
    pub location: BcoPlugLocation,
    /// The type of plug.
    pub plug_type: BcoPlugType,
    /// The name of plug.
    pub name: String,
    /// The name of each channel.
    pub channels: Vec<BcoChannelName>,
    /// The information of each cluster, just for the plug of isochronous stream.
    pub clusters: Vec<BcoClusterInfo>,
    /// The plug as source of signal to the plug, if connected.
    pub input_source: Option<BcoPlugLocation>,
    /// The plugs as destination of signal from the plug.
    pub output_destinations: Vec<BcoPlugLocation>,
}

impl PlugDescriptor {
    /// The address for signal source command, if available.
    pub fn signal_addr(&self) -> Option<SignalAddr> {
        match (&self.location.subunit, &self.location.addr.mode) {
            (AvcAddr::Unit, BcoPlugAddrMode::Unit(d)) => match d.plug_type {
                BcoPlugAddrUnitType::Isoc => Some(SignalAddr::new_for_isoc_unit(d.plug_id)),
                BcoPlugAddrUnitType::Ext => Some(SignalAddr::new_for_ext_unit(d.plug_id)),
                BcoPlugAddrUnitType::Async => None,
            },
            (AvcAddr::Subunit(subunit), BcoPlugAddrMode::Subunit(d)) => {
                Some(SignalAddr::Subunit(SignalSubunitAddr {
                    subunit: *subunit,
                    plug_id: d.plug_id,
                }))
            }
            _ => None,
        }
    }

    fn direction(&self) -> PlugDirection {
        self.location.addr.direction
    }

    fn is_unit_plug_of(&self, plug_type: BcoPlugAddrUnitType) -> bool {
        match self.location.addr.mode {
            BcoPlugAddrMode::Unit(d) => d.plug_type == plug_type,
            _ => false,
        }
    }

    fn is_subunit_plug_of(&self, subunit_type: AvcSubunitType) -> bool {
        match (&self.location.subunit, &self.location.addr.mode) {
            (AvcAddr::Subunit(s), BcoPlugAddrMode::Subunit(_)) => s.subunit_type == subunit_type,
            _ => false,
        }
    }
}

/// The snapshot of plugs in the unit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlugTopology {
    /// The plugs of unit.
    pub unit_plugs: Vec<PlugDescriptor>,
    /// The plugs of subunits.
    pub subunit_plugs: Vec<PlugDescriptor>,
    /// The plugs of function blocks in subunits.
    pub function_block_plugs: Vec<PlugDescriptor>,
    /// The destination of sampling clock.
    pub signal_destination: Option<SignalAddr>,
    /// The available sources of sampling clock.
    pub signal_sources: Vec<(SignalAddr, PlugDescriptor)>,
}

impl PlugTopology {
    /// Walk through the plugs by the codec with its timeout.
    pub fn walk_codec<T: Ta1394Transport>(avc: &AvcCodec<T>) -> Result<Self, AvcError> {
        Self::walk(avc, avc.timeout_ms())
    }

    /// Walk through the plugs of unit, subunits, and function blocks, then detect the routing of
    /// sampling clock. The commands are transmitted one by one.
    pub fn walk<A: Ta1394Avc>(avc: &A, timeout_ms: u32) -> Result<Self, AvcError> {
        let unit_plugs = describe_plugs(avc, &unit_plug_locations(avc, timeout_ms)?, timeout_ms);

        let subunits = detect_subunits(avc, timeout_ms)?;

        let locations: Vec<BcoPlugLocation> = subunits
            .iter()
            .flat_map(|subunit| subunit_plug_locations(avc, subunit, timeout_ms))
            .collect();
        let subunit_plugs = describe_plugs(avc, &locations, timeout_ms);

        let locations: Vec<BcoPlugLocation> = subunits
            .iter()
            .flat_map(|subunit| func_blk_plug_locations(avc, subunit, timeout_ms))
            .collect();
        let function_block_plugs = describe_plugs(avc, &locations, timeout_ms);

        let mut topology = Self {
            unit_plugs,
            subunit_plugs,
            function_block_plugs,
            ..Default::default()
        };
        topology.detect_clock_routing(avc, timeout_ms);

        Ok(topology)
    }

    // The destination is the input plug for sync stream in music subunit.
    fn detect_clock_routing<A: Ta1394Avc>(&mut self, avc: &A, timeout_ms: u32) {
        let dst = match self
            .subunit_plugs
            .iter()
            .filter(|plug| plug.is_subunit_plug_of(AvcSubunitType::Music))
            .filter(|plug| plug.direction() == PlugDirection::Input)
            .find(|plug| plug.plug_type == BcoPlugType::Sync)
            .and_then(|plug| plug.signal_addr())
        {
            Some(dst) => dst,
            None => return,
        };

        let music_outputs = self.subunit_plugs.iter().filter(|plug| {
            plug.is_subunit_plug_of(AvcSubunitType::Music)
                && plug.direction() == PlugDirection::Output
                && plug.plug_type == BcoPlugType::Sync
        });
        let ext_inputs = self.unit_plugs.iter().filter(|plug| {
            plug.is_unit_plug_of(BcoPlugAddrUnitType::Ext)
                && plug.direction() == PlugDirection::Input
                && matches!(
                    plug.plug_type,
                    BcoPlugType::Sync | BcoPlugType::Digital | BcoPlugType::Clock
                )
        });
        let isoc_inputs = self.unit_plugs.iter().filter(|plug| {
            plug.is_unit_plug_of(BcoPlugAddrUnitType::Isoc)
                && plug.direction() == PlugDirection::Input
                && plug.plug_type == BcoPlugType::Sync
        });

        let signal_sources = music_outputs
            .chain(ext_inputs)
            .chain(isoc_inputs)
            .filter_map(|plug| plug.signal_addr().map(|src| (src, plug)))
            .filter(|(src, _)| match avc.ask_signal_source(src, &dst, timeout_ms) {
                Ok(available) => available,
                Err(err) => {
                    debug!(?src, ?dst, %err, "skip candidate of clock source");
                    false
                }
            })
            .map(|(src, plug)| (src, plug.clone()))
            .collect();

        self.signal_destination = Some(dst);
        self.signal_sources = signal_sources;
    }
}

fn unit_plug_locations<A: Ta1394Avc>(
    avc: &A,
    timeout_ms: u32,
) -> Result<Vec<BcoPlugLocation>, AvcError> {
    let mut op = PlugInfo::new_for_unit_isoc_ext_plugs();
    avc.status(&AvcAddr::Unit, &mut op, timeout_ms)?;
    let (isoc_inputs, isoc_outputs, ext_inputs, ext_outputs) = match op {
        PlugInfo::Unit(PlugInfoUnitData::IsocExt(d)) => (
            d.isoc_input_plugs,
            d.isoc_output_plugs,
            d.external_input_plugs,
            d.external_output_plugs,
        ),
        _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
    };

    // Not all of units have plugs for asynchronous connection.
    let mut op = PlugInfo::new_for_unit_async_plugs();
    let (async_inputs, async_outputs) = match avc.status(&AvcAddr::Unit, &mut op, timeout_ms) {
        Ok(_) => match op {
            PlugInfo::Unit(PlugInfoUnitData::Async(d)) => {
                (d.async_input_plugs, d.async_output_plugs)
            }
            _ => (0, 0),
        },
        Err(err) => {
            debug!(%err, "no plug for asynchronous connection");
            (0, 0)
        }
    };

    let locations = [
        (PlugDirection::Input, BcoPlugAddrUnitType::Isoc, isoc_inputs),
        (PlugDirection::Output, BcoPlugAddrUnitType::Isoc, isoc_outputs),
        (PlugDirection::Input, BcoPlugAddrUnitType::Ext, ext_inputs),
        (PlugDirection::Output, BcoPlugAddrUnitType::Ext, ext_outputs),
        (PlugDirection::Input, BcoPlugAddrUnitType::Async, async_inputs),
        (PlugDirection::Output, BcoPlugAddrUnitType::Async, async_outputs),
    ]
    .iter()
    .flat_map(|&(direction, plug_type, count)| {
        (0..count).map(move |i| BcoPlugLocation::new_for_unit(direction, plug_type, i))
    })
    .collect();

    Ok(locations)
}

fn detect_subunits<A: Ta1394Avc>(
    avc: &A,
    timeout_ms: u32,
) -> Result<Vec<AvcAddrSubunit>, AvcError> {
    let mut subunits = Vec::new();
    for page in 0..=SubunitInfo::MAX_PAGE {
        let mut op = SubunitInfo::new(page, 0x07);
        match avc.status(&AvcAddr::Unit, &mut op, timeout_ms) {
            Ok(_) => (),
            Err(AvcError::NotImplemented) => break,
            Err(err) => return Err(err),
        }
        if op.entries.is_empty() {
            break;
        }
        op.entries.iter().for_each(|entry| {
            (0..=entry.maximum_id)
                .for_each(|id| subunits.push(AvcAddrSubunit::new(entry.subunit_type, id)));
        });
    }
    Ok(subunits)
}

fn subunit_plug_locations<A: Ta1394Avc>(
    avc: &A,
    subunit: &AvcAddrSubunit,
    timeout_ms: u32,
) -> Vec<BcoPlugLocation> {
    let mut op = PlugInfo::new_for_subunit_plugs();
    let (dst_plugs, src_plugs) = match avc.status(&AvcAddr::Subunit(*subunit), &mut op, timeout_ms)
    {
        Ok(_) => match op {
            PlugInfo::Subunit(d) => (d.dst_plugs, d.src_plugs),
            _ => (0, 0),
        },
        Err(err) => {
            debug!(?subunit, %err, "skip plugs of subunit");
            (0, 0)
        }
    };

    (0..dst_plugs)
        .map(|i| BcoPlugLocation::new_for_subunit(subunit, PlugDirection::Input, i))
        .chain(
            (0..src_plugs)
                .map(|i| BcoPlugLocation::new_for_subunit(subunit, PlugDirection::Output, i)),
        )
        .collect()
}

fn func_blk_plug_locations<A: Ta1394Avc>(
    avc: &A,
    subunit: &AvcAddrSubunit,
    timeout_ms: u32,
) -> Vec<BcoPlugLocation> {
    let entries = match avc.get_func_blks(subunit, timeout_ms) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(?subunit, %err, "skip function blocks of subunit");
            return Vec::new();
        }
    };

    let mut locations = Vec::new();
    entries.iter().for_each(|entry| {
        let plugs = [
            (PlugDirection::Input, entry.input_plugs),
            (PlugDirection::Output, entry.output_plugs),
        ];
        plugs.iter().for_each(|&(direction, count)| {
            (0..count).for_each(|i| {
                locations.push(BcoPlugLocation::new_for_func_blk(
                    subunit,
                    direction,
                    entry.func_blk_type,
                    entry.func_blk_id,
                    i,
                ));
            });
        });
    });
    locations
}

fn describe_plugs<A: Ta1394Avc>(
    avc: &A,
    locations: &[BcoPlugLocation],
    timeout_ms: u32,
) -> Vec<PlugDescriptor> {
    locations
        .iter()
        .filter_map(|location| match describe_plug(avc, location, timeout_ms) {
            Ok(plug) => Some(plug),
            Err(err) => {
                debug!(?location, %err, "omit plug");
                None
            }
        })
        .collect()
}

fn describe_plug<A: Ta1394Avc>(
    avc: &A,
    location: &BcoPlugLocation,
    timeout_ms: u32,
) -> Result<PlugDescriptor, AvcError> {
    let plug_type = avc.get_plug_type(location, timeout_ms)?;
    let name = avc.get_plug_name(location, timeout_ms)?;

    let ch_count = avc.get_plug_ch_count(location, timeout_ms)?;
    let mut channels = Vec::with_capacity(ch_count as usize);
    for ch in 1..=ch_count {
        channels.push(avc.get_plug_ch_name(location, ch, timeout_ms)?);
    }

    let mut clusters = Vec::new();
    if plug_type == BcoPlugType::Isoc {
        let cluster_count = avc.get_plug_ch_positions(location, timeout_ms)?.len();
        for index in 1..=cluster_count {
            clusters.push(avc.get_plug_cluster_info(location, index as u8, timeout_ms)?);
        }
    }

    let mut plug = PlugDescriptor {
        location: *location,
        plug_type,
        name,
        channels,
        clusters,
        ..Default::default()
    };

    // The lack of the other end means no connection.
    if location.is_signal_destination() {
        match avc.get_plug_input(location, timeout_ms) {
            Ok(plug_addr) => plug.input_source = Some(BcoPlugLocation::from(&plug_addr)),
            Err(AvcError::NotImplemented) | Err(AvcError::Rejected) => (),
            Err(err) => return Err(err),
        }
    } else {
        match avc.get_plug_outputs(location, timeout_ms) {
            Ok(plug_addrs) => {
                plug.output_destinations = plug_addrs.iter().map(BcoPlugLocation::from).collect()
            }
            Err(AvcError::NotImplemented) | Err(AvcError::Rejected) => (),
            Err(err) => return Err(err),
        }
    }

    Ok(plug)
}
