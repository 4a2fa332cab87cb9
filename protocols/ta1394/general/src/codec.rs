// SPDX-License-Identifier: MIT
// Copyright (c) 2022 Takashi Sakamoto

//! The codec of AV/C transaction over the transport.
//!
//! AvcCodec structure frames the command, waits for the response with the same address, opcode
//! and leading operands within the timeout, then classifies the status code in the response. The
//! number of leading operands to be echoed is declared by each operation. Just one transaction is
//! outstanding at a time per codec.

use {
    super::*,
    std::{
        convert::TryFrom,
        sync::Mutex,
        time::{Duration, Instant},
    },
    tracing::{debug, debug_span},
};

/// The codec of AV/C transaction over the transport.
#[derive(Debug)]
pub struct AvcCodec<T: Ta1394Transport> {
    transport: T,
    timeout_ms: u32,
    lock: Mutex<()>,
}

impl<T: Ta1394Transport> AvcCodec<T> {
    /// The timeout by default.
    pub const DEFAULT_TIMEOUT_MS: u32 = 200;

    const CMD_TYPE_MASK: u8 = 0x0f;
    const FRAME_SIZE_MIN: usize = 3;

    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            lock: Default::default(),
        }
    }

    /// Configure the timeout used by operations without explicit timeout.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Transmit the command frame of the type, then return the response frame when the status
    /// code is expected for the type.
    pub fn exchange(
        &self,
        kind: AvcCmdType,
        frame: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, AvcError> {
        self.exchange_with_echo(kind, frame, 0, timeout)
    }

    /// Same as `exchange()`, but the response should also echo the given number of leading
    /// operands. The other responses are discarded as stray ones.
    pub fn exchange_with_echo(
        &self,
        kind: AvcCmdType,
        frame: &[u8],
        echo_length: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>, AvcError> {
        if frame.len() < Self::FRAME_SIZE_MIN || frame.len() > Self::FRAME_SIZE {
            Err(AvcCmdBuildError::InvalidOperands)?;
        }
        if let AvcCmdType::Reserved(_) = kind {
            Err(AvcCmdBuildError::InvalidCommandType)?;
        }
        if AvcCmdType::from(frame[0] & Self::CMD_TYPE_MASK) != kind {
            Err(AvcCmdBuildError::InvalidCommandType)?;
        }

        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

        // The lock is released even if the other thread panics in the transaction.
        let _guard = self.lock.lock().unwrap_or_else(|err| err.into_inner());

        let span = debug_span!("avc", ?kind, addr = frame[1], opcode = frame[2]);
        let _enter = span.enter();
        debug!(req = ?frame);

        let deadline = Instant::now() + timeout;
        let mut resp = self
            .transport
            .fcp_exchange(frame, timeout)
            .map_err(|err| transport_error(err, timeout_ms))?;

        // The address, the opcode, and the leading operands.
        let echo = &frame[1..frame.len().min(Self::FRAME_SIZE_MIN + echo_length)];

        loop {
            if resp.len() < Self::FRAME_SIZE_MIN || !resp[1..].starts_with(echo) {
                debug!(?resp, "discard response for the other command");
            } else {
                let rcode = AvcRespCode::from(resp[0] & Self::RESP_CODE_MASK);
                if rcode == AvcRespCode::Interim {
                    debug!(?resp, "wait for final response");
                } else {
                    let res = classify_response(kind, rcode);
                    debug!(?resp, ?res);
                    return res.map(|_| resp);
                }
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .filter(|remaining| *remaining > Duration::ZERO)
                .ok_or(AvcError::Timeout(timeout_ms))?;
            resp = self
                .transport
                .fcp_receive(remaining)
                .map_err(|err| transport_error(err, timeout_ms))?;
        }
    }
}

fn transport_error(err: TransportError, timeout_ms: u32) -> AvcError {
    match err {
        TransportError::Timeout => AvcError::Timeout(timeout_ms),
        TransportError::Io(msg) => AvcError::TransportIo(msg),
    }
}

impl<T: Ta1394Transport> Ta1394Avc for AvcCodec<T> {
    fn transaction(&self, command_frame: &[u8], timeout_ms: u32) -> Result<Vec<u8>, AvcError> {
        let kind = command_frame
            .first()
            .map(|&ctype| AvcCmdType::from(ctype & Self::CMD_TYPE_MASK))
            .ok_or(AvcCmdBuildError::InvalidOperands)?;
        self.exchange(kind, command_frame, Duration::from_millis(timeout_ms as u64))
    }

    fn echoed_transaction(
        &self,
        command_frame: &[u8],
        echo_length: usize,
        timeout_ms: u32,
    ) -> Result<Vec<u8>, AvcError> {
        let kind = command_frame
            .first()
            .map(|&ctype| AvcCmdType::from(ctype & Self::CMD_TYPE_MASK))
            .ok_or(AvcCmdBuildError::InvalidOperands)?;
        let timeout = Duration::from_millis(timeout_ms as u64);
        self.exchange_with_echo(kind, command_frame, echo_length, timeout)
    }
}
