//! Decoding functions for the AirSim MessagePack-RPC protocol.

use std::io::ErrorKind;

use rmpv::Value;
use rmpv::decode::{Error as DecodeError, read_value_with_max_depth};

use crate::SimError;
use crate::rpc_client::RpcResponse;


/// Message type tag of an RPC response.
const RESPONSE: u64 = 1;

/// Deepest container nesting accepted in a response. AirSim's replies nest a
/// handful of levels; anything past this is malformed.
pub(crate) const MAX_DEPTH: usize = 64;

/// Decodes one value from the front of `bytes`.
///
/// Returns `Ok(None)` when `bytes` ends before the value does, otherwise the
/// value and the number of bytes it occupied.
pub(crate) fn decode_value(bytes: &[u8]) -> Result<Option<(Value, usize)>, SimError> {
    let mut remaining = bytes;
    match read_value_with_max_depth(&mut remaining, MAX_DEPTH) {
        Ok(value) => Ok(Some((value, bytes.len() - remaining.len()))),
        Err(DecodeError::InvalidMarkerRead(e)) | Err(DecodeError::InvalidDataRead(e))
            if e.kind() == ErrorKind::UnexpectedEof =>
        {
            Ok(None)
        }
        Err(DecodeError::DepthLimitExceeded) => Err(SimError::Protocol(format!(
            "Message nested deeper than {} levels",
            MAX_DEPTH
        ))),
        Err(e) => Err(SimError::Protocol(format!("Invalid MessagePack: {}", e))),
    }
}

/// Decodes a response frame `[1, msgid, error, result]` from the front of `bytes`.
///
/// Returns `Ok(None)` when `bytes` holds only part of a frame.
pub(crate) fn decode_response(bytes: &[u8]) -> Result<Option<(RpcResponse, usize)>, SimError> {
    let Some((value, consumed)) = decode_value(bytes)? else {
        return Ok(None);
    };

    let mut parts = match value {
        Value::Array(parts) => parts,
        other => {
            return Err(SimError::Protocol(format!(
                "Expected response array, got {}",
                other
            )));
        }
    };
    if parts.len() != 4 {
        return Err(SimError::Protocol(format!(
            "Expected 4 response elements, got {}",
            parts.len()
        )));
    }
    if parts[0].as_u64() != Some(RESPONSE) {
        return Err(SimError::Protocol(format!(
            "Unexpected message type {}",
            parts[0]
        )));
    }
    let msgid = parts[1]
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| SimError::Protocol(format!("Invalid message id {}", parts[1])))?;

    let result = parts.pop().unwrap_or(Value::Nil);
    let error = parts.pop().unwrap_or(Value::Nil);

    Ok(Some((
        RpcResponse {
            msgid,
            error,
            result,
        },
        consumed,
    )))
}
