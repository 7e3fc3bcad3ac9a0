//! Encoding functions for the AirSim MessagePack-RPC protocol.

use rmpv::Value;
use serde::Serialize;

use crate::SimError;

/// Message type tag of an RPC request.
const REQUEST: u8 = 0;

/// Encodes a request frame `[0, msgid, method, params]`.
#[cfg(any(test, feature = "bench-internals"))]
pub fn encode_request(msgid: u32, method: &str, params: &[Value]) -> Result<Vec<u8>, SimError> {
    encode_request_inner(msgid, method, params)
}

/// Encodes a request frame `[0, msgid, method, params]`.
#[cfg(not(any(test, feature = "bench-internals")))]
pub(crate) fn encode_request(
    msgid: u32,
    method: &str,
    params: &[Value],
) -> Result<Vec<u8>, SimError> {
    encode_request_inner(msgid, method, params)
}

fn encode_request_inner(msgid: u32, method: &str, params: &[Value]) -> Result<Vec<u8>, SimError> {
    Ok(rmp_serde::to_vec(&(REQUEST, msgid, method, params))?)
}

/// Converts a tuple of call arguments into positional RPC parameters.
///
/// Structs are written as maps keyed by field name, so a [crate::Vector3r]
/// arrives as `{"x_val": .., "y_val": .., "z_val": ..}`.
pub(crate) fn encode_params<P: Serialize>(params: &P) -> Result<Vec<Value>, SimError> {
    let bytes = rmp_serde::to_vec_named(params)?;
    match rmpv::decode::read_value(&mut bytes.as_slice()) {
        Ok(Value::Array(params)) => Ok(params),
        Ok(other) => Err(SimError::Protocol(format!(
            "Parameters must encode as an array, got {}",
            other
        ))),
        Err(e) => Err(SimError::Protocol(format!("Invalid parameters: {}", e))),
    }
}
