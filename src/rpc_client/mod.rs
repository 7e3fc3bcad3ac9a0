use rmpv::Value;

use crate::SimError;

pub(crate) mod tcp;

#[cfg(test)]
pub(crate) mod stub;

/// Response to a MessagePack-RPC request
#[derive(Debug)]
pub(crate) struct RpcResponse {
    pub msgid: u32,
    pub error: Value,
    pub result: Value,
}

impl From<RpcResponse> for Result<Value, SimError> {
    fn from(val: RpcResponse) -> Self {
        match val.error {
            Value::Nil => Ok(val.result),
            error => Err(SimError::Rpc(match error.as_str() {
                Some(message) => message.to_string(),
                None => error.to_string(),
            })),
        }
    }
}

/// Trait for calling methods on the AirSim RPC server.
///
/// A call blocks until the server answers, which for flight commands
/// means until the vehicle has finished the maneuver.
pub(crate) trait RpcClient: Send {
    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SimError>;
}
