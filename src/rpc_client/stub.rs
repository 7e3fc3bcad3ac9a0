//! Provides an implementation of an RPC client that returns stubbed responses.
//! Useful for testing.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rmpv::Value;

use crate::{SimError, StatisticsEngine};

use super::RpcClient;

/// A call as seen by the stub, in the order it was made.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: String,
    pub params: Vec<Value>,
}

enum StubResponse {
    Result(Value),
    Error(String),
}

pub(crate) struct StubRpcClient {
    responses: HashMap<String, StubResponse>,
    pub(crate) statistics: Option<Arc<StatisticsEngine>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl StubRpcClient {
    /// A stub that behaves like a healthy simulator: pings succeed, versions
    /// match, void calls return nil and every command reports success.
    pub fn new() -> Self {
        StubRpcClient {
            responses: HashMap::new(),
            statistics: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
        .respond("ping", Value::Boolean(true))
        .respond("getServerVersion", Value::from(1))
        .respond("getMinRequiredClientVersion", Value::from(1))
        .respond("enableApiControl", Value::Nil)
    }

    pub fn respond(mut self, method: &str, result: Value) -> Self {
        self.responses
            .insert(method.to_string(), StubResponse::Result(result));
        self
    }

    pub fn fail(mut self, method: &str, message: &str) -> Self {
        self.responses
            .insert(method.to_string(), StubResponse::Error(message.to_string()));
        self
    }

    /// Shared view of the recorded calls, usable after the stub has been moved.
    pub fn call_log(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        Arc::clone(&self.calls)
    }
}

impl RpcClient for StubRpcClient {
    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SimError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            params,
        });

        if let Some(statistics) = &self.statistics {
            statistics.increment_request_count();
        }

        match self.responses.get(method) {
            Some(StubResponse::Result(value)) => Ok(value.clone()),
            Some(StubResponse::Error(message)) => {
                if let Some(statistics) = &self.statistics {
                    statistics.increment_error_count();
                }
                Err(SimError::Rpc(message.clone()))
            }
            None => Ok(Value::Boolean(true)),
        }
    }
}
