//! Provides an implementation of an RPC client that talks MessagePack-RPC over TCP.

use std::{
    cell::{Cell, RefCell},
    io::{Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    sync::Arc,
};

use log::{debug, warn};
use rmpv::Value;

use crate::decoders::decode_response;
use crate::encoders::encode_request;
use crate::vehicle::airsim::Configuration;
use crate::{SimError, StatisticsEngine};

use super::{RpcClient, RpcResponse};


const READ_CHUNK_SIZE: usize = 4096;

/// MessagePack-RPC client holding the single connection to the simulator.
///
/// AirSim answers requests on the connection they arrived on, so one
/// stream carries the whole session and is closed when the client is dropped.
pub(crate) struct TcpRpcClient {
    statistics: Arc<StatisticsEngine>,
    connection: RefCell<Connection>,
    next_msgid: Cell<u32>,
}

struct Connection {
    stream: TcpStream,
    /// Bytes received but not yet decoded into a response.
    buffer: Vec<u8>,
}

impl RpcClient for TcpRpcClient {
    /// Calls `method` on the simulator and waits for its result.
    ///
    /// # Arguments
    /// * `method` - Name of the remote procedure, e.g. `moveOnPath`.
    /// * `params` - Positional arguments.
    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SimError> {
        let msgid = self.next_msgid();
        debug!("Calling {} (msgid {})", method, msgid);

        let result = encode_request(msgid, method, &params)
            .and_then(|request| self.send_request(&request))
            .and_then(|_| {
                self.statistics.increment_request_count();
                self.read_response(msgid)
            })
            .and_then(|response| -> Result<Value, SimError> { response.into() });

        if let Err(e) = &result {
            warn!("Call to {} failed: {}", method, e);
            self.statistics.increment_error_count();
        }
        result
    }
}

impl TcpRpcClient {
    /// Opens the connection to the simulator.
    pub fn new(
        configuration: &Configuration,
        statistics: Arc<StatisticsEngine>,
    ) -> Result<Self, SimError> {
        let stream = connect(configuration)?;
        stream.set_read_timeout(Some(configuration.request_timeout))?;
        stream.set_nodelay(true)?;

        Ok(TcpRpcClient {
            statistics,
            connection: RefCell::new(Connection {
                stream,
                buffer: Vec::with_capacity(READ_CHUNK_SIZE),
            }),
            next_msgid: Cell::new(0),
        })
    }

    fn next_msgid(&self) -> u32 {
        let msgid = self.next_msgid.get();
        self.next_msgid.set(msgid.wrapping_add(1));
        msgid
    }

    fn send_request(&self, request: &[u8]) -> Result<(), SimError> {
        let mut connection = self.connection.borrow_mut();
        connection.stream.write_all(request)?;
        connection.stream.flush()?;
        Ok(())
    }

    /// Reads until the response to `msgid` has arrived.
    fn read_response(&self, msgid: u32) -> Result<RpcResponse, SimError> {
        let mut connection = self.connection.borrow_mut();
        let Connection { stream, buffer } = &mut *connection;

        loop {
            let decoded = match decode_response(buffer.as_slice()) {
                Ok(decoded) => decoded,
                Err(e) => {
                    // Nothing after a malformed frame can be trusted.
                    buffer.clear();
                    return Err(e);
                }
            };
            if let Some((response, consumed)) = decoded {
                buffer.drain(..consumed);
                if response.msgid == msgid {
                    return Ok(response);
                }
                warn!(
                    "Discarding response {} while waiting for {}",
                    response.msgid, msgid
                );
                continue;
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = stream.read(&mut chunk)?;
            if read == 0 {
                return Err(SimError::Connection(
                    "Simulator closed the connection".into(),
                ));
            }
            buffer.extend_from_slice(&chunk[..read]);
        }
    }
}

fn connect(configuration: &Configuration) -> Result<TcpStream, SimError> {
    let host = &configuration.simulator_host;
    let addresses: Vec<SocketAddr> = host
        .to_socket_addrs()
        .map_err(|e| SimError::Connection(format!("Invalid simulator host '{}': {}", host, e)))?
        .collect();

    let mut last_error = None;
    for address in addresses {
        match TcpStream::connect_timeout(&address, configuration.connect_timeout) {
            Ok(stream) => {
                debug!("Connected to simulator at {}", address);
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(SimError::Connection(match last_error {
        Some(e) => format!("Failed to connect to simulator at {}: {}", host, e),
        None => format!("Simulator host '{}' did not resolve", host),
    }))
}
