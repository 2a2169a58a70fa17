//! A minimal TCP transport framed with `async-bincode`.
//!
//! Payloads are opaque bytes; what they mean is up to the [`Decoder`] and
//! [`Encoder`] registered for each method.
//!
//! [`Decoder`]: crate::codec::Decoder
//! [`Encoder`]: crate::codec::Encoder

pub mod client;
pub mod server;

pub use client::Client;
pub use server::Server;

use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum Request {
    Ping,
    Methods,
    Call {
        method: String,
        payload: Vec<u8>,
        /// Milliseconds left on the caller's deadline.
        timeout_ms: Option<u64>,
    },
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum Response {
    Pong,
    Methods(Vec<String>),
    Call(Result<Vec<u8>, RemoteError>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: (Ipv4Addr::UNSPECIFIED, 8888).into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub addr: SocketAddr,
    /// Applied to every call on top of the caller's own deadline.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: (Ipv4Addr::LOCALHOST, 8888).into(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }
}
