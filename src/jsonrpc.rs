//! JSON-RPC 2.0 request handling over any byte transport.
//!
//! [`Server::handle`] turns one request document into one response document,
//! and [`Client`] sends requests through a round-trip endpoint, so the two can
//! be joined in process or put on either side of a real connection.

pub mod client;
pub mod server;

pub use client::Client;
pub use server::Server;

use crate::{
    codec::{Decoder, Encoder},
    error::{Error, RemoteError},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use serde_json::Value as Json;

pub const VERSION: &str = "2.0";

/// An endpoint with its params decoder and result encoder.
pub type EndpointCodec<Req, Resp> = crate::dispatcher::EndpointCodec<Req, Resp, Json>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub params: Json,
    #[serde(default)]
    pub id: Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    #[serde(default)]
    pub id: Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Json>,
}

impl Response {
    pub fn result(id: Json, result: Json) -> Self {
        Self {
            jsonrpc: VERSION.to_owned(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Json, error: RemoteError) -> Self {
        Self {
            jsonrpc: VERSION.to_owned(),
            result: None,
            error: Some(ErrorObject {
                code: error.code,
                message: error.message,
                data: None,
            }),
            id,
        }
    }
}

impl From<ErrorObject> for RemoteError {
    fn from(err: ErrorObject) -> Self {
        RemoteError::new(err.code, err.message)
    }
}

/// Deserializes params or results with serde.
pub fn default_decoder<T>() -> Decoder<Json, T>
where
    T: DeserializeOwned + 'static,
{
    Decoder::new(|_ctx, json: Json| {
        serde_json::from_value(json).map_err(Error::from)
    })
}

/// Serializes params or results with serde.
pub fn default_encoder<T>() -> Encoder<T, Json>
where
    T: Serialize + 'static,
{
    Encoder::new(|_ctx, value: T| {
        serde_json::to_value(value).map_err(Error::from)
    })
}
