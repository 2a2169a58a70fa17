use super::{EndpointCodec, Json, Request, Response, VERSION};
use crate::{
    context::Context,
    dispatcher::{AnyEndpointCodec, Dispatcher},
    endpoint::Endpoint,
    error::{code, Error, RemoteError, Result},
};
use std::{any::Any, sync::Arc};
use tracing::debug;

/// Dispatches JSON-RPC requests to registered endpoints by method name.
#[derive(Default)]
pub struct Server {
    dispatcher: Dispatcher<Json>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<Req, Resp>(&mut self, method: impl Into<String>, codec: EndpointCodec<Req, Resp>)
    where
        Req: Any + Default + Send,
        Resp: Any + Default + Send,
    {
        self.dispatcher.add(method, codec);
    }

    pub fn add_any(&mut self, method: impl Into<String>, codec: AnyEndpointCodec<Json>) {
        self.dispatcher.add_any(method, codec);
    }

    /// Answers one request document.
    ///
    /// Protocol failures become error responses; `Err` is only returned when
    /// the response itself cannot be serialized.
    pub async fn handle(&self, ctx: Context, body: &[u8]) -> Result<Vec<u8>> {
        let response = match serde_json::from_slice::<Json>(body) {
            Ok(document) => self.handle_document(ctx, document).await,
            Err(err) => {
                debug!(%err, "unparseable request");
                let err = RemoteError::new(code::PARSE_ERROR, err.to_string());
                Response::error(Json::Null, err)
            }
        };
        serde_json::to_vec(&response).map_err(Error::from)
    }

    async fn handle_document(&self, ctx: Context, document: Json) -> Response {
        let id = document.get("id").cloned().unwrap_or_default();
        match serde_json::from_value::<Request>(document) {
            Ok(request) => self.dispatch(ctx, request).await,
            Err(err) => {
                debug!(%err, "not a request object");
                let err = RemoteError::new(code::INVALID_REQUEST, err.to_string());
                Response::error(id, err)
            }
        }
    }

    async fn dispatch(&self, ctx: Context, request: Request) -> Response {
        let Request {
            jsonrpc,
            method,
            params,
            id,
        } = request;
        if jsonrpc != VERSION {
            let err = RemoteError::new(
                code::INVALID_REQUEST,
                format!("unsupported jsonrpc version {jsonrpc:?}"),
            );
            return Response::error(id, err);
        }
        match self.dispatcher.call(ctx, &method, params).await {
            Ok(result) => Response::result(id, result),
            Err(err) => {
                debug!(method = %method, %err, "call failed");
                Response::error(id, err.to_remote())
            }
        }
    }

    /// The server as a byte round trip, ready to hand to a [`Client`] or to
    /// register on another transport.
    ///
    /// [`Client`]: super::Client
    pub fn into_endpoint(self) -> Endpoint<Vec<u8>, Vec<u8>> {
        let server = Arc::new(self);
        Endpoint::new(move |ctx, body: Vec<u8>| {
            let server = server.clone();
            async move { server.handle(ctx, &body).await }
        })
    }
}
