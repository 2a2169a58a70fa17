use super::{ClientConfig, Request, Response};
use crate::{
    adapter::adapt,
    codec::{reverse_adapt_decoder, reverse_adapt_encoder, AnyDecoder, AnyEncoder, Decoder, Encoder},
    context::Context,
    endpoint::{AnyEndpoint, Endpoint},
    error::{Error, Result},
};
use async_bincode::{tokio::AsyncBincodeStream, AsyncDestination};
use futures::{SinkExt, StreamExt};
use std::{any::Any, sync::Arc};
use tokio::{io::BufStream, net::TcpStream};
use tracing::trace;

type Connection = AsyncBincodeStream<BufStream<TcpStream>, Response, Request, AsyncDestination>;

/// Calls methods on a remote [`Server`](super::Server).
///
/// Each call opens its own connection.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    async fn connect(config: &ClientConfig) -> Result<Connection> {
        let sock = TcpStream::connect(config.addr)
            .await
            .map_err(Error::transport)?;
        let sock = BufStream::new(sock);
        let sock = AsyncBincodeStream::from(sock).for_async();
        Ok(sock)
    }

    /// Narrows `ctx` to the configured request timeout.
    fn scoped(config: &ClientConfig, ctx: Context) -> Context {
        match config.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    async fn send_recv(config: Arc<ClientConfig>, ctx: Context, req: Request) -> Result<Response> {
        let ctx = Self::scoped(&config, ctx);
        ctx.run(async {
            let mut sock = Self::connect(&config).await?;
            sock.send(req).await.map_err(Error::transport)?;
            sock.next()
                .await
                .ok_or_else(|| Error::transport("connection closed mid-call"))?
                .map_err(Error::transport)
        })
        .await
    }

    pub async fn ping(&self, ctx: Context) -> Result<()> {
        match Self::send_recv(self.config.clone(), ctx, Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Names of the methods the server has registered.
    pub async fn methods(&self, ctx: Context) -> Result<Vec<String>> {
        match Self::send_recv(self.config.clone(), ctx, Request::Methods).await? {
            Response::Methods(methods) => Ok(methods),
            other => Err(unexpected(&other)),
        }
    }

    /// An untyped endpoint calling `method` on the server.
    pub fn endpoint_any(
        &self,
        method: impl Into<String>,
        encode: AnyEncoder<Vec<u8>>,
        decode: AnyDecoder<Vec<u8>>,
    ) -> AnyEndpoint {
        let config = self.config.clone();
        let method: Arc<str> = method.into().into();
        Endpoint::new(move |ctx, request| {
            let config = config.clone();
            let method = method.clone();
            let encode = encode.clone();
            let decode = decode.clone();
            async move {
                let ctx = Self::scoped(&config, ctx);
                let payload = encode.encode(&ctx, request)?;
                trace!(method = &*method, len = payload.len(), "calling");
                let req = Request::Call {
                    method: method.to_string(),
                    payload,
                    timeout_ms: ctx.remaining().map(|left| left.as_millis() as u64),
                };
                match Self::send_recv(config, ctx.clone(), req).await? {
                    Response::Call(Ok(payload)) => decode.decode(&ctx, payload),
                    // The server may notice the shared deadline first.
                    Response::Call(Err(remote)) => Err(match ctx.err() {
                        Some(err) if remote.is_context_error() => err,
                        _ => remote.into(),
                    }),
                    other => Err(unexpected(&other)),
                }
            }
        })
    }

    /// A typed endpoint calling `method` on the server.
    pub fn endpoint<Req, Resp>(
        &self,
        method: impl Into<String>,
        encode: Encoder<Req, Vec<u8>>,
        decode: Decoder<Vec<u8>, Resp>,
    ) -> Endpoint<Req, Resp>
    where
        Req: Any + Default + Send,
        Resp: Any + Default + Send,
    {
        adapt(self.endpoint_any(
            method,
            reverse_adapt_encoder(encode),
            reverse_adapt_decoder(decode),
        ))
    }
}

fn unexpected(response: &Response) -> Error {
    Error::transport(format!("unexpected response {response:?}"))
}
