use super::{Request, Response, ServerConfig};
use crate::{
    context::Context,
    dispatcher::{AnyEndpointCodec, Dispatcher, EndpointCodec},
    error::RemoteError,
};
use async_bincode::tokio::AsyncBincodeStream;
use futures::{SinkExt, StreamExt};
use std::{any::Any, io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::BufStream,
    net::{TcpListener, TcpStream},
    task,
};
use tracing::{debug, info, warn};

/// Serves registered endpoints over TCP.
#[derive(Default)]
pub struct Server {
    dispatcher: Dispatcher<Vec<u8>>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed endpoint with its payload codecs.
    pub fn add<Req, Resp>(
        &mut self,
        method: impl Into<String>,
        codec: EndpointCodec<Req, Resp, Vec<u8>>,
    ) where
        Req: Any + Default + Send,
        Resp: Any + Default + Send,
    {
        self.dispatcher.add(method, codec);
    }

    pub fn add_any(&mut self, method: impl Into<String>, codec: AnyEndpointCodec<Vec<u8>>) {
        self.dispatcher.add_any(method, codec);
    }

    async fn handle_request(self: Arc<Self>, ctx: Context, req: Request) -> Response {
        match req {
            Request::Ping => Response::Pong,
            Request::Methods => Response::Methods(self.dispatcher.methods()),
            Request::Call {
                method,
                payload,
                timeout_ms,
            } => {
                let ctx = match timeout_ms {
                    Some(ms) => ctx.with_timeout(Duration::from_millis(ms)),
                    None => ctx.child(),
                };
                let dispatched = ctx
                    .run(async {
                        Ok(self
                            .dispatcher
                            .call(ctx.clone(), &method, payload)
                            .await)
                    })
                    .await;
                let result = match dispatched {
                    Ok(result) => result.map_err(|err| {
                        debug!(method = %method, %err, "call failed");
                        err.to_remote()
                    }),
                    Err(err) => Err(RemoteError::from_error(&err)),
                };
                Response::Call(result)
            }
        }
    }

    async fn serve_connection(self: Arc<Self>, ctx: Context, sock: TcpStream, peer: SocketAddr) {
        let mut sock =
            AsyncBincodeStream::<_, Request, Response, _>::from(BufStream::new(sock)).for_async();
        loop {
            let request = tokio::select! {
                _ = ctx.done() => break,
                request = sock.next() => request,
            };
            let request = match request {
                Some(Ok(request)) => request,
                Some(Err(err)) => {
                    warn!(%peer, %err, "dropping connection after bad frame");
                    break;
                }
                None => break,
            };
            let response = self.clone().handle_request(ctx.clone(), request).await;
            if let Err(err) = sock.send(response).await {
                warn!(%peer, %err, "failed to send response");
                break;
            }
        }
        debug!(%peer, "connection closed");
    }

    /// Accepts connections on `listener` until `ctx` is cancelled.
    ///
    /// Cancelling `ctx` also cancels every call still in flight.
    pub async fn serve(self, listener: TcpListener, ctx: Context) -> io::Result<()> {
        let root_arc = Arc::new(self);
        info!(addr = %listener.local_addr()?, "serving");
        loop {
            let (sock, peer) = tokio::select! {
                _ = ctx.done() => break,
                accepted = listener.accept() => accepted?,
            };
            debug!(%peer, "accepted connection");
            task::spawn(root_arc.clone().serve_connection(ctx.child(), sock, peer));
        }
        info!("shutting down");
        Ok(())
    }

    pub async fn serve_tcp(self, config: ServerConfig) -> io::Result<()> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        self.serve(listener, Context::background()).await
    }
}
