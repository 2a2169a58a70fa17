use super::{default_decoder, default_encoder, Json, Request, Response, VERSION};
use crate::{
    adapter::adapt,
    codec::{reverse_adapt_decoder, reverse_adapt_encoder, AnyDecoder, AnyEncoder, Decoder, Encoder},
    context::Context,
    endpoint::{AnyEndpoint, Endpoint},
    error::{Error, RemoteError},
    types::Value,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    any::Any,
    marker::PhantomData,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// A JSON-RPC client for a single remote method.
pub struct Client<Req, Resp> {
    round_trip: Endpoint<Vec<u8>, Vec<u8>>,
    method: Arc<str>,
    encode: AnyEncoder<Json>,
    decode: AnyDecoder<Json>,
    next_id: Arc<AtomicU64>,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Client<Req, Resp>
where
    Req: Any + Default + Send,
    Resp: Any + Default + Send,
{
    /// A client using serde for params and result.
    pub fn new(round_trip: Endpoint<Vec<u8>, Vec<u8>>, method: impl Into<String>) -> Self
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        Self::with_codecs(round_trip, method, default_encoder(), default_decoder())
    }

    pub fn with_codecs(
        round_trip: Endpoint<Vec<u8>, Vec<u8>>,
        method: impl Into<String>,
        encode: Encoder<Req, Json>,
        decode: Decoder<Json, Resp>,
    ) -> Self {
        Self {
            round_trip,
            method: method.into().into(),
            encode: reverse_adapt_encoder(encode),
            decode: reverse_adapt_decoder(decode),
            next_id: Arc::new(AtomicU64::new(1)),
            _types: PhantomData,
        }
    }

    /// The untyped endpoint the typed one is built on.
    pub fn endpoint_any(&self) -> AnyEndpoint {
        let round_trip = self.round_trip.clone();
        let method = self.method.clone();
        let encode = self.encode.clone();
        let decode = self.decode.clone();
        let next_id = self.next_id.clone();
        Endpoint::new(move |ctx: Context, request: Value| {
            let id = next_id.fetch_add(1, Ordering::Relaxed);
            let call = encode.encode(&ctx, request).and_then(|params| {
                let request = Request {
                    jsonrpc: VERSION.to_owned(),
                    method: method.to_string(),
                    params,
                    id: id.into(),
                };
                Ok(serde_json::to_vec(&request)?)
            });
            let round_trip = round_trip.clone();
            let decode = decode.clone();
            async move {
                let body = round_trip.call(ctx.clone(), call?).await?;
                let response: Response = serde_json::from_slice(&body)?;
                if response.id != Json::from(id) {
                    return Err(Error::transport(format!(
                        "response id {} does not match request id {id}",
                        response.id
                    )));
                }
                if let Some(err) = response.error {
                    return Err(RemoteError::from(err).into());
                }
                decode.decode(&ctx, response.result.unwrap_or_default())
            }
        })
    }

    pub fn endpoint(&self) -> Endpoint<Req, Resp> {
        adapt(self.endpoint_any())
    }
}
