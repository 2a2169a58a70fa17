use crate::{
    adapter::{adapt, reverse_adapt},
    codec::{
        adapt_decoder, adapt_encoder, reverse_adapt_decoder, reverse_adapt_encoder, Decoder,
        Encoder,
    },
    context::Context,
    endpoint::Endpoint,
    error::{code, Error, RemoteError},
    types::Value,
};
use std::{any::Any, collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::trace;

/// A server endpoint together with the codecs that connect it to the wire
/// representation `W`.
pub struct EndpointCodec<Req, Resp, W> {
    pub endpoint: Endpoint<Req, Resp>,
    pub decode: Decoder<W, Req>,
    pub encode: Encoder<Resp, W>,
}

pub type AnyEndpointCodec<W> = EndpointCodec<Value, Value, W>;

impl<Req, Resp, W> EndpointCodec<Req, Resp, W> {
    pub fn new(
        endpoint: Endpoint<Req, Resp>,
        decode: Decoder<W, Req>,
        encode: Encoder<Resp, W>,
    ) -> Self {
        Self {
            endpoint,
            decode,
            encode,
        }
    }
}

impl<Req, Resp, W> Clone for EndpointCodec<Req, Resp, W> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            decode: self.decode.clone(),
            encode: self.encode.clone(),
        }
    }
}

pub fn adapt_endpoint_codec<Req, Resp, W>(
    codec: AnyEndpointCodec<W>,
) -> EndpointCodec<Req, Resp, W>
where
    Req: Any + Default + Send,
    Resp: Any + Default + Send,
    W: 'static,
{
    EndpointCodec {
        endpoint: adapt(codec.endpoint),
        decode: adapt_decoder(codec.decode),
        encode: adapt_encoder(codec.encode),
    }
}

pub fn reverse_adapt_endpoint_codec<Req, Resp, W>(
    codec: EndpointCodec<Req, Resp, W>,
) -> AnyEndpointCodec<W>
where
    Req: Any + Default + Send,
    Resp: Any + Default + Send,
    W: 'static,
{
    EndpointCodec {
        endpoint: reverse_adapt(codec.endpoint),
        decode: reverse_adapt_decoder(codec.decode),
        encode: reverse_adapt_encoder(codec.encode),
    }
}

/// Maps method names to untyped [`EndpointCodec`]s.
///
/// Typed codecs are registered with [`add`](Dispatcher::add) and stored
/// reverse-adapted; [`call`](Dispatcher::call) runs decode, endpoint, and
/// encode for one request.
pub struct Dispatcher<W> {
    routes: BTreeMap<String, Arc<AnyEndpointCodec<W>>>,
}

impl<W> Default for Dispatcher<W> {
    fn default() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }
}

impl<W> Dispatcher<W>
where
    W: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<Req, Resp>(&mut self, method: impl Into<String>, codec: EndpointCodec<Req, Resp, W>)
    where
        Req: Any + Default + Send,
        Resp: Any + Default + Send,
    {
        self.add_any(method, reverse_adapt_endpoint_codec(codec));
    }

    pub fn add_any(&mut self, method: impl Into<String>, codec: AnyEndpointCodec<W>) {
        self.routes.insert(method.into(), Arc::new(codec));
    }

    pub fn contains(&self, method: &str) -> bool {
        self.routes.contains_key(method)
    }

    pub fn methods(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    pub async fn call(&self, ctx: Context, method: &str, wire: W) -> Result<W, DispatchError> {
        let route = self
            .routes
            .get(method)
            .ok_or_else(|| DispatchError::NoSuchMethod(method.to_owned()))?
            .clone();
        trace!(method, "dispatching");
        let request = route
            .decode
            .decode(&ctx, wire)
            .map_err(DispatchError::Decode)?;
        let response = route
            .endpoint
            .call(ctx.clone(), request)
            .await
            .map_err(DispatchError::Endpoint)?;
        route
            .encode
            .encode(&ctx, response)
            .map_err(DispatchError::Encode)
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no method named {0:?}")]
    NoSuchMethod(String),

    #[error("decoding request: {0}")]
    Decode(#[source] Error),

    #[error(transparent)]
    Endpoint(Error),

    #[error("encoding response: {0}")]
    Encode(#[source] Error),
}

impl DispatchError {
    pub fn to_remote(&self) -> RemoteError {
        match self {
            DispatchError::NoSuchMethod(_) => {
                RemoteError::new(code::METHOD_NOT_FOUND, self.to_string())
            }
            DispatchError::Decode(err) if !err.is_type_mismatch() => {
                RemoteError::new(code::INVALID_PARAMS, self.to_string())
            }
            DispatchError::Decode(err)
            | DispatchError::Endpoint(err)
            | DispatchError::Encode(err) => RemoteError::from_error(err),
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            DispatchError::Decode(err)
            | DispatchError::Endpoint(err)
            | DispatchError::Encode(err) => err,
            DispatchError::NoSuchMethod(_) => Error::Remote(self.to_remote()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{json_decoder, json_encoder};

    fn dispatcher() -> Dispatcher<Vec<u8>> {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add(
            "count",
            EndpointCodec::new(
                Endpoint::new(|_ctx, s: String| async move {
                    Ok(s.chars().count() as u64)
                }),
                json_decoder(),
                json_encoder(),
            ),
        );
        dispatcher
    }

    #[tokio::test]
    async fn calls_through_codecs() {
        let out = dispatcher()
            .call(Context::background(), "count", br#""hello""#.to_vec())
            .await
            .unwrap();
        assert_eq!(out, b"5");
    }

    #[tokio::test]
    async fn unknown_method() {
        let err = dispatcher()
            .call(Context::background(), "nope", Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_remote().code, code::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn undecodable_params() {
        let err = dispatcher()
            .call(Context::background(), "count", b"12".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Decode(_)));
        assert_eq!(err.to_remote().code, code::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn mismatched_untyped_route() {
        let mut dispatcher = dispatcher();
        dispatcher.add_any(
            "broken",
            EndpointCodec::new(
                Endpoint::new(|_ctx, _request: Value| async { Ok(Value::new(1.5f64)) }),
                Decoder::new(|_ctx, _wire: Vec<u8>| Ok(Value::Nil)),
                reverse_adapt_encoder(json_encoder::<u64>()),
            ),
        );
        let err = dispatcher
            .call(Context::background(), "broken", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Encode(_)));
        assert_eq!(err.to_remote().code, code::TYPE_MISMATCH);
    }

    #[test]
    fn lists_methods() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.methods(), ["count"]);
        assert!(dispatcher.contains("count"));
        assert!(!dispatcher.contains("nope"));
    }

    #[tokio::test]
    async fn untyped_codec_adapts_back_to_typed() {
        let typed = EndpointCodec::new(
            Endpoint::new(|_ctx, n: u32| async move { Ok(n * 2) }),
            json_decoder(),
            json_encoder(),
        );
        let back: EndpointCodec<u32, u32, Vec<u8>> =
            adapt_endpoint_codec(reverse_adapt_endpoint_codec(typed));
        let ctx = Context::background();
        let n = back.decode.decode(&ctx, b"21".to_vec()).unwrap();
        let doubled = back.endpoint.call(ctx.clone(), n).await.unwrap();
        assert_eq!(back.encode.encode(&ctx, doubled).unwrap(), b"42");
    }
}
