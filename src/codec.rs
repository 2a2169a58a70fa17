//! Typed encode/decode steps and their untyped counterparts.
//!
//! A transport turns its wire representation `W` into a request with a
//! [`Decoder`] and turns a response back into `W` with an [`Encoder`]. The
//! untyped layer only knows [`AnyDecoder`] and [`AnyEncoder`]; the four
//! adapters here cross between the two the same way endpoint adapters do.

use crate::{
    adapter::{call_typed, return_typed},
    context::Context,
    error::{Error, Result},
    types::Value,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{any::Any, fmt, sync::Arc};

pub struct Decoder<W, T> {
    f: Arc<dyn Fn(&Context, W) -> Result<T> + Send + Sync>,
}

pub struct Encoder<T, W> {
    f: Arc<dyn Fn(&Context, T) -> Result<W> + Send + Sync>,
}

pub type AnyDecoder<W> = Decoder<W, Value>;
pub type AnyEncoder<W> = Encoder<Value, W>;

impl<W, T> Decoder<W, T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, W) -> Result<T> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn decode(&self, ctx: &Context, wire: W) -> Result<T> {
        (self.f)(ctx, wire)
    }
}

impl<T, W> Encoder<T, W> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, T) -> Result<W> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn encode(&self, ctx: &Context, value: T) -> Result<W> {
        (self.f)(ctx, value)
    }
}

impl<W, T> Clone for Decoder<W, T> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<T, W> Clone for Encoder<T, W> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<W, T> fmt::Debug for Decoder<W, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Decoder").finish_non_exhaustive()
    }
}

impl<T, W> fmt::Debug for Encoder<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Encoder").finish_non_exhaustive()
    }
}

pub fn adapt_decoder<W, T>(decoder: AnyDecoder<W>) -> Decoder<W, T>
where
    W: 'static,
    T: Any + Default,
{
    Decoder::new(move |ctx, wire| return_typed(decoder.decode(ctx, wire)))
}

pub fn reverse_adapt_decoder<W, T>(decoder: Decoder<W, T>) -> AnyDecoder<W>
where
    W: 'static,
    T: Any + Send,
{
    Decoder::new(move |ctx, wire| decoder.decode(ctx, wire).map(Value::new))
}

pub fn adapt_encoder<T, W>(encoder: AnyEncoder<W>) -> Encoder<T, W>
where
    T: Any + Send,
    W: 'static,
{
    Encoder::new(move |ctx, value| encoder.encode(ctx, Value::new(value)))
}

pub fn reverse_adapt_encoder<T, W>(encoder: Encoder<T, W>) -> AnyEncoder<W>
where
    T: Any + Default,
    W: 'static,
{
    Encoder::new(move |ctx, value| {
        call_typed(value, |typed: T| encoder.encode(ctx, typed))
    })
}

/// Decodes a JSON document into `T`.
pub fn json_decoder<T>() -> Decoder<Vec<u8>, T>
where
    T: DeserializeOwned + 'static,
{
    Decoder::new(|_ctx, bytes: Vec<u8>| {
        serde_json::from_slice(&bytes).map_err(Error::from)
    })
}

/// Encodes `T` as a JSON document.
pub fn json_encoder<T>() -> Encoder<T, Vec<u8>>
where
    T: Serialize + 'static,
{
    Encoder::new(|_ctx, value: T| {
        serde_json::to_vec(&value).map_err(Error::from)
    })
}

/// Passes bytes through untouched.
pub fn raw_decoder() -> Decoder<Vec<u8>, Vec<u8>> {
    Decoder::new(|_ctx, bytes| Ok(bytes))
}

pub fn raw_encoder() -> Encoder<Vec<u8>, Vec<u8>> {
    Encoder::new(|_ctx, bytes| Ok(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
    struct Uppercase {
        s: String,
    }

    #[test]
    fn typed_decoder_survives_the_untyped_layer() {
        let any = reverse_adapt_decoder(json_decoder::<Uppercase>());
        let typed: Decoder<Vec<u8>, Uppercase> = adapt_decoder(any);
        let decoded = typed
            .decode(&Context::background(), br#"{"s":"hello"}"#.to_vec())
            .unwrap();
        assert_eq!(decoded, Uppercase { s: "hello".into() });
    }

    #[test]
    fn decoder_adapter_checks_the_decoded_type() {
        let any: AnyDecoder<Vec<u8>> = Decoder::new(|_ctx, _bytes: Vec<u8>| Ok(Value::new(3u8)));
        let err = adapt_decoder::<_, Uppercase>(any)
            .decode(&Context::background(), Vec::new())
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn decoder_adapter_maps_nil_to_zero_value() {
        let any: AnyDecoder<Vec<u8>> = Decoder::new(|_ctx, _bytes: Vec<u8>| Ok(Value::Nil));
        let decoded = adapt_decoder::<_, Uppercase>(any)
            .decode(&Context::background(), Vec::new())
            .unwrap();
        assert_eq!(decoded, Uppercase::default());
    }

    #[test]
    fn encoder_reverse_adapter_skips_encoder_on_mismatch() {
        let called = Arc::new(AtomicBool::new(false));
        let typed = Encoder::new({
            let called = called.clone();
            move |_ctx: &Context, n: u64| {
                called.store(true, Ordering::SeqCst);
                Ok(n.to_string())
            }
        });
        let err = reverse_adapt_encoder(typed)
            .encode(&Context::background(), Value::new(1u32))
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn encoder_reverse_adapter_encodes_zero_value_for_nil() {
        let any = reverse_adapt_encoder(json_encoder::<Uppercase>());
        let bytes = any.encode(&Context::background(), Value::Nil).unwrap();
        assert_eq!(bytes, br#"{"s":""}"#);
    }

    #[test]
    fn encoder_reverse_adapter_rejects_foreign_values() {
        let any = reverse_adapt_encoder(json_encoder::<Uppercase>());
        let err = any
            .encode(&Context::background(), Value::new("hello"))
            .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn encoder_adapter_boxes_the_value() {
        let any: AnyEncoder<String> =
            Encoder::new(|_ctx, value: Value| Ok(value.type_name().to_owned()));
        let typed = adapt_encoder::<u32, String>(any);
        assert_eq!(typed.encode(&Context::background(), 1).unwrap(), "u32");
    }

    #[test]
    fn raw_codecs_pass_bytes_through() {
        let ctx = Context::background();
        let any = reverse_adapt_decoder(raw_decoder());
        let bytes = adapt_decoder::<_, Vec<u8>>(any).decode(&ctx, vec![1, 2, 3]).unwrap();
        assert_eq!(raw_encoder().encode(&ctx, bytes).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn json_decoder_reports_codec_errors() {
        let err = json_decoder::<Uppercase>()
            .decode(&Context::background(), b"not json".to_vec())
            .unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }
}
