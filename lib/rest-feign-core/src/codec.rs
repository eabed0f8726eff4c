//! Request encoding and response decoding.
//!
//! Every proxy owns a [`RequestCodec`]: the encoder turns `#[body]` parameters into bytes, the
//! decoder turns 2xx response bodies into the declared return type. JSON is the default pair.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ContentType {
    /// `application/json`
    #[display("application/json")]
    Json,
    /// `text/plain`
    #[display("text/plain")]
    PlainText,
    /// `application/octet-stream`
    #[display("application/octet-stream")]
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

/// Serializes request bodies.
pub trait Encoder: Send + Sync {
    /// Serialize a value into a request body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Encode`] if serialization fails.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes>;

    /// Content type announced for encoded bodies.
    fn content_type(&self) -> ContentType;
}

/// Deserializes response bodies.
pub trait Decoder: Send + Sync {
    /// Deserialize a response body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decode`] naming the failing path.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON encoder backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    /// Encoder producing indented JSON.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Encoder for JsonEncoder {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(Bytes::from(bytes))
    }

    fn content_type(&self) -> ContentType {
        ContentType::Json
    }
}

/// JSON decoder with path-aware error messages.
///
/// Uses `serde_path_to_error` so a failure reports where it happened, e.g. `items[2].price`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| crate::Error::decode(e.path().to_string(), e.inner().to_string()))
    }
}

/// Encoder/decoder pair used by a client proxy.
#[derive(Debug, Clone, Default)]
pub struct RequestCodec<E = JsonEncoder, D = JsonDecoder> {
    encoder: E,
    decoder: D,
}

impl<E: Encoder, D: Decoder> RequestCodec<E, D> {
    /// Pair an encoder with a decoder.
    #[must_use]
    pub const fn new(encoder: E, decoder: D) -> Self {
        Self { encoder, decoder }
    }

    /// The body encoder.
    #[must_use]
    pub const fn encoder(&self) -> &E {
        &self.encoder
    }

    /// The response decoder.
    #[must_use]
    pub const fn decoder(&self) -> &D {
        &self.decoder
    }
}
