#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

#[macro_use]
mod tracing;

mod body;
mod encoding;
mod error;
/// Multipart body parts.
pub mod multipart;
/// Name/value parameter pairs.
pub mod param;
/// Connection-pool key strategies.
pub mod pool;
/// Proxy configuration types.
pub mod proxy;
mod query;
/// Authentication realms.
pub mod realm;
mod request;
mod signature;
pub(crate) mod url;

pub use body::{Body, BodyGenerator, EntityWriter};
pub use error::Error;
pub use multipart::{Part, PartValue};
pub use param::Param;
pub use pool::{DefaultPoolKey, PoolKeyStrategy};
pub use proxy::{Proxy, ProxyScheme};
pub use query::QueryEncoding;
pub use realm::{AuthScheme, Realm};
pub use request::{Request, RequestBuilder};
pub use signature::{BasicAuthCalculator, SignatureCalculator};
pub use url::{IntoUrl, ParseError, Url};

// ============================================================
// Common re-exports (the vocabulary types requests are built from)
// ============================================================

pub use http::Method;
/// Re-export the `http::header` module for header name constants.
pub use http::header;
pub use http::header::{HeaderMap, HeaderName, HeaderValue};

pub use bytes::Bytes;
pub use cookie::Cookie;
pub use futures_core::Stream;

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
