//! Request signing hook.
//!
//! A [`SignatureCalculator`] runs as the last mutation step of
//! [`RequestBuilder::build()`](crate::RequestBuilder::build), after the
//! final URL is assembled but before charset and content-length
//! derivation.  It receives the base URL (scheme, host, explicit port,
//! path -- no query, no user-info) and the request under construction,
//! and is expected to confine its side effects to the request headers.

use crate::request::Request;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Computes and injects an authentication signature into a request.
pub trait SignatureCalculator: Send + Sync {
    /// Sign `request`.  `base_url` is the request URL reduced to
    /// `scheme://host[:port]path`.  Implementations mutate headers via
    /// [`Request::headers_mut()`] and nothing else.
    fn calculate(&self, base_url: &str, request: &mut Request);
}

/// A [`SignatureCalculator`] that injects an `Authorization: Basic ...`
/// header.
#[derive(Debug, Clone)]
pub struct BasicAuthCalculator {
    username: String,
    password: String,
}

impl BasicAuthCalculator {
    /// Create a calculator for the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicAuthCalculator {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl SignatureCalculator for BasicAuthCalculator {
    fn calculate(&self, _base_url: &str, request: &mut Request) {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        // Base64 output is always a valid header value.
        if let Ok(value) = http::HeaderValue::try_from(format!("Basic {token}")) {
            request
                .headers_mut()
                .insert(http::header::AUTHORIZATION, value);
        }
    }
}
