//! Error type for reqbase.
//!
//! Provides [`Error`] with kind query methods:
//! [`is_builder()`](Error::is_builder), [`is_decode()`](Error::is_decode),
//! and [`is_body()`](Error::is_body), plus [`url()`](Error::url) for the
//! request URL the failure relates to, when known.

use crate::url::Url;
use std::fmt;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type for request construction.
///
/// Errors carry a `kind` classification that powers the
/// `is_builder()` / `is_decode()` / `is_body()` query methods.
///
/// When a request URL is available, it is included in the `Display` output
/// for diagnostics.
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) message: String,
    pub(crate) source: Option<BoxError>,
    pub(crate) url: Option<Box<Url>>,
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    /// Builder misconfiguration: invalid URL, unsupported scheme at build
    /// time, invalid header name or value.
    Builder,
    /// Malformed percent-encoding encountered while composing the final
    /// query string.
    Decode,
    /// Request body failure surfaced by a transport draining a streaming
    /// [`Body`](crate::Body).
    Body,
}

impl Error {
    /// Returns `true` if this is a builder error.
    pub fn is_builder(&self) -> bool {
        matches!(self.kind, ErrorKind::Builder)
    }

    /// Returns `true` if this is a percent-decoding error.
    ///
    /// Produced when a raw query string carries a malformed percent
    /// escape and the builder is asked to re-encode it
    /// ([`QueryEncoding::Encoded`](crate::QueryEncoding::Encoded)).
    pub fn is_decode(&self) -> bool {
        matches!(self.kind, ErrorKind::Decode)
    }

    /// Returns `true` if this is a body error.
    pub fn is_body(&self) -> bool {
        matches!(self.kind, ErrorKind::Body)
    }

    /// Returns the request URL associated with this error, if available.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_deref()
    }

    /// Strips the URL from this error, returning the error without a URL.
    #[must_use]
    pub fn without_url(mut self) -> Self {
        self.url = None;
        self
    }

    /// Attach a request URL to this error (builder pattern).
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(Box::new(url));
        self
    }

    /// Attach a source error (builder pattern).
    ///
    /// Stores the underlying cause so that
    /// [`std::error::Error::source`] returns it, making error chains
    /// inspectable by `anyhow`, `eyre`, and manual walks.
    #[must_use]
    pub(crate) fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    // -- Internal constructors --

    /// Shared constructor for simple error kinds (no source, no URL).
    fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            source: None,
            url: None,
        }
    }

    /// Create a builder-phase error.
    pub(crate) fn builder(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Builder, msg)
    }

    /// Create a percent-decoding error.
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Decode, msg)
    }

    /// Create a body error.
    pub(crate) fn body(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Body, msg)
    }
}

impl fmt::Display for Error {
    /// A kind-based prefix, then ` for url (...)` when the URL is known,
    /// then the message.  The source error detail is available via
    /// [`std::error::Error::source`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Builder => f.write_str("builder error")?,
            ErrorKind::Decode => f.write_str("error decoding query string")?,
            ErrorKind::Body => f.write_str("request body error")?,
        }
        if let Some(url) = &self.url {
            write!(f, " for url ({url})")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("url", &self.url)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

impl From<crate::url::ParseError> for Error {
    fn from(e: crate::url::ParseError) -> Self {
        Error::builder("invalid URL").with_source(e)
    }
}

// Ensure Error is Send + Sync so it can cross task boundaries.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::IntoUrlSealed;
    use std::error::Error as StdError;

    #[test]
    fn error_display_format() {
        // Display leads with the kind-based prefix, then the detail.
        let cases: Vec<(&str, Error, &str)> = vec![
            ("builder", Error::builder("bad config"), "builder error: bad config"),
            ("decode", Error::decode("bad escape"), "error decoding query string: bad escape"),
            ("body", Error::body("stream failed"), "request body error: stream failed"),
            (
                "builder_with_url",
                Error::builder("unsupported URL scheme 'ftp'")
                    .with_url("ftp://example.com/file".into_url().unwrap()),
                "builder error for url (ftp://example.com/file): unsupported URL scheme 'ftp'",
            ),
        ];

        for (label, err, expected) in &cases {
            assert_eq!(err.to_string(), *expected, "error display: {label}");
        }
    }

    /// Each `ErrorKind` has exactly one `is_*` query method that returns
    /// `true`; all other `is_*` methods return `false`.
    #[test]
    fn error_kind_exclusivity_table() {
        // (error, check, label) -- one entry per ErrorKind.  The table
        // doubles as the cross-check matrix: for each error, every other
        // entry's function pointer must return false.
        type TestCase<'a> = (Error, fn(&Error) -> bool, &'a str);
        let cases: Vec<TestCase> = vec![
            (Error::builder("b"), Error::is_builder, "builder"),
            (Error::decode("d"), Error::is_decode, "decode"),
            (Error::body("s"), Error::is_body, "body"),
        ];

        for (err, check, label) in &cases {
            assert!(check(err), "{label}: own is_*() should be true");
            for (_, other_check, other_label) in &cases {
                if *other_label != *label {
                    assert!(!other_check(err), "{label}: is_{other_label}() should be false");
                }
            }
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn error_with_url_builder() {
        let url = "http://example.com/api".into_url().unwrap();
        let err = Error::decode("bad escape in query").with_url(url);
        assert_eq!(err.url().map(|u| u.as_str()), Some("http://example.com/api"));
        assert_eq!(
            err.to_string(),
            "error decoding query string for url (http://example.com/api): bad escape in query"
        );
        assert!(format!("{err:?}").contains("bad escape in query"));
    }

    #[test]
    fn error_without_url() {
        let url = "http://example.com/api".into_url().unwrap();
        let err = Error::builder("fail").with_url(url);
        assert!(err.url().is_some());
        let err = err.without_url();
        assert!(err.url().is_none());
        assert_eq!(err.to_string(), "builder error: fail");
    }

    #[test]
    fn error_std_error_source() {
        let inner = std::io::Error::other("inner");
        let err = Error::body("stream read failed").with_source(inner);
        assert!(StdError::source(&err).is_some());
    }

    /// Source errors stored via `with_source()` are accessible through
    /// the standard `Error::source()` chain and can be downcast.
    #[test]
    fn with_source_downcast() {
        let inner = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err = Error::body("stream read failed").with_source(inner);

        let source = StdError::source(&err).expect("should have source");
        let io_err = source
            .downcast_ref::<std::io::Error>()
            .expect("downcast to io::Error");
        assert_eq!(io_err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn parse_error_converts_to_builder_error() {
        let parse_err = crate::url::Url::parse("no-scheme").unwrap_err();
        let display = parse_err.to_string();
        let err: Error = parse_err.into();
        assert!(err.is_builder());
        let source = StdError::source(&err).expect("should carry the parse error");
        assert!(source.to_string().contains(&display));
    }
}
