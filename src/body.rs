//! Request body type.
//!
//! [`Body`] is a closed sum over every payload kind a request can carry:
//! in-memory bytes and text, an async stream, a deferred writer, a
//! replayable generator, form parameters, and multipart sections.
//! Because the variants live in one enum, setting a new body through
//! [`RequestBuilder`](crate::RequestBuilder) structurally replaces the
//! previous one -- a request can never hold two payload kinds at once.

use crate::multipart::Part;
use crate::param::Param;
use bytes::Bytes;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed stream type used for streaming request bodies.
pub(crate) type BoxStream = Pin<
    Box<
        dyn futures_core::Stream<Item = Result<Bytes, Box<dyn std::error::Error + Send + Sync>>>
            + Send,
    >,
>;

/// A payload source that writes itself to an output sink when the
/// request is sent.
///
/// The declared length is carried separately on the body (see
/// [`Body::from_writer()`]); a writer with no declared length is sent
/// with chunked transfer encoding.
pub trait EntityWriter: Send + Sync {
    /// Write the entity to `out`.
    fn write_entity(&self, out: &mut dyn std::io::Write) -> std::io::Result<()>;
}

/// A payload source that produces its bytes on demand.
///
/// Unlike a stream, a generator can be invoked again for a replay, so
/// bodies built from one remain cloneable.
pub trait BodyGenerator: Send + Sync {
    /// Produce the body bytes.
    fn generate(&self) -> Result<Bytes, crate::Error>;
}

/// A request body.
///
/// Can be created from `String`, `&str`, `Vec<u8>`, `&[u8]`, or `Bytes`
/// (in-memory), from an async stream via
/// [`wrap_stream()`](Self::wrap_stream), from an [`EntityWriter`] or
/// [`BodyGenerator`], or from form parameters / multipart parts.
///
/// # Example
///
/// ```rust
/// use reqbase::Body;
///
/// // In-memory
/// let body: Body = "hello".into();
/// let body: Body = b"bytes".to_vec().into();
///
/// // From a stream
/// let stream = futures_util::stream::iter(vec![
///     Ok::<_, std::io::Error>(bytes::Bytes::from("chunk1")),
///     Ok(bytes::Bytes::from("chunk2")),
/// ]);
/// let body = Body::wrap_stream(stream);
/// ```
pub struct Body {
    inner: BodyInner,
}

pub(crate) enum BodyInner {
    /// In-memory body bytes.
    Bytes(Bytes),
    /// In-memory text.  Kept as a `String` so the builder can derive a
    /// charset parameter for the `Content-Type` header at build time.
    Text(String),
    /// Streaming body -- sent incrementally, not replayable.
    Stream(BoxStream),
    /// Deferred writer with an optional declared length.
    Writer {
        writer: Arc<dyn EntityWriter>,
        length: Option<u64>,
    },
    /// On-demand, replayable byte producer.
    Generator(Arc<dyn BodyGenerator>),
    /// `application/x-www-form-urlencoded` parameters, in insertion order.
    Form(Vec<Param>),
    /// `multipart/form-data` sections, in insertion order.
    Multipart(Vec<Part>),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            BodyInner::Bytes(b) => f
                .debug_struct("Body")
                .field("kind", &"bytes")
                .field("length", &b.len())
                .finish(),
            BodyInner::Text(t) => f
                .debug_struct("Body")
                .field("kind", &"text")
                .field("length", &t.len())
                .finish(),
            BodyInner::Stream(_) => f.debug_struct("Body").field("kind", &"stream").finish(),
            BodyInner::Writer { length, .. } => f
                .debug_struct("Body")
                .field("kind", &"writer")
                .field("length", length)
                .finish(),
            BodyInner::Generator(_) => f.debug_struct("Body").field("kind", &"generator").finish(),
            BodyInner::Form(params) => f
                .debug_struct("Body")
                .field("kind", &"form")
                .field("params", &params.len())
                .finish(),
            BodyInner::Multipart(parts) => f
                .debug_struct("Body")
                .field("kind", &"multipart")
                .field("parts", &parts.len())
                .finish(),
        }
    }
}

impl Body {
    pub(crate) fn from_inner(inner: BodyInner) -> Body {
        Body { inner }
    }

    /// Create a text body.
    ///
    /// Equivalent to `Body::from(String)`; the text is kept as a string
    /// so the builder can derive a charset from a `Content-Type` header
    /// at build time.
    pub fn text(text: impl Into<String>) -> Body {
        Body::from_inner(BodyInner::Text(text.into()))
    }

    /// Wrap an async stream as a request body.
    ///
    /// The stream is consumed incrementally when the request is sent, so
    /// the entire body does not need to fit in memory.  Stream bodies
    /// are not replayable: [`try_clone()`](Self::try_clone) returns
    /// `None` and no content length is derived for them.
    pub fn wrap_stream<S, O, E>(stream: S) -> Body
    where
        S: futures_core::Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        use futures_util::StreamExt;
        let mapped = stream.map(|result| result.map(|o| o.into()).map_err(|e| e.into()));
        Body::from_inner(BodyInner::Stream(Box::pin(mapped)))
    }

    /// Create a body from an [`EntityWriter`] and an optional declared
    /// length.
    ///
    /// The declared length -- even an absent one -- is carried through to
    /// the request's content length unchanged.
    pub fn from_writer(writer: Arc<dyn EntityWriter>, length: Option<u64>) -> Body {
        Body::from_inner(BodyInner::Writer { writer, length })
    }

    /// Create a body from a [`BodyGenerator`].
    pub fn from_generator(generator: Arc<dyn BodyGenerator>) -> Body {
        Body::from_inner(BodyInner::Generator(generator))
    }

    /// Create an `application/x-www-form-urlencoded` body from parameters.
    pub fn form(params: Vec<Param>) -> Body {
        Body::from_inner(BodyInner::Form(params))
    }

    /// Create a `multipart/form-data` body from parts.
    pub fn multipart(parts: Vec<Part>) -> Body {
        Body::from_inner(BodyInner::Multipart(parts))
    }

    /// View the body contents as a byte slice.
    ///
    /// Returns `None` for every variant that is not in-memory bytes or
    /// text.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            BodyInner::Bytes(b) => Some(b),
            BodyInner::Text(t) => Some(t.as_bytes()),
            _ => None,
        }
    }

    /// View the body as text, if it was created via [`text()`](Self::text).
    pub fn as_text(&self) -> Option<&str> {
        match &self.inner {
            BodyInner::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The form parameters, if this is a form body.
    pub fn form_params(&self) -> Option<&[Param]> {
        match &self.inner {
            BodyInner::Form(params) => Some(params),
            _ => None,
        }
    }

    /// The multipart parts, if this is a multipart body.
    pub fn parts(&self) -> Option<&[Part]> {
        match &self.inner {
            BodyInner::Multipart(parts) => Some(parts),
            _ => None,
        }
    }

    /// Whether this body is a non-replayable stream.
    pub fn is_stream(&self) -> bool {
        matches!(self.inner, BodyInner::Stream(_))
    }

    /// The length this body declares about itself, if any.
    ///
    /// `Some` for in-memory variants and for writer bodies with a
    /// declared length; `None` for streams, generators, form, and
    /// multipart bodies, whose length is determined when they are sent.
    pub fn declared_length(&self) -> Option<u64> {
        match &self.inner {
            BodyInner::Bytes(b) => Some(b.len() as u64),
            BodyInner::Text(t) => Some(t.len() as u64),
            BodyInner::Writer { length, .. } => *length,
            _ => None,
        }
    }

    /// Try to clone this body.
    ///
    /// Returns `None` for streaming bodies (created via
    /// [`wrap_stream()`](Self::wrap_stream)), since streams cannot be
    /// replayed.  Writer and generator bodies share their underlying
    /// handle with the clone.
    pub fn try_clone(&self) -> Option<Body> {
        let inner = match &self.inner {
            BodyInner::Bytes(b) => BodyInner::Bytes(b.clone()),
            BodyInner::Text(t) => BodyInner::Text(t.clone()),
            BodyInner::Stream(_) => return None,
            BodyInner::Writer { writer, length } => BodyInner::Writer {
                writer: Arc::clone(writer),
                length: *length,
            },
            BodyInner::Generator(generator) => BodyInner::Generator(Arc::clone(generator)),
            BodyInner::Form(params) => BodyInner::Form(params.clone()),
            BodyInner::Multipart(parts) => BodyInner::Multipart(parts.clone()),
        };
        Some(Body { inner })
    }

    pub(crate) fn inner(&self) -> &BodyInner {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut BodyInner {
        &mut self.inner
    }

    /// Consume the body and collect it into bytes.
    ///
    /// For in-memory bodies this is cheap. Stream bodies are drained,
    /// writer bodies are written to a buffer, generator bodies are
    /// invoked once.
    #[cfg(test)]
    pub(crate) async fn into_bytes(self) -> Result<Vec<u8>, crate::Error> {
        match self.inner {
            BodyInner::Bytes(b) => Ok(b.to_vec()),
            BodyInner::Text(t) => Ok(t.into_bytes()),
            BodyInner::Stream(mut stream) => {
                use futures_util::StreamExt;
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    let bytes =
                        chunk.map_err(|e| crate::Error::body(format!("stream body error: {e}")))?;
                    buf.extend_from_slice(&bytes);
                }
                Ok(buf)
            }
            BodyInner::Writer { writer, .. } => {
                let mut buf = Vec::new();
                writer
                    .write_entity(&mut buf)
                    .map_err(|e| crate::Error::body("entity writer failed").with_source(e))?;
                Ok(buf)
            }
            BodyInner::Generator(generator) => generator.generate().map(|b| b.to_vec()),
            BodyInner::Form(_) | BodyInner::Multipart(_) => {
                Err(crate::Error::body("form and multipart bodies are encoded when sent"))
            }
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::from_inner(BodyInner::Bytes(Bytes::from(v)))
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Body::from_inner(BodyInner::Bytes(Bytes::from_static(s)))
    }
}

impl From<String> for Body {
    /// String payloads become text bodies, so charset derivation at build
    /// time applies to them.
    fn from(s: String) -> Self {
        Body::from_inner(BodyInner::Text(s))
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::from_inner(BodyInner::Text(s.to_owned()))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::from_inner(BodyInner::Bytes(b))
    }
}

impl Default for Body {
    /// Create an empty body.
    fn default() -> Self {
        Body::from_inner(BodyInner::Bytes(Bytes::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWriter(&'static [u8]);

    impl EntityWriter for FixedWriter {
        fn write_entity(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
            out.write_all(self.0)
        }
    }

    struct FixedGenerator(&'static str);

    impl BodyGenerator for FixedGenerator {
        fn generate(&self) -> Result<Bytes, crate::Error> {
            Ok(Bytes::from_static(self.0.as_bytes()))
        }
    }

    #[test]
    fn body_from_conversions() {
        // (label, constructor, expected_bytes)
        let cases: Vec<(&str, Body, &[u8])> = vec![
            ("Vec<u8>", Body::from(vec![1, 2, 3]), &[1, 2, 3]),
            ("&[u8]", Body::from(&b"hello"[..]), b"hello"),
            ("String", Body::from("hello".to_owned()), b"hello"),
            ("&str", Body::from("hello"), b"hello"),
            ("Bytes", Body::from(Bytes::from_static(b"hello")), b"hello"),
            ("text", Body::text("hello"), b"hello"),
            ("default", Body::default(), b""),
        ];

        for (label, body, expected) in &cases {
            assert_eq!(body.as_bytes().unwrap(), *expected, "Body::from({label})");
        }
    }

    #[test]
    fn text_body_exposes_str() {
        let body = Body::text("grüße");
        assert_eq!(body.as_text(), Some("grüße"));
        // Strings convert to the text variant too.
        assert_eq!(Body::from("grüße".to_owned()).as_text(), Some("grüße"));
        // A bytes body never pretends to be text.
        assert_eq!(Body::from("grüße".as_bytes().to_vec()).as_text(), None);
    }

    #[test]
    fn declared_length_table() {
        // (label, body, expected)
        let writer: Arc<dyn EntityWriter> = Arc::new(FixedWriter(b"12345"));
        let generator: Arc<dyn BodyGenerator> = Arc::new(FixedGenerator("x"));
        let cases: Vec<(&str, Body, Option<u64>)> = vec![
            ("bytes", Body::from(vec![1, 2, 3]), Some(3)),
            ("text", Body::text("abcd"), Some(4)),
            (
                "writer with length",
                Body::from_writer(Arc::clone(&writer), Some(5)),
                Some(5),
            ),
            ("writer without length", Body::from_writer(writer, None), None),
            ("generator", Body::from_generator(generator), None),
            ("form", Body::form(vec![Param::new("a", "1")]), None),
            ("multipart", Body::multipart(vec![]), None),
        ];

        for (label, body, expected) in &cases {
            assert_eq!(body.declared_length(), *expected, "{label}");
        }
    }

    #[test]
    fn body_try_clone_bytes() {
        let body = Body::from(b"test".to_vec());
        let clone = body.try_clone().unwrap();
        assert_eq!(clone.as_bytes().unwrap(), b"test");
    }

    #[test]
    fn body_try_clone_stream_returns_none() {
        let stream =
            futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("chunk"))]);
        let body = Body::wrap_stream(stream);
        assert!(body.is_stream());
        assert!(body.try_clone().is_none());
    }

    #[test]
    fn body_try_clone_shares_writer_and_generator() {
        let writer: Arc<dyn EntityWriter> = Arc::new(FixedWriter(b"shared"));
        let body = Body::from_writer(writer, Some(6));
        let clone = body.try_clone().unwrap();
        assert_eq!(clone.declared_length(), Some(6));
        let bytes = futures_executor::block_on(clone.into_bytes()).unwrap();
        assert_eq!(bytes, b"shared");

        let generator: Arc<dyn BodyGenerator> = Arc::new(FixedGenerator("again"));
        let body = Body::from_generator(generator);
        let clone = body.try_clone().unwrap();
        let bytes = futures_executor::block_on(clone.into_bytes()).unwrap();
        assert_eq!(bytes, b"again");
    }

    #[test]
    fn body_stream_as_bytes_returns_none() {
        let stream =
            futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("chunk"))]);
        let body = Body::wrap_stream(stream);
        assert!(body.as_bytes().is_none());
    }

    #[test]
    fn body_debug_table() {
        // (label, body, expected_kind)
        let stream =
            futures_util::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("chunk"))]);
        let cases: Vec<(&str, Body, &str)> = vec![
            ("bytes", Body::from(vec![0u8, 1]), "bytes"),
            ("text", Body::text("hi"), "text"),
            ("stream", Body::wrap_stream(stream), "stream"),
            ("form", Body::form(vec![]), "form"),
            ("multipart", Body::multipart(vec![]), "multipart"),
        ];

        for (label, body, kind) in &cases {
            let s = format!("{body:?}");
            assert!(s.contains(kind), "{label}: {s}");
        }
    }

    #[test]
    fn body_stream_into_bytes() {
        let stream = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from("hello ")),
            Ok(Bytes::from("world")),
        ]);
        let body = Body::wrap_stream(stream);
        let bytes = futures_executor::block_on(body.into_bytes()).unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn body_stream_error_propagated() {
        let stream = futures_util::stream::iter(vec![
            Ok::<Bytes, std::io::Error>(Bytes::from("ok")),
            Err(std::io::Error::other("fail")),
        ]);
        let body = Body::wrap_stream(stream);
        let result = futures_executor::block_on(body.into_bytes());
        assert!(result.is_err());
    }
}
