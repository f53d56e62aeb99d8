//! Request descriptor and builder.
//!
//! [`RequestBuilder`] is the fluent accumulator: setters collect method,
//! URL, headers, cookies, query parameters, body, and auxiliary
//! configuration, and [`build()`](RequestBuilder::build) finalizes them
//! into an immutable [`Request`] descriptor.  The descriptor carries no
//! transport behavior; it is the value a transport consumes.
//!
//! Setter failures (an unparsable URL, an invalid header name) do not
//! panic and do not interrupt the fluent chain: the first failure is
//! parked in the builder and reported by `build()`.

use crate::body::{Body, BodyInner};
use crate::error::Error;
use crate::multipart::Part;
use crate::param::Param;
use crate::pool::{DefaultPoolKey, PoolKeyStrategy};
use crate::proxy::Proxy;
use crate::query::{self, QueryEncoding};
use crate::realm::Realm;
use crate::signature::SignatureCalculator;
use crate::url::{IntoUrl, Url};
use cookie::Cookie;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Substituted when `build()` runs without any URL having been set.
const DEFAULT_URL: &str = "http://localhost";

// ---------------------------------------------------------------------------
// Request -- a fully-built request descriptor
// ---------------------------------------------------------------------------

/// A fully-built request descriptor.
///
/// Created via [`RequestBuilder::build()`]. Immutable apart from
/// [`headers_mut()`](Self::headers_mut), which exists so signature
/// calculators can inject headers.
pub struct Request {
    method: http::Method,
    url: Url,
    address: Option<IpAddr>,
    local_address: Option<IpAddr>,
    headers: http::HeaderMap,
    cookies: Vec<Cookie<'static>>,
    body: Option<Body>,
    file: Option<PathBuf>,
    content_length: Option<u64>,
    virtual_host: Option<String>,
    proxy: Option<Proxy>,
    realm: Option<Realm>,
    follow_redirects: Option<bool>,
    timeout: Option<Duration>,
    range_offset: u64,
    charset: Option<String>,
    pool_key_strategy: Arc<dyn PoolKeyStrategy>,
    /// Lazily parsed view of the final query string.  Fresh per
    /// descriptor, so a rebuilt URL can never serve a stale view.
    query_cache: OnceLock<Vec<Param>>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish()
    }
}

impl Request {
    /// Create a minimal `Request` with the given method and URL.
    pub fn new(method: http::Method, url: Url) -> Self {
        Self {
            method,
            url,
            address: None,
            local_address: None,
            headers: http::HeaderMap::new(),
            cookies: Vec::new(),
            body: None,
            file: None,
            content_length: None,
            virtual_host: None,
            proxy: None,
            realm: None,
            follow_redirects: None,
            timeout: None,
            range_offset: 0,
            charset: None,
            pool_key_strategy: Arc::new(DefaultPoolKey),
            query_cache: OnceLock::new(),
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// Returns the request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the serialized URL with at most one trailing `/` removed.
    ///
    /// `http://localhost/` renders as `http://localhost`;
    /// `http://localhost//` keeps one slash.
    pub fn url_string(&self) -> String {
        let s = self.url.as_str();
        s.strip_suffix('/').unwrap_or(s).to_owned()
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the request headers.
    ///
    /// This is the mutation surface for
    /// [`SignatureCalculator`](crate::SignatureCalculator) implementations.
    pub fn headers_mut(&mut self) -> &mut http::HeaderMap {
        &mut self.headers
    }

    /// Returns the cookies, in insertion order.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Returns the request body, if set.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Returns the file-backed body path, if set.
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    /// Returns the content length, if known.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Returns the virtual host, if set.
    pub fn virtual_host(&self) -> Option<&str> {
        self.virtual_host.as_deref()
    }

    /// Returns the socket address override, if set.
    pub fn address(&self) -> Option<IpAddr> {
        self.address
    }

    /// Returns the local bind address, if set.
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    /// Returns the proxy descriptor, if set.
    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Returns the auth realm, if set.
    pub fn realm(&self) -> Option<&Realm> {
        self.realm.as_ref()
    }

    /// Returns the redirect preference: `Some(true)`/`Some(false)` when
    /// the request overrides the ambient default, `None` otherwise.
    pub fn follow_redirects(&self) -> Option<bool> {
        self.follow_redirects
    }

    /// Returns the per-request timeout, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the byte offset to resume a transfer from.
    pub fn range_offset(&self) -> u64 {
        self.range_offset
    }

    /// Returns the body charset, if set or derived.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Returns the connection-pool key strategy.
    pub fn pool_key_strategy(&self) -> &Arc<dyn PoolKeyStrategy> {
        &self.pool_key_strategy
    }

    /// Returns the query parameters parsed from the final URL.
    ///
    /// Parsed on first access and cached; segments are split on `&` and
    /// the first `=`, without any decoding.
    pub fn query_params(&self) -> &[Param] {
        self.query_cache.get_or_init(|| match self.url.query() {
            Some(q) => query::parse_query_params(q),
            None => Vec::new(),
        })
    }

    /// Try to clone this request.
    ///
    /// Returns `None` if the request has a streaming body that cannot be
    /// replayed.  The clone starts with an empty query-parameter cache.
    pub fn try_clone(&self) -> Option<Request> {
        let body = match &self.body {
            Some(b) => Some(b.try_clone()?),
            None => None,
        };
        Some(Request {
            method: self.method.clone(),
            url: self.url.clone(),
            address: self.address,
            local_address: self.local_address,
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            body,
            file: self.file.clone(),
            content_length: self.content_length,
            virtual_host: self.virtual_host.clone(),
            proxy: self.proxy.clone(),
            realm: self.realm.clone(),
            follow_redirects: self.follow_redirects,
            timeout: self.timeout,
            range_offset: self.range_offset,
            charset: self.charset.clone(),
            pool_key_strategy: Arc::clone(&self.pool_key_strategy),
            query_cache: OnceLock::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// RequestBuilder -- the fluent accumulator
// ---------------------------------------------------------------------------

/// A fluent builder for a [`Request`] descriptor.
///
/// # Example
///
/// ```rust
/// use reqbase::RequestBuilder;
///
/// let request = RequestBuilder::new(http::Method::GET)
///     .url("http://example.com/search?q=cats")
///     .query_param("page", "2")
///     .header("accept", "application/json")
///     .build()?;
/// assert_eq!(request.url().query(), Some("q=cats&page=2"));
/// # Ok::<(), reqbase::Error>(())
/// ```
pub struct RequestBuilder {
    method: http::Method,
    /// Deferred-error slot: `Ok(None)` means no URL was ever set,
    /// `Err` means a setter failed and `build()` will report it.
    url: Result<Option<Url>, Error>,
    address: Option<IpAddr>,
    local_address: Option<IpAddr>,
    headers: Vec<(http::HeaderName, http::HeaderValue)>,
    cookies: Vec<Cookie<'static>>,
    query_params: Vec<Param>,
    query_encoding: QueryEncoding,
    body: Option<Body>,
    file: Option<PathBuf>,
    content_length: Option<u64>,
    virtual_host: Option<String>,
    proxy: Option<Proxy>,
    realm: Option<Realm>,
    follow_redirects: Option<bool>,
    timeout: Option<Duration>,
    range_offset: u64,
    charset: Option<String>,
    pool_key_strategy: Option<Arc<dyn PoolKeyStrategy>>,
    signature_calculator: Option<Arc<dyn SignatureCalculator>>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let url_str = match &self.url {
            Ok(Some(u)) => u.as_str().to_owned(),
            Ok(None) => "<unset>".to_owned(),
            Err(_) => "<invalid>".to_owned(),
        };
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &url_str)
            .finish()
    }
}

impl Default for RequestBuilder {
    /// A GET builder with nothing else set.
    fn default() -> Self {
        RequestBuilder::new(http::Method::GET)
    }
}

impl RequestBuilder {
    /// Create a new `RequestBuilder` for the given method.
    pub fn new(method: http::Method) -> Self {
        Self {
            method,
            url: Ok(None),
            address: None,
            local_address: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            query_params: Vec::new(),
            query_encoding: QueryEncoding::default(),
            body: None,
            file: None,
            content_length: None,
            virtual_host: None,
            proxy: None,
            realm: None,
            follow_redirects: None,
            timeout: None,
            range_offset: 0,
            charset: None,
            pool_key_strategy: None,
            signature_calculator: None,
        }
    }

    /// Create a builder pre-populated from an existing descriptor.
    ///
    /// Consumes the descriptor; every list field transfers ownership, so
    /// builder and descriptor can never alias.  Callers that want to
    /// keep the descriptor as a template [`try_clone()`](Request::try_clone)
    /// it first.
    pub fn from_request(request: Request) -> Self {
        Self {
            method: request.method,
            url: Ok(Some(request.url)),
            address: request.address,
            local_address: request.local_address,
            headers: request
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            cookies: request.cookies,
            // The prototype's query already lives in its URL.
            query_params: Vec::new(),
            query_encoding: QueryEncoding::default(),
            body: request.body,
            file: request.file,
            content_length: request.content_length,
            virtual_host: request.virtual_host,
            proxy: request.proxy,
            realm: request.realm,
            follow_redirects: request.follow_redirects,
            timeout: request.timeout,
            range_offset: request.range_offset,
            charset: request.charset,
            pool_key_strategy: Some(request.pool_key_strategy),
            signature_calculator: None,
        }
    }

    /// Park a setter failure for `build()` to report.  The first failure
    /// wins; later ones are dropped.
    fn record_err(&mut self, err: Error) {
        if self.url.is_ok() {
            self.url = Err(err);
        }
    }

    // -- method / URL / addresses --

    /// Set the HTTP method.
    #[must_use]
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URL.
    ///
    /// A parse failure is deferred to [`build()`](Self::build).
    #[must_use]
    pub fn url(mut self, url: impl IntoUrl) -> Self {
        match url.into_url() {
            Ok(url) => {
                if let Ok(slot) = &mut self.url {
                    *slot = Some(url);
                }
            }
            Err(e) => self.record_err(e),
        }
        self
    }

    /// Override the address the transport connects to, bypassing name
    /// resolution of the URL host.
    #[must_use]
    pub fn address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the local address to bind the connection to.
    #[must_use]
    pub fn local_address(mut self, address: IpAddr) -> Self {
        self.local_address = Some(address);
        self
    }

    // -- headers --

    /// Add a header to the request.
    ///
    /// Repeated calls with the same name accumulate (append, not
    /// overwrite).  Invalid header names or values are deferred to
    /// [`build()`](Self::build) as errors.
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        http::HeaderName: TryFrom<K>,
        <http::HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        http::HeaderValue: TryFrom<V>,
        <http::HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if let Some((name, value)) = self.convert_header(key, value) {
            self.headers.push((name, value));
        }
        self
    }

    /// Set a header, replacing every accumulated entry with the same
    /// name (header names compare case-insensitively).
    #[must_use]
    pub fn set_header<K, V>(mut self, key: K, value: V) -> Self
    where
        http::HeaderName: TryFrom<K>,
        <http::HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        http::HeaderValue: TryFrom<V>,
        <http::HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if let Some((name, value)) = self.convert_header(key, value) {
            self.headers.retain(|(n, _)| *n != name);
            self.headers.push((name, value));
        }
        self
    }

    /// Convert a key/value pair to typed header components, deferring a
    /// failure to the error slot.
    fn convert_header<K, V>(&mut self, key: K, value: V) -> Option<(http::HeaderName, http::HeaderValue)>
    where
        http::HeaderName: TryFrom<K>,
        <http::HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        http::HeaderValue: TryFrom<V>,
        <http::HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let name = match http::HeaderName::try_from(key) {
            Ok(n) => n,
            Err(e) => {
                let e: http::Error = e.into();
                self.record_err(Error::builder("invalid header name").with_source(e));
                return None;
            }
        };
        let value = match http::HeaderValue::try_from(value) {
            Ok(v) => v,
            Err(e) => {
                let e: http::Error = e.into();
                self.record_err(Error::builder("invalid header value").with_source(e));
                return None;
            }
        };
        Some((name, value))
    }

    /// Merge additional headers into the request.
    ///
    /// Existing headers with the same name are **not** overwritten --
    /// all values accumulate.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.push((name.clone(), value.clone()));
        }
        self
    }

    /// Replace all accumulated headers with the given map.
    #[must_use]
    pub fn set_headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers.clear();
        self.headers(headers)
    }

    // -- cookies --

    /// Append a cookie.
    #[must_use]
    pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add a cookie, replacing the first existing cookie with the same
    /// name in place (the list position is preserved).  Appends when no
    /// cookie with that name exists.
    #[must_use]
    pub fn add_or_replace_cookie(mut self, cookie: Cookie<'static>) -> Self {
        match self.cookies.iter().position(|c| c.name() == cookie.name()) {
            Some(index) => self.cookies[index] = cookie,
            None => self.cookies.push(cookie),
        }
        self
    }

    /// Replace all cookies with the given ones.
    #[must_use]
    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie<'static>>) -> Self {
        self.cookies = cookies.into_iter().collect();
        self
    }

    /// Remove all cookies.
    #[must_use]
    pub fn reset_cookies(mut self) -> Self {
        self.cookies.clear();
        self
    }

    // -- query --

    /// Append a pending query parameter.
    ///
    /// Pending parameters are combined with the URL's own query string
    /// at [`build()`](Self::build) time, after the raw query and in
    /// insertion order.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push(Param::new(name, value));
        self
    }

    /// Replace the pending query parameters.
    #[must_use]
    pub fn query_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.query_params = params.into_iter().collect();
        self
    }

    /// Remove all pending query parameters **and** strip the URL's own
    /// query string.
    #[must_use]
    pub fn reset_query(mut self) -> Self {
        self.query_params.clear();
        if let Ok(Some(url)) = &mut self.url {
            url.set_query(None);
        }
        self
    }

    /// Set how the final query string is assembled: [`QueryEncoding::Encoded`]
    /// (the default) re-encodes every segment, [`QueryEncoding::Raw`]
    /// passes everything through verbatim.
    #[must_use]
    pub fn query_encoding(mut self, encoding: QueryEncoding) -> Self {
        self.query_encoding = encoding;
        self
    }

    // -- body --

    /// Set the request body, replacing any previous body of any kind.
    ///
    /// The content length resets alongside: to the writer's declared
    /// length for writer bodies, to unset for everything else.
    #[must_use]
    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        let body = body.into();
        self.content_length = match body.inner() {
            BodyInner::Writer { length, .. } => *length,
            _ => None,
        };
        self.body = Some(body);
        self
    }

    /// Append a form parameter.
    ///
    /// If the current body is a form, the parameter is appended to it;
    /// any other body is replaced by a fresh single-parameter form.
    /// Resets the content length.
    #[must_use]
    pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let param = Param::new(name, value);
        match self.body.as_mut().map(Body::inner_mut) {
            Some(BodyInner::Form(params)) => params.push(param),
            _ => self.body = Some(Body::form(vec![param])),
        }
        self.content_length = None;
        self
    }

    /// Replace the body with a form built from the given parameters.
    /// Resets the content length.
    #[must_use]
    pub fn set_form_params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.body = Some(Body::form(params.into_iter().collect()));
        self.content_length = None;
        self
    }

    /// Append a multipart part.
    ///
    /// If the current body is multipart, the part is appended to it; any
    /// other body is replaced by a fresh single-part multipart body.
    /// Resets the content length.
    #[must_use]
    pub fn body_part(mut self, part: Part) -> Self {
        match self.body.as_mut().map(Body::inner_mut) {
            Some(BodyInner::Multipart(parts)) => parts.push(part),
            _ => self.body = Some(Body::multipart(vec![part])),
        }
        self.content_length = None;
        self
    }

    /// Clear a scalar body (bytes, text, stream, writer, generator).
    ///
    /// Form and multipart bodies stay in place; use
    /// [`reset_form_params()`](Self::reset_form_params) or
    /// [`reset_multipart()`](Self::reset_multipart) for those.  The
    /// content length always resets.
    #[must_use]
    pub fn reset_body(mut self) -> Self {
        if let Some(body) = &self.body {
            if !matches!(body.inner(), BodyInner::Form(_) | BodyInner::Multipart(_)) {
                self.body = None;
            }
        }
        self.content_length = None;
        self
    }

    /// Clear the body if it is a form.
    #[must_use]
    pub fn reset_form_params(mut self) -> Self {
        if let Some(body) = &self.body {
            if matches!(body.inner(), BodyInner::Form(_)) {
                self.body = None;
            }
        }
        self
    }

    /// Clear the body if it is multipart.
    #[must_use]
    pub fn reset_multipart(mut self) -> Self {
        if let Some(body) = &self.body {
            if matches!(body.inner(), BodyInner::Multipart(_)) {
                self.body = None;
            }
        }
        self
    }

    /// Set a file to use as the request payload.
    ///
    /// The file field sits outside the body slot: setting it resets
    /// nothing, and a body set through other setters coexists with it.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    // -- auxiliary configuration --

    /// Declare the content length explicitly.
    #[must_use]
    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Set the virtual host (the `Host` the transport should present).
    #[must_use]
    pub fn virtual_host(mut self, host: impl Into<String>) -> Self {
        self.virtual_host = Some(host.into());
        self
    }

    /// Set the proxy descriptor.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set the auth realm.
    #[must_use]
    pub fn realm(mut self, realm: Realm) -> Self {
        self.realm = Some(realm);
        self
    }

    /// Override the ambient redirect policy for this request.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the byte offset to resume a transfer from.
    #[must_use]
    pub fn range_offset(mut self, offset: u64) -> Self {
        self.range_offset = offset;
        self
    }

    /// Set the body charset explicitly, disabling derivation from the
    /// `Content-Type` header at build time.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Set the connection-pool key strategy.
    #[must_use]
    pub fn pool_key_strategy(mut self, strategy: Arc<dyn PoolKeyStrategy>) -> Self {
        self.pool_key_strategy = Some(strategy);
        self
    }

    /// Set a signature calculator to run at build time, after the final
    /// URL is assembled.
    #[must_use]
    pub fn signature_calculator(mut self, calculator: Arc<dyn SignatureCalculator>) -> Self {
        self.signature_calculator = Some(calculator);
        self
    }

    /// Try to clone this `RequestBuilder`.
    ///
    /// Returns `None` if a setter error is pending or the body is a
    /// stream.  Writer and generator bodies clone by shared handle.
    pub fn try_clone(&self) -> Option<RequestBuilder> {
        let url = match &self.url {
            Ok(u) => Ok(u.clone()),
            Err(_) => return None,
        };
        let body = match &self.body {
            Some(b) => Some(b.try_clone()?),
            None => None,
        };
        Some(RequestBuilder {
            method: self.method.clone(),
            url,
            address: self.address,
            local_address: self.local_address,
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            query_params: self.query_params.clone(),
            query_encoding: self.query_encoding,
            body,
            file: self.file.clone(),
            content_length: self.content_length,
            virtual_host: self.virtual_host.clone(),
            proxy: self.proxy.clone(),
            realm: self.realm.clone(),
            follow_redirects: self.follow_redirects,
            timeout: self.timeout,
            range_offset: self.range_offset,
            charset: self.charset.clone(),
            pool_key_strategy: self.pool_key_strategy.clone(),
            signature_calculator: self.signature_calculator.clone(),
        })
    }

    /// Build a [`Request`] from this builder.
    ///
    /// Finalization order: deferred setter errors, then default-URL
    /// substitution, scheme validation, path normalization, query
    /// composition, header assembly, signature injection, and finally
    /// best-effort charset and content-length derivation.  Consumes the
    /// builder; clone it first to reuse the configuration.
    pub fn build(self) -> Result<Request, Error> {
        // A parked setter error surfaces before anything else.
        let mut url = match self.url? {
            Some(url) => url,
            None => {
                debug!("no URL set, substituting {DEFAULT_URL}");
                Url::parse(DEFAULT_URL)?
            }
        };

        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            let scheme = url.scheme().to_owned();
            return Err(
                Error::builder(format!("unsupported URL scheme '{scheme}'")).with_url(url)
            );
        }

        if url.path().is_empty() {
            url.set_path("/");
        }

        let composed = query::compose(url.query(), &self.query_params, self.query_encoding)?;
        url.set_query(composed);

        // Fold the ordered header list into a HeaderMap.  Repeated names
        // accumulate (append semantics).
        let mut header_map = http::HeaderMap::new();
        for (name, value) in self.headers {
            header_map.append(name, value);
        }

        let body_is_stream = self.body.as_ref().is_some_and(Body::is_stream);

        let mut request = Request {
            method: self.method,
            url,
            address: self.address,
            local_address: self.local_address,
            headers: header_map,
            cookies: self.cookies,
            body: self.body,
            file: self.file,
            content_length: self.content_length,
            virtual_host: self.virtual_host,
            proxy: self.proxy,
            realm: self.realm,
            follow_redirects: self.follow_redirects,
            timeout: self.timeout,
            range_offset: self.range_offset,
            charset: self.charset,
            pool_key_strategy: self
                .pool_key_strategy
                .unwrap_or_else(|| Arc::new(DefaultPoolKey)),
            query_cache: OnceLock::new(),
        };

        if let Some(calculator) = &self.signature_calculator {
            let base_url = request.url.base_url();
            calculator.calculate(&base_url, &mut request);
        }

        // Best-effort derivations: failures leave the fields unset.
        if request.charset.is_none() {
            request.charset = charset_from_headers(&request.headers);
        }
        if request.content_length.is_none() && !body_is_stream {
            request.content_length = content_length_from_headers(&request.headers);
        }

        Ok(request)
    }
}

/// Extract a `charset` parameter from the `Content-Type` header, if one
/// is present and well-formed.  Surrounding quotes are stripped.
fn charset_from_headers(headers: &http::HeaderMap) -> Option<String> {
    let content_type = headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?;
    for segment in content_type.split(';') {
        if let Some((key, value)) = segment.split_once('=') {
            if key.trim().eq_ignore_ascii_case("charset") {
                let charset = value.trim().trim_matches('"');
                if charset.is_empty() {
                    trace!("empty charset parameter in Content-Type, ignoring");
                    return None;
                }
                return Some(charset.to_owned());
            }
        }
    }
    None
}

/// Parse the `Content-Length` header as a `u64`, if present and valid.
/// Surrounding whitespace is invalid, same as any other non-digit.
fn content_length_from_headers(headers: &http::HeaderMap) -> Option<u64> {
    let value = headers.get(http::header::CONTENT_LENGTH)?.to_str().ok()?;
    match value.parse::<u64>() {
        Ok(length) => Some(length),
        Err(_) => {
            trace!("unparsable Content-Length header, leaving length unset");
            None
        }
    }
}
