//! Per-request proxy descriptor.
//!
//! [`Proxy`] names a proxy server (scheme, host, port) plus optional
//! Basic-auth credentials and a bypass list.  It is carried on the
//! [`Request`](crate::Request) descriptor as opaque configuration: this
//! crate records it, the transport that consumes the descriptor acts on
//! it.

/// The protocol spoken to the proxy server itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    /// Plain HTTP to the proxy.
    Http,
    /// TLS to the proxy.
    Https,
}

/// A proxy server descriptor.
///
/// # Example
///
/// ```rust
/// use reqbase::Proxy;
///
/// let proxy = Proxy::http("proxy.internal.corp", 8080)
///     .basic_auth("user", "pass")
///     .non_proxy_host("localhost");
/// ```
#[derive(Debug, Clone)]
pub struct Proxy {
    scheme: ProxyScheme,
    host: String,
    port: u16,
    /// Optional Basic-auth credentials for the proxy.
    credentials: Option<(String, String)>,
    /// Host patterns that bypass this proxy.
    non_proxy_hosts: Vec<String>,
}

impl Proxy {
    fn new(scheme: ProxyScheme, host: impl Into<String>, port: u16) -> Proxy {
        Proxy {
            scheme,
            host: host.into(),
            port,
            credentials: None,
            non_proxy_hosts: Vec::new(),
        }
    }

    /// A proxy reached over plain HTTP.
    pub fn http(host: impl Into<String>, port: u16) -> Proxy {
        Proxy::new(ProxyScheme::Http, host, port)
    }

    /// A proxy reached over TLS.
    pub fn https(host: impl Into<String>, port: u16) -> Proxy {
        Proxy::new(ProxyScheme::Https, host, port)
    }

    /// Set proxy credentials using HTTP Basic authentication.
    #[must_use]
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Proxy {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Add a host pattern that bypasses this proxy.
    #[must_use]
    pub fn non_proxy_host(mut self, pattern: impl Into<String>) -> Proxy {
        self.non_proxy_hosts.push(pattern.into());
        self
    }

    /// The protocol spoken to the proxy.
    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    /// The proxy host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The proxy port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Basic-auth credentials, if set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }

    /// Host patterns that bypass this proxy, in insertion order.
    pub fn non_proxy_hosts(&self) -> &[String] {
        &self.non_proxy_hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_constructors() {
        // (proxy, expected_scheme, label)
        let cases: &[(Proxy, ProxyScheme, &str)] = &[
            (Proxy::http("proxy", 8080), ProxyScheme::Http, "http"),
            (Proxy::https("proxy", 8443), ProxyScheme::Https, "https"),
        ];

        for (proxy, scheme, label) in cases {
            assert_eq!(proxy.scheme(), *scheme, "{label}: scheme");
            assert_eq!(proxy.host(), "proxy", "{label}: host");
            assert_eq!(proxy.credentials(), None, "{label}: credentials");
            assert!(proxy.non_proxy_hosts().is_empty(), "{label}: bypass list");
        }
    }

    #[test]
    fn proxy_basic_auth_stores_credentials() {
        let proxy = Proxy::http("proxy", 8080).basic_auth("alice", "s3cret");
        assert_eq!(proxy.credentials(), Some(("alice", "s3cret")));
    }

    #[test]
    fn non_proxy_hosts_accumulate_in_order() {
        let proxy = Proxy::http("proxy", 8080)
            .non_proxy_host("localhost")
            .non_proxy_host("*.internal.corp");
        assert_eq!(proxy.non_proxy_hosts(), ["localhost", "*.internal.corp"]);
    }
}
