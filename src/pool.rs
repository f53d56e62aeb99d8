//! Connection-pool partitioning.
//!
//! A [`PoolKeyStrategy`] maps a request URL to the key under which a
//! transport would pool its connection.  The descriptor always carries
//! one; [`DefaultPoolKey`] partitions by origin.

use crate::url::Url;

/// Maps a request URL to a connection-pool key.
pub trait PoolKeyStrategy: Send + Sync {
    /// The pool key for `url`.
    fn pool_key(&self, url: &Url) -> String;
}

/// The default strategy: one pool partition per origin,
/// `scheme://host:port`, filling in the scheme's well-known default
/// port when none is explicit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPoolKey;

impl PoolKeyStrategy for DefaultPoolKey {
    fn pool_key(&self, url: &Url) -> String {
        match url.port_or_known_default() {
            Some(port) => format!("{}://{}:{}", url.scheme(), url.host(), port),
            None => format!("{}://{}", url.scheme(), url.host()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_key_table() {
        // (input, expected_key)
        let cases: &[(&str, &str)] = &[
            ("http://example.com/a/b?q=1", "http://example.com:80"),
            ("https://example.com/", "https://example.com:443"),
            ("http://example.com:8080/", "http://example.com:8080"),
            ("ws://example.com/socket", "ws://example.com:80"),
            ("wss://example.com/socket", "wss://example.com:443"),
            ("http://[::1]/a", "http://[::1]:80"),
            ("https://[::1]:8443/", "https://[::1]:8443"),
            // Unknown scheme has no default port to fill in.
            ("ftp://example.com/file", "ftp://example.com"),
        ];

        for &(input, expected) in cases {
            let url = Url::parse(input).unwrap();
            assert_eq!(DefaultPoolKey.pool_key(&url), expected, "{input}");
        }
    }

    #[test]
    fn same_origin_urls_share_a_key() {
        let a = Url::parse("http://example.com/one").unwrap();
        let b = Url::parse("http://example.com:80/two?x=1").unwrap();
        assert_eq!(DefaultPoolKey.pool_key(&a), DefaultPoolKey.pool_key(&b));
    }
}
