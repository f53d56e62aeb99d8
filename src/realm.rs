//! Authentication realm descriptor.
//!
//! A [`Realm`] bundles an authentication scheme with its credentials.
//! Like [`Proxy`](crate::Proxy), it is opaque configuration carried on
//! the [`Request`](crate::Request) descriptor for the transport to act
//! on.

/// The authentication scheme a realm uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// HTTP Basic authentication.
    Basic,
    /// HTTP Digest authentication.
    Digest,
    /// NTLM authentication.
    Ntlm,
    /// Kerberos authentication.
    Kerberos,
    /// SPNEGO negotiated authentication.
    Spnego,
}

/// An authentication realm: scheme plus credentials.
///
/// # Example
///
/// ```rust
/// use reqbase::Realm;
///
/// let realm = Realm::basic("user", "pass")
///     .realm_name("internal")
///     .preemptive(true);
/// ```
#[derive(Debug, Clone)]
pub struct Realm {
    scheme: AuthScheme,
    principal: Option<String>,
    password: Option<String>,
    realm_name: Option<String>,
    use_preemptive_auth: bool,
}

impl Realm {
    fn new(scheme: AuthScheme, principal: impl Into<String>, password: impl Into<String>) -> Realm {
        Realm {
            scheme,
            principal: Some(principal.into()),
            password: Some(password.into()),
            realm_name: None,
            use_preemptive_auth: false,
        }
    }

    /// A Basic-auth realm.
    pub fn basic(principal: impl Into<String>, password: impl Into<String>) -> Realm {
        Realm::new(AuthScheme::Basic, principal, password)
    }

    /// A Digest-auth realm.
    pub fn digest(principal: impl Into<String>, password: impl Into<String>) -> Realm {
        Realm::new(AuthScheme::Digest, principal, password)
    }

    /// Set the protection-space name the server advertises.
    #[must_use]
    pub fn realm_name(mut self, name: impl Into<String>) -> Realm {
        self.realm_name = Some(name.into());
        self
    }

    /// Send credentials up front instead of waiting for a 401 challenge.
    #[must_use]
    pub fn preemptive(mut self, preemptive: bool) -> Realm {
        self.use_preemptive_auth = preemptive;
        self
    }

    /// The authentication scheme.
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// The principal (username), if set.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// The password, if set.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The protection-space name, if set.
    pub fn name(&self) -> Option<&str> {
        self.realm_name.as_deref()
    }

    /// Whether credentials are sent before any challenge.
    pub fn is_preemptive(&self) -> bool {
        self.use_preemptive_auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_constructors() {
        // (realm, expected_scheme, label)
        let cases: &[(Realm, AuthScheme, &str)] = &[
            (Realm::basic("u", "p"), AuthScheme::Basic, "basic"),
            (Realm::digest("u", "p"), AuthScheme::Digest, "digest"),
        ];

        for (realm, scheme, label) in cases {
            assert_eq!(realm.scheme(), *scheme, "{label}: scheme");
            assert_eq!(realm.principal(), Some("u"), "{label}: principal");
            assert_eq!(realm.password(), Some("p"), "{label}: password");
            assert_eq!(realm.name(), None, "{label}: realm name");
            assert!(!realm.is_preemptive(), "{label}: preemptive default");
        }
    }

    #[test]
    fn realm_refiners() {
        let realm = Realm::basic("u", "p").realm_name("internal").preemptive(true);
        assert_eq!(realm.name(), Some("internal"));
        assert!(realm.is_preemptive());
    }
}
