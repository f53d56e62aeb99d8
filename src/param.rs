//! Name/value parameter pair.
//!
//! [`Param`] is the atomic unit for query parameters and form parameters:
//! an immutable name with an optional value, compared structurally.

/// An immutable name/value pair.
///
/// The value may be absent, which renders as a bare `name` segment (no
/// `=`) in a query or form string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    name: String,
    value: Option<String>,
}

impl Param {
    /// Create a parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create a parameter with no value.
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter value, if present.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Flatten `(name, values)` pairs into an ordered parameter list.
///
/// Emits one [`Param`] per value, preserving the outer iteration order and
/// each name's value order.  Useful for converting a multi-valued map into
/// the list form the builder's bulk setters take.
pub fn from_lists<I, N, V>(lists: I) -> Vec<Param>
where
    I: IntoIterator<Item = (N, Vec<V>)>,
    N: Into<String>,
    V: Into<String>,
{
    let mut params = Vec::new();
    for (name, values) in lists {
        let name = name.into();
        for value in values {
            params.push(Param::new(name.clone(), value));
        }
    }
    params
}
