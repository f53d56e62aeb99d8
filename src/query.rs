//! Final query-string composition.
//!
//! At build time a request's query can come from two places: the raw query
//! already carried by the URL, and the explicit parameter list accumulated
//! on the builder.  [`compose`] merges them -- raw query first -- into one
//! final string under the builder's [`QueryEncoding`] mode.

use crate::Error;
use crate::encoding;
use crate::param::Param;

/// How the final query string is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryEncoding {
    /// Percent-encode explicit parameters, and normalise the URL's raw
    /// query by decoding then re-encoding each segment.  A malformed
    /// escape in the raw query fails the build.
    #[default]
    Encoded,
    /// Pass both sources through verbatim.
    Raw,
}

/// Merge a URL's raw query with explicit parameters into the final query
/// string.
///
/// Returns `None` when both inputs are absent or empty (no `?` in the
/// final URL).  When both are present the raw query's segments come
/// first.  Segments are joined with `&`, no trailing separator.
pub(crate) fn compose(
    raw_query: Option<&str>,
    params: &[Param],
    mode: QueryEncoding,
) -> Result<Option<String>, Error> {
    let raw_query = raw_query.filter(|q| !q.is_empty());

    if raw_query.is_none() && params.is_empty() {
        return Ok(None);
    }

    let mut out = String::new();
    if let Some(query) = raw_query {
        match mode {
            QueryEncoding::Raw => out.push_str(query),
            QueryEncoding::Encoded => append_reencoded_query(&mut out, query)?,
        }
    }
    for param in params {
        if !out.is_empty() {
            out.push('&');
        }
        match mode {
            QueryEncoding::Raw => append_raw_param(&mut out, param.name(), param.value()),
            QueryEncoding::Encoded => append_encoded_param(&mut out, param.name(), param.value()),
        }
    }
    Ok(Some(out))
}

/// Split a query string into parameters without any decoding.
///
/// Splits on `&`, then on the first `=`.  A missing `=`, or one at
/// position 0, yields a value-less parameter whose name is the whole
/// segment -- the same convention [`compose`] uses.
pub(crate) fn parse_query_params(query: &str) -> Vec<Param> {
    query
        .split('&')
        .map(|segment| match segment.find('=') {
            Some(pos) if pos > 0 => Param::new(&segment[..pos], &segment[pos + 1..]),
            _ => Param::name_only(segment),
        })
        .collect()
}

/// Decode then re-encode each segment of a raw query string.
///
/// Normalises whatever encoding the caller's URL carried into this
/// crate's RFC 3986 encoder output.  Decode failures propagate.
fn append_reencoded_query(out: &mut String, query: &str) -> Result<(), Error> {
    for (i, segment) in query.split('&').enumerate() {
        if i > 0 {
            out.push('&');
        }
        match segment.find('=') {
            Some(pos) if pos > 0 => {
                let name = encoding::decode(&segment[..pos])?;
                let value = encoding::decode(&segment[pos + 1..])?;
                append_encoded_param(out, &name, Some(&value));
            }
            // No `=`, or one at position 0: the whole segment is the name.
            _ => {
                let name = encoding::decode(segment)?;
                append_encoded_param(out, &name, None);
            }
        }
    }
    Ok(())
}

fn append_raw_param(out: &mut String, name: &str, value: Option<&str>) {
    out.push_str(name);
    if let Some(value) = value {
        out.push('=');
        out.push_str(value);
    }
}

fn append_encoded_param(out: &mut String, name: &str, value: Option<&str>) {
    encoding::encode_to(out, name);
    if let Some(value) = value {
        out.push('=');
        encoding::encode_to(out, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Option<&str>)]) -> Vec<Param> {
        pairs
            .iter()
            .map(|&(name, value)| match value {
                Some(v) => Param::new(name, v),
                None => Param::name_only(name),
            })
            .collect()
    }

    #[test]
    fn compose_table() {
        // (raw_query, params, mode, expected, label)
        type Case<'a> = (
            Option<&'a str>,
            &'a [(&'a str, Option<&'a str>)],
            QueryEncoding,
            Option<&'a str>,
            &'a str,
        );
        let cases: &[Case] = &[
            // Neither source present.
            (None, &[], QueryEncoding::Encoded, None, "absent x absent (encoded)"),
            (None, &[], QueryEncoding::Raw, None, "absent x absent (raw)"),
            (Some(""), &[], QueryEncoding::Encoded, None, "empty raw counts as absent"),
            // Raw query only.
            (Some("x=1&y=2"), &[], QueryEncoding::Raw, Some("x=1&y=2"), "raw passthrough"),
            (Some("x=1&y=2"), &[], QueryEncoding::Encoded, Some("x=1&y=2"), "encoded normalises"),
            (
                Some("q=2%202"),
                &[],
                QueryEncoding::Encoded,
                Some("q=2%202"),
                "encoded re-encode is stable",
            ),
            (
                Some("q=a+b"),
                &[],
                QueryEncoding::Encoded,
                Some("q=a%20b"),
                "plus decodes to space then %20",
            ),
            (Some("flag"), &[], QueryEncoding::Encoded, Some("flag"), "value-less segment"),
            (
                Some("=x"),
                &[],
                QueryEncoding::Encoded,
                Some("%3Dx"),
                "leading = folds into the name",
            ),
            // Explicit params only.
            (
                None,
                &[("y", Some("2 2"))],
                QueryEncoding::Encoded,
                Some("y=2%202"),
                "param percent-encoded",
            ),
            (
                None,
                &[("y", Some("2 2"))],
                QueryEncoding::Raw,
                Some("y=2 2"),
                "param raw verbatim",
            ),
            (
                None,
                &[("a", Some("1")), ("flag", None), ("b", Some("2"))],
                QueryEncoding::Raw,
                Some("a=1&flag&b=2"),
                "value-less param, no trailing separator",
            ),
            // Both sources: raw query first.
            (
                Some("x=1"),
                &[("y", Some("2 2"))],
                QueryEncoding::Encoded,
                Some("x=1&y=2%202"),
                "merge, encoded",
            ),
            (
                Some("x=1"),
                &[("y", Some("2"))],
                QueryEncoding::Raw,
                Some("x=1&y=2"),
                "merge, raw",
            ),
        ];

        for &(raw, param_pairs, mode, expected, label) in cases {
            let result = compose(raw, &params(param_pairs), mode)
                .unwrap_or_else(|e| panic!("{label}: {e}"));
            assert_eq!(result.as_deref(), expected, "{label}");
        }
    }

    #[test]
    fn compose_raw_mode_never_transforms() {
        // Raw mode concatenates verbatim even when segments carry
        // malformed escapes that encoded mode would reject.
        let result = compose(Some("bad=%GG"), &params(&[("k", Some("a b"))]), QueryEncoding::Raw)
            .expect("raw mode never decodes");
        assert_eq!(result.as_deref(), Some("bad=%GG&k=a b"));
    }

    #[test]
    fn compose_encoded_mode_propagates_decode_errors() {
        let err = compose(Some("bad=%GG"), &[], QueryEncoding::Encoded)
            .expect_err("malformed escape should fail");
        assert!(err.is_decode());
    }

    #[test]
    fn parse_query_params_table() {
        // (query, expected pairs, label)
        let cases: &[(&str, &[(&str, Option<&str>)], &str)] = &[
            ("x=1&y=2", &[("x", Some("1")), ("y", Some("2"))], "simple pairs"),
            ("flag", &[("flag", None)], "value-less"),
            ("=x", &[("=x", None)], "leading = means no value"),
            ("a=1&flag&b=", &[("a", Some("1")), ("flag", None), ("b", Some(""))], "mixed"),
            ("a=b=c", &[("a", Some("b=c"))], "split on first = only"),
        ];

        for &(query, expected, label) in cases {
            assert_eq!(parse_query_params(query), params(expected), "{label}");
        }
    }
}
