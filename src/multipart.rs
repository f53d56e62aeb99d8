//! Multipart body parts.
//!
//! A [`Part`] is one section of a `multipart/form-data` body: a name, a
//! payload, and optional content-type / filename / charset refinements.
//! Parts are collected by
//! [`RequestBuilder::body_part()`](crate::RequestBuilder::body_part) and
//! carried on the request as an ordered list.

use bytes::Bytes;
use std::path::PathBuf;

/// One part of a multipart request body.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    value: PartValue,
    content_type: Option<String>,
    file_name: Option<String>,
    charset: Option<String>,
    content_id: Option<String>,
    transfer_encoding: Option<String>,
}

/// The payload of a [`Part`].
#[derive(Debug, Clone)]
pub enum PartValue {
    /// Raw bytes.
    Bytes(Bytes),
    /// UTF-8 text.
    Text(String),
    /// A file to be read when the request is sent.
    File(PathBuf),
}

impl Part {
    /// Create a text part.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Part {
        Part::new(name, PartValue::Text(value.into()))
    }

    /// Create a bytes part.
    pub fn bytes(name: impl Into<String>, value: impl Into<Bytes>) -> Part {
        Part::new(name, PartValue::Bytes(value.into()))
    }

    /// Create a file part.  The file is read when the request is sent,
    /// not when the part is created.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Part {
        Part::new(name, PartValue::File(path.into()))
    }

    fn new(name: impl Into<String>, value: PartValue) -> Part {
        Part {
            name: name.into(),
            value,
            content_type: None,
            file_name: None,
            charset: None,
            content_id: None,
            transfer_encoding: None,
        }
    }

    /// Set the content type of this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Part {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the filename advertised for this part.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Part {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the charset advertised for this part.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Part {
        self.charset = Some(charset.into());
        self
    }

    /// Set the `Content-ID` of this part.
    #[must_use]
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Part {
        self.content_id = Some(content_id.into());
        self
    }

    /// Set the content transfer encoding of this part.
    #[must_use]
    pub fn with_transfer_encoding(mut self, transfer_encoding: impl Into<String>) -> Part {
        self.transfer_encoding = Some(transfer_encoding.into());
        self
    }

    /// The part name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The part payload.
    pub fn value(&self) -> &PartValue {
        &self.value
    }

    /// The content type, if one was set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The advertised filename, if one was set.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The advertised charset, if one was set.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// The `Content-ID`, if one was set.
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// The content transfer encoding, if one was set.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.transfer_encoding.as_deref()
    }
}
