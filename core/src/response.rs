//! Response — status, headers and body accumulated during one dispatch
//!
//! A [`Response`] is created fresh per dispatch cycle, owned exclusively by
//! the dispatcher during that cycle, then handed to the transport boundary.
//! The body is append-only through [`Response::append_body`]; only the view
//! render and the placeholder-expansion step replace it wholesale.

use crate::HTTP_PROTOCOL;
use std::collections::BTreeMap;
use std::fmt;

/// The structured response produced by one dispatch cycle.
#[derive(Debug, Clone)]
pub struct Response {
    code: u16,
    title: String,
    body: String,
    content_type: String,
    encoding: String,
    additional_headers: BTreeMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            code: 200,
            title: String::new(),
            body: String::new(),
            content_type: "text/html".to_string(),
            encoding: "utf-8".to_string(),
            additional_headers: BTreeMap::new(),
        }
    }
}

impl Response {
    /// Create a response with the defaults: 200, `text/html`, `utf-8`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Set the status code.
    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.code = code;
        self
    }

    /// The page title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the page title.
    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// The response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replace the body. Reserved for view renders and placeholder
    /// expansion; actions append instead.
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Append content to the existing body.
    pub fn append_body(&mut self, body: &str) -> &mut Self {
        self.body.push_str(body);
        self
    }

    /// The response MIME type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Set the response MIME type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = content_type.into();
        self
    }

    /// The response content encoding.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Set the response content encoding.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> &mut Self {
        self.encoding = encoding.into();
        self
    }

    /// Add a response-specific header. An existing header of the same name
    /// is overwritten.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }

    /// The response-specific headers.
    pub fn additional_headers(&self) -> &BTreeMap<String, String> {
        &self.additional_headers
    }

    /// The outbound status line, e.g. `HTTP/1.1 404 Not Found`.
    ///
    /// Reason phrases come from the protocol's status table; an unassigned
    /// code is emitted without one.
    #[must_use]
    pub fn status_line(&self) -> String {
        match http::StatusCode::from_u16(self.code)
            .ok()
            .and_then(|status| status.canonical_reason())
        {
            Some(reason) => format!("{HTTP_PROTOCOL} {} {reason}", self.code),
            None => format!("{HTTP_PROTOCOL} {}", self.code),
        }
    }

    /// The outbound content-type value, `type;encoding`.
    #[must_use]
    pub fn content_type_header(&self) -> String {
        format!("{};{}", self.content_type, self.encoding)
    }
}

impl fmt::Display for Response {
    /// Displays as the body content.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}
