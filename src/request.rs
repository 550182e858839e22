use std::time::Duration;

use crate::config::{DEFAULT_CHARSET, DEFAULT_CONTENT_TYPE, RetrySettings, Timeouts};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the method sends the text body.
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported http method: {name}")]
pub struct UnsupportedMethod {
    pub name: String,
}

impl std::str::FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [Self::Get, Self::Put, Self::Post, Self::Delete]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnsupportedMethod {
                name: name.to_owned(),
            })
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Put => http::Method::PUT,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
        }
    }
}

/// Mutable state of one logical request.
///
/// Normalization happens when values are added: blank path segments are
/// dropped and missing parameter or header values are stored as `""`.
#[derive(Clone, Debug)]
pub struct RequestModel {
    pub(crate) method: Method,
    pub(crate) base_uri: String,
    pub(crate) path: Vec<String>,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) content: Option<String>,
    pub(crate) charset: String,
    pub(crate) content_type: String,
    pub(crate) timeouts: Timeouts,
    pub(crate) retry: RetrySettings,
}

impl Default for RequestModel {
    fn default() -> Self {
        Self::new("")
    }
}

impl RequestModel {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            base_uri: base_uri.into(),
            path: Vec::new(),
            params: Vec::new(),
            headers: Vec::new(),
            content: None,
            charset: DEFAULT_CHARSET.to_owned(),
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            timeouts: Timeouts::default(),
            retry: RetrySettings::default(),
        }
    }

    /// Appends a trimmed path segment; blank segments are ignored.
    pub fn add_path(&mut self, segment: impl AsRef<str>) {
        let segment = segment.as_ref().trim();
        if !segment.is_empty() {
            self.path.push(segment.to_owned());
        }
    }

    pub fn add_param<V: Into<String>>(&mut self, name: impl Into<String>, value: Option<V>) {
        let name = name.into();
        let value = value.map(Into::into).unwrap_or_default();
        tracing::trace!(name = %name, value = %value, "adding query parameter");
        self.params.push((name, value));
    }

    pub fn add_header<V: Into<String>>(&mut self, name: impl Into<String>, value: Option<V>) {
        let name = name.into();
        let value = value.map(Into::into).unwrap_or_default();
        tracing::trace!(name = %name, "adding header");
        self.headers.push((name, value));
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_base_uri(&mut self, base_uri: impl Into<String>) {
        self.base_uri = base_uri.into();
    }

    pub fn set_text_content(&mut self, content: Option<String>) {
        self.content = content;
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) {
        self.charset = charset.into();
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    pub fn set_retry_settings(&mut self, retry: RetrySettings) {
        self.retry = retry;
    }

    pub const fn method(&self) -> Method {
        self.method
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub const fn connection_timeout(&self) -> Duration {
        self.timeouts.connect
    }

    pub const fn socket_timeout(&self) -> Duration {
        self.timeouts.socket
    }

    /// Current retry settings; budgets reflect decrements made by the last
    /// execution.
    pub const fn retry_settings(&self) -> RetrySettings {
        self.retry
    }
}
