use std::time::Duration;

use crate::RestxResult;
use crate::config::{RetrySettings, Timeouts};
use crate::execute::RetryingExecutor;
use crate::request::{Method, RequestModel};
use crate::response::Response;
use crate::transport::Transport;

/// Fluent construction of a [`RequestModel`].
#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    request: RequestModel,
}

impl RequestBuilder {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            request: RequestModel::new(base_uri),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.request.set_method(method);
        self
    }

    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.request.set_base_uri(base_uri);
        self
    }

    /// Adds a path segment. Slashes inside it are dropped when the URL is
    /// assembled, so `"a/b"` becomes the single segment `ab`.
    pub fn path(mut self, segment: impl AsRef<str>) -> Self {
        self.request.add_path(segment);
        self
    }

    pub fn path_opt<S: AsRef<str>>(self, segment: Option<S>) -> Self {
        match segment {
            Some(segment) => self.path(segment),
            None => self,
        }
    }

    pub fn paths<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for segment in segments {
            self.request.add_path(segment);
        }
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.add_param(name, Some(value));
        self
    }

    /// Adds a query parameter whose value may be absent; `None` is sent as an
    /// empty value.
    pub fn param_opt<V: Into<String>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.request.add_param(name, value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.add_header(name, Some(value));
        self
    }

    pub fn header_opt<V: Into<String>>(
        mut self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.request.add_header(name, value);
        self
    }

    /// Body text for POST and PUT; ignored by GET and DELETE.
    pub fn text_content(mut self, content: impl Into<String>) -> Self {
        self.request.set_text_content(Some(content.into()));
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.request.set_charset(charset);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request.set_content_type(content_type);
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.request.set_timeouts(timeouts);
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        let timeouts = self.request.timeouts().connect(timeout);
        self.request.set_timeouts(timeouts);
        self
    }

    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        let timeouts = self.request.timeouts().socket(timeout);
        self.request.set_timeouts(timeouts);
        self
    }

    pub fn retry_settings(mut self, retry: RetrySettings) -> Self {
        self.request.set_retry_settings(retry);
        self
    }

    pub fn connection_retry(mut self, budget: u32) -> Self {
        let retry = self.request.retry_settings().connection_budget(budget);
        self.request.set_retry_settings(retry);
        self
    }

    pub fn socket_retry(mut self, budget: u32) -> Self {
        let retry = self.request.retry_settings().socket_budget(budget);
        self.request.set_retry_settings(retry);
        self
    }

    pub fn enable_connection_retry(mut self, enabled: bool) -> Self {
        let retry = self.request.retry_settings().connection_retry_enabled(enabled);
        self.request.set_retry_settings(retry);
        self
    }

    pub fn enable_socket_retry(mut self, enabled: bool) -> Self {
        let retry = self.request.retry_settings().socket_retry_enabled(enabled);
        self.request.set_retry_settings(retry);
        self
    }

    pub fn build(self) -> RequestModel {
        self.request
    }

    /// Builds the request and runs it through `executor`.
    pub fn send<T: Transport>(self, executor: &RetryingExecutor<T>) -> RestxResult<Response> {
        let mut request = self.build();
        executor.execute(&mut request)
    }
}
