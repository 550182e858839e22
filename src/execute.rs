use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info_span, trace, warn};

use crate::RestxResult;
use crate::charset::Charset;
use crate::config::{DEFAULT_CONTEXT_TAG, RetrySettings, Timeouts};
use crate::error::{Error, ErrorKind};
use crate::request::RequestModel;
use crate::response::{Response, ResponseEntity};
use crate::transport::{
    RequestBody, Transport, TransportError, TransportErrorKind, TransportRequest, TransportResponse,
    TransportSession,
};
use crate::uri::{assemble_url, redact_url_for_logs};
use crate::ureq_transport::UreqTransport;

/// Caller-supplied label attached to every log line of an execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    tag: String,
}

impl ExecutionContext {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TAG)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Idle,
    Dispatching,
    Sending,
    Retrying,
    Succeeded,
    Failed,
}

impl ExecutionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

pub trait ExecutionObserver: Send + Sync {
    fn on_state_change(
        &self,
        _context: &ExecutionContext,
        _state: ExecutionState,
        _attempt: usize,
    ) {
    }

    fn on_retry_scheduled(&self, _context: &ExecutionContext, _kind: ErrorKind, _attempt: usize) {}
}

/// Owns a transport session for one attempt and shuts it down exactly once.
struct SessionGuard {
    session: Box<dyn TransportSession>,
    released: bool,
}

impl SessionGuard {
    fn new(session: Box<dyn TransportSession>) -> Self {
        Self {
            session,
            released: false,
        }
    }

    fn send(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.session.send(request)
    }

    fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(error) = self.session.shutdown() {
            warn!(error = %error, "failed to release transport session");
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sends a [`RequestModel`] through a [`Transport`], classifying failures and
/// retrying timeouts while the request's budgets allow.
pub struct RetryingExecutor<T> {
    transport: T,
    context: ExecutionContext,
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl Default for RetryingExecutor<UreqTransport> {
    fn default() -> Self {
        Self::new(UreqTransport::default())
    }
}

impl<T: Transport> RetryingExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            context: ExecutionContext::default(),
            observers: Vec::new(),
        }
    }

    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one logical execution.
    ///
    /// Connect and socket timeouts are retried while the matching budget is
    /// positive and its switch is on. Every retry consumes one unit of the
    /// socket budget, whichever timeout caused it; connect-timeout retries are
    /// also capped by the connection budget. All other failures are terminal.
    pub fn execute(&self, request: &mut RequestModel) -> RestxResult<Response> {
        let span = info_span!(
            "restx.execute",
            tag = %self.context.tag(),
            method = %request.method(),
            uri = tracing::field::Empty
        );
        let _enter = span.enter();

        self.transition(ExecutionState::Idle, 0);
        self.transition(ExecutionState::Dispatching, 0);
        let (prepared, charset) = match dispatch(request) {
            Ok(dispatched) => dispatched,
            Err(error) => {
                error!(
                    code = error.code(),
                    kind = %error.kind(),
                    "request could not be dispatched"
                );
                self.transition(ExecutionState::Failed, 0);
                return Err(error);
            }
        };
        let redacted_uri = redact_url_for_logs(&prepared.url);
        span.record("uri", redacted_uri.as_str());
        debug!(uri = %redacted_uri, "dispatching request");

        self.send_with_retry(request, &prepared, charset, &redacted_uri)
    }

    fn send_with_retry(
        &self,
        request: &mut RequestModel,
        prepared: &TransportRequest,
        charset: Charset,
        redacted_uri: &str,
    ) -> RestxResult<Response> {
        let mut attempt = 0_usize;
        let mut connect_retries = 0_u32;

        loop {
            attempt += 1;
            self.transition(ExecutionState::Sending, attempt);

            let failure = match self.run_attempt(request.timeouts, prepared, charset, attempt) {
                Ok(response) => {
                    debug!(
                        status = response.status_code(),
                        attempts = attempt,
                        "request completed"
                    );
                    self.transition(ExecutionState::Succeeded, attempt);
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            let kind = ErrorKind::classify(failure.kind());
            if retry_permitted(kind, &request.retry, connect_retries) {
                if kind == ErrorKind::ConnectTimeout {
                    connect_retries += 1;
                }
                request.retry.socket_budget = request.retry.socket_budget.saturating_sub(1);
                warn!(
                    code = kind.code(),
                    kind = %kind,
                    attempt,
                    remaining_socket_budget = request.retry.socket_budget,
                    error = %failure,
                    "retrying request after timeout"
                );
                for observer in &self.observers {
                    observer.on_retry_scheduled(&self.context, kind, attempt);
                }
                self.transition(ExecutionState::Retrying, attempt);
                continue;
            }

            let error = Error::from_transport(failure, request.method, redacted_uri, attempt);
            error!(
                code = error.code(),
                kind = %error.kind(),
                attempts = attempt,
                uri = %redacted_uri,
                "request failed"
            );
            self.transition(ExecutionState::Failed, attempt);
            return Err(error);
        }
    }

    fn run_attempt(
        &self,
        timeouts: Timeouts,
        prepared: &TransportRequest,
        charset: Charset,
        attempt: usize,
    ) -> Result<Response, TransportError> {
        let span = info_span!("restx.attempt", attempt);
        let _enter = span.enter();

        catch_unwind(AssertUnwindSafe(|| {
            let mut session = SessionGuard::new(self.transport.open(&timeouts)?);
            let result = session.send(prepared).map(|mut response| {
                let entity = response
                    .entity
                    .as_deref_mut()
                    .map(|entity| ResponseEntity::capture(entity, charset));
                Response::new(response.status, response.reason, entity, attempt)
            });
            session.release();
            result
        }))
        .unwrap_or_else(|payload| Err(panic_failure(&*payload)))
    }

    fn transition(&self, state: ExecutionState, attempt: usize) {
        trace!(state = ?state, attempt, "execution state");
        for observer in &self.observers {
            observer.on_state_change(&self.context, state, attempt);
        }
    }
}

pub(crate) fn retry_permitted(
    kind: ErrorKind,
    retry: &RetrySettings,
    connect_retries_taken: u32,
) -> bool {
    match kind {
        ErrorKind::ConnectTimeout => {
            retry.connection_retry_enabled && retry.connection_budget > connect_retries_taken
        }
        ErrorKind::SocketTimeout => retry.socket_retry_enabled && retry.socket_budget > 0,
        _ => false,
    }
}

/// Builds the transport request: URL, headers, and the text body for POST
/// and PUT.
pub(crate) fn dispatch(request: &RequestModel) -> RestxResult<(TransportRequest, Charset)> {
    let charset = Charset::from_name(&request.charset).map_err(|error| {
        Error::encoding(
            &error.name,
            request.method,
            &redact_url_for_logs(&request.base_uri),
        )
    })?;
    let url = assemble_url(&request.base_uri, &request.path, &request.params, charset);

    let body = match &request.content {
        Some(content) if request.method.carries_body() => Some(RequestBody {
            content: Bytes::from(charset.encode(content).into_owned()),
            content_type: format!(
                "{}; charset={}",
                request.content_type,
                charset.output().name()
            ),
        }),
        _ => None,
    };

    let prepared = TransportRequest {
        method: request.method,
        url,
        headers: request.headers.clone(),
        body,
    };
    Ok((prepared, charset))
}

fn panic_failure(payload: &(dyn Any + Send)) -> TransportError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "transport panicked".to_owned());
    TransportError::new(TransportErrorKind::Other, detail)
}
