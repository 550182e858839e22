use std::io::Read;

use ureq::http::HeaderMap;
use ureq::http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};

use crate::config::Timeouts;
use crate::transport::{
    Transport, TransportEntity, TransportError, TransportErrorKind, TransportRequest,
    TransportResponse, TransportSession,
};

const DEFAULT_USER_AGENT: &str = concat!("restx/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_RESPONSE_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Blocking transport backed by `ureq`.
///
/// Every session gets a fresh agent that keeps no idle connections, so a
/// session owns its connection outright and dropping the agent closes it.
///
/// The socket timeout bounds each whole phase (sending the request, sending
/// the body, receiving the head, receiving the body), not each single read.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    user_agent: String,
    max_response_body_bytes: usize,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_response_body_bytes: DEFAULT_MAX_RESPONSE_BODY_BYTES,
        }
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Bodies longer than this are treated as unreadable.
    pub fn max_response_body_bytes(mut self, max_response_body_bytes: usize) -> Self {
        self.max_response_body_bytes = max_response_body_bytes.max(1);
        self
    }
}

impl Transport for UreqTransport {
    fn open(&self, timeouts: &Timeouts) -> Result<Box<dyn TransportSession>, TransportError> {
        Ok(Box::new(UreqSession {
            agent: Some(make_agent(&self.user_agent, timeouts)),
            max_response_body_bytes: self.max_response_body_bytes,
        }))
    }
}

fn make_agent(user_agent: &str, timeouts: &Timeouts) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .user_agent(user_agent)
        .max_idle_connections(0)
        .max_idle_connections_per_host(0)
        .timeout_connect(Some(timeouts.connect))
        .timeout_send_request(Some(timeouts.socket))
        .timeout_send_body(Some(timeouts.socket))
        .timeout_recv_response(Some(timeouts.socket))
        .timeout_recv_body(Some(timeouts.socket))
        .build();
    config.new_agent()
}

struct UreqSession {
    agent: Option<ureq::Agent>,
    max_response_body_bytes: usize,
}

impl TransportSession for UreqSession {
    fn send(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let Some(agent) = &self.agent else {
            return Err(TransportError::new(
                TransportErrorKind::ConnectionClosed,
                "transport session already shut down",
            ));
        };

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let body = match &request.body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, body.content_type.as_str());
                body.content.to_vec()
            }
            None => Vec::new(),
        };
        let http_request = builder
            .body(body)
            .map_err(|source| TransportError::new(TransportErrorKind::Protocol, source))?;

        let response = agent.run(http_request).map_err(classify_ureq_error)?;
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_owned();
        let (parts, body) = response.into_parts();
        let entity = response_has_entity(status.as_u16()).then(|| {
            Box::new(UreqEntity::new(&parts.headers, body, self.max_response_body_bytes))
                as Box<dyn TransportEntity>
        });

        Ok(TransportResponse {
            status: status.as_u16(),
            reason,
            entity,
        })
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.agent.take();
        Ok(())
    }
}

fn response_has_entity(status: u16) -> bool {
    !matches!(status, 100..=199 | 204 | 304)
}

struct UreqEntity {
    body: ureq::Body,
    content_length: Option<u64>,
    content_type: Option<String>,
    chunked: bool,
    max_bytes: usize,
}

impl UreqEntity {
    fn new(headers: &HeaderMap, body: ureq::Body, max_bytes: usize) -> Self {
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let chunked = headers.get_all(TRANSFER_ENCODING).iter().any(|value| {
            value
                .to_str()
                .is_ok_and(|text| text.to_ascii_lowercase().contains("chunked"))
        });
        Self {
            body,
            content_length,
            content_type,
            chunked,
            max_bytes,
        }
    }
}

impl TransportEntity for UreqEntity {
    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn is_streaming(&self) -> bool {
        true
    }

    fn is_repeatable(&self) -> bool {
        false
    }

    fn is_chunked(&self) -> bool {
        self.chunked
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        let mut reader = self.body.as_reader();
        let mut collected = Vec::new();
        let mut chunk = [0_u8; 8192];

        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            if collected.len().saturating_add(read) > self.max_bytes {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("response body exceeds {} bytes", self.max_bytes),
                ));
            }
            collected.extend_from_slice(&chunk[..read]);
        }

        Ok(collected)
    }
}

pub(crate) fn classify_ureq_error(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Io(source) => TransportError::from(source),
        other => TransportError::new(ureq_error_kind(&other), other),
    }
}

fn ureq_error_kind(error: &ureq::Error) -> TransportErrorKind {
    match error {
        ureq::Error::Timeout(ureq::Timeout::Connect | ureq::Timeout::Resolve) => {
            TransportErrorKind::ConnectTimeout
        }
        ureq::Error::Timeout(_) => TransportErrorKind::SocketTimeout,
        ureq::Error::HostNotFound => TransportErrorKind::UnknownHost,
        ureq::Error::BadUri(_) | ureq::Error::Http(_) | ureq::Error::Protocol(_) => {
            TransportErrorKind::Protocol
        }
        ureq::Error::ConnectionFailed
        | ureq::Error::ConnectProxyFailed(_)
        | ureq::Error::Tls(_) => TransportErrorKind::Io,
        _ => TransportErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_ureq_error, response_has_entity};
    use crate::transport::TransportErrorKind;

    #[test]
    fn connect_phase_timeouts_are_connect_timeouts() {
        let error = classify_ureq_error(ureq::Error::Timeout(ureq::Timeout::Connect));
        assert_eq!(error.kind(), TransportErrorKind::ConnectTimeout);
    }

    #[test]
    fn read_phase_timeouts_are_socket_timeouts() {
        let error = classify_ureq_error(ureq::Error::Timeout(ureq::Timeout::RecvResponse));
        assert_eq!(error.kind(), TransportErrorKind::SocketTimeout);
        let error = classify_ureq_error(ureq::Error::Timeout(ureq::Timeout::RecvBody));
        assert_eq!(error.kind(), TransportErrorKind::SocketTimeout);
    }

    #[test]
    fn dns_failures_are_unknown_host() {
        let error = classify_ureq_error(ureq::Error::HostNotFound);
        assert_eq!(error.kind(), TransportErrorKind::UnknownHost);
    }

    #[test]
    fn io_errors_are_classified_by_kind() {
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let error = classify_ureq_error(ureq::Error::Io(reset));
        assert_eq!(error.kind(), TransportErrorKind::ConnectionClosed);
    }

    #[test]
    fn bodiless_statuses_have_no_entity() {
        assert!(!response_has_entity(204));
        assert!(!response_has_entity(304));
        assert!(!response_has_entity(101));
        assert!(response_has_entity(200));
        assert!(response_has_entity(404));
    }
}
