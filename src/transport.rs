//! The boundary between the executor and whatever performs network I/O.
//!
//! A [`Transport`] hands out one [`TransportSession`] per attempt. Sessions are
//! owned by the executor, which always shuts them down, whether the attempt
//! succeeded or not.

use bytes::Bytes;

use crate::config::Timeouts;
use crate::error::BoxError;
use crate::request::Method;

/// Failure category reported by a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransportErrorKind {
    /// Malformed HTTP exchange.
    Protocol,
    /// Address resolution failed below the DNS layer.
    UnresolvedAddress,
    /// DNS lookup failed.
    UnknownHost,
    PortUnreachable,
    NoRouteToHost,
    /// Connect phase exceeded the connection timeout.
    ConnectTimeout,
    /// Read or write stalled past the socket timeout after connecting.
    SocketTimeout,
    /// Peer closed the connection mid-exchange.
    ConnectionClosed,
    /// The transport could not find the requested resource. Not an HTTP 404.
    NotFound,
    Io,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Protocol => "protocol",
            Self::UnresolvedAddress => "unresolved_address",
            Self::UnknownHost => "unknown_host",
            Self::PortUnreachable => "port_unreachable",
            Self::NoRouteToHost => "no_route_to_host",
            Self::ConnectTimeout => "connect_timeout",
            Self::SocketTimeout => "socket_timeout",
            Self::ConnectionClosed => "connection_closed",
            Self::NotFound => "not_found",
            Self::Io => "io",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub const fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub(crate) fn into_source(self) -> BoxError {
        self.source
    }
}

impl From<std::io::Error> for TransportError {
    fn from(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                TransportErrorKind::SocketTimeout
            }
            std::io::ErrorKind::NotFound => TransportErrorKind::NotFound,
            std::io::ErrorKind::AddrNotAvailable => TransportErrorKind::UnresolvedAddress,
            std::io::ErrorKind::HostUnreachable | std::io::ErrorKind::NetworkUnreachable => {
                TransportErrorKind::NoRouteToHost
            }
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => TransportErrorKind::ConnectionClosed,
            std::io::ErrorKind::InvalidData => TransportErrorKind::Protocol,
            _ => TransportErrorKind::Io,
        };
        Self::new(kind, source)
    }
}

/// Body attached to a POST or PUT attempt.
#[derive(Clone, Debug)]
pub struct RequestBody {
    pub content: Bytes,
    /// Full `Content-Type` value, charset parameter included.
    pub content_type: String,
}

/// One fully assembled request, reused unchanged for every attempt.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub entity: Option<Box<dyn TransportEntity>>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("has_entity", &self.entity.is_some())
            .finish()
    }
}

/// Body-bearing part of a transport response.
pub trait TransportEntity: Send {
    fn content_length(&self) -> Option<u64>;

    fn is_streaming(&self) -> bool;

    fn is_repeatable(&self) -> bool;

    fn is_chunked(&self) -> bool;

    /// Raw `Content-Type` header value, if the response carried one.
    fn content_type(&self) -> Option<&str>;

    fn read_body(&mut self) -> std::io::Result<Vec<u8>>;
}

pub trait TransportSession: Send {
    fn send(&mut self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Releases the connection and anything else the session holds.
    fn shutdown(&mut self) -> Result<(), TransportError>;
}

pub trait Transport: Send + Sync {
    fn open(&self, timeouts: &Timeouts) -> Result<Box<dyn TransportSession>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn open(&self, timeouts: &Timeouts) -> Result<Box<dyn TransportSession>, TransportError> {
        (**self).open(timeouts)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn open(&self, timeouts: &Timeouts) -> Result<Box<dyn TransportSession>, TransportError> {
        (**self).open(timeouts)
    }
}
