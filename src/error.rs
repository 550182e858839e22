use thiserror::Error;

use crate::request::Method;
use crate::transport::{TransportError, TransportErrorKind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Classified failure of one logical execution.
///
/// The code strings are a compatibility contract: consumers match on them,
/// so they never change. `PortUnreachable` and `NoRouteToHost` share `E0004`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    Protocol,
    AddressUnresolved,
    UnknownHost,
    PortUnreachable,
    NoRouteToHost,
    ConnectTimeout,
    SocketTimeout,
    ConnectionClosed,
    ResourceNotFound,
    TransportIo,
    Unexpected,
    Encoding,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Protocol => "E0001",
            Self::AddressUnresolved => "E0002",
            Self::UnknownHost => "E0003",
            Self::PortUnreachable | Self::NoRouteToHost => "E0004",
            Self::ConnectTimeout => "E0005",
            Self::SocketTimeout => "E0006",
            Self::ConnectionClosed => "E0007",
            Self::ResourceNotFound => "E0008",
            Self::TransportIo => "E0009",
            Self::Unexpected => "E0010",
            Self::Encoding => "E0011",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::AddressUnresolved => "address_unresolved",
            Self::UnknownHost => "unknown_host",
            Self::PortUnreachable => "port_unreachable",
            Self::NoRouteToHost => "no_route_to_host",
            Self::ConnectTimeout => "connect_timeout",
            Self::SocketTimeout => "socket_timeout",
            Self::ConnectionClosed => "connection_closed",
            Self::ResourceNotFound => "resource_not_found",
            Self::TransportIo => "transport_io",
            Self::Unexpected => "unexpected",
            Self::Encoding => "encoding",
        }
    }

    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::ConnectTimeout | Self::SocketTimeout)
    }

    /// Maps the category a transport reported onto the closed failure set.
    pub const fn classify(kind: TransportErrorKind) -> Self {
        match kind {
            TransportErrorKind::Protocol => Self::Protocol,
            TransportErrorKind::UnresolvedAddress => Self::AddressUnresolved,
            TransportErrorKind::UnknownHost => Self::UnknownHost,
            TransportErrorKind::PortUnreachable => Self::PortUnreachable,
            TransportErrorKind::NoRouteToHost => Self::NoRouteToHost,
            TransportErrorKind::ConnectTimeout => Self::ConnectTimeout,
            TransportErrorKind::SocketTimeout => Self::SocketTimeout,
            TransportErrorKind::ConnectionClosed => Self::ConnectionClosed,
            TransportErrorKind::NotFound => Self::ResourceNotFound,
            TransportErrorKind::Io => Self::TransportIo,
            TransportErrorKind::Other => Self::Unexpected,
        }
    }

    /// User-facing message. `detail` is only interpolated for `Unexpected`
    /// (the cause text) and `Encoding` (the offending charset name).
    pub fn message(self, detail: &str) -> String {
        match self {
            Self::Protocol => {
                "There was an error requesting information from the servers. [E0001]".to_owned()
            }
            Self::AddressUnresolved => {
                "There was an error resolving the server internet address. [E0002]".to_owned()
            }
            Self::UnknownHost => {
                "There was an error resolving the server internet address. [E0003]".to_owned()
            }
            Self::PortUnreachable | Self::NoRouteToHost => {
                "There was an error finding a route to the server. An intermediate router, access point or gateway may be failing or a firewall is blocking the connection to the internet. [E0004]".to_owned()
            }
            Self::ConnectTimeout => {
                "The attempt to connect to the server has timed out. The server is temporarily busy or otherwise congested at this time. [E0005]".to_owned()
            }
            Self::SocketTimeout => {
                "The connection with the server has timed out. This could be due to a slow connection or poor signal strength. [E0006]".to_owned()
            }
            Self::ConnectionClosed => {
                "The internet connection as closed unexpectedly. This could be due to a slow connection or poor signal strength. [E0007]".to_owned()
            }
            Self::ResourceNotFound => "The file requested was not found. [E0008]".to_owned(),
            Self::TransportIo => {
                "There is a problem with internet connection, please check your internet connection. [E0009]".to_owned()
            }
            Self::Unexpected => format!("Unexpected error occurred ({detail}). [E0010]"),
            Self::Encoding => format!(
                "The request could not be encoded with the character set {detail}. [E0011]"
            ),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    method: Method,
    uri: String,
    attempts: usize,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn from_transport(
        error: TransportError,
        method: Method,
        uri: &str,
        attempts: usize,
    ) -> Self {
        let kind = ErrorKind::classify(error.kind());
        let detail = error.to_string();
        Self {
            kind,
            message: kind.message(&detail),
            method,
            uri: uri.to_owned(),
            attempts,
            source: Some(error.into_source()),
        }
    }

    pub(crate) fn encoding(charset: &str, method: Method, uri: &str) -> Self {
        Self {
            kind: ErrorKind::Encoding,
            message: ErrorKind::Encoding.message(charset),
            method,
            uri: uri.to_owned(),
            attempts: 0,
            source: None,
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL with query string and credentials removed.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Physical transport attempts made before the failure; zero when the
    /// request never reached the transport.
    pub const fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn is_timeout(&self) -> bool {
        self.kind.is_timeout()
    }
}
