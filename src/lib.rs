//! `restx` is a blocking HTTP request client with classified failures and
//! timeout retry budgets.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use restx::prelude::{Method, RequestBuilder, RetryingExecutor};
//!
//! fn main() -> Result<(), restx::Error> {
//!     let executor = RetryingExecutor::default();
//!
//!     let response = RequestBuilder::new("https://api.example.com")
//!         .method(Method::Get)
//!         .paths(["users", "42"])
//!         .param("verbose", "true")
//!         .connection_timeout(Duration::from_secs(2))
//!         .connection_retry(2)
//!         .socket_retry(1)
//!         .send(&executor)?;
//!
//!     println!("{} {}", response.status_code(), response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! # Failures
//!
//! Every failed execution yields an [`Error`] whose [`Error::code`] is one of
//! the stable codes `E0001` through `E0011`. Only connect timeouts (`E0005`)
//! and socket timeouts (`E0006`) are ever retried, and only while the
//! request's budgets allow it.

#[cfg(all(not(feature = "tls-rustls"), not(feature = "tls-native")))]
compile_error!("restx requires one TLS backend feature: enable `tls-rustls` or `tls-native`");

mod builder;
mod charset;
mod config;
mod error;
mod execute;
mod handler;
mod request;
mod response;
mod transport;
mod ureq_transport;
mod uri;

pub use crate::builder::RequestBuilder;
pub use crate::charset::{Charset, UnsupportedCharset};
pub use crate::config::{
    DEFAULT_CHARSET, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_CONTENT_TYPE, DEFAULT_CONTEXT_TAG,
    DEFAULT_SOCKET_TIMEOUT, RetrySettings, Timeouts,
};
pub use crate::error::{Error, ErrorKind};
pub use crate::execute::{ExecutionContext, ExecutionObserver, ExecutionState, RetryingExecutor};
pub use crate::handler::{ResponseHandler, StatusClass, dispatch};
pub use crate::request::{Method, RequestModel, UnsupportedMethod};
pub use crate::response::{ContentType, HeaderElement, Response, ResponseEntity};
pub use crate::transport::{
    RequestBody, Transport, TransportEntity, TransportError, TransportErrorKind,
    TransportRequest, TransportResponse, TransportSession,
};
pub use crate::ureq_transport::UreqTransport;
pub use crate::uri::assemble_url;

pub type RestxResult<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        Charset, Error, ErrorKind, ExecutionContext, ExecutionObserver, Method, RequestBuilder,
        RequestModel, Response, ResponseHandler, RestxResult, RetrySettings, RetryingExecutor,
        Timeouts, UreqTransport,
    };
}
