use crate::RestxResult;
use crate::error::Error;
use crate::response::Response;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Informational,
    Successful,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// `None` for codes below 100.
    pub const fn of(status: u16) -> Option<Self> {
        match status {
            100..=199 => Some(Self::Informational),
            200..=299 => Some(Self::Successful),
            300..=399 => Some(Self::Redirection),
            400..=499 => Some(Self::ClientError),
            500.. => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Callbacks for each outcome class of an execution.
pub trait ResponseHandler {
    fn on_informational(&mut self, _response: &Response) {}

    fn on_successful(&mut self, _response: &Response) {}

    fn on_redirection(&mut self, _response: &Response) {}

    fn on_client_error(&mut self, _response: &Response) {}

    fn on_server_error(&mut self, _response: &Response) {}

    fn on_exception(&mut self, _error: &Error) {}
}

/// Routes an execution result to the matching handler callback.
///
/// A response with a status code below 100 is reported through
/// `on_server_error`, since no well-behaved server sends one.
pub fn dispatch<H>(result: &RestxResult<Response>, handler: &mut H)
where
    H: ResponseHandler + ?Sized,
{
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            handler.on_exception(error);
            return;
        }
    };
    match StatusClass::of(response.status_code()) {
        Some(StatusClass::Informational) => handler.on_informational(response),
        Some(StatusClass::Successful) => handler.on_successful(response),
        Some(StatusClass::Redirection) => handler.on_redirection(response),
        Some(StatusClass::ClientError) => handler.on_client_error(response),
        Some(StatusClass::ServerError) | None => handler.on_server_error(response),
    }
}
