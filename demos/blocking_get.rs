use std::time::Duration;

use restx::prelude::{RequestBuilder, ResponseHandler, RetryingExecutor};
use restx::{Error, Response, dispatch};

struct PrintingHandler;

impl ResponseHandler for PrintingHandler {
    fn on_successful(&mut self, response: &Response) {
        println!(
            "status={} body={}",
            response.status_code(),
            response.text().unwrap_or_default()
        );
    }

    fn on_client_error(&mut self, response: &Response) {
        eprintln!("client error status={}", response.status_code());
    }

    fn on_server_error(&mut self, response: &Response) {
        eprintln!("server error status={}", response.status_code());
    }

    fn on_exception(&mut self, error: &Error) {
        eprintln!("code={} message={}", error.code(), error.message());
    }
}

fn main() {
    let executor = RetryingExecutor::default();

    let result = RequestBuilder::new("https://api.example.com")
        .paths(["v1", "items"])
        .param("limit", "10")
        .connection_timeout(Duration::from_secs(2))
        .socket_timeout(Duration::from_secs(3))
        .connection_retry(2)
        .socket_retry(1)
        .send(&executor);

    dispatch(&result, &mut PrintingHandler);
}
