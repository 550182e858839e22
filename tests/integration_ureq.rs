use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use restx::prelude::{Method, RequestBuilder, RetryingExecutor, UreqTransport};

#[derive(Clone)]
enum MockReply {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    /// Reads the request and then holds the connection open without answering.
    Stall(Duration),
}

impl MockReply {
    fn respond(status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> Self {
        Self::Respond {
            status,
            headers: headers
                .iter()
                .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
                .collect(),
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

struct MockServer {
    base_url: String,
    served: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    join: Option<JoinHandle<()>>,
}

impl MockServer {
    fn start(replies: Vec<MockReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let address = listener.local_addr().expect("read local address");
        listener
            .set_nonblocking(true)
            .expect("set listener nonblocking");

        let served = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(Vec::new()));
        let served_clone = Arc::clone(&served);
        let captured_clone = Arc::clone(&captured);

        let join = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            let mut reply_index = 0;

            while reply_index < replies.len() && Instant::now() < deadline {
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        let _ = stream.set_nonblocking(false);
                        if let Ok(request) = read_request(&mut stream) {
                            captured_clone
                                .lock()
                                .expect("lock captured requests")
                                .push(request);
                        }

                        served_clone.fetch_add(1, Ordering::SeqCst);
                        let reply = &replies[reply_index];
                        reply_index += 1;
                        match reply {
                            MockReply::Respond {
                                status,
                                headers,
                                body,
                            } => {
                                let _ = write_response(&mut stream, *status, headers, body);
                            }
                            MockReply::Stall(duration) => thread::sleep(*duration),
                        }
                    }
                    Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            base_url: format!("http://{address}"),
            served,
            captured,
            join: Some(join),
        }
    }

    fn served_count(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .expect("lock captured requests")
            .clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}

fn read_request(stream: &mut TcpStream) -> std::io::Result<CapturedRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(1)))?;

    let mut raw = Vec::new();
    loop {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..read]);
        if find_header_end(&raw).is_some() {
            break;
        }
    }

    let header_end = find_header_end(&raw).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "malformed request without header terminator",
        )
    })?;

    let header_text = String::from_utf8_lossy(&raw[..header_end]);
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut request_line_parts = request_line.split_whitespace();
    let method = request_line_parts.next().unwrap_or_default().to_owned();
    let path = request_line_parts.next().unwrap_or_default().to_owned();

    let mut headers = BTreeMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
        }
    }

    let content_length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = raw[header_end + 4..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    headers: &[(String, String)],
    body: &[u8],
) -> std::io::Result<()> {
    let mut raw = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        status_text(status),
        body.len()
    );
    for (name, value) in headers {
        raw.push_str(name);
        raw.push_str(": ");
        raw.push_str(value);
        raw.push_str("\r\n");
    }
    raw.push_str("\r\n");

    stream.write_all(raw.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[test]
fn get_assembles_url_and_captures_body() {
    let server = MockServer::start(vec![MockReply::respond(
        200,
        &[("Content-Type", "text/plain; charset=utf-8")],
        "hello",
    )]);
    let executor = RetryingExecutor::new(UreqTransport::new());

    let response = RequestBuilder::new(server.base_url.as_str())
        .paths(["users", "42"])
        .param("verbose", "true")
        .header("X-Request-Tag", "demo")
        .send(&executor)
        .expect("request succeeds");

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.status_line(), "OK");
    assert_eq!(response.text(), Some("hello"));
    assert_eq!(response.content_length(), 5);
    assert_eq!(response.attempts(), 1);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/users/42?verbose=true");
    assert_eq!(
        requests[0].headers.get("x-request-tag").map(String::as_str),
        Some("demo")
    );
}

#[test]
fn post_sends_text_body_with_charset() {
    let server = MockServer::start(vec![MockReply::respond(201, &[], "")]);
    let executor = RetryingExecutor::new(UreqTransport::new());

    let response = RequestBuilder::new(server.base_url.as_str())
        .method(Method::Post)
        .path("items")
        .content_type("application/json")
        .text_content("{\"name\":\"demo\"}")
        .send(&executor)
        .expect("request succeeds");

    assert_eq!(response.status_code(), 201);
    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/items");
    assert_eq!(
        requests[0].headers.get("content-type").map(String::as_str),
        Some("application/json; charset=UTF-8")
    );
    assert_eq!(requests[0].body, b"{\"name\":\"demo\"}");
}

#[test]
fn http_error_statuses_are_returned_as_responses() {
    let server = MockServer::start(vec![MockReply::respond(404, &[], "missing")]);
    let executor = RetryingExecutor::new(UreqTransport::new());

    let response = RequestBuilder::new(server.base_url.as_str())
        .path("nope")
        .socket_retry(2)
        .send(&executor)
        .expect("404 is a response");

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.text(), Some("missing"));
    assert_eq!(server.served_count(), 1);
}

#[test]
fn stalled_server_triggers_socket_timeout_retries() {
    let server = MockServer::start(vec![
        MockReply::Stall(Duration::from_millis(400)),
        MockReply::Stall(Duration::from_millis(400)),
    ]);
    let executor = RetryingExecutor::new(UreqTransport::new());

    let mut request = RequestBuilder::new(server.base_url.as_str())
        .socket_timeout(Duration::from_millis(100))
        .socket_retry(1)
        .build();
    let error = executor
        .execute(&mut request)
        .expect_err("server never answers");

    assert_eq!(error.code(), "E0006");
    assert_eq!(error.attempts(), 2);
    assert_eq!(request.retry_settings().socket_budget, 0);
    drop(server);
}

#[test]
fn refused_connection_is_a_transport_io_failure() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
        listener.local_addr().expect("probe address")
    };
    let executor = RetryingExecutor::new(UreqTransport::new());

    let error = RequestBuilder::new(format!("http://{address}"))
        .connection_retry(3)
        .send(&executor)
        .expect_err("nothing listens");

    assert_eq!(error.code(), "E0009");
    assert_eq!(error.attempts(), 1);
    assert_eq!(error.uri(), format!("http://{address}/"));
}
