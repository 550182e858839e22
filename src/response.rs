use http::StatusCode;
use tracing::warn;

use crate::charset::Charset;
use crate::transport::TransportEntity;

/// One element of a parsed header value, e.g. `text/html; charset=utf-8`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderElement {
    name: String,
    value: Option<String>,
    parameters: Vec<(String, String)>,
}

impl HeaderElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    name: String,
    value: String,
    elements: Vec<HeaderElement>,
}

impl ContentType {
    pub(crate) fn from_header_value(value: &str) -> Self {
        Self {
            name: http::header::CONTENT_TYPE.as_str().to_owned(),
            value: value.to_owned(),
            elements: parse_header_elements(value),
        }
    }

    /// Header name, always `content-type`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn elements(&self) -> &[HeaderElement] {
        &self.elements
    }

    /// The `charset` parameter of the first element, if any.
    pub fn charset(&self) -> Option<&str> {
        self.elements.first()?.parameter("charset")
    }

    pub fn mime(&self) -> Option<mime::Mime> {
        self.value.parse().ok()
    }
}

/// Splits a header value into comma-separated elements, each with
/// `;`-separated parameters. Quoted parameter values are unquoted.
pub(crate) fn parse_header_elements(value: &str) -> Vec<HeaderElement> {
    split_unquoted(value, ',')
        .into_iter()
        .filter_map(|raw_element| {
            let mut parts = split_unquoted(raw_element, ';').into_iter();
            let (name, element_value) = split_pair(parts.next()?)?;
            let parameters = parts
                .filter_map(split_pair)
                .map(|(name, value)| (name, value.unwrap_or_default()))
                .collect();
            Some(HeaderElement {
                name,
                value: element_value,
                parameters,
            })
        })
        .collect()
}

fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ch if ch == separator && !in_quotes => {
                pieces.push(&text[start..index]);
                start = index + ch.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn split_pair(raw: &str) -> Option<(String, Option<String>)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(value);
            Some((name.trim().to_owned(), Some(value.to_owned())))
        }
        None => Some((raw.to_owned(), None)),
    }
}

/// Normalized view of a transport entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseEntity {
    content_length: i64,
    streaming: bool,
    repeatable: bool,
    chunked: bool,
    content_type: Option<ContentType>,
    body: Option<String>,
}

impl ResponseEntity {
    /// Reads flags, length, and content type, then materializes the body.
    ///
    /// Malformed bytes are replaced rather than rejected. A body that cannot
    /// be read is logged and left as `None`; capture itself never fails.
    pub fn capture(entity: &mut dyn TransportEntity, fallback_charset: Charset) -> Self {
        let content_type = entity.content_type().map(ContentType::from_header_value);
        let charset = content_type
            .as_ref()
            .and_then(ContentType::charset)
            .and_then(|name| Charset::from_name(name).ok())
            .unwrap_or(fallback_charset);

        let body = match entity.read_body() {
            Ok(bytes) => {
                let (text, replaced) = charset.decode(&bytes);
                if replaced {
                    warn!(
                        charset = charset.name(),
                        "response body had malformed bytes; replaced with U+FFFD"
                    );
                }
                Some(text.into_owned())
            }
            Err(error) => {
                warn!(error = %error, "failed to read response body");
                None
            }
        };

        Self {
            content_length: content_length_or_unknown(entity.content_length()),
            streaming: entity.is_streaming(),
            repeatable: entity.is_repeatable(),
            chunked: entity.is_chunked(),
            content_type,
            body,
        }
    }

    /// Declared length in bytes, `-1` when unknown.
    pub const fn content_length(&self) -> i64 {
        self.content_length
    }

    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub const fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub const fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn into_body(self) -> Option<String> {
        self.body
    }
}

fn content_length_or_unknown(length: Option<u64>) -> i64 {
    length
        .and_then(|length| i64::try_from(length).ok())
        .unwrap_or(-1)
}

/// Successful outcome of one logical execution.
#[derive(Clone, Debug)]
pub struct Response {
    status: u16,
    status_line: String,
    entity: Option<ResponseEntity>,
    attempts: usize,
}

impl Response {
    pub(crate) fn new(
        status: u16,
        status_line: String,
        entity: Option<ResponseEntity>,
        attempts: usize,
    ) -> Self {
        Self {
            status,
            status_line,
            entity,
            attempts,
        }
    }

    pub const fn status_code(&self) -> u16 {
        self.status
    }

    /// Typed status, `None` for codes outside 100..=999.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }

    /// Reason phrase for the status. With [`UreqTransport`](crate::UreqTransport)
    /// this is the standard phrase for the code, not the one the server sent.
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn entity(&self) -> Option<&ResponseEntity> {
        self.entity.as_ref()
    }

    pub fn into_entity(self) -> Option<ResponseEntity> {
        self.entity
    }

    /// Content length of the entity, `-1` without one.
    pub fn content_length(&self) -> i64 {
        self.entity
            .as_ref()
            .map_or(-1, ResponseEntity::content_length)
    }

    pub fn text(&self) -> Option<&str> {
        self.entity.as_ref()?.body()
    }

    /// Physical transport sends this execution took.
    pub const fn attempts(&self) -> usize {
        self.attempts
    }
}
