use url::form_urlencoded;

use crate::charset::Charset;

/// Joins the base URI, sanitized path segments, and the encoded query.
///
/// Each segment loses every `/` and `\` and is prefixed with a single `/`.
/// Query values are encoded under `charset` before percent-encoding; names are
/// written as given.
pub fn assemble_url(
    base_uri: &str,
    path: &[String],
    params: &[(String, String)],
    charset: Charset,
) -> String {
    let mut url = String::from(base_uri);
    url.push_str(&assemble_path(path));
    url.push_str(&assemble_query(params, charset));
    url
}

pub(crate) fn assemble_path(path: &[String]) -> String {
    let mut assembled = String::new();
    for segment in path {
        assembled.push('/');
        assembled.extend(segment.chars().filter(|ch| !matches!(ch, '/' | '\\')));
    }
    assembled
}

pub(crate) fn assemble_query(params: &[(String, String)], charset: Charset) -> String {
    if params.is_empty() {
        return String::new();
    }
    let mut query = String::from("?");
    for (index, (name, value)) in params.iter().enumerate() {
        if index > 0 {
            query.push('&');
        }
        query.push_str(name);
        query.push('=');
        query.extend(form_urlencoded::byte_serialize(&charset.encode(value)));
    }
    query
}

/// Strips credentials, query string, and fragment so URLs can be logged.
pub(crate) fn redact_url_for_logs(url_text: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url_text) else {
        return url_text
            .split(['?', '#'])
            .next()
            .unwrap_or(url_text)
            .to_owned();
    };

    let _ = parsed.set_username("");
    let _ = parsed.set_password(None);
    parsed.set_query(None);
    parsed.set_fragment(None);
    parsed.to_string()
}
