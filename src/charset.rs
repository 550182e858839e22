use std::borrow::Cow;

use encoding_rs::{EncoderResult, Encoding, UTF_8};

/// Character set used to encode request text and decode response bodies.
///
/// Labels resolve through the WHATWG Encoding Standard, so `latin1` and
/// `us-ascii` both map to `windows-1252`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Charset(&'static Encoding);

#[derive(Debug, thiserror::Error)]
#[error("unsupported character set: {name}")]
pub struct UnsupportedCharset {
    pub name: String,
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl Charset {
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// Resolves a charset label, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedCharset> {
        Encoding::for_label_no_replacement(name.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| UnsupportedCharset {
                name: name.to_owned(),
            })
    }

    /// Canonical name, e.g. `UTF-8` or `windows-1252`.
    pub fn name(self) -> &'static str {
        self.0.name()
    }

    pub fn encoding(self) -> &'static Encoding {
        self.0
    }

    /// The charset `encode` actually produces. Differs from `self` only for
    /// UTF-16 variants, which encode as UTF-8.
    pub fn output(self) -> Self {
        Self(self.0.output_encoding())
    }

    /// Encodes text; characters the charset cannot represent become `?`.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        let encoding = self.0.output_encoding();
        if encoding == UTF_8 || (encoding.is_ascii_compatible() && text.is_ascii()) {
            return Cow::Borrowed(text.as_bytes());
        }

        let mut encoder = encoding.new_encoder();
        let capacity = encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len());
        let mut encoded = Vec::with_capacity(capacity);
        let mut remaining = text;
        loop {
            let (result, read) =
                encoder.encode_from_utf8_to_vec_without_replacement(remaining, &mut encoded, true);
            remaining = &remaining[read..];
            match result {
                EncoderResult::InputEmpty => break,
                EncoderResult::OutputFull => encoded.reserve(remaining.len().max(16)),
                EncoderResult::Unmappable(_) => encoded.push(b'?'),
            }
        }
        Cow::Owned(encoded)
    }

    /// Decodes bytes, replacing malformed sequences with U+FFFD. The flag is
    /// `true` when a replacement happened.
    pub fn decode(self, bytes: &[u8]) -> (Cow<'_, str>, bool) {
        self.0.decode_without_bom_handling(bytes)
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

impl std::str::FromStr for Charset {
    type Err = UnsupportedCharset;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Charset;

    #[test]
    fn resolves_labels_case_insensitively() {
        assert_eq!(Charset::from_name("utf-8").ok(), Some(Charset::utf8()));
        assert_eq!(
            Charset::from_name(" Latin1 ").map(Charset::name).ok(),
            Some("windows-1252")
        );
        assert_eq!(
            Charset::from_name("Shift_JIS").map(Charset::name).ok(),
            Some("Shift_JIS")
        );
        assert_eq!(
            Charset::from_name("KOI8-R").map(Charset::name).ok(),
            Some("KOI8-R")
        );
    }

    #[test]
    fn rejects_unknown_labels() {
        let error = Charset::from_name("EBCDIC").expect_err("EBCDIC is not supported");
        assert_eq!(error.name, "EBCDIC");
        assert!(Charset::from_name("iso-2022-kr").is_err());
    }

    #[test]
    fn windows_1252_round_trips() {
        let charset = Charset::from_name("windows-1252").expect("windows-1252");
        assert_eq!(charset.encode("café €").as_ref(), b"caf\xe9 \x80");
        let (text, lossy) = charset.decode(b"caf\xe9 \x80");
        assert_eq!(text, "café €");
        assert!(!lossy);
    }

    #[test]
    fn unmappable_characters_become_question_marks() {
        let charset = Charset::from_name("ISO-8859-1").expect("latin-1");
        assert_eq!(charset.encode("aΩb").as_ref(), b"a?b");
    }

    #[test]
    fn utf16_encodes_as_utf8() {
        let charset = Charset::from_name("UTF-16").expect("utf-16");
        assert_eq!(charset.output().name(), "UTF-8");
        assert_eq!(charset.encode("é").as_ref(), "é".as_bytes());
    }

    #[test]
    fn malformed_utf8_is_replaced_not_rejected() {
        let (text, lossy) = Charset::utf8().decode(b"caf\xe9 ok");
        assert_eq!(text, "caf\u{FFFD} ok");
        assert!(lossy);
    }
}
