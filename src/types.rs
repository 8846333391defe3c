//! Newtypes and small validators shared by the client and the mock server.

use aliri_braid::braid;

#[derive(thiserror::Error, Debug)]
pub enum InvalidApiUrl {
    #[error("Given URL does not start with \"http://\" or \"https://\": {0}")]
    Protocol(String),

    #[error("Given URL must not end with a trailing slash: {0}")]
    TrailingSlash(String),
}

impl From<std::convert::Infallible> for InvalidApiUrl {
    fn from(x: std::convert::Infallible) -> Self {
        match x {}
    }
}

/// An [ApiUrl] is the base URL for an AnyFetch API server, e.g.
/// `https://api.anyfetch.com`
#[braid(validator, serde)]
pub struct ApiUrl(String);

impl aliri_braid::Validator for ApiUrl {
    type Error = InvalidApiUrl;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if !(s.starts_with("http://") || s.starts_with("https://")) {
            Err(InvalidApiUrl::Protocol(s.to_string()))
        } else if s.ends_with('/') {
            // endpoint paths all start with '/'
            Err(InvalidApiUrl::TrailingSlash(s.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Whether `id` has the shape of a MongoDB ObjectId: exactly 24 hex characters.
pub fn is_mongo_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Percent-encode a document identifier for use as a path segment.
///
/// Parentheses are escaped as well: plain percent-encoding leaves them
/// alone, and some reverse proxies reject paths containing literal
/// parentheses (method not allowed).
pub fn encode_identifier(identifier: &str) -> String {
    urlencoding::encode(identifier)
        .replace('(', "%28")
        .replace(')', "%29")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("http://localhost:50002")]
    #[case("https://api.anyfetch.com")]
    fn test_parse_url(#[case] url: &str) {
        assert!(ApiUrl::new(url.to_string()).is_ok());
    }

    #[rstest]
    #[case("idk://localhost")]
    #[case("localhost:50002")]
    fn test_reject_bad_protocol(#[case] url: &str) {
        assert!(matches!(
            ApiUrl::new(url.to_string()).unwrap_err(),
            InvalidApiUrl::Protocol { .. }
        ))
    }

    #[test]
    fn test_reject_trailing_slash() {
        assert!(matches!(
            ApiUrl::new("https://api.anyfetch.com/".to_string()).unwrap_err(),
            InvalidApiUrl::TrailingSlash { .. }
        ))
    }

    #[rstest]
    #[case("53a7ef7b3b28ab0c7c46863c", true)]
    #[case("88dc117fd640df09fe94f409", true)]
    #[case("53A7EF7B3B28AB0C7C46863C", true)]
    #[case("aze", false)]
    #[case("zzzzzzzzzzzzzzzzzzzzzzzz", false)]
    #[case("53a7ef7b3b28ab0c7c46863c0", false)]
    #[case("", false)]
    fn test_is_mongo_id(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(is_mongo_id(id), expected);
    }

    #[test]
    fn test_encode_identifier_escapes_parentheses() {
        let encoded = encode_identifier("the \"unique\" document identifier (éüà)");
        assert!(!encoded.contains('('));
        assert!(!encoded.contains(')'));
        assert!(encoded.contains("%28"));
        assert!(encoded.contains("%29"));
        assert!(!encoded.contains(' '));
    }

    #[test]
    fn test_encode_identifier_plain() {
        assert_eq!(encode_identifier("some other document"), "some%20other%20document");
    }
}
