//! The HTTP verbs pathdoc understands.
//!
//! Everything else is answered with `400 Unsupported method` by the
//! dispatcher, independent of path or body.

use std::fmt;
use std::str::FromStr;

/// A supported HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Post   => "POST",
            Self::Put    => "PUT",
        }
    }

    /// Maps a transport-level method. `None` for any other verb.
    pub fn from_http(method: &http::Method) -> Option<Self> {
        method.as_str().parse().ok()
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE" => Ok(Self::Delete),
            "GET"    => Ok(Self::Get),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            _        => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_crud_verbs() {
        assert_eq!(Method::from_http(&http::Method::GET), Some(Method::Get));
        assert_eq!(Method::from_http(&http::Method::POST), Some(Method::Post));
        assert_eq!(Method::from_http(&http::Method::PUT), Some(Method::Put));
        assert_eq!(Method::from_http(&http::Method::DELETE), Some(Method::Delete));
    }

    #[test]
    fn rejects_other_verbs() {
        assert_eq!(Method::from_http(&http::Method::PATCH), None);
        assert_eq!(Method::from_http(&http::Method::HEAD), None);
        assert!("get".parse::<Method>().is_err());
    }
}
