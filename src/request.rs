//! Incoming HTTP request type.

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;

use crate::error::Result;

/// An incoming HTTP request with its body already read in full.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) target: String,
    pub(crate) body: Bytes,
}

impl Request {
    pub fn new(method: http::Method, target: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            target: target.into(),
            body: body.into(),
        }
    }

    /// Reads the whole body eagerly. The request target is kept exactly as
    /// the client sent it, query string included.
    pub(crate) async fn from_hyper(req: hyper::Request<Incoming>) -> Result<Self> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        let target = match parts.uri.path_and_query() {
            Some(pq) => pq.as_str().to_owned(),
            None => parts.uri.to_string(),
        };
        Ok(Self { method: parts.method, target, body })
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The raw request target: path plus query, undecoded.
    pub fn target(&self) -> &str { &self.target }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_target_verbatim() {
        let req = Request::new(http::Method::GET, "/a/b/?q=%20x", Bytes::new());
        assert_eq!(req.target(), "/a/b/?q=%20x");
        assert!(req.body().is_empty());
    }
}
