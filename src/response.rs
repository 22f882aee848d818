//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Every response pathdoc writes is JSON, so the builder only terminates with
//! [`ResponseBuilder::json`].

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http_body_util::Full;

use crate::envelope::Envelope;
use crate::status::Status;

const APPLICATION_JSON: &str = "application/json";

/// An outgoing HTTP response.
///
/// ```rust
/// use pathdoc::{Response, Status};
///
/// Response::json(br#"{"path":"/a"}"#.to_vec());
/// Response::builder()
///     .status(Status::NotFound)
///     .json(br#"{"message":"No item found","status":404}"#.to_vec());
/// ```
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// Response with no body.
    pub fn status(code: impl Into<u16>) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the transport type hyper writes. Headers that are not
    /// valid on the wire are dropped.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = http::StatusCode::from_u16(self.status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        for (name, value) in self.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
                res.headers_mut().append(name, value);
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: impl Into<u16>) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        let mut headers = vec![(CONTENT_TYPE.as_str().to_owned(), APPLICATION_JSON.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`]. Handlers may return any type that
/// implements it.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// An envelope is sent with its own status code.
impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(bytes) => Response::builder().status(self.status).json(bytes),
            Err(_) => Response::status(Status::InternalServerError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_response_carries_status_and_content_type() {
        let res = Envelope::not_found().into_response();
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(res.body(), br#"{"message":"No item found","status":404}"#);
    }

    #[test]
    fn into_inner_maps_status_and_headers() {
        let res = Response::builder().status(Status::BadRequest).header("x-bad\n", "v").json(b"{}".to_vec());
        let inner = res.into_inner();
        assert_eq!(inner.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(inner.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(inner.headers().len(), 1);
    }
}
