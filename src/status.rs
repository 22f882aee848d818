//! HTTP status codes as a typed enum.
//!
//! Only the codes pathdoc can produce are listed. Use [`Status`] anywhere a
//! status code is accepted: `Response::status()`, `Response::builder().status()`,
//! or inside an [`Envelope`](crate::Envelope).
//!
//! ```rust
//! use pathdoc::{Envelope, Status};
//!
//! let env = Envelope::new("No item found", Status::NotFound);
//! assert_eq!(env.status, 404);
//! ```

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    NotFound,            // 404

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    GatewayTimeout,      // 504
}

impl Status {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::BadRequest          => 400,
            Self::NotFound            => 404,
            Self::InternalServerError => 500,
            Self::GatewayTimeout      => 504,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                  => "OK",
            Self::BadRequest          => "Bad Request",
            Self::NotFound            => "Not Found",
            Self::InternalServerError => "Internal Server Error",
            Self::GatewayTimeout      => "Gateway Timeout",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.as_u16()
    }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> Self {
        match s {
            Status::Ok                  => http::StatusCode::OK,
            Status::BadRequest          => http::StatusCode::BAD_REQUEST,
            Status::NotFound            => http::StatusCode::NOT_FOUND,
            Status::InternalServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Status::GatewayTimeout      => http::StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_agree_with_http_crate() {
        for s in [
            Status::Ok,
            Status::BadRequest,
            Status::NotFound,
            Status::InternalServerError,
            Status::GatewayTimeout,
        ] {
            let code: http::StatusCode = s.into();
            assert_eq!(code.as_u16(), s.as_u16());
            assert_eq!(code.canonical_reason(), Some(s.reason()));
        }
    }
}
