//! The `{message, status}` envelope and the reply type repository
//! operations produce.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Error;
use crate::status::Status;

pub const MSG_OK: &str = "Ok";
pub const MSG_NOT_FOUND: &str = "No item found";
pub const MSG_BAD_JSON: &str = "Error reading JSON body";
pub const MSG_UNSUPPORTED_METHOD: &str = "Unsupported method";

/// Uniform body for confirmations and errors. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    pub status: u16,
}

impl Envelope {
    pub fn new(message: impl Into<String>, status: Status) -> Self {
        Self { message: message.into(), status: status.as_u16() }
    }

    pub fn ok() -> Self {
        Self::new(MSG_OK, Status::Ok)
    }

    pub fn not_found() -> Self {
        Self::new(MSG_NOT_FOUND, Status::NotFound)
    }

    pub fn bad_json() -> Self {
        Self::new(MSG_BAD_JSON, Status::BadRequest)
    }

    pub fn unsupported_method() -> Self {
        Self::new(MSG_UNSUPPORTED_METHOD, Status::BadRequest)
    }

    pub fn deleted(count: u64) -> Self {
        Self::new(format!("Deleted count: {count}"), Status::Ok)
    }

    /// Envelope for a request aborted by an infrastructure failure. The
    /// underlying error is logged, not echoed to the client.
    pub fn fatal(err: &Error) -> Self {
        if err.is_timeout() {
            Self::new("Store operation timed out", Status::GatewayTimeout)
        } else {
            Self::new("Internal server error", Status::InternalServerError)
        }
    }
}

/// What a repository operation hands back to the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// A raw stored document, always sent with 200.
    Document(Document),
    /// An envelope, sent with its own status.
    Envelope(Envelope),
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Self::Document(_) => Status::Ok.as_u16(),
            Self::Envelope(env) => env.status,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Self::Document(doc) => serde_json::to_vec(doc),
            Self::Envelope(env) => serde_json::to_vec(env),
        }
    }
}

impl From<Envelope> for Reply {
    fn from(env: Envelope) -> Self {
        Self::Envelope(env)
    }
}

impl From<Document> for Reply {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn envelope_wire_shape() {
        let bytes = serde_json::to_vec(&Envelope::deleted(1)).unwrap();
        assert_eq!(bytes, br#"{"message":"Deleted count: 1","status":200}"#);
    }

    #[test]
    fn fatal_envelopes() {
        let timeout = Error::Timeout { operation: "find_one", elapsed: Duration::from_secs(2) };
        assert_eq!(Envelope::fatal(&timeout).status, 504);
        assert_eq!(Envelope::fatal(&Error::config("x")).status, 500);
    }

    #[test]
    fn document_reply_is_200() {
        let reply = Reply::from(Document::new());
        assert_eq!(reply.status(), 200);
        assert_eq!(reply.to_json().unwrap(), b"{}");
    }
}
