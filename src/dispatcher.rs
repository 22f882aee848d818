//! Request dispatcher: the single entry point for every request.
//!
//! | Method | Operation |
//! |---|---|
//! | `GET` | [`Repository::get`] |
//! | `POST` | [`Repository::create_or_merge`] |
//! | `PUT` | [`Repository::create_or_overwrite`] |
//! | `DELETE` | [`Repository::delete`] |
//! | anything else | `400 Unsupported method` |
//!
//! Routing ignores the path. The raw request target is the document key.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::envelope::{Envelope, Reply};
use crate::error::Result;
use crate::handler::Handler;
use crate::method::Method;
use crate::repository::Repository;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// Parses a request body. Empty or `null` means "no body", which is not the
/// same as `{}`; anything else must be a JSON object.
pub fn parse_body(bytes: &[u8]) -> serde_json::Result<Option<Map<String, Value>>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Map<String, Value>>>(bytes)
}

pub struct Dispatcher {
    repo: Repository,
}

impl Dispatcher {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Wraps the dispatcher into a [`Handler`] for [`Server::serve`](crate::Server::serve).
    pub fn into_handler(self) -> impl Handler {
        let this = Arc::new(self);
        move |req: Request| {
            let this = Arc::clone(&this);
            async move { this.handle(req).await }
        }
    }

    /// Handles one request end to end. Infrastructure failures are logged
    /// and answered with a 5xx envelope; they never escape this call.
    pub async fn handle(&self, req: Request) -> Response {
        let reply = match self.route(&req).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(method = %req.method(), path = req.target(), error = %e, "request aborted");
                Envelope::fatal(&e).into()
            }
        };

        match reply.to_json() {
            Ok(bytes) => Response::builder().status(reply.status()).json(bytes),
            Err(e) => {
                error!(method = %req.method(), path = req.target(), error = %e, "cannot serialize response");
                Envelope::new("Internal server error", Status::InternalServerError).into_response()
            }
        }
    }

    /// Maps the request onto a repository operation.
    pub async fn route(&self, req: &Request) -> Result<Reply> {
        let path = req.target();

        let body = match parse_body(req.body()) {
            Ok(body) => body,
            Err(e) => {
                debug!(method = %req.method(), path, error = %e, "unreadable JSON body");
                return Ok(Envelope::bad_json().into());
            }
        };
        debug!(method = %req.method(), path, body = ?body, "action");

        match Method::from_http(req.method()) {
            Some(Method::Get) => self.repo.get(path).await,
            Some(Method::Post) => self.repo.create_or_merge(path, body).await,
            Some(Method::Put) => self.repo.create_or_overwrite(path, body).await,
            Some(Method::Delete) => self.repo.delete(path).await,
            None => Ok(Envelope::unsupported_method().into()),
        }
    }
}
