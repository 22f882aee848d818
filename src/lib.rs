//! # pathdoc
//!
//! A minimal HTTP front-end over a document store. Every request target is a
//! key; the four common verbs read, upsert, merge and delete the one JSON
//! document stored under it.
//!
//! | Method | Effect | Success body |
//! |---|---|---|
//! | `GET` | read | the stored document, or `{"message":"No item found","status":404}` |
//! | `PUT` | insert or fully replace | `{"message":"Ok","status":200}` |
//! | `POST` | insert, or apply the body as an update document | `{"message":"Ok","status":200}` |
//! | `DELETE` | remove | `{"message":"Deleted count: N","status":200}` |
//!
//! Anything else is `400 Unsupported method`; a non-empty body that is not a
//! JSON object is `400 Error reading JSON body`.
//!
//! ## Wiring it up
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pathdoc::store::MemoryStore;
//! use pathdoc::{Dispatcher, Repository, Server};
//!
//! #[tokio::main]
//! async fn main() -> pathdoc::Result<()> {
//!     let store = Arc::new(MemoryStore::new("simple_crud", "simple_crud"));
//!     let repo = Repository::new(store, Duration::from_secs(2));
//!
//!     Server::bind("127.0.0.1:8080".parse().unwrap())
//!         .serve(Dispatcher::new(repo).into_handler())
//!         .await
//! }
//! ```

mod dispatcher;
mod document;
mod envelope;
mod error;
mod handler;
mod method;
mod repository;
mod request;
mod response;
mod server;
mod status;

pub mod config;
pub mod store;

pub use config::Config;
pub use dispatcher::{parse_body, Dispatcher};
pub use document::{Document, PATH_FIELD};
pub use envelope::{Envelope, Reply};
pub use error::{Error, Result, StoreError};
pub use handler::Handler;
pub use method::Method;
pub use repository::Repository;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use server::{serve_with_shutdown, shutdown_signal, Server};
pub use status::Status;
