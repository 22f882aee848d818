//! HTTP server and graceful shutdown.
//!
//! Every accepted connection runs on its own tokio task, so requests are
//! handled in parallel and a failure (even a panic) inside one connection
//! task never reaches the accept loop.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()` — no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], so `main` can release the store.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::envelope::Envelope;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::IntoResponse;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Binds, then accepts connections and dispatches them to `handler`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, handler: impl Handler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_with_shutdown(listener, handler, shutdown_signal()).await
    }
}

/// Runs the accept loop on an already bound `listener` until `shutdown`
/// resolves, then drains in-flight connections.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    handler: impl Handler,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    let handler: BoxedHandler = handler.into_boxed_handler();

    info!(addr = %listener.local_addr()?, "pathdoc listening");

    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Check shutdown first so a SIGTERM immediately stops accepting
            // new connections, even if more are queued.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let handler = handler.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| dispatch(handler.clone(), req));

                    // Serves HTTP/1.1 and HTTP/2, whichever the client speaks.
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        debug!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(res) = tasks.join_next(), if !tasks.is_empty() => reap(res),
        }
    }

    while let Some(res) = tasks.join_next().await {
        reap(res);
    }

    info!("pathdoc stopped");
    Ok(())
}

fn reap(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        error!("connection task failed: {e}");
    }
}

/// Reads the request body and hands the request to the handler.
///
/// Hyper never sees an error: a body that cannot be read is answered with
/// an envelope like any other aborted request.
async fn dispatch(
    handler: BoxedHandler,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let response = match Request::from_hyper(req).await {
        Ok(req) => handler.call(req).await,
        Err(e) => {
            error!(error = %e, "cannot read request");
            Envelope::fatal(&e).into_response()
        }
    };

    Ok(response.into_inner())
}

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere. A handler that cannot be installed is
/// logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
