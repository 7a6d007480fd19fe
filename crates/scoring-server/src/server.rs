//! HTTP server.
//!
//! Hyper HTTP/1.1 on Tokio, one task per connection:
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `POST /method` | JSON body handed to the [`MethodDispatcher`] |
//! | `GET /health` | `{"status": "ok", "version": ...}` |
//! | anything else | `404` envelope |
//!
//! Every method response carries the request id in `X-Request-Id`, and
//! every request produces one audit event and one metrics sample.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use scoring_api::MethodDispatcher;
use scoring_config::ServerConfig;
use scoring_core::{RequestContext, RequestId, ResponseEnvelope, ScoringError};
use scoring_telemetry::{log_audit, record_request};

use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::VERSION;

/// Path of the method endpoint.
pub const METHOD_PATH: &str = "/method";

/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the request id, in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

/// Per-request handling shared by every connection.
#[derive(Debug)]
struct MethodService {
    dispatcher: MethodDispatcher,
    request_timeout: Duration,
    max_body_bytes: usize,
}

/// The scoring HTTP server, bound and ready to serve.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use scoring_api::MethodDispatcher;
/// use scoring_config::ServerConfig;
/// use scoring_server::{Server, ShutdownSignal};
/// use scoring_store::MemoryStore;
///
/// # async fn run() -> Result<(), scoring_server::ServerError> {
/// let dispatcher = MethodDispatcher::new(Arc::new(MemoryStore::new()));
/// let server = Server::bind(&ServerConfig::default(), dispatcher).await?;
/// server.serve(ShutdownSignal::with_os_signals()).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: Arc<MethodService>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Binds the listener described by `config`.
    ///
    /// Port `0` picks a free port; see [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not parse or cannot be bound.
    pub async fn bind(
        config: &ServerConfig,
        dispatcher: MethodDispatcher,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr =
            config
                .http_addr
                .parse()
                .map_err(|_| ServerError::InvalidAddress {
                    addr: config.http_addr.clone(),
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        Ok(Self {
            listener,
            local_addr,
            service: Arc::new(MethodService {
                dispatcher,
                request_timeout: config.request_timeout(),
                max_body_bytes: config.max_body_bytes,
            }),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves connections until `shutdown` is triggered, then waits up to
    /// the shutdown timeout for open connections to finish.
    pub async fn serve(self, shutdown: ShutdownSignal) {
        info!(addr = %self.local_addr, version = VERSION, "scoring server listening");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let service = Arc::clone(&self.service);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(service, stream, shutdown).await {
                                debug!(%remote_addr, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(self.listener);

        tokio::select! {
            () = tracker.wait_idle() => info!("all connections closed"),
            () = tokio::time::sleep(self.shutdown_timeout) => warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        info!("scoring server stopped");
    }
}

async fn handle_connection(
    service: Arc<MethodService>,
    stream: TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let handler = service_fn(move |req: Request<Incoming>| {
        let service = Arc::clone(&service);
        async move { service.handle_request(req).await }
    });

    let mut conn = pin!(http1::Builder::new().serve_connection(io, handler));

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

impl MethodService {
    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
        let request_id = RequestId::from_header(
            req.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok()),
        );
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!(%request_id, %method, %path, "request received");

        if method == Method::GET && path == HEALTH_PATH {
            return Ok(health_response());
        }

        let mut ctx = RequestContext::with_request_id(request_id.clone());
        let envelope = if method == Method::POST && path == METHOD_PATH {
            self.handle_method(&mut ctx, req).await
        } else {
            ResponseEnvelope::from_error(&ScoringError::route_not_found(path))
        };

        let code = envelope.code();
        log_audit(&ctx.audit(code));
        record_request(ctx.method(), code, ctx.elapsed());

        Ok(envelope_response(&envelope, &request_id))
    }

    async fn handle_method(
        &self,
        ctx: &mut RequestContext,
        req: Request<Incoming>,
    ) -> ResponseEnvelope {
        let body = match self.read_body(req).await {
            Ok(body) => body,
            Err(err) => return ResponseEnvelope::from_error(&err),
        };
        debug!(request_id = %ctx.request_id(), bytes = body.len(), "request body read");

        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return ResponseEnvelope::from_error(&ScoringError::bad_request(format!(
                    "invalid JSON: {e}"
                )))
            }
        };

        match tokio::time::timeout(self.request_timeout, self.dispatcher.dispatch(ctx, &value))
            .await
        {
            Ok(envelope) => envelope,
            Err(_) => {
                warn!(request_id = %ctx.request_id(), "method timed out");
                ResponseEnvelope::from_error(&ScoringError::internal("method timed out"))
            }
        }
    }

    async fn read_body(&self, req: Request<Incoming>) -> Result<Bytes, ScoringError> {
        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        if declared.is_some_and(|len| len > self.max_body_bytes) {
            return Err(ScoringError::bad_request("request body too large"));
        }

        let limited = Limited::new(req.into_body(), self.max_body_bytes);
        match tokio::time::timeout(self.request_timeout, limited.collect()).await {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(e)) => Err(ScoringError::bad_request(format!(
                "failed to read request body: {e}"
            ))),
            Err(_) => Err(ScoringError::bad_request("timed out reading request body")),
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

fn envelope_response(envelope: &ResponseEnvelope, request_id: &RequestId) -> HttpResponse {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| {
        br#"{"error":"Internal Server Error","code":500}"#.to_vec()
    });

    let mut response = json_response(envelope.status(), body);
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn health_response() -> HttpResponse {
    let status = HealthStatus {
        status: "ok",
        version: VERSION,
    };
    let body = serde_json::to_vec(&status).unwrap_or_else(|_| br#"{"status":"ok"}"#.to_vec());
    json_response(StatusCode::OK, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring_store::MemoryStore;

    #[test]
    fn test_envelope_response_headers() {
        let request_id = RequestId::new();
        let envelope = ResponseEnvelope::from_error(&ScoringError::route_not_found("/x"));
        let response = envelope_response(&envelope, &request_id);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[REQUEST_ID_HEADER],
            request_id.as_str()
        );
    }

    #[test]
    fn test_health_response() {
        let response = health_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        let config = ServerConfig {
            http_addr: "not an address".to_string(),
            ..ServerConfig::default()
        };
        let dispatcher = MethodDispatcher::new(Arc::new(MemoryStore::new()));
        let err = Server::bind(&config, dispatcher).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_bind_port_zero() {
        let config = ServerConfig {
            http_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let dispatcher = MethodDispatcher::new(Arc::new(MemoryStore::new()));
        let server = Server::bind(&config, dispatcher).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
    }
}
