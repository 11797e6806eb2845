//! HTTP boundary.
//!
//! Uses hyper http1 with TokioIo, one task per connection. Every path is
//! served; only the method decides the outcome.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::ServerError;
use crate::selector::ContentSelector;

const ALLOWED_METHODS: &str = "GET, OPTIONS";

/// Accepts connections until `shutdown` resolves.
pub async fn run<S>(
    listener: TcpListener,
    selector: Arc<ContentSelector>,
    shutdown: S,
) -> Result<(), ServerError>
where
    S: Future<Output = ()>,
{
    info!("joker listening on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        let selector = Arc::clone(&selector);
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);

                            let service = service_fn(move |req| {
                                let selector = Arc::clone(&selector);
                                async move { handle_request(selector, addr, req).await }
                            });

                            if let Err(err) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!("Error serving connection from {}: {:?}", addr, err);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {:?}", e);
                    }
                }
            }
        }
    }

    Ok(())
}

async fn handle_request(
    selector: Arc<ContentSelector>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());

    Ok(route(&selector, req.method()).await)
}

/// Maps one inbound request to its response.
///
/// OPTIONS and unsupported methods never touch the selector.
pub async fn route(selector: &ContentSelector, method: &Method) -> Response<Full<Bytes>> {
    match *method {
        Method::OPTIONS => preflight_response(),
        Method::GET => content_response(selector).await,
        _ => method_not_allowed_response(),
    }
}

async fn content_response(selector: &ContentSelector) -> Response<Full<Bytes>> {
    let content = match AssertUnwindSafe(selector.select_content())
        .catch_unwind()
        .await
    {
        Ok(content) => content,
        Err(_) => {
            error!("Error: content selection panicked");
            return internal_error_response();
        }
    };

    match serde_json::to_vec(&content) {
        Ok(body) => build_response(
            StatusCode::OK,
            &[
                (header::CONTENT_TYPE, "application/json"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            Bytes::from(body),
        ),
        Err(err) => {
            error!("Error: {}", err);
            internal_error_response()
        }
    }
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::NO_CONTENT,
        &[
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        Bytes::new(),
    )
}

fn method_not_allowed_response() -> Response<Full<Bytes>> {
    build_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &[
            (header::CONTENT_TYPE, "text/plain;charset=UTF-8"),
            (header::ALLOW, ALLOWED_METHODS),
        ],
        Bytes::from_static(b"Method not allowed"),
    )
}

fn internal_error_response() -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": "Internal server error" });

    build_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &[
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Bytes::from(body.to_string()),
    )
}

fn build_response(
    status: StatusCode,
    headers: &[(HeaderName, &'static str)],
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;

    for (name, value) in headers {
        response
            .headers_mut()
            .insert(name.clone(), HeaderValue::from_static(*value));
    }

    response
}
