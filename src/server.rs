// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP endpoints for scraping and liveness probes.

use crate::metrics::MetricsPublisher;
use bytes::Bytes;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Serve `/metrics` and `/healthz` until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    publisher: Arc<MetricsPublisher>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => {
                info!("HTTP server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };

        let publisher = publisher.clone();
        tokio::spawn(async move {
            let svc = service_fn(move |req: Request<Incoming>| {
                let publisher = publisher.clone();
                async move { Ok::<_, Infallible>(route(&publisher, req.uri().path()).await) }
            });

            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), svc);
            if let Err(e) = conn.await {
                debug!(%peer, "Connection error: {}", e);
            }
        });
    }
}

/// Bind the listen address and serve
pub async fn listen(
    addr: SocketAddr,
    publisher: Arc<MetricsPublisher>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, publisher, cancel).await
}

async fn route(publisher: &MetricsPublisher, path: &str) -> Response<Full<Bytes>> {
    match path {
        "/metrics" => match publisher.render().await {
            Ok(body) => respond(StatusCode::OK, Some(publisher.content_type()), Bytes::from(body)),
            Err(e) => {
                error!("Failed to render metrics: {}", e);
                respond(StatusCode::INTERNAL_SERVER_ERROR, None, Bytes::from(e.to_string()))
            }
        },
        "/healthz" => respond(StatusCode::OK, None, Bytes::new()),
        _ => respond(StatusCode::NOT_FOUND, None, Bytes::new()),
    }
}

fn respond(status: StatusCode, content_type: Option<String>, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type.and_then(|ct| ct.parse::<HeaderValue>().ok()) {
        response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricToggles, ScanMode};
    use crate::registry::ClientRegistry;
    use crate::scanner::tests::{client, release};
    use crate::scanner::ReleaseScanner;
    use http_body_util::BodyExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn publisher() -> Arc<MetricsPublisher> {
        let clients = ClientRegistry::new();
        clients.add("apps", client(vec![release("web", "apps", "nginx", "1.0.0")]));
        let scanner = ReleaseScanner::new(None);
        let toggles = MetricToggles::default();
        Arc::new(MetricsPublisher::new(clients, scanner, toggles, ScanMode::OnDemand).unwrap())
    }

    async fn body(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let response = route(&publisher(), "/metrics").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        assert!(body(response).await.contains(r#"release="web""#));
    }

    #[tokio::test]
    async fn test_healthz_route_is_empty() {
        let response = route(&publisher(), "/healthz").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = route(&publisher(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_over_tcp_and_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, publisher(), cancel.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        cancel.cancel();
        assert!(server.await.unwrap().is_ok());
    }
}
