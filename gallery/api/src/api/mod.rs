use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpSocket;
use tokio::select;
use utils::http::router::Router;
use utils::http::RouteError;
use utils::make_response;
use utils::prelude::FutureTimeout;

use self::error::ApiError;
use crate::config::ApiConfig;
use crate::global::GalleryGlobal;

pub mod accounts;
pub mod albums;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod ext;
pub mod health;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod partials;
pub mod photos;
pub mod request_context;
pub mod response;

pub type Body = utils::http::Body;

pub fn routes<G: GalleryGlobal>(global: &Arc<G>) -> Router<Incoming, RouteError<ApiError>> {
	let weak = Arc::downgrade(global);
	Router::builder()
		.data(weak)
		.error_handler(utils::http::error_handler::<ApiError>)
		// Headers set by handlers or inner middleware are copied onto the response,
		// including error responses.
		.middleware(middleware::response_headers::response_headers_middleware(global))
		// Resolves the session token into the request context. It never fails the
		// request, an invalid token is treated as anonymous.
		.middleware(middleware::auth::auth_middleware(global))
		.scope("/", albums::routes(global))
		.scope("/", photos::routes(global))
		.scope("/", dashboard::routes(global))
		.scope("/", partials::routes(global))
		.scope("/", health::routes(global))
		.scope("/accounts", accounts::routes(global))
		.not_found(|_| async move {
			Ok(make_response!(
				hyper::StatusCode::NOT_FOUND,
				json!({
					"success": false,
					"message": "not found",
				})
			))
		})
		.build()
}

async fn tls_acceptor(config: &ApiConfig) -> anyhow::Result<Option<tokio_rustls::TlsAcceptor>> {
	let Some(tls) = &config.tls else {
		return Ok(None);
	};

	tracing::info!("TLS enabled");
	let cert = tokio::fs::read(&tls.cert).await.context("failed to read api ssl cert")?;
	let key = tokio::fs::read(&tls.key).await.context("failed to read api ssl private key")?;

	let key = rustls_pemfile::private_key(&mut io::BufReader::new(io::Cursor::new(key)))?
		.ok_or_else(|| anyhow::anyhow!("failed to find private key in api private key file"))?;

	let certs = rustls_pemfile::certs(&mut io::BufReader::new(io::Cursor::new(cert))).collect::<Result<Vec<_>, _>>()?;

	Ok(Some(tokio_rustls::TlsAcceptor::from(Arc::new(
		rustls::ServerConfig::builder()
			.with_no_client_auth()
			.with_single_cert(certs, key)?,
	))))
}

pub async fn run<G: GalleryGlobal>(global: Arc<G>) -> anyhow::Result<()> {
	let config = global.config::<ApiConfig>();

	tracing::info!("Listening on {}", config.bind_address);
	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.set_reuseport(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	let tls_acceptor = tls_acceptor(config).await?;

	// Connections only hold a weak reference to the global state so that an
	// idle keep-alive connection cannot keep the process from shutting down.
	let router = Arc::new(routes(&global));
	let service = service_fn(move |req| {
		let this = router.clone();
		async move { this.handle(req).await }
	});

	loop {
		select! {
			_ = global.ctx().done() => {
				return Ok(());
			},
			r = listener.accept() => {
				let (socket, addr) = r?;

				let service = service.clone();
				let tls_acceptor = tls_acceptor.clone();

				tracing::debug!("Accepted connection from {}", addr);

				tokio::spawn(async move {
					let http = http1::Builder::new();

					if let Some(tls_acceptor) = tls_acceptor {
						let Ok(Ok(socket)) = tls_acceptor.accept(socket).timeout(Duration::from_secs(5)).await else {
							return;
						};
						tracing::debug!("TLS handshake complete");
						http.serve_connection(
							TokioIo::new(socket),
							service,
						).await.ok();
					} else {
						http.serve_connection(
							TokioIo::new(socket),
							service,
						).await.ok();
					}
				});
			},
		}
	}
}
