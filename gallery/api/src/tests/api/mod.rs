use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use utils::context::Handler;
use utils::prelude::FutureTimeout;

use super::global::{create_user, memory_config, mock_global_state};
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::{AppConfig, JwtConfig};
use crate::database::{Session, User};
use crate::global::{GalleryState, GlobalConfig, GlobalState};
use crate::store::Store;

mod accounts;
mod albums;
mod jwt;
mod pagination;
mod photos;
mod routes;

/// A running api on a free port backed by the in-memory store and drive.
pub struct TestServer {
	pub global: Arc<GlobalState>,
	pub client: reqwest::Client,
	handler: Handler,
	handle: tokio::task::JoinHandle<anyhow::Result<()>>,
	port: u16,
}

impl TestServer {
	pub async fn start() -> Self {
		Self::start_with(memory_config()).await
	}

	pub async fn start_with(mut config: AppConfig) -> Self {
		let port = portpicker::pick_unused_port().expect("failed to pick port");
		config.api.bind_address = format!("127.0.0.1:{port}").parse().expect("failed to parse address");

		let (global, handler) = mock_global_state(config).await;
		let handle = tokio::spawn(crate::api::run(global.clone()));

		// We need to wait for the server to start
		tokio::time::sleep(Duration::from_millis(300)).await;

		let client = reqwest::Client::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("failed to build client");

		Self {
			global,
			client,
			handler,
			handle,
			port,
		}
	}

	pub fn url(&self, path: &str) -> String {
		format!("http://127.0.0.1:{}{path}", self.port)
	}

	pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
		self.client.get(self.url(path))
	}

	pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
		self.client.post(self.url(path))
	}

	pub async fn user(&self, username: &str, is_superuser: bool) -> User {
		create_user(&self.global, username, is_superuser).await
	}

	/// A bearer token for a fresh session of `user`.
	pub async fn token(&self, user: &User) -> String {
		let session = Session::new(user.id, chrono::Duration::hours(1));
		self.global
			.store()
			.create_session(&session)
			.await
			.expect("failed to create session");

		AuthJwtPayload::from(&session)
			.serialize(self.global.config::<JwtConfig>())
			.expect("failed to serialize token")
	}

	pub async fn shutdown(self) {
		let Self {
			global,
			client,
			handler,
			handle,
			..
		} = self;

		// The client uses Keep-Alive, so we need to drop it to release the global context
		drop(global);
		drop(client);

		handler
			.cancel()
			.timeout(Duration::from_secs(1))
			.await
			.expect("failed to cancel context");

		handle
			.timeout(Duration::from_secs(1))
			.await
			.expect("api did not stop")
			.expect("api panicked")
			.expect("api failed");
	}
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
	(header::AUTHORIZATION, format!("Bearer {token}"))
}

pub fn location(res: &reqwest::Response) -> Option<&str> {
	res.headers().get(header::LOCATION).and_then(|value| value.to_str().ok())
}
