use anyhow::Context as _;
use utils::context::Context;

use crate::config::{ApiConfig, AppConfig, DatabaseConfig, GalleryConfig, JwtConfig, MediaConfig};
use crate::drive::{build_drive, AnyDrive};
use crate::store::{AnyStore, MemoryStore, PgStore};

pub trait GlobalCtx {
	fn ctx(&self) -> &Context;
}

pub trait GlobalConfigProvider<C> {
	fn provide_config(&self) -> &C;
}

pub trait GlobalConfig {
	#[inline(always)]
	fn config<C>(&self) -> &C
	where
		Self: GlobalConfigProvider<C>,
	{
		GlobalConfigProvider::provide_config(self)
	}
}

pub trait GalleryState {
	fn store(&self) -> &AnyStore;

	fn drive(&self) -> &AnyDrive;
}

pub trait GalleryGlobal:
	GlobalCtx
	+ GlobalConfigProvider<ApiConfig>
	+ GlobalConfigProvider<JwtConfig>
	+ GlobalConfigProvider<MediaConfig>
	+ GlobalConfigProvider<GalleryConfig>
	+ GlobalConfig
	+ GalleryState
	+ Send
	+ Sync
	+ 'static
{
}

impl<T> GalleryGlobal for T where
	T: GlobalCtx
		+ GlobalConfigProvider<ApiConfig>
		+ GlobalConfigProvider<JwtConfig>
		+ GlobalConfigProvider<MediaConfig>
		+ GlobalConfigProvider<GalleryConfig>
		+ GlobalConfig
		+ GalleryState
		+ Send
		+ Sync
		+ 'static
{
}

pub struct GlobalState {
	ctx: Context,
	config: AppConfig,
	store: AnyStore,
	drive: AnyDrive,
}

impl GlobalState {
	pub async fn new(ctx: Context, config: AppConfig) -> anyhow::Result<Self> {
		let store = setup_store(&config.database).await?;

		tracing::debug!("setting up media drive");
		let drive = build_drive(&config.media.drive).await.context("failed to set up media drive")?;

		Ok(Self {
			ctx,
			config,
			store,
			drive,
		})
	}
}

pub async fn setup_store(config: &DatabaseConfig) -> anyhow::Result<AnyStore> {
	if config.is_memory() {
		tracing::warn!("using the in-memory store, nothing will be persisted");
		return Ok(AnyStore::Memory(MemoryStore::new()));
	}

	tracing::debug!("setting up database pool");
	let store = PgStore::connect(config).await?;

	if config.auto_migrate {
		store.migrate().await.context("failed to run migrations")?;
	}

	Ok(AnyStore::Postgres(store))
}

impl GlobalCtx for GlobalState {
	#[inline(always)]
	fn ctx(&self) -> &Context {
		&self.ctx
	}
}

impl GlobalConfig for GlobalState {}

impl GlobalConfigProvider<ApiConfig> for GlobalState {
	#[inline(always)]
	fn provide_config(&self) -> &ApiConfig {
		&self.config.api
	}
}

impl GlobalConfigProvider<JwtConfig> for GlobalState {
	#[inline(always)]
	fn provide_config(&self) -> &JwtConfig {
		&self.config.jwt
	}
}

impl GlobalConfigProvider<MediaConfig> for GlobalState {
	#[inline(always)]
	fn provide_config(&self) -> &MediaConfig {
		&self.config.media
	}
}

impl GlobalConfigProvider<GalleryConfig> for GlobalState {
	#[inline(always)]
	fn provide_config(&self) -> &GalleryConfig {
		&self.config.gallery
	}
}

impl GalleryState for GlobalState {
	#[inline(always)]
	fn store(&self) -> &AnyStore {
		&self.store
	}

	#[inline(always)]
	fn drive(&self) -> &AnyDrive {
		&self.drive
	}
}
