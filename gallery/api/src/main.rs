use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio::signal::unix::SignalKind;
use tokio::{select, time};
use utils::context::Context;
use utils::{logging, signal};

use crate::cli::{Cli, Commands, CreateUser};
use crate::config::AppConfig;
use crate::database::User;
use crate::global::setup_store;
use crate::store::{PgStore, Store, StoreError};

mod access;
mod api;
mod cli;
mod config;
mod database;
mod drive;
mod forms;
mod global;
mod store;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let config = AppConfig::parse(cli.config_file.as_deref())
		.map_err(|err| {
			// still report why we are exiting
			if let Err(err) = logging::init("info", Default::default()) {
				eprintln!("failed to init logging: {err}");
			}

			err
		})
		.context("failed to parse config")?;

	logging::init(&config.logging.level, config.logging.mode).context("failed to init logging")?;

	if let Some(file) = &config.config_file {
		tracing::info!(file = file, "loaded config from file");
	}

	match cli.command.unwrap_or(Commands::Serve) {
		Commands::Serve => serve(config).await,
		Commands::Migrate => migrate(config).await,
		Commands::CreateUser(args) => create_user(config, args).await,
	}
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
	let (ctx, handler) = Context::new();

	tracing::info!(name = %config.name, "starting up");

	let global = Arc::new(
		global::GlobalState::new(ctx, config)
			.await
			.context("failed to create global state")?,
	);

	tracing::debug!("global state created, starting api");

	let api_future = tokio::spawn(api::run(global));

	// Listen on both sigint and sigterm and cancel the context when either is received
	let mut signal_handler = signal::SignalHandler::new()
		.with_signal(SignalKind::interrupt())?
		.with_signal(SignalKind::terminate())?;

	select! {
		_ = signal_handler.recv() => tracing::info!("shutting down"),
		r = api_future => tracing::error!("api stopped unexpectedly: {:#}", match &r {
			Ok(Ok(())) => &"no error raised" as &dyn std::fmt::Display,
			Err(err) => err as &dyn std::fmt::Display,
			Ok(Err(err)) => err as &dyn std::fmt::Display,
		}),
	}

	tracing::info!("waiting for tasks to finish");

	select! {
		_ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
		_ = signal_handler.recv() => tracing::warn!("force shutting down"),
		_ = handler.cancel() => tracing::info!("shutting down"),
	}

	Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
	if config.database.is_memory() {
		anyhow::bail!("the in-memory store has no migrations");
	}

	let store = PgStore::connect(&config.database).await?;
	store.migrate().await.context("failed to run migrations")?;

	tracing::info!("migrations applied");

	Ok(())
}

async fn create_user(config: AppConfig, args: CreateUser) -> anyhow::Result<()> {
	if config.database.is_memory() {
		tracing::warn!("creating a user in the in-memory store, it is lost on exit");
	}

	User::validate_username(&args.username).map_err(|err| anyhow::anyhow!(err))?;

	let store = setup_store(&config.database).await?;

	let user = User::new(args.username, &args.password, args.superuser)
		.map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;

	match store.create_user(&user).await {
		Ok(()) => {}
		Err(StoreError::UsernameTaken) => anyhow::bail!("username {} is already taken", user.username),
		Err(err) => return Err(err).context("failed to create user"),
	}

	tracing::info!(user_id = %user.id, username = %user.username, superuser = user.is_superuser, "user created");

	Ok(())
}
