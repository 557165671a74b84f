//! Carrier bridge service entry point.

// crates.io
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use carrier_bridge::{config::AppConfig, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = AppConfig::from_env()?;

	tracing::info!(?config, "configuration loaded");

	server::serve(config).await?;

	Ok(())
}
