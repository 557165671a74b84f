//! Service configuration loaded from environment variables.
//!
//! Keys map onto [`AppConfig`] through the `config` crate: `BC_CLIENT_ID` becomes
//! `bc_client_id`, and a double underscore nests, so `PRICING__BASE_URL` becomes
//! `pricing.base_url`.

// std
use std::{num::NonZeroUsize, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	exchange::{DEFAULT_EXCHANGE_TIMEOUT, Exchanger},
	http::ReqwestHttpClient,
	platform::{AppRegistration, DEFAULT_TOKEN_ENDPOINT},
	pricing::{DEFAULT_API_KEY_HEADER, HttpPricingProvider},
	rates::{DEFAULT_CURRENCY, DEFAULT_TIMEOUT, RateAggregator},
	store::CredentialStore,
};

/// Top-level service configuration.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
	/// Interface the HTTP server binds to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port the HTTP server binds to.
	#[serde(default = "default_port")]
	pub port: u16,
	/// OAuth client identifier issued by the host platform.
	#[serde(default)]
	pub bc_client_id: String,
	/// OAuth client secret; also keys signed payload verification.
	#[serde(default)]
	pub bc_client_secret: String,
	/// Redirect URI registered for the client.
	#[serde(default)]
	pub bc_redirect_uri: Option<String>,
	/// Token endpoint override.
	#[serde(default = "default_token_url")]
	pub bc_token_url: String,
	/// Default install scope override; blank means the built-in default.
	#[serde(default)]
	pub bc_scope: Option<String>,
	/// Token endpoint deadline in seconds.
	#[serde(default = "default_exchange_timeout_secs")]
	pub bc_timeout_secs: u64,
	/// Upstream pricing provider settings.
	pub pricing: PricingConfig,
}
impl AppConfig {
	/// Loads and validates configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::load(None)
	}

	/// Loads and validates configuration from `source`, or from the process environment when
	/// `source` is `None`.
	pub fn load(source: Option<config::Map<String, String>>) -> Result<Self, ConfigError> {
		let config: Self = config::Config::builder()
			.add_source(
				config::Environment::default().separator("__").try_parsing(true).source(source),
			)
			.build()?
			.try_deserialize()?;

		config.validate()?;

		Ok(config)
	}

	/// Checks invariants the type system does not capture.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.bc_client_id.trim().is_empty() {
			return Err(invalid("bc_client_id", "must not be empty"));
		}
		if self.bc_client_secret.is_empty() {
			return Err(invalid("bc_client_secret", "must not be empty"));
		}
		if self.bc_timeout_secs == 0 {
			return Err(invalid("bc_timeout_secs", "must be greater than zero"));
		}
		if self.pricing.timeout_secs == 0 {
			return Err(invalid("pricing.timeout_secs", "must be greater than zero"));
		}
		if self.pricing.max_concurrency == Some(0) {
			return Err(invalid("pricing.max_concurrency", "must be greater than zero when set"));
		}

		Ok(())
	}

	/// Builds the validated app registration.
	pub fn registration(&self) -> Result<AppRegistration, ConfigError> {
		let mut builder = AppRegistration::builder(&self.bc_client_id, &self.bc_client_secret)
			.token_endpoint(Url::parse(&self.bc_token_url)?);

		if let Some(redirect) = non_blank(self.bc_redirect_uri.as_deref()) {
			builder = builder.redirect_uri(Url::parse(redirect)?);
		}
		if let Some(scope) = non_blank(self.bc_scope.as_deref()) {
			builder = builder.default_scope(scope);
		}

		Ok(builder.build()?)
	}

	/// Builds the exchanger over `store`, with token requests bounded by `bc_timeout_secs`.
	pub fn exchanger(&self, store: Arc<dyn CredentialStore>) -> Result<Exchanger, ConfigError> {
		Ok(Exchanger::with_http_client(
			store,
			self.registration()?,
			ReqwestHttpClient::with_timeout(StdDuration::from_secs(self.bc_timeout_secs))?,
		))
	}

	/// Builds the rate aggregator over the configured HTTP pricing provider.
	pub fn aggregator(&self) -> Result<RateAggregator, ConfigError> {
		let timeout = self.pricing.timeout();
		let mut provider = HttpPricingProvider::<ReqwestHttpClient>::with_http_client(
			Url::parse(&self.pricing.base_url)?,
			ReqwestHttpClient::with_timeout(timeout)?,
		)?
		.api_key_header(&self.pricing.api_key_header);

		if let Some(key) = non_blank(self.pricing.api_key.as_deref()) {
			provider = provider.api_key(key);
		}

		Ok(RateAggregator::new(Arc::new(provider))
			.with_timeout(timeout)
			.with_max_concurrency(self.pricing.max_concurrency.and_then(NonZeroUsize::new))
			.with_currency(&self.pricing.currency))
	}
}
impl Debug for AppConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("bc_client_id", &self.bc_client_id)
			.field("bc_client_secret", &"<redacted>")
			.field("bc_redirect_uri", &self.bc_redirect_uri)
			.field("bc_token_url", &self.bc_token_url)
			.field("bc_scope", &self.bc_scope)
			.field("bc_timeout_secs", &self.bc_timeout_secs)
			.field("pricing", &self.pricing)
			.finish()
	}
}

/// Pricing provider settings (`PRICING__*`).
#[derive(Clone, Deserialize)]
pub struct PricingConfig {
	/// Base URL the `services` and `price` endpoints hang off.
	pub base_url: String,
	/// API key sent with every request.
	#[serde(default)]
	pub api_key: Option<String>,
	/// Header carrying the API key.
	#[serde(default = "default_api_key_header")]
	pub api_key_header: String,
	/// Per-call deadline in seconds.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
	/// Cap on in-flight price lookups per quote; unset means one per offering.
	#[serde(default)]
	pub max_concurrency: Option<usize>,
	/// Currency attached to every quote.
	#[serde(default = "default_currency")]
	pub currency: String,
}
impl PricingConfig {
	/// Per-call deadline.
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.timeout_secs)
	}
}
impl Debug for PricingConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PricingConfig")
			.field("base_url", &self.base_url)
			.field("api_key_set", &self.api_key.is_some())
			.field("api_key_header", &self.api_key_header)
			.field("timeout_secs", &self.timeout_secs)
			.field("max_concurrency", &self.max_concurrency)
			.field("currency", &self.currency)
			.finish()
	}
}

fn default_host() -> String {
	"0.0.0.0".into()
}

fn default_port() -> u16 {
	3000
}

fn default_token_url() -> String {
	DEFAULT_TOKEN_ENDPOINT.into()
}

fn default_exchange_timeout_secs() -> u64 {
	DEFAULT_EXCHANGE_TIMEOUT.as_secs()
}

fn default_api_key_header() -> String {
	DEFAULT_API_KEY_HEADER.into()
}

fn default_timeout_secs() -> u64 {
	DEFAULT_TIMEOUT.as_secs()
}

fn default_currency() -> String {
	DEFAULT_CURRENCY.into()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
	ConfigError::InvalidSetting { field, reason }
}
