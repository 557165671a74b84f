//! Inbound HTTP surface: a thin axum dispatch table over the exchanger, the signed payload
//! verifier, and the rate aggregator.

mod handlers;

// crates.io
use axum::{
	Json, Router,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	config::AppConfig,
	error::TransportError,
	exchange::Exchanger,
	rates::RateAggregator,
	store::{CredentialStore, MemoryStore},
};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
	exchanger: Arc<Exchanger>,
	aggregator: Arc<RateAggregator>,
}
impl AppState {
	/// Bundles the core services behind cheap clones.
	pub fn new(exchanger: Exchanger, aggregator: RateAggregator) -> Self {
		Self { exchanger: Arc::new(exchanger), aggregator: Arc::new(aggregator) }
	}

	/// Exchanger handling installs and uninstalls.
	pub fn exchanger(&self) -> &Exchanger {
		&self.exchanger
	}

	/// Aggregator answering rate requests.
	pub fn aggregator(&self) -> &RateAggregator {
		&self.aggregator
	}

	fn shared_secret(&self) -> &str {
		self.exchanger.registration.client_secret.secret()
	}
}

/// Builds the router for every inbound route.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(handlers::liveness))
		.route("/api/auth/callback", get(handlers::auth_callback))
		.route("/api/load", get(handlers::load))
		.route("/api/uninstall", post(handlers::uninstall))
		.route("/api/rates", post(handlers::rates))
		.route("/v1/shipping/connection", get(handlers::connection).post(handlers::connection))
		.route("/v1/shipping/rates", post(handlers::rates))
		.with_state(state)
}

/// Wires the in-memory store, binds the listener, and serves until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let state = AppState::new(config.exchanger(store)?, config.aggregator()?);
	let listener =
		TcpListener::bind((config.host.as_str(), config.port)).await.map_err(TransportError::from)?;
	let addr = listener.local_addr().map_err(TransportError::from)?;

	tracing::info!(%addr, "carrier bridge listening");

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(TransportError::from)?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for the shutdown signal");
	}

	tracing::info!("shutting down");
}

fn status_of(error: &Error) -> StatusCode {
	match error {
		Error::MissingParameter { .. } | Error::InvalidContext { .. } => StatusCode::BAD_REQUEST,
		Error::TokenExchangeFailed { rejection } if rejection.is_client_error() =>
			StatusCode::BAD_REQUEST,
		Error::TokenExchangeFailed { .. } | Error::Transport(_) => StatusCode::BAD_GATEWAY,
		Error::SignatureInvalid => StatusCode::UNAUTHORIZED,
		Error::Storage(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

#[derive(Serialize)]
struct ErrorBody<'a> {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	upstream: Option<&'a crate::platform::ExchangeRejection>,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = status_of(&self);

		if status.is_server_error() {
			tracing::error!(error = %self, status = status.as_u16(), "request failed");
		}

		let error = match status {
			StatusCode::INTERNAL_SERVER_ERROR => "Internal server error.".to_owned(),
			_ => self.to_string(),
		};
		let upstream = match &self {
			Error::TokenExchangeFailed { rejection } => Some(&**rejection),
			_ => None,
		};

		(status, Json(ErrorBody { error, upstream })).into_response()
	}
}
