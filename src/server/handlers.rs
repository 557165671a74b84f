//! Route handlers. Each one extracts its inputs and delegates to a core service.

// crates.io
use axum::{
	Json,
	body::Bytes,
	extract::{Query, State},
	response::Html,
};
// self
use crate::{
	_prelude::*,
	auth::TenantId,
	rates::{RateQuote, ShipmentQuoteRequest},
	server::AppState,
	signed::{SignedPayload, SignedPayloadData},
};

const CONNECTION_MESSAGE: &str = "Carrier connected successfully";

#[derive(Debug, Default, Deserialize)]
pub(super) struct CallbackParams {
	#[serde(default)]
	code: Option<String>,
	#[serde(default)]
	context: Option<String>,
	#[serde(default)]
	scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoadParams {
	#[serde(default)]
	signed_payload: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UninstallBody {
	#[serde(default)]
	store_hash: Option<String>,
}

/// Rate bodies arrive either bare or wrapped in `base_options`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RatesBody {
	Wrapped { base_options: ShipmentQuoteRequest },
	Bare(ShipmentQuoteRequest),
}
impl RatesBody {
	fn into_request(self) -> ShipmentQuoteRequest {
		match self {
			RatesBody::Wrapped { base_options } => base_options,
			RatesBody::Bare(request) => request,
		}
	}
}

#[derive(Serialize)]
pub(super) struct RatesResponse {
	data: Vec<RateQuote>,
}

#[derive(Serialize)]
pub(super) struct Acknowledgement {
	success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'static str>,
}

pub(super) async fn liveness() -> &'static str {
	"Carrier bridge is running"
}

pub(super) async fn auth_callback(
	State(state): State<AppState>,
	Query(params): Query<CallbackParams>,
) -> Result<Html<String>> {
	let credential = state
		.exchanger()
		.exchange(
			params.code.as_deref().unwrap_or_default(),
			params.context.as_deref().unwrap_or_default(),
			params.scope.as_deref().unwrap_or_default(),
		)
		.await?;

	Ok(Html(format!(
		"<h2>Carrier app installed successfully for {}</h2>",
		escape_html(&credential.tenant)
	)))
}

pub(super) async fn load(
	State(state): State<AppState>,
	Query(params): Query<LoadParams>,
) -> Result<Html<String>> {
	let data = SignedPayload::decode(
		params.signed_payload.as_deref().unwrap_or_default(),
		state.shared_secret(),
	)?;
	let installed = state.exchanger().credential(&data.store_hash).await?.is_some();

	Ok(Html(render_dashboard(&data, installed)))
}

pub(super) async fn connection() -> Json<Acknowledgement> {
	tracing::info!("connection check received");

	Json(Acknowledgement { success: true, message: Some(CONNECTION_MESSAGE) })
}

pub(super) async fn rates(State(state): State<AppState>, body: Bytes) -> Json<RatesResponse> {
	let request = match serde_json::from_slice::<RatesBody>(&body) {
		Ok(body) => body.into_request(),
		Err(e) => {
			tracing::warn!(error = %e, "rate request body is malformed; quoting an empty shipment");

			ShipmentQuoteRequest::default()
		},
	};

	tracing::info!(
		origin = request.origin.postal_code.as_deref().unwrap_or("-"),
		destination = request.destination.postal_code.as_deref().unwrap_or("-"),
		items = request.items.len(),
		"rate request received"
	);

	Json(RatesResponse { data: state.aggregator().get_rates(&request).await })
}

pub(super) async fn uninstall(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<Acknowledgement>> {
	let body = serde_json::from_slice::<UninstallBody>(&body).unwrap_or_else(|e| {
		tracing::warn!(error = %e, "uninstall body is malformed");

		UninstallBody::default()
	});
	let store_hash = body
		.store_hash
		.as_deref()
		.map(str::trim)
		.filter(|hash| !hash.is_empty())
		.ok_or(Error::MissingParameter { name: "store_hash" })?;
	let tenant = TenantId::new(store_hash)
		.map_err(|_| Error::InvalidContext { context: store_hash.to_owned() })?;

	state.exchanger().uninstall(&tenant).await?;

	Ok(Json(Acknowledgement { success: true, message: None }))
}

fn render_dashboard(data: &SignedPayloadData, installed: bool) -> String {
	let status = if installed {
		"Your app is connected. Live delivery quotes are enabled at checkout."
	} else {
		"No access token is stored for this store yet. Reinstall the app to finish setup."
	};
	let user = data.user.email.as_deref().unwrap_or("store user");

	format!(
		"<html>\
			<body style=\"font-family: Arial; text-align:center; margin-top:50px;\">\
				<h1>Carrier Dashboard</h1>\
				<p>Store: {store}</p>\
				<p>Signed in as {user}</p>\
				<p>{status}</p>\
			</body>\
		</html>",
		store = escape_html(&data.store_hash),
		user = escape_html(user),
	)
}

fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}

	escaped
}
