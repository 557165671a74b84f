//! JSON-over-HTTP pricing provider.
//!
//! Endpoints are resolved relative to the configured base URL: `GET {base}/services` lists
//! offerings and `POST {base}/price` prices a shipment. The API key, when configured, is sent
//! verbatim in a configurable header.

// crates.io
use oauth2::http::Method;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::ServiceId,
	error::ConfigError,
	http::{self as transport, ReqwestHttpClient, UpstreamHttpClient},
	pricing::{PriceRequest, PricingError, PricingFuture, PricingProvider, ServiceOffering},
};

/// Header carrying the API key unless overridden.
pub const DEFAULT_API_KEY_HEADER: &str = "Authorization";

const SERVICES_ENDPOINT: &str = "pricing.services";
const PRICE_ENDPOINT: &str = "pricing.price";

/// [`PricingProvider`] backed by the upstream JSON API.
#[derive(Clone)]
pub struct HttpPricingProvider<C = ReqwestHttpClient>
where
	C: ?Sized + UpstreamHttpClient,
{
	http_client: Arc<C>,
	base_url: Url,
	api_key: Option<String>,
	api_key_header: String,
}
impl<C> HttpPricingProvider<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	/// Creates a provider rooted at `base_url` that reuses the caller-provided transport.
	pub fn with_http_client(
		base_url: Url,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		if base_url.cannot_be_a_base() {
			return Err(invalid_base_url());
		}

		Ok(Self {
			http_client: http_client.into(),
			base_url,
			api_key: None,
			api_key_header: DEFAULT_API_KEY_HEADER.into(),
		})
	}

	/// Sets the API key sent with every request. Empty keys are ignored.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into()).filter(|key| !key.is_empty());

		self
	}

	/// Overrides the header carrying the API key.
	pub fn api_key_header(mut self, name: impl Into<String>) -> Self {
		self.api_key_header = name.into();

		self
	}

	/// Base URL every endpoint is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, segment: &str) -> Result<Url, ConfigError> {
		let mut url = self.base_url.clone();

		url.path_segments_mut().map_err(|_| invalid_base_url())?.pop_if_empty().push(segment);

		Ok(url)
	}

	async fn call<T>(
		&self,
		endpoint: &'static str,
		method: Method,
		segment: &str,
		body: Option<&T>,
	) -> Result<Vec<u8>, PricingError>
	where
		T: ?Sized + Serialize,
	{
		let url = self.endpoint(segment).map_err(|e| PricingError::request(endpoint, e))?;
		let headers = match &self.api_key {
			Some(key) => vec![(self.api_key_header.as_str(), key.as_str())],
			None => Vec::new(),
		};
		let request = transport::json_request(method, &url, body, &headers)
			.map_err(|e| PricingError::request(endpoint, e))?;
		let (response, _) = transport::send(self.http_client.as_ref(), endpoint, request)
			.await
			.map_err(|e| PricingError::request(endpoint, e))?;
		let status = response.status();

		if !status.is_success() {
			return Err(PricingError::Status { endpoint, status: status.as_u16() });
		}

		Ok(response.into_body())
	}
}
impl HttpPricingProvider<ReqwestHttpClient> {
	/// Creates a provider with the default reqwest transport.
	pub fn new(base_url: Url) -> Result<Self, ConfigError> {
		Self::with_http_client(base_url, ReqwestHttpClient::default())
	}
}
impl<C> PricingProvider for HttpPricingProvider<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn list_services(&self) -> PricingFuture<'_, Vec<ServiceOffering>> {
		Box::pin(async move {
			let body =
				self.call::<()>(SERVICES_ENDPOINT, Method::GET, "services", None).await?;

			parse_services(&body)
		})
	}

	fn get_price<'a>(&'a self, request: &'a PriceRequest) -> PricingFuture<'a, Decimal> {
		Box::pin(async move {
			let body = self.call(PRICE_ENDPOINT, Method::POST, "price", Some(request)).await?;

			parse_cost(&body)
		})
	}
}
impl<C> Debug for HttpPricingProvider<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpPricingProvider")
			.field("base_url", &self.base_url.as_str())
			.field("api_key_header", &self.api_key_header)
			.field("api_key_set", &self.api_key.is_some())
			.finish()
	}
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
	Number(serde_json::Number),
	Text(String),
}
impl Display for WireId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			WireId::Number(n) => Display::fmt(n, f),
			WireId::Text(s) => f.write_str(s.trim()),
		}
	}
}

#[derive(Debug, Deserialize)]
struct WireService {
	id: WireId,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	abbreviation: Option<String>,
}
impl WireService {
	fn into_offering(self) -> Option<ServiceOffering> {
		let id = match ServiceId::new(self.id.to_string()) {
			Ok(id) => id,
			Err(e) => {
				tracing::warn!(error = %e, "skipping service offering with an invalid id");

				return None;
			},
		};
		let abbreviation = self.abbreviation.unwrap_or_default().trim().to_owned();
		let name = self
			.name
			.map(|name| name.trim().to_owned())
			.filter(|name| !name.is_empty())
			.unwrap_or_else(|| {
				if abbreviation.is_empty() { id.to_string() } else { abbreviation.clone() }
			});

		Some(ServiceOffering { id, name, abbreviation })
	}
}

fn parse_services(body: &[u8]) -> Result<Vec<ServiceOffering>, PricingError> {
	let malformed = |path: &str, message: String| PricingError::Malformed {
		endpoint: SERVICES_ENDPOINT,
		path: path.to_owned(),
		message,
	};
	let value: Value = serde_json::from_slice(body).map_err(|e| malformed(".", e.to_string()))?;
	let list = match value {
		Value::Array(_) => value,
		Value::Object(mut map) => map
			.remove("services")
			.or_else(|| map.remove("data"))
			.ok_or_else(|| malformed("services", "service list is missing".into()))?,
		_ => return Err(malformed(".", "expected an object or an array".into())),
	};
	let services: Vec<WireService> = serde_path_to_error::deserialize(list)
		.map_err(|e| malformed(&e.path().to_string(), e.inner().to_string()))?;

	Ok(services.into_iter().filter_map(WireService::into_offering).collect())
}

fn parse_cost(body: &[u8]) -> Result<Decimal, PricingError> {
	let value: Value = serde_json::from_slice(body).map_err(|e| PricingError::Malformed {
		endpoint: PRICE_ENDPOINT,
		path: ".".into(),
		message: e.to_string(),
	})?;
	let cost = value
		.pointer("/data/cost")
		.or_else(|| value.get("cost"))
		.filter(|cost| !cost.is_null())
		.ok_or(PricingError::MissingCost { endpoint: PRICE_ENDPOINT })?;
	let parsed = match cost {
		Value::Number(n) => parse_decimal(&n.to_string()),
		Value::String(s) => parse_decimal(s.trim()),
		_ => None,
	};

	parsed.ok_or_else(|| PricingError::Malformed {
		endpoint: PRICE_ENDPOINT,
		path: "cost".into(),
		message: format!("`{cost}` is not a decimal amount"),
	})
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
	Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)).ok()
}

fn invalid_base_url() -> ConfigError {
	ConfigError::InvalidSetting {
		field: "pricing.base_url",
		reason: "must be an absolute hierarchical URL",
	}
}
