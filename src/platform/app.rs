//! App registration data shared by the exchanger and the signed payload verifier.

// crates.io
use oauth2::{ClientId, ClientSecret, RedirectUrl};
// self
use crate::{_prelude::*, auth::ScopeSet};

/// Token endpoint used by the host platform's identity provider.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://login.bigcommerce.com/oauth2/token";
/// Scope requested when the install callback does not echo one back.
pub const DEFAULT_SCOPE: &str = "store_v2_information store_v2_shipping";

/// Errors raised while constructing or validating an [`AppRegistration`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum RegistrationError {
	/// Client identifier is mandatory.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Client secret is mandatory; it also keys signed payload verification.
	#[error("Client secret cannot be empty.")]
	EmptyClientSecret,
	/// Redirect URI is mandatory and must match the one registered with the platform.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Endpoints must use HTTPS unless they point at the loopback interface.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint URL could not be parsed.
	#[error("Endpoint URL is invalid: {0}")]
	InvalidEndpoint(#[from] url::ParseError),
	/// Default scope string is malformed.
	#[error("Default scope is invalid: {0}")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}

/// Immutable app registration consumed by the exchanger.
#[derive(Clone)]
pub struct AppRegistration {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret; doubles as the signed payload shared secret.
	pub client_secret: ClientSecret,
	/// Redirect URI registered for the client; the token endpoint requires an exact match.
	pub redirect_uri: RedirectUrl,
	/// Identity provider token endpoint.
	pub token_endpoint: Url,
	/// Scope sent when the callback omits one.
	pub default_scope: ScopeSet,
}
impl AppRegistration {
	/// Creates a new builder for the provided client credentials.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> AppRegistrationBuilder {
		AppRegistrationBuilder::new(client_id.into(), client_secret.into())
	}
}
impl Debug for AppRegistration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppRegistration")
			.field("client_id", &self.client_id.as_str())
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("default_scope", &self.default_scope)
			.finish()
	}
}

/// Builder for [`AppRegistration`] values.
#[derive(Debug)]
pub struct AppRegistrationBuilder {
	client_id: String,
	client_secret: String,
	redirect_uri: Option<Url>,
	token_endpoint: Option<Url>,
	default_scope: Option<String>,
}
impl AppRegistrationBuilder {
	fn new(client_id: String, client_secret: String) -> Self {
		Self { client_id, client_secret, redirect_uri: None, token_endpoint: None, default_scope: None }
	}

	/// Sets the redirect URI registered with the platform.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the token endpoint (defaults to [`DEFAULT_TOKEN_ENDPOINT`]).
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the default install scope (defaults to [`DEFAULT_SCOPE`]).
	pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
		self.default_scope = Some(scope.into());

		self
	}

	/// Consumes the builder and validates the resulting registration.
	pub fn build(self) -> Result<AppRegistration, RegistrationError> {
		if self.client_id.trim().is_empty() {
			return Err(RegistrationError::EmptyClientId);
		}
		if self.client_secret.is_empty() {
			return Err(RegistrationError::EmptyClientSecret);
		}

		let redirect = self.redirect_uri.ok_or(RegistrationError::MissingRedirectUri)?;
		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => Url::parse(DEFAULT_TOKEN_ENDPOINT)?,
		};

		validate_endpoint("token", &token_endpoint)?;
		validate_endpoint("redirect", &redirect)?;

		let default_scope =
			ScopeSet::from_str(self.default_scope.as_deref().unwrap_or(DEFAULT_SCOPE))?;

		Ok(AppRegistration {
			client_id: ClientId::new(self.client_id),
			client_secret: ClientSecret::new(self.client_secret),
			redirect_uri: RedirectUrl::from_url(redirect),
			token_endpoint,
			default_scope,
		})
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), RegistrationError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(RegistrationError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
