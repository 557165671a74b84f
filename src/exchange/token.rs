//! Wire types for the identity provider's token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{InstallingUser, ScopeSet},
};

/// JSON body posted to the token endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
	pub client_id: &'a str,
	pub client_secret: &'a str,
	pub redirect_uri: &'a str,
	pub grant_type: &'static str,
	pub code: &'a str,
	pub scope: String,
	pub context: &'a str,
}

/// Successful (or partially successful) token endpoint body.
///
/// Every field is optional so a missing `access_token` is reported as a rejection instead of a
/// parse failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
	#[serde(default)]
	pub access_token: Option<String>,
	#[serde(default)]
	pub scope: Option<String>,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default)]
	pub user: Option<serde_json::Value>,
}
impl TokenResponse {
	/// Parses a token endpoint body, reporting the JSON path of the first malformed field.
	pub fn parse(body: &[u8]) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
	}

	/// Returns the access token if one was issued.
	pub fn issued_token(&self) -> Option<&str> {
		self.access_token.as_deref().filter(|token| !token.is_empty())
	}

	/// Granted scopes, falling back to what was requested when the provider omits or garbles them.
	pub fn granted_scope(&self, requested: &ScopeSet) -> ScopeSet {
		self.scope
			.as_deref()
			.and_then(|raw| ScopeSet::from_str(raw.trim()).ok())
			.filter(|scope| !scope.is_empty())
			.unwrap_or_else(|| requested.clone())
	}

	/// Installing user, ignored when the provider's shape does not match.
	pub fn installing_user(&self) -> Option<InstallingUser> {
		self.user.clone().and_then(|value| serde_json::from_value(value).ok())
	}
}
