//! Tenant credential records and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TenantId, TokenSecret},
};

/// Errors produced by [`TenantCredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TenantCredentialBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Store user who completed the install, as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallingUser {
	/// Platform user identifier.
	pub id: u64,
	/// Optional username.
	#[serde(default)]
	pub username: Option<String>,
	/// Optional email address.
	#[serde(default)]
	pub email: Option<String>,
}

/// Access token held for one tenant, replaced wholesale on re-install.
#[derive(Clone, Serialize, Deserialize)]
pub struct TenantCredential {
	/// Tenant (store hash) the token was issued for.
	pub tenant: TenantId,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Scopes granted during the install.
	pub scope: ScopeSet,
	/// User who performed the install, when reported.
	pub user: Option<InstallingUser>,
	/// Instant the exchange completed.
	#[serde(with = "time::serde::rfc3339")]
	pub obtained_at: OffsetDateTime,
}
impl TenantCredential {
	/// Returns a builder for the provided tenant.
	pub fn builder(tenant: TenantId) -> TenantCredentialBuilder {
		TenantCredentialBuilder::new(tenant)
	}
}
impl Debug for TenantCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TenantCredential")
			.field("tenant", &self.tenant)
			.field("access_token", &"<redacted>")
			.field("scope", &self.scope)
			.field("user", &self.user)
			.field("obtained_at", &self.obtained_at)
			.finish()
	}
}

/// Builder for [`TenantCredential`].
#[derive(Clone, Debug)]
pub struct TenantCredentialBuilder {
	tenant: TenantId,
	access_token: Option<TokenSecret>,
	scope: ScopeSet,
	user: Option<InstallingUser>,
	obtained_at: Option<OffsetDateTime>,
}
impl TenantCredentialBuilder {
	fn new(tenant: TenantId) -> Self {
		Self { tenant, access_token: None, scope: ScopeSet::default(), user: None, obtained_at: None }
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the granted scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Records the installing user.
	pub fn user(mut self, user: Option<InstallingUser>) -> Self {
		self.user = user;

		self
	}

	/// Sets the instant the credential was obtained.
	pub fn obtained_at(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`TenantCredential`].
	///
	/// Empty tokens count as missing.
	pub fn build(self) -> Result<TenantCredential, TenantCredentialBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(TenantCredentialBuilderError::MissingAccessToken)?;

		Ok(TenantCredential {
			tenant: self.tenant,
			access_token,
			scope: self.scope,
			user: self.user,
			obtained_at: self.obtained_at.unwrap_or_else(OffsetDateTime::now_utc),
		})
	}
}
