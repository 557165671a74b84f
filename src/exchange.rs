//! Authorization code exchange performed when a merchant installs the app.
//!
//! [`Exchanger`] owns the HTTP transport, the credential store, and the validated
//! [`AppRegistration`]. A successful exchange persists exactly one [`TenantCredential`] keyed by
//! the tenant derived from the context; a rejected exchange never touches the store.

mod token;

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{AuthorizationCode, http::Method};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TenantContext, TenantCredential, TenantId},
	error::ConfigError,
	http::{self, ReqwestHttpClient, UpstreamHttpClient},
	obs::{self, OpKind, OpOutcome, OpSpan},
	platform::{AppRegistration, ExchangeRejection},
	store::CredentialStore,
};
use token::{TokenRequest, TokenResponse};

/// Deadline for a token endpoint round trip unless overridden.
pub const DEFAULT_EXCHANGE_TIMEOUT: StdDuration = StdDuration::from_secs(10);

const GRANT_TYPE: &str = "authorization_code";
const TOKEN_ENDPOINT_LABEL: &str = "token";

/// Exchanges install callbacks for tenant access tokens.
#[derive(Clone)]
pub struct Exchanger<C = ReqwestHttpClient>
where
	C: ?Sized + UpstreamHttpClient,
{
	/// HTTP client wrapper used for every token endpoint request.
	pub http_client: Arc<C>,
	/// Credential store receiving issued tokens.
	pub store: Arc<dyn CredentialStore>,
	/// App registration supplying client credentials and endpoints.
	pub registration: AppRegistration,
}
impl<C> Exchanger<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	/// Creates an exchanger that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		registration: AppRegistration,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self { http_client: http_client.into(), store, registration }
	}

	/// Trades an install `code` for an access token and stores it for the tenant.
	///
	/// `context` must be `stores/{hash}`. An empty `scope` falls back to the registration's
	/// default scope. The tenant is taken from the context echoed by the identity provider when
	/// present, otherwise from the request context.
	pub async fn exchange(
		&self,
		code: &str,
		context: &str,
		scope: &str,
	) -> Result<TenantCredential> {
		const KIND: OpKind = OpKind::Exchange;

		let span = OpSpan::new(KIND, "exchange");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.exchange_inner(code, context, scope)).await;

		match &result {
			Ok(credential) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				tracing::info!(
					tenant = %credential.tenant,
					scope = %credential.scope,
					"access token stored"
				);
			},
			Err(e) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				tracing::warn!(error = %e, "authorization code exchange failed");
			},
		}

		result
	}

	/// Returns the stored credential for a tenant, if any.
	pub async fn credential(&self, tenant: &TenantId) -> Result<Option<TenantCredential>> {
		Ok(self.store.get(tenant).await?)
	}

	/// Forgets the tenant's credential, returning the removed value.
	pub async fn uninstall(&self, tenant: &TenantId) -> Result<Option<TenantCredential>> {
		const KIND: OpKind = OpKind::Uninstall;

		let span = OpSpan::new(KIND, "uninstall");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.store.delete(tenant)).await.map_err(Error::from);

		match &result {
			Ok(removed) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				tracing::info!(tenant = %tenant, removed = removed.is_some(), "tenant uninstalled");
			},
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn exchange_inner(
		&self,
		code: &str,
		context: &str,
		scope: &str,
	) -> Result<TenantCredential> {
		let code = code.trim();
		let context = context.trim();

		if code.is_empty() {
			return Err(Error::MissingParameter { name: "code" });
		}
		if context.is_empty() {
			return Err(Error::MissingParameter { name: "context" });
		}

		let code = AuthorizationCode::new(code.to_owned());
		let requested_context = TenantContext::parse(context)?;
		let requested_scope = self.requested_scope(scope)?;
		let body = TokenRequest {
			client_id: self.registration.client_id.as_str(),
			client_secret: self.registration.client_secret.secret(),
			redirect_uri: self.registration.redirect_uri.as_str(),
			grant_type: GRANT_TYPE,
			code: code.secret(),
			scope: requested_scope.normalized(),
			context: requested_context.as_str(),
		};
		let request =
			http::json_request(Method::POST, &self.registration.token_endpoint, Some(&body), &[])?;
		let (response, meta) =
			http::send(self.http_client.as_ref(), TOKEN_ENDPOINT_LABEL, request).await?;
		let status = meta.and_then(|meta| meta.status).or(Some(response.status().as_u16()));
		let body = response.body();
		let reject = || Error::TokenExchangeFailed {
			rejection: Box::new(ExchangeRejection::from_response(status, body)),
		};

		if !response.status().is_success() {
			return Err(reject());
		}

		let parsed = match TokenResponse::parse(body) {
			Ok(parsed) => parsed,
			Err(e) => {
				tracing::warn!(path = %e.path(), "token response is malformed");

				return Err(reject());
			},
		};
		let Some(access_token) = parsed.issued_token() else {
			return Err(reject());
		};
		let context = match parsed.context.as_deref() {
			Some(echoed) if !echoed.trim().is_empty() => TenantContext::parse(echoed)?,
			_ => requested_context,
		};
		let credential = TenantCredential::builder(context.tenant().clone())
			.access_token(access_token)
			.scope(parsed.granted_scope(&requested_scope))
			.user(parsed.installing_user())
			.build()
			.map_err(|_| reject())?;

		self.store.set(credential.clone()).await?;

		Ok(credential)
	}

	fn requested_scope(&self, scope: &str) -> Result<ScopeSet> {
		let scope = scope.trim();

		if scope.is_empty() {
			return Ok(self.registration.default_scope.clone());
		}

		Ok(ScopeSet::from_str(scope).map_err(ConfigError::from)?)
	}
}
impl Exchanger<ReqwestHttpClient> {
	/// Creates an exchanger whose token requests give up after [`DEFAULT_EXCHANGE_TIMEOUT`].
	pub fn new(
		store: Arc<dyn CredentialStore>,
		registration: AppRegistration,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			store,
			registration,
			ReqwestHttpClient::with_timeout(DEFAULT_EXCHANGE_TIMEOUT)?,
		))
	}
}
impl<C> Debug for Exchanger<C>
where
	C: ?Sized + UpstreamHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Exchanger").field("registration", &self.registration).finish()
	}
}
