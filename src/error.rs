//! Bridge-level error types shared across the exchanger, verifier, stores, and server.

// self
use crate::_prelude::*;

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical bridge error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A required query or body field was absent or empty.
	#[error("Missing required parameter `{name}`.")]
	MissingParameter {
		/// Name of the missing parameter.
		name: &'static str,
	},
	/// The tenant context could not be mapped onto a tenant identifier.
	#[error("Tenant context `{context}` is not of the form `stores/{{tenant}}`.")]
	InvalidContext {
		/// Context string supplied by the caller or the identity provider.
		context: String,
	},
	/// The identity provider did not issue an access token.
	#[error("Token exchange failed: {}.", .rejection.summary())]
	TokenExchangeFailed {
		/// Diagnostics captured from the upstream response.
		rejection: Box<crate::platform::ExchangeRejection>,
	},
	/// A signed payload failed verification.
	#[error("Signed payload failed verification.")]
	SignatureInvalid,
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and validation failures raised by the bridge.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
	/// An endpoint URL could not be joined or parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint(#[from] url::ParseError),
	/// App registration failed validation.
	#[error(transparent)]
	Registration(#[from] crate::platform::RegistrationError),
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Scope string failed validation.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Environment-sourced settings could not be loaded.
	#[error("Settings could not be loaded.")]
	Settings(#[from] config::ConfigError),
	/// A loaded setting violates an invariant.
	#[error("Setting `{field}` is invalid: {reason}.")]
	InvalidSetting {
		/// Setting name.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Logical endpoint being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The upstream call exceeded its deadline.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Logical endpoint being called.
		endpoint: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Bridge error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn missing_parameter_names_the_field() {
		let error = Error::MissingParameter { name: "code" };

		assert_eq!(error.to_string(), "Missing required parameter `code`.");
	}
}
