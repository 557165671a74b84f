//! Diagnostics for token endpoint responses that did not issue an access token.
//!
//! The classifier prefers structured OAuth fields (`error`, `error_description`), then falls
//! back to body text hints, and finally the HTTP status code.

// self
use crate::_prelude::*;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Likely cause of a failed authorization code exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
	/// Code expired, was already used, or was never issued.
	InvalidGrant,
	/// Client identifier or secret did not match the registration.
	InvalidClient,
	/// Redirect URI differs from the one registered for the client.
	RedirectMismatch,
	/// Provider-side or unclassified failure.
	Other,
}
impl RejectionKind {
	/// Returns a stable label suitable for logs and response bodies.
	pub const fn as_str(self) -> &'static str {
		match self {
			RejectionKind::InvalidGrant => "invalid_grant",
			RejectionKind::InvalidClient => "invalid_client",
			RejectionKind::RedirectMismatch => "redirect_mismatch",
			RejectionKind::Other => "other",
		}
	}
}

/// Upstream diagnostics captured when the token endpoint returns no `access_token`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRejection {
	/// HTTP status code returned by the token endpoint, when available.
	pub status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Bounded preview of the raw response body.
	pub body: String,
	/// Classified cause.
	pub kind: RejectionKind,
}
impl ExchangeRejection {
	/// Builds a rejection from the raw token endpoint response.
	pub fn from_response(status: Option<u16>, body: &[u8]) -> Self {
		let text = String::from_utf8_lossy(body);
		let (error, error_description) = extract_oauth_fields(&text);
		let kind = classify(status, error.as_deref(), error_description.as_deref(), &text);

		Self { status, error, error_description, body: truncate_preview(&text), kind }
	}

	/// Returns true when the identity provider rejected the request itself (4xx).
	pub fn is_client_error(&self) -> bool {
		matches!(self.status, Some(400..=499))
	}

	/// One-line description used by the error's `Display` implementation.
	pub fn summary(&self) -> String {
		let detail = self
			.error_description
			.as_deref()
			.or(self.error.as_deref())
			.unwrap_or("no access_token in response");

		match self.status {
			Some(status) => format!("{} (HTTP {status}): {detail}", self.kind.as_str()),
			None => format!("{}: {detail}", self.kind.as_str()),
		}
	}
}

fn extract_oauth_fields(text: &str) -> (Option<String>, Option<String>) {
	let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text) else {
		return (None, None);
	};
	let field = |name: &str| match map.get(name) {
		Some(serde_json::Value::String(value)) => Some(value.clone()),
		Some(serde_json::Value::Null) | None => None,
		Some(other) => Some(other.to_string()),
	};

	(field("error"), field("error_description"))
}

fn classify(
	status: Option<u16>,
	error: Option<&str>,
	error_description: Option<&str>,
	body: &str,
) -> RejectionKind {
	error
		.and_then(classify_text)
		.or_else(|| error_description.and_then(classify_text))
		.or_else(|| classify_text(body))
		.unwrap_or_else(|| classify_status(status))
}

fn classify_text(value: &str) -> Option<RejectionKind> {
	let lowered = value.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("redirect_uri") || text.contains("redirect uri") =>
			Some(RejectionKind::RedirectMismatch),
		text if text.contains("invalid_client")
			|| text.contains("client id")
			|| text.contains("client secret")
			|| text.contains("unauthorized_client") =>
			Some(RejectionKind::InvalidClient),
		text if text.contains("invalid_grant")
			|| text.contains("invalid code")
			|| text.contains("expired") =>
			Some(RejectionKind::InvalidGrant),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> RejectionKind {
	match status {
		Some(400 | 404 | 410) => RejectionKind::InvalidGrant,
		Some(401 | 403) => RejectionKind::InvalidClient,
		_ => RejectionKind::Other,
	}
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf: String = body.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn structured_fields_win_over_status() {
		let rejection = ExchangeRejection::from_response(
			Some(500),
			br#"{"error":"invalid_grant","error_description":"code already used"}"#,
		);

		assert_eq!(rejection.kind, RejectionKind::InvalidGrant);
		assert_eq!(rejection.error.as_deref(), Some("invalid_grant"));
		assert_eq!(rejection.error_description.as_deref(), Some("code already used"));
		assert!(!rejection.is_client_error());
		assert_eq!(rejection.summary(), "invalid_grant (HTTP 500): code already used");
	}

	#[test]
	fn free_text_errors_are_classified() {
		let redirect =
			ExchangeRejection::from_response(Some(400), br#"{"error":"Invalid redirect_uri."}"#);
		let client =
			ExchangeRejection::from_response(Some(401), br#"{"error":"Invalid client id."}"#);

		assert_eq!(redirect.kind, RejectionKind::RedirectMismatch);
		assert_eq!(client.kind, RejectionKind::InvalidClient);
		assert!(client.is_client_error());
	}

	#[test]
	fn non_json_bodies_fall_back_to_status_and_are_truncated() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let rejection = ExchangeRejection::from_response(Some(403), body.as_bytes());

		assert_eq!(rejection.kind, RejectionKind::InvalidClient);
		assert_eq!(rejection.error, None);
		assert_eq!(rejection.body.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(rejection.body.ends_with('…'));
	}

	#[test]
	fn success_status_without_token_is_other() {
		let rejection = ExchangeRejection::from_response(Some(200), br#"{"context":"stores/a"}"#);

		assert_eq!(rejection.kind, RejectionKind::Other);
		assert_eq!(rejection.summary(), "other (HTTP 200): no access_token in response");
	}
}
