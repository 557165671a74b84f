//! Verification of the `signed_payload` the host platform attaches to admin-UI loads.
//!
//! A payload is `signature.data`: `data` is Base64-encoded JSON and `signature` is the Base64
//! HMAC-SHA256 of the still-encoded `data` segment, keyed by the app's client secret. Both the
//! standard and URL-safe Base64 alphabets are accepted for the signature, with or without
//! padding. Verification never panics and fails closed on any malformed input.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{TenantContext, TenantId},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

type HmacSha256 = Hmac<Sha256>;

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Returns true when `signed_payload` carries a valid signature for `shared_secret`.
pub fn verify(signed_payload: &str, shared_secret: &str) -> bool {
	SignedPayload::split(signed_payload).is_some_and(|payload| payload.verify(shared_secret))
}

/// Borrowed view over the two segments of a signed payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedPayload<'a> {
	signature: &'a str,
	data: &'a str,
}
impl<'a> SignedPayload<'a> {
	/// Splits `signature.data`; returns `None` unless there are exactly two non-empty segments.
	pub fn split(raw: &'a str) -> Option<Self> {
		let (signature, data) = raw.trim().split_once('.')?;

		if signature.is_empty() || data.is_empty() || data.contains('.') {
			return None;
		}

		Some(Self { signature, data })
	}

	/// Checks the signature segment against the HMAC of the encoded data segment.
	///
	/// The comparison runs in constant time over the digest bytes.
	pub fn verify(&self, shared_secret: &str) -> bool {
		if shared_secret.is_empty() {
			return false;
		}

		let Some(expected) = decode_base64(self.signature) else {
			return false;
		};
		let Ok(mut mac) = HmacSha256::new_from_slice(shared_secret.as_bytes()) else {
			return false;
		};

		mac.update(self.data.as_bytes());

		mac.verify_slice(&expected).is_ok()
	}

	/// Verifies `raw` and only then decodes its data segment.
	///
	/// Any failure, including a verified payload whose data is not the expected JSON, is reported
	/// as [`Error::SignatureInvalid`].
	pub fn decode(raw: &str, shared_secret: &str) -> Result<SignedPayloadData> {
		const KIND: OpKind = OpKind::Verify;

		let _span = OpSpan::new(KIND, "decode").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = SignedPayload::split(raw)
			.filter(|payload| payload.verify(shared_secret))
			.ok_or(Error::SignatureInvalid)
			.and_then(|payload| payload.data());

		match &result {
			Ok(data) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				tracing::debug!(tenant = %data.store_hash, "signed payload verified");
			},
			Err(_) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				tracing::warn!("signed payload rejected");
			},
		}

		result
	}

	fn data(&self) -> Result<SignedPayloadData> {
		let json = decode_base64(self.data).ok_or(Error::SignatureInvalid)?;
		let mut deserializer = serde_json::Deserializer::from_slice(&json);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			tracing::warn!(path = %e.path(), "signed payload data is malformed");

			Error::SignatureInvalid
		})
	}
}

/// Platform user embedded in a signed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadUser {
	/// Platform user identifier.
	pub id: u64,
	/// User email address.
	#[serde(default)]
	pub email: Option<String>,
}

/// Decoded contents of a verified signed payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedPayloadData {
	/// User opening the app.
	pub user: PayloadUser,
	/// Store owner.
	#[serde(default)]
	pub owner: Option<PayloadUser>,
	/// Tenant context (`stores/{hash}`).
	pub context: TenantContext,
	/// Tenant identifier.
	pub store_hash: TenantId,
	/// Unix timestamp at which the platform signed the payload.
	pub timestamp: f64,
}
impl SignedPayloadData {
	/// Signing instant, when the timestamp is representable.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		if !self.timestamp.is_finite() {
			return None;
		}

		OffsetDateTime::from_unix_timestamp(self.timestamp.trunc() as i64).ok()
	}
}

fn decode_base64(segment: &str) -> Option<Vec<u8>> {
	let normalized = segment
		.chars()
		.map(|c| match c {
			'-' => '+',
			'_' => '/',
			c => c,
		})
		.collect::<String>();

	LENIENT_BASE64.decode(normalized).ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const SECRET: &str = "shared-secret";
	const DATA: &str = "eyJ1c2VyIjp7ImlkIjo5MTI4LCJlbWFpbCI6Im93bmVyQGV4YW1wbGUuY29tIn0sIm93bmVyIjp7ImlkIjo5MTI4LCJlbWFpbCI6Im93bmVyQGV4YW1wbGUuY29tIn0sImNvbnRleHQiOiJzdG9yZXMvejR6bjN3byIsInN0b3JlX2hhc2giOiJ6NHpuM3dvIiwidGltZXN0YW1wIjoxNzAwMDAwMDAwfQ==";
	const SIGNATURE: &str = "xtqRwgqy4DF66V/vjql1k0aJ/3MI3rAJagmQsGxkw4s=";
	const SIGNATURE_URL_SAFE: &str = "xtqRwgqy4DF66V_vjql1k0aJ_3MI3rAJagmQsGxkw4s";

	fn payload(signature: &str, data: &str) -> String {
		format!("{signature}.{data}")
	}

	#[test]
	fn accepts_standard_and_url_safe_signatures() {
		assert!(verify(&payload(SIGNATURE, DATA), SECRET));
		assert!(verify(&payload(SIGNATURE_URL_SAFE, DATA), SECRET));
	}

	#[test]
	fn rejects_wrong_secret_and_tampered_data() {
		assert!(!verify(&payload(SIGNATURE, DATA), "other-secret"));
		assert!(!verify(&payload(SIGNATURE, DATA), ""));
		assert!(!verify(&payload(SIGNATURE, &DATA.replace("eyJ1", "eyJ2")), SECRET));
	}

	#[test]
	fn malformed_payloads_fail_closed() {
		for raw in ["", ".", "only-one-part", "sig.", ".data", "a.b.c", "!!!.data", "%%%%.eyJ9"] {
			assert!(!verify(raw, SECRET), "`{raw}` must not verify.");
		}

		assert!(!verify(&payload(&SIGNATURE[..20], DATA), SECRET));
	}

	#[test]
	fn decode_returns_payload_data_after_verification() {
		let data = SignedPayload::decode(&payload(SIGNATURE, DATA), SECRET)
			.expect("Signed payload fixture should decode.");

		assert_eq!(&*data.store_hash, "z4zn3wo");
		assert_eq!(data.context.tenant(), &data.store_hash);
		assert_eq!(data.user.id, 9128);
		assert_eq!(data.user.email.as_deref(), Some("owner@example.com"));
		assert_eq!(data.owner.as_ref().map(|owner| owner.id), Some(9128));
		assert_eq!(data.issued_at().map(|at| at.unix_timestamp()), Some(1_700_000_000));
	}

	#[test]
	fn decode_rejects_unverified_and_undecodable_payloads() {
		let err = SignedPayload::decode(&payload(SIGNATURE, DATA), "other-secret")
			.expect_err("Wrong secret should be rejected.");

		assert!(matches!(err, Error::SignatureInvalid));

		// Correctly signed, but the data segment is `not-json`.
		let err = SignedPayload::decode(
			"zkd6cskO998s/ia5z6VJi6CigTL2Vy2QLlunq5p6HwE=.bm90LWpzb24=",
			SECRET,
		)
		.expect_err("Non-JSON data should be rejected.");

		assert!(matches!(err, Error::SignatureInvalid));
	}
}
