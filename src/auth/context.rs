//! Parsing of host-platform tenant contexts (`stores/{hash}`).

// self
use crate::{_prelude::*, auth::TenantId};

const CONTEXT_PREFIX: &str = "stores/";

/// Tenant context string issued by the host platform alongside install callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantContext {
	raw: String,
	tenant: TenantId,
}
impl TenantContext {
	/// Parses `stores/{hash}` into a context bound to the hash's [`TenantId`].
	pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
		let raw = raw.as_ref().trim();
		let invalid = || Error::InvalidContext { context: raw.to_owned() };
		let hash = raw.strip_prefix(CONTEXT_PREFIX).ok_or_else(invalid)?;
		let tenant = TenantId::new(hash).map_err(|_| invalid())?;

		Ok(Self { raw: raw.to_owned(), tenant })
	}

	/// Tenant identifier with the `stores/` prefix stripped.
	pub fn tenant(&self) -> &TenantId {
		&self.tenant
	}

	/// Original context string as sent by the platform.
	pub fn as_str(&self) -> &str {
		&self.raw
	}
}
impl Display for TenantContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.raw)
	}
}
impl From<TenantContext> for String {
	fn from(value: TenantContext) -> Self {
		value.raw
	}
}
impl TryFrom<String> for TenantContext {
	type Error = Error;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn strips_the_stores_prefix() {
		let context = TenantContext::parse("stores/z4zn3wo").expect("Context should parse.");

		assert_eq!(&**context.tenant(), "z4zn3wo");
		assert_eq!(context.as_str(), "stores/z4zn3wo");
	}

	#[test]
	fn rejects_contexts_without_a_hash() {
		for raw in ["", "stores/", "z4zn3wo", "shops/z4zn3wo", "stores/has space"] {
			let err = TenantContext::parse(raw).expect_err("Malformed context must fail.");

			assert!(matches!(err, Error::InvalidContext { .. }), "{raw:?} produced {err:?}.");
		}
	}
}
