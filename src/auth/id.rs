//! Identifiers for installations and pricing-provider service offerings.
//!
//! A [`TenantId`] is the platform's store hash, so it is held to the hash alphabet. A
//! [`ServiceId`] comes from the pricing provider and is treated as opaque apart from trimming.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const STORE_HASH_MAX_LEN: usize = 64;
const SERVICE_ID_MAX_LEN: usize = 256;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// A store hash must be non-empty ASCII letters and digits.
	#[error("Store hash `{hash}` must be 1 to {max} ASCII letters or digits.")]
	InvalidStoreHash {
		/// Rejected input.
		hash: String,
		/// Maximum permitted length.
		max: usize,
	},
	/// Service identifiers cannot be blank.
	#[error("Service identifier cannot be blank.")]
	BlankServiceId,
	/// Service identifier exceeded the permitted length.
	#[error("Service identifier exceeds {max} characters.")]
	ServiceIdTooLong {
		/// Maximum permitted length.
		max: usize,
	},
}

// Read-only string views shared by both identifiers.
macro_rules! str_views {
	($name:ident) => {
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
	};
}

/// Store hash identifying a single installation of the app (`z4zn3wo` in `stores/z4zn3wo`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);
impl TenantId {
	/// Validates `hash` against the store hash alphabet; no trimming is applied.
	pub fn new(hash: impl Into<String>) -> Result<Self, IdentifierError> {
		let hash = hash.into();

		if hash.is_empty()
			|| hash.len() > STORE_HASH_MAX_LEN
			|| !hash.bytes().all(|b| b.is_ascii_alphanumeric())
		{
			return Err(IdentifierError::InvalidStoreHash { hash, max: STORE_HASH_MAX_LEN });
		}

		Ok(Self(hash))
	}
}
impl Debug for TenantId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TenantId({})", self.0)
	}
}
impl TryFrom<String> for TenantId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for TenantId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
str_views!(TenantId);

/// Identifier the pricing provider assigns to a service offering.
///
/// Numeric ids arrive as their decimal rendering. Surrounding whitespace is trimmed; anything
/// else is kept verbatim and sent back unchanged when pricing the offering.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);
impl ServiceId {
	/// Trims `id` and rejects blank or oversized values.
	pub fn new(id: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let id = id.as_ref().trim();

		if id.is_empty() {
			return Err(IdentifierError::BlankServiceId);
		}
		if id.chars().count() > SERVICE_ID_MAX_LEN {
			return Err(IdentifierError::ServiceIdTooLong { max: SERVICE_ID_MAX_LEN });
		}

		Ok(Self(id.to_owned()))
	}
}
impl Debug for ServiceId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ServiceId({})", self.0)
	}
}
impl TryFrom<String> for ServiceId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
str_views!(ServiceId);
