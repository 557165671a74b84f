//! Scope modeling for install grants.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized set of OAuth scopes granted to an installation.
///
/// Equality ignores the order and repetition the host platform lists scopes with. On the wire the
/// set is the space-delimited string the token endpoint expects.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Creates a normalized scope set from individual scope names.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		scopes
			.into_iter()
			.map(|scope| {
				let scope = scope.into();

				if scope.is_empty() {
					Err(ScopeValidationError::Empty)
				} else if scope.chars().any(char::is_whitespace) {
					Err(ScopeValidationError::ContainsWhitespace { scope })
				} else {
					Ok(scope)
				}
			})
			.collect::<Result<_, _>>()
			.map(Self)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains `scope`.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}

	/// Space-delimited, sorted representation.
	pub fn normalized(&self) -> String {
		self.0.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.normalized()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Parses a space-delimited scope string; the empty string is the empty set.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" => Ok(Self::default()),
			s if s.trim().is_empty() => Err(ScopeValidationError::Empty),
			s => Self::new(s.split_whitespace()),
		}
	}
}
impl TryFrom<String> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.trim().parse()
	}
}
impl From<ScopeSet> for String {
	fn from(value: ScopeSet) -> Self {
		value.normalized()
	}
}
