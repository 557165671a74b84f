//! Credential storage contract and the built-in in-memory store.
//!
//! Persistence is a pluggable collaborator: anything that can get, set, and delete a
//! [`TenantCredential`] by [`TenantId`] atomically per key satisfies [`CredentialStore`].

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{TenantCredential, TenantId},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for tenant credentials.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the credential for a tenant, if present.
	fn get<'a>(&'a self, tenant: &'a TenantId) -> StoreFuture<'a, Option<TenantCredential>>;

	/// Persists or replaces the credential keyed by its tenant (last write wins).
	fn set(&self, credential: TenantCredential) -> StoreFuture<'_, ()>;

	/// Removes the tenant's credential, returning the removed value.
	fn delete<'a>(&'a self, tenant: &'a TenantId) -> StoreFuture<'a, Option<TenantCredential>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
