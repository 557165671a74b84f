//! Thread-safe in-memory [`CredentialStore`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::{TenantCredential, TenantId},
	store::{CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<TenantId, TenantCredential>>>;

/// Process-local credential table; contents are lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of tenants currently holding a credential.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no tenant holds a credential.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn set_now(map: StoreMap, credential: TenantCredential) -> Result<(), StoreError> {
		map.write().insert(credential.tenant.clone(), credential);

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn get<'a>(&'a self, tenant: &'a TenantId) -> StoreFuture<'a, Option<TenantCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(tenant).cloned()) })
	}

	fn set(&self, credential: TenantCredential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, credential) })
	}

	fn delete<'a>(&'a self, tenant: &'a TenantId) -> StoreFuture<'a, Option<TenantCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(tenant)) })
	}
}
