//! Auth-domain identifiers, scope sets, tenant contexts, and stored credentials.

pub mod context;
pub mod credential;
pub mod id;
pub mod scope;
pub mod secret;

pub use context::*;
pub use credential::*;
pub use id::*;
pub use scope::*;
pub use secret::*;
