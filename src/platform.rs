//! Host-platform app registration (data) and token-endpoint rejection diagnostics.
//!
//! `app` exposes the validated [`AppRegistration`] covering the client credentials, the
//! registered redirect URI, the token endpoint, and the default install scope. `rejection`
//! turns an upstream response without an access token into an [`ExchangeRejection`] that is
//! surfaced to the caller verbatim for diagnosis.

pub mod app;
pub mod rejection;

pub use app::*;
pub use rejection::*;
