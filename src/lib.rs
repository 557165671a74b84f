//! Host-platform shipping carrier bridge: OAuth install exchange, signed-payload verification,
//! and fan-out rate quoting against an upstream pricing provider.
//!
//! The three core behaviors live in transport-agnostic modules ([`exchange`], [`signed`],
//! [`rates`]); [`server`] is a thin axum dispatch table over them.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod obs;
pub mod platform;
pub mod pricing;
pub mod rates;
pub mod server;
pub mod signed;
pub mod store;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		exchange::{DEFAULT_EXCHANGE_TIMEOUT, Exchanger},
		http::ReqwestHttpClient,
		platform::AppRegistration,
		store::{CredentialStore, MemoryStore},
	};

	/// Exchanger type alias used by reqwest-backed integration tests.
	pub type ReqwestTestExchanger = Exchanger<ReqwestHttpClient>;

	/// Builds an app registration whose token endpoint points at a local mock server.
	pub fn test_registration(token_endpoint: &str) -> AppRegistration {
		AppRegistration::builder("client-it", "secret-it")
			.token_endpoint(
				Url::parse(token_endpoint).expect("Mock token endpoint should parse successfully."),
			)
			.redirect_uri(
				Url::parse("https://carrier.example.com/api/auth/callback")
					.expect("Redirect URI fixture should parse successfully."),
			)
			.build()
			.expect("App registration fixture should build successfully.")
	}

	/// Constructs an [`Exchanger`] backed by an in-memory store and the default reqwest transport.
	pub fn build_reqwest_test_exchanger(
		registration: AppRegistration,
	) -> (ReqwestTestExchanger, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let exchanger = ReqwestTestExchanger::with_http_client(
			store,
			registration,
			ReqwestHttpClient::with_timeout(DEFAULT_EXCHANGE_TIMEOUT)
				.expect("Reqwest client should build successfully."),
		);

		(exchanger, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use rust_decimal::Decimal;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Binary-only dependencies.
use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
