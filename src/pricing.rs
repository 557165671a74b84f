//! Pricing provider contract consumed by the rate aggregator.
//!
//! A provider lists the shipping service offerings it supports and prices a shipment for one
//! offering at a time. [`HttpPricingProvider`] speaks the upstream JSON API; tests inject fakes
//! through the [`PricingProvider`] trait.

pub mod http;

pub use http::*;

// self
use crate::{
	_prelude::*,
	auth::ServiceId,
	rates::{Address, Item},
};

/// Boxed future returned by [`PricingProvider`] operations.
pub type PricingFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, PricingError>> + 'a + Send>>;

/// Upstream pricing provider.
pub trait PricingProvider
where
	Self: Send + Sync,
{
	/// Lists the service offerings currently available.
	fn list_services(&self) -> PricingFuture<'_, Vec<ServiceOffering>>;

	/// Prices one shipment for a single offering.
	fn get_price<'a>(&'a self, request: &'a PriceRequest) -> PricingFuture<'a, Decimal>;
}

/// Errors produced by [`PricingProvider`] implementations.
///
/// These never reach the host platform; the aggregator treats each one as a failed lookup.
#[derive(Debug, ThisError)]
pub enum PricingError {
	/// Request could not be built or sent.
	#[error("Pricing request to {endpoint} failed.")]
	Request {
		/// Logical endpoint being called.
		endpoint: &'static str,
		/// Transport or configuration failure.
		#[source]
		source: Box<Error>,
	},
	/// Upstream answered with a non-success status.
	#[error("Pricing endpoint {endpoint} returned HTTP {status}.")]
	Status {
		/// Logical endpoint being called.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
	},
	/// Upstream body did not match the expected shape.
	#[error("Pricing response from {endpoint} is malformed at `{path}`: {message}.")]
	Malformed {
		/// Logical endpoint being called.
		endpoint: &'static str,
		/// JSON path of the offending value.
		path: String,
		/// Parser message.
		message: String,
	},
	/// Upstream body carried no usable cost.
	#[error("Pricing response from {endpoint} carries no cost.")]
	MissingCost {
		/// Logical endpoint being called.
		endpoint: &'static str,
	},
}
impl PricingError {
	/// Wraps a crate error raised while calling `endpoint`.
	pub fn request(endpoint: &'static str, source: impl Into<Error>) -> Self {
		Self::Request { endpoint, source: Box::new(source.into()) }
	}
}

/// One shipping option exposed by the pricing provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
	/// Provider-side service identifier.
	pub id: ServiceId,
	/// Human-readable service name.
	pub name: String,
	/// Short service code; may be blank.
	#[serde(default)]
	pub abbreviation: String,
}

/// Body sent to the provider's price endpoint for one offering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceRequest {
	/// Offering being priced.
	pub service_id: ServiceId,
	/// Shipment origin.
	pub pickup_address: Address,
	/// Shipment destination.
	pub drop_address: Address,
	/// Sum of item weights, in kilograms.
	#[serde(with = "rust_decimal::serde::float")]
	pub total_weight_kg: Decimal,
	/// Items as received from the host platform.
	pub items: Vec<Item>,
}
