//! Fan-out rate aggregation over a [`PricingProvider`].
//!
//! [`RateAggregator::quote`] discovers offerings, prices each one concurrently, keeps the
//! strictly positive costs, and substitutes the static [`RateQuote::fallback`] pair whenever
//! nothing live survives. Upstream failures never escape this module: each lookup is bounded by
//! the configured timeout and a failed lookup only drops its own offering.

pub mod model;

pub use model::*;

// std
use std::{num::NonZeroUsize, time::Duration as StdDuration};
// crates.io
use async_lock::Semaphore;
use futures::future;
use tokio::time;
// self
use crate::{
	_prelude::*,
	obs::{self, OpKind, OpOutcome, OpSpan},
	pricing::{PriceRequest, PricingProvider, ServiceOffering},
};

/// Per-call upstream deadline used unless overridden.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(8);
/// Currency attached to quotes unless overridden.
pub const DEFAULT_CURRENCY: &str = "CAD";

/// Why the aggregator served the static quote pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
	/// Discovery failed or timed out, or every price lookup failed.
	UpstreamUnavailable,
	/// The provider answered but offered nothing with a positive cost.
	NoQuotableOffering,
}
impl FallbackReason {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			FallbackReason::UpstreamUnavailable => "upstream_unavailable",
			FallbackReason::NoQuotableOffering => "no_quotable_offering",
		}
	}
}

/// Origin of the quotes in a [`RateSheet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteSource {
	/// At least one offering was priced live.
	Live,
	/// Static quotes were substituted.
	Fallback(FallbackReason),
}

/// Quotes returned to the host platform; `quotes` is never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSheet {
	/// Quotes in offering discovery order.
	pub quotes: Vec<RateQuote>,
	/// Whether the quotes are live.
	pub source: QuoteSource,
}
impl RateSheet {
	fn fallback(reason: FallbackReason, currency: &str) -> Self {
		Self { quotes: RateQuote::fallback(currency), source: QuoteSource::Fallback(reason) }
	}
}

enum Lookup {
	Priced(RateQuote),
	NotQuotable,
	Failed,
}

/// Aggregates quotes from every offering of a pricing provider.
#[derive(Clone)]
pub struct RateAggregator {
	provider: Arc<dyn PricingProvider>,
	timeout: StdDuration,
	max_concurrency: Option<NonZeroUsize>,
	currency: String,
}
impl RateAggregator {
	/// Creates an aggregator with the default timeout, unbounded fan-out, and currency.
	pub fn new(provider: Arc<dyn PricingProvider>) -> Self {
		Self {
			provider,
			timeout: DEFAULT_TIMEOUT,
			max_concurrency: None,
			currency: DEFAULT_CURRENCY.into(),
		}
	}

	/// Bounds every upstream call.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Caps the number of in-flight price lookups per quote; `None` means one per offering.
	pub fn with_max_concurrency(mut self, cap: Option<NonZeroUsize>) -> Self {
		self.max_concurrency = cap;

		self
	}

	/// Sets the currency attached to every quote.
	pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
		self.currency = currency.into();

		self
	}

	/// Returns the quotes for `request`; never empty.
	pub async fn get_rates(&self, request: &ShipmentQuoteRequest) -> Vec<RateQuote> {
		self.quote(request).await.quotes
	}

	/// Returns the quotes for `request` along with whether they are live.
	pub async fn quote(&self, request: &ShipmentQuoteRequest) -> RateSheet {
		const KIND: OpKind = OpKind::Rates;

		let span = OpSpan::new(KIND, "quote");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let sheet = span.instrument(self.quote_inner(request)).await;

		match sheet.source {
			QuoteSource::Live => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				tracing::info!(quotes = sheet.quotes.len(), "live rates served");
			},
			QuoteSource::Fallback(reason) => {
				obs::record_op_outcome(KIND, OpOutcome::Fallback);

				tracing::warn!(reason = reason.as_str(), "fallback rates served");
			},
		}

		sheet
	}

	async fn quote_inner(&self, request: &ShipmentQuoteRequest) -> RateSheet {
		let services = match time::timeout(self.timeout, self.provider.list_services()).await {
			Ok(Ok(services)) => services,
			Ok(Err(e)) => {
				tracing::warn!(error = %e, "service discovery failed");

				return RateSheet::fallback(FallbackReason::UpstreamUnavailable, &self.currency);
			},
			Err(_) => {
				tracing::warn!(
					timeout_ms = self.timeout.as_millis() as u64,
					"service discovery timed out"
				);

				return RateSheet::fallback(FallbackReason::UpstreamUnavailable, &self.currency);
			},
		};

		if services.is_empty() {
			tracing::info!("pricing provider listed no services");

			return RateSheet::fallback(FallbackReason::NoQuotableOffering, &self.currency);
		}

		let total_weight_kg = request.total_weight_kg();
		let semaphore = self.max_concurrency.map(|cap| Semaphore::new(cap.get()));
		let lookups = services
			.iter()
			.map(|service| self.price(service, request, total_weight_kg, semaphore.as_ref()));
		let mut answered = false;
		let mut quotes = Vec::with_capacity(services.len());

		for lookup in future::join_all(lookups).await {
			match lookup {
				Lookup::Priced(quote) => {
					answered = true;

					quotes.push(quote);
				},
				Lookup::NotQuotable => answered = true,
				Lookup::Failed => {},
			}
		}

		match (quotes.is_empty(), answered) {
			(false, _) => RateSheet { quotes, source: QuoteSource::Live },
			(true, true) => RateSheet::fallback(FallbackReason::NoQuotableOffering, &self.currency),
			(true, false) =>
				RateSheet::fallback(FallbackReason::UpstreamUnavailable, &self.currency),
		}
	}

	async fn price(
		&self,
		service: &ServiceOffering,
		request: &ShipmentQuoteRequest,
		total_weight_kg: Decimal,
		semaphore: Option<&Semaphore>,
	) -> Lookup {
		let _permit = match semaphore {
			Some(semaphore) => Some(semaphore.acquire().await),
			None => None,
		};
		let price_request = PriceRequest {
			service_id: service.id.clone(),
			pickup_address: request.origin.clone(),
			drop_address: request.destination.clone(),
			total_weight_kg,
			items: request.items.clone(),
		};

		match time::timeout(self.timeout, self.provider.get_price(&price_request)).await {
			Ok(Ok(cost)) if cost > Decimal::ZERO =>
				Lookup::Priced(RateQuote::for_offering(service, cost, &self.currency)),
			Ok(Ok(cost)) => {
				tracing::debug!(service = %service.id, %cost, "offering is not quotable");

				Lookup::NotQuotable
			},
			Ok(Err(e)) => {
				tracing::warn!(service = %service.id, error = %e, "price lookup failed");

				Lookup::Failed
			},
			Err(_) => {
				tracing::warn!(service = %service.id, "price lookup timed out");

				Lookup::Failed
			},
		}
	}
}
impl Debug for RateAggregator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateAggregator")
			.field("timeout", &self.timeout)
			.field("max_concurrency", &self.max_concurrency)
			.field("currency", &self.currency)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		auth::ServiceId,
		pricing::{PricingError, PricingFuture},
	};

	/// Provider returning canned costs keyed by service id, tracking in-flight lookups.
	#[derive(Default)]
	struct ScriptedProvider {
		services: Vec<ServiceOffering>,
		costs: HashMap<String, Option<Decimal>>,
		delay: Option<StdDuration>,
		in_flight: AtomicUsize,
		peak: AtomicUsize,
	}
	impl ScriptedProvider {
		fn with_service(mut self, id: &str, abbreviation: &str, cost: Option<Decimal>) -> Self {
			self.services.push(ServiceOffering {
				id: ServiceId::new(id).expect("Service id fixture should be valid."),
				name: format!("Service {id}"),
				abbreviation: abbreviation.into(),
			});
			self.costs.insert(id.into(), cost);

			self
		}
	}
	impl PricingProvider for ScriptedProvider {
		fn list_services(&self) -> PricingFuture<'_, Vec<ServiceOffering>> {
			Box::pin(async move { Ok(self.services.clone()) })
		}

		fn get_price<'a>(&'a self, request: &'a PriceRequest) -> PricingFuture<'a, Decimal> {
			Box::pin(async move {
				let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

				self.peak.fetch_max(now, Ordering::SeqCst);

				if let Some(delay) = self.delay {
					time::sleep(delay).await;
				}

				self.in_flight.fetch_sub(1, Ordering::SeqCst);

				match self.costs.get(&*request.service_id).copied().flatten() {
					Some(cost) => Ok(cost),
					None => Err(PricingError::Status { endpoint: "pricing.price", status: 500 }),
				}
			})
		}
	}

	struct DownProvider;
	impl PricingProvider for DownProvider {
		fn list_services(&self) -> PricingFuture<'_, Vec<ServiceOffering>> {
			Box::pin(async { Err(PricingError::Status { endpoint: "pricing.services", status: 503 }) })
		}

		fn get_price<'a>(&'a self, _: &'a PriceRequest) -> PricingFuture<'a, Decimal> {
			Box::pin(async { Err(PricingError::MissingCost { endpoint: "pricing.price" }) })
		}
	}

	fn shipment() -> ShipmentQuoteRequest {
		serde_json::from_value(serde_json::json!({
			"origin": { "postal_code": "L6H7T7" },
			"destination": { "postal_code": "M4B1B3" },
			"items": [{ "quantity": 1, "weight": { "value": 1, "units": "kg" } }]
		}))
		.expect("Shipment fixture should parse.")
	}

	#[tokio::test]
	async fn keeps_only_positive_costs() {
		let provider = ScriptedProvider::default()
			.with_service("1", "STD", Some(Decimal::ZERO))
			.with_service("2", "EXP", Some(Decimal::new(1899, 2)))
			.with_service("3", "ECO", Some(Decimal::new(-5, 0)));
		let sheet = RateAggregator::new(Arc::new(provider)).quote(&shipment()).await;

		assert_eq!(sheet.source, QuoteSource::Live);
		assert_eq!(sheet.quotes.len(), 1);
		assert_eq!(sheet.quotes[0].code, "exp");
		assert_eq!(sheet.quotes[0].cost, Decimal::new(1899, 2));
		assert_eq!(sheet.quotes[0].currency, DEFAULT_CURRENCY);
	}

	#[tokio::test]
	async fn failed_lookups_are_isolated() {
		let provider = ScriptedProvider::default()
			.with_service("1", "", None)
			.with_service("2", "", Some(Decimal::new(12, 0)));
		let quotes = RateAggregator::new(Arc::new(provider))
			.with_currency("USD")
			.get_rates(&shipment())
			.await;

		assert_eq!(quotes.len(), 1);
		assert_eq!(quotes[0].code, "service-2");
		assert_eq!(quotes[0].currency, "USD");
	}

	#[tokio::test]
	async fn fallback_reasons_distinguish_outage_from_no_offer() {
		let down = RateAggregator::new(Arc::new(DownProvider)).quote(&shipment()).await;
		let all_failed = RateAggregator::new(Arc::new(
			ScriptedProvider::default().with_service("1", "", None),
		))
		.quote(&shipment())
		.await;
		let none_positive = RateAggregator::new(Arc::new(
			ScriptedProvider::default().with_service("1", "", Some(Decimal::ZERO)),
		))
		.quote(&shipment())
		.await;
		let empty =
			RateAggregator::new(Arc::new(ScriptedProvider::default())).quote(&shipment()).await;

		assert_eq!(down.source, QuoteSource::Fallback(FallbackReason::UpstreamUnavailable));
		assert_eq!(all_failed.source, QuoteSource::Fallback(FallbackReason::UpstreamUnavailable));
		assert_eq!(none_positive.source, QuoteSource::Fallback(FallbackReason::NoQuotableOffering));
		assert_eq!(empty.source, QuoteSource::Fallback(FallbackReason::NoQuotableOffering));
		assert_eq!(down.quotes, RateQuote::fallback(DEFAULT_CURRENCY));
	}

	#[tokio::test(start_paused = true)]
	async fn slow_lookups_time_out_as_failures() {
		let provider = ScriptedProvider {
			delay: Some(StdDuration::from_secs(30)),
			..Default::default()
		}
		.with_service("1", "SD", Some(Decimal::ONE));
		let sheet = RateAggregator::new(Arc::new(provider))
			.with_timeout(StdDuration::from_secs(1))
			.quote(&shipment())
			.await;

		assert_eq!(sheet.source, QuoteSource::Fallback(FallbackReason::UpstreamUnavailable));
	}

	#[tokio::test(start_paused = true)]
	async fn concurrency_cap_limits_in_flight_lookups() {
		let mut provider = ScriptedProvider {
			delay: Some(StdDuration::from_millis(50)),
			..Default::default()
		};

		for id in 1..=6 {
			provider = provider.with_service(&id.to_string(), "", Some(Decimal::ONE));
		}

		let provider = Arc::new(provider);
		let quotes = RateAggregator::new(provider.clone())
			.with_max_concurrency(NonZeroUsize::new(2))
			.get_rates(&shipment())
			.await;

		assert_eq!(quotes.len(), 6);
		assert_eq!(provider.peak.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn unbounded_fan_out_runs_every_lookup_at_once() {
		let mut provider = ScriptedProvider {
			delay: Some(StdDuration::from_millis(50)),
			..Default::default()
		};

		for id in 1..=4 {
			provider = provider.with_service(&id.to_string(), "", Some(Decimal::ONE));
		}

		let provider = Arc::new(provider);
		let quotes = RateAggregator::new(provider.clone()).get_rates(&shipment()).await;

		assert_eq!(quotes.len(), 4);
		assert_eq!(provider.peak.load(Ordering::SeqCst), 4);
	}
}
