//! Shipment and quote shapes exchanged with the host platform.

// self
use crate::{_prelude::*, pricing::ServiceOffering};

/// Shipment details posted by the host platform when a buyer reaches checkout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentQuoteRequest {
	/// Where the parcel is picked up.
	#[serde(default, alias = "origin_address")]
	pub origin: Address,
	/// Where the parcel is delivered.
	#[serde(default, alias = "destination_address")]
	pub destination: Address,
	/// Items in the parcel.
	#[serde(default)]
	pub items: Vec<Item>,
}
impl ShipmentQuoteRequest {
	/// Total shipment weight in kilograms.
	///
	/// Items whose weight overflows are left out of the sum.
	pub fn total_weight_kg(&self) -> Decimal {
		self.items
			.iter()
			.filter_map(Item::weight_kg)
			.fold(Decimal::ZERO, |total, weight| total.saturating_add(weight))
	}
}

/// Postal address; every field is optional because platforms send partial addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
	/// Postal or ZIP code.
	#[serde(alias = "zip", skip_serializing_if = "Option::is_none")]
	pub postal_code: Option<String>,
	/// First street line.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address1: Option<String>,
	/// Second street line.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address2: Option<String>,
	/// City name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	/// State or province.
	#[serde(alias = "province", alias = "state_iso2", skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// ISO 3166-1 alpha-2 country code.
	#[serde(alias = "country", skip_serializing_if = "Option::is_none")]
	pub country_iso2: Option<String>,
}

/// One line of the shipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
	/// Number of identical units.
	#[serde(default = "default_quantity")]
	pub quantity: u32,
	/// Weight of a single unit.
	#[serde(default)]
	pub weight: Weight,
}
impl Item {
	/// Line weight (`quantity` × unit weight) in kilograms, or `None` on overflow.
	pub fn weight_kg(&self) -> Option<Decimal> {
		self.weight.kilograms()?.checked_mul(Decimal::from(self.quantity))
	}
}

/// Weight measurement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight {
	/// Magnitude in `units`.
	#[serde(default, with = "rust_decimal::serde::float")]
	pub value: Decimal,
	/// Unit of `value`.
	#[serde(default)]
	pub units: WeightUnit,
}
impl Weight {
	/// Converts to kilograms, or `None` on overflow.
	pub fn kilograms(&self) -> Option<Decimal> {
		self.value.checked_mul(self.units.kilograms_per_unit())
	}
}

/// Supported weight units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
	/// Kilograms.
	#[default]
	Kg,
	/// Grams.
	G,
	/// Pounds.
	#[serde(alias = "lbs")]
	Lb,
	/// Ounces.
	Oz,
}
impl WeightUnit {
	/// Conversion factor to kilograms.
	pub fn kilograms_per_unit(self) -> Decimal {
		match self {
			WeightUnit::Kg => Decimal::ONE,
			WeightUnit::G => Decimal::new(1, 3),
			WeightUnit::Lb => Decimal::new(45_359_237, 8),
			WeightUnit::Oz => Decimal::new(28_349_523_125, 12),
		}
	}
}

/// Normalized quote returned to the host platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
	/// Stable service code.
	pub code: String,
	/// Name shown to the buyer.
	pub display_name: String,
	/// Price of the service.
	#[serde(with = "rust_decimal::serde::float")]
	pub cost: Decimal,
	/// ISO 4217 currency code.
	pub currency: String,
}
impl RateQuote {
	/// Builds the quote for a priced offering.
	///
	/// The code is the lowercased abbreviation, or `service-{id}` when the offering has none.
	pub fn for_offering(offering: &ServiceOffering, cost: Decimal, currency: &str) -> Self {
		let abbreviation = offering.abbreviation.trim();
		let code = if abbreviation.is_empty() {
			format!("service-{}", offering.id)
		} else {
			abbreviation.to_lowercase()
		};

		Self { code, display_name: offering.name.clone(), cost, currency: currency.to_owned() }
	}

	/// Static quote pair served when nothing live is available.
	pub fn fallback(currency: &str) -> Vec<Self> {
		vec![
			Self {
				code: "standard".into(),
				display_name: "Standard Shipping".into(),
				cost: Decimal::new(105, 1),
				currency: currency.to_owned(),
			},
			Self {
				code: "express".into(),
				display_name: "Express Shipping".into(),
				cost: Decimal::new(25, 0),
				currency: currency.to_owned(),
			},
		]
	}
}

fn default_quantity() -> u32 {
	1
}
