//! Observability helpers for bridge operations.
//!
//! Every core operation runs inside a span named `carrier_bridge.op` carrying the `op` and
//! `stage` fields. With the `metrics` feature enabled, each attempt/success/failure/fallback
//! increments the `carrier_bridge_op_total` counter labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Authorization code exchange at install time.
	Exchange,
	/// Signed payload verification on admin loads.
	Verify,
	/// Rate aggregation for checkout.
	Rates,
	/// Credential removal on uninstall.
	Uninstall,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Exchange => "exchange",
			OpKind::Verify => "verify",
			OpKind::Rates => "rates",
			OpKind::Uninstall => "uninstall",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Failure recovered locally by substituting static data.
	Fallback,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::Fallback => "fallback",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
