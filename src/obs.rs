//! Optional observability helpers for broker and resolver flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `printer_player.flow` with
//!   the `flow` and `stage` fields, plus `warn` events when a catalog step degrades.
//! - Enable `metrics` to increment the `printer_player_flow_total` counter for every outcome,
//!   labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Access token acquisition through the refresh grant.
	TokenRefresh,
	/// Original release-year resolution against the catalog.
	YearResolution,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenRefresh => "token_refresh",
			FlowKind::YearResolution => "year_resolution",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Answered from cache without touching the network.
	CacheHit,
	/// Completed with a network round-trip.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// A lookup step failed and was absorbed.
	Degraded,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Degraded => "degraded",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
