//! Billing API access
//!
//! Period computation and the cost query capability.

mod client;
mod period;

pub use client::{extract_amount, CostExplorerSource, CostSource, BLENDED_COST};
pub use period::{BillingPeriod, DATE_FORMAT};
