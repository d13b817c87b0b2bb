//! Cost Explorer client
//!
//! `CostSource` is the seam between the refresher and the billing API.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::types::{DateInterval, Granularity, ResultByTime};
use aws_sdk_costexplorer::Client;
use tracing::debug;

use super::period::BillingPeriod;
use crate::config::AwsConfig;
use crate::error::FetchError;

/// Cost Explorer metric requested for every slot
pub const BLENDED_COST: &str = "BlendedCost";

/// Source of cost figures for a billing period
#[async_trait]
pub trait CostSource: Send + Sync {
    /// Total cost for `period`
    async fn fetch_cost(&self, period: &BillingPeriod) -> Result<f64, FetchError>;
}

/// `CostSource` backed by AWS Cost Explorer `GetCostAndUsage`
pub struct CostExplorerSource {
    client: Client,
}

impl CostExplorerSource {
    /// Build a client from the default AWS credential chain and the configured region
    pub async fn from_config(config: &AwsConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CostSource for CostExplorerSource {
    async fn fetch_cost(&self, period: &BillingPeriod) -> Result<f64, FetchError> {
        let interval = DateInterval::builder()
            .start(period.start_str())
            .end(period.end_str())
            .build()
            .map_err(|e| FetchError::InvalidPeriod(e.to_string()))?;

        debug!(%period, "Querying Cost Explorer");

        let output = self
            .client
            .get_cost_and_usage()
            .time_period(interval)
            .granularity(Granularity::Monthly)
            .metrics(BLENDED_COST)
            .send()
            .await
            .map_err(|e| FetchError::Request(DisplayErrorContext(e).to_string()))?;

        extract_amount(output.results_by_time())
    }
}

/// Blended cost amount of the single expected result bucket
pub fn extract_amount(results: &[ResultByTime]) -> Result<f64, FetchError> {
    let bucket = results.first().ok_or(FetchError::MissingResult)?;

    let amount = bucket
        .total()
        .and_then(|total| total.get(BLENDED_COST))
        .and_then(|metric| metric.amount())
        .ok_or(FetchError::MissingAmount {
            metric: BLENDED_COST,
        })?;

    amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::InvalidAmount {
            value: amount.to_string(),
        })
}
