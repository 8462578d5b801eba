use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FundError, FundResult};
use crate::store::FundStore;

pub const ENERGY_EFFICIENCY_WEIGHT: f64 = 0.4;
pub const COMMUNITY_BENEFIT_WEIGHT: f64 = 0.4;
pub const INNOVATION_FACTOR_WEIGHT: f64 = 0.2;

pub const MIN_METRIC: i32 = 1;
pub const MAX_METRIC: i32 = 10;
pub const MAX_IMPACT_SCORE: f64 = 10.0;

/// Submitter-rated sub-metrics. Zero means the metric was not supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetrics {
    pub energy_efficiency: i32,
    pub community_benefit: i32,
    pub innovation_factor: i32,
}

impl ImpactMetrics {
    pub fn new(energy_efficiency: i32, community_benefit: i32, innovation_factor: i32) -> Self {
        Self {
            energy_efficiency,
            community_benefit,
            innovation_factor,
        }
    }

    /// Weighted score in `[0, 10]`.
    pub fn score(&self) -> f64 {
        let weighted = f64::from(self.energy_efficiency) * ENERGY_EFFICIENCY_WEIGHT
            + f64::from(self.community_benefit) * COMMUNITY_BENEFIT_WEIGHT
            + f64::from(self.innovation_factor) * INNOVATION_FACTOR_WEIGHT;
        weighted.clamp(0.0, MAX_IMPACT_SCORE)
    }
}

/// A supplied metric must be within `1..=10`.
pub fn validate_metric(name: &str, value: i32) -> FundResult<i32> {
    if !(MIN_METRIC..=MAX_METRIC).contains(&value) {
        return Err(FundError::invalid_input(format!(
            "{name} must be between {MIN_METRIC} and {MAX_METRIC}"
        )));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct ImpactScoreCalculator {
    store: Arc<dyn FundStore>,
}

impl ImpactScoreCalculator {
    pub fn new(store: Arc<dyn FundStore>) -> Self {
        Self { store }
    }

    /// Recomputes the score from the proposal's stored sub-metrics and
    /// persists it.
    pub async fn calculate_metis_impact_score(&self, proposal_id: i64) -> FundResult<f64> {
        let proposal = self
            .store
            .get_proposal(proposal_id)
            .await?
            .ok_or(FundError::proposal_not_found(proposal_id))?;

        let score = proposal.impact_metrics().score();
        self.store
            .set_impact_score(proposal_id, score)
            .await?
            .ok_or(FundError::proposal_not_found(proposal_id))?;

        debug!("Impact score for proposal {proposal_id} set to {score:.2}");
        Ok(score)
    }
}
