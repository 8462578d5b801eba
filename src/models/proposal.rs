use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::proposal;
use crate::services::impact::ImpactMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub creator_address: String,
    pub funding_goal: i64,
    pub raised_amount: i64,
    pub votes_for: i64,
    pub votes_against: i64,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
    pub metis_impact_score: f64,
    pub energy_efficiency: i32,
    pub community_benefit: i32,
    pub innovation_factor: i32,
    pub token_stake: i64,
}

impl Proposal {
    pub fn impact_metrics(&self) -> ImpactMetrics {
        ImpactMetrics {
            energy_efficiency: self.energy_efficiency,
            community_benefit: self.community_benefit,
            innovation_factor: self.innovation_factor,
        }
    }

    /// Whether supporting stakes have reached the funding goal.
    pub fn is_funded(&self) -> bool {
        self.raised_amount >= self.funding_goal
    }

    pub fn total_votes(&self) -> i64 {
        self.votes_for.saturating_add(self.votes_against)
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(i64::from(self.duration))
    }
}

impl From<proposal::Model> for Proposal {
    fn from(model: proposal::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            category: model.category,
            creator_address: model.creator_address,
            funding_goal: model.funding_goal,
            raised_amount: model.raised_amount,
            votes_for: model.votes_for,
            votes_against: model.votes_against,
            duration: model.duration,
            created_at: model.created_at.with_timezone(&Utc),
            approved: model.approved,
            metis_impact_score: model.metis_impact_score,
            energy_efficiency: model.energy_efficiency,
            community_benefit: model.community_benefit,
            innovation_factor: model.innovation_factor,
            token_stake: model.token_stake,
        }
    }
}

/// Submission payload from the proposal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub category: String,
    pub creator_address: String,
    pub funding_goal: i64,
    pub duration: i32,
    #[serde(default)]
    pub energy_efficiency: Option<i32>,
    #[serde(default)]
    pub community_benefit: Option<i32>,
    #[serde(default)]
    pub innovation_factor: Option<i32>,
}

impl NewProposal {
    /// Sub-metrics with absent values folded to zero.
    pub fn impact_metrics(&self) -> ImpactMetrics {
        ImpactMetrics {
            energy_efficiency: self.energy_efficiency.unwrap_or(0),
            community_benefit: self.community_benefit.unwrap_or(0),
            innovation_factor: self.innovation_factor.unwrap_or(0),
        }
    }
}

/// Descriptive fields a proposal may change after submission.
///
/// Tallies, approval and the impact score are not patchable. They only move
/// through voting, approval and score recalculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProposalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub funding_goal: Option<i64>,
    pub duration: Option<i32>,
    pub energy_efficiency: Option<i32>,
    pub community_benefit: Option<i32>,
    pub innovation_factor: Option<i32>,
}

impl ProposalPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn touches_impact_metrics(&self) -> bool {
        self.energy_efficiency.is_some()
            || self.community_benefit.is_some()
            || self.innovation_factor.is_some()
    }

    /// Merges the patch into an in-memory proposal.
    pub fn apply_to(&self, proposal: &mut Proposal) {
        if let Some(title) = &self.title {
            proposal.title = title.clone();
        }
        if let Some(description) = &self.description {
            proposal.description = description.clone();
        }
        if let Some(category) = &self.category {
            proposal.category = category.clone();
        }
        if let Some(funding_goal) = self.funding_goal {
            proposal.funding_goal = funding_goal;
        }
        if let Some(duration) = self.duration {
            proposal.duration = duration;
        }
        if let Some(value) = self.energy_efficiency {
            proposal.energy_efficiency = value;
        }
        if let Some(value) = self.community_benefit {
            proposal.community_benefit = value;
        }
        if let Some(value) = self.innovation_factor {
            proposal.innovation_factor = value;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub approved_only: bool,
    pub creator_address: Option<String>,
}

impl ProposalFilter {
    pub fn approved() -> Self {
        Self {
            approved_only: true,
            creator_address: None,
        }
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        if self.approved_only && !proposal.approved {
            return false;
        }
        match &self.creator_address {
            Some(creator) => &proposal.creator_address == creator,
            None => true,
        }
    }
}

/// Admin toggle payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: i64,
    pub approved: bool,
}
