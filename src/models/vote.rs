use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::vote;

use super::proposal::Proposal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub proposal_id: i64,
    pub voter_address: String,
    pub support: bool,
    pub staked_amount: i64,
    pub locked: bool,
    pub voted_at: DateTime<Utc>,
}

impl From<vote::Model> for Vote {
    fn from(model: vote::Model) -> Self {
        Self {
            id: model.id,
            proposal_id: model.proposal_id,
            voter_address: model.voter_address,
            support: model.support,
            staked_amount: model.staked_amount,
            locked: model.locked,
            voted_at: model.voted_at.with_timezone(&Utc),
        }
    }
}

/// Ballot payload from the voting UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVote {
    pub proposal_id: i64,
    pub voter_address: String,
    pub support: bool,
    #[serde(default)]
    pub staked_amount: i64,
}

/// A recorded vote together with the proposal totals it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub vote: Vote,
    pub proposal: Proposal,
}

/// Which votes a token unlock releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockScope {
    SupportersOnly,
    All,
}

impl UnlockScope {
    /// Funded proposals release supporting stakes only.
    pub fn for_outcome(funded: bool) -> Self {
        if funded {
            UnlockScope::SupportersOnly
        } else {
            UnlockScope::All
        }
    }

    pub fn includes(self, vote: &Vote) -> bool {
        match self {
            UnlockScope::SupportersOnly => vote.support,
            UnlockScope::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockOutcome {
    pub proposal_id: i64,
    pub funded: bool,
    pub scope: UnlockScope,
    pub unlocked: u64,
}
