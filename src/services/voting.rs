use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{FundError, FundResult};
use crate::models::{NewVote, VoteReceipt};
use crate::store::{FundStore, TallyDelta};
use crate::wallet::sanitize_wallet_address;

pub const MIN_STAKE: i64 = 1;

#[derive(Clone)]
pub struct VotingService {
    store: Arc<dyn FundStore>,
}

impl VotingService {
    pub fn new(store: Arc<dyn FundStore>) -> Self {
        Self { store }
    }

    /// Records one vote and moves the proposal's tallies with it.
    ///
    /// Checks run in order: proposal exists, proposal approved, wallet has not
    /// voted, stake is at least [`MIN_STAKE`]. The final insert re-checks
    /// existence, approval and duplicates inside the store's atomic unit, so
    /// a racing submission or a revoked approval still fails the same way.
    /// Stakes that would push a tally past `i64::MAX` are invalid input.
    pub async fn submit_vote(&self, ballot: NewVote) -> FundResult<VoteReceipt> {
        let ballot = NewVote {
            voter_address: sanitize_wallet_address(&ballot.voter_address)?,
            ..ballot
        };
        let proposal_id = ballot.proposal_id;

        let proposal = self
            .store
            .get_proposal(proposal_id)
            .await?
            .ok_or(FundError::proposal_not_found(proposal_id))?;

        if !proposal.approved {
            debug!(
                "Rejected vote from {} on unapproved proposal {proposal_id}",
                ballot.voter_address
            );
            return Err(FundError::InvalidState(format!(
                "proposal {proposal_id} is not approved for voting"
            )));
        }

        if self
            .store
            .find_vote(proposal_id, &ballot.voter_address)
            .await?
            .is_some()
        {
            debug!(
                "Rejected duplicate vote from {} on proposal {proposal_id}",
                ballot.voter_address
            );
            return Err(FundError::DuplicateVote {
                proposal_id,
                voter_address: ballot.voter_address,
            });
        }

        if ballot.staked_amount < MIN_STAKE {
            return Err(FundError::invalid_input(format!(
                "stakedAmount must be at least {MIN_STAKE}"
            )));
        }

        let tally = TallyDelta::for_vote(ballot.support, ballot.staked_amount);
        let (vote, proposal) = self.store.create_vote(&ballot, tally).await?;
        assert!(vote.locked, "New votes must start locked");

        info!(
            "Vote {} recorded on proposal {proposal_id}: {} staking {} (for {}, against {}, raised {}/{})",
            vote.id,
            if vote.support { "for" } else { "against" },
            vote.staked_amount,
            proposal.votes_for,
            proposal.votes_against,
            proposal.raised_amount,
            proposal.funding_goal
        );
        Ok(VoteReceipt { vote, proposal })
    }
}
