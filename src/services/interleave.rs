//! Test store that slips one write in between a service's read and its
//! atomic store call.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{
    NewProposal, NewUser, NewVote, Proposal, ProposalFilter, ProposalPatch, UnlockOutcome, User,
    Vote,
};
use crate::store::{FundStore, StoreResult, TallyDelta};

/// A write fired once by [`InterleavingStore`], right after the next
/// `get_proposal` returns or just before `release_stakes` runs.
pub enum Interleaved {
    RevokeApproval,
    CastVote(NewVote),
}

pub struct InterleavingStore {
    inner: Arc<dyn FundStore>,
    pending: Mutex<Option<Interleaved>>,
}

impl InterleavingStore {
    pub fn new(inner: Arc<dyn FundStore>) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    pub fn arm(&self, action: Interleaved) {
        *self.pending.lock().unwrap() = Some(action);
    }

    async fn fire(&self, proposal_id: i64) -> StoreResult<()> {
        let action = self.pending.lock().unwrap().take();
        match action {
            Some(Interleaved::RevokeApproval) => {
                self.inner.set_approval(proposal_id, false).await?;
            }
            Some(Interleaved::CastVote(ballot)) => {
                let tally = TallyDelta::for_vote(ballot.support, ballot.staked_amount);
                self.inner.create_vote(&ballot, tally).await?;
            }
            None => {}
        }
        Ok(())
    }
}

#[async_trait]
impl FundStore for InterleavingStore {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.inner.get_user_by_username(username).await
    }

    async fn create_proposal(&self, proposal: &NewProposal) -> StoreResult<Proposal> {
        self.inner.create_proposal(proposal).await
    }

    async fn list_proposals(&self, filter: &ProposalFilter) -> StoreResult<Vec<Proposal>> {
        self.inner.list_proposals(filter).await
    }

    async fn get_proposal(&self, id: i64) -> StoreResult<Option<Proposal>> {
        let snapshot = self.inner.get_proposal(id).await?;
        self.fire(id).await?;
        Ok(snapshot)
    }

    async fn update_proposal(
        &self,
        id: i64,
        patch: &ProposalPatch,
    ) -> StoreResult<Option<Proposal>> {
        self.inner.update_proposal(id, patch).await
    }

    async fn set_approval(&self, id: i64, approved: bool) -> StoreResult<Option<Proposal>> {
        self.inner.set_approval(id, approved).await
    }

    async fn set_impact_score(&self, id: i64, score: f64) -> StoreResult<Option<Proposal>> {
        self.inner.set_impact_score(id, score).await
    }

    async fn votes_for_proposal(&self, proposal_id: i64) -> StoreResult<Vec<Vote>> {
        self.inner.votes_for_proposal(proposal_id).await
    }

    async fn votes_by_voter(&self, voter_address: &str) -> StoreResult<Vec<Vote>> {
        self.inner.votes_by_voter(voter_address).await
    }

    async fn find_vote(
        &self,
        proposal_id: i64,
        voter_address: &str,
    ) -> StoreResult<Option<Vote>> {
        self.inner.find_vote(proposal_id, voter_address).await
    }

    async fn create_vote(&self, vote: &NewVote, tally: TallyDelta) -> StoreResult<(Vote, Proposal)> {
        self.inner.create_vote(vote, tally).await
    }

    async fn release_stakes(&self, proposal_id: i64) -> StoreResult<UnlockOutcome> {
        self.fire(proposal_id).await?;
        self.inner.release_stakes(proposal_id).await
    }
}
