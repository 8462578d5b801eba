//! In-memory store.
//!
//! All tables live behind a single `RwLock`, so every write (including the
//! vote-plus-tally update) is applied atomically with respect to readers and
//! other writers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{FundStore, StoreError, StoreResult, TallyDelta};
use crate::models::{
    NewProposal, NewUser, NewVote, Proposal, ProposalFilter, ProposalPatch, UnlockOutcome,
    UnlockScope, User, Vote,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    proposals: BTreeMap<i64, Proposal>,
    votes: BTreeMap<i64, Vote>,
    user_seq: i64,
    proposal_seq: i64,
    vote_seq: i64,
}

fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FundStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UsernameTaken(user.username.clone()));
        }
        let id = next_id(&mut tables.user_seq);
        let created = User {
            id,
            username: user.username.clone(),
            password: user.password.clone(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_proposal(&self, proposal: &NewProposal) -> StoreResult<Proposal> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let id = next_id(&mut tables.proposal_seq);
        let metrics = proposal.impact_metrics();
        let created = Proposal {
            id,
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            category: proposal.category.clone(),
            creator_address: proposal.creator_address.clone(),
            funding_goal: proposal.funding_goal,
            raised_amount: 0,
            votes_for: 0,
            votes_against: 0,
            duration: proposal.duration,
            created_at: Utc::now(),
            approved: false,
            metis_impact_score: metrics.score(),
            energy_efficiency: metrics.energy_efficiency,
            community_benefit: metrics.community_benefit,
            innovation_factor: metrics.innovation_factor,
            token_stake: 0,
        };
        tables.proposals.insert(id, created.clone());
        Ok(created)
    }

    async fn list_proposals(&self, filter: &ProposalFilter) -> StoreResult<Vec<Proposal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .proposals
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn get_proposal(&self, id: i64) -> StoreResult<Option<Proposal>> {
        let tables = self.tables.read().await;
        Ok(tables.proposals.get(&id).cloned())
    }

    async fn update_proposal(
        &self,
        id: i64,
        patch: &ProposalPatch,
    ) -> StoreResult<Option<Proposal>> {
        let mut tables = self.tables.write().await;
        Ok(tables.proposals.get_mut(&id).map(|proposal| {
            patch.apply_to(proposal);
            proposal.clone()
        }))
    }

    async fn set_approval(&self, id: i64, approved: bool) -> StoreResult<Option<Proposal>> {
        let mut tables = self.tables.write().await;
        Ok(tables.proposals.get_mut(&id).map(|proposal| {
            proposal.approved = approved;
            proposal.clone()
        }))
    }

    async fn set_impact_score(&self, id: i64, score: f64) -> StoreResult<Option<Proposal>> {
        let mut tables = self.tables.write().await;
        Ok(tables.proposals.get_mut(&id).map(|proposal| {
            proposal.metis_impact_score = score;
            proposal.clone()
        }))
    }

    async fn votes_for_proposal(&self, proposal_id: i64) -> StoreResult<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .filter(|v| v.proposal_id == proposal_id)
            .cloned()
            .collect())
    }

    async fn votes_by_voter(&self, voter_address: &str) -> StoreResult<Vec<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .filter(|v| v.voter_address == voter_address)
            .cloned()
            .collect())
    }

    async fn find_vote(
        &self,
        proposal_id: i64,
        voter_address: &str,
    ) -> StoreResult<Option<Vote>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes
            .values()
            .find(|v| v.proposal_id == proposal_id && v.voter_address == voter_address)
            .cloned())
    }

    async fn create_vote(&self, vote: &NewVote, tally: TallyDelta) -> StoreResult<(Vote, Proposal)> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(proposal) = tables.proposals.get_mut(&vote.proposal_id) else {
            return Err(StoreError::MissingProposal(vote.proposal_id));
        };
        if !proposal.approved {
            return Err(StoreError::NotApproved(vote.proposal_id));
        }
        let duplicate = tables
            .votes
            .values()
            .any(|v| v.proposal_id == vote.proposal_id && v.voter_address == vote.voter_address);
        if duplicate {
            return Err(StoreError::DuplicateVote {
                proposal_id: vote.proposal_id,
                voter_address: vote.voter_address.clone(),
            });
        }

        tally.apply_to(proposal)?;
        let updated = proposal.clone();

        let id = next_id(&mut tables.vote_seq);
        let created = Vote {
            id,
            proposal_id: vote.proposal_id,
            voter_address: vote.voter_address.clone(),
            support: vote.support,
            staked_amount: vote.staked_amount,
            locked: true,
            voted_at: Utc::now(),
        };
        tables.votes.insert(id, created.clone());
        Ok((created, updated))
    }

    async fn release_stakes(&self, proposal_id: i64) -> StoreResult<UnlockOutcome> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let Some(proposal) = tables.proposals.get(&proposal_id) else {
            return Err(StoreError::MissingProposal(proposal_id));
        };

        let funded = proposal.is_funded();
        let scope = UnlockScope::for_outcome(funded);
        let mut unlocked = 0;
        for vote in tables.votes.values_mut() {
            if vote.proposal_id == proposal_id && vote.locked && scope.includes(vote) {
                vote.locked = false;
                unlocked += 1;
            }
        }
        Ok(UnlockOutcome {
            proposal_id,
            funded,
            scope,
            unlocked,
        })
    }
}
