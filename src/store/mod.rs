//! Entity storage for users, proposals and votes.
//!
//! [`FundStore`] is the single capability set the services depend on. Two
//! backends implement it:
//! - [`MemoryStore`]: ordered maps behind one async lock, for development and
//!   tests
//! - [`DatabaseStore`]: sea-orm over the schema in the `migration` crate
//!
//! Identifiers are generated by the backend. Callers never supply them.

pub mod database;
pub mod memory;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::models::{
    NewProposal, NewUser, NewVote, Proposal, ProposalFilter, ProposalPatch, UnlockOutcome, User,
    Vote,
};

pub use database::DatabaseStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("proposal {0} does not exist")]
    MissingProposal(i64),
    #[error("proposal {0} is not approved for voting")]
    NotApproved(i64),
    #[error("wallet {voter_address} already voted on proposal {proposal_id}")]
    DuplicateVote {
        proposal_id: i64,
        voter_address: String,
    },
    #[error("username {0} is already registered")]
    UsernameTaken(String),
    #[error("tallies of proposal {0} would overflow")]
    TallyOverflow(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Counter increments a single vote applies to its proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallyDelta {
    pub votes_for: i64,
    pub votes_against: i64,
    pub raised_amount: i64,
    pub token_stake: i64,
}

impl TallyDelta {
    /// Supporting stakes count toward funding; every stake counts toward
    /// the proposal's locked total.
    pub fn for_vote(support: bool, staked_amount: i64) -> Self {
        assert!(staked_amount >= 0, "Stake must be non-negative");
        if support {
            Self {
                votes_for: 1,
                votes_against: 0,
                raised_amount: staked_amount,
                token_stake: staked_amount,
            }
        } else {
            Self {
                votes_for: 0,
                votes_against: 1,
                raised_amount: 0,
                token_stake: staked_amount,
            }
        }
    }

    /// Adds the delta to the proposal's counters. Leaves the proposal
    /// untouched and fails with [`StoreError::TallyOverflow`] if any counter
    /// would leave the `i64` range.
    pub fn apply_to(&self, proposal: &mut Proposal) -> StoreResult<()> {
        let id = proposal.id;
        let overflow = || StoreError::TallyOverflow(id);
        let votes_for = proposal
            .votes_for
            .checked_add(self.votes_for)
            .ok_or_else(overflow)?;
        let votes_against = proposal
            .votes_against
            .checked_add(self.votes_against)
            .ok_or_else(overflow)?;
        let raised_amount = proposal
            .raised_amount
            .checked_add(self.raised_amount)
            .ok_or_else(overflow)?;
        let token_stake = proposal
            .token_stake
            .checked_add(self.token_stake)
            .ok_or_else(overflow)?;

        proposal.votes_for = votes_for;
        proposal.votes_against = votes_against;
        proposal.raised_amount = raised_amount;
        proposal.token_stake = token_stake;
        Ok(())
    }
}

#[async_trait]
pub trait FundStore: Send + Sync {
    // ==================== Users ====================

    async fn create_user(&self, user: &NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    // ==================== Proposals ====================

    /// Persists an unapproved proposal with zeroed tallies and its initial
    /// impact score.
    async fn create_proposal(&self, proposal: &NewProposal) -> StoreResult<Proposal>;

    /// Proposals matching the filter, ascending by id.
    async fn list_proposals(&self, filter: &ProposalFilter) -> StoreResult<Vec<Proposal>>;

    async fn get_proposal(&self, id: i64) -> StoreResult<Option<Proposal>>;

    async fn update_proposal(&self, id: i64, patch: &ProposalPatch)
    -> StoreResult<Option<Proposal>>;

    async fn set_approval(&self, id: i64, approved: bool) -> StoreResult<Option<Proposal>>;

    async fn set_impact_score(&self, id: i64, score: f64) -> StoreResult<Option<Proposal>>;

    // ==================== Votes ====================

    async fn votes_for_proposal(&self, proposal_id: i64) -> StoreResult<Vec<Vote>>;

    async fn votes_by_voter(&self, voter_address: &str) -> StoreResult<Vec<Vote>>;

    async fn find_vote(&self, proposal_id: i64, voter_address: &str)
    -> StoreResult<Option<Vote>>;

    /// Inserts a locked vote and applies `tally` to its proposal as one
    /// all-or-nothing unit.
    ///
    /// The proposal is re-read inside the unit. Fails with
    /// [`StoreError::MissingProposal`], [`StoreError::NotApproved`],
    /// [`StoreError::DuplicateVote`] or [`StoreError::TallyOverflow`], checked
    /// in that order. On failure nothing is written.
    async fn create_vote(&self, vote: &NewVote, tally: TallyDelta) -> StoreResult<(Vote, Proposal)>;

    /// Settles a proposal's stakes in one unit. The funding state is read and
    /// the still-locked votes in scope are cleared without any vote landing in
    /// between. Funded proposals release supporters only, unfunded ones
    /// release everyone.
    async fn release_stakes(&self, proposal_id: i64) -> StoreResult<UnlockOutcome>;
}
