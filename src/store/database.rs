//! Relational store on sea-orm.
//!
//! Vote recording runs inside a transaction that locks the proposal row
//! (`FOR UPDATE` where the backend supports it), re-checks approval and any
//! existing vote, inserts, and bumps the counters with in-database
//! `col = col + n` expressions. Stake release takes the same row lock before
//! deciding its scope. The unique `(proposal_id, voter_address)` index turns
//! a lost race into [`StoreError::DuplicateVote`].

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use tracing::debug;

use super::{FundStore, StoreError, StoreResult, TallyDelta};
use crate::entities::{proposal, user, vote};
use crate::models::{
    NewProposal, NewUser, NewVote, Proposal, ProposalFilter, ProposalPatch, UnlockOutcome,
    UnlockScope, User, Vote,
};

#[derive(Clone)]
pub struct DatabaseStore {
    database: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn find_proposal_model(&self, id: i64) -> StoreResult<Option<proposal::Model>> {
        Ok(proposal::Entity::find_by_id(id).one(&self.database).await?)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Inserts a locked vote. The unique `(proposal_id, voter_address)` index is
/// the last word on duplicates, so its violation maps to
/// [`StoreError::DuplicateVote`].
async fn insert_locked_vote<C: ConnectionTrait>(
    connection: &C,
    ballot: &NewVote,
) -> StoreResult<vote::Model> {
    let model = vote::ActiveModel {
        id: NotSet,
        proposal_id: Set(ballot.proposal_id),
        voter_address: Set(ballot.voter_address.clone()),
        support: Set(ballot.support),
        staked_amount: Set(ballot.staked_amount),
        locked: Set(true),
        voted_at: Set(Utc::now().fixed_offset()),
    };
    model.insert(connection).await.map_err(|err| {
        if is_unique_violation(&err) {
            StoreError::DuplicateVote {
                proposal_id: ballot.proposal_id,
                voter_address: ballot.voter_address.clone(),
            }
        } else {
            StoreError::Database(err)
        }
    })
}

#[async_trait]
impl FundStore for DatabaseStore {
    async fn create_user(&self, new_user: &NewUser) -> StoreResult<User> {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new_user.username.clone()),
            password: Set(new_user.password.clone()),
        };
        let inserted = model.insert(&self.database).await.map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::UsernameTaken(new_user.username.clone())
            } else {
                StoreError::Database(err)
            }
        })?;
        Ok(inserted.into())
    }

    async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let found = user::Entity::find_by_id(id).one(&self.database).await?;
        Ok(found.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.database)
            .await?;
        Ok(found.map(User::from))
    }

    async fn create_proposal(&self, new_proposal: &NewProposal) -> StoreResult<Proposal> {
        let metrics = new_proposal.impact_metrics();
        let model = proposal::ActiveModel {
            id: NotSet,
            title: Set(new_proposal.title.clone()),
            description: Set(new_proposal.description.clone()),
            category: Set(new_proposal.category.clone()),
            creator_address: Set(new_proposal.creator_address.clone()),
            funding_goal: Set(new_proposal.funding_goal),
            raised_amount: Set(0),
            votes_for: Set(0),
            votes_against: Set(0),
            duration: Set(new_proposal.duration),
            created_at: Set(Utc::now().fixed_offset()),
            approved: Set(false),
            metis_impact_score: Set(metrics.score()),
            energy_efficiency: Set(metrics.energy_efficiency),
            community_benefit: Set(metrics.community_benefit),
            innovation_factor: Set(metrics.innovation_factor),
            token_stake: Set(0),
        };
        let inserted = model.insert(&self.database).await?;
        Ok(inserted.into())
    }

    async fn list_proposals(&self, filter: &ProposalFilter) -> StoreResult<Vec<Proposal>> {
        let mut select = proposal::Entity::find();
        if filter.approved_only {
            select = select.filter(proposal::Column::Approved.eq(true));
        }
        if let Some(creator) = &filter.creator_address {
            select = select.filter(proposal::Column::CreatorAddress.eq(creator.clone()));
        }
        let proposals = select
            .order_by_asc(proposal::Column::Id)
            .all(&self.database)
            .await?;
        Ok(proposals.into_iter().map(Proposal::from).collect())
    }

    async fn get_proposal(&self, id: i64) -> StoreResult<Option<Proposal>> {
        Ok(self.find_proposal_model(id).await?.map(Proposal::from))
    }

    async fn update_proposal(
        &self,
        id: i64,
        patch: &ProposalPatch,
    ) -> StoreResult<Option<Proposal>> {
        let Some(existing) = self.find_proposal_model(id).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(existing.into()));
        }

        let mut active = existing.into_active_model();
        if let Some(title) = &patch.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &patch.description {
            active.description = Set(description.clone());
        }
        if let Some(category) = &patch.category {
            active.category = Set(category.clone());
        }
        if let Some(funding_goal) = patch.funding_goal {
            active.funding_goal = Set(funding_goal);
        }
        if let Some(duration) = patch.duration {
            active.duration = Set(duration);
        }
        if let Some(value) = patch.energy_efficiency {
            active.energy_efficiency = Set(value);
        }
        if let Some(value) = patch.community_benefit {
            active.community_benefit = Set(value);
        }
        if let Some(value) = patch.innovation_factor {
            active.innovation_factor = Set(value);
        }
        let updated = active.update(&self.database).await?;
        Ok(Some(updated.into()))
    }

    async fn set_approval(&self, id: i64, approved: bool) -> StoreResult<Option<Proposal>> {
        let Some(existing) = self.find_proposal_model(id).await? else {
            return Ok(None);
        };
        let mut active = existing.into_active_model();
        active.approved = Set(approved);
        let updated = active.update(&self.database).await?;
        Ok(Some(updated.into()))
    }

    async fn set_impact_score(&self, id: i64, score: f64) -> StoreResult<Option<Proposal>> {
        let Some(existing) = self.find_proposal_model(id).await? else {
            return Ok(None);
        };
        let mut active = existing.into_active_model();
        active.metis_impact_score = Set(score);
        let updated = active.update(&self.database).await?;
        Ok(Some(updated.into()))
    }

    async fn votes_for_proposal(&self, proposal_id: i64) -> StoreResult<Vec<Vote>> {
        let votes = vote::Entity::find()
            .filter(vote::Column::ProposalId.eq(proposal_id))
            .order_by_asc(vote::Column::Id)
            .all(&self.database)
            .await?;
        Ok(votes.into_iter().map(Vote::from).collect())
    }

    async fn votes_by_voter(&self, voter_address: &str) -> StoreResult<Vec<Vote>> {
        let votes = vote::Entity::find()
            .filter(vote::Column::VoterAddress.eq(voter_address))
            .order_by_asc(vote::Column::Id)
            .all(&self.database)
            .await?;
        Ok(votes.into_iter().map(Vote::from).collect())
    }

    async fn find_vote(
        &self,
        proposal_id: i64,
        voter_address: &str,
    ) -> StoreResult<Option<Vote>> {
        let found = vote::Entity::find()
            .filter(vote::Column::ProposalId.eq(proposal_id))
            .filter(vote::Column::VoterAddress.eq(voter_address))
            .one(&self.database)
            .await?;
        Ok(found.map(Vote::from))
    }

    async fn create_vote(&self, ballot: &NewVote, tally: TallyDelta) -> StoreResult<(Vote, Proposal)> {
        let proposal_id = ballot.proposal_id;

        // Dropping `txn` on any early return rolls the unit back.
        let txn = self.database.begin().await?;

        let locked = proposal::Entity::find_by_id(proposal_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(StoreError::MissingProposal(proposal_id))?;
        if !locked.approved {
            return Err(StoreError::NotApproved(proposal_id));
        }

        let existing = vote::Entity::find()
            .filter(vote::Column::ProposalId.eq(proposal_id))
            .filter(vote::Column::VoterAddress.eq(ballot.voter_address.clone()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(StoreError::DuplicateVote {
                proposal_id,
                voter_address: ballot.voter_address.clone(),
            });
        }

        // Reject overflow here so both backends fail the same way before
        // anything is written.
        let mut projected = Proposal::from(locked);
        tally.apply_to(&mut projected)?;

        let inserted = insert_locked_vote(&txn, ballot).await?;

        let result = proposal::Entity::update_many()
            .col_expr(
                proposal::Column::VotesFor,
                Expr::col(proposal::Column::VotesFor).add(tally.votes_for),
            )
            .col_expr(
                proposal::Column::VotesAgainst,
                Expr::col(proposal::Column::VotesAgainst).add(tally.votes_against),
            )
            .col_expr(
                proposal::Column::RaisedAmount,
                Expr::col(proposal::Column::RaisedAmount).add(tally.raised_amount),
            )
            .col_expr(
                proposal::Column::TokenStake,
                Expr::col(proposal::Column::TokenStake).add(tally.token_stake),
            )
            .filter(proposal::Column::Id.eq(proposal_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::MissingProposal(proposal_id));
        }

        let updated = proposal::Entity::find_by_id(proposal_id)
            .one(&txn)
            .await?
            .ok_or(StoreError::MissingProposal(proposal_id))?;

        txn.commit().await?;
        debug!(
            "Vote {} committed for proposal {} by {}",
            inserted.id, proposal_id, inserted.voter_address
        );
        Ok((inserted.into(), updated.into()))
    }

    async fn release_stakes(&self, proposal_id: i64) -> StoreResult<UnlockOutcome> {
        let txn = self.database.begin().await?;

        // The row lock keeps votes out until the unlock commits.
        let locked = proposal::Entity::find_by_id(proposal_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(StoreError::MissingProposal(proposal_id))?;
        let funded = Proposal::from(locked).is_funded();
        let scope = UnlockScope::for_outcome(funded);

        let mut update = vote::Entity::update_many()
            .col_expr(vote::Column::Locked, Expr::value(false))
            .filter(vote::Column::ProposalId.eq(proposal_id))
            .filter(vote::Column::Locked.eq(true));
        if scope == UnlockScope::SupportersOnly {
            update = update.filter(vote::Column::Support.eq(true));
        }
        let result = update.exec(&txn).await?;

        txn.commit().await?;
        Ok(UnlockOutcome {
            proposal_id,
            funded,
            scope,
            unlocked: result.rows_affected,
        })
    }
}
