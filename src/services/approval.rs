use std::sync::Arc;

use tracing::info;

use crate::error::{FundError, FundResult};
use crate::models::{ApprovalRequest, Proposal, UnlockOutcome};
use crate::store::FundStore;

/// Admin approval toggling and stake release.
///
/// Callers gate these operations on admin credentials
/// (`UserService::authorize_admin`) before invoking them.
#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn FundStore>,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn FundStore>) -> Self {
        Self { store }
    }

    pub async fn approve_proposal(&self, id: i64, approved: bool) -> FundResult<Proposal> {
        let proposal = self
            .store
            .set_approval(id, approved)
            .await?
            .ok_or(FundError::proposal_not_found(id))?;
        info!(
            "Proposal {id} {}",
            if approved { "approved" } else { "unapproved" }
        );
        Ok(proposal)
    }

    pub async fn apply(&self, request: ApprovalRequest) -> FundResult<Proposal> {
        self.approve_proposal(request.id, request.approved).await
    }

    /// Releases stakes once a proposal's outcome is settled.
    ///
    /// A funded proposal releases supporting stakes only; opposing stakes
    /// stay locked. An unfunded proposal releases every stake. Votes that
    /// are already unlocked are left alone, so repeating the call is a no-op.
    /// The funding state is read inside the same atomic unit as the release.
    pub async fn unlock_all_tokens_for_proposal(
        &self,
        proposal_id: i64,
    ) -> FundResult<UnlockOutcome> {
        let outcome = self.store.release_stakes(proposal_id).await?;
        info!(
            "Unlocked {} stakes on proposal {proposal_id} (funded {}, scope {:?})",
            outcome.unlocked, outcome.funded, outcome.scope
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{NewProposal, NewVote, UnlockScope};
    use crate::services::interleave::{Interleaved, InterleavingStore};
    use crate::services::voting::VotingService;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<dyn FundStore>,
        approval: ApprovalService,
        voting: VotingService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn FundStore> = Arc::new(MemoryStore::new());
        Fixture {
            approval: ApprovalService::new(store.clone()),
            voting: VotingService::new(store.clone()),
            store,
        }
    }

    async fn proposal_with_goal(fixture: &Fixture, funding_goal: i64) -> i64 {
        let created = fixture
            .store
            .create_proposal(&NewProposal {
                title: "Carbon Offset DAO".to_string(),
                description: "Community-governed fund for verified carbon offsets.".to_string(),
                category: "Environment".to_string(),
                creator_address: "0xc4d2".to_string(),
                funding_goal,
                duration: 21,
                energy_efficiency: Some(9),
                community_benefit: Some(8),
                innovation_factor: Some(6),
            })
            .await
            .unwrap();
        fixture.approval.approve_proposal(created.id, true).await.unwrap();
        created.id
    }

    async fn vote(fixture: &Fixture, proposal_id: i64, voter: &str, support: bool, stake: i64) {
        fixture
            .voting
            .submit_vote(NewVote {
                proposal_id,
                voter_address: voter.to_string(),
                support,
                staked_amount: stake,
            })
            .await
            .unwrap();
    }

    async fn locked_by_voter(fixture: &Fixture, proposal_id: i64, voter: &str) -> bool {
        fixture
            .store
            .find_vote(proposal_id, voter)
            .await
            .unwrap()
            .unwrap()
            .locked
    }

    #[tokio::test]
    async fn approval_toggles_flag() {
        let fixture = fixture();
        let id = proposal_with_goal(&fixture, 5000).await;
        let revoked = fixture
            .approval
            .apply(ApprovalRequest {
                id,
                approved: false,
            })
            .await
            .unwrap();
        assert!(!revoked.approved);

        let err = fixture.approval.approve_proposal(999, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // Funded proposals keep opposing stakes locked. Pending product sign-off
    // on whether opposing stakes should also be released.
    #[tokio::test]
    async fn funded_proposal_unlocks_supporters_only() {
        let fixture = fixture();
        let id = proposal_with_goal(&fixture, 5000).await;
        vote(&fixture, id, "0xaaa", true, 3000).await;
        vote(&fixture, id, "0xbbb", true, 2000).await;
        vote(&fixture, id, "0xccc", false, 700).await;

        let outcome = fixture
            .approval
            .unlock_all_tokens_for_proposal(id)
            .await
            .unwrap();
        assert!(outcome.funded);
        assert_eq!(outcome.scope, UnlockScope::SupportersOnly);
        assert_eq!(outcome.unlocked, 2);
        assert!(!locked_by_voter(&fixture, id, "0xaaa").await);
        assert!(!locked_by_voter(&fixture, id, "0xbbb").await);
        assert!(locked_by_voter(&fixture, id, "0xccc").await);
    }

    #[tokio::test]
    async fn vote_landing_before_release_counts_toward_funding() {
        let fixture = fixture();
        let id = proposal_with_goal(&fixture, 5000).await;
        vote(&fixture, id, "0xaaa", true, 4900).await;
        vote(&fixture, id, "0xccc", false, 700).await;

        let interleaving = Arc::new(InterleavingStore::new(fixture.store.clone()));
        interleaving.arm(Interleaved::CastVote(NewVote {
            proposal_id: id,
            voter_address: "0xddd".to_string(),
            support: true,
            staked_amount: 100,
        }));
        let approval = ApprovalService::new(interleaving);

        let outcome = approval.unlock_all_tokens_for_proposal(id).await.unwrap();
        assert!(outcome.funded);
        assert_eq!(outcome.scope, UnlockScope::SupportersOnly);
        assert_eq!(outcome.unlocked, 2);
        assert!(!locked_by_voter(&fixture, id, "0xddd").await);
        assert!(locked_by_voter(&fixture, id, "0xccc").await);
    }

    #[tokio::test]
    async fn unfunded_proposal_unlocks_every_vote() {
        let fixture = fixture();
        let id = proposal_with_goal(&fixture, 5000).await;
        vote(&fixture, id, "0xaaa", true, 2000).await;
        vote(&fixture, id, "0xccc", false, 700).await;

        let outcome = fixture
            .approval
            .unlock_all_tokens_for_proposal(id)
            .await
            .unwrap();
        assert!(!outcome.funded);
        assert_eq!(outcome.scope, UnlockScope::All);
        assert_eq!(outcome.unlocked, 2);
        let votes = fixture.store.votes_for_proposal(id).await.unwrap();
        assert!(votes.iter().all(|vote| !vote.locked));
    }

    #[tokio::test]
    async fn repeated_unlock_is_a_no_op() {
        let fixture = fixture();
        let id = proposal_with_goal(&fixture, 5000).await;
        vote(&fixture, id, "0xaaa", true, 5000).await;
        vote(&fixture, id, "0xccc", false, 10).await;

        let first = fixture
            .approval
            .unlock_all_tokens_for_proposal(id)
            .await
            .unwrap();
        let second = fixture
            .approval
            .unlock_all_tokens_for_proposal(id)
            .await
            .unwrap();
        assert_eq!(first.unlocked, 1);
        assert_eq!(second.unlocked, 0);
        assert!(locked_by_voter(&fixture, id, "0xccc").await);
    }

    #[tokio::test]
    async fn unlock_on_missing_proposal_is_not_found() {
        let fixture = fixture();
        let err = fixture
            .approval
            .unlock_all_tokens_for_proposal(12)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
