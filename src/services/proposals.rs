use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{FundError, FundResult};
use crate::models::{NewProposal, Proposal, ProposalFilter, ProposalPatch, Vote};
use crate::services::impact::{ImpactScoreCalculator, validate_metric};
use crate::store::FundStore;
use crate::wallet::sanitize_wallet_address;

const MIN_TITLE_LEN: usize = 5;
const MAX_TITLE_LEN: usize = 256;
const MIN_DESCRIPTION_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 10_000;
const MIN_CATEGORY_LEN: usize = 2;
const MAX_CATEGORY_LEN: usize = 64;
pub const MIN_FUNDING_GOAL: i64 = 100;
pub const MAX_DURATION_DAYS: i32 = 180;

#[derive(Clone)]
pub struct ProposalService {
    store: Arc<dyn FundStore>,
    impact: ImpactScoreCalculator,
}

impl ProposalService {
    pub fn new(store: Arc<dyn FundStore>, impact: ImpactScoreCalculator) -> Self {
        Self { store, impact }
    }

    pub async fn create_proposal(&self, input: NewProposal) -> FundResult<Proposal> {
        let input = validate_new_proposal(input)?;
        let proposal = self.store.create_proposal(&input).await?;
        info!(
            "Proposal {} created by {} (goal {}, score {:.2})",
            proposal.id, proposal.creator_address, proposal.funding_goal, proposal.metis_impact_score
        );
        Ok(proposal)
    }

    pub async fn get_proposal(&self, id: i64) -> FundResult<Proposal> {
        self.store
            .get_proposal(id)
            .await?
            .ok_or(FundError::proposal_not_found(id))
    }

    pub async fn list_proposals(&self, filter: &ProposalFilter) -> FundResult<Vec<Proposal>> {
        let filter = match &filter.creator_address {
            Some(address) => ProposalFilter {
                approved_only: filter.approved_only,
                creator_address: Some(sanitize_wallet_address(address)?),
            },
            None => filter.clone(),
        };
        Ok(self.store.list_proposals(&filter).await?)
    }

    /// Applies a descriptive patch. Changing any sub-metric re-derives the
    /// impact score.
    pub async fn update_proposal(&self, id: i64, patch: ProposalPatch) -> FundResult<Proposal> {
        let patch = validate_patch(patch)?;
        let updated = self
            .store
            .update_proposal(id, &patch)
            .await?
            .ok_or(FundError::proposal_not_found(id))?;

        if !patch.touches_impact_metrics() {
            return Ok(updated);
        }
        self.impact.calculate_metis_impact_score(id).await?;
        debug!("Proposal {id} metrics changed, score recalculated");
        self.get_proposal(id).await
    }

    pub async fn votes_for_proposal(&self, proposal_id: i64) -> FundResult<Vec<Vote>> {
        self.get_proposal(proposal_id).await?;
        Ok(self.store.votes_for_proposal(proposal_id).await?)
    }

    pub async fn votes_by_voter(&self, voter_address: &str) -> FundResult<Vec<Vote>> {
        let voter_address = sanitize_wallet_address(voter_address)?;
        Ok(self.store.votes_by_voter(&voter_address).await?)
    }
}

fn validate_text(field: &str, value: &str, min: usize, max: usize) -> FundResult<String> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length < min {
        return Err(FundError::invalid_input(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if length > max {
        return Err(FundError::invalid_input(format!(
            "{field} exceeds {max} character limit"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_funding_goal(value: i64) -> FundResult<i64> {
    if value < MIN_FUNDING_GOAL {
        return Err(FundError::invalid_input(format!(
            "fundingGoal must be at least {MIN_FUNDING_GOAL}"
        )));
    }
    Ok(value)
}

fn validate_duration(value: i32) -> FundResult<i32> {
    if !(1..=MAX_DURATION_DAYS).contains(&value) {
        return Err(FundError::invalid_input(format!(
            "duration must be between 1 and {MAX_DURATION_DAYS} days"
        )));
    }
    Ok(value)
}

fn validate_optional_metric(name: &str, value: Option<i32>) -> FundResult<Option<i32>> {
    value.map(|v| validate_metric(name, v)).transpose()
}

fn validate_new_proposal(input: NewProposal) -> FundResult<NewProposal> {
    Ok(NewProposal {
        title: validate_text("title", &input.title, MIN_TITLE_LEN, MAX_TITLE_LEN)?,
        description: validate_text(
            "description",
            &input.description,
            MIN_DESCRIPTION_LEN,
            MAX_DESCRIPTION_LEN,
        )?,
        category: validate_text("category", &input.category, MIN_CATEGORY_LEN, MAX_CATEGORY_LEN)?,
        creator_address: sanitize_wallet_address(&input.creator_address)?,
        funding_goal: validate_funding_goal(input.funding_goal)?,
        duration: validate_duration(input.duration)?,
        energy_efficiency: validate_optional_metric("energyEfficiency", input.energy_efficiency)?,
        community_benefit: validate_optional_metric("communityBenefit", input.community_benefit)?,
        innovation_factor: validate_optional_metric("innovationFactor", input.innovation_factor)?,
    })
}

fn validate_patch(patch: ProposalPatch) -> FundResult<ProposalPatch> {
    Ok(ProposalPatch {
        title: patch
            .title
            .map(|v| validate_text("title", &v, MIN_TITLE_LEN, MAX_TITLE_LEN))
            .transpose()?,
        description: patch
            .description
            .map(|v| validate_text("description", &v, MIN_DESCRIPTION_LEN, MAX_DESCRIPTION_LEN))
            .transpose()?,
        category: patch
            .category
            .map(|v| validate_text("category", &v, MIN_CATEGORY_LEN, MAX_CATEGORY_LEN))
            .transpose()?,
        funding_goal: patch.funding_goal.map(validate_funding_goal).transpose()?,
        duration: patch.duration.map(validate_duration).transpose()?,
        energy_efficiency: validate_optional_metric("energyEfficiency", patch.energy_efficiency)?,
        community_benefit: validate_optional_metric("communityBenefit", patch.community_benefit)?,
        innovation_factor: validate_optional_metric("innovationFactor", patch.innovation_factor)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;

    fn service() -> ProposalService {
        let store: Arc<dyn FundStore> = Arc::new(MemoryStore::new());
        ProposalService::new(store.clone(), ImpactScoreCalculator::new(store))
    }

    fn submission() -> NewProposal {
        NewProposal {
            title: "  DeFi Education Platform ".to_string(),
            description: "Interactive learning platform for DeFi newcomers.".to_string(),
            category: "Education".to_string(),
            creator_address: "0x3AB1000000000000000000000000000000009E57".to_string(),
            funding_goal: 10_000,
            duration: 3,
            energy_efficiency: Some(8),
            community_benefit: Some(6),
            innovation_factor: Some(10),
        }
    }

    #[tokio::test]
    async fn create_trims_and_canonicalizes() {
        let service = service();
        let created = service.create_proposal(submission()).await.unwrap();
        assert_eq!(created.title, "DeFi Education Platform");
        assert_eq!(
            created.creator_address,
            "0x3ab1000000000000000000000000000000009e57"
        );
        assert!((created.metis_impact_score - 7.6).abs() < 1e-9);
        assert!(!created.approved);
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_fields() {
        let service = service();
        let cases = [
            NewProposal {
                title: "abc".to_string(),
                ..submission()
            },
            NewProposal {
                description: "too short".to_string(),
                ..submission()
            },
            NewProposal {
                funding_goal: 99,
                ..submission()
            },
            NewProposal {
                duration: 0,
                ..submission()
            },
            NewProposal {
                innovation_factor: Some(11),
                ..submission()
            },
            NewProposal {
                creator_address: "   ".to_string(),
                ..submission()
            },
        ];
        for case in cases {
            let err = service.create_proposal(case).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{err}");
        }
        assert!(
            service
                .list_proposals(&ProposalFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn metric_change_recomputes_score() {
        let service = service();
        let created = service
            .create_proposal(NewProposal {
                energy_efficiency: None,
                community_benefit: None,
                innovation_factor: None,
                ..submission()
            })
            .await
            .unwrap();
        assert_eq!(created.metis_impact_score, 0.0);

        let updated = service
            .update_proposal(
                created.id,
                ProposalPatch {
                    energy_efficiency: Some(10),
                    community_benefit: Some(10),
                    ..ProposalPatch::default()
                },
            )
            .await
            .unwrap();
        assert!((updated.metis_impact_score - 8.0).abs() < 1e-9);

        let renamed = service
            .update_proposal(
                created.id,
                ProposalPatch {
                    title: Some("Renamed platform".to_string()),
                    ..ProposalPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Renamed platform");
        assert!((renamed.metis_impact_score - 8.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_proposal_is_not_found() {
        let service = service();
        assert_eq!(
            service.get_proposal(77).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service
                .update_proposal(77, ProposalPatch::default())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service.votes_for_proposal(77).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn creator_filter_uses_canonical_address() {
        let service = service();
        service.create_proposal(submission()).await.unwrap();
        let filter = ProposalFilter {
            approved_only: false,
            creator_address: Some("0x3ab1000000000000000000000000000000009E57".to_string()),
        };
        assert_eq!(service.list_proposals(&filter).await.unwrap().len(), 1);
    }
}
