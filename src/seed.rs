//! Sample proposals for fresh installs.

use tracing::info;

use crate::error::FundResult;
use crate::models::{NewProposal, Proposal, ProposalFilter};
use crate::services::FundServices;

pub fn sample_proposals() -> Vec<NewProposal> {
    vec![
        NewProposal {
            title: "Metaverse Art Gallery".to_string(),
            description: "A virtual gallery to showcase NFT artwork from emerging artists in an immersive environment.".to_string(),
            category: "Art & Culture".to_string(),
            creator_address: "0x7fe3...4c21".to_string(),
            funding_goal: 5000,
            duration: 14,
            energy_efficiency: None,
            community_benefit: None,
            innovation_factor: None,
        },
        NewProposal {
            title: "DeFi Education Platform".to_string(),
            description: "Interactive learning platform to help newcomers understand blockchain technology and DeFi protocols.".to_string(),
            category: "Education".to_string(),
            creator_address: "0x3ab1...9e57".to_string(),
            funding_goal: 10_000,
            duration: 3,
            energy_efficiency: None,
            community_benefit: None,
            innovation_factor: None,
        },
        NewProposal {
            title: "Carbon Offset DAO".to_string(),
            description: "Decentralized organization focused on funding verified carbon offset projects worldwide.".to_string(),
            category: "Environment".to_string(),
            creator_address: "0xc4d2...1f88".to_string(),
            funding_goal: 25_000,
            duration: 21,
            energy_efficiency: None,
            community_benefit: None,
            innovation_factor: None,
        },
    ]
}

/// Creates and approves the sample proposals when the store holds none.
///
/// Returns the proposals it created; an already populated store yields an
/// empty list.
pub async fn seed_sample_proposals(services: &FundServices) -> FundResult<Vec<Proposal>> {
    let existing = services
        .proposals
        .list_proposals(&ProposalFilter::default())
        .await?;
    if !existing.is_empty() {
        info!(
            "Skipping sample proposals, store already holds {}",
            existing.len()
        );
        return Ok(Vec::new());
    }

    let mut seeded = Vec::new();
    for sample in sample_proposals() {
        let created = services.proposals.create_proposal(sample).await?;
        let approved = services.approval.approve_proposal(created.id, true).await?;
        seeded.push(approved);
    }
    info!("Seeded {} sample proposals", seeded.len());
    Ok(seeded)
}
