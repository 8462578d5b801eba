//! Domain services over a shared [`FundStore`].

pub mod approval;
pub mod impact;
#[cfg(test)]
mod interleave;
pub mod proposals;
pub mod users;
pub mod voting;

use std::sync::Arc;

use crate::store::FundStore;

pub use approval::ApprovalService;
pub use impact::{ImpactMetrics, ImpactScoreCalculator};
pub use proposals::ProposalService;
pub use users::UserService;
pub use voting::VotingService;

/// Every service wired to one store handle.
#[derive(Clone)]
pub struct FundServices {
    pub proposals: ProposalService,
    pub voting: VotingService,
    pub approval: ApprovalService,
    pub impact: ImpactScoreCalculator,
    pub users: UserService,
    store: Arc<dyn FundStore>,
}

impl FundServices {
    pub fn new(store: Arc<dyn FundStore>, admin_usernames: Vec<String>) -> Self {
        let impact = ImpactScoreCalculator::new(Arc::clone(&store));
        Self {
            proposals: ProposalService::new(Arc::clone(&store), impact.clone()),
            voting: VotingService::new(Arc::clone(&store)),
            approval: ApprovalService::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store), admin_usernames),
            impact,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn FundStore> {
        &self.store
    }
}
