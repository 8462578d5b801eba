pub mod proposal;
pub mod user;
pub mod vote;

pub use proposal::{ApprovalRequest, NewProposal, Proposal, ProposalFilter, ProposalPatch};
pub use user::{NewUser, User};
pub use vote::{NewVote, UnlockOutcome, UnlockScope, Vote, VoteReceipt};
