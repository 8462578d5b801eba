use thiserror::Error;

use crate::store::StoreError;

/// Failure of a single fund operation.
///
/// Every variant is scoped to the call that produced it; the request layer
/// decides how to present it (see [`FundError::kind`]).
#[derive(Debug, Error)]
pub enum FundError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("wallet {voter_address} already voted on proposal {proposal_id}")]
    DuplicateVote {
        proposal_id: i64,
        voter_address: String,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("admin authorization required")]
    Unauthorized,

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

pub type FundResult<T> = Result<T, FundError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    DuplicateVote,
    InvalidState,
    Unauthorized,
    Internal,
}

impl FundError {
    pub fn proposal_not_found(id: i64) -> Self {
        FundError::NotFound {
            entity: "Proposal",
            id,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        FundError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FundError::NotFound { .. } => ErrorKind::NotFound,
            FundError::InvalidInput(_) => ErrorKind::InvalidInput,
            FundError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            FundError::InvalidState(_) => ErrorKind::InvalidState,
            FundError::Unauthorized => ErrorKind::Unauthorized,
            FundError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for FundError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingProposal(id) => FundError::proposal_not_found(id),
            StoreError::DuplicateVote {
                proposal_id,
                voter_address,
            } => FundError::DuplicateVote {
                proposal_id,
                voter_address,
            },
            StoreError::NotApproved(id) => {
                FundError::InvalidState(format!("proposal {id} is not approved for voting"))
            }
            StoreError::TallyOverflow(id) => FundError::InvalidInput(format!(
                "stake would overflow the tallies of proposal {id}"
            )),
            StoreError::UsernameTaken(username) => {
                FundError::InvalidInput(format!("username {username} is already registered"))
            }
            other => FundError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conditions_map_to_domain_kinds() {
        let missing: FundError = StoreError::MissingProposal(4).into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.to_string(), "Proposal 4 not found");

        let duplicate: FundError = StoreError::DuplicateVote {
            proposal_id: 4,
            voter_address: "0xabc".to_string(),
        }
        .into();
        assert_eq!(duplicate.kind(), ErrorKind::DuplicateVote);

        let taken: FundError = StoreError::UsernameTaken("admin".to_string()).into();
        assert_eq!(taken.kind(), ErrorKind::InvalidInput);

        let unapproved: FundError = StoreError::NotApproved(4).into();
        assert_eq!(unapproved.kind(), ErrorKind::InvalidState);

        let overflow: FundError = StoreError::TallyOverflow(4).into();
        assert_eq!(overflow.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn database_errors_are_internal() {
        let err: FundError =
            StoreError::Database(sea_orm::DbErr::Custom("connection reset".to_string())).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
