pub mod proposal;
pub mod user;
pub mod vote;
