//! Optimistic mutations with rollback.

pub mod gateway;
pub mod transaction;

pub use gateway::MutationGateway;
pub use transaction::{Checkpoint, MutationScope, OptimisticTransaction};
