//! Echoria Storage - Vote Store Trait and In-Memory Implementation
//!
//! Defines the storage seam for votes plus the two services built on it:
//! `Ballot` (validated submission and reset) and `Aggregator` (ranked
//! tallies). The Postgres implementation lives in echoria-api.

pub mod aggregator;
pub mod ballot;
pub mod error;
pub mod memory;
pub mod store;

pub use aggregator::Aggregator;
pub use ballot::{Ballot, SubmitError};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryVoteStore;
pub use store::VoteStore;
