//! Storage layer for Tribunal
//!
//! `LedgerStore` is the seam; `MongoStore` is the production backend and
//! `MemoryStore` serves development mode and tests.

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{MongoClient, MongoCollection};
pub use mongo_store::MongoStore;
pub use schemas::{CaseDoc, CommentDoc, IdentityDoc, VoteDoc};
pub use store::{CaseCommit, InsertOutcome, LedgerStore, Recount, VoteCommit};
