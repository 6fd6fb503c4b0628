//! # levy-retrain
//!
//! The supervised model lifecycle: load the dataset, split it
//! chronologically, fit, evaluate on the held-out tail, and commit the new
//! artifact, metrics snapshot, and ledger row in that order.
//!
//! Nothing is written until every earlier step has succeeded, so a failed
//! run leaves the previously committed artifact serving.

pub mod error;
pub mod ledger;
pub mod pipeline;

pub use error::RetrainError;
pub use ledger::{LedgerRow, TrainingHistoryLedger};
pub use pipeline::RetrainPipeline;
