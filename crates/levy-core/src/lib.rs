//! # levy-core
//!
//! Core types shared by every levy model-monitoring crate.
//!
//! This crate provides:
//! - A numeric tabular [`dataset::Dataset`] with CSV loading and chronological splits
//! - Statistics helpers (mean, sample standard deviation, MSE, MAE, R²)
//! - Metrics snapshot and drift result types persisted to disk
//! - The closed [`model_kind::ModelKind`] tag selecting a regression family
//! - Operator notification records
//! - Atomic-replace and append helpers for durable state
//! - A cooperative [`cancel::CancelFlag`]
//! - Cross-cutting error types

pub mod cancel;
pub mod dataset;
pub mod drift;
pub mod errors;
pub mod fs;
pub mod metrics;
pub mod model_kind;
pub mod notification;
pub mod stats;
