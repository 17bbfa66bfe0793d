//! Core types for filebatch.
//!
//! This crate provides the data model shared by the discovery and transfer
//! crates: batch requests, planned transfers, outcomes and the error taxonomy.

mod error;
mod outcome;
mod request;

pub use error::TransferError;
pub use outcome::{total_bytes, TransferOutcome, TransferPair};
pub use request::{ConflictPolicy, TransferRequest, TransferRequestBuilder};
