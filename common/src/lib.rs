//! Shared core for the ocp object-transfer tools
//!
//! This crate carries the pieces every ocp command needs before it moves a
//! single byte:
//!
//! - [`conflict`] - the pre-flight policy deciding whether a transfer may
//!   overwrite an existing destination object,
//! - [`error`] - classification of intentional skips versus real failures,
//!   plus display normalization for multi-line storage-client messages,
//! - [`object`] - the object locator/metadata types and the storage lookup
//!   seam the policy consults,
//! - [`transfer`] - glue that submits a conflict-checked transfer task to the
//!   [`parallel`] manager.

pub mod conflict;
pub mod error;
pub mod object;
pub mod transfer;
