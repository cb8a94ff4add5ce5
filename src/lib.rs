//! Asset bundles
//!
//! This crate re-exports all the components of the bundle vault: the manifest
//! codec and error types, the custody ledger with its storage backends, and the
//! lifecycle controller.

pub use bundles_core::*;
pub use bundles_custody::*;
pub use bundles_runtime::*;
