//! Merge engine
//!
//! - `bca_finder`: merge-base search over the commit graph
//! - `resolve`: three-way reconciliation of two change lists
//! - `conflict`: conflict values handed back to callers
//! - `outcome`: what a merge did when it did not stop on conflicts

pub mod bca_finder;
pub mod conflict;
pub mod outcome;
pub mod resolve;
