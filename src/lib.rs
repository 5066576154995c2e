//! `svcs`: a local, content-addressed version-control engine
//!
//! - `areas`: the stores of one repository (objects, refs, index, working tree)
//!   and the `Repository` handle that coordinates them
//! - `artifacts`: the data types and algorithms those stores work with
//! - `commands`: the command-line operations, written against `Repository`
//! - `errors`: the `RepoError` taxonomy

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
