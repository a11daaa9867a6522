// src/stage/mod.rs

//! Workspace staging.
//!
//! - [`workspace`] owns the temporary directory.
//! - [`remap`] records where each local path ended up.
//! - [`stager`] performs the copies.

pub mod remap;
pub mod stager;
pub mod workspace;

pub use remap::RemapTable;
pub use stager::{StagedFolder, Stager, StagingResult};
pub use workspace::{Workspace, WORKSPACE_PREFIX};
