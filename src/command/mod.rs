// src/command/mod.rs

//! Command model and dependency discovery.
//!
//! - [`model`] splits a raw command line into sub-commands and tokens.
//! - [`locator`] abstracts the search-path lookup for binaries.
//! - [`resolve`] turns a command line into the list of local artifacts that
//!   have to be staged.

pub mod locator;
pub mod model;
pub mod resolve;

pub use locator::{BinaryLocator, PathLocator};
pub use model::{join_sub_commands, CommandLine, SubCommand};
pub use resolve::{DependencyResolver, Resolution, ResolvedDependency};
