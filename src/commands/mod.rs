//! Command implementations for the chub CLI

pub mod build;
pub mod completions;
pub mod run;
pub mod version;
