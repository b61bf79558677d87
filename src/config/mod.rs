//! Config document handling for chub
//!
//! This module contains data structures for:
//! - `.chubconfig` - the bundle's ordered package unit records
//! - entry references baked into units or passed with `--run`
//! - project files holding `chub build` options

pub mod document;
pub mod entry;
pub mod project;
pub mod unit;

// Re-export commonly used types
pub use document::{CHUBCONFIG_FILENAME, ConfigDocument};
pub use entry::EntryReference;
pub use project::ChubProject;
pub use unit::{
    INCLUDE_SEPARATOR, Include, MetadataValue, PackageUnit, Scalar, ScriptKind, is_plain_component,
    normalize_name,
};
