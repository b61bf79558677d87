//! Error types and handling for chub
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Config document and project file parse errors
//! - [`plan`]: Bundle layout errors
//! - [`build`]: Bundle assembly errors
//! - [`runtime`]: Option, selection, extraction, script, provisioning and entry errors
//! - [`fs`]: File system errors

pub mod build;
pub mod config;
pub mod fs;
pub mod plan;
pub mod runtime;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ScriptKind;

/// Failure class of a [`ChubError`], used to pick the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Plan,
    Build,
    Option,
    Selection,
    Extraction,
    Script,
    Provision,
    Entry,
    Io,
}

impl ErrorCategory {
    /// Exit code reported to scripted callers for this failure class
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Io => 1,
            ErrorCategory::Option => 2,
            ErrorCategory::Selection => 3,
            ErrorCategory::Extraction => 4,
            ErrorCategory::Script => 5,
            ErrorCategory::Provision => 6,
            ErrorCategory::Entry => 7,
            ErrorCategory::Parse => 8,
            ErrorCategory::Plan => 9,
            ErrorCategory::Build => 10,
        }
    }
}

/// Main error type for chub operations
#[derive(Error, Diagnostic, Debug)]
pub enum ChubError {
    // Config document errors
    #[error("Config document not found: {path}")]
    #[diagnostic(
        code(chub::config::not_found),
        help("A bundle root must contain a .chubconfig file")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse config document {path}: {reason}")]
    #[diagnostic(code(chub::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid config record #{index}: {reason}")]
    #[diagnostic(code(chub::config::invalid_record))]
    InvalidRecord { index: usize, reason: String },

    #[error("Package '{name}' version '{version}' is already defined in the bundle")]
    #[diagnostic(
        code(chub::config::duplicate_unit),
        help("Each name and version pair may be added to a bundle only once")
    )]
    DuplicateUnit { name: String, version: String },

    #[error("Invalid project file {path}: {reason}")]
    #[diagnostic(
        code(chub::config::invalid_project),
        help("Build options live in [tool.chub.package], [chub.package], [package] or at the top level")
    )]
    InvalidProjectFile { path: String, reason: String },

    #[error("Invalid entrypoint '{entry}': {reason}")]
    #[diagnostic(
        code(chub::config::invalid_entrypoint),
        help("Expected 'module.path', 'module.path:callable' or 'module.path:callable ARG'")
    )]
    InvalidEntrypoint { entry: String, reason: String },

    // Layout plan errors
    #[error("Unit directory '{unit_dir}' already exists in the bundle")]
    #[diagnostic(code(chub::plan::unit_conflict))]
    UnitDirConflict { unit_dir: String },

    #[error("'{unit_dir}' is not a valid unit directory name")]
    #[diagnostic(
        code(chub::plan::invalid_unit_dir),
        help("Package names and versions may not contain path separators or be '.' or '..'")
    )]
    InvalidUnitDir { unit_dir: String },

    #[error("'{name}' is a reserved name and cannot be used for a package unit")]
    #[diagnostic(code(chub::plan::reserved_name))]
    ReservedUnitName { name: String },

    #[error("{kind} not found: {path}")]
    #[diagnostic(code(chub::plan::source_not_found))]
    SourceNotFound { kind: String, path: String },

    #[error("Destination '{destination}' is claimed by both '{first}' and '{second}'")]
    #[diagnostic(code(chub::plan::destination_conflict))]
    DestinationConflict {
        destination: String,
        first: String,
        second: String,
    },

    #[error("Invalid destination '{destination}': {reason}")]
    #[diagnostic(code(chub::plan::invalid_destination))]
    InvalidDestination { destination: String, reason: String },

    // Build errors
    #[error("Dependency resolution failed for {archive}: {reason}")]
    #[diagnostic(
        code(chub::build::resolver_failed),
        help("Use --resolver none to bundle the archive without resolving dependencies")
    )]
    ResolverFailed { archive: String, reason: String },

    #[error("Cannot determine package name and version of {path}: {reason}")]
    #[diagnostic(
        code(chub::build::metadata_missing),
        help("Pass an explicit output path with --chub or use a wheel with a METADATA file")
    )]
    WheelMetadataMissing { path: String, reason: String },

    #[error("Archive operation failed on {path}: {reason}")]
    #[diagnostic(code(chub::build::archive_failed))]
    ArchiveFailed { path: String, reason: String },

    #[error("Invalid metadata entry '{entry}': expected KEY=VALUE")]
    #[diagnostic(code(chub::build::invalid_metadata_entry))]
    InvalidMetadataEntry { entry: String },

    #[error("Bundle assembly failed: {reason}")]
    #[diagnostic(code(chub::build::io_failed))]
    BuildIoFailed { reason: String },

    // Option errors
    #[error("--{first} is incompatible with --{second}")]
    #[diagnostic(code(chub::option::conflict))]
    OptionConflict { first: String, second: String },

    #[error("--{flag} cannot be used here: {rule}")]
    #[diagnostic(code(chub::option::disabled))]
    OptionDisabled { flag: String, rule: String },

    #[error("Invalid value for --{flag}: {reason}")]
    #[diagnostic(code(chub::option::invalid_value))]
    InvalidOptionValue { flag: String, reason: String },

    #[error("No wheel to bundle: pass one or set 'wheel' in a --chubproject file")]
    #[diagnostic(
        code(chub::option::no_wheel),
        help("Pass a wheel path or set 'wheel' in the file given with --chubproject")
    )]
    NoWheel,

    // Selection errors
    #[error("No bundled package matches {selectors}")]
    #[diagnostic(
        code(chub::select::empty),
        help("Run with --list to see the packages in this bundle")
    )]
    NoUnitsSelected { selectors: String },

    // Extraction errors
    #[error("Failed to extract '{unit}': {reason}")]
    #[diagnostic(code(chub::extract::failed))]
    ExtractionFailed { unit: String, reason: String },

    // Script errors
    #[error("The {kind} script '{script}' of '{unit}' exited with status {status}")]
    #[diagnostic(code(chub::script::failed))]
    ScriptFailed {
        kind: ScriptKind,
        unit: String,
        script: String,
        status: i32,
    },

    #[error("The {kind} script '{script}' of '{unit}' could not be run: {reason}")]
    #[diagnostic(code(chub::script::not_runnable))]
    ScriptNotRunnable {
        kind: ScriptKind,
        unit: String,
        script: String,
        reason: String,
    },

    #[error("Install scripts failed for {count} package(s)")]
    #[diagnostic(code(chub::script::units_failed))]
    ScriptsFailed { count: usize },

    // Provisioning errors
    #[error("Failed to provision environment at {path}: {reason}")]
    #[diagnostic(code(chub::provision::failed))]
    ProvisionFailed { path: String, reason: String },

    #[error("{path} already exists and is not a compatible environment")]
    #[diagnostic(
        code(chub::provision::incompatible),
        help("Choose a new path for --venv or remove the existing directory")
    )]
    IncompatibleEnvironment { path: String },

    // Entry errors
    #[error("No entrypoint to run")]
    #[diagnostic(
        code(chub::entry::missing),
        help("Build the bundle with --entrypoint or pass one with --run ENTRY")
    )]
    NoEntrypoint,

    #[error("Failed to invoke entrypoint '{entry}': {reason}")]
    #[diagnostic(code(chub::entry::failed))]
    EntryInvokeFailed { entry: String, reason: String },

    #[error("Entrypoint '{entry}' exited with status {status}")]
    #[diagnostic(code(chub::entry::exit_status))]
    EntryExited { entry: String, status: i32 },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(chub::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {reason}")]
    #[diagnostic(code(chub::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file {path}: {reason}")]
    #[diagnostic(code(chub::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(chub::fs::io_error))]
    IoError { message: String },
}

impl ChubError {
    /// Failure class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChubError::ConfigNotFound { .. }
            | ChubError::ConfigParseFailed { .. }
            | ChubError::InvalidRecord { .. }
            | ChubError::DuplicateUnit { .. }
            | ChubError::InvalidProjectFile { .. }
            | ChubError::InvalidEntrypoint { .. } => ErrorCategory::Parse,
            ChubError::UnitDirConflict { .. }
            | ChubError::InvalidUnitDir { .. }
            | ChubError::ReservedUnitName { .. }
            | ChubError::SourceNotFound { .. }
            | ChubError::DestinationConflict { .. }
            | ChubError::InvalidDestination { .. } => ErrorCategory::Plan,
            ChubError::ResolverFailed { .. }
            | ChubError::WheelMetadataMissing { .. }
            | ChubError::ArchiveFailed { .. }
            | ChubError::InvalidMetadataEntry { .. }
            | ChubError::BuildIoFailed { .. } => ErrorCategory::Build,
            ChubError::OptionConflict { .. }
            | ChubError::OptionDisabled { .. }
            | ChubError::InvalidOptionValue { .. }
            | ChubError::NoWheel => ErrorCategory::Option,
            ChubError::NoUnitsSelected { .. } => ErrorCategory::Selection,
            ChubError::ExtractionFailed { .. } => ErrorCategory::Extraction,
            ChubError::ScriptFailed { .. }
            | ChubError::ScriptNotRunnable { .. }
            | ChubError::ScriptsFailed { .. } => ErrorCategory::Script,
            ChubError::ProvisionFailed { .. } | ChubError::IncompatibleEnvironment { .. } => {
                ErrorCategory::Provision
            }
            ChubError::NoEntrypoint
            | ChubError::EntryInvokeFailed { .. }
            | ChubError::EntryExited { .. } => ErrorCategory::Entry,
            ChubError::FileNotFound { .. }
            | ChubError::FileReadFailed { .. }
            | ChubError::FileWriteFailed { .. }
            | ChubError::IoError { .. } => ErrorCategory::Io,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}

impl From<std::io::Error> for ChubError {
    fn from(err: std::io::Error) -> Self {
        ChubError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ChubError {
    fn from(err: serde_yaml::Error) -> Self {
        ChubError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ChubError {
    fn from(err: zip::result::ZipError) -> Self {
        ChubError::ArchiveFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for ChubError {
    fn from(err: walkdir::Error) -> Self {
        ChubError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ChubError>;
