//! Error taxonomy for project resolution.
//!
//! A project that simply has no build configuration for the requested
//! configuration/platform is *not* an error: the parser returns `Ok(None)`.
//! Every variant here aborts the whole resolution pass.

use std::path::PathBuf;

use thiserror::Error;

/// Result type using [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The primary project file handed to the parser does not exist.
    #[error("project file '{}' does not exist", .0.display())]
    ProjectNotFound(PathBuf),

    /// An explicitly referenced solution manifest does not exist.
    #[error("solution file '{}' does not exist", .0.display())]
    SolutionNotFound(PathBuf),

    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in '{}': {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// `OutputPath` still carries a `$(...)` reference after expansion.
    #[error("the output path has not been resolved: {0}")]
    UnresolvedOutputPath(String),

    /// A project declares a `PlatformTarget` outside the supported set.
    #[error("requested platform target '{0}' is not supported here")]
    UnsupportedPlatform(String),

    /// A user-supplied platform specifier could not be parsed.
    #[error("not a valid platform specifier '{0}'; valid values are MSIL, AnyCPU, x86, x64, ARM, Win32")]
    InvalidPlatform(String),

    /// A parsed project lacks a value that every model must carry.
    #[error("parsed project has no {0}")]
    MissingProperty(&'static str),

    /// Mutually exclusive request inputs were combined.
    #[error("conflicting build inputs: {0}")]
    ConflictingInputs(&'static str),

    #[error(
        "unable to find a solution file below '{}'; specify the solution file manually or list the projects",
        .0.display()
    )]
    NoSolutionFound(PathBuf),

    #[error("found more than one solution to build ({}); specify the solution explicitly", display_paths(.0))]
    AmbiguousSolution(Vec<PathBuf>),

    #[error("no projects to build")]
    NoProjects,

    /// The external preprocessing step failed for one project.
    #[error("preprocessing '{}' with {tool} failed: {message}", .project.display())]
    Preprocess {
        tool: String,
        project: PathBuf,
        message: String,
    },
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, source: roxmltree::Error) -> Self {
        Self::Xml { path: path.into(), source }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
