pub mod condition;
pub mod config;
pub mod error;
pub mod platform;
pub mod preprocess;
pub mod project;
pub mod properties;
pub mod resolver;
pub mod solution;

#[cfg(test)]
mod test_utils;

pub use config::{BuildConfigCache, BuildRequest, BuildRequestBuilder, EffectiveBuildConfig, resolve};
pub use error::{ResolveError, Result};
pub use platform::Platform;
pub use preprocess::{MsBuildPreprocessor, Passthrough, Preprocessor};
pub use project::{ProjectFileModel, ProjectParser};
pub use resolver::{ParsedProject, PlatformProjects};
pub use solution::Solution;
