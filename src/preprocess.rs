//! Flattening project files through the compiler's `-preprocess` switch.
//!
//! ```text
//! Preprocessor
//!  • Passthrough          parse the project file as-is
//!  • MsBuildPreprocessor  dotnet msbuild | msbuild  -preprocess:<out>
//!        <out> = {target_dir}/build-analysis/{platform}/{configuration}/{stem}.tmp.xml
//! ```
//!
//! The preprocessed file has every import expanded inline, so the parser can
//! see properties that come from SDK props/targets files.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{ResolveError, Result};
use crate::platform::Platform;

/// Produces a single self-contained project file for one platform and
/// configuration.
pub trait Preprocessor {
    /// Return the path of a file the parser should read in place of
    /// `project`.
    fn preprocess(&self, project: &Path, platform: Platform, configuration: &str)
    -> Result<PathBuf>;
}

/// Parses project files directly, without flattening imports.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Preprocessor for Passthrough {
    fn preprocess(&self, project: &Path, _: Platform, _: &str) -> Result<PathBuf> {
        Ok(project.to_path_buf())
    }
}

/// Which front end runs MSBuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsBuildFlavor {
    /// `dotnet msbuild …`
    DotNet,
    /// `msbuild …` (Visual Studio / Mono)
    MsBuild,
}

/// Runs MSBuild with `-preprocess` once per project and platform.
#[derive(Debug, Clone)]
pub struct MsBuildPreprocessor {
    program: PathBuf,
    flavor: MsBuildFlavor,
    target_dir: PathBuf,
    properties: Vec<(String, String)>,
}

impl MsBuildPreprocessor {
    pub fn new(
        program: impl Into<PathBuf>,
        flavor: MsBuildFlavor,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            flavor,
            target_dir: target_dir.into(),
            properties: Vec::new(),
        }
    }

    /// Locate `dotnet`, then `msbuild`, on `PATH`.
    ///
    /// Returns `None` when neither is installed; callers fall back to
    /// [`Passthrough`].
    pub fn detect(target_dir: impl Into<PathBuf>) -> Option<Self> {
        let target_dir = target_dir.into();
        if let Ok(dotnet) = which::which("dotnet") {
            debug!(program = %dotnet.display(), "using dotnet msbuild for preprocessing");
            return Some(Self::new(dotnet, MsBuildFlavor::DotNet, target_dir));
        }
        if let Ok(msbuild) = which::which("msbuild") {
            debug!(program = %msbuild.display(), "using msbuild for preprocessing");
            return Some(Self::new(msbuild, MsBuildFlavor::MsBuild, target_dir));
        }
        info!("no MSBuild front end found on PATH; parsing project files without preprocessing");
        None
    }

    /// Pass an additional `-property:key=value` to every invocation.
    ///
    /// Properties are passed in the order they were first set; setting a key
    /// again replaces its value in place.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    #[must_use]
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in properties {
            self = self.property(k, v);
        }
        self
    }

    pub const fn flavor(&self) -> MsBuildFlavor {
        self.flavor
    }

    /// Where the flattened copy of `project` is written.
    pub fn output_file(&self, project: &Path, platform: Platform, configuration: &str) -> PathBuf {
        let stem = project
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        self.target_dir
            .join("build-analysis")
            .join(platform.to_string())
            .join(configuration)
            .join(format!("{stem}.tmp.xml"))
    }

    /// The full argument list for one invocation.
    pub fn arguments(
        &self,
        project: &Path,
        platform: Platform,
        configuration: &str,
        output: &Path,
    ) -> Vec<String> {
        let mut args = Vec::new();
        if self.flavor == MsBuildFlavor::DotNet {
            args.push("msbuild".to_string());
        }
        args.push("-nologo".to_string());
        args.push(project.display().to_string());
        args.push(format!("-property:Configuration={configuration}"));
        args.push(format!("-property:Platform={}", platform.msbuild_property()));
        for (key, value) in &self.properties {
            if key != "Configuration" && key != "Platform" {
                args.push(format!("-property:{key}={value}"));
            }
        }
        args.push(format!("-preprocess:{}", output.display()));
        args
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Preprocessor for MsBuildPreprocessor {
    fn preprocess(
        &self,
        project: &Path,
        platform: Platform,
        configuration: &str,
    ) -> Result<PathBuf> {
        let output = self.output_file(project, platform, configuration);
        if let Some(dir) = output.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ResolveError::io(dir, e))?;
        }

        let args = self.arguments(project, platform, configuration, &output);
        debug!(program = %self.program.display(), ?args, "preprocessing project");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| ResolveError::Preprocess {
                tool: self.tool_name(),
                project: project.to_path_buf(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            let stdout = String::from_utf8_lossy(&result.stdout);
            let stderr = String::from_utf8_lossy(&result.stderr);
            let mut parts = vec![result.status.to_string()];
            if !stdout.trim().is_empty() {
                parts.push(format!("stdout: {}", stdout.trim()));
            }
            if !stderr.trim().is_empty() {
                parts.push(format!("stderr: {}", stderr.trim()));
            }
            return Err(ResolveError::Preprocess {
                tool: self.tool_name(),
                project: project.to_path_buf(),
                message: parts.join("; "),
            });
        }

        Ok(output)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
