//! Partitioning a project list by target platform.
//!
//! Every project is parsed once per requested platform. A project lands in a
//! platform's list only when the parser found a build configuration for it
//! *and* its own `PlatformTarget` names that platform.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::Result;
use crate::platform::Platform;
use crate::preprocess::Preprocessor;
use crate::project::{ProjectFileModel, ProjectParser};

/// A project parsed for one configuration/platform pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProject {
    project_file: PathBuf,
    configuration: String,
    platform: Platform,
    project: ProjectFileModel,
}

impl ParsedProject {
    /// Preprocess and parse `project_file` for `platform`.
    ///
    /// Returns `Ok(None)` when the project has no configuration matching the
    /// pair.
    pub fn parse(
        project_file: &Path,
        configuration: &str,
        platform: Platform,
        preprocessor: &dyn Preprocessor,
        properties: &[(String, String)],
    ) -> Result<Option<Self>> {
        let source = preprocessor.preprocess(project_file, platform, configuration)?;
        let parser = ProjectParser::new(configuration, platform.project_name())
            .properties(properties.iter().cloned());

        let Some(project) = parser.parse(&source, project_file)? else {
            debug!(
                project = %project_file.display(),
                %platform,
                "skipped project as the parser did not find a valid configuration"
            );
            return Ok(None);
        };

        Ok(Some(Self {
            project_file: project_file.to_path_buf(),
            configuration: configuration.to_string(),
            platform,
            project,
        }))
    }

    pub fn project_file(&self) -> &Path {
        &self.project_file
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn project(&self) -> &ProjectFileModel {
        &self.project
    }

    /// The directory holding the project file.
    pub fn project_dir(&self) -> &Path {
        self.project_file.parent().unwrap_or(Path::new(""))
    }

    /// The compiler output directory, resolved against the project directory.
    pub fn output_dir(&self) -> PathBuf {
        self.project.output_path.resolve(self.project_dir())
    }

    /// Per-project artefact directory:
    /// `{target_dir}/{kind}/{platform}/{configuration}/{assembly_name}`.
    ///
    /// Falls back to the project file stem when the project declares no
    /// assembly name.
    pub fn artefact_dir(&self, target_dir: &Path, kind: &str) -> PathBuf {
        let name = if self.project.assembly_name.is_empty() {
            self.project_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            self.project.assembly_name.clone()
        };
        target_dir
            .join(kind)
            .join(self.platform.to_string())
            .join(&self.configuration)
            .join(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  PlatformProjects
// ═══════════════════════════════════════════════════════════════════════════════

/// Projects grouped by platform, plus the order platforms are built in.
///
/// The map keys and the build order always name the same platforms once
/// [`prune_empty`](Self::prune_empty) has run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformProjects {
    by_platform: HashMap<Platform, Vec<ParsedProject>>,
    build_order: Vec<Platform>,
}

impl PlatformProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `projects` for `platform`, adding it to the end of the build
    /// order on first use.
    pub fn insert(&mut self, platform: Platform, projects: Vec<ParsedProject>) {
        match self.by_platform.get_mut(&platform) {
            Some(existing) => existing.extend(projects),
            None => {
                self.by_platform.insert(platform, projects);
                self.build_order.push(platform);
            }
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&[ParsedProject]> {
        self.by_platform.get(&platform).map(Vec::as_slice)
    }

    pub fn build_order(&self) -> &[Platform] {
        &self.build_order
    }

    /// Platforms with their projects, in build order.
    pub fn iter(&self) -> impl Iterator<Item = (Platform, &[ParsedProject])> {
        self.build_order
            .iter()
            .filter_map(|p| self.by_platform.get(p).map(|v| (*p, v.as_slice())))
    }

    pub fn is_empty(&self) -> bool {
        self.by_platform.values().all(Vec::is_empty)
    }

    /// Keep only the projects for which `keep` returns `true`.
    ///
    /// Call [`prune_empty`](Self::prune_empty) afterwards.
    pub fn retain(&mut self, mut keep: impl FnMut(Platform, &ParsedProject) -> bool) {
        for (platform, projects) in &mut self.by_platform {
            projects.retain(|p| keep(*platform, p));
        }
    }

    /// Drop platforms with no projects from both the map and the build order.
    pub fn prune_empty(&mut self) {
        self.by_platform.retain(|platform, projects| {
            if projects.is_empty() {
                trace!(%platform, "dropping platform with no projects");
            }
            !projects.is_empty()
        });
        let by_platform = &self.by_platform;
        self.build_order.retain(|p| by_platform.contains_key(p));
    }
}

/// Parse every project for every platform.
///
/// Platforms keep the order of `platforms`; projects keep the order of
/// `projects`. A platform that ends up with no projects is dropped.
///
/// # Errors
///
/// Preprocessing and parse failures abort the pass, as does a project whose
/// `PlatformTarget` is not one of `AnyCPU`, `x86`, `x64` or `ARM`.
pub fn resolve_platforms(
    projects: &[PathBuf],
    configuration: &str,
    platforms: &[Platform],
    preprocessor: &dyn Preprocessor,
    properties: &[(String, String)],
) -> Result<PlatformProjects> {
    let mut resolved = PlatformProjects::new();

    for &platform in platforms {
        let mut accepted = Vec::new();
        for project_file in projects {
            let Some(parsed) =
                ParsedProject::parse(project_file, configuration, platform, preprocessor, properties)?
            else {
                continue;
            };
            if is_valid_for_platform(&parsed)? {
                accepted.push(parsed);
            } else {
                debug!(
                    project = %project_file.display(),
                    %platform,
                    platform_target = %parsed.project.platform_target,
                    "project targets a different platform"
                );
            }
        }
        resolved.insert(platform, accepted);
    }

    resolved.prune_empty();
    Ok(resolved)
}

fn is_valid_for_platform(parsed: &ParsedProject) -> Result<bool> {
    let target = Platform::from_platform_target(&parsed.project.platform_target)?;
    Ok(target == parsed.platform)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
