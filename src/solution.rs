//! Visual Studio solution manifests (`.sln`).
//!
//! Two things are read from a manifest:
//!
//! - member projects, from lines of the form
//!   `Project("{type-guid}") = "Name", "relative\path.csproj", "{project-guid}"`;
//! - build mappings, from `key = value` lines inside
//!   `GlobalSection(ProjectConfigurationPlatforms)`, e.g.
//!   `{project-guid}.Release|Any CPU.Build.0 = Release|Any CPU`.
//!
//! [`filter`] uses the mappings to drop projects the solution does not build
//! for a configuration/platform pair.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chumsky::prelude::*;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::project::combine;
use crate::resolver::PlatformProjects;

/// Type GUID of solution folders, which are not buildable projects.
pub const SOLUTION_FOLDER_TYPE_ID: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

/// One `Project(...)` entry of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionProject {
    pub type_id: String,
    pub name: String,
    /// Path as written in the manifest.
    pub relative_path: String,
    /// Path joined to the solution directory.
    pub path: PathBuf,
    pub guid: String,
}

impl SolutionProject {
    pub fn is_folder(&self) -> bool {
        self.type_id.eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE_ID)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    path: PathBuf,
    projects: Vec<SolutionProject>,
    configurations: HashMap<String, String>,
}

impl Solution {
    /// Read and parse a manifest from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ResolveError::SolutionNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))?;
        Ok(Self::parse(&content, path))
    }

    /// Parse manifest `content` as if read from `path`.
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let parser = project_line_parser();

        let mut projects = Vec::new();
        let mut configurations = HashMap::new();
        let mut in_config_section = false;

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with("GlobalSection(ProjectConfigurationPlatforms)") {
                in_config_section = true;
                continue;
            }
            if in_config_section {
                if trimmed.starts_with("EndGlobalSection") {
                    in_config_section = false;
                } else if let Some((key, value)) = trimmed.split_once('=') {
                    configurations.insert(key.trim().to_string(), value.trim().to_string());
                }
                continue;
            }

            if trimmed.starts_with("Project(") {
                match parser.parse(trimmed).into_result() {
                    Ok((type_id, name, relative_path, guid)) => projects.push(SolutionProject {
                        type_id: type_id.to_string(),
                        name: name.to_string(),
                        relative_path: relative_path.to_string(),
                        path: combine(&dir, relative_path),
                        guid: guid.to_string(),
                    }),
                    Err(_) => debug!(line = trimmed, "ignoring malformed project line"),
                }
            }
        }

        Self {
            path,
            projects,
            configurations,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory containing the manifest.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Every `Project(...)` entry, solution folders included.
    pub fn projects(&self) -> &[SolutionProject] {
        &self.projects
    }

    /// Paths of buildable member projects, in manifest order.
    pub fn project_paths(&self) -> Vec<PathBuf> {
        self.projects
            .iter()
            .filter(|p| !p.is_folder())
            .map(|p| p.path.clone())
            .collect()
    }

    /// The solution configuration a project is built with, looked up by
    /// `{guid}.{configuration}|{platform}.Build.0`.
    pub fn build_mapping(&self, guid: &str, configuration: &str, platform: &str) -> Option<&str> {
        self.configurations
            .get(&format!("{guid}.{configuration}|{platform}.Build.0"))
            .map(String::as_str)
    }

    pub fn configurations(&self) -> &HashMap<String, String> {
        &self.configurations
    }
}

/// `Project("{type}") = "Name", "Path", "{guid}"`
fn project_line_parser<'a>()
-> impl Parser<'a, &'a str, (&'a str, &'a str, &'a str, &'a str), extra::Err<Simple<'a, char>>> {
    let quoted = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'));

    just("Project")
        .ignore_then(quoted.clone().padded().delimited_by(just('('), just(')')))
        .then_ignore(just('=').padded())
        .then(quoted.clone())
        .then_ignore(just(',').padded())
        .then(quoted.clone())
        .then_ignore(just(',').padded())
        .then(quoted)
        .then_ignore(any().repeated())
        .map(|(((type_id, name), path), guid)| (type_id, name, path, guid))
}

/// Keep only projects that `solution` builds for `configuration` on their
/// platform.
///
/// A project survives when `{guid}.{C}|{P}.Build.0` is mapped to exactly
/// `{C}|{P}`, where `P` is the solution spelling of the platform. Platforms
/// left without projects are removed.
pub fn filter(solution: &Solution, mut projects: PlatformProjects, configuration: &str) -> PlatformProjects {
    projects.retain(|platform, parsed| {
        let solution_platform = platform.solution_name();
        let expected = format!("{configuration}|{solution_platform}");
        let guid = &parsed.project().project_guid;
        if guid.is_empty() {
            debug!(
                project = %parsed.project_file().display(),
                "removed project as it declares no ProjectGuid to match against the solution"
            );
            return false;
        }

        match solution.build_mapping(guid, configuration, solution_platform) {
            Some(mapped) if mapped == expected => {
                debug!(project = %parsed.project_file().display(), "preserved project");
                true
            }
            mapped => {
                debug!(
                    project = %parsed.project_file().display(),
                    project_config = %expected,
                    solution_config = mapped.unwrap_or("<none>"),
                    "removed project as the solution does not build it for this configuration"
                );
                false
            }
        }
    });
    projects.prune_empty();
    projects
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
