//! Assembling the effective build configuration.
//!
//! [`resolve`] turns an immutable [`BuildRequest`] into an
//! [`EffectiveBuildConfig`]: which project files to build, which solution
//! they came from, and which projects build on which platform, in order.
//!
//! Input precedence:
//!
//! 1. an explicit project list;
//! 2. otherwise an explicit solution file, if it exists;
//! 3. otherwise the single `*.sln` found below the working directory.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::error::{ResolveError, Result};
use crate::platform::Platform;
use crate::preprocess::{MsBuildPreprocessor, Passthrough, Preprocessor};
use crate::resolver::{ParsedProject, PlatformProjects, resolve_platforms};
use crate::solution::{self, Solution};

pub const DEFAULT_CONFIGURATION: &str = "Release";
pub const DEFAULT_TARGET_DIR: &str = "build-artefacts";

static DEFAULT_PLATFORMS: [Platform; 4] = Platform::DEFAULTS;

// ═══════════════════════════════════════════════════════════════════════════════
//  BuildRequest
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a resolution pass depends on.
///
/// Two equal requests resolve to the same configuration, which is what
/// [`BuildConfigCache`] relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    configuration: String,
    projects: Vec<PathBuf>,
    solution: Option<PathBuf>,
    solution_dir: Option<PathBuf>,
    platforms: Vec<Platform>,
    target_dir: PathBuf,
    working_dir: PathBuf,
    properties: Vec<(String, String)>,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BuildRequest {
    pub fn builder() -> BuildRequestBuilder {
        BuildRequestBuilder::default()
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn projects(&self) -> &[PathBuf] {
        &self.projects
    }

    pub fn solution(&self) -> Option<&Path> {
        self.solution.as_deref()
    }

    pub fn solution_dir(&self) -> Option<&Path> {
        self.solution_dir.as_deref()
    }

    /// The platforms to attempt: the requested ones, or
    /// [`Platform::DEFAULTS`] when none were requested.
    pub fn platforms(&self) -> &[Platform] {
        if self.platforms.is_empty() {
            &DEFAULT_PLATFORMS
        } else {
            &self.platforms
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Global MSBuild properties, in the order they were added.
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// An MSBuild-backed preprocessor writing below
    /// [`target_dir`](Self::target_dir), or [`Passthrough`] when no MSBuild
    /// front end is installed.
    pub fn detect_preprocessor(&self) -> Box<dyn Preprocessor> {
        match MsBuildPreprocessor::detect(self.working_dir.join(&self.target_dir)) {
            Some(msbuild) => Box::new(msbuild.properties(self.properties.iter().cloned())),
            None => Box::new(Passthrough),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.working_dir.join(path)
    }
}

/// Builder for [`BuildRequest`].
///
/// # Example
/// ```no_run
/// use msproj_rs::{BuildRequest, Platform};
///
/// let request = BuildRequest::builder()
///     .configuration("Debug")
///     .solution("All.sln")
///     .platforms([Platform::AnyCpu, Platform::X64])
///     .property("SolutionDir", r"C:\src\")
///     .build();
/// assert_eq!(request.configuration(), "Debug");
/// ```
#[derive(Debug, Clone)]
pub struct BuildRequestBuilder {
    request: BuildRequest,
}

impl Default for BuildRequestBuilder {
    fn default() -> Self {
        Self {
            request: BuildRequest {
                configuration: DEFAULT_CONFIGURATION.to_string(),
                projects: Vec::new(),
                solution: None,
                solution_dir: None,
                platforms: Vec::new(),
                target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
                working_dir: PathBuf::from("."),
                properties: Vec::new(),
            },
        }
    }
}

impl BuildRequestBuilder {
    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.request.configuration = configuration.into();
        self
    }

    /// Add one explicit project file.
    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.projects.push(path.into());
        self
    }

    pub fn projects<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.request.projects.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn solution(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.solution = Some(path.into());
        self
    }

    pub fn solution_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.solution_dir = Some(path.into());
        self
    }

    /// Add a platform to attempt. Without any, the defaults are used.
    pub fn platform(mut self, platform: Platform) -> Self {
        if !self.request.platforms.contains(&platform) {
            self.request.platforms.push(platform);
        }
        self
    }

    pub fn platforms(self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        platforms.into_iter().fold(self, Self::platform)
    }

    pub fn target_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.target_dir = path.into();
        self
    }

    /// Directory relative paths are resolved against and where solutions
    /// are searched for.
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.working_dir = path.into();
        self
    }

    /// Set a global MSBuild property. Setting the same key again replaces
    /// the value in place.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.request.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.request.properties.push((key, value)),
        }
        self
    }

    pub fn build(self) -> BuildRequest {
        self.request
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  EffectiveBuildConfig
// ═══════════════════════════════════════════════════════════════════════════════

/// The resolved project set, partitioned by platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveBuildConfig {
    configuration: String,
    project_files: Vec<PathBuf>,
    solution: Option<PathBuf>,
    solution_dir: Option<PathBuf>,
    projects: PlatformProjects,
}

impl EffectiveBuildConfig {
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Every project file that was considered, in input order.
    pub fn project_files(&self) -> &[PathBuf] {
        &self.project_files
    }

    pub fn solution(&self) -> Option<&Path> {
        self.solution.as_deref()
    }

    pub fn solution_dir(&self) -> Option<&Path> {
        self.solution_dir.as_deref()
    }

    pub fn projects_by_platform(&self) -> &PlatformProjects {
        &self.projects
    }

    pub fn platform_build_order(&self) -> &[Platform] {
        self.projects.build_order()
    }

    /// Projects of the first platform in build order.
    pub fn projects(&self) -> &[ParsedProject] {
        match self.platform_build_order().first() {
            Some(&platform) => self.projects_for(platform),
            None => &[],
        }
    }

    /// Projects built for `platform`; empty when the platform is not built.
    pub fn projects_for(&self, platform: Platform) -> &[ParsedProject] {
        self.projects.get(platform).unwrap_or(&[])
    }

    /// Log the solution and each built platform with its projects.
    pub fn log_summary(&self) {
        self.log_summary_for(self.platform_build_order(), Path::new(""));
    }

    fn log_summary_for(&self, platforms: &[Platform], working_dir: &Path) {
        let relative = |p: &Path| p.strip_prefix(working_dir).unwrap_or(p).display().to_string();

        info!("project summary by platform type");
        if let Some(solution) = &self.solution {
            info!(solution = %relative(solution));
        }
        if let Some(dir) = &self.solution_dir {
            info!(solution_dir = %relative(dir));
        }
        for &platform in platforms {
            let projects = self.projects_for(platform);
            if projects.is_empty() {
                info!(%platform, "<no projects defined>");
            }
            for project in projects {
                info!(%platform, project = %relative(project.project_file()));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Resolution
// ═══════════════════════════════════════════════════════════════════════════════

struct Inputs {
    projects: Vec<PathBuf>,
    solution: Option<Solution>,
    solution_dir: Option<PathBuf>,
}

impl Inputs {
    fn from_solution(solution: Solution) -> Self {
        Self {
            projects: solution.project_paths(),
            solution_dir: Some(solution.dir().to_path_buf()),
            solution: Some(solution),
        }
    }
}

/// Resolve `request` into an [`EffectiveBuildConfig`].
///
/// # Errors
///
/// - [`ResolveError::ConflictingInputs`] for a project list combined with a
///   solution, or an existing solution combined with a solution directory.
/// - [`ResolveError::NoSolutionFound`] / [`ResolveError::AmbiguousSolution`]
///   when discovery finds zero or several solutions.
/// - [`ResolveError::NoProjects`] when there is nothing to build.
/// - Any parse, preprocessing or platform error from the projects.
pub fn resolve(request: &BuildRequest, preprocessor: &dyn Preprocessor) -> Result<EffectiveBuildConfig> {
    let inputs = select_inputs(request)?;
    if inputs.projects.is_empty() {
        return Err(ResolveError::NoProjects);
    }

    let working_dir = request.working_dir();
    for project in &inputs.projects {
        info!(
            project = %project.strip_prefix(working_dir).unwrap_or(project).display(),
            "found project"
        );
    }

    let platforms = request.platforms();
    let mut projects = resolve_platforms(
        &inputs.projects,
        request.configuration(),
        platforms,
        preprocessor,
        request.properties(),
    )?;
    if let Some(solution) = &inputs.solution {
        projects = solution::filter(solution, projects, request.configuration());
    }
    if projects.is_empty() {
        return Err(ResolveError::NoProjects);
    }

    let config = EffectiveBuildConfig {
        configuration: request.configuration().to_string(),
        project_files: inputs.projects,
        solution: inputs.solution.map(|s| s.path().to_path_buf()),
        solution_dir: inputs.solution_dir,
        projects,
    };
    config.log_summary_for(platforms, working_dir);
    Ok(config)
}

fn select_inputs(request: &BuildRequest) -> Result<Inputs> {
    if !request.projects.is_empty() {
        if request.solution.is_some() {
            return Err(ResolveError::ConflictingInputs(
                "an explicit project list cannot be combined with a solution",
            ));
        }
        info!("using manually defined projects and solution directory for build");
        let solution_dir = request.solution_dir.as_deref().map(|d| request.absolute(d));
        if !solution_dir.as_deref().is_some_and(Path::is_dir) {
            warn!(
                "when specifying projects explicitly, provide the solution directory as well to allow cleaning resolved packages"
            );
        }
        return Ok(Inputs {
            projects: request.projects.iter().map(|p| request.absolute(p)).collect(),
            solution: None,
            solution_dir,
        });
    }

    if let Some(path) = request.solution.as_deref() {
        let path = request.absolute(path);
        if path.is_file() {
            if request.solution_dir.is_some() {
                return Err(ResolveError::ConflictingInputs(
                    "a solution cannot be combined with a solution directory",
                ));
            }
            info!(solution = %path.display(), "using manually defined solution for build");
            return Ok(Inputs::from_solution(Solution::from_file(&path)?));
        }
        warn!(solution = %path.display(), "solution file does not exist, searching for one instead");
    }

    let mut found = discover_solutions(request.working_dir());
    if found.len() > 1 {
        return Err(ResolveError::AmbiguousSolution(found));
    }
    let Some(path) = found.pop() else {
        return Err(ResolveError::NoSolutionFound(request.working_dir().to_path_buf()));
    };
    info!(solution = %path.display(), "using automatically detected solution for build");
    Ok(Inputs::from_solution(Solution::from_file(&path)?))
}

/// Every `*.sln` file below `root`, sorted.
///
/// Hidden entries and git-ignored paths are skipped.
pub fn discover_solutions(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(true);
    builder.git_ignore(true);
    builder.git_global(true);
    builder.git_exclude(true);

    let mut found: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry while searching for solutions");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sln"))
        })
        .map(ignore::DirEntry::into_path)
        .collect();
    found.sort();
    debug!(root = %root.display(), count = found.len(), "searched for solutions");
    found
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Cache
// ═══════════════════════════════════════════════════════════════════════════════

/// Holds the last resolved configuration together with its request.
///
/// A lookup with an equal request returns the cached value; any other
/// request resolves again and replaces it.
#[derive(Debug, Default)]
pub struct BuildConfigCache {
    entry: Option<(BuildRequest, EffectiveBuildConfig)>,
}

impl BuildConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A failed resolution leaves the cache empty.
    pub fn get_or_resolve(
        &mut self,
        request: &BuildRequest,
        preprocessor: &dyn Preprocessor,
    ) -> Result<&EffectiveBuildConfig> {
        let entry = match self.entry.take() {
            Some((cached, config)) if cached == *request => {
                debug!("reusing cached build configuration");
                (cached, config)
            }
            _ => (request.clone(), resolve(request, preprocessor)?),
        };
        Ok(&self.entry.insert(entry).1)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_cached(&self, request: &BuildRequest) -> bool {
        self.entry.as_ref().is_some_and(|(cached, _)| cached == request)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_utils::{Fixture, sample_project, with_logs};

    const CSHARP: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";

    /// Counts invocations and parses the project file as-is.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl Preprocessor for Counting {
        fn preprocess(&self, project: &Path, _: Platform, _: &str) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            Ok(project.to_path_buf())
        }
    }

    fn solution_text(projects: &[(&str, &str, &str)], configuration: &str) -> String {
        let mut text = String::from("Microsoft Visual Studio Solution File, Format Version 12.00\n");
        for (name, path, guid) in projects {
            text.push_str(&format!(
                "Project(\"{CSHARP}\") = \"{name}\", \"{path}\", \"{guid}\"\nEndProject\n"
            ));
        }
        text.push_str("Global\n\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
        for (_, _, guid) in projects {
            text.push_str(&format!(
                "\t\t{guid}.{configuration}|Any CPU.Build.0 = {configuration}|Any CPU\n"
            ));
        }
        text.push_str("\tEndGlobalSection\nEndGlobal\n");
        text
    }

    fn two_project_solution(fx: &Fixture) -> PathBuf {
        fx.write("src/A/A.csproj", &sample_project("{A}", &["AnyCPU"]));
        fx.write("src/B/B.csproj", &sample_project("{B}", &["AnyCPU"]));
        fx.write(
            "src/All.sln",
            &solution_text(
                &[("A", "A\\A.csproj", "{A}"), ("B", "B\\B.csproj", "{B}")],
                "Release",
            ),
        )
    }

    #[test]
    fn builder_defaults() {
        let request = BuildRequest::default();
        assert_eq!(request.configuration(), "Release");
        assert_eq!(request.target_dir(), Path::new("build-artefacts"));
        assert_eq!(request.working_dir(), Path::new("."));
        assert_eq!(request.platforms(), &Platform::DEFAULTS);
        assert!(request.projects().is_empty());
        assert!(request.solution().is_none());
    }

    #[test]
    fn builder_properties_replace_in_place() {
        let request = BuildRequest::builder()
            .property("A", "1")
            .property("B", "2")
            .property("A", "3")
            .platform(Platform::X64)
            .platform(Platform::X64)
            .build();
        assert_eq!(
            request.properties(),
            &[("A".to_string(), "3".to_string()), ("B".to_string(), "2".to_string())]
        );
        assert_eq!(request.platforms(), &[Platform::X64]);
    }

    #[test]
    fn no_solution_and_no_projects_fails() {
        let fx = Fixture::new();
        let request = BuildRequest::builder().working_dir(fx.root()).build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        assert!(matches!(err, ResolveError::NoSolutionFound(ref p) if p == fx.root()), "{err}");
    }

    #[test]
    fn several_solutions_are_ambiguous() {
        let fx = Fixture::new();
        fx.write("a/A.sln", "");
        fx.write("b/B.sln", "");
        let request = BuildRequest::builder().working_dir(fx.root()).build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        match err {
            ResolveError::AmbiguousSolution(paths) => {
                assert_eq!(paths, vec![fx.path("a/A.sln"), fx.path("b/B.sln")]);
            }
            other => panic!("expected AmbiguousSolution, got {other}"),
        }
    }

    #[test]
    fn discovered_solution_is_used() {
        let fx = Fixture::new();
        let sln = two_project_solution(&fx);
        let request = BuildRequest::builder().working_dir(fx.root()).build();

        let config = resolve(&request, &Passthrough).unwrap();
        assert_eq!(config.solution(), Some(sln.as_path()));
        assert_eq!(config.solution_dir(), Some(fx.path("src").as_path()));
        assert_eq!(config.configuration(), "Release");
        assert_eq!(config.platform_build_order(), &[Platform::AnyCpu]);
        assert_eq!(config.project_files().len(), 2);
        assert_eq!(config.projects().len(), 2);
        assert!(config.projects_for(Platform::X64).is_empty());
    }

    #[test]
    fn hidden_directories_are_not_searched() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        fx.write(".cache/Stale.sln", "");
        let found = discover_solutions(fx.root());
        assert_eq!(found, vec![fx.path("src/All.sln")]);
    }

    #[test]
    fn explicit_solution_excludes_folders_and_filters() {
        let fx = Fixture::new();
        fx.write("A/A.csproj", &sample_project("{A}", &["AnyCPU"]));
        fx.write("B/B.csproj", &sample_project("{B}", &["AnyCPU"]));
        let mut text = solution_text(&[("A", "A\\A.csproj", "{A}")], "Debug");
        // B is a member but has no Build.0 mapping; the folder is never parsed.
        text.push_str(
            "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"B\", \"B\\B.csproj\", \"{B}\"\nEndProject\n\
             Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"docs\", \"docs\", \"{D}\"\nEndProject\n",
        );
        let sln = fx.write("Main.sln", &text);
        // A second manifest would make discovery ambiguous.
        fx.write("other/Other.sln", "");

        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .configuration("Debug")
            .solution("Main.sln")
            .build();
        let config = resolve(&request, &Passthrough).unwrap();

        assert_eq!(config.solution(), Some(sln.as_path()));
        assert_eq!(
            config.project_files(),
            &[fx.path("A/A.csproj"), fx.path("B/B.csproj")]
        );
        let built: Vec<&Path> = config.projects().iter().map(ParsedProject::project_file).collect();
        assert_eq!(built, vec![fx.path("A/A.csproj").as_path()]);
    }

    #[test]
    fn missing_explicit_solution_falls_back_to_discovery() {
        let fx = Fixture::new();
        let sln = two_project_solution(&fx);
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .solution("Gone.sln")
            .build();

        let (config, logs) = with_logs(|| resolve(&request, &Passthrough));
        assert_eq!(config.unwrap().solution(), Some(sln.as_path()));
        assert!(logs.contains("solution file does not exist"), "{logs}");
    }

    #[test]
    fn projects_and_solution_conflict() {
        let fx = Fixture::new();
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .project("A/A.csproj")
            .solution("All.sln")
            .build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        assert!(matches!(err, ResolveError::ConflictingInputs(_)), "{err}");
    }

    #[test]
    fn solution_and_solution_dir_conflict() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .solution("src/All.sln")
            .solution_dir("src")
            .build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        assert!(matches!(err, ResolveError::ConflictingInputs(_)), "{err}");
    }

    #[test]
    fn explicit_projects_skip_solution_filtering() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .configuration("Debug")
            .project("src/A/A.csproj")
            .build();

        let (config, logs) = with_logs(|| resolve(&request, &Passthrough));
        let config = config.unwrap();
        assert!(config.solution().is_none());
        assert!(config.solution_dir().is_none());
        assert_eq!(config.projects().len(), 1);
        assert!(logs.contains("provide the solution directory"), "{logs}");
    }

    #[test]
    fn existing_solution_dir_does_not_warn() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .project("src/A/A.csproj")
            .solution_dir("src")
            .build();

        let (config, logs) = with_logs(|| resolve(&request, &Passthrough));
        assert_eq!(config.unwrap().solution_dir(), Some(fx.path("src").as_path()));
        assert!(!logs.contains("provide the solution directory"), "{logs}");
    }

    #[test]
    fn solution_with_only_folders_has_no_projects() {
        let fx = Fixture::new();
        fx.write(
            "Empty.sln",
            "Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"docs\", \"docs\", \"{D}\"\nEndProject\n",
        );
        let request = BuildRequest::builder().working_dir(fx.root()).build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        assert!(matches!(err, ResolveError::NoProjects), "{err}");
    }

    #[test]
    fn nothing_buildable_has_no_projects() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        // The manifest only maps Release; Debug builds nothing.
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .configuration("Debug")
            .build();
        let err = resolve(&request, &Passthrough).unwrap_err();
        assert!(matches!(err, ResolveError::NoProjects), "{err}");
    }

    #[test]
    fn summary_lists_platforms_without_projects() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let request = BuildRequest::builder()
            .working_dir(fx.root())
            .platforms([Platform::AnyCpu, Platform::X86])
            .build();
        let (config, logs) = with_logs(|| resolve(&request, &Passthrough));
        assert!(config.is_ok());
        assert!(logs.contains("project summary by platform type"), "{logs}");
        assert!(logs.contains("<no projects defined>"), "{logs}");
        assert!(logs.contains("A.csproj"), "{logs}");
    }

    #[test]
    fn cache_reuses_equal_requests() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let request = BuildRequest::builder().working_dir(fx.root()).build();
        let counting = Counting::default();
        let mut cache = BuildConfigCache::new();

        let first = cache.get_or_resolve(&request, &counting).unwrap().clone();
        let calls = counting.calls.get();
        assert!(calls > 0);
        assert!(cache.is_cached(&request));

        let second = cache.get_or_resolve(&request, &counting).unwrap().clone();
        assert_eq!(counting.calls.get(), calls);
        assert_eq!(first, second);

        let narrowed = BuildRequest::builder()
            .working_dir(fx.root())
            .platform(Platform::AnyCpu)
            .build();
        cache.get_or_resolve(&narrowed, &counting).unwrap();
        assert!(counting.calls.get() > calls);
        assert!(!cache.is_cached(&request));
        assert!(cache.is_cached(&narrowed));

        cache.invalidate();
        assert!(!cache.is_cached(&narrowed));
    }

    #[test]
    fn failed_resolution_empties_the_cache() {
        let fx = Fixture::new();
        two_project_solution(&fx);
        let good = BuildRequest::builder().working_dir(fx.root()).build();
        let bad = BuildRequest::builder()
            .working_dir(fx.root())
            .project("A.csproj")
            .solution("All.sln")
            .build();
        let mut cache = BuildConfigCache::new();
        cache.get_or_resolve(&good, &Passthrough).unwrap();
        assert!(cache.get_or_resolve(&bad, &Passthrough).is_err());
        assert!(!cache.is_cached(&good));
    }
}
