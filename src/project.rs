//! MSBuild project file parsing.
//!
//! [`ProjectParser`] turns one project file (`.csproj` and friends) into a
//! [`ProjectFileModel`] for a single configuration/platform pair, or `None`
//! when the project has no `OutputPath` for that pair.
//!
//! Parsing happens in two explicit stages:
//!
//! 1. [`collect_property_groups`] walks the file and every `<Import>` it
//!    references depth-first, producing a flat, document-ordered list of
//!    [`PropertyGroupDecl`]s.
//! 2. [`fold_properties`] folds that list into a [`PropertyMap`], applying only
//!    groups whose guard matches (see [`crate::condition`]).
//!
//! Items (`Compile`, `Content`, `Reference`, `ProjectReference`) are read only
//! from the parsed file itself, never from imports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::condition::Guard;
use crate::error::{ResolveError, Result};
use crate::platform::Platform;
use crate::properties::PropertyMap;

// ═══════════════════════════════════════════════════════════════════════════════
//  Model
// ═══════════════════════════════════════════════════════════════════════════════

/// A fully substituted compiler output directory.
///
/// Can only be constructed from a value with no `$(...)` reference left in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath(String);

impl OutputPath {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.contains("$(") {
            return Err(ResolveError::UnresolvedOutputPath(value));
        }
        Ok(Self(value))
    }

    /// The path as written in the project (usually relative, `\`-separated).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path with Windows separators normalized, joined to `project_dir`.
    pub fn resolve(&self, project_dir: &Path) -> PathBuf {
        combine(project_dir, &self.0)
    }
}

/// A `<Compile>` or `<Content>` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub relative_path: String,
    /// `true` for `<Compile>`, `false` for `<Content>`.
    pub compile: bool,
}

/// A `<Reference>` item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReference {
    pub include: String,
    pub hint_path: Option<PathBuf>,
    pub name: Option<String>,
    pub fusion_name: Option<String>,
    pub specific_version: Option<bool>,
    pub aliases: Option<String>,
    pub private: Option<bool>,
}

/// A `<ProjectReference>` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub path: PathBuf,
    pub relative_path: String,
    pub name: Option<String>,
    /// The referenced project's GUID (`<Project>` child).
    pub project: Option<String>,
    pub package: Option<PathBuf>,
}

/// One project's effective properties and items for a configuration/platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFileModel {
    pub configuration: String,
    /// Normalized platform name (`Any CPU` is stored as `AnyCPU`).
    pub platform: String,
    /// The project's own `PlatformTarget`, or [`platform`](Self::platform)
    /// when the project does not declare one.
    pub platform_target: String,
    pub project_guid: String,
    /// `Library`, `Exe` or `WinExe`.
    pub output_type: String,
    pub output_path: OutputPath,
    pub root_namespace: String,
    pub assembly_name: String,
    pub target_framework_version: String,
    pub target_framework_profile: String,
    pub files: Vec<ProjectFile>,
    pub references: Vec<AssemblyReference>,
    pub project_references: Vec<ProjectReference>,
}

impl ProjectFileModel {
    /// Build a model from a fully accumulated property map.
    ///
    /// Returns `Ok(None)` when the map has no non-empty `OutputPath`.
    fn from_properties(props: &PropertyMap, items: Items) -> Result<Option<Self>> {
        let Some(output_path) = props.get_non_empty("OutputPath") else {
            return Ok(None);
        };

        let configuration = props
            .get_non_empty("Configuration")
            .ok_or(ResolveError::MissingProperty("configuration"))?;
        let platform = props
            .get_non_empty("Platform")
            .map(|p| Platform::normalize_name(&p))
            .ok_or(ResolveError::MissingProperty("platform"))?;
        let platform_target = props
            .get("PlatformTarget")
            .unwrap_or_else(|| platform.clone());

        Ok(Some(Self {
            configuration,
            platform,
            platform_target,
            project_guid: props.get("ProjectGuid").unwrap_or_default(),
            output_type: props.get("OutputType").unwrap_or_else(|| "Library".to_string()),
            output_path: OutputPath::new(output_path)?,
            root_namespace: props.get("RootNamespace").unwrap_or_default(),
            assembly_name: props.get("AssemblyName").unwrap_or_default(),
            target_framework_version: props.get("TargetFrameworkVersion").unwrap_or_default(),
            target_framework_profile: props.get("TargetFrameworkProfile").unwrap_or_default(),
            files: items.files,
            references: items.references,
            project_references: items.project_references,
        }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Property sources
// ═══════════════════════════════════════════════════════════════════════════════

/// A property element inside a `<PropertyGroup>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub value: String,
    pub condition: Option<String>,
}

/// A `<PropertyGroup>` as found on disk, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyGroupDecl {
    pub condition: Option<String>,
    pub properties: Vec<PropertyDecl>,
    /// File the group was read from.
    pub origin: PathBuf,
    /// `true` when the group came from an `<Import>`ed file.
    pub imported: bool,
}

/// Collect every `<PropertyGroup>` of `path` and, recursively, of the files
/// it imports, in the order MSBuild would evaluate them.
///
/// Imports that do not exist on disk are skipped. An import that is already
/// being walked higher up the chain is skipped as well.
pub fn collect_property_groups(path: &Path) -> Result<Vec<PropertyGroupDecl>> {
    let mut groups = Vec::new();
    let mut stack = HashSet::new();
    collect_into(path, false, &mut stack, &mut groups)?;
    Ok(groups)
}

fn collect_into(
    path: &Path,
    imported: bool,
    stack: &mut HashSet<PathBuf>,
    out: &mut Vec<PropertyGroupDecl>,
) -> Result<()> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !stack.insert(key.clone()) {
        debug!(path = %path.display(), "skipping recursive import");
        return Ok(());
    }

    let source = read_source(path)?;
    let doc = parse_document(path, &source)?;
    let base_dir = path.parent().unwrap_or(Path::new(""));

    for child in doc.root_element().children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "PropertyGroup" => out.push(PropertyGroupDecl {
                condition: child.attribute("Condition").map(String::from),
                properties: child
                    .children()
                    .filter(|n| n.is_element())
                    .map(|p| PropertyDecl {
                        name: p.tag_name().name().to_string(),
                        value: element_text(&p),
                        condition: p.attribute("Condition").map(String::from),
                    })
                    .collect(),
                origin: path.to_path_buf(),
                imported,
            }),
            "Import" => {
                let Some(reference) = child.attribute("Project") else {
                    continue;
                };
                match locate_import(base_dir, reference) {
                    Some(import) => collect_into(&import, true, stack, out)?,
                    None => trace!(import = reference, "import not found, skipping"),
                }
            }
            _ => {}
        }
    }

    stack.remove(&key);
    Ok(())
}

/// Resolve an `<Import Project="…">` reference: relative to the importing
/// file first, then as given.
fn locate_import(base_dir: &Path, reference: &str) -> Option<PathBuf> {
    let relative = combine(base_dir, reference);
    if relative.is_file() {
        return Some(relative);
    }
    let literal = PathBuf::from(normalize_separators(reference));
    literal.is_file().then_some(literal)
}

/// Fold property groups into `seed` for one configuration/platform.
///
/// A group applies when its guard matches; inside an applied group, every
/// property without a `Condition` of its own is recorded, later values
/// overwriting earlier ones.
pub fn fold_properties(
    seed: PropertyMap,
    groups: &[PropertyGroupDecl],
    configuration: &str,
    platform: &str,
) -> PropertyMap {
    let guard = Guard::new(configuration, platform);
    groups
        .iter()
        .filter(|g| guard.matches(g.condition.as_deref()))
        .flat_map(|g| &g.properties)
        .filter(|p| p.condition.as_deref().is_none_or(str::is_empty))
        .fold(seed, |mut props, p| {
            props.insert(p.name.as_str(), p.value.as_str());
            props
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ProjectParser
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses project files for one configuration/platform pair.
///
/// # Example
/// ```no_run
/// use msproj_rs::project::ProjectParser;
///
/// let parser = ProjectParser::new("Debug", "AnyCPU");
/// let model = parser.parse("App/App.csproj", "App/App.csproj").unwrap();
/// if let Some(model) = model {
///     println!("{}", model.output_path.as_str());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProjectParser {
    configuration: String,
    platform: String,
    properties: Vec<(String, String)>,
}

impl ProjectParser {
    pub fn new(configuration: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            platform: platform.into(),
            properties: Vec::new(),
        }
    }

    /// Seed a global property. `Configuration` and `Platform` always win over
    /// seeded values of the same name.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Seed several global properties, in order.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// The map a parse starts from: global properties, then the requested
    /// configuration and platform.
    fn seed(&self) -> PropertyMap {
        let mut seed: PropertyMap = self.properties.iter().cloned().collect();
        seed.insert("Platform", self.platform.as_str());
        seed.insert("Configuration", self.configuration.as_str());
        seed
    }

    /// Parse `parse_source` (possibly a preprocessed copy) on behalf of
    /// `original_project`, against whose directory item paths are resolved.
    ///
    /// Returns `Ok(None)` when no `OutputPath` applies to this
    /// configuration/platform.
    pub fn parse(
        &self,
        parse_source: impl AsRef<Path>,
        original_project: impl AsRef<Path>,
    ) -> Result<Option<ProjectFileModel>> {
        let parse_source = parse_source.as_ref();
        let original_project = original_project.as_ref();

        if !parse_source.is_file() {
            return Err(ResolveError::ProjectNotFound(parse_source.to_path_buf()));
        }

        debug!(
            project = %parse_source.display(),
            "parsing for $(Configuration)|$(Platform) == {}|{}",
            self.configuration,
            self.platform,
        );

        let groups = collect_property_groups(parse_source)?;
        let props = fold_properties(self.seed(), &groups, &self.configuration, &self.platform);

        let source = read_source(parse_source)?;
        let doc = parse_document(parse_source, &source)?;
        let root_dir = original_project.parent().unwrap_or(Path::new(""));
        let items = Items::parse(doc.root_element(), root_dir);

        ProjectFileModel::from_properties(&props, items)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Items
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct Items {
    files: Vec<ProjectFile>,
    references: Vec<AssemblyReference>,
    project_references: Vec<ProjectReference>,
}

impl Items {
    fn parse(root: roxmltree::Node, root_dir: &Path) -> Self {
        let mut items = Self::default();

        let elements = root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "ItemGroup")
            .flat_map(|ig| ig.children().filter(|n| n.is_element()));

        for element in elements {
            let tag = element.tag_name().name();
            let include = element.attribute("Include").unwrap_or("");
            match tag {
                "Compile" | "Content" if !include.is_empty() => {
                    items.files.push(ProjectFile {
                        path: combine(root_dir, include),
                        relative_path: include.to_string(),
                        compile: tag == "Compile",
                    });
                }
                "Reference" if element.attribute("Include").is_some() => {
                    items.references.push(AssemblyReference {
                        include: include.to_string(),
                        hint_path: find_child_text(&element, "HintPath")
                            .filter(|h| !h.is_empty())
                            .map(|h| combine(root_dir, &h)),
                        name: find_child_text(&element, "Name"),
                        fusion_name: find_child_text(&element, "FusionName"),
                        specific_version: find_child_bool(&element, "SpecificVersion"),
                        aliases: find_child_text(&element, "Aliases"),
                        private: find_child_bool(&element, "Private"),
                    });
                }
                "ProjectReference" if !include.is_empty() => {
                    items.project_references.push(ProjectReference {
                        path: combine(root_dir, include),
                        relative_path: include.to_string(),
                        name: find_child_text(&element, "Name"),
                        project: find_child_text(&element, "Project"),
                        package: find_child_text(&element, "Package")
                            .filter(|p| !p.is_empty())
                            .map(|p| combine(root_dir, &p)),
                    });
                }
                _ => {}
            }
        }

        items
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))
}

fn parse_document<'a>(path: &Path, source: &'a str) -> Result<roxmltree::Document<'a>> {
    roxmltree::Document::parse(source.trim_start_matches('\u{feff}'))
        .map_err(|e| ResolveError::xml(path, e))
}

/// Concatenated text content of an element and its descendants.
fn element_text(node: &roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Return the text content of the first child element with the given tag name.
fn find_child_text(parent: &roxmltree::Node, tag: &str) -> Option<String> {
    parent
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
        .map(|c| element_text(&c))
}

fn find_child_bool(parent: &roxmltree::Node, tag: &str) -> Option<bool> {
    let text = find_child_text(parent, tag)?;
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        debug!(element = tag, value = text, "ignoring non-boolean value");
        None
    }
}

pub(crate) fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a project-relative path (which may use `\`) to a directory.
pub(crate) fn combine(dir: &Path, relative: &str) -> PathBuf {
    dir.join(normalize_separators(relative))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
