//! Build platforms and the several spellings MSBuild uses for them.
//!
//! The same platform is written differently depending on where it appears:
//!
//! | Platform | project file | solution manifest | `-property:Platform=` | display |
//! |----------|--------------|-------------------|-----------------------|---------|
//! | AnyCpu   | `AnyCPU`     | `Any CPU`         | `AnyCPU`              | `MSIL`  |
//! | X86      | `x86`        | `x86`             | `x86`                 | `x86`   |
//! | X64      | `x64`        | `x64`             | `x64`                 | `x64`   |
//! | Arm      | `ARM`        | `ARM`             | `arm`                 | `ARM`   |
//! | Win32    | `Win32`      | `Win32`           | `Win32`               | `Win32` |

use std::fmt;
use std::str::FromStr;

use crate::error::{ResolveError, Result};

/// A target platform a project set can be resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Platform-neutral IL (`AnyCPU`).
    AnyCpu,
    X86,
    X64,
    Arm,
    Win32,
}

impl Platform {
    /// Platforms attempted when the request does not name any.
    pub const DEFAULTS: [Self; 4] = [Self::AnyCpu, Self::X86, Self::X64, Self::Arm];

    /// Name used in project-file conditions, e.g. `'$(Platform)' == 'AnyCPU'`.
    pub const fn project_name(self) -> &'static str {
        match self {
            Self::AnyCpu => "AnyCPU",
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "ARM",
            Self::Win32 => "Win32",
        }
    }

    /// Name used in a solution's `ProjectConfigurationPlatforms` section.
    pub const fn solution_name(self) -> &'static str {
        match self {
            Self::AnyCpu => "Any CPU",
            other => other.project_name(),
        }
    }

    /// Value passed as `-property:Platform=` when building a single project.
    pub const fn msbuild_property(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            other => other.project_name(),
        }
    }

    /// Map a project's declared `PlatformTarget` onto a platform.
    ///
    /// A blank value means `AnyCPU`. Only `x86`, `x64`, `ARM` and `AnyCPU` are
    /// accepted (case-insensitive); anything else is a hard error.
    pub fn from_platform_target(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("AnyCPU") {
            return Ok(Self::AnyCpu);
        }
        [Self::X86, Self::X64, Self::Arm]
            .into_iter()
            .find(|p| text.eq_ignore_ascii_case(p.project_name()))
            .ok_or_else(|| ResolveError::UnsupportedPlatform(text.to_string()))
    }

    /// Parse a `;`-separated platform list such as `"x86;x64"`.
    ///
    /// Empty segments are ignored, so `""` yields an empty list.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Normalize a raw `$(Platform)` value: `Any CPU` becomes `AnyCPU`.
    pub(crate) fn normalize_name(raw: &str) -> String {
        if raw.eq_ignore_ascii_case("Any CPU") {
            "AnyCPU".to_string()
        } else {
            raw.to_string()
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AnyCpu => "MSIL",
            other => other.project_name(),
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let candidates = [
            ("MSIL", Self::AnyCpu),
            ("AnyCPU", Self::AnyCpu),
            ("Any CPU", Self::AnyCpu),
            ("x86", Self::X86),
            ("x64", Self::X64),
            ("ARM", Self::Arm),
            ("Win32", Self::Win32),
        ];
        candidates
            .into_iter()
            .find(|(name, _)| s.eq_ignore_ascii_case(name))
            .map(|(_, platform)| platform)
            .ok_or_else(|| ResolveError::InvalidPlatform(s.to_string()))
    }
}
