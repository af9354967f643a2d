//! `<PropertyGroup Condition="…">` guard matching.
//!
//! Conditions are **not** evaluated as boolean expressions. A guard matches
//! when its text contains one of three literal clauses for the requested
//! configuration `C` and platform `P`:
//!
//! ```text
//! '$(Configuration)|$(Platform)' == 'C|P'
//! '$(Configuration)' == 'C'
//! '$(Platform)' == 'P'
//! ```
//!
//! Matching is case-sensitive substring containment, so a condition such as
//! `" '$(Configuration)|$(Platform)' == 'Debug|AnyCPU' "` matches for
//! `(Debug, AnyCPU)` regardless of surrounding whitespace, while
//! `'$(Configuration)'=='Debug'` (no spaces) or any `Exists(…)` form never
//! matches.

/// The three literal clauses a guard may contain for one
/// configuration/platform pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    combined: String,
    configuration: String,
    platform: String,
}

impl Guard {
    pub fn new(configuration: &str, platform: &str) -> Self {
        Self {
            combined: format!(
                "'$(Configuration)|$(Platform)' == '{configuration}|{platform}'"
            ),
            configuration: format!("'$(Configuration)' == '{configuration}'"),
            platform: format!("'$(Platform)' == '{platform}'"),
        }
    }

    /// Whether a group carrying `condition` applies.
    ///
    /// A missing or empty condition always applies.
    pub fn matches(&self, condition: Option<&str>) -> bool {
        match condition {
            None => true,
            Some(c) if c.is_empty() => true,
            Some(c) => {
                c.contains(&self.combined)
                    || c.contains(&self.configuration)
                    || c.contains(&self.platform)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
