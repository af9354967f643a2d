//! Accumulated MSBuild properties and `$(Key)` expansion.

use std::collections::HashMap;

/// Maximum nesting of `$(Key)` references followed while expanding a value.
///
/// A chain of forward references up to this length resolves; deeper
/// references are left verbatim.
pub const MAX_EXPANSION_DEPTH: usize = 16;

/// Once an expanded value reaches this many bytes, remaining references are
/// copied through unexpanded.
pub const MAX_EXPANDED_LEN: usize = 64 * 1024;

/// Insertion-ordered property map with last-write-wins semantics.
///
/// Overwriting an existing key keeps its original position, matching how a
/// dictionary keyed by property name behaves while a project file is walked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a raw (unexpanded) value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// The raw value recorded for `key`, without expansion.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate raw entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The value of `key` with `$(Other)` references expanded.
    ///
    /// References are followed recursively up to [`MAX_EXPANSION_DEPTH`]
    /// levels. A reference to a key that is not in the map, or to a key that
    /// is already being expanded (including `key` itself), is left in place
    /// verbatim.
    pub fn get(&self, key: &str) -> Option<String> {
        let (key, raw) = self.entry(key)?;
        Some(expand_msbuild_vars(raw, self, &mut vec![key]))
    }

    /// Like [`get`](Self::get), but treats an empty value as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Expand `$(Key)` references in an arbitrary string.
    pub fn expand(&self, value: &str) -> String {
        expand_msbuild_vars(value, self, &mut Vec::new())
    }

    fn entry(&self, key: &str) -> Option<(&str, &str)> {
        self.index.get(key).map(|&i| {
            let (k, v) = &self.entries[i];
            (k.as_str(), v.as_str())
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Replace each `$(Var)` reference with the expanded value of `Var`.
///
/// `stack` holds the keys currently being expanded. Unknown variables,
/// variables already on the stack, references past the depth or length
/// limits, and an unterminated `$(` are copied through unchanged.
fn expand_msbuild_vars<'a>(s: &str, vars: &'a PropertyMap, stack: &mut Vec<&'a str>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("$(") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find(')') else {
            result.push_str(&rest[start..]);
            return result;
        };
        let token = &rest[start..start + 2 + end + 1];
        match vars.entry(&after[..end]) {
            Some((key, value))
                if !stack.contains(&key)
                    && stack.len() < MAX_EXPANSION_DEPTH
                    && result.len() < MAX_EXPANDED_LEN =>
            {
                stack.push(key);
                let expanded = expand_msbuild_vars(value, vars, stack);
                stack.pop();
                result.push_str(&expanded);
            }
            _ => result.push_str(token),
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
