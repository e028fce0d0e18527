//! Bulk clip replacement across a graph.
//!
//! A [`ReplacementPlan`] maps clip names found in a graph to replacement
//! names or paths. Applying it re-resolves each replacement and swaps the clip
//! reference on animation states and blend tree motions; state and motion
//! names are left as they are.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::{Graph, StateBody};
use crate::resolver::{is_path_like, AnimationResolver, ClipRef};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementOptions {
    /// Only plan clips whose name contains this (case-insensitive).
    pub source_filter: String,
    /// Only auto-match candidates whose name contains this (case-insensitive).
    pub destination_filter: String,
    /// Map each clip to the first candidate containing its name.
    pub auto_match: bool,
    /// Leave clips mapped to themselves untouched.
    pub safety_check: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapReport {
    pub replaced: usize,
    /// Replacements that could not be resolved.
    pub missing: Vec<String>,
}

/// Ordered clip name -> replacement mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementPlan {
    entries: Vec<(String, String)>,
    safety_check: bool,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl ReplacementPlan {
    pub fn new(safety_check: bool) -> Self {
        Self {
            entries: Vec::new(),
            safety_check,
        }
    }

    /// Plan every clip of `graph` that passes the source filter. Without
    /// auto-match, or when no candidate matches, a clip maps to itself.
    pub fn build(graph: &Graph, candidates: &[String], options: &ReplacementOptions) -> Self {
        let mut plan = Self::new(options.safety_check);
        for name in graph.clip_names() {
            if !contains_ignore_case(&name, &options.source_filter) {
                continue;
            }
            let replacement = if options.auto_match {
                candidates
                    .iter()
                    .filter(|c| contains_ignore_case(c, &options.destination_filter))
                    .find(|c| contains_ignore_case(c, &name))
                    .cloned()
                    .unwrap_or_else(|| name.clone())
            } else {
                name.clone()
            };
            plan.entries.push((name, replacement));
        }
        plan
    }

    pub fn set(&mut self, original: &str, replacement: &str) {
        match self.entries.iter_mut().find(|(o, _)| o == original) {
            Some(entry) => entry.1 = replacement.to_string(),
            None => self
                .entries
                .push((original.to_string(), replacement.to_string())),
        }
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(o, _)| o == original)
            .map(|(_, r)| r.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swap clips in place. Each distinct animation state name and each
    /// motion of each arena tree counts once towards `replaced`.
    pub fn apply(
        &self,
        graph: &mut Graph,
        resolver: &mut dyn AnimationResolver,
        config: &Config,
    ) -> RemapReport {
        let mut report = RemapReport::default();
        if self.entries.is_empty() {
            log::warn!("no clip replacements planned");
            return report;
        }

        let mut resolved: HashMap<String, Option<ClipRef>> = HashMap::new();
        let mut lookup = |original: &str, report: &mut RemapReport| -> Option<ClipRef> {
            let replacement = self.get(original)?;
            if self.safety_check && replacement == original {
                return None;
            }
            if let Some(hit) = resolved.get(replacement) {
                return hit.clone();
            }
            let hit = resolver.find(
                &replacement_location(replacement, &config.search_scope),
                &config.search_scope,
            );
            if hit.is_none() {
                log::warn!("replacement clip '{replacement}' for '{original}' not found");
                report.missing.push(replacement.to_string());
            }
            resolved.insert(replacement.to_string(), hit.clone());
            hit
        };

        let mut counted = hashbrown::HashSet::new();
        for transition in &mut graph.transitions {
            for state in [&mut transition.from, &mut transition.to] {
                let StateBody::Animation { clip } = &mut state.body else {
                    continue;
                };
                let original = clip
                    .as_ref()
                    .map_or_else(|| state.name.clone(), |c| c.name.clone());
                if let Some(new_clip) = lookup(&original, &mut report) {
                    *clip = Some(new_clip);
                    if counted.insert(state.name.clone()) {
                        report.replaced += 1;
                    }
                }
            }
        }

        for tree in &mut graph.blend_trees {
            for motion in &mut tree.motions {
                if let Some(new_clip) = lookup(&motion.animation_name, &mut report) {
                    motion.clip = Some(new_clip);
                    report.replaced += 1;
                }
            }
        }

        if report.replaced == 0 {
            log::warn!("no clips were replaced; check the replacement names");
        } else {
            log::info!("replaced {} clip(s)", report.replaced);
        }
        report
    }
}

/// Name passed to the resolver for a replacement. Bare names go through
/// unchanged; paths are joined to `scope` unless already under it, use `/`
/// separators and end in `.anim`.
pub fn replacement_location(replacement: &str, scope: &str) -> String {
    if !is_path_like(replacement) {
        return replacement.to_string();
    }
    let mut path = replacement.replace('\\', "/");
    if !path.starts_with(scope) {
        path = if scope.is_empty() || scope.ends_with('/') {
            format!("{scope}{path}")
        } else {
            format!("{scope}/{path}")
        };
    }
    if !path.ends_with(".anim") {
        path.push_str(".anim");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_pass_through() {
        assert_eq!(replacement_location("Run", "Assets/"), "Run");
    }

    #[test]
    fn paths_are_joined_and_completed() {
        assert_eq!(
            replacement_location("Anim\\Run", "Assets/"),
            "Assets/Anim/Run.anim"
        );
        assert_eq!(
            replacement_location("Assets/Anim/Run.anim", "Assets/"),
            "Assets/Anim/Run.anim"
        );
        assert_eq!(replacement_location("Anim/Run", "Clips"), "Clips/Anim/Run.anim");
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let mut plan = ReplacementPlan::new(false);
        plan.set("Walk", "Walk_v2");
        plan.set("Walk", "Walk_v3");
        assert_eq!(plan.entries().len(), 1);
        assert_eq!(plan.get("Walk"), Some("Walk_v3"));
        assert_eq!(plan.get("Run"), None);
    }
}
