//! Core configuration for animgraph-core.

use serde::{Deserialize, Serialize};

/// How the per-decode BlendTree cache is keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// Each state is keyed by its own name: two states with the same name
    /// share one BlendTree, whichever side of a transition they sit on.
    #[default]
    PerState,
    /// Both sides of a transition are keyed by the end state's name. A start
    /// state can therefore pick up the tree cached for an unrelated end
    /// state. Kept for documents authored against that behaviour.
    EndStateLegacy,
}

/// Options shared by decode, validation, materialization and the pipelines.
/// Every field has a default so partial JSON configs deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scope handed to the animation resolver on every lookup.
    pub search_scope: String,
    pub dedup_key: DedupKey,

    /// Parameter names substituted for 2D blend trees that do not name theirs.
    pub default_x_parameter: String,
    pub default_y_parameter: String,

    /// Runtime blend structures are named `<state><blend_tree_suffix>`.
    pub blend_tree_suffix: String,

    /// Treat `notequals` as a valid condition comparison during validation.
    pub accept_not_equals: bool,

    /// Pipelines refuse documents that produce validator diagnostics.
    pub require_valid: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_scope: "Assets/".to_string(),
            dedup_key: DedupKey::default(),
            default_x_parameter: "Default_X".to_string(),
            default_y_parameter: "Default_Y".to_string(),
            blend_tree_suffix: "_BlendTree".to_string(),
            accept_not_equals: false,
            require_valid: true,
        }
    }
}

impl Config {
    pub fn with_dedup_key(mut self, key: DedupKey) -> Self {
        self.dedup_key = key;
        self
    }

    pub fn with_search_scope(mut self, scope: impl Into<String>) -> Self {
        self.search_scope = scope.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "dedup_key": "end_state_legacy", "require_valid": false }"#)
                .unwrap();
        assert_eq!(cfg.dedup_key, DedupKey::EndStateLegacy);
        assert!(!cfg.require_valid);
        assert_eq!(cfg.search_scope, "Assets/");
        assert_eq!(cfg.default_x_parameter, "Default_X");
    }
}
