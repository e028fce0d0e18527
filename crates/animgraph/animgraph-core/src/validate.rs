//! Structural validation of transition documents.
//!
//! The validator walks the key-normalized JSON tree directly instead of the
//! decoded [`crate::model::Graph`], because decode substitutes defaults for
//! exactly the values it needs to report. Every rule is checked independently
//! and each violation adds one diagnostic.

use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::normalize::{normalize_key_value, normalize_token};
use crate::schema::SCHEMA_VERSION;

/// Outcome of a validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<String>,
}

impl ValidationReport {
    /// True iff no diagnostics were produced.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, message: String) {
        self.diagnostics.push(message);
    }
}

/// Validate with the default configuration.
pub fn validate_json(text: &str) -> ValidationReport {
    validate(text, &Config::default())
}

/// Validate a transition document given as text.
pub fn validate(text: &str, config: &Config) -> ValidationReport {
    let mut report = ValidationReport::default();
    match serde_json::from_str::<JsonValue>(text) {
        Ok(root) => validate_value(&normalize_key_value(root), config, &mut report),
        Err(err) => report.push(format!("JSON parsing error: {err}")),
    }
    report
}

fn validate_value(root: &JsonValue, config: &Config, report: &mut ValidationReport) {
    let Some(doc) = root.as_object() else {
        report.push("Invalid JSON structure. Could not parse.".to_string());
        return;
    };

    match doc.get("version") {
        None | Some(JsonValue::Null) => {}
        Some(value) => match value.as_u64() {
            Some(version) if version > u64::from(SCHEMA_VERSION) => report.push(format!(
                "Document version {version} is not supported (latest is {SCHEMA_VERSION})."
            )),
            Some(_) => {}
            None => report.push(format!(
                "Document version must be a non-negative integer, got {value}."
            )),
        },
    }

    let transitions = match doc.get("transitions") {
        None | Some(JsonValue::Null) => return,
        Some(JsonValue::Array(items)) => items,
        Some(_) => {
            report.push("'transitions' must be a list.".to_string());
            return;
        }
    };

    for (index, transition) in transitions.iter().enumerate() {
        let mut ctx = Context {
            prefix: format!("transition {index}"),
            config,
            report: &mut *report,
        };
        ctx.transition(transition);
    }
}

struct Context<'a> {
    prefix: String,
    config: &'a Config,
    report: &'a mut ValidationReport,
}

impl Context<'_> {
    fn error(&mut self, message: impl std::fmt::Display) {
        self.report.push(format!("{}: {message}", self.prefix));
    }

    fn transition(&mut self, transition: &JsonValue) {
        self.state(transition.get("startstate"), "StartState");
        self.state(transition.get("endstate"), "EndState");

        match transition.get("conditions") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(conditions)) => {
                for condition in conditions {
                    self.condition(condition);
                }
            }
            Some(_) => self.error("'conditions' must be a list."),
        }
    }

    fn state(&mut self, state: Option<&JsonValue>, label: &str) {
        let state = match state {
            Some(s) if s.is_object() => s,
            _ => {
                self.error(format_args!("{label} is missing."));
                return;
            }
        };

        // A missing type means "animation", matching decode.
        let kind = token(state.get("type")).unwrap_or_else(|| "animation".to_string());
        match kind.as_str() {
            "animation" => {
                if is_blank(state.get("animationname")) {
                    self.error(format_args!("{label} is 'Animation' but missing animationName."));
                }
            }
            "blendtree" => match state.get("blendtree") {
                Some(tree) if tree.is_object() => {
                    self.blend_tree(tree, &format!("{label} BlendTree"));
                }
                _ => self.error(format_args!(
                    "{label} is 'BlendTree' but blendTree data is missing."
                )),
            },
            other => self.error(format_args!(
                "{label} has invalid type: {other}. Must be 'Animation' or 'BlendTree'."
            )),
        }
    }

    fn blend_tree(&mut self, tree: &JsonValue, label: &str) {
        let blend_type = token(tree.get("blendtype")).unwrap_or_else(|| "oned".to_string());
        match blend_type.as_str() {
            "oned" => {
                if is_blank(tree.get("parametername")) {
                    self.error(format_args!("{label} is missing parameterName."));
                }
            }
            "twod" => {
                let has_names = tree
                    .get("parameternames")
                    .and_then(JsonValue::as_array)
                    .is_some_and(|names| !names.is_empty());
                if !has_names {
                    self.error(format_args!("{label} is 'TwoD' but parameterNames are missing."));
                } else if !all_strings(tree.get("parameternames")) {
                    self.error(format_args!("{label} parameterNames must all be strings."));
                }
            }
            other => self.error(format_args!(
                "{label} has invalid blendType: {other}. Must be 'OneD' or 'TwoD'."
            )),
        }

        let Some(motions) = tree.get("motions").and_then(JsonValue::as_array) else {
            return;
        };
        for motion in motions {
            if is_blank(motion.get("animationname")) {
                self.error(format_args!("{label} motion is missing animationName."));
            }
            if is_mistyped(motion.get("threshold"), JsonValue::is_number) {
                self.error(format_args!("{label} motion threshold must be a number."));
            }
            if blend_type == "twod" {
                let pair = motion
                    .get("threshold2d")
                    .and_then(JsonValue::as_array)
                    .is_some_and(|xy| xy.len() == 2 && xy.iter().all(JsonValue::is_number));
                if !pair {
                    self.error(format_args!(
                        "{label} motion is TwoD but has invalid threshold2D (must have exactly 2 values)."
                    ));
                }
            }
        }
    }

    fn condition(&mut self, condition: &JsonValue) {
        let name = condition
            .get("name")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        if name.trim().is_empty() {
            self.error("Condition is missing name.");
        }

        let kind = token(condition.get("type")).unwrap_or_else(|| "bool".to_string());
        if !matches!(kind.as_str(), "bool" | "float" | "int" | "trigger") {
            self.error(format_args!(
                "Condition '{name}' has invalid type: {kind}. Must be 'Bool', 'Float', 'Int', or 'Trigger'."
            ));
        }

        if is_mistyped(condition.get("boolvalue"), JsonValue::is_boolean) {
            self.error(format_args!("Condition '{name}' boolValue must be true or false."));
        }
        if is_mistyped(condition.get("numbervalue"), JsonValue::is_number) {
            self.error(format_args!("Condition '{name}' numberValue must be a number."));
        }

        let comparison = token(condition.get("comparison")).unwrap_or_else(|| "equals".to_string());
        let valid = match comparison.as_str() {
            "equals" | "greater" | "less" => true,
            "notequals" => self.config.accept_not_equals,
            _ => false,
        };
        if !valid {
            let allowed = if self.config.accept_not_equals {
                "'Equals', 'Greater', 'Less', or 'NotEquals'"
            } else {
                "'Equals', 'Greater', or 'Less'"
            };
            self.error(format_args!(
                "Condition '{name}' has invalid comparison: {comparison}. Must be {allowed}."
            ));
        }
    }
}

/// Normalized enumerant; a null or absent field is `None`, a non-string
/// value is rendered so it shows up in the diagnostic.
fn token(value: Option<&JsonValue>) -> Option<String> {
    match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(normalize_token(s)),
        Some(other) => Some(other.to_string()),
    }
}

fn is_blank(value: Option<&JsonValue>) -> bool {
    value
        .and_then(JsonValue::as_str)
        .map_or(true, |s| s.trim().is_empty())
}

/// Present, not null, and not of the expected JSON type.
fn is_mistyped(value: Option<&JsonValue>, expected: fn(&JsonValue) -> bool) -> bool {
    value.is_some_and(|v| !v.is_null() && !expected(v))
}

fn all_strings(value: Option<&JsonValue>) -> bool {
    value
        .and_then(JsonValue::as_array)
        .is_some_and(|items| items.iter().all(JsonValue::is_string))
}
