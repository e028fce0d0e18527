//! Serde schema of the transition document (keys already lowercased).
//!
//! ```text
//! { "version": 1,
//!   "transitions": [
//!     { "startstate": State, "endstate": State, "conditions": [Condition] } ] }
//! State     = { "type", "animationname", "blendtree": BlendTree | null }
//! BlendTree = { "parametername", "parameternames", "blendtype", "motions": [Motion] }
//! Motion    = { "animationname", "threshold", "threshold2d": [x, y] | null }
//! Condition = { "name", "type", "boolvalue", "numbervalue", "comparison" }
//! ```
//!
//! Every field is optional on the way in; enumerants stay strings here so the
//! codec can apply its fallbacks and the validator can see what was written.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::model::{Comparison, ConditionKind, Dimensionality, StateKind};
use crate::normalize::normalize_token;

/// Version written by the encoder. Documents without a version are read as 1.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<u32>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub transitions: Option<Vec<RawTransition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransition {
    #[serde(default, deserialize_with = "lenient")]
    pub startstate: Option<RawState>,
    #[serde(default, deserialize_with = "lenient")]
    pub endstate: Option<RawState>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub conditions: Option<Vec<RawCondition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub animationname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub blendtree: Option<RawBlendTree>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlendTree {
    #[serde(default, deserialize_with = "lenient")]
    pub parametername: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub parameternames: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub blendtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub motions: Option<Vec<RawMotion>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMotion {
    #[serde(default, deserialize_with = "lenient")]
    pub animationname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub threshold: Option<f32>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub threshold2d: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCondition {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub boolvalue: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub numbervalue: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub comparison: Option<String>,
}

/// A value of the wrong JSON type reads as absent; the validator reports it.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A non-array reads as absent; wrong-typed elements read as `T::default()`
/// so list arity is kept.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Map a key-normalized JSON tree onto the raw schema. Any object yields a
/// document; any other root yields `None`.
pub fn raw_document(root: JsonValue) -> Option<RawDocument> {
    if !root.is_object() {
        return None;
    }
    serde_json::from_value(root).ok()
}

// ----- enumerant mapping (case-insensitive, first enumerant on mismatch) -----

pub fn parse_state_kind(token: &str) -> StateKind {
    match normalize_token(token).as_str() {
        "blendtree" => StateKind::BlendTree,
        _ => StateKind::Animation,
    }
}

pub fn parse_dimensionality(token: &str) -> Dimensionality {
    match normalize_token(token).as_str() {
        "twod" => Dimensionality::TwoD,
        _ => Dimensionality::OneD,
    }
}

pub fn parse_condition_kind(token: &str) -> ConditionKind {
    match normalize_token(token).as_str() {
        "float" => ConditionKind::Float,
        "int" => ConditionKind::Int,
        "trigger" => ConditionKind::Trigger,
        _ => ConditionKind::Bool,
    }
}

pub fn parse_comparison(token: &str) -> Comparison {
    match normalize_token(token).as_str() {
        "greater" => Comparison::Greater,
        "less" => Comparison::Less,
        "notequals" => Comparison::NotEquals,
        _ => Comparison::Equals,
    }
}

pub fn state_kind_token(kind: StateKind) -> &'static str {
    match kind {
        StateKind::Animation => "animation",
        StateKind::BlendTree => "blendtree",
    }
}

pub fn dimensionality_token(dim: Dimensionality) -> &'static str {
    match dim {
        Dimensionality::OneD => "oned",
        Dimensionality::TwoD => "twod",
    }
}

pub fn condition_kind_token(kind: ConditionKind) -> &'static str {
    match kind {
        ConditionKind::Bool => "bool",
        ConditionKind::Float => "float",
        ConditionKind::Int => "int",
        ConditionKind::Trigger => "trigger",
    }
}

pub fn comparison_token(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Equals => "equals",
        Comparison::Greater => "greater",
        Comparison::Less => "less",
        Comparison::NotEquals => "notequals",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_fall_back_to_first_enumerant() {
        assert_eq!(parse_state_kind("sprite"), StateKind::Animation);
        assert_eq!(parse_dimensionality("threed"), Dimensionality::OneD);
        assert_eq!(parse_condition_kind("string"), ConditionKind::Bool);
        assert_eq!(parse_comparison(">="), Comparison::Equals);
    }

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(parse_state_kind(" BlendTree"), StateKind::BlendTree);
        assert_eq!(parse_dimensionality("TwoD"), Dimensionality::TwoD);
        assert_eq!(parse_condition_kind("TRIGGER"), ConditionKind::Trigger);
        assert_eq!(parse_comparison("NotEquals"), Comparison::NotEquals);
    }

    #[test]
    fn tokens_round_trip() {
        for c in [
            Comparison::Equals,
            Comparison::Greater,
            Comparison::Less,
            Comparison::NotEquals,
        ] {
            assert_eq!(parse_comparison(comparison_token(c)), c);
        }
        for k in [
            ConditionKind::Bool,
            ConditionKind::Float,
            ConditionKind::Int,
            ConditionKind::Trigger,
        ] {
            assert_eq!(parse_condition_kind(condition_kind_token(k)), k);
        }
    }

    #[test]
    fn wrong_typed_fields_read_as_absent() {
        let raw: RawDocument = serde_json::from_str(
            r#"{"version":"1","transitions":[
                {"startstate":{"type":5,"animationname":["Idle"]},
                 "endstate":"Run",
                 "conditions":[{"name":7,"type":"bool","boolvalue":"yes","numbervalue":"x"}, 3]}]}"#,
        )
        .unwrap();
        assert_eq!(raw.version, None);
        let t = &raw.transitions.unwrap()[0];
        let start = t.startstate.as_ref().unwrap();
        assert_eq!((start.kind.as_deref(), start.animationname.as_deref()), (None, None));
        assert!(t.endstate.is_none());
        let conditions = t.conditions.as_ref().unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].kind.as_deref(), Some("bool"));
        assert_eq!(conditions[0].boolvalue, None);
        assert_eq!(conditions[1], RawCondition::default());
    }

    #[test]
    fn threshold_elements_keep_arity() {
        let raw: RawMotion = serde_json::from_str(
            r#"{"animationname":"Fwd","threshold":"far","threshold2d":[1,"y"]}"#,
        )
        .unwrap();
        assert_eq!(raw.threshold, None);
        assert_eq!(raw.threshold2d, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn only_objects_make_documents() {
        assert!(raw_document(serde_json::json!([1, 2])).is_none());
        assert!(raw_document(serde_json::json!({"transitions": 4}))
            .is_some_and(|d| d.transitions.is_none()));
    }

    #[test]
    fn null_fields_deserialize() {
        let raw: RawDocument = serde_json::from_str(
            r#"{"transitions":[{"startstate":null,"endstate":{"type":"blendtree","blendtree":null},"conditions":null}]}"#,
        )
        .unwrap();
        let transitions = raw.transitions.unwrap();
        assert!(transitions[0].startstate.is_none());
        assert!(transitions[0].conditions.is_none());
        assert_eq!(
            transitions[0].endstate.as_ref().and_then(|s| s.kind.as_deref()),
            Some("blendtree")
        );
    }
}
