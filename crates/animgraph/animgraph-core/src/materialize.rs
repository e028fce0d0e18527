//! Instantiating a [`Graph`] inside a runtime animation graph.
//!
//! The runtime is reached only through [`GraphBuilder`]. Materialization is
//! fail-soft: a malformed state, motion or condition produces a
//! [`MaterializeWarning`] and is skipped, the rest of the pass continues.
//!
//! Not thread-safe against a shared target: two passes writing the same
//! builder must be serialized by the caller.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::model::{
    BlendTree, Comparison, Condition, ConditionKind, Dimensionality, Graph, State, StateBody, Vec2,
};
use crate::resolver::{AnimationResolver, ClipRef};

/// Type of a runtime parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Float,
    Int,
    Bool,
    Trigger,
}

impl From<ConditionKind> for ParameterKind {
    fn from(kind: ConditionKind) -> Self {
        match kind {
            ConditionKind::Bool => ParameterKind::Bool,
            ConditionKind::Float => ParameterKind::Float,
            ConditionKind::Int => ParameterKind::Int,
            ConditionKind::Trigger => ParameterKind::Trigger,
        }
    }
}

/// Test a runtime transition condition applies to its parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ConditionMode {
    If,
    IfNot,
    Greater,
    Less,
    Equals,
    NotEqual,
}

/// Blend parameters of a runtime blend structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlendLayout {
    Simple1D { parameter: String },
    Directional2D { x: String, y: String },
}

impl BlendLayout {
    pub fn parameters(&self) -> Vec<&str> {
        match self {
            BlendLayout::Simple1D { parameter } => vec![parameter.as_str()],
            BlendLayout::Directional2D { x, y } => vec![x.as_str(), y.as_str()],
        }
    }
}

/// Where a child motion sits inside a blend structure.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MotionPosition {
    Threshold(f32),
    Position(Vec2),
}

/// Capability the materializer needs from a runtime graph.
///
/// Handles are owned by the builder; the materializer only clones and passes
/// them back.
pub trait GraphBuilder {
    type StateId: Clone;
    type BlendId: Clone;
    type EdgeId: Clone;

    fn has_parameter(&self, name: &str) -> bool;
    fn add_parameter(&mut self, name: &str, kind: ParameterKind);

    fn create_state(&mut self, name: &str) -> Self::StateId;
    fn assign_clip(&mut self, state: &Self::StateId, clip: ClipRef);

    fn create_blend_tree(&mut self, name: &str, layout: &BlendLayout) -> Self::BlendId;
    fn add_motion(&mut self, blend: &Self::BlendId, clip: ClipRef, position: MotionPosition);
    fn assign_blend_tree(&mut self, state: &Self::StateId, blend: &Self::BlendId);

    /// Create a directed edge that fires on its conditions alone (no exit time).
    fn connect(&mut self, from: &Self::StateId, to: &Self::StateId) -> Self::EdgeId;
    fn add_condition(
        &mut self,
        edge: &Self::EdgeId,
        mode: ConditionMode,
        threshold: f32,
        parameter: &str,
    );
}

/// Per-item problem found while materializing. None of these abort a pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MaterializeWarning {
    #[error("transition {transition}: state without a name, transition skipped")]
    UnnamedState { transition: usize },
    #[error("clip '{clip}' for state '{state}' could not be resolved")]
    UnresolvedClip { state: String, clip: String },
    #[error("blend tree state '{state}' has no blend tree data")]
    MissingBlendTree { state: String },
    #[error("1D blend tree of state '{state}' has no blend parameter, blend tree skipped")]
    MissingBlendParameter { state: String },
    #[error("motion '{clip}' of state '{state}' could not be resolved, motion skipped")]
    UnresolvedMotion { state: String, clip: String },
    #[error("transition {transition}: condition without a parameter name skipped")]
    UnnamedCondition { transition: usize },
    #[error("float condition on '{parameter}' cannot compare with {comparison:?}, using Greater")]
    UnsupportedComparison {
        parameter: String,
        comparison: Comparison,
    },
}

/// Summary of one materialization pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterializeReport {
    pub states_created: usize,
    pub states_reused: usize,
    pub transitions_created: usize,
    pub motions_added: usize,
    pub conditions_added: usize,
    pub parameters_added: usize,
    pub warnings: Vec<MaterializeWarning>,
}

impl MaterializeReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runtime test for a condition and the threshold it compares against.
///
/// Bool conditions test truthiness (`If`/`IfNot`), triggers fire on `If`.
/// Float parameters only support Greater/Less; anything else maps to Greater.
pub fn condition_mode(condition: &Condition) -> (ConditionMode, f32) {
    match condition.kind {
        ConditionKind::Bool if condition.bool_value => (ConditionMode::If, 0.0),
        ConditionKind::Bool => (ConditionMode::IfNot, 0.0),
        ConditionKind::Trigger => (ConditionMode::If, 0.0),
        ConditionKind::Float => {
            let mode = match condition.comparison {
                Comparison::Less => ConditionMode::Less,
                _ => ConditionMode::Greater,
            };
            (mode, condition.number_value)
        }
        ConditionKind::Int => {
            let mode = match condition.comparison {
                Comparison::Equals => ConditionMode::Equals,
                Comparison::NotEquals => ConditionMode::NotEqual,
                Comparison::Greater => ConditionMode::Greater,
                Comparison::Less => ConditionMode::Less,
            };
            (mode, condition.number_value)
        }
    }
}

/// Materialize a whole graph in one pass.
pub fn materialize<B: GraphBuilder + ?Sized>(
    graph: &Graph,
    builder: &mut B,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
) -> MaterializeReport {
    let mut materializer = Materializer::new(builder, resolver, config);
    materializer.add_graph(graph);
    materializer.finish()
}

/// One materialization pass. States are cached by name for the lifetime of
/// the value, so several graphs added to the same pass share states.
pub struct Materializer<'a, B: GraphBuilder + ?Sized, R: AnimationResolver + ?Sized> {
    builder: &'a mut B,
    resolver: &'a mut R,
    config: &'a Config,
    states: HashMap<String, B::StateId>,
    report: MaterializeReport,
}

impl<'a, B: GraphBuilder + ?Sized, R: AnimationResolver + ?Sized> Materializer<'a, B, R> {
    pub fn new(builder: &'a mut B, resolver: &'a mut R, config: &'a Config) -> Self {
        Self {
            builder,
            resolver,
            config,
            states: HashMap::new(),
            report: MaterializeReport::default(),
        }
    }

    /// Runtime handle of a state created earlier in this pass.
    pub fn state_id(&self, name: &str) -> Option<&B::StateId> {
        self.states.get(name)
    }

    pub fn add_graph(&mut self, graph: &Graph) {
        for (index, transition) in graph.transitions.iter().enumerate() {
            let from = self.state(graph, &transition.from, index);
            let to = self.state(graph, &transition.to, index);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };

            let edge = self.builder.connect(&from, &to);
            self.report.transitions_created += 1;
            for condition in &transition.conditions {
                self.condition(&edge, condition, index);
            }
        }
    }

    pub fn finish(self) -> MaterializeReport {
        self.report
    }

    fn state(&mut self, graph: &Graph, state: &State, transition: usize) -> Option<B::StateId> {
        if state.name.is_empty() {
            self.warn(MaterializeWarning::UnnamedState { transition });
            return None;
        }
        if let Some(id) = self.states.get(&state.name) {
            self.report.states_reused += 1;
            return Some(id.clone());
        }

        let id = self.builder.create_state(&state.name);
        self.report.states_created += 1;
        match &state.body {
            StateBody::Animation { clip } => {
                let clip = clip
                    .clone()
                    .or_else(|| self.resolver.find(&state.name, &self.config.search_scope));
                match clip {
                    Some(clip) => self.builder.assign_clip(&id, clip),
                    None => self.warn(MaterializeWarning::UnresolvedClip {
                        state: state.name.clone(),
                        clip: state.name.clone(),
                    }),
                }
            }
            StateBody::BlendTree { .. } => match graph.state_tree(state) {
                Some(tree) => self.blend_tree(&id, &state.name, tree),
                None => self.warn(MaterializeWarning::MissingBlendTree {
                    state: state.name.clone(),
                }),
            },
        }

        self.states.insert(state.name.clone(), id.clone());
        Some(id)
    }

    fn blend_tree(&mut self, state_id: &B::StateId, state: &str, tree: &BlendTree) {
        let named = |i: usize| tree.parameter_names.get(i).filter(|p| !p.is_empty()).cloned();
        let layout = match tree.dimensionality {
            Dimensionality::OneD => match named(0) {
                Some(parameter) => BlendLayout::Simple1D { parameter },
                None => {
                    self.warn(MaterializeWarning::MissingBlendParameter {
                        state: state.to_string(),
                    });
                    return;
                }
            },
            Dimensionality::TwoD => BlendLayout::Directional2D {
                x: named(0).unwrap_or_else(|| self.config.default_x_parameter.clone()),
                y: named(1).unwrap_or_else(|| self.config.default_y_parameter.clone()),
            },
        };

        for parameter in layout.parameters() {
            self.ensure_parameter(parameter, ParameterKind::Float);
        }

        let name = format!("{state}{}", self.config.blend_tree_suffix);
        let blend = self.builder.create_blend_tree(&name, &layout);
        for motion in &tree.motions {
            let clip = motion.clip.clone().or_else(|| {
                if motion.animation_name.is_empty() {
                    None
                } else {
                    self.resolver
                        .find(&motion.animation_name, &self.config.search_scope)
                }
            });
            let Some(clip) = clip else {
                self.warn(MaterializeWarning::UnresolvedMotion {
                    state: state.to_string(),
                    clip: motion.animation_name.clone(),
                });
                continue;
            };
            let position = match tree.dimensionality {
                Dimensionality::OneD => MotionPosition::Threshold(motion.threshold),
                Dimensionality::TwoD => MotionPosition::Position(motion.threshold_2d),
            };
            self.builder.add_motion(&blend, clip, position);
            self.report.motions_added += 1;
        }
        self.builder.assign_blend_tree(state_id, &blend);
    }

    fn condition(&mut self, edge: &B::EdgeId, condition: &Condition, transition: usize) {
        if condition.parameter.is_empty() {
            self.warn(MaterializeWarning::UnnamedCondition { transition });
            return;
        }
        self.ensure_parameter(&condition.parameter, condition.kind.into());

        if condition.kind == ConditionKind::Float
            && matches!(condition.comparison, Comparison::Equals | Comparison::NotEquals)
        {
            self.warn(MaterializeWarning::UnsupportedComparison {
                parameter: condition.parameter.clone(),
                comparison: condition.comparison,
            });
        }

        let (mode, threshold) = condition_mode(condition);
        self.builder.add_condition(edge, mode, threshold, &condition.parameter);
        self.report.conditions_added += 1;
    }

    fn ensure_parameter(&mut self, name: &str, kind: ParameterKind) {
        if !self.builder.has_parameter(name) {
            self.builder.add_parameter(name, kind);
            self.report.parameters_added += 1;
        }
    }

    fn warn(&mut self, warning: MaterializeWarning) {
        log::warn!("{warning}");
        self.report.warnings.push(warning);
    }
}
