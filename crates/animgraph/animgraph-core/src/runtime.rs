//! In-memory runtime animation graph and transition extraction.
//!
//! [`MemoryAnimator`] is the reference [`GraphBuilder`]: it records what the
//! materializer asks for and can be read back into a [`Graph`] through
//! [`TransitionSource`]. Hosts with a real runtime implement both traits on
//! their own controller type.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::materialize::{BlendLayout, ConditionMode, GraphBuilder, MotionPosition, ParameterKind};
use crate::model::{
    BlendTree, BlendTreeId, Comparison, Condition, ConditionKind, Graph, Motion, State, StateBody,
    Transition, Vec2,
};
use crate::resolver::ClipRef;

/// Read the transitions present in a runtime graph.
pub trait TransitionSource {
    /// Transitions grouped by source state, in state order. Runtime blend
    /// structures shared by several states come back as one shared tree.
    fn extract_transitions(&self) -> Graph;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RuntimeMotion {
    Clip(ClipRef),
    /// Index into [`MemoryAnimator::blend_trees`].
    BlendTree(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub name: String,
    pub motion: Option<RuntimeMotion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeChild {
    pub clip: ClipRef,
    pub position: MotionPosition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeBlendTree {
    pub name: String,
    pub layout: BlendLayout,
    pub children: Vec<RuntimeChild>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeCondition {
    pub mode: ConditionMode,
    pub threshold: f32,
    pub parameter: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEdge {
    pub from: usize,
    pub to: usize,
    pub has_exit_time: bool,
    pub conditions: Vec<RuntimeCondition>,
}

/// Flat runtime graph; handles are indices into the vectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryAnimator {
    pub parameters: Vec<Parameter>,
    pub states: Vec<RuntimeState>,
    pub blend_trees: Vec<RuntimeBlendTree>,
    pub edges: Vec<RuntimeEdge>,
}

impl MemoryAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn state_named(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    pub fn outgoing(&self, state: usize) -> impl Iterator<Item = &RuntimeEdge> {
        self.edges.iter().filter(move |e| e.from == state)
    }

    fn extract_state(
        &self,
        index: usize,
        graph: &mut Graph,
        trees: &mut HashMap<usize, BlendTreeId>,
    ) -> State {
        let Some(state) = self.states.get(index) else {
            return State::animation("");
        };
        match &state.motion {
            Some(RuntimeMotion::BlendTree(blend)) => {
                let id = match trees.get(blend) {
                    Some(id) => *id,
                    None => {
                        let id = graph.add_blend_tree(self.extract_blend_tree(*blend));
                        trees.insert(*blend, id);
                        id
                    }
                };
                State::blend_tree(state.name.clone(), Some(id))
            }
            // Clip states are named after the clip they play.
            Some(RuntimeMotion::Clip(clip)) => State {
                name: clip.name.clone(),
                body: StateBody::Animation {
                    clip: Some(clip.clone()),
                },
            },
            None => State::animation(state.name.clone()),
        }
    }

    fn extract_blend_tree(&self, index: usize) -> BlendTree {
        let Some(blend) = self.blend_trees.get(index) else {
            return BlendTree::one_d("");
        };
        let mut tree = match &blend.layout {
            BlendLayout::Simple1D { parameter } => BlendTree::one_d(parameter.clone()),
            BlendLayout::Directional2D { x, y } => BlendTree::two_d(x.clone(), y.clone()),
        };
        for child in &blend.children {
            let (threshold, threshold_2d) = match child.position {
                MotionPosition::Threshold(t) => (t, Vec2::ZERO),
                MotionPosition::Position(p) => (0.0, p),
            };
            tree.motions.push(Motion {
                animation_name: child.clip.name.clone(),
                clip: Some(child.clip.clone()),
                threshold,
                threshold_2d,
            });
        }
        tree
    }
}

/// Recover a model condition from a runtime test.
///
/// The mode alone decides the kind (`If`/`IfNot` is Bool, `Greater`/`Less`
/// is Float, `Equals`/`NotEqual` is Int). A registered parameter kind refines
/// that: Trigger parameters always come back as triggers, and numeric modes
/// take the parameter's numeric kind.
pub fn condition_from_runtime(
    mode: ConditionMode,
    threshold: f32,
    parameter: &str,
    registered: Option<ParameterKind>,
) -> Condition {
    let mut condition = match mode {
        ConditionMode::If => Condition::boolean(parameter, true),
        ConditionMode::IfNot => Condition::boolean(parameter, false),
        ConditionMode::Greater => {
            Condition::number(parameter, ConditionKind::Float, Comparison::Greater, threshold)
        }
        ConditionMode::Less => {
            Condition::number(parameter, ConditionKind::Float, Comparison::Less, threshold)
        }
        ConditionMode::Equals => {
            Condition::number(parameter, ConditionKind::Int, Comparison::Equals, threshold)
        }
        ConditionMode::NotEqual => {
            Condition::number(parameter, ConditionKind::Int, Comparison::NotEquals, threshold)
        }
    };

    let numeric = matches!(condition.kind, ConditionKind::Float | ConditionKind::Int);
    match registered {
        Some(ParameterKind::Trigger) => {
            condition.kind = ConditionKind::Trigger;
            condition.number_value = 0.0;
        }
        Some(ParameterKind::Int) if numeric => condition.kind = ConditionKind::Int,
        Some(ParameterKind::Float) if numeric => condition.kind = ConditionKind::Float,
        _ => {}
    }
    condition.normalized()
}

impl TransitionSource for MemoryAnimator {
    fn extract_transitions(&self) -> Graph {
        let mut graph = Graph::new();
        let mut trees = HashMap::new();
        for index in 0..self.states.len() {
            for edge in self.outgoing(index) {
                let from = self.extract_state(edge.from, &mut graph, &mut trees);
                let to = self.extract_state(edge.to, &mut graph, &mut trees);
                let conditions = edge
                    .conditions
                    .iter()
                    .map(|c| {
                        let registered = self.parameter(&c.parameter).map(|p| p.kind);
                        condition_from_runtime(c.mode, c.threshold, &c.parameter, registered)
                    })
                    .collect();
                graph.push(Transition {
                    from,
                    to,
                    conditions,
                });
            }
        }
        log::debug!(
            "extracted {} transitions and {} blend trees from runtime graph",
            graph.len(),
            graph.blend_trees.len()
        );
        graph
    }
}

impl GraphBuilder for MemoryAnimator {
    type StateId = usize;
    type BlendId = usize;
    type EdgeId = usize;

    fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    fn add_parameter(&mut self, name: &str, kind: ParameterKind) {
        self.parameters.push(Parameter {
            name: name.to_string(),
            kind,
        });
    }

    fn create_state(&mut self, name: &str) -> usize {
        self.states.push(RuntimeState {
            name: name.to_string(),
            motion: None,
        });
        self.states.len() - 1
    }

    fn assign_clip(&mut self, state: &usize, clip: ClipRef) {
        if let Some(s) = self.states.get_mut(*state) {
            s.motion = Some(RuntimeMotion::Clip(clip));
        }
    }

    fn create_blend_tree(&mut self, name: &str, layout: &BlendLayout) -> usize {
        self.blend_trees.push(RuntimeBlendTree {
            name: name.to_string(),
            layout: layout.clone(),
            children: Vec::new(),
        });
        self.blend_trees.len() - 1
    }

    fn add_motion(&mut self, blend: &usize, clip: ClipRef, position: MotionPosition) {
        if let Some(b) = self.blend_trees.get_mut(*blend) {
            b.children.push(RuntimeChild { clip, position });
        }
    }

    fn assign_blend_tree(&mut self, state: &usize, blend: &usize) {
        if let Some(s) = self.states.get_mut(*state) {
            s.motion = Some(RuntimeMotion::BlendTree(*blend));
        }
    }

    fn connect(&mut self, from: &usize, to: &usize) -> usize {
        self.edges.push(RuntimeEdge {
            from: *from,
            to: *to,
            has_exit_time: false,
            conditions: Vec::new(),
        });
        self.edges.len() - 1
    }

    fn add_condition(
        &mut self,
        edge: &usize,
        mode: ConditionMode,
        threshold: f32,
        parameter: &str,
    ) {
        if let Some(e) = self.edges.get_mut(*edge) {
            e.conditions.push(RuntimeCondition {
                mode,
                threshold,
                parameter: parameter.to_string(),
            });
        }
    }
}
