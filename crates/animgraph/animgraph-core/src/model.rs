//! Canonical animation graph model.
//!
//! A [`Graph`] owns its blend trees in an arena; states refer to them by
//! [`BlendTreeId`], so two states that share an id share one tree and a
//! mutation through one is visible through the other.

use serde::{Deserialize, Serialize};

use crate::resolver::ClipRef;

/// Index of a [`BlendTree`] inside its owning [`Graph`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlendTreeId(pub u32);

/// 2D vector used for blend positions.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    #[default]
    Animation,
    BlendTree,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensionality {
    #[default]
    OneD,
    TwoD,
}

impl Dimensionality {
    /// Number of blend parameters a tree of this dimensionality needs.
    pub fn parameter_count(self) -> usize {
        match self {
            Dimensionality::OneD => 1,
            Dimensionality::TwoD => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    #[default]
    Bool,
    Float,
    Int,
    Trigger,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[default]
    Equals,
    Greater,
    Less,
    NotEquals,
}

/// One positioned clip inside a blend tree. Only the threshold matching the
/// owning tree's dimensionality is meaningful; the other stays zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Motion {
    pub animation_name: String,
    /// Resolved clip, `None` when the resolver could not find `animation_name`.
    #[serde(default)]
    pub clip: Option<ClipRef>,
    pub threshold: f32,
    pub threshold_2d: Vec2,
}

impl Motion {
    pub fn one_d(animation_name: impl Into<String>, threshold: f32) -> Self {
        Self {
            animation_name: animation_name.into(),
            clip: None,
            threshold,
            threshold_2d: Vec2::ZERO,
        }
    }

    pub fn two_d(animation_name: impl Into<String>, position: Vec2) -> Self {
        Self {
            animation_name: animation_name.into(),
            clip: None,
            threshold: 0.0,
            threshold_2d: position,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BlendTree {
    pub dimensionality: Dimensionality,
    /// X then Y for 2D trees.
    pub parameter_names: Vec<String>,
    pub motions: Vec<Motion>,
}

impl BlendTree {
    pub fn one_d(parameter: impl Into<String>) -> Self {
        Self {
            dimensionality: Dimensionality::OneD,
            parameter_names: vec![parameter.into()],
            motions: Vec::new(),
        }
    }

    pub fn two_d(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            dimensionality: Dimensionality::TwoD,
            parameter_names: vec![x.into(), y.into()],
            motions: Vec::new(),
        }
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motions.push(motion);
        self
    }

    /// True when the parameter list matches the dimensionality.
    pub fn has_consistent_parameters(&self) -> bool {
        self.parameter_names.len() == self.dimensionality.parameter_count()
    }
}

/// What a state plays. The variant fixes the state's kind, so a state can
/// never carry both a clip and a blend tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StateBody {
    Animation {
        #[serde(default)]
        clip: Option<ClipRef>,
    },
    #[serde(rename = "blendtree")]
    BlendTree {
        #[serde(default)]
        tree: Option<BlendTreeId>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct State {
    /// Unique within a materialization pass.
    pub name: String,
    pub body: StateBody,
}

impl State {
    pub fn animation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: StateBody::Animation { clip: None },
        }
    }

    pub fn blend_tree(name: impl Into<String>, tree: Option<BlendTreeId>) -> Self {
        Self {
            name: name.into(),
            body: StateBody::BlendTree { tree },
        }
    }

    pub fn kind(&self) -> StateKind {
        match self.body {
            StateBody::Animation { .. } => StateKind::Animation,
            StateBody::BlendTree { .. } => StateKind::BlendTree,
        }
    }

    pub fn blend_tree_id(&self) -> Option<BlendTreeId> {
        match self.body {
            StateBody::BlendTree { tree } => tree,
            StateBody::Animation { .. } => None,
        }
    }

    pub fn clip(&self) -> Option<&ClipRef> {
        match &self.body {
            StateBody::Animation { clip } => clip.as_ref(),
            StateBody::BlendTree { .. } => None,
        }
    }
}

/// A single predicate over one named runtime parameter.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub parameter: String,
    pub kind: ConditionKind,
    pub bool_value: bool,
    pub number_value: f32,
    pub comparison: Comparison,
}

impl Condition {
    pub fn boolean(parameter: impl Into<String>, value: bool) -> Self {
        Self {
            parameter: parameter.into(),
            kind: ConditionKind::Bool,
            bool_value: value,
            ..Default::default()
        }
    }

    pub fn number(
        parameter: impl Into<String>,
        kind: ConditionKind,
        comparison: Comparison,
        value: f32,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            kind,
            bool_value: false,
            number_value: value,
            comparison,
        }
        .normalized()
    }

    pub fn trigger(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            kind: ConditionKind::Trigger,
            ..Default::default()
        }
    }

    /// Triggers carry no persisted value and always compare with Equals.
    pub fn normalized(mut self) -> Self {
        if self.kind == ConditionKind::Trigger {
            self.bool_value = false;
            self.comparison = Comparison::Equals;
        }
        self
    }
}

/// Directed edge; all conditions must hold.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub from: State,
    pub to: State,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Transition {
    pub fn new(from: State, to: State) -> Self {
        Self {
            from,
            to,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition.normalized());
        self
    }
}

/// Equality is structural: two graphs are equal when their transitions
/// match and every state points at an equal tree, whatever the arena order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Graph {
    pub transitions: Vec<Transition>,
    /// Arena of blend trees referenced by the states above.
    #[serde(default)]
    pub blend_trees: Vec<BlendTree>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a tree into the arena and return its id.
    pub fn add_blend_tree(&mut self, tree: BlendTree) -> BlendTreeId {
        let id = BlendTreeId(self.blend_trees.len() as u32);
        self.blend_trees.push(tree);
        id
    }

    pub fn blend_tree(&self, id: BlendTreeId) -> Option<&BlendTree> {
        self.blend_trees.get(id.0 as usize)
    }

    pub fn blend_tree_mut(&mut self, id: BlendTreeId) -> Option<&mut BlendTree> {
        self.blend_trees.get_mut(id.0 as usize)
    }

    /// The tree a state points at, if any.
    pub fn state_tree(&self, state: &State) -> Option<&BlendTree> {
        state.blend_tree_id().and_then(|id| self.blend_tree(id))
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Append another graph's transitions, re-basing its blend tree ids
    /// after this graph's arena. Sharing inside `other` is preserved.
    pub fn append(&mut self, other: Graph) {
        let offset = self.blend_trees.len() as u32;
        self.blend_trees.extend(other.blend_trees);
        for mut transition in other.transitions {
            rebase_state(&mut transition.from, offset);
            rebase_state(&mut transition.to, offset);
            self.transitions.push(transition);
        }
    }

    /// Copy with every clip reference cleared, names kept. Two graphs that
    /// differ only in clip resolution compare equal after this.
    pub fn without_clips(&self) -> Graph {
        let mut graph = self.clone();
        for transition in &mut graph.transitions {
            for state in [&mut transition.from, &mut transition.to] {
                if let StateBody::Animation { clip } = &mut state.body {
                    *clip = None;
                }
            }
        }
        for motion in graph.blend_trees.iter_mut().flat_map(|t| t.motions.iter_mut()) {
            motion.clip = None;
        }
        graph
    }

    /// Renumber the arena in first-use order of [`Graph::states`]. Trees no
    /// state refers to are dropped and ids past the arena become `None`.
    pub fn canonicalize(&mut self) {
        let mut arena = std::mem::take(&mut self.blend_trees)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        let mut renumbered = hashbrown::HashMap::new();
        for transition in &mut self.transitions {
            for state in [&mut transition.from, &mut transition.to] {
                let StateBody::BlendTree { tree } = &mut state.body else {
                    continue;
                };
                *tree = tree.and_then(|id| {
                    if let Some(new_id) = renumbered.get(&id) {
                        return Some(*new_id);
                    }
                    let moved = arena.get_mut(id.0 as usize)?.take()?;
                    let new_id = BlendTreeId(self.blend_trees.len() as u32);
                    self.blend_trees.push(moved);
                    renumbered.insert(id, new_id);
                    Some(new_id)
                });
            }
        }
    }

    pub fn canonical(&self) -> Graph {
        let mut graph = self.clone();
        graph.canonicalize();
        graph
    }

    /// Every state in transition order (from, then to).
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.transitions.iter().flat_map(|t| [&t.from, &t.to])
    }

    /// Distinct clip names referenced by animation states and blend tree
    /// motions, in first-seen order. Animation states contribute their
    /// resolved clip's name, or their own name when unresolved.
    pub fn clip_names(&self) -> Vec<String> {
        let mut seen = hashbrown::HashSet::new();
        let mut names = Vec::new();
        let mut visited_trees = hashbrown::HashSet::new();
        for state in self.states() {
            match &state.body {
                StateBody::Animation { clip } => {
                    let name = clip.as_ref().map_or(state.name.as_str(), |c| c.name.as_str());
                    if !name.is_empty() && seen.insert(name.to_string()) {
                        names.push(name.to_string());
                    }
                }
                StateBody::BlendTree { tree: Some(id) } => {
                    if !visited_trees.insert(*id) {
                        continue;
                    }
                    if let Some(tree) = self.blend_tree(*id) {
                        for motion in &tree.motions {
                            let name = motion.animation_name.as_str();
                            if !name.is_empty() && seen.insert(name.to_string()) {
                                names.push(name.to_string());
                            }
                        }
                    }
                }
                StateBody::BlendTree { tree: None } => {}
            }
        }
        names
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        if self.transitions.len() != other.transitions.len() {
            return false;
        }
        let (a, b) = (self.canonical(), other.canonical());
        a.transitions == b.transitions && a.blend_trees == b.blend_trees
    }
}

fn rebase_state(state: &mut State, offset: u32) {
    if let StateBody::BlendTree { tree: Some(id) } = &mut state.body {
        id.0 += offset;
    }
}
