//! Text <-> [`Graph`] conversion.
//!
//! Decode is lenient: unknown enumerants fall back to the first enumerant of
//! their type and missing fields take neutral defaults. Only text that is not
//! JSON at all fails; a field of the wrong JSON type reads as missing. Run
//! [`crate::validate`] first when strictness matters.

use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::config::{Config, DedupKey};
use crate::error::CodecError;
use crate::model::{
    BlendTree, BlendTreeId, Condition, Dimensionality, Graph, Motion, State, StateKind, Transition,
    Vec2,
};
use crate::normalize::normalize_keys;
use crate::resolver::AnimationResolver;
use crate::schema::{
    comparison_token, condition_kind_token, dimensionality_token, parse_comparison,
    parse_condition_kind, parse_dimensionality, parse_state_kind, raw_document, state_kind_token,
    RawBlendTree, RawCondition, RawDocument, RawMotion, RawState, RawTransition, SCHEMA_VERSION,
};
use crate::validate::validate;

/// BlendTree cache scoped to one decode call.
///
/// Ids in the cache index the arena of the graph being built, so
/// [`decode_with_session`] clears the cache before each document.
#[derive(Debug, Default)]
pub struct DecodeSession {
    key: DedupKey,
    cache: HashMap<String, BlendTreeId>,
}

impl DecodeSession {
    pub fn new(key: DedupKey) -> Self {
        Self {
            key,
            cache: HashMap::new(),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.key
    }

    /// Tree cached under `name`, if any.
    pub fn cached(&self, name: &str) -> Option<BlendTreeId> {
        self.cache.get(name).copied()
    }

    /// Number of distinct cache keys seen so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn reset(&mut self) {
        if !self.cache.is_empty() {
            log::debug!("dropping {} cached blend tree(s) from an earlier document", self.len());
            self.cache.clear();
        }
    }
}

/// Decode a transition document. Keys are normalized first, so any key
/// casing is accepted.
pub fn decode(
    text: &str,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
) -> Result<Graph, CodecError> {
    let mut session = DecodeSession::new(config.dedup_key);
    decode_with_session(text, resolver, config, &mut session)
}

/// Like [`decode`] but with a caller-owned session, e.g. to inspect the cache
/// afterwards. Whatever the session cached for an earlier document is dropped.
pub fn decode_with_session(
    text: &str,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
    session: &mut DecodeSession,
) -> Result<Graph, CodecError> {
    let root: JsonValue = serde_json::from_str(&normalize_keys(text))?;
    let doc = raw_document(root).unwrap_or_else(|| {
        log::warn!("transition document root is not an object; decoding as empty");
        RawDocument::default()
    });
    Ok(decode_document(doc, resolver, config, session))
}

/// Map an already parsed document onto the model. Never fails.
pub fn decode_document(
    doc: RawDocument,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
    session: &mut DecodeSession,
) -> Graph {
    session.reset();
    if let Some(version) = doc.version {
        if version > SCHEMA_VERSION {
            log::warn!(
                "transition document version {version} is newer than supported version {SCHEMA_VERSION}; decoding as {SCHEMA_VERSION}"
            );
        }
    }

    let mut decoder = Decoder {
        graph: Graph::new(),
        session,
        resolver,
        config,
    };
    for raw in doc.transitions.unwrap_or_default() {
        decoder.transition(raw);
    }
    decoder.graph
}

struct Decoder<'a, R: AnimationResolver + ?Sized> {
    graph: Graph,
    session: &'a mut DecodeSession,
    resolver: &'a mut R,
    config: &'a Config,
}

impl<R: AnimationResolver + ?Sized> Decoder<'_, R> {
    fn transition(&mut self, raw: RawTransition) {
        let start = raw.startstate.unwrap_or_default();
        let end = raw.endstate.unwrap_or_default();
        let end_name = end.animationname.clone().unwrap_or_default();

        let from = self.state(start, &end_name);
        let to = self.state(end, &end_name);
        let conditions = raw
            .conditions
            .unwrap_or_default()
            .into_iter()
            .map(decode_condition)
            .collect();

        self.graph.push(Transition {
            from,
            to,
            conditions,
        });
    }

    fn state(&mut self, raw: RawState, end_name: &str) -> State {
        let name = raw.animationname.unwrap_or_default();
        let kind = parse_state_kind(raw.kind.as_deref().unwrap_or("animation"));
        if kind == StateKind::Animation {
            return State::animation(name);
        }

        let key = match self.session.key {
            DedupKey::PerState => name.as_str(),
            DedupKey::EndStateLegacy => end_name,
        };

        if let Some(id) = self.session.cached(key) {
            if key != name {
                log::warn!("state '{name}' reuses the blend tree cached for end state '{key}'");
            }
            return State::blend_tree(name, Some(id));
        }

        let tree = raw.blendtree.map(|bt| {
            let tree = self.blend_tree(bt);
            let id = self.graph.add_blend_tree(tree);
            if !key.is_empty() {
                self.session.cache.insert(key.to_string(), id);
            }
            id
        });
        State::blend_tree(name, tree)
    }

    fn blend_tree(&mut self, raw: RawBlendTree) -> BlendTree {
        let dimensionality = parse_dimensionality(raw.blendtype.as_deref().unwrap_or("oned"));
        let parameter_names = match dimensionality {
            Dimensionality::OneD => raw
                .parametername
                .or_else(|| raw.parameternames.and_then(|names| names.into_iter().next()))
                .into_iter()
                .collect(),
            Dimensionality::TwoD => raw.parameternames.unwrap_or_else(|| {
                vec![
                    self.config.default_x_parameter.clone(),
                    self.config.default_y_parameter.clone(),
                ]
            }),
        };

        let motions = raw
            .motions
            .unwrap_or_default()
            .into_iter()
            .map(|m| self.motion(m, dimensionality))
            .collect();

        BlendTree {
            dimensionality,
            parameter_names,
            motions,
        }
    }

    fn motion(&mut self, raw: RawMotion, dimensionality: Dimensionality) -> Motion {
        let animation_name = raw.animationname.unwrap_or_default();
        let clip = if animation_name.is_empty() {
            None
        } else {
            self.resolver.find(&animation_name, &self.config.search_scope)
        };

        let (threshold, threshold_2d) = match dimensionality {
            Dimensionality::OneD => (raw.threshold.unwrap_or(0.0), Vec2::ZERO),
            Dimensionality::TwoD => match raw.threshold2d.as_deref() {
                Some([x, y]) => (0.0, Vec2::new(*x, *y)),
                other => {
                    log::warn!(
                        "motion '{animation_name}' in 2D blend tree needs exactly 2 threshold values, got {}; using [0, 0]",
                        other.map_or(0, |v| v.len())
                    );
                    (0.0, Vec2::ZERO)
                }
            },
        };

        Motion {
            animation_name,
            clip,
            threshold,
            threshold_2d,
        }
    }
}

fn decode_condition(raw: RawCondition) -> Condition {
    Condition {
        parameter: raw.name.unwrap_or_default(),
        kind: parse_condition_kind(raw.kind.as_deref().unwrap_or("bool")),
        bool_value: raw.boolvalue.unwrap_or(false),
        number_value: raw.numbervalue.unwrap_or(0.0),
        comparison: parse_comparison(raw.comparison.as_deref().unwrap_or("equals")),
    }
    .normalized()
}

/// Turns import text into a graph. The JSON codec is the stock
/// implementation; hosts with their own export format plug in here.
pub trait TransitionDecoder {
    fn decode(
        &mut self,
        text: &str,
        resolver: &mut dyn AnimationResolver,
        config: &Config,
    ) -> Result<Graph, CodecError>;

    /// Problems worth reporting before [`TransitionDecoder::decode`] runs.
    /// An empty list means the text is accepted.
    fn diagnostics(&self, text: &str, config: &Config) -> Vec<String> {
        validate(text, config).diagnostics
    }
}

/// The built-in JSON transition format.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl TransitionDecoder for JsonDecoder {
    fn decode(
        &mut self,
        text: &str,
        resolver: &mut dyn AnimationResolver,
        config: &Config,
    ) -> Result<Graph, CodecError> {
        decode(text, resolver, config)
    }
}

/// Encode a graph as a pretty-printed transition document.
pub fn encode(graph: &Graph) -> Result<String, CodecError> {
    serde_json::to_string_pretty(&encode_document(graph))
        .map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Build the raw document for a graph. Clip references are not written;
/// motions and states are identified by name only.
pub fn encode_document(graph: &Graph) -> RawDocument {
    let transitions = graph
        .transitions
        .iter()
        .map(|t| RawTransition {
            startstate: Some(encode_state(graph, &t.from)),
            endstate: Some(encode_state(graph, &t.to)),
            conditions: Some(t.conditions.iter().map(encode_condition).collect()),
        })
        .collect();

    RawDocument {
        version: Some(SCHEMA_VERSION),
        transitions: Some(transitions),
    }
}

fn encode_state(graph: &Graph, state: &State) -> RawState {
    RawState {
        kind: Some(state_kind_token(state.kind()).to_string()),
        animationname: Some(state.name.clone()),
        blendtree: graph.state_tree(state).map(encode_blend_tree),
    }
}

fn encode_blend_tree(tree: &BlendTree) -> RawBlendTree {
    let (parametername, parameternames) = match tree.dimensionality {
        Dimensionality::OneD => (tree.parameter_names.first().cloned(), None),
        Dimensionality::TwoD => (None, Some(tree.parameter_names.clone())),
    };
    let motions = tree
        .motions
        .iter()
        .map(|m| RawMotion {
            animationname: Some(m.animation_name.clone()),
            threshold: Some(m.threshold),
            threshold2d: match tree.dimensionality {
                Dimensionality::OneD => None,
                Dimensionality::TwoD => Some(vec![m.threshold_2d.x, m.threshold_2d.y]),
            },
        })
        .collect();

    RawBlendTree {
        parametername,
        parameternames,
        blendtype: Some(dimensionality_token(tree.dimensionality).to_string()),
        motions: Some(motions),
    }
}

fn encode_condition(condition: &Condition) -> RawCondition {
    RawCondition {
        name: Some(condition.parameter.clone()),
        kind: Some(condition_kind_token(condition.kind).to_string()),
        boolvalue: Some(condition.bool_value),
        numbervalue: Some(condition.number_value),
        comparison: Some(comparison_token(condition.comparison).to_string()),
    }
}
