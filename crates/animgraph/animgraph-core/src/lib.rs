//! Animgraph Core (engine-agnostic)
//!
//! Converts animation state graphs (states, blend trees, conditional
//! transitions) to and from a JSON transition document. The host runtime is
//! reached only through traits: [`AnimationResolver`] for clip lookup,
//! [`GraphBuilder`] for instantiation, [`TransitionSource`] for extraction and
//! [`AssetStore`] for persistence. [`MemoryAnimator`], [`ClipCatalog`] and
//! [`MemoryAssetStore`] are in-memory implementations of each. Import flows
//! take a [`TransitionDecoder`], so hosts can swap in their own format.

pub mod codec;
pub mod config;
pub mod error;
pub mod materialize;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod remap;
pub mod resolver;
pub mod runtime;
pub mod schema;
pub mod store;
pub mod validate;

// Re-exports for hosts
pub use codec::{decode, decode_with_session, encode, DecodeSession, JsonDecoder, TransitionDecoder};
pub use config::{Config, DedupKey};
pub use error::{CodecError, PipelineError, StoreError};
pub use materialize::{
    materialize, BlendLayout, ConditionMode, GraphBuilder, MaterializeReport, MaterializeWarning,
    Materializer, MotionPosition, ParameterKind,
};
pub use model::{
    BlendTree, BlendTreeId, Comparison, Condition, ConditionKind, Dimensionality, Graph, Motion,
    State, StateBody, StateKind, Transition, Vec2,
};
pub use normalize::normalize_keys;
pub use pipeline::ClipList;
pub use reconcile::merge;
pub use remap::{RemapReport, ReplacementOptions, ReplacementPlan};
pub use resolver::{AnimationResolver, ClipCatalog, ClipRef, NullResolver};
pub use runtime::{MemoryAnimator, TransitionSource};
pub use schema::SCHEMA_VERSION;
pub use store::{AssetStore, MemoryAssetStore};
pub use validate::{validate, validate_json, ValidationReport};
