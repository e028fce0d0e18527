//! Import and export flows composed from the decoder, reconciler and
//! materializer.
//!
//! Every import takes a [`TransitionDecoder`]; pass
//! [`JsonDecoder`](crate::codec::JsonDecoder) for the built-in transition
//! document.

use serde::{Deserialize, Serialize};

use crate::codec::{encode, TransitionDecoder};
use crate::config::Config;
use crate::error::{CodecError, PipelineError};
use crate::materialize::{materialize, GraphBuilder, MaterializeReport};
use crate::model::Graph;
use crate::reconcile::merge;
use crate::resolver::{AnimationResolver, ClipCatalog};
use crate::runtime::TransitionSource;
use crate::store::AssetStore;

/// Check, decode and merge with the transitions already present in
/// `existing`.
///
/// With `config.require_valid` any diagnostic from the decoder rejects the
/// document; otherwise diagnostics are logged and decode proceeds with its
/// fallbacks.
pub fn import_text(
    text: &str,
    existing: Option<&dyn TransitionSource>,
    decoder: &mut dyn TransitionDecoder,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
) -> Result<Graph, PipelineError> {
    let diagnostics = decoder.diagnostics(text, config);
    if !diagnostics.is_empty() {
        if config.require_valid {
            return Err(PipelineError::Rejected { diagnostics });
        }
        for diagnostic in &diagnostics {
            log::warn!("importing despite: {diagnostic}");
        }
    }

    let imported = decoder.decode(text, resolver, config)?;
    let graph = match existing {
        Some(source) => merge(imported, source.extract_transitions()),
        None => imported,
    };
    log::info!(
        "imported {} transitions ({} blend trees)",
        graph.len(),
        graph.blend_trees.len()
    );
    Ok(graph)
}

/// [`import_text`] reading the document from `store`.
pub fn import_location<S: AssetStore + ?Sized>(
    store: &S,
    location: &str,
    existing: Option<&dyn TransitionSource>,
    decoder: &mut dyn TransitionDecoder,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
) -> Result<Graph, PipelineError> {
    let text = store.read_text(location)?;
    import_text(&text, existing, decoder, resolver, config)
}

/// Import `text` on top of what `target` already holds and materialize the
/// merged graph into `target`.
///
/// Existing transitions are re-materialized as well, so `target` should be a
/// fresh graph when `existing` is its own previous contents.
pub fn import_and_materialize<B: GraphBuilder + ?Sized>(
    text: &str,
    existing: Option<&dyn TransitionSource>,
    target: &mut B,
    decoder: &mut dyn TransitionDecoder,
    resolver: &mut dyn AnimationResolver,
    config: &Config,
) -> Result<(Graph, MaterializeReport), PipelineError> {
    let graph = import_text(text, existing, decoder, resolver, config)?;
    let report = materialize(&graph, target, resolver, config);
    if !report.is_clean() {
        log::warn!("materialized with {} warning(s)", report.warnings.len());
    }
    Ok((graph, report))
}

/// Persist a graph as a host object.
pub fn save_graph_asset<S: AssetStore + ?Sized>(
    store: &mut S,
    graph: &Graph,
    location: &str,
) -> Result<S::Handle, PipelineError> {
    Ok(store.create_persistent_object(location, graph)?)
}

/// Extract the transitions of `source`, encode them and write the text to
/// `location`. Returns the written text.
pub fn export_source<S: AssetStore + ?Sized>(
    source: &dyn TransitionSource,
    store: &mut S,
    location: &str,
) -> Result<String, PipelineError> {
    let graph = source.extract_transitions();
    let text = encode(&graph)?;
    store.write_text(location, &text)?;
    log::info!("exported {} transitions to {location}", graph.len());
    Ok(text)
}

/// Clip-name listing written by [`export_clip_names`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipList {
    pub animations: Vec<String>,
}

/// Write the names of the clips visible under `scope` to `location` as
/// `{"animations": [...]}`. Preview clips are left out. Returns the names.
pub fn export_clip_names<S: AssetStore + ?Sized>(
    catalog: &ClipCatalog,
    scope: &str,
    store: &mut S,
    location: &str,
) -> Result<Vec<String>, PipelineError> {
    let list = ClipList {
        animations: catalog.names_in_scope(scope),
    };
    log::info!("found {} clip(s) under '{scope}'", list.animations.len());
    let text =
        serde_json::to_string_pretty(&list).map_err(|e| CodecError::Serialize(e.to_string()))?;
    store.write_text(location, &text)?;
    Ok(list.animations)
}

/// Read a listing written by [`export_clip_names`], e.g. as replacement
/// candidates for [`crate::remap::ReplacementPlan::build`].
pub fn load_clip_names<S: AssetStore + ?Sized>(
    store: &S,
    location: &str,
) -> Result<Vec<String>, PipelineError> {
    let text = store.read_text(location)?;
    let list: ClipList = serde_json::from_str(&text).map_err(CodecError::from)?;
    Ok(list.animations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonDecoder;
    use crate::resolver::NullResolver;
    use crate::store::MemoryAssetStore;

    const DOC: &str = r#"{"Transitions":[{
        "StartState":{"Type":"Animation","AnimationName":"Idle"},
        "EndState":{"Type":"Animation","AnimationName":"Walk"},
        "Conditions":[{"Name":"IsMoving","Type":"Bool","BoolValue":true}]}]}"#;

    #[test]
    fn rejects_invalid_document_when_required() {
        let bad = r#"{"transitions":[{"startstate":{"type":"animation"}}]}"#;
        let err = import_text(bad, None, &mut JsonDecoder, &mut NullResolver, &Config::default())
            .unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn lenient_import_decodes_with_fallbacks() {
        let bad = r#"{"transitions":[{"startstate":{"type":"animation"}}]}"#;
        let config = Config {
            require_valid: false,
            ..Config::default()
        };
        let graph = import_text(bad, None, &mut JsonDecoder, &mut NullResolver, &config).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.transitions[0].from.name, "");
    }

    #[test]
    fn missing_location_is_a_store_error() {
        let store = MemoryAssetStore::new();
        let config = Config::default();
        let err =
            import_location(&store, "nope.json", None, &mut JsonDecoder, &mut NullResolver, &config)
                .unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
    }

    #[test]
    fn import_from_store() {
        let store = MemoryAssetStore::new().with_text("t.json", DOC);
        let config = Config::default();
        let graph =
            import_location(&store, "t.json", None, &mut JsonDecoder, &mut NullResolver, &config)
                .unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.transitions[0].to.name, "Walk");
    }

    #[test]
    fn clip_names_export_as_animation_list() {
        let catalog = ClipCatalog::new()
            .with_clip("Walk", "Assets/Hero/Walk.anim")
            .with_clip("Walk__preview__", "Assets/Hero/Walk.fbx")
            .with_clip("Swim", "Packages/Water/Swim.anim")
            .with_clip("Run", "Assets/Hero/Run.anim");
        let mut store = MemoryAssetStore::new();
        let names = export_clip_names(&catalog, "Assets/", &mut store, "clips.json").unwrap();
        assert_eq!(names, vec!["Walk", "Run"]);

        let text = store.read_text("clips.json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"animations": ["Walk", "Run"]}));
        assert!(text.contains('\n'));
        assert_eq!(load_clip_names(&store, "clips.json").unwrap(), names);
    }

    #[test]
    fn clip_names_to_unwritable_location_fail() {
        let catalog = ClipCatalog::new().with_clip("Walk", "Assets/Walk.anim");
        let mut store = MemoryAssetStore::new();
        let err = export_clip_names(&catalog, "Assets/", &mut store, " ").unwrap_err();
        assert!(matches!(err, PipelineError::Store(_)));
        assert!(matches!(
            load_clip_names(&MemoryAssetStore::new().with_text("x.json", "[]"), "x.json"),
            Err(PipelineError::Codec(CodecError::Parse(_)))
        ));
    }
}
