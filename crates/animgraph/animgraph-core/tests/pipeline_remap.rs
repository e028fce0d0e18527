use animgraph_core::pipeline::{
    export_clip_names, export_source, import_and_materialize, import_location, import_text,
    load_clip_names, save_graph_asset,
};
use animgraph_core::{
    decode, AnimationResolver, AssetStore, ClipCatalog, ClipRef, CodecError, Condition, Config,
    Graph, JsonDecoder, MemoryAnimator, MemoryAssetStore, NullResolver, PipelineError,
    ReplacementOptions, ReplacementPlan, State, StateBody, Transition, TransitionDecoder,
    TransitionSource,
};

fn catalog() -> ClipCatalog {
    let mut catalog = ClipCatalog::new();
    for clip in animgraph_test_fixtures::clip_catalogs::load("locomotion").expect("clip catalog") {
        catalog.insert(ClipRef::new(clip.name, clip.location));
    }
    catalog
}

fn scope() -> &'static str {
    animgraph_test_fixtures::clip_catalogs::scope("locomotion").expect("catalog scope")
}

fn fixture(name: &str) -> String {
    animgraph_test_fixtures::transitions::json(name).expect("fixture")
}

#[test]
fn rejected_documents_carry_all_diagnostics() {
    let text = fixture("three-violations");
    let config = Config::default();
    let err = import_text(&text, None, &mut JsonDecoder, &mut NullResolver, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Rejected { .. }));
    assert_eq!(err.diagnostics().len(), 3);
}

#[test]
fn import_merges_with_existing_runtime_graph() {
    let config = Config::default();
    let mut clips = catalog();

    let mut previous = MemoryAnimator::new();
    let (first, report) = import_and_materialize(
        &fixture("is-running"),
        None,
        &mut previous,
        &mut JsonDecoder,
        &mut clips,
        &config,
    )
    .expect("first import");
    assert_eq!(first.len(), 1);
    assert_eq!(report.transitions_created, 1);

    let mut target = MemoryAnimator::new();
    let (merged, report) = import_and_materialize(
        &fixture("locomotion"),
        Some(&previous),
        &mut target,
        &mut JsonDecoder,
        &mut clips,
        &config,
    )
    .expect("second import");

    assert_eq!(merged.len(), 5);
    assert_eq!(merged.transitions[4].to.name, "Run");
    assert_eq!(report.transitions_created, 5);
    assert_eq!(target.edges.len(), 5);
    assert_eq!(target.parameter("IsRunning").map(|p| p.name.as_str()), Some("IsRunning"));
}

#[test]
fn export_writes_encoded_text_to_the_store() {
    let config = Config::default();
    let mut clips = catalog();
    let mut runtime = MemoryAnimator::new();
    let text = fixture("strafe-2d");
    import_and_materialize(&text, None, &mut runtime, &mut JsonDecoder, &mut clips, &config)
        .expect("import");

    let mut store = MemoryAssetStore::new();
    let text = export_source(&runtime, &mut store, "Assets/Export/strafe.json").expect("export");
    assert_eq!(store.read_text("Assets/Export/strafe.json").expect("written"), text);

    let location = "Assets/Export/strafe.json";
    let reimported =
        import_location(&store, location, None, &mut JsonDecoder, &mut NullResolver, &config)
            .expect("reimport");
    assert_eq!(reimported, runtime.extract_transitions().without_clips());
}

#[test]
fn graph_assets_are_persisted() {
    let graph =
        decode(&fixture("is-running"), &mut NullResolver, &Config::default()).expect("decode");
    let mut store = MemoryAssetStore::new();
    let handle = save_graph_asset(&mut store, &graph, "Assets/Graphs/run.asset").expect("save");
    assert_eq!(store.object(&handle), Some(&graph));
}

/// One `From -> To : BoolParam` per line; `!BoolParam` for false.
#[derive(Default)]
struct ArrowDecoder {
    calls: usize,
}

impl TransitionDecoder for ArrowDecoder {
    fn decode(
        &mut self,
        text: &str,
        resolver: &mut dyn AnimationResolver,
        config: &Config,
    ) -> Result<Graph, CodecError> {
        self.calls += 1;
        let mut graph = Graph::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let (edge, parameter) = line.split_once(':').unwrap_or((line, ""));
            let (from, to) = edge
                .split_once("->")
                .ok_or_else(|| CodecError::Parse(format!("no arrow in '{line}'")))?;
            let mut state = |name: &str| State {
                name: name.trim().to_string(),
                body: StateBody::Animation {
                    clip: resolver.find(name.trim(), &config.search_scope),
                },
            };
            let mut transition = Transition::new(state(from), state(to));
            let parameter = parameter.trim();
            if !parameter.is_empty() {
                let (name, value) = match parameter.strip_prefix('!') {
                    Some(name) => (name, false),
                    None => (parameter, true),
                };
                transition = transition.with_condition(Condition::boolean(name, value));
            }
            graph.push(transition);
        }
        Ok(graph)
    }

    fn diagnostics(&self, text: &str, _config: &Config) -> Vec<String> {
        text.lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty() && !l.contains("->"))
            .map(|(i, _)| format!("line {i}: expected 'From -> To'"))
            .collect()
    }
}

#[test]
fn custom_decoder_replaces_the_json_format() {
    let config = Config::default();
    let mut clips = catalog();
    let mut decoder = ArrowDecoder::default();
    let mut runtime = MemoryAnimator::new();
    let text = "Idle -> Run : IsRunning\nRun -> Idle : !IsRunning\n";

    let (graph, report) =
        import_and_materialize(text, None, &mut runtime, &mut decoder, &mut clips, &config)
            .expect("import");
    assert_eq!(decoder.calls, 1);
    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.transitions[1].conditions, vec![Condition::boolean("IsRunning", false)]);
    assert_eq!(
        graph.transitions[0].to.clip().map(|c| c.location.as_str()),
        Some("Assets/Characters/Hero/Run.anim")
    );
    assert_eq!(runtime.edges.len(), 2);

    let err = import_text("Idle\nRun -> Idle", None, &mut decoder, &mut clips, &config)
        .unwrap_err();
    assert_eq!(err.diagnostics(), ["line 0: expected 'From -> To'".to_string()]);
    assert_eq!(decoder.calls, 1);
}

#[test]
fn exported_clip_names_feed_a_replacement_plan() {
    let mut clips = catalog();
    let mut store = MemoryAssetStore::new();
    let names = export_clip_names(&clips, scope(), &mut store, "Assets/clips.json")
        .expect("export names");
    assert_eq!(names.len(), 6);
    assert!(names.iter().all(|n| !n.contains("__preview__")));

    let candidates = load_clip_names(&store, "Assets/clips.json").expect("load names");
    let mut graph = locomotion(&mut clips);
    let options = ReplacementOptions {
        destination_filter: "injured".into(),
        auto_match: true,
        safety_check: true,
        ..ReplacementOptions::default()
    };
    let report = ReplacementPlan::build(&graph, &candidates, &options).apply(
        &mut graph,
        &mut clips,
        &Config::default(),
    );
    assert_eq!(report.replaced, 2);
}

fn locomotion(clips: &mut ClipCatalog) -> Graph {
    decode(&fixture("locomotion"), clips, &Config::default()).expect("decode")
}

#[test]
fn auto_match_with_destination_filter() {
    let mut clips = catalog();
    let graph = locomotion(&mut clips);
    let options = ReplacementOptions {
        destination_filter: "injured".into(),
        auto_match: true,
        ..ReplacementOptions::default()
    };
    let plan = ReplacementPlan::build(&graph, &clips.names_in_scope(scope()), &options);
    assert_eq!(
        plan.entries(),
        &[
            ("Idle".to_string(), "Idle".to_string()),
            ("Walk".to_string(), "Walk_Injured".to_string()),
            ("Run".to_string(), "Run_Injured".to_string()),
            ("Jump".to_string(), "Jump".to_string()),
        ]
    );
}

#[test]
fn safety_check_leaves_identity_mappings_alone() {
    let mut clips = catalog();
    let mut graph = locomotion(&mut clips);
    let options = ReplacementOptions {
        destination_filter: "injured".into(),
        auto_match: true,
        safety_check: true,
        ..ReplacementOptions::default()
    };
    let plan = ReplacementPlan::build(&graph, &clips.names_in_scope(scope()), &options);
    let report = plan.apply(&mut graph, &mut clips, &Config::default());

    assert_eq!(report.replaced, 2);
    assert!(report.missing.is_empty());
    let tree = &graph.blend_trees[0];
    assert_eq!(
        tree.motions[0].clip.as_ref().map(|c| c.location.as_str()),
        Some("Assets/Characters/Hero/Injured/Walk_Injured.anim")
    );
    assert_eq!(tree.motions[0].animation_name, "Walk");
    assert!(graph.transitions[0].from.clip().is_none());
}

#[test]
fn identity_mappings_refresh_without_safety_check() {
    let mut clips = catalog();
    let mut graph = locomotion(&mut clips);
    let plan = ReplacementPlan::build(&graph, &[], &ReplacementOptions::default());
    let report = plan.apply(&mut graph, &mut clips, &Config::default());

    // Idle and Jump once each, plus both motions.
    assert_eq!(report.replaced, 4);
    for state in graph.states().filter(|s| s.name == "Idle") {
        assert_eq!(
            state.clip().map(|c| c.location.as_str()),
            Some("Assets/Characters/Hero/Idle.anim")
        );
    }
}

#[test]
fn source_filter_and_path_replacements() {
    let mut clips = catalog();
    let mut graph = locomotion(&mut clips);
    let options = ReplacementOptions {
        source_filter: "JU".into(),
        ..ReplacementOptions::default()
    };
    let mut plan = ReplacementPlan::build(&graph, &[], &options);
    assert_eq!(plan.entries().len(), 1);

    plan.set("Jump", "Characters\\Hero\\Run");
    plan.set("Idle", "Nope");
    let report = plan.apply(&mut graph, &mut clips, &Config::default());

    assert_eq!(report.replaced, 1);
    assert_eq!(report.missing, vec!["Nope".to_string()]);
    let jump = graph
        .states()
        .find(|s| s.name == "Jump")
        .and_then(|s| s.clip())
        .expect("jump clip");
    assert_eq!(jump.name, "Run");
}
