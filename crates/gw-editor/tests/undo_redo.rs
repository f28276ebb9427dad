//! Integration tests: undo/redo across heterogeneous gestures.
//!
//! Drives a sequence of mutations through `GridEngine`, then verifies that
//! undoing all of them walks back through every intermediate state and
//! redoing replays them exactly.

use gw_core::id::{AssetId, LayerId};
use gw_core::model::*;
use gw_core::EngineConfig;
use gw_editor::history::EntryKind;
use gw_editor::{GridEngine, InputEvent, MemoryHost, Modifiers, PanelValues};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct MapState {
    grid: Option<Grid>,
    objects: Vec<PlacedObject>,
    tokens: Vec<Token>,
    stamp: StampSettings,
    view: ViewState,
}

fn state(host: &MemoryHost) -> MapState {
    MapState {
        grid: host.grid().cloned(),
        objects: host.layer_objects().to_vec(),
        tokens: host.tokens.clone(),
        stamp: host.stamp.clone(),
        view: host.view,
    }
}

fn make_host() -> MemoryHost {
    let mut red = Asset::new(AssetId::intern("red"), "Red", AssetKind::Color);
    red.color = Some("red".into());
    let mut shrub = Asset::new(AssetId::intern("shrub"), "Shrub", AssetKind::Natural);
    shrub.randomize = Randomization {
        variant: true,
        rotation: true,
        flip_x: true,
        flip_y: false,
        opacity: Some((0.6, 1.0)),
        size: Some((1.0, 2.0)),
    };
    shrub.variants = vec![
        AssetVariant {
            name: "a".into(),
            aspect_ratio: None,
        },
        AssetVariant {
            name: "b".into(),
            aspect_ratio: Some(2.0),
        },
    ];
    let knight = Asset::new(AssetId::intern("knight"), "Knight", AssetKind::Token);
    MemoryHost::new(12, 12, 16.0)
        .with_asset(red)
        .with_asset(shrub)
        .with_asset(knight)
}

fn engine() -> GridEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    GridEngine::new(EngineConfig {
        rng_seed: Some(3),
        ..EngineConfig::default()
    })
}

fn stroke(engine: &mut GridEngine, host: &mut MemoryHost, points: &[(f64, f64)]) {
    let (first, rest) = points.split_first().expect("stroke needs a point");
    engine.handle_event(host, &InputEvent::down(first.0, first.1));
    for p in rest {
        engine.handle_event(host, &InputEvent::moved(p.0, p.1));
    }
    let last = points[points.len() - 1];
    engine.handle_event(host, &InputEvent::up(last.0, last.1));
}

/// Runs five different mutations, returning the state before each one and
/// the final state.
fn run_session(engine: &mut GridEngine, host: &mut MemoryHost) -> Vec<MapState> {
    let mut states = vec![state(host)];

    host.selected_asset = Some(AssetId::intern("red"));
    stroke(engine, host, &[(8.0, 8.0), (24.0, 8.0), (40.0, 24.0)]);
    states.push(state(host));

    host.selected_asset = Some(AssetId::intern("shrub"));
    stroke(engine, host, &[(100.0, 100.0), (140.0, 100.0)]);
    states.push(state(host));

    host.selected_asset = Some(AssetId::intern("knight"));
    stroke(engine, host, &[(150.0, 20.0)]);
    states.push(state(host));

    host.selected_asset = None;
    let values = PanelValues {
        opacity: 0.5,
        ..PanelValues::from_stamp(&host.stamp)
    };
    engine.apply_panel_edit(host, values);
    states.push(state(host));

    engine.record_view_change(host);
    host.view.zoom = 2.0;
    host.view.scroll_x = 64.0;
    states.push(state(host));

    states
}

#[test]
fn undo_all_then_redo_all_round_trips() {
    let mut host = make_host();
    let mut engine = engine();
    let states = run_session(&mut engine, &mut host);
    let steps = states.len() - 1;
    assert_eq!(engine.history().undo_depth(), steps);

    for expected in states.iter().rev().skip(1) {
        assert!(engine.undo(&mut host).is_some());
        assert_eq!(&state(&host), expected);
    }
    assert!(!engine.can_undo());
    assert_eq!(engine.history().redo_depth(), steps);

    for expected in states.iter().skip(1) {
        assert!(engine.redo(&mut host).is_some());
        assert_eq!(&state(&host), expected);
    }
    assert!(!engine.can_redo());
}

#[test]
fn undo_reports_entry_kinds_newest_first() {
    let mut host = make_host();
    let mut engine = engine();
    run_session(&mut engine, &mut host);

    let kinds: Vec<EntryKind> = std::iter::from_fn(|| engine.undo(&mut host)).collect();
    assert_eq!(
        kinds,
        vec![
            EntryKind::View,
            EntryKind::Settings,
            EntryKind::Tokens,
            EntryKind::Objects,
            EntryKind::Tilemap,
        ]
    );
}

#[test]
fn new_mutation_after_undo_clears_redo() {
    let mut host = make_host();
    let mut engine = engine();
    run_session(&mut engine, &mut host);

    engine.undo(&mut host);
    engine.undo(&mut host);
    assert!(engine.can_redo());

    host.selected_asset = Some(AssetId::intern("red"));
    stroke(&mut engine, &mut host, &[(8.0, 150.0)]);
    assert!(!engine.can_redo());
}

#[test]
fn undo_prunes_selection_of_removed_entities() {
    let mut host = make_host();
    let mut engine = engine();
    host.selected_asset = Some(AssetId::intern("shrub"));
    stroke(&mut engine, &mut host, &[(100.0, 100.0)]);
    assert_eq!(host.layer_objects().len(), 1);

    host.tools.mode = InteractionMode::Select;
    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    engine.handle_event(&mut host, &InputEvent::key_down("a", ctrl));
    assert_eq!(engine.selection().len(), 1);

    // Undoing the stamp removes the selected object.
    engine.handle_event(&mut host, &InputEvent::key_down("z", ctrl));
    assert!(host.layer_objects().is_empty());
    assert!(engine.selection().is_empty());

    let shift_ctrl = Modifiers {
        shift: true,
        ..ctrl
    };
    engine.handle_event(&mut host, &InputEvent::key_down("z", shift_ctrl));
    assert_eq!(host.layer_objects().len(), 1);
}

#[test]
fn history_depth_is_bounded() {
    let mut host = make_host();
    let mut engine = GridEngine::new(EngineConfig {
        history_depth: 3,
        rng_seed: Some(1),
        ..EngineConfig::default()
    });
    host.selected_asset = Some(AssetId::intern("red"));
    for i in 0..6 {
        let x = 8.0 + 16.0 * f64::from(i);
        stroke(&mut engine, &mut host, &[(x, 8.0)]);
    }
    assert_eq!(engine.history().undo_depth(), 3);
    while engine.undo(&mut host).is_some() {}
    assert_eq!(host.grid().map(Grid::filled_count), Some(3));
}

#[test]
fn tokens_layer_is_independent_of_current_layer() {
    let mut host = make_host();
    let mut engine = engine();
    host.selected_asset = Some(AssetId::intern("knight"));
    stroke(&mut engine, &mut host, &[(40.0, 40.0)]);
    host.current_layer = LayerId::intern("decor");
    stroke(&mut engine, &mut host, &[(80.0, 40.0)]);
    assert_eq!(host.tokens.len(), 2);

    engine.undo(&mut host);
    assert_eq!(host.tokens.len(), 1);
}
