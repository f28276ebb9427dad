//! Integration tests: placement through the engine.
//!
//! Covers token groups, free (unsnapped) placement, the in-bounds property
//! under randomized natural stamps, and seeded reproducibility.

use gw_core::id::AssetId;
use gw_core::model::*;
use gw_core::EngineConfig;
use gw_editor::placement::within_bounds;
use gw_editor::{GridEngine, InputEvent, MemoryHost};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn engine(seed: u64) -> GridEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    GridEngine::new(EngineConfig {
        rng_seed: Some(seed),
        ..EngineConfig::default()
    })
}

fn click(engine: &mut GridEngine, host: &mut MemoryHost, x: f64, y: f64) {
    engine.handle_event(host, &InputEvent::down(x, y));
    engine.handle_event(host, &InputEvent::up(x, y));
}

fn natural() -> Asset {
    let mut bush = Asset::new(AssetId::intern("bush"), "Bush", AssetKind::Natural);
    bush.variants = vec![
        AssetVariant {
            name: "round".into(),
            aspect_ratio: None,
        },
        AssetVariant {
            name: "tall".into(),
            aspect_ratio: Some(0.5),
        },
    ];
    bush.randomize = Randomization {
        variant: true,
        rotation: true,
        flip_x: true,
        flip_y: true,
        opacity: Some((0.0, 0.8)),
        size: Some((1.0, 3.0)),
    };
    bush
}

#[test]
fn token_group_lays_members_left_to_right() {
    let knight = Asset::new(AssetId::intern("knight"), "Knight", AssetKind::Token);
    let mut archer = Asset::new(AssetId::intern("archer"), "Archer", AssetKind::Token);
    archer.native_tiles = Some((2, 1));
    let mut party = Asset::new(AssetId::intern("party"), "Party", AssetKind::TokenGroup);
    party.members = vec![
        AssetId::intern("knight"),
        AssetId::intern("archer"),
        AssetId::intern("nobody"),
    ];
    let mut host = MemoryHost::new(10, 10, 20.0)
        .with_asset(knight)
        .with_asset(archer)
        .with_asset(party);
    host.selected_asset = Some(AssetId::intern("party"));
    let mut engine = engine(1);

    click(&mut engine, &mut host, 110.0, 110.0);

    let laid: Vec<(f64, f64, u32)> = host
        .tokens
        .iter()
        .map(|t| (t.frame.row, t.frame.col, t.frame.w_tiles))
        .collect();
    assert_eq!(laid, vec![(5.0, 5.0, 1), (5.0, 6.0, 2)]);
    assert_eq!(host.tokens[1].meta.name, "Archer");

    // The whole group is one undo step.
    engine.undo(&mut host);
    assert!(host.tokens.is_empty());
}

#[test]
fn free_placement_quantizes_to_step() {
    let tree = Asset::new(AssetId::intern("tree"), "Tree", AssetKind::Image);
    let mut host = MemoryHost::new(10, 10, 20.0).with_asset(tree);
    host.selected_asset = Some(AssetId::intern("tree"));
    host.stamp.snap_to_grid = false;
    host.stamp.snap_step = 0.5;
    host.stamp.size_cols = Some(2);
    let mut engine = engine(1);

    engine.handle_event(&mut host, &InputEvent::down(55.0, 55.0));
    // Free placement does not suppress repeats within a cell.
    engine.handle_event(&mut host, &InputEvent::moved(56.0, 56.0));
    engine.handle_event(&mut host, &InputEvent::up(56.0, 56.0));

    let frames: Vec<(f64, f64)> = host
        .layer_objects()
        .iter()
        .map(|o| (o.frame.row, o.frame.col))
        .collect();
    assert_eq!(frames, vec![(1.5, 1.5), (1.5, 1.5)]);
}

#[test]
fn step_one_behaves_like_snapping() {
    let tree = Asset::new(AssetId::intern("tree"), "Tree", AssetKind::Image);
    let mut host = MemoryHost::new(10, 10, 20.0).with_asset(tree);
    host.selected_asset = Some(AssetId::intern("tree"));
    host.stamp.snap_to_grid = false;
    host.stamp.snap_step = 1.0;
    let mut engine = engine(1);

    engine.handle_event(&mut host, &InputEvent::down(55.0, 55.0));
    engine.handle_event(&mut host, &InputEvent::moved(58.0, 51.0));
    engine.handle_event(&mut host, &InputEvent::up(58.0, 51.0));

    assert_eq!(host.layer_objects().len(), 1);
    let f = host.layer_objects()[0].frame;
    assert_eq!((f.row, f.col), (2.0, 2.0));
}

#[test]
fn randomized_stamps_stay_in_bounds() {
    let mut host = MemoryHost::new(8, 12, 10.0).with_asset(natural());
    host.selected_asset = Some(AssetId::intern("bush"));
    let mut engine = engine(11);
    let mut points = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..200 {
        let x = points.random_range(-20.0..140.0);
        let y = points.random_range(-20.0..100.0);
        click(&mut engine, &mut host, x, y);
    }

    assert_eq!(host.layer_objects().len(), 200);
    for o in host.layer_objects() {
        assert!(within_bounds(o, host.dims), "{:?}", o.frame);
        assert!(o.frame.rotation % 90.0 == 0.0 && o.frame.rotation < 360.0);
        assert!((MIN_OPACITY..=0.8).contains(&o.frame.opacity));
        assert!(matches!(o.variant_index, Some(0) | Some(1)));
    }
}

#[test]
fn seeded_engines_place_identically() {
    let run = || {
        let mut host = MemoryHost::new(10, 10, 20.0).with_asset(natural());
        host.selected_asset = Some(AssetId::intern("bush"));
        let mut engine = engine(5);
        for i in 0..10 {
            let p = 10.0 + 18.0 * f64::from(i);
            click(&mut engine, &mut host, p, 200.0 - p);
        }
        host.layer_objects()
            .iter()
            .map(|o| (o.frame, o.variant_index))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
