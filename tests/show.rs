use glam::Vec3;
use prairie_lib::compositor::LayerGroup;
use prairie_lib::models::{FixturePlacement, Rgba};
use prairie_lib::palette::Colorizer;
use prairie_lib::params::ParamValue;
use prairie_lib::patterns::{SolidLayer, SweepLayer};
use prairie_lib::settings::ShowSettings;
use prairie_lib::show::Show;
use tempfile::tempdir;

fn show_with_fixtures(count: usize) -> Show {
    let mut show = Show::new(ShowSettings::default());
    for i in 0..count {
        show.layout_mut()
            .add_fixture(FixturePlacement::at(Vec3::new(i as f32 * 2.0, 0.0, 0.0)))
            .unwrap();
    }
    let mut group = LayerGroup::new("main");
    let mut fill = SolidLayer::default();
    fill.core.colorizer = Colorizer::fixed(Rgba::rgb(1.0, 0.5, 0.0));
    group.add_layer("fill", Box::new(fill)).unwrap();
    group
        .add_layer("sweep", Box::new(SweepLayer::default()))
        .unwrap();
    show.add_group(group).unwrap();
    show.request_rebuild();
    show
}

#[test]
fn test_snapshot_round_trip_through_show() {
    let mut show = show_with_fixtures(2);
    show.tick(0.1);

    let snap = show.capture_group("main", "warm").unwrap();
    assert_eq!(snap, show.capture_group("main", "warm").unwrap());

    show.set_param("main/sweep/speed", &ParamValue::Float(2.0))
        .unwrap();
    show.set_param_str("main/fill/active", "off").unwrap();
    show.set_param_str("main/alpha", "0.3").unwrap();
    assert_ne!(snap, show.capture_group("main", "warm").unwrap());

    show.restore_group("main", &snap).unwrap();
    assert_eq!(snap, show.capture_group("main", "warm").unwrap());
    show.restore_group("main", &snap).unwrap();
    assert_eq!(snap, show.capture_group("main", "warm").unwrap());

    let json = serde_json::to_string(&snap).unwrap();
    let parsed: prairie_lib::snapshot::Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snap);
}

#[test]
fn test_dmx_frames_follow_addresses() {
    let settings = ShowSettings {
        max_dimmer: 50,
        ..ShowSettings::default()
    };
    let mut show = Show::new(settings);
    for i in 0..25 {
        let placement = FixturePlacement::at(Vec3::new(i as f32 * 2.0, 0.0, 0.0));
        show.layout_mut().on_fixture_created(placement, false, None);
    }
    let mut group = LayerGroup::new("main");
    let mut fill = SolidLayer::default();
    fill.core.colorizer = Colorizer::fixed(Rgba::WHITE);
    group.add_layer("fill", Box::new(fill)).unwrap();
    show.add_group(group).unwrap();

    show.request_rebuild();
    show.tick(0.016);

    let triples = show.output_triples();
    assert_eq!(triples.len(), 25 * 7);
    assert!(triples
        .windows(2)
        .all(|w| (w[0].universe, w[0].channel) < (w[1].universe, w[1].channel)));

    let frames = show.dmx_frames();
    assert_eq!(frames.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    // 128 is round(255 * 0.5)
    assert_eq!(frames[&0][503], 128);
    assert_eq!(frames[&0][504], 0);
    assert_eq!(frames[&1][0..21], [128u8; 21]);
    assert_eq!(frames[&1][21], 0);
}

#[test]
fn test_layout_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stage.json");

    let mut show = show_with_fixtures(3);
    show.layout_mut().remove_fixture(1).unwrap();
    show.save_layout_file(&path, "stage").unwrap();

    let mut restored = Show::new(ShowSettings::default());
    restored.load_layout_file(&path).unwrap();
    restored.tick(0.016);

    let original: Vec<(u32, u32)> = show
        .layout()
        .fixtures()
        .iter()
        .map(|f| (f.universe, f.channel))
        .collect();
    let loaded: Vec<(u32, u32)> = restored
        .layout()
        .fixtures()
        .iter()
        .map(|f| (f.universe, f.channel))
        .collect();
    assert_eq!(original, vec![(0, 0), (0, 42)]);
    assert_eq!(loaded, original);
    assert_eq!(restored.registry().len(), 14);
    assert_eq!(restored.registry().fixture_count(), 2);
}

#[test]
fn test_rebuild_between_frames_resets_colors() {
    let settings = ShowSettings {
        clear_each_frame: false,
        ..ShowSettings::default()
    };
    let mut show = Show::new(settings);
    show.layout_mut()
        .add_fixture(FixturePlacement::at(Vec3::ZERO))
        .unwrap();
    let mut group = LayerGroup::new("main");
    let mut fill = SolidLayer::default();
    fill.core.colorizer = Colorizer::fixed(Rgba::new(1.0, 1.0, 1.0, 0.5));
    group.add_layer("fill", Box::new(fill)).unwrap();
    show.add_group(group).unwrap();

    show.request_rebuild();
    show.tick(0.016);
    show.tick(0.016);
    // accumulates without clearing
    assert_eq!(show.colors().get(0).map(|c| c.r), Some(0.75));

    show.layout_mut()
        .add_fixture(FixturePlacement::at(Vec3::new(5.0, 0.0, 0.0)))
        .unwrap();
    show.request_rebuild();
    let before = show.registry().generation();
    show.tick(0.016);
    assert_eq!(show.registry().generation(), before + 1);
    assert_eq!(show.colors().len(), 14);
    assert_eq!(show.colors().get(0).map(|c| c.r), Some(0.5));
}
