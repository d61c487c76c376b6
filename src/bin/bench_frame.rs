//! Benchmark for registry rebuild and frame compositing.
//!
//! Builds a synthetic grid of fixtures (7 points each) and times a registry rebuild,
//! a full frame over a four-layer group, and output packing.
//!
//! Run with: cargo run --profile perf --bin bench_frame

use std::time::{Duration, Instant};

use glam::Vec3;
use prairie_lib::blend::BlendMode;
use prairie_lib::compositor::LayerGroup;
use prairie_lib::models::{FixturePlacement, Rgba};
use prairie_lib::palette::Colorizer;
use prairie_lib::patterns::{
    PatternLayer, RadialGradientLayer, RingWaveLayer, SolidLayer, SweepLayer,
};
use prairie_lib::settings::ShowSettings;
use prairie_lib::show::Show;

const GRID_SIDE: usize = 40;
const FRAME_DT: f32 = 1.0 / 60.0;

fn bench<F: FnMut() -> R, R>(name: &str, iterations: usize, mut f: F) -> Duration {
    // Warmup
    for _ in 0..2 {
        std::hint::black_box(f());
    }

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;

    println!(
        "  {:<40} {:>8.3}ms  ({} iters, {:.2}ms total)",
        name,
        per_iter.as_secs_f64() * 1000.0,
        iterations,
        elapsed.as_secs_f64() * 1000.0,
    );
    per_iter
}

fn build_show() -> Show {
    let mut show = Show::new(ShowSettings::default());
    let half = GRID_SIDE as f32;
    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            let position = Vec3::new(col as f32 * 2.0 - half, 0.0, row as f32 * 2.0 - half);
            show.layout_mut()
                .on_fixture_created(FixturePlacement::at(position), false, None);
        }
    }

    let mut group = LayerGroup::new("main");
    let mut base = SolidLayer::default();
    base.core.colorizer = Colorizer::fixed(Rgba::rgb(0.05, 0.0, 0.1));

    let mut sweep = SweepLayer::default();
    sweep.core.blend.blend_mode = BlendMode::Add;

    let mut ring = RingWaveLayer::default();
    ring.core.blend.blend_mode = BlendMode::Screen;
    ring.set_indexed_float(0, 1.0);
    ring.set_indexed_float(1, 0.2);

    let mut gradient = RadialGradientLayer::default();
    gradient.core.blend.blend_mode = BlendMode::Multiply;

    let layers: Vec<(&str, Box<dyn PatternLayer>)> = vec![
        ("base", Box::new(base)),
        ("sweep", Box::new(sweep)),
        ("ring", Box::new(ring)),
        ("gradient", Box::new(gradient)),
    ];
    for (name, layer) in layers {
        if let Err(err) = group.add_layer(name, layer) {
            eprintln!("failed to add layer {name}: {err}");
        }
    }
    if let Err(err) = show.add_group(group) {
        eprintln!("failed to add group: {err}");
    }
    show
}

fn main() {
    env_logger::init();

    let mut show = build_show();
    show.request_rebuild();
    show.tick(FRAME_DT);

    let registry = show.registry();
    println!(
        "Layout: {} fixtures, {} points, {} universes\n",
        registry.fixture_count(),
        registry.len(),
        show.dmx_frames().len()
    );

    let iters = 200;
    println!("=== Stages ({iters} iterations each) ===\n");

    let t_rebuild = bench("rebuild + publish", iters, || {
        show.request_rebuild();
        show.tick(0.0);
    });

    let t_frame = bench("tick (4 layers)", iters, || show.tick(FRAME_DT));

    let t_triples = bench("output_triples", iters, || show.output_triples());

    let t_dmx = bench("dmx_frames", iters, || show.dmx_frames());

    println!("\n=== Summary ===\n");
    let frame_total = t_frame + t_dmx;
    println!(
        "  Frame + packing:             {:.3}ms ({:.0} fps budget used at 60fps: {:.1}%)",
        frame_total.as_secs_f64() * 1000.0,
        1.0 / frame_total.as_secs_f64().max(f64::EPSILON),
        frame_total.as_secs_f64() * 60.0 * 100.0
    );
    println!(
        "  Rebuild / frame ratio:       {:.1}x",
        t_rebuild.as_secs_f64() / t_frame.as_secs_f64().max(f64::EPSILON)
    );
    println!(
        "  Triples vs DMX:              {:.3}ms / {:.3}ms",
        t_triples.as_secs_f64() * 1000.0,
        t_dmx.as_secs_f64() * 1000.0
    );
}
