//! Pattern Layers
//!
//! Each layer computes a brightness (or color) per allowed point, resolves it through its
//! colorizer against the group palette, and blends the result onto the point's running
//! color. Layers run once per frame, in their group's sibling order.

mod radial_gradient;
mod rainbow;
mod ring_wave;
mod solid;
mod sweep;

pub use radial_gradient::RadialGradientLayer;
pub use rainbow::RainbowLayer;
pub use ring_wave::RingWaveLayer;
pub use solid::SolidLayer;
pub use sweep::{SweepAxis, SweepLayer};

use glam::Vec3;
use log::warn;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::blend::{BlendMode, BlendSettings};
use crate::compositor::ColorBuffer;
use crate::fixtures::PointRegistry;
use crate::models::color::clamp01;
use crate::models::{FixtureId, SpatialPoint};
use crate::palette::{Colorizer, Palette};
use crate::params::{ParamTable, Parameterized};

/// Smallest falloff width/range used in a division.
pub const MIN_FALLOFF: f32 = 1e-3;

/// Circular distance between two positions on a ring of circumference `range`.
/// Always in `[0, range / 2]`.
pub fn wrap_distance(a: f32, b: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 0.0;
    }
    let d = (a - b).rem_euclid(range);
    d.min(range - d)
}

/// Piecewise-linear curve through `(x, y)` keys. Evaluation clamps to the end keys.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Curve {
    keys: Vec<(f32, f32)>,
}

impl Curve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.retain(|(x, y)| x.is_finite() && y.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(vec![(x0, y0), (x1, y1)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };
        if x.is_nan() || x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        let i = self.keys.partition_point(|k| k.0 <= x);
        let (x0, y0) = self.keys[i - 1];
        let (x1, y1) = self.keys[i];
        if x1 - x0 <= f32::EPSILON {
            return y1;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Where a spatial layer measures from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    /// The layout origin, using the precomputed per-point coordinates.
    #[default]
    Center,
    /// The layer's own `position`.
    Local,
}

impl Origin {
    pub const NAMES: &'static [&'static str] = &["center", "local"];

    pub fn name(self) -> &'static str {
        match self {
            Origin::Center => "center",
            Origin::Local => "local",
        }
    }

    pub fn from_name(name: &str) -> Self {
        if name == "local" {
            Origin::Local
        } else {
            Origin::Center
        }
    }
}

/// Which points a layer may touch. Points outside the filter keep their color.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PointFilter {
    #[default]
    All,
    Fixtures { ids: Vec<FixtureId> },
    /// Inclusive global-index range.
    PointRange { min: u32, max: u32 },
    Tag { tag: String },
    /// Ground-plane distance band around `center`.
    Radius { center: Vec3, min: f32, max: f32 },
}

#[derive(Debug, Clone, Default)]
enum PreparedFilter {
    #[default]
    Unprepared,
    All,
    Slots(Vec<usize>),
    /// The filter names fixtures, points or tags the registry doesn't have.
    Missing,
}

impl PointFilter {
    fn prepare(&self, registry: &PointRegistry) -> PreparedFilter {
        match self {
            PointFilter::All => PreparedFilter::All,
            PointFilter::Fixtures { ids } => {
                let ranges: Vec<Range<usize>> = ids
                    .iter()
                    .filter_map(|id| registry.fixture_slots(*id))
                    .collect();
                if ranges.is_empty() {
                    return PreparedFilter::Missing;
                }
                if ranges.len() < ids.len() {
                    warn!("[pattern] filter names fixtures that no longer exist");
                }
                let mut slots: Vec<usize> = ranges.into_iter().flatten().collect();
                slots.sort_unstable();
                slots.dedup();
                PreparedFilter::Slots(slots)
            }
            PointFilter::PointRange { min, max } => {
                let range = registry.slots_in_range(*min, *max);
                if range.is_empty() {
                    PreparedFilter::Missing
                } else {
                    PreparedFilter::Slots(range.collect())
                }
            }
            PointFilter::Tag { tag } => {
                let mut slots: Vec<usize> = registry
                    .fixture_ids_with_tag(tag)
                    .iter()
                    .filter_map(|id| registry.fixture_slots(*id))
                    .flatten()
                    .collect();
                if slots.is_empty() {
                    return PreparedFilter::Missing;
                }
                slots.sort_unstable();
                PreparedFilter::Slots(slots)
            }
            PointFilter::Radius { center, min, max } => PreparedFilter::Slots(
                registry
                    .points()
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| {
                        let d = p.ground_dist_to(*center);
                        d >= *min && d <= *max
                    })
                    .map(|(slot, _)| slot)
                    .collect(),
            ),
        }
    }
}

/// Iterator over the color-buffer slots a layer may write this frame.
pub enum AllowedSlots<'a> {
    Range(Range<usize>),
    Slots(std::slice::Iter<'a, usize>),
}

impl Iterator for AllowedSlots<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            AllowedSlots::Range(r) => r.next(),
            AllowedSlots::Slots(it) => it.next().copied(),
        }
    }
}

/// Per-frame values a group hands every layer.
pub struct LayerFrame<'a> {
    pub palette: &'a Palette,
    pub group_alpha: f32,
}

/// State every layer variant carries.
#[derive(Debug, Clone)]
pub struct LayerCore {
    pub blend: BlendSettings,
    pub colorizer: Colorizer,
    /// Scales the frame delta before the layer sees it.
    pub time_mult: f32,
    pub active: bool,
    filter: PointFilter,
    prepared: PreparedFilter,
    prepared_registry: u64,
    warned_missing: bool,
}

impl Default for LayerCore {
    fn default() -> Self {
        Self {
            blend: BlendSettings::default(),
            colorizer: Colorizer::default(),
            time_mult: 1.0,
            active: true,
            filter: PointFilter::All,
            prepared: PreparedFilter::Unprepared,
            prepared_registry: 0,
            warned_missing: false,
        }
    }
}

impl LayerCore {
    pub fn filter(&self) -> &PointFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: PointFilter) {
        self.filter = filter;
        self.prepared = PreparedFilter::Unprepared;
        self.warned_missing = false;
    }

    /// Forget the prepared filter so the next frame resolves it against the new registry.
    pub fn invalidate_filter(&mut self) {
        self.prepared = PreparedFilter::Unprepared;
    }

    /// Layer alpha times group alpha.
    pub fn effective_alpha(&self, frame: &LayerFrame) -> f32 {
        self.blend.layer_alpha * frame.group_alpha
    }

    /// Slots this layer may write. `None` when the filter target is missing, in which case
    /// the layer contributes nothing this frame.
    pub fn allowed_slots(&mut self, registry: &PointRegistry) -> Option<AllowedSlots<'_>> {
        if matches!(self.prepared, PreparedFilter::Unprepared)
            || self.prepared_registry != registry.id()
        {
            self.prepared = self.filter.prepare(registry);
            self.prepared_registry = registry.id();
        }

        match &self.prepared {
            PreparedFilter::All | PreparedFilter::Unprepared => {
                Some(AllowedSlots::Range(0..registry.len()))
            }
            PreparedFilter::Slots(slots) => Some(AllowedSlots::Slots(slots.iter())),
            PreparedFilter::Missing => {
                if !self.warned_missing {
                    warn!(
                        "[pattern] filter target {:?} not found, layer output skipped",
                        self.filter
                    );
                    self.warned_missing = true;
                }
                None
            }
        }
    }
}

/// One procedural pattern generator.
pub trait PatternLayer: Parameterized + Send {
    /// Short type name, e.g. `"sweep"`.
    fn kind(&self) -> &'static str;

    fn core(&self) -> &LayerCore;

    fn core_mut(&mut self) -> &mut LayerCore;

    /// Advance by `dt` (already scaled by the layer's time multiplier) and blend this
    /// layer's contribution into `colors`.
    fn run(
        &mut self,
        dt: f32,
        frame: &LayerFrame,
        registry: &PointRegistry,
        colors: &mut ColorBuffer,
    );

    /// The registry was replaced. Layers caching per-layout data drop it here.
    fn notify_layout_changed(&mut self) {
        self.core_mut().invalidate_filter();
    }

    /// Positional float parameters for fast remote control. Returns `false` for an index
    /// this layer doesn't use.
    fn set_indexed_float(&mut self, _index: usize, _value: f32) -> bool {
        false
    }
}

/// Resolve `brightness` and blend it onto every allowed point.
pub(crate) fn blend_brightness<F>(
    core: &mut LayerCore,
    frame: &LayerFrame,
    registry: &PointRegistry,
    colors: &mut ColorBuffer,
    mut brightness: F,
) where
    F: FnMut(&SpatialPoint) -> f32,
{
    let alpha = core.effective_alpha(frame);
    let colorizer = core.colorizer;
    let mode = core.blend.blend_mode;
    let Some(slots) = core.allowed_slots(registry) else {
        return;
    };
    let points = registry.points();
    for slot in slots {
        let Some(point) = points.get(slot) else {
            continue;
        };
        let b = brightness(point);
        colors.blend_at(slot, mode, colorizer.resolve(b, frame.palette, alpha));
    }
}

/// Parameters every layer exposes, in front of its own.
pub fn common_params<T: PatternLayer>() -> ParamTable<T> {
    ParamTable::<T>::new()
        .boolean("active", true, |l| l.core().active, |l, v| l.core_mut().active = v)
        .float(
            "alpha",
            true,
            |l| l.core().blend.layer_alpha,
            |l, v| l.core_mut().blend.layer_alpha = v.clamp(0.0, 1.0),
        )
        .choice(
            "blend",
            BlendMode::NAMES,
            true,
            |l| l.core().blend.blend_mode.name(),
            |l, v| {
                if let Some(mode) = BlendMode::from_name(v) {
                    l.core_mut().blend.blend_mode = mode;
                }
            },
        )
        .float(
            "time_mult",
            true,
            |l| l.core().time_mult,
            |l, v| l.core_mut().time_mult = v,
        )
        .choice(
            "color_source",
            Colorizer::SOURCE_NAMES,
            true,
            |l| l.core().colorizer.source_name(),
            |l, v| l.core_mut().colorizer.set_source_name(v),
        )
        .int(
            "palette_slot",
            true,
            |l| l.core().colorizer.slot as i64,
            |l, v| l.core_mut().colorizer.slot = v.max(0) as usize,
        )
        .choice(
            "brightness_mapping",
            Colorizer::MAPPING_NAMES,
            true,
            |l| l.core().colorizer.mapping_name(),
            |l, v| l.core_mut().colorizer.set_mapping_name(v),
        )
        .float(
            "color_r",
            true,
            |l| l.core().colorizer.color.r,
            |l, v| l.core_mut().colorizer.color.r = clamp01(v),
        )
        .float(
            "color_g",
            true,
            |l| l.core().colorizer.color.g,
            |l, v| l.core_mut().colorizer.color.g = clamp01(v),
        )
        .float(
            "color_b",
            true,
            |l| l.core().colorizer.color.b,
            |l, v| l.core_mut().colorizer.color.b = clamp01(v),
        )
}
