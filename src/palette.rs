use serde::{Deserialize, Serialize};

use crate::models::color::{clamp01, Rgba};

/// Ordered color set shared by every layer of a group for one frame.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Palette {
    pub colors: Vec<Rgba>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Rgba::WHITE,
                Rgba::from_hsv(0.08, 0.9, 1.0),
                Rgba::from_hsv(0.55, 0.8, 1.0),
                Rgba::from_hsv(0.8, 0.7, 1.0),
            ],
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<Rgba>) -> Self {
        Self { colors }
    }

    /// Color at `slot`, wrapping. An empty palette reads as white.
    pub fn color(&self, slot: usize) -> Rgba {
        if self.colors.is_empty() {
            return Rgba::WHITE;
        }
        self.colors[slot % self.colors.len()]
    }

    /// Piecewise-linear gradient through the colors, `t` clamped to 0..1.
    pub fn sample(&self, t: f32) -> Rgba {
        match self.colors.len() {
            0 => Rgba::WHITE,
            1 => self.colors[0],
            n => {
                let pos = clamp01(t) * (n - 1) as f32;
                let i = (pos.floor() as usize).min(n - 2);
                self.colors[i].lerp(self.colors[i + 1], pos - i as f32)
            }
        }
    }

    /// Slot-wise cross-fade. The result is as long as the longer palette.
    pub fn mix(&self, other: &Palette, t: f32) -> Palette {
        let len = self.colors.len().max(other.colors.len());
        Palette {
            colors: (0..len)
                .map(|i| self.color(i).lerp(other.color(i), t))
                .collect(),
        }
    }
}

/// Supplies a group's palette. Refreshed exactly once per frame, before any layer runs.
pub trait PaletteSource: Send {
    fn refresh(&mut self, dt: f32) -> Palette;
}

/// Default palette source: cross-fades `a` towards `b`, optionally cycling on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct PaletteMixer {
    pub a: Palette,
    pub b: Palette,
    pub mix: f32,
    /// Full A-to-B-to-A cycles per second. Zero holds `mix` where it is.
    pub cycle_speed: f32,
    phase: f32,
}

impl Default for PaletteMixer {
    fn default() -> Self {
        Self::new(Palette::default(), Palette::default())
    }
}

impl PaletteMixer {
    pub fn new(a: Palette, b: Palette) -> Self {
        Self {
            a,
            b,
            mix: 0.0,
            cycle_speed: 0.0,
            phase: 0.0,
        }
    }

    pub fn with_cycle(mut self, cycle_speed: f32) -> Self {
        self.cycle_speed = cycle_speed.max(0.0);
        self
    }
}

impl PaletteSource for PaletteMixer {
    fn refresh(&mut self, dt: f32) -> Palette {
        if self.cycle_speed > 0.0 {
            self.phase = (self.phase + self.cycle_speed * dt).rem_euclid(1.0);
            // triangle wave so the fade runs back and forth
            self.mix = 1.0 - (2.0 * self.phase - 1.0).abs();
        }
        self.a.mix(&self.b, self.mix)
    }
}

/// Where a layer's base color comes from.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColorSource {
    Fixed,
    #[default]
    Slot,
    /// Brightness picks the position along the palette gradient.
    Gradient,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BrightnessMapping {
    #[default]
    ScaleRgb,
    ScaleAlpha,
}

/// Resolves a scalar brightness into the RGBA a layer blends onto a point.
///
/// The fixed color and the palette slot are both kept whichever source is active, so
/// switching sources back and forth loses nothing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Colorizer {
    pub source: ColorSource,
    pub color: Rgba,
    pub slot: usize,
    pub mapping: BrightnessMapping,
}

impl Default for Colorizer {
    fn default() -> Self {
        Self {
            source: ColorSource::Slot,
            color: Rgba::WHITE,
            slot: 0,
            mapping: BrightnessMapping::ScaleRgb,
        }
    }
}

impl Colorizer {
    pub const SOURCE_NAMES: &'static [&'static str] = &["fixed", "slot", "gradient"];
    pub const MAPPING_NAMES: &'static [&'static str] = &["scaleRgb", "scaleAlpha"];

    pub fn fixed(color: Rgba) -> Self {
        Self {
            source: ColorSource::Fixed,
            color,
            ..Self::default()
        }
    }

    pub fn slot(slot: usize) -> Self {
        Self {
            source: ColorSource::Slot,
            slot,
            ..Self::default()
        }
    }

    pub fn base_color(&self, brightness: f32, palette: &Palette) -> Rgba {
        match self.source {
            ColorSource::Fixed => self.color,
            ColorSource::Slot => palette.color(self.slot),
            ColorSource::Gradient => palette.sample(brightness),
        }
    }

    /// `alpha` is the product of layer and group alpha.
    pub fn resolve(&self, brightness: f32, palette: &Palette, alpha: f32) -> Rgba {
        let b = clamp01(brightness);
        let base = self.base_color(b, palette);
        match self.mapping {
            BrightnessMapping::ScaleRgb => base.scaled(b).with_alpha(base.a * alpha),
            BrightnessMapping::ScaleAlpha => base.with_alpha(base.a * b * alpha),
        }
    }

    pub fn source_name(&self) -> &'static str {
        match self.source {
            ColorSource::Fixed => "fixed",
            ColorSource::Slot => "slot",
            ColorSource::Gradient => "gradient",
        }
    }

    pub fn set_source_name(&mut self, name: &str) {
        self.source = match name {
            "fixed" => ColorSource::Fixed,
            "gradient" => ColorSource::Gradient,
            _ => ColorSource::Slot,
        };
    }

    pub fn mapping_name(&self) -> &'static str {
        match self.mapping {
            BrightnessMapping::ScaleRgb => "scaleRgb",
            BrightnessMapping::ScaleAlpha => "scaleAlpha",
        }
    }

    pub fn set_mapping_name(&mut self, name: &str) {
        self.mapping = if name == "scaleAlpha" {
            BrightnessMapping::ScaleAlpha
        } else {
            BrightnessMapping::ScaleRgb
        };
    }
}
