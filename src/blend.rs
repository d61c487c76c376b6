use serde::{Deserialize, Serialize};

use crate::models::color::{clamp01, Rgba};

/// Compositing operator applied when a layer writes onto a point's running color.
///
/// `Add`, `Multiply`, `Screen`, `Max` and `Subtract` give the same result whatever order
/// two layers of that same mode are applied in. `Normal` does not, which is why sibling
/// order in a `LayerGroup` is part of the visible result.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    Max,
    Subtract,
}

impl BlendMode {
    pub const NAMES: &'static [&'static str] =
        &["normal", "add", "multiply", "screen", "max", "subtract"];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "add",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Max => "max",
            BlendMode::Subtract => "subtract",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "normal" => Some(BlendMode::Normal),
            "add" => Some(BlendMode::Add),
            "multiply" => Some(BlendMode::Multiply),
            "screen" => Some(BlendMode::Screen),
            "max" => Some(BlendMode::Max),
            "subtract" => Some(BlendMode::Subtract),
            _ => None,
        }
    }

    pub fn is_order_independent(self) -> bool {
        !matches!(self, BlendMode::Normal)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlendSettings {
    pub blend_mode: BlendMode,
    pub layer_alpha: f32,
}

impl Default for BlendSettings {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Normal,
            layer_alpha: 1.0,
        }
    }
}

/// Combine `new` onto `existing`. `new.a` is the coverage of the incoming color.
pub fn blend(mode: BlendMode, new: Rgba, existing: Rgba) -> Rgba {
    let n = new.clamped();
    let e = existing.clamped();
    let a = n.a;

    let channel = |f: fn(f32, f32, f32) -> f32| Rgba {
        r: clamp01(f(n.r, e.r, a)),
        g: clamp01(f(n.g, e.g, a)),
        b: clamp01(f(n.b, e.b, a)),
        a: 0.0,
    };

    match mode {
        BlendMode::Normal => channel(|n, e, a| e * (1.0 - a) + n * a).with_alpha(a + e.a * (1.0 - a)),
        BlendMode::Add => channel(|n, e, a| (e + n * a).min(1.0)).with_alpha((e.a + a).min(1.0)),
        BlendMode::Multiply => channel(|n, e, a| e * (1.0 + (n - 1.0) * a)).with_alpha(e.a),
        BlendMode::Screen => {
            channel(|n, e, a| 1.0 - (1.0 - e) * (1.0 - n * a)).with_alpha(a + e.a - a * e.a)
        }
        BlendMode::Max => channel(|n, e, a| e.max(n * a)).with_alpha(e.a.max(a)),
        BlendMode::Subtract => channel(|n, e, a| (e - n * a).max(0.0)).with_alpha(e.a),
    }
}
