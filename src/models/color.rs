use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) RGBA, each component nominally 0.0 - 1.0.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`. Malformed components read as zero, like the
    /// hex parsing used for node params.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() < 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>, default: u8| {
            u8::from_str_radix(&hex[range], 16).unwrap_or(default) as f32 / 255.0
        };
        let a = if hex.len() >= 8 { channel(6..8, 255) } else { 1.0 };
        Some(Self::new(channel(0..2, 0), channel(2..4, 0), channel(4..6, 0), a))
    }

    /// `h`, `s`, `v` all normalized to 0.0 - 1.0. Hue wraps.
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(1.0) * 360.0;
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Self::rgb(r + m, g + m, b + m)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Scale RGB, leave alpha.
    pub fn scaled(self, k: f32) -> Self {
        Self {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a,
        }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            r: clamp01(self.r),
            g: clamp01(self.g),
            b: clamp01(self.b),
            a: clamp01(self.a),
        }
    }

    /// 8-bit RGB for channel output; alpha is dropped.
    pub fn to_rgb8(self, scale: f32) -> [u8; 3] {
        let to_byte = |v: f32| (clamp01(v) * scale * 255.0).round().clamp(0.0, 255.0) as u8;
        [to_byte(self.r), to_byte(self.g), to_byte(self.b)]
    }
}

/// Clamp to 0.0 - 1.0, mapping NaN to 0.0 so it can never reach the channel buffer.
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_with_and_without_alpha() {
        let c = Rgba::from_hex("#ff8000").unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);

        let c = Rgba::from_hex("00000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(Rgba::from_hex("#fff").is_none());
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(Rgba::from_hsv(0.0, 1.0, 1.0).to_rgb8(1.0), [255, 0, 0]);
        assert_eq!(Rgba::from_hsv(1.0 / 3.0, 1.0, 1.0).to_rgb8(1.0), [0, 255, 0]);
        assert_eq!(Rgba::from_hsv(2.0 / 3.0, 1.0, 1.0).to_rgb8(1.0), [0, 0, 255]);
        // Hue wraps past 1.0
        assert_eq!(Rgba::from_hsv(1.0, 1.0, 1.0).to_rgb8(1.0), [255, 0, 0]);
    }

    #[test]
    fn nan_never_reaches_output() {
        let c = Rgba::new(f32::NAN, 2.0, -1.0, 1.0);
        assert_eq!(c.to_rgb8(1.0), [0, 255, 0]);
    }
}
