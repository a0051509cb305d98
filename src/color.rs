use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Named schemes
// ---------------------------------------------------------------------------

const CATEGORY10: [u32; 10] = [
    0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f, 0xbcbd22,
    0x17becf,
];

const TABLEAU10: [u32; 10] = [
    0x4c78a8, 0xf58518, 0xe45756, 0x72b7b2, 0x54a24b, 0xeeca3b, 0xb279a2, 0xff9da6, 0x9d755d,
    0xbab0ac,
];

const CATEGORY20: [u32; 20] = [
    0x1f77b4, 0xaec7e8, 0xff7f0e, 0xffbb78, 0x2ca02c, 0x98df8a, 0xd62728, 0xff9896, 0x9467bd,
    0xc5b0d5, 0x8c564b, 0xc49c94, 0xe377c2, 0xf7b6d2, 0x7f7f7f, 0xc7c7c7, 0xbcbd22, 0xdbdb8d,
    0x17becf, 0x9edae5,
];

const SET2: [u32; 8] = [
    0x66c2a5, 0xfc8d62, 0x8da0cb, 0xe78ac3, 0xa6d854, 0xffd92f, 0xe5c494, 0xb3b3b3,
];

// light to dark
const BLUES: [u32; 2] = [0xeff3ff, 0x08519c];

pub const LIGHT_GRAY: Color32 = Color32::from_rgb(0xd3, 0xd3, 0xd3);
pub const STEEL_BLUE: Color32 = Color32::from_rgb(0x46, 0x82, 0xb4);

fn hex(rgb: u32) -> Color32 {
    Color32::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

/// Fixed categorical palettes, one per chart family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Category10,
    Tableau10,
    Category20,
    Set2,
}

impl Scheme {
    pub fn colors(self) -> Vec<Color32> {
        let table: &[u32] = match self {
            Scheme::Category10 => &CATEGORY10,
            Scheme::Tableau10 => &TABLEAU10,
            Scheme::Category20 => &CATEGORY20,
            Scheme::Set2 => &SET2,
        };
        table.iter().copied().map(hex).collect()
    }
}

/// Parse a CSS-style colour name or `#rrggbb`.
pub fn named_color(name: &str) -> Option<Color32> {
    match name.trim().to_ascii_lowercase().as_str() {
        "lightgray" | "lightgrey" => Some(LIGHT_GRAY),
        "steelblue" => Some(STEEL_BLUE),
        "gray" | "grey" => Some(Color32::GRAY),
        "white" => Some(Color32::WHITE),
        other => {
            let digits = other.strip_prefix('#')?;
            if digits.len() != 6 {
                return None;
            }
            u32::from_str_radix(digits, 16).ok().map(hex)
        }
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Categorical scale: value → Color32
// ---------------------------------------------------------------------------

/// Maps the unique values of a field to the colours of a scheme, in sorted
/// value order, cycling when the domain is longer than the scheme.
#[derive(Debug, Clone)]
pub struct CategoricalScale {
    pub field: String,
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl CategoricalScale {
    pub fn new(field: &str, domain: &BTreeSet<Value>, scheme: Scheme) -> Self {
        let colors = scheme.colors();
        let mapping = domain
            .iter()
            .zip(colors.iter().cycle())
            .map(|(v, c)| (v.clone(), *c))
            .collect();
        CategoricalScale {
            field: field.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Scale with hue-spaced colours, for fields with no configured scheme.
    pub fn generated(field: &str, domain: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(domain.len());
        let mapping = domain.iter().cloned().zip(palette).collect();
        CategoricalScale {
            field: field.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sequential scale: number → Color32
// ---------------------------------------------------------------------------

/// Linear "blues" ramp over a numeric domain, interpolated in linear RGB.
#[derive(Debug, Clone, Copy)]
pub struct SequentialScale {
    min: f64,
    max: f64,
    low: LinSrgb,
    high: LinSrgb,
}

fn to_linear(rgb: u32) -> LinSrgb {
    let c = hex(rgb);
    Srgb::new(c.r(), c.g(), c.b()).into_format::<f32>().into_linear()
}

impl SequentialScale {
    pub fn blues(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            low: to_linear(BLUES[0]),
            high: to_linear(BLUES[1]),
        }
    }

    /// Build from the extent of `values`; an empty slice gives `[0, 1]`.
    pub fn blues_over(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            Self::blues(0.0, 1.0)
        } else {
            Self::blues(min, max)
        }
    }

    /// Position of `value` in the domain, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let mixed = self.low.mix(self.high, self.normalize(value));
        let rgb: Srgb = Srgb::from_linear(mixed);
        let rgb: Srgb<u8> = rgb.into_format();
        Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(values: &[&str]) -> BTreeSet<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn categorical_scale_follows_sorted_domain() {
        let scale = CategoricalScale::new(
            "experience_level",
            &domain(&["Senior", "Entry", "Mid"]),
            Scheme::Tableau10,
        );
        // Entry < Mid < Senior
        assert_eq!(scale.color_for(&Value::from("Entry")), hex(0x4c78a8));
        assert_eq!(scale.color_for(&Value::from("Mid")), hex(0xf58518));
        assert_eq!(scale.color_for(&Value::from("Senior")), hex(0xe45756));
        assert_eq!(scale.color_for(&Value::from("Intern")), Color32::GRAY);
        assert_eq!(scale.legend_entries().len(), 3);
    }

    #[test]
    fn categorical_scale_cycles_long_domains() {
        let values: Vec<String> = (0..12).map(|i| format!("r{i:02}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let scale = CategoricalScale::new("region", &domain(&refs), Scheme::Set2);
        assert_eq!(
            scale.color_for(&Value::from("r00")),
            scale.color_for(&Value::from("r08"))
        );
    }

    #[test]
    fn named_colors_parse() {
        assert_eq!(named_color("lightgray"), Some(LIGHT_GRAY));
        assert_eq!(named_color("#4682B4"), Some(STEEL_BLUE));
        assert_eq!(named_color("chartreuse-ish"), None);
    }

    #[test]
    fn sequential_scale_darkens_with_value() {
        let scale = SequentialScale::blues_over([50_000.0, 150_000.0]);
        let low = scale.color_for(50_000.0);
        let high = scale.color_for(150_000.0);
        assert!(high.r() < low.r());
        assert!(high.b() < low.b());
        assert_eq!(scale.normalize(1.0e9), 1.0);
        assert_eq!(scale.normalize(-1.0), 0.0);
    }

    #[test]
    fn generated_palette_is_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        assert_ne!(palette[0], palette[1]);
    }
}
