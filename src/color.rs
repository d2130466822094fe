use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

/// Heatmap gradient: `0.0` → cool blue, `1.0` → hot red.
///
/// Alpha grows with intensity so sparse cells stay faint.
pub fn heat_color(intensity: f32) -> Color32 {
    let t = intensity.clamp(0.0, 1.0);
    let base = to_color32(Hsl::new(240.0 * (1.0 - t), 0.9, 0.5));
    let alpha = (60.0 + 195.0 * t) as u8;
    Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha)
}

// ---------------------------------------------------------------------------
// Color mapping: species name → Color32
// ---------------------------------------------------------------------------

/// Maps each species to a distinct colour, stable for the whole session.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map from the distinct species (first-seen order).
    pub fn new(species: &[String]) -> Self {
        let palette = generate_palette(species.len());
        let mapping = species.iter().cloned().zip(palette).collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a species. Unknown species are grey.
    pub fn color_for(&self, species: &str) -> Color32 {
        self.mapping.get(species).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_color_map_lookup() {
        let species = vec!["Lantana camara".to_string(), "Mimosa pigra".to_string()];
        let map = ColorMap::new(&species);
        assert_ne!(map.color_for("Lantana camara"), map.color_for("Mimosa pigra"));
        assert_eq!(map.color_for("Pistia stratiotes"), Color32::GRAY);
    }

    #[test]
    fn test_heat_color_ends() {
        let cold = heat_color(0.0);
        let hot = heat_color(1.0);
        assert!(cold.b() > cold.r());
        assert!(hot.r() > hot.b());
        assert_eq!(hot.a(), 255);
        assert_eq!(heat_color(7.0), hot);
    }
}
