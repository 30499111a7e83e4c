// src/colour.rs
use eframe::egui::Color32;
use once_cell::sync::Lazy;

/// Peak-to-peak value (uV) that maps to the top of the colour scale.
pub const ACTIVITY_SCALE: f32 = 200.0;

// cell states outside the activity scale
pub const INACTIVE_COLOUR: Color32 = Color32::BLACK;
pub const IDLE_COLOUR: Color32 = Color32::from_rgb(128, 128, 128);
pub const BACKGROUND_COLOUR: Color32 = Color32::from_rgb(64, 64, 64);

const LUT_SIZE: usize = 256;

// dark -> bright, roughly inferno
const KEY_COLOURS: [(f32, [u8; 3]); 6] = [
    (0.0, [0, 0, 4]),
    (0.2, [50, 10, 94]),
    (0.4, [120, 28, 109]),
    (0.6, [188, 55, 84]),
    (0.8, [245, 125, 21]),
    (1.0, [252, 255, 164]),
];

static LOOKUP: Lazy<Vec<Color32>> = Lazy::new(|| {
    (0..LUT_SIZE)
        .map(|i| interpolate(i as f32 / (LUT_SIZE - 1) as f32))
        .collect()
});

fn interpolate(t: f32) -> Color32 {
    for pair in KEY_COLOURS.windows(2) {
        let (lo, lo_rgb) = pair[0];
        let (hi, hi_rgb) = pair[1];
        if t <= hi {
            let f = (t - lo) / (hi - lo);
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return Color32::from_rgb(
                mix(lo_rgb[0], hi_rgb[0]),
                mix(lo_rgb[1], hi_rgb[1]),
                mix(lo_rgb[2], hi_rgb[2]),
            );
        }
    }
    let [r, g, b] = KEY_COLOURS[KEY_COLOURS.len() - 1].1;
    Color32::from_rgb(r, g, b)
}

pub struct ColourScheme;

impl ColourScheme {
    /// Expects `0.0..=1.0`; anything outside (NaN included) is clamped instead of rejected.
    pub fn colour_for_normalized_value(value: f32) -> Color32 {
        let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let index = (clamped * (LUT_SIZE - 1) as f32).round() as usize;
        LOOKUP[index.min(LUT_SIZE - 1)]
    }

    pub fn colour_for_activity(peak_to_peak: f32, scale: f32) -> Color32 {
        Self::colour_for_normalized_value(peak_to_peak / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_key_colours() {
        assert_eq!(ColourScheme::colour_for_normalized_value(0.0), Color32::from_rgb(0, 0, 4));
        assert_eq!(ColourScheme::colour_for_normalized_value(1.0), Color32::from_rgb(252, 255, 164));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let low = ColourScheme::colour_for_normalized_value(0.0);
        let high = ColourScheme::colour_for_normalized_value(1.0);
        assert_eq!(ColourScheme::colour_for_normalized_value(-3.0), low);
        assert_eq!(ColourScheme::colour_for_normalized_value(f32::NAN), low);
        assert_eq!(ColourScheme::colour_for_normalized_value(7.5), high);
        assert_eq!(ColourScheme::colour_for_normalized_value(f32::INFINITY), high);
    }

    #[test]
    fn activity_is_normalized_by_scale() {
        assert_eq!(
            ColourScheme::colour_for_activity(100.0, ACTIVITY_SCALE),
            ColourScheme::colour_for_normalized_value(0.5)
        );
        assert_eq!(
            ColourScheme::colour_for_activity(400.0, ACTIVITY_SCALE),
            ColourScheme::colour_for_normalized_value(1.0)
        );
    }

    #[test]
    fn scale_gets_brighter() {
        let brightness = |v: f32| {
            let c = ColourScheme::colour_for_normalized_value(v);
            c.r() as u32 + c.g() as u32 + c.b() as u32
        };
        let samples: Vec<u32> = (0..=10).map(|i| brightness(i as f32 / 10.0)).collect();
        assert!(samples.windows(2).all(|w| w[0] <= w[1]), "{samples:?}");
    }
}
