use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Colours handed out before the cycle repeats.
pub const PALETTE_SIZE: usize = 9;

/// Colour of the source spectrum line.
pub const SOURCE_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
/// Colour of the sample-plane marker and power trace.
pub const SAMPLE_COLOR: Color32 = Color32::from_rgb(0xe8, 0x85, 0xfc);

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
// Element colours
// ---------------------------------------------------------------------------

/// Hands out a colour per added element, cycling through the palette.
#[derive(Debug, Clone)]
pub struct ElementColors {
    palette: Vec<Color32>,
    next: usize,
}

impl Default for ElementColors {
    fn default() -> Self {
        Self {
            palette: generate_palette(PALETTE_SIZE),
            next: 0,
        }
    }
}

impl ElementColors {
    pub fn next_color(&mut self) -> Color32 {
        let color = self.palette[self.next % self.palette.len()];
        self.next += 1;
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let p = generate_palette(PALETTE_SIZE);
        assert_eq!(p.len(), PALETTE_SIZE);
        for i in 0..p.len() {
            for j in i + 1..p.len() {
                assert_ne!(p[i], p[j]);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_element_colors_cycle() {
        let mut colors = ElementColors::default();
        let first: Vec<Color32> = (0..PALETTE_SIZE).map(|_| colors.next_color()).collect();
        assert_eq!(colors.next_color(), first[0]);
        assert_eq!(colors.next_color(), first[1]);
    }
}
