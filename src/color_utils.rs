//! Color utility functions for display layers.
//!
//! Layer colors are plain `[r, g, b]` byte triples, written as `#RRGGBB`
//! when shown to or read from the user.

/// Base colors given to the first channels of a multi-channel project.
const BASE_PALETTE: [[u8; 3]; 6] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [0, 255, 255],
    [255, 0, 255],
    [255, 255, 0],
];

/// Golden angle in degrees, spreads generated hues evenly.
const GOLDEN_ANGLE: f32 = 137.507_77;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h = h.rem_euclid(360.0);
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

    (r + m, g + m, b + m)
}

fn unit_to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Color for channel `index`: the base palette first, then generated hues.
pub fn channel_color(index: usize) -> [u8; 3] {
    if let Some(color) = BASE_PALETTE.get(index) {
        return *color;
    }
    let hue = (index - BASE_PALETTE.len()) as f32 * GOLDEN_ANGLE + 30.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.8, 1.0);
    [unit_to_byte(r), unit_to_byte(g), unit_to_byte(b)]
}

/// Format a color as `#RRGGBB`.
pub fn to_hex(color: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

/// Parse `#RRGGBB` (the leading `#` is optional, case-insensitive).
pub fn parse_hex(text: &str) -> Option<[u8; 3]> {
    let digits = text.trim().strip_prefix('#').unwrap_or(text.trim());
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }

    let component = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([component(0)?, component(2)?, component(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_to_rgb_primaries() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01 && g.abs() < 0.01 && b.abs() < 0.01);

        let (r, g, b) = hsv_to_rgb(120.0, 1.0, 1.0);
        assert!(r.abs() < 0.01 && (g - 1.0).abs() < 0.01 && b.abs() < 0.01);

        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01 && g.abs() < 0.01 && (b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_hsv_wraps_hue() {
        assert_eq!(hsv_to_rgb(360.0 + 120.0, 1.0, 1.0), hsv_to_rgb(120.0, 1.0, 1.0));
    }

    #[test]
    fn test_channel_colors() {
        assert_eq!(channel_color(0), [255, 0, 0]);
        assert_eq!(channel_color(5), [255, 255, 0]);

        let generated: Vec<[u8; 3]> = (6..12).map(channel_color).collect();
        for (i, a) in generated.iter().enumerate() {
            assert!(!BASE_PALETTE.contains(a));
            assert!(generated[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(to_hex([255, 0, 128]), "#FF0080");
        assert_eq!(parse_hex("#ff0080"), Some([255, 0, 128]));
        assert_eq!(parse_hex("00FF00"), Some([0, 255, 0]));
        assert_eq!(parse_hex(" #FFFFFF "), Some([255, 255, 255]));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("#FFF"), None);
        assert_eq!(parse_hex("#GGGGGG"), None);
        assert_eq!(parse_hex("#FF00FF00"), None);
        assert_eq!(parse_hex("#ééé"), None);
    }
}
