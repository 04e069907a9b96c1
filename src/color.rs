// Colors as the editors see them: hex strings on the outside, RGB triplets
// inside, and a plain Euclidean distance to decide "close enough".
use std::fmt::{self, Display, Write as _};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest possible RGB distance: sqrt(3 * 255^2).
pub const MAX_RGB_DISTANCE: f64 = 441.67;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let s = hex.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        // from_str_radix alone would take a leading sign ("+f")
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).ok();
        match s.len() {
            6 => Some(Self::new(channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
            3 => {
                // #abc is #aabbcc
                let r = channel(&s[0..1])?;
                let g = channel(&s[1..2])?;
                let b = channel(&s[2..3])?;
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    /// Same as [`Rgb::from_hex`] but reports bad input as a selection error.
    pub fn parse(hex: &str) -> Result<Self> {
        Self::from_hex(hex).ok_or_else(|| Error::Selection(format!("not a hex color: {hex:?}")))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        let mut s = String::with_capacity(7);
        write!(&mut s, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b).ok();
        s
    }

    pub fn distance(self, other: Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Pack as 0x00RRGGBB (the window's pixel format).
    #[inline]
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    #[inline]
    pub fn from_u32(px: u32) -> Self {
        Self::new(((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Convert `"c,m,y,k"` (each 0..100) to `#rrggbb`. Unparseable input gives black.
pub fn cmyk_to_hex(cmyk: &str) -> String {
    let parts: Vec<Option<f64>> = cmyk.split(',').map(|p| p.trim().parse::<f64>().ok()).collect();
    let [Some(c), Some(m), Some(y), Some(k)] = parts[..] else {
        return "#000000".to_string();
    };

    let r = 255.0 * (1.0 - c / 100.0) * (1.0 - k / 100.0);
    let g = 255.0 * (1.0 - m / 100.0) * (1.0 - k / 100.0);
    let b = 255.0 * (1.0 - y / 100.0) * (1.0 - k / 100.0);
    let to_u8 = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r), to_u8(g), to_u8(b)).to_hex()
}

/// Convert a hex color to `"c,m,y,k"` with each channel rounded to 0..100.
/// Unparseable input is treated as black.
pub fn hex_to_cmyk(hex: &str) -> String {
    let rgb = Rgb::from_hex(hex).unwrap_or(Rgb::BLACK);
    if rgb == Rgb::BLACK {
        return "0,0,0,100".to_string();
    }

    let c = 1.0 - rgb.r as f64 / 255.0;
    let m = 1.0 - rgb.g as f64 / 255.0;
    let y = 1.0 - rgb.b as f64 / 255.0;
    let k = c.min(m).min(y);
    let c = (c - k) / (1.0 - k);
    let m = (m - k) / (1.0 - k);
    let y = (y - k) / (1.0 - k);

    [c, m, y, k]
        .iter()
        .map(|v| ((v * 100.0).round() as i64).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Primary,
    Secondary,
}

/// One palette entry. `percent` is advisory; nothing enforces a sum of 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorInfo {
    pub id: String,
    pub hex: String,
    pub category: ColorCategory,
    pub percent: f32,
}

impl ColorInfo {
    pub fn rgb(&self) -> Option<Rgb> {
        Rgb::from_hex(&self.hex)
    }
}

/// True when the palette weights add up to 100 (within half a percent).
/// The UI only warns on `false`.
pub fn palette_is_balanced(palette: &[ColorInfo]) -> bool {
    let total: f32 = palette.iter().map(|c| c.percent).sum();
    (total - 100.0).abs() < 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::from_hex("#00D4AA"), Some(Rgb::new(0x00, 0xD4, 0xAA)));
        assert_eq!(Rgb::from_hex("ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::from_hex("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("none"), None);
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert!(Rgb::parse("red").is_err());
    }

    #[test]
    fn signs_are_not_hex_digits() {
        assert_eq!(Rgb::from_hex("#+f+f+f"), None);
        assert_eq!(Rgb::from_hex("+ff"), None);
        assert_eq!(Rgb::from_hex("#00 d4a"), None);
        assert!(Rgb::parse("#+f+f+f").is_err());
    }

    #[test]
    fn hex_output_is_lowercase() {
        assert_eq!(Rgb::new(0, 0xD4, 0xAA).to_hex(), "#00d4aa");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
    }

    #[test]
    fn distance_spans_black_to_white() {
        let d = Rgb::BLACK.distance(Rgb::WHITE);
        assert!((d - MAX_RGB_DISTANCE).abs() < 0.01);
        assert_eq!(Rgb::WHITE.distance(Rgb::WHITE), 0.0);
    }

    #[test]
    fn cmyk_conversions() {
        assert_eq!(cmyk_to_hex("0,0,0,0"), "#ffffff");
        assert_eq!(cmyk_to_hex("0,100,100,0"), "#ff0000");
        assert_eq!(cmyk_to_hex("oops"), "#000000");
        assert_eq!(hex_to_cmyk("#000000"), "0,0,0,100");
        assert_eq!(hex_to_cmyk("#ff0000"), "0,100,100,0");
        assert_eq!(hex_to_cmyk("#ffffff"), "0,0,0,0");
    }

    #[test]
    fn palette_balance_is_advisory() {
        let entry = |id: &str, percent| ColorInfo {
            id: id.into(),
            hex: "#00d4aa".into(),
            category: ColorCategory::Primary,
            percent,
        };
        assert!(palette_is_balanced(&[entry("a", 60.0), entry("b", 40.0)]));
        assert!(!palette_is_balanced(&[entry("a", 60.0), entry("b", 10.0)]));
    }
}
