//! Color palette for status line segments

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// RGB color, written as `#rrggbb` in config files and i3bar output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from 16-bit per channel components (as X11 and Go's `color.RGBA` use)
    pub const fn from_rgb16(r: u16, g: u16, b: u16) -> Self {
        Self {
            r: (r >> 8) as u8,
            g: (g >> 8) as u8,
            b: (b >> 8) as u8,
        }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ConfigError::InvalidValue(format!(
                "color '{}' must look like #rrggbb",
                s
            )));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                ConfigError::InvalidValue(format!("color '{}' contains non-hex digits", s))
            })
        };

        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Named colors shared by all widgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Accent color (wifi icon)
    pub accent: Color,
    pub red: Color,
    pub green: Color,
    pub blue: Color,
    /// Color for error states such as "No network"
    pub bad: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color::from_rgb16(13621, 33924, 58596),
            red: Color::rgb(0xff, 0, 0),
            green: Color::rgb(0, 0xff, 0),
            blue: Color::rgb(0, 0, 0xff),
            bad: Color::rgb(0xff, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_from_16_bit_components() {
        let palette = Palette::default();
        assert_eq!(palette.accent.to_hex(), "#3584e4");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::from_hex("00ff00").unwrap(), Color::rgb(0, 255, 0));
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_palette_from_toml() {
        let palette: Palette = toml::from_str("accent = \"#112233\"").unwrap();
        assert_eq!(palette.accent, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(palette.bad, Color::rgb(0xff, 0, 0));
    }
}
