//! Color parsing for the class palette
//!
//! Class colors are persisted as CSS-style hex strings. Supported forms:
//! - 3 digits: RGB (each digit doubled)
//! - 6 digits: RRGGBB
//! - 8 digits: RRGGBBAA
//! - Optional '#' prefix

/// Hex color in RGBA32 format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(u32);

impl HexColor {
    /// Parse a hex color string, returning None for anything that isn't one
    pub fn parse(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let rgba = match hex.len() {
            3 => {
                let value = u32::from_str_radix(hex, 16).ok()?;
                let r = (value >> 8) & 0xF;
                let g = (value >> 4) & 0xF;
                let b = value & 0xF;
                // Expand each nibble (0xA -> 0xAA) and assume full opacity
                ((r * 0x11) << 24) | ((g * 0x11) << 16) | ((b * 0x11) << 8) | 0xFF
            }
            6 => (u32::from_str_radix(hex, 16).ok()? << 8) | 0xFF,
            8 => u32::from_str_radix(hex, 16).ok()?,
            _ => return None,
        };

        Some(Self(rgba))
    }

    /// Canonical `#RRGGBB` form, dropping alpha when fully opaque
    pub fn to_css(self) -> String {
        if self.0 & 0xFF == 0xFF {
            format!("#{:06X}", self.0 >> 8)
        } else {
            format!("#{:08X}", self.0)
        }
    }
}
