/// RGB colors and distance shading
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Darken every channel by `percentage` percent.
    ///
    /// Channels are truncated toward zero and never leave `0..=255`, so
    /// percentages above 100 give black and negative ones brighten up to
    /// saturation.
    pub fn darken(self, percentage: f64) -> Self {
        let factor = 1.0 - percentage / 100.0;
        // float-to-int `as` saturates and maps NaN to 0
        let scale = |c: u8| (c as f64 * factor) as u8;
        Self::rgb(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Free-function form of [`Color::darken`].
pub fn darken(color: Color, percentage: f64) -> Color {
    color.darken(percentage)
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}
