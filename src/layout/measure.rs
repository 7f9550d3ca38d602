//! Text measurement.

use unicode_width::UnicodeWidthChar;

use super::types::ResolvedStyle;

/// Measures text advance widths in px.
///
/// Layout never touches fonts directly; hosts with real font metrics plug
/// in their own implementation.
pub trait TextMeasurer {
    /// Advance width of a single character.
    fn char_width(&self, ch: char, style: &ResolvedStyle) -> f32;

    fn measure(&self, text: &str, style: &ResolvedStyle) -> f32 {
        text.chars().map(|ch| self.char_width(ch, style)).sum()
    }
}

/// Cell-based measurer: narrow glyphs advance half the font size, wide
/// (East Asian) glyphs a full font size, zero-width glyphs nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasurer;

impl TextMeasurer for CellMeasurer {
    fn char_width(&self, ch: char, style: &ResolvedStyle) -> f32 {
        ch.width().unwrap_or(0) as f32 * style.font_size * 0.5
    }
}

/// Whether a line may break on either side of `ch`.
pub fn is_wide(ch: char) -> bool {
    ch.width() == Some(2)
}
