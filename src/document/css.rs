//! Inline style and presentational attribute values.
//!
//! Only a small CSS subset is understood: `color`, `font-size` in px and
//! `text-align`. Anything else in a `style` attribute is skipped silently;
//! recognized properties with unusable values produce a warning.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{FontSize, InlineCss, Rgba, TextAlign};
use crate::diagnostics::Warning;

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*([\d.]+)\s*)?\)$")
        .expect("valid rgb pattern")
});
static HEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex pattern")
});
static PX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*px$").expect("valid px pattern"));

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0x00, 0x00, 0x00)),
    ("white", Rgba::rgb(0xFF, 0xFF, 0xFF)),
    ("red", Rgba::rgb(0xFF, 0x00, 0x00)),
    ("green", Rgba::rgb(0x00, 0x80, 0x00)),
    ("blue", Rgba::rgb(0x00, 0x00, 0xFF)),
    ("yellow", Rgba::rgb(0xFF, 0xFF, 0x00)),
    ("gray", Rgba::rgb(0x80, 0x80, 0x80)),
    ("grey", Rgba::rgb(0x80, 0x80, 0x80)),
    ("darkgray", Rgba::rgb(0xA9, 0xA9, 0xA9)),
    ("darkgrey", Rgba::rgb(0xA9, 0xA9, 0xA9)),
    ("lightgray", Rgba::rgb(0xD3, 0xD3, 0xD3)),
    ("lightgrey", Rgba::rgb(0xD3, 0xD3, 0xD3)),
    ("silver", Rgba::rgb(0xC0, 0xC0, 0xC0)),
    ("maroon", Rgba::rgb(0x80, 0x00, 0x00)),
    ("purple", Rgba::rgb(0x80, 0x00, 0x80)),
    ("fuchsia", Rgba::rgb(0xFF, 0x00, 0xFF)),
    ("magenta", Rgba::rgb(0xFF, 0x00, 0xFF)),
    ("lime", Rgba::rgb(0x00, 0xFF, 0x00)),
    ("olive", Rgba::rgb(0x80, 0x80, 0x00)),
    ("navy", Rgba::rgb(0x00, 0x00, 0x80)),
    ("teal", Rgba::rgb(0x00, 0x80, 0x80)),
    ("aqua", Rgba::rgb(0x00, 0xFF, 0xFF)),
    ("cyan", Rgba::rgb(0x00, 0xFF, 0xFF)),
    ("orange", Rgba::rgb(0xFF, 0xA5, 0x00)),
];

/// Parse a `style` attribute into the recognized declarations.
pub fn parse_inline_style(style: &str, warnings: &mut Vec<Warning>) -> InlineCss {
    let mut css = InlineCss::default();
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        match property.as_str() {
            "color" => match parse_color(value) {
                Some(color) => css.color = Some(color),
                None => warnings.push(Warning::unsupported("color", value)),
            },
            "font-size" => match parse_px(value) {
                Some(px) => css.font_size = Some(FontSize::Px(px)),
                None => warnings.push(Warning::unsupported("font-size", value)),
            },
            "text-align" => match parse_text_align(value) {
                Some(align) => css.text_align = Some(align),
                None => warnings.push(Warning::unsupported("text-align", value)),
            },
            _ => {}
        }
    }
    css
}

/// Parse a CSS color: `rgb()`, `rgba()`, `#rgb`, `#rrggbb`, `#aarrggbb` or a
/// named color.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim().trim_end_matches("!important").trim();
    let lower = value.to_ascii_lowercase();

    if let Some(caps) = RGB_RE.captures(&lower) {
        let channel = |idx: usize| caps.get(idx)?.as_str().parse::<u8>().ok();
        let (r, g, b) = (channel(1)?, channel(2)?, channel(3)?);
        let a = match caps.get(4) {
            Some(alpha) => {
                let alpha: f32 = alpha.as_str().parse().ok()?;
                (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        return Some(Rgba { r, g, b, a });
    }

    if let Some(caps) = HEX_RE.captures(&lower) {
        return parse_hex(caps.get(1)?.as_str());
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| *color)
}

fn parse_hex(digits: &str) -> Option<Rgba> {
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            let mut expanded = String::with_capacity(6);
            for ch in digits.chars() {
                expanded.push(ch);
                expanded.push(ch);
            }
            parse_hex(&expanded)
        }
        6 => Some(Rgba::rgb(
            byte(&digits[0..2])?,
            byte(&digits[2..4])?,
            byte(&digits[4..6])?,
        )),
        // Android-style #AARRGGBB
        8 => Some(Rgba {
            a: byte(&digits[0..2])?,
            r: byte(&digits[2..4])?,
            g: byte(&digits[4..6])?,
            b: byte(&digits[6..8])?,
        }),
        _ => None,
    }
}

/// Parse `Npx`.
pub fn parse_px(value: &str) -> Option<f32> {
    let lower = value.trim().to_ascii_lowercase();
    let caps = PX_RE.captures(&lower)?;
    let px: f32 = caps.get(1)?.as_str().parse().ok()?;
    (px > 0.0).then_some(px)
}

pub fn parse_text_align(value: &str) -> Option<TextAlign> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" | "start" | "justify" => Some(TextAlign::Left),
        "center" => Some(TextAlign::Center),
        "right" | "end" => Some(TextAlign::Right),
        _ => None,
    }
}

/// Map a `<font size=N>` value (clamped to 1..=7) to a step from the base size.
pub fn parse_font_size_attr(value: &str) -> Option<FontSize> {
    let size: i32 = value.trim().parse().ok()?;
    Some(FontSize::Step(size.clamp(1, 7) - 3))
}

/// Parse an image dimension attribute: a non-negative integer with an
/// optional `px` suffix.
pub fn parse_dimension(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix("px").unwrap_or(trimmed).trim_end();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_color("rgb(229, 51, 51)"), Some(Rgba::rgb(229, 51, 51)));
        assert_eq!(parse_color("  RGB(0,102,0) "), Some(Rgba::rgb(0, 102, 0)));
    }

    #[test]
    fn test_parse_rgba_color_scales_alpha() {
        let color = parse_color("rgba(10, 20, 30, 0.5)").unwrap();
        assert_eq!((color.r, color.g, color.b), (10, 20, 30));
        assert_eq!(color.a, 128);
    }

    #[test]
    fn test_rgb_channel_out_of_range_is_rejected() {
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#fff"), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(parse_color("#E53333"), Some(Rgba::rgb(0xE5, 0x33, 0x33)));
        assert_eq!(
            parse_color("#80ff0000"),
            Some(Rgba {
                r: 255,
                g: 0,
                b: 0,
                a: 0x80
            })
        );
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("Green"), Some(Rgba::rgb(0, 0x80, 0)));
        assert_eq!(parse_color("lightgrey"), Some(Rgba::rgb(0xD3, 0xD3, 0xD3)));
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_inline_style_reads_color_and_size() {
        let mut warnings = Vec::new();
        let css = parse_inline_style("font-size: 32px; color: rgb(0, 0, 0);", &mut warnings);
        assert_eq!(css.color, Some(Rgba::rgb(0, 0, 0)));
        assert_eq!(css.font_size, Some(FontSize::Px(32.0)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inline_style_ignores_unknown_properties() {
        let mut warnings = Vec::new();
        let css = parse_inline_style("margin: 4px; font-weight: bold", &mut warnings);
        assert!(css.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inline_style_warns_on_bad_values() {
        let mut warnings = Vec::new();
        let css = parse_inline_style("color: sparkly; font-size: 2em", &mut warnings);
        assert!(css.is_empty());
        assert_eq!(
            warnings,
            vec![
                Warning::unsupported("color", "sparkly"),
                Warning::unsupported("font-size", "2em"),
            ]
        );
    }

    #[test]
    fn test_inline_style_text_align() {
        let mut warnings = Vec::new();
        let css = parse_inline_style("text-align:center", &mut warnings);
        assert_eq!(css.text_align, Some(TextAlign::Center));
        assert_eq!(parse_text_align("end"), Some(TextAlign::Right));
    }

    #[test]
    fn test_font_size_attr_maps_to_step() {
        assert_eq!(parse_font_size_attr("5"), Some(FontSize::Step(2)));
        assert_eq!(parse_font_size_attr("12"), Some(FontSize::Step(4)));
        assert_eq!(parse_font_size_attr("0"), Some(FontSize::Step(-2)));
        assert_eq!(parse_font_size_attr("big"), None);
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("200"), Some(200));
        assert_eq!(parse_dimension(" 120px "), Some(120));
        assert_eq!(parse_dimension("auto"), None);
        assert_eq!(parse_dimension("-5"), None);
        assert_eq!(parse_dimension("50%"), None);
    }
}
