//! Laid-out output types.

use serde::Serialize;

use crate::diagnostics::Warning;
use crate::document::{Rgba, TextAlign};

/// Fully resolved style of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    /// `None` means the host's default text color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    /// Font size in px.
    pub font_size: f32,
}

impl ResolvedStyle {
    pub const fn plain(font_size: f32) -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            monospace: false,
            color: None,
            font_size,
        }
    }
}

/// Destination of a hyperlink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    pub href: Option<String>,
    pub target: Option<String>,
}

/// Consecutive text sharing one style and link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub style: ResolvedStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkTarget>,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    /// The box shows the poster; `src` is the video itself.
    Video { src: Option<String> },
}

/// An inline image or video box, sized in px.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBox {
    /// Image source, or the poster for videos (empty when there is none).
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub media: MediaKind,
    /// Position in [`RenderBlock::image_sources`]; videos have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub x: f32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InlineItem {
    Run(StyledRun),
    Image(ImageBox),
}

impl InlineItem {
    pub const fn x(&self) -> f32 {
        match self {
            Self::Run(run) => run.x,
            Self::Image(image) => image.x,
        }
    }

    pub fn width(&self) -> f32 {
        match self {
            Self::Run(run) => run.width,
            Self::Image(image) => image.width as f32,
        }
    }

    pub(crate) fn shift(&mut self, dx: f32) {
        match self {
            Self::Run(run) => run.x += dx,
            Self::Image(image) => image.x += dx,
        }
    }
}

/// List marker drawn in the hanging indent of an item's first line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// `"N."` or `"•"`.
    pub text: String,
    pub ordered: bool,
    pub style: ResolvedStyle,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLine {
    pub items: Vec<InlineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Left edge of the content area, in px.
    pub indent: f32,
    /// List nesting depth.
    pub depth: usize,
    pub align: TextAlign,
    pub y: f32,
    pub height: f32,
    /// Extent of the content, before alignment.
    pub width: f32,
}

impl RenderLine {
    pub fn items(&self) -> &[InlineItem] {
        &self.items
    }

    pub fn runs(&self) -> impl Iterator<Item = &StyledRun> {
        self.items.iter().filter_map(|item| match item {
            InlineItem::Run(run) => Some(run),
            InlineItem::Image(_) => None,
        })
    }

    pub const fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.marker.is_none()
    }

    /// Text of the runs on this line.
    pub fn text(&self) -> String {
        self.runs().map(|run| run.text.as_str()).collect()
    }

    /// Right edge of the last item, in px.
    pub fn right(&self) -> f32 {
        self.items
            .last()
            .map_or(self.indent, |item| item.x() + item.width())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// What a tap on a region should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TapTarget {
    Link {
        href: Option<String>,
        target: Option<String>,
    },
    /// Open the gallery of [`RenderBlock::image_sources`] at `index`.
    Image { index: usize, src: String },
    Video { src: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapRegion {
    pub rect: Rect,
    pub target: TapTarget,
}

/// The laid-out result of rendering a markup tree at a fixed width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBlock {
    pub(crate) lines: Vec<RenderLine>,
    pub(crate) max_width: f32,
    pub(crate) height: f32,
    pub(crate) images: Vec<String>,
    pub(crate) taps: Vec<TapRegion>,
    pub(crate) warnings: Vec<Warning>,
}

impl RenderBlock {
    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub const fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Total height of all lines, in px.
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Widest line's right edge, in px.
    pub fn width(&self) -> f32 {
        self.lines
            .iter()
            .filter(|line| !line.items.is_empty())
            .map(RenderLine::right)
            .fold(0.0, f32::max)
    }

    /// Image sources in document order, the gallery that image taps index.
    pub fn image_sources(&self) -> &[String] {
        &self.images
    }

    pub fn tap_regions(&self) -> &[TapRegion] {
        &self.taps
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Target under the point `(x, y)`, if any.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&TapTarget> {
        self.taps
            .iter()
            .find(|region| region.rect.contains(x, y))
            .map(|region| &region.target)
    }

    /// Textual rendering: one line per layout line, list markers in front
    /// and media as bracketed placeholders.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            for _ in 1..line.depth {
                out.push_str("  ");
            }
            if let Some(marker) = &line.marker {
                out.push_str(&marker.text);
                out.push(' ');
            } else if line.depth > 0 {
                out.push_str("  ");
            }
            for item in &line.items {
                match item {
                    InlineItem::Run(run) => out.push_str(&run.text),
                    InlineItem::Image(image) => match &image.media {
                        MediaKind::Image => {
                            out.push_str("[image: ");
                            out.push_str(&image.src);
                            out.push(']');
                        }
                        MediaKind::Video { src } => {
                            out.push_str("[video: ");
                            out.push_str(src.as_deref().unwrap_or_default());
                            out.push(']');
                        }
                    },
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, width: f32) -> InlineItem {
        InlineItem::Run(StyledRun {
            text: text.to_string(),
            style: ResolvedStyle::plain(16.0),
            link: None,
            x,
            width,
        })
    }

    fn line(items: Vec<InlineItem>, y: f32) -> RenderLine {
        RenderLine {
            items,
            marker: None,
            indent: 0.0,
            depth: 0,
            align: TextAlign::Left,
            y,
            height: 19.2,
            width: 0.0,
        }
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect {
            x: 10.0,
            y: 0.0,
            width: 5.0,
            height: 5.0,
        };
        assert!(rect.contains(10.0, 0.0));
        assert!(rect.contains(14.9, 4.9));
        assert!(!rect.contains(15.0, 2.0));
        assert!(!rect.contains(9.9, 2.0));
    }

    #[test]
    fn test_hit_test_returns_first_matching_region() {
        let block = RenderBlock {
            lines: Vec::new(),
            max_width: 100.0,
            height: 0.0,
            images: vec!["a.png".to_string()],
            taps: vec![TapRegion {
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 50.0,
                    height: 20.0,
                },
                target: TapTarget::Image {
                    index: 0,
                    src: "a.png".to_string(),
                },
            }],
            warnings: Vec::new(),
        };
        assert!(matches!(
            block.hit_test(10.0, 10.0),
            Some(TapTarget::Image { index: 0, .. })
        ));
        assert_eq!(block.hit_test(60.0, 10.0), None);
    }

    #[test]
    fn test_width_is_widest_right_edge() {
        let block = RenderBlock {
            lines: vec![
                line(vec![run("ab", 0.0, 16.0)], 0.0),
                line(vec![run("abcd", 0.0, 32.0)], 19.2),
            ],
            max_width: 100.0,
            height: 38.4,
            images: Vec::new(),
            taps: Vec::new(),
            warnings: Vec::new(),
        };
        assert!((block.width() - 32.0).abs() < f32::EPSILON);
        assert_eq!(block.plain_text(), "ab\nabcd");
    }
}
