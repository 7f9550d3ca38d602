//! Core markup tree types.

use serde::Serialize;

use crate::diagnostics::Warning;

/// RGBA color resolved from a CSS or attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packed `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Horizontal alignment for block content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font size as written in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FontSize {
    /// CSS `font-size: Npx` (device-independent pixels).
    Px(f32),
    /// `<font size=N>` offset from the base font size.
    Step(i32),
}

impl FontSize {
    /// Resolve against the base font size, in dp.
    pub fn resolve(self, base: f32) -> f32 {
        match self {
            Self::Px(px) => px,
            Self::Step(step) => (base + step as f32).max(1.0),
        }
    }
}

/// Inline CSS declarations recognized on an element's `style` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InlineCss {
    pub color: Option<Rgba>,
    pub font_size: Option<FontSize>,
    pub text_align: Option<TextAlign>,
}

impl InlineCss {
    pub const fn is_empty(&self) -> bool {
        self.color.is_none() && self.font_size.is_none() && self.text_align.is_none()
    }

    /// Layer `other` over `self`; declarations present in `other` win.
    #[must_use]
    pub fn overlay(self, other: Self) -> Self {
        Self {
            color: other.color.or(self.color),
            font_size: other.font_size.or(self.font_size),
            text_align: other.text_align.or(self.text_align),
        }
    }
}

/// Attributes of an `<img>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAttrs {
    pub src: String,
    /// Declared width in dp, `None` when absent or not numeric.
    pub width: Option<u32>,
    /// Declared height in dp, `None` when absent or not numeric.
    pub height: Option<u32>,
    pub title: Option<String>,
}

/// Kind of a markup node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Implicit root of every parsed fragment.
    Document,
    Text(String),
    Paragraph,
    /// `div`/`center`: a line-breaking container without paragraph meaning.
    Block,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    /// `code`/`tt`: monospace text.
    Code,
    Span,
    Link {
        href: Option<String>,
        target: Option<String>,
    },
    List {
        ordered: bool,
    },
    ListItem {
        ordered: bool,
        /// 1-based position within the enclosing list.
        index: usize,
    },
    Image(ImageAttrs),
    Video {
        src: Option<String>,
        poster: Option<String>,
    },
    LineBreak,
}

impl NodeKind {
    /// Whether the element starts and ends on its own line.
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Paragraph | Self::Block | Self::List { .. } | Self::ListItem { .. }
        )
    }
}

/// A node in the parsed markup tree. Parents own their children.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupNode {
    kind: NodeKind,
    css: InlineCss,
    children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            css: InlineCss {
                color: None,
                font_size: None,
                text_align: None,
            },
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    pub const fn document() -> Self {
        Self::new(NodeKind::Document)
    }

    #[must_use]
    pub const fn with_css(mut self, css: InlineCss) -> Self {
        self.css = css;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub const fn css(&self) -> &InlineCss {
        &self.css
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Concatenated text of this subtree, line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &MarkupNode, out: &mut String) {
    match node.kind() {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::LineBreak => out.push('\n'),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// Result of parsing markup: the tree plus everything that was repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarkup {
    pub root: MarkupNode,
    pub warnings: Vec<Warning>,
}

impl ParsedMarkup {
    pub const fn root(&self) -> &MarkupNode {
        &self.root
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_css_overlay_prefers_inner_values() {
        let outer = InlineCss {
            color: Some(Rgba::rgb(1, 2, 3)),
            font_size: Some(FontSize::Px(20.0)),
            text_align: None,
        };
        let inner = InlineCss {
            color: Some(Rgba::rgb(9, 9, 9)),
            ..InlineCss::default()
        };
        let merged = outer.overlay(inner);
        assert_eq!(merged.color, Some(Rgba::rgb(9, 9, 9)));
        assert_eq!(merged.font_size, Some(FontSize::Px(20.0)));
    }

    #[test]
    fn test_font_size_step_resolves_against_base() {
        assert!((FontSize::Step(2).resolve(16.0) - 18.0).abs() < f32::EPSILON);
        assert!((FontSize::Px(32.0).resolve(16.0) - 32.0).abs() < f32::EPSILON);
        assert!((FontSize::Step(-40).resolve(16.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rgba_packs_argb() {
        assert_eq!(Rgba::rgb(229, 51, 51).to_argb(), 0xFFE5_3333);
    }

    #[test]
    fn test_plain_text_joins_descendants() {
        let node = MarkupNode::new(NodeKind::Paragraph)
            .with_child(MarkupNode::text("a"))
            .with_child(MarkupNode::new(NodeKind::LineBreak))
            .with_child(MarkupNode::new(NodeKind::Bold).with_child(MarkupNode::text("b")));
        assert_eq!(node.plain_text(), "a\nb");
    }
}
