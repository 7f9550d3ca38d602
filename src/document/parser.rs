//! Markup tree construction.
//!
//! Tokens from the lexer are folded into a [`MarkupNode`] tree with an
//! explicit open-element stack. Malformed structure is repaired rather than
//! rejected: mismatched close tags pop intervening elements, stray close
//! tags are ignored and anything still open at the end is closed.

use super::css::{parse_color, parse_dimension, parse_font_size_attr, parse_inline_style};
use super::lexer::{Token, tokenize};
use super::types::{ImageAttrs, InlineCss, MarkupNode, NodeKind, ParsedMarkup, TextAlign};
use crate::diagnostics::Warning;

/// Options controlling how text is normalized while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat a literal newline in text as a line break instead of
    /// collapsible whitespace.
    pub newline_as_break: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            newline_as_break: true,
        }
    }
}

/// Element names the parser understands, after alias folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    P,
    Div,
    Center,
    B,
    I,
    U,
    S,
    Code,
    Span,
    Font,
    A,
    Ol,
    Ul,
    Li,
    Img,
    Br,
    Video,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "p" => Self::P,
            "div" => Self::Div,
            "center" => Self::Center,
            "b" | "strong" => Self::B,
            "i" | "em" => Self::I,
            "u" | "ins" => Self::U,
            "s" | "strike" | "del" => Self::S,
            "code" | "tt" => Self::Code,
            "span" => Self::Span,
            "font" => Self::Font,
            "a" => Self::A,
            "ol" => Self::Ol,
            "ul" => Self::Ul,
            "li" => Self::Li,
            "img" => Self::Img,
            "br" => Self::Br,
            "video" => Self::Video,
            _ => return None,
        })
    }

    const fn is_void(self) -> bool {
        matches!(self, Self::Img | Self::Br)
    }

    const fn is_list(self) -> bool {
        matches!(self, Self::Ol | Self::Ul)
    }
}

#[derive(Debug)]
struct OpenElement {
    /// Name as written, so `</strong>` only closes `<strong>`.
    name: String,
    tag: Option<Tag>,
    node: MarkupNode,
    /// Items seen so far, for `ol`/`ul`.
    item_count: usize,
}

struct TreeBuilder {
    stack: Vec<OpenElement>,
    warnings: Vec<Warning>,
    options: ParseOptions,
    /// Whether a following space would be redundant (line start or after a
    /// space).
    suppress_space: bool,
}

/// Parse markup into a tree with default options.
pub fn parse(markup: &str) -> ParsedMarkup {
    parse_with_options(markup, &ParseOptions::default())
}

/// Parse markup into a tree.
pub fn parse_with_options(markup: &str, options: &ParseOptions) -> ParsedMarkup {
    let _scope = crate::perf::scope("parse");
    let (tokens, lex_warnings) = tokenize(markup);
    let mut builder = TreeBuilder::new(*options, lex_warnings);
    for token in tokens {
        builder.feed(token);
    }
    let parsed = builder.finish(markup.len());
    for warning in &parsed.warnings {
        tracing::debug!(%warning, "recovered while parsing markup");
    }
    parsed
}

impl TreeBuilder {
    fn new(options: ParseOptions, warnings: Vec<Warning>) -> Self {
        Self {
            stack: vec![OpenElement {
                name: String::new(),
                tag: None,
                node: MarkupNode::document(),
                item_count: 0,
            }],
            warnings,
            options,
            suppress_space: true,
        }
    }

    fn feed(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.push_text(&text),
            Token::Open {
                name,
                attrs,
                self_closing,
                offset,
            } => self.open(name, &attrs, self_closing, offset),
            Token::Close { name, offset } => self.close(&name, offset),
        }
    }

    fn top_mut(&mut self) -> &mut MarkupNode {
        let last = self.stack.len() - 1;
        &mut self.stack[last].node
    }

    fn append(&mut self, node: MarkupNode) {
        self.top_mut().push(node);
    }

    fn push_text(&mut self, text: &str) {
        if self.options.newline_as_break {
            for (idx, segment) in text.split('\n').enumerate() {
                if idx > 0 {
                    self.append(MarkupNode::new(NodeKind::LineBreak));
                    self.suppress_space = true;
                }
                self.push_collapsed(segment);
            }
        } else {
            self.push_collapsed(text);
        }
    }

    fn push_collapsed(&mut self, text: &str) {
        let mut out = String::with_capacity(text.len());
        let mut in_space = self.suppress_space;
        for ch in text.chars() {
            if is_collapsible_space(ch) {
                if !in_space {
                    out.push(' ');
                    in_space = true;
                }
            } else {
                out.push(ch);
                in_space = false;
            }
        }
        if out.is_empty() {
            return;
        }
        self.suppress_space = in_space;
        self.append(MarkupNode::text(out));
    }

    fn open(&mut self, name: String, attrs: &[(String, String)], self_closing: bool, offset: usize) {
        let Some(tag) = Tag::from_name(&name) else {
            return;
        };

        match tag {
            Tag::Li => self.close_open_item(offset),
            Tag::P => self.close_open_paragraph(offset),
            _ => {}
        }

        let kind = self.node_kind(tag, attrs);
        let css = self.element_css(tag, attrs);
        let node = MarkupNode::new(kind).with_css(css);

        if node.kind().is_block() || matches!(tag, Tag::Br) {
            self.suppress_space = true;
        } else if matches!(tag, Tag::Img | Tag::Video) {
            // Media is inline content; a space after it is significant.
            self.suppress_space = false;
        }

        if tag.is_void() {
            self.append(node);
            return;
        }
        if self_closing {
            // `<p/>` and friends: an empty element.
            self.append(node);
            return;
        }

        self.stack.push(OpenElement {
            name,
            tag: Some(tag),
            node,
            item_count: 0,
        });
    }

    fn node_kind(&mut self, tag: Tag, attrs: &[(String, String)]) -> NodeKind {
        match tag {
            Tag::P => NodeKind::Paragraph,
            Tag::Div | Tag::Center => NodeKind::Block,
            Tag::B => NodeKind::Bold,
            Tag::I => NodeKind::Italic,
            Tag::U => NodeKind::Underline,
            Tag::S => NodeKind::Strikethrough,
            Tag::Code => NodeKind::Code,
            Tag::Span | Tag::Font => NodeKind::Span,
            Tag::A => NodeKind::Link {
                href: attr(attrs, "href").map(ToString::to_string),
                target: attr(attrs, "target").map(ToString::to_string),
            },
            Tag::Ol => NodeKind::List { ordered: true },
            Tag::Ul => NodeKind::List { ordered: false },
            Tag::Li => self.next_list_item(),
            Tag::Img => NodeKind::Image(self.image_attrs(attrs)),
            Tag::Br => NodeKind::LineBreak,
            Tag::Video => NodeKind::Video {
                src: attr(attrs, "src").map(ToString::to_string),
                poster: attr(attrs, "poster")
                    .filter(|p| !p.is_empty())
                    .map(ToString::to_string),
            },
        }
    }

    /// Number the next item of the innermost open list. Each list keeps its
    /// own counter, so sibling and nested lists restart at 1.
    fn next_list_item(&mut self) -> NodeKind {
        let list = self
            .stack
            .iter_mut()
            .rev()
            .find(|open| open.tag.is_some_and(Tag::is_list));
        match list {
            Some(open) => {
                open.item_count += 1;
                NodeKind::ListItem {
                    ordered: open.tag == Some(Tag::Ol),
                    index: open.item_count,
                }
            }
            None => NodeKind::ListItem {
                ordered: false,
                index: 1,
            },
        }
    }

    fn image_attrs(&mut self, attrs: &[(String, String)]) -> ImageAttrs {
        let mut dimension = |name: &str| {
            let value = attr(attrs, name)?;
            let parsed = parse_dimension(value);
            if parsed.is_none() {
                self.warnings.push(Warning::image_dimension(name, value));
            }
            parsed
        };
        let width = dimension("width");
        let height = dimension("height");
        ImageAttrs {
            src: attr(attrs, "src").unwrap_or_default().to_string(),
            width,
            height,
            title: attr(attrs, "title").map(ToString::to_string),
        }
    }

    fn element_css(&mut self, tag: Tag, attrs: &[(String, String)]) -> InlineCss {
        let mut css = InlineCss::default();
        if tag == Tag::Center {
            css.text_align = Some(TextAlign::Center);
        }
        if tag == Tag::Font {
            if let Some(value) = attr(attrs, "color") {
                match parse_color(value) {
                    Some(color) => css.color = Some(color),
                    None => self.warnings.push(Warning::unsupported("color", value)),
                }
            }
            if let Some(value) = attr(attrs, "size") {
                match parse_font_size_attr(value) {
                    Some(size) => css.font_size = Some(size),
                    None => self.warnings.push(Warning::unsupported("size", value)),
                }
            }
        }
        if let Some(style) = attr(attrs, "style") {
            css = css.overlay(parse_inline_style(style, &mut self.warnings));
        }
        css
    }

    /// `<li>` while an item of the same list is open closes that item.
    fn close_open_item(&mut self, offset: usize) {
        let position = self
            .stack
            .iter()
            .rposition(|open| matches!(open.tag, Some(Tag::Li | Tag::Ol | Tag::Ul)));
        if let Some(idx) = position
            && self.stack[idx].tag == Some(Tag::Li)
        {
            self.pop_to(idx, offset, "<li> opened inside an open <li>");
        }
    }

    /// `<p>` inside an open `<p>` closes the outer paragraph.
    fn close_open_paragraph(&mut self, offset: usize) {
        let position = self
            .stack
            .iter()
            .rposition(|open| matches!(open.tag, Some(Tag::P | Tag::Li | Tag::Div)));
        if let Some(idx) = position
            && self.stack[idx].tag == Some(Tag::P)
        {
            self.pop_to(idx, offset, "<p> opened inside an open <p>");
        }
    }

    fn close(&mut self, name: &str, offset: usize) {
        let Some(tag) = Tag::from_name(name) else {
            return;
        };
        if tag.is_void() {
            return;
        }

        let position = self
            .stack
            .iter()
            .skip(1)
            .rposition(|open| open.name == name)
            .map(|idx| idx + 1);
        let Some(idx) = position else {
            self.warnings
                .push(Warning::malformed(offset, format!("stray </{name}> ignored")));
            return;
        };

        while self.stack.len() > idx + 1 {
            let inner = self.stack.last().map(|open| open.name.clone()).unwrap_or_default();
            self.warnings.push(Warning::malformed(
                offset,
                format!("<{inner}> implicitly closed by </{name}>"),
            ));
            self.pop_one();
        }
        self.pop_one();
    }

    /// Close the element at `idx` and everything above it.
    fn pop_to(&mut self, idx: usize, offset: usize, reason: &str) {
        self.warnings.push(Warning::malformed(offset, reason));
        while self.stack.len() > idx {
            self.pop_one();
        }
    }

    fn pop_one(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(open) = self.stack.pop() {
            if open.node.kind().is_block() {
                self.suppress_space = true;
            }
            self.append(open.node);
        }
    }

    fn finish(mut self, end: usize) -> ParsedMarkup {
        while self.stack.len() > 1 {
            let name = self.stack.last().map(|open| open.name.clone()).unwrap_or_default();
            self.warnings
                .push(Warning::malformed(end, format!("unclosed <{name}> at end of input")));
            self.pop_one();
        }
        let root = self
            .stack
            .pop()
            .map_or_else(MarkupNode::document, |open| open.node);
        ParsedMarkup {
            root,
            warnings: self.warnings,
        }
    }
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

const fn is_collapsible_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{0C}')
}
