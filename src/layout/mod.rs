//! Line layout of a markup tree.
//!
//! The tree is walked once with an explicit style accumulator. Text is split
//! into break tokens (whitespace runs, words and single wide glyphs) which
//! are placed greedily on lines bounded by `max_width`; images flow inline
//! like words.

mod measure;
mod types;

pub use measure::{CellMeasurer, TextMeasurer, is_wide};
pub use types::{
    ImageBox, InlineItem, LinkTarget, Marker, MediaKind, Rect, RenderBlock, RenderLine,
    ResolvedStyle, StyledRun, TapRegion, TapTarget,
};

use crate::document::{MarkupNode, NodeKind, ParsedMarkup, TextAlign};
use crate::perf;

/// Slack for float comparisons against the line width.
const EPSILON: f32 = 0.01;

/// Layout parameters. Lengths are in px unless marked dp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub max_width: f32,
    /// dp to px factor.
    pub density: f32,
    /// dp.
    pub base_font_size: f32,
    /// Multiplier of the font size.
    pub line_height: f32,
    /// dp per nesting level.
    pub list_indent: f32,
    /// dp, used when an image has no usable width/height.
    pub default_image_size: (u32, u32),
    pub max_image_height: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_width: 300.0,
            density: 1.0,
            base_font_size: 16.0,
            line_height: 1.2,
            list_indent: 20.0,
            default_image_size: (100, 100),
            max_image_height: None,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub const fn with_max_width(mut self, max_width: f32) -> Self {
        self.max_width = max_width;
        self
    }

    #[must_use]
    pub const fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub const fn with_base_font_size(mut self, size: f32) -> Self {
        self.base_font_size = size;
        self
    }

    #[must_use]
    pub const fn with_max_image_height(mut self, height: Option<u32>) -> Self {
        self.max_image_height = height;
        self
    }

    /// Convert dp to whole px, rounding half up.
    pub fn dp_to_px(&self, dp: f32) -> u32 {
        (dp * self.density + 0.5) as u32
    }

    /// Replace unusable values with defaults.
    fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            max_width: positive(self.max_width, 1.0),
            density: positive(self.density, defaults.density),
            base_font_size: positive(self.base_font_size, defaults.base_font_size),
            line_height: positive(self.line_height, defaults.line_height),
            list_indent: if self.list_indent.is_finite() {
                self.list_indent.max(0.0)
            } else {
                defaults.list_indent
            },
            ..self
        }
    }
}

/// Lay out a markup tree with the default cell measurer.
pub fn render(root: &MarkupNode, options: &RenderOptions) -> RenderBlock {
    render_with_measurer(root, options, &CellMeasurer)
}

/// Lay out a markup tree, measuring text with `measurer`.
pub fn render_with_measurer(
    root: &MarkupNode,
    options: &RenderOptions,
    measurer: &dyn TextMeasurer,
) -> RenderBlock {
    let _scope = perf::scope("render");
    let options = options.sanitized();
    let ctx = StyleContext::root(&options);
    let mut layout = Layout::new(options, measurer, &ctx);
    layout.walk(root, &ctx);
    layout.finish()
}

impl ParsedMarkup {
    /// Lay out the parsed tree, carrying the parse warnings into the block.
    pub fn render(&self, options: &RenderOptions) -> RenderBlock {
        let mut block = render(&self.root, options);
        block.warnings.clone_from(&self.warnings);
        block
    }
}

/// Style and placement inherited down the tree.
#[derive(Debug, Clone)]
struct StyleContext {
    style: ResolvedStyle,
    link: Option<LinkTarget>,
    align: TextAlign,
    /// Enclosing list count.
    depth: usize,
    /// Content left edge, px.
    indent: f32,
}

impl StyleContext {
    fn root(options: &RenderOptions) -> Self {
        Self {
            style: ResolvedStyle::plain(options.base_font_size * options.density),
            link: None,
            align: TextAlign::Left,
            depth: 0,
            indent: 0.0,
        }
    }

    /// Context for `node`'s content. Innermost declarations win.
    fn enter(&self, node: &MarkupNode, options: &RenderOptions) -> Self {
        let mut ctx = self.clone();
        match node.kind() {
            NodeKind::Bold => ctx.style.bold = true,
            NodeKind::Italic => ctx.style.italic = true,
            NodeKind::Underline => ctx.style.underline = true,
            NodeKind::Strikethrough => ctx.style.strikethrough = true,
            NodeKind::Code => ctx.style.monospace = true,
            NodeKind::Link { href, target } => {
                ctx.link = Some(LinkTarget {
                    href: href.clone(),
                    target: target.clone(),
                });
            }
            NodeKind::List { .. } => ctx.depth += 1,
            _ => {}
        }

        let css = node.css();
        if let Some(color) = css.color {
            ctx.style.color = Some(color);
        }
        if let Some(size) = css.font_size {
            ctx.style.font_size = size.resolve(options.base_font_size) * options.density;
        }
        if let Some(align) = css.text_align {
            ctx.align = align;
        }
        ctx
    }

    fn line_height(&self, options: &RenderOptions) -> f32 {
        self.style.font_size * options.line_height
    }
}

/// The line being filled.
#[derive(Debug, Clone)]
struct PendingLine {
    items: Vec<InlineItem>,
    marker: Option<Marker>,
    indent: f32,
    depth: usize,
    align: TextAlign,
    /// Height used if the line ends up with no content.
    empty_height: f32,
}

impl PendingLine {
    fn new(ctx: &StyleContext, options: &RenderOptions) -> Self {
        Self {
            items: Vec::new(),
            marker: None,
            indent: ctx.indent,
            depth: ctx.depth,
            align: ctx.align,
            empty_height: ctx.line_height(options),
        }
    }

    fn continuation(&self) -> Self {
        Self {
            items: Vec::new(),
            marker: None,
            ..*self
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty() && self.marker.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Space,
    Word,
    Wide,
}

fn is_break_space(ch: char) -> bool {
    ch.is_whitespace() && ch != '\u{a0}'
}

fn classify(ch: char) -> TokenClass {
    if is_break_space(ch) {
        TokenClass::Space
    } else if is_wide(ch) {
        TokenClass::Wide
    } else {
        TokenClass::Word
    }
}

/// Split text at break opportunities: whitespace boundaries and around
/// every wide glyph.
fn break_tokens(text: &str) -> Vec<(&str, TokenClass)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<TokenClass> = None;
    for (idx, ch) in text.char_indices() {
        let class = classify(ch);
        if let Some(prev_class) = prev
            && (prev_class != class || class == TokenClass::Wide)
        {
            out.push((&text[start..idx], prev_class));
            start = idx;
        }
        prev = Some(class);
    }
    if let Some(class) = prev {
        out.push((&text[start..], class));
    }
    out
}

struct Layout<'m> {
    options: RenderOptions,
    measurer: &'m dyn TextMeasurer,
    lines: Vec<RenderLine>,
    current: PendingLine,
    /// Next item's x, px.
    cursor: f32,
    y: f32,
    images: Vec<String>,
    taps: Vec<TapRegion>,
}

impl<'m> Layout<'m> {
    fn new(options: RenderOptions, measurer: &'m dyn TextMeasurer, ctx: &StyleContext) -> Self {
        Self {
            options,
            measurer,
            lines: Vec::new(),
            current: PendingLine::new(ctx, &options),
            cursor: ctx.indent,
            y: 0.0,
            images: Vec::new(),
            taps: Vec::new(),
        }
    }

    fn walk(&mut self, node: &MarkupNode, parent: &StyleContext) {
        let ctx = parent.enter(node, &self.options);
        match node.kind() {
            NodeKind::Text(text) => self.place_text(text, &ctx),
            NodeKind::LineBreak => self.line_break(&ctx),
            NodeKind::Image(attrs) => {
                let index = self.images.len();
                self.images.push(attrs.src.clone());
                let (width, height) = self.media_size(attrs.width, attrs.height);
                self.place_media(ImageBox {
                    src: attrs.src.clone(),
                    title: attrs.title.clone(),
                    media: MediaKind::Image,
                    index: Some(index),
                    x: 0.0,
                    width,
                    height,
                });
            }
            NodeKind::Video { src, poster } => {
                let (width, height) = self.media_size(None, None);
                self.place_media(ImageBox {
                    src: poster.clone().unwrap_or_default(),
                    title: None,
                    media: MediaKind::Video { src: src.clone() },
                    index: None,
                    x: 0.0,
                    width,
                    height,
                });
            }
            NodeKind::ListItem { ordered, index } => {
                let ctx = self.begin_list_item(*ordered, *index, parent, ctx);
                self.walk_children(node, &ctx);
                self.end_block(parent);
            }
            NodeKind::Paragraph | NodeKind::Block | NodeKind::List { .. } => {
                self.begin_block(&ctx);
                self.walk_children(node, &ctx);
                self.end_block(parent);
            }
            NodeKind::Document
            | NodeKind::Bold
            | NodeKind::Italic
            | NodeKind::Underline
            | NodeKind::Strikethrough
            | NodeKind::Code
            | NodeKind::Span
            | NodeKind::Link { .. } => self.walk_children(node, &ctx),
        }
    }

    fn walk_children(&mut self, node: &MarkupNode, ctx: &StyleContext) {
        for child in node.children() {
            self.walk(child, ctx);
        }
    }

    /// Re-point the empty current line at `ctx`'s indent and alignment.
    fn configure(&mut self, ctx: &StyleContext) {
        self.current.indent = ctx.indent;
        self.current.depth = ctx.depth;
        self.current.align = ctx.align;
        self.current.empty_height = ctx.line_height(&self.options);
        self.cursor = ctx.indent;
    }

    fn begin_block(&mut self, ctx: &StyleContext) {
        if !self.current.items.is_empty() {
            self.finish_line();
        }
        self.configure(ctx);
    }

    fn end_block(&mut self, parent: &StyleContext) {
        if !self.current.is_empty() {
            self.finish_line();
        }
        self.configure(parent);
    }

    fn begin_list_item(
        &mut self,
        ordered: bool,
        index: usize,
        parent: &StyleContext,
        mut ctx: StyleContext,
    ) -> StyleContext {
        // A nested item must not steal the enclosing item's marker.
        if !self.current.is_empty() {
            self.finish_line();
        }

        let text = if ordered {
            format!("{index}.")
        } else {
            "•".to_string()
        };
        let width = self.measurer.measure(&text, &ctx.style);
        let gap = self.measurer.measure(" ", &ctx.style);
        let step = self.options.list_indent * self.options.density;
        let max_indent = self.options.max_width * 0.5;
        let marker_x = parent.indent.min(max_indent);
        ctx.indent = (marker_x + (width + gap).max(step)).min(max_indent.max(marker_x));
        ctx.depth = ctx.depth.max(1);

        self.configure(&ctx);
        self.current.marker = Some(Marker {
            text,
            ordered,
            style: ctx.style,
            x: marker_x,
            width,
        });
        ctx
    }

    fn line_break(&mut self, ctx: &StyleContext) {
        if self.current.items.is_empty() {
            self.current.empty_height = ctx.line_height(&self.options);
        }
        self.finish_line();
    }

    fn fits(&self, width: f32) -> bool {
        self.cursor + width <= self.options.max_width + EPSILON
    }

    fn place_text(&mut self, text: &str, ctx: &StyleContext) {
        for (token, class) in break_tokens(text) {
            let width = self.measurer.measure(token, &ctx.style);
            if class == TokenClass::Space {
                // Leading whitespace is dropped; trailing is trimmed later.
                if !self.current.items.is_empty() {
                    self.push_run(token, width, ctx);
                }
                continue;
            }
            if !self.fits(width) && !self.current.items.is_empty() {
                // A word continuing from the previous element has no break
                // before it; move the whole word down instead.
                let glued = class == TokenClass::Word && self.ends_mid_word();
                if !(glued && self.wrap_word()) {
                    self.finish_line();
                }
            }
            if self.fits(width) {
                self.push_run(token, width, ctx);
            } else {
                self.place_by_chars(token, ctx);
            }
        }
    }

    fn ends_mid_word(&self) -> bool {
        matches!(
            self.current.items.last(),
            Some(InlineItem::Run(run))
                if run.text.chars().next_back().is_some_and(|ch| classify(ch) == TokenClass::Word)
        )
    }

    /// Last break opportunity on the current line, as an item index and a
    /// byte offset into that item's run.
    fn last_break(&self) -> Option<(usize, usize)> {
        for (idx, item) in self.current.items.iter().enumerate().rev() {
            match item {
                InlineItem::Image(_) => return Some((idx + 1, 0)),
                InlineItem::Run(run) => {
                    if let Some((pos, ch)) = run
                        .text
                        .char_indices()
                        .rev()
                        .find(|&(_, ch)| classify(ch) != TokenClass::Word)
                    {
                        return Some((idx, pos + ch.len_utf8()));
                    }
                }
            }
        }
        None
    }

    /// Move the word ending the current line, with every run it spans, onto
    /// a new line. Returns false when the line has no earlier break.
    fn wrap_word(&mut self) -> bool {
        let Some((idx, byte)) = self.last_break() else {
            return false;
        };

        let mut carried = Vec::new();
        let mut split = idx;
        if byte > 0
            && let Some(InlineItem::Run(run)) = self.current.items.get_mut(idx)
        {
            if byte < run.text.len() {
                let tail = run.text.split_off(byte);
                run.width = self.measurer.measure(&run.text, &run.style);
                carried.push(InlineItem::Run(StyledRun {
                    width: self.measurer.measure(&tail, &run.style),
                    text: tail,
                    style: run.style,
                    link: run.link.clone(),
                    x: 0.0,
                }));
            }
            split = idx + 1;
        }
        carried.extend(self.current.items.drain(split..));

        self.finish_line();
        for mut item in carried {
            item.shift(self.cursor - item.x());
            self.cursor += item.width();
            self.current.items.push(item);
        }
        true
    }

    /// Break a token wider than a whole line between characters.
    fn place_by_chars(&mut self, token: &str, ctx: &StyleContext) {
        let mut buf = [0u8; 4];
        for ch in token.chars() {
            let width = self.measurer.char_width(ch, &ctx.style);
            if !self.fits(width) && !self.current.items.is_empty() {
                self.finish_line();
            }
            self.push_run(ch.encode_utf8(&mut buf), width, ctx);
        }
    }

    fn push_run(&mut self, text: &str, width: f32, ctx: &StyleContext) {
        if let Some(InlineItem::Run(last)) = self.current.items.last_mut()
            && last.style == ctx.style
            && last.link == ctx.link
        {
            last.text.push_str(text);
            last.width += width;
        } else {
            self.current.items.push(InlineItem::Run(StyledRun {
                text: text.to_string(),
                style: ctx.style,
                link: ctx.link.clone(),
                x: self.cursor,
                width,
            }));
        }
        self.cursor += width;
    }

    /// Box size in px for declared dp dimensions, scaled into the line.
    fn media_size(&self, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
        let (width_dp, height_dp) = match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => self.options.default_image_size,
        };
        let mut width = self.options.dp_to_px(width_dp as f32).max(1);
        let mut height = self.options.dp_to_px(height_dp as f32).max(1);

        let available = (self.options.max_width - self.current.indent).max(1.0);
        if width as f32 > available {
            let scale = available / width as f32;
            width = available as u32;
            height = (height as f32 * scale).round() as u32;
        }
        if let Some(max_height) = self.options.max_image_height
            && height > max_height
        {
            let scale = max_height as f32 / height as f32;
            height = max_height;
            width = (width as f32 * scale).round() as u32;
        }
        (width.max(1), height.max(1))
    }

    fn place_media(&mut self, mut image: ImageBox) {
        let width = image.width as f32;
        if !self.fits(width) && !self.current.items.is_empty() {
            self.finish_line();
        }
        image.x = self.cursor;
        self.cursor += width;
        self.current.items.push(InlineItem::Image(image));
    }

    fn trim_trailing_space(&self, items: &mut Vec<InlineItem>) {
        while let Some(InlineItem::Run(run)) = items.last_mut() {
            let trimmed = run.text.trim_end_matches(is_break_space).len();
            if trimmed == run.text.len() {
                break;
            }
            run.text.truncate(trimmed);
            if run.text.is_empty() {
                items.pop();
            } else {
                run.width = self.measurer.measure(&run.text, &run.style);
                break;
            }
        }
    }

    fn finish_line(&mut self) {
        let next = self.current.continuation();
        let pending = std::mem::replace(&mut self.current, next);
        self.cursor = self.current.indent;

        let PendingLine {
            mut items,
            marker,
            indent,
            depth,
            align,
            empty_height,
        } = pending;
        self.trim_trailing_space(&mut items);

        let line_height = self.options.line_height;
        let content_height = items
            .iter()
            .map(|item| match item {
                InlineItem::Run(run) => run.style.font_size * line_height,
                InlineItem::Image(image) => image.height as f32,
            })
            .chain(marker.iter().map(|m| m.style.font_size * line_height))
            .fold(0.0, f32::max);
        let height = if content_height > 0.0 {
            content_height
        } else {
            empty_height
        };

        let width = items
            .last()
            .map_or(0.0, |item| item.x() + item.width() - indent);
        let available = self.options.max_width - indent;
        let dx = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => ((available - width) / 2.0).max(0.0),
            TextAlign::Right => (available - width).max(0.0),
        };
        if dx > 0.0 {
            for item in &mut items {
                item.shift(dx);
            }
        }

        let y = self.y;
        for item in &items {
            self.collect_tap(item, y, height);
        }

        if perf::is_debug_log_enabled() {
            perf::log_event(
                "layout.line",
                format!(
                    "y={y:.1} height={height:.1} indent={indent:.1} width={width:.1} items={}",
                    items.len()
                ),
            );
        }

        self.lines.push(RenderLine {
            items,
            marker,
            indent,
            depth,
            align,
            y,
            height,
            width,
        });
        self.y += height;
    }

    fn collect_tap(&mut self, item: &InlineItem, line_y: f32, line_height: f32) {
        match item {
            InlineItem::Run(run) => {
                if let Some(link) = &run.link {
                    self.taps.push(TapRegion {
                        rect: Rect {
                            x: run.x,
                            y: line_y,
                            width: run.width,
                            height: line_height,
                        },
                        target: TapTarget::Link {
                            href: link.href.clone(),
                            target: link.target.clone(),
                        },
                    });
                }
            }
            InlineItem::Image(image) => {
                let target = match (&image.media, image.index) {
                    (MediaKind::Video { src }, _) => TapTarget::Video { src: src.clone() },
                    (MediaKind::Image, Some(index)) => TapTarget::Image {
                        index,
                        src: image.src.clone(),
                    },
                    (MediaKind::Image, None) => return,
                };
                let height = image.height as f32;
                self.taps.push(TapRegion {
                    rect: Rect {
                        x: image.x,
                        y: line_y + line_height - height,
                        width: image.width as f32,
                        height,
                    },
                    target,
                });
            }
        }
    }

    fn finish(mut self) -> RenderBlock {
        if !self.current.is_empty() {
            self.finish_line();
        }
        while self.lines.last().is_some_and(RenderLine::is_empty) {
            self.lines.pop();
        }
        let height = self.lines.last().map_or(0.0, |line| line.y + line.height);
        RenderBlock {
            lines: self.lines,
            max_width: self.options.max_width,
            height,
            images: self.images,
            taps: self.taps,
            warnings: Vec::new(),
        }
    }
}
