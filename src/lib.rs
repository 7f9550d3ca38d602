// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference
    clippy::module_name_repetitions
)]

//! # htmltext
//!
//! Rich text from HTML fragments, laid out for a fixed width.
//!
//! htmltext takes the small HTML subset found in user-generated content
//! (paragraphs, inline styles, links, lists, images, inline CSS colors and
//! sizes) and produces lines of styled runs and image boxes:
//! - Lenient parsing that repairs broken markup instead of failing
//! - Greedy line wrapping with CJK break opportunities
//! - List markers with hanging indents
//! - Tappable regions for links, images and videos
//!
//! ## Pipeline
//!
//! ```text
//! markup ──parse──▶ MarkupNode tree ──render──▶ RenderBlock
//! ```
//!
//! ## Modules
//!
//! - [`document`]: Tokenizing and tree building
//! - [`layout`]: Style resolution and line layout
//! - [`diagnostics`]: Recovered problems
//! - [`config`]: Flag files for the command-line tool
//! - [`perf`]: Timing and layout tracing

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod layout;
pub mod perf;

use document::parse;
use layout::{RenderBlock, RenderOptions};

/// Parse `markup` and lay it out, keeping the parse warnings on the block.
///
/// ```
/// use htmltext::{render_html, layout::RenderOptions};
///
/// let block = render_html("<p><b>hello</b> world</p>", &RenderOptions::default());
/// assert_eq!(block.plain_text(), "hello world");
/// ```
pub fn render_html(markup: &str, options: &RenderOptions) -> RenderBlock {
    parse(markup).render(options)
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diagnostics::Warning;
    pub use crate::document::{MarkupNode, NodeKind, ParseOptions, ParsedMarkup, parse};
    pub use crate::layout::{
        RenderBlock, RenderOptions, TapTarget, TextMeasurer, render, render_with_measurer,
    };
    pub use crate::render_html;
}
