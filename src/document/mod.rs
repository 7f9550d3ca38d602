//! HTML fragment parsing.
//!
//! This module handles:
//! - Tokenizing markup with a small state machine (`lexer`)
//! - Building a repaired element tree (`parser`)
//! - Reading inline CSS and presentational attributes (`css`)

mod css;
mod lexer;
mod parser;
mod types;

pub use css::{parse_color, parse_px};
pub use lexer::decode_entities;
pub use parser::{ParseOptions, parse, parse_with_options};
pub use types::{
    FontSize, ImageAttrs, InlineCss, MarkupNode, NodeKind, ParsedMarkup, Rgba, TextAlign,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Warning;

    #[test]
    fn test_parse_demo_fragment() {
        let markup = r#"<p><span style="font-size: 32px;"><b>加粗1</b></span></p><p><i>斜体</i> <u>下划线</u></p>"#;
        let parsed = parse(markup);
        assert!(parsed.warnings().is_empty());
        assert_eq!(parsed.root().children().len(), 2);

        let span = &parsed.root().children()[0].children()[0];
        assert_eq!(span.kind(), &NodeKind::Span);
        assert_eq!(span.css().font_size, Some(FontSize::Px(32.0)));
        assert_eq!(parsed.root().children()[1].plain_text(), "斜体 下划线");
    }

    #[test]
    fn test_emoticon_shortcodes_pass_through_as_text() {
        let parsed = parse("[呕吐][哈哈]");
        assert_eq!(parsed.root().plain_text(), "[呕吐][哈哈]");
    }

    #[test]
    fn test_entities_decoded_in_text_and_attributes() {
        let parsed = parse(r#"<a href="/q?a=1&amp;b=2">&lt;tag&gt;</a>"#);
        let link = &parsed.root().children()[0];
        assert_eq!(
            link.kind(),
            &NodeKind::Link {
                href: Some("/q?a=1&b=2".to_string()),
                target: None,
            }
        );
        assert_eq!(link.plain_text(), "<tag>");
    }

    #[test]
    fn test_unterminated_tag_at_end_is_reported() {
        let parsed = parse("text <b class=");
        assert_eq!(parsed.root().plain_text(), "text ");
        assert!(
            parsed
                .warnings()
                .iter()
                .any(|w| matches!(w, Warning::MalformedMarkup { .. }))
        );
    }

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(markup in "[<>/a-z =\"'&;#0-9\n]{0,200}") {
                let _ = parse(&markup);
            }

            #[test]
            fn parse_is_deterministic(markup in "(<[a-z]{1,3}>|</[a-z]{1,3}>|[a-z ]{1,8}){0,30}") {
                prop_assert_eq!(parse(&markup), parse(&markup));
            }

            #[test]
            fn plain_text_keeps_every_word(words in prop::collection::vec("[a-z]{1,8}", 1..20)) {
                let markup = format!("<p><b>{}</b></p>", words.join(" "));
                prop_assert_eq!(parse(&markup).root().plain_text(), words.join(" "));
            }
        }
    }
}
