//! Character-level tokenizer for HTML-like markup.
//!
//! The lexer is a small state machine driven by character class (`<`, `>`,
//! `=`, quotes, whitespace, `/`). It never fails: an unterminated tag at the
//! end of input is dropped and reported as a warning.

use crate::diagnostics::Warning;

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text with entities decoded; whitespace is left as written.
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        offset: usize,
    },
    Close {
        name: String,
        offset: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Between tokens, nothing buffered.
    Outside,
    /// Accumulating text.
    InText,
    /// Reading a tag name or the whitespace between attributes.
    InTag,
    /// Reading an attribute name or value.
    InAttr,
    /// Reading the name of a closing tag.
    Closing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum AttrPhase {
    #[default]
    Name,
    BeforeValue,
    Quoted(char),
    Unquoted,
}

#[derive(Debug, Default)]
struct PendingTag {
    name: String,
    name_done: bool,
    attrs: Vec<(String, String)>,
    attr_name: String,
    attr_value: String,
    phase: AttrPhase,
    self_closing: bool,
    offset: usize,
}

impl PendingTag {
    fn starting_at(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    fn finish_attr(&mut self) {
        if !self.attr_name.is_empty() {
            let name = std::mem::take(&mut self.attr_name);
            let value = decode_entities(&std::mem::take(&mut self.attr_value));
            self.attrs.push((name, value));
        }
        self.attr_value.clear();
        self.phase = AttrPhase::Name;
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    state: LexState,
    text: String,
    tag: PendingTag,
    tokens: Vec<Token>,
    warnings: Vec<Warning>,
}

/// Split markup into tokens, collecting recovered problems.
pub fn tokenize(src: &str) -> (Vec<Token>, Vec<Warning>) {
    let mut lexer = Lexer {
        src,
        pos: 0,
        state: LexState::Outside,
        text: String::new(),
        tag: PendingTag::default(),
        tokens: Vec::new(),
        warnings: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.warnings)
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn run(&mut self) {
        while let Some(ch) = self.peek() {
            match self.state {
                LexState::Outside | LexState::InText => self.lex_text(ch),
                LexState::InTag => self.lex_tag(ch),
                LexState::InAttr => self.lex_attr(ch),
                LexState::Closing => self.lex_closing(ch),
            }
        }
        self.finish();
    }

    fn lex_text(&mut self, ch: char) {
        if ch != '<' {
            self.text.push(ch);
            self.advance(ch);
            self.state = LexState::InText;
            return;
        }

        let rest = self.rest();
        if rest.starts_with("<!--") {
            self.flush_text();
            self.skip_past("-->", "unterminated comment");
            return;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.flush_text();
            self.skip_past(">", "unterminated declaration");
            return;
        }

        let next = rest[1..].chars().next();
        match next {
            Some(next) if next.is_ascii_alphabetic() => {
                self.flush_text();
                self.tag = PendingTag::starting_at(self.pos);
                self.pos += 1;
                self.state = LexState::InTag;
            }
            Some('/') => {
                self.flush_text();
                self.tag = PendingTag::starting_at(self.pos);
                self.pos += 2;
                self.state = LexState::Closing;
            }
            _ => {
                // A bare `<` is literal text.
                self.text.push('<');
                self.pos += 1;
                self.state = LexState::InText;
            }
        }
    }

    fn lex_tag(&mut self, ch: char) {
        match ch {
            '>' => {
                self.advance(ch);
                self.emit_open();
            }
            '/' => {
                self.advance(ch);
                self.tag.name_done = true;
                self.tag.self_closing = true;
            }
            c if c.is_whitespace() => {
                self.advance(c);
                if !self.tag.name.is_empty() {
                    self.tag.name_done = true;
                }
            }
            c if !self.tag.name_done => {
                self.advance(c);
                self.tag.name.push(c.to_ascii_lowercase());
            }
            _ => {
                self.tag.self_closing = false;
                self.tag.phase = AttrPhase::Name;
                self.state = LexState::InAttr;
            }
        }
    }

    fn lex_attr(&mut self, ch: char) {
        match self.tag.phase {
            AttrPhase::Name => match ch {
                '=' => {
                    self.advance(ch);
                    self.tag.phase = AttrPhase::BeforeValue;
                }
                '>' | '/' => {
                    self.tag.finish_attr();
                    self.state = LexState::InTag;
                }
                c if c.is_whitespace() => {
                    self.advance(c);
                    let trimmed = self.rest().trim_start();
                    let is_eq = trimmed.starts_with('=');
                    let skipped = self.rest().len() - trimmed.len();
                    if is_eq {
                        self.pos += skipped;
                    } else {
                        self.tag.finish_attr();
                        self.state = LexState::InTag;
                    }
                }
                c => {
                    self.advance(c);
                    self.tag.attr_name.push(c.to_ascii_lowercase());
                }
            },
            AttrPhase::BeforeValue => match ch {
                '"' | '\'' => {
                    self.advance(ch);
                    self.tag.phase = AttrPhase::Quoted(ch);
                }
                '>' => {
                    self.tag.finish_attr();
                    self.state = LexState::InTag;
                }
                c if c.is_whitespace() => self.advance(c),
                _ => self.tag.phase = AttrPhase::Unquoted,
            },
            AttrPhase::Quoted(quote) => {
                self.advance(ch);
                if ch == quote {
                    self.tag.finish_attr();
                    self.state = LexState::InTag;
                } else {
                    self.tag.attr_value.push(ch);
                }
            }
            AttrPhase::Unquoted => {
                if ch == '>' || ch.is_whitespace() {
                    self.tag.finish_attr();
                    self.state = LexState::InTag;
                } else {
                    self.advance(ch);
                    self.tag.attr_value.push(ch);
                }
            }
        }
    }

    fn lex_closing(&mut self, ch: char) {
        self.advance(ch);
        if ch == '>' {
            let tag = std::mem::take(&mut self.tag);
            self.tokens.push(Token::Close {
                name: tag.name,
                offset: tag.offset,
            });
            self.state = LexState::Outside;
        } else if !ch.is_whitespace() && !self.tag.name_done {
            self.tag.name.push(ch.to_ascii_lowercase());
        } else if !self.tag.name.is_empty() {
            self.tag.name_done = true;
        }
    }

    fn emit_open(&mut self) {
        let tag = std::mem::take(&mut self.tag);
        self.tokens.push(Token::Open {
            name: tag.name,
            attrs: tag.attrs,
            self_closing: tag.self_closing,
            offset: tag.offset,
        });
        self.state = LexState::Outside;
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let raw = std::mem::take(&mut self.text);
            self.tokens.push(Token::Text(decode_entities(&raw)));
        }
        self.state = LexState::Outside;
    }

    fn skip_past(&mut self, terminator: &str, message: &str) {
        let start = self.pos;
        if let Some(idx) = self.rest().find(terminator) {
            self.pos += idx + terminator.len();
        } else {
            self.warnings.push(Warning::malformed(start, message));
            self.pos = self.src.len();
        }
    }

    fn finish(&mut self) {
        match self.state {
            LexState::InTag | LexState::InAttr | LexState::Closing => {
                let tag = std::mem::take(&mut self.tag);
                self.warnings.push(Warning::malformed(
                    tag.offset,
                    format!("unterminated tag <{}> dropped", tag.name),
                ));
                self.state = LexState::Outside;
            }
            LexState::Outside | LexState::InText => self.flush_text(),
        }
    }
}

/// Decode character references. Unknown entities are kept literally.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| decode_entity(&after[..semi]).map(|ch| (ch, semi)));
        if let Some((ch, semi)) = decoded {
            out.push(ch);
            rest = &after[semi + 1..];
        } else {
            out.push('&');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse().ok()?
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "hellip" => Some('…'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "middot" => Some('·'),
        "bull" => Some('•'),
        _ => None,
    }
}
