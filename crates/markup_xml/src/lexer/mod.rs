//! Markup lexer
//!
//! The lexer turns the source text into a flat vector of tokens before parsing starts. It never
//! fails: anything it cannot make sense of becomes a `BadCharacter` token, so concatenating the
//! text of all tokens always gives back the original source.
pub mod state;
pub mod token;

use crate::lexer::state::{LexerMode, State};
use crate::lexer::token::{Token, TokenKind};

/// HTML elements whose body is lexed as raw character data
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

const DECLARATION_STARTS: [(&str, TokenKind); 4] = [
    ("<!ELEMENT", TokenKind::ElementDeclStart),
    ("<!ATTLIST", TokenKind::AttlistDeclStart),
    ("<!ENTITY", TokenKind::EntityDeclStart),
    ("<!NOTATION", TokenKind::NotationDeclStart),
];

const HASH_KEYWORDS: [(&str, TokenKind); 4] = [
    ("#PCDATA", TokenKind::Pcdata),
    ("#IMPLIED", TokenKind::AttImplied),
    ("#REQUIRED", TokenKind::AttRequired),
    ("#FIXED", TokenKind::AttFixed),
];

/// Lexes the complete source in the given mode
pub fn tokenize(source: &str, mode: LexerMode) -> Vec<Token> {
    Lexer::new(source, mode).tokenize()
}

pub struct Lexer<'src> {
    source: &'src str,
    mode: LexerMode,
    /// Byte offset of the next character to read
    pos: usize,
    state: State,
    tokens: Vec<Token>,
    /// Name of the start tag currently being lexed. Used to switch into raw text in HTML mode.
    last_start_tag: Option<&'src str>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, mode: LexerMode) -> Self {
        Self {
            source,
            mode,
            pos: 0,
            state: mode.initial_state(),
            tokens: Vec::new(),
            last_start_tag: None,
        }
    }

    /// Consumes the lexer and returns all tokens
    pub fn tokenize(mut self) -> Vec<Token> {
        while self.pos < self.source.len() {
            let before = self.pos;
            let before_state = self.state.clone();

            match self.state.clone() {
                State::Content => self.lex_content(),
                State::StartTagName => self.lex_start_tag_name(),
                State::TagAttributes { after_eq } => self.lex_tag_attributes(after_eq),
                State::EndTag => self.lex_end_tag(),
                State::Doctype => self.lex_doctype(),
                State::Dtd { in_subset } => self.lex_dtd(in_subset),
                State::DtdDecl { in_subset } => self.lex_dtd_decl(in_subset),
                State::RawText(name) => self.lex_raw_text(&name),
            }

            // Every round must either consume input or move to another state
            if self.pos == before && self.state == before_state {
                log::trace!("lexer stalled in {:?} at {}", self.state, self.pos);
                self.bump_char();
                self.emit(TokenKind::BadCharacter, before);
            }
        }

        self.tokens
    }

    fn is_html(&self) -> bool {
        self.mode == LexerMode::Html
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn starts_with_ci(&self, s: &str) -> bool {
        self.rest()
            .get(..s.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(s))
    }

    fn bump(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.source.len());
    }

    fn bump_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Pushes a token from `start` up to the current position. Empty tokens are never emitted.
    fn emit(&mut self, kind: TokenKind, start: usize) {
        if self.pos > start {
            self.tokens.push(Token::new(kind, start, self.pos));
        }
    }

    fn lex_whitespace(&mut self, kind: TokenKind) {
        let start = self.pos;
        self.eat_while(is_whitespace);
        self.emit(kind, start);
    }

    fn lex_name(&mut self) -> &'src str {
        let start = self.pos;
        self.eat_while(is_name_char);
        &self.source[start..self.pos]
    }

    fn lex_content(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some('<') if self.is_html() && !self.markup_follows() => {
                self.bump(1);
                self.eat_data();
                self.emit(TokenKind::DataCharacters, start);
            }
            Some('<') => self.lex_markup_start(),
            Some('&') => self.lex_reference(),
            Some(c) if is_whitespace(c) => self.lex_whitespace(TokenKind::RealWhitespace),
            Some(_) => {
                self.eat_data();
                self.emit(TokenKind::DataCharacters, start);
            }
            None => {}
        }
    }

    fn eat_data(&mut self) {
        while let Some(c) = self.peek() {
            if c == '&' || is_whitespace(c) {
                break;
            }
            if c == '<' {
                if self.is_html() && !self.markup_follows() {
                    self.bump(1);
                    continue;
                }
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Returns true when the `<` under the cursor starts markup rather than being a stray character
    fn markup_follows(&self) -> bool {
        matches!(self.peek_nth(1), Some(c) if is_name_start(c) || c == '/' || c == '!' || c == '?')
    }

    fn lex_markup_start(&mut self) {
        let start = self.pos;

        if self.starts_with("<!--") {
            self.lex_comment();
        } else if self.starts_with("<![CDATA[") {
            self.lex_cdata();
        } else if self.starts_with_ci("<!DOCTYPE") {
            self.bump("<!DOCTYPE".len());
            self.emit(TokenKind::DoctypeStart, start);
            self.state = State::Doctype;
        } else if self.starts_with("<?") {
            self.lex_pi();
        } else if self.starts_with("</") {
            self.bump(2);
            self.emit(TokenKind::EndTagStart, start);
            self.state = State::EndTag;
        } else {
            self.bump(1);
            self.emit(TokenKind::StartTagStart, start);
            self.state = State::StartTagName;
        }
    }

    /// Lexes `<!-- ... -->` in one go
    fn lex_comment(&mut self) {
        let start = self.pos;
        self.bump(4);
        self.emit(TokenKind::CommentStart, start);
        self.lex_until("-->", TokenKind::CommentCharacters, TokenKind::CommentEnd);
    }

    /// Lexes `<![CDATA[ ... ]]>` in one go
    fn lex_cdata(&mut self) {
        let start = self.pos;
        self.bump("<![CDATA[".len());
        self.emit(TokenKind::CdataStart, start);
        self.lex_until("]]>", TokenKind::DataCharacters, TokenKind::CdataEnd);
    }

    /// Emits everything up to `terminator` as `body`, then the terminator itself as `end`. Without
    /// a terminator the body runs up to the end of the source.
    fn lex_until(&mut self, terminator: &str, body: TokenKind, end: TokenKind) {
        let start = self.pos;
        match self.rest().find(terminator) {
            Some(idx) => {
                self.bump(idx);
                self.emit(body, start);
                let end_start = self.pos;
                self.bump(terminator.len());
                self.emit(end, end_start);
            }
            None => {
                self.pos = self.source.len();
                self.emit(body, start);
            }
        }
    }

    fn lex_pi(&mut self) {
        let start = self.pos;
        self.bump(2);
        self.emit(TokenKind::PiStart, start);

        let target_start = self.pos;
        let target = match self.peek() {
            Some(c) if is_name_start(c) => self.lex_name(),
            _ => "",
        };
        self.emit(TokenKind::PiTarget, target_start);

        if target.eq_ignore_ascii_case("xml") {
            self.lex_pi_attributes();
        } else {
            if matches!(self.peek(), Some(c) if is_whitespace(c)) {
                self.lex_whitespace(TokenKind::Whitespace);
            }
            self.lex_until("?>", TokenKind::PiCharacters, TokenKind::PiEnd);
        }
    }

    /// Pseudo attributes of an xml declaration: `<?xml version="1.0" encoding="utf-8"?>`
    fn lex_pi_attributes(&mut self) {
        loop {
            let start = self.pos;
            match self.peek() {
                None | Some('<') => return,
                Some(c) if is_whitespace(c) => self.lex_whitespace(TokenKind::Whitespace),
                Some('?') if self.starts_with("?>") => {
                    self.bump(2);
                    self.emit(TokenKind::PiEnd, start);
                    return;
                }
                Some('=') => {
                    self.bump(1);
                    self.emit(TokenKind::Eq, start);
                }
                Some(q @ ('"' | '\'')) => self.lex_quoted(q, true, false),
                Some(c) if is_name_start(c) => {
                    self.lex_name();
                    self.emit(TokenKind::Name, start);
                }
                Some(_) => {
                    self.bump_char();
                    self.emit(TokenKind::BadCharacter, start);
                }
            }
        }
    }

    /// Lexes a quoted value: delimiters, value runs and references. A `<` ends an unterminated value
    /// when `stop_at_lt` is set; `%name;` references are recognized when `dtd` is set.
    fn lex_quoted(&mut self, quote: char, stop_at_lt: bool, dtd: bool) {
        let start = self.pos;
        self.bump(1);
        self.emit(TokenKind::AttributeValueStartDelimiter, start);

        let mut run_start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                self.emit(TokenKind::AttributeValueToken, run_start);
                let end_start = self.pos;
                self.bump(1);
                self.emit(TokenKind::AttributeValueEndDelimiter, end_start);
                return;
            }
            if c == '<' && stop_at_lt {
                break;
            }
            if c == '&' || (c == '%' && dtd && entity_ref_len(self.rest(), '%').is_some()) {
                self.emit(TokenKind::AttributeValueToken, run_start);
                self.lex_reference();
                run_start = self.pos;
                continue;
            }
            self.pos += c.len_utf8();
        }

        self.emit(TokenKind::AttributeValueToken, run_start);
    }

    /// Lexes a reference starting with `&` or `%` under the cursor
    fn lex_reference(&mut self) {
        let start = self.pos;
        let rest = self.rest();

        if let Some(len) = char_ref_len(rest) {
            self.bump(len);
            self.emit(TokenKind::CharEntityRef, start);
        } else if let Some(len) = entity_ref_len(rest, '&').or_else(|| entity_ref_len(rest, '%')) {
            self.bump(len);
            self.emit(TokenKind::EntityRefToken, start);
        } else if rest.starts_with('%') {
            self.bump(1);
            self.emit(TokenKind::Percent, start);
        } else {
            self.bump_char();
            self.emit(TokenKind::BadCharacter, start);
        }
    }

    fn lex_start_tag_name(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_whitespace(c) => self.lex_whitespace(TokenKind::Whitespace),
            Some(c) if is_name_start(c) => {
                let name = self.lex_name();
                self.emit(TokenKind::Name, start);
                self.last_start_tag = Some(name);
                self.state = State::TagAttributes { after_eq: false };
            }
            _ => {
                self.last_start_tag = None;
                self.state = State::TagAttributes { after_eq: false };
            }
        }
    }

    fn lex_tag_attributes(&mut self, after_eq: bool) {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return;
        };

        match c {
            c if is_whitespace(c) => {
                self.lex_whitespace(TokenKind::Whitespace);
                return;
            }
            '>' => {
                self.bump(1);
                self.emit(TokenKind::TagEnd, start);
                self.state = match self.last_start_tag.take() {
                    Some(name) if self.is_html() && is_raw_text_element(name) => {
                        State::RawText(name.to_ascii_lowercase())
                    }
                    _ => State::Content,
                };
                return;
            }
            '/' if self.starts_with("/>") => {
                self.bump(2);
                self.emit(TokenKind::EmptyElementEnd, start);
                self.last_start_tag = None;
                self.state = State::Content;
                return;
            }
            '<' => {
                self.last_start_tag = None;
                self.state = State::Content;
                return;
            }
            '=' => {
                self.bump(1);
                self.emit(TokenKind::Eq, start);
                self.state = State::TagAttributes { after_eq: true };
                return;
            }
            '"' | '\'' => self.lex_quoted(c, true, false),
            '&' => self.lex_reference(),
            _ if after_eq && self.is_html() => {
                self.eat_while(|c| !is_whitespace(c) && c != '>' && c != '<');
                self.emit(TokenKind::AttributeValueToken, start);
            }
            c if is_name_start(c) => {
                self.lex_name();
                self.emit(TokenKind::Name, start);
            }
            _ => {
                self.bump_char();
                self.emit(TokenKind::BadCharacter, start);
            }
        }

        self.state = State::TagAttributes { after_eq: false };
    }

    fn lex_end_tag(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_whitespace(c) => self.lex_whitespace(TokenKind::Whitespace),
            Some(c) if is_name_start(c) => {
                self.lex_name();
                self.emit(TokenKind::Name, start);
            }
            Some('>') => {
                self.bump(1);
                self.emit(TokenKind::TagEnd, start);
                self.state = State::Content;
            }
            Some('<') => self.state = State::Content,
            Some(_) => {
                self.bump_char();
                self.emit(TokenKind::BadCharacter, start);
            }
            None => {}
        }
    }

    fn lex_doctype(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_whitespace(c) => self.lex_whitespace(TokenKind::Whitespace),
            Some(c) if is_name_start(c) => {
                let name = self.lex_name();
                let kind = if name.eq_ignore_ascii_case("PUBLIC") {
                    TokenKind::DoctypePublic
                } else if name.eq_ignore_ascii_case("SYSTEM") {
                    TokenKind::DoctypeSystem
                } else {
                    TokenKind::Name
                };
                self.emit(kind, start);
            }
            Some(q @ ('"' | '\'')) => {
                // Doctype literals are kept as a single token, quotes included
                self.bump(1);
                self.eat_while(|c| c != q && c != '>');
                if self.peek() == Some(q) {
                    self.bump(1);
                }
                self.emit(TokenKind::AttributeValueToken, start);
            }
            Some('[') => {
                self.bump(1);
                self.emit(TokenKind::MarkupStart, start);
                self.state = State::Dtd { in_subset: true };
            }
            Some('>') => {
                self.bump(1);
                self.emit(TokenKind::DoctypeEnd, start);
                self.state = State::Content;
            }
            Some('<') => self.state = State::Content,
            Some(_) => {
                self.bump_char();
                self.emit(TokenKind::BadCharacter, start);
            }
            None => {}
        }
    }

    /// Returns the declaration start token under the cursor, if any
    fn declaration_start(&self) -> Option<(&'static str, TokenKind)> {
        DECLARATION_STARTS
            .iter()
            .find(|(prefix, _)| self.starts_with(prefix))
            .copied()
    }

    fn lex_dtd(&mut self, in_subset: bool) {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return;
        };

        if is_whitespace(c) {
            self.lex_whitespace(TokenKind::Whitespace);
        } else if self.starts_with("<!--") {
            self.lex_comment();
        } else if self.starts_with("<?") {
            self.lex_pi();
        } else if let Some((prefix, kind)) = self.declaration_start() {
            self.bump(prefix.len());
            self.emit(kind, start);
            self.state = State::DtdDecl { in_subset };
        } else if self.starts_with("<![") {
            self.bump(3);
            self.emit(TokenKind::ConditionalSectionStart, start);
            self.state = State::DtdDecl { in_subset };
        } else if self.starts_with("]]>") {
            self.bump(3);
            self.emit(TokenKind::ConditionalSectionEnd, start);
        } else if c == ']' && in_subset {
            self.bump(1);
            self.emit(TokenKind::MarkupEnd, start);
            self.state = State::Doctype;
        } else if c == '>' && in_subset {
            // internal subset that was never closed with `]`
            self.bump(1);
            self.emit(TokenKind::DoctypeEnd, start);
            self.state = State::Content;
        } else if c == '%' || c == '&' {
            self.lex_reference();
        } else if c == '<' || c == '>' || c == ']' {
            self.bump(1);
            self.emit(TokenKind::BadCharacter, start);
        } else {
            self.eat_while(|c| !is_whitespace(c) && !matches!(c, '<' | '>' | '%' | '&' | ']'));
            self.emit(TokenKind::DataCharacters, start);
        }
    }

    fn lex_dtd_decl(&mut self, in_subset: bool) {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return;
        };

        let single = match c {
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '|' => Some(TokenKind::Bar),
            ',' => Some(TokenKind::Comma),
            '*' => Some(TokenKind::Star),
            '+' => Some(TokenKind::Plus),
            '?' => Some(TokenKind::Question),
            _ => None,
        };
        if let Some(kind) = single {
            self.bump(1);
            self.emit(kind, start);
            return;
        }

        if is_whitespace(c) {
            self.lex_whitespace(TokenKind::Whitespace);
        } else if c == '>' {
            self.bump(1);
            self.emit(TokenKind::TagEnd, start);
            self.state = State::Dtd { in_subset };
        } else if self.starts_with("<!--") {
            self.lex_comment();
        } else if let Some((prefix, kind)) = self.declaration_start() {
            self.bump(prefix.len());
            self.emit(kind, start);
        } else if self.starts_with("<![") {
            self.bump(3);
            self.emit(TokenKind::ConditionalSectionStart, start);
        } else if self.starts_with("]]>") {
            self.bump(3);
            self.emit(TokenKind::ConditionalSectionEnd, start);
            self.state = State::Dtd { in_subset };
        } else if c == '[' {
            self.bump(1);
            self.emit(TokenKind::MarkupStart, start);
            self.state = State::Dtd { in_subset };
        } else if c == ']' && in_subset {
            self.bump(1);
            self.emit(TokenKind::MarkupEnd, start);
            self.state = State::Doctype;
        } else if c == '%' || c == '&' {
            self.lex_reference();
        } else if c == '#' {
            match HASH_KEYWORDS.iter().find(|(kw, _)| self.starts_with(kw)) {
                Some((kw, kind)) => {
                    self.bump(kw.len());
                    self.emit(*kind, start);
                }
                None => {
                    self.bump(1);
                    self.emit(TokenKind::BadCharacter, start);
                }
            }
        } else if c == '"' || c == '\'' {
            self.lex_quoted(c, false, true);
        } else if is_name_char(c) {
            let name = self.lex_name();
            let kind = match name {
                "EMPTY" => TokenKind::ContentEmpty,
                "ANY" => TokenKind::ContentAny,
                "PUBLIC" => TokenKind::DoctypePublic,
                "SYSTEM" => TokenKind::DoctypeSystem,
                "INCLUDE" => TokenKind::ConditionalInclude,
                "IGNORE" => TokenKind::ConditionalIgnore,
                _ => TokenKind::Name,
            };
            self.emit(kind, start);
        } else {
            self.bump_char();
            self.emit(TokenKind::BadCharacter, start);
        }
    }

    fn lex_raw_text(&mut self, name: &str) {
        let start = self.pos;
        let end_tag = format!("</{name}");
        let rest = self.rest();

        let end = rest
            .char_indices()
            .filter(|(_, c)| *c == '<')
            .map(|(idx, _)| idx)
            .find(|idx| {
                rest.get(*idx..*idx + end_tag.len())
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(&end_tag))
            })
            .unwrap_or(rest.len());

        self.bump(end);
        self.emit(TokenKind::DataCharacters, start);
        self.state = State::Content;
    }
}

fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| raw.eq_ignore_ascii_case(name))
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

pub(crate) fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_alphanumeric() || c == '-' || c == '.'
}

/// Length of `&#123;` / `&#x7B;` at the start of the given text
fn char_ref_len(text: &str) -> Option<usize> {
    let body = text.strip_prefix("&#")?;
    let (digits, prefix_len) = match body.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 3),
        None => (body, 2),
    };
    let is_hex = prefix_len == 3;

    let count = digits
        .chars()
        .take_while(|c| if is_hex { c.is_ascii_hexdigit() } else { c.is_ascii_digit() })
        .count();
    if count == 0 || !digits[count..].starts_with(';') {
        return None;
    }

    Some(prefix_len + count + 1)
}

/// Length of `&name;` (or `%name;` for the `%` sigil) at the start of the given text
fn entity_ref_len(text: &str, sigil: char) -> Option<usize> {
    let body = text.strip_prefix(sigil)?;
    let first = body.chars().next()?;
    if !is_name_start(first) {
        return None;
    }

    let name_len: usize = body
        .chars()
        .take_while(|c| is_name_char(*c))
        .map(char::len_utf8)
        .sum();
    if !body[name_len..].starts_with(';') {
        return None;
    }

    Some(sigil.len_utf8() + name_len + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use TokenKind::*;

    fn kinds(source: &str, mode: LexerMode) -> Vec<TokenKind> {
        tokenize(source, mode).iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str, mode: LexerMode) -> Vec<String> {
        tokenize(source, mode)
            .iter()
            .map(|t| t.text(source).to_string())
            .collect()
    }

    #[test]
    fn simple_tag() {
        assert_eq!(
            kinds("<a href=\"x\">hi</a>", LexerMode::Xml),
            vec![
                StartTagStart,
                Name,
                Whitespace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                AttributeValueEndDelimiter,
                TagEnd,
                DataCharacters,
                EndTagStart,
                Name,
                TagEnd
            ]
        );
    }

    #[test]
    fn content_references() {
        assert_eq!(
            texts("a &amp; &#169; &x b", LexerMode::Xml),
            vec!["a", " ", "&amp;", " ", "&#169;", " ", "&", "x", " ", "b"]
        );
        assert_eq!(
            kinds("&amp;&#xA9;&", LexerMode::Xml),
            vec![EntityRefToken, CharEntityRef, BadCharacter]
        );
    }

    #[test]
    fn comment_cdata_and_pi() {
        assert_eq!(
            kinds("<!-- c --><![CDATA[<x>]]><?php echo ?>", LexerMode::Xml),
            vec![
                CommentStart,
                CommentCharacters,
                CommentEnd,
                CdataStart,
                DataCharacters,
                CdataEnd,
                PiStart,
                PiTarget,
                Whitespace,
                PiCharacters,
                PiEnd
            ]
        );
    }

    #[test]
    fn xml_declaration_has_pseudo_attributes() {
        assert_eq!(
            kinds("<?xml version='1.0'?>", LexerMode::Xml),
            vec![
                PiStart,
                PiTarget,
                Whitespace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                AttributeValueEndDelimiter,
                PiEnd
            ]
        );
    }

    #[test]
    fn doctype_with_internal_subset() {
        let source = "<!DOCTYPE r PUBLIC \"p\" 's' [<!ELEMENT r EMPTY>]>";
        assert_eq!(
            kinds(source, LexerMode::Xml),
            vec![
                DoctypeStart,
                Whitespace,
                Name,
                Whitespace,
                DoctypePublic,
                Whitespace,
                AttributeValueToken,
                Whitespace,
                AttributeValueToken,
                Whitespace,
                MarkupStart,
                ElementDeclStart,
                Whitespace,
                Name,
                Whitespace,
                ContentEmpty,
                TagEnd,
                MarkupEnd,
                DoctypeEnd
            ]
        );
    }

    #[test]
    fn dtd_declaration_tokens() {
        assert_eq!(
            kinds(
                "<!ATTLIST a b (x|y) #FIXED \"x\" c CDATA #IMPLIED>",
                LexerMode::Dtd
            ),
            vec![
                AttlistDeclStart,
                Whitespace,
                Name,
                Whitespace,
                Name,
                Whitespace,
                LeftParen,
                Name,
                Bar,
                Name,
                RightParen,
                Whitespace,
                AttFixed,
                Whitespace,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                AttributeValueEndDelimiter,
                Whitespace,
                Name,
                Whitespace,
                Name,
                Whitespace,
                AttImplied,
                TagEnd
            ]
        );
    }

    #[test]
    fn parameter_entities() {
        assert_eq!(
            kinds("<!ENTITY % e \"%f;\">%e;", LexerMode::Dtd),
            vec![
                EntityDeclStart,
                Whitespace,
                Percent,
                Whitespace,
                Name,
                Whitespace,
                AttributeValueStartDelimiter,
                EntityRefToken,
                AttributeValueEndDelimiter,
                TagEnd,
                EntityRefToken
            ]
        );
    }

    #[test]
    fn conditional_section() {
        assert_eq!(
            kinds("<![INCLUDE[<!ELEMENT a ANY>]]>", LexerMode::Dtd),
            vec![
                ConditionalSectionStart,
                ConditionalInclude,
                MarkupStart,
                ElementDeclStart,
                Whitespace,
                Name,
                Whitespace,
                ContentAny,
                TagEnd,
                ConditionalSectionEnd
            ]
        );
    }

    #[test]
    fn html_unquoted_values_and_raw_text() {
        assert_eq!(
            texts("<script type=module>a<b</script>", LexerMode::Html),
            vec!["<", "script", " ", "type", "=", "module", ">", "a<b", "</", "script", ">"]
        );
    }

    #[test]
    fn html_keeps_stray_lt_in_text() {
        assert_eq!(
            kinds("a < b", LexerMode::Html),
            vec![
                DataCharacters,
                RealWhitespace,
                DataCharacters,
                RealWhitespace,
                DataCharacters
            ]
        );
        assert_eq!(
            texts("<p>1 <2</p>", LexerMode::Html)[3..6],
            ["1", " ", "<2"]
        );
    }

    #[test]
    fn unterminated_attribute_value_stops_at_tag_start() {
        assert_eq!(
            kinds("<a b=\"c<d/>", LexerMode::Xml),
            vec![
                StartTagStart,
                Name,
                Whitespace,
                Name,
                Eq,
                AttributeValueStartDelimiter,
                AttributeValueToken,
                StartTagStart,
                Name,
                EmptyElementEnd
            ]
        );
    }

    #[test_case("<a><b>text &amp; more</b><!-- x --></a>", LexerMode::Xml ; "xml document")]
    #[test_case("<!DOCTYPE html><p class=x>1 < 2 &copy<br></p>", LexerMode::Html ; "html document")]
    #[test_case("<!ELEMENT a (#PCDATA|b)*> <![IGNORE[ junk ]]> %p; ]>", LexerMode::Dtd ; "dtd file")]
    #[test_case("(a, (b | c)+)? #junk", LexerMode::DtdDeclaration ; "dtd fragment")]
    #[test_case("<a b='x\u{e9}y' \u{2603}>\u{e9}</a>", LexerMode::Xml ; "non ascii")]
    #[test_case("<!-- unterminated", LexerMode::Xml ; "unterminated comment")]
    #[test_case("<?pi", LexerMode::Xml ; "unterminated pi")]
    fn lexing_is_lossless(source: &str, mode: LexerMode) {
        let tokens = tokenize(source, mode);
        let joined: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(joined, source);
        assert!(tokens.iter().all(|t| !t.range.is_empty()));
    }
}
