use markup_shared::location::TextRange;
use std::fmt;

/// The different kinds of lexemes the markup lexer produces. A single vocabulary is shared by the
/// XML, HTML and DTD modes of the lexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<` in front of a start tag name
    StartTagStart,
    /// `</`
    EndTagStart,
    /// `>` closing a tag or a markup declaration
    TagEnd,
    /// `/>`
    EmptyElementEnd,
    Name,
    /// `=` between an attribute name and its value
    Eq,
    /// Opening quote of an attribute value or DTD literal
    AttributeValueStartDelimiter,
    /// Text of an attribute value. In doctype headers this is the complete quoted literal.
    AttributeValueToken,
    /// Closing quote of an attribute value or DTD literal
    AttributeValueEndDelimiter,
    /// Character data in content, CDATA sections and raw text elements
    DataCharacters,
    /// Whitespace in content. This is significant and is part of text nodes.
    RealWhitespace,
    /// Whitespace inside markup. This is the only trivia kind; the parser skips it.
    Whitespace,
    /// `&name;` or `%name;`
    EntityRefToken,
    /// `&#123;` or `&#x7b;`
    CharEntityRef,
    BadCharacter,
    /// `<!--`
    CommentStart,
    CommentCharacters,
    /// `-->`
    CommentEnd,
    /// `<![CDATA[`
    CdataStart,
    /// `]]>` closing a CDATA section
    CdataEnd,
    /// `<?`
    PiStart,
    PiTarget,
    PiCharacters,
    /// `?>`
    PiEnd,
    /// `<!DOCTYPE`
    DoctypeStart,
    /// `>` closing a doctype
    DoctypeEnd,
    /// `PUBLIC`
    DoctypePublic,
    /// `SYSTEM`
    DoctypeSystem,
    /// `[` opening an internal subset or the body of a conditional section
    MarkupStart,
    /// `]` closing an internal subset
    MarkupEnd,
    /// `<!ELEMENT`
    ElementDeclStart,
    /// `<!ATTLIST`
    AttlistDeclStart,
    /// `<!ENTITY`
    EntityDeclStart,
    /// `<!NOTATION`
    NotationDeclStart,
    /// `<![` in a DTD
    ConditionalSectionStart,
    /// `]]>` in a DTD
    ConditionalSectionEnd,
    /// `INCLUDE`
    ConditionalInclude,
    /// `IGNORE`
    ConditionalIgnore,
    LeftParen,
    RightParen,
    Bar,
    Comma,
    Star,
    Plus,
    Question,
    Percent,
    /// `#PCDATA`
    Pcdata,
    /// `EMPTY`
    ContentEmpty,
    /// `ANY`
    ContentAny,
    /// `#IMPLIED`
    AttImplied,
    /// `#REQUIRED`
    AttRequired,
    /// `#FIXED`
    AttFixed,
}

impl TokenKind {
    /// Trivia is skipped by the parser and bound to the surrounding nodes afterwards
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }

    /// Returns true when the token opens a DTD markup declaration
    pub fn is_decl_start(&self) -> bool {
        matches!(
            self,
            TokenKind::ElementDeclStart
                | TokenKind::AttlistDeclStart
                | TokenKind::EntityDeclStart
                | TokenKind::NotationDeclStart
                | TokenKind::ConditionalSectionStart
        )
    }

    /// Keywords of the DTD language that may also be used as plain names in permissive spots
    pub fn is_dtd_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::ContentEmpty
                | TokenKind::ContentAny
                | TokenKind::DoctypePublic
                | TokenKind::DoctypeSystem
                | TokenKind::ConditionalInclude
                | TokenKind::ConditionalIgnore
        )
    }

    /// Repetition operators that may follow a content particle
    pub fn is_repetition(&self) -> bool {
        matches!(self, TokenKind::Star | TokenKind::Plus | TokenKind::Question)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single lexeme: its kind and the byte range it covers in the source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            range: TextRange::new(start, end),
        }
    }

    /// Returns the raw text of this token
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        source.get(self.range.start..self.range.end).unwrap_or("")
    }
}
