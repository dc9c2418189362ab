/// These are the states in which the lexer can be in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Character data between tags
    Content,
    /// Directly after `<`, expecting the tag name
    StartTagName,
    /// Inside a start tag header after the name. `after_eq` is set directly after an `=` so the
    /// HTML mode can read unquoted values.
    TagAttributes { after_eq: bool },
    /// Inside `</ ... >`
    EndTag,
    /// Inside `<!DOCTYPE ... >`
    Doctype,
    /// Between markup declarations, either in a DTD file or in a doctype internal subset
    Dtd { in_subset: bool },
    /// Inside a single markup declaration, or the keyword part of a conditional section
    DtdDecl { in_subset: bool },
    /// Raw text body of an HTML `script` or `style` element; holds the element name
    RawText(String),
}

/// Which flavour of input is being lexed, and where lexing starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexerMode {
    /// XML documents
    Xml,
    /// HTML documents: unquoted attribute values, raw text elements, tolerant `<` in text
    Html,
    /// DTD files, starting between declarations
    Dtd,
    /// DTD fragments, starting inside a markup declaration
    DtdDeclaration,
}

impl LexerMode {
    /// Returns the state the lexer starts in for this mode
    pub fn initial_state(&self) -> State {
        match self {
            LexerMode::Xml | LexerMode::Html => State::Content,
            LexerMode::Dtd => State::Dtd { in_subset: false },
            LexerMode::DtdDeclaration => State::DtdDecl { in_subset: false },
        }
    }
}
