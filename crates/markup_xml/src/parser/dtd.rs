use crate::config::DtdContext;
use crate::lexer::token::TokenKind;
use crate::parser::MarkupParser;
use crate::syntax::NodeKind;

/// Token that ends a run of markup declarations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Until {
    /// A standalone DTD runs to the end of the input
    Eof,
    /// `]` of a doctype internal subset
    MarkupEnd,
    /// `]]>` of a conditional section
    SectionEnd,
}

impl MarkupParser<'_> {
    /// Runs the production selected by the context
    pub(crate) fn parse_dtd_context(&mut self, context: DtdContext) {
        log::trace!("parse_dtd_context: {context:?}");

        match context {
            DtdContext::MarkupDecl => self.parse_markup_decls(Until::Eof),
            DtdContext::ElementContentSpec => self.parse_content_spec(),
            DtdContext::AttributeList => self.parse_attlist_content(),
            DtdContext::AttributeValue => self.parse_dtd_attribute_value(),
            DtdContext::AttributeDecl => {
                if self.at(TokenKind::Name) {
                    self.parse_attribute_decl();
                } else {
                    self.error("Name expected");
                }
            }
            DtdContext::EntityDeclContent => self.parse_entity_decl_content(),
            DtdContext::EnumeratedType => {
                if self.at(TokenKind::LeftParen) {
                    self.parse_enumerated_type();
                } else {
                    let enumerated = self.mark();
                    self.parse_enumerated_type_content();
                    enumerated.close_as(&mut self.p, NodeKind::EnumeratedType);
                }
            }
        }
    }

    /// Sequence of declarations, comments, processing instructions, parameter entity references
    /// and conditional sections
    pub(crate) fn parse_markup_decls(&mut self, until: Until) {
        while let Some(kind) = self.token() {
            match kind {
                TokenKind::MarkupEnd | TokenKind::DoctypeEnd if until == Until::MarkupEnd => break,
                TokenKind::ConditionalSectionEnd if until == Until::SectionEnd => break,
                TokenKind::ElementDeclStart => self.parse_element_decl(),
                TokenKind::AttlistDeclStart => self.parse_attlist_decl(),
                TokenKind::EntityDeclStart => self.parse_entity_decl(),
                TokenKind::NotationDeclStart => self.parse_notation_decl(),
                TokenKind::ConditionalSectionStart => self.parse_conditional_section(),
                TokenKind::EntityRefToken => self.parse_entity_ref(),
                TokenKind::CommentStart => self.parse_comment(),
                TokenKind::PiStart => self.parse_processing_instruction(),
                _ => self.error_token("Unexpected token"),
            }
        }
    }

    pub(crate) fn parse_entity_ref(&mut self) {
        let reference = self.mark();
        self.advance();
        reference.close_as(&mut self.p, NodeKind::EntityRef);
    }

    /// Consumes a name or a parameter entity reference standing in for one
    fn parse_name(&mut self) -> bool {
        match self.token() {
            Some(TokenKind::Name) => {
                self.advance();
                true
            }
            Some(TokenKind::EntityRefToken) => {
                self.parse_entity_ref();
                true
            }
            _ => false,
        }
    }

    /// A name, or a group of names and parameter entity references like `(%a;|%b;)`
    fn parse_composite_name(&mut self) -> bool {
        if !self.at(TokenKind::LeftParen) {
            if !self.parse_name() {
                self.error("Name expected");
                return false;
            }
            return true;
        }

        let group = self.mark();
        self.advance();

        loop {
            match self.token() {
                Some(TokenKind::Name) | Some(TokenKind::Bar) | Some(TokenKind::Comma) => {
                    self.advance()
                }
                Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
                _ => break,
            }
        }

        self.expect(TokenKind::RightParen, ") expected");
        group.close_as(&mut self.p, NodeKind::ElementContentGroup);
        true
    }

    /// Skips to the end of the current declaration or the start of the next one. Comments are
    /// kept; anything else skipped is an error.
    fn skip_till_end_of_block(&mut self) {
        while let Some(kind) = self.token() {
            if kind == TokenKind::TagEnd
                || kind.is_decl_start()
                || kind == TokenKind::ConditionalSectionEnd
                || kind == TokenKind::MarkupEnd
            {
                break;
            }

            if kind == TokenKind::CommentStart {
                self.parse_comment();
            } else {
                self.error_token("Unexpected token");
            }
        }
    }

    fn end_declaration(&mut self) {
        self.skip_till_end_of_block();
        self.expect(TokenKind::TagEnd, "> expected");
    }

    /// `<!ELEMENT name content-spec>`
    fn parse_element_decl(&mut self) {
        log::trace!("parse_element_decl");

        let decl = self.mark();
        self.advance();

        if self.parse_composite_name() {
            self.parse_content_spec();
        }
        self.end_declaration();

        decl.close_as(&mut self.p, NodeKind::ElementDecl);
    }

    /// `<!ATTLIST element name type default ...>`
    fn parse_attlist_decl(&mut self) {
        log::trace!("parse_attlist_decl");

        let decl = self.mark();
        self.advance();

        if self.parse_composite_name() {
            self.parse_attlist_content();
        }
        self.end_declaration();

        decl.close_as(&mut self.p, NodeKind::AttlistDecl);
    }

    fn parse_attlist_content(&mut self) {
        loop {
            match self.token() {
                Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
                Some(TokenKind::Name) => self.parse_attribute_decl(),
                _ => break,
            }
        }
    }

    /// `name type default`
    fn parse_attribute_decl(&mut self) {
        let decl = self.mark();
        self.advance();
        self.parse_attribute_content_spec();
        decl.close_as(&mut self.p, NodeKind::AttributeDecl);
    }

    fn parse_attribute_content_spec(&mut self) {
        match self.token() {
            Some(TokenKind::LeftParen) => self.parse_enumerated_type(),
            Some(TokenKind::Name) => {
                let is_notation = self.token_text() == "NOTATION";
                self.advance();
                if is_notation && self.at(TokenKind::LeftParen) {
                    self.parse_enumerated_type();
                }
            }
            Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
            _ => self.error("Attribute type expected"),
        }

        match self.token() {
            Some(TokenKind::AttImplied) | Some(TokenKind::AttRequired) => self.advance(),
            Some(TokenKind::AttFixed) => {
                self.advance();
                if self.at(TokenKind::AttributeValueStartDelimiter) {
                    self.parse_literal();
                } else {
                    self.error("Attribute value expected");
                }
            }
            Some(TokenKind::AttributeValueStartDelimiter) => self.parse_literal(),
            Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
            _ => self.error("Attribute default value expected"),
        }
    }

    /// `(a|b|c)` of an attribute type
    fn parse_enumerated_type(&mut self) {
        let enumerated = self.mark();
        self.advance();

        self.parse_enumerated_type_content();
        self.expect(TokenKind::RightParen, ") expected");

        enumerated.close_as(&mut self.p, NodeKind::EnumeratedType);
    }

    /// Names separated by `|`. Keywords are plain names here.
    fn parse_enumerated_type_content(&mut self) {
        loop {
            match self.token() {
                Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
                Some(TokenKind::Name) | Some(TokenKind::Bar) => self.advance(),
                Some(kind) if kind.is_dtd_keyword() => {
                    self.p.remap_current_token(TokenKind::Name);
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Quoted literal of an attribute default or entity value
    fn parse_literal(&mut self) {
        let literal = self.mark();
        self.advance();

        loop {
            match self.token() {
                None
                | Some(TokenKind::AttributeValueEndDelimiter)
                | Some(TokenKind::TagEnd) => break,
                Some(TokenKind::EntityRefToken) => self.parse_entity_ref(),
                Some(_) => self.advance(),
            }
        }

        self.expect(
            TokenKind::AttributeValueEndDelimiter,
            "Attribute value is not closed",
        );
        literal.close_as(&mut self.p, NodeKind::AttributeValue);
    }

    /// A default value on its own: a quoted literal, or the complete input as the value
    fn parse_dtd_attribute_value(&mut self) {
        if self.at(TokenKind::AttributeValueStartDelimiter) {
            self.parse_literal();
            return;
        }

        let value = self.mark();
        while let Some(kind) = self.token() {
            if kind == TokenKind::EntityRefToken {
                self.parse_entity_ref();
            } else {
                self.advance();
            }
        }
        value.close_as(&mut self.p, NodeKind::AttributeValue);
    }

    /// `<!ENTITY [%] name value>`
    fn parse_entity_decl(&mut self) {
        log::trace!("parse_entity_decl");

        let decl = self.mark();
        self.advance();

        self.eat(TokenKind::Percent);
        if self.parse_composite_name() {
            self.parse_entity_decl_content();
        }
        self.end_declaration();

        decl.close_as(&mut self.p, NodeKind::EntityDecl);
    }

    /// A literal value, or an external id with an optional `NDATA name`
    fn parse_entity_decl_content(&mut self) {
        let content = self.mark();

        match self.token() {
            Some(TokenKind::AttributeValueStartDelimiter) => self.parse_literal(),
            Some(TokenKind::DoctypePublic) | Some(TokenKind::DoctypeSystem) => {
                self.parse_external_id(true);
                if self.at(TokenKind::Name) && self.token_text() == "NDATA" {
                    self.advance();
                    if !self.eat(TokenKind::Name) {
                        self.error("Name expected");
                    }
                }
            }
            _ => {
                content.drop(&mut self.p);
                self.error("Literal, PUBLIC or SYSTEM expected");
                return;
            }
        }

        content.close_as(&mut self.p, NodeKind::EntityDeclContent);
    }

    /// `PUBLIC "pub" "sys"` or `SYSTEM "sys"`. Notations may leave out the system literal after
    /// `PUBLIC`.
    fn parse_external_id(&mut self, system_required: bool) {
        let is_public = self.at(TokenKind::DoctypePublic);
        self.advance();

        if !self.at(TokenKind::AttributeValueStartDelimiter) {
            self.error("Literal expected");
            return;
        }
        self.parse_literal();

        if is_public {
            if self.at(TokenKind::AttributeValueStartDelimiter) {
                self.parse_literal();
            } else if system_required {
                self.error("Literal expected");
            }
        }
    }

    /// `<!NOTATION name PUBLIC "pub" ["sys"]>`
    fn parse_notation_decl(&mut self) {
        log::trace!("parse_notation_decl");

        let decl = self.mark();
        self.advance();

        if self.parse_name() {
            if matches!(
                self.token(),
                Some(TokenKind::DoctypePublic) | Some(TokenKind::DoctypeSystem)
            ) {
                self.parse_external_id(false);
            } else {
                self.error("PUBLIC or SYSTEM expected");
            }
        } else {
            self.error("Name expected");
        }
        self.end_declaration();

        decl.close_as(&mut self.p, NodeKind::NotationDecl);
    }

    /// `<![INCLUDE[ ... ]]>`, `<![IGNORE[ ... ]]>` or `<![%flag;[ ... ]]>`
    fn parse_conditional_section(&mut self) {
        log::trace!("parse_conditional_section");

        let section = self.mark();
        self.advance();

        let ignore = match self.token() {
            Some(TokenKind::ConditionalInclude) => {
                self.advance();
                false
            }
            Some(TokenKind::ConditionalIgnore) => {
                self.advance();
                true
            }
            Some(TokenKind::EntityRefToken) => {
                self.parse_entity_ref();
                false
            }
            _ => {
                self.error("INCLUDE, IGNORE or parameter entity reference expected");
                self.skip_conditional_section();
                section.close_as(&mut self.p, NodeKind::ConditionalSection);
                return;
            }
        };

        if !self.expect(TokenKind::MarkupStart, "[ expected") {
            self.skip_conditional_section();
            section.close_as(&mut self.p, NodeKind::ConditionalSection);
            return;
        }

        if ignore {
            self.skip_conditional_section();
        } else {
            self.parse_markup_decls(Until::SectionEnd);
            self.expect(TokenKind::ConditionalSectionEnd, "]]> expected");
        }

        section.close_as(&mut self.p, NodeKind::ConditionalSection);
    }

    /// Skips the body of an ignored section, nested sections included, up to and including the
    /// closing `]]>`
    fn skip_conditional_section(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.token() {
            match kind {
                TokenKind::ConditionalSectionStart => depth += 1,
                TokenKind::ConditionalSectionEnd if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::ConditionalSectionEnd => depth -= 1,
                _ => {}
            }
            self.advance();
        }

        self.error("]]> expected");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::DtdContext;
    use crate::parser::parse_dtd;
    use crate::parser::tests::{assert_lossless, child_kinds, messages, nodes_of_kind};
    use crate::syntax::NodeKind;
    use test_case::test_case;

    #[test]
    fn complete_dtd() {
        let source = r#"<?xml version="1.0"?>
<!-- people -->
<!ELEMENT people (person*)>
<!ELEMENT person (name, email?)>
<!ATTLIST person id ID #REQUIRED
                 kind (friend|foe) "friend"
                 since CDATA #FIXED "2001">
<!ENTITY % common "id ID #IMPLIED">
<!ENTITY logo SYSTEM "logo.png" NDATA png>
<!ENTITY copy "&#169;">
<!NOTATION png PUBLIC "-//PNG//EN">
%common;
"#;
        let tree = parse_dtd(source, DtdContext::MarkupDecl);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(tree.kind(tree.root()), NodeKind::MarkupDecl);
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![
                NodeKind::XmlDecl,
                NodeKind::Comment,
                NodeKind::ElementDecl,
                NodeKind::ElementDecl,
                NodeKind::AttlistDecl,
                NodeKind::EntityDecl,
                NodeKind::EntityDecl,
                NodeKind::EntityDecl,
                NodeKind::NotationDecl,
                NodeKind::EntityRef
            ]
        );

        let attlist = nodes_of_kind(&tree, NodeKind::AttlistDecl)[0];
        assert_eq!(
            child_kinds(&tree, attlist),
            vec![
                NodeKind::AttributeDecl,
                NodeKind::AttributeDecl,
                NodeKind::AttributeDecl
            ]
        );
        assert_eq!(nodes_of_kind(&tree, NodeKind::EnumeratedType).len(), 1);
        assert_eq!(nodes_of_kind(&tree, NodeKind::EntityDeclContent).len(), 3);
        assert_lossless(&tree);
    }

    #[test]
    fn broken_declaration_does_not_swallow_the_rest() {
        let tree = parse_dtd(
            "<!ELEMENT a (b, c) junk here>\n<!ELEMENT d EMPTY>",
            DtdContext::MarkupDecl,
        );
        assert_eq!(messages(&tree), vec!["Unexpected token", "Unexpected token"]);
        assert_eq!(nodes_of_kind(&tree, NodeKind::ElementDecl).len(), 2);
        assert_lossless(&tree);
    }

    #[test_case("<!ELEMENT >" , "Name expected" ; "element without name")]
    #[test_case("<!ELEMENT a ANY" , "> expected" ; "unterminated element")]
    #[test_case("<!ATTLIST a b>" , "Attribute type expected" ; "attribute without type")]
    #[test_case("<!ATTLIST a b CDATA>" , "Attribute default value expected" ; "attribute without default")]
    #[test_case("<!ATTLIST a b (x|y>" , ") expected" ; "unterminated enumeration")]
    #[test_case("<!ENTITY e>" , "Literal, PUBLIC or SYSTEM expected" ; "entity without value")]
    #[test_case("<!ENTITY e PUBLIC \"p\">" , "Literal expected" ; "public without system literal")]
    #[test_case("<!NOTATION n>" , "PUBLIC or SYSTEM expected" ; "notation without id")]
    #[test_case("<!ENTITY e \"x>" , "Attribute value is not closed" ; "unterminated literal")]
    #[test_case("text" , "Unexpected token" ; "stray text")]
    fn declaration_errors(source: &str, message: &str) {
        let tree = parse_dtd(source, DtdContext::MarkupDecl);
        assert!(messages(&tree).contains(&message.to_string()), "{:?}", messages(&tree));
        assert_lossless(&tree);
    }

    #[test]
    fn conditional_sections() {
        let tree = parse_dtd(
            "<![INCLUDE[<!ELEMENT a ANY>]]><![IGNORE[<!ELEMENT b ANY> <![ x ]]> ]]><![%draft;[<!ELEMENT c EMPTY>]]>",
            DtdContext::MarkupDecl,
        );
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![
                NodeKind::ConditionalSection,
                NodeKind::ConditionalSection,
                NodeKind::ConditionalSection
            ]
        );
        // declarations in ignored sections are not parsed
        assert_eq!(nodes_of_kind(&tree, NodeKind::ElementDecl).len(), 2);
        assert_lossless(&tree);
    }

    #[test_case("<![ foo [ ]]>" ; "unknown keyword")]
    #[test_case("<![INCLUDE <!ELEMENT a ANY>" ; "missing bracket")]
    #[test_case("<![INCLUDE[<!ELEMENT a ANY>" ; "missing end")]
    fn malformed_conditional_section(source: &str) {
        let tree = parse_dtd(source, DtdContext::MarkupDecl);
        assert!(tree.has_errors());
        let sections = nodes_of_kind(&tree, NodeKind::ConditionalSection);
        assert_eq!(sections.len(), 1);
        assert_eq!(tree.child_nodes(tree.root()).next(), Some(sections[0]));
        assert_lossless(&tree);
    }

    #[test]
    fn composite_names() {
        let tree = parse_dtd("<!ELEMENT (%a;|%b;) ANY>", DtdContext::MarkupDecl);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        let decl = nodes_of_kind(&tree, NodeKind::ElementDecl)[0];
        assert_eq!(
            child_kinds(&tree, decl),
            vec![NodeKind::ElementContentGroup, NodeKind::ElementContentSpec]
        );
    }

    #[test]
    fn enumerated_keywords_become_names() {
        let tree = parse_dtd("(EMPTY|ANY|yes)", DtdContext::EnumeratedType);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(nodes_of_kind(&tree, NodeKind::EnumeratedType).len(), 1);
        let names = tree
            .tokens()
            .iter()
            .filter(|t| t.kind == crate::lexer::token::TokenKind::Name)
            .count();
        assert_eq!(names, 3);
    }

    #[test_case("(a, (b | c)*)+", DtdContext::ElementContentSpec, NodeKind::ElementContentSpec ; "content spec")]
    #[test_case("id ID #REQUIRED x CDATA 'v'", DtdContext::AttributeList, NodeKind::AttributeDecl ; "attribute list")]
    #[test_case("'some &ref; value'", DtdContext::AttributeValue, NodeKind::AttributeValue ; "attribute value")]
    #[test_case("kind (a|b) #IMPLIED", DtdContext::AttributeDecl, NodeKind::AttributeDecl ; "attribute decl")]
    #[test_case("SYSTEM \"a.dtd\"", DtdContext::EntityDeclContent, NodeKind::EntityDeclContent ; "entity decl content")]
    fn entry_contexts(source: &str, context: DtdContext, expected: NodeKind) {
        let tree = parse_dtd(source, context);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(tree.kind(tree.root()), NodeKind::MarkupDecl);
        assert!(!nodes_of_kind(&tree, expected).is_empty());
        assert_lossless(&tree);
    }

    #[test]
    fn enumerated_type_without_parens() {
        let tree = parse_dtd("a|b|EMPTY", DtdContext::EnumeratedType);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(child_kinds(&tree, tree.root()), vec![NodeKind::EnumeratedType]);
        let enumerated = tree.child_nodes(tree.root()).next().unwrap();
        assert_eq!(tree.text_of(enumerated), "a|b|EMPTY");
        assert_lossless(&tree);
    }

    #[test]
    fn leftover_tokens_in_context() {
        let tree = parse_dtd("(a|b) junk", DtdContext::EnumeratedType);
        assert_eq!(messages(&tree), vec!["Unexpected tokens"]);
        assert_lossless(&tree);
    }
}
