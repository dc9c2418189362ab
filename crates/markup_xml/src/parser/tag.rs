use crate::lexer::token::TokenKind;
use crate::parser::{MarkupParser, BALANCING_DEPTH_THRESHOLD};
use crate::syntax::NodeKind;
use crate::tree_builder::Marker;

/// HTML elements that never have content or an end tag
const HTML_VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const UNESCAPED_AMPERSAND: &str = "Unescaped & or nonterminated character/entity reference";

pub(crate) fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

impl MarkupParser<'_> {
    /// Parses a tag with its content and end tag. An end tag that belongs to an outer tag closes
    /// this tag without consuming the end tag.
    pub(crate) fn parse_tag(&mut self, is_extra_root: bool) {
        let tag = self.mark();

        let Some(tag_name) = self.parse_tag_header(is_extra_root) else {
            tag.close_as(&mut self.p, NodeKind::Tag);
            return;
        };

        let content = self.mark();
        self.parse_tag_content();

        if !self.at(TokenKind::EndTagStart) {
            self.error("Unexpected end of file");
            content.drop(&mut self.p);
            self.tag_names.pop();
            tag.close_as(&mut self.p, NodeKind::Tag);
            return;
        }

        let footer = self.mark();
        self.advance();

        if self.at(TokenKind::Name) {
            let end_name = self.token_text();
            let dialect = self.dialect();
            if !dialect.names_match(&tag_name, end_name)
                && self.tag_names.iter().any(|n| dialect.names_match(n, end_name))
            {
                log::debug!("closing unclosed <{tag_name}> in front of </{end_name}>");
                footer.rollback(&mut self.p);
                self.tag_names.pop();
                let message = format!("Element {tag_name} is not closed");
                tag.close_before(&mut self.p, &content, NodeKind::Tag, Some(&message));
                content.drop(&mut self.p);
                return;
            }
            self.advance();
        } else {
            self.error("Closing tag name missing");
        }
        footer.drop(&mut self.p);

        while let Some(kind) = self.token() {
            if matches!(
                kind,
                TokenKind::TagEnd | TokenKind::StartTagStart | TokenKind::EndTagStart
            ) {
                break;
            }
            self.error_token("Unexpected token");
        }

        self.expect(TokenKind::TagEnd, "Closing tag is not done");

        content.drop(&mut self.p);
        self.tag_names.pop();
        tag.close_as(&mut self.p, NodeKind::Tag);
    }

    /// Parses `<name attr="value" ...>` and pushes the tag name. Returns `None` when the tag is
    /// already complete (empty element, broken header, void element or depth guard); the name is
    /// popped again in that case.
    fn parse_tag_header(&mut self, is_extra_root: bool) -> Option<String> {
        if is_extra_root {
            self.error_token("Multiple root tags");
        } else {
            self.advance();
        }

        let tag_name = if !self.at(TokenKind::Name) || self.p.lookback(1) == Some(TokenKind::Whitespace)
        {
            self.error("Tag name expected");
            String::new()
        } else {
            let name = self.token_text().to_string();
            self.advance();
            name
        };

        self.tag_names.push(tag_name.clone());

        loop {
            match self.token() {
                Some(TokenKind::Name) => self.parse_attribute(),
                Some(TokenKind::CharEntityRef) | Some(TokenKind::EntityRefToken) => {
                    self.parse_reference()
                }
                _ => break,
            }
        }

        if self.eat(TokenKind::EmptyElementEnd) {
            self.tag_names.pop();
            return None;
        }

        if !self.eat(TokenKind::TagEnd) {
            self.error("Tag start is not closed");
            self.tag_names.pop();
            return None;
        }

        if self.is_html() && is_void_element(&tag_name) {
            self.tag_names.pop();
            return None;
        }

        if self.tag_names.len() > BALANCING_DEPTH_THRESHOLD {
            if !self.depth_warned {
                log::warn!(
                    "more than {BALANCING_DEPTH_THRESHOLD} open tags, no longer nesting tags"
                );
                self.depth_warned = true;
            }
            self.error("Way too unbalanced. Stopping attempt to balance tags");
            self.tag_names.pop();
            return None;
        }

        Some(tag_name)
    }

    /// Mixed content of a tag up to an end tag or the end of the input. Character data, character
    /// references, CDATA sections and bad characters are merged into text nodes.
    fn parse_tag_content(&mut self) {
        let mut text: Option<Marker> = None;

        while let Some(kind) = self.token() {
            match kind {
                TokenKind::EndTagStart => break,
                TokenKind::StartTagStart => {
                    self.terminate_text(&mut text);
                    self.parse_tag(false);
                }
                TokenKind::PiStart => {
                    self.terminate_text(&mut text);
                    self.parse_processing_instruction();
                }
                TokenKind::EntityRefToken => {
                    self.terminate_text(&mut text);
                    self.parse_reference();
                }
                TokenKind::CommentStart => {
                    self.terminate_text(&mut text);
                    self.parse_comment();
                }
                TokenKind::CharEntityRef => {
                    self.start_text(&mut text);
                    self.parse_reference();
                }
                TokenKind::CdataStart => {
                    self.start_text(&mut text);
                    self.parse_cdata();
                }
                TokenKind::BadCharacter => {
                    self.start_text(&mut text);
                    self.error_token(UNESCAPED_AMPERSAND);
                }
                _ => {
                    self.start_text(&mut text);
                    self.advance();
                }
            }
        }

        self.terminate_text(&mut text);
    }

    fn start_text(&mut self, text: &mut Option<Marker>) {
        if text.is_none() {
            *text = Some(self.mark());
        }
    }

    fn terminate_text(&mut self, text: &mut Option<Marker>) {
        if let Some(marker) = text.take() {
            marker.close_as(&mut self.p, NodeKind::Text);
        }
    }

    /// Character references stay plain tokens, entity references become nodes
    fn parse_reference(&mut self) {
        if self.at(TokenKind::EntityRefToken) {
            let reference = self.mark();
            self.advance();
            reference.close_as(&mut self.p, NodeKind::EntityRef);
        } else {
            self.advance();
        }
    }

    /// `name="value"`. HTML allows attributes without a value.
    pub(crate) fn parse_attribute(&mut self) {
        let attribute = self.mark();
        self.advance();

        if !self.eat(TokenKind::Eq) {
            if !self.is_html() {
                self.error("Expected: =");
            }
            attribute.close_as(&mut self.p, NodeKind::Attribute);
            return;
        }

        self.parse_attribute_value();
        attribute.close_as(&mut self.p, NodeKind::Attribute);
    }

    fn parse_attribute_value(&mut self) {
        let value = self.mark();

        if self.eat(TokenKind::AttributeValueStartDelimiter) {
            loop {
                match self.token() {
                    None
                    | Some(TokenKind::AttributeValueEndDelimiter)
                    | Some(TokenKind::EndTagStart)
                    | Some(TokenKind::EmptyElementEnd)
                    | Some(TokenKind::StartTagStart) => break,
                    Some(TokenKind::BadCharacter) => self.error_token(UNESCAPED_AMPERSAND),
                    Some(TokenKind::EntityRefToken) => self.parse_reference(),
                    Some(_) => self.advance(),
                }
            }

            self.expect(
                TokenKind::AttributeValueEndDelimiter,
                "Attribute value is not closed",
            );
        } else if self.at(TokenKind::AttributeValueToken) {
            // unquoted html value
            self.advance();
        } else {
            self.error("Attribute value expected");
        }

        value.close_as(&mut self.p, NodeKind::AttributeValue);
    }
}

#[cfg(test)]
mod tests {
    use crate::driver::drive_builder;
    use crate::driver::sink::{Event, EventCollector, ProcessingOrder};
    use crate::parser::tests::{assert_lossless, child_kinds, messages, nodes_of_kind};
    use crate::parser::{parse_html_like, parse_xml_like, BALANCING_DEPTH_THRESHOLD};
    use crate::syntax::{NodeKind, SyntaxTree};
    use test_case::test_case;

    #[test]
    fn single_root_has_no_errors() {
        let tree = parse_xml_like("<a x=\"1\" y='2'><b>t</b><c/><!--k--></a>");
        assert!(!tree.has_errors(), "{:?}", messages(&tree));

        let tags = nodes_of_kind(&tree, NodeKind::Tag);
        assert_eq!(tags.len(), 3);
        assert_eq!(
            child_kinds(&tree, tags[0]),
            vec![
                NodeKind::Attribute,
                NodeKind::Attribute,
                NodeKind::Tag,
                NodeKind::Tag,
                NodeKind::Comment
            ]
        );
        assert_lossless(&tree);
    }

    #[test]
    fn unclosed_tag_is_closed_before_its_content() {
        let tree = parse_xml_like("<a><b><c/>text</a>");
        assert_eq!(messages(&tree), vec!["Element b is not closed"]);

        let a = nodes_of_kind(&tree, NodeKind::Tag)[0];
        assert_eq!(tree.text_of(a), "<a><b><c/>text</a>");
        assert_eq!(
            child_kinds(&tree, a),
            vec![NodeKind::Tag, NodeKind::Tag, NodeKind::Text]
        );

        let b = tree.child_nodes(a).next().unwrap();
        assert_eq!(tree.text_of(b), "<b>");
        assert_eq!(child_kinds(&tree, b), vec![NodeKind::Error]);
        assert_lossless(&tree);
    }

    #[test]
    fn unknown_end_tag_closes_current_tag() {
        let tree = parse_xml_like("<a><b></c></a>");
        assert!(!tree.has_errors());
        let b = nodes_of_kind(&tree, NodeKind::Tag)[1];
        assert_eq!(tree.text_of(b), "<b></c>");
    }

    #[test_case("<a>text" , "Unexpected end of file" ; "missing end tag")]
    #[test_case("<a></>" , "Closing tag name missing" ; "end tag without name")]
    #[test_case("<a></a" , "Closing tag is not done" ; "unterminated end tag")]
    #[test_case("<a></a x>" , "Unexpected token" ; "garbage in end tag")]
    #[test_case("<a" , "Tag start is not closed" ; "unterminated start tag")]
    #[test_case("< a/>" , "Tag name expected" ; "whitespace before name")]
    #[test_case("<a b/>" , "Expected: =" ; "attribute without value")]
    #[test_case("<a b=c/>" , "Attribute value expected" ; "unquoted value")]
    #[test_case("<a b=\"c<d/></a>" , "Attribute value is not closed" ; "unterminated value")]
    #[test_case("<a>x & y</a>" , "Unescaped & or nonterminated character/entity reference" ; "bare ampersand")]
    #[test_case("<a b=\"&\"/>" , "Unescaped & or nonterminated character/entity reference" ; "bare ampersand in value")]
    fn tag_errors(source: &str, message: &str) {
        let tree = parse_xml_like(source);
        assert!(messages(&tree).contains(&message.to_string()), "{:?}", messages(&tree));
        assert_lossless(&tree);
    }

    #[test]
    fn text_coalescing() {
        let tree = parse_xml_like("<a>x &#65; <![CDATA[y]]> z&amp;w<!--c-->v</a>");
        assert!(!tree.has_errors(), "{:?}", messages(&tree));

        let a = nodes_of_kind(&tree, NodeKind::Tag)[0];
        assert_eq!(
            child_kinds(&tree, a),
            vec![
                NodeKind::Text,
                NodeKind::EntityRef,
                NodeKind::Text,
                NodeKind::Comment,
                NodeKind::Text
            ]
        );

        let texts: Vec<&str> = nodes_of_kind(&tree, NodeKind::Text)
            .into_iter()
            .map(|t| tree.text_of(t))
            .collect();
        assert_eq!(texts, vec!["x &#65; <![CDATA[y]]> z", "w", "v"]);
    }

    #[test]
    fn html_tags() {
        let tree = parse_html_like("<DIV class=x hidden><br><img src='a'><P>t</p></div>");
        assert!(!tree.has_errors(), "{:?}", messages(&tree));

        let div = nodes_of_kind(&tree, NodeKind::Tag)[0];
        assert_eq!(
            child_kinds(&tree, div),
            vec![
                NodeKind::Attribute,
                NodeKind::Attribute,
                NodeKind::Tag,
                NodeKind::Tag,
                NodeKind::Tag
            ]
        );
        assert_lossless(&tree);
    }

    #[test]
    fn html_case_insensitive_recovery() {
        let tree = parse_html_like("<UL><li>one</ul>");
        assert_eq!(messages(&tree), vec!["Element li is not closed"]);
    }

    fn nested(depth: usize) -> String {
        let mut source = String::new();
        for _ in 0..depth {
            source.push_str("<a>");
        }
        source
    }

    #[test]
    fn depth_guard_stops_nesting() {
        // shows the one-time warning; fails when another test installed a logger first
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Warn)
            .init();

        let source = nested(BALANCING_DEPTH_THRESHOLD + 1);
        let tree = parse_xml_like(&source);
        let messages = messages(&tree);
        assert!(messages
            .iter()
            .any(|m| m == "Way too unbalanced. Stopping attempt to balance tags"));
        assert_eq!(tree.reconstruct(), source);

        assert_eq!(tag_starts(&tree), nodes_of_kind(&tree, NodeKind::Tag).len());
    }

    #[test]
    fn below_depth_guard() {
        let depth = BALANCING_DEPTH_THRESHOLD;
        let mut source = nested(depth);
        for _ in 0..depth {
            source.push_str("</a>");
        }
        let tree = parse_xml_like(&source);
        assert!(!tree.has_errors(), "{:?}", messages(&tree));
        assert_eq!(nodes_of_kind(&tree, NodeKind::Tag).len(), depth);
        assert_eq!(tag_starts(&tree), depth);
    }

    fn tag_starts(tree: &SyntaxTree) -> usize {
        let mut collector = EventCollector::default();
        drive_builder(tree, &mut collector, ProcessingOrder::Tags);
        collector
            .events
            .iter()
            .filter(|event| matches!(event, Event::TagStart { .. }))
            .count()
    }
}
