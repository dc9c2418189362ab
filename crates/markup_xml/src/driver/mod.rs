//! Walks a finished syntax tree and reports its logical content to an [`EventSink`]
use crate::config::Dialect;
use crate::driver::namespace::{split_qualified_name, NamespaceStack, XHTML_NAMESPACE};
use crate::driver::sink::{EventSink, ProcessingOrder};
use crate::entities::{decode_char_ref, unescape};
use crate::lexer::token::TokenKind;
use crate::syntax::{NodeKind, SyntaxElement, SyntaxTree};
use cow_utils::CowUtils;
use markup_shared::node::NodeId;
use std::borrow::Cow;

pub mod namespace;
pub mod sink;

/// Turns a syntax tree into a stream of builder events. Tags are reported with their local name
/// and resolved namespace; `xmlns` bindings are scoped to the tag declaring them.
pub struct BuilderDriver<'t> {
    tree: &'t SyntaxTree,
    namespaces: NamespaceStack,
}

impl<'t> BuilderDriver<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            namespaces: NamespaceStack::new(),
        }
    }

    fn is_html(&self) -> bool {
        self.tree.dialect() == Dialect::Html
    }

    /// Walks the tree from its document node. `order` limits the events for the whole stream,
    /// the order returned from `tag_start` limits them for the children of that tag.
    pub fn build(&mut self, sink: &mut dyn EventSink, order: ProcessingOrder) {
        let tree = self.tree;
        let root = tree.root();
        if tree.kind(root) != NodeKind::Document {
            log::debug!("tree root is a {}, nothing to build", tree.kind(root));
            return;
        }

        self.namespaces.truncate(0);

        for child in tree.child_nodes(root) {
            match tree.kind(child) {
                NodeKind::Prolog => self.visit_prolog(sink, child),
                NodeKind::Tag => self.visit_tag(sink, child, order),
                NodeKind::Error => self.report_error(sink, child),
                _ => {}
            }
        }
    }

    fn visit_prolog(&mut self, sink: &mut dyn EventSink, prolog: NodeId) {
        let tree = self.tree;
        if let Some(doctype) = tree.child_of_kind(prolog, NodeKind::Doctype) {
            let (public_id, system_id) = doctype_ids(tree, doctype);
            sink.doctype(public_id, system_id, tree.node(doctype).range);
        }
    }

    fn visit_tag(&mut self, sink: &mut dyn EventSink, tag: NodeId, order: ProcessingOrder) {
        let tree = self.tree;
        let depth = self.namespaces.depth();

        for attribute in tree.child_nodes(tag) {
            if tree.kind(attribute) != NodeKind::Attribute {
                continue;
            }
            let name = attribute_name(tree, attribute);
            let prefix = if name == "xmlns" {
                Some("")
            } else {
                name.strip_prefix("xmlns:")
            };

            if let Some(prefix) = prefix {
                let value = attribute_value(tree, attribute);
                self.namespaces.push(prefix, &value);
            }
        }

        let qualified = tag_name(tree, tag);
        let qualified = if self.is_html() {
            qualified.cow_to_ascii_lowercase()
        } else {
            Cow::Borrowed(qualified)
        };
        let (prefix, local) = split_qualified_name(&qualified);

        let namespace = match self.namespaces.resolve(prefix) {
            Some(namespace) => namespace.to_string(),
            None if prefix.is_empty() && self.is_html() => XHTML_NAMESPACE.to_string(),
            None => String::new(),
        };

        let range = tree.node(tag).range;
        let wanted = sink
            .tag_start(local, &namespace, range, header_end(tree, tag))
            .intersect(order);

        for child in tree.children_of(tag) {
            let SyntaxElement::Node(child) = *child else {
                continue;
            };

            match tree.kind(child) {
                NodeKind::Attribute => self.visit_attribute(sink, child, wanted),
                NodeKind::Tag => self.visit_tag(sink, child, order),
                NodeKind::Text if wanted.wants_texts() => self.visit_text(sink, child),
                NodeKind::Text => self.report_errors_within(sink, child),
                NodeKind::EntityRef if wanted.wants_texts() => {
                    sink.entity_ref(tree.text_of(child), tree.node(child).range)
                }
                NodeKind::Error => self.report_error(sink, child),
                _ => {}
            }
        }

        sink.tag_end(local, &namespace, range);
        self.namespaces.truncate(depth);
    }

    fn visit_attribute(
        &mut self,
        sink: &mut dyn EventSink,
        attribute: NodeId,
        wanted: ProcessingOrder,
    ) {
        let tree = self.tree;

        if wanted.wants_attributes() {
            let name = attribute_name(tree, attribute);
            let name = if self.is_html() {
                name.cow_to_ascii_lowercase()
            } else {
                Cow::Borrowed(name)
            };
            let value = attribute_value(tree, attribute);
            sink.attribute(&name, &value, tree.node(attribute).range);
        }

        self.report_errors_within(sink, attribute);
    }

    /// One text event per token of the text node. CDATA sections are reported as a whole.
    fn visit_text(&mut self, sink: &mut dyn EventSink, text: NodeId) {
        let tree = self.tree;

        for child in tree.children_of(text) {
            match *child {
                SyntaxElement::Token(token) => {
                    let source = tree.token_text_of(token);
                    let range = tree.token(token).range;
                    if tree.token(token).kind == TokenKind::CharEntityRef {
                        match decode_char_ref(source) {
                            Some(c) => sink.text(c.encode_utf8(&mut [0; 4]), source, range),
                            None => sink.text(source, source, range),
                        }
                    } else {
                        sink.text(source, source, range);
                    }
                }
                SyntaxElement::Node(node) => {
                    let range = tree.node(node).range;
                    match tree.kind(node) {
                        NodeKind::Cdata => {
                            let display = cdata_content(tree, node);
                            sink.text(&display, tree.text_of(node), range);
                        }
                        NodeKind::Error => {
                            self.report_error(sink, node);
                            sink.text(tree.text_of(node), tree.text_of(node), range);
                        }
                        _ => sink.text(tree.text_of(node), tree.text_of(node), range),
                    }
                }
            }
        }
    }

    /// Errors are reported whether or not the node itself is wanted
    fn report_errors_within(&self, sink: &mut dyn EventSink, node: NodeId) {
        for id in self.tree.descendants(node) {
            if self.tree.kind(id) == NodeKind::Error {
                self.report_error(sink, id);
            }
        }
    }

    fn report_error(&self, sink: &mut dyn EventSink, error: NodeId) {
        let node = self.tree.node(error);
        if let Some(message) = node.error.as_deref() {
            sink.error(message, node.range);
        }
    }
}

/// Walks the tree and reports its events to the sink
pub fn drive_builder(tree: &SyntaxTree, sink: &mut dyn EventSink, order: ProcessingOrder) {
    BuilderDriver::new(tree).build(sink, order);
}

/// Name written in the header of a tag. Empty for tags whose header has no name.
fn tag_name(tree: &SyntaxTree, tag: NodeId) -> &str {
    let mut children = tree.children_of(tag).iter();

    // `<`, or the error node wrapping it for an extra root tag
    let Some(first) = children.next() else {
        return "";
    };
    let opens_tag = match *first {
        SyntaxElement::Token(token) => tree.token(token).kind == TokenKind::StartTagStart,
        SyntaxElement::Node(node) => tree.kind(node) == NodeKind::Error,
    };
    if !opens_tag {
        return "";
    }

    match children.next() {
        Some(SyntaxElement::Token(token)) if tree.token(*token).kind == TokenKind::Name => {
            tree.token_text_of(*token)
        }
        _ => "",
    }
}

/// Offset right after the `>` or `/>` of the tag header
fn header_end(tree: &SyntaxTree, tag: NodeId) -> usize {
    tree.child_tokens(tag)
        .map(|token| tree.token(token))
        .find(|token| matches!(token.kind, TokenKind::TagEnd | TokenKind::EmptyElementEnd))
        .map(|token| token.range.end)
        .unwrap_or(tree.node(tag).range.end)
}

fn attribute_name(tree: &SyntaxTree, attribute: NodeId) -> &str {
    tree.token_of_kind(attribute, TokenKind::Name)
        .map(|token| tree.token_text_of(token))
        .unwrap_or("")
}

/// Attribute value without its quotes, with references replaced
fn attribute_value(tree: &SyntaxTree, attribute: NodeId) -> String {
    let Some(value) = tree.child_of_kind(attribute, NodeKind::AttributeValue) else {
        return String::new();
    };

    let mut range = tree.node(value).range;
    let tokens: Vec<_> = tree.child_tokens(value).collect();
    let children = tree.children_of(value);

    if let Some(SyntaxElement::Token(first)) = children.first() {
        let token = tree.token(*first);
        if token.kind == TokenKind::AttributeValueStartDelimiter {
            range.start = token.range.end;
        }
    }
    if let Some(SyntaxElement::Token(last)) = children.last() {
        let token = tree.token(*last);
        if token.kind == TokenKind::AttributeValueEndDelimiter && tokens.len() > 1 {
            range.end = token.range.start;
        }
    }

    let raw = tree.source().get(range.start..range.end).unwrap_or("");
    unescape(raw, tree.dialect()).into_owned()
}

/// Text between `<![CDATA[` and `]]>`
fn cdata_content(tree: &SyntaxTree, cdata: NodeId) -> String {
    tree.child_tokens(cdata)
        .map(|token| tree.token(token))
        .filter(|token| !matches!(token.kind, TokenKind::CdataStart | TokenKind::CdataEnd))
        .map(|token| token.text(tree.source()))
        .collect()
}

/// Public and system identifier of a doctype, without their quotes
fn doctype_ids(tree: &SyntaxTree, doctype: NodeId) -> (Option<&str>, Option<&str>) {
    let mut public_id = None;
    let mut system_id = None;
    let mut expecting: Option<TokenKind> = None;

    for token in tree.significant_tokens(doctype) {
        let kind = tree.token(token).kind;
        match kind {
            TokenKind::DoctypePublic | TokenKind::DoctypeSystem => expecting = Some(kind),
            TokenKind::AttributeValueToken => {
                let literal = strip_quotes(tree.token_text_of(token));
                match expecting {
                    Some(TokenKind::DoctypePublic) => {
                        public_id = Some(literal);
                        // the system literal may follow the public one directly
                        expecting = Some(TokenKind::DoctypeSystem);
                    }
                    Some(TokenKind::DoctypeSystem) => {
                        system_id = Some(literal);
                        expecting = None;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    (public_id, system_id)
}

fn strip_quotes(literal: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = literal.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner);
        }
    }
    literal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::sink::{Event, EventCollector};
    use crate::parser::{parse_html_like, parse_xml_like};
    use markup_shared::location::TextRange;
    use test_case::test_case;

    fn events(tree: &SyntaxTree, order: ProcessingOrder) -> Vec<Event> {
        let mut collector = EventCollector::new(ProcessingOrder::TagsAndAttributesAndTexts);
        drive_builder(tree, &mut collector, order);
        collector.events
    }

    fn tag_starts(events: &[Event]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::TagStart {
                    name, namespace, ..
                } => Some((name.clone(), namespace.clone())),
                _ => None,
            })
            .collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn namespaces_are_scoped_to_their_tag() {
        let tree = parse_xml_like(
            "<r xmlns=\"urn:d\" xmlns:p=\"urn:p\"><p:a><b xmlns:p=\"urn:q\"><p:c/></b><p:d/></p:a><x:e/></r>",
        );
        let events = events(&tree, ProcessingOrder::Tags);

        assert_eq!(
            tag_starts(&events),
            pairs(&[
                ("r", "urn:d"),
                ("a", "urn:p"),
                ("b", "urn:d"),
                ("c", "urn:q"),
                ("d", "urn:p"),
                ("e", ""),
            ])
        );
    }

    #[test]
    fn xml_prefix_needs_no_declaration() {
        let tree = parse_xml_like("<xml:a/>");
        assert_eq!(
            tag_starts(&events(&tree, ProcessingOrder::Tags)),
            pairs(&[("a", namespace::XML_NAMESPACE)])
        );
    }

    #[test]
    fn html_names_are_lowercased() {
        let tree = parse_html_like("<DIV Class=\"a\">x</DIV>");
        let events = events(&tree, ProcessingOrder::TagsAndAttributes);

        assert_eq!(
            events,
            vec![
                Event::TagStart {
                    name: "div".into(),
                    namespace: XHTML_NAMESPACE.into(),
                    range: TextRange::new(0, 22),
                    header_end: 15,
                },
                Event::Attribute {
                    name: "class".into(),
                    value: "a".into(),
                    range: TextRange::new(5, 14),
                },
                Event::TagEnd {
                    name: "div".into(),
                    namespace: XHTML_NAMESPACE.into(),
                    range: TextRange::new(0, 22),
                },
            ]
        );
    }

    #[test]
    fn attribute_values_are_unescaped() {
        let tree = parse_xml_like("<a v=\"1 &lt; 2\" w='&#x41;' e=\"\"/>");
        let values: Vec<(String, String)> = events(&tree, ProcessingOrder::TagsAndAttributes)
            .into_iter()
            .filter_map(|event| match event {
                Event::Attribute { name, value, .. } => Some((name, value)),
                _ => None,
            })
            .collect();

        assert_eq!(values, pairs(&[("v", "1 < 2"), ("w", "A"), ("e", "")]));
    }

    #[test]
    fn text_sources_reconstruct_the_content() {
        let source = "<a>x&#65;<![CDATA[<y>]]>&amp;z</a>";
        let tree = parse_xml_like(source);
        let events = events(&tree, ProcessingOrder::TagsAndTexts);

        let mut displays = Vec::new();
        let mut sources = String::new();
        for event in &events {
            match event {
                Event::Text {
                    display, source, ..
                } => {
                    displays.push(display.clone());
                    sources.push_str(source);
                }
                Event::EntityRef { reference, .. } => {
                    displays.push(reference.clone());
                    sources.push_str(reference);
                }
                _ => {}
            }
        }

        assert_eq!(displays, vec!["x", "A", "<y>", "&amp;", "z"]);
        assert_eq!(sources, "x&#65;<![CDATA[<y>]]>&amp;z");
    }

    #[test]
    fn bad_character_reports_error_then_text() {
        let tree = parse_xml_like("<a>x & y</a>");
        let events = events(&tree, ProcessingOrder::TagsAndTexts);

        let error = events
            .iter()
            .position(|event| matches!(event, Event::Error { .. }))
            .unwrap();
        assert!(matches!(
            &events[error + 1],
            Event::Text { source, .. } if source == "&"
        ));
    }

    #[test_case(ProcessingOrder::Tags ; "tags only")]
    #[test_case(ProcessingOrder::TagsAndAttributes ; "without texts")]
    #[test_case(ProcessingOrder::TagsAndTexts ; "without attributes")]
    fn errors_ignore_processing_order(order: ProcessingOrder) {
        let tree = parse_xml_like("<a b=\"&\">x & y</a>");
        let errors = events(&tree, order)
            .into_iter()
            .filter(|event| matches!(event, Event::Error { .. }))
            .count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn stream_order_limits_events() {
        let tree = parse_xml_like("<a x=\"1\">t<b/></a>");
        let events = events(&tree, ProcessingOrder::Tags);
        assert!(events
            .iter()
            .all(|event| matches!(event, Event::TagStart { .. } | Event::TagEnd { .. })));
        assert_eq!(events.len(), 4);
    }

    struct SkipContentOf(&'static str, Vec<String>);

    impl EventSink for SkipContentOf {
        fn tag_start(
            &mut self,
            local_name: &str,
            _: &str,
            _: TextRange,
            _: usize,
        ) -> ProcessingOrder {
            self.1.push(format!("<{local_name}>"));
            if local_name == self.0 {
                ProcessingOrder::Tags
            } else {
                ProcessingOrder::TagsAndAttributesAndTexts
            }
        }

        fn tag_end(&mut self, local_name: &str, _: &str, _: TextRange) {
            self.1.push(format!("</{local_name}>"));
        }

        fn attribute(&mut self, name: &str, _: &str, _: TextRange) {
            self.1.push(format!("@{name}"));
        }

        fn text(&mut self, display: &str, _: &str, _: TextRange) {
            self.1.push(display.to_string());
        }
    }

    #[test]
    fn tag_order_limits_direct_children() {
        let tree = parse_xml_like("<a><s k=\"v\">hidden<b k=\"w\">shown</b></s></a>");
        let mut sink = SkipContentOf("s", Vec::new());
        drive_builder(&tree, &mut sink, ProcessingOrder::TagsAndAttributesAndTexts);

        assert_eq!(
            sink.1,
            vec!["<a>", "<s>", "<b>", "@k", "shown", "</b>", "</s>", "</a>"]
        );
    }

    #[test]
    fn doctype_identifiers() {
        let tree = parse_xml_like(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0//EN\" 'http://x/y.dtd'><html/>",
        );
        let events = events(&tree, ProcessingOrder::Tags);
        assert!(matches!(
            &events[0],
            Event::Doctype { public_id: Some(p), system_id: Some(s), .. }
                if p == "-//W3C//DTD XHTML 1.0//EN" && s == "http://x/y.dtd"
        ));

        let tree = parse_xml_like("<!DOCTYPE a SYSTEM \"a.dtd\"><a/>");
        assert!(matches!(
            &events_of(&tree)[0],
            Event::Doctype { public_id: None, system_id: Some(s), .. } if s == "a.dtd"
        ));
    }

    fn events_of(tree: &SyntaxTree) -> Vec<Event> {
        events(tree, ProcessingOrder::Tags)
    }

    #[test]
    fn unclosed_tag_reports_error_inside() {
        let tree = parse_xml_like("<a><b></a>");
        let events = events_of(&tree);

        let names: Vec<String> = events
            .iter()
            .map(|event| match event {
                Event::TagStart { name, .. } => format!("<{name}>"),
                Event::TagEnd { name, .. } => format!("</{name}>"),
                Event::Error { message, .. } => message.clone(),
                other => other.to_string(),
            })
            .collect();
        assert_eq!(names, vec!["<a>", "<b>", "Element b is not closed", "</b>", "</a>"]);
    }

    #[test]
    fn missing_root_reports_nameless_tag() {
        let tree = parse_xml_like("");
        let events = events_of(&tree);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::TagStart { name, .. } if name.is_empty()));
        assert!(matches!(
            &events[1],
            Event::Error { message, .. } if message == "Valid XML document must have a root tag"
        ));
    }

    #[test]
    fn building_twice_gives_the_same_events() {
        let tree = parse_xml_like("<r xmlns:p=\"u\"><p:a b=\"&amp;\">t&#33;</p:a></r>");
        let mut driver = BuilderDriver::new(&tree);

        let mut first = EventCollector::default();
        driver.build(&mut first, ProcessingOrder::TagsAndAttributesAndTexts);
        let mut second = EventCollector::default();
        driver.build(&mut second, ProcessingOrder::TagsAndAttributesAndTexts);

        assert_eq!(first.events, second.events);
    }
}
