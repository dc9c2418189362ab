/// Namespace the `xml` prefix is bound to without a declaration
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// Default namespace of unprefixed HTML elements
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Scoped prefix bindings. Bindings of a tag are pushed before its children are visited and
/// truncated back to the entry depth when the tag is done.
#[derive(Debug, Default)]
pub struct NamespaceStack {
    prefixes: Vec<String>,
    namespaces: Vec<String>,
}

impl NamespaceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a prefix. The empty prefix is the default namespace from a plain `xmlns` attribute.
    pub fn push(&mut self, prefix: &str, namespace: &str) {
        log::debug!("binding namespace prefix {prefix:?} to {namespace:?}");
        self.prefixes.push(prefix.to_string());
        self.namespaces.push(namespace.to_string());
    }

    pub fn depth(&self) -> usize {
        self.prefixes.len()
    }

    /// Drops every binding above the given depth
    pub fn truncate(&mut self, depth: usize) {
        self.prefixes.truncate(depth);
        self.namespaces.truncate(depth);
    }

    /// Resolves a prefix against the innermost binding
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        let found = self
            .prefixes
            .iter()
            .rposition(|p| p == prefix)
            .and_then(|idx| self.namespaces.get(idx))
            .map(String::as_str);

        match found {
            Some(namespace) => Some(namespace),
            None if prefix == "xml" => Some(XML_NAMESPACE),
            None => None,
        }
    }
}

/// Splits a qualified name into prefix and local name
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (prefix, local),
        _ => ("", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn innermost_binding_wins() {
        let mut stack = NamespaceStack::new();
        stack.push("p", "urn:outer");
        stack.push("", "urn:default");
        let depth = stack.depth();
        stack.push("p", "urn:inner");

        assert_eq!(stack.resolve("p"), Some("urn:inner"));
        assert_eq!(stack.resolve(""), Some("urn:default"));

        stack.truncate(depth);
        assert_eq!(stack.resolve("p"), Some("urn:outer"));

        stack.truncate(0);
        assert_eq!(stack.resolve("p"), None);
        assert_eq!(stack.resolve(""), None);
    }

    #[test]
    fn xml_prefix_is_predefined() {
        let stack = NamespaceStack::new();
        assert_eq!(stack.resolve("xml"), Some(XML_NAMESPACE));
    }

    #[test_case("a", "", "a")]
    #[test_case("p:a", "p", "a")]
    #[test_case(":a", "", ":a")]
    #[test_case("a:", "", "a:")]
    #[test_case("p:a:b", "p", "a:b")]
    fn split(name: &str, prefix: &str, local: &str) {
        assert_eq!(split_qualified_name(name), (prefix, local));
    }
}
