use crate::syntax::{SyntaxElement, SyntaxTree};
use markup_shared::node::NodeId;
use std::io::Write;

/// The walker is used to walk a syntax tree and print it to stdout.
pub struct Walker<'a> {
    tree: &'a SyntaxTree,
    /// Print trivia tokens as well
    trivia: bool,
}

impl<'a> Walker<'a> {
    pub fn new(tree: &'a SyntaxTree) -> Self {
        Self { tree, trivia: true }
    }

    /// Leaves whitespace inside markup out of the output
    pub fn without_trivia(mut self) -> Self {
        self.trivia = false;
        self
    }

    pub fn walk_stdout(&self) {
        let _ = self.inner_walk(self.tree.root(), 0, &mut std::io::stdout());
    }

    pub fn walk_to_string(&self) -> String {
        let mut output: Vec<u8> = Vec::new();

        let _ = self.inner_walk(self.tree.root(), 0, &mut output);

        String::from_utf8_lossy(&output).into_owned()
    }

    fn inner_walk(&self, id: NodeId, depth: usize, f: &mut dyn Write) -> Result<(), std::io::Error> {
        let prefix = " ".repeat(depth * 2);
        let node = self.tree.node(id);

        match &node.error {
            Some(message) => writeln!(f, "{}[{}] {} {:?}", prefix, node.kind, node.range, message)?,
            None => writeln!(f, "{}[{}] {}", prefix, node.kind, node.range)?,
        }

        for child in node.children.iter() {
            match child {
                SyntaxElement::Node(child) => self.inner_walk(*child, depth + 1, f)?,
                SyntaxElement::Token(token) => {
                    let kind = self.tree.token(*token).kind;
                    if kind.is_trivia() && !self.trivia {
                        continue;
                    }
                    writeln!(
                        f,
                        "{}  {} {:?}",
                        prefix,
                        kind,
                        self.tree.token_text_of(*token)
                    )?;
                }
            }
        }

        Ok(())
    }
}
