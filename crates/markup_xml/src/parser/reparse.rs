use crate::lexer::token::TokenKind;
use crate::syntax::{NodeKind, SyntaxElement, SyntaxTree, ThreeState};
use markup_shared::node::NodeId;

/// Rejects reuse of an old tag node when the freshly parsed tag at the same spot has a different
/// name. Never approves reuse; everything else is left to a structural comparison.
pub fn reparse_tag_by_name(
    old_tree: &SyntaxTree,
    old_node: NodeId,
    new_tree: &SyntaxTree,
    new_node: NodeId,
) -> ThreeState {
    if old_tree.kind(old_node) != NodeKind::Tag || new_tree.kind(new_node) != NodeKind::Tag {
        return ThreeState::Unsure;
    }

    let Some(new_name) = header_name(new_tree, new_node) else {
        return ThreeState::Unsure;
    };
    let Some(old_name) = header_name(old_tree, old_node) else {
        return ThreeState::Unsure;
    };

    if new_tree.dialect().names_match(old_name, new_name) {
        ThreeState::Unsure
    } else {
        log::debug!("tag renamed from {old_name} to {new_name}, not reusable");
        ThreeState::No
    }
}

/// Name of a tag whose first two children are `<` and the name token
fn header_name(tree: &SyntaxTree, tag: NodeId) -> Option<&str> {
    let children = tree.children_of(tag);

    let (Some(SyntaxElement::Token(start)), Some(SyntaxElement::Token(name))) =
        (children.first(), children.get(1))
    else {
        return None;
    };

    if tree.token(*start).kind != TokenKind::StartTagStart
        || tree.token(*name).kind != TokenKind::Name
    {
        return None;
    }

    Some(tree.token_text_of(*name))
}
