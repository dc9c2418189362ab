//! Element content models: `EMPTY`, `ANY`, `(#PCDATA|a)*`, `(a, (b|c)+, d?)`
use crate::lexer::token::TokenKind;
use crate::parser::MarkupParser;
use crate::syntax::NodeKind;

impl MarkupParser<'_> {
    pub(crate) fn parse_content_spec(&mut self) {
        let spec = self.mark();
        self.parse_content_spec_inner(false);
        spec.close_as(&mut self.p, NodeKind::ElementContentSpec);
    }

    /// Parses operands and connectors. Outside of a group only `|` connects operands. Returns
    /// false when a nested group was left unterminated.
    fn parse_content_spec_inner(&mut self, in_group: bool) -> bool {
        let mut seen_operand = false;
        let mut after_connector = false;

        while let Some(kind) = self.token() {
            match kind {
                TokenKind::TagEnd
                | TokenKind::StartTagStart
                | TokenKind::RightParen
                | TokenKind::CommentStart => break,
                k if k.is_decl_start() => break,
                TokenKind::Comma if !in_group => {
                    self.error_token("Unexpected token");
                    continue;
                }
                TokenKind::Bar | TokenKind::Comma => {
                    if !seen_operand || after_connector {
                        self.error("Name expected");
                    }
                    self.advance();
                    after_connector = true;
                    continue;
                }
                _ => {}
            }

            // a second operand without a connector ends the content model
            if seen_operand && !after_connector {
                break;
            }

            match kind {
                TokenKind::LeftParen => {
                    if !self.parse_group() {
                        return false;
                    }
                }
                TokenKind::Name
                | TokenKind::EntityRefToken
                | TokenKind::ContentEmpty
                | TokenKind::ContentAny
                | TokenKind::Pcdata => self.parse_content_name(),
                _ => break,
            }

            seen_operand = true;
            after_connector = false;
        }

        if after_connector {
            self.error("Name expected");
        }

        true
    }

    /// `( ... )` with an optional repetition suffix
    fn parse_group(&mut self) -> bool {
        let group = self.mark();
        self.advance();

        if !self.parse_content_spec_inner(true) {
            group.close_as(&mut self.p, NodeKind::ElementContentGroup);
            return false;
        }

        if !self.eat(TokenKind::RightParen) {
            self.error(") expected");
            group.close_as(&mut self.p, NodeKind::ElementContentGroup);
            return false;
        }

        self.parse_repetition();
        group.close_as(&mut self.p, NodeKind::ElementContentGroup);
        true
    }

    /// A single operand: name, parameter entity reference or keyword, with its suffix
    fn parse_content_name(&mut self) {
        let name = self.mark();

        if self.at(TokenKind::EntityRefToken) {
            self.parse_entity_ref();
        } else {
            self.advance();
        }
        self.parse_repetition();

        name.close_as(&mut self.p, NodeKind::ElementContentName);
    }

    /// One of `*`, `+` or `?`. A `+` directly after `?` is tolerated.
    fn parse_repetition(&mut self) {
        if self.eat(TokenKind::Question) {
            self.eat(TokenKind::Plus);
            return;
        }

        if matches!(self.token(), Some(kind) if kind.is_repetition()) {
            self.advance();
        }
    }
}
