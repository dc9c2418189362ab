use crate::lexer::token::TokenKind;
use crate::parser::MarkupParser;
use crate::syntax::NodeKind;
use crate::tree_builder::Marker;

impl MarkupParser<'_> {
    /// Parses a complete document: leading comments, the prolog, the root tag and whatever
    /// follows it
    pub fn parse_document(&mut self) {
        log::trace!("parse_document");

        let document = self.mark();

        while self.at(TokenKind::CommentStart) {
            self.parse_comment();
        }

        self.parse_prolog();

        let mut root_tag_count = 0;
        let mut error: Option<Marker> = None;

        while let Some(kind) = self.token() {
            match kind {
                TokenKind::StartTagStart => {
                    self.flush_error(&mut error);
                    root_tag_count += 1;
                    self.parse_tag(root_tag_count > 1);
                    self.tag_names.clear();
                }
                TokenKind::CommentStart => {
                    self.flush_error(&mut error);
                    self.parse_comment();
                }
                TokenKind::PiStart => {
                    self.flush_error(&mut error);
                    self.parse_processing_instruction();
                }
                TokenKind::RealWhitespace => {
                    self.flush_error(&mut error);
                    self.advance();
                }
                _ => {
                    if error.is_none() {
                        error = Some(self.mark());
                    }
                    self.advance();
                }
            }
        }

        self.flush_error(&mut error);

        if root_tag_count == 0 {
            let root_tag = self.mark();
            self.error("Valid XML document must have a root tag");
            root_tag.close_as(&mut self.p, NodeKind::Tag);
        }

        document.close_as(&mut self.p, NodeKind::Document);
    }

    /// Closes a pending run of unexpected top level tokens as one error node
    fn flush_error(&mut self, error: &mut Option<Marker>) {
        if let Some(marker) = error.take() {
            marker.close_as_error(&mut self.p, "Unexpected tokens");
        }
    }

    fn parse_prolog(&mut self) {
        let prolog = self.mark();

        loop {
            match self.token() {
                Some(TokenKind::PiStart) => self.parse_processing_instruction(),
                Some(TokenKind::DoctypeStart) => self.parse_doctype(),
                Some(TokenKind::CommentStart) => self.parse_comment(),
                Some(TokenKind::RealWhitespace) => self.advance(),
                _ => break,
            }
        }

        prolog.close_as(&mut self.p, NodeKind::Prolog);
    }

    /// `<!DOCTYPE name PUBLIC "pub" "sys" [ internal subset ]>`
    fn parse_doctype(&mut self) {
        log::trace!("parse_doctype");

        let doctype = self.mark();
        self.advance();

        if !self.eat(TokenKind::Name) {
            self.error("Name expected");
        }

        loop {
            match self.token() {
                None | Some(TokenKind::DoctypeEnd) | Some(TokenKind::StartTagStart) => break,
                Some(TokenKind::MarkupStart) => self.parse_internal_subset(),
                Some(TokenKind::DoctypePublic)
                | Some(TokenKind::DoctypeSystem)
                | Some(TokenKind::AttributeValueToken)
                | Some(TokenKind::Name) => self.advance(),
                Some(_) => self.error_token("Unexpected token"),
            }
        }

        if self.eof() {
            self.error("Unexpected end of file");
        } else {
            self.expect(TokenKind::DoctypeEnd, "> expected");
        }

        doctype.close_as(&mut self.p, NodeKind::Doctype);
    }

    /// `[ ... ]` of a doctype, parsed with the DTD grammar on the same token stream
    fn parse_internal_subset(&mut self) {
        let subset = self.mark();
        self.advance();

        self.parse_markup_decls(crate::parser::dtd::Until::MarkupEnd);
        self.expect(TokenKind::MarkupEnd, "] expected");

        subset.close_as(&mut self.p, NodeKind::MarkupDecl);
    }

    pub(crate) fn parse_comment(&mut self) {
        let comment = self.mark();
        self.advance();

        while self.at(TokenKind::CommentCharacters) {
            self.advance();
        }
        self.expect(TokenKind::CommentEnd, "Comment is not closed");

        comment.close_as(&mut self.p, NodeKind::Comment);
    }

    pub(crate) fn parse_cdata(&mut self) {
        let cdata = self.mark();
        self.advance();

        while !self.eof() && !self.at(TokenKind::CdataEnd) {
            self.advance();
        }
        self.expect(TokenKind::CdataEnd, "CDATA section is not closed");

        cdata.close_as(&mut self.p, NodeKind::Cdata);
    }

    /// `<?target data?>`. A PI with the target `xml` is the XML declaration; its body consists of
    /// pseudo attributes.
    pub(crate) fn parse_processing_instruction(&mut self) {
        let pi = self.mark();
        self.advance();

        let mut kind = NodeKind::ProcessingInstruction;
        if self.at(TokenKind::PiTarget) {
            if self.token_text().eq_ignore_ascii_case("xml") {
                kind = NodeKind::XmlDecl;
            }
            self.advance();
        } else {
            self.error("Processing instruction name expected");
        }

        loop {
            match self.token() {
                Some(TokenKind::PiCharacters) => self.advance(),
                Some(TokenKind::Name) => self.parse_attribute(),
                Some(TokenKind::BadCharacter) => self.error_token("Unexpected token"),
                _ => break,
            }
        }

        self.expect(TokenKind::PiEnd, "Processing instruction is not terminated");

        pi.close_as(&mut self.p, kind);
    }
}
