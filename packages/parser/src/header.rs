//! Classification of top-level items from their leading tokens.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};
use std::ops::Range;

/// Token parser over the script text of a single item
pub struct HeaderParser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    has_markup: bool,
}

impl<'src> HeaderParser<'src> {
    pub fn new(source: &'src str, has_markup: bool) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            has_markup,
        }
    }

    /// Decide what kind of statement this item is
    pub fn parse_kind(&mut self) -> ParseResult<ItemKind> {
        match self.peek() {
            Some((Token::Ident("import"), _)) => {
                if matches!(self.peek_ahead(1), Some((Token::LParen, _)) | Some((Token::Dot, _))) {
                    // dynamic import / import.meta
                    return Ok(ItemKind::Other);
                }
                self.parse_import().map(ItemKind::Import)
            }
            Some((Token::Ident("export"), _)) => {
                self.advance();
                self.parse_export()
            }
            _ => Ok(self
                .parse_declaration(ExportKind::None)
                .map(ItemKind::Function)
                .unwrap_or(ItemKind::Other)),
        }
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        self.expect_keyword("import")?;
        let mut import = ImportDecl::default();

        if let Some((Token::String(raw), _)) = self.peek() {
            import.source = unquote(raw);
            return Ok(import);
        }

        if self.check_keyword("type") && !matches!(self.peek_ahead(1), Some((Token::Ident("from"), _)) | Some((Token::Comma, _))) {
            self.advance();
        }

        if let Some((Token::Ident(name), _)) = self.peek() {
            if *name != "from" {
                import.default = Some(name.to_string());
                self.advance();
                self.match_token(Token::Comma);
            }
        }

        if self.match_token(Token::Star) {
            self.expect_keyword("as")?;
            import.namespace = Some(self.expect_ident()?);
        } else if self.match_token(Token::LBrace) {
            while !self.check(Token::RBrace) && !self.is_at_end() {
                if self.check_keyword("type")
                    && matches!(self.peek_ahead(1), Some((Token::Ident(_), _)))
                {
                    self.advance();
                }
                let imported = self.expect_name()?;
                let local = if self.check_keyword("as") {
                    self.advance();
                    self.expect_ident()?
                } else {
                    imported.clone()
                };
                import.named.push(ImportSpecifier { imported, local });
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RBrace)?;
        }

        self.expect_keyword("from")?;
        import.source = self.expect_string()?;
        Ok(import)
    }

    fn parse_export(&mut self) -> ParseResult<ItemKind> {
        if self.check_keyword("default") {
            self.advance();
            if let Some(decl) = self.parse_declaration(ExportKind::Default) {
                return Ok(ItemKind::Function(decl));
            }
            if let Some((Token::Ident(name), _)) = self.peek() {
                let name = name.to_string();
                self.advance();
                if self.is_at_end() || self.check(Token::Semicolon) {
                    return Ok(ItemKind::ExportDefault(name));
                }
            }
            return Ok(ItemKind::Other);
        }

        if self.match_token(Token::LBrace) {
            let mut names = Vec::new();
            while !self.check(Token::RBrace) && !self.is_at_end() {
                let local = self.expect_name()?;
                if self.check_keyword("as") {
                    self.advance();
                    self.expect_name()?;
                }
                names.push(local);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RBrace)?;
            if self.check_keyword("from") {
                // re-export, declares nothing locally
                return Ok(ItemKind::Other);
            }
            return Ok(ItemKind::ExportNamed(names));
        }

        Ok(self
            .parse_declaration(ExportKind::Named)
            .map(ItemKind::Function)
            .unwrap_or(ItemKind::Other))
    }

    /// `function Name`, `class Name`, or `const Name = <function-like>`
    fn parse_declaration(&mut self, export: ExportKind) -> Option<FunctionDecl> {
        if self.check_keyword("async") {
            self.advance();
        }
        match self.peek() {
            Some((Token::Ident("function"), _)) | Some((Token::Ident("class"), _)) => {
                self.advance();
                self.match_token(Token::Star);
                let name = self.expect_ident().ok()?;
                Some(FunctionDecl { name, export })
            }
            Some((Token::Ident("const"), _))
            | Some((Token::Ident("let"), _))
            | Some((Token::Ident("var"), _)) => {
                self.advance();
                let name = self.expect_ident().ok()?;
                let function_like = self.tokens[self.pos..].iter().any(|(token, _)| {
                    matches!(token, Token::Arrow | Token::Ident("function"))
                });
                if function_like || self.has_markup {
                    Some(FunctionDecl { name, export })
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&(Token<'src>, Range<usize>)> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(&token)
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some((Token::Ident(name), _)) if *name == keyword)
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(token.to_string()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(format!("'{}'", keyword)))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Identifier or string module export name (`import { "a-b" as c }`)
    fn expect_name(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::String(raw), _)) => {
                let name = unquote(raw);
                self.advance();
                Ok(name)
            }
            _ => self.expect_ident(),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::String(raw), _)) => {
                let value = unquote(raw);
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("string")),
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        match self.peek() {
            Some((token, span)) => ParseError::unexpected_token(span.start, expected, token.to_string()),
            None => ParseError::unexpected_eof(self.tokens.last().map(|(_, s)| s.end).unwrap_or(0)),
        }
    }
}

fn unquote(raw: &str) -> String {
    raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default().to_string()
}

/// Classify an item from its script text
pub fn classify(script: &str, has_markup: bool) -> ParseResult<ItemKind> {
    HeaderParser::new(script, has_markup).parse_kind()
}
