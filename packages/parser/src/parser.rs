use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::header::classify;
use crate::tokenizer::{token_at, Token};
use std::ops::Range;

/// Keywords after which a `<` or `/` starts an operand
const OPERAND_KEYWORDS: &[&str] = &[
    "return", "yield", "await", "default", "else", "case", "in", "of", "typeof", "void",
    "delete", "throw", "new", "do",
];

/// What the previous significant token was, for `<` and `/` disambiguation
#[derive(Debug, Clone, Copy, PartialEq)]
enum Prev {
    /// Start of input, an operator or an opening bracket
    Operator,
    /// An identifier, literal or closing bracket
    Operand,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    /// Top level: stop at the start of the next statement
    Item,
    /// Inside `{ ... }`: stop at the unmatched closing brace
    Braced,
}

/// Lossless parser for component source files.
///
/// Script text is scanned with the logos tokenizer and kept verbatim.
/// Markup is parsed into a tree wherever a `<` appears in operand
/// position, so the document can be edited structurally and written
/// back without disturbing anything else.
pub struct Parser<'src> {
    source: &'src str,
    pos: usize,
    dialect: Dialect,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, dialect: Dialect) -> Self {
        Self {
            source,
            pos: 0,
            dialect,
        }
    }

    /// Parse a complete document
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        let mut doc = Document::new(self.dialect);

        if !self.dialect.is_script() {
            if !self.source.is_empty() {
                doc.items.push(Item {
                    kind: ItemKind::Other,
                    code: Code::raw(self.source),
                });
            }
            return Ok(doc);
        }

        while !self.is_at_end() {
            let code = self.parse_code(Mode::Item)?;
            let kind = classify(&header_text(&code), code.has_markup())?;
            doc.items.push(Item { kind, code });
        }

        Ok(doc)
    }

    /// Scan script text until the mode's terminator, collecting markup.
    fn parse_code(&mut self, mode: Mode) -> ParseResult<Code> {
        let mut segments = Vec::new();
        let mut raw_start = self.pos;
        let mut depth = 0usize;
        let mut prev = Prev::Operator;
        let mut significant = false;

        loop {
            let Some((token, span)) = self.peek() else {
                if mode == Mode::Braced {
                    return Err(ParseError::unexpected_eof(self.pos));
                }
                break;
            };

            if mode == Mode::Item && depth == 0 && significant && self.starts_statement(&token, &span) {
                break;
            }

            match token {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace if depth == 0 && mode == Mode::Braced => break,
                Token::RBrace | Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
                Token::LAngle if prev == Prev::Operator && self.opens_markup(span.end) => {
                    push_raw(&mut segments, &self.source[raw_start..span.start]);
                    let node = self.parse_markup()?;
                    segments.push(Segment::Markup(node));
                    raw_start = self.pos;
                    prev = Prev::Operand;
                    significant = true;
                    continue;
                }
                Token::Slash if prev == Prev::Operator => {
                    self.pos = self.scan_regex(span.start)?;
                    prev = Prev::Operand;
                    significant = true;
                    continue;
                }
                _ => {}
            }

            if !token.is_trivia() {
                prev = classify_prev(&token);
                significant = true;
            }
            self.pos = span.end;
        }

        push_raw(&mut segments, &self.source[raw_start..self.pos]);
        Ok(Code { segments })
    }

    /// A statement starts at column zero with an identifier or decorator
    fn starts_statement(&self, token: &Token, span: &Range<usize>) -> bool {
        let at_line_start = span.start == 0 || self.source[..span.start].ends_with('\n');
        at_line_start && (matches!(token, Token::Ident(_)) || self.source[span.start..].starts_with('@'))
    }

    fn opens_markup(&self, after_angle: usize) -> bool {
        if !self.dialect.has_markup() {
            return false;
        }
        match self.source[after_angle..].chars().next() {
            Some(c) => c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '>',
            None => false,
        }
    }

    /// Skip a regular expression literal starting at `start`
    fn scan_regex(&self, start: usize) -> ParseResult<usize> {
        let mut in_class = false;
        let mut escaped = false;
        for (offset, c) in self.source[start + 1..].char_indices() {
            match c {
                '\n' => break,
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    let mut end = start + 1 + offset + 1;
                    end += self.source[end..]
                        .chars()
                        .take_while(|c| c.is_ascii_alphabetic())
                        .count();
                    return Ok(end);
                }
                _ => {}
            }
        }
        // Not a regex after all: treat as a lone operator
        Ok(start + 1)
    }

    /// Parse an element or fragment starting at `<`
    fn parse_markup(&mut self) -> ParseResult<Node> {
        let start = self.pos;
        self.expect_char('<')?;

        if self.eat_char('>') {
            let (children, closing) = self.parse_children(start, "")?;
            return Ok(Node::Fragment(Fragment {
                children,
                closing: Some(closing),
            }));
        }

        let name = self.read_name();
        if name.is_empty() {
            return Err(ParseError::invalid_syntax(self.pos, "Expected element name"));
        }

        let mut attributes = Vec::new();
        loop {
            let leading = self.read_whitespace();
            if self.source[self.pos..].starts_with("/>") {
                self.pos += 2;
                return Ok(Node::Element(Element {
                    name,
                    attributes,
                    trailing: leading,
                    children: Vec::new(),
                    self_closing: true,
                    closing: None,
                }));
            }
            if self.eat_char('>') {
                let (children, closing) = self.parse_children(start, &name)?;
                return Ok(Node::Element(Element {
                    name,
                    attributes,
                    trailing: leading,
                    children,
                    self_closing: false,
                    closing: Some(closing),
                }));
            }
            if self.is_at_end() {
                return Err(ParseError::unexpected_eof(self.pos));
            }
            let kind = self.parse_attribute()?;
            attributes.push(Attribute { leading, kind });
        }
    }

    fn parse_attribute(&mut self) -> ParseResult<AttributeKind> {
        if self.eat_char('{') {
            let code = self.parse_braced()?;
            return Ok(AttributeKind::Spread(code));
        }

        let name = self.read_name();
        if name.is_empty() {
            return Err(ParseError::unexpected_token(
                self.pos,
                "attribute name",
                self.describe_char(),
            ));
        }

        let before_eq = self.pos;
        let mut eq = self.read_whitespace();
        if !self.eat_char('=') {
            self.pos = before_eq;
            return Ok(AttributeKind::Named {
                name,
                eq: String::new(),
                value: None,
            });
        }
        eq.push('=');
        eq.push_str(&self.read_whitespace());

        let value = match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.pos;
                let Some(len) = self.source[start + 1..].find(quote) else {
                    return Err(ParseError::unexpected_eof(self.source.len()));
                };
                self.pos = start + 1 + len + 1;
                AttrValue::String(self.source[start..self.pos].to_string())
            }
            Some('{') => {
                self.pos += 1;
                AttrValue::Expression(self.parse_braced()?)
            }
            Some('<') => {
                return Err(ParseError::invalid_syntax(
                    self.pos,
                    "Markup attribute values must be wrapped in braces",
                ))
            }
            _ => {
                return Err(ParseError::unexpected_token(
                    self.pos,
                    "attribute value",
                    self.describe_char(),
                ))
            }
        };

        Ok(AttributeKind::Named {
            name,
            eq,
            value: Some(value),
        })
    }

    /// Children up to the matching closing tag; returns the raw closing tag
    fn parse_children(&mut self, open: usize, name: &str) -> ParseResult<(Vec<Node>, String)> {
        let mut children = Vec::new();
        loop {
            let rest = &self.source[self.pos..];
            if rest.is_empty() {
                return Err(ParseError::invalid_syntax(
                    open,
                    format!("Unclosed element <{}>", name),
                ));
            }
            if rest.starts_with("</") {
                let start = self.pos;
                self.pos += 2;
                self.read_whitespace();
                let found = self.read_name();
                self.read_whitespace();
                self.expect_char('>')?;
                if found != name {
                    return Err(ParseError::mismatched_tag(start, name, found));
                }
                return Ok((children, self.source[start..self.pos].to_string()));
            }
            if rest.starts_with('<') {
                children.push(self.parse_markup()?);
                continue;
            }
            if rest.starts_with('{') {
                self.pos += 1;
                children.push(Node::Expression(self.parse_braced()?));
                continue;
            }
            let len = rest.find(['<', '{']).unwrap_or(rest.len());
            children.push(Node::Text(rest[..len].to_string()));
            self.pos += len;
        }
    }

    /// Code after an opening `{`, consuming the closing `}`
    fn parse_braced(&mut self) -> ParseResult<Code> {
        let code = self.parse_code(Mode::Braced)?;
        self.expect_char('}')?;
        Ok(code)
    }

    // Helper methods

    fn peek(&self) -> Option<(Token<'src>, Range<usize>)> {
        token_at(self.source, self.pos)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, c: char) -> ParseResult<()> {
        if self.eat_char(c) {
            Ok(())
        } else if self.is_at_end() {
            Err(ParseError::unexpected_eof(self.pos))
        } else {
            Err(ParseError::unexpected_token(
                self.pos,
                format!("'{}'", c),
                self.describe_char(),
            ))
        }
    }

    fn read_whitespace(&mut self) -> String {
        let len = self.source[self.pos..]
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.source.len() - self.pos);
        let text = self.source[self.pos..self.pos + len].to_string();
        self.pos += len;
        text
    }

    /// Tag or attribute name: identifiers joined by `.`, `:` or `-`
    fn read_name(&mut self) -> String {
        let len = self.source[self.pos..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | ':' | '-')))
            .unwrap_or(self.source.len() - self.pos);
        let name = self.source[self.pos..self.pos + len].to_string();
        self.pos += len;
        name
    }

    fn describe_char(&self) -> String {
        match self.peek_char() {
            Some(c) => format!("'{}'", c),
            None => "end of file".to_string(),
        }
    }
}

fn classify_prev(token: &Token) -> Prev {
    match token {
        Token::Ident(name) if OPERAND_KEYWORDS.contains(name) => Prev::Operator,
        Token::Ident(_)
        | Token::Number
        | Token::String(_)
        | Token::Template
        | Token::RParen
        | Token::RBracket
        | Token::RBrace
        | Token::RAngle => Prev::Operand,
        _ => Prev::Operator,
    }
}

fn push_raw(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Raw(existing)) = segments.last_mut() {
        existing.push_str(text);
    } else {
        segments.push(Segment::Raw(text.to_string()));
    }
}

/// Script text preceding the first markup root of an item
fn header_text(code: &Code) -> String {
    code.segments
        .iter()
        .map_while(|segment| match segment {
            Segment::Raw(text) => Some(text.as_str()),
            Segment::Markup(_) => None,
        })
        .collect()
}

/// Parse source text for the given dialect
pub fn parse(source: &str, dialect: Dialect) -> ParseResult<Document> {
    Parser::new(source, dialect).parse_document()
}

/// Parse source text, inferring the dialect from the path
pub fn parse_with_path(source: &str, path: &std::path::Path) -> ParseResult<Document> {
    let dialect = Dialect::from_path(path)
        .ok_or_else(|| ParseError::invalid_syntax(0, format!("Unsupported file type: {}", path.display())))?;
    parse(source, dialect)
}
