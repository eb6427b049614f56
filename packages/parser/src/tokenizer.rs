use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Script-level tokens for component source files.
///
/// Trivia is kept as tokens so callers can reconstruct the exact text.
/// Markup is never tokenized here; the parser switches to a character
/// scanner when a `<` opens an element.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\[\s\S])*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\\n]|\\[\s\S])*'", |lex| lex.slice())]
    String(&'src str),

    #[regex(r"`([^`\\]|\\[\s\S])*`")]
    Template,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,

    #[token("=>")]
    Arrow,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("??")]
    Nullish,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("?")]
    Question,

    #[token("!")]
    Bang,

    #[token("*")]
    Star,

    #[token(".")]
    Dot,

    #[regex(r"[-+%^~@#&|]")]
    Punct,
}

impl<'src> Token<'src> {
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::LineComment | Token::BlockComment
        )
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whitespace => write!(f, "whitespace"),
            Token::LineComment | Token::BlockComment => write!(f, "comment"),
            Token::String(s) => write!(f, "string {}", s),
            Token::Template => write!(f, "template literal"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Number => write!(f, "number"),
            Token::Arrow => write!(f, "=>"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Nullish => write!(f, "??"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::Slash => write!(f, "/"),
            Token::Equals => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Question => write!(f, "?"),
            Token::Bang => write!(f, "!"),
            Token::Star => write!(f, "*"),
            Token::Dot => write!(f, "."),
            Token::Punct => write!(f, "punctuation"),
        }
    }
}

/// Lex a single token starting at byte offset `at`.
///
/// Characters the lexer does not recognise come back as `Token::Punct`
/// spanning one character, so scanning never stalls.
pub fn token_at(source: &str, at: usize) -> Option<(Token<'_>, Range<usize>)> {
    let rest = source.get(at..)?;
    let mut lexer = Token::lexer(rest);
    match lexer.next()? {
        Ok(token) => {
            let span = lexer.span();
            Some((token, at + span.start..at + span.end))
        }
        Err(()) => {
            let len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            Some((Token::Punct, at..at + len))
        }
    }
}

/// Tokenize a whole source string, dropping trivia
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some((token, span)) = token_at(source, pos) {
        pos = span.end;
        if !token.is_trivia() {
            tokens.push((token, span));
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_import() {
        let tokens = tokenize("import Button from './Button';");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Ident("import"),
                Token::Ident("Button"),
                Token::Ident("from"),
                Token::String("'./Button'"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        let tokens = tokenize("// heading\nconst /* inline */ a = 1;");
        assert_eq!(tokens[0].0, Token::Ident("const"));
        assert_eq!(tokens[1].0, Token::Ident("a"));
    }

    #[test]
    fn test_unknown_characters_do_not_stall() {
        let tokens = tokenize("a → b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].0, Token::Punct);
    }

    #[test]
    fn test_arrow_is_single_token() {
        let tokens = tokenize("() => x");
        assert_eq!(tokens[2].0, Token::Arrow);
    }
}
