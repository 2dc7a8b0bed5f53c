use crate::ast::Attribute;
use crate::error::{ParseError, ParseResult};
use logos::{Lexer, Logos};
use std::ops::Range;

/// Token types for stored template markup
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"<![a-zA-Z][^>]*>")]
pub enum Token<'src> {
    /// `<!-- ... -->`, inner text only
    #[token("<!--", comment)]
    Comment(&'src str),

    /// Whole start tag including attributes, `<td style="...">`
    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", start_tag)]
    StartTag(&'src str),

    /// End tag name, `</td>` yields `td`
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim()
    })]
    EndTag(&'src str),

    /// A `<` that does not open a tag; kept as literal text
    #[token("<")]
    Lt,

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a start tag, after the tag name
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum AttrToken<'src> {
    #[regex(r#"[^ \t\r\n\f"'>/=]+"#, |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    DoubleQuoted(&'src str),

    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    SingleQuoted(&'src str),

    #[token("/")]
    Slash,
}

fn comment<'s>(lex: &mut Lexer<'s, Token<'s>>) -> Option<&'s str> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    lex.bump(end + 3);
    Some(&rest[..end])
}

/// Extend the match to the closing `>`, skipping over quoted attribute values
fn start_tag<'s>(lex: &mut Lexer<'s, Token<'s>>) -> Option<&'s str> {
    let rest = lex.remainder();
    let mut quote: Option<char> = None;

    for (i, c) in rest.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => {
                lex.bump(i + 1);
                return Some(lex.slice());
            }
            None => {}
        }
    }

    None
}

/// Tokenize markup, failing on the first unrecognized input
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Range<usize>)>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ParseError::unterminated_tag(span.start)),
        })
        .collect()
}

/// Decomposed start tag
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
}

/// Split a raw start tag (`<img src="a.png" />`) into name and attributes.
///
/// Attribute values are returned raw; entity decoding happens in the parser.
pub fn parse_start_tag(raw: &str) -> StartTag {
    let inner = raw
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    let name_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attributes: Vec<Attribute> = Vec::new();
    let mut self_closing = false;
    let mut awaiting_value = false;

    for token in AttrToken::lexer(&inner[name_end..]).flatten() {
        match token {
            AttrToken::Name(value) if awaiting_value => {
                if let Some(last) = attributes.last_mut() {
                    last.value = Some(value.to_string());
                }
                awaiting_value = false;
            }
            AttrToken::Name(attr) => {
                attributes.push(Attribute::bare(attr.to_ascii_lowercase()));
                self_closing = false;
            }
            AttrToken::Eq => awaiting_value = !attributes.is_empty(),
            AttrToken::DoubleQuoted(value) | AttrToken::SingleQuoted(value) => {
                if awaiting_value {
                    if let Some(last) = attributes.last_mut() {
                        last.value = Some(value.to_string());
                    }
                }
                awaiting_value = false;
            }
            AttrToken::Slash => self_closing = true,
        }
    }

    StartTag {
        name,
        attributes,
        self_closing,
    }
}
