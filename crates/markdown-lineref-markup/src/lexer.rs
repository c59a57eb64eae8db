//! # Lexer - Tokenizing HTML and SVG Markup
//!
//! The first stage of building a DOM snapshot: break markup into tokens using
//! the [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Nothing is skipped,
//! so concatenating token texts reproduces the input:
//!
//! ```
//! use markdown_lineref_markup::lexer::lex;
//!
//! let input = "<p data-line=\"1\">Hi &amp; bye</p>\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer does not know that `<script>` contents
//! are raw text or that `<li>` implies the end of a previous item - that is
//! the tree builder's job. A `<` that does not start a well-formed tag is
//! lexed as [`TokenKind::Lt`] and treated as text downstream.

use logos::{Lexer, Logos};

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    /// `<!-- ... -->` comments and `<!DOCTYPE ...>` declarations
    #[token("<!", lex_bang)]
    Bang,

    /// `<?xml ... ?>` processing instructions
    #[regex(r"<\?[^>]*>")]
    ProcessingInstruction,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9:_.-]*[ \t\r\n]*>")]
    EndTag,

    /// `<name attr="value" ...>` or `<name ... />`
    #[regex(r#"<[A-Za-z][A-Za-z0-9:_.-]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// A stray `<` that does not open a tag
    #[token("<")]
    Lt,

    /// Character data between tags
    #[regex(r"[^<]+")]
    Text,
}

/// Consume the rest of a comment or declaration after the leading `<!`.
///
/// Unterminated constructs run to the end of input, matching how browsers
/// treat them.
fn lex_bang(lex: &mut Lexer<TokenKind>) -> bool {
    let rest = lex.remainder();
    let consumed = if let Some(body) = rest.strip_prefix("--") {
        body.find("-->").map_or(rest.len(), |end| 2 + end + 3)
    } else {
        rest.find('>').map_or(rest.len(), |end| end + 1)
    };
    lex.bump(consumed);
    true
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        // Unrecognized input is character data
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push((Token { kind, text }, span));
    }

    tokens
}
