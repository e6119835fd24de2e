//! Whitespace tokenizer for filter strings.
//!
//! Each whitespace-separated word becomes either a `key:value` pair, split at
//! the first colon, or one of the recognised bare keywords. There is no
//! quoting: `actor:tom cruise` is two tokens, and the second one is an error.

use crate::error::TokenError;

/// Words accepted without a colon.
pub const BARE_KEYWORDS: &[&str] = &["hdr"];

/// One raw token from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken<'a> {
    /// `key:value`, both non-empty
    Pair {
        text: &'a str,
        key: &'a str,
        value: &'a str,
    },
    /// A bare keyword such as `hdr`
    Keyword { text: &'a str },
}

impl<'a> RawToken<'a> {
    /// The token exactly as written.
    pub fn text(&self) -> &'a str {
        match self {
            RawToken::Pair { text, .. } | RawToken::Keyword { text } => text,
        }
    }
}

/// Iterator over the tokens of a filter string.
///
/// Malformed words are yielded as errors in place so the caller can keep
/// going and report all of them.
pub struct Lexer<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            words: input.split_whitespace(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<RawToken<'a>, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.words.next().map(lex_word)
    }
}

/// Tokenize a whole filter string.
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}

fn lex_word(word: &str) -> Result<RawToken<'_>, TokenError> {
    let Some((key, value)) = word.split_once(':') else {
        if BARE_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word)) {
            return Ok(RawToken::Keyword { text: word });
        }
        return Err(TokenError::syntax(
            word,
            "missing `:` between field and value",
        ));
    };

    if key.is_empty() {
        return Err(TokenError::syntax(word, "empty field name"));
    }
    if value.is_empty() {
        return Err(TokenError::syntax(word, "empty value"));
    }

    Ok(RawToken::Pair {
        text: word,
        key,
        value,
    })
}
