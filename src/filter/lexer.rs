//! Filter expression tokenizer.
//!
//! A single left-to-right scan splits the expression on the `&` and `|`
//! separators while tracking whether it is inside a double-quoted literal,
//! so separators inside quotes are plain characters. Everything between two
//! separators is handed to the parser as one [`Token::Clause`].

use super::ExpressionError;

/// A token produced by the filter lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw text of one comparison, untrimmed, with its byte offset.
    Clause(&'a str, usize),
    /// `&` -- conjunction separator.
    And,
    /// `|` -- disjunction separator.
    Or,
}

/// Splits `input` into clauses and separators.
///
/// The result always starts and ends with a clause and alternates clause and
/// separator, so `"a|"` yields a trailing empty clause.
///
/// # Errors
///
/// Returns [`ExpressionError`] if a quoted literal is never closed.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, ExpressionError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut quote_start: Option<usize> = None;
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if quote_start.is_some() {
            match b {
                b'\\' => pos += 1,
                b'"' => quote_start = None,
                _ => {}
            }
        } else {
            match b {
                b'"' => quote_start = Some(pos),
                b'&' | b'|' => {
                    tokens.push(Token::Clause(&input[start..pos], start));
                    tokens.push(if b == b'&' { Token::And } else { Token::Or });
                    start = pos + 1;
                }
                _ => {}
            }
        }
        pos += 1;
    }

    if let Some(open) = quote_start {
        return Err(ExpressionError::new("unterminated string literal", open));
    }
    tokens.push(Token::Clause(&input[start..], start));
    Ok(tokens)
}
