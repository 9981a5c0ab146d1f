//! Filter expression parser.
//!
//! ```text
//! expression  = disjunction
//! disjunction = conjunction ('|' conjunction)*
//! conjunction = comparison ('&' comparison)*
//! comparison  = selector ws op ws quoted_string
//! selector    = '.' | ':' | attribute_name
//! op          = '==' | '=' | '!='
//! ```
//!
//! `&` binds tighter than `|`. A clause that is not a well-formed comparison
//! is dropped from its conjunction instead of failing the whole expression;
//! only an unterminated quote is reported as an error.

use super::ast::{Comparison, Conjunction, Op, Selector};
use super::lexer::{tokenize, Token};
use super::{ExpressionError, Filter};

/// Parses filter expression text.
///
/// # Errors
///
/// Returns [`ExpressionError`] if a quoted literal is not terminated.
pub fn parse(input: &str) -> Result<Filter, ExpressionError> {
    if input.trim().is_empty() {
        return Ok(Filter::Any);
    }

    let mut disjunction = Vec::new();
    let mut current = Conjunction::default();
    for token in tokenize(input)? {
        match token {
            Token::Clause(text, offset) => match parse_comparison(text) {
                Some(comparison) => current.comparisons.push(comparison),
                None => {
                    tracing::debug!(clause = text.trim(), offset, "dropping malformed comparison");
                }
            },
            Token::And => {}
            Token::Or => disjunction.push(std::mem::take(&mut current)),
        }
    }
    disjunction.push(current);
    Ok(Filter::Disjunction(disjunction))
}

/// Parses one clause, or returns `None` if it is malformed.
fn parse_comparison(clause: &str) -> Option<Comparison> {
    let text = clause.trim();
    let (selector, rest) = match text.as_bytes().first()? {
        b'.' => (Selector::Value, &text[1..]),
        b':' => (Selector::Tag, &text[1..]),
        _ => {
            let end = text
                .find(|c: char| c.is_whitespace() || c == '=' || c == '!' || c == '"')
                .unwrap_or(text.len());
            if end == 0 {
                return None;
            }
            (Selector::Attribute(text[..end].to_string()), &text[end..])
        }
    };

    let rest = rest.trim_start();
    let (op, rest) = if let Some(r) = rest.strip_prefix("==") {
        (Op::Eq, r)
    } else if let Some(r) = rest.strip_prefix("!=") {
        (Op::Ne, r)
    } else if let Some(r) = rest.strip_prefix('=') {
        (Op::Eq, r)
    } else {
        return None;
    };

    let (literal, rest) = parse_literal(rest.trim_start())?;
    if !rest.trim().is_empty() {
        return None;
    }
    Some(Comparison {
        selector,
        op,
        literal,
    })
}

/// Reads a `"..."` literal with `\"` and `\\` escapes, returning the
/// unescaped text and whatever follows the closing quote.
fn parse_literal(text: &str) -> Option<(String, &str)> {
    let body = text.strip_prefix('"')?;
    let mut literal = String::new();
    let mut chars = body.char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Some((literal, &body[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped)) => literal.push(escaped),
                None => return None,
            },
            _ => literal.push(ch),
        }
    }
    None
}
