use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
};
use std::collections::VecDeque;

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::ast::{NumberType, RealType, Value};

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseConfig {
    /// Lists nested deeper than this are rejected with a `SyntaxError`
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')'
}

/// A single token: a parenthesis, or a run of anything else up to whitespace
fn parse_token(input: &str) -> IResult<&str, &str> {
    alt((
        tag("("),
        tag(")"),
        take_while1(|c: char| !c.is_whitespace() && !is_delimiter(c)),
    ))
    .parse(input)
}

/// Split text into tokens. Parentheses always stand alone; everything else
/// is separated by whitespace. There are no strings, comments or escapes.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    // Once leading whitespace is gone, `parse_token` only fails on empty input
    while let Ok((remaining, token)) = parse_token(rest) {
        tokens.push(token.to_owned());
        rest = remaining.trim_start();
    }
    tokens
}

/// Classify a non-parenthesis token: integer, then real, then symbol
fn parse_atom(token: String) -> Value {
    if let Ok(n) = token.parse::<NumberType>() {
        Value::Integer(n)
    } else if let Ok(x) = token.parse::<RealType>() {
        Value::Real(x)
    } else {
        Value::Symbol(token)
    }
}

fn read_expression(
    tokens: &mut VecDeque<String>,
    depth: usize,
    config: &ParseConfig,
) -> Result<Value, Error> {
    let token = tokens
        .pop_front()
        .ok_or_else(|| Error::SyntaxError("no tokens".to_owned()))?;

    match token.as_str() {
        "(" => {
            if depth >= config.max_depth {
                return Err(Error::SyntaxError(format!(
                    "Expression too deeply nested (max depth: {})",
                    config.max_depth
                )));
            }
            let mut elements = Vec::new();
            loop {
                match tokens.front().map(String::as_str) {
                    // Running out of tokens inside a list is the same fault as empty input
                    None => return Err(Error::SyntaxError("no tokens".to_owned())),
                    Some(")") => {
                        tokens.pop_front();
                        return Ok(Value::List(elements));
                    }
                    Some(_) => elements.push(read_expression(tokens, depth + 1, config)?),
                }
            }
        }
        ")" => Err(Error::SyntaxError("unexpected ')'".to_owned())),
        _ => Ok(parse_atom(token)),
    }
}

/// Consume exactly one expression from the front of `tokens`
pub fn parse_expression(tokens: &mut VecDeque<String>) -> Result<Value, Error> {
    read_expression(tokens, 0, &ParseConfig::default())
}

/// Parse the first expression in `input`. Anything after it is ignored;
/// use [`parse_all`] to read every form.
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    parse_scheme_with_config(input, &ParseConfig::default())
}

pub fn parse_scheme_with_config(input: &str, config: &ParseConfig) -> Result<Value, Error> {
    let mut tokens: VecDeque<String> = tokenize(input).into();
    let value = read_expression(&mut tokens, 0, config)?;
    if !tokens.is_empty() {
        log::debug!("ignoring {} trailing tokens after {value}", tokens.len());
    }
    Ok(value)
}

/// Parse every top-level expression in `input`, in order
pub fn parse_all(input: &str) -> Result<Vec<Value>, Error> {
    parse_all_with_config(input, &ParseConfig::default())
}

pub fn parse_all_with_config(input: &str, config: &ParseConfig) -> Result<Vec<Value>, Error> {
    let mut tokens: VecDeque<String> = tokenize(input).into();
    let mut forms = Vec::new();
    while !tokens.is_empty() {
        forms.push(read_expression(&mut tokens, 0, config)?);
    }
    log::debug!("parsed {} top-level forms", forms.len());
    Ok(forms)
}
