//! Placeholder filling for document XML.
//!
//! Supported tags:
//!
//! - `{{ dotted.path }}`: value from the context, XML-escaped; missing values
//!   render empty
//! - `{% if path %}`, `{% if not path %}`, `{% else %}`, `{% endif %}`,
//!   nestable; truthiness as in Jinja (empty, zero, false and null are false)

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::markup::escape;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{-?\s*(.*?)\s*-?\}\}|\{%-?\s*(.*?)\s*-?%\}").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Var(&'a str),
    If { path: &'a str, negated: bool },
    Else,
    EndIf,
}

#[derive(Debug)]
struct Frame {
    outer_active: bool,
    condition: bool,
    in_else: bool,
}

impl Frame {
    fn active(&self) -> bool {
        self.outer_active && (self.condition != self.in_else)
    }
}

/// Fill every tag in `xml` from `context`.
pub fn fill(xml: &str, context: &Value) -> Result<String, String> {
    let tokens = tokenize(xml)?;
    let mut out = String::with_capacity(xml.len());
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        let active = stack.last().is_none_or(Frame::active);
        match token {
            Token::Text(text) if active => out.push_str(text),
            Token::Var(path) if active => out.push_str(&escape(&display(lookup(context, path)))),
            Token::Text(_) | Token::Var(_) => {}
            Token::If { path, negated } => {
                let condition = truthy(lookup(context, path)) != negated;
                stack.push(Frame {
                    outer_active: active,
                    condition,
                    in_else: false,
                });
            }
            Token::Else => match stack.last_mut() {
                Some(frame) if !frame.in_else => frame.in_else = true,
                Some(_) => return Err("duplicate {% else %}".to_string()),
                None => return Err("{% else %} without {% if %}".to_string()),
            },
            Token::EndIf => {
                if stack.pop().is_none() {
                    return Err("{% endif %} without {% if %}".to_string());
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(format!("{} unclosed {{% if %}} block(s)", stack.len()));
    }
    Ok(out)
}

fn tokenize(xml: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(xml) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        if whole.start > last {
            tokens.push(Token::Text(&xml[last..whole.start]));
        }
        last = whole.end;

        if let Some(expr) = caps.get(1) {
            tokens.push(Token::Var(expr.as_str()));
        } else if let Some(stmt) = caps.get(2) {
            tokens.push(statement(stmt.as_str())?);
        }
    }

    if last < xml.len() {
        tokens.push(Token::Text(&xml[last..]));
    }
    Ok(tokens)
}

fn statement(stmt: &str) -> Result<Token<'_>, String> {
    let mut words = stmt.split_whitespace();
    match (words.next(), words.next(), words.next(), words.next()) {
        (Some("if"), Some("not"), Some(path), None) => Ok(Token::If {
            path,
            negated: true,
        }),
        (Some("if"), Some(path), None, None) => Ok(Token::If {
            path,
            negated: false,
        }),
        (Some("else"), None, None, None) => Ok(Token::Else),
        (Some("endif"), None, None, None) => Ok(Token::EndIf),
        _ => Err(format!("unsupported template statement {{% {stmt} %}}")),
    }
}

fn lookup<'v>(context: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(context, |node, key| match node {
        Value::Object(map) => map.get(key.trim()),
        Value::Array(items) => key.trim().parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Render a value the way the templates were authored to expect.
fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}
