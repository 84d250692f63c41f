use crate::error::PathError;
use std::fmt;

/// One step of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{}", name),
            Segment::Index(i) => write!(f, "[{}]", i),
            Segment::Wildcard => write!(f, "[*]"),
        }
    }
}

fn invalid(path: &str, message: impl Into<String>) -> PathError {
    PathError::InvalidExpression {
        path: path.to_string(),
        message: message.into(),
    }
}

/// Parses a path such as `$.user.addresses[0]['post code']` into segments.
///
/// The leading `$` is optional, so `user.name` and `$.user.name` are equivalent.
pub fn parse_path(path: &str) -> Result<Vec<Segment>, PathError> {
    let trimmed = path.trim();
    let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    // A bare leading field (`user.name`) is allowed without a dot.
    if let Some(&first) = chars.first() {
        if first != '.' && first != '[' {
            let (name, next) = read_field(&chars, 0);
            if name.is_empty() {
                return Err(invalid(path, format!("unexpected character '{}'", first)));
            }
            segments.push(field_or_wildcard(name));
            pos = next;
        }
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                let (name, next) = read_field(&chars, pos + 1);
                if name.is_empty() {
                    return Err(invalid(path, "empty field name after '.'"));
                }
                segments.push(field_or_wildcard(name));
                pos = next;
            }
            '[' => {
                let close = chars[pos + 1..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|offset| pos + 1 + offset)
                    .ok_or_else(|| invalid(path, "unterminated '['"))?;
                let inner: String = chars[pos + 1..close].iter().collect();
                segments.push(parse_bracket(path, inner.trim())?);
                pos = close + 1;
            }
            other => {
                return Err(invalid(
                    path,
                    format!("unexpected character '{}' at offset {}", other, pos),
                ));
            }
        }
    }

    Ok(segments)
}

fn read_field(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|c| *c == '.' || *c == '[')
        .map_or(chars.len(), |offset| start + offset);
    (chars[start..end].iter().collect(), end)
}

fn field_or_wildcard(name: String) -> Segment {
    if name == "*" {
        Segment::Wildcard
    } else {
        Segment::Field(name)
    }
}

fn parse_bracket(path: &str, inner: &str) -> Result<Segment, PathError> {
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    let quoted = (inner.starts_with('\'') && inner.ends_with('\''))
        || (inner.starts_with('"') && inner.ends_with('"'));
    if quoted && inner.len() >= 2 {
        return Ok(Segment::Field(inner[1..inner.len() - 1].to_string()));
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| invalid(path, format!("'{}' is not an index, quoted key or '*'", inner)))
}
