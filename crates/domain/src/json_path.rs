//! Minimal JSON path queries.
//!
//! Supports `$`, `$.field`, `$.field.nested`, `$.array[0]` and `$.array[*]`
//! (which yields the whole array). This is all the suite needs to reach into
//! the server's flat resource documents.

use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Resolves `path` against `json`.
///
/// Returns `Ok(None)` when the path is well formed but nothing lives there.
///
/// # Errors
///
/// Returns an error if the path is malformed.
pub fn query<'a>(json: &'a Value, path: &str) -> DomainResult<Option<&'a Value>> {
    let mut current = json;
    for segment in parse(path)? {
        let next = match segment {
            Segment::Field(name) => current.get(name),
            Segment::Index(name, index) => {
                let base = if name.is_empty() {
                    Some(current)
                } else {
                    current.get(name)
                };
                match (base, index) {
                    (Some(v), None) => Some(v),
                    (Some(v), Some(idx)) => v.get(idx),
                    (None, _) => None,
                }
            }
        };
        match next {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Checks that `path` is well formed without resolving it.
///
/// # Errors
///
/// Returns an error if the path is malformed.
pub fn validate(path: &str) -> DomainResult<()> {
    parse(path).map(|_| ())
}

enum Segment<'p> {
    Field(&'p str),
    /// `name[idx]`; `None` index means `[*]`.
    Index(&'p str, Option<usize>),
}

fn invalid(path: &str, reason: impl Into<String>) -> DomainError {
    DomainError::InvalidJsonPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn parse(path: &str) -> DomainResult<Vec<Segment<'_>>> {
    let trimmed = path.trim();
    let Some(rest) = trimmed.strip_prefix('$') else {
        return Err(invalid(path, "must start with '$'"));
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = rest.strip_prefix('.') else {
        return Err(invalid(path, "expected '.' after '$'"));
    };

    let mut segments = Vec::new();
    for raw in rest.split('.') {
        if raw.is_empty() {
            return Err(invalid(path, "empty segment"));
        }
        segments.push(parse_segment(path, raw)?);
    }
    Ok(segments)
}

fn parse_segment<'p>(path: &str, raw: &'p str) -> DomainResult<Segment<'p>> {
    let Some(bracket) = raw.find('[') else {
        return Ok(Segment::Field(raw));
    };
    let Some(inner) = raw[bracket + 1..].strip_suffix(']') else {
        return Err(invalid(path, format!("unterminated index in '{raw}'")));
    };
    let name = &raw[..bracket];
    if inner == "*" {
        return Ok(Segment::Index(name, None));
    }
    let index = inner
        .parse::<usize>()
        .map_err(|_| invalid(path, format!("invalid array index: {inner}")))?;
    Ok(Segment::Index(name, Some(index)))
}
