//! Dotted path addressing into records, e.g. `"site.lang"` or `"items.0.name"`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Record, Value};
use crate::error::PathError;

/// A parsed dotted path with at least one non-empty segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Parse a dotted path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: path.to_owned(),
                position,
            });
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether one path is a segment-wise prefix of the other (or equal).
    pub fn overlaps(&self, other: &Path) -> bool {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Look up the value at `path`. Missing segments and malformed paths yield `None`.
pub fn get<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let path = Path::parse(path).ok()?;
    get_path(record, &path)
}

/// Look up the value at an already parsed path.
pub fn get_path<'a>(record: &'a Record, path: &Path) -> Option<&'a Value> {
    let (first, rest) = path.segments.split_first()?;
    rest.iter()
        .try_fold(record.get(first)?, |node, segment| child(node, segment))
}

/// Write `value` at `path`, creating intermediate records as needed.
///
/// The node at the final segment is replaced wholesale; its siblings are untouched.
pub fn set(record: &mut Record, path: &str, value: Value) -> Result<(), PathError> {
    let path = Path::parse(path)?;
    set_path(record, &path, value);
    Ok(())
}

pub fn set_path(record: &mut Record, path: &Path, value: Value) {
    let mut root = Value::Object(std::mem::take(record));
    let mut node = &mut root;
    for segment in &path.segments {
        node = slot_mut(node, segment);
    }
    *node = value;

    if let Value::Object(map) = root {
        *record = map;
    }
}

/// Remove the key at `path`, returning the removed value.
///
/// No-op when any intermediate segment is missing or the parent is not a record.
pub fn delete(record: &mut Record, path: &str) -> Result<Option<Value>, PathError> {
    let path = Path::parse(path)?;
    Ok(delete_path(record, &path))
}

pub fn delete_path(record: &mut Record, path: &Path) -> Option<Value> {
    let (last, parents) = path.segments.split_last()?;
    let Some((first, rest)) = parents.split_first() else {
        return record.remove(last);
    };

    let mut node = record.get_mut(first)?;
    for segment in rest {
        node = child_mut(node, segment)?;
    }
    node.as_object_mut()?.remove(last)
}

fn array_index(node: &Value, segment: &str) -> Option<usize> {
    match node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i < items.len()),
        _ => None,
    }
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

/// The slot for `segment` under `node`, turning `node` into a record if it
/// is neither a record nor a sequence indexed in bounds.
fn slot_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    match array_index(node, segment) {
        Some(index) => &mut node[index],
        None => {
            if !node.is_object() {
                *node = Value::Object(Record::new());
            }
            match node {
                Value::Object(map) => map.entry(segment.to_owned()).or_insert(Value::Null),
                _ => unreachable!("non-object nodes are replaced above"),
            }
        }
    }
}
