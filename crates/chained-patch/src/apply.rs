//! Patch application.

use chained_types::Document;
use serde_json::Value;

use crate::error::{PatchError, PatchResult};
use crate::operation::{Patch, PatchOperation};
use crate::pointer::Pointer;

/// Apply `patch` to a copy of `doc`, operations in order.
///
/// The input is never modified. The first failing operation aborts the whole
/// patch and its error carries the operation's position.
pub fn apply(patch: &Patch, doc: &Document) -> PatchResult<Document> {
    let mut out = doc.clone();
    for (index, op) in patch.iter().enumerate() {
        apply_operation(&mut out, op).map_err(|e| e.at_operation(index))?;
    }
    Ok(out)
}

fn apply_operation(doc: &mut Value, op: &PatchOperation) -> PatchResult<()> {
    match op {
        PatchOperation::Add { path, value } => add(doc, path, value.clone()),
        PatchOperation::Remove { path } => remove(doc, path).map(drop),
        PatchOperation::Replace { path, value } => {
            *lookup_mut(doc, path)? = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if path.is_descendant_of(from) {
                return Err(PatchError::MoveIntoDescendant {
                    from: from.to_string(),
                    path: path.to_string(),
                });
            }
            if from == path {
                return lookup(doc, from).map(drop);
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let value = lookup(doc, from)?.clone();
            add(doc, path, value)
        }
        PatchOperation::Test { path, value } => {
            if lookup(doc, path)? == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.to_string(),
                })
            }
        }
    }
}

fn not_found(path: &Pointer) -> PatchError {
    PatchError::PathNotFound {
        path: path.to_string(),
    }
}

/// Parse an index that must address an existing element.
fn existing_index(path: &Pointer, token: &str, len: usize) -> PatchResult<usize> {
    match parse_index(token) {
        Some(index) if index < len => Ok(index),
        Some(_) => Err(not_found(path)),
        None => Err(PatchError::InvalidIndex {
            path: path.to_string(),
            token: token.to_string(),
        }),
    }
}

/// Decimal without sign or leading zeros.
fn parse_index(token: &str) -> Option<usize> {
    let well_formed = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if well_formed {
        token.parse().ok()
    } else {
        None
    }
}

fn lookup<'a>(doc: &'a Value, path: &Pointer) -> PatchResult<&'a Value> {
    let mut current = doc;
    for token in path.tokens() {
        current = match current {
            Value::Object(map) => map.get(token).ok_or_else(|| not_found(path))?,
            Value::Array(items) => &items[existing_index(path, token, items.len())?],
            _ => return Err(not_found(path)),
        };
    }
    Ok(current)
}

fn lookup_mut<'a>(doc: &'a mut Value, path: &Pointer) -> PatchResult<&'a mut Value> {
    let mut current = doc;
    for token in path.tokens() {
        current = match current {
            Value::Object(map) => map.get_mut(token).ok_or_else(|| not_found(path))?,
            Value::Array(items) => {
                let index = existing_index(path, token, items.len())?;
                &mut items[index]
            }
            _ => return Err(not_found(path)),
        };
    }
    Ok(current)
}

fn add(doc: &mut Value, path: &Pointer, value: Value) -> PatchResult<()> {
    let Some((parent, last)) = path.split_last() else {
        *doc = value;
        return Ok(());
    };
    match lookup_mut(doc, &parent)? {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            match parse_index(last) {
                Some(index) if index <= items.len() => {
                    items.insert(index, value);
                    Ok(())
                }
                _ => Err(PatchError::InvalidIndex {
                    path: path.to_string(),
                    token: last.to_string(),
                }),
            }
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn remove(doc: &mut Value, path: &Pointer) -> PatchResult<Value> {
    let (parent, last) = path.split_last().ok_or(PatchError::RootRemoval)?;
    match lookup_mut(doc, &parent)? {
        Value::Object(map) => map.remove(last).ok_or_else(|| not_found(path)),
        Value::Array(items) => {
            let index = existing_index(path, last, items.len())?;
            Ok(items.remove(index))
        }
        _ => Err(not_found(path)),
    }
}
