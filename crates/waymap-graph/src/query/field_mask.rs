//! Field-mask merge over any serializable parameter structure.
//!
//! Both sides are lowered to `serde_json::Value`, the masked paths are copied
//! from the override into the baseline, and the result is decoded back into
//! `T`. Nothing here knows the fields of `T`.

use crate::error::{MapError, MapResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use waymap_model::FieldMask;

/// Merge `overrides` into `baseline` along `mask`.
///
/// Masked paths take their value from `overrides`, everything else from
/// `baseline`. An empty mask selects every field, so the result equals
/// `overrides`. Paths that do not name a field of `T` are rejected.
pub fn apply_field_mask<T>(baseline: &T, overrides: &T, mask: &FieldMask) -> MapResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let source = to_value(overrides)?;
    if mask.is_empty() {
        return from_value(source, "*");
    }

    let mut merged = to_value(baseline)?;
    for path in &mask.paths {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid(path, "empty path segment"));
        }
        copy_path(&mut merged, &source, &segments).map_err(|reason| invalid(path, &reason))?;
    }
    from_value(merged, &mask.paths.join(","))
}

/// Check that every path of `mask` names a field of `T`.
///
/// Paths are resolved against `schema`, so every optional sub-message the
/// mask may reach into has to be present in it. A path that runs into an
/// absent value before its last segment is rejected.
pub fn validate_field_mask<T: Serialize>(schema: &T, mask: &FieldMask) -> MapResult<()> {
    let schema = to_value(schema)?;
    for path in &mask.paths {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid(path, "empty path segment"));
        }
        resolve_path(&schema, &segments).map_err(|reason| invalid(path, &reason))?;
    }
    Ok(())
}

/// Walk `segments` down through nested objects of `value`.
fn resolve_path<'a>(value: &'a Value, segments: &[&str]) -> Result<&'a Value, String> {
    let mut current = value;
    for segment in segments {
        let Value::Object(fields) = current else {
            return Err(format!("{segment:?} is below a non-message field"));
        };
        current = fields
            .get(*segment)
            .ok_or_else(|| format!("no field named {segment:?}"))?;
    }
    Ok(current)
}

fn copy_path(target: &mut Value, source: &Value, segments: &[&str]) -> Result<(), String> {
    let Some((head, rest)) = segments.split_first() else {
        return Err("empty path".to_string());
    };
    let Value::Object(source_fields) = source else {
        return Err(format!("{head:?} is below a non-message field"));
    };
    let Some(source_child) = source_fields.get(*head) else {
        return Err(format!("no field named {head:?}"));
    };
    let Value::Object(target_fields) = target else {
        return Err(format!("{head:?} is below a non-message field"));
    };

    let target_child = target_fields
        .entry((*head).to_string())
        .or_insert(Value::Null);
    if rest.is_empty() || target_child.is_null() || source_child.is_null() {
        // An absent sub-message on either side is taken whole from the
        // override, once the rest of the path resolves on the present side.
        if !rest.is_empty() {
            let present = if source_child.is_null() {
                &*target_child
            } else {
                source_child
            };
            if !present.is_null() {
                resolve_path(present, rest)?;
            }
        }
        *target_child = source_child.clone();
        return Ok(());
    }
    copy_path(target_child, source_child, rest)
}

fn to_value<T: Serialize>(value: &T) -> MapResult<Value> {
    serde_json::to_value(value).map_err(|e| MapError::Encoding(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: Value, path: &str) -> MapResult<T> {
    serde_json::from_value(value).map_err(|e| invalid(path, &e.to_string()))
}

fn invalid(path: &str, reason: &str) -> MapError {
    MapError::InvalidFieldMask {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
