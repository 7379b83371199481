//! Addressing inside the shared room document tree.

use super::errors::{StoreError, StoreResult};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Root collection every room document lives under
pub const ROOMS_ROOT: &str = "rooms";

/// Characters the upstream document store refuses inside a key
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// Location of a value: a room document plus child segments within it.
///
/// Renders as `rooms/{room_id}/segment/...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    room_id: String,
    segments: Vec<String>,
}

impl StorePath {
    /// Path of a whole room document
    pub fn room(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            segments: Vec::new(),
        }
    }

    /// Path of one participant entry
    pub fn participant(room_id: impl Into<String>, user_id: &str) -> Self {
        Self::room(room_id).child("participants").child(user_id)
    }

    /// Path of the raffle sub-document
    pub fn raffle(room_id: impl Into<String>) -> Self {
        Self::room(room_id).child("raffle")
    }

    /// Path of the reactions map
    pub fn reactions(room_id: impl Into<String>) -> Self {
        Self::room(room_id).child("reactions")
    }

    /// Descend into a child. Slash-separated input adds one segment per part.
    #[must_use]
    pub fn child(mut self, segment: impl AsRef<str>) -> Self {
        self.segments
            .extend(segment.as_ref().split('/').map(str::to_string));
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the path addresses the room document itself
    pub fn is_room_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Reject empty room ids, empty segments and forbidden characters
    pub fn validate(&self) -> StoreResult<()> {
        validate_key(&self.room_id).map_err(|_| StoreError::InvalidPath(self.to_string()))?;
        for segment in &self.segments {
            validate_key(segment).map_err(|_| StoreError::InvalidPath(self.to_string()))?;
        }
        Ok(())
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ROOMS_ROOT}/{}", self.room_id)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), ()> {
    if key.trim().is_empty() || key.contains(FORBIDDEN_KEY_CHARS) {
        Err(())
    } else {
        Ok(())
    }
}

/// A multi-field update applied atomically relative to a target path.
///
/// Keys are slash-separated relative paths (`participants/u1/point`).
/// A `null` value removes the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePatch {
    fields: BTreeMap<String, Value>,
}

impl StorePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a relative field (builder form)
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Remove a relative field (builder form)
    #[must_use]
    pub fn clear(self, path: impl Into<String>) -> Self {
        self.set(path, Value::Null)
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(path, value)| (path.as_str(), value))
    }

    /// Resolve every field against `base`, validating each resulting path
    pub fn resolve(&self, base: &StorePath) -> StoreResult<Vec<(StorePath, Value)>> {
        self.fields
            .iter()
            .map(|(relative, value)| {
                let path = base.clone().child(relative);
                path.validate()?;
                Ok((path, value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_display() {
        let path = StorePath::participant("room1", "alice").child("point");
        assert_eq!(path.to_string(), "rooms/room1/participants/alice/point");
        assert_eq!(path.segments().len(), 3);
    }

    #[test]
    fn test_child_splits_on_slash() {
        let path = StorePath::room("r").child("raffle/participants/x");
        assert_eq!(path.segments(), ["raffle", "participants", "x"]);
    }

    #[test]
    fn test_validate_rejects_bad_keys() {
        assert!(StorePath::room("").validate().is_err());
        assert!(StorePath::room("r").child("a//b").validate().is_err());
        assert!(StorePath::room("r").child("bad.key").validate().is_err());
        assert!(StorePath::room("r").child("ok").validate().is_ok());
    }

    #[test]
    fn test_patch_resolve() {
        let patch = StorePatch::new()
            .set("status", "voting")
            .clear("participants/a/point");
        let resolved = patch.resolve(&StorePath::room("r")).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0.to_string(), "rooms/r/participants/a/point");
        assert_eq!(resolved[0].1, Value::Null);
        assert_eq!(resolved[1].1, json!("voting"));
    }

    #[test]
    fn test_patch_resolve_rejects_invalid_field() {
        let patch = StorePatch::new().set("ok", 1).set("bad$", 2);
        assert!(patch.resolve(&StorePath::room("r")).is_err());
    }
}
