//! Encrypted per-respondent draft records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::crypto;
use crate::error::StoreError;
use crate::kv::KeyValueStore;

pub const DEFAULT_KEY_PREFIX: &str = "tracer_survey_answers_";
pub const ENVELOPE_VERSION: u64 = 1;

static TIMESTAMP_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,13}$").expect("timestamp regex is valid"));

/// Draft persistence keyed by respondent id. Values are encrypted with one
/// process-wide key and wrapped in `{version, payload}` before encryption.
#[derive(Debug)]
pub struct UserDraftStore<S> {
    store: S,
    encryption_key: String,
    prefix: String,
}

impl<S: KeyValueStore> UserDraftStore<S> {
    pub fn new(store: S, encryption_key: impl Into<String>) -> Self {
        Self {
            store,
            encryption_key: encryption_key.into(),
            prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn storage_key(&self, user_id: &str) -> String {
        format!("{}{user_id}", self.prefix)
    }

    /// Stamps `lastUpdated` and `userId` into `data` and writes it encrypted.
    pub fn save<T: Serialize + ?Sized>(&mut self, user_id: &str, data: &T) -> Result<(), StoreError> {
        let Value::Object(mut payload) = serde_json::to_value(data)? else {
            return Err(StoreError::NotAnObject);
        };
        let stamped = OffsetDateTime::now_utc().format(&Rfc3339)?;
        payload.insert("lastUpdated".into(), Value::String(stamped));
        payload.insert("userId".into(), Value::String(user_id.to_string()));

        let mut envelope = Map::new();
        envelope.insert("version".into(), Value::from(ENVELOPE_VERSION));
        envelope.insert("payload".into(), Value::Object(payload));
        let raw = serde_json::to_string(&envelope)?;

        let key = self.storage_key(user_id);
        self.store
            .set(&key, crypto::encrypt(&raw, &self.encryption_key))?;
        debug!(user_id, "draft saved");
        Ok(())
    }

    /// Stored payload for `user_id`, or `None` when absent, unreadable or
    /// owned by a different respondent.
    pub fn load(&self, user_id: &str) -> Option<Value> {
        let raw = self.store.get(&self.storage_key(user_id))?;
        let payload = self.read_record(&raw)?;
        let owner = payload.get("userId").and_then(Value::as_str);
        if owner != Some(user_id) {
            warn!(user_id, "stored draft belongs to a different respondent");
            return None;
        }
        Some(payload)
    }

    pub fn load_as<T: DeserializeOwned>(&self, user_id: &str) -> Option<T> {
        serde_json::from_value(self.load(user_id)?).ok()
    }

    pub fn clear(&mut self, user_id: &str) -> Result<(), StoreError> {
        let key = self.storage_key(user_id);
        self.store.remove(&key)
    }

    pub fn list_user_ids(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    /// Removes every record under the prefix and returns how many were removed.
    pub fn clear_all(&mut self) -> Result<usize, StoreError> {
        let user_ids = self.list_user_ids();
        for user_id in &user_ids {
            self.clear(user_id)?;
        }
        Ok(user_ids.len())
    }

    /// Drops records whose stored `userId` carries more than one timestamp
    /// segment, a leftover id format. Unreadable records are kept.
    pub fn cleanup_legacy(&mut self) -> Result<Vec<String>, StoreError> {
        let mut removed = Vec::new();
        for user_id in self.list_user_ids() {
            let Some(raw) = self.store.get(&self.storage_key(&user_id)) else {
                continue;
            };
            let Some(payload) = self.read_record(&raw) else {
                continue;
            };
            let stored = payload.get("userId").and_then(Value::as_str).unwrap_or(&user_id);
            if timestamp_segments(stored) > 1 {
                self.clear(&user_id)?;
                removed.push(user_id);
            }
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "removed legacy draft records");
        }
        Ok(removed)
    }

    fn read_record(&self, raw: &str) -> Option<Value> {
        let parsed = crypto::decrypt(raw, &self.encryption_key)
            .and_then(|plain| serde_json::from_str::<Value>(&plain).ok())
            .or_else(|| serde_json::from_str::<Value>(raw).ok())?;
        unwrap_envelope(parsed)
    }
}

fn unwrap_envelope(value: Value) -> Option<Value> {
    let Value::Object(mut map) = value else {
        return None;
    };
    let enveloped = map.len() == 2
        && map.get("version").and_then(Value::as_u64) == Some(ENVELOPE_VERSION)
        && map.get("payload").is_some_and(Value::is_object);
    if enveloped {
        return map.remove("payload");
    }
    Some(Value::Object(map))
}

/// Number of underscore-delimited segments that look like epoch timestamps.
pub fn timestamp_segments(user_id: &str) -> usize {
    user_id
        .split('_')
        .filter(|segment| TIMESTAMP_SEGMENT.is_match(segment))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_timestamp_segments() {
        assert_eq!(timestamp_segments("TS_001"), 0);
        assert_eq!(timestamp_segments("user_1718000000"), 1);
        assert_eq!(timestamp_segments("user_1718000000_1718000000123"), 2);
        assert_eq!(timestamp_segments("user_171800000"), 0);
        assert_eq!(timestamp_segments("user_17180000001234"), 0);
    }

    #[test]
    fn envelope_is_unwrapped_and_bare_objects_pass() {
        let wrapped = serde_json::json!({ "version": 1, "payload": { "userId": "a" } });
        assert_eq!(unwrap_envelope(wrapped), Some(serde_json::json!({ "userId": "a" })));
        let bare = serde_json::json!({ "userId": "a", "answers": {} });
        assert_eq!(unwrap_envelope(bare.clone()), Some(bare));
        assert_eq!(unwrap_envelope(serde_json::json!([1, 2])), None);
    }
}
