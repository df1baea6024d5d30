#![deny(warnings)]

//! Persistence layer: save-blob codec and namespaced storage keys.
//!
//! Two independent schemas are stored side by side and never merged:
//! - a per-user [`Profile`] wrapping the rich [`MoneyState`]
//! - the single weekly [`EngineState`]
//!
//! Blobs are validated on the way in and on the way out; a blob that fails
//! either check loads as "no save data".

use chrono::{DateTime, Utc};
use quest_core::{validate_engine_state, validate_money_state, EngineState, MoneyState, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Namespace shared by every key this crate writes.
pub const KEY_PREFIX: &str = "moneyquest";
/// Key of the weekly-schema save.
pub const ENGINE_STATE_KEY: &str = "moneyquest:engine";

/// Storage key for a user's profile. Usernames are case-insensitive.
pub fn profile_key(username: &str) -> String {
    format!("{}:profile:{}", KEY_PREFIX, username.trim().to_lowercase())
}

/// A logged-in player and their game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub money: MoneyState,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid save data: {0}")]
    Invalid(#[from] ValidationError),
    #[error("username must not be empty")]
    EmptyUsername,
}

/// String key/value storage, e.g. browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-process store used by the CLI and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

fn check_profile(p: &Profile) -> Result<(), SaveError> {
    if p.username.trim().is_empty() {
        return Err(SaveError::EmptyUsername);
    }
    validate_money_state(&p.money)?;
    Ok(())
}

pub fn encode_profile(p: &Profile) -> Result<String, SaveError> {
    check_profile(p)?;
    Ok(serde_json::to_string(p)?)
}

pub fn decode_profile(text: &str) -> Result<Profile, SaveError> {
    let p: Profile = serde_json::from_str(text)?;
    check_profile(&p)?;
    Ok(p)
}

pub fn encode_engine_state(s: &EngineState) -> Result<String, SaveError> {
    validate_engine_state(s)?;
    Ok(serde_json::to_string(s)?)
}

pub fn decode_engine_state(text: &str) -> Result<EngineState, SaveError> {
    let s: EngineState = serde_json::from_str(text)?;
    validate_engine_state(&s)?;
    Ok(s)
}

pub fn save_profile<S: KeyValueStore + ?Sized>(store: &mut S, p: &Profile) -> Result<(), SaveError> {
    let blob = encode_profile(p)?;
    debug!(user = %p.username, bytes = blob.len(), "saving profile");
    store.set(&profile_key(&p.username), blob);
    Ok(())
}

/// Load a profile; missing or unreadable saves return `None`.
pub fn load_profile<S: KeyValueStore + ?Sized>(store: &S, username: &str) -> Option<Profile> {
    let blob = store.get(&profile_key(username))?;
    match decode_profile(&blob) {
        Ok(p) => Some(p),
        Err(err) => {
            warn!(user = username, %err, "discarding unreadable profile");
            None
        }
    }
}

pub fn delete_profile<S: KeyValueStore + ?Sized>(store: &mut S, username: &str) {
    store.remove(&profile_key(username));
}

pub fn save_engine_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    s: &EngineState,
) -> Result<(), SaveError> {
    let blob = encode_engine_state(s)?;
    store.set(ENGINE_STATE_KEY, blob);
    Ok(())
}

/// Load the weekly save; missing or unreadable saves return `None`.
pub fn load_engine_state<S: KeyValueStore + ?Sized>(store: &S) -> Option<EngineState> {
    let blob = store.get(ENGINE_STATE_KEY)?;
    match decode_engine_state(&blob) {
        Ok(s) => Some(s),
        Err(err) => {
            warn!(%err, "discarding unreadable engine state");
            None
        }
    }
}

pub fn clear_engine_state<S: KeyValueStore + ?Sized>(store: &mut S) {
    store.remove(ENGINE_STATE_KEY);
}
