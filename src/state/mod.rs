//! Persistent shell state shared between the image builder and the UEFI shell.
//!
//! The builder writes one instance of this state to `/EFI/RAMOS/state.txt`;
//! the shell loads it at boot, mutates it and may write it back. The textual
//! format both sides agree on lives in [`codec`], the seed instance embedded
//! at build time in [`seed`].
//!
//! Keys beginning with [`HIDDEN_PREFIX`] are hidden variables. They are
//! stored and round-tripped like any other key; only listings made for the
//! user skip them (see [`State::visible_variables`]).

pub mod codec;
pub mod seed;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub use codec::{decode, decode_report, encode, DecodeReport};
pub use seed::default_state;

/// Prefix marking a variable as hidden from user-facing listings.
pub const HIDDEN_PREFIX: char = '_';

/// Hidden variable holding the base64-encoded vault secret.
pub const VAULT_KEY: &str = "_vault";

/// Complete persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct State {
    pub variables: Variables,
    /// Commands, oldest first.
    pub history: Vec<String>,
    pub hint_level: u64,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing the value of an existing key in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.variables.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key)
    }

    /// Record an executed command. Empty input is not recorded.
    pub fn push_history(&mut self, command: impl Into<String>) {
        let command = command.into();
        if !command.is_empty() {
            self.history.push(command);
        }
    }

    /// Variables a user listing shows, in declaration order.
    pub fn visible_variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().filter(|(key, _)| !is_hidden(key))
    }

    /// Decoded vault contents, if the vault is present and holds valid
    /// base64 of UTF-8 text.
    pub fn vault_secret(&self) -> Option<String> {
        let encoded = self.get(VAULT_KEY)?;
        let bytes = BASE64_STANDARD.decode(encoded.trim()).ok()?;
        String::from_utf8(bytes).ok()
    }
}

pub fn is_hidden(key: &str) -> bool {
    key.starts_with(HIDDEN_PREFIX)
}

/// Key/value variables in declaration order with unique keys.
///
/// Re-inserting an existing key keeps its original position and replaces the
/// value, so the first declaration fixes the order and the last one wins.
///
/// Backed by a plain vector: lookups and inserts scan linearly, which is
/// cheaper than hashing at the handful of entries a state file carries but
/// makes decoding quadratic in the number of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: Vec<(String, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        for (k, v) in iter {
            vars.insert(k, v);
        }
        vars
    }
}

impl Serialize for Variables {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
