use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use common::{ConfigValue, Error, Result, TypeTag};

use crate::config_var::{ConfigVar, EntryState};

/// Insertion-ordered collection of config entries for one strategy type.
///
/// Entries are resolved in declared order. Prompts, validators and hooks may
/// only read entries declared before them; nothing checks this at runtime.
pub struct ConfigRegistry {
    name: String,
    entries: Vec<ConfigVar>,
    index: HashMap<String, usize>,
}

impl ConfigRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a registry from entries in declaration order.
    pub fn from_entries(name: impl Into<String>, entries: Vec<ConfigVar>) -> Result<Self> {
        let mut registry = Self::new(name);
        for entry in entries {
            registry.push(entry)?;
        }
        info!(
            registry = %registry.name,
            entries = registry.entries.len(),
            "Config registry built"
        );
        Ok(registry)
    }

    /// Append an entry. Keys must be unique and defaults must match the
    /// entry's type tag.
    pub fn push(&mut self, entry: ConfigVar) -> Result<()> {
        if self.index.contains_key(entry.key()) {
            return Err(Error::Config(format!(
                "duplicate config key '{}' in registry '{}'",
                entry.key(),
                self.name
            )));
        }
        if let Some(default) = entry.default_value() {
            if default.type_tag() != entry.type_tag() {
                return Err(Error::Config(format!(
                    "default for '{}' is a {} value but the entry is {}",
                    entry.key(),
                    default.type_tag(),
                    entry.type_tag()
                )));
            }
        }
        debug!(key = %entry.key(), type_tag = %entry.type_tag(), "Registered config entry");
        self.index.insert(entry.key().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ConfigVar::key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigVar> {
        self.entries.iter()
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Result<&ConfigVar> {
        self.index
            .get(key)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::UnknownKey(key.to_string()))
    }

    pub fn entry_at(&self, index: usize) -> Option<&ConfigVar> {
        self.entries.get(index)
    }

    pub(crate) fn entry_at_mut(&mut self, index: usize) -> Option<&mut ConfigVar> {
        self.entries.get_mut(index)
    }

    pub fn state(&self, key: &str) -> Result<EntryState> {
        Ok(self.get(key)?.state())
    }

    /// The resolved value of `key`. Reading an entry that has not been
    /// resolved yet is a broken dependency declaration, hence fatal.
    pub fn value(&self, key: &str) -> Result<&ConfigValue> {
        self.get(key)?
            .value()
            .ok_or_else(|| Error::UnresolvedDependency(key.to_string()))
    }

    pub fn str_value(&self, key: &str) -> Result<&str> {
        let value = self.value(key)?;
        value
            .as_str()
            .ok_or_else(|| type_mismatch(key, TypeTag::String, value))
    }

    pub fn decimal_value(&self, key: &str) -> Result<Decimal> {
        let value = self.value(key)?;
        value
            .as_decimal()
            .ok_or_else(|| type_mismatch(key, TypeTag::Decimal, value))
    }

    pub fn integer_value(&self, key: &str) -> Result<i64> {
        let value = self.value(key)?;
        value
            .as_i64()
            .ok_or_else(|| type_mismatch(key, TypeTag::Integer, value))
    }

    pub fn float_value(&self, key: &str) -> Result<f64> {
        let value = self.value(key)?;
        value
            .as_f64()
            .ok_or_else(|| type_mismatch(key, TypeTag::Float, value))
    }

    pub fn bool_value(&self, key: &str) -> Result<bool> {
        let value = self.value(key)?;
        value
            .as_bool()
            .ok_or_else(|| type_mismatch(key, TypeTag::Bool, value))
    }

    /// Keys whose `required_if` holds but which have no value.
    pub fn missing_required(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.value().is_none() && e.is_required(self))
            .map(ConfigVar::key)
            .collect()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.state(), EntryState::Skipped | EntryState::Resolved))
    }

    /// Ordered `(key, value)` pairs for hand-off to strategy construction.
    pub fn snapshot(&self) -> Vec<(String, Option<ConfigValue>)> {
        self.entries
            .iter()
            .map(|e| (e.key().to_string(), e.value().cloned()))
            .collect()
    }

    /// Forget every resolved value ahead of a fresh resolution pass.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.clear();
        }
        debug!(registry = %self.name, "Config registry reset");
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish()
    }
}

fn type_mismatch(key: &str, expected: TypeTag, actual: &ConfigValue) -> Error {
    Error::TypeMismatch {
        key: key.to_string(),
        expected,
        actual: actual.type_tag(),
    }
}
