//! Embedded key-code table and identifier validation.
//!
//! The table carries the daemon's canonical key names plus the punctuation
//! and digit aliases configuration authors actually type (`";"`,
//! `"'"`, `0`..`9`). Malformed identifiers are rejected here; semantic
//! validity of a well-formed but unlisted name is the daemon's job at load
//! time, so those pass through with a warning.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Table schema from keycodes.json.
#[derive(Debug, Deserialize)]
struct KeycodeTable {
    version: String,
    aliases: HashMap<String, String>,
    key_codes: Vec<String>,
}

/// Key-code database with alias resolution and shape validation.
#[derive(Debug)]
pub struct KeycodeDb {
    version: String,
    known: HashSet<String>,
    aliases: HashMap<String, String>,
    identifier: Regex,
}

impl KeycodeDb {
    /// Loads the database from the embedded JSON table.
    pub fn load() -> Result<Self> {
        let json_data = include_str!("keycodes.json");
        let table: KeycodeTable =
            serde_json::from_str(json_data).context("Failed to parse embedded keycodes.json")?;

        let known: HashSet<String> = table.key_codes.into_iter().collect();
        let identifier =
            Regex::new("^[a-z0-9_]+$").context("Failed to compile key identifier pattern")?;

        Ok(Self {
            version: table.version,
            known,
            aliases: table.aliases,
            identifier,
        })
    }

    /// Table version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Resolves an author-typed key to its canonical key-code name.
    ///
    /// Aliases (`";"` → `semicolon`) map to their canonical name. Names that
    /// are well-formed identifiers pass through; unlisted ones log a warning
    /// since the daemon will have the final say at load time.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or malformed identifiers.
    pub fn resolve(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Key identifier cannot be empty");
        }

        if let Some(canonical) = self.aliases.get(input) {
            return Ok(canonical.clone());
        }

        if !self.identifier.is_match(input) {
            bail!(
                "Malformed key identifier '{}' (expected lowercase letters, digits, underscores, or a known alias)",
                input
            );
        }

        if !self.known.contains(input) {
            tracing::warn!(key = input, "key code not in the embedded table; deferring to the daemon");
        }
        Ok(input.to_string())
    }

    /// Returns true if the key name is in the embedded table.
    #[must_use]
    pub fn is_known(&self, key: &str) -> bool {
        self.known.contains(key)
    }
}

static DB: OnceLock<KeycodeDb> = OnceLock::new();

/// Process-wide accessor for the embedded database, loaded on first use.
pub fn keycode_db() -> Result<&'static KeycodeDb> {
    if let Some(db) = DB.get() {
        return Ok(db);
    }
    let db = KeycodeDb::load()?;
    Ok(DB.get_or_init(|| db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_table() {
        let db = KeycodeDb::load().unwrap();
        assert!(!db.version().is_empty());
        assert!(db.is_known("a"));
        assert!(db.is_known("escape"));
        assert!(db.is_known("return_or_enter"));
    }

    #[test]
    fn test_resolve_aliases() {
        let db = KeycodeDb::load().unwrap();
        assert_eq!(db.resolve(";").unwrap(), "semicolon");
        assert_eq!(db.resolve("'").unwrap(), "quote");
        assert_eq!(db.resolve(",").unwrap(), "comma");
        assert_eq!(db.resolve("`").unwrap(), "grave_accent_and_tilde");
        assert_eq!(db.resolve("0").unwrap(), "0");
    }

    #[test]
    fn test_resolve_passthrough() {
        let db = KeycodeDb::load().unwrap();
        assert_eq!(db.resolve("caps_lock").unwrap(), "caps_lock");
        // Well-formed but unlisted: deferred to the daemon
        assert_eq!(db.resolve("keypad_slash_2").unwrap(), "keypad_slash_2");
    }

    #[test]
    fn test_resolve_rejects_malformed() {
        let db = KeycodeDb::load().unwrap();
        assert!(db.resolve("").is_err());
        assert!(db.resolve("Left Shift").is_err());
        assert!(db.resolve("KC_A").is_err());
        assert!(db.resolve("ключ").is_err());
    }
}
